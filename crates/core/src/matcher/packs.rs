//! Season/episode pack classification.
//!
//! Release titles are classified from their season/episode markers:
//! a concrete episode (or episode range), a single season pack, a season
//! range, a complete-series pack, or none of those. English and Portuguese
//! release conventions are both recognized.

use regex::Regex;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

/// `s01e05`, `s01.e05`, `s01-e05`, optionally an episode range `s01e01-e04`.
fn episode_marker(title: &str) -> Option<(u32, u32, u32)> {
    let caps = re(r"\bs(\d{1,2})[\s._-]*e(\d{1,3})(?:[\s._-]*-[\s._-]*e?(\d{1,3}))?")
        .captures(title)?;
    let season = caps[1].parse().ok()?;
    let start: u32 = caps[2].parse().ok()?;
    let end = caps
        .get(3)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(start);
    Some((season, start, end))
}

/// `s01-s03`, `s01-03`, `season 1-3`, `temporada 1-3`, `1a a 3a temporada`.
fn season_range(title: &str) -> Option<(u32, u32)> {
    let patterns = [
        r"\bs(\d{1,2})[\s._]*-[\s._]*s?(\d{1,2})\b",
        r"\bseason[\s._-]*(\d{1,2})[\s._-]*-[\s._-]*(\d{1,2})\b",
        r"\btemporada[\s._-]*(\d{1,2})[\s._-]*-[\s._-]*(\d{1,2})\b",
        r"\b(\d{1,2})[aª]?[\s._-]*a(?:té|te)?[\s._-]*(\d{1,2})[aª]?[\s._-]*temporada",
    ];
    for pattern in patterns {
        if let Some(caps) = re(pattern).captures(title) {
            let start = caps[1].parse().ok()?;
            let end = caps[2].parse().ok()?;
            return Some((start, end));
        }
    }
    None
}

/// `s01`, `season 1`, `temporada 1` without an episode or range marker.
fn season_marker(title: &str) -> Option<u32> {
    let patterns = [
        r"\bs(\d{1,2})\b",
        r"\bseason[\s._-]*(\d{1,2})\b",
        r"\btemporada[\s._-]*(\d{1,2})\b",
    ];
    for pattern in patterns {
        if let Some(caps) = re(pattern).captures(title) {
            return caps[1].parse().ok();
        }
    }
    None
}

/// True if the title names a season range containing `season`.
pub fn is_season_range(title: &str, season: u32) -> bool {
    let title = title.to_lowercase();
    if episode_marker(&title).is_some() {
        return false;
    }
    season_range(&title).is_some_and(|(start, end)| start <= season && season <= end)
}

/// True if the title names exactly the requested single season.
pub fn is_season_pack(title: &str, season: u32) -> bool {
    let title = title.to_lowercase();
    if episode_marker(&title).is_some() || season_range(&title).is_some() {
        return false;
    }
    season_marker(&title) == Some(season)
}

/// True if the title names the requested episode, directly or inside an
/// episode range.
pub fn is_episode_pack(title: &str, season: u32, episode: u32) -> bool {
    let title = title.to_lowercase();
    episode_marker(&title)
        .is_some_and(|(s, start, end)| s == season && start <= episode && episode <= end)
}

/// Complete-series indicators. A bare `pack` word is deliberately not
/// enough; a qualifier must accompany it.
pub fn is_complete_series(title: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "complete series",
        "full series",
        "série completa",
        "serie completa",
        "show pack",
        "show.pack",
        "season pack",
        "season.pack",
        "complete pack",
        "pack completo",
        "coleção completa",
        "colecao completa",
        " - completo",
        " - completa",
        "(completa)",
        "todas as temporadas",
        "todas temporadas",
        "all seasons",
    ];

    let title = title.to_lowercase();
    KEYWORDS.iter().any(|kw| title.contains(kw))
}

/// The composite policy applied to series search results: keep a candidate
/// when it names the requested episode, the requested season, a range
/// covering the requested season, a complete-series pack, or carries no
/// season/episode markers at all. Everything scoped to some other part of
/// the show is rejected.
pub fn should_keep_series_result(title: &str, season: u32, episode: u32) -> bool {
    let lowered = title.to_lowercase();

    if let Some((s, start, end)) = episode_marker(&lowered) {
        return s == season && start <= episode && episode <= end;
    }
    if let Some((start, end)) = season_range(&lowered) {
        return start <= season && season <= end;
    }
    if let Some(s) = season_marker(&lowered) {
        return s == season;
    }

    // No structural markers: plain titles and keyword-only complete-series
    // packs both stay in.
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_range_detection() {
        assert!(is_season_range("Show Name S01-S03 1080p", 2));
        assert!(is_season_range("Show Name S01-03 720p", 1));
        assert!(is_season_range("SHOW NAME S1-S3 COMPLETE", 3));
        assert!(is_season_range("Show Name Season 1-3 Complete", 2));
        assert!(is_season_range("Show Name Temporada 1-3 Completa", 2));
        assert!(is_season_range("Show Name 1a a 3a Temporada", 2));
    }

    #[test]
    fn test_season_range_outside_request() {
        assert!(!is_season_range("Show Name S01-S03 1080p", 4));
        assert!(!is_season_range("Show Name Season 2-3", 1));
    }

    #[test]
    fn test_season_range_not_confused_with_episodes() {
        assert!(!is_season_range("Show Name S01E01-E03", 1));
        assert!(!is_season_range("Show Name S01 1080p", 1));
    }

    #[test]
    fn test_season_pack_detection() {
        assert!(is_season_pack("Show Name S02 Complete 1080p", 2));
        assert!(is_season_pack("Show Name Season 2 Pack", 2));
        assert!(is_season_pack("Show Name Temporada 2 Completa", 2));
        assert!(is_season_pack("Show.Name.S02.1080p.WEB-DL", 2));
    }

    #[test]
    fn test_season_pack_wrong_season() {
        assert!(!is_season_pack("Show Name S03 Complete", 2));
        assert!(!is_season_pack("Show Name Season 1", 2));
    }

    #[test]
    fn test_season_pack_excludes_episodes_and_ranges() {
        assert!(!is_season_pack("Show Name S02E05", 2));
        assert!(!is_season_pack("Show Name S01-S03", 2));
    }

    #[test]
    fn test_episode_pack_detection() {
        assert!(is_episode_pack("Show Name S02E05 1080p", 2, 5));
        assert!(is_episode_pack("Show.Name.S02.E05", 2, 5));
        assert!(is_episode_pack("Show Name S02E01-E08", 2, 5));
        assert!(is_episode_pack("Show Name S02E01-08", 2, 5));
    }

    #[test]
    fn test_episode_pack_misses() {
        assert!(!is_episode_pack("Show Name S02E06", 2, 5));
        assert!(!is_episode_pack("Show Name S03E05", 2, 5));
        assert!(!is_episode_pack("Show Name S02E01-E04", 2, 5));
        assert!(!is_episode_pack("Show Name S02 Complete", 2, 5));
    }

    #[test]
    fn test_complete_series_keywords() {
        assert!(is_complete_series("Show Name Complete Series 1080p"));
        assert!(is_complete_series("Show Name Full Series BluRay"));
        assert!(is_complete_series("Show Name Série Completa 1080p"));
        assert!(is_complete_series("Show Name Serie Completa"));
        assert!(is_complete_series("Show Name Show Pack"));
        assert!(is_complete_series("Show.Name.Show.Pack"));
        assert!(is_complete_series("Show Name Season Pack 1080p"));
        assert!(is_complete_series("Show Name Pack Completo"));
        assert!(is_complete_series("Show Name Coleção Completa"));
        assert!(is_complete_series("Show Name Colecao Completa"));
        assert!(is_complete_series("Show Name All Seasons"));
        assert!(is_complete_series("Show Name Todas As Temporadas"));
    }

    #[test]
    fn test_bare_pack_word_not_enough() {
        assert!(!is_complete_series("Show Name Pack"));
        assert!(!is_complete_series("Show Name Multi Pack"));
    }

    #[test]
    fn test_not_complete_series() {
        assert!(!is_complete_series("Show Name S01E05 1080p"));
        assert!(!is_complete_series("Show Name 2024 1080p WEB-DL"));
        assert!(!is_complete_series(""));
        assert!(!is_complete_series("   "));
    }

    #[test]
    fn test_keep_exact_episode() {
        assert!(should_keep_series_result("Show Name S02E05 1080p", 2, 5));
        assert!(should_keep_series_result("Show Name S02E01-E08 720p", 2, 5));
    }

    #[test]
    fn test_drop_other_episode() {
        assert!(!should_keep_series_result("Show Name S03E04", 2, 5));
        assert!(!should_keep_series_result("Show Name S02E06", 2, 5));
        assert!(!should_keep_series_result("Show Name S02E01-E04", 2, 5));
    }

    #[test]
    fn test_keep_matching_season_pack() {
        assert!(should_keep_series_result("Show Name S02 Complete 1080p", 2, 5));
        assert!(should_keep_series_result("Show Name Season 2", 2, 5));
    }

    #[test]
    fn test_drop_wrong_season_pack() {
        assert!(!should_keep_series_result("Show Name S01 Complete", 2, 5));
        assert!(!should_keep_series_result("Show Name Season 4 Pack", 2, 5));
    }

    #[test]
    fn test_keep_covering_range_drop_other_range() {
        assert!(should_keep_series_result("Show Name S01-S03", 2, 5));
        assert!(!should_keep_series_result("Show Name S04-S06", 2, 5));
    }

    #[test]
    fn test_keep_complete_series_and_plain_titles() {
        assert!(should_keep_series_result("Show Name Complete Series", 2, 5));
        assert!(should_keep_series_result("Show Name 2024 1080p WEB-DL", 2, 5));
    }
}
