//! Title matching with layered strategies.

use regex::Regex;

const DEFAULT_MIN_SCORE: u32 = 85;

/// Articles dropped during normalization (English + Portuguese).
const ARTICLES: &[&str] = &["the", "a", "an", "o", "os", "as"];

/// Decides whether a torrent title refers to the searched work.
///
/// Three strategies run in order, cheapest first:
/// 1. normalized equality / containment
/// 2. word-by-word score against a minimum percentage
/// 3. a flexible regex joining the query words with release separators
#[derive(Debug, Clone)]
pub struct TitleMatcher {
    min_score: u32,
}

impl Default for TitleMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SCORE)
    }
}

impl TitleMatcher {
    pub fn new(min_score: u32) -> Self {
        let min_score = if min_score == 0 {
            DEFAULT_MIN_SCORE
        } else {
            min_score
        };
        Self { min_score }
    }

    /// True if `candidate` plausibly names the work in `query`.
    pub fn matches(&self, query: &str, candidate: &str) -> bool {
        let search = normalize(query);
        let torrent = normalize(candidate);

        if search.is_empty() {
            return false;
        }

        if search == torrent || torrent.contains(&search) {
            return true;
        }

        if word_match_score(&search, &torrent) >= self.min_score {
            return true;
        }

        flexible_pattern_match(&search, candidate)
    }
}

/// Lowercase, strip articles and apostrophes, map `&` to "and", replace
/// everything non-alphanumeric with spaces and collapse runs.
fn normalize(title: &str) -> String {
    let lowered = title.to_lowercase().replace("'s", "").replace('\'', "");
    let replaced = lowered.replace('&', " and ");

    let cleaned: String = replaced
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| !ARTICLES.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Percentage of query words found in the candidate. A word matches on
/// equality or substring containment either way; a trailing numeric token
/// (usually a year) also matches within ±1.
fn word_match_score(search: &str, torrent: &str) -> u32 {
    let search_words: Vec<&str> = search.split_whitespace().collect();
    let torrent_words: Vec<&str> = torrent.split_whitespace().collect();

    if search_words.is_empty() {
        return 0;
    }

    let trailing_year: Option<i64> = search_words.last().and_then(|w| w.parse().ok());

    let mut matched = 0;
    for (i, sw) in search_words.iter().enumerate() {
        let is_year_token = i == search_words.len() - 1 && trailing_year.is_some();
        for tw in &torrent_words {
            let hit = sw == tw
                || tw.contains(sw)
                || sw.contains(tw)
                || (is_year_token
                    && tw
                        .parse::<i64>()
                        .is_ok_and(|t| (t - trailing_year.unwrap()).abs() <= 1));
            if hit {
                matched += 1;
                break;
            }
        }
    }

    (matched * 100 / search_words.len() as u32).min(100)
}

/// Join the escaped query words with a `[.\s\-_:]*` separator class and
/// look for the pattern anywhere in the raw candidate title.
fn flexible_pattern_match(normalized_search: &str, candidate: &str) -> bool {
    let words: Vec<&str> = normalized_search.split_whitespace().collect();
    if words.is_empty() {
        return false;
    }

    let mut pattern = String::from("(?i)");
    for (i, word) in words.iter().enumerate() {
        pattern.push_str(&regex::escape(word));
        if i < words.len() - 1 {
            pattern.push_str(r"[.\s\-_:]*");
        }
    }

    match Regex::new(&pattern) {
        Ok(re) => re.is_match(candidate),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let m = TitleMatcher::default();
        assert!(m.matches("Breaking Bad", "Breaking Bad"));
    }

    #[test]
    fn test_containment_with_release_noise() {
        let m = TitleMatcher::default();
        assert!(m.matches("Breaking Bad", "Breaking Bad S02 1080p BluRay x264"));
    }

    #[test]
    fn test_articles_dropped() {
        let m = TitleMatcher::default();
        assert!(m.matches("The Wire", "Wire S01 Complete"));
        assert!(m.matches("Wire", "The Wire S01 Complete"));
    }

    #[test]
    fn test_ampersand_and_apostrophe() {
        let m = TitleMatcher::default();
        assert!(m.matches("Law & Order", "Law and Order S05E02"));
        assert!(m.matches("It's Always Sunny", "Its Always Sunny S01"));
    }

    #[test]
    fn test_dotted_release_names() {
        let m = TitleMatcher::default();
        assert!(m.matches("Breaking Bad", "Breaking.Bad.S02E05.720p.HDTV"));
    }

    #[test]
    fn test_year_drift_tolerated() {
        let m = TitleMatcher::default();
        assert!(m.matches("Dune 2021", "Dune 2020 2160p UHD"));
    }

    #[test]
    fn test_unrelated_title_rejected() {
        let m = TitleMatcher::default();
        assert!(!m.matches("Breaking Bad", "Better Call Saul S01E01"));
        assert!(!m.matches("Severance", "Succession S03 Complete"));
    }

    #[test]
    fn test_empty_query_rejected() {
        let m = TitleMatcher::default();
        assert!(!m.matches("", "anything"));
    }

    #[test]
    fn test_min_score_zero_uses_default() {
        let m = TitleMatcher::new(0);
        assert!(!m.matches("Severance", "Succession S03"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("The Lord of the Rings"), "lord of rings");
        assert_eq!(normalize("Tom & Jerry"), "tom and jerry");
        assert_eq!(normalize("It's  A   Test!"), "it test");
    }
}
