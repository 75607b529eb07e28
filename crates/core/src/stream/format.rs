//! Release-title presentation helpers for stream descriptions.

/// Quality label derived from the release title.
pub fn extract_quality(title: &str) -> &'static str {
    let lowered = title.to_lowercase();

    let qualities: &[(&[&str], &'static str)] = &[
        (&["2160p", "4k", "uhd"], "4K"),
        (&["1080p", "fhd"], "1080p"),
        (&["720p", "hd"], "720p"),
        (&["480p"], "480p"),
    ];

    for (keywords, label) in qualities {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            return label;
        }
    }

    "Unknown"
}

/// Codec label derived from the release title, empty when unknown.
pub fn extract_codec(title: &str) -> &'static str {
    let lowered = title.to_lowercase();

    let codecs: &[(&[&str], &'static str)] = &[
        (&["h265", "hevc", "x265"], "H265"),
        (&["h264", "x264", "avc"], "H264"),
        (&["av1"], "AV1"),
        (&["xvid"], "XviD"),
    ];

    for (keywords, label) in codecs {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            return label;
        }
    }

    ""
}

/// Coarse source class derived from the release title, empty when unknown.
pub fn extract_source(title: &str) -> &'static str {
    let lowered = title.to_lowercase();

    let sources: &[(&[&str], &'static str)] = &[
        (
            &["bluray", "blu-ray", "bdrip", "bd-rip", "brrip", "br-rip"],
            "Source",
        ),
        (
            &["webdl", "web-dl", "dvdrip", "dvd-rip", "webrip", "web-rip", "dvd"],
            "Premium",
        ),
        (
            &["screener", "scr", "tvrip", "tv-rip", "hdtv", "pdtv"],
            "Standard",
        ),
        (
            &["cam", "camrip", "cam-rip", "telesync", "workprint"],
            "Poor",
        ),
    ];

    for (keywords, label) in sources {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            return label;
        }
    }

    ""
}

/// Human-readable 1024-based size.
pub fn format_bytes(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefixes = ['K', 'M', 'G', 'T', 'P', 'E'];
    format!("{:.1} {}B", bytes as f64 / div as f64, prefixes[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality() {
        assert_eq!(extract_quality("Movie.2160p.UHD.BluRay"), "4K");
        assert_eq!(extract_quality("Show S01 1080p WEB-DL"), "1080p");
        assert_eq!(extract_quality("Old.Rip.480p"), "480p");
        assert_eq!(extract_quality("Mystery Release"), "Unknown");
    }

    #[test]
    fn test_codec() {
        assert_eq!(extract_codec("Movie.1080p.x265-GRP"), "H265");
        assert_eq!(extract_codec("Movie.1080p.H264"), "H264");
        assert_eq!(extract_codec("Movie.AV1.opus"), "AV1");
        assert_eq!(extract_codec("Movie.1080p"), "");
    }

    #[test]
    fn test_source() {
        assert_eq!(extract_source("Movie.1080p.BluRay.x264"), "Source");
        assert_eq!(extract_source("Show.S01.WEBRip"), "Premium");
        assert_eq!(extract_source("Show.S01.HDTV"), "Standard");
        assert_eq!(extract_source("Movie.CAMRip"), "Poor");
        assert_eq!(extract_source("Movie.1080p"), "");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(1_932_735_283), "1.8 GB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
