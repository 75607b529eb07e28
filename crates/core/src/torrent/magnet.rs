//! Magnet URI parsing.

use regex::Regex;

/// Extract the lowercase BTIH from a magnet URI, if present.
pub fn info_hash_from_magnet(magnet: &str) -> Option<String> {
    let re = Regex::new(r"xt=urn:btih:([a-fA-F0-9]{40})").expect("static regex");
    re.captures(magnet)
        .map(|caps| caps[1].to_lowercase())
}

/// Extract the decoded tracker URLs from a magnet URI's `tr=` parameters.
pub fn trackers_from_magnet(magnet: &str) -> Vec<String> {
    magnet
        .split('&')
        .filter_map(|part| part.strip_prefix("tr="))
        .filter(|tr| !tr.is_empty())
        .map(|tr| {
            urlencoding::decode(tr)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| tr.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAGNET: &str = "magnet:?xt=urn:btih:1619ECC9373C3639F4EE3E261638F29B33A6CBD6&dn=Some+Movie&tr=udp%3A%2F%2Ftracker.example%3A1337%2Fannounce&tr=udp%3A%2F%2Fbackup.example%3A6969%2Fannounce";

    #[test]
    fn test_info_hash_extraction_lowercases() {
        assert_eq!(
            info_hash_from_magnet(MAGNET).unwrap(),
            "1619ecc9373c3639f4ee3e261638f29b33a6cbd6"
        );
    }

    #[test]
    fn test_info_hash_missing() {
        assert!(info_hash_from_magnet("magnet:?dn=no+hash+here").is_none());
        assert!(info_hash_from_magnet("magnet:?xt=urn:btih:tooshort").is_none());
    }

    #[test]
    fn test_trackers_decoded() {
        assert_eq!(
            trackers_from_magnet(MAGNET),
            vec![
                "udp://tracker.example:1337/announce",
                "udp://backup.example:6969/announce"
            ]
        );
    }

    #[test]
    fn test_trackers_absent() {
        assert!(trackers_from_magnet("magnet:?xt=urn:btih:1619ecc9373c3639f4ee3e261638f29b33a6cbd6").is_empty());
    }
}
