//! Subtitle selection.
//!
//! Provider labeling is wildly inconsistent ("English", "english (US)",
//! "ENG - English"), so matching is case-insensitive substring matching
//! over a declared preference policy, not exact equality. The policy is
//! deterministic: candidates are evaluated in harvest order and the first
//! match of the highest-priority tier wins.

use crate::resolve::harvest::SubtitleCandidate;

/// Language tiers, most preferred first.
pub const PREFERRED_LANGUAGES: [&str; 2] = ["english", "german"];

/// Encodings known to play back cleanly.
pub const ACCEPTED_ENCODINGS: [&str; 3] = ["ascii", "utf-8", "cp1252"];

/// Pick at most one subtitle from the aggregated candidates.
///
/// Within the first language tier that has any candidate: first candidate
/// with an accepted encoding, else first candidate with no encoding label,
/// else the first candidate of the tier. No language match returns `None`
/// rather than an arbitrary subtitle.
pub fn select_subtitle(candidates: &[SubtitleCandidate]) -> Option<&SubtitleCandidate> {
    for language in PREFERRED_LANGUAGES {
        let tier: Vec<&SubtitleCandidate> = candidates
            .iter()
            .filter(|c| c.language.to_lowercase().contains(language))
            .collect();
        if tier.is_empty() {
            continue;
        }

        if let Some(encoded) = tier
            .iter()
            .find(|c| c.encoding.as_deref().is_some_and(encoding_accepted))
        {
            return Some(encoded);
        }
        if let Some(unlabeled) = tier.iter().find(|c| c.encoding.is_none()) {
            return Some(unlabeled);
        }
        return Some(tier[0]);
    }

    None
}

fn encoding_accepted(encoding: &str) -> bool {
    let encoding = encoding.to_lowercase();
    ACCEPTED_ENCODINGS.iter().any(|accepted| encoding.contains(accepted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(language: &str, encoding: Option<&str>) -> SubtitleCandidate {
        SubtitleCandidate {
            url: format!("https://cdn.example/{}.vtt", language.to_lowercase()),
            language: language.to_string(),
            encoding: encoding.map(String::from),
            display_name: None,
        }
    }

    #[test]
    fn first_english_with_accepted_encoding_wins() {
        let candidates = vec![
            candidate("French", None),
            candidate("English(US)", Some("UTF-8")),
            candidate("English", Some("CP1252")),
        ];
        let selected = select_subtitle(&candidates).unwrap();
        assert_eq!(selected.language, "English(US)");
        assert_eq!(selected.encoding.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn german_is_the_fallback_language() {
        let candidates = vec![candidate("French", None), candidate("German", None)];
        let selected = select_subtitle(&candidates).unwrap();
        assert_eq!(selected.language, "German");
    }

    #[test]
    fn english_outranks_earlier_german() {
        let candidates = vec![candidate("German", Some("UTF-8")), candidate("english", None)];
        let selected = select_subtitle(&candidates).unwrap();
        assert_eq!(selected.language, "english");
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let candidates = vec![candidate("ENG - ENGLISH (CC)", Some("us-ascii"))];
        let selected = select_subtitle(&candidates).unwrap();
        assert_eq!(selected.language, "ENG - ENGLISH (CC)");
    }

    #[test]
    fn unlabeled_encoding_is_acceptable_when_no_accepted_encoding_exists() {
        let candidates = vec![
            candidate("English", Some("UTF-16")),
            candidate("English", None),
        ];
        let selected = select_subtitle(&candidates).unwrap();
        assert!(selected.encoding.is_none());
    }

    #[test]
    fn all_unrecognized_encodings_fall_back_to_first_of_tier() {
        let candidates = vec![
            candidate("English", Some("UTF-16")),
            candidate("English", Some("SHIFT-JIS")),
        ];
        let selected = select_subtitle(&candidates).unwrap();
        assert_eq!(selected.encoding.as_deref(), Some("UTF-16"));
    }

    #[test]
    fn no_preferred_language_returns_none() {
        let candidates = vec![candidate("French", Some("UTF-8")), candidate("Spanish", None)];
        assert!(select_subtitle(&candidates).is_none());
    }

    #[test]
    fn empty_input_returns_none() {
        assert!(select_subtitle(&[]).is_none());
    }
}
