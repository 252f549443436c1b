//! Address / location extraction.
//!
//! Tie-break policy, applied in order, first hit wins:
//! 1. a known location appearing verbatim (case-insensitive) in the text;
//! 2. any whitespace token longer than two characters of a known location
//!    appearing in the text;
//! 3. the free text following "in", up to the first word boundary.

use once_cell::sync::Lazy;
use regex::Regex;

static IN_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bin\s+([a-z][a-z\s\-]+?)(?:\b|$|,)").expect("valid location regex")
});

static NON_LOCATION_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s\-]").expect("valid location cleanup regex"));

/// `text` must already be lower-cased. Returned known locations keep their
/// original casing.
pub fn extract_location(text: &str, known_locations: &[String]) -> Option<String> {
    let known = known_locations.iter().filter(|k| !k.is_empty());

    for location in known.clone() {
        if text.contains(&location.to_lowercase()) {
            return Some(location.clone());
        }
    }

    for location in known {
        let lowered = location.to_lowercase();
        if lowered
            .split_whitespace()
            .any(|token| token.chars().count() > 2 && text.contains(token))
        {
            return Some(location.clone());
        }
    }

    let caps = IN_PHRASE.captures(text)?;
    let phrase = caps.get(1)?.as_str().trim();
    let cleaned = NON_LOCATION_CHARS.replace_all(phrase, "").into_owned();
    (!cleaned.is_empty()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec![String::new(), "12 Abbey Road".to_string(), "Flat 3, Camden Court".to_string()]
    }

    #[test]
    fn verbatim_match_wins_and_keeps_casing() {
        assert_eq!(
            extract_location("houses near 12 abbey road please", &known()),
            Some("12 Abbey Road".to_string())
        );
    }

    #[test]
    fn token_match_is_second() {
        assert_eq!(
            extract_location("anything in camden?", &known()),
            Some("Flat 3, Camden Court".to_string())
        );
    }

    #[test]
    fn short_tokens_are_ignored() {
        // "12" is too short to count as a token match.
        assert_eq!(extract_location("12 of them", &known()), None);
    }

    #[test]
    fn falls_back_to_in_phrase() {
        assert_eq!(extract_location("homes in leeds", &[]), Some("leeds".to_string()));
        assert_eq!(extract_location("homes in north leeds", &[]), Some("north".to_string()));
        assert_eq!(extract_location("show me everything", &[]), None);
    }
}
