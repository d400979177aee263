//! Locale module - language tags carried on submissions

use serde::{Deserialize, Serialize};

/// A normalized language tag such as `en`, `cy-GB` or `zh-Hant-TW`
///
/// Parsing is lenient in the way browsers are: `_` is accepted as a
/// separator and casing is normalized (language lowercase, script title
/// case, region uppercase). Anything without a usable language subtag is
/// treated as no locale at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Parse a language tag, returning `None` for empty or malformed input
    ///
    /// # Examples
    ///
    /// ```
    /// use circumstances_domain::Locale;
    ///
    /// assert_eq!(Locale::parse("en_gb").unwrap().as_str(), "en-GB");
    /// assert!(Locale::parse("").is_none());
    /// ```
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }

        let mut subtags = tag.split(['-', '_']);
        let language = subtags.next()?;
        if !(2..=8).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let mut parts = vec![language.to_ascii_lowercase()];
        for subtag in subtags {
            if subtag.is_empty() || subtag.len() > 8 || !subtag.chars().all(|c| c.is_ascii_alphanumeric()) {
                return None;
            }
            parts.push(normalize_subtag(subtag));
        }

        Some(Self(parts.join("-")))
    }

    /// Get the tag as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize_subtag(subtag: &str) -> String {
    let alpha = subtag.chars().all(|c| c.is_ascii_alphabetic());
    match subtag.len() {
        // Region: GB, US
        2 if alpha => subtag.to_ascii_uppercase(),
        // Script: Latn, Hant
        4 if alpha => {
            let lower = subtag.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => lower,
            }
        }
        _ => subtag.to_ascii_lowercase(),
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_language() {
        assert_eq!(Locale::parse("EN").unwrap().as_str(), "en");
        assert_eq!(Locale::parse(" cy ").unwrap().as_str(), "cy");
    }

    #[test]
    fn test_region_and_script_casing() {
        assert_eq!(Locale::parse("cy-gb").unwrap().as_str(), "cy-GB");
        assert_eq!(Locale::parse("zh_hant_tw").unwrap().as_str(), "zh-Hant-TW");
        assert_eq!(Locale::parse("es-419").unwrap().as_str(), "es-419");
    }

    #[test]
    fn test_malformed_is_absent() {
        assert!(Locale::parse("").is_none());
        assert!(Locale::parse("   ").is_none());
        assert!(Locale::parse("e").is_none());
        assert!(Locale::parse("en--GB").is_none());
        assert!(Locale::parse("12-GB").is_none());
        assert!(Locale::parse("en-G!").is_none());
    }
}
