//! Text normalization for filterable values.
//!
//! Category and tag strings arrive from content files and query
//! parameters, where copy-paste from rich-text editors leaves zero-width
//! characters behind. Those artifacts are invisible on screen but break
//! equality, so every comparison key passes through here first.

/// Characters that render as nothing but defeat string equality:
/// zero-width space/joiners, the word joiner, the BOM, and the soft
/// hyphen.
const INVISIBLE: &[char] = &[
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}',
];

/// Strip invisible characters and surrounding whitespace, preserving
/// case.
pub fn normalize(value: &str) -> String {
    let cleaned: String = value.chars().filter(|ch| !INVISIBLE.contains(ch)).collect();
    cleaned.trim().to_string()
}

/// [`normalize`], lowercased. Comparison keys on both sides of a filter
/// match go through this so `" Resin "` and `resin` agree.
pub fn normalize_key(value: &str) -> String {
    normalize(value).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_invisible_characters() {
        assert_eq!(normalize("re\u{200B}sin"), "resin");
        assert_eq!(normalize("\u{FEFF}petg\u{00AD}"), "petg");
        assert_eq!(normalize("pla\u{200C}\u{200D}\u{2060}"), "pla");
    }

    #[test]
    fn trims_whitespace_but_keeps_case() {
        assert_eq!(normalize("  Home-Decor  "), "Home-Decor");
    }

    #[test]
    fn keys_are_lowercased() {
        assert_eq!(normalize_key(" Resin\u{200B} "), "resin");
    }

    #[test]
    fn interior_whitespace_survives() {
        assert_eq!(normalize("scale models"), "scale models");
        assert_eq!(normalize_key("Scale Models"), "scale models");
    }

    #[test]
    fn empty_and_invisible_only_input_collapse_to_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \u{200B}\u{FEFF} "), "");
    }
}
