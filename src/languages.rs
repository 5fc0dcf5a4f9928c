pub const SPANISH: &str = "spa";
pub const ENGLISH: &str = "eng";

const TWO_LETTER_CODES: &[(&str, &str)] = &[
    ("en", "eng"),
    ("es", "spa"),
    ("fr", "fra"),
    ("pt", "por"),
    ("de", "deu"),
    ("it", "ita"),
];

/// Maps a language code to the three-letter form Tatoeba uses.
///
/// Known two-letter codes go through a fixed table, three-letter codes pass
/// through lowercased, and anything else is cut to its first three characters.
pub fn normalize_lang(code: &str) -> String {
    let code = code.trim().to_lowercase();
    if let Some((_, long)) = TWO_LETTER_CODES.iter().find(|(short, _)| *short == code) {
        return long.to_string();
    }
    code.chars().take(3).collect()
}

pub fn same_lang(left: &str, right: &str) -> bool {
    normalize_lang(left) == normalize_lang(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_two_letter_codes() {
        assert_eq!(normalize_lang("es"), "spa");
        assert_eq!(normalize_lang("ES"), "spa");
        assert_eq!(normalize_lang(" en "), "eng");
        assert_eq!(normalize_lang("pt"), "por");
    }

    #[test]
    fn three_letter_codes_pass_through() {
        assert_eq!(normalize_lang("SPA"), "spa");
        assert_eq!(normalize_lang("jpn"), "jpn");
    }

    #[test]
    fn other_codes_are_truncated() {
        assert_eq!(normalize_lang("spa-MX"), "spa");
        assert_eq!(normalize_lang("ja"), "ja");
        assert_eq!(normalize_lang(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        for code in ["en", "ES", "fra", "deu-AT", "x"] {
            let once = normalize_lang(code);
            assert_eq!(normalize_lang(&once), once);
        }
        assert!(same_lang("es", "SPA"));
        assert!(!same_lang("en", "spa"));
    }
}
