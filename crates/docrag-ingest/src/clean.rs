//! Canonicalization of extracted text.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_PRINTABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\x20-\x7E]").unwrap());
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());

/// Collapse whitespace, strip everything outside printable ASCII, trim.
///
/// Removing a character can leave two spaces adjacent, so runs are
/// collapsed again afterwards. Output never contains newlines or
/// consecutive spaces.
pub fn clean_text(raw: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(raw, " ");
    let printable = NON_PRINTABLE.replace_all(&collapsed, "");
    SPACE_RUN.replace_all(&printable, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_text("a \n\n b\t\tc\r\nd"), "a b c d");
    }

    #[test]
    fn test_strips_non_ascii() {
        assert_eq!(clean_text("caf\u{e9} na\u{ef}ve"), "caf nave");
        assert_eq!(clean_text("bell\u{7}char"), "bellchar");
    }

    #[test]
    fn test_removed_char_between_spaces() {
        assert_eq!(clean_text("left \u{2014} right"), "left right");
    }

    #[test]
    fn test_trims() {
        assert_eq!(clean_text("\n  padded text \t"), "padded text");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n\t "), "");
    }

    #[test]
    fn test_idempotent() {
        let once = clean_text("Some\u{a0}text\n\nwith  \u{1F600} noise.");
        assert_eq!(clean_text(&once), once);
    }
}
