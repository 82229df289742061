//! Free-text notes extraction.

use super::patterns::NOTES_ANCHOR;

/// Longest `Notes:` / `Comments:` / `Remarks:` text in a block.
pub fn extract_notes(text: &str) -> Option<String> {
    NOTES_ANCHOR
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .max_by_key(|s| s.len())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_note_wins() {
        let text = "Notes: tyre check done\nRemarks: waited at gate for loading, late by an hour";
        assert_eq!(
            extract_notes(text).as_deref(),
            Some("waited at gate for loading, late by an hour")
        );
    }

    #[test]
    fn test_short_note_ignored() {
        assert_eq!(extract_notes("Notes: ok"), None);
        assert_eq!(extract_notes("no annotations"), None);
    }
}
