//! OCR text normalization.

/// Collapse whitespace and repair letter/digit confusions in numeric tokens.
///
/// Horizontal whitespace runs become one space, lines are trimmed and blank
/// lines dropped, so line structure survives for the line-oriented passes.
/// Alphabetic words are never altered.
pub fn normalize(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            line.split_whitespace()
                .map(repair_numeric_token)
                .collect::<Vec<String>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<String>>()
        .join("\n")
}

fn confusable_digit(c: char) -> Option<char> {
    match c {
        'O' | 'o' => Some('0'),
        'l' | 'I' => Some('1'),
        'S' => Some('5'),
        'G' => Some('6'),
        _ => None,
    }
}

/// Rewrite confusable letters when the token is clearly a number, date or time.
///
/// `1O:3O` becomes `10:30` and `O3/l5/2024` becomes `03/15/2024`, while `SOLO`
/// and `G5` stay as they are (fewer than two real digits).
fn repair_numeric_token(token: &str) -> String {
    let digits = token.chars().filter(char::is_ascii_digit).count();
    let numeric_shape = token
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ':' | '.' | '/' | '-') || confusable_digit(c).is_some());
    let has_confusable = token.chars().any(|c| confusable_digit(c).is_some());

    if digits < 2 || !numeric_shape || !has_confusable {
        return token.to_string();
    }

    token
        .chars()
        .map(|c| confusable_digit(c).unwrap_or(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_keeps_lines() {
        let raw = "  Driver:   John\t Smith \n\n\n   Date: 03/15/2024  ";
        assert_eq!(normalize(raw), "Driver: John Smith\nDate: 03/15/2024");
    }

    #[test]
    fn test_repairs_numeric_tokens() {
        assert_eq!(normalize("Start 1O:3O end O5:4S"), "Start 10:30 end 05:45");
        assert_eq!(normalize("O3/l5/2024"), "03/15/2024");
    }

    #[test]
    fn test_leaves_words_alone() {
        assert_eq!(normalize("SOLO Go IS lOl"), "SOLO Go IS lOl");
        assert_eq!(normalize("G5 bus"), "G5 bus");
        assert_eq!(normalize("Sorwar Al Khor"), "Sorwar Al Khor");
    }
}
