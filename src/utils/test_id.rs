// src/utils/test_id.rs

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::{TEST_ID_DIGITS, TEST_ID_PREFIXES, TEST_ID_SEPARATOR};

/// Generates an id such as `C0427`: one prefix letter plus four digits.
pub fn generate_test_id() -> String {
    let mut rng = rand::thread_rng();
    let prefixes: Vec<char> = TEST_ID_PREFIXES.chars().collect();
    let prefix = prefixes.choose(&mut rng).copied().unwrap_or('T');

    let mut id = String::with_capacity(1 + TEST_ID_DIGITS);
    id.push(prefix);
    for _ in 0..TEST_ID_DIGITS {
        let digit = rng.gen_range(0..10u32);
        id.push(char::from_digit(digit, 10).unwrap_or('0'));
    }
    id
}

/// Splits operator authoring text into `(test_id, raw_answers)`.
///
/// `"T100-1a2b"` yields `(Some("T100"), "1a2b")`; text without the separator
/// yields `(None, text)` and the caller generates an id.
pub fn split_authoring_text(text: &str) -> (Option<&str>, &str) {
    match text.split_once(TEST_ID_SEPARATOR) {
        Some((id, answers)) => (Some(id.trim()), answers),
        None => (None, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        for _ in 0..200 {
            let id = generate_test_id();
            assert_eq!(id.chars().count(), 5);
            let mut chars = id.chars();
            assert!(TEST_ID_PREFIXES.contains(chars.next().unwrap()));
            assert!(chars.all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_split_with_separator() {
        assert_eq!(split_authoring_text("T100-1a2b"), (Some("T100"), "1a2b"));
        assert_eq!(split_authoring_text(" X1 - a-b"), (Some("X1"), " a-b"));
    }

    #[test]
    fn test_split_without_separator() {
        assert_eq!(split_authoring_text("1a2b"), (None, "1a2b"));
    }
}
