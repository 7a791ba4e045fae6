// src/utils/answers.rs

/// Letters recognised as answers. Everything else in the input is noise.
pub const ANSWER_ALPHABET: [char; 5] = ['a', 'b', 'c', 'd', 'e'];

/// Extracts the answer letters from free text such as `"1a2B3c"`.
///
/// Question numbers, punctuation and whitespace are dropped, letters are
/// case-folded, and the order of the remaining letters is kept.
pub fn extract_answers(text: &str) -> Vec<char> {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(|ch| ANSWER_ALPHABET.contains(ch))
        .collect()
}

pub fn answers_to_string(answers: &[char]) -> String {
    answers.iter().collect()
}

/// True when `text` consists only of answer letters (the canonical form).
pub fn is_canonical(text: &str) -> bool {
    text.chars().all(|ch| ANSWER_ALPHABET.contains(&ch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mixed_numbering() {
        assert_eq!(extract_answers("1a2B3c"), vec!['a', 'b', 'c']);
        assert_eq!(extract_answers("1) A\n2) e, 3) D"), vec!['a', 'e', 'd']);
    }

    #[test]
    fn test_extract_nothing_recognised() {
        assert!(extract_answers("").is_empty());
        assert!(extract_answers("xyz").is_empty());
        assert!(extract_answers("12 34 !?").is_empty());
    }

    #[test]
    fn test_extract_is_idempotent() {
        for input in ["1a2b3c", "ABCDE fgh", "30a 29e", "", "x1y2"] {
            let once = extract_answers(input);
            let twice = extract_answers(&answers_to_string(&once));
            assert_eq!(once, twice, "input: {input:?}");
        }
    }

    #[test]
    fn test_is_canonical() {
        assert!(is_canonical("abcde"));
        assert!(is_canonical(""));
        assert!(!is_canonical("abcA"));
        assert!(!is_canonical("a1"));
    }
}
