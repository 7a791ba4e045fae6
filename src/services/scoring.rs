// src/services/scoring.rs

/// Outcome of comparing a submission with an answer key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub incorrect: usize,
}

/// Position-aligned comparison of `submitted` against `correct`.
///
/// The key defines the question count: unanswered tail positions count as
/// incorrect and extra submitted letters are ignored.
pub fn score(correct: &[char], submitted: &[char]) -> Score {
    let matched = correct
        .iter()
        .zip(submitted.iter())
        .filter(|(expected, given)| expected == given)
        .count();

    Score {
        correct: matched,
        incorrect: correct.len() - matched,
    }
}
