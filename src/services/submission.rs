// src/services/submission.rs

use chrono::NaiveDateTime;

use crate::{
    error::AppError,
    models::{event::Caller, result::TestResult},
    services::scoring::score,
    session::Session,
    storage::JsonStore,
    utils::answers::extract_answers,
};

/// A recorded submission plus the operators who should hear about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub result: TestResult,
    pub notify: Vec<i64>,
}

/// First contact from a learner: remember who they are and ask for a name.
pub fn begin_identification(session: &mut Session, caller: &Caller) -> Result<(), AppError> {
    session.begin_identification(caller.resolved_username())
}

pub fn receive_name(session: &mut Session, text: &str) -> Result<(), AppError> {
    let name = text.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    session.accept_student_name(name)
}

/// Splits `"T100 1a 2b\n3c"` into `("T100", "1a2b3c")`.
fn parse_submission(text: &str) -> Result<(&str, String), AppError> {
    let mut tokens = text.split_whitespace();
    let (Some(test_id), Some(first)) = (tokens.next(), tokens.next()) else {
        return Err(AppError::Validation(
            "expected a test id followed by answers".to_string(),
        ));
    };

    let mut answers = first.to_string();
    answers.extend(tokens);
    Ok((test_id, answers))
}

/// Scores and records a learner's answers.
///
/// Lookup, the duplicate check and the append run inside one store update so
/// two concurrent submissions cannot both pass the same-day check.
pub async fn submit(
    store: &JsonStore,
    session: &mut Session,
    text: &str,
    now: NaiveDateTime,
    operators: &[i64],
) -> Result<Submission, AppError> {
    let (username, student_name) = session.learner()?;
    let (test_id, raw_answers) = parse_submission(text)?;

    let result = store
        .update(|root| {
            let test = root
                .find_test(test_id)
                .ok_or_else(|| AppError::NotFound(format!("test '{}' not found", test_id)))?;

            if root.has_submission(username, test_id, now.date()) {
                return Err(AppError::Duplicate(format!(
                    "'{}' already submitted '{}' today",
                    username, test_id
                )));
            }

            let outcome = score(
                &extract_answers(&test.correct_answers),
                &extract_answers(&raw_answers),
            );
            let result = TestResult::new(
                student_name,
                username,
                test_id,
                outcome.correct,
                outcome.incorrect,
                now,
            )?;
            root.results.push(result.clone());
            Ok(result)
        })
        .await?;

    session.reset();
    tracing::info!(
        test_id = %result.test_id,
        username = %result.username,
        correct = result.correct_count,
        incorrect = result.incorrect_count,
        "Result recorded"
    );

    Ok(Submission {
        result,
        notify: operators.to_vec(),
    })
}
