// src/services/admin.rs

use chrono::NaiveDateTime;

use crate::{
    error::AppError,
    models::{result::TestResult, test::Test},
    session::Session,
    storage::JsonStore,
    utils::{
        answers::{answers_to_string, extract_answers},
        test_id::{generate_test_id, split_authoring_text},
    },
};

/// Operator pressed "add test". Idle -> awaiting test name.
pub fn start_authoring(session: &mut Session) -> Result<(), AppError> {
    session.start_authoring()
}

/// Stores the test name verbatim and asks for the answer key next.
pub fn receive_test_name(session: &mut Session, text: &str) -> Result<(), AppError> {
    session.accept_test_name(text)
}

/// Completes the authoring dialogue.
///
/// `"T100-1a2b3c"` creates (or replaces) test `T100`; text without a `-`
/// gets a generated id. On any error the session stays on the answer-key
/// step so the operator can resend.
pub async fn finalize_test(
    store: &JsonStore,
    session: &mut Session,
    text: &str,
    now: NaiveDateTime,
) -> Result<Test, AppError> {
    let test_name = session.pending_test_name()?.to_string();
    let (supplied_id, raw_answers) = split_authoring_text(text.trim());
    let correct_answers = answers_to_string(&extract_answers(raw_answers));

    // Validate the user-supplied id before touching the store.
    if let Some(id) = supplied_id {
        Test::new(id, test_name.as_str(), correct_answers.as_str(), now)?;
    }

    let test = store
        .update(|root| {
            let test_id = match supplied_id {
                Some(id) => id.to_string(),
                None => {
                    let mut id = generate_test_id();
                    while root.find_test(&id).is_some() {
                        id = generate_test_id();
                    }
                    id
                }
            };
            let test = Test::new(test_id, test_name, correct_answers, now)?;
            root.replace_test(test.clone());
            Ok(test)
        })
        .await?;

    session.reset();
    tracing::info!(
        test_id = %test.test_id,
        questions = test.question_count(),
        "Test saved"
    );
    Ok(test)
}

/// All tests, newest first.
pub async fn list_tests(store: &JsonStore) -> Vec<Test> {
    store.load().await.tests_by_newest()
}

/// Operator pressed "delete test". Requires at least one test; returns the
/// tests to offer, newest first.
pub async fn start_deletion(store: &JsonStore, session: &mut Session) -> Result<Vec<Test>, AppError> {
    let tests = list_tests(store).await;
    if tests.is_empty() {
        return Err(AppError::NotFound("no tests to delete".to_string()));
    }
    session.start_deletion()?;
    Ok(tests)
}

/// Picks the test a menu selection refers to.
///
/// A selection ending in `"(id)"` wins; otherwise the first test whose id
/// appears anywhere in the text. Both passes follow store order, so when ids
/// overlap the earlier test is chosen.
pub fn match_selection<'a>(tests: &'a [Test], selection: &str) -> Option<&'a Test> {
    let selection = selection.trim();
    tests
        .iter()
        .find(|t| selection.ends_with(&format!("({})", t.test_id)))
        .or_else(|| tests.iter().find(|t| selection.contains(t.test_id.as_str())))
}

/// Deletes the selected test together with all its results.
/// No match leaves the session waiting for another selection.
pub async fn delete_selected(
    store: &JsonStore,
    session: &mut Session,
    selection: &str,
) -> Result<Test, AppError> {
    session.expect_delete_selection()?;

    let deleted = store
        .update(|root| {
            let test_id = match_selection(&root.tests, selection)
                .map(|t| t.test_id.clone())
                .ok_or_else(|| AppError::NotFound(format!("no test matches '{}'", selection)))?;
            root.remove_test(&test_id)
                .ok_or_else(|| AppError::NotFound(format!("test '{}' not found", test_id)))
        })
        .await?;

    session.reset();
    tracing::info!(test_id = %deleted.test_id, "Test deleted with its results");
    Ok(deleted)
}

pub async fn results_for(store: &JsonStore, test_id: &str) -> Vec<TestResult> {
    store.load().await.results_for(test_id)
}

/// A picked test, its results and the menu to show again, all read from one
/// snapshot of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub test: Test,
    pub results: Vec<TestResult>,
    pub tests: Vec<Test>,
}

/// Resolves a results-menu label such as `Algebra (T100)`. `None` when no
/// test carries exactly that label.
pub async fn results_view(store: &JsonStore, label: &str) -> Option<ResultsView> {
    let label = label.trim();
    let root = store.load().await;
    let test = root.tests.iter().find(|t| t.label() == label)?.clone();

    Some(ResultsView {
        results: root.results_for(&test.test_id),
        tests: root.tests_by_newest(),
        test,
    })
}
