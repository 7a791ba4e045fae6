// src/dialogue.rs

use crate::{
    error::AppError,
    models::{
        event::{InboundEvent, MenuHint, Outbound},
        result::TestResult,
        test::Test,
    },
    services::{admin, submission},
    session::{Session, Step},
    state::AppState,
};

pub const CMD_START: &str = "/start";
pub const CMD_ADMIN: &str = "/admin";
pub const BTN_ADD_TEST: &str = "➕ Add test";
pub const BTN_VIEW_RESULTS: &str = "📊 View results";
pub const BTN_DELETE_TEST: &str = "🗑 Delete test";
pub const BTN_BACK: &str = "⬅️ Back";
/// Prefix of the labels offered in the delete menu.
pub const DELETE_MARKER: &str = "❌ ";

/// Routes one inbound message and returns what the transport should send.
///
/// Holds the conversation's session for the whole event, so messages from the
/// same chat are handled strictly one after another.
pub async fn handle_event(state: &AppState, event: InboundEvent) -> Vec<Outbound> {
    let mut session = state.sessions.acquire(event.conversation_id).await;
    let text = event.text.trim();

    match text {
        CMD_START | CMD_ADMIN => return start(&mut session, &event),
        BTN_ADD_TEST | BTN_VIEW_RESULTS | BTN_DELETE_TEST => {
            // Unauthorized callers get no answer at all.
            if let Err(e) = require_operator(&event) {
                tracing::debug!(caller = event.caller.id, "Ignoring menu action: {}", e);
                return vec![Outbound::Noop];
            }
            // A menu action abandons whatever dialogue was in flight.
            session.reset();
            return match text {
                BTN_ADD_TEST => add_test(&mut session, &event),
                BTN_VIEW_RESULTS => view_results_menu(state, &event).await,
                _ => delete_test_menu(state, &mut session, &event).await,
            };
        }
        BTN_BACK => return back(&mut session, &event),
        _ => {}
    }

    match session.step().clone() {
        Step::AwaitingTestName => receive_test_name(&mut session, &event),
        Step::AwaitingAnswerKey { .. } => finalize_test(state, &mut session, &event).await,
        Step::AwaitingDeleteSelection => delete_selected(state, &mut session, &event).await,
        Step::AwaitingLearnerName { .. } => receive_name(&mut session, &event),
        Step::AwaitingLearnerAnswers { .. } => submit(state, &mut session, &event).await,
        Step::Idle if event.is_operator => show_results(state, &event).await,
        Step::Idle => begin_identification(&mut session, &event),
    }
}

fn require_operator(event: &InboundEvent) -> Result<(), AppError> {
    if event.is_operator {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

fn start(session: &mut Session, event: &InboundEvent) -> Vec<Outbound> {
    session.reset();
    if event.is_operator {
        return vec![Outbound::with_menu(
            event.conversation_id,
            "🧑‍💼 Hello, operator!",
            MenuHint::MainMenu,
        )];
    }
    begin_identification(session, event)
}

fn begin_identification(session: &mut Session, event: &InboundEvent) -> Vec<Outbound> {
    match submission::begin_identification(session, &event.caller) {
        Ok(()) => vec![Outbound::message(
            event.conversation_id,
            "👋 Welcome! Please enter your full name:",
        )],
        Err(e) => unexpected(event, e),
    }
}

fn receive_name(session: &mut Session, event: &InboundEvent) -> Vec<Outbound> {
    match submission::receive_name(session, &event.text) {
        Ok(()) => vec![Outbound::message(
            event.conversation_id,
            "✅ Now send the test ID and your answers (e.g. XXXXX 1a2b3c...30a):",
        )],
        Err(AppError::Validation(_)) => vec![Outbound::message(
            event.conversation_id,
            "❌ Please enter your full name:",
        )],
        Err(e) => unexpected(event, e),
    }
}

async fn submit(state: &AppState, session: &mut Session, event: &InboundEvent) -> Vec<Outbound> {
    let now = state.clock.now();
    let operators = &state.config.operator_ids;

    match submission::submit(&state.store, session, &event.text, now, operators).await {
        Ok(done) => {
            let r = &done.result;
            vec![
                Outbound::message(
                    event.conversation_id,
                    format!(
                        "📊 Your result:\n🧑‍🎓 {} (@{})\n🆔 {}\n✅ {}\n❌ {}",
                        r.student_name, r.username, r.test_id, r.correct_count, r.incorrect_count
                    ),
                ),
                Outbound::NotifyOperators {
                    recipients: done.notify,
                    text: format!(
                        "📥 {} (@{})\n🆔 {}\n✅ {}\n❌ {}",
                        r.student_name, r.username, r.test_id, r.correct_count, r.incorrect_count
                    ),
                },
            ]
        }
        Err(AppError::Validation(_)) => vec![Outbound::message(
            event.conversation_id,
            "❌ Invalid format. Example: XXXXX 1a2b3c...",
        )],
        Err(AppError::NotFound(_)) => vec![Outbound::message(
            event.conversation_id,
            "❌ This test was not found.",
        )],
        Err(AppError::Duplicate(_)) => {
            session.reset();
            vec![Outbound::message(
                event.conversation_id,
                "⚠️ You have already taken this test today.",
            )]
        }
        Err(AppError::Persistence(_)) => vec![Outbound::message(
            event.conversation_id,
            "❌ Could not save your result, please try again.",
        )],
        Err(e) => unexpected(event, e),
    }
}

fn add_test(session: &mut Session, event: &InboundEvent) -> Vec<Outbound> {
    match admin::start_authoring(session) {
        Ok(()) => vec![Outbound::with_menu(
            event.conversation_id,
            "🧾 Enter the test name:",
            MenuHint::BackOnly,
        )],
        Err(e) => unexpected(event, e),
    }
}

fn receive_test_name(session: &mut Session, event: &InboundEvent) -> Vec<Outbound> {
    match admin::receive_test_name(session, &event.text) {
        Ok(()) => vec![Outbound::with_menu(
            event.conversation_id,
            "✅ Now enter the correct answers (e.g. 1a2b3c...30a, or ID-1a2b3c...):",
            MenuHint::BackOnly,
        )],
        Err(e) => unexpected(event, e),
    }
}

async fn finalize_test(state: &AppState, session: &mut Session, event: &InboundEvent) -> Vec<Outbound> {
    let now = state.clock.now();
    match admin::finalize_test(&state.store, session, &event.text, now).await {
        Ok(test) => vec![Outbound::with_menu(
            event.conversation_id,
            format!("✅ Test saved!\n🆔 {}\n📘 {}", test.test_id, test.test_name),
            MenuHint::MainMenu,
        )],
        Err(AppError::Validation(msg)) => vec![Outbound::with_menu(
            event.conversation_id,
            format!("❌ Invalid test ID ({}). Try again, e.g. T100-1a2b3c:", msg),
            MenuHint::BackOnly,
        )],
        Err(AppError::Persistence(_)) => vec![Outbound::with_menu(
            event.conversation_id,
            "❌ Could not save the test, please send it again.",
            MenuHint::BackOnly,
        )],
        Err(e) => unexpected(event, e),
    }
}

async fn view_results_menu(state: &AppState, event: &InboundEvent) -> Vec<Outbound> {
    let tests = admin::list_tests(&state.store).await;
    if tests.is_empty() {
        return vec![Outbound::with_menu(
            event.conversation_id,
            "📭 There are no tests yet.",
            MenuHint::MainMenu,
        )];
    }
    vec![Outbound::with_menu(
        event.conversation_id,
        "📋 Tests:",
        test_list(&tests, false),
    )]
}

async fn delete_test_menu(state: &AppState, session: &mut Session, event: &InboundEvent) -> Vec<Outbound> {
    match admin::start_deletion(&state.store, session).await {
        Ok(tests) => vec![Outbound::with_menu(
            event.conversation_id,
            "🗑 Choose the test to delete:",
            test_list(&tests, true),
        )],
        Err(AppError::NotFound(_)) => vec![Outbound::with_menu(
            event.conversation_id,
            "📭 There are no tests to delete.",
            MenuHint::MainMenu,
        )],
        Err(e) => unexpected(event, e),
    }
}

async fn delete_selected(state: &AppState, session: &mut Session, event: &InboundEvent) -> Vec<Outbound> {
    match admin::delete_selected(&state.store, session, &event.text).await {
        Ok(test) => vec![Outbound::with_menu(
            event.conversation_id,
            format!("✅ Test deleted!\n🆔 {}\n📘 {}", test.test_id, test.test_name),
            MenuHint::MainMenu,
        )],
        Err(AppError::NotFound(_)) => vec![Outbound::message(
            event.conversation_id,
            "❌ Test not found, try again.",
        )],
        Err(AppError::Persistence(_)) => vec![Outbound::message(
            event.conversation_id,
            "❌ Could not delete the test, please try again.",
        )],
        Err(e) => unexpected(event, e),
    }
}

/// An operator picked a test label from the results menu.
async fn show_results(state: &AppState, event: &InboundEvent) -> Vec<Outbound> {
    let Some(view) = admin::results_view(&state.store, &event.text).await else {
        return vec![Outbound::Noop];
    };

    vec![Outbound::with_menu(
        event.conversation_id,
        format_results(&view.test, &view.results),
        test_list(&view.tests, false),
    )]
}

fn back(session: &mut Session, event: &InboundEvent) -> Vec<Outbound> {
    session.reset();
    if event.is_operator {
        vec![Outbound::with_menu(
            event.conversation_id,
            "🏠 Main menu",
            MenuHint::MainMenu,
        )]
    } else {
        vec![Outbound::message(
            event.conversation_id,
            "↩️ Cancelled. Send any message to start again.",
        )]
    }
}

fn test_list(tests: &[Test], with_delete_marker: bool) -> MenuHint {
    let labels = tests
        .iter()
        .map(|t| {
            if with_delete_marker {
                format!("{}{}", DELETE_MARKER, t.label())
            } else {
                t.label()
            }
        })
        .collect();
    MenuHint::TestList {
        with_delete_marker,
        labels,
    }
}

pub fn format_results(test: &Test, results: &[TestResult]) -> String {
    if results.is_empty() {
        return format!(
            "📭 Nobody has taken this test yet.\n🆔 {} ({})",
            test.test_id, test.test_name
        );
    }

    let mut text = format!("📊 {}\n🆔 {}\n\n", test.test_name, test.test_id);
    for r in results {
        text.push_str(&format!(
            "🧑‍🎓 {} (@{})\n✅ {} | ❌ {}\n🕓 {}\n\n",
            r.student_name,
            r.username,
            r.correct_count,
            r.incorrect_count,
            r.date.format(crate::utils::clock::timestamp::FORMAT)
        ));
    }
    text
}

/// Transitions that should be impossible given the routing above.
fn unexpected(event: &InboundEvent, err: AppError) -> Vec<Outbound> {
    tracing::error!(
        conversation_id = event.conversation_id,
        "Unexpected dialogue error: {}",
        err
    );
    vec![Outbound::message(
        event.conversation_id,
        "❌ Something went wrong, please try again.",
    )]
}
