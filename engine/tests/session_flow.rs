//! End-to-end session flows through the App orchestrator, against both the
//! local backend and a mocked remote evaluator.

use std::time::Duration;

use tally_engine::{App, SessionInput};
use tally_evaluator::{
    Evaluator, local::LocalEvaluator, remote::RemoteEvaluator, retry::RetryConfig,
};
use tally_types::{Digit, Operator};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn local_app() -> App {
    App::new(Evaluator::Local(LocalEvaluator::new()))
}

fn remote_app(base_url: &str) -> App {
    let retry = RetryConfig {
        max_retries: 0,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
        jitter_factor: 0.0,
    };
    let remote = RemoteEvaluator::new(base_url, Duration::from_secs(5), retry).unwrap();
    App::new(Evaluator::Remote(remote))
}

/// Feed a keypad string: digits, `.`, operators, `c` for clear.
fn press(app: &mut App, keys: &str) {
    for c in keys.chars() {
        let input = match c {
            '0'..='9' => SessionInput::Digit(Digit::from_char(c).unwrap()),
            '.' => SessionInput::Decimal,
            'c' => SessionInput::Clear,
            _ => SessionInput::Operator(Operator::from_char(c).unwrap()),
        };
        app.handle_input(input);
    }
}

/// Drain outcomes until the in-flight evaluation resolves.
async fn settle(app: &mut App) {
    for _ in 0..2000 {
        app.process_eval_events();
        if !app.busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("evaluation never settled");
}

#[tokio::test]
async fn seven_plus_three_equals_ten() {
    let mut app = local_app();
    press(&mut app, "7+3=");
    settle(&mut app).await;

    assert_eq!(app.display_text(), "10");
    assert_eq!(app.session().first_operand(), Some(10.0));
    assert_eq!(app.session().pending_operator(), Some(Operator::Equals));
}

#[tokio::test]
async fn eight_divided_by_zero_shows_error() {
    let mut app = local_app();
    press(&mut app, "8/0=");
    settle(&mut app).await;

    assert_eq!(app.display_text(), "Error");
    // Operands survive the failure so the user can clear or keep typing.
    assert_eq!(app.session().first_operand(), Some(8.0));
}

#[tokio::test]
async fn equals_on_a_fresh_session_makes_no_remote_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calculate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = remote_app(&server.uri());
    press(&mut app, "=");
    app.process_eval_events();

    assert!(!app.busy());
    assert_eq!(app.display_text(), "0");
    assert_eq!(app.session().first_operand(), Some(0.0));
}

#[tokio::test]
async fn first_operator_press_makes_no_remote_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calculate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = remote_app(&server.uri());
    press(&mut app, "7+");
    app.process_eval_events();

    assert!(!app.busy());
    assert_eq!(app.display_text(), "7");
    assert_eq!(app.session().first_operand(), Some(7.0));
}

#[tokio::test]
async fn second_operator_triggers_exactly_one_call_with_captured_operands() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calculate"))
        .and(body_json(serde_json::json!({
            "operator": "+",
            "a": 7.0,
            "b": 3.0,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": 10.0})))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = remote_app(&server.uri());
    press(&mut app, "7+3=");
    settle(&mut app).await;

    assert_eq!(app.display_text(), "10");
    assert_eq!(app.session().first_operand(), Some(10.0));
}

#[tokio::test]
async fn remote_failure_collapses_to_the_error_display() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calculate"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "error": {"code": "division_by_zero", "message": "b must be non-zero"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = remote_app(&server.uri());
    press(&mut app, "8/0=");
    settle(&mut app).await;

    assert_eq!(app.display_text(), "Error");
}

#[tokio::test]
async fn display_reads_calculating_while_busy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calculate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"result": 10.0}))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let mut app = remote_app(&server.uri());
    press(&mut app, "7+3=");

    assert!(app.busy());
    assert_eq!(app.display_text(), "Calculating...");

    settle(&mut app).await;
    assert_eq!(app.display_text(), "10");
}

#[tokio::test]
async fn operator_press_while_busy_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calculate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"result": 10.0}))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = remote_app(&server.uri());
    press(&mut app, "7+3=");
    press(&mut app, "*"); // in flight: rejected, no second call

    settle(&mut app).await;
    assert_eq!(app.display_text(), "10");
    // The rejected press left the stored operator alone.
    assert_eq!(app.session().pending_operator(), Some(Operator::Equals));
}

#[tokio::test]
async fn digits_while_busy_are_buffered_and_the_result_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calculate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"result": 10.0}))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let mut app = remote_app(&server.uri());
    press(&mut app, "7+3=");
    press(&mut app, "5"); // accepted into the session, masked by the busy text
    assert_eq!(app.display_text(), "Calculating...");

    settle(&mut app).await;
    assert_eq!(app.display_text(), "10");
}

#[tokio::test]
async fn clear_while_busy_drops_the_late_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calculate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"result": 10.0}))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let mut app = remote_app(&server.uri());
    press(&mut app, "7+3=");
    assert!(app.busy());

    press(&mut app, "c");
    assert!(!app.busy());
    assert_eq!(app.display_text(), "0");

    // Let the in-flight continuation run to completion, then make sure its
    // outcome cannot resurrect pre-clear state.
    tokio::time::sleep(Duration::from_millis(300)).await;
    app.process_eval_events();

    assert_eq!(app.display_text(), "0");
    assert_eq!(app.session().first_operand(), None);
    assert_eq!(app.session().pending_operator(), None);
}

#[tokio::test]
async fn stored_equals_fails_as_invalid_operator_on_the_next_press() {
    let mut app = local_app();
    press(&mut app, "7+3=");
    settle(&mut app).await;
    assert_eq!(app.display_text(), "10");

    // '=' was stored as the pending operator; the next due computation
    // sends it to the evaluator, which rejects it.
    press(&mut app, "4+");
    settle(&mut app).await;
    assert_eq!(app.display_text(), "Error");
}
