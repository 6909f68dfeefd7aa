//! Classification of non-ok responses

use crate::session::State;
use crate::types::IgResponse;
use crate::{Error, ErrorCategory};
use reqwest::StatusCode;
use serde_json::Value;

/// Turn a response whose body is not `status: "ok"` into an error
///
/// Rules are checked in order and the first match wins. Only the
/// `challenge_required` rule touches the session: the whole body is stored
/// as the checkpoint.
pub fn classify(state: &State, response: IgResponse) -> Error {
    let error = classify_response(response);
    if let Error::CheckpointRequired(response) = &error {
        state.store_checkpoint(&response.body);
    }
    tracing::debug!("Classified response as {:?}", error.category());
    error
}

/// Category a response would be classified as, without side effects
pub fn category_of(response: &IgResponse) -> ErrorCategory {
    match rule(response) {
        Rule::Spam => ErrorCategory::ActionSpam,
        Rule::NotFound => ErrorCategory::NotFound,
        Rule::Checkpoint => ErrorCategory::CheckpointRequired,
        Rule::Login => ErrorCategory::LoginRequired,
        Rule::Private => ErrorCategory::PrivateUser,
        Rule::Sentry => ErrorCategory::SentryBlock,
        Rule::Other => ErrorCategory::Response,
    }
}

enum Rule {
    Spam,
    NotFound,
    Checkpoint,
    Login,
    Private,
    Sentry,
    Other,
}

fn rule(response: &IgResponse) -> Rule {
    if response.body.get("spam").is_some_and(is_truthy) {
        return Rule::Spam;
    }
    if response.status == StatusCode::NOT_FOUND {
        return Rule::NotFound;
    }
    match response.message() {
        Some("challenge_required") => return Rule::Checkpoint,
        Some("login_required") => return Rule::Login,
        Some(message) if message.eq_ignore_ascii_case("not authorized to view user") => {
            return Rule::Private;
        }
        _ => {}
    }
    if response.error_type() == Some("sentry_block") {
        return Rule::Sentry;
    }
    Rule::Other
}

fn classify_response(response: IgResponse) -> Error {
    let rule = rule(&response);
    let response = Box::new(response);
    match rule {
        Rule::Spam => Error::ActionSpam(response),
        Rule::NotFound => Error::NotFound(response),
        Rule::Checkpoint => Error::CheckpointRequired(response),
        Rule::Login => Error::LoginRequired(response),
        Rule::Private => Error::PrivateUser(response),
        Rule::Sentry => Error::SentryBlock(response),
        Rule::Other => Error::Response(response),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
