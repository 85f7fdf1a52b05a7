//! Built-in hooks, usable by name from data-defined flows.

use restbench_value::Value;

use super::error::{Error, Result};
use super::exchange::{Exchange, Hook};

/// Log the outgoing request line to stderr.
#[must_use]
pub fn log_request() -> Hook {
    Hook::new("logRequest", |ex: Exchange| {
        eprintln!(">> {} {}", ex.request.method, ex.request.url);
        ex
    })
}

/// Pull `data.access_token` out of a JSON response body into the iteration
/// context, for reuse by `provideAccessToken` later in the same iteration.
#[must_use]
pub fn capture_access_token() -> Hook {
    Hook::new("captureAccessToken", |mut ex: Exchange| {
        let token = ex
            .outcome
            .as_ref()
            .and_then(|o| o.json())
            .and_then(|json| json.pointer("data.access_token"))
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(token) = token {
            ex.ctx.set("access_token", token);
        }
        ex
    })
}

/// Inject `Authorization: Bearer <token>` from the iteration context, when a
/// token was captured earlier in the iteration.
#[must_use]
pub fn provide_access_token() -> Hook {
    Hook::new("provideAccessToken", |mut ex: Exchange| {
        if let Some(token) = ex.ctx.get_str("access_token").map(str::to_string) {
            ex.request
                .set_header("Authorization", format!("Bearer {token}"));
        }
        ex
    })
}

/// Resolve a built-in hook by its flow-definition name.
pub fn resolve(name: &str) -> Result<Hook> {
    match name {
        "logRequest" => Ok(log_request()),
        "captureAccessToken" => Ok(capture_access_token()),
        "provideAccessToken" => Ok(provide_access_token()),
        other => Err(Error::UnknownHook(other.to_string())),
    }
}
