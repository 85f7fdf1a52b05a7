use bytes::Bytes;
use restbench_value::{ObjectMap, Value};
use std::fmt;
use std::sync::Arc;

/// Mutable key/value state scoped to exactly one iteration. Created when the
/// iteration enters its `beforeMain` stage and discarded when `afterMain`
/// completes; never shared across iterations.
#[derive(Debug, Default)]
pub struct IterationContext {
    values: ObjectMap,
}

impl IterationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(Arc::from(key), value.into());
    }
}

/// Outgoing request side of an exchange; mutable until the request is sent.
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: http::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub json: Option<Value>,
}

impl RequestParts {
    /// Set a header, replacing any existing header with the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response side of an exchange, attached after dispatch.
#[derive(Debug, Clone)]
pub enum Outcome {
    Response {
        status: u16,
        body: Bytes,
        /// Parsed JSON body, when the body parses as JSON.
        json: Option<Value>,
    },
    Failed {
        error: String,
    },
}

impl Outcome {
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        match self {
            Self::Response { json, .. } => json.as_ref(),
            Self::Failed { .. } => None,
        }
    }
}

/// The transient per-request bundle passed through hook chains.
///
/// Pre-hooks observe/mutate the outgoing `request`; post-hooks observe the
/// `outcome` and may mutate `ctx` for later requests of the same iteration.
#[derive(Debug)]
pub struct Exchange {
    pub iteration: u64,
    pub request: RequestParts,
    pub outcome: Option<Outcome>,
    pub ctx: IterationContext,
}

/// A hook is a pure transformation `Exchange -> Exchange`; chains fold
/// left-to-right. Hooks never fail and never touch global state.
#[derive(Clone)]
pub struct Hook {
    name: Arc<str>,
    f: Arc<dyn Fn(Exchange) -> Exchange + Send + Sync>,
}

impl Hook {
    pub fn new(
        name: &str,
        f: impl Fn(Exchange) -> Exchange + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name),
            f: Arc::new(f),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn apply(&self, exchange: Exchange) -> Exchange {
        (self.f)(exchange)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hook").field(&self.name).finish()
    }
}

/// Fold a hook chain over an exchange, left-to-right. An empty chain passes
/// the exchange through unchanged.
#[must_use]
pub fn apply_chain(hooks: &[Hook], exchange: Exchange) -> Exchange {
    hooks.iter().fold(exchange, |ex, hook| hook.apply(ex))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_parts() -> RequestParts {
        RequestParts {
            method: http::Method::GET,
            url: "http://localhost:8000/foo".to_string(),
            headers: Vec::new(),
            json: None,
        }
    }

    fn exchange() -> Exchange {
        Exchange {
            iteration: 0,
            request: request_parts(),
            outcome: None,
            ctx: IterationContext::new(),
        }
    }

    #[test]
    fn empty_chain_passes_through() {
        let ex = apply_chain(&[], exchange());
        assert_eq!(ex.request.url, "http://localhost:8000/foo");
        assert!(ex.request.headers.is_empty());
    }

    #[test]
    fn chain_folds_left_to_right() {
        let first = Hook::new("first", |mut ex: Exchange| {
            ex.request.url.push_str("/a");
            ex
        });
        let second = Hook::new("second", |mut ex: Exchange| {
            ex.request.url.push_str("/b");
            ex
        });

        let ex = apply_chain(&[first, second], exchange());
        assert!(ex.request.url.ends_with("/a/b"));
    }

    #[test]
    fn hook_threads_context_between_requests() {
        let capture = Hook::new("capture", |mut ex: Exchange| {
            ex.ctx.set("token", "tok-1");
            ex
        });
        let provide = Hook::new("provide", |mut ex: Exchange| {
            if let Some(token) = ex.ctx.get_str("token").map(str::to_string) {
                ex.request.set_header("authorization", format!("Bearer {token}"));
            }
            ex
        });

        let ex = capture.apply(exchange());
        let mut next = exchange();
        next.ctx = ex.ctx;
        let next = provide.apply(next);

        assert_eq!(next.request.header("authorization"), Some("Bearer tok-1"));
    }

    #[test]
    fn set_header_replaces_existing() {
        let mut parts = request_parts();
        parts.set_header("Authorization", "Bearer a");
        parts.set_header("authorization", "Bearer b");

        assert_eq!(parts.header("Authorization"), Some("Bearer b"));
        assert_eq!(parts.headers.len(), 1);
    }
}
