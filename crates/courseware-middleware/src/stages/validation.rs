//! Request validation middleware.
//!
//! Each operation can register a [`RuleSet`]: an ordered list of field rules
//! checked against the JSON request body. Every rule runs; the messages of
//! all failing rules are returned together as
//! `400 {"errors": ["...", "..."]}`, in rule order. Operations without rules
//! pass through untouched.
//!
//! # Checks
//!
//! | Check     | Fails when                                              |
//! |-----------|---------------------------------------------------------|
//! | `Present` | the field is missing, `null` or an empty string         |
//! | `Truthy`  | the field is missing or falsy (`""`, `null`, `false`, `0`) |
//! | `Email`   | the field is a non-empty value that is not an address   |
//!
//! # Example
//!
//! ```
//! use courseware_middleware::stages::validation::{Rule, RuleSet, ValidationMiddleware};
//!
//! let middleware = ValidationMiddleware::new().rules(
//!     "createCourse",
//!     RuleSet::new()
//!         .rule(Rule::present("title"))
//!         .rule(Rule::present("description")),
//! );
//! assert!(middleware.has_rules("createCourse"));
//! assert!(!middleware.has_rules("listCourses"));
//! ```

use crate::{
    context::MiddlewareContext,
    middleware::{BoxFuture, Middleware, Next},
    types::{Request, Response, ResponseExt},
};
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Loose address shape: something, `@`, something, `.`, something.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Message used when the body is not a JSON object.
pub const MALFORMED_BODY_MESSAGE: &str = "Request body must be a JSON object";

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

/// A predicate applied to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// The field exists, is not `null` and is not an empty string.
    Present,
    /// The field exists and is not falsy.
    Truthy,
    /// The field, when non-empty, is a string shaped like an email address.
    Email,
}

impl Check {
    fn passes(self, value: Option<&Value>) -> bool {
        match self {
            Self::Present => match value {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            },
            Self::Truthy => value.is_some_and(is_truthy),
            Self::Email => match value {
                None | Some(Value::Null) => true,
                // left to `Present`
                Some(Value::String(s)) if s.is_empty() => true,
                Some(Value::String(s)) => email_regex().is_some_and(|re| re.is_match(s)),
                Some(_) => false,
            },
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// One field rule and the message reported when it fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// JSON field name.
    pub field: String,
    /// The check applied.
    pub check: Check,
    /// Message reported on failure.
    pub message: String,
}

impl Rule {
    /// Creates a rule with an explicit message.
    pub fn new(field: impl Into<String>, check: Check, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            check,
            message: message.into(),
        }
    }

    /// The field must be present.
    pub fn present(field: &str) -> Self {
        Self::new(field, Check::Present, format!("Please provide a value for \"{field}\""))
    }

    /// The field must be present and truthy.
    pub fn truthy(field: &str) -> Self {
        Self::new(field, Check::Truthy, format!("Please provide a value for \"{field}\""))
    }

    /// The field, if given, must look like an email address.
    pub fn email(field: &str) -> Self {
        Self::new(
            field,
            Check::Email,
            format!("Please provide a valid email address for \"{field}\""),
        )
    }

    /// Replaces the failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn passes(&self, body: &Map<String, Value>) -> bool {
        self.check.passes(body.get(&self.field))
    }
}

/// Ordered rules for one operation.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runs every rule and returns the messages of the failing ones.
    pub fn validate(&self, body: &Map<String, Value>) -> Vec<String> {
        self.rules
            .iter()
            .filter(|rule| !rule.passes(body))
            .map(|rule| rule.message.clone())
            .collect()
    }

    /// Validates a raw body. An empty body counts as `{}`.
    pub fn validate_bytes(&self, body: &[u8]) -> Vec<String> {
        if body.is_empty() {
            return self.validate(&Map::new());
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => self.validate(&map),
            _ => vec![MALFORMED_BODY_MESSAGE.to_string()],
        }
    }
}

/// Middleware that applies per-operation [`RuleSet`]s.
#[derive(Debug, Clone, Default)]
pub struct ValidationMiddleware {
    rules: HashMap<String, RuleSet>,
}

impl ValidationMiddleware {
    /// Creates a middleware with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the rules for `operation_id`, replacing earlier ones.
    pub fn rules(mut self, operation_id: impl Into<String>, rules: RuleSet) -> Self {
        self.rules.insert(operation_id.into(), rules);
        self
    }

    /// Returns `true` if `operation_id` has rules.
    pub fn has_rules(&self, operation_id: &str) -> bool {
        self.rules.contains_key(operation_id)
    }
}

impl Middleware for ValidationMiddleware {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let Some(rules) = ctx.operation_id().and_then(|op| self.rules.get(op)) else {
                return next.run(ctx, request).await;
            };

            let (parts, body) = request.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            let errors = rules.validate_bytes(&bytes);
            if !errors.is_empty() {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    operation_id = ctx.operation_id().unwrap_or_default(),
                    error_count = errors.len(),
                    "request validation failed"
                );
                return Response::json(
                    StatusCode::BAD_REQUEST,
                    &serde_json::json!({ "errors": errors }),
                );
            }

            next.run(ctx, Request::from_parts(parts, Full::new(bytes))).await
        })
    }
}
