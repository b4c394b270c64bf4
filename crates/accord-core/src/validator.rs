//! The validator capability consumed by endpoint schemas.
//!
//! A [`Validator`] turns an untyped JSON value into a validated (and possibly
//! coerced) JSON value, or reports why it could not. Validators may be
//! asynchronous; synchronous ones simply return a ready future.
//!
//! Implementations provided here:
//!
//! | Validator              | Use                                                      |
//! |------------------------|----------------------------------------------------------|
//! | [`Shape`]              | Declarative JSON shape (types, required fields, bounds)  |
//! | [`Typed`]              | Round trip through a serde type, coercing the payload    |
//! | [`FnValidator`]        | Synchronous parse function (domain value objects)        |
//! | [`AsyncFnValidator`]   | Asynchronous parse function                              |
//!
//! [`Shape`]: crate::Shape

use crate::outcome::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Parses an untyped value into a validated value.
///
/// `parse` takes the raw value by ownership so that coercing validators can
/// return a transformed value without copying.
pub trait Validator: Send + Sync {
    /// Validates `raw`, returning the validated value or the list of issues.
    fn parse<'a>(&'a self, raw: Value) -> BoxFuture<'a, Result<Value, ValidationIssues>>;

    /// A short human-readable description of the expected shape.
    ///
    /// Used as the "expected" side of error diffs.
    fn describe(&self) -> String {
        "value".to_string()
    }
}

/// A validator shared between schemas and calls.
pub type SharedValidator = Arc<dyn Validator>;

impl<V: Validator + ?Sized> Validator for Arc<V> {
    fn parse<'a>(&'a self, raw: Value) -> BoxFuture<'a, Result<Value, ValidationIssues>> {
        (**self).parse(raw)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// JSON path of the offending value (`$` is the root).
    pub path: String,
    /// What went wrong.
    pub message: String,
    /// Description of the expected shape, when known.
    pub expected: Option<String>,
    /// The value that was received, when available.
    pub received: Option<Value>,
}

impl ValidationIssue {
    /// Creates an issue at `path`.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            expected: None,
            received: None,
        }
    }

    /// Sets the expected-shape description.
    #[must_use]
    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Sets the received value.
    #[must_use]
    pub fn received(mut self, received: Value) -> Self {
        self.received = Some(received);
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        match (&self.expected, &self.received) {
            (Some(expected), Some(received)) => {
                write!(f, " (expected {expected}, received {received})")
            }
            (Some(expected), None) => write!(f, " (expected {expected})"),
            (None, Some(received)) => write!(f, " (received {received})"),
            (None, None) => Ok(()),
        }
    }
}

/// A non-empty list of validation issues.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssues(Vec<ValidationIssue>);

impl ValidationIssues {
    /// Wraps a single issue.
    pub fn single(issue: ValidationIssue) -> Self {
        Self(vec![issue])
    }

    /// Builds a list from collected issues, returning `None` if there were none.
    pub fn from_vec(issues: Vec<ValidationIssue>) -> Option<Self> {
        if issues.is_empty() {
            None
        } else {
            Some(Self(issues))
        }
    }

    /// Prefixes every issue path with `field` (e.g. `body`, `query`).
    #[must_use]
    pub fn scoped(self, field: &str) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|mut issue| {
                    issue.path = match issue.path.strip_prefix('$') {
                        Some(rest) => format!("{field}{rest}"),
                        None => format!("{field}.{}", issue.path),
                    };
                    issue
                })
                .collect(),
        )
    }

    /// Appends the issues of `other`.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Returns the issues.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter()
    }

    /// Returns the number of issues (always at least one).
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first issue.
    #[must_use]
    pub fn first(&self) -> &ValidationIssue {
        &self.0[0]
    }

    /// Consumes the list.
    pub fn into_vec(self) -> Vec<ValidationIssue> {
        self.0
    }
}

impl From<ValidationIssue> for ValidationIssues {
    fn from(issue: ValidationIssue) -> Self {
        Self::single(issue)
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationIssues {}

/// Validates by deserializing into `T` and serializing back.
///
/// Unknown fields are dropped and serde defaults are filled in, so the
/// validated value may differ from the raw one. An optional refinement runs
/// on the typed value.
///
/// # Example
///
/// ```
/// use accord_core::{Typed, Validator};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     id: String,
///     handle: String,
/// }
///
/// # tokio_test::block_on(async {
/// let validator = Typed::<User>::new();
/// let parsed = validator
///     .parse(json!({"id": "u1", "handle": "bob", "extra": 1}))
///     .await
///     .unwrap();
/// assert_eq!(parsed, json!({"id": "u1", "handle": "bob"}));
/// # });
/// ```
pub struct Typed<T> {
    refine: Option<Arc<dyn Fn(&T) -> Result<(), String> + Send + Sync>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Typed<T> {
    /// Creates a typed validator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            refine: None,
            _marker: PhantomData,
        }
    }

    /// Adds a refinement check run after deserialization.
    #[must_use]
    pub fn refine<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.refine = Some(Arc::new(check));
        self
    }
}

impl<T> Default for Typed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Typed<T>
where
    T: DeserializeOwned + Serialize,
{
    fn check(&self, raw: Value) -> Result<Value, ValidationIssues> {
        let typed: T = serde_json::from_value(raw.clone()).map_err(|e| {
            ValidationIssue::new("$", e.to_string())
                .expected(self.describe_type())
                .received(raw.clone())
        })?;

        if let Some(refine) = &self.refine {
            refine(&typed).map_err(|message| {
                ValidationIssue::new("$", message)
                    .expected(self.describe_type())
                    .received(raw.clone())
            })?;
        }

        serde_json::to_value(&typed)
            .map_err(|e| ValidationIssue::new("$", format!("re-encoding failed: {e}")).into())
    }

    fn describe_type(&self) -> String {
        let name = std::any::type_name::<T>();
        name.rsplit("::").next().unwrap_or(name).to_string()
    }
}

impl<T> Validator for Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn parse<'a>(&'a self, raw: Value) -> BoxFuture<'a, Result<Value, ValidationIssues>> {
        Box::pin(std::future::ready(self.check(raw)))
    }

    fn describe(&self) -> String {
        self.describe_type()
    }
}

/// Wraps a synchronous parse function.
///
/// This is how domain value objects (dates, coordinates, handles, colors)
/// plug into a schema: each exposes a function from raw to validated value
/// or failure.
///
/// # Example
///
/// ```
/// use accord_core::{FnValidator, Validator};
/// use serde_json::{json, Value};
///
/// let handle = FnValidator::new("handle", |raw: &Value| match raw.as_str() {
///     Some(s) if s.starts_with('@') => Ok(json!(s.to_lowercase())),
///     _ => Err("handles start with '@'".to_string()),
/// });
///
/// # tokio_test::block_on(async {
/// assert_eq!(handle.parse(json!("@Bob")).await.unwrap(), json!("@bob"));
/// assert!(handle.parse(json!("bob")).await.is_err());
/// # });
/// ```
pub struct FnValidator<F> {
    name: String,
    func: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value) -> Result<Value, String> + Send + Sync,
{
    /// Creates a validator named `name` (used as the expected description).
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value) -> Result<Value, String> + Send + Sync,
{
    fn parse<'a>(&'a self, raw: Value) -> BoxFuture<'a, Result<Value, ValidationIssues>> {
        let result: Result<Value, ValidationIssues> = (self.func)(&raw).map_err(|message| {
            ValidationIssue::new("$", message)
                .expected(self.name.clone())
                .received(raw)
                .into()
        });
        Box::pin(std::future::ready(result))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Wraps an asynchronous parse function.
pub struct AsyncFnValidator<F> {
    name: String,
    func: F,
}

impl<F, Fut> AsyncFnValidator<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ValidationIssues>> + Send + 'static,
{
    /// Creates a validator named `name`.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F, Fut> Validator for AsyncFnValidator<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ValidationIssues>> + Send + 'static,
{
    fn parse<'a>(&'a self, raw: Value) -> BoxFuture<'a, Result<Value, ValidationIssues>> {
        Box::pin((self.func)(raw))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Coordinates {
        lat: f64,
        lon: f64,
    }

    #[tokio::test]
    async fn test_typed_accepts_and_coerces() {
        let validator = Typed::<Coordinates>::new();
        let value = validator
            .parse(json!({"lat": 1, "lon": 2.5, "alt": 3}))
            .await
            .unwrap();
        assert_eq!(value, json!({"lat": 1.0, "lon": 2.5}));
    }

    #[tokio::test]
    async fn test_typed_reports_received_value() {
        let validator = Typed::<Coordinates>::new();
        let issues = validator.parse(json!({"lat": "north"})).await.unwrap_err();
        let issue = issues.first();
        assert_eq!(issue.expected.as_deref(), Some("Coordinates"));
        assert_eq!(issue.received, Some(json!({"lat": "north"})));
    }

    #[tokio::test]
    async fn test_typed_refinement() {
        let validator = Typed::<Coordinates>::new().refine(|c| {
            if (-90.0..=90.0).contains(&c.lat) {
                Ok(())
            } else {
                Err(format!("latitude {} out of range", c.lat))
            }
        });
        assert!(validator.parse(json!({"lat": 10, "lon": 0})).await.is_ok());
        let issues = validator.parse(json!({"lat": 100, "lon": 0})).await.unwrap_err();
        assert!(issues.first().message.contains("out of range"));
    }

    #[tokio::test]
    async fn test_async_fn_validator() {
        let validator = AsyncFnValidator::new("even", |raw: Value| async move {
            match raw.as_i64() {
                Some(n) if n % 2 == 0 => Ok(raw),
                _ => Err(ValidationIssue::new("$", "not even").into()),
            }
        });
        assert!(validator.parse(json!(4)).await.is_ok());
        assert!(validator.parse(json!(3)).await.is_err());
        assert_eq!(validator.describe(), "even");
    }

    #[test]
    fn test_issues_scoping() {
        let issues = ValidationIssues::from_vec(vec![
            ValidationIssue::new("$", "root"),
            ValidationIssue::new("$.id", "nested"),
        ])
        .unwrap()
        .scoped("body");
        let paths: Vec<_> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["body", "body.id"]);
    }

    #[test]
    fn test_issue_display_includes_diff() {
        let issue = ValidationIssue::new("$.id", "wrong type")
            .expected("string")
            .received(json!(7));
        assert_eq!(issue.to_string(), "$.id: wrong type (expected string, received 7)");
    }

    #[test]
    fn test_empty_issue_list_is_none() {
        assert!(ValidationIssues::from_vec(Vec::new()).is_none());
    }
}
