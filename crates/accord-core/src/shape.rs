//! Declarative JSON shapes.
//!
//! A [`Shape`] describes the structure a JSON payload must have. It is the
//! lightest way to give an endpoint a validator without defining Rust types,
//! and it reports every mismatch it finds (not just the first) together with
//! the path, the expected shape and the received value.
//!
//! # Example
//!
//! ```
//! use accord_core::Shape;
//! use serde_json::json;
//!
//! let user = Shape::object(vec![
//!     ("id", Shape::string().required()),
//!     ("handle", Shape::string().min_length(1).required()),
//!     ("age", Shape::integer().minimum(0)),
//! ]);
//!
//! assert!(user.check(&json!({"id": "u1", "handle": "bob"})).is_ok());
//!
//! let issues = user.check(&json!({"id": 7, "age": -1})).unwrap_err();
//! assert_eq!(issues.len(), 3);
//! ```

use crate::outcome::BoxFuture;
use crate::validator::{ValidationIssue, ValidationIssues, Validator};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON shape with a required flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// The kind of value and its constraints.
    #[serde(flatten)]
    kind: ShapeKind,
    /// Whether the value must be present (and non-null).
    #[serde(default)]
    required: bool,
}

/// The kind of value a [`Shape`] accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ShapeKind {
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
        pattern: Option<Pattern>,
    },
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Boolean,
    Array {
        items: Box<Shape>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object {
        properties: Vec<(String, Shape)>,
        #[serde(default = "default_true")]
        allow_additional: bool,
    },
    Any,
    Null,
}

/// A compiled, fully anchored string pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(&format!("^(?:{source})$"))?,
            source: source.to_string(),
        })
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(&source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.source
    }
}

fn default_true() -> bool {
    true
}

impl Shape {
    const fn of(kind: ShapeKind) -> Self {
        Self {
            kind,
            required: false,
        }
    }

    /// A string.
    #[must_use]
    pub const fn string() -> Self {
        Self::of(ShapeKind::String {
            min_length: None,
            max_length: None,
            pattern: None,
        })
    }

    /// An integer.
    #[must_use]
    pub const fn integer() -> Self {
        Self::of(ShapeKind::Integer {
            minimum: None,
            maximum: None,
        })
    }

    /// Any number.
    #[must_use]
    pub const fn number() -> Self {
        Self::of(ShapeKind::Number {
            minimum: None,
            maximum: None,
        })
    }

    /// A boolean.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::of(ShapeKind::Boolean)
    }

    /// An array whose items all match `items`.
    #[must_use]
    pub fn array(items: Shape) -> Self {
        Self::of(ShapeKind::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        })
    }

    /// An object with the given properties.
    ///
    /// Properties are optional unless marked with [`Shape::required`].
    /// Additional properties are allowed; see [`Shape::strict`].
    #[must_use]
    pub fn object(properties: Vec<(&str, Shape)>) -> Self {
        Self::of(ShapeKind::Object {
            properties: properties
                .into_iter()
                .map(|(name, shape)| (name.to_string(), shape))
                .collect(),
            allow_additional: true,
        })
    }

    /// Anything, including null.
    #[must_use]
    pub const fn any() -> Self {
        Self::of(ShapeKind::Any)
    }

    /// Exactly `null`.
    #[must_use]
    pub const fn null() -> Self {
        Self::of(ShapeKind::Null)
    }

    /// Marks the value as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns whether the value is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Rejects object properties not listed in the shape.
    #[must_use]
    pub fn strict(mut self) -> Self {
        if let ShapeKind::Object {
            allow_additional, ..
        } = &mut self.kind
        {
            *allow_additional = false;
        }
        self
    }

    /// Minimum string length (in characters).
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let ShapeKind::String { min_length, .. } = &mut self.kind {
            *min_length = Some(len);
        }
        self
    }

    /// Maximum string length (in characters).
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let ShapeKind::String { max_length, .. } = &mut self.kind {
            *max_length = Some(len);
        }
        self
    }

    /// Regular expression the whole string must match.
    ///
    /// The expression is compiled here, once.
    ///
    /// # Errors
    ///
    /// Returns the compile error if `regex` is not a valid expression.
    pub fn pattern(mut self, regex: &str) -> Result<Self, regex::Error> {
        if let ShapeKind::String { pattern, .. } = &mut self.kind {
            *pattern = Some(Pattern::new(regex)?);
        }
        Ok(self)
    }

    /// Inclusive lower bound for integers and numbers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn minimum(mut self, min: i64) -> Self {
        match &mut self.kind {
            ShapeKind::Integer { minimum, .. } => *minimum = Some(min),
            ShapeKind::Number { minimum, .. } => *minimum = Some(min as f64),
            _ => {}
        }
        self
    }

    /// Inclusive upper bound for integers and numbers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn maximum(mut self, max: i64) -> Self {
        match &mut self.kind {
            ShapeKind::Integer { maximum, .. } => *maximum = Some(max),
            ShapeKind::Number { maximum, .. } => *maximum = Some(max as f64),
            _ => {}
        }
        self
    }

    /// Minimum number of array items.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let ShapeKind::Array { min_items, .. } = &mut self.kind {
            *min_items = Some(min);
        }
        self
    }

    /// Maximum number of array items.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let ShapeKind::Array { max_items, .. } = &mut self.kind {
            *max_items = Some(max);
        }
        self
    }

    /// Checks `value` against the shape, collecting every issue.
    pub fn check(&self, value: &Value) -> Result<(), ValidationIssues> {
        let mut issues = Vec::new();
        self.check_at(value, "$", &mut issues);
        match ValidationIssues::from_vec(issues) {
            Some(issues) => Err(issues),
            None => Ok(()),
        }
    }

    fn check_at(&self, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
        if value.is_null() && !matches!(self.kind, ShapeKind::Null | ShapeKind::Any) {
            let message = if self.required {
                "required value is missing".to_string()
            } else {
                format!("expected {}", self.describe_kind())
            };
            issues.push(
                ValidationIssue::new(path, message)
                    .expected(self.describe_kind())
                    .received(Value::Null),
            );
            return;
        }

        let mismatch = |issues: &mut Vec<ValidationIssue>| {
            issues.push(
                ValidationIssue::new(path, format!("expected {}", self.describe_kind()))
                    .expected(self.describe_kind())
                    .received(value.clone()),
            );
        };

        match &self.kind {
            ShapeKind::String {
                min_length,
                max_length,
                pattern,
            } => {
                let Some(s) = value.as_str() else {
                    return mismatch(issues);
                };
                let len = s.chars().count();
                if min_length.is_some_and(|min| len < min) || max_length.is_some_and(|max| len > max) {
                    issues.push(
                        ValidationIssue::new(path, format!("string length {len} is out of bounds"))
                            .expected(self.describe_kind())
                            .received(value.clone()),
                    );
                }
                if let Some(pattern) = pattern {
                    if !pattern.regex.is_match(s) {
                        issues.push(
                            ValidationIssue::new(
                                path,
                                format!("does not match pattern {}", pattern.source),
                            )
                            .received(value.clone()),
                        );
                    }
                }
            }

            ShapeKind::Integer { minimum, maximum } => {
                let Some(n) = value.as_i64() else {
                    return mismatch(issues);
                };
                if minimum.is_some_and(|min| n < min) || maximum.is_some_and(|max| n > max) {
                    issues.push(
                        ValidationIssue::new(path, format!("value {n} is out of bounds"))
                            .expected(self.describe_kind())
                            .received(value.clone()),
                    );
                }
            }

            ShapeKind::Number { minimum, maximum } => {
                let Some(n) = value.as_f64() else {
                    return mismatch(issues);
                };
                if minimum.is_some_and(|min| n < min) || maximum.is_some_and(|max| n > max) {
                    issues.push(
                        ValidationIssue::new(path, format!("value {n} is out of bounds"))
                            .expected(self.describe_kind())
                            .received(value.clone()),
                    );
                }
            }

            ShapeKind::Boolean => {
                if !value.is_boolean() {
                    mismatch(issues);
                }
            }

            ShapeKind::Array {
                items,
                min_items,
                max_items,
            } => {
                let Some(arr) = value.as_array() else {
                    return mismatch(issues);
                };
                let len = arr.len();
                if min_items.is_some_and(|min| len < min) || max_items.is_some_and(|max| len > max) {
                    issues.push(
                        ValidationIssue::new(path, format!("array length {len} is out of bounds"))
                            .expected(self.describe_kind()),
                    );
                }
                for (idx, item) in arr.iter().enumerate() {
                    items.check_at(item, &format!("{path}[{idx}]"), issues);
                }
            }

            ShapeKind::Object {
                properties,
                allow_additional,
            } => {
                let Some(obj) = value.as_object() else {
                    return mismatch(issues);
                };
                for (name, shape) in properties {
                    let prop_path = format!("{path}.{name}");
                    match obj.get(name) {
                        Some(Value::Null) if !shape.required => {}
                        Some(prop) => shape.check_at(prop, &prop_path, issues),
                        None if shape.required => issues.push(
                            ValidationIssue::new(prop_path, "missing required property")
                                .expected(shape.describe_kind()),
                        ),
                        None => {}
                    }
                }
                if !allow_additional {
                    for key in obj.keys() {
                        if !properties.iter().any(|(name, _)| name == key) {
                            issues.push(ValidationIssue::new(
                                format!("{path}.{key}"),
                                "unexpected property",
                            ));
                        }
                    }
                }
            }

            ShapeKind::Any => {}

            ShapeKind::Null => {
                if !value.is_null() {
                    mismatch(issues);
                }
            }
        }
    }

    fn describe_kind(&self) -> String {
        match &self.kind {
            ShapeKind::String { .. } => "string".to_string(),
            ShapeKind::Integer { .. } => "integer".to_string(),
            ShapeKind::Number { .. } => "number".to_string(),
            ShapeKind::Boolean => "boolean".to_string(),
            ShapeKind::Array { items, .. } => format!("{}[]", items.describe_kind()),
            ShapeKind::Object { properties, .. } => {
                let fields: Vec<String> = properties
                    .iter()
                    .map(|(name, shape)| {
                        let marker = if shape.required { "" } else { "?" };
                        format!("{name}{marker}: {}", shape.describe_kind())
                    })
                    .collect();
                format!("{{{}}}", fields.join(", "))
            }
            ShapeKind::Any => "any".to_string(),
            ShapeKind::Null => "null".to_string(),
        }
    }
}

impl Validator for Shape {
    fn parse<'a>(&'a self, raw: Value) -> BoxFuture<'a, Result<Value, ValidationIssues>> {
        Box::pin(std::future::ready(self.check(&raw).map(|()| raw)))
    }

    fn describe(&self) -> String {
        self.describe_kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_shape() -> Shape {
        Shape::object(vec![
            ("id", Shape::string().required()),
            ("handle", Shape::string().required()),
        ])
    }

    #[test]
    fn test_accepts_matching_object() {
        assert!(user_shape().check(&json!({"id": "u1", "handle": "bob"})).is_ok());
    }

    #[test]
    fn test_reports_missing_required_property() {
        let issues = user_shape().check(&json!({"id": "u1"})).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.first().path, "$.handle");
        assert_eq!(issues.first().expected.as_deref(), Some("string"));
    }

    #[test]
    fn test_collects_all_issues() {
        let issues = user_shape().check(&json!({"id": 1, "handle": false})).unwrap_err();
        let paths: Vec<_> = issues.iter().map(|i| i.path.clone()).collect();
        assert_eq!(paths, vec!["$.id", "$.handle"]);
    }

    #[test]
    fn test_optional_property_may_be_null() {
        let shape = Shape::object(vec![("nickname", Shape::string())]);
        assert!(shape.check(&json!({"nickname": null})).is_ok());
        assert!(shape.check(&json!({})).is_ok());
    }

    #[test]
    fn test_strict_rejects_unknown_properties() {
        let shape = user_shape().strict();
        let issues = shape
            .check(&json!({"id": "u1", "handle": "bob", "admin": true}))
            .unwrap_err();
        assert_eq!(issues.first().path, "$.admin");
    }

    #[test]
    fn test_string_bounds_and_pattern() {
        let shape = Shape::string()
            .min_length(2)
            .max_length(4)
            .pattern("[a-z]+")
            .unwrap();
        assert!(shape.check(&json!("abc")).is_ok());
        assert!(shape.check(&json!("a")).is_err());
        assert!(shape.check(&json!("abcde")).is_err());
        assert!(shape.check(&json!("AB")).is_err());
    }

    #[test]
    fn test_integer_bounds() {
        let shape = Shape::integer().minimum(1).maximum(10);
        assert!(shape.check(&json!(5)).is_ok());
        assert!(shape.check(&json!(0)).is_err());
        assert!(shape.check(&json!(11)).is_err());
        assert!(shape.check(&json!(1.5)).is_err());
    }

    #[test]
    fn test_array_items_are_checked_with_index_paths() {
        let shape = Shape::array(Shape::integer()).max_items(3);
        let issues = shape.check(&json!([1, "two", 3])).unwrap_err();
        assert_eq!(issues.first().path, "$[1]");
        assert!(shape.check(&json!([1, 2, 3, 4])).is_err());
    }

    #[test]
    fn test_describe_renders_object_shape() {
        assert_eq!(user_shape().describe(), "{id: string, handle: string}");
        let nested = Shape::object(vec![("tags", Shape::array(Shape::string()))]);
        assert_eq!(nested.describe(), "{tags?: string[]}");
    }

    #[tokio::test]
    async fn test_validator_returns_raw_value() {
        let raw = json!({"id": "u1", "handle": "bob"});
        assert_eq!(user_shape().parse(raw.clone()).await.unwrap(), raw);
    }

    #[test]
    fn test_root_null_is_a_mismatch() {
        assert!(Shape::string().required().check(&Value::Null).is_err());

        let issues = user_shape().check(&Value::Null).unwrap_err();
        assert_eq!(issues.first().path, "$");
        assert_eq!(issues.first().received, Some(Value::Null));

        assert!(Shape::null().check(&Value::Null).is_ok());
        assert!(Shape::any().check(&Value::Null).is_ok());
    }

    #[test]
    fn test_array_items_reject_null() {
        let issues = Shape::array(Shape::string()).check(&json!(["a", null])).unwrap_err();
        assert_eq!(issues.first().path, "$[1]");
    }

    #[test]
    fn test_invalid_pattern_fails_when_built() {
        assert!(Shape::string().pattern("[a-z").is_err());
    }

    #[test]
    fn test_pattern_survives_serde() {
        let shape = Shape::string().pattern("[0-9]{3}").unwrap();
        let decoded: Shape = serde_json::from_value(serde_json::to_value(&shape).unwrap()).unwrap();
        assert_eq!(decoded, shape);
        assert!(decoded.check(&json!("123")).is_ok());
        assert!(decoded.check(&json!("12a")).is_err());
    }
}
