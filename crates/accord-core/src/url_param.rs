//! Stringification of query and path parameter values.
//!
//! Parameters reach the transport as JSON values. Plain values are
//! stringified the usual way; types that need a specific wire format
//! (dates, for instance) implement [`ToUrlParameter`], which takes
//! precedence when the parameter is set through
//! [`CallInput::query_param`](crate::CallInput::query_param) or
//! [`CallInput::param`](crate::CallInput::param).

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::Value;
use uuid::Uuid;

/// Formats a value for use in a URL path segment or query string.
///
/// # Example
///
/// ```
/// use accord_core::ToUrlParameter;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// assert_eq!(day.to_url_parameter(), "2024-03-09");
/// assert_eq!(42_u32.to_url_parameter(), "42");
/// ```
pub trait ToUrlParameter {
    /// Returns the unencoded parameter text.
    fn to_url_parameter(&self) -> String;
}

impl<T: ToUrlParameter + ?Sized> ToUrlParameter for &T {
    fn to_url_parameter(&self) -> String {
        (**self).to_url_parameter()
    }
}

impl ToUrlParameter for str {
    fn to_url_parameter(&self) -> String {
        self.to_string()
    }
}

impl ToUrlParameter for String {
    fn to_url_parameter(&self) -> String {
        self.clone()
    }
}

impl ToUrlParameter for bool {
    fn to_url_parameter(&self) -> String {
        self.to_string()
    }
}

macro_rules! display_url_parameter {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToUrlParameter for $ty {
                fn to_url_parameter(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_url_parameter!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl ToUrlParameter for NaiveDate {
    fn to_url_parameter(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl ToUrlParameter for NaiveDateTime {
    fn to_url_parameter(&self) -> String {
        self.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}

impl<Tz: TimeZone> ToUrlParameter for DateTime<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    fn to_url_parameter(&self) -> String {
        self.to_rfc3339()
    }
}

impl ToUrlParameter for Uuid {
    fn to_url_parameter(&self) -> String {
        self.to_string()
    }
}

/// Stringifies a JSON parameter value.
///
/// Returns `None` for `null`, which callers treat as an absent value.
/// Strings are used verbatim, numbers and booleans use their display form,
/// arrays are joined with commas (skipping nulls) and objects are rendered
/// as compact JSON.
#[must_use]
pub fn value_to_url_parameter(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_to_url_parameter)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}
