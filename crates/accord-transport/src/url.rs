//! URL construction.
//!
//! [`build_url`] turns a base URL, an endpoint's [`HttpBinding`] and the
//! call's `params` and `query` into the concrete request URL:
//!
//! - each `:name` placeholder is replaced by the percent-encoded value of
//!   `params.name`; a missing or `null` value fails with
//!   [`AccordError::MissingParameter`] before any I/O happens
//! - each `query` entry with a present value is appended as an encoded
//!   `key=value` pair; `null` entries are skipped
//!
//! Query pairs come out in ascending key order, not the order the keys were
//! inserted. `serde_json` objects are `BTreeMap`-backed, so the URL for a
//! given query is deterministic.
//!
//! Values are stringified with
//! [`value_to_url_parameter`](accord_core::url_param::value_to_url_parameter).
//! Types that need a specific format implement
//! [`ToUrlParameter`](accord_core::ToUrlParameter) and are set through
//! [`CallInput::param`](accord_core::CallInput::param) or
//! [`CallInput::query_param`](accord_core::CallInput::query_param).
//!
//! # Example
//!
//! ```
//! use accord_core::HttpBinding;
//! use accord_transport::build_url;
//! use http::Method;
//! use serde_json::json;
//!
//! let binding = HttpBinding::new(Method::GET, "/event/details/:eventId");
//! let url = build_url(
//!     "https://api.example.com/",
//!     "eventDetails",
//!     &binding,
//!     Some(&json!({"eventId": 42})),
//!     Some(&json!({"lang": "en", "draft": null})),
//! )
//! .unwrap();
//! assert_eq!(url, "https://api.example.com/event/details/42?lang=en");
//! ```

use accord_core::url_param::value_to_url_parameter;
use accord_core::{AccordError, AccordResult, HttpBinding};
use serde_json::Value;

/// Builds the request URL for one call.
///
/// # Errors
///
/// - [`AccordError::MissingParameter`] if a placeholder has no value
/// - [`AccordError::Encode`] if `query` is neither an object nor `null`
pub fn build_url(
    base_url: &str,
    endpoint: &str,
    binding: &HttpBinding,
    params: Option<&Value>,
    query: Option<&Value>,
) -> AccordResult<String> {
    let path = binding.interpolate(|name| {
        params
            .and_then(|params| params.get(name))
            .and_then(value_to_url_parameter)
            .map(|value| urlencoding::encode(&value).into_owned())
            .ok_or_else(|| AccordError::MissingParameter {
                endpoint: endpoint.to_string(),
                name: name.to_string(),
            })
    })?;

    let mut url = String::with_capacity(base_url.len() + path.len());
    url.push_str(base_url.trim_end_matches('/'));
    url.push_str(&path);

    let query_string = encode_query(endpoint, query)?;
    if !query_string.is_empty() {
        url.push('?');
        url.push_str(&query_string);
    }
    Ok(url)
}

/// Encodes `query` as `key=value` pairs joined with `&`, in ascending key order.
///
/// # Errors
///
/// Returns [`AccordError::Encode`] if `query` is neither an object nor `null`.
pub fn encode_query(endpoint: &str, query: Option<&Value>) -> AccordResult<String> {
    let map = match query {
        None | Some(Value::Null) => return Ok(String::new()),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(AccordError::Encode {
                endpoint: endpoint.to_string(),
                message: format!("query must be an object, got {other}"),
            })
        }
    };

    let pairs: Vec<String> = map
        .iter()
        .filter_map(|(key, value)| {
            value_to_url_parameter(value).map(|value| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(&value)
                )
            })
        })
        .collect();
    Ok(pairs.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::ErrorKind;
    use http::Method;
    use proptest::prelude::*;
    use serde_json::json;

    fn binding(path: &str) -> HttpBinding {
        HttpBinding::new(Method::GET, path)
    }

    #[test]
    fn test_interpolates_path_parameters() {
        let url = build_url(
            "https://api.test",
            "eventDetails",
            &binding("/event/details/:eventId"),
            Some(&json!({"eventId": 42})),
            None,
        )
        .unwrap();
        assert_eq!(url, "https://api.test/event/details/42");
    }

    #[test]
    fn test_missing_parameter_names_placeholder() {
        let err = build_url(
            "https://api.test",
            "eventDetails",
            &binding("/event/details/:eventId"),
            Some(&json!({"other": 1})),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameter);
        assert_eq!(
            err.to_string(),
            "eventDetails: missing parameter value for `eventId`"
        );
    }

    #[test]
    fn test_null_parameter_counts_as_missing() {
        let err = build_url(
            "https://api.test",
            "user",
            &binding("/user/:id"),
            Some(&json!({"id": null})),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameter);
    }

    #[test]
    fn test_no_params_at_all() {
        let err = build_url("https://api.test", "user", &binding("/user/:id"), None, None)
            .unwrap_err();
        assert!(matches!(err, AccordError::MissingParameter { ref name, .. } if name == "id"));
    }

    #[test]
    fn test_path_values_are_encoded() {
        let url = build_url(
            "https://api.test",
            "search",
            &binding("/tag/:name"),
            Some(&json!({"name": "a b/c"})),
            None,
        )
        .unwrap();
        assert_eq!(url, "https://api.test/tag/a%20b%2Fc");
    }

    #[test]
    fn test_query_skips_absent_values() {
        let url = build_url(
            "https://api.test/",
            "feed",
            &binding("/feed"),
            None,
            Some(&json!({"limit": 10, "cursor": null, "tags": ["a", "b"], "q": "x&y"})),
        )
        .unwrap();
        assert_eq!(url, "https://api.test/feed?limit=10&q=x%26y&tags=a%2Cb");
    }

    #[test]
    fn test_query_pairs_are_sorted_by_key() {
        let mut query = serde_json::Map::new();
        query.insert("zeta".to_string(), json!(1));
        query.insert("alpha".to_string(), json!(2));
        query.insert("mid".to_string(), json!(3));

        let url = build_url(
            "https://api.test",
            "feed",
            &binding("/feed"),
            None,
            Some(&Value::Object(query)),
        )
        .unwrap();
        assert_eq!(url, "https://api.test/feed?alpha=2&mid=3&zeta=1");
    }

    #[test]
    fn test_empty_query_adds_no_separator() {
        let url = build_url(
            "https://api.test",
            "feed",
            &binding("/feed"),
            None,
            Some(&json!({"cursor": null})),
        )
        .unwrap();
        assert_eq!(url, "https://api.test/feed");
    }

    #[test]
    fn test_non_object_query_is_rejected() {
        let err = encode_query("feed", Some(&json!([1, 2]))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
    }

    proptest! {
        #[test]
        fn prop_alphanumeric_ids_substitute_verbatim(id in "[A-Za-z0-9]{1,24}") {
            let url = build_url(
                "https://api.test",
                "event",
                &binding("/event/details/:eventId"),
                Some(&json!({"eventId": id.clone()})),
                None,
            )
            .unwrap();
            prop_assert_eq!(url, format!("https://api.test/event/details/{id}"));
        }

        #[test]
        fn prop_encoded_segments_never_contain_separators(value in "\\PC{1,16}") {
            let url = build_url(
                "https://api.test",
                "tag",
                &binding("/tag/:name"),
                Some(&json!({"name": value})),
                None,
            )
            .unwrap();
            let segment = url.trim_start_matches("https://api.test/tag/");
            prop_assert!(!segment.contains('/'));
            prop_assert!(!segment.contains('?'));
            prop_assert!(!segment.contains('#'));
        }
    }
}
