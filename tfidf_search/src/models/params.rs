//! Transport-independent parsing of `/search` input.
//!
//! GET requests read `query`/`top_k` from the URL, POST requests from a JSON
//! body. Both produce a [`RawSearchParams`], which [`RawSearchParams::resolve`]
//! turns into the typed [`SearchParams`] used for the search call.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::errors::SearchError;

pub const DEFAULT_TOP_K: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub query: String,
    pub top_k: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSearchParams {
    pub query: Option<Value>,
    pub top_k: Option<Value>,
}

impl RawSearchParams {
    pub fn from_query_pairs(pairs: &HashMap<String, String>) -> Self {
        Self {
            query: pairs.get("query").cloned().map(Value::String),
            top_k: pairs.get("top_k").cloned().map(Value::String),
        }
    }

    /// Anything that is not a JSON object (including unparsable bytes) reads as `{}`.
    pub fn from_body(body: &[u8]) -> Self {
        let object = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => Map::new(),
        };

        Self {
            query: object.get("query").cloned(),
            top_k: object.get("top_k").cloned(),
        }
    }

    pub fn resolve(self) -> Result<SearchParams, SearchError> {
        let query = match self.query {
            Some(Value::String(q)) if !q.is_empty() => q,
            _ => return Err(SearchError::BadRequest("Missing 'query' parameter".to_string())),
        };

        Ok(SearchParams {
            query,
            top_k: coerce_top_k(self.top_k.as_ref()),
        })
    }
}

/// Best-effort conversion of a caller-supplied result count. Never fails:
/// absent, unparsable and non-positive values all become [`DEFAULT_TOP_K`].
pub fn coerce_top_k(raw: Option<&Value>) -> u64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_i64().and_then(|v| u64::try_from(v).ok()))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 1.0)
                    .map(|f| f.trunc() as u64)
            }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match parsed {
        Some(k) if k > 0 => k,
        _ => DEFAULT_TOP_K,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> HashMap<String, String> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_query_pairs() {
        let params = RawSearchParams::from_query_pairs(&pairs(&[("query", "rust"), ("top_k", "3")]))
            .resolve()
            .unwrap();
        assert_eq!(params, SearchParams { query: "rust".to_string(), top_k: 3 });
    }

    #[test]
    fn test_missing_or_empty_query_is_bad_request() {
        for raw in [
            RawSearchParams::from_query_pairs(&pairs(&[])),
            RawSearchParams::from_query_pairs(&pairs(&[("query", "")])),
            RawSearchParams::from_body(br#"{"query": ""}"#),
            RawSearchParams::from_body(br#"{"top_k": 2}"#),
        ] {
            assert!(matches!(raw.resolve(), Err(SearchError::BadRequest(_))));
        }
    }

    #[test]
    fn test_non_string_query_is_missing() {
        let raw = RawSearchParams::from_body(br#"{"query": 12}"#);
        assert!(matches!(raw.resolve(), Err(SearchError::BadRequest(_))));
    }

    #[test]
    fn test_malformed_body_reads_as_empty_object() {
        assert_eq!(RawSearchParams::from_body(b"not json"), RawSearchParams::default());
        assert_eq!(RawSearchParams::from_body(b"[1, 2]"), RawSearchParams::default());
        assert_eq!(RawSearchParams::from_body(b""), RawSearchParams::default());
    }

    #[test]
    fn test_body_params() {
        let params = RawSearchParams::from_body("{\"query\": \"índice\", \"top_k\": \"8\"}".as_bytes())
            .resolve()
            .unwrap();
        assert_eq!(params.query, "índice");
        assert_eq!(params.top_k, 8);
    }

    #[test]
    fn test_coerce_top_k() {
        assert_eq!(coerce_top_k(None), DEFAULT_TOP_K);
        assert_eq!(coerce_top_k(Some(&json!(null))), DEFAULT_TOP_K);
        assert_eq!(coerce_top_k(Some(&json!(10))), 10);
        assert_eq!(coerce_top_k(Some(&json!(" 7 "))), 7);
        assert_eq!(coerce_top_k(Some(&json!(3.9))), 3);
        assert_eq!(coerce_top_k(Some(&json!("abc"))), DEFAULT_TOP_K);
        assert_eq!(coerce_top_k(Some(&json!("2.5"))), DEFAULT_TOP_K);
        assert_eq!(coerce_top_k(Some(&json!(0))), DEFAULT_TOP_K);
        assert_eq!(coerce_top_k(Some(&json!(-4))), DEFAULT_TOP_K);
        assert_eq!(coerce_top_k(Some(&json!(0.5))), DEFAULT_TOP_K);
        assert_eq!(coerce_top_k(Some(&json!(true))), DEFAULT_TOP_K);
        assert_eq!(coerce_top_k(Some(&json!([5]))), DEFAULT_TOP_K);
    }
}
