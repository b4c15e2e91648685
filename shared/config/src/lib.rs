//! Environment-driven configuration for the TF-IDF search service.
//!
//! Every setting is optional. Values that fail to parse fall back to their
//! defaults with a warning, so loading configuration never fails.

use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_QDRANT_URL: &str = "http://127.0.0.1:6334";
pub const DEFAULT_COLLECTION: &str = "code_knowledge";
pub const DEFAULT_VECTORIZER_PATH: &str = "vectorizer.json";
pub const DEFAULT_SPARSE_VECTOR_NAME: &str = "text";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 7071;

#[derive(Clone)]
pub struct SearchConfig {
    pub qdrant_url: String,
    pub collection: String,
    pub vectorizer_path: String,
    pub sparse_vector_name: String,
    pub timeout_secs: u64,
    pub qdrant_api_key: Option<String>,
    pub host: String,
    pub port: u16,
    /// Normalized to `""` or `/segment` form.
    pub route_prefix: String,
    pub workers: Option<usize>,
}

// The API key never reaches logs through Debug.
impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("qdrant_url", &self.qdrant_url)
            .field("collection", &self.collection)
            .field("vectorizer_path", &self.vectorizer_path)
            .field("sparse_vector_name", &self.sparse_vector_name)
            .field("timeout_secs", &self.timeout_secs)
            .field("qdrant_api_key", &self.qdrant_api_key.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("route_prefix", &self.route_prefix)
            .field("workers", &self.workers)
            .finish()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl SearchConfig {
    /// Load from the process environment, reading `.env` first when present.
    pub fn from_env() -> Self {
        if let Err(e) = dotenv::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve every setting through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            qdrant_url: get("QDRANT_URL").unwrap_or_else(|| DEFAULT_QDRANT_URL.to_string()),
            collection: get("QDRANT_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            vectorizer_path: get("VECTORIZER_PATH")
                .unwrap_or_else(|| DEFAULT_VECTORIZER_PATH.to_string()),
            sparse_vector_name: get("QDRANT_SPARSE_VECTOR_NAME")
                .unwrap_or_else(|| DEFAULT_SPARSE_VECTOR_NAME.to_string()),
            timeout_secs: parse_or("QDRANT_TIMEOUT_SECS", get("QDRANT_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS),
            qdrant_api_key: get("QDRANT_API_KEY"),
            host: get("SEARCH_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("SEARCH_PORT", get("SEARCH_PORT"), DEFAULT_PORT),
            route_prefix: normalize_prefix(get("SEARCH_ROUTE_PREFIX").as_deref().unwrap_or("")),
            workers: get("SEARCH_WORKERS").and_then(|raw| match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    tracing::warn!("Ignoring invalid SEARCH_WORKERS value: {}", raw);
                    None
                }
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default", key, value);
            default
        }),
        None => default,
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.qdrant_url, DEFAULT_QDRANT_URL);
        assert_eq!(config.collection, "code_knowledge");
        assert_eq!(config.vectorizer_path, "vectorizer.json");
        assert_eq!(config.sparse_vector_name, "text");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.port, 7071);
        assert_eq!(config.route_prefix, "");
        assert!(config.qdrant_api_key.is_none());
        assert!(config.workers.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = SearchConfig::from_lookup(lookup_from(&[
            ("QDRANT_URL", "http://qdrant:6334"),
            ("QDRANT_COLLECTION", "docs"),
            ("VECTORIZER_PATH", "/models/tfidf.json"),
            ("QDRANT_TIMEOUT_SECS", "5"),
            ("SEARCH_PORT", "9000"),
            ("SEARCH_ROUTE_PREFIX", "api/"),
            ("SEARCH_WORKERS", "4"),
        ]));

        assert_eq!(config.qdrant_url, "http://qdrant:6334");
        assert_eq!(config.collection, "docs");
        assert_eq!(config.vectorizer_path, "/models/tfidf.json");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.bind_address(), ("0.0.0.0".to_string(), 9000));
        assert_eq!(config.route_prefix, "/api");
        assert_eq!(config.workers, Some(4));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = SearchConfig::from_lookup(lookup_from(&[
            ("QDRANT_TIMEOUT_SECS", "soon"),
            ("SEARCH_PORT", "99999"),
            ("SEARCH_WORKERS", "0"),
        ]));

        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.workers.is_none());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = SearchConfig::from_lookup(lookup_from(&[
            ("QDRANT_COLLECTION", ""),
            ("QDRANT_API_KEY", "  "),
            ("SEARCH_ROUTE_PREFIX", "/"),
        ]));

        assert_eq!(config.collection, DEFAULT_COLLECTION);
        assert!(config.qdrant_api_key.is_none());
        assert_eq!(config.route_prefix, "");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = SearchConfig::from_lookup(lookup_from(&[("QDRANT_API_KEY", "secret-key")]));
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("***"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("QDRANT_COLLECTION", "from_env_collection");
        let config = SearchConfig::from_env();
        std::env::remove_var("QDRANT_COLLECTION");

        assert_eq!(config.collection, "from_env_collection");
    }
}
