use std::{env, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/lighthouse.json";

/// Settings read once at startup. Shared read-only through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_path = lookup("LIGHTHOUSE_DATA_PATH")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let api_token = lookup("LIGHTHOUSE_API_TOKEN").filter(|value| !value.is_empty());

        Self {
            port,
            data_path,
            api_token,
        }
    }

    pub fn expects_token(&self) -> bool {
        self.api_token.is_some()
    }

    /// Exact match against `Bearer <token>`. Always true when no token is configured.
    pub fn authorizes(&self, header: Option<&str>) -> bool {
        match &self.api_token {
            None => true,
            Some(token) => header
                .and_then(|value| value.strip_prefix("Bearer "))
                .is_some_and(|presented| presented == token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/lighthouse.json"));
        assert!(config.api_token.is_none());
        assert!(config.authorizes(None));
    }

    #[test]
    fn bad_port_falls_back_to_default() {
        let config = config_from(&[("PORT", "not-a-port")]);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn empty_token_leaves_ingestion_open() {
        let config = config_from(&[("LIGHTHOUSE_API_TOKEN", "")]);
        assert!(!config.expects_token());
        assert!(config.authorizes(Some("Bearer anything")));
    }

    #[test]
    fn token_requires_exact_bearer_match() {
        let config = config_from(&[("LIGHTHOUSE_API_TOKEN", "s3cret")]);
        assert!(config.expects_token());
        assert!(config.authorizes(Some("Bearer s3cret")));
        assert!(!config.authorizes(None));
        assert!(!config.authorizes(Some("s3cret")));
        assert!(!config.authorizes(Some("bearer s3cret")));
        assert!(!config.authorizes(Some("Bearer s3cret ")));
        assert!(!config.authorizes(Some("Bearer other")));
    }
}
