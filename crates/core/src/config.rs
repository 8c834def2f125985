use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::Url;
use serde::Deserialize;
use tokio::fs;

use crate::{
    endpoint::{Endpoint, QueryParams, SearchRequest},
    error::{Result, SearchStreamError},
    session::{DEFAULT_TIMEOUT, SessionSettings},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3333";

pub const ENV_BASE_URL: &str = "SEARCHSTREAM_BASE_URL";
pub const ENV_ENDPOINT: &str = "SEARCHSTREAM_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "SEARCHSTREAM_TIMEOUT_SECS";

/// One source of settings. Unset fields fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub base_url: Option<String>,
    pub endpoint: Option<Endpoint>,
    pub timeout_secs: Option<u64>,
    pub certainty: Option<f64>,
    pub limit: Option<u32>,
    pub prompt: Option<String>,
    pub prompt_video: Option<String>,
}

impl ConfigLayer {
    pub fn from_toml(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Read the `SEARCHSTREAM_*` variables through `lookup`.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENV_ENDPOINT)
            .map(|value| value.parse::<Endpoint>())
            .transpose()?;

        let timeout_secs = lookup(ENV_TIMEOUT_SECS)
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| SearchStreamError::InvalidConfig {
                        reason: format!("{ENV_TIMEOUT_SECS}={value}: {e}"),
                    })
            })
            .transpose()?;

        Ok(Self {
            base_url: lookup(ENV_BASE_URL),
            endpoint,
            timeout_secs,
            ..Self::default()
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    fn merge(self, above: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            base_url: above.base_url.or(self.base_url),
            endpoint: above.endpoint.or(self.endpoint),
            timeout_secs: above.timeout_secs.or(self.timeout_secs),
            certainty: above.certainty.or(self.certainty),
            limit: above.limit.or(self.limit),
            prompt: above.prompt.or(self.prompt),
            prompt_video: above.prompt_video.or(self.prompt_video),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: Url,
    pub endpoint: Endpoint,
    pub timeout: Duration,
    pub params: QueryParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            endpoint: Endpoint::default(),
            timeout: DEFAULT_TIMEOUT,
            params: QueryParams::default(),
        }
    }
}

impl Config {
    /// `<config dir>/searchstream/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("searchstream").join("config.toml"))
    }

    /// File, then environment, then `overrides` (usually the command line).
    /// A missing default file is fine; a missing explicit one is not.
    pub async fn load(explicit_path: Option<&Path>, overrides: ConfigLayer) -> Result<Self> {
        let file = match explicit_path {
            Some(path) => {
                if !fs::try_exists(path).await? {
                    return Err(SearchStreamError::ConfigNotFound(path.to_path_buf()));
                }
                Some(Self::read_layer(path).await?)
            }
            None => match Self::default_path() {
                Some(path) => Self::read_optional_layer(&path).await?,
                None => None,
            },
        };

        Self::resolve([
            file.unwrap_or_default(),
            ConfigLayer::from_env()?,
            overrides,
        ])
    }

    async fn read_layer(path: &Path) -> Result<ConfigLayer> {
        let source = fs::read_to_string(path).await?;
        ConfigLayer::from_toml(&source)
    }

    /// `None` when nothing exists at `path`.
    async fn read_optional_layer(path: &Path) -> Result<Option<ConfigLayer>> {
        if !fs::try_exists(path).await? {
            return Ok(None);
        }
        Ok(Some(Self::read_layer(path).await?))
    }

    /// Merge layers from lowest to highest precedence over the defaults.
    pub fn resolve<I>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = ConfigLayer>,
    {
        let merged = layers
            .into_iter()
            .fold(ConfigLayer::default(), ConfigLayer::merge);
        let defaults = Config::default();

        let base_url = match merged.base_url {
            Some(raw) => parse_base_url(&raw)?,
            None => defaults.base_url,
        };

        let timeout = match merged.timeout_secs {
            Some(0) => {
                return Err(SearchStreamError::InvalidConfig {
                    reason: "timeout must be at least one second".to_string(),
                });
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.timeout,
        };

        if let Some(certainty) = merged.certainty {
            if !certainty.is_finite() {
                return Err(SearchStreamError::InvalidConfig {
                    reason: format!("certainty must be a finite number, got {certainty}"),
                });
            }
        }

        Ok(Self {
            base_url,
            endpoint: merged.endpoint.unwrap_or(defaults.endpoint),
            timeout,
            params: QueryParams {
                certainty: merged.certainty,
                limit: merged.limit,
                prompt: merged.prompt,
                prompt_video: merged.prompt_video,
            },
        })
    }

    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
        }
    }

    pub fn request(&self, query: impl Into<String>) -> SearchRequest {
        SearchRequest::new(self.endpoint, query).with_params(self.params.clone())
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| SearchStreamError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SearchStreamError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_layers() {
        let config = Config::resolve(Vec::new()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url.as_str(), "http://localhost:3333/");
        assert_eq!(config.endpoint, Endpoint::SearchComplete);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn higher_layers_win() {
        let file = ConfigLayer::from_toml(
            r#"
            base_url = "http://file.local:8080"
            endpoint = "search"
            timeout_secs = 30
            certainty = 0.5
            prompt = "from file"
            "#,
        )
        .unwrap();
        let env = ConfigLayer::from_env_with(env(&[(ENV_BASE_URL, "https://env.local")])).unwrap();
        let cli = ConfigLayer {
            endpoint: Some(Endpoint::SearchComplete),
            limit: Some(3),
            ..ConfigLayer::default()
        };

        let config = Config::resolve([file, env, cli]).unwrap();
        assert_eq!(config.base_url.as_str(), "https://env.local/");
        assert_eq!(config.endpoint, Endpoint::SearchComplete);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.params.certainty, Some(0.5));
        assert_eq!(config.params.limit, Some(3));
        assert_eq!(config.params.prompt.as_deref(), Some("from file"));
    }

    #[test]
    fn rejects_bad_values() {
        let zero = ConfigLayer {
            timeout_secs: Some(0),
            ..ConfigLayer::default()
        };
        assert!(matches!(
            Config::resolve([zero]),
            Err(SearchStreamError::InvalidConfig { .. })
        ));

        let ftp = ConfigLayer {
            base_url: Some("ftp://files.local".to_string()),
            ..ConfigLayer::default()
        };
        assert!(matches!(
            Config::resolve([ftp]),
            Err(SearchStreamError::InvalidBaseUrl { .. })
        ));

        assert!(ConfigLayer::from_env_with(env(&[(ENV_ENDPOINT, "lookup")])).is_err());
        assert!(ConfigLayer::from_env_with(env(&[(ENV_TIMEOUT_SECS, "soon")])).is_err());
        assert!(ConfigLayer::from_toml("colour = \"blue\"").is_err());
    }

    #[tokio::test]
    async fn loads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "endpoint = \"search\"\nlimit = 9\n").unwrap();

        let config = Config::load(Some(&path), ConfigLayer::default())
            .await
            .unwrap();
        assert_eq!(config.endpoint, Endpoint::Search);
        assert_eq!(config.params.limit, Some(9));
        assert_eq!(config.request("q").endpoint, Endpoint::Search);
    }

    #[tokio::test]
    async fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = Config::load(Some(&path), ConfigLayer::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchStreamError::ConfigNotFound(_)));
    }

    #[tokio::test]
    async fn optional_layer_is_skipped_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("searchstream").join("config.toml");
        assert_eq!(Config::read_optional_layer(&absent).await.unwrap(), None);

        let present = dir.path().join("config.toml");
        std::fs::write(&present, "timeout_secs = 5\n").unwrap();
        let layer = Config::read_optional_layer(&present).await.unwrap();
        assert_eq!(layer.and_then(|l| l.timeout_secs), Some(5));
    }
}
