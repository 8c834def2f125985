use std::{fmt, str::FromStr};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchStreamError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    #[default]
    SearchComplete,
    Search,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::SearchComplete => "search-complete",
            Endpoint::Search => "search",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::SearchComplete => "New API Endpoint",
            Endpoint::Search => "Legacy API Endpoint",
        }
    }

    /// Only the new endpoint understands the tuning parameters.
    pub fn accepts_params(&self) -> bool {
        matches!(self, Endpoint::SearchComplete)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Endpoint {
    type Err = SearchStreamError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "search-complete" => Ok(Endpoint::SearchComplete),
            "search" => Ok(Endpoint::Search),
            other => Err(SearchStreamError::UnknownEndpoint(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub certainty: Option<f64>,
    pub limit: Option<u32>,
    pub prompt: Option<String>,
    pub prompt_video: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    pub endpoint: Endpoint,
    pub query: String,
    pub params: QueryParams,
}

impl SearchRequest {
    pub fn new(endpoint: Endpoint, query: impl Into<String>) -> Self {
        Self {
            endpoint,
            query: query.into(),
            params: QueryParams::default(),
        }
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Build `{base}/{endpoint}?q=...`, adding the tuning parameters that are
    /// set when the endpoint accepts them.
    pub fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base.clone();
        {
            let mut segments =
                url.path_segments_mut()
                    .map_err(|_| SearchStreamError::InvalidBaseUrl {
                        url: base.to_string(),
                        reason: "cannot be a base".to_string(),
                    })?;
            segments.pop_if_empty().push(self.endpoint.path());
        }

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", self.query.trim());

            if self.endpoint.accepts_params() {
                let params = &self.params;
                if let Some(certainty) = params.certainty {
                    pairs.append_pair("certainty", &certainty.to_string());
                }
                if let Some(limit) = params.limit {
                    pairs.append_pair("withLimit", &limit.to_string());
                }
                if let Some(prompt) = &params.prompt {
                    pairs.append_pair("prompt", prompt);
                }
                if let Some(prompt_video) = &params.prompt_video {
                    pairs.append_pair("promptVideo", prompt_video);
                }
            }
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:3333").unwrap()
    }

    fn params() -> QueryParams {
        QueryParams {
            certainty: Some(0.75),
            limit: Some(5),
            prompt: Some("be brief".to_string()),
            prompt_video: Some("one line".to_string()),
        }
    }

    #[test]
    fn legacy_endpoint_sends_only_the_query() {
        let req = SearchRequest::new(Endpoint::Search, "  rust async  ").with_params(params());
        let url = req.url(&base()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/search?q=rust+async");
    }

    #[test]
    fn new_endpoint_sends_tuning_params() {
        let req = SearchRequest::new(Endpoint::SearchComplete, "café & tea").with_params(params());
        let url = req.url(&base()).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.path(), "/search-complete");
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "café & tea".to_string()),
                ("certainty".to_string(), "0.75".to_string()),
                ("withLimit".to_string(), "5".to_string()),
                ("prompt".to_string(), "be brief".to_string()),
                ("promptVideo".to_string(), "one line".to_string()),
            ]
        );
    }

    #[test]
    fn unset_params_are_left_out() {
        let req = SearchRequest::new(Endpoint::SearchComplete, "q");
        let url = req.url(&base()).unwrap();
        assert_eq!(url.query(), Some("q=q"));
    }

    #[test]
    fn base_path_is_kept() {
        let base = Url::parse("http://api.local/v2/").unwrap();
        let url = SearchRequest::new(Endpoint::Search, "x").url(&base).unwrap();
        assert_eq!(url.as_str(), "http://api.local/v2/search?q=x");
    }

    #[test]
    fn parses_endpoint_names() {
        assert_eq!("search".parse::<Endpoint>().unwrap(), Endpoint::Search);
        assert_eq!(
            "search-complete".parse::<Endpoint>().unwrap(),
            Endpoint::SearchComplete
        );
        assert!("lookup".parse::<Endpoint>().is_err());
    }
}
