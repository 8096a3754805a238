use async_trait::async_trait;
use log::trace;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{parse_retry_after, Lookup, Record, Registry, RegistryError};
use crate::config::RegistryConfig;

#[derive(Debug, Deserialize)]
struct AsSetResponse {
    #[serde(default = "Vec::new")]
    data: Vec<Record>,
}

impl From<reqwest::Error> for RegistryError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            RegistryError::Decode(error.to_string())
        } else {
            RegistryError::Transport(error.to_string())
        }
    }
}

/// [`Registry`] speaking HTTP to a PeeringDB compatible API
pub struct HttpRegistry {
    client: Client,
    base_url: String,
}

impl HttpRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn as_set_url(&self, asn: u32) -> String {
        format!("{}/api/as_set/{}", self.base_url, asn)
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn lookup_as_sets(&self, asn: u32) -> Result<Lookup, RegistryError> {
        let url = self.as_set_url(asn);
        trace!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_retry_after);
            return Ok(Lookup::RateLimited(retry_after));
        }
        if !status.is_success() {
            return Err(RegistryError::Status(status.as_u16()));
        }
        let body: AsSetResponse = response.json().await?;
        Ok(Lookup::Records(body.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(url: &str) -> RegistryConfig {
        RegistryConfig {
            url: url.to_string(),
            timeout: Duration::from_secs(5),
            user_agent: "prefix-sync-test".to_string(),
        }
    }

    #[test]
    fn test_as_set_url() {
        let registry = HttpRegistry::new(&config("https://www.peeringdb.com/")).unwrap();
        assert_eq!(
            registry.as_set_url(65001),
            "https://www.peeringdb.com/api/as_set/65001"
        );
    }

    #[test]
    fn test_decode_response() {
        let body: AsSetResponse =
            serde_json::from_str(r#"{"data": [{"65001": "AS-EXAMPLE"}], "meta": {}}"#).unwrap();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0]["65001"], "AS-EXAMPLE");

        let body: AsSetResponse = serde_json::from_str(r#"{"meta": {}}"#).unwrap();
        assert!(body.data.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_unreachable_is_transport_error() {
        // Nothing listens on the discard port
        let registry = HttpRegistry::new(&config("http://127.0.0.1:9")).unwrap();
        let result = registry.lookup_as_sets(65001).await;
        assert!(matches!(result, Err(RegistryError::Transport(_))));
    }
}
