//! AS-SET lookups against a PeeringDB style registry
//!
//! `GET <registry>/api/as_set/<asn>` answers with
//! `{"data": [{"<asn>": "AS-EXAMPLE"}, ...]}`. Every non-empty string value
//! of every record is taken as an AS-SET name.

mod http;
mod retry;

pub use http::HttpRegistry;
pub use retry::{Backoff, RetryPolicy};

use std::error;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use itertools::Itertools;
use log::{debug, error, info, warn};
use serde_json::{Map, Value};

/// One record of the registry's `data` array
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Registry answered, possibly with no records
    Records(Vec<Record>),
    /// HTTP 429, with the retry-after hint if one was given
    RateLimited(Option<Duration>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Connection, TLS or timeout issue. [reason]
    Transport(String),
    /// Unexpected HTTP status. [code]
    Status(u16),
    /// Body was not the expected JSON. [reason]
    Decode(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Registry Error: ")?;
        use RegistryError::*;
        match self {
            Transport(r) => write!(f, "Transport error [{}]", r),
            Status(code) => write!(f, "Unexpected HTTP status {}", code),
            Decode(r) => write!(f, "Invalid response body [{}]", r),
        }
    }
}

impl error::Error for RegistryError {}

/// Source of AS-SET records for an ASN
#[async_trait]
pub trait Registry: Send + Sync {
    async fn lookup_as_sets(&self, asn: u32) -> Result<Lookup, RegistryError>;
}

/// Parse a `retry-after` header value given in seconds
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// The AS-SET list used when the registry has nothing usable: the ASN itself
pub fn fallback_as_sets(asn: u32) -> Vec<String> {
    vec![format!("AS{}", asn)]
}

/// Every non-empty string field across all records, first-seen order, no duplicates
pub fn flatten_records(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.values())
        .filter_map(|value| value.as_str())
        .filter(|s| !s.is_empty())
        .unique()
        .map(|s| s.to_string())
        .collect()
}

/// Maps an ASN to its AS-SETs, retrying rate-limited lookups per [`RetryPolicy`].
///
/// Never fails: every dead end resolves to [`fallback_as_sets`].
pub struct AsSetResolver<'a, R: Registry + ?Sized> {
    registry: &'a R,
    policy: &'a RetryPolicy,
}

impl<'a, R: Registry + ?Sized> AsSetResolver<'a, R> {
    pub fn new(registry: &'a R, policy: &'a RetryPolicy) -> Self {
        Self { registry, policy }
    }

    pub async fn resolve(&self, asn: u32) -> Vec<String> {
        let mut backoff = self.policy.backoff();
        loop {
            match self.registry.lookup_as_sets(asn).await {
                Ok(Lookup::Records(records)) => {
                    let as_sets = flatten_records(&records);
                    if as_sets.is_empty() {
                        warn!("No AS-SETs registered for AS{}, using AS{}", asn, asn);
                        return fallback_as_sets(asn);
                    }
                    info!("AS-SETs for AS{}: {}", asn, as_sets.join(", "));
                    return as_sets;
                }
                Ok(Lookup::RateLimited(retry_after)) => match backoff.next_delay(retry_after) {
                    Some(delay) => {
                        warn!(
                            "Registry rate limited lookup for AS{}, retrying in {:.1}s (retry {}/{})",
                            asn,
                            delay.as_secs_f64(),
                            backoff.retries(),
                            self.policy.max_retries,
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        error!(
                            "Giving up on AS{} after {} rate limited retries ({}s waited), using AS{}",
                            asn,
                            backoff.retries(),
                            backoff.waited().as_secs(),
                            asn
                        );
                        return fallback_as_sets(asn);
                    }
                },
                Err(err) => {
                    error!("Error fetching AS-SETs for AS{}: {}", asn, err);
                    return fallback_as_sets(asn);
                }
            }
            debug!("Retrying AS-SET lookup for AS{}", asn);
        }
    }
}
