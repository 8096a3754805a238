mod file;

use std::collections::HashSet;
use std::io::Result;
use std::time::Duration;

use crate::registry::RetryPolicy;

/// Parse a TOML config file and return a SyncConfig
pub fn from_file(path: &str) -> Result<SyncConfig> {
    let spec = file::SyncConfigSpec::from_file(path)?;
    Ok(SyncConfig::from_spec(spec))
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub vrfs: Vec<VrfConfig>,
    pub ignore_asns: HashSet<u32>,
    pub registry: RegistryConfig,
    pub retry: RetryPolicy,
    pub bgpq4: QueryToolConfig,
    pub vtysh: VtyshConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrfConfig {
    pub name: String,
    pub local_as: Option<u32>,
}

impl VrfConfig {
    pub fn new(name: &str, local_as: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            local_as,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct QueryToolConfig {
    pub path: String,
    pub sources: Vec<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct VtyshConfig {
    pub path: String,
    pub sudo: bool,
}

impl SyncConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let spec = file::SyncConfigSpec::from_toml(contents)?;
        Ok(Self::from_spec(spec))
    }

    fn from_spec(spec: file::SyncConfigSpec) -> Self {
        Self {
            vrfs: spec
                .vrfs
                .into_iter()
                .map(|v| VrfConfig {
                    name: v.name,
                    local_as: v.local_as,
                })
                .collect(),
            ignore_asns: spec.ignore_asns.into_iter().collect(),
            registry: RegistryConfig {
                url: spec.registry.url.trim_end_matches('/').to_string(),
                timeout: Duration::from_secs(spec.registry.timeout),
                user_agent: spec.registry.user_agent,
            },
            retry: RetryPolicy {
                max_retries: spec.retry.max_retries,
                max_total_wait: Duration::from_secs(spec.retry.max_total_wait),
                default_delay: Duration::from_secs(spec.retry.default_delay),
                jitter: Duration::from_secs(spec.retry.jitter),
            },
            bgpq4: QueryToolConfig {
                path: spec.bgpq4.path,
                sources: spec.bgpq4.sources,
                timeout: Duration::from_secs(spec.bgpq4.timeout),
            },
            vtysh: VtyshConfig {
                path: spec.vtysh.path,
                sudo: spec.vtysh.sudo,
            },
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::from_spec(file::SyncConfigSpec::default())
    }
}
