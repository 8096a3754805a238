use std::fs::File;
use std::io::{self, Read};

use serde::Deserialize;
use toml;

struct Defaults {}

impl Defaults {
    fn registry_url() -> String {
        "https://www.peeringdb.com".to_string()
    }

    fn registry_timeout() -> u64 {
        30
    }

    fn user_agent() -> String {
        format!("prefix-sync/{}", env!("CARGO_PKG_VERSION"))
    }

    fn max_retries() -> u32 {
        10
    }

    fn max_total_wait() -> u64 {
        1800
    }

    fn default_delay() -> u64 {
        180
    }

    fn jitter() -> u64 {
        5
    }

    fn bgpq4_path() -> String {
        "bgpq4".to_string()
    }

    fn sources() -> Vec<String> {
        ["AFRINIC", "ARIN", "APNIC", "LACNIC", "RIPE"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn query_timeout() -> u64 {
        10
    }

    fn vtysh_path() -> String {
        "vtysh".to_string()
    }

    fn sudo() -> bool {
        false
    }
}

/// Config (toml) representation of a VRF to synchronize
#[derive(Clone, Debug, Deserialize)]
pub(super) struct VrfSpec {
    pub(super) name: String,
    // Local ASN of the `router bgp <asn> vrf <name>` context
    // VRFs without one are skipped at runtime
    pub(super) local_as: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RegistrySpec {
    // Base URL, `/api/as_set/<asn>` is appended
    #[serde(default = "Defaults::registry_url")]
    pub(super) url: String,
    // Seconds per HTTP request
    #[serde(default = "Defaults::registry_timeout")]
    pub(super) timeout: u64,
    #[serde(default = "Defaults::user_agent")]
    pub(super) user_agent: String,
}

impl Default for RegistrySpec {
    fn default() -> Self {
        Self {
            url: Defaults::registry_url(),
            timeout: Defaults::registry_timeout(),
            user_agent: Defaults::user_agent(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RetrySpec {
    // Rate-limited (429) retries before falling back
    #[serde(default = "Defaults::max_retries")]
    pub(super) max_retries: u32,
    // Total seconds spent sleeping on one ASN
    #[serde(default = "Defaults::max_total_wait")]
    pub(super) max_total_wait: u64,
    // Seconds to wait when the registry sends no usable retry-after
    #[serde(default = "Defaults::default_delay")]
    pub(super) default_delay: u64,
    // Upper bound of random seconds added to each wait
    #[serde(default = "Defaults::jitter")]
    pub(super) jitter: u64,
}

impl Default for RetrySpec {
    fn default() -> Self {
        Self {
            max_retries: Defaults::max_retries(),
            max_total_wait: Defaults::max_total_wait(),
            default_delay: Defaults::default_delay(),
            jitter: Defaults::jitter(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct QueryToolSpec {
    #[serde(default = "Defaults::bgpq4_path")]
    pub(super) path: String,
    // IRR sources, in order, passed with -S
    #[serde(default = "Defaults::sources")]
    pub(super) sources: Vec<String>,
    // Seconds before a query is killed
    #[serde(default = "Defaults::query_timeout")]
    pub(super) timeout: u64,
}

impl Default for QueryToolSpec {
    fn default() -> Self {
        Self {
            path: Defaults::bgpq4_path(),
            sources: Defaults::sources(),
            timeout: Defaults::query_timeout(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct VtyshSpec {
    #[serde(default = "Defaults::vtysh_path")]
    pub(super) path: String,
    // Run vtysh through sudo
    #[serde(default = "Defaults::sudo")]
    pub(super) sudo: bool,
}

impl Default for VtyshSpec {
    fn default() -> Self {
        Self {
            path: Defaults::vtysh_path(),
            sudo: Defaults::sudo(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SyncConfigSpec {
    // Peers with these ASNs never get prefix-lists
    #[serde(default = "Vec::new")]
    pub(super) ignore_asns: Vec<u32>,
    // Processed in file order
    #[serde(default = "Vec::new")]
    pub(super) vrfs: Vec<VrfSpec>,
    #[serde(default)]
    pub(super) registry: RegistrySpec,
    #[serde(default)]
    pub(super) retry: RetrySpec,
    #[serde(default)]
    pub(super) bgpq4: QueryToolSpec,
    #[serde(default)]
    pub(super) vtysh: VtyshSpec,
}

impl SyncConfigSpec {
    pub(super) fn from_file(path: &str) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_toml(&contents)
    }

    pub(super) fn from_toml(contents: &str) -> io::Result<Self> {
        toml::from_str(contents).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}
