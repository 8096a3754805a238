//! # prefix-sync
//!
//! Keeps BGP ingress prefix-lists on an FRR router in sync with what the
//! current peers have registered in the IRR.
//!
//! For every configured VRF, in order:
//! 1. `show bgp vrf <vrf> summary` lists the remote ASNs (minus an ignore list)
//! 2. The registry (PeeringDB `api/as_set/<asn>`) maps each ASN to its AS-SETs
//! 3. `bgpq4` expands the AS-SETs into `AS<asn>-In-v4` / `AS<asn>-In-v6` prefix-lists
//! 4. The prefix-lists are applied with one `vtysh` invocation per ASN
//! 5. Each peer of the ASN gets `maximum-prefix` set to the size of its list
//!
//! Everything runs strictly one step at a time. Failures stay contained to the
//! ASN (or peer) they happened on.

pub mod config;
pub mod family;
pub mod prefix_list;
pub mod registry;
pub mod router;
pub mod shell;
pub mod sync;

pub use config::SyncConfig;
pub use registry::HttpRegistry;
pub use shell::SystemShell;
pub use sync::{AsnOutcome, AsnReport, SyncOptions, SyncReport, Synchronizer};
