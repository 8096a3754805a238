//! # prefix-sync CLI
//!
//! ```sh
//! $ prefix-sync /etc/prefix-sync.toml
//! $ prefix-sync /etc/prefix-sync.toml --vrf CUSTOMERS --dry-run -v
//! ```
//!
//! When the run finishes a summary of every processed ASN is printed:
//! ```sh
//!  VRF        ASN    AS-SETs              IPv4  IPv6  Commands  Outcome           Peer Limits
//! ----------------------------------------------------------------------------------------
//!  CUSTOMERS  65001  AS-EXAMPLE           120   48    166       Applied           2 set
//!  CUSTOMERS  65002  AS65002              0     0     0         Nothing to apply  0 set
//!  PEERING    65010  AS-FOO, AS-FOO-V6    37    0     36        Apply failed
//! ```

use std::error::Error;

use clap::Parser;
use log::{info, warn};

use prefix_sync::SyncReport;

#[cfg(feature = "cli")]
mod display;
#[cfg(feature = "cli")]
mod table;

#[derive(Parser, Debug)]
#[clap(name = "prefix-sync", rename_all = "kebab-case")]
/// Sync BGP prefix-lists and peer limits with IRR registered AS-SETs
pub struct Args {
    /// Path to prefix-sync config.toml
    pub config_path: String,
    /// Only process this VRF (repeat for more)
    #[clap(long)]
    pub vrf: Vec<String>,
    /// Log generated configuration instead of applying it
    #[clap(long)]
    pub dry_run: bool,
    /// Show debug logs (additive for trace logs)
    #[clap(short, parse(from_occurrences))]
    pub verbose: u8,
}

#[cfg(feature = "cli")]
pub fn print_report(report: &SyncReport) {
    if !report.asns.is_empty() {
        let mut table = table::OutputTable::new();
        for asn in &report.asns {
            table.add_row(asn);
        }
        table.print();
    }
    log_totals(report);
}

#[cfg(not(feature = "cli"))]
pub fn print_report(report: &SyncReport) {
    for asn in &report.asns {
        info!(
            "VRF {} AS{}: {} ({} IPv4 / {} IPv6 lines, {} commands)",
            asn.vrf, asn.asn, asn.outcome, asn.v4_lines, asn.v6_lines, asn.commands
        );
    }
    log_totals(report);
}

fn log_totals(report: &SyncReport) {
    for vrf in &report.skipped_vrfs {
        warn!("VRF {} was skipped: no local ASN configured", vrf);
    }
    let failures = report.failures();
    if failures > 0 {
        warn!(
            "{} of {} ASNs had configuration failures",
            failures,
            report.asns.len()
        );
    } else {
        info!("{} ASNs synchronized", report.asns.len());
    }
}

#[cfg(feature = "cli")]
pub fn print_error(err: &dyn Error) {
    use colored::*;
    eprintln!("{}", err.to_string().red());
}

#[cfg(not(feature = "cli"))]
pub fn print_error(err: &dyn Error) {
    eprintln!("{}", err);
}
