use std::collections::HashSet;

use log::{error, info};

use super::{show_bgp, Vtysh};
use crate::shell::Shell;

// Lines before the first neighbor row of `show bgp summary`
const SUMMARY_HEADER_LINES: usize = 6;
// Zero-based column holding the neighbor's ASN
const SUMMARY_AS_COLUMN: usize = 2;

/// Remote ASNs from `show bgp summary` output, in table order.
///
/// Rows whose AS column is not a number, repeated ASNs, and ASNs in `ignore`
/// are skipped.
pub fn parse_summary_asns(output: &str, ignore: &HashSet<u32>) -> Vec<u32> {
    let mut asns: Vec<u32> = vec![];
    for line in output.lines().skip(SUMMARY_HEADER_LINES) {
        let asn = match line
            .split_whitespace()
            .nth(SUMMARY_AS_COLUMN)
            .and_then(|column| column.parse::<u32>().ok())
        {
            Some(asn) => asn,
            None => continue,
        };
        if !ignore.contains(&asn) && !asns.contains(&asn) {
            asns.push(asn);
        }
    }
    asns
}

/// Remote ASNs peering in a VRF. A failed show command gives no ASNs.
pub async fn discover_asns<S: Shell + ?Sized>(
    vtysh: &Vtysh<'_, S>,
    vrf: &str,
    ignore: &HashSet<u32>,
) -> Vec<u32> {
    let command = show_bgp(Some(vrf), "summary");
    match vtysh.show(&command).await {
        Ok(output) => {
            let asns = parse_summary_asns(&output, ignore);
            info!(
                "ASNs in VRF {}: [{}]",
                vrf,
                asns.iter().map(|asn| asn.to_string()).collect::<Vec<_>>().join(", ")
            );
            asns
        }
        Err(err) => {
            error!("Error executing '{}': {}", command, err);
            vec![]
        }
    }
}
