use log::{error, info, warn};

use super::{read_peers, RouterContext, Vtysh};
use crate::family::Family;
use crate::prefix_list::{CommandBatch, PrefixList};
use crate::shell::{ExecError, Shell};

const CONFIGURE: &str = "conf";
const END: &str = "end";

/// Directives applying a batch inside the router context
pub fn batch_transaction(context: &RouterContext, batch: &CommandBatch) -> Vec<String> {
    let mut directives = Vec::with_capacity(batch.len() + 1);
    directives.push(CONFIGURE.to_string());
    directives.push(context.directive());
    directives.extend(batch.directives().iter().cloned());
    directives.push(END.to_string());
    directives
}

/// Directives setting `maximum-prefix` for one peer
pub fn max_prefix_transaction(
    context: &RouterContext,
    family: Family,
    peer: &str,
    limit: usize,
) -> Vec<String> {
    vec![
        CONFIGURE.to_string(),
        context.directive(),
        family.address_family().to_string(),
        format!("neighbor {} maximum-prefix {}", peer, limit),
        END.to_string(),
    ]
}

/// Apply a batch as one vtysh invocation.
///
/// vtysh does not acknowledge single lines: on error, any leading part of the
/// batch may already be in the running configuration and nothing is rolled
/// back. On success the number of submitted directives is returned.
pub async fn apply_batch<S: Shell + ?Sized>(
    vtysh: &Vtysh<'_, S>,
    context: &RouterContext<'_>,
    batch: &CommandBatch,
) -> Result<usize, ExecError> {
    let directives = batch_transaction(context, batch);
    info!(
        "Applying {} prefix-list commands in {}",
        batch.directives().len(),
        context
    );
    vtysh.run(&directives).await?;
    for directive in batch.directives() {
        info!("Applied: {}", directive);
    }
    Ok(batch.directives().len())
}

/// Outcome of pushing peer limits for one ASN
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LimitReport {
    pub applied: usize,
    pub failed: usize,
}

/// Set `maximum-prefix` on every current peer of `remote_as` to the size of
/// its family's generated list. Families with no lines are left alone.
///
/// Each peer is its own transaction, a failure doesn't stop the others.
/// With `dry_run` the transactions are only logged.
pub async fn enforce_peer_limits<S: Shell + ?Sized>(
    vtysh: &Vtysh<'_, S>,
    context: &RouterContext<'_>,
    remote_as: u32,
    prefix_list: &PrefixList,
    dry_run: bool,
) -> LimitReport {
    let peers = read_peers(vtysh, Some(context.vrf), remote_as).await;
    let mut report = LimitReport::default();
    if peers.is_empty() {
        warn!("No peers found for AS{} in {}", remote_as, context);
        return report;
    }

    for family in Family::ALL.iter().copied() {
        let limit = prefix_list.count(family);
        if limit == 0 {
            continue;
        }
        for peer in peers.get(family) {
            let directives = max_prefix_transaction(context, family, peer, limit);
            if dry_run {
                info!("[dry-run] {}", directives.join(" | "));
                continue;
            }
            match vtysh.run(&directives).await {
                Ok(_) => {
                    info!(
                        "Set {} maximum-prefix {} for {} (AS{}) in {}",
                        family, limit, peer, remote_as, context
                    );
                    report.applied += 1;
                }
                Err(err) => {
                    error!(
                        "Failed to apply {} maximum-prefix for {} (AS{}) in {}: {}",
                        family, peer, remote_as, context, err
                    );
                    report.failed += 1;
                }
            }
        }
    }
    report
}
