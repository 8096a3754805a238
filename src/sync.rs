use std::fmt;

use log::{error, info, warn};

use crate::config::{SyncConfig, VrfConfig};
use crate::prefix_list::{CommandBatch, PrefixListGenerator};
use crate::registry::{AsSetResolver, Registry};
use crate::router::{apply_batch, discover_asns, enforce_peer_limits, LimitReport};
use crate::router::{RouterContext, Vtysh};
use crate::shell::Shell;

#[derive(Clone, Debug, Default)]
pub struct SyncOptions {
    /// Log configuration instead of applying it
    pub dry_run: bool,
    /// Only these VRFs (all configured VRFs when empty)
    pub vrfs: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AsnOutcome {
    Applied,
    NothingToApply,
    ApplyFailed,
    DryRun,
}

impl fmt::Display for AsnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use AsnOutcome::*;
        let display = match self {
            Applied => "Applied",
            NothingToApply => "Nothing to apply",
            ApplyFailed => "Apply failed",
            DryRun => "Dry run",
        };
        write!(f, "{}", display)
    }
}

/// What happened to one ASN in one VRF
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsnReport {
    pub vrf: String,
    pub asn: u32,
    pub as_sets: Vec<String>,
    // Raw generated lines, removal lines included
    pub v4_lines: usize,
    pub v6_lines: usize,
    // Lines in the applied batch
    pub commands: usize,
    pub outcome: AsnOutcome,
    // `None` when limits were not attempted
    pub limits: Option<LimitReport>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub asns: Vec<AsnReport>,
    /// VRFs without a local ASN
    pub skipped_vrfs: Vec<String>,
}

impl SyncReport {
    /// ASNs whose prefix-lists or any peer limit failed to apply
    pub fn failures(&self) -> usize {
        self.asns
            .iter()
            .filter(|r| {
                r.outcome == AsnOutcome::ApplyFailed
                    || r.limits.map(|l| l.failed > 0).unwrap_or(false)
            })
            .count()
    }
}

/// Runs the whole pipeline, one VRF and one ASN at a time:
/// discover ASNs, resolve AS-SETs, generate prefix-lists, apply them and
/// set peer limits.
pub struct Synchronizer<'a, S: Shell + ?Sized, R: Registry + ?Sized> {
    config: &'a SyncConfig,
    shell: &'a S,
    registry: &'a R,
    options: SyncOptions,
}

impl<'a, S: Shell + ?Sized, R: Registry + ?Sized> Synchronizer<'a, S, R> {
    pub fn new(
        config: &'a SyncConfig,
        shell: &'a S,
        registry: &'a R,
        options: SyncOptions,
    ) -> Self {
        Self {
            config,
            shell,
            registry,
            options,
        }
    }

    fn is_selected(&self, vrf: &VrfConfig) -> bool {
        self.options.vrfs.is_empty() || self.options.vrfs.contains(&vrf.name)
    }

    pub async fn run(&self) -> SyncReport {
        let mut report = SyncReport::default();
        for vrf in self.config.vrfs.iter().filter(|vrf| self.is_selected(vrf)) {
            info!("Processing VRF {}", vrf.name);
            let local_as = match vrf.local_as {
                Some(local_as) => local_as,
                None => {
                    error!("No local ASN configured for VRF {}, skipping", vrf.name);
                    report.skipped_vrfs.push(vrf.name.clone());
                    continue;
                }
            };
            let context = RouterContext::new(local_as, &vrf.name);
            report.asns.extend(self.sync_vrf(&context).await);
        }
        info!("All VRFs and ASNs processed");
        report
    }

    async fn sync_vrf(&self, context: &RouterContext<'_>) -> Vec<AsnReport> {
        let vtysh = Vtysh::new(self.shell, &self.config.vtysh);
        let asns = discover_asns(&vtysh, context.vrf, &self.config.ignore_asns).await;
        if asns.is_empty() {
            warn!("No ASNs to process in {}", context);
        }
        let mut reports = Vec::with_capacity(asns.len());
        for asn in asns {
            reports.push(self.sync_asn(&vtysh, context, asn).await);
        }
        reports
    }

    async fn sync_asn(
        &self,
        vtysh: &Vtysh<'_, S>,
        context: &RouterContext<'_>,
        asn: u32,
    ) -> AsnReport {
        info!("Processing AS{} in {}", asn, context);

        let resolver = AsSetResolver::new(self.registry, &self.config.retry);
        let as_sets = resolver.resolve(asn).await;

        let generator = PrefixListGenerator::new(self.shell, &self.config.bgpq4);
        let prefix_list = generator.generate(asn, &as_sets).await;
        let batch = CommandBatch::from_prefix_list(&prefix_list);
        info!(
            "Generated {} prefix-list commands for AS{} in {}",
            batch.directives().len(),
            asn,
            context
        );

        let mut report = AsnReport {
            vrf: context.vrf.to_string(),
            asn,
            as_sets,
            v4_lines: prefix_list.v4.len(),
            v6_lines: prefix_list.v6.len(),
            commands: batch.directives().len(),
            outcome: AsnOutcome::NothingToApply,
            limits: None,
        };

        if batch.is_empty() {
            warn!("No prefix-list commands to apply for AS{} in {}", asn, context);
        } else if self.options.dry_run {
            for directive in batch.directives() {
                info!("[dry-run] {}", directive);
            }
            report.outcome = AsnOutcome::DryRun;
        } else {
            match apply_batch(vtysh, context, &batch).await {
                Ok(_) => report.outcome = AsnOutcome::Applied,
                Err(err) => {
                    // Lines before the failure may be applied already, move on
                    error!("vtysh failed for AS{} in {}: {}", asn, context, err);
                    report.outcome = AsnOutcome::ApplyFailed;
                    return report;
                }
            }
        }

        let limits =
            enforce_peer_limits(vtysh, context, asn, &prefix_list, self.options.dry_run).await;
        report.limits = Some(limits);
        report
    }
}
