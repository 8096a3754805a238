//! Interaction with the routing daemon through `vtysh`
//!
//! Reads (BGP summary, neighbor detail) and configuration transactions
//! all go through [`Vtysh`], one process invocation per call.

mod apply;
mod peers;
mod summary;

pub use apply::{apply_batch, enforce_peer_limits, LimitReport};
pub use peers::{parse_peer_sessions, read_peers, PeerAddresses, PeerSession};
pub use summary::{discover_asns, parse_summary_asns};

use std::fmt;

use log::trace;

use crate::config::VtyshConfig;
use crate::shell::{ExecError, Shell};

/// The `router bgp <local-as> vrf <vrf>` context configuration is applied in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouterContext<'a> {
    pub local_as: u32,
    pub vrf: &'a str,
}

impl<'a> RouterContext<'a> {
    pub fn new(local_as: u32, vrf: &'a str) -> Self {
        Self { local_as, vrf }
    }

    pub fn directive(&self) -> String {
        format!("router bgp {} vrf {}", self.local_as, self.vrf)
    }
}

impl<'a> fmt::Display for RouterContext<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "VRF {} (AS{})", self.vrf, self.local_as)
    }
}

/// Runs `vtysh -c <directive> ...` through a [`Shell`]
pub struct Vtysh<'a, S: Shell + ?Sized> {
    shell: &'a S,
    config: &'a VtyshConfig,
}

impl<'a, S: Shell + ?Sized> Vtysh<'a, S> {
    pub fn new(shell: &'a S, config: &'a VtyshConfig) -> Self {
        Self { shell, config }
    }

    /// Program and arguments for one invocation
    pub fn invocation<D: AsRef<str>>(&self, directives: &[D]) -> (String, Vec<String>) {
        let mut args = Vec::with_capacity(directives.len() * 2 + 1);
        let program = if self.config.sudo {
            args.push(self.config.path.clone());
            "sudo".to_string()
        } else {
            self.config.path.clone()
        };
        for directive in directives {
            args.push("-c".to_string());
            args.push(directive.as_ref().to_string());
        }
        (program, args)
    }

    /// Run directives in a single vtysh process, returning its stdout
    pub async fn run<D: AsRef<str>>(&self, directives: &[D]) -> Result<String, ExecError> {
        let (program, args) = self.invocation(directives);
        trace!("{} {:?}", program, args);
        self.shell.exec(&program, &args, None).await.into_stdout()
    }

    pub async fn show(&self, command: &str) -> Result<String, ExecError> {
        self.run(&[command]).await
    }
}

/// `show bgp [vrf <vrf>] <what>`
pub(crate) fn show_bgp(vrf: Option<&str>, what: &str) -> String {
    match vrf {
        Some(vrf) => format!("show bgp vrf {} {}", vrf, what),
        None => format!("show bgp {}", what),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::testing::{vtysh_args, ScriptedShell};
    use crate::shell::ExecOutcome;

    fn vtysh_config(sudo: bool) -> VtyshConfig {
        VtyshConfig {
            path: "vtysh".to_string(),
            sudo,
        }
    }

    #[test]
    fn test_router_context() {
        let context = RouterContext::new(65000, "CUSTOMERS");
        assert_eq!(context.directive(), "router bgp 65000 vrf CUSTOMERS");
        assert_eq!(context.to_string(), "VRF CUSTOMERS (AS65000)");
    }

    #[test]
    fn test_show_bgp() {
        assert_eq!(show_bgp(Some("RED"), "summary"), "show bgp vrf RED summary");
        assert_eq!(show_bgp(None, "neighbors"), "show bgp neighbors");
    }

    #[test]
    fn test_invocation() {
        let shell = ScriptedShell::new(|_, _| ExecOutcome::success(""));
        let config = vtysh_config(false);
        let vtysh = Vtysh::new(&shell, &config);
        let (program, args) = vtysh.invocation(&["conf", "end"]);
        assert_eq!(program, "vtysh");
        assert_eq!(args, vtysh_args(&["conf", "end"]));
    }

    #[test]
    fn test_invocation_sudo() {
        let shell = ScriptedShell::new(|_, _| ExecOutcome::success(""));
        let config = vtysh_config(true);
        let vtysh = Vtysh::new(&shell, &config);
        let (program, args) = vtysh.invocation(&["show bgp summary"]);
        assert_eq!(program, "sudo");
        assert_eq!(args, vec!["vtysh", "-c", "show bgp summary"]);
    }

    #[tokio::test]
    async fn test_run_failure() {
        let shell = ScriptedShell::new(|_, _| ExecOutcome::Exited {
            code: Some(1),
            stdout: String::new(),
            stderr: "% Unknown command".to_string(),
        });
        let config = vtysh_config(false);
        let vtysh = Vtysh::new(&shell, &config);
        let err = vtysh.show("show bgp summary").await.unwrap_err();
        assert_eq!(
            err,
            ExecError::Exit {
                code: 1,
                stderr: "% Unknown command".to_string()
            }
        );
    }
}
