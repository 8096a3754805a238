use itertools::Itertools;
use log::{debug, error};

use super::{show_bgp, Vtysh};
use crate::family::Family;
use crate::shell::Shell;

/// A neighbor as shown by `show bgp neighbors`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerSession {
    pub address: String,
    pub remote_as: u32,
}

impl PeerSession {
    pub fn family(&self) -> Family {
        Family::of_address(&self.address)
    }
}

/// Unique peer addresses of one remote ASN, split per family
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerAddresses {
    pub v4: Vec<String>,
    pub v6: Vec<String>,
}

impl PeerAddresses {
    pub fn from_sessions<'s, I>(sessions: I, remote_as: u32) -> Self
    where
        I: IntoIterator<Item = &'s PeerSession>,
    {
        let (v4, v6): (Vec<_>, Vec<_>) = sessions
            .into_iter()
            .filter(|s| s.remote_as == remote_as)
            .unique_by(|s| s.address.clone())
            .partition(|s| s.family() == Family::Ipv4);
        Self {
            v4: v4.into_iter().map(|s| s.address.clone()).collect(),
            v6: v6.into_iter().map(|s| s.address.clone()).collect(),
        }
    }

    pub fn get(&self, family: Family) -> &[String] {
        match family {
            Family::Ipv4 => &self.v4,
            Family::Ipv6 => &self.v6,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }
}

// "BGP neighbor is 192.0.2.1, remote AS 65001, local AS 65000, external link"
fn neighbor_address(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let rest = line
        .strip_prefix("BGP ")
        .unwrap_or(line)
        .strip_prefix("neighbor is ")?;
    rest.split(|c: char| c == ',' || c.is_whitespace())
        .next()
        .filter(|addr| !addr.is_empty())
}

fn remote_as(block: &str) -> Option<u32> {
    let (_, rest) = block.split_once("remote AS ")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Parse neighbor detail output into sessions.
///
/// Each block starts at a `BGP neighbor is <addr>` line and runs until the next one.
/// Blocks without an address or a `remote AS <n>` are dropped.
pub fn parse_peer_sessions(output: &str) -> Vec<PeerSession> {
    let mut blocks: Vec<(&str, String)> = vec![];
    for line in output.lines() {
        if let Some(address) = neighbor_address(line) {
            blocks.push((address, String::new()));
        }
        if let Some((_, block)) = blocks.last_mut() {
            block.push_str(line);
            block.push('\n');
        }
    }
    blocks
        .into_iter()
        .filter_map(|(address, block)| {
            remote_as(&block).map(|remote_as| PeerSession {
                address: address.to_string(),
                remote_as,
            })
        })
        .collect()
}

/// Current peer addresses for `remote_as` in a VRF (or the default instance).
///
/// Failing to read the table is logged and yields no peers.
pub async fn read_peers<S: Shell + ?Sized>(
    vtysh: &Vtysh<'_, S>,
    vrf: Option<&str>,
    remote_as: u32,
) -> PeerAddresses {
    let command = show_bgp(vrf, "neighbors");
    match vtysh.show(&command).await {
        Ok(output) => {
            let sessions = parse_peer_sessions(&output);
            debug!("'{}' returned {} sessions", command, sessions.len());
            PeerAddresses::from_sessions(&sessions, remote_as)
        }
        Err(err) => {
            error!(
                "Failed to get peers for AS{} in VRF {}: {}",
                remote_as,
                vrf.unwrap_or("default"),
                err
            );
            PeerAddresses::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VtyshConfig;
    use crate::shell::testing::ScriptedShell;
    use crate::shell::ExecOutcome;

    const NEIGHBORS: &str = "\
BGP neighbor is 192.0.2.1, remote AS 65001, local AS 65000, external link
  Hostname: edge1
  BGP version 4, remote router ID 192.0.2.1, local router ID 10.0.0.1
  BGP state = Established, up for 01w2d03h
BGP neighbor is 2001:db8::1, remote AS 65001, local AS 65000, external link
  BGP version 4, remote router ID 192.0.2.1, local router ID 10.0.0.1
  BGP state = Established, up for 01w2d03h
BGP neighbor is 198.51.100.7, remote AS 65002, local AS 65000, external link
  BGP state = Active
BGP neighbor is 192.0.2.1, remote AS 65001, local AS 65000, external link
  BGP state = Established
";

    #[test]
    fn test_parse_peer_sessions() {
        let sessions = parse_peer_sessions(NEIGHBORS);
        assert_eq!(sessions.len(), 4);
        assert_eq!(
            sessions[1],
            PeerSession {
                address: "2001:db8::1".to_string(),
                remote_as: 65001
            }
        );
        assert_eq!(sessions[1].family(), Family::Ipv6);
        assert_eq!(sessions[2].remote_as, 65002);
    }

    #[test]
    fn test_filter_by_asn() {
        let sessions = parse_peer_sessions(NEIGHBORS);
        let peers = PeerAddresses::from_sessions(&sessions, 65001);
        assert_eq!(peers.v4, vec!["192.0.2.1"]);
        assert_eq!(peers.v6, vec!["2001:db8::1"]);

        let peers = PeerAddresses::from_sessions(&sessions, 65002);
        assert_eq!(peers.v4, vec!["198.51.100.7"]);
        assert!(peers.v6.is_empty());

        assert!(PeerAddresses::from_sessions(&sessions, 65003).is_empty());
    }

    #[test]
    fn test_parse_remote_as_on_later_line() {
        let output = "BGP neighbor is 203.0.113.9\n  Description: ix\n  remote AS 64999, local AS 65000\n";
        let sessions = parse_peer_sessions(output);
        assert_eq!(
            sessions,
            vec![PeerSession {
                address: "203.0.113.9".to_string(),
                remote_as: 64999
            }]
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_peer_sessions("").is_empty());
        assert!(parse_peer_sessions("% No BGP neighbors found\n").is_empty());
        // Address but no remote AS
        assert!(parse_peer_sessions("BGP neighbor is 192.0.2.1, local AS 65000\n").is_empty());
    }

    #[tokio::test]
    async fn test_read_peers() {
        let shell = ScriptedShell::new(|_, _| ExecOutcome::success(NEIGHBORS));
        let config = VtyshConfig {
            path: "vtysh".to_string(),
            sudo: false,
        };
        let vtysh = Vtysh::new(&shell, &config);
        let peers = read_peers(&vtysh, Some("CUSTOMERS"), 65001).await;
        assert_eq!(peers.v4.len(), 1);
        assert_eq!(peers.v6.len(), 1);
        assert_eq!(
            shell.calls()[0].1,
            vec!["-c", "show bgp vrf CUSTOMERS neighbors"]
        );
    }

    #[tokio::test]
    async fn test_read_peers_failure_is_empty() {
        let shell = ScriptedShell::new(|_, _| ExecOutcome::SpawnFailed("not found".to_string()));
        let config = VtyshConfig {
            path: "vtysh".to_string(),
            sudo: false,
        };
        let vtysh = Vtysh::new(&shell, &config);
        assert!(read_peers(&vtysh, None, 65001).await.is_empty());
    }
}
