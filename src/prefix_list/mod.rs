//! Prefix-list generation with bgpq4
//!
//! Every AS-SET is expanded once per address family:
//!
//! ```sh
//! bgpq4 [-6] <as-set> -l AS<asn>-In-v4|v6 -S AFRINIC,ARIN,APNIC,LACNIC,RIPE
//! ```
//!
//! The resulting lines of all AS-SETs are merged per family, keeping the
//! first occurrence of each line.

mod batch;

pub use batch::{CommandBatch, ENTER_CONFIG, EXIT_CONFIG, REMOVAL_MARKER};

use itertools::Itertools;
use log::{debug, info, warn};

use crate::config::QueryToolConfig;
use crate::family::Family;
use crate::shell::{ExecOutcome, Shell};

/// Generated prefix-list lines per family
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrefixList {
    pub v4: Vec<String>,
    pub v6: Vec<String>,
}

impl PrefixList {
    pub fn get(&self, family: Family) -> &[String] {
        match family {
            Family::Ipv4 => &self.v4,
            Family::Ipv6 => &self.v6,
        }
    }

    /// Append lines not already present for `family`, keeping first-seen order
    pub fn merge<I>(&mut self, family: Family, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let existing = match family {
            Family::Ipv4 => &mut self.v4,
            Family::Ipv6 => &mut self.v6,
        };
        let merged: Vec<String> = existing.drain(..).chain(lines).unique().collect();
        *existing = merged;
    }

    /// Raw line count for a family, removal lines included
    pub fn count(&self, family: Family) -> usize {
        self.get(family).len()
    }

    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }
}

/// Non-empty lines of tool output
pub fn split_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Runs the route-object query tool (bgpq4) for each AS-SET and family
pub struct PrefixListGenerator<'a, S: Shell + ?Sized> {
    shell: &'a S,
    config: &'a QueryToolConfig,
}

impl<'a, S: Shell + ?Sized> PrefixListGenerator<'a, S> {
    pub fn new(shell: &'a S, config: &'a QueryToolConfig) -> Self {
        Self { shell, config }
    }

    /// Arguments for one query: `[-6] <as-set> -l <list-name> -S <sources>`
    pub fn query_args(&self, asn: u32, as_set: &str, family: Family) -> Vec<String> {
        let mut args = Vec::with_capacity(6);
        if family == Family::Ipv6 {
            args.push("-6".to_string());
        }
        args.push(as_set.to_string());
        args.push("-l".to_string());
        args.push(family.list_name(asn));
        args.push("-S".to_string());
        args.push(self.config.sources.join(","));
        args
    }

    /// Lines for one AS-SET/family. Timeouts and failures yield nothing.
    async fn query(&self, asn: u32, as_set: &str, family: Family) -> Vec<String> {
        let args = self.query_args(asn, as_set, family);
        debug!(
            "Running {} query for {}: {} {}",
            family,
            as_set,
            self.config.path,
            args.join(" ")
        );
        match self
            .shell
            .exec(&self.config.path, &args, Some(self.config.timeout))
            .await
        {
            ExecOutcome::Exited {
                code: Some(0),
                stdout,
                ..
            } => {
                let lines = split_lines(&stdout);
                debug!(
                    "Parsed {} {} prefix-list lines for {}",
                    lines.len(),
                    family,
                    as_set
                );
                lines
            }
            ExecOutcome::Exited { code, stderr, .. } => {
                match code {
                    Some(code) => warn!(
                        "{} query for {} exited with code {}: {}",
                        family,
                        as_set,
                        code,
                        stderr.trim()
                    ),
                    None => warn!("{} query for {} was terminated by a signal", family, as_set),
                }
                vec![]
            }
            ExecOutcome::TimedOut => {
                warn!(
                    "{} query for {} timed out after {}s",
                    family,
                    as_set,
                    self.config.timeout.as_secs_f64()
                );
                vec![]
            }
            ExecOutcome::SpawnFailed(reason) => {
                warn!("{} query for {} failed: {}", family, as_set, reason);
                vec![]
            }
        }
    }

    /// Expand all AS-SETs of an ASN, IPv4 then IPv6 per AS-SET
    pub async fn generate(&self, asn: u32, as_sets: &[String]) -> PrefixList {
        let mut prefix_list = PrefixList::default();
        for as_set in as_sets {
            for family in Family::ALL.iter().copied() {
                let lines = self.query(asn, as_set, family).await;
                prefix_list.merge(family, lines);
            }
        }
        info!(
            "Generated {} IPv4 and {} IPv6 prefix-list lines for AS{}",
            prefix_list.v4.len(),
            prefix_list.v6.len(),
            asn
        );
        prefix_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::testing::ScriptedShell;
    use crate::shell::SystemShell;
    use std::time::Duration;

    fn config() -> QueryToolConfig {
        QueryToolConfig {
            path: "bgpq4".to_string(),
            sources: vec![
                "AFRINIC".to_string(),
                "ARIN".to_string(),
                "APNIC".to_string(),
                "LACNIC".to_string(),
                "RIPE".to_string(),
            ],
            timeout: Duration::from_secs(10),
        }
    }

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_merge_dedupes_in_order() {
        let mut prefix_list = PrefixList::default();
        prefix_list.merge(Family::Ipv4, strings(&["p1", "p2"]));
        prefix_list.merge(Family::Ipv4, strings(&["p2", "p3"]));
        assert_eq!(prefix_list.v4, vec!["p1", "p2", "p3"]);
        assert!(prefix_list.v6.is_empty());
        assert_eq!(prefix_list.count(Family::Ipv4), 3);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(
            split_lines("no ip prefix-list X\n\nip prefix-list X permit 192.0.2.0/24  \n"),
            vec!["no ip prefix-list X", "ip prefix-list X permit 192.0.2.0/24"]
        );
        assert!(split_lines("\n \n").is_empty());
    }

    #[test]
    fn test_query_args() {
        let shell = ScriptedShell::new(|_, _| ExecOutcome::success(""));
        let config = config();
        let generator = PrefixListGenerator::new(&shell, &config);
        assert_eq!(
            generator.query_args(65001, "AS-EXAMPLE", Family::Ipv4),
            vec![
                "AS-EXAMPLE",
                "-l",
                "AS65001-In-v4",
                "-S",
                "AFRINIC,ARIN,APNIC,LACNIC,RIPE"
            ]
        );
        assert_eq!(
            generator.query_args(65001, "AS-EXAMPLE", Family::Ipv6),
            vec![
                "-6",
                "AS-EXAMPLE",
                "-l",
                "AS65001-In-v6",
                "-S",
                "AFRINIC,ARIN,APNIC,LACNIC,RIPE"
            ]
        );
    }

    #[tokio::test]
    async fn test_generate_merges_as_sets() {
        let shell = ScriptedShell::new(|_, args| {
            let v6 = args[0] == "-6";
            let as_set = if v6 { &args[1] } else { &args[0] };
            let output = match (as_set.as_str(), v6) {
                ("AS-A", false) => "p1\np2\n",
                ("AS-B", false) => "p2\np3\n",
                ("AS-A", true) => "q1\n",
                _ => "",
            };
            ExecOutcome::success(output)
        });
        let config = config();
        let generator = PrefixListGenerator::new(&shell, &config);
        let prefix_list = generator
            .generate(65001, &strings(&["AS-A", "AS-B"]))
            .await;
        assert_eq!(prefix_list.v4, vec!["p1", "p2", "p3"]);
        assert_eq!(prefix_list.v6, vec!["q1"]);

        // v4 then v6 for each AS-SET, in order
        let queried: Vec<_> = shell
            .calls()
            .into_iter()
            .map(|(_, args)| args[..2].join(" "))
            .collect();
        assert_eq!(
            queried,
            vec!["AS-A -l", "-6 AS-A", "AS-B -l", "-6 AS-B"]
        );
    }

    #[tokio::test]
    async fn test_generate_failures_contribute_nothing() {
        let shell = ScriptedShell::new(|_, args| {
            let as_set = if args[0] == "-6" { &args[1] } else { &args[0] };
            match as_set.as_str() {
                "AS-SLOW" => ExecOutcome::TimedOut,
                "AS-BROKEN" => ExecOutcome::Exited {
                    code: Some(1),
                    stdout: "partial\n".to_string(),
                    stderr: "FATAL: unknown object".to_string(),
                },
                "AS-MISSING" => ExecOutcome::SpawnFailed("No such file or directory".to_string()),
                _ => ExecOutcome::success("ip prefix-list AS65001-In-v4 permit 192.0.2.0/24\n"),
            }
        });
        let config = config();
        let generator = PrefixListGenerator::new(&shell, &config);
        let prefix_list = generator
            .generate(
                65001,
                &strings(&["AS-SLOW", "AS-BROKEN", "AS-MISSING", "AS-GOOD"]),
            )
            .await;
        assert_eq!(
            prefix_list.v4,
            vec!["ip prefix-list AS65001-In-v4 permit 192.0.2.0/24"]
        );
        assert_eq!(prefix_list.v6.len(), 1);
        // Every AS-SET still queried for both families
        assert_eq!(shell.calls().len(), 8);
    }

    #[tokio::test]
    async fn test_generate_kills_slow_tool() {
        use std::os::unix::fs::PermissionsExt;

        // Stand-in for a bgpq4 that hangs on every query
        let tool = std::env::temp_dir().join(format!("slow-bgpq4-{}.sh", std::process::id()));
        std::fs::write(&tool, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = QueryToolConfig {
            path: tool.to_string_lossy().into_owned(),
            sources: vec!["RIPE".to_string()],
            timeout: Duration::from_millis(200),
        };
        let shell = SystemShell;
        let generator = PrefixListGenerator::new(&shell, &config);
        let start = std::time::Instant::now();
        let prefix_list = generator
            .generate(65001, &strings(&["AS-SLOW", "AS-ALSO-SLOW"]))
            .await;
        std::fs::remove_file(&tool).ok();

        assert!(prefix_list.is_empty());
        // Four queries, each cut short at the timeout
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
