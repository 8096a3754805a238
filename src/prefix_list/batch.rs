use super::PrefixList;

pub const ENTER_CONFIG: &str = "conf t";
pub const EXIT_CONFIG: &str = "end";
// bgpq4 starts every list with a `no ... prefix-list <name>` line
pub const REMOVAL_MARKER: &str = "no ";

/// Configuration lines wrapped in enter/exit markers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandBatch(Vec<String>);

impl CommandBatch {
    /// IPv4 then IPv6 lines, without removal (`no ...`) lines
    pub fn from_prefix_list(prefix_list: &PrefixList) -> Self {
        let mut commands = Vec::with_capacity(prefix_list.len() + 2);
        commands.push(ENTER_CONFIG.to_string());
        commands.extend(
            prefix_list
                .v4
                .iter()
                .chain(prefix_list.v6.iter())
                .filter(|line| !line.starts_with(REMOVAL_MARKER))
                .cloned(),
        );
        commands.push(EXIT_CONFIG.to_string());
        Self(commands)
    }

    /// Length including the two markers
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Nothing between the markers
    pub fn is_empty(&self) -> bool {
        self.0.len() <= 2
    }

    /// Lines between the markers
    pub fn directives(&self) -> &[String] {
        if self.is_empty() {
            return &[];
        }
        &self.0[1..self.0.len() - 1]
    }
}
