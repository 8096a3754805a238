use prettytable::{cell, row, Row};

use prefix_sync::{AsnOutcome, AsnReport};

use super::table::ToRow;

const EMPTY_VALUE: &str = "";

fn limits_column(report: &AsnReport) -> String {
    match report.limits {
        Some(limits) if limits.failed > 0 => {
            format!("{} set, {} failed", limits.applied, limits.failed)
        }
        Some(limits) => format!("{} set", limits.applied),
        None => String::from(EMPTY_VALUE),
    }
}

impl ToRow for AsnReport {
    fn columns() -> Row {
        row![
            "VRF",
            "ASN",
            "AS-SETs",
            "IPv4",
            "IPv6",
            "Commands",
            "Outcome",
            "Peer Limits"
        ]
    }

    fn to_row(&self) -> Row {
        let outcome = match self.outcome {
            AsnOutcome::ApplyFailed => cell!(Fr->self.outcome),
            AsnOutcome::Applied => cell!(Fg->self.outcome),
            _ => cell!(self.outcome),
        };
        let mut row = row![
            self.vrf,
            self.asn,
            self.as_sets.join(", "),
            self.v4_lines,
            self.v6_lines,
            self.commands
        ];
        row.add_cell(outcome);
        row.add_cell(cell!(limits_column(self)));
        row
    }
}
