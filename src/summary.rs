use std::fmt::Display;

use comfy_table::Attribute;
use comfy_table::Cell;
use comfy_table::Color;
use comfy_table::Table;

use crate::builder::BuildReport;
use crate::builder::PatchsetStatus;
use crate::patchset::Patchset;
use crate::patchset::Patchsets;

/// The per-patchset results of a run, as a table.
#[derive(Debug)]
pub struct Summary<'a> {
    patchsets: &'a Patchsets,
    report: &'a BuildReport,
}

/// One row of a [`Summary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow<'a> {
    pub patchset: Patchset,
    /// `None` if the patchset was neither on the branch nor picked, because a later patchset
    /// was already applied.
    pub status: Option<&'a PatchsetStatus>,
}

impl<'a> SummaryRow<'a> {
    fn status_cell(&self) -> Cell {
        match self.status {
            Some(status @ PatchsetStatus::Applied(_)) => Cell::new(status).fg(Color::Green),
            Some(status @ PatchsetStatus::AlreadyApplied(_)) => {
                Cell::new(status).add_attribute(Attribute::Dim)
            }
            Some(status @ PatchsetStatus::Conflicted) => Cell::new(status).fg(Color::Red),
            None => Cell::new("skipped").fg(Color::Yellow),
        }
    }

    fn commit_cell(&self) -> Cell {
        match self.status.and_then(PatchsetStatus::commit) {
            Some(commit) => Cell::new(commit.abbrev()),
            None => Cell::new(""),
        }
    }
}

impl<'a> Summary<'a> {
    pub fn new(patchsets: &'a Patchsets, report: &'a BuildReport) -> Self {
        Self { patchsets, report }
    }

    /// One row per fetched patchset, in increasing order.
    pub fn rows(&self) -> Vec<SummaryRow<'a>> {
        let report = self.report;
        self.patchsets
            .iter()
            .map(|record| SummaryRow {
                patchset: record.number,
                status: report.outcomes.get(&record.number),
            })
            .collect()
    }

    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::NOTHING)
            .set_header(vec![
                Cell::new("Patchset").add_attribute(Attribute::Bold),
                Cell::new("Status").add_attribute(Attribute::Bold),
                Cell::new("Commit").add_attribute(Attribute::Bold),
            ]);

        for row in self.rows() {
            table.add_row(vec![
                Cell::new(row.patchset),
                row.status_cell(),
                row.commit_cell(),
            ]);
        }

        table
    }
}

impl Display for Summary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table())
    }
}
