//! The orchestrator's return value: a front-end-agnostic rendering of what an
//! import run did (§4.12, §7). The `Display` impl is the printable summary
//! the spec asks the core to own so any real CLI can reuse it verbatim.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Per-entity, per-year coalescer outcome (§4.11).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearStats {
    pub initial: usize,
    pub added: usize,
    pub duplicates: usize,
}

impl YearStats {
    pub fn final_count(&self) -> usize {
        self.initial + self.added
    }
}

/// Aggregate outcome for one entity kind (calls or SMS) across an entire run.
#[derive(Debug, Clone, Default)]
pub struct EntitySummary {
    pub added: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub errors: usize,
    pub by_year: BTreeMap<i32, YearStats>,
}

impl EntitySummary {
    pub fn total_final(&self) -> usize {
        self.by_year.values().map(YearStats::final_count).sum()
    }
}

/// The value [`crate::orchestrator::Orchestrator::run`] returns (§4.12 step 7).
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub calls: EntitySummary,
    pub sms: EntitySummary,
    pub attachments_extracted: usize,
    pub attachments_referenced: usize,
    pub rejection_files: Vec<String>,
    pub duration: Duration,
}

impl ImportSummary {
    pub fn total_calls(&self) -> usize {
        self.calls.total_final()
    }

    /// SMS + MMS combined (§4.10 `summary.yaml.statistics.total_sms`).
    pub fn total_sms(&self) -> usize {
        self.sms.total_final()
    }

    pub fn years_covered(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .calls
            .by_year
            .keys()
            .chain(self.sms.by_year.keys())
            .copied()
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "calls: {} added, {} duplicates, {} rejected, {} errors",
            self.calls.added, self.calls.duplicates, self.calls.rejected, self.calls.errors
        )?;
        for (year, stats) in &self.calls.by_year {
            writeln!(
                f,
                "  {year}: initial={} added={} duplicates={} final={}",
                stats.initial, stats.added, stats.duplicates, stats.final_count()
            )?;
        }
        writeln!(
            f,
            "sms: {} added, {} duplicates, {} rejected, {} errors",
            self.sms.added, self.sms.duplicates, self.sms.rejected, self.sms.errors
        )?;
        for (year, stats) in &self.sms.by_year {
            writeln!(
                f,
                "  {year}: initial={} added={} duplicates={} final={}",
                stats.initial, stats.added, stats.duplicates, stats.final_count()
            )?;
        }
        writeln!(
            f,
            "attachments: {} extracted, {} already present",
            self.attachments_extracted, self.attachments_referenced
        )?;
        if self.rejection_files.is_empty() {
            writeln!(f, "no rejection files written")?;
        } else {
            writeln!(f, "rejection files:")?;
            for path in &self.rejection_files {
                writeln!(f, "  {path}")?;
            }
        }
        write!(f, "completed in {:.2}s", self.duration.as_secs_f64())
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
