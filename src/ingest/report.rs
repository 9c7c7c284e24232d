//! Per-record and per-run reporting.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::records::PartyKind;
use crate::store::MergeOutcome;
use crate::writer::{ScopeFailure, SetStats};

/// Lifecycle of one record. Advances monotonically; `Failed` is terminal.
///
/// `FanOutApplied` means every optional set was attempted. A record that
/// stops there has a `Partial` outcome; `Done` means all of them committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecordState {
    Pending,
    Mapped,
    MandatoryApplied,
    FanOutApplied,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    Mapping,
    Mandatory,
}

impl fmt::Display for FailedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailedStage::Mapping => f.write_str("mapping"),
            FailedStage::Mandatory => f.write_str("mandatory write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every scope committed.
    Done,
    /// Mandatory set committed; the listed optional scopes did not.
    Partial { failures: Vec<ScopeFailure> },
    /// Nothing of the record was written.
    Failed { stage: FailedStage, cause: String },
    /// Cancelled before processing started.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub index: usize,
    pub kind: PartyKind,
    pub sanction_id: Option<String>,
    pub state: RecordState,
    pub outcome: Outcome,
    pub stats: SetStats,
    /// Conditional edges left out because the text did not qualify.
    pub omitted: usize,
}

impl RecordReport {
    pub fn skipped(index: usize, kind: PartyKind, sanction_id: Option<String>) -> Self {
        Self {
            index,
            kind,
            sanction_id,
            state: RecordState::Pending,
            outcome: Outcome::Skipped,
            stats: SetStats::default(),
            omitted: 0,
        }
    }

    pub fn failed(
        index: usize,
        kind: PartyKind,
        sanction_id: Option<String>,
        stage: FailedStage,
        cause: String,
    ) -> Self {
        Self {
            index,
            kind,
            sanction_id,
            state: RecordState::Failed,
            outcome: Outcome::Failed { stage, cause },
            stats: SetStats::default(),
            omitted: 0,
        }
    }

    /// Label used in log lines and the summary.
    pub fn label(&self) -> String {
        match &self.sanction_id {
            Some(id) => format!("{} {id}", self.kind),
            None => format!("{} #{}", self.kind, self.index),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub records: usize,
    pub done: usize,
    pub partial: usize,
    pub failed_mapping: usize,
    pub failed_mandatory: usize,
    pub skipped: usize,
    pub parties_created: usize,
    pub parties_updated: usize,
    pub parties_unchanged: usize,
    pub nodes_created: u64,
    pub nodes_updated: u64,
    pub relationships_created: u64,
    pub relationships_updated: u64,
    pub conditional_omitted: usize,
    pub scope_failures: usize,
}

impl RunTotals {
    fn add(&mut self, r: &RecordReport) {
        self.records += 1;
        match &r.outcome {
            Outcome::Done => self.done += 1,
            Outcome::Partial { failures } => {
                self.partial += 1;
                self.scope_failures += failures.len();
            }
            Outcome::Failed { stage: FailedStage::Mapping, .. } => self.failed_mapping += 1,
            Outcome::Failed { stage: FailedStage::Mandatory, .. } => self.failed_mandatory += 1,
            Outcome::Skipped => self.skipped += 1,
        }
        match r.stats.party {
            Some(MergeOutcome::Created) => self.parties_created += 1,
            Some(MergeOutcome::Updated) => self.parties_updated += 1,
            Some(MergeOutcome::Unchanged) => self.parties_unchanged += 1,
            None => {}
        }
        self.nodes_created += r.stats.nodes_created;
        self.nodes_updated += r.stats.nodes_updated;
        self.relationships_created += r.stats.edges_created;
        self.relationships_updated += r.stats.edges_updated;
        self.conditional_omitted += r.omitted;
    }

    fn merge(&mut self, o: &RunTotals) {
        self.records += o.records;
        self.done += o.done;
        self.partial += o.partial;
        self.failed_mapping += o.failed_mapping;
        self.failed_mandatory += o.failed_mandatory;
        self.skipped += o.skipped;
        self.parties_created += o.parties_created;
        self.parties_updated += o.parties_updated;
        self.parties_unchanged += o.parties_unchanged;
        self.nodes_created += o.nodes_created;
        self.nodes_updated += o.nodes_updated;
        self.relationships_created += o.relationships_created;
        self.relationships_updated += o.relationships_updated;
        self.conditional_omitted += o.conditional_omitted;
        self.scope_failures += o.scope_failures;
    }
}

/// Summary of one ingestion run over one or more batches.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Sorted by batch then index.
    pub records: Vec<RecordReport>,
    pub totals: RunTotals,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>, mut records: Vec<RecordReport>) -> Self {
        records.sort_by_key(|r| r.index);
        let mut totals = RunTotals::default();
        for r in &records {
            totals.add(r);
        }
        Self {
            run_id: Uuid::now_v7(),
            started_at,
            finished_at: Utc::now(),
            records,
            totals,
        }
    }

    /// Append a later batch of the same run.
    pub fn merge(&mut self, other: RunReport) {
        self.totals.merge(&other.totals);
        self.records.extend(other.records);
        self.finished_at = self.finished_at.max(other.finished_at);
    }

    /// `true` when every record reached at least `MandatoryApplied`.
    pub fn all_mandatory_applied(&self) -> bool {
        self.records
            .iter()
            .all(|r| matches!(r.outcome, Outcome::Done | Outcome::Partial { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordReport> {
        self.records
            .iter()
            .filter(|r| !matches!(r.outcome, Outcome::Done))
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.totals;
        let elapsed = self.finished_at - self.started_at;
        writeln!(f, "Ingestion run {} ({} ms)", self.run_id, elapsed.num_milliseconds())?;
        writeln!(
            f,
            "  records:        {} (done {}, partial {}, failed {}, skipped {})",
            t.records,
            t.done,
            t.partial,
            t.failed_mapping + t.failed_mandatory,
            t.skipped
        )?;
        writeln!(
            f,
            "  parties:        {} created, {} updated, {} unchanged",
            t.parties_created, t.parties_updated, t.parties_unchanged
        )?;
        writeln!(f, "  nodes:          {} created, {} updated", t.nodes_created, t.nodes_updated)?;
        writeln!(
            f,
            "  relationships:  {} created, {} updated",
            t.relationships_created, t.relationships_updated
        )?;
        writeln!(f, "  omitted edges:  {}", t.conditional_omitted)?;
        for r in self.failures() {
            match &r.outcome {
                Outcome::Partial { failures } => {
                    for sf in failures {
                        writeln!(f, "  partial  {}: {} ({})", r.label(), sf.scope, sf.error)?;
                    }
                }
                Outcome::Failed { stage, cause } => {
                    writeln!(f, "  failed   {}: {stage}: {cause}", r.label())?;
                }
                Outcome::Skipped => writeln!(f, "  skipped  {}", r.label())?,
                Outcome::Done => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::Scope;
    use crate::store::StoreError;
    use crate::writer::ApplyError;

    fn done(index: usize, party: MergeOutcome) -> RecordReport {
        RecordReport {
            index,
            kind: PartyKind::Person,
            sanction_id: Some(format!("X{index}")),
            state: RecordState::Done,
            outcome: Outcome::Done,
            stats: SetStats {
                party: Some(party),
                nodes_created: 2,
                edges_created: 3,
                ..SetStats::default()
            },
            omitted: 1,
        }
    }

    #[test]
    fn totals_count_each_outcome() {
        let partial = RecordReport {
            state: RecordState::FanOutApplied,
            outcome: Outcome::Partial {
                failures: vec![ScopeFailure {
                    scope: Scope::Nationality,
                    error: ApplyError::Store(StoreError::Backend("x".into())),
                }],
            },
            ..done(2, MergeOutcome::Updated)
        };
        let report = RunReport::new(
            Utc::now(),
            vec![
                partial,
                done(0, MergeOutcome::Created),
                RecordReport::failed(1, PartyKind::Person, None, FailedStage::Mapping, "bad".into()),
                RecordReport::skipped(3, PartyKind::Person, Some("X3".into())),
            ],
        );
        let t = report.totals;
        assert_eq!(t.records, 4);
        assert_eq!((t.done, t.partial, t.failed_mapping, t.skipped), (1, 1, 1, 1));
        assert_eq!((t.parties_created, t.parties_updated), (1, 1));
        assert_eq!(t.nodes_created, 4);
        assert_eq!(t.scope_failures, 1);
        assert_eq!(t.conditional_omitted, 2);
        assert_eq!(report.records[0].index, 0);
        assert!(!report.all_mandatory_applied());
    }

    #[test]
    fn merge_adds_batches() {
        let mut a = RunReport::new(Utc::now(), vec![done(0, MergeOutcome::Created)]);
        let b = RunReport::new(Utc::now(), vec![done(0, MergeOutcome::Unchanged)]);
        a.merge(b);
        assert_eq!(a.totals.records, 2);
        assert_eq!(a.totals.parties_unchanged, 1);
        assert_eq!(a.records.len(), 2);
        assert!(a.all_mandatory_applied());
    }

    #[test]
    fn display_lists_failures() {
        let report = RunReport::new(
            Utc::now(),
            vec![RecordReport::failed(
                7,
                PartyKind::Organisation,
                None,
                FailedStage::Mapping,
                "missing required key 'sanctionId'".into(),
            )],
        );
        let text = report.to_string();
        assert!(text.contains("failed   organisation #7: mapping: missing required key 'sanctionId'"));
    }

    #[test]
    fn states_are_ordered() {
        assert!(RecordState::Pending < RecordState::Mapped);
        assert!(RecordState::MandatoryApplied < RecordState::FanOutApplied);
        assert!(RecordState::FanOutApplied < RecordState::Done);
    }
}
