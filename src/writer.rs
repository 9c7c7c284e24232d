//! Graph writer: applies an [`UpsertPlan`] scope by scope.
//!
//! The mandatory set runs first in one transaction; if it fails nothing of the
//! record is written. Each conditional and fan-out set then runs in its own
//! transaction, so a failure there is reported against its scope and leaves
//! every other scope intact. Transient store errors are retried with a linear
//! backoff up to `retry_attempts` attempts per transaction.
//!
//! Methods block; the ingestor calls them from `spawn_blocking`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::core::config::StoreConfig;
use crate::mapper::{Scope, UpsertPlan, WriteSet};
use crate::store::{GraphStore, MergeOutcome, NodeKind, StoreError};

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("{0}")]
    Store(StoreError),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: StoreError },
}

/// One optional scope that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFailure {
    pub scope: Scope,
    pub error: ApplyError,
}

// ── Statistics ───────────────────────────────────────────────────────────────

/// What the committed transactions of one record did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetStats {
    /// Outcome of the party node merge; set by the mandatory transaction only.
    pub party: Option<MergeOutcome>,
    pub nodes_created: u64,
    pub nodes_updated: u64,
    pub edges_created: u64,
    pub edges_updated: u64,
}

impl SetStats {
    pub fn absorb(&mut self, other: SetStats) {
        if other.party.is_some() {
            self.party = other.party;
        }
        self.nodes_created += other.nodes_created;
        self.nodes_updated += other.nodes_updated;
        self.edges_created += other.edges_created;
        self.edges_updated += other.edges_updated;
    }

    fn count_node(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Created => self.nodes_created += 1,
            MergeOutcome::Updated => self.nodes_updated += 1,
            MergeOutcome::Unchanged => {}
        }
    }

    fn count_edge(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Created => self.edges_created += 1,
            MergeOutcome::Updated => self.edges_updated += 1,
            MergeOutcome::Unchanged => {}
        }
    }
}

// ── Writer ───────────────────────────────────────────────────────────────────

pub struct GraphWriter {
    store: Arc<dyn GraphStore>,
    retry_attempts: u32,
    retry_backoff_ms: u64,
}

impl GraphWriter {
    pub fn new(store: Arc<dyn GraphStore>, retry_attempts: u32, retry_backoff_ms: u64) -> Self {
        Self {
            store,
            retry_attempts: retry_attempts.max(1),
            retry_backoff_ms,
        }
    }

    pub fn from_config(store: Arc<dyn GraphStore>, cfg: &StoreConfig) -> Self {
        Self::new(store, cfg.retry_attempts, cfg.retry_backoff_ms)
    }

    /// Regime, list, party and the listing edges, all or nothing.
    pub fn apply_mandatory(&self, plan: &UpsertPlan) -> Result<SetStats, ApplyError> {
        self.apply_set(&plan.sanction_id, &Scope::Mandatory, &plan.mandatory)
    }

    /// Every conditional and fan-out set, each in its own transaction.
    /// Only meaningful after `apply_mandatory` succeeded for the same plan.
    pub fn apply_optional(&self, plan: &UpsertPlan) -> (SetStats, Vec<ScopeFailure>) {
        let mut stats = SetStats::default();
        let mut failures = Vec::new();
        for set in plan.optional_sets() {
            match self.apply_set(&plan.sanction_id, &set.scope, &set.writes) {
                Ok(s) => stats.absorb(s),
                Err(error) => failures.push(ScopeFailure {
                    scope: set.scope.clone(),
                    error,
                }),
            }
        }
        (stats, failures)
    }

    fn apply_set(&self, sanction_id: &str, scope: &Scope, writes: &WriteSet) -> Result<SetStats, ApplyError> {
        let mut attempt = 1;
        loop {
            let mut stats = SetStats::default();
            let result = self.store.write(&mut |tx| {
                // A retried attempt starts from a rolled-back transaction.
                stats = SetStats::default();
                for node in &writes.nodes {
                    let outcome = tx.merge_node(node)?;
                    if node.kind == NodeKind::Party {
                        stats.party = Some(outcome);
                    }
                    stats.count_node(outcome);
                }
                for edge in &writes.edges {
                    let outcome = tx.merge_edge(edge)?;
                    stats.count_edge(outcome);
                }
                Ok(())
            });

            match result {
                Ok(()) => return Ok(stats),
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    warn!(
                        sanction_id = %sanction_id,
                        scope = %scope,
                        attempt,
                        error = %e,
                        "transient store error, retrying"
                    );
                    std::thread::sleep(Duration::from_millis(self.retry_backoff_ms * u64::from(attempt)));
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(ApplyError::RetriesExhausted { attempts: attempt, last: e });
                }
                Err(e) => return Err(ApplyError::Store(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::RecordMapper;
    use crate::records::{ListDescriptor, PartyKind, RegimeDescriptor, SourceRecord};
    use crate::store::{
        ClearSummary, EdgeUpsert, GraphStats, GraphTx, NodeUpsert, Rel, SqliteGraphStore,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    /// Wraps a real store and fails the first `busy_writes` transactions with
    /// `Busy`, and any transaction touching `poisoned` with `Backend`.
    struct FlakyStore {
        inner: SqliteGraphStore,
        busy_writes: AtomicU32,
        poisoned: Option<Rel>,
        calls: AtomicU32,
    }

    struct PoisonTx<'a> {
        inner: &'a mut dyn GraphTx,
        poisoned: Option<Rel>,
    }

    impl GraphTx for PoisonTx<'_> {
        fn merge_node(&mut self, node: &NodeUpsert) -> Result<MergeOutcome, StoreError> {
            self.inner.merge_node(node)
        }

        fn merge_edge(&mut self, edge: &EdgeUpsert) -> Result<MergeOutcome, StoreError> {
            if Some(edge.rel) == self.poisoned {
                return Err(StoreError::Backend(format!("refusing {}", edge.rel)));
            }
            self.inner.merge_edge(edge)
        }
    }

    impl GraphStore for FlakyStore {
        fn ensure_constraints(&self) -> Result<(), StoreError> {
            self.inner.ensure_constraints()
        }

        fn write(
            &self,
            work: &mut dyn FnMut(&mut dyn GraphTx) -> Result<(), StoreError>,
        ) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.busy_writes.load(Ordering::SeqCst);
            if remaining > 0 {
                self.busy_writes.store(remaining - 1, Ordering::SeqCst);
                return Err(StoreError::Busy("simulated".into()));
            }
            let poisoned = self.poisoned;
            self.inner.write(&mut |tx| work(&mut PoisonTx { inner: tx, poisoned }))
        }

        fn stats(&self) -> Result<GraphStats, StoreError> {
            self.inner.stats()
        }

        fn clear_sanctions_data(&self) -> Result<ClearSummary, StoreError> {
            self.inner.clear_sanctions_data()
        }
    }

    fn flaky(dir: &TempDir, busy_writes: u32, poisoned: Option<Rel>) -> Arc<FlakyStore> {
        let inner = SqliteGraphStore::open(&dir.path().join("graph.db"), 1_000).unwrap();
        inner.ensure_constraints().unwrap();
        Arc::new(FlakyStore {
            inner,
            busy_writes: AtomicU32::new(busy_writes),
            poisoned,
            calls: AtomicU32::new(0),
        })
    }

    fn plan() -> UpsertPlan {
        let mapper = RecordMapper::new(
            RegimeDescriptor {
                id: "cyber".into(),
                name: "Cyber".into(),
                authority: "OFSI".into(),
                legal_basis: "Regs 2020".into(),
            },
            ListDescriptor {
                id: "uk-cyber".into(),
                name: "UK Cyber".into(),
                source_file: "Cyber.pdf".into(),
                authority: "OFSI".into(),
            },
        );
        let body = json!({
            "sanctionId": "X1",
            "nationality": "Kyrgyzstan",
            "aliases": ["DARKON", "Dark One"],
            "address": {"rawAddress": "Bishkek, Kyrgyzstan"}
        });
        let record = SourceRecord::new(0, PartyKind::Person, body).decode().unwrap();
        mapper.map(&record).unwrap()
    }

    #[test]
    fn mandatory_creates_then_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = flaky(&dir, 0, None);
        let writer = GraphWriter::new(store.clone(), 3, 1);
        let plan = plan();

        let first = writer.apply_mandatory(&plan).unwrap();
        assert_eq!(first.party, Some(MergeOutcome::Created));
        assert_eq!(first.nodes_created, 3);
        assert_eq!(first.edges_created, 3);

        let second = writer.apply_mandatory(&plan).unwrap();
        assert_eq!(second.party, Some(MergeOutcome::Unchanged));
        assert_eq!(second.nodes_created, 0);
        assert_eq!(second.edges_updated, 0);
    }

    #[test]
    fn optional_sets_each_commit() {
        let dir = TempDir::new().unwrap();
        let store = flaky(&dir, 0, None);
        let writer = GraphWriter::new(store.clone(), 3, 1);
        let plan = plan();
        writer.apply_mandatory(&plan).unwrap();

        let (stats, failures) = writer.apply_optional(&plan);
        assert!(failures.is_empty());
        assert_eq!(stats.party, None);
        // nationality, two aliases, one address
        assert_eq!(store.calls.load(Ordering::SeqCst), 1 + 4);
        let graph = store.stats().unwrap();
        assert_eq!(graph.rel_count(Rel::HasAlias), 2);
        assert_eq!(graph.rel_count(Rel::HasNationality), 1);
        assert_eq!(graph.rel_count(Rel::LocatedIn), 1);
        assert_eq!(graph.label_count("Country"), 1);
    }

    #[test]
    fn transient_errors_are_retried() {
        let dir = TempDir::new().unwrap();
        let store = flaky(&dir, 2, None);
        let writer = GraphWriter::new(store.clone(), 3, 1);

        let stats = writer.apply_mandatory(&plan()).unwrap();
        assert_eq!(stats.party, Some(MergeOutcome::Created));
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn retries_exhausted() {
        let dir = TempDir::new().unwrap();
        let store = flaky(&dir, 10, None);
        let writer = GraphWriter::new(store.clone(), 3, 1);

        let err = writer.apply_mandatory(&plan()).unwrap_err();
        assert!(matches!(err, ApplyError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.stats().unwrap().nodes, 0);
    }

    #[test]
    fn permanent_error_not_retried_and_rolled_back() {
        let dir = TempDir::new().unwrap();
        let store = flaky(&dir, 0, Some(Rel::ListedOn));
        let writer = GraphWriter::new(store.clone(), 3, 1);

        let err = writer.apply_mandatory(&plan()).unwrap_err();
        assert!(matches!(err, ApplyError::Store(StoreError::Backend(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.stats().unwrap().nodes, 0);
    }

    #[test]
    fn failing_scope_leaves_others_applied() {
        let dir = TempDir::new().unwrap();
        let store = flaky(&dir, 0, Some(Rel::HasNationality));
        let writer = GraphWriter::new(store.clone(), 3, 1);
        let plan = plan();
        writer.apply_mandatory(&plan).unwrap();

        let (_, failures) = writer.apply_optional(&plan);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].scope, Scope::Nationality);

        let graph = store.stats().unwrap();
        assert_eq!(graph.rel_count(Rel::HasNationality), 0);
        assert_eq!(graph.rel_count(Rel::HasAlias), 2);
        assert_eq!(graph.rel_count(Rel::HasAddress), 1);
    }
}
