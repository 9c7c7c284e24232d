//! Batch ingestion: runs records through mapper and writer concurrently.
//!
//! Each record is processed on the blocking pool (store calls block) with at
//! most `workers` records in flight. Records are independent: a malformed
//! record or a failed transaction is reported and the batch carries on.
//! Cancelling the token stops new records from starting; records already in
//! flight finish and the rest are reported as skipped.
//!
//! # Module layout
//!
//! - **report**: `RecordReport`, `RunReport` and run totals.

pub mod report;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::mapper::RecordMapper;
use crate::records::SourceRecord;
use crate::writer::GraphWriter;

pub use report::{FailedStage, Outcome, RecordReport, RecordState, RunReport, RunTotals};

pub struct Ingestor {
    writer: Arc<GraphWriter>,
    mapper: Arc<RecordMapper>,
    workers: usize,
}

impl Ingestor {
    pub fn new(writer: Arc<GraphWriter>, mapper: Arc<RecordMapper>, workers: usize) -> Self {
        Self {
            writer,
            mapper,
            workers: workers.max(1),
        }
    }

    /// Process one batch. Never fails as a whole; see the per-record reports.
    pub async fn run(&self, records: Vec<SourceRecord>, cancel: CancellationToken) -> RunReport {
        let started_at = Utc::now();
        let total = records.len();
        info!(records = total, workers = self.workers, "batch started");

        let sem = Arc::new(Semaphore::new(self.workers));
        let mut set: JoinSet<RecordReport> = JoinSet::new();
        let mut outstanding = HashMap::new();
        let mut reports = Vec::with_capacity(total);
        let mut pending = records.into_iter();

        while let Some(record) = pending.next() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = sem.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                let remaining = std::iter::once(record).chain(pending.by_ref());
                for r in remaining {
                    reports.push(RecordReport::skipped(r.index, r.kind, r.sanction_id_hint()));
                }
                warn!(skipped = reports.len(), "batch cancelled, remaining records skipped");
                break;
            };

            let meta = (record.index, record.kind, record.sanction_id_hint());
            let writer = self.writer.clone();
            let mapper = self.mapper.clone();
            let handle = set.spawn_blocking(move || {
                let _permit = permit;
                process(&mapper, &writer, &record)
            });
            outstanding.insert(handle.id(), meta);
        }

        while let Some(res) = set.join_next_with_id().await {
            match res {
                Ok((id, report)) => {
                    outstanding.remove(&id);
                    reports.push(report);
                }
                Err(e) => {
                    if let Some((index, kind, hint)) = outstanding.remove(&e.id()) {
                        error!(record = index, %kind, "record worker panicked: {e}");
                        reports.push(RecordReport::failed(
                            index,
                            kind,
                            hint,
                            FailedStage::Mandatory,
                            format!("worker panicked: {e}"),
                        ));
                    }
                }
            }
        }

        let report = RunReport::new(started_at, reports);
        info!(
            run_id = %report.run_id,
            done = report.totals.done,
            partial = report.totals.partial,
            failed = report.totals.failed_mapping + report.totals.failed_mandatory,
            skipped = report.totals.skipped,
            "batch finished"
        );
        report
    }
}

/// Decode, map and write one record. Blocking.
pub fn process(mapper: &RecordMapper, writer: &GraphWriter, source: &SourceRecord) -> RecordReport {
    let hint = source.sanction_id_hint();

    let plan = match source.decode().and_then(|r| mapper.map(&r)) {
        Ok(plan) => plan,
        Err(e) => {
            error!(record = source.index, kind = %source.kind, sanction_id = ?hint, error = %e, "malformed record");
            return RecordReport::failed(source.index, source.kind, hint, FailedStage::Mapping, e.to_string());
        }
    };

    let mut report = RecordReport {
        index: source.index,
        kind: source.kind,
        sanction_id: Some(plan.sanction_id.clone()),
        state: RecordState::Mapped,
        outcome: Outcome::Done,
        stats: Default::default(),
        omitted: plan.omitted.len(),
    };

    match writer.apply_mandatory(&plan) {
        Ok(stats) => {
            report.stats = stats;
            report.state = RecordState::MandatoryApplied;
        }
        Err(e) => {
            error!(sanction_id = %plan.sanction_id, error = %e, "mandatory write failed, record not written");
            report.state = RecordState::Failed;
            report.outcome = Outcome::Failed {
                stage: FailedStage::Mandatory,
                cause: e.to_string(),
            };
            return report;
        }
    }

    let (stats, failures) = writer.apply_optional(&plan);
    report.stats.absorb(stats);
    report.state = RecordState::FanOutApplied;

    if failures.is_empty() {
        report.state = RecordState::Done;
        debug!(sanction_id = %plan.sanction_id, party = ?report.stats.party, "record ingested");
    } else {
        for f in &failures {
            warn!(sanction_id = %plan.sanction_id, scope = %f.scope, error = %f.error, "optional write failed");
        }
        report.outcome = Outcome::Partial { failures };
    }
    report
}
