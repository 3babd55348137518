//! Timetable engine: the `run` and `audit` operations.
//!
//! `run` loads a snapshot, chains slot allocation, room assignment and
//! invigilator assignment, audits the result and replaces the session's
//! stored outputs in one step. `audit` re-verifies a stored timetable
//! without scheduling anything.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use u_timetable::{EngineConfig, MemoryStore, TimetableEngine};
//!
//! let store = Arc::new(MemoryStore::new());
//! let engine = TimetableEngine::new(store.clone(), store, EngineConfig::default());
//! let report = engine.run("2026-S1").unwrap();
//! println!("{} exams, {} conflicts", report.scheduled_count, report.conflict_count);
//! ```

use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::audit::ConflictAuditor;
use crate::config::EngineConfig;
use crate::error::{Result, TimetableError};
use crate::loader::{load_snapshot, Snapshot};
use crate::models::{Conflict, ConflictSummary, Severity, Timetable};
use crate::scheduler::{
    ConflictGraph, InvigilatorAssigner, PlacementMode, RoomAssigner, SlotAllocator, TimetableKpi,
};
use crate::store::{SnapshotSource, TimetableStore};

/// Outcome of scheduling one snapshot, before persistence.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    /// The complete timetable.
    pub timetable: Timetable,
    /// Audited conflicts of the timetable, sorted.
    pub conflicts: Vec<Conflict>,
    /// Modules placed by search without violation.
    pub clean_placements: usize,
    /// Modules placed at their least-violating position.
    pub relaxed_placements: usize,
    /// Modules placed round-robin after the time budget ran out.
    pub fallback_placements: usize,
}

/// Result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub session_id: String,
    /// Modules given an exam.
    pub scheduled_count: usize,
    /// Modules requiring an exam.
    pub total_modules: usize,
    /// Conflicts recorded for the new timetable.
    pub conflict_count: usize,
    /// Wall-clock duration of the run, persistence included.
    pub elapsed_seconds: f64,
    /// Modules placed round-robin after the time budget ran out.
    pub fallback_placements: usize,
    /// Conflict counts by kind and severity.
    pub summary: ConflictSummary,
    /// Quality indicators.
    pub kpi: TimetableKpi,
}

impl RunReport {
    /// scheduled_count / total_modules (1.0 when nothing requires an exam).
    pub fn success_rate(&self) -> f64 {
        if self.total_modules == 0 {
            1.0
        } else {
            self.scheduled_count as f64 / self.total_modules as f64
        }
    }
}

/// Scheduling engine over a snapshot source and a timetable store.
pub struct TimetableEngine<S, T> {
    source: S,
    store: T,
    config: EngineConfig,
}

impl<S: SnapshotSource, T: TimetableStore> TimetableEngine<S, T> {
    /// Creates an engine.
    pub fn new(source: S, store: T, config: EngineConfig) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying timetable store.
    pub fn store(&self) -> &T {
        &self.store
    }

    /// Generates and persists the timetable of a session.
    ///
    /// Prior results of the session are replaced only once the new
    /// timetable is complete; any error leaves them intact.
    ///
    /// # Errors
    /// - `SessionNotFound`, `DataIncomplete`, `InvalidInput` from loading,
    ///   before anything is written.
    /// - `Persistence` if the store rejects the replacement.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub fn run(&self, session_id: &str) -> Result<RunReport> {
        let started = Instant::now();
        info!(event = "run.started", session_id = %session_id);

        let snapshot = load_snapshot(&self.source, session_id)?;
        let outcome = self.schedule_since(&snapshot, started);
        let kpi = TimetableKpi::calculate(&snapshot, &outcome.timetable);
        let summary = ConflictSummary::from_conflicts(&outcome.conflicts);
        let scheduled_count = outcome.timetable.exam_count();
        let conflict_count = outcome.conflicts.len();

        if let Err(err) = self
            .store
            .replace_results(outcome.timetable, outcome.conflicts)
        {
            warn!(event = "run.persist_failed", session_id = %session_id, error = %err);
            return Err(err.into());
        }

        let report = RunReport {
            session_id: session_id.to_string(),
            scheduled_count,
            total_modules: snapshot.modules.len(),
            conflict_count,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            fallback_placements: outcome.fallback_placements,
            summary,
            kpi,
        };

        info!(
            event = "run.finished",
            session_id = %session_id,
            scheduled = report.scheduled_count,
            total = report.total_modules,
            conflicts = report.conflict_count,
            relaxed = outcome.relaxed_placements,
            fallback = report.fallback_placements,
            success_rate = report.success_rate(),
            elapsed_s = report.elapsed_seconds,
        );

        Ok(report)
    }

    /// Builds the timetable of a snapshot without persisting it.
    pub fn schedule(&self, snapshot: &Snapshot) -> ScheduleOutcome {
        self.schedule_since(snapshot, Instant::now())
    }

    /// Like [`schedule`](Self::schedule), with the time budget measured
    /// from `started`.
    pub fn schedule_since(&self, snapshot: &Snapshot, started: Instant) -> ScheduleOutcome {
        for slot in &snapshot.slots {
            if !slot.fits_exam(self.config.exam_duration_minutes) {
                warn!(
                    event = "run.short_slot",
                    session_id = %snapshot.session_id(),
                    slot_id = %slot.id,
                    minutes = slot.duration_minutes(),
                    required = self.config.exam_duration_minutes,
                );
            }
        }

        let graph = ConflictGraph::build(snapshot, self.config.couple_formation_modules);
        let allocation = SlotAllocator::new(&self.config).allocate_since(snapshot, &graph, started);
        let mut timetable = allocation.to_timetable(snapshot);
        let room_conflicts =
            RoomAssigner::new(&self.config).assign(snapshot, &allocation, &mut timetable);
        let staff_conflicts =
            InvigilatorAssigner::new(&self.config).assign(snapshot, &mut timetable);

        let conflicts = ConflictAuditor::new(&self.config).audit(snapshot, &timetable);

        info!(
            event = "run.scheduled",
            session_id = %snapshot.session_id(),
            exams = timetable.exam_count(),
            rooms = timetable.room_assignments.len(),
            invigilations = timetable.invigilations.len(),
            placement_conflicts = allocation.conflicts.len(),
            room_conflicts = room_conflicts.len(),
            staff_conflicts = staff_conflicts.len(),
            audited_conflicts = conflicts.len(),
        );

        ScheduleOutcome {
            timetable,
            conflicts,
            clean_placements: allocation.count(PlacementMode::Clean),
            relaxed_placements: allocation.count(PlacementMode::Relaxed),
            fallback_placements: allocation.count(PlacementMode::Fallback),
        }
    }

    /// Re-verifies the stored timetable of a session and replaces its
    /// stored conflicts.
    ///
    /// # Errors
    /// - `TimetableNotFound` if the session has never been run.
    /// - Loading errors for the session's current facts.
    /// - `Persistence` if the conflicts cannot be stored.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub fn audit(&self, session_id: &str) -> Result<ConflictSummary> {
        let timetable = self
            .store
            .timetable(session_id)?
            .ok_or_else(|| TimetableError::TimetableNotFound(session_id.to_string()))?;
        let snapshot = load_snapshot(&self.source, session_id)?;

        let conflicts = ConflictAuditor::new(&self.config).audit(&snapshot, &timetable);
        let summary = ConflictSummary::from_conflicts(&conflicts);
        self.store.replace_conflicts(session_id, conflicts)?;

        info!(
            event = "audit.finished",
            session_id = %session_id,
            total = summary.total,
            critical = summary.count_severity(Severity::Critical),
        );

        Ok(summary)
    }
}
