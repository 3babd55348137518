//! Storage seams for session input and run output.
//!
//! - [`SnapshotSource`]: read-only access to a session's facts.
//! - [`TimetableStore`]: persisted outputs, replaced as a whole.
//!
//! [`MemoryStore`] implements both. Every replacement happens under a
//! single write lock after an integrity check, so readers see either the
//! previous results or the new ones, never a mix, and a rejected write
//! leaves the previous results untouched.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::StoreError;
use crate::models::{Conflict, SessionData, Timetable};

/// Result type for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read-only provider of session facts.
pub trait SnapshotSource: Send + Sync {
    /// Returns the facts of a session, or `None` if unknown.
    fn session_data(&self, session_id: &str) -> StoreResult<Option<SessionData>>;
}

/// Persistence of run outputs, keyed by session.
///
/// Guarantees:
/// - `replace_results` purges and writes a session's timetable and
///   conflicts in one atomic step; on error nothing changes.
/// - `replace_conflicts` swaps only the conflict rows of a session.
pub trait TimetableStore: Send + Sync {
    /// Replaces the timetable and conflicts of `timetable.session_id`.
    fn replace_results(&self, timetable: Timetable, conflicts: Vec<Conflict>) -> StoreResult<()>;

    /// Replaces the conflicts of a session that has a stored timetable.
    fn replace_conflicts(&self, session_id: &str, conflicts: Vec<Conflict>) -> StoreResult<()>;

    /// Returns the stored timetable of a session.
    fn timetable(&self, session_id: &str) -> StoreResult<Option<Timetable>>;

    /// Returns the stored conflicts of a session (empty if none).
    fn conflicts(&self, session_id: &str) -> StoreResult<Vec<Conflict>>;
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for Arc<T> {
    fn session_data(&self, session_id: &str) -> StoreResult<Option<SessionData>> {
        (**self).session_data(session_id)
    }
}

impl<T: TimetableStore + ?Sized> TimetableStore for Arc<T> {
    fn replace_results(&self, timetable: Timetable, conflicts: Vec<Conflict>) -> StoreResult<()> {
        (**self).replace_results(timetable, conflicts)
    }

    fn replace_conflicts(&self, session_id: &str, conflicts: Vec<Conflict>) -> StoreResult<()> {
        (**self).replace_conflicts(session_id, conflicts)
    }

    fn timetable(&self, session_id: &str) -> StoreResult<Option<Timetable>> {
        (**self).timetable(session_id)
    }

    fn conflicts(&self, session_id: &str) -> StoreResult<Vec<Conflict>> {
        (**self).conflicts(session_id)
    }
}

#[derive(Debug, Clone)]
struct StoredResults {
    timetable: Timetable,
    conflicts: Vec<Conflict>,
}

/// In-memory source and store backed by `RwLock<HashMap<session_id, _>>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, SessionData>>,
    results: RwLock<HashMap<String, StoredResults>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the facts of a session.
    pub fn insert_session(&self, data: SessionData) -> StoreResult<()> {
        let mut sessions = self.sessions.write().map_err(|_| StoreError::Poisoned)?;
        sessions.insert(data.session.id.clone(), data);
        Ok(())
    }

    /// Stores an externally produced timetable with no conflicts.
    pub fn import_timetable(&self, timetable: Timetable) -> StoreResult<()> {
        self.replace_results(timetable, Vec::new())
    }
}

impl SnapshotSource for MemoryStore {
    fn session_data(&self, session_id: &str) -> StoreResult<Option<SessionData>> {
        let sessions = self.sessions.read().map_err(|_| StoreError::Poisoned)?;
        Ok(sessions.get(session_id).cloned())
    }
}

impl TimetableStore for MemoryStore {
    fn replace_results(&self, timetable: Timetable, conflicts: Vec<Conflict>) -> StoreResult<()> {
        check_integrity(&timetable).map_err(|reason| StoreError::Rejected {
            session_id: timetable.session_id.clone(),
            reason,
        })?;

        let mut results = self.results.write().map_err(|_| StoreError::Poisoned)?;
        results.insert(
            timetable.session_id.clone(),
            StoredResults {
                timetable,
                conflicts,
            },
        );
        Ok(())
    }

    fn replace_conflicts(&self, session_id: &str, conflicts: Vec<Conflict>) -> StoreResult<()> {
        let mut results = self.results.write().map_err(|_| StoreError::Poisoned)?;
        let stored = results
            .get_mut(session_id)
            .ok_or_else(|| StoreError::Rejected {
                session_id: session_id.to_string(),
                reason: "no timetable stored".to_string(),
            })?;
        stored.conflicts = conflicts;
        Ok(())
    }

    fn timetable(&self, session_id: &str) -> StoreResult<Option<Timetable>> {
        let results = self.results.read().map_err(|_| StoreError::Poisoned)?;
        Ok(results.get(session_id).map(|r| r.timetable.clone()))
    }

    fn conflicts(&self, session_id: &str) -> StoreResult<Vec<Conflict>> {
        let results = self.results.read().map_err(|_| StoreError::Poisoned)?;
        Ok(results
            .get(session_id)
            .map(|r| r.conflicts.clone())
            .unwrap_or_default())
    }
}

/// Referential integrity of a timetable: unique ids, one exam per module,
/// and no assignment or invigilation pointing at a missing row.
fn check_integrity(timetable: &Timetable) -> Result<(), String> {
    let mut exam_ids = HashSet::new();
    let mut modules = HashSet::new();
    for exam in &timetable.exams {
        if !exam_ids.insert(exam.id.as_str()) {
            return Err(format!("duplicate exam {}", exam.id));
        }
        if !modules.insert(exam.module_code.as_str()) {
            return Err(format!("module {} has more than one exam", exam.module_code));
        }
    }

    let mut assignment_ids = HashSet::new();
    for a in &timetable.room_assignments {
        if !exam_ids.contains(a.exam_id.as_str()) {
            return Err(format!("assignment {} references unknown exam {}", a.id, a.exam_id));
        }
        if !assignment_ids.insert(a.id.as_str()) {
            return Err(format!("duplicate assignment {}", a.id));
        }
    }

    for inv in &timetable.invigilations {
        if !assignment_ids.contains(inv.assignment_id.as_str()) {
            return Err(format!(
                "invigilation of {} references unknown assignment {}",
                inv.professor_id, inv.assignment_id
            ));
        }
    }

    Ok(())
}
