//! Placement ordering rules and rule engine.
//!
//! The slot allocator places modules one by one; the order decides which
//! modules get first pick of the calendar. Modules that are hardest to
//! place late (many groups, many neighbors in the conflict graph) go
//! first.
//!
//! # Usage
//!
//! ```
//! use u_timetable::dispatching::{RuleEngine, TieBreaker};
//! use u_timetable::dispatching::rules;
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::ConflictDegree)
//!     .with_tie_breaker(rules::GroupCount)
//!     .with_final_tie_breaker(TieBreaker::ByCode);
//! ```
//!
//! # References
//!
//! - Brélaz (1979), "New methods to color the vertices of a graph"
//! - Carter, Laporte & Lee (1996), "Examination timetabling: algorithmic
//!   strategies and applications"

mod engine;
pub mod rules;

pub use engine::{EvaluationMode, RuleEngine, TieBreaker};

use crate::loader::Snapshot;
use crate::scheduler::ConflictGraph;
use std::fmt::Debug;

/// Score returned by an ordering rule.
///
/// Lower scores = placed earlier.
pub type RuleScore = f64;

/// Placement difficulty indicators of one module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDemand {
    /// Index in `Snapshot::modules`.
    pub index: usize,
    /// Module code.
    pub code: String,
    /// Groups sitting the exam (rooms needed in one slot).
    pub group_count: usize,
    /// Students sitting the exam.
    pub headcount: u32,
    /// Credit weight.
    pub credits: u32,
    /// Adjacent modules in the conflict graph.
    pub conflict_degree: usize,
    /// Students shared with adjacent modules (summed over edges).
    pub shared_students: u64,
}

impl ModuleDemand {
    /// Computes the demand of every module in snapshot order.
    pub fn from_snapshot(snapshot: &Snapshot, graph: &ConflictGraph) -> Vec<Self> {
        snapshot
            .modules
            .iter()
            .enumerate()
            .map(|(index, module)| {
                let groups = snapshot.groups_of(&module.formation_id);
                Self {
                    index,
                    code: module.code.clone(),
                    group_count: groups.len(),
                    headcount: groups.iter().map(|g| g.headcount).sum(),
                    credits: module.credits,
                    conflict_degree: graph.degree(index),
                    shared_students: graph.total_shared(index),
                }
            })
            .collect()
    }
}

/// A rule that evaluates how early a module should be placed.
///
/// # Score Convention
/// **Lower score = placed earlier.**
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "DEG").
    fn name(&self) -> &'static str;

    /// Evaluates a module's placement priority.
    fn evaluate(&self, demand: &ModuleDemand) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
