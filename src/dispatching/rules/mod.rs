//! Built-in ordering rules.
//!
//! # Categories
//!
//! - **Graph**: DEG (conflict degree), SHARED (shared students)
//! - **Size**: GROUPS (rooms needed at once), HEAD (students sitting)
//! - **Weight**: CREDITS
//!
//! # Score Convention
//! All rules return lower scores for modules to place earlier.

use super::{DispatchingRule, ModuleDemand, RuleScore};

// ======================== Graph rules ========================

/// Largest conflict degree first.
///
/// The classic largest-degree-first graph colouring heuristic: modules
/// adjacent to many others have the fewest free positions left when
/// placed late.
#[derive(Debug, Clone, Copy)]
pub struct ConflictDegree;

impl DispatchingRule for ConflictDegree {
    fn name(&self) -> &'static str {
        "DEG"
    }

    fn evaluate(&self, demand: &ModuleDemand) -> RuleScore {
        -(demand.conflict_degree as f64)
    }

    fn description(&self) -> &'static str {
        "Largest Conflict Degree"
    }
}

/// Most shared students first.
///
/// Weighted variant of [`ConflictDegree`]: an edge shared by 200
/// students counts more than one shared by 2.
#[derive(Debug, Clone, Copy)]
pub struct SharedStudents;

impl DispatchingRule for SharedStudents {
    fn name(&self) -> &'static str {
        "SHARED"
    }

    fn evaluate(&self, demand: &ModuleDemand) -> RuleScore {
        -(demand.shared_students as f64)
    }

    fn description(&self) -> &'static str {
        "Most Shared Students"
    }
}

// ======================== Size rules ========================

/// Most groups first.
///
/// A module with many groups needs that many free rooms in one slot.
#[derive(Debug, Clone, Copy)]
pub struct GroupCount;

impl DispatchingRule for GroupCount {
    fn name(&self) -> &'static str {
        "GROUPS"
    }

    fn evaluate(&self, demand: &ModuleDemand) -> RuleScore {
        -(demand.group_count as f64)
    }

    fn description(&self) -> &'static str {
        "Most Groups"
    }
}

/// Largest headcount first.
#[derive(Debug, Clone, Copy)]
pub struct Headcount;

impl DispatchingRule for Headcount {
    fn name(&self) -> &'static str {
        "HEAD"
    }

    fn evaluate(&self, demand: &ModuleDemand) -> RuleScore {
        -f64::from(demand.headcount)
    }

    fn description(&self) -> &'static str {
        "Largest Headcount"
    }
}

// ======================== Weight rules ========================

/// Highest credit weight first.
///
/// Gives heavy modules the earliest, least contested positions.
#[derive(Debug, Clone, Copy)]
pub struct Credits;

impl DispatchingRule for Credits {
    fn name(&self) -> &'static str {
        "CREDITS"
    }

    fn evaluate(&self, demand: &ModuleDemand) -> RuleScore {
        -f64::from(demand.credits)
    }

    fn description(&self) -> &'static str {
        "Highest Credits"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demand() -> ModuleDemand {
        ModuleDemand {
            index: 0,
            code: "M1".into(),
            group_count: 3,
            headcount: 90,
            credits: 6,
            conflict_degree: 4,
            shared_students: 120,
        }
    }

    #[test]
    fn test_scores_are_negated_magnitudes() {
        let d = demand();
        assert_eq!(ConflictDegree.evaluate(&d), -4.0);
        assert_eq!(SharedStudents.evaluate(&d), -120.0);
        assert_eq!(GroupCount.evaluate(&d), -3.0);
        assert_eq!(Headcount.evaluate(&d), -90.0);
        assert_eq!(Credits.evaluate(&d), -6.0);
    }

    #[test]
    fn test_names() {
        assert_eq!(ConflictDegree.name(), "DEG");
        assert_eq!(GroupCount.description(), "Most Groups");
    }
}
