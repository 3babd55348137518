//! Module conflict graph.
//!
//! Two modules are adjacent iff at least one student sits both. The edge
//! weight is the number of shared students. The graph is computed once
//! per run from enrollments, so candidate checks are map lookups instead
//! of scans over student × module pairs.
//!
//! With formation coupling enabled, modules of the same formation are
//! also adjacent, weighted by the formation's total headcount, since every
//! group of a formation sits every one of its modules.

use std::collections::{BTreeMap, HashMap};

use crate::loader::Snapshot;

/// Weighted adjacency between the modules of a snapshot.
///
/// Nodes are indices into `Snapshot::modules`.
#[derive(Debug, Clone, Default)]
pub struct ConflictGraph {
    adjacency: Vec<BTreeMap<usize, u32>>,
}

impl ConflictGraph {
    /// Builds the graph from a snapshot's enrollments.
    pub fn build(snapshot: &Snapshot, couple_formations: bool) -> Self {
        let n = snapshot.modules.len();
        let mut adjacency = vec![BTreeMap::new(); n];
        let index: HashMap<&str, usize> = snapshot
            .modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.code.as_str(), i))
            .collect();

        let mut by_student: HashMap<&str, Vec<usize>> = HashMap::new();
        for e in &snapshot.enrollments {
            if let Some(&m) = index.get(e.module_code.as_str()) {
                by_student.entry(e.student_id.as_str()).or_default().push(m);
            }
        }

        for modules in by_student.values_mut() {
            modules.sort_unstable();
            modules.dedup();
            for (i, &a) in modules.iter().enumerate() {
                for &b in &modules[i + 1..] {
                    *adjacency[a].entry(b).or_insert(0) += 1;
                    *adjacency[b].entry(a).or_insert(0) += 1;
                }
            }
        }

        if couple_formations {
            let mut by_formation: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
            for (i, m) in snapshot.modules.iter().enumerate() {
                by_formation.entry(m.formation_id.as_str()).or_default().push(i);
            }
            for (formation_id, modules) in by_formation {
                let headcount: u32 = snapshot
                    .groups_of(formation_id)
                    .iter()
                    .map(|g| g.headcount)
                    .sum::<u32>()
                    .max(1);
                for (i, &a) in modules.iter().enumerate() {
                    for &b in &modules[i + 1..] {
                        let w = adjacency[a].entry(b).or_insert(0);
                        *w = (*w).max(headcount);
                        let w = adjacency[b].entry(a).or_insert(0);
                        *w = (*w).max(headcount);
                    }
                }
            }
        }

        Self { adjacency }
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Whether the graph has no modules.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Neighbors of a module with shared-student counts, by index.
    pub fn neighbors(&self, module: usize) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.adjacency[module].iter().map(|(&m, &w)| (m, w))
    }

    /// Shared students between two modules (0 if not adjacent).
    pub fn shared(&self, a: usize, b: usize) -> u32 {
        self.adjacency[a].get(&b).copied().unwrap_or(0)
    }

    /// Number of adjacent modules.
    pub fn degree(&self, module: usize) -> usize {
        self.adjacency[module].len()
    }

    /// Sum of shared students over all neighbors.
    pub fn total_shared(&self, module: usize) -> u64 {
        self.adjacency[module].values().map(|&w| u64::from(w)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Enrollment, Formation, Group, Module, Room, Session, SessionData, TimeSlot,
    };
    use chrono::{NaiveDate, NaiveTime};

    fn snapshot() -> Snapshot {
        let d = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let data = SessionData::new(Session::new("S", "S1", d, d))
            .with_formation(Formation::new("F1", 1, "CS"))
            .with_formation(Formation::new("F2", 1, "MA"))
            .with_group(Group::new("G1", "F1", 10))
            .with_group(Group::new("G2", "F1", 15))
            .with_group(Group::new("H1", "F2", 5))
            .with_module(Module::new("A", "F1", "S1"))
            .with_module(Module::new("B", "F1", "S1"))
            .with_module(Module::new("C", "F2", "S1"))
            .with_room(Room::new("R1", 30))
            .with_slot(TimeSlot::new("T1", 1, t(8), t(10)))
            .with_enrollment(Enrollment::new("s1", "A", "G1"))
            .with_enrollment(Enrollment::new("s1", "C", "G1"))
            .with_enrollment(Enrollment::new("s2", "A", "G1"))
            .with_enrollment(Enrollment::new("s2", "C", "G1"))
            .with_enrollment(Enrollment::new("s3", "B", "G2"));
        Snapshot::from_data(data).unwrap()
    }

    #[test]
    fn test_enrollment_edges() {
        let g = ConflictGraph::build(&snapshot(), false);
        assert_eq!(g.len(), 3);
        // A=0, B=1, C=2
        assert_eq!(g.shared(0, 2), 2);
        assert_eq!(g.shared(2, 0), 2);
        assert_eq!(g.shared(0, 1), 0);
        assert_eq!(g.degree(1), 0);
    }

    #[test]
    fn test_formation_coupling() {
        let g = ConflictGraph::build(&snapshot(), true);
        // A and B share formation F1 (10 + 15 students)
        assert_eq!(g.shared(0, 1), 25);
        assert_eq!(g.shared(0, 2), 2);
        assert_eq!(g.degree(0), 2);
        assert_eq!(g.total_shared(0), 27);
        let neighbors: Vec<_> = g.neighbors(0).collect();
        assert_eq!(neighbors, vec![(1, 25), (2, 2)]);
    }
}
