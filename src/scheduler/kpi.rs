//! Timetable quality metrics (KPIs).
//!
//! Computes the indicators operators read to judge a run's output
//! without opening the timetable itself.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Success Rate | Modules with an exam / modules requiring one |
//! | Exam Days Used | Distinct dates carrying at least one exam |
//! | Exams per Day | Exams / exam days used |
//! | Room Fill | Mean of headcount / capacity over room assignments |
//! | Invigilation Load | Min, max and mean invigilations per professor |
//! | Unstaffed Rooms | Room assignments without a primary invigilator |
//!
//! # Reference
//! Qu et al. (2009), "A survey of search methodologies and automated
//! system development for examination timetabling", §2.3

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::loader::Snapshot;
use crate::models::{InvigilatorRole, Timetable};

/// Timetable performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimetableKpi {
    /// Modules requiring an exam.
    pub total_modules: usize,
    /// Modules with an exam.
    pub scheduled_modules: usize,
    /// scheduled / total (1.0 when nothing requires an exam).
    pub success_rate: f64,
    /// Distinct dates with at least one exam.
    pub exam_days_used: usize,
    /// Mean exams per used date.
    pub avg_exams_per_day: f64,
    /// Mean room fill ratio (may exceed 1.0 on capacity overruns).
    pub avg_room_fill: f64,
    /// Fewest invigilations of any professor.
    pub min_invigilation_load: u32,
    /// Most invigilations of any professor.
    pub max_invigilation_load: u32,
    /// Mean invigilations per professor.
    pub avg_invigilation_load: f64,
    /// Room assignments without a primary invigilator.
    pub unstaffed_assignments: usize,
}

impl TimetableKpi {
    /// Computes KPIs from a timetable and the snapshot it was built from.
    pub fn calculate(snapshot: &Snapshot, timetable: &Timetable) -> Self {
        let total_modules = snapshot.modules.len();
        let required: HashSet<&str> = snapshot.modules.iter().map(|m| m.code.as_str()).collect();
        let scheduled_modules = timetable
            .exams
            .iter()
            .filter(|e| required.contains(e.module_code.as_str()))
            .map(|e| e.module_code.as_str())
            .collect::<HashSet<_>>()
            .len();
        let success_rate = if total_modules == 0 {
            1.0
        } else {
            scheduled_modules as f64 / total_modules as f64
        };

        let exam_days_used = timetable.dates().len();
        let avg_exams_per_day = if exam_days_used == 0 {
            0.0
        } else {
            timetable.exam_count() as f64 / exam_days_used as f64
        };

        // Room fill
        let fills: Vec<f64> = timetable
            .room_assignments
            .iter()
            .filter_map(|a| {
                snapshot
                    .room(&a.room_id)
                    .filter(|r| r.capacity > 0)
                    .map(|r| f64::from(a.headcount) / f64::from(r.capacity))
            })
            .collect();
        let avg_room_fill = if fills.is_empty() {
            0.0
        } else {
            fills.iter().sum::<f64>() / fills.len() as f64
        };

        // Invigilation load, counting professors without duties as zero
        let mut loads: HashMap<&str, u32> = snapshot
            .professors
            .iter()
            .map(|p| (p.id.as_str(), 0))
            .collect();
        for inv in &timetable.invigilations {
            *loads.entry(inv.professor_id.as_str()).or_insert(0) += 1;
        }
        let min_invigilation_load = loads.values().copied().min().unwrap_or(0);
        let max_invigilation_load = loads.values().copied().max().unwrap_or(0);
        let avg_invigilation_load = if loads.is_empty() {
            0.0
        } else {
            loads.values().map(|&l| f64::from(l)).sum::<f64>() / loads.len() as f64
        };

        let staffed: HashSet<&str> = timetable
            .invigilations
            .iter()
            .filter(|i| i.role == InvigilatorRole::Primary)
            .map(|i| i.assignment_id.as_str())
            .collect();
        let unstaffed_assignments = timetable
            .room_assignments
            .iter()
            .filter(|a| !staffed.contains(a.id.as_str()))
            .count();

        Self {
            total_modules,
            scheduled_modules,
            success_rate,
            exam_days_used,
            avg_exams_per_day,
            avg_room_fill,
            min_invigilation_load,
            max_invigilation_load,
            avg_invigilation_load,
            unstaffed_assignments,
        }
    }

    /// Whether the timetable meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_success_rate: f64, max_invigilation_load: u32) -> bool {
        self.success_rate >= min_success_rate
            && self.max_invigilation_load <= max_invigilation_load
            && self.unstaffed_assignments == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Exam, ExamRoomAssignment, Formation, Group, Invigilation, Module, Professor, Room, Session,
        SessionData, TimeSlot,
    };
    use chrono::{NaiveDate, NaiveTime};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn snapshot() -> Snapshot {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let data = SessionData::new(Session::new("S", "S1", day(5), day(9)))
            .with_formation(Formation::new("F1", 1, "CS"))
            .with_group(Group::new("G1", "F1", 20))
            .with_group(Group::new("G2", "F1", 30))
            .with_module(Module::new("M1", "F1", "S1"))
            .with_module(Module::new("M2", "F1", "S1"))
            .with_module(Module::new("M3", "F1", "S1"))
            .with_module(Module::new("M4", "F1", "S1"))
            .with_room(Room::new("R1", 40))
            .with_room(Room::new("R2", 30))
            .with_slot(TimeSlot::new("T1", 1, t(8), t(10)))
            .with_professor(Professor::new("P1", "CS"))
            .with_professor(Professor::new("P2", "CS"))
            .with_professor(Professor::new("P3", "CS"));
        Snapshot::from_data(data).unwrap()
    }

    fn timetable() -> Timetable {
        let mut t = Timetable::new("S");
        let e1 = Exam::new("S", "M1", "F1", day(5), "T1");
        let e2 = Exam::new("S", "M2", "F1", day(6), "T1");
        let e3 = Exam::new("S", "M3", "F1", day(6), "T1");
        let a1 = ExamRoomAssignment::new(&e1.id, "G1", "R1", 20);
        let a2 = ExamRoomAssignment::new(&e1.id, "G2", "R2", 30);
        let a3 = ExamRoomAssignment::new(&e2.id, "G1", "R1", 20);
        t.add_invigilation(Invigilation::primary(&a1.id, "P1"));
        t.add_invigilation(Invigilation::primary(&a2.id, "P2"));
        t.add_invigilation(Invigilation::primary(&a3.id, "P1"));
        for e in [e1, e2, e3] {
            t.add_exam(e);
        }
        for a in [a1, a2, a3] {
            t.add_room_assignment(a);
        }
        t
    }

    #[test]
    fn test_kpi_basic() {
        let kpi = TimetableKpi::calculate(&snapshot(), &timetable());
        assert_eq!(kpi.total_modules, 4);
        assert_eq!(kpi.scheduled_modules, 3);
        assert!((kpi.success_rate - 0.75).abs() < 1e-10);
        assert_eq!(kpi.exam_days_used, 2);
        assert!((kpi.avg_exams_per_day - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_room_fill() {
        let kpi = TimetableKpi::calculate(&snapshot(), &timetable());
        // (20/40 + 30/30 + 20/40) / 3
        assert!((kpi.avg_room_fill - 2.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_invigilation_load() {
        let kpi = TimetableKpi::calculate(&snapshot(), &timetable());
        // P1 = 2, P2 = 1, P3 = 0
        assert_eq!(kpi.min_invigilation_load, 0);
        assert_eq!(kpi.max_invigilation_load, 2);
        assert!((kpi.avg_invigilation_load - 1.0).abs() < 1e-10);
        assert_eq!(kpi.unstaffed_assignments, 0);
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = TimetableKpi::calculate(&snapshot(), &Timetable::new("S"));
        assert_eq!(kpi.scheduled_modules, 0);
        assert!((kpi.success_rate - 0.0).abs() < 1e-10);
        assert!((kpi.avg_exams_per_day - 0.0).abs() < 1e-10);
        assert!((kpi.avg_room_fill - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_meets_thresholds() {
        let mut t = timetable();
        let kpi = TimetableKpi::calculate(&snapshot(), &t);
        assert!(kpi.meets_thresholds(0.75, 2));
        assert!(!kpi.meets_thresholds(0.8, 2));
        assert!(!kpi.meets_thresholds(0.5, 1));

        t.invigilations.pop();
        let kpi = TimetableKpi::calculate(&snapshot(), &t);
        assert_eq!(kpi.unstaffed_assignments, 1);
        assert!(!kpi.meets_thresholds(0.0, 10));
    }
}
