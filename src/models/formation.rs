//! Formation, group, and module models.
//!
//! A formation is an academic program at one level (e.g., "L2 Computer
//! Science"). It owns one or more student groups and the modules those
//! groups are examined on. All groups of a formation sit a module's exam
//! at the same date and slot, each in its own room.

use serde::{Deserialize, Serialize};

/// An academic program at a given level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formation {
    /// Unique formation identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Study level (1 = first year, ...).
    pub level: u8,
    /// Owning department; its professors are preferred as invigilators.
    pub department_id: String,
}

/// A cohort of students within a formation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique group identifier.
    pub id: String,
    /// Owning formation.
    pub formation_id: String,
    /// Human-readable name.
    pub name: String,
    /// Expected number of students sitting an exam.
    ///
    /// Zero means "derive from enrollments" (done by the loader).
    #[serde(default)]
    pub headcount: u32,
}

/// A course requiring a single scheduled exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Unique module code.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Owning formation.
    pub formation_id: String,
    /// Semester tag.
    pub semester: String,
    /// Credit weight.
    pub credits: u32,
    /// Whether the module is examined in its semester.
    #[serde(default = "default_requires_exam")]
    pub requires_exam: bool,
}

fn default_requires_exam() -> bool {
    true
}

/// Links a student to a module, through the group the student belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Student identifier.
    pub student_id: String,
    /// Module code.
    pub module_code: String,
    /// Group the student sits the exam with.
    pub group_id: String,
}

impl Formation {
    /// Creates a new formation.
    pub fn new(id: impl Into<String>, level: u8, department_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            level,
            department_id: department_id.into(),
        }
    }

    /// Sets the formation name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Group {
    /// Creates a new group with the given expected headcount.
    pub fn new(id: impl Into<String>, formation_id: impl Into<String>, headcount: u32) -> Self {
        Self {
            id: id.into(),
            formation_id: formation_id.into(),
            name: String::new(),
            headcount,
        }
    }

    /// Sets the group name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Module {
    /// Creates a new examined module.
    pub fn new(
        code: impl Into<String>,
        formation_id: impl Into<String>,
        semester: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            formation_id: formation_id.into(),
            semester: semester.into(),
            credits: 0,
            requires_exam: true,
        }
    }

    /// Sets the module name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the credit weight.
    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = credits;
        self
    }

    /// Marks the module as not examined.
    pub fn without_exam(mut self) -> Self {
        self.requires_exam = false;
        self
    }
}

impl Enrollment {
    /// Creates a new enrollment.
    pub fn new(
        student_id: impl Into<String>,
        module_code: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            module_code: module_code.into(),
            group_id: group_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_builder() {
        let m = Module::new("INF201", "L2-INF", "S1")
            .with_name("Algorithms")
            .with_credits(6);
        assert_eq!(m.code, "INF201");
        assert_eq!(m.formation_id, "L2-INF");
        assert_eq!(m.credits, 6);
        assert!(m.requires_exam);
        assert!(!m.clone().without_exam().requires_exam);
    }

    #[test]
    fn test_module_requires_exam_default() {
        let json = r#"{"code":"M1","name":"","formation_id":"F","semester":"S1","credits":3}"#;
        let m: Module = serde_json::from_str(json).unwrap();
        assert!(m.requires_exam);
    }

    #[test]
    fn test_group_headcount_default() {
        let json = r#"{"id":"G1","formation_id":"F","name":"G1"}"#;
        let g: Group = serde_json::from_str(json).unwrap();
        assert_eq!(g.headcount, 0);
    }
}
