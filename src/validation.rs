//! Input validation for examination sessions.
//!
//! Checks structural integrity of a session's facts before scheduling.
//! Detects:
//! - Duplicate IDs (formations, groups, modules, rooms, slots, professors)
//! - Dangling references (module/group → formation, enrollment → module/group)
//! - Formations with examined modules but no groups
//! - Time slots that end before they start
//!
//! All problems are collected, not just the first one.

use crate::models::SessionData;
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A module or group references a formation that doesn't exist.
    UnknownFormation,
    /// An enrollment references a module that doesn't exist.
    UnknownModule,
    /// An enrollment references a group that doesn't exist.
    UnknownGroup,
    /// A formation with examined modules has no groups.
    EmptyFormation,
    /// A time slot ends at or before its start.
    InvalidSlot,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the facts of a session.
///
/// Checks:
/// 1. No duplicate IDs within each entity kind
/// 2. Every module and group references an existing formation
/// 3. Every enrollment references an existing module and group
/// 4. Every formation with an examined module has at least one group
/// 5. Every slot ends after it starts
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_session(data: &SessionData) -> ValidationResult {
    let mut errors = Vec::new();

    let formation_ids = collect_ids(
        "formation",
        data.formations.iter().map(|f| f.id.as_str()),
        &mut errors,
    );
    let group_ids = collect_ids("group", data.groups.iter().map(|g| g.id.as_str()), &mut errors);
    let module_codes = collect_ids(
        "module",
        data.modules.iter().map(|m| m.code.as_str()),
        &mut errors,
    );
    collect_ids("room", data.rooms.iter().map(|r| r.id.as_str()), &mut errors);
    collect_ids("slot", data.slots.iter().map(|s| s.id.as_str()), &mut errors);
    collect_ids(
        "professor",
        data.professors.iter().map(|p| p.id.as_str()),
        &mut errors,
    );

    for module in &data.modules {
        if !formation_ids.contains(module.formation_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownFormation,
                format!(
                    "Module '{}' references unknown formation '{}'",
                    module.code, module.formation_id
                ),
            ));
        }
    }

    for group in &data.groups {
        if !formation_ids.contains(group.formation_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownFormation,
                format!(
                    "Group '{}' references unknown formation '{}'",
                    group.id, group.formation_id
                ),
            ));
        }
    }

    for enrollment in &data.enrollments {
        if !module_codes.contains(enrollment.module_code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownModule,
                format!(
                    "Student '{}' is enrolled in unknown module '{}'",
                    enrollment.student_id, enrollment.module_code
                ),
            ));
        }
        if !group_ids.contains(enrollment.group_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownGroup,
                format!(
                    "Student '{}' is enrolled through unknown group '{}'",
                    enrollment.student_id, enrollment.group_id
                ),
            ));
        }
    }

    let formations_with_groups: HashSet<&str> =
        data.groups.iter().map(|g| g.formation_id.as_str()).collect();
    let mut reported = HashSet::new();
    for module in data.modules.iter().filter(|m| m.requires_exam) {
        let fid = module.formation_id.as_str();
        if formation_ids.contains(fid) && !formations_with_groups.contains(fid) && reported.insert(fid)
        {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyFormation,
                format!("Formation '{fid}' has examined modules but no groups"),
            ));
        }
    }

    for slot in &data.slots {
        if slot.end <= slot.start {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSlot,
                format!("Slot '{}' ends at or before its start", slot.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_ids<'a>(
    entity: &str,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {entity} ID: {id}"),
            ));
        }
    }
    seen
}
