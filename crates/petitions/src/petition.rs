use chrono::{DateTime, Utc};
use serde::Serialize;

use registrar_core::{DomainError, DomainResult, PetitionId, UserId};

registrar_core::labelled_enum! {
    /// Petition lifecycle: `submitted → {pending_approval, approved, rejected}`.
    pub enum PetitionStatus {
        Submitted => "submitted",
        PendingApproval => "pending_approval",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl PetitionStatus {
    /// Statuses that block the instructor from filing another petition.
    pub const PENDING: &'static [PetitionStatus] =
        &[PetitionStatus::Submitted, PetitionStatus::PendingApproval];

    /// Statuses an admin may assign.
    pub const SETTABLE: &'static [PetitionStatus] = &[
        PetitionStatus::PendingApproval,
        PetitionStatus::Approved,
        PetitionStatus::Rejected,
    ];

    pub fn is_pending(&self) -> bool {
        Self::PENDING.contains(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeChangePetition {
    pub id: PetitionId,
    pub instructor_id: UserId,
    /// Student number of the affected student. Free text, not a user reference.
    pub student_id: String,
    pub course_code: String,
    pub current_grade: String,
    pub new_grade: String,
    pub justification: String,
    pub status: PetitionStatus,
    pub admin_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmitPetition {
    pub student_id: Option<String>,
    pub course_code: Option<String>,
    pub current_grade: Option<String>,
    pub new_grade: Option<String>,
    pub justification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetitionDraft {
    pub instructor_id: UserId,
    pub student_id: String,
    pub course_code: String,
    pub current_grade: String,
    pub new_grade: String,
    pub justification: String,
    pub created_at: DateTime<Utc>,
}

fn required(value: Option<String>, field: &str) -> DomainResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DomainError::validation(format!("{field} is required"))),
    }
}

impl SubmitPetition {
    /// Fields are checked in wire order; the first missing one is reported.
    pub fn validate(self, instructor: UserId, now: DateTime<Utc>) -> DomainResult<PetitionDraft> {
        Ok(PetitionDraft {
            instructor_id: instructor,
            student_id: required(self.student_id, "studentId")?,
            course_code: required(self.course_code, "courseCode")?,
            current_grade: required(self.current_grade, "currentGrade")?,
            new_grade: required(self.new_grade, "newGrade")?,
            justification: required(self.justification, "justification")?,
            created_at: now,
        })
    }
}

impl PetitionDraft {
    pub fn into_petition(self, id: PetitionId) -> GradeChangePetition {
        GradeChangePetition {
            id,
            instructor_id: self.instructor_id,
            student_id: self.student_id,
            course_code: self.course_code,
            current_grade: self.current_grade,
            new_grade: self.new_grade,
            justification: self.justification,
            status: PetitionStatus::Submitted,
            admin_comment: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// One pending petition per instructor, whatever the course.
pub fn ensure_no_pending(existing: Option<&GradeChangePetition>) -> DomainResult<()> {
    if existing.is_some() {
        return Err(DomainError::conflict(
            "You already have a pending grade change petition. Please wait until it is approved or rejected before submitting a new one.",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetitionStatusChange {
    pub status: PetitionStatus,
    pub admin_comment: Option<String>,
}

impl PetitionStatusChange {
    pub fn parse(status: Option<&str>, admin_comment: Option<String>) -> DomainResult<Self> {
        let status = status
            .and_then(PetitionStatus::parse)
            .filter(|s| PetitionStatus::SETTABLE.contains(s))
            .ok_or_else(|| DomainError::validation("Invalid status"))?;
        Ok(Self {
            status,
            admin_comment,
        })
    }
}

impl GradeChangePetition {
    pub fn apply_status_change(&mut self, change: PetitionStatusChange, now: DateTime<Utc>) {
        self.status = change.status;
        if let Some(comment) = change.admin_comment {
            self.admin_comment = Some(comment);
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn full() -> SubmitPetition {
        SubmitPetition {
            student_id: Some("2024-10-0001".to_string()),
            course_code: Some("CS101".to_string()),
            current_grade: Some("B".to_string()),
            new_grade: Some("A-".to_string()),
            justification: Some("Grading error on final exam".to_string()),
        }
    }

    #[test]
    fn valid_submission_starts_submitted() {
        let instructor = UserId::new();
        let petition = full()
            .validate(instructor, Utc::now())
            .unwrap()
            .into_petition(PetitionId::new(9));
        assert_eq!(petition.status, PetitionStatus::Submitted);
        assert_eq!(petition.instructor_id, instructor);
        assert_eq!(petition.created_at, petition.updated_at);

        let json = serde_json::to_value(&petition).unwrap();
        assert_eq!(json["courseCode"], "CS101");
        assert_eq!(json["newGrade"], "A-");
        assert_eq!(json["status"], "submitted");
    }

    #[test]
    fn first_missing_field_is_reported() {
        let mut s = full();
        s.course_code = None;
        s.justification = Some("   ".to_string());
        assert_eq!(
            s.validate(UserId::new(), Utc::now()).unwrap_err(),
            DomainError::validation("courseCode is required")
        );

        let mut s = full();
        s.justification = Some(String::new());
        assert_eq!(
            s.validate(UserId::new(), Utc::now()).unwrap_err(),
            DomainError::validation("justification is required")
        );
    }

    #[test]
    fn submitted_is_not_admin_settable() {
        assert_eq!(
            PetitionStatusChange::parse(Some("submitted"), None).unwrap_err(),
            DomainError::validation("Invalid status")
        );
        for status in PetitionStatus::SETTABLE {
            assert!(PetitionStatusChange::parse(Some(status.as_str()), None).is_ok());
        }
    }

    #[test]
    fn status_change_merges_comment_and_stamps_time() {
        let mut petition = full()
            .validate(UserId::new(), Utc::now())
            .unwrap()
            .into_petition(PetitionId::new(1));
        let later = petition.created_at + chrono::Duration::minutes(3);

        petition.apply_status_change(
            PetitionStatusChange::parse(Some("rejected"), Some("Insufficient evidence".to_string())).unwrap(),
            later,
        );
        assert_eq!(petition.status, PetitionStatus::Rejected);
        assert_eq!(petition.admin_comment.as_deref(), Some("Insufficient evidence"));
        assert_eq!(petition.updated_at, later);

        petition.apply_status_change(PetitionStatusChange::parse(Some("approved"), None).unwrap(), later);
        assert_eq!(petition.admin_comment.as_deref(), Some("Insufficient evidence"));
    }

    #[test]
    fn pending_petition_blocks_any_course() {
        let existing = full()
            .validate(UserId::new(), Utc::now())
            .unwrap()
            .into_petition(PetitionId::new(1));
        assert!(matches!(ensure_no_pending(Some(&existing)), Err(DomainError::Conflict(_))));
        assert!(ensure_no_pending(None).is_ok());
    }

    proptest! {
        #[test]
        fn any_single_blank_field_is_rejected(idx in 0usize..5, blank in "[ \t]{0,3}") {
            let mut s = full();
            let slot = match idx {
                0 => &mut s.student_id,
                1 => &mut s.course_code,
                2 => &mut s.current_grade,
                3 => &mut s.new_grade,
                _ => &mut s.justification,
            };
            *slot = Some(blank);
            let err = s.validate(UserId::new(), Utc::now()).unwrap_err();
            prop_assert!(matches!(err, DomainError::Validation(msg) if msg.ends_with("is required")));
        }
    }
}
