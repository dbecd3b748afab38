use chrono::{DateTime, Utc};
use serde::Serialize;

use registrar_core::{DomainError, DomainResult, MajorApplicationId, UserId};

/// Baseline major for a student with no approved application.
pub const UNDECLARED: &str = "Undeclared";

registrar_core::labelled_enum! {
    pub enum ApplicationStatus {
        Submitted => "submitted",
        PendingApproval => "pending_approval",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl ApplicationStatus {
    pub const PENDING: &'static [ApplicationStatus] =
        &[ApplicationStatus::Submitted, ApplicationStatus::PendingApproval];

    pub const SETTABLE: &'static [ApplicationStatus] = &[
        ApplicationStatus::PendingApproval,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn is_pending(&self) -> bool {
        Self::PENDING.contains(self)
    }
}

/// A student's application to declare (or change) a major.
///
/// Only the creation time is tracked; status changes do not stamp a
/// modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorApplication {
    pub id: MajorApplicationId,
    pub student_id: UserId,
    pub current_major: Option<String>,
    pub requested_major: String,
    pub school: String,
    pub statement: Option<String>,
    pub status: ApplicationStatus,
    pub admin_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmitMajorApplication {
    pub current_major: Option<String>,
    pub requested_major: Option<String>,
    pub school: Option<String>,
    pub statement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MajorApplicationDraft {
    pub student_id: UserId,
    pub current_major: Option<String>,
    pub requested_major: String,
    pub school: String,
    pub statement: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SubmitMajorApplication {
    pub fn validate(self, student: UserId, now: DateTime<Utc>) -> DomainResult<MajorApplicationDraft> {
        let (Some(requested_major), Some(school)) =
            (non_blank(self.requested_major), non_blank(self.school))
        else {
            return Err(DomainError::validation("requestedMajor and school are required"));
        };

        Ok(MajorApplicationDraft {
            student_id: student,
            current_major: non_blank(self.current_major),
            requested_major,
            school,
            statement: self.statement,
            created_at: now,
        })
    }
}

impl MajorApplicationDraft {
    /// Reject a request identical to the latest approved declaration, then
    /// derive the current major from it.
    ///
    /// The recorded current major is the approved one, or [`UNDECLARED`]
    /// without an approved history. The client value is never kept.
    pub fn against_latest_approved(mut self, latest: Option<&MajorApplication>) -> DomainResult<Self> {
        match latest {
            Some(approved) => {
                if approved.school == self.school && approved.requested_major == self.requested_major {
                    return Err(DomainError::conflict(format!(
                        "You have already declared {} in {}",
                        approved.requested_major, approved.school
                    )));
                }
                self.current_major = Some(approved.requested_major.clone());
            }
            None => self.current_major = Some(UNDECLARED.to_string()),
        }
        Ok(self)
    }

    pub fn into_application(self, id: MajorApplicationId) -> MajorApplication {
        MajorApplication {
            id,
            student_id: self.student_id,
            current_major: self.current_major,
            requested_major: self.requested_major,
            school: self.school,
            statement: self.statement,
            status: ApplicationStatus::Submitted,
            admin_comment: None,
            created_at: self.created_at,
        }
    }
}

pub fn ensure_no_pending(existing: Option<&MajorApplication>) -> DomainResult<()> {
    match existing {
        Some(_) => Err(DomainError::conflict(
            "You already have a pending major application. Please wait until it is approved or rejected before submitting a new one.",
        )),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationStatusChange {
    pub status: ApplicationStatus,
    pub admin_comment: Option<String>,
}

impl ApplicationStatusChange {
    pub fn parse(status: Option<&str>, admin_comment: Option<String>) -> DomainResult<Self> {
        let status = status
            .and_then(ApplicationStatus::parse)
            .filter(|s| ApplicationStatus::SETTABLE.contains(s))
            .ok_or_else(|| DomainError::validation("Invalid status"))?;
        Ok(Self {
            status,
            admin_comment,
        })
    }
}

impl MajorApplication {
    pub fn apply_status_change(&mut self, change: ApplicationStatusChange) {
        self.status = change.status;
        if let Some(comment) = change.admin_comment {
            self.admin_comment = Some(comment);
        }
    }
}
