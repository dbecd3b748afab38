//! Document request lifecycle.
//!
//! `payment_pending → pending_approval → {approved → completed, rejected}`.
//! Admins may set any member of [`DocumentStatus`] directly; only membership in
//! the enumeration is enforced, not a transition graph.

use chrono::{DateTime, Utc};
use serde::Serialize;

use registrar_core::{DocumentRequestId, DomainError, DomainResult, UserId};

registrar_core::labelled_enum! {
    /// Kind of official document being requested.
    pub enum DocumentType {
        Transcript => "transcript",
        Degree => "degree",
        Letter => "letter",
        DuplicateDegree => "duplicate_degree",
    }
}

registrar_core::labelled_enum! {
    pub enum Urgency {
        Normal => "normal",
        Urgent => "urgent",
    }
}

registrar_core::labelled_enum! {
    pub enum DocumentStatus {
        /// Never assigned on create; reachable only through an admin override.
        Submitted => "submitted",
        PaymentPending => "payment_pending",
        PendingApproval => "pending_approval",
        Approved => "approved",
        Completed => "completed",
        Rejected => "rejected",
    }
}

impl DocumentStatus {
    /// Statuses that block the owner from submitting another request.
    pub const PENDING: &'static [DocumentStatus] = &[
        DocumentStatus::Submitted,
        DocumentStatus::PaymentPending,
        DocumentStatus::PendingApproval,
    ];

    pub fn is_pending(&self) -> bool {
        Self::PENDING.contains(self)
    }
}

/// A document request as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub id: DocumentRequestId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub urgency: Urgency,
    pub status: DocumentStatus,
    pub copies: i32,
    /// Fee in currency minor units, if quoted.
    pub amount: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub admin_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A submission exactly as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct SubmitDocumentRequest {
    pub doc_type: Option<String>,
    pub urgency: Option<String>,
    pub copies: Option<i64>,
    pub amount: Option<i64>,
    pub details: Option<serde_json::Value>,
}

/// A validated submission, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequestDraft {
    pub user_id: UserId,
    pub doc_type: DocumentType,
    pub urgency: Urgency,
    pub status: DocumentStatus,
    pub copies: i32,
    pub amount: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl SubmitDocumentRequest {
    /// Validate field by field. The initial status is always `payment_pending`.
    pub fn validate(self, owner: UserId, now: DateTime<Utc>) -> DomainResult<DocumentRequestDraft> {
        let doc_type = self
            .doc_type
            .as_deref()
            .and_then(DocumentType::parse)
            .ok_or_else(|| DomainError::validation("Invalid document type"))?;

        let urgency = match self.urgency.as_deref() {
            None => Urgency::Normal,
            Some(raw) => Urgency::parse(raw).ok_or_else(|| DomainError::validation("Invalid urgency"))?,
        };

        let copies = match self.copies {
            None => 1,
            Some(n) => i32::try_from(n)
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| DomainError::validation("copies must be a positive integer"))?,
        };

        if matches!(self.amount, Some(a) if a < 0) {
            return Err(DomainError::validation("amount must not be negative"));
        }

        Ok(DocumentRequestDraft {
            user_id: owner,
            doc_type,
            urgency,
            status: DocumentStatus::PaymentPending,
            copies,
            amount: self.amount,
            details: self.details,
            created_at: now,
        })
    }
}

impl DocumentRequestDraft {
    pub fn into_request(self, id: DocumentRequestId) -> DocumentRequest {
        DocumentRequest {
            id,
            user_id: self.user_id,
            doc_type: self.doc_type,
            urgency: self.urgency,
            status: self.status,
            copies: self.copies,
            amount: self.amount,
            details: self.details,
            admin_comment: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Guard: one pending document request per owner.
pub fn ensure_no_pending(existing: Option<&DocumentRequest>) -> DomainResult<()> {
    match existing {
        Some(_) => Err(DomainError::conflict(
            "You already have a pending document request. Please wait until it is approved or rejected before submitting a new one.",
        )),
        None => Ok(()),
    }
}

/// Admin status override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStatusChange {
    pub status: DocumentStatus,
    /// `None` keeps the existing comment.
    pub admin_comment: Option<String>,
}

impl DocumentStatusChange {
    pub fn parse(status: Option<&str>, admin_comment: Option<String>) -> DomainResult<Self> {
        let status = status
            .and_then(DocumentStatus::parse)
            .ok_or_else(|| DomainError::validation("Invalid status"))?;
        Ok(Self {
            status,
            admin_comment,
        })
    }
}

impl DocumentRequest {
    pub fn apply_status_change(&mut self, change: DocumentStatusChange, now: DateTime<Utc>) {
        self.status = change.status;
        if let Some(comment) = change.admin_comment {
            self.admin_comment = Some(comment);
        }
        self.updated_at = now;
    }

    /// Payment settled: the request moves on to admin approval.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) {
        self.status = DocumentStatus::PendingApproval;
        self.updated_at = now;
    }
}
