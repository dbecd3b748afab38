//! Payments against document requests.
//!
//! Settlement is simulated: a submitted payment is recorded as `paid` right
//! away and the request it references moves to `pending_approval`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use registrar_core::{DocumentRequestId, DomainError, DomainResult, PaymentId};

registrar_core::labelled_enum! {
    pub enum PaymentMethod {
        Online => "online",
        Voucher => "voucher",
    }
}

registrar_core::labelled_enum! {
    pub enum PaymentStatus {
        Pending => "pending",
        Paid => "paid",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub request_id: DocumentRequestId,
    pub amount: i64,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

/// Raw payment submission.
#[derive(Debug, Clone, Default)]
pub struct SubmitPayment {
    pub request_id: Option<i64>,
    pub amount: Option<i64>,
    pub method: Option<String>,
}

/// A submission that passed field validation. The referenced request has not
/// been looked up yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPayment {
    pub request_id: DocumentRequestId,
    pub amount: i64,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
    pub request_id: DocumentRequestId,
    pub amount: i64,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl SubmitPayment {
    /// A zero id or zero amount counts as missing.
    pub fn validate(self) -> DomainResult<ValidPayment> {
        let (request_id, amount) = match (self.request_id, self.amount) {
            (Some(id), Some(amount)) if id != 0 && amount != 0 => (id, amount),
            _ => return Err(DomainError::validation("requestId and amount are required")),
        };

        if amount < 0 {
            return Err(DomainError::validation("amount must not be negative"));
        }

        let method = self
            .method
            .as_deref()
            .and_then(PaymentMethod::parse)
            .ok_or_else(|| DomainError::validation("Invalid payment method"))?;

        Ok(ValidPayment {
            request_id: DocumentRequestId::new(request_id),
            amount,
            method,
        })
    }
}

impl ValidPayment {
    pub fn settle(self, now: DateTime<Utc>) -> PaymentDraft {
        PaymentDraft {
            request_id: self.request_id,
            amount: self.amount,
            status: PaymentStatus::Paid,
            transaction_id: Some(new_transaction_reference()),
            method: self.method,
            created_at: now,
        }
    }
}

impl PaymentDraft {
    pub fn into_payment(self, id: PaymentId) -> Payment {
        Payment {
            id,
            request_id: self.request_id,
            amount: self.amount,
            status: self.status,
            transaction_id: self.transaction_id,
            method: self.method,
            created_at: self.created_at,
        }
    }
}

/// Eight uppercase hex characters drawn from a fresh random UUID.
pub fn new_transaction_reference() -> String {
    let mut reference = Uuid::new_v4().simple().to_string();
    reference.truncate(8);
    reference.make_ascii_uppercase();
    reference
}
