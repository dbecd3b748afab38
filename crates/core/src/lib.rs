//! `registrar-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error model, strongly-typed identifiers and the closed-enumeration macro
//! every status/type field is built from.

pub mod error;
pub mod id;
pub mod labels;

pub use error::{DomainError, DomainResult};
pub use id::{
    CalendarEventId, DocumentRequestId, MajorApplicationId, NotificationId, PaymentId, PetitionId,
    UserId,
};
