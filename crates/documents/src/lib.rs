//! Document requests and the payments that settle them.

pub mod payment;
pub mod request;

pub use payment::{
    new_transaction_reference, Payment, PaymentDraft, PaymentMethod, PaymentStatus, SubmitPayment,
    ValidPayment,
};
pub use request::{
    DocumentRequest, DocumentRequestDraft, DocumentStatus, DocumentStatusChange, DocumentType,
    SubmitDocumentRequest, Urgency,
};
