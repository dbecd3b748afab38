//! Persistence store contract.
//!
//! Every operation of the lifecycle engine runs inside one unit of work
//! ([`StoreTx`]) opened with [`RegistrarStore::begin`]. Reads see the unit's
//! own writes; [`StoreTx::commit`] publishes all of them at once and dropping
//! the unit without committing discards them.
//!
//! ## Ordering
//!
//! - Record listings are newest first: `created_at` descending, ties broken by
//!   `id` descending.
//! - Calendar listings are by `start_date` ascending, ties by `id`.
//! - `latest_*` lookups pick the greatest `(created_at, id)`.

use async_trait::async_trait;
use thiserror::Error;

use registrar_auth::User;
use registrar_calendar::{CalendarEvent, CalendarEventDraft, NewNotification, Notification};
use registrar_core::{DocumentRequestId, MajorApplicationId, PetitionId, UserId};
use registrar_documents::{DocumentRequest, DocumentRequestDraft, DocumentStatus, Payment, PaymentDraft};
use registrar_majors::{ApplicationStatus, MajorApplication, MajorApplicationDraft};
use registrar_petitions::{GradeChangePetition, PetitionDraft, PetitionStatus};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure. These are infrastructure errors, never business outcomes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("malformed stored row: {0}")]
    Corrupt(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait RegistrarStore: Send + Sync + 'static {
    type Tx: StoreTx;

    async fn begin(&self) -> StoreResult<Self::Tx>;
}

/// One unit of work against the store.
#[async_trait]
pub trait StoreTx: Send {
    /// Serialise this unit against every other unit that locks the same user.
    async fn lock_user(&mut self, id: UserId) -> StoreResult<()>;

    async fn user_by_id(&mut self, id: UserId) -> StoreResult<Option<User>>;
    async fn user_by_username(&mut self, username: &str) -> StoreResult<Option<User>>;
    async fn insert_user(&mut self, user: &User) -> StoreResult<()>;
    /// Persist the mutable account fields (`active`, `updated_at`).
    async fn save_user(&mut self, user: &User) -> StoreResult<()>;

    async fn find_document_request_in(
        &mut self,
        owner: UserId,
        statuses: &[DocumentStatus],
    ) -> StoreResult<Option<DocumentRequest>>;
    async fn insert_document_request(&mut self, draft: DocumentRequestDraft) -> StoreResult<DocumentRequest>;
    /// Read the request and hold it until the unit ends, so read-modify-write
    /// updates on the same row apply one after the other.
    async fn lock_document_request(&mut self, id: DocumentRequestId) -> StoreResult<Option<DocumentRequest>>;
    async fn save_document_request(&mut self, request: &DocumentRequest) -> StoreResult<()>;
    /// `None` lists every owner.
    async fn list_document_requests(&mut self, owner: Option<UserId>) -> StoreResult<Vec<DocumentRequest>>;

    async fn insert_payment(&mut self, draft: PaymentDraft) -> StoreResult<Payment>;
    /// Most recent payment referencing the request (greatest id).
    async fn latest_payment_for(&mut self, request: DocumentRequestId) -> StoreResult<Option<Payment>>;

    async fn find_petition_in(
        &mut self,
        instructor: UserId,
        statuses: &[PetitionStatus],
    ) -> StoreResult<Option<GradeChangePetition>>;
    async fn insert_petition(&mut self, draft: PetitionDraft) -> StoreResult<GradeChangePetition>;
    async fn lock_petition(&mut self, id: PetitionId) -> StoreResult<Option<GradeChangePetition>>;
    async fn save_petition(&mut self, petition: &GradeChangePetition) -> StoreResult<()>;
    async fn list_petitions(&mut self, instructor: Option<UserId>) -> StoreResult<Vec<GradeChangePetition>>;

    async fn find_major_application_in(
        &mut self,
        student: UserId,
        statuses: &[ApplicationStatus],
    ) -> StoreResult<Option<MajorApplication>>;
    async fn latest_major_application_in(
        &mut self,
        student: UserId,
        status: ApplicationStatus,
    ) -> StoreResult<Option<MajorApplication>>;
    async fn insert_major_application(&mut self, draft: MajorApplicationDraft) -> StoreResult<MajorApplication>;
    async fn lock_major_application(&mut self, id: MajorApplicationId) -> StoreResult<Option<MajorApplication>>;
    async fn save_major_application(&mut self, application: &MajorApplication) -> StoreResult<()>;
    async fn list_major_applications(&mut self, student: Option<UserId>) -> StoreResult<Vec<MajorApplication>>;

    async fn insert_calendar_event(&mut self, draft: CalendarEventDraft) -> StoreResult<CalendarEvent>;
    async fn list_calendar_events(&mut self) -> StoreResult<Vec<CalendarEvent>>;

    async fn insert_notification(&mut self, notification: NewNotification) -> StoreResult<Notification>;
    async fn list_notifications(&mut self, user: UserId) -> StoreResult<Vec<Notification>>;

    async fn commit(self) -> StoreResult<()>;
}
