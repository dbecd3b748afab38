//! Lifecycle engine: the application-level orchestration of every registrar
//! operation.
//!
//! Each operation follows the same pipeline:
//!
//! ```text
//! actor + input
//!   ↓
//! 1. Role gate (active check, then role membership)
//!   ↓
//! 2. Pure validation (field presence, enumeration membership)
//!   ↓
//! 3. Open a unit of work, lock the owner when a conflict rule applies
//!   ↓
//! 4. Conflict / existence checks against the store
//!   ↓
//! 5. Apply the transition, persist, commit
//! ```
//!
//! Nothing is written before step 5 and a failed step drops the unit of work,
//! so no partial mutation is ever visible. The engine keeps no state of its
//! own; everything is re-read from the store per operation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use registrar_auth::{authorize, policy, AuthzError, NewUser, Role, User};
use registrar_calendar::{CalendarEvent, NewNotification, Notification, SubmitCalendarEvent};
use registrar_core::{
    DocumentRequestId, DomainError, MajorApplicationId, PetitionId, UserId,
};
use registrar_documents::{
    request as documents, DocumentRequest, DocumentStatus, DocumentStatusChange, Payment,
    SubmitDocumentRequest, SubmitPayment,
};
use registrar_majors::{
    application as majors, ApplicationStatus, ApplicationStatusChange, MajorApplication,
    SubmitMajorApplication,
};
use registrar_petitions::{
    petition as petitions, GradeChangePetition, PetitionStatus, PetitionStatusChange, SubmitPetition,
};

use crate::store::{RegistrarStore, StoreError, StoreTx};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Access(#[from] AuthzError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Admin status update as received.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub status: Option<String>,
    /// `None` keeps the existing comment.
    pub admin_comment: Option<String>,
}

/// A document request joined with its most recent payment, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRequestView {
    #[serde(flatten)]
    pub request: DocumentRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
}

fn not_found(what: &str) -> EngineError {
    EngineError::Domain(DomainError::not_found(what))
}

#[derive(Debug, Clone)]
pub struct LifecycleEngine<S> {
    store: S,
}

impl<S> LifecycleEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: RegistrarStore> LifecycleEngine<S> {
    // -- users ---------------------------------------------------------------

    pub async fn find_user(&self, id: UserId) -> EngineResult<Option<User>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.user_by_id(id).await?)
    }

    pub async fn find_user_by_username(&self, username: &str) -> EngineResult<Option<User>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.user_by_username(username).await?)
    }

    /// Create an account. The credential must already be hashed.
    pub async fn provision_user(&self, new: NewUser, now: DateTime<Utc>) -> EngineResult<User> {
        let mut tx = self.store.begin().await?;
        if tx.user_by_username(&new.username).await?.is_some() {
            return Err(DomainError::conflict("Username already exists").into());
        }

        let user = User::provision(UserId::new(), new, now);
        tx.insert_user(&user).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user provisioned");
        Ok(user)
    }

    /// Activate or deactivate an account (admin only).
    pub async fn set_user_active(
        &self,
        actor: &User,
        id: UserId,
        active: bool,
        now: DateTime<Utc>,
    ) -> EngineResult<User> {
        authorize(actor, policy::MANAGE_USERS)?;
        if actor.id == id && !active {
            return Err(DomainError::validation("You cannot deactivate your own account").into());
        }

        let mut tx = self.store.begin().await?;
        tx.lock_user(id).await?;
        let mut user = tx.user_by_id(id).await?.ok_or_else(|| not_found("User not found"))?;
        user.active = active;
        user.updated_at = now;
        tx.save_user(&user).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, active, "account activation changed");
        Ok(user)
    }

    // -- document requests ---------------------------------------------------

    pub async fn create_document_request(
        &self,
        actor: &User,
        submit: SubmitDocumentRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<DocumentRequest> {
        authorize(actor, policy::CREATE_DOCUMENT_REQUEST)?;
        let draft = submit.validate(actor.id, now)?;

        let mut tx = self.store.begin().await?;
        tx.lock_user(actor.id).await?;
        let pending = tx
            .find_document_request_in(actor.id, DocumentStatus::PENDING)
            .await?;
        documents::ensure_no_pending(pending.as_ref())?;

        let request = tx.insert_document_request(draft).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %actor.id,
            request_id = %request.id,
            doc_type = %request.doc_type,
            "document request submitted"
        );
        Ok(request)
    }

    /// Admins see every request; everyone else sees their own.
    pub async fn list_document_requests(&self, actor: &User) -> EngineResult<Vec<DocumentRequestView>> {
        authorize(actor, policy::ANY_ROLE)?;
        let owner = (!actor.role.is_admin()).then_some(actor.id);

        let mut tx = self.store.begin().await?;
        let requests = tx.list_document_requests(owner).await?;
        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            let payment = tx.latest_payment_for(request.id).await?;
            views.push(DocumentRequestView { request, payment });
        }
        Ok(views)
    }

    pub async fn update_document_request_status(
        &self,
        actor: &User,
        id: DocumentRequestId,
        update: StatusUpdate,
        now: DateTime<Utc>,
    ) -> EngineResult<DocumentRequest> {
        authorize(actor, policy::UPDATE_STATUS)?;

        let mut tx = self.store.begin().await?;
        let mut request = tx
            .lock_document_request(id)
            .await?
            .ok_or_else(|| not_found("Request not found"))?;
        let change = DocumentStatusChange::parse(update.status.as_deref(), update.admin_comment)?;

        request.apply_status_change(change, now);
        tx.save_document_request(&request).await?;
        tx.insert_notification(NewNotification {
            user_id: request.user_id,
            title: "Document request updated".to_string(),
            message: format!("Your {} request is now {}.", request.doc_type, request.status),
            kind: Some("document_request".to_string()),
            created_at: now,
        })
        .await?;
        tx.commit().await?;

        tracing::info!(request_id = %request.id, status = %request.status, "document request status set");
        Ok(request)
    }

    /// Record a settled payment and advance the request to `pending_approval`,
    /// both in one unit of work.
    pub async fn pay(&self, actor: &User, submit: SubmitPayment, now: DateTime<Utc>) -> EngineResult<Payment> {
        authorize(actor, policy::PAY)?;
        let valid = submit.validate()?;

        let mut tx = self.store.begin().await?;
        let mut request = tx
            .lock_document_request(valid.request_id)
            .await?
            .ok_or_else(|| not_found("Document request not found"))?;

        let payment = tx.insert_payment(valid.settle(now)).await?;
        request.mark_paid(now);
        tx.save_document_request(&request).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %actor.id,
            request_id = %request.id,
            transaction_id = payment.transaction_id.as_deref().unwrap_or_default(),
            "payment recorded"
        );
        Ok(payment)
    }

    // -- grade change petitions ----------------------------------------------

    pub async fn create_petition(
        &self,
        actor: &User,
        submit: SubmitPetition,
        now: DateTime<Utc>,
    ) -> EngineResult<GradeChangePetition> {
        authorize(actor, policy::CREATE_PETITION)?;
        let draft = submit.validate(actor.id, now)?;

        let mut tx = self.store.begin().await?;
        tx.lock_user(actor.id).await?;
        let pending = tx.find_petition_in(actor.id, PetitionStatus::PENDING).await?;
        petitions::ensure_no_pending(pending.as_ref())?;

        let petition = tx.insert_petition(draft).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %actor.id,
            petition_id = %petition.id,
            course_code = %petition.course_code,
            "grade change petition submitted"
        );
        Ok(petition)
    }

    /// Admins see all petitions, instructors their own, students none.
    pub async fn list_petitions(&self, actor: &User) -> EngineResult<Vec<GradeChangePetition>> {
        authorize(actor, policy::ANY_ROLE)?;
        let mut tx = self.store.begin().await?;
        let petitions = match actor.role {
            Role::Admin => tx.list_petitions(None).await?,
            Role::Instructor => tx.list_petitions(Some(actor.id)).await?,
            Role::Student => Vec::new(),
        };
        Ok(petitions)
    }

    pub async fn update_petition_status(
        &self,
        actor: &User,
        id: PetitionId,
        update: StatusUpdate,
        now: DateTime<Utc>,
    ) -> EngineResult<GradeChangePetition> {
        authorize(actor, policy::UPDATE_STATUS)?;

        let mut tx = self.store.begin().await?;
        let mut petition = tx
            .lock_petition(id)
            .await?
            .ok_or_else(|| not_found("Petition not found"))?;
        let change = PetitionStatusChange::parse(update.status.as_deref(), update.admin_comment)?;

        petition.apply_status_change(change, now);
        tx.save_petition(&petition).await?;
        tx.insert_notification(NewNotification {
            user_id: petition.instructor_id,
            title: "Grade change petition updated".to_string(),
            message: format!(
                "Your petition for {} ({}) is now {}.",
                petition.student_id, petition.course_code, petition.status
            ),
            kind: Some("petition".to_string()),
            created_at: now,
        })
        .await?;
        tx.commit().await?;

        tracing::info!(petition_id = %petition.id, status = %petition.status, "petition status set");
        Ok(petition)
    }

    // -- major applications --------------------------------------------------

    pub async fn create_major_application(
        &self,
        actor: &User,
        submit: SubmitMajorApplication,
        now: DateTime<Utc>,
    ) -> EngineResult<MajorApplication> {
        authorize(actor, policy::CREATE_MAJOR_APPLICATION)?;
        let draft = submit.validate(actor.id, now)?;

        let mut tx = self.store.begin().await?;
        tx.lock_user(actor.id).await?;
        let pending = tx
            .find_major_application_in(actor.id, ApplicationStatus::PENDING)
            .await?;
        majors::ensure_no_pending(pending.as_ref())?;

        let latest = tx
            .latest_major_application_in(actor.id, ApplicationStatus::Approved)
            .await?;
        let draft = draft.against_latest_approved(latest.as_ref())?;

        let application = tx.insert_major_application(draft).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %actor.id,
            application_id = %application.id,
            school = %application.school,
            "major application submitted"
        );
        Ok(application)
    }

    pub async fn list_major_applications(&self, actor: &User) -> EngineResult<Vec<MajorApplication>> {
        authorize(actor, policy::ANY_ROLE)?;
        let owner = (!actor.role.is_admin()).then_some(actor.id);
        let mut tx = self.store.begin().await?;
        Ok(tx.list_major_applications(owner).await?)
    }

    /// Major applications track no modification time; `now` only stamps the
    /// owner's notification.
    pub async fn update_major_application_status(
        &self,
        actor: &User,
        id: MajorApplicationId,
        update: StatusUpdate,
        now: DateTime<Utc>,
    ) -> EngineResult<MajorApplication> {
        authorize(actor, policy::UPDATE_STATUS)?;

        let mut tx = self.store.begin().await?;
        let mut application = tx
            .lock_major_application(id)
            .await?
            .ok_or_else(|| not_found("Application not found"))?;
        let change = ApplicationStatusChange::parse(update.status.as_deref(), update.admin_comment)?;

        application.apply_status_change(change);
        tx.save_major_application(&application).await?;
        tx.insert_notification(NewNotification {
            user_id: application.student_id,
            title: "Major application updated".to_string(),
            message: format!(
                "Your application for {} ({}) is now {}.",
                application.requested_major, application.school, application.status
            ),
            kind: Some("major_application".to_string()),
            created_at: now,
        })
        .await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application.id,
            status = %application.status,
            "major application status set"
        );
        Ok(application)
    }

    // -- calendar & notifications --------------------------------------------

    pub async fn create_calendar_event(
        &self,
        actor: &User,
        submit: SubmitCalendarEvent,
        now: DateTime<Utc>,
    ) -> EngineResult<CalendarEvent> {
        authorize(actor, policy::CREATE_CALENDAR_EVENT)?;
        let draft = submit.validate(Some(actor.id), now)?;

        let mut tx = self.store.begin().await?;
        let event = tx.insert_calendar_event(draft).await?;
        tx.commit().await?;

        tracing::info!(event_id = %event.id, event_type = %event.event_type, "calendar event created");
        Ok(event)
    }

    /// Seeded events carry no creator and skip the role gate.
    pub async fn seed_calendar_event(
        &self,
        submit: SubmitCalendarEvent,
        now: DateTime<Utc>,
    ) -> EngineResult<CalendarEvent> {
        let draft = submit.validate(None, now)?;
        let mut tx = self.store.begin().await?;
        let event = tx.insert_calendar_event(draft).await?;
        tx.commit().await?;
        Ok(event)
    }

    pub async fn list_calendar_events(&self, actor: &User) -> EngineResult<Vec<CalendarEvent>> {
        authorize(actor, policy::ANY_ROLE)?;
        let mut tx = self.store.begin().await?;
        Ok(tx.list_calendar_events().await?)
    }

    pub async fn list_notifications(&self, actor: &User) -> EngineResult<Vec<Notification>> {
        authorize(actor, policy::ANY_ROLE)?;
        let mut tx = self.store.begin().await?;
        Ok(tx.list_notifications(actor.id).await?)
    }
}
