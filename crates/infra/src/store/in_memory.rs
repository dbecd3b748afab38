use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use registrar_auth::User;
use registrar_calendar::{CalendarEvent, CalendarEventDraft, NewNotification, Notification};
use registrar_core::{
    CalendarEventId, DocumentRequestId, MajorApplicationId, NotificationId, PaymentId, PetitionId,
    UserId,
};
use registrar_documents::{DocumentRequest, DocumentRequestDraft, DocumentStatus, Payment, PaymentDraft};
use registrar_majors::{ApplicationStatus, MajorApplication, MajorApplicationDraft};
use registrar_petitions::{GradeChangePetition, PetitionDraft, PetitionStatus};

use super::{RegistrarStore, StoreError, StoreResult, StoreTx};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    document_requests: Vec<DocumentRequest>,
    payments: Vec<Payment>,
    petitions: Vec<GradeChangePetition>,
    major_applications: Vec<MajorApplication>,
    calendar_events: Vec<CalendarEvent>,
    notifications: Vec<Notification>,
}

/// Rows are append-only, so the next id is one past the row count.
fn next_id(len: usize) -> i64 {
    len as i64 + 1
}

fn newest_first<T, K: Ord>(rows: &mut [T], key: impl Fn(&T) -> K) {
    rows.sort_by_key(|row| Reverse(key(row)));
}

/// In-memory store for development and tests.
///
/// A unit of work holds the store-wide lock for its whole lifetime, so units
/// are fully serialised. Reads go straight to the shared tables. The first
/// write takes a private copy, which replaces the shared copy on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Option<Tables>,
}

impl InMemoryTx {
    fn read(&self) -> &Tables {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn write(&mut self) -> &mut Tables {
        let shared = &self.guard;
        self.working.get_or_insert_with(|| Tables::clone(shared))
    }
}

#[async_trait]
impl RegistrarStore for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> StoreResult<InMemoryTx> {
        let guard = self.tables.clone().lock_owned().await;
        Ok(InMemoryTx { guard, working: None })
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn lock_user(&mut self, _id: UserId) -> StoreResult<()> {
        Ok(())
    }

    async fn user_by_id(&mut self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        let tables = self.write();
        let taken = tables.users.values().any(|u| u.username == user.username);
        if taken || tables.users.contains_key(&user.id) {
            return Err(StoreError::UniqueViolation(format!("users.username {}", user.username)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn save_user(&mut self, user: &User) -> StoreResult<()> {
        let tables = self.write();
        match tables.users.get_mut(&user.id) {
            Some(row) => {
                row.active = user.active;
                row.updated_at = user.updated_at;
                Ok(())
            }
            None => Err(StoreError::Backend(format!("user {} does not exist", user.id))),
        }
    }

    async fn find_document_request_in(
        &mut self,
        owner: UserId,
        statuses: &[DocumentStatus],
    ) -> StoreResult<Option<DocumentRequest>> {
        Ok(self
            .read()
            .document_requests
            .iter()
            .find(|r| r.user_id == owner && statuses.contains(&r.status))
            .cloned())
    }

    async fn insert_document_request(&mut self, draft: DocumentRequestDraft) -> StoreResult<DocumentRequest> {
        let tables = self.write();
        let id = DocumentRequestId::new(next_id(tables.document_requests.len()));
        let request = draft.into_request(id);
        tables.document_requests.push(request.clone());
        Ok(request)
    }

    async fn lock_document_request(&mut self, id: DocumentRequestId) -> StoreResult<Option<DocumentRequest>> {
        Ok(self
            .read()
            .document_requests
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn save_document_request(&mut self, request: &DocumentRequest) -> StoreResult<()> {
        let tables = self.write();
        let row = tables
            .document_requests
            .iter_mut()
            .find(|r| r.id == request.id)
            .ok_or_else(|| StoreError::Backend(format!("document request {} does not exist", request.id)))?;
        *row = request.clone();
        Ok(())
    }

    async fn list_document_requests(&mut self, owner: Option<UserId>) -> StoreResult<Vec<DocumentRequest>> {
        let mut rows: Vec<_> = self
            .read()
            .document_requests
            .iter()
            .filter(|r| owner.is_none_or(|o| r.user_id == o))
            .cloned()
            .collect();
        newest_first(&mut rows, |r| (r.created_at, r.id));
        Ok(rows)
    }

    async fn insert_payment(&mut self, draft: PaymentDraft) -> StoreResult<Payment> {
        let tables = self.write();
        let id = PaymentId::new(next_id(tables.payments.len()));
        let payment = draft.into_payment(id);
        tables.payments.push(payment.clone());
        Ok(payment)
    }

    async fn latest_payment_for(&mut self, request: DocumentRequestId) -> StoreResult<Option<Payment>> {
        Ok(self
            .read()
            .payments
            .iter()
            .filter(|p| p.request_id == request)
            .max_by_key(|p| p.id)
            .cloned())
    }

    async fn find_petition_in(
        &mut self,
        instructor: UserId,
        statuses: &[PetitionStatus],
    ) -> StoreResult<Option<GradeChangePetition>> {
        Ok(self
            .read()
            .petitions
            .iter()
            .find(|p| p.instructor_id == instructor && statuses.contains(&p.status))
            .cloned())
    }

    async fn insert_petition(&mut self, draft: PetitionDraft) -> StoreResult<GradeChangePetition> {
        let tables = self.write();
        let id = PetitionId::new(next_id(tables.petitions.len()));
        let petition = draft.into_petition(id);
        tables.petitions.push(petition.clone());
        Ok(petition)
    }

    async fn lock_petition(&mut self, id: PetitionId) -> StoreResult<Option<GradeChangePetition>> {
        Ok(self.read().petitions.iter().find(|p| p.id == id).cloned())
    }

    async fn save_petition(&mut self, petition: &GradeChangePetition) -> StoreResult<()> {
        let tables = self.write();
        let row = tables
            .petitions
            .iter_mut()
            .find(|p| p.id == petition.id)
            .ok_or_else(|| StoreError::Backend(format!("petition {} does not exist", petition.id)))?;
        *row = petition.clone();
        Ok(())
    }

    async fn list_petitions(&mut self, instructor: Option<UserId>) -> StoreResult<Vec<GradeChangePetition>> {
        let mut rows: Vec<_> = self
            .read()
            .petitions
            .iter()
            .filter(|p| instructor.is_none_or(|i| p.instructor_id == i))
            .cloned()
            .collect();
        newest_first(&mut rows, |p| (p.created_at, p.id));
        Ok(rows)
    }

    async fn find_major_application_in(
        &mut self,
        student: UserId,
        statuses: &[ApplicationStatus],
    ) -> StoreResult<Option<MajorApplication>> {
        Ok(self
            .read()
            .major_applications
            .iter()
            .find(|a| a.student_id == student && statuses.contains(&a.status))
            .cloned())
    }

    async fn latest_major_application_in(
        &mut self,
        student: UserId,
        status: ApplicationStatus,
    ) -> StoreResult<Option<MajorApplication>> {
        Ok(self
            .read()
            .major_applications
            .iter()
            .filter(|a| a.student_id == student && a.status == status)
            .max_by_key(|a| (a.created_at, a.id))
            .cloned())
    }

    async fn insert_major_application(&mut self, draft: MajorApplicationDraft) -> StoreResult<MajorApplication> {
        let tables = self.write();
        let id = MajorApplicationId::new(next_id(tables.major_applications.len()));
        let application = draft.into_application(id);
        tables.major_applications.push(application.clone());
        Ok(application)
    }

    async fn lock_major_application(&mut self, id: MajorApplicationId) -> StoreResult<Option<MajorApplication>> {
        Ok(self
            .read()
            .major_applications
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn save_major_application(&mut self, application: &MajorApplication) -> StoreResult<()> {
        let tables = self.write();
        let row = tables
            .major_applications
            .iter_mut()
            .find(|a| a.id == application.id)
            .ok_or_else(|| {
                StoreError::Backend(format!("major application {} does not exist", application.id))
            })?;
        *row = application.clone();
        Ok(())
    }

    async fn list_major_applications(&mut self, student: Option<UserId>) -> StoreResult<Vec<MajorApplication>> {
        let mut rows: Vec<_> = self
            .read()
            .major_applications
            .iter()
            .filter(|a| student.is_none_or(|s| a.student_id == s))
            .cloned()
            .collect();
        newest_first(&mut rows, |a| (a.created_at, a.id));
        Ok(rows)
    }

    async fn insert_calendar_event(&mut self, draft: CalendarEventDraft) -> StoreResult<CalendarEvent> {
        let tables = self.write();
        let id = CalendarEventId::new(next_id(tables.calendar_events.len()));
        let event = draft.into_event(id);
        tables.calendar_events.push(event.clone());
        Ok(event)
    }

    async fn list_calendar_events(&mut self) -> StoreResult<Vec<CalendarEvent>> {
        let mut rows = self.read().calendar_events.clone();
        rows.sort_by_key(|e| (e.start_date, e.id));
        Ok(rows)
    }

    async fn insert_notification(&mut self, notification: NewNotification) -> StoreResult<Notification> {
        let tables = self.write();
        let id = NotificationId::new(next_id(tables.notifications.len()));
        let notification = notification.into_notification(id);
        tables.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&mut self, user: UserId) -> StoreResult<Vec<Notification>> {
        let mut rows: Vec<_> = self
            .read()
            .notifications
            .iter()
            .filter(|n| n.user_id == user)
            .cloned()
            .collect();
        newest_first(&mut rows, |n| (n.created_at, n.id));
        Ok(rows)
    }

    async fn commit(self) -> StoreResult<()> {
        let InMemoryTx { mut guard, working } = self;
        if let Some(working) = working {
            *guard = working;
        }
        Ok(())
    }
}
