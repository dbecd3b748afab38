//! PostgreSQL-backed store.
//!
//! A unit of work is one database transaction. `lock_user` takes a row lock on
//! the user (`SELECT ... FOR UPDATE`) so concurrent submissions from the same
//! account queue behind each other and the duplicate-pending check sees every
//! committed row. Status updates and payments read their target through
//! `lock_document_request`, `lock_petition` or `lock_major_application`, which
//! also use `FOR UPDATE`, so two writers on one row cannot overwrite each other.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | Database (other) | Any other | `Backend` |
//! | ColumnDecode / unknown label | N/A | `Corrupt` |
//! | Other | N/A | `Backend` |

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use registrar_auth::{Role, User, UserProfile};
use registrar_calendar::{CalendarEvent, CalendarEventDraft, EventType, NewNotification, Notification};
use registrar_core::{
    CalendarEventId, DocumentRequestId, MajorApplicationId, NotificationId, PaymentId, PetitionId,
    UserId,
};
use registrar_documents::{
    DocumentRequest, DocumentRequestDraft, DocumentStatus, DocumentType, Payment, PaymentDraft,
    PaymentMethod, PaymentStatus, Urgency,
};
use registrar_majors::{ApplicationStatus, MajorApplication, MajorApplicationDraft};
use registrar_petitions::{GradeChangePetition, PetitionDraft, PetitionStatus};

use super::{RegistrarStore, StoreError, StoreResult, StoreTx};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Every statement is idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        tracing::info!("database schema applied");
        Ok(())
    }
}

pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RegistrarStore for PostgresStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> StoreResult<PostgresTx> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PostgresTx { tx })
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Corrupt(format!("{operation}: {err}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Corrupt(format!("column {column}: {e}")))
}

fn label<T>(row: &PgRow, column: &str, parse: fn(&str) -> Option<T>) -> StoreResult<T> {
    let raw: String = get(row, column)?;
    parse(&raw).ok_or_else(|| StoreError::Corrupt(format!("column {column}: unknown label {raw:?}")))
}

fn labels<T: Copy>(values: &[T], as_str: fn(&T) -> &'static str) -> Vec<&'static str> {
    values.iter().map(as_str).collect()
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: UserId::from_uuid(get(row, "id")?),
        username: get(row, "username")?,
        password_hash: get(row, "password_hash")?,
        role: label(row, "role", Role::parse)?,
        active: get(row, "is_active")?,
        profile: UserProfile {
            email: get(row, "email")?,
            first_name: get(row, "first_name")?,
            last_name: get(row, "last_name")?,
            full_name: get(row, "full_name")?,
            student_id: get(row, "student_id")?,
            department: get(row, "department")?,
        },
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn document_request_from_row(row: &PgRow) -> StoreResult<DocumentRequest> {
    Ok(DocumentRequest {
        id: DocumentRequestId::new(get(row, "id")?),
        user_id: UserId::from_uuid(get(row, "user_id")?),
        doc_type: label(row, "type", DocumentType::parse)?,
        urgency: label(row, "urgency", Urgency::parse)?,
        status: label(row, "status", DocumentStatus::parse)?,
        copies: get(row, "copies")?,
        amount: get(row, "amount")?,
        details: get(row, "details")?,
        admin_comment: get(row, "admin_comment")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn payment_from_row(row: &PgRow) -> StoreResult<Payment> {
    Ok(Payment {
        id: PaymentId::new(get(row, "id")?),
        request_id: DocumentRequestId::new(get(row, "request_id")?),
        amount: get(row, "amount")?,
        status: label(row, "status", PaymentStatus::parse)?,
        transaction_id: get(row, "transaction_id")?,
        method: label(row, "method", PaymentMethod::parse)?,
        created_at: get(row, "created_at")?,
    })
}

fn petition_from_row(row: &PgRow) -> StoreResult<GradeChangePetition> {
    Ok(GradeChangePetition {
        id: PetitionId::new(get(row, "id")?),
        instructor_id: UserId::from_uuid(get(row, "instructor_id")?),
        student_id: get(row, "student_id")?,
        course_code: get(row, "course_code")?,
        current_grade: get(row, "current_grade")?,
        new_grade: get(row, "new_grade")?,
        justification: get(row, "justification")?,
        status: label(row, "status", PetitionStatus::parse)?,
        admin_comment: get(row, "admin_comment")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn major_application_from_row(row: &PgRow) -> StoreResult<MajorApplication> {
    Ok(MajorApplication {
        id: MajorApplicationId::new(get(row, "id")?),
        student_id: UserId::from_uuid(get(row, "student_id")?),
        current_major: get(row, "current_major")?,
        requested_major: get(row, "requested_major")?,
        school: get(row, "school")?,
        statement: get(row, "statement")?,
        status: label(row, "status", ApplicationStatus::parse)?,
        admin_comment: get(row, "admin_comment")?,
        created_at: get(row, "created_at")?,
    })
}

fn calendar_event_from_row(row: &PgRow) -> StoreResult<CalendarEvent> {
    let created_by: Option<Uuid> = get(row, "created_by")?;
    Ok(CalendarEvent {
        id: CalendarEventId::new(get(row, "id")?),
        title: get(row, "title")?,
        description: get(row, "description")?,
        start_date: get(row, "start_date")?,
        end_date: get(row, "end_date")?,
        event_type: label(row, "type", EventType::parse)?,
        created_by: created_by.map(UserId::from_uuid),
        created_at: get(row, "created_at")?,
    })
}

fn notification_from_row(row: &PgRow) -> StoreResult<Notification> {
    Ok(Notification {
        id: NotificationId::new(get(row, "id")?),
        user_id: UserId::from_uuid(get(row, "user_id")?),
        title: get(row, "title")?,
        message: get(row, "message")?,
        kind: get(row, "type")?,
        read: get(row, "is_read")?,
        created_at: get(row, "created_at")?,
    })
}

fn collect<T>(rows: Vec<PgRow>, decode: fn(&PgRow) -> StoreResult<T>) -> StoreResult<Vec<T>> {
    rows.iter().map(decode).collect()
}

fn returned_id(row: PgRow) -> StoreResult<i64> {
    get(&row, "id")
}

fn uuid(id: UserId) -> Uuid {
    *id.as_uuid()
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn lock_user(&mut self, id: UserId) -> StoreResult<()> {
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(uuid(id))
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_user", e))?;
        Ok(())
    }

    async fn user_by_id(&mut self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(uuid(id))
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("user_by_id", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("user_by_username", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, password_hash, role, is_active,
                email, first_name, last_name, full_name, student_id, department,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(uuid(user.id))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.active)
        .bind(&user.profile.email)
        .bind(&user.profile.first_name)
        .bind(&user.profile.last_name)
        .bind(&user.profile.full_name)
        .bind(&user.profile.student_id)
        .bind(&user.profile.department)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    async fn save_user(&mut self, user: &User) -> StoreResult<()> {
        sqlx::query("UPDATE users SET is_active = $2, updated_at = $3 WHERE id = $1")
            .bind(uuid(user.id))
            .bind(user.active)
            .bind(user.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("save_user", e))?;
        Ok(())
    }

    async fn find_document_request_in(
        &mut self,
        owner: UserId,
        statuses: &[DocumentStatus],
    ) -> StoreResult<Option<DocumentRequest>> {
        let row = sqlx::query(
            "SELECT * FROM document_requests WHERE user_id = $1 AND status = ANY($2) LIMIT 1",
        )
        .bind(uuid(owner))
        .bind(labels(statuses, DocumentStatus::as_str))
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_document_request_in", e))?;
        row.as_ref().map(document_request_from_row).transpose()
    }

    async fn insert_document_request(&mut self, draft: DocumentRequestDraft) -> StoreResult<DocumentRequest> {
        let row = sqlx::query(
            r#"
            INSERT INTO document_requests (
                user_id, type, urgency, status, copies, amount, details, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id
            "#,
        )
        .bind(uuid(draft.user_id))
        .bind(draft.doc_type.as_str())
        .bind(draft.urgency.as_str())
        .bind(draft.status.as_str())
        .bind(draft.copies)
        .bind(draft.amount)
        .bind(&draft.details)
        .bind(draft.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_document_request", e))?;
        let id = returned_id(row)?;
        Ok(draft.into_request(DocumentRequestId::new(id)))
    }

    async fn lock_document_request(&mut self, id: DocumentRequestId) -> StoreResult<Option<DocumentRequest>> {
        let row = sqlx::query("SELECT * FROM document_requests WHERE id = $1 FOR UPDATE")
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_document_request", e))?;
        row.as_ref().map(document_request_from_row).transpose()
    }

    async fn save_document_request(&mut self, request: &DocumentRequest) -> StoreResult<()> {
        sqlx::query(
            "UPDATE document_requests SET status = $2, admin_comment = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(request.id.get())
        .bind(request.status.as_str())
        .bind(&request.admin_comment)
        .bind(request.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_document_request", e))?;
        Ok(())
    }

    async fn list_document_requests(&mut self, owner: Option<UserId>) -> StoreResult<Vec<DocumentRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM document_requests
            WHERE $1::uuid IS NULL OR user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner.map(uuid))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_document_requests", e))?;
        collect(rows, document_request_from_row)
    }

    async fn insert_payment(&mut self, draft: PaymentDraft) -> StoreResult<Payment> {
        let row = sqlx::query(
            r#"
            INSERT INTO payments (request_id, amount, status, transaction_id, method, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(draft.request_id.get())
        .bind(draft.amount)
        .bind(draft.status.as_str())
        .bind(&draft.transaction_id)
        .bind(draft.method.as_str())
        .bind(draft.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_payment", e))?;
        let id = returned_id(row)?;
        Ok(draft.into_payment(PaymentId::new(id)))
    }

    async fn latest_payment_for(&mut self, request: DocumentRequestId) -> StoreResult<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE request_id = $1 ORDER BY id DESC LIMIT 1")
            .bind(request.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("latest_payment_for", e))?;
        row.as_ref().map(payment_from_row).transpose()
    }

    async fn find_petition_in(
        &mut self,
        instructor: UserId,
        statuses: &[PetitionStatus],
    ) -> StoreResult<Option<GradeChangePetition>> {
        let row = sqlx::query(
            "SELECT * FROM grade_change_petitions WHERE instructor_id = $1 AND status = ANY($2) LIMIT 1",
        )
        .bind(uuid(instructor))
        .bind(labels(statuses, PetitionStatus::as_str))
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_petition_in", e))?;
        row.as_ref().map(petition_from_row).transpose()
    }

    async fn insert_petition(&mut self, draft: PetitionDraft) -> StoreResult<GradeChangePetition> {
        let row = sqlx::query(
            r#"
            INSERT INTO grade_change_petitions (
                instructor_id, student_id, course_code, current_grade, new_grade,
                justification, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id
            "#,
        )
        .bind(uuid(draft.instructor_id))
        .bind(&draft.student_id)
        .bind(&draft.course_code)
        .bind(&draft.current_grade)
        .bind(&draft.new_grade)
        .bind(&draft.justification)
        .bind(PetitionStatus::Submitted.as_str())
        .bind(draft.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_petition", e))?;
        let id = returned_id(row)?;
        Ok(draft.into_petition(PetitionId::new(id)))
    }

    async fn lock_petition(&mut self, id: PetitionId) -> StoreResult<Option<GradeChangePetition>> {
        let row = sqlx::query("SELECT * FROM grade_change_petitions WHERE id = $1 FOR UPDATE")
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_petition", e))?;
        row.as_ref().map(petition_from_row).transpose()
    }

    async fn save_petition(&mut self, petition: &GradeChangePetition) -> StoreResult<()> {
        sqlx::query(
            "UPDATE grade_change_petitions SET status = $2, admin_comment = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(petition.id.get())
        .bind(petition.status.as_str())
        .bind(&petition.admin_comment)
        .bind(petition.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_petition", e))?;
        Ok(())
    }

    async fn list_petitions(&mut self, instructor: Option<UserId>) -> StoreResult<Vec<GradeChangePetition>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM grade_change_petitions
            WHERE $1::uuid IS NULL OR instructor_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(instructor.map(uuid))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_petitions", e))?;
        collect(rows, petition_from_row)
    }

    async fn find_major_application_in(
        &mut self,
        student: UserId,
        statuses: &[ApplicationStatus],
    ) -> StoreResult<Option<MajorApplication>> {
        let row = sqlx::query(
            "SELECT * FROM major_applications WHERE student_id = $1 AND status = ANY($2) LIMIT 1",
        )
        .bind(uuid(student))
        .bind(labels(statuses, ApplicationStatus::as_str))
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_major_application_in", e))?;
        row.as_ref().map(major_application_from_row).transpose()
    }

    async fn latest_major_application_in(
        &mut self,
        student: UserId,
        status: ApplicationStatus,
    ) -> StoreResult<Option<MajorApplication>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM major_applications
            WHERE student_id = $1 AND status = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(uuid(student))
        .bind(status.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("latest_major_application_in", e))?;
        row.as_ref().map(major_application_from_row).transpose()
    }

    async fn insert_major_application(&mut self, draft: MajorApplicationDraft) -> StoreResult<MajorApplication> {
        let row = sqlx::query(
            r#"
            INSERT INTO major_applications (
                student_id, current_major, requested_major, school, statement, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(uuid(draft.student_id))
        .bind(&draft.current_major)
        .bind(&draft.requested_major)
        .bind(&draft.school)
        .bind(&draft.statement)
        .bind(ApplicationStatus::Submitted.as_str())
        .bind(draft.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_major_application", e))?;
        let id = returned_id(row)?;
        Ok(draft.into_application(MajorApplicationId::new(id)))
    }

    async fn lock_major_application(&mut self, id: MajorApplicationId) -> StoreResult<Option<MajorApplication>> {
        let row = sqlx::query("SELECT * FROM major_applications WHERE id = $1 FOR UPDATE")
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_major_application", e))?;
        row.as_ref().map(major_application_from_row).transpose()
    }

    async fn save_major_application(&mut self, application: &MajorApplication) -> StoreResult<()> {
        sqlx::query("UPDATE major_applications SET status = $2, admin_comment = $3 WHERE id = $1")
            .bind(application.id.get())
            .bind(application.status.as_str())
            .bind(&application.admin_comment)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("save_major_application", e))?;
        Ok(())
    }

    async fn list_major_applications(&mut self, student: Option<UserId>) -> StoreResult<Vec<MajorApplication>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM major_applications
            WHERE $1::uuid IS NULL OR student_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(student.map(uuid))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_major_applications", e))?;
        collect(rows, major_application_from_row)
    }

    async fn insert_calendar_event(&mut self, draft: CalendarEventDraft) -> StoreResult<CalendarEvent> {
        let row = sqlx::query(
            r#"
            INSERT INTO calendar_events (title, description, start_date, end_date, type, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.event_type.as_str())
        .bind(draft.created_by.map(uuid))
        .bind(draft.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_calendar_event", e))?;
        let id = returned_id(row)?;
        Ok(draft.into_event(CalendarEventId::new(id)))
    }

    async fn list_calendar_events(&mut self) -> StoreResult<Vec<CalendarEvent>> {
        let rows = sqlx::query("SELECT * FROM calendar_events ORDER BY start_date ASC, id ASC")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_calendar_events", e))?;
        collect(rows, calendar_event_from_row)
    }

    async fn insert_notification(&mut self, notification: NewNotification) -> StoreResult<Notification> {
        let row = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, title, message, type, is_read, created_at)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING id
            "#,
        )
        .bind(uuid(notification.user_id))
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.kind)
        .bind(notification.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_notification", e))?;
        let id = returned_id(row)?;
        Ok(notification.into_notification(NotificationId::new(id)))
    }

    async fn list_notifications(&mut self, user: UserId) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(uuid(user))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_notifications", e))?;
        collect(rows, notification_from_row)
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}
