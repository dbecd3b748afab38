//! Integration tests for the lifecycle engine over the in-memory store.
//!
//! Verifies:
//! - Submissions start in the right status and are readable immediately
//! - Duplicate-pending and already-declared conflicts
//! - Payment settles the request atomically
//! - Role gates and listing visibility
//! - Demo seeding is idempotent

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use registrar_auth::{AuthzError, NewUser, Role, Sha256CredentialHasher, User, UserProfile};
    use registrar_calendar::{EventType, SubmitCalendarEvent};
    use registrar_core::{DocumentRequestId, DomainError, PetitionId};
    use registrar_documents::{
        DocumentStatus, DocumentType, PaymentStatus, SubmitDocumentRequest, SubmitPayment, Urgency,
    };
    use registrar_majors::{ApplicationStatus, SubmitMajorApplication};
    use registrar_petitions::{PetitionStatus, SubmitPetition};

    use crate::engine::{EngineError, LifecycleEngine, StatusUpdate};
    use crate::seed::seed_demo_data;
    use crate::store::InMemoryStore;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()
    }

    fn engine() -> LifecycleEngine<InMemoryStore> {
        LifecycleEngine::new(InMemoryStore::new())
    }

    async fn user(engine: &LifecycleEngine<InMemoryStore>, username: &str, role: Role) -> User {
        engine
            .provision_user(
                NewUser {
                    username: username.to_string(),
                    password_hash: "unused".to_string(),
                    role,
                    active: true,
                    profile: UserProfile::default(),
                },
                t0(),
            )
            .await
            .unwrap()
    }

    fn document(doc_type: DocumentType, urgency: Urgency) -> SubmitDocumentRequest {
        SubmitDocumentRequest {
            doc_type: Some(doc_type.as_str().to_string()),
            urgency: Some(urgency.as_str().to_string()),
            copies: Some(2),
            amount: Some(1000),
            details: None,
        }
    }

    fn petition(course: &str) -> SubmitPetition {
        SubmitPetition {
            student_id: Some("2024-10-0001".to_string()),
            course_code: Some(course.to_string()),
            current_grade: Some("B".to_string()),
            new_grade: Some("A".to_string()),
            justification: Some("Miscounted quiz".to_string()),
        }
    }

    fn major(requested: &str, school: &str) -> SubmitMajorApplication {
        SubmitMajorApplication {
            current_major: None,
            requested_major: Some(requested.to_string()),
            school: Some(school.to_string()),
            statement: None,
        }
    }

    fn status(value: &str, comment: Option<&str>) -> StatusUpdate {
        StatusUpdate {
            status: Some(value.to_string()),
            admin_comment: comment.map(str::to_string),
        }
    }

    fn assert_conflict(err: EngineError, needle: &str) {
        match err {
            EngineError::Domain(DomainError::Conflict(msg)) => {
                assert!(msg.contains(needle), "unexpected message: {msg}")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    fn assert_forbidden(err: EngineError) {
        assert!(
            matches!(err, EngineError::Access(AuthzError::Forbidden { .. })),
            "expected forbidden, got {err:?}"
        );
    }

    #[tokio::test]
    async fn document_request_starts_payment_pending_and_blocks_resubmission() {
        let engine = engine();
        let student = user(&engine, "student", Role::Student).await;

        let created = engine
            .create_document_request(&student, document(DocumentType::Transcript, Urgency::Normal), t0())
            .await
            .unwrap();
        assert_eq!(created.status, DocumentStatus::PaymentPending);
        assert_eq!(created.copies, 2);

        let listed = engine.list_document_requests(&student).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].request, created);
        assert!(listed[0].payment.is_none());

        for doc_type in DocumentType::ALL {
            for urgency in Urgency::ALL {
                let err = engine
                    .create_document_request(&student, document(*doc_type, *urgency), t0())
                    .await
                    .unwrap_err();
                assert_conflict(err, "pending document request");
            }
        }
    }

    #[tokio::test]
    async fn finished_request_allows_a_new_one() {
        let engine = engine();
        let student = user(&engine, "student", Role::Student).await;
        let admin = user(&engine, "admin", Role::Admin).await;

        let first = engine
            .create_document_request(&student, document(DocumentType::Degree, Urgency::Urgent), t0())
            .await
            .unwrap();
        engine
            .update_document_request_status(&admin, first.id, status("rejected", None), t0())
            .await
            .unwrap();

        let second = engine
            .create_document_request(&student, document(DocumentType::Letter, Urgency::Normal), t0())
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn concurrent_submissions_admit_exactly_one() {
        let engine = engine();
        let student = user(&engine, "student", Role::Student).await;

        let (a, b) = tokio::join!(
            engine.create_document_request(&student, document(DocumentType::Transcript, Urgency::Normal), t0()),
            engine.create_document_request(&student, document(DocumentType::Degree, Urgency::Normal), t0()),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(engine.list_document_requests(&student).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn payment_settles_request() {
        let engine = engine();
        let student = user(&engine, "student", Role::Student).await;
        let request = engine
            .create_document_request(&student, document(DocumentType::Transcript, Urgency::Normal), t0())
            .await
            .unwrap();

        let later = t0() + Duration::minutes(5);
        let payment = engine
            .pay(
                &student,
                SubmitPayment {
                    request_id: Some(request.id.get()),
                    amount: Some(1000),
                    method: Some("voucher".to_string()),
                },
                later,
            )
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.transaction_id.as_deref().map(str::len), Some(8));

        let listed = engine.list_document_requests(&student).await.unwrap();
        assert_eq!(listed[0].request.status, DocumentStatus::PendingApproval);
        assert_eq!(listed[0].request.updated_at, later);
        assert_eq!(listed[0].payment.as_ref(), Some(&payment));
    }

    #[tokio::test]
    async fn paying_unknown_request_is_not_found_and_writes_nothing() {
        let engine = engine();
        let student = user(&engine, "student", Role::Student).await;
        let admin = user(&engine, "admin", Role::Admin).await;
        engine
            .create_document_request(&student, document(DocumentType::Transcript, Urgency::Normal), t0())
            .await
            .unwrap();

        let err = engine
            .pay(
                &student,
                SubmitPayment {
                    request_id: Some(404),
                    amount: Some(1000),
                    method: Some("online".to_string()),
                },
                t0(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::NotFound(msg)) if msg == "Document request not found"));

        let all = engine.list_document_requests(&admin).await.unwrap();
        assert!(all.iter().all(|view| view.payment.is_none()));
        assert_eq!(all[0].request.status, DocumentStatus::PaymentPending);
    }

    #[tokio::test]
    async fn payment_racing_a_rejection_keeps_both_writes() {
        let engine = engine();
        let student = user(&engine, "student", Role::Student).await;
        let admin = user(&engine, "admin", Role::Admin).await;
        let request = engine
            .create_document_request(&student, document(DocumentType::Transcript, Urgency::Normal), t0())
            .await
            .unwrap();

        let later = t0() + Duration::minutes(1);
        let (paid, rejected) = tokio::join!(
            engine.pay(
                &student,
                SubmitPayment {
                    request_id: Some(request.id.get()),
                    amount: Some(1000),
                    method: Some("online".to_string()),
                },
                later,
            ),
            engine.update_document_request_status(
                &admin,
                request.id,
                status("rejected", Some("Outstanding library fines")),
                later,
            ),
        );
        let payment = paid.unwrap();
        rejected.unwrap();

        let listed = engine.list_document_requests(&admin).await.unwrap();
        assert_eq!(listed.len(), 1);
        let view = &listed[0];
        assert_eq!(view.request.admin_comment.as_deref(), Some("Outstanding library fines"));
        assert!(matches!(
            view.request.status,
            DocumentStatus::Rejected | DocumentStatus::PendingApproval
        ));
        assert_eq!(view.payment.as_ref(), Some(&payment));
    }

    #[tokio::test]
    async fn concurrent_status_updates_apply_whole() {
        let engine = engine();
        let instructor = user(&engine, "instructor", Role::Instructor).await;
        let admin = user(&engine, "admin", Role::Admin).await;
        let created = engine.create_petition(&instructor, petition("CS101"), t0()).await.unwrap();

        let t1 = t0() + Duration::hours(1);
        let (a, b) = tokio::join!(
            engine.update_petition_status(&admin, created.id, status("approved", Some("Grade sheet verified")), t1),
            engine.update_petition_status(&admin, created.id, status("rejected", Some("Deadline passed")), t1),
        );
        a.unwrap();
        b.unwrap();

        let stored = engine.list_petitions(&admin).await.unwrap().remove(0);
        match stored.status {
            PetitionStatus::Approved => assert_eq!(stored.admin_comment.as_deref(), Some("Grade sheet verified")),
            PetitionStatus::Rejected => assert_eq!(stored.admin_comment.as_deref(), Some("Deadline passed")),
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(engine.list_notifications(&instructor).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn role_gates() {
        let engine = engine();
        let student = user(&engine, "student", Role::Student).await;
        let instructor = user(&engine, "instructor", Role::Instructor).await;
        let admin = user(&engine, "admin", Role::Admin).await;

        assert_forbidden(
            engine
                .create_document_request(&instructor, document(DocumentType::Letter, Urgency::Normal), t0())
                .await
                .unwrap_err(),
        );
        assert_forbidden(engine.create_petition(&student, petition("CS101"), t0()).await.unwrap_err());
        assert_forbidden(
            engine
                .create_major_application(&admin, major("Physics", "SSE"), t0())
                .await
                .unwrap_err(),
        );
        assert_forbidden(
            engine
                .create_calendar_event(&instructor, SubmitCalendarEvent::default(), t0())
                .await
                .unwrap_err(),
        );
        assert_forbidden(
            engine
                .update_petition_status(&instructor, PetitionId::new(1), status("approved", None), t0())
                .await
                .unwrap_err(),
        );

        let mut disabled = admin.clone();
        disabled.active = false;
        let err = engine
            .update_document_request_status(&disabled, DocumentRequestId::new(1), status("approved", None), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Access(AuthzError::AccountDisabled)));
    }

    #[tokio::test]
    async fn petitions_are_scoped_per_instructor() {
        let engine = engine();
        let instructor = user(&engine, "instructor", Role::Instructor).await;
        let other = user(&engine, "instructor2", Role::Instructor).await;
        let student = user(&engine, "student", Role::Student).await;
        let admin = user(&engine, "admin", Role::Admin).await;

        let created = engine.create_petition(&instructor, petition("CS101"), t0()).await.unwrap();
        assert_eq!(created.status, PetitionStatus::Submitted);

        let err = engine
            .create_petition(&instructor, petition("MATH120"), t0())
            .await
            .unwrap_err();
        assert_conflict(err, "pending grade change petition");

        engine.create_petition(&other, petition("CS101"), t0()).await.unwrap();

        assert_eq!(engine.list_petitions(&admin).await.unwrap().len(), 2);
        assert_eq!(engine.list_petitions(&instructor).await.unwrap(), vec![created]);
        assert!(engine.list_petitions(&student).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_updates_merge_comments_and_notify_owner() {
        let engine = engine();
        let instructor = user(&engine, "instructor", Role::Instructor).await;
        let admin = user(&engine, "admin", Role::Admin).await;
        let created = engine.create_petition(&instructor, petition("CS101"), t0()).await.unwrap();

        let t1 = t0() + Duration::hours(1);
        let updated = engine
            .update_petition_status(&admin, created.id, status("pending_approval", Some("Checking records")), t1)
            .await
            .unwrap();
        assert_eq!(updated.updated_at, t1);

        let t2 = t1 + Duration::hours(1);
        let updated = engine
            .update_petition_status(&admin, created.id, status("approved", None), t2)
            .await
            .unwrap();
        assert_eq!(updated.status, PetitionStatus::Approved);
        assert_eq!(updated.admin_comment.as_deref(), Some("Checking records"));

        let err = engine
            .update_petition_status(&admin, created.id, status("submitted", None), t2)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::Validation(msg)) if msg == "Invalid status"));

        let err = engine
            .update_petition_status(&admin, PetitionId::new(99), status("approved", None), t2)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::NotFound(_))));

        let notifications = engine.list_notifications(&instructor).await.unwrap();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].created_at, t2);
        assert!(notifications.iter().all(|n| !n.read));
        assert!(engine.list_notifications(&admin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn major_application_already_declared() {
        let engine = engine();
        let student = user(&engine, "student", Role::Student).await;
        let admin = user(&engine, "admin", Role::Admin).await;

        let first = engine
            .create_major_application(&student, major("Computer Science", "SSE"), t0())
            .await
            .unwrap();
        assert_eq!(first.current_major.as_deref(), Some("Undeclared"));

        let err = engine
            .create_major_application(&student, major("Physics", "SSE"), t0())
            .await
            .unwrap_err();
        assert_conflict(err, "pending major application");

        let approved = engine
            .update_major_application_status(&admin, first.id, status("approved", Some("Welcome")), t0())
            .await
            .unwrap();
        assert_eq!(approved.status, ApplicationStatus::Approved);

        let later = t0() + Duration::days(1);
        let err = engine
            .create_major_application(&student, major("Computer Science", "SSE"), later)
            .await
            .unwrap_err();
        assert_conflict(err, "already declared");

        let second = engine
            .create_major_application(&student, major("Economics", "MGSHSS"), later)
            .await
            .unwrap();
        assert_eq!(second.current_major.as_deref(), Some("Computer Science"));

        let mine = engine.list_major_applications(&student).await.unwrap();
        assert_eq!(mine.iter().map(|a| a.id).collect::<Vec<_>>(), vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn listing_visibility() {
        let engine = engine();
        let alice = user(&engine, "alice", Role::Student).await;
        let bob = user(&engine, "bob", Role::Student).await;
        let instructor = user(&engine, "instructor", Role::Instructor).await;
        let admin = user(&engine, "admin", Role::Admin).await;

        engine
            .create_document_request(&alice, document(DocumentType::Transcript, Urgency::Normal), t0())
            .await
            .unwrap();
        engine
            .create_document_request(&bob, document(DocumentType::Degree, Urgency::Normal), t0() + Duration::seconds(1))
            .await
            .unwrap();

        let all = engine.list_document_requests(&admin).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].request.user_id, bob.id);

        let mine = engine.list_document_requests(&alice).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].request.user_id, alice.id);

        assert!(engine.list_document_requests(&instructor).await.unwrap().is_empty());
        assert!(engine.list_major_applications(&instructor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_toggles_activation() {
        let engine = engine();
        let student = user(&engine, "student", Role::Student).await;
        let admin = user(&engine, "admin", Role::Admin).await;

        let updated = engine.set_user_active(&admin, student.id, false, t0()).await.unwrap();
        assert!(!updated.active);
        assert!(!engine.find_user(student.id).await.unwrap().unwrap().active);

        let err = engine.set_user_active(&admin, admin.id, false, t0()).await.unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::Validation(_))));

        assert_forbidden(engine.set_user_active(&student, admin.id, false, t0()).await.unwrap_err());
    }

    #[tokio::test]
    async fn provisioning_rejects_duplicate_username() {
        let engine = engine();
        user(&engine, "student", Role::Student).await;
        let err = engine
            .provision_user(
                NewUser {
                    username: "student".to_string(),
                    password_hash: String::new(),
                    role: Role::Admin,
                    active: true,
                    profile: UserProfile::default(),
                },
                t0(),
            )
            .await
            .unwrap_err();
        assert_conflict(err, "already exists");
    }

    #[tokio::test]
    async fn seeding_is_idempotent_and_calendar_is_start_ordered() {
        let engine = engine();
        let hasher = Sha256CredentialHasher;

        assert!(seed_demo_data(&engine, &hasher, t0()).await.unwrap());
        assert!(!seed_demo_data(&engine, &hasher, t0()).await.unwrap());

        let admin = engine.find_user_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        let student = engine.find_user_by_username("student").await.unwrap().unwrap();
        assert_eq!(student.profile.student_id.as_deref(), Some("2024-10-0001"));

        let events = engine.list_calendar_events(&student).await.unwrap();
        let types: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![EventType::Deadline, EventType::Event, EventType::Holiday, EventType::Exam]
        );
        assert!(events.iter().all(|e| e.created_by.is_none()));
        assert_eq!(events[3].end_date, Some(t0() + Duration::days(67)));
    }

    #[tokio::test]
    async fn admin_creates_calendar_event() {
        let engine = engine();
        let admin = user(&engine, "admin", Role::Admin).await;

        let event = engine
            .create_calendar_event(
                &admin,
                SubmitCalendarEvent {
                    title: Some("Convocation".to_string()),
                    description: None,
                    start_date: Some("2025-06-01T10:00:00Z".to_string()),
                    end_date: None,
                    event_type: Some("event".to_string()),
                },
                t0(),
            )
            .await
            .unwrap();
        assert_eq!(event.created_by, Some(admin.id));

        let err = engine
            .create_calendar_event(
                &admin,
                SubmitCalendarEvent {
                    title: Some("Convocation".to_string()),
                    start_date: Some("June first".to_string()),
                    event_type: Some("event".to_string()),
                    ..Default::default()
                },
                t0(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::Validation(msg)) if msg == "Invalid startDate format"));
    }
}
