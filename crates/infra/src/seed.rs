//! Demo accounts and calendar events for development.

use chrono::{DateTime, Duration, Utc};

use registrar_auth::{CredentialHasher, NewUser, Role, UserProfile};
use registrar_calendar::SubmitCalendarEvent;

use crate::engine::{EngineResult, LifecycleEngine};
use crate::store::RegistrarStore;

struct DemoUser {
    username: &'static str,
    password: &'static str,
    role: Role,
    first_name: &'static str,
    last_name: &'static str,
    student_id: Option<&'static str>,
    department: &'static str,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        username: "student",
        password: "student123",
        role: Role::Student,
        first_name: "Ali",
        last_name: "Ahmed",
        student_id: Some("2024-10-0001"),
        department: "Computer Science",
    },
    DemoUser {
        username: "instructor",
        password: "instructor123",
        role: Role::Instructor,
        first_name: "Dr. Sara",
        last_name: "Khan",
        student_id: None,
        department: "Computer Science",
    },
    DemoUser {
        username: "admin",
        password: "admin123",
        role: Role::Admin,
        first_name: "Registrar",
        last_name: "Office",
        student_id: None,
        department: "Registrar Office",
    },
];

/// (title, description, type, start offset in days, end offset in days)
const DEMO_EVENTS: &[(&str, &str, &str, i64, Option<i64>)] = &[
    ("Spring Semester Begins", "First day of classes for the spring term", "event", 30, None),
    ("Midterm Examinations", "Midterm examination period", "exam", 60, Some(67)),
    ("Course Registration Deadline", "Last day to add/drop courses", "deadline", 14, None),
    ("Pakistan Day Holiday", "University closed for Pakistan Day", "holiday", 45, None),
];

/// Populate an empty store. Skipped when an `admin` account already exists.
///
/// Returns whether anything was created.
pub async fn seed_demo_data<S: RegistrarStore>(
    engine: &LifecycleEngine<S>,
    hasher: &dyn CredentialHasher,
    now: DateTime<Utc>,
) -> EngineResult<bool> {
    if engine.find_user_by_username("admin").await?.is_some() {
        tracing::debug!("demo data already present");
        return Ok(false);
    }

    for demo in DEMO_USERS {
        engine
            .provision_user(
                NewUser {
                    username: demo.username.to_string(),
                    password_hash: hasher.hash(demo.password),
                    role: demo.role,
                    active: true,
                    profile: UserProfile {
                        email: Some(format!("{}@lums.edu.pk", demo.username)),
                        first_name: Some(demo.first_name.to_string()),
                        last_name: Some(demo.last_name.to_string()),
                        full_name: Some(format!("{} {}", demo.first_name, demo.last_name)),
                        student_id: demo.student_id.map(str::to_string),
                        department: Some(demo.department.to_string()),
                    },
                },
                now,
            )
            .await?;
    }

    for (title, description, event_type, start, end) in DEMO_EVENTS {
        engine
            .seed_calendar_event(
                SubmitCalendarEvent {
                    title: Some(title.to_string()),
                    description: Some(description.to_string()),
                    start_date: Some((now + Duration::days(*start)).to_rfc3339()),
                    end_date: end.map(|days| (now + Duration::days(days)).to_rfc3339()),
                    event_type: Some(event_type.to_string()),
                },
                now,
            )
            .await?;
    }

    tracing::info!(
        users = DEMO_USERS.len(),
        events = DEMO_EVENTS.len(),
        "demo users and calendar events created"
    );
    Ok(true)
}
