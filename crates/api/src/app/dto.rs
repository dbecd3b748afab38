use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use registrar_calendar::SubmitCalendarEvent;
use registrar_documents::{SubmitDocumentRequest, SubmitPayment};
use registrar_infra::StatusUpdate;
use registrar_majors::SubmitMajorApplication;
use registrar_petitions::SubmitPetition;

use crate::app::errors;

// -------------------------
// Body extractor
// -------------------------

/// JSON body that must be a non-empty object.
///
/// Absent, unparsable or empty bodies are all reported as
/// `400 {"message": "Missing request body"}`; a well-formed object whose
/// fields have the wrong JSON types is `400 {"message": "Invalid request body"}`.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(%rejection, "request body rejected");
                errors::json_error(StatusCode::BAD_REQUEST, "Missing request body")
            })?;

        if value.as_object().is_none_or(|fields| fields.is_empty()) {
            return Err(errors::json_error(StatusCode::BAD_REQUEST, "Missing request body"));
        }

        serde_json::from_value(value).map(JsonBody).map_err(|e| {
            tracing::debug!(error = %e, "request body has unexpected field types");
            errors::json_error(StatusCode::BAD_REQUEST, "Invalid request body")
        })
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    pub admin_comment: Option<String>,
}

impl From<StatusUpdateRequest> for StatusUpdate {
    fn from(body: StatusUpdateRequest) -> Self {
        StatusUpdate {
            status: body.status,
            admin_comment: body.admin_comment,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub urgency: Option<String>,
    pub copies: Option<i64>,
    pub amount: Option<i64>,
    pub details: Option<serde_json::Value>,
}

impl From<CreateDocumentRequest> for SubmitDocumentRequest {
    fn from(body: CreateDocumentRequest) -> Self {
        SubmitDocumentRequest {
            doc_type: body.doc_type,
            urgency: body.urgency,
            copies: body.copies,
            amount: body.amount,
            details: body.details,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub request_id: Option<i64>,
    pub amount: Option<i64>,
    pub method: Option<String>,
}

impl From<CreatePaymentRequest> for SubmitPayment {
    fn from(body: CreatePaymentRequest) -> Self {
        SubmitPayment {
            request_id: body.request_id,
            amount: body.amount,
            method: body.method,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetitionRequest {
    pub student_id: Option<String>,
    pub course_code: Option<String>,
    pub current_grade: Option<String>,
    pub new_grade: Option<String>,
    pub justification: Option<String>,
}

impl From<CreatePetitionRequest> for SubmitPetition {
    fn from(body: CreatePetitionRequest) -> Self {
        SubmitPetition {
            student_id: body.student_id,
            course_code: body.course_code,
            current_grade: body.current_grade,
            new_grade: body.new_grade,
            justification: body.justification,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMajorApplicationRequest {
    pub current_major: Option<String>,
    pub requested_major: Option<String>,
    pub school: Option<String>,
    pub statement: Option<String>,
}

impl From<CreateMajorApplicationRequest> for SubmitMajorApplication {
    fn from(body: CreateMajorApplicationRequest) -> Self {
        SubmitMajorApplication {
            current_major: body.current_major,
            requested_major: body.requested_major,
            school: body.school,
            statement: body.statement,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCalendarEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

impl From<CreateCalendarEventRequest> for SubmitCalendarEvent {
    fn from(body: CreateCalendarEventRequest) -> Self {
        SubmitCalendarEvent {
            title: body.title,
            description: body.description,
            start_date: body.start_date,
            end_date: body.end_date,
            event_type: body.event_type,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: Option<bool>,
}
