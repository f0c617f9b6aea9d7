use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};

use crate::server::dto::FormulaSubmission;
use crate::server::response::ApiError;

/// Extractor for formula submissions.
///
/// JSON bodies are read as JSON; anything else is treated as an urlencoded
/// HTML form.
pub struct Submission(pub FormulaSubmission);

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(&req) {
            let Json(submission) = Json::<FormulaSubmission>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
            return Ok(Submission(submission));
        }

        let Form(submission) = Form::<FormulaSubmission>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Submission(submission))
    }
}
