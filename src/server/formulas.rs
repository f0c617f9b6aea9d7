use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::SubmitCommand;
use crate::server::extract::Submission;
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt, SubmitResponse};

pub async fn list_formulas(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let formulas = state
        .store
        .list_formulas()
        .api_err("Failed to list formulas")?;

    Ok::<_, ApiError>(Json(formulas))
}

pub async fn get_formula(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let detail = state
        .store
        .get_formula_detail(id)
        .api_err("Failed to get formula")?
        .or_not_found("Formula not found")?;

    Ok::<_, ApiError>(Json(detail))
}

pub async fn submit_formula(
    State(state): State<Arc<AppState>>,
    Submission(submission): Submission,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let command = submission.into_command().api_err("Invalid submission")?;

    match command {
        SubmitCommand::Create(draft) => {
            let detail = store
                .create_formula(&draft)
                .api_err("Failed to create formula")?;
            tracing::info!(
                "Created formula {} with {} colorants and {} bases",
                detail.formula.id,
                detail.colorants.len(),
                detail.bases.len()
            );
        }
        SubmitCommand::Update { id, update } => {
            store
                .update_formula(id, &update)
                .api_err("Failed to update formula")?;
            tracing::info!("Updated formula {id}");
        }
    }

    Ok::<_, ApiError>(Json(SubmitResponse::ok()))
}

pub async fn delete_formula(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_formula(id)
        .api_err("Failed to delete formula")?;

    if !deleted {
        return Err(ApiError::not_found("Formula not found"));
    }

    tracing::info!("Deleted formula {id}");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
