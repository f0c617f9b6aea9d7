use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};

use crate::server::AppState;
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::server::views;

/// An [`ApiError`] rendered as an HTML page instead of JSON.
pub struct PageError(ApiError);

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let ApiError { status, message } = self.0;
        (status, Html(views::error_page(status.as_u16(), &message))).into_response()
    }
}

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    let formulas = state
        .store
        .list_formulas()
        .api_err("Failed to list formulas")?;

    Ok(Html(views::index_page(&formulas)))
}

pub async fn formula_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Html<String>, PageError> {
    let detail = state
        .store
        .get_formula_detail(id)
        .api_err("Failed to get formula")?
        .or_not_found("Formula not found")?;

    Ok(Html(views::detail_page(&detail)))
}

pub async fn add_form() -> Html<String> {
    Html(views::form_page(None))
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Html<String>, PageError> {
    let detail = state
        .store
        .get_formula_detail(id)
        .api_err("Failed to get formula")?
        .or_not_found("Formula not found")?;

    Ok(Html(views::form_page(Some(&detail))))
}
