//! services/api/src/web/add_product.rs
//!
//! The add-product screen: shows the draft handed off by the wizard and
//! persists it with the user's final price and quantity.

use crate::error::{checkout_rejection, HandlerError};
use crate::web::{
    middleware::CurrentUser,
    protocol::{AddProductRequest, AddProductView, ProductView},
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use smartstock_core::domain::Product;
use smartstock_core::{AddProductForm, CheckoutError, CheckoutInput};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where the client is sent when there is nothing to add.
pub const UPLOAD_PAGE: &str = "/upload";

async fn open_form(state: &AppState, current: &CurrentUser) -> Result<AddProductForm, CheckoutError> {
    let buffers = state.buffers.lock().await;
    match buffers.get(&current.user.user_id) {
        Some(buffer) => AddProductForm::open(buffer),
        None => Err(CheckoutError::MissingDraft),
    }
}

async fn claim_form(state: &AppState, current: &CurrentUser) -> Result<AddProductForm, CheckoutError> {
    let mut buffers = state.buffers.lock().await;
    match buffers.get_mut(&current.user.user_id) {
        Some(buffer) => AddProductForm::claim(buffer),
        None => Err(CheckoutError::MissingDraft),
    }
}

/// Persists a claimed draft, then consumes it on success or releases the
/// claim on failure.
async fn save_claimed(
    state: Arc<AppState>,
    current: CurrentUser,
    form: AddProductForm,
    input: CheckoutInput,
) -> Result<Product, CheckoutError> {
    let draft_id = form.draft().id;
    let result = form.submit(state.catalog.as_ref(), &current.token, input).await;

    let mut buffers = state.buffers.lock().await;
    let Some(buffer) = buffers.get_mut(&current.user.user_id) else {
        return result;
    };
    match &result {
        Ok(_) => {
            if !buffer.consume(draft_id) {
                info!(%draft_id, "Saved draft was replaced by a newer handoff; keeping the newer one");
            }
        }
        Err(_) => buffer.release(draft_id),
    }
    result
}

/// GET /add-product - The pending draft, or a redirect to the upload page
#[utoipa::path(
    get,
    path = "/add-product",
    responses(
        (status = 200, description = "The draft awaiting confirmation", body = AddProductView),
        (status = 303, description = "No draft; redirect to /upload")
    ),
    security(("bearer" = [])),
    tag = "add-product"
)]
pub async fn get_add_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    match open_form(&state, &current).await {
        Ok(form) => Json(AddProductView::from(&form)).into_response(),
        Err(_) => {
            warn!(user_id = %current.user.user_id, "No product data found, redirecting to upload");
            Redirect::to(UPLOAD_PAGE).into_response()
        }
    }
}

/// POST /add-product - Save the draft as a product
#[utoipa::path(
    post,
    path = "/add-product",
    request_body = AddProductRequest,
    responses(
        (status = 201, description = "Product saved; the draft is consumed", body = ProductView),
        (status = 400, description = "Invalid price or quantity"),
        (status = 404, description = "No draft to save"),
        (status = 409, description = "The draft is already being saved"),
        (status = 502, description = "Backend failure; the draft is kept for a retry")
    ),
    security(("bearer" = [])),
    tag = "add-product"
)]
pub async fn submit_add_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<AddProductRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    // The draft is claimed under the buffer lock; the lock is released
    // before the backend call. The save runs in its own task so the claim is
    // always settled, even if the client goes away.
    let form = claim_form(&state, &current).await.map_err(checkout_rejection)?;
    let product = tokio::spawn(save_claimed(state.clone(), current, form, req.into()))
        .await
        .map_err(|e| {
            error!("Add-product save task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Unable to save product".to_string())
        })?
        .map_err(checkout_rejection)?;

    Ok((StatusCode::CREATED, Json(ProductView::from(product))))
}

/// DELETE /add-product - Discard the pending draft
#[utoipa::path(
    delete,
    path = "/add-product",
    responses((status = 204, description = "Draft discarded")),
    security(("bearer" = [])),
    tag = "add-product"
)]
pub async fn discard_add_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> StatusCode {
    if let Some(buffer) = state.buffers.lock().await.get_mut(&current.user.user_id) {
        buffer.clear();
    }
    StatusCode::NO_CONTENT
}
