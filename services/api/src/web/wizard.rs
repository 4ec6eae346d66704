//! services/api/src/web/wizard.rs
//!
//! REST handlers driving the upload wizard. Each wizard lives in the
//! registry under its own lock and belongs to the user who created it.

use crate::error::{wizard_rejection, HandlerError};
use crate::web::{
    middleware::CurrentUser,
    protocol::{ClassificationEdit, ContinueResponse, MetadataPayload, WizardOptions, WizardView},
    state::{AppState, WizardSession},
};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use smartstock_core::domain::ImageUpload;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

async fn session(
    state: &AppState,
    wizard_id: Uuid,
    current: &CurrentUser,
) -> Result<Arc<WizardSession>, HandlerError> {
    state.wizards.get(wizard_id, &current.user.user_id).await
}

//=========================================================================================
// Lifecycle
//=========================================================================================

/// POST /wizards - Start a new upload wizard
#[utoipa::path(
    post,
    path = "/wizards",
    responses(
        (status = 201, description = "Wizard created in the upload step", body = WizardView),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn create_wizard_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> impl IntoResponse {
    let (wizard_id, session) = state.wizards.create(&current.user.user_id).await;
    let view = WizardView::new(wizard_id, &*session.wizard.lock().await);
    (StatusCode::CREATED, Json(view))
}

/// GET /wizards/options - Choices and limits for the metadata form
#[utoipa::path(
    get,
    path = "/wizards/options",
    responses((status = 200, description = "Metadata form options", body = WizardOptions)),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn wizard_options_handler(State(state): State<Arc<AppState>>) -> Json<WizardOptions> {
    Json(WizardOptions::from(&state.config.countries))
}

/// GET /wizards/{wizard_id} - The current step and its data
#[utoipa::path(
    get,
    path = "/wizards/{wizard_id}",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    responses(
        (status = 200, description = "Current wizard state", body = WizardView),
        (status = 404, description = "Unknown wizard")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn get_wizard_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
) -> Result<Json<WizardView>, HandlerError> {
    let session = session(&state, wizard_id, &current).await?;
    let wizard = session.wizard.lock().await;
    Ok(Json(WizardView::new(wizard_id, &wizard)))
}

/// DELETE /wizards/{wizard_id} - Abandon a wizard and drop everything it holds
#[utoipa::path(
    delete,
    path = "/wizards/{wizard_id}",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    responses(
        (status = 204, description = "Wizard abandoned"),
        (status = 404, description = "Unknown wizard")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn delete_wizard_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    state.wizards.remove(wizard_id, &current.user.user_id).await?;
    info!(%wizard_id, "Wizard abandoned");
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Upload
//=========================================================================================

/// POST /wizards/{wizard_id}/image - Select the pet image
///
/// Accepts a multipart/form-data request with a `file` part.
#[utoipa::path(
    post,
    path = "/wizards/{wizard_id}/image",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    request_body(content_type = "multipart/form-data", description = "The image, in a part named `file`."),
    responses(
        (status = 200, description = "Image held, wizard back in the upload step", body = WizardView),
        (status = 400, description = "No file part"),
        (status = 415, description = "Not an image")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn select_image_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<WizardView>, HandlerError> {
    let session = session(&state, wizard_id, &current).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read multipart data: {}", e)))?
    {
        if !matches!(field.name(), Some("file") | Some("image")) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read file bytes: {}", e)))?;
        upload = Some(ImageUpload::new(file_name, content_type, bytes));
    }
    let upload = upload.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "Multipart form must include a file".to_string(),
        )
    })?;

    let mut wizard = session.wizard.lock().await;
    wizard.select_image(upload).map_err(wizard_rejection)?;
    Ok(Json(WizardView::new(wizard_id, &wizard)))
}

/// GET /wizards/{wizard_id}/preview - The held image bytes
#[utoipa::path(
    get,
    path = "/wizards/{wizard_id}/preview",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    responses(
        (status = 200, description = "The selected image", content_type = "image/*"),
        (status = 404, description = "No image held")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn preview_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = session(&state, wizard_id, &current).await?;
    let wizard = session.wizard.lock().await;
    let image = wizard
        .image()
        .ok_or((StatusCode::NOT_FOUND, "No image selected".to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, image.upload.content_type.clone())],
        image.upload.bytes.clone(),
    ))
}

//=========================================================================================
// Classification
//=========================================================================================

/// POST /wizards/{wizard_id}/classify - Classify the held image
#[utoipa::path(
    post,
    path = "/wizards/{wizard_id}/classify",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    responses(
        (status = 200, description = "Classified, now in the classify step", body = WizardView),
        (status = 400, description = "No image selected"),
        (status = 409, description = "Not in the upload step"),
        (status = 502, description = "Classifier unavailable; the wizard stays in upload")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn classify_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
) -> Result<Json<WizardView>, HandlerError> {
    let session = session(&state, wizard_id, &current).await?;
    let mut wizard = session.wizard.lock().await;
    wizard
        .classify(state.classifier.as_ref())
        .await
        .map_err(wizard_rejection)?;
    Ok(Json(WizardView::new(wizard_id, &wizard)))
}

/// PATCH /wizards/{wizard_id}/classification - Edit the suggested type or breed
#[utoipa::path(
    patch,
    path = "/wizards/{wizard_id}/classification",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    request_body = ClassificationEdit,
    responses(
        (status = 200, description = "Edits applied", body = WizardView),
        (status = 409, description = "Not in the classify step")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn edit_classification_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
    Json(edit): Json<ClassificationEdit>,
) -> Result<Json<WizardView>, HandlerError> {
    let session = session(&state, wizard_id, &current).await?;
    let mut wizard = session.wizard.lock().await;
    wizard
        .edit_classification(edit.product_type, edit.breed)
        .map_err(wizard_rejection)?;
    Ok(Json(WizardView::new(wizard_id, &wizard)))
}

/// POST /wizards/{wizard_id}/confirm - Accept the type and breed
#[utoipa::path(
    post,
    path = "/wizards/{wizard_id}/confirm",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    responses(
        (status = 200, description = "Now in the metadata step", body = WizardView),
        (status = 400, description = "Type or breed is blank"),
        (status = 409, description = "Not in the classify step")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn confirm_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
) -> Result<Json<WizardView>, HandlerError> {
    let session = session(&state, wizard_id, &current).await?;
    let mut wizard = session.wizard.lock().await;
    wizard.confirm_classification().map_err(wizard_rejection)?;
    Ok(Json(WizardView::new(wizard_id, &wizard)))
}

//=========================================================================================
// Metadata and Price
//=========================================================================================

/// POST /wizards/{wizard_id}/price - Submit metadata and predict a price
#[utoipa::path(
    post,
    path = "/wizards/{wizard_id}/price",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    request_body = MetadataPayload,
    responses(
        (status = 200, description = "Now in the review step; the quote may be a fallback", body = WizardView),
        (status = 400, description = "Invalid metadata; the wizard stays in metadata"),
        (status = 409, description = "Not in the metadata step")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn predict_price_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
    Json(payload): Json<MetadataPayload>,
) -> Result<Json<WizardView>, HandlerError> {
    let session = session(&state, wizard_id, &current).await?;
    let mut wizard = session.wizard.lock().await;
    wizard
        .predict_price(
            state.pricer.as_ref(),
            &current.token,
            payload.into(),
            &state.config.countries,
        )
        .await
        .map_err(wizard_rejection)?;
    Ok(Json(WizardView::new(wizard_id, &wizard)))
}

/// POST /wizards/{wizard_id}/back - Go back one step, keeping entered values
#[utoipa::path(
    post,
    path = "/wizards/{wizard_id}/back",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    responses(
        (status = 200, description = "Moved back", body = WizardView),
        (status = 409, description = "No previous step")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn back_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
) -> Result<Json<WizardView>, HandlerError> {
    let session = session(&state, wizard_id, &current).await?;
    let mut wizard = session.wizard.lock().await;
    wizard.back().map_err(wizard_rejection)?;
    Ok(Json(WizardView::new(wizard_id, &wizard)))
}

//=========================================================================================
// Handoff
//=========================================================================================

/// POST /wizards/{wizard_id}/continue - Hand the draft to the add-product screen
#[utoipa::path(
    post,
    path = "/wizards/{wizard_id}/continue",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    responses(
        (status = 200, description = "Draft written to the transfer buffer", body = ContinueResponse),
        (status = 409, description = "Not in the review step")
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn continue_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
) -> Result<Json<ContinueResponse>, HandlerError> {
    let session = session(&state, wizard_id, &current).await?;
    let mut wizard = session.wizard.lock().await;

    let draft_id = {
        let mut buffers = state.buffers.lock().await;
        let buffer = buffers.entry(current.user.user_id.clone()).or_default();
        wizard.continue_to_checkout(buffer).map_err(|e| {
            error!(%wizard_id, "Failed to hand off the draft: {}", e);
            wizard_rejection(e)
        })?
    };
    drop(wizard);

    // The buffer owns the draft now, so the submitted wizard is released.
    if state.wizards.remove(wizard_id, &current.user.user_id).await.is_err() {
        warn!(%wizard_id, "Submitted wizard was already removed");
    }
    info!(%wizard_id, %draft_id, "Wizard submitted");
    Ok(Json(ContinueResponse {
        draft_id,
        next: "/add-product".to_string(),
    }))
}

/// POST /wizards/{wizard_id}/reset - Start over with an empty upload step
#[utoipa::path(
    post,
    path = "/wizards/{wizard_id}/reset",
    params(("wizard_id" = Uuid, Path, description = "Wizard id")),
    responses((status = 200, description = "Wizard reset", body = WizardView)),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(wizard_id): Path<Uuid>,
) -> Result<Json<WizardView>, HandlerError> {
    let session = session(&state, wizard_id, &current).await?;
    let mut wizard = session.wizard.lock().await;
    wizard.reset();
    Ok(Json(WizardView::new(wizard_id, &wizard)))
}
