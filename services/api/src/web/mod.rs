pub mod add_product;
pub mod auth;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod training;
pub mod training_task;
pub mod wizard;

pub use middleware::{require_admin, require_auth};

use crate::error::ApiError;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete gateway router: public routes, bearer-protected
/// routes, admin routes and the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = HeaderValue::from_str(&app_state.config.allowed_origin).map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            app_state.config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/shop", get(rest::shop_handler))
        .route("/shop/{product_id}", get(rest::get_product_handler))
        .route("/shop/{product_id}/image", get(rest::product_image_handler));

    // Admin routes (auth + admin role)
    let admin_routes = Router::new()
        .route("/admin/train", post(training::start_training_handler))
        .route("/admin/train/status", get(training::training_status_handler))
        .route(
            "/admin/train/monitor",
            delete(training::stop_monitor_handler),
        )
        .route(
            "/admin/train/breeds/{product_type}",
            get(training::list_breeds_handler),
        )
        .route_layer(axum_middleware::from_fn(require_admin));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/wizards", post(wizard::create_wizard_handler))
        .route("/wizards/options", get(wizard::wizard_options_handler))
        .route(
            "/wizards/{wizard_id}",
            get(wizard::get_wizard_handler).delete(wizard::delete_wizard_handler),
        )
        .route("/wizards/{wizard_id}/image", post(wizard::select_image_handler))
        .route("/wizards/{wizard_id}/preview", get(wizard::preview_handler))
        .route("/wizards/{wizard_id}/classify", post(wizard::classify_handler))
        .route(
            "/wizards/{wizard_id}/classification",
            patch(wizard::edit_classification_handler),
        )
        .route("/wizards/{wizard_id}/confirm", post(wizard::confirm_handler))
        .route("/wizards/{wizard_id}/price", post(wizard::predict_price_handler))
        .route("/wizards/{wizard_id}/back", post(wizard::back_handler))
        .route("/wizards/{wizard_id}/continue", post(wizard::continue_handler))
        .route("/wizards/{wizard_id}/reset", post(wizard::reset_handler))
        .route(
            "/add-product",
            get(add_product::get_add_product_handler)
                .post(add_product::submit_add_product_handler)
                .delete(add_product::discard_add_product_handler),
        )
        .route("/products", get(rest::list_products_handler))
        .route(
            "/products/{product_id}",
            get(rest::get_product_handler)
                .put(rest::update_product_handler)
                .delete(rest::delete_product_handler),
        )
        .route("/products/{product_id}/publish", put(rest::publish_product_handler))
        .route("/products/{product_id}/image", get(rest::product_image_handler))
        .route("/stats/model", get(rest::model_stats_handler))
        .route("/stats/summary", get(rest::summary_handler))
        .route(
            "/product-types",
            get(rest::list_product_types_handler).post(rest::create_product_type_handler),
        )
        .route(
            "/product-types/{type_id}",
            put(rest::rename_product_type_handler).delete(rest::delete_product_type_handler),
        )
        .merge(admin_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let max_upload_bytes = app_state.config.max_upload_bytes;
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
