//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the inventory, shop, stats and product-type
//! endpoints, and the master definition for the OpenAPI specification.

use crate::error::{port_rejection, HandlerError};
use crate::web::{
    add_product, auth,
    middleware::CurrentUser,
    protocol::*,
    state::AppState,
    training, wizard,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use smartstock_core::domain::{ProductPatch, ProductQuery, ShopQuery};
use smartstock_core::inventory::distinct_types;
use smartstock_core::{InventoryFilter, ModelStats};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// How many products the stats view looks at.
const STATS_SAMPLE_SIZE: u32 = 1000;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::me_handler,
        wizard::create_wizard_handler,
        wizard::wizard_options_handler,
        wizard::get_wizard_handler,
        wizard::delete_wizard_handler,
        wizard::select_image_handler,
        wizard::preview_handler,
        wizard::classify_handler,
        wizard::edit_classification_handler,
        wizard::confirm_handler,
        wizard::predict_price_handler,
        wizard::back_handler,
        wizard::continue_handler,
        wizard::reset_handler,
        add_product::get_add_product_handler,
        add_product::submit_add_product_handler,
        add_product::discard_add_product_handler,
        list_products_handler,
        get_product_handler,
        update_product_handler,
        delete_product_handler,
        publish_product_handler,
        product_image_handler,
        shop_handler,
        model_stats_handler,
        summary_handler,
        list_product_types_handler,
        create_product_type_handler,
        rename_product_type_handler,
        delete_product_type_handler,
        training::start_training_handler,
        training::training_status_handler,
        training::stop_monitor_handler,
        training::list_breeds_handler,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, LoginResponse, UserView,
            WizardView, ImageView, ClassificationView, MetadataPayload, QuoteView,
            ClassificationEdit, ContinueResponse, WizardOptions, HealthStatusOption,
            AddProductView, AddProductRequest,
            ProductView, ProductListResponse, ProductUpdateRequest, PublishRequest,
            SummaryView, ModelStatsView, ModelReport,
            ProductTypeView, ProductTypeRequest,
            TrainingJobView, TrainingStatusView, BreedsView,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "SmartStock API", description = "Gateway for the AI-assisted pet inventory.")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

//=========================================================================================
// Inventory
//=========================================================================================

/// GET /products - The dashboard list, filtered by search, type and price
///
/// Search and type go to the backend; the price range is applied here on the
/// effective price.
#[utoipa::path(
    get,
    path = "/products",
    params(ProductListParams),
    responses((status = 200, description = "Matching products", body = ProductListResponse)),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn list_products_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<ProductListResponse>, HandlerError> {
    let query = ProductQuery {
        search: params.search.clone(),
        product_type: params.product_type.clone(),
        skip: params.skip.unwrap_or(0),
        limit: params.limit,
    };
    let products = state
        .catalog
        .list_products(&current.token, &query)
        .await
        .map_err(|e| {
            error!("Failed to list products: {}", e);
            port_rejection(e)
        })?;

    let types = distinct_types(&products);
    let filter = InventoryFilter {
        search: params.search,
        product_type: params.product_type,
        min_price: params.min_price,
        max_price: params.max_price,
    };
    Ok(Json(ProductListResponse {
        products: filter.apply(products).into_iter().map(ProductView::from).collect(),
        types,
    }))
}

/// GET /products/{product_id}
#[utoipa::path(
    get,
    path = "/products/{product_id}",
    params(("product_id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = ProductView),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn get_product_handler(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductView>, HandlerError> {
    let product = state.catalog.get_product(&product_id).await.map_err(port_rejection)?;
    Ok(Json(product.into()))
}

/// PUT /products/{product_id} - Edit name, type, price or quantity
#[utoipa::path(
    put,
    path = "/products/{product_id}",
    params(("product_id" = String, Path, description = "Product id")),
    request_body = ProductUpdateRequest,
    responses(
        (status = 200, description = "Updated product", body = ProductView),
        (status = 400, description = "Invalid price"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn update_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(product_id): Path<String>,
    Json(req): Json<ProductUpdateRequest>,
) -> Result<Json<ProductView>, HandlerError> {
    if req
        .price_modified
        .is_some_and(|p| !p.is_finite() || p <= 0.0)
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "Please enter a valid price greater than 0".to_string(),
        ));
    }
    let patch = ProductPatch::from(req);
    let product = state
        .catalog
        .update_product(&current.token, &product_id, &patch)
        .await
        .map_err(port_rejection)?;
    info!(%product_id, "Product updated");
    Ok(Json(product.into()))
}

/// DELETE /products/{product_id} - Admin only on the backend side
#[utoipa::path(
    delete,
    path = "/products/{product_id}",
    params(("product_id" = String, Path, description = "Product id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn delete_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(product_id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    state
        .catalog
        .delete_product(&current.token, &product_id)
        .await
        .map_err(port_rejection)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /products/{product_id}/publish - Show or hide a product in the shop
#[utoipa::path(
    put,
    path = "/products/{product_id}/publish",
    params(("product_id" = String, Path, description = "Product id")),
    request_body = PublishRequest,
    responses((status = 200, description = "Updated product", body = ProductView)),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn publish_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(product_id): Path<String>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<ProductView>, HandlerError> {
    let patch = ProductPatch {
        published: Some(req.published),
        ..ProductPatch::default()
    };
    let product = state
        .catalog
        .update_product(&current.token, &product_id, &patch)
        .await
        .map_err(port_rejection)?;
    info!(%product_id, published = req.published, "Product visibility changed");
    Ok(Json(product.into()))
}

/// GET /products/{product_id}/image
#[utoipa::path(
    get,
    path = "/products/{product_id}/image",
    params(("product_id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "JPEG image", content_type = "image/jpeg"),
        (status = 404, description = "Image not found")
    ),
    tag = "products"
)]
pub async fn product_image_handler(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let bytes = state
        .catalog
        .product_image(&product_id)
        .await
        .map_err(port_rejection)?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

/// GET /shop - Published products, public
#[utoipa::path(
    get,
    path = "/shop",
    params(ShopParams),
    responses((status = 200, description = "Published products", body = [ProductView])),
    tag = "products"
)]
pub async fn shop_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ShopParams>,
) -> Result<Json<Vec<ProductView>>, HandlerError> {
    let query = ShopQuery {
        product_type: params.product_type,
        breed: params.breed,
        min_price: params.min_price,
        max_price: params.max_price,
        skip: params.skip.unwrap_or(0),
        limit: params.limit,
    };
    let products = state.catalog.list_published(&query).await.map_err(|e| {
        error!("Failed to load the shop: {}", e);
        port_rejection(e)
    })?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

//=========================================================================================
// Stats
//=========================================================================================

/// GET /stats/model - Prediction accuracy, override rate and price error
#[utoipa::path(
    get,
    path = "/stats/model",
    responses((status = 200, description = "Model statistics", body = ModelReport)),
    security(("bearer" = [])),
    tag = "stats"
)]
pub async fn model_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ModelReport>, HandlerError> {
    let query = ProductQuery {
        limit: Some(STATS_SAMPLE_SIZE),
        ..ProductQuery::default()
    };
    let (products, summary) = futures::try_join!(
        state.catalog.list_products(&current.token, &query),
        state.catalog.inventory_summary(&current.token),
    )
    .map_err(|e| {
        error!("Failed to load stats: {}", e);
        port_rejection(e)
    })?;

    Ok(Json(ModelReport {
        model: ModelStats::compute(&products).into(),
        inventory: summary.into(),
    }))
}

/// GET /stats/summary - Inventory totals
#[utoipa::path(
    get,
    path = "/stats/summary",
    responses((status = 200, description = "Inventory totals", body = SummaryView)),
    security(("bearer" = [])),
    tag = "stats"
)]
pub async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<SummaryView>, HandlerError> {
    let summary = state
        .catalog
        .inventory_summary(&current.token)
        .await
        .map_err(port_rejection)?;
    Ok(Json(summary.into()))
}

//=========================================================================================
// Product Types
//=========================================================================================

/// GET /product-types - Public list for dropdowns
#[utoipa::path(
    get,
    path = "/product-types",
    responses((status = 200, description = "All product types", body = [ProductTypeView])),
    tag = "product-types"
)]
pub async fn list_product_types_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductTypeView>>, HandlerError> {
    let types = state.product_types.list_types().await.map_err(port_rejection)?;
    Ok(Json(types.into_iter().map(ProductTypeView::from).collect()))
}

fn type_name(req: &ProductTypeRequest) -> Result<&str, HandlerError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Type name is required".to_string()));
    }
    Ok(name)
}

/// POST /product-types - Admin only
#[utoipa::path(
    post,
    path = "/product-types",
    request_body = ProductTypeRequest,
    responses(
        (status = 201, description = "Created", body = ProductTypeView),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer" = [])),
    tag = "product-types"
)]
pub async fn create_product_type_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ProductTypeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let created = state
        .product_types
        .create_type(&current.token, type_name(&req)?)
        .await
        .map_err(port_rejection)?;
    Ok((StatusCode::CREATED, Json(ProductTypeView::from(created))))
}

/// PUT /product-types/{type_id} - Admin only
#[utoipa::path(
    put,
    path = "/product-types/{type_id}",
    params(("type_id" = String, Path, description = "Type id")),
    request_body = ProductTypeRequest,
    responses(
        (status = 200, description = "Renamed", body = ProductTypeView),
        (status = 404, description = "Type not found")
    ),
    security(("bearer" = [])),
    tag = "product-types"
)]
pub async fn rename_product_type_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(type_id): Path<String>,
    Json(req): Json<ProductTypeRequest>,
) -> Result<Json<ProductTypeView>, HandlerError> {
    let renamed = state
        .product_types
        .rename_type(&current.token, &type_id, type_name(&req)?)
        .await
        .map_err(port_rejection)?;
    Ok(Json(renamed.into()))
}

/// DELETE /product-types/{type_id} - Admin only
#[utoipa::path(
    delete,
    path = "/product-types/{type_id}",
    params(("type_id" = String, Path, description = "Type id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Type not found")
    ),
    security(("bearer" = [])),
    tag = "product-types"
)]
pub async fn delete_product_type_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(type_id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    state
        .product_types
        .delete_type(&current.token, &type_id)
        .await
        .map_err(port_rejection)?;
    Ok(StatusCode::NO_CONTENT)
}
