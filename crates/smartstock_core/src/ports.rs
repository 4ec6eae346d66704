//! crates/smartstock_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the backend's HTTP API and the machine-learning services.

use async_trait::async_trait;
use bytes::Bytes;
use crate::domain::{
    AccessToken, AuthGrant, BreedUpload, Classification, ImageUpload, InventorySummary, NewProduct,
    NewUser, PriceRequest, Product, ProductPatch, ProductQuery, ProductType, ShopQuery,
    TrainingJob, TrainingSnapshot, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, backend).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, new_user: &NewUser) -> PortResult<User>;

    async fn login(&self, email: &str, password: &str) -> PortResult<AuthGrant>;

    /// Resolves the user a bearer token belongs to.
    async fn current_user(&self, token: &AccessToken) -> PortResult<User>;
}

#[async_trait]
pub trait ClassifierService: Send + Sync {
    /// Predicts type, breed, baseline price and confidence for an image.
    async fn classify(&self, image: &ImageUpload) -> PortResult<Classification>;
}

#[async_trait]
pub trait PricePredictionService: Send + Sync {
    /// Estimates a price from the image, the confirmed breed and the pet metadata.
    async fn predict_price(&self, token: &AccessToken, request: PriceRequest<'_>) -> PortResult<f64>;
}

#[async_trait]
pub trait ProductCatalogService: Send + Sync {
    // --- Inventory (authenticated) ---
    async fn create_product(&self, token: &AccessToken, product: &NewProduct) -> PortResult<Product>;

    async fn list_products(&self, token: &AccessToken, query: &ProductQuery) -> PortResult<Vec<Product>>;

    async fn update_product(
        &self,
        token: &AccessToken,
        product_id: &str,
        patch: &ProductPatch,
    ) -> PortResult<Product>;

    async fn delete_product(&self, token: &AccessToken, product_id: &str) -> PortResult<()>;

    async fn inventory_summary(&self, token: &AccessToken) -> PortResult<InventorySummary>;

    // --- Public ---
    async fn get_product(&self, product_id: &str) -> PortResult<Product>;

    async fn product_image(&self, product_id: &str) -> PortResult<Bytes>;

    async fn list_published(&self, query: &ShopQuery) -> PortResult<Vec<Product>>;
}

#[async_trait]
pub trait ProductTypeService: Send + Sync {
    async fn list_types(&self) -> PortResult<Vec<ProductType>>;

    async fn create_type(&self, token: &AccessToken, name: &str) -> PortResult<ProductType>;

    async fn rename_type(&self, token: &AccessToken, type_id: &str, name: &str) -> PortResult<ProductType>;

    async fn delete_type(&self, token: &AccessToken, type_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait TrainingService: Send + Sync {
    /// Uploads breed images and starts a background training job.
    async fn submit_breed_images(&self, upload: &BreedUpload) -> PortResult<TrainingJob>;

    async fn training_status(&self) -> PortResult<TrainingSnapshot>;

    async fn list_breeds(&self, product_type: &str) -> PortResult<Vec<String>>;
}
