pub mod auth;
pub mod backend;
pub mod catalog;
pub mod ml;
pub mod product_types;
pub mod training;

pub use auth::HttpAuthAdapter;
pub use backend::{BackendClient, BackendSetupError};
pub use catalog::HttpCatalogAdapter;
pub use ml::{HttpClassifierAdapter, HttpPricingAdapter};
pub use product_types::HttpProductTypeAdapter;
pub use training::HttpTrainingAdapter;
