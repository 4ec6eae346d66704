//! services/api/src/adapters/catalog.rs
//!
//! This module contains the adapter for the backend's product endpoints.
//! It implements the `ProductCatalogService` port from the `core` crate.
//!
//! Products are keyed by their `product_id`; the backend's document `_id`
//! is carried along for display only.

use super::backend::{image_part, parse_timestamp, BackendClient};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart::Form, Method};
use serde::{Deserialize, Serialize};
use smartstock_core::domain::{
    AccessToken, HealthStatus, InventorySummary, NewProduct, Product, ProductPatch, ProductQuery,
    ShopQuery,
};
use smartstock_core::ports::{PortError, PortResult, ProductCatalogService};
use tracing::{info, warn};

/// Page size used when the caller does not set one.
const DEFAULT_PAGE_SIZE: u32 = 100;

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ProductRecord {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    product_id: String,
    product_name: String,
    product_type: String,
    price_predicted: f64,
    #[serde(default)]
    price_modified: Option<f64>,
    #[serde(default)]
    quantity: i64,
    #[serde(default)]
    published: bool,
    #[serde(default)]
    has_image: bool,
    date_added: String,
    #[serde(default)]
    age_months: Option<i64>,
    #[serde(default)]
    weight_kg: Option<f64>,
    #[serde(default)]
    health_status: Option<u8>,
    #[serde(default)]
    vaccinated: Option<bool>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    predicted_breed: Option<String>,
    #[serde(default)]
    prediction_confidence: Option<f64>,
}

impl ProductRecord {
    pub(crate) fn to_domain(self) -> PortResult<Product> {
        Ok(Product {
            date_added: parse_timestamp(&self.date_added)?,
            quantity: u32::try_from(self.quantity).unwrap_or(0),
            age_months: self.age_months.and_then(|a| u32::try_from(a).ok()),
            // Older records may carry codes outside the known range.
            health_status: self.health_status.and_then(|c| HealthStatus::try_from(c).ok()),
            id: self.id,
            product_id: self.product_id,
            product_name: self.product_name,
            product_type: self.product_type,
            price_predicted: self.price_predicted,
            price_modified: self.price_modified,
            published: self.published,
            has_image: self.has_image,
            weight_kg: self.weight_kg,
            vaccinated: self.vaccinated,
            country: self.country,
            predicted_breed: self.predicted_breed,
            prediction_confidence: self.prediction_confidence,
        })
    }
}

fn to_products(records: Vec<ProductRecord>) -> PortResult<Vec<Product>> {
    records.into_iter().map(ProductRecord::to_domain).collect()
}

#[derive(Debug, Default, Serialize)]
struct ProductPatchRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    product_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price_modified: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published: Option<bool>,
}

impl<'a> From<&'a ProductPatch> for ProductPatchRecord<'a> {
    fn from(patch: &'a ProductPatch) -> Self {
        Self {
            product_name: patch.product_name.as_deref(),
            product_type: patch.product_type.as_deref(),
            price_modified: patch.price_modified,
            quantity: patch.quantity,
            published: patch.published,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListParams<'a> {
    skip: u32,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    product_type: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ShopParams<'a> {
    skip: u32,
    limit: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    product_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    breed: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SummaryRecord {
    #[serde(default)]
    total_products: u64,
    #[serde(default)]
    total_items: u64,
    #[serde(default)]
    total_value: f64,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct HttpCatalogAdapter {
    backend: BackendClient,
}

impl HttpCatalogAdapter {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

/// Builds the multipart create payload. Optional fields are only sent when set.
fn create_form(product: &NewProduct) -> PortResult<Form> {
    let mut form = Form::new()
        .text("product_name", product.product_name.clone())
        .text("product_type", product.product_type.clone())
        .text("price_predicted", product.price_predicted.to_string())
        .text("quantity", product.quantity.to_string());

    let image = product
        .image
        .as_ref()
        .ok_or_else(|| PortError::Unexpected("A product image is required".to_string()))?;
    form = form.part("image", image_part(image)?);

    if let Some(price) = product.price_modified {
        form = form.text("price_modified", price.to_string());
    }
    if let Some(metadata) = &product.metadata {
        form = form
            .text("age_months", metadata.age_months.to_string())
            .text("weight_kg", metadata.weight_kg.to_string())
            .text("health_status", metadata.health_status.code().to_string())
            .text("vaccinated", metadata.vaccinated.to_string())
            .text("country", metadata.country.clone());
    }
    if let Some(breed) = &product.predicted_breed {
        form = form.text("predicted_breed", breed.clone());
    }
    if let Some(confidence) = product.prediction_confidence {
        form = form.text("prediction_confidence", confidence.to_string());
    }
    Ok(form)
}

//=========================================================================================
// `ProductCatalogService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProductCatalogService for HttpCatalogAdapter {
    /// Creates the product. The create route ignores `price_modified`, so a
    /// user override is applied with a follow-up update.
    ///
    /// Once the create succeeds the product exists: a failed override is
    /// logged and the created product is returned, never an error.
    async fn create_product(&self, token: &AccessToken, product: &NewProduct) -> PortResult<Product> {
        let request = self
            .backend
            .authed(Method::POST, &["products", ""], token)?
            .multipart(create_form(product)?);
        let created = BackendClient::send_json::<ProductRecord>(request).await?.to_domain()?;
        info!(product_id = %created.product_id, "Product created");

        match product.price_modified {
            Some(price) if created.price_modified != Some(price) => {
                let patch = ProductPatch {
                    price_modified: Some(price),
                    ..ProductPatch::default()
                };
                match self.update_product(token, &created.product_id, &patch).await {
                    Ok(updated) => Ok(updated),
                    Err(e) => {
                        warn!(
                            product_id = %created.product_id,
                            price,
                            "Product created but the price override was not saved: {}", e
                        );
                        Ok(created)
                    }
                }
            }
            _ => Ok(created),
        }
    }

    async fn list_products(&self, token: &AccessToken, query: &ProductQuery) -> PortResult<Vec<Product>> {
        let params = ListParams {
            skip: query.skip,
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            search: query.search.as_deref(),
            product_type: query.product_type.as_deref(),
        };
        let request = self
            .backend
            .authed(Method::GET, &["products", ""], token)?
            .query(&params);
        to_products(BackendClient::send_json(request).await?)
    }

    async fn update_product(
        &self,
        token: &AccessToken,
        product_id: &str,
        patch: &ProductPatch,
    ) -> PortResult<Product> {
        let request = self
            .backend
            .authed(Method::PUT, &["products", product_id], token)?
            .json(&ProductPatchRecord::from(patch));
        BackendClient::send_json::<ProductRecord>(request).await?.to_domain()
    }

    async fn delete_product(&self, token: &AccessToken, product_id: &str) -> PortResult<()> {
        let request = self.backend.authed(Method::DELETE, &["products", product_id], token)?;
        BackendClient::send_empty(request).await?;
        info!(%product_id, "Product deleted");
        Ok(())
    }

    async fn inventory_summary(&self, token: &AccessToken) -> PortResult<InventorySummary> {
        let request = self.backend.authed(Method::GET, &["stats", "summary"], token)?;
        let record = BackendClient::send_json::<SummaryRecord>(request).await?;
        Ok(InventorySummary {
            total_products: record.total_products,
            total_items: record.total_items,
            total_value: record.total_value,
        })
    }

    async fn get_product(&self, product_id: &str) -> PortResult<Product> {
        let request = self.backend.request(Method::GET, &["products", product_id])?;
        BackendClient::send_json::<ProductRecord>(request).await?.to_domain()
    }

    async fn product_image(&self, product_id: &str) -> PortResult<Bytes> {
        let request = self
            .backend
            .request(Method::GET, &["products", product_id, "image"])?;
        BackendClient::send_bytes(request).await
    }

    async fn list_published(&self, query: &ShopQuery) -> PortResult<Vec<Product>> {
        let params = ShopParams {
            skip: query.skip,
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            product_type: query.product_type.as_deref(),
            breed: query.breed.as_deref(),
            min_price: query.min_price,
            max_price: query.max_price,
        };
        let request = self
            .backend
            .request(Method::GET, &["products", "shop", "published"])?
            .query(&params);
        to_products(BackendClient::send_json(request).await?)
    }
}
