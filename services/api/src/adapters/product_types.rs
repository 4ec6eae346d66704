//! services/api/src/adapters/product_types.rs
//!
//! Implements the `ProductTypeService` port against `/product-types/*`.

use super::backend::{parse_timestamp, BackendClient};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use smartstock_core::domain::{AccessToken, ProductType};
use smartstock_core::ports::{PortResult, ProductTypeService};
use tracing::info;

#[derive(Debug, Deserialize)]
struct ProductTypeRecord {
    type_id: String,
    name: String,
    created_at: String,
    #[serde(default)]
    product_count: u32,
}

impl ProductTypeRecord {
    fn to_domain(self) -> PortResult<ProductType> {
        Ok(ProductType {
            created_at: parse_timestamp(&self.created_at)?,
            type_id: self.type_id,
            name: self.name,
            product_count: self.product_count,
        })
    }
}

#[derive(Debug, Serialize)]
struct NameRecord<'a> {
    name: &'a str,
}

#[derive(Clone)]
pub struct HttpProductTypeAdapter {
    backend: BackendClient,
}

impl HttpProductTypeAdapter {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ProductTypeService for HttpProductTypeAdapter {
    async fn list_types(&self) -> PortResult<Vec<ProductType>> {
        let request = self.backend.request(Method::GET, &["product-types", ""])?;
        BackendClient::send_json::<Vec<ProductTypeRecord>>(request)
            .await?
            .into_iter()
            .map(ProductTypeRecord::to_domain)
            .collect()
    }

    async fn create_type(&self, token: &AccessToken, name: &str) -> PortResult<ProductType> {
        let request = self
            .backend
            .authed(Method::POST, &["product-types", ""], token)?
            .json(&NameRecord { name });
        let created = BackendClient::send_json::<ProductTypeRecord>(request).await?.to_domain()?;
        info!(type_id = %created.type_id, name = %created.name, "Product type created");
        Ok(created)
    }

    async fn rename_type(&self, token: &AccessToken, type_id: &str, name: &str) -> PortResult<ProductType> {
        let request = self
            .backend
            .authed(Method::PUT, &["product-types", type_id], token)?
            .json(&NameRecord { name });
        BackendClient::send_json::<ProductTypeRecord>(request).await?.to_domain()
    }

    async fn delete_type(&self, token: &AccessToken, type_id: &str) -> PortResult<()> {
        let request = self.backend.authed(Method::DELETE, &["product-types", type_id], token)?;
        BackendClient::send_empty(request).await?;
        info!(%type_id, "Product type deleted");
        Ok(())
    }
}
