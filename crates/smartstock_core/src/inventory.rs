//! crates/smartstock_core/src/inventory.rs
//!
//! Client-side filtering for the dashboard product list.

use crate::domain::Product;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryFilter {
    /// Case-insensitive substring of the product name or type.
    pub search: Option<String>,
    /// Exact product type.
    pub product_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl InventoryFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                product.product_name.to_lowercase().contains(&needle)
                    || product.product_type.to_lowercase().contains(&needle)
            }
            _ => true,
        };

        let matches_type = self
            .product_type
            .as_deref()
            .map_or(true, |t| product.product_type == t);

        let price = product.effective_price();
        let matches_price = self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max);

        matches_search && matches_type && matches_price
    }

    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// Product types present in the list, in order of first appearance.
pub fn distinct_types(products: &[Product]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for product in products {
        if !types.contains(&product.product_type) {
            types.push(product.product_type.clone());
        }
    }
    types
}
