//! crates/smartstock_core/src/stats.rs
//!
//! Model performance figures derived from the product list.

use crate::domain::Product;

/// Classification and pricing accuracy over a set of products.
///
/// Rates are fractions in `[0, 1]`. Every field is zero for an empty input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelStats {
    pub total_products: usize,
    /// Products carrying a predicted-breed annotation.
    pub total_predictions: usize,
    pub correct_predictions: usize,
    pub overrides: usize,
    pub accuracy: f64,
    pub override_rate: f64,
    pub mean_confidence: f64,
    /// Mean absolute difference between predicted and effective price.
    pub mean_absolute_price_error: f64,
}

impl ModelStats {
    pub fn compute(products: &[Product]) -> Self {
        let annotated: Vec<(&Product, &str)> = products
            .iter()
            .filter_map(|p| {
                p.predicted_breed
                    .as_deref()
                    .filter(|b| !b.is_empty())
                    .map(|b| (p, b))
            })
            .collect();

        let total_predictions = annotated.len();
        let correct_predictions = annotated
            .iter()
            .filter(|(p, breed)| breed.to_lowercase() == p.product_name.to_lowercase())
            .count();
        let overrides = total_predictions - correct_predictions;
        let confidence_sum: f64 = annotated
            .iter()
            .map(|(p, _)| p.prediction_confidence.unwrap_or(0.0))
            .sum();

        let priced: Vec<&Product> = products.iter().filter(|p| p.price_predicted > 0.0).collect();
        let price_error_sum: f64 = priced
            .iter()
            .map(|p| (p.price_predicted - p.effective_price()).abs())
            .sum();

        Self {
            total_products: products.len(),
            total_predictions,
            correct_predictions,
            overrides,
            accuracy: ratio(correct_predictions as f64, total_predictions),
            override_rate: ratio(overrides as f64, total_predictions),
            mean_confidence: ratio(confidence_sum, total_predictions),
            mean_absolute_price_error: ratio(price_error_sum, priced.len()),
        }
    }
}

fn ratio(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
