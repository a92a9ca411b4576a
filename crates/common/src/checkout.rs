//! Checkout transaction data model carried inside sealed tokens.
//!
//! The envelope itself is schema-agnostic; these types describe what the
//! checkout flow actually seals. Field names follow the payment API's camelCase
//! JSON.

use serde::{Deserialize, Serialize};

/// A single line item in a checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Display name.
    pub name: String,
    /// Product image URL.
    pub image: String,
    /// Unit price in the checkout currency.
    pub price: f64,
    /// Merchant-side product identifier.
    pub product_id: String,
    /// Number of units.
    pub quantity: u32,
}

/// The payload sealed when a merchant creates a checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutPayload {
    /// Line items; must not be empty.
    pub products: Vec<Product>,
    /// ISO 4217 currency code, e.g. `"KHR"`, `"USD"`.
    pub currency: String,
}

impl CheckoutPayload {
    /// Check the payload is worth sealing: at least one product, a currency,
    /// and no negative prices or zero quantities.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.products.is_empty() {
            return Err("checkout must contain at least one product".into());
        }
        if self.currency.trim().is_empty() {
            return Err("currency is required".into());
        }
        for p in &self.products {
            if !p.price.is_finite() || p.price < 0.0 {
                return Err(format!("product {} has an invalid price", p.product_id));
            }
            if p.quantity == 0 {
                return Err(format!("product {} has zero quantity", p.product_id));
            }
        }
        Ok(())
    }
}
