//! Catalog product as embedded in carts and orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::size::SizeCategory;

/// A catalog product.
///
/// Carts and orders embed a copy of this record. `size` is only set on those
/// copies (it is chosen at cart-add time); `cart_item_count` is a display
/// field filled in when a cart page is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "productId")]
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub description: String,
    /// Units available in the catalog.
    pub quantity: i32,
    pub price: Decimal,
    pub category: String,
    pub images: Vec<String>,
    #[serde(default)]
    pub in_cart: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_item_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeCategory>,
}

impl Product {
    /// First image URL, used as the thumbnail in order listings.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Copy of this product as it should be stored in a new cart line.
    #[must_use]
    pub fn snapshot_for_cart(&self, size: SizeCategory) -> Self {
        Self {
            in_cart: true,
            size: Some(size),
            cart_item_count: None,
            ..self.clone()
        }
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::product;
    use super::*;

    #[test]
    fn test_snapshot_marks_in_cart_and_size() {
        let catalog = product("runner", Decimal::from(100));
        let snapshot = catalog.snapshot_for_cart(SizeCategory::L);

        assert!(snapshot.in_cart);
        assert_eq!(snapshot.size, Some(SizeCategory::L));
        assert!(!catalog.in_cart);
        assert_eq!(snapshot.id, catalog.id);
    }

    #[test]
    fn test_json_uses_product_id_key() {
        let json = serde_json::to_value(product("runner", Decimal::from(5))).unwrap();
        assert!(json.get("productId").is_some());
        assert!(json.get("inCart").is_some());
        assert!(json.get("size").is_none());
    }
}
