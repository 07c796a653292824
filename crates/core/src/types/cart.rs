//! Per-user shopping cart.
//!
//! A cart is an ordered list of lines keyed by `(product id, size)`. All the
//! mutation rules live here so storage only ever loads and saves whole carts.
//!
//! # Invariants
//!
//! - At most one line per `(product id, size)` key.
//! - Every line has `quantity >= 1`; a line that would drop to zero is removed.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;
use super::size::SizeCategory;

/// One cart line: a product snapshot and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    fn matches(&self, product_id: ProductId, size: Option<SizeCategory>) -> bool {
        self.product.id == product_id && self.product.size == size
    }

    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// Result of decrementing a product's line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    /// Quantity went down by one and the line remains.
    Reduced,
    /// The line held a single unit and was removed.
    Removed,
    /// No line for the product.
    Absent,
}

/// A shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

/// Cart subtotal, platform fee and grand total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    #[serde(rename = "totalPrice")]
    pub subtotal: Decimal,
    #[serde(rename = "platformFee")]
    pub fee: Decimal,
    pub grand_total: Decimal,
}

/// One page of cart lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPage {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_cart_items: usize,
    pub cart_items: Vec<CartItem>,
}

impl Cart {
    /// Build a cart from stored lines.
    #[must_use]
    pub const fn from_items(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct lines (the "cart count" shown to shoppers).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any line references `product_id`, in any size.
    #[must_use]
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|item| item.product.id == product_id)
    }

    /// Add one unit of `product` in `size`.
    ///
    /// Increments the existing `(product, size)` line if present, otherwise
    /// appends a new line holding a snapshot of the product.
    pub fn add(&mut self, product: &Product, size: SizeCategory) {
        if !self.increment(product.id, size) {
            self.items.push(CartItem {
                product: product.snapshot_for_cart(size),
                quantity: 1,
            });
        }
    }

    /// Increment an existing `(product, size)` line by one.
    ///
    /// Returns `false` without touching the cart if no such line exists.
    pub fn increment(&mut self, product_id: ProductId, size: SizeCategory) -> bool {
        match self
            .items
            .iter_mut()
            .find(|item| item.matches(product_id, Some(size)))
        {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Remove the first line for `product_id`, whatever its size.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.product.id == product_id)?;
        Some(self.items.remove(index))
    }

    /// Take one unit off the first line for `product_id`.
    pub fn decrement(&mut self, product_id: ProductId) -> Decrement {
        let Some(index) = self
            .items
            .iter()
            .position(|item| item.product.id == product_id)
        else {
            return Decrement::Absent;
        };

        match self.items.get_mut(index) {
            Some(item) if item.quantity > 1 => {
                item.quantity -= 1;
                Decrement::Reduced
            }
            _ => {
                self.items.remove(index);
                Decrement::Removed
            }
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Subtotal over all lines, `fee = subtotal × fee_rate` rounded half away
    /// from zero to two places, and their sum.
    #[must_use]
    pub fn totals(&self, fee_rate: Decimal) -> CartTotals {
        let subtotal: Decimal = self.items.iter().map(CartItem::line_total).sum();
        let fee = (subtotal * fee_rate)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        CartTotals {
            subtotal,
            fee,
            grand_total: subtotal + fee,
        }
    }

    /// Slice the cart for display.
    ///
    /// `start = (page - 1) * page_size` and `end = start + page_size`, both
    /// clamped to the number of lines, so a page past the end is empty rather
    /// than an error. Each returned product carries its line quantity as
    /// `cart_item_count`.
    #[must_use]
    pub fn page(&self, page: u32, page_size: u32) -> CartPage {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total = self.items.len();

        let start = usize::try_from(u64::from(page - 1) * u64::from(page_size))
            .unwrap_or(usize::MAX)
            .min(total);
        let end = start
            .saturating_add(usize::try_from(page_size).unwrap_or(usize::MAX))
            .min(total);

        let cart_items = self
            .items
            .iter()
            .skip(start)
            .take(end - start)
            .map(|item| {
                let mut item = item.clone();
                item.product.cart_item_count = Some(item.quantity);
                item
            })
            .collect();

        CartPage {
            current_page: page,
            total_pages: total_pages(u64::try_from(total).unwrap_or(u64::MAX), page_size),
            total_cart_items: total,
            cart_items,
        }
    }
}

/// `ceil(total / page_size)`, saturating at `u32::MAX`.
#[must_use]
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    u32::try_from(total.div_ceil(page_size)).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::product::fixtures::product;

    fn cart_with(products: &[(&Product, SizeCategory, u32)]) -> Cart {
        let mut cart = Cart::default();
        for (product, size, quantity) in products {
            for _ in 0..*quantity {
                cart.add(product, *size);
            }
        }
        cart
    }

    #[test]
    fn test_adding_same_product_and_size_increments() {
        let shoe = product("runner", Decimal::from(100));
        let cart = cart_with(&[(&shoe, SizeCategory::M, 2)]);

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert!(cart.items()[0].product.in_cart);
    }

    #[test]
    fn test_different_sizes_are_separate_lines() {
        let shoe = product("runner", Decimal::from(100));
        let cart = cart_with(&[(&shoe, SizeCategory::M, 1), (&shoe, SizeCategory::L, 1)]);

        assert_eq!(cart.line_count(), 2);
        assert!(cart.contains_product(shoe.id));
    }

    #[test]
    fn test_increment_never_inserts() {
        let shoe = product("runner", Decimal::from(100));
        let mut cart = cart_with(&[(&shoe, SizeCategory::M, 1)]);

        assert!(!cart.increment(shoe.id, SizeCategory::XL));
        assert_eq!(cart.line_count(), 1);
        assert!(cart.increment(shoe.id, SizeCategory::M));
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_decrement_to_zero_removes_line() {
        let shoe = product("runner", Decimal::from(100));
        let mut cart = cart_with(&[(&shoe, SizeCategory::M, 1)]);

        assert_eq!(cart.decrement(shoe.id), Decrement::Removed);
        assert!(cart.is_empty());
        assert!(!cart.contains_product(shoe.id));
        assert_eq!(cart.decrement(shoe.id), Decrement::Absent);
    }

    #[test]
    fn test_decrement_reduces_quantity() {
        let shoe = product("runner", Decimal::from(100));
        let mut cart = cart_with(&[(&shoe, SizeCategory::M, 3)]);

        assert_eq!(cart.decrement(shoe.id), Decrement::Reduced);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_remove_takes_first_line_for_product_only() {
        let shoe = product("runner", Decimal::from(100));
        let sock = product("sock", Decimal::from(5));
        let mut cart = cart_with(&[
            (&shoe, SizeCategory::M, 1),
            (&sock, SizeCategory::S, 1),
            (&shoe, SizeCategory::L, 1),
        ]);

        let removed = cart.remove(shoe.id).unwrap();
        assert_eq!(removed.product.size, Some(SizeCategory::M));
        assert_eq!(cart.line_count(), 2);
        assert!(cart.contains_product(shoe.id));
        assert!(cart.remove(ProductId::generate()).is_none());
    }

    #[test]
    fn test_totals_include_platform_fee() {
        let shoe = product("runner", Decimal::new(10000, 2));
        let cart = cart_with(&[(&shoe, SizeCategory::M, 2)]);

        let totals = cart.totals(Decimal::new(2, 3));
        assert_eq!(totals.subtotal, Decimal::new(20000, 2));
        assert_eq!(totals.fee, Decimal::new(40, 2));
        assert_eq!(totals.grand_total, Decimal::new(20040, 2));

        let json = serde_json::to_value(&totals).unwrap();
        assert_eq!(json["totalPrice"], "200.00");
        assert_eq!(json["platformFee"], "0.40");
        assert_eq!(json["grandTotal"], "200.40");
    }

    #[test]
    fn test_platform_fee_rounds_half_away_from_zero() {
        // 1234.25 × 0.002 = 2.4685
        let shoe = product("trail", Decimal::new(123_425, 2));
        let cart = cart_with(&[(&shoe, SizeCategory::XL, 1)]);

        let totals = cart.totals(Decimal::new(2, 3));
        assert_eq!(totals.fee.to_string(), "2.47");
        assert_eq!(totals.grand_total.to_string(), "1236.72");
    }

    #[test]
    fn test_totals_of_empty_cart_are_zero() {
        let totals = Cart::default().totals(Decimal::new(2, 3));
        assert_eq!(totals.grand_total, Decimal::ZERO);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let products: Vec<_> = (0..5)
            .map(|i| product(&format!("p{i}"), Decimal::ONE))
            .collect();
        let mut cart = Cart::default();
        for p in &products {
            cart.add(p, SizeCategory::S);
        }

        let page = cart.page(2, 10);
        assert!(page.cart_items.is_empty());
        assert_eq!(page.total_cart_items, 5);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_page_annotates_cart_item_count() {
        let a = product("a", Decimal::ONE);
        let b = product("b", Decimal::ONE);
        let c = product("c", Decimal::ONE);
        let cart = cart_with(&[
            (&a, SizeCategory::S, 1),
            (&b, SizeCategory::S, 3),
            (&c, SizeCategory::S, 1),
        ]);

        let page = cart.page(1, 2);
        assert_eq!(page.cart_items.len(), 2);
        assert_eq!(page.cart_items[1].product.cart_item_count, Some(3));
        assert_eq!(page.total_pages, 2);

        let last = cart.page(2, 2);
        assert_eq!(last.cart_items.len(), 1);
        assert_eq!(last.cart_items[0].product.id, c.id);
        // Stored lines are not annotated
        assert_eq!(cart.items()[1].product.cart_item_count, None);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }
}
