//! Checkout view: a read-only projection of the cart.
//!
//! Rebuilt from scratch on every call; nothing is cached, so a view taken
//! after any cart mutation is always current.
use serde::Serialize;

use crate::cart::Cart;
use crate::money::Money;
use crate::presentation::food_emoji;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRow {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub line_rows: Vec<LineRow>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub total_quantity: u32,
}

impl CheckoutView {
    /// Project `cart` with tax at `tax_rate_bp` basis points.
    #[must_use]
    pub fn build(cart: &Cart, tax_rate_bp: u32) -> Self {
        let line_rows: Vec<LineRow> = cart
            .items()
            .iter()
            .map(|item| LineRow {
                id: item.id.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_subtotal: item.line_subtotal(),
            })
            .collect();
        let subtotal: Money = line_rows.iter().map(|row| row.line_subtotal).sum();
        let tax = subtotal.rate_bp(tax_rate_bp);
        Self {
            line_rows,
            subtotal,
            tax,
            total: subtotal + tax,
            total_quantity: cart.total_quantity(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, id: &str) -> Option<&LineRow> {
        self.line_rows.iter().find(|row| row.id == id)
    }

    /// One `"🍕 Pizza × 2 = ₹500.00"` line per row, for the confirmation summary.
    #[must_use]
    pub fn confirmation_lines(&self, currency_symbol: &str) -> Vec<String> {
        self.line_rows
            .iter()
            .map(|row| {
                format!(
                    "{} {} × {} = {}",
                    food_emoji(&row.name),
                    row.name,
                    row.quantity,
                    row.line_subtotal.display_with(currency_symbol)
                )
            })
            .collect()
    }

    /// `"Items: 3 | Subtotal: ₹750.00"` for the added-to-cart toast.
    #[must_use]
    pub fn toast_summary(&self, currency_symbol: &str) -> String {
        format!(
            "Items: {} | Subtotal: {}",
            self.total_quantity,
            self.subtotal.display_with(currency_symbol)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.set_quantity("p1", "Pizza", Money::from_major(250.0), 2);
        cart.set_quantity("s1", "Greek Salad", Money::from_major(99.5), 1);
        cart
    }

    #[test]
    fn totals_follow_the_cart() {
        let view = CheckoutView::build(&cart(), 500);
        assert_eq!(view.line_rows.len(), 2);
        assert_eq!(view.row("p1").unwrap().line_subtotal, Money::from_major(500.0));
        assert_eq!(view.subtotal, Money::from_major(599.5));
        // 599.50 * 5% = 29.975 -> 29.98
        assert_eq!(view.tax, Money::from_minor(2998));
        assert_eq!(view.total, Money::from_minor(62_948));
        assert_eq!(view.total_quantity, 3);
    }

    #[test]
    fn empty_cart_renders_zero_totals() {
        let view = CheckoutView::build(&Cart::new(), 500);
        assert!(view.is_empty());
        assert_eq!(view.subtotal.display_with("₹"), "₹0.00");
        assert_eq!(view.total.display_with("₹"), "₹0.00");
    }

    #[test]
    fn summary_strings() {
        let view = CheckoutView::build(&cart(), 500);
        assert_eq!(
            view.confirmation_lines("₹"),
            ["🍕 Pizza × 2 = ₹500.00", "🥗 Greek Salad × 1 = ₹99.50"]
        );
        assert_eq!(view.toast_summary("₹"), "Items: 3 | Subtotal: ₹599.50");
    }
}
