//! Multi-category ticket cart.
//!
//! Quantities are clamped into `[0, MAX_QTY_PER_ITEM]` and a line whose
//! quantity reaches zero is removed, so the active set never holds zero rows.

use crate::error::CheckoutError;
use crate::tariff::TariffCatalog;
use crate::types::{ItemCode, Rupees, TicketCategory};
use std::sync::Arc;

/// Per-item quantity ceiling
pub const MAX_QTY_PER_ITEM: u32 = 10;

/// One item in the cart
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartLine {
    /// Item code
    pub code: ItemCode,
    /// Display label copied from the tariff
    pub label: String,
    /// Tariff category
    pub category: TicketCategory,
    /// Quantity, always in `1..=MAX_QTY_PER_ITEM`
    pub quantity: u32,
    /// Unit price copied from the tariff
    pub unit_price: Rupees,
    rank: u32,
}

impl CartLine {
    /// Quantity times unit price
    #[must_use]
    pub const fn line_total(&self) -> Rupees {
        self.unit_price.times(self.quantity)
    }
}

/// Which bound a requested quantity was clamped to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Clamp {
    /// Negative input was raised to zero
    Floor,
    /// Input above the ceiling was lowered to [`MAX_QTY_PER_ITEM`]
    Ceiling,
}

/// Result of a quantity mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantityChange {
    /// Item code
    pub code: ItemCode,
    /// Quantity before the change
    pub previous: u32,
    /// Quantity after clamping
    pub quantity: u32,
    /// Set when the requested quantity was out of range
    pub clamped: Option<Clamp>,
}

/// Cart of one checkout session
#[derive(Clone, Debug)]
pub struct CartStore {
    catalog: Arc<TariffCatalog>,
    lines: Vec<CartLine>,
}

impl CartStore {
    /// Creates an empty cart priced by `catalog`
    #[must_use]
    pub const fn new(catalog: Arc<TariffCatalog>) -> Self {
        Self {
            catalog,
            lines: Vec::new(),
        }
    }

    /// Sets the quantity of `code`, clamping into `[0, MAX_QTY_PER_ITEM]`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownItem`] if `code` is not in the tariff.
    pub fn set_quantity(
        &mut self,
        code: &ItemCode,
        requested: i64,
    ) -> Result<QuantityChange, CheckoutError> {
        let entry = self
            .catalog
            .get(code)
            .ok_or_else(|| CheckoutError::UnknownItem(code.clone()))?;

        let (quantity, clamped) = if requested < 0 {
            (0, Some(Clamp::Floor))
        } else if requested > i64::from(MAX_QTY_PER_ITEM) {
            (MAX_QTY_PER_ITEM, Some(Clamp::Ceiling))
        } else {
            // In range, so the conversion cannot fail.
            (u32::try_from(requested).unwrap_or(MAX_QTY_PER_ITEM), None)
        };

        let position = self.lines.iter().position(|line| &line.code == code);
        let previous = position.map_or(0, |index| self.lines[index].quantity);

        match (position, quantity) {
            (Some(index), 0) => {
                self.lines.remove(index);
            }
            (Some(index), quantity) => self.lines[index].quantity = quantity,
            (None, 0) => {}
            (None, quantity) => {
                let line = CartLine {
                    code: entry.code.clone(),
                    label: entry.label.clone(),
                    category: entry.category,
                    quantity,
                    unit_price: entry.price,
                    rank: entry.display_order,
                };
                let at = self
                    .lines
                    .partition_point(|l| (l.rank, &l.code) < (line.rank, &line.code));
                self.lines.insert(at, line);
            }
        }

        if let Some(clamp) = clamped {
            tracing::warn!(item = %code, requested, quantity, ?clamp, "Quantity clamped");
        } else {
            tracing::debug!(item = %code, previous, quantity, "Quantity updated");
        }

        Ok(QuantityChange {
            code: code.clone(),
            previous,
            quantity,
            clamped,
        })
    }

    /// Adds one unit of `code`
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownItem`] if `code` is not in the tariff.
    pub fn increment(&mut self, code: &ItemCode) -> Result<QuantityChange, CheckoutError> {
        let current = i64::from(self.quantity(code));
        self.set_quantity(code, current + 1)
    }

    /// Removes one unit of `code`, never going below zero
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownItem`] if `code` is not in the tariff.
    pub fn decrement(&mut self, code: &ItemCode) -> Result<QuantityChange, CheckoutError> {
        let current = i64::from(self.quantity(code));
        self.set_quantity(code, (current - 1).max(0))
    }

    /// Current quantity of `code` (zero when absent)
    #[must_use]
    pub fn quantity(&self, code: &ItemCode) -> u32 {
        self.lines
            .iter()
            .find(|line| &line.code == code)
            .map_or(0, |line| line.quantity)
    }

    /// Active lines in tariff display order
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Checks if the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantity times tariff price over every line
    #[must_use]
    pub fn grand_total(&self) -> Rupees {
        self.lines.iter().fold(Rupees::ZERO, |total, line| {
            let price = self.catalog.price(&line.code).unwrap_or(line.unit_price);
            total + price.times(line.quantity)
        })
    }

    /// Total of the lines in `category`
    #[must_use]
    pub fn category_total(&self, category: TicketCategory) -> Rupees {
        self.lines
            .iter()
            .filter(|line| line.category == category)
            .map(CartLine::line_total)
            .sum()
    }

    /// Non-zero totals per category, in category order
    #[must_use]
    pub fn category_totals(&self) -> Vec<(TicketCategory, Rupees)> {
        TicketCategory::ALL
            .into_iter()
            .map(|category| (category, self.category_total(category)))
            .filter(|(_, total)| !total.is_zero())
            .collect()
    }

    /// Total number of units across all lines
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Empties the cart
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// The tariff pricing this cart
    #[must_use]
    pub fn catalog(&self) -> &TariffCatalog {
        &self.catalog
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(Arc::new(TariffCatalog::standard()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn code(raw: &str) -> ItemCode {
        ItemCode::from(raw)
    }

    #[test]
    fn scenario_cart_totals_150() {
        let mut cart = CartStore::default();
        cart.set_quantity(&code("zoo_adult"), 2).unwrap();
        cart.increment(&code("parking_4w_lmv")).unwrap();

        assert_eq!(cart.grand_total(), Rupees::new(150));
        assert_eq!(cart.category_total(TicketCategory::Entry), Rupees::new(100));
        assert_eq!(
            cart.category_totals(),
            vec![
                (TicketCategory::Entry, Rupees::new(100)),
                (TicketCategory::Parking, Rupees::new(50)),
            ]
        );
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn oversized_input_is_clamped_to_ceiling() {
        let mut cart = CartStore::default();
        let change = cart.set_quantity(&code("zoo_child"), 500).unwrap();

        assert_eq!(change.quantity, MAX_QTY_PER_ITEM);
        assert_eq!(change.clamped, Some(Clamp::Ceiling));
        assert_eq!(cart.quantity(&code("zoo_child")), MAX_QTY_PER_ITEM);

        let change = cart.increment(&code("zoo_child")).unwrap();
        assert_eq!(change.clamped, Some(Clamp::Ceiling));
        assert_eq!(change.previous, MAX_QTY_PER_ITEM);
    }

    #[test]
    fn negative_input_removes_the_line() {
        let mut cart = CartStore::default();
        cart.set_quantity(&code("zoo_adult"), 3).unwrap();
        let change = cart.set_quantity(&code("zoo_adult"), -4).unwrap();

        assert_eq!(change.quantity, 0);
        assert_eq!(change.clamped, Some(Clamp::Floor));
        assert!(cart.is_empty());
    }

    #[test]
    fn decrementing_last_unit_removes_line() {
        let mut cart = CartStore::default();
        cart.increment(&code("toy_train")).unwrap();
        cart.decrement(&code("toy_train")).unwrap();
        assert!(cart.lines().is_empty());

        let change = cart.decrement(&code("toy_train")).unwrap();
        assert_eq!(change.quantity, 0);
        assert_eq!(change.clamped, None);
        assert_eq!(cart.grand_total(), Rupees::ZERO);
    }

    #[test]
    fn unknown_items_are_rejected() {
        let mut cart = CartStore::default();
        assert_eq!(
            cart.increment(&code("elephant_ride")),
            Err(CheckoutError::UnknownItem(code("elephant_ride")))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn lines_follow_tariff_display_order() {
        let mut cart = CartStore::default();
        cart.increment(&code("camera_still")).unwrap();
        cart.increment(&code("parking_2w")).unwrap();
        cart.increment(&code("zoo_adult")).unwrap();

        let codes: Vec<&str> = cart.lines().iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, ["zoo_adult", "parking_2w", "camera_still"]);
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = CartStore::default();
        cart.set_quantity(&code("safari_adult"), 4).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.grand_total(), Rupees::ZERO);
    }
}
