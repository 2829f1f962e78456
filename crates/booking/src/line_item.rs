use serde::{Deserialize, Serialize};

use cinema_core::ValueObject;
use cinema_seating::{Seat, SeatCode};

/// One seat and the price it was sold at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub seat: SeatCode,
    /// Price in smallest currency unit.
    pub price: u64,
}

impl LineItem {
    pub fn new(seat: SeatCode, price: u64) -> Self {
        Self { seat, price }
    }
}

impl From<&Seat> for LineItem {
    fn from(seat: &Seat) -> Self {
        Self::new(seat.code(), seat.price())
    }
}

impl ValueObject for LineItem {}

/// Source of a booking's running total.
///
/// Add-ons and discounts live behind this seam; the booking only keeps the
/// number it returns. `None` means the total does not fit in a `u64`.
pub trait TotalCalculator: core::fmt::Debug + Send + Sync {
    fn total(&self, items: &[LineItem]) -> Option<u64>;
}

/// Plain sum of line item prices.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineItemSum;

impl TotalCalculator for LineItemSum {
    fn total(&self, items: &[LineItem]) -> Option<u64> {
        items
            .iter()
            .try_fold(0u64, |total, item| total.checked_add(item.price))
    }
}
