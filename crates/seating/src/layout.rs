//! Hall layout configuration for one showing.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use cinema_core::{DomainError, DomainResult};

use crate::pricing::PricingPolicy;
use crate::seat::{MAX_ROWS, SeatCategory, SeatCode};

/// Seats that are already sold when the showing opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PreBooking {
    #[default]
    None,
    /// An explicit list of sold seats.
    Seats { seats: Vec<SeatCode> },
    /// Each bookable seat is sold with probability `fraction`, drawn from a
    /// generator seeded with `seed` (same seed, same hall).
    Seeded { seed: u64, fraction: f64 },
}

/// Grid dimensions and category rules.
///
/// Row `A` is nearest the screen. The last `premium_back_rows` rows are
/// premium; with `couple_corners` the two corner seats of the last row are
/// couple seats. Explicitly listed accessible seats override both rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub rows: u8,
    pub columns: u16,
    /// Base price in smallest currency unit.
    pub base_price: u64,
    pub premium_back_rows: u8,
    pub couple_corners: bool,
    pub accessible: Vec<SeatCode>,
    /// Seats out of service for the whole showing.
    pub unavailable: Vec<SeatCode>,
    pub pre_booking: PreBooking,
    pub pricing: PricingPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            columns: 12,
            base_price: 50_000,
            premium_back_rows: 2,
            couple_corners: true,
            accessible: Vec::new(),
            unavailable: Vec::new(),
            pre_booking: PreBooking::None,
            pricing: PricingPolicy::default(),
        }
    }
}

impl LayoutConfig {
    /// Plain grid with default category rules.
    pub fn grid(rows: u8, columns: u16, base_price: u64) -> Self {
        Self {
            rows,
            columns,
            base_price,
            ..Self::default()
        }
    }

    pub fn contains(&self, code: &SeatCode) -> bool {
        code.row_index() < self.rows && code.column() <= self.columns
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.rows == 0 || self.rows > MAX_ROWS {
            return Err(DomainError::validation(format!(
                "rows must be between 1 and {MAX_ROWS}"
            )));
        }
        if self.columns == 0 {
            return Err(DomainError::validation("columns must be positive"));
        }
        if self.base_price == 0 {
            return Err(DomainError::validation("base_price must be positive"));
        }
        if self.premium_back_rows > self.rows {
            return Err(DomainError::validation(
                "premium_back_rows cannot exceed rows",
            ));
        }
        self.pricing.validate()?;

        let listed = self
            .accessible
            .iter()
            .chain(&self.unavailable)
            .chain(match &self.pre_booking {
                PreBooking::Seats { seats } => seats.as_slice(),
                _ => &[][..],
            });
        for code in listed {
            if !self.contains(code) {
                return Err(DomainError::validation(format!(
                    "seat {code} is outside the {}x{} grid",
                    self.rows, self.columns
                )));
            }
        }

        if let PreBooking::Seeded { fraction, .. } = self.pre_booking {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(DomainError::validation(
                    "pre-booking fraction must be within 0.0..=1.0",
                ));
            }
        }
        Ok(())
    }

    pub fn category_for(&self, code: &SeatCode) -> SeatCategory {
        let last_row = self.rows.saturating_sub(1);
        let row = code.row_index();

        if self.accessible.contains(code) {
            SeatCategory::Accessible
        } else if self.couple_corners
            && row == last_row
            && (code.column() == 1 || code.column() == self.columns)
        {
            SeatCategory::Couple
        } else if row.saturating_add(self.premium_back_rows) > last_row {
            SeatCategory::Premium
        } else {
            SeatCategory::Ordinary
        }
    }

    /// Every seat of the grid in row-major order.
    pub fn codes(&self) -> impl Iterator<Item = SeatCode> + '_ {
        (0..self.rows).flat_map(move |row| {
            (1..=self.columns).filter_map(move |column| SeatCode::new(row, column).ok())
        })
    }

    /// Seats sold before the showing opens. Out-of-service seats are never included.
    pub(crate) fn pre_booked(&self) -> BTreeSet<SeatCode> {
        let bookable = |code: &SeatCode| !self.unavailable.contains(code);
        match &self.pre_booking {
            PreBooking::None => BTreeSet::new(),
            PreBooking::Seats { seats } => seats.iter().copied().filter(bookable).collect(),
            PreBooking::Seeded { seed, fraction } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                self.codes()
                    .filter(bookable)
                    .filter(|_| rng.random_range(0.0..1.0) < *fraction)
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> SeatCode {
        raw.parse().unwrap()
    }

    #[test]
    fn back_rows_are_premium_and_last_row_corners_are_couple() {
        let layout = LayoutConfig {
            premium_back_rows: 2,
            ..LayoutConfig::grid(5, 5, 100)
        };
        assert_eq!(layout.category_for(&code("A1")), SeatCategory::Ordinary);
        assert_eq!(layout.category_for(&code("C3")), SeatCategory::Ordinary);
        assert_eq!(layout.category_for(&code("D3")), SeatCategory::Premium);
        assert_eq!(layout.category_for(&code("E3")), SeatCategory::Premium);
        assert_eq!(layout.category_for(&code("E1")), SeatCategory::Couple);
        assert_eq!(layout.category_for(&code("E5")), SeatCategory::Couple);
        assert_eq!(layout.category_for(&code("D1")), SeatCategory::Premium);
    }

    #[test]
    fn no_premium_band_when_zero_rows() {
        let layout = LayoutConfig {
            premium_back_rows: 0,
            couple_corners: false,
            ..LayoutConfig::grid(3, 3, 100)
        };
        assert!(layout.codes().all(|c| layout.category_for(&c) == SeatCategory::Ordinary));
    }

    #[test]
    fn categories_of_an_unvalidated_layout_do_not_overflow() {
        let empty = LayoutConfig::grid(0, 5, 100);
        assert_eq!(empty.category_for(&code("A1")), SeatCategory::Couple);

        let all_premium = LayoutConfig {
            premium_back_rows: u8::MAX,
            couple_corners: false,
            ..LayoutConfig::grid(5, 5, 100)
        };
        assert_eq!(all_premium.category_for(&code("Z3")), SeatCategory::Premium);
        assert!(all_premium.validate().is_err());
    }

    #[test]
    fn accessible_list_overrides_rules() {
        let layout = LayoutConfig {
            accessible: vec![code("E1")],
            ..LayoutConfig::grid(5, 5, 100)
        };
        assert_eq!(layout.category_for(&code("E1")), SeatCategory::Accessible);
    }

    #[test]
    fn rejects_bad_dimensions_and_foreign_seats() {
        assert!(LayoutConfig::grid(0, 5, 100).validate().is_err());
        assert!(LayoutConfig::grid(27, 5, 100).validate().is_err());
        assert!(LayoutConfig::grid(5, 0, 100).validate().is_err());
        assert!(LayoutConfig::grid(5, 5, 0).validate().is_err());

        let layout = LayoutConfig {
            unavailable: vec![code("F1")],
            ..LayoutConfig::grid(5, 5, 100)
        };
        match layout.validate() {
            Err(DomainError::Validation(msg)) if msg.contains("F1") => {}
            other => panic!("Expected validation error, got {other:?}"),
        }

        let layout = LayoutConfig {
            pre_booking: PreBooking::Seeded { seed: 1, fraction: 1.5 },
            ..LayoutConfig::grid(5, 5, 100)
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn seeded_pre_booking_is_reproducible() {
        let layout = LayoutConfig {
            pre_booking: PreBooking::Seeded { seed: 42, fraction: 0.3 },
            ..LayoutConfig::grid(8, 12, 100)
        };
        let first = layout.pre_booked();
        let second = layout.pre_booked();
        assert_eq!(first, second);
        assert!(first.len() < 96);
    }

    #[test]
    fn seeded_extremes() {
        let none = LayoutConfig {
            pre_booking: PreBooking::Seeded { seed: 7, fraction: 0.0 },
            ..LayoutConfig::grid(4, 4, 100)
        };
        assert!(none.pre_booked().is_empty());

        let all = LayoutConfig {
            unavailable: vec![code("A1")],
            pre_booking: PreBooking::Seeded { seed: 7, fraction: 1.0 },
            ..LayoutConfig::grid(4, 4, 100)
        };
        let booked = all.pre_booked();
        assert_eq!(booked.len(), 15);
        assert!(!booked.contains(&code("A1")));
    }
}
