use serde::{Deserialize, Serialize};

use cinema_core::{DomainError, DomainResult};

use crate::seat::SeatCategory;

/// Category → price multiplier table, expressed in percent of the base price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    pub ordinary_percent: u32,
    pub premium_percent: u32,
    pub couple_percent: u32,
    pub accessible_percent: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            ordinary_percent: 100,
            premium_percent: 150,
            couple_percent: 200,
            accessible_percent: 100,
        }
    }
}

impl PricingPolicy {
    pub fn multiplier_percent(&self, category: SeatCategory) -> u32 {
        match category {
            SeatCategory::Ordinary => self.ordinary_percent,
            SeatCategory::Premium => self.premium_percent,
            SeatCategory::Couple => self.couple_percent,
            SeatCategory::Accessible => self.accessible_percent,
        }
    }

    /// Price of a seat of `category` given the showing's base price.
    ///
    /// Saturates at `u64::MAX` when a multiplier above 100% pushes the price
    /// out of range.
    pub fn price_for(&self, category: SeatCategory, base_price: u64) -> u64 {
        let percent = u128::from(self.multiplier_percent(category));
        u64::try_from(u128::from(base_price) * percent / 100).unwrap_or(u64::MAX)
    }

    pub fn validate(&self) -> DomainResult<()> {
        let all = [
            ("ordinary", self.ordinary_percent),
            ("premium", self.premium_percent),
            ("couple", self.couple_percent),
            ("accessible", self.accessible_percent),
        ];
        for (name, percent) in all {
            if percent == 0 {
                return Err(DomainError::validation(format!(
                    "{name} multiplier must be positive"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_house_prices() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.price_for(SeatCategory::Ordinary, 50_000), 50_000);
        assert_eq!(policy.price_for(SeatCategory::Premium, 50_000), 75_000);
        assert_eq!(policy.price_for(SeatCategory::Couple, 50_000), 100_000);
        assert_eq!(policy.price_for(SeatCategory::Accessible, 50_000), 50_000);
    }

    #[test]
    fn large_base_prices_keep_their_value() {
        let policy = PricingPolicy::default();
        let base = u64::MAX / 10;
        assert_eq!(policy.price_for(SeatCategory::Ordinary, base), base);
        assert_eq!(policy.price_for(SeatCategory::Premium, base), 2_767_011_611_056_432_741);
        assert_eq!(policy.price_for(SeatCategory::Couple, u64::MAX), u64::MAX);
    }

    #[test]
    fn zero_multiplier_is_rejected() {
        let policy = PricingPolicy {
            premium_percent: 0,
            ..PricingPolicy::default()
        };
        match policy.validate() {
            Err(DomainError::Validation(msg)) if msg.contains("premium") => {}
            other => panic!("Expected validation error, got {other:?}"),
        }
    }
}
