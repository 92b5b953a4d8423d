use caldera_core::money::CURRENCY;
use caldera_core::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A selected package option as it appears in a price breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionLine {
    pub id: Uuid,
    pub name: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<u32>,
}

impl OptionLine {
    pub fn line_total(&self) -> Money {
        self.price.times(self.qty.unwrap_or(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingInput {
    pub base_price: Money,
    pub discount_percent: Option<f64>,
    pub selected_options: Vec<OptionLine>,
    pub travelers: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingBreakdown {
    pub base: Money,
    pub options: Vec<OptionLine>,
    pub discount: Money,
    pub taxes: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingResult {
    pub currency: String,
    pub breakdown: PricingBreakdown,
    pub total: Money,
    pub travelers: u32,
}

/// Prices a package booking.
///
/// The base price is charged once per booking, not per traveler. The discount
/// applies to base plus options, is rounded to the cent and never exceeds the
/// subtotal. No taxes are charged.
pub fn calc_total(input: PricingInput) -> PricingResult {
    let base = input.base_price;
    let options: Money = input.selected_options.iter().map(OptionLine::line_total).sum();
    let subtotal = base + options;

    let pct = clamp_percent(input.discount_percent.unwrap_or(0.0));
    let discount = subtotal.scale(pct / 100.0).min(subtotal).max(Money::ZERO);
    let total = (subtotal - discount).max(Money::ZERO);

    PricingResult {
        currency: CURRENCY.to_string(),
        breakdown: PricingBreakdown {
            base,
            options: input.selected_options,
            discount,
            taxes: Money::ZERO,
        },
        total,
        travelers: input.travelers,
    }
}

pub fn per_person_price(total: Money, travelers: u32) -> Money {
    if travelers == 0 {
        return Money::ZERO;
    }
    Money::from_cents((total.cents() as f64 / f64::from(travelers)).round() as i64)
}

pub fn apply_seasonal_multiplier(base_price: Money, multiplier: f64) -> Money {
    base_price.scale(multiplier)
}

/// Suggested discount percent for larger parties.
pub fn group_discount_percent(travelers: u32) -> f64 {
    match travelers {
        t if t >= 10 => 15.0,
        t if t >= 6 => 10.0,
        t if t >= 4 => 5.0,
        _ => 0.0,
    }
}

fn clamp_percent(pct: f64) -> f64 {
    if pct.is_nan() {
        0.0
    } else {
        pct.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn option(price_cents: i64, qty: Option<u32>) -> OptionLine {
        OptionLine {
            id: Uuid::new_v4(),
            name: "Suite upgrade".to_string(),
            price: Money::from_cents(price_cents),
            qty,
        }
    }

    #[test]
    fn test_base_only_with_discount() {
        let result = calc_total(PricingInput {
            base_price: Money::from_dollars(2000.0),
            discount_percent: Some(10.0),
            selected_options: vec![],
            travelers: 2,
        });
        assert_eq!(result.breakdown.discount, Money::from_dollars(200.0));
        assert_eq!(result.total, Money::from_dollars(1800.0));
        assert_eq!(result.breakdown.taxes, Money::ZERO);
        assert_eq!(result.currency, "USD");
        assert_eq!(result.travelers, 2);
    }

    #[test]
    fn test_options_are_discounted_with_base() {
        let result = calc_total(PricingInput {
            base_price: Money::from_dollars(1000.0),
            discount_percent: Some(20.0),
            selected_options: vec![option(15_000, None), option(5_000, Some(2))],
            travelers: 1,
        });
        // subtotal 1250, discount 250
        assert_eq!(result.breakdown.discount, Money::from_dollars(250.0));
        assert_eq!(result.total, Money::from_dollars(1000.0));
        assert_eq!(result.breakdown.options.len(), 2);
    }

    #[test]
    fn test_discount_rounds_to_cents() {
        let result = calc_total(PricingInput {
            base_price: Money::from_cents(999),
            discount_percent: Some(12.5),
            selected_options: vec![],
            travelers: 1,
        });
        // 9.99 * 0.125 = 1.24875
        assert_eq!(result.breakdown.discount, Money::from_cents(125));
        assert_eq!(result.total, Money::from_cents(874));
    }

    #[test]
    fn test_full_and_excess_discount_floor_at_zero() {
        for pct in [100.0, 150.0] {
            let result = calc_total(PricingInput {
                base_price: Money::from_dollars(500.0),
                discount_percent: Some(pct),
                selected_options: vec![],
                travelers: 1,
            });
            assert_eq!(result.total, Money::ZERO);
            assert_eq!(result.breakdown.discount, Money::from_dollars(500.0));
        }
    }

    #[test]
    fn test_negative_discount_is_ignored() {
        let result = calc_total(PricingInput {
            base_price: Money::from_dollars(500.0),
            discount_percent: Some(-10.0),
            selected_options: vec![],
            travelers: 1,
        });
        assert_eq!(result.total, Money::from_dollars(500.0));
    }

    #[test]
    fn test_helpers() {
        assert_eq!(per_person_price(Money::from_dollars(1000.0), 3), Money::from_cents(33_333));
        assert_eq!(per_person_price(Money::from_dollars(1000.0), 0), Money::ZERO);
        assert_eq!(
            apply_seasonal_multiplier(Money::from_dollars(1000.0), 1.25),
            Money::from_dollars(1250.0)
        );
        assert_eq!(group_discount_percent(3), 0.0);
        assert_eq!(group_discount_percent(4), 5.0);
        assert_eq!(group_discount_percent(6), 10.0);
        assert_eq!(group_discount_percent(12), 15.0);
    }

    fn priced(base: i64, pct: f64, option_cents: i64) -> Money {
        calc_total(PricingInput {
            base_price: Money::from_cents(base),
            discount_percent: Some(pct),
            selected_options: vec![option(option_cents, None)],
            travelers: 1,
        })
        .total
    }

    proptest! {
        #[test]
        fn prop_total_never_negative(base in 0i64..10_000_000, pct in -50.0f64..200.0, opt in 0i64..1_000_000) {
            prop_assert!(!priced(base, pct, opt).is_negative());
        }

        #[test]
        fn prop_monotone_in_base(base in 0i64..10_000_000, extra in 0i64..1_000_000, pct in 0.0f64..100.0) {
            prop_assert!(priced(base + extra, pct, 0) >= priced(base, pct, 0));
        }

        #[test]
        fn prop_monotone_in_options(base in 0i64..10_000_000, opt in 0i64..1_000_000, extra in 0i64..1_000_000, pct in 0.0f64..100.0) {
            prop_assert!(priced(base, pct, opt + extra) >= priced(base, pct, opt));
        }

        #[test]
        fn prop_antitone_in_discount(base in 0i64..10_000_000, lo in 0.0f64..100.0, delta in 0.0f64..100.0) {
            prop_assert!(priced(base, lo + delta, 0) <= priced(base, lo, 0));
        }

        #[test]
        fn prop_idempotent(base in 0i64..10_000_000, pct in 0.0f64..100.0, opt in 0i64..1_000_000) {
            prop_assert_eq!(priced(base, pct, opt), priced(base, pct, opt));
        }
    }
}
