//! Stock-intake reconciliation math
//!
//! An intake can be entered by quantity, by total weight, or both. These
//! functions turn that flexible input into one resolved record and keep the
//! product running counters consistent across create, edit, and delete.

use rust_decimal::Decimal;
use thiserror::Error;

/// Raw intake input before reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntakeInput {
    /// Units received, if entered by quantity
    pub quantity: Option<Decimal>,

    /// Kilograms received, if entered by weight
    pub total_weight: Option<Decimal>,
}

/// A fully resolved intake: quantity, total weight, and the unit weight
/// that was in effect when the record was made
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedIntake {
    pub quantity: Decimal,
    pub total_weight: Decimal,
    pub single_weight: Decimal,
}

/// The three running counters kept on every product
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StockCounters {
    pub quantity: Decimal,
    pub stock_quantity: Decimal,
    pub stock_weight: Decimal,
}

/// Reconciliation failures, surfaced to clients as 400 responses
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Quantity cannot be negative")]
    NegativeQuantity,

    #[error("Total weight cannot be negative")]
    NegativeWeight,

    #[error("Selected product does not have a valid unit weight configured")]
    UnitWeightMissing,

    #[error("Either quantity or weight must be provided")]
    MissingInput,
}

impl IntakeError {
    /// The input field the error belongs to
    pub fn field(&self) -> &'static str {
        match self {
            IntakeError::NegativeQuantity => "quantity",
            IntakeError::NegativeWeight => "totalWeight",
            IntakeError::UnitWeightMissing => "totalWeight",
            IntakeError::MissingInput => "quantity",
        }
    }
}

/// Resolve intake input against a product's unit weight.
///
/// Quantity takes priority: when a quantity is given the total weight is
/// either taken as entered or derived from the unit weight (a product with
/// no unit weight counts one kilogram per unit). Weight-only input requires
/// a configured unit weight and floors the derived quantity to whole units.
pub fn resolve_intake(
    input: IntakeInput,
    unit_weight: Option<Decimal>,
) -> Result<ResolvedIntake, IntakeError> {
    let unit = unit_weight.filter(|w| *w > Decimal::ZERO);

    match (input.quantity, input.total_weight) {
        (Some(quantity), total_weight) => {
            if quantity < Decimal::ZERO {
                return Err(IntakeError::NegativeQuantity);
            }
            if let Some(total) = total_weight {
                if total < Decimal::ZERO {
                    return Err(IntakeError::NegativeWeight);
                }
            }

            let single_weight = unit.unwrap_or(Decimal::ONE);
            let total_weight = total_weight.unwrap_or(quantity * single_weight);

            Ok(ResolvedIntake {
                quantity,
                total_weight,
                single_weight,
            })
        }
        (None, Some(total_weight)) => {
            if total_weight < Decimal::ZERO {
                return Err(IntakeError::NegativeWeight);
            }

            let single_weight = unit.ok_or(IntakeError::UnitWeightMissing)?;
            let quantity = if total_weight > Decimal::ZERO {
                (total_weight / single_weight).floor()
            } else {
                Decimal::ZERO
            };

            Ok(ResolvedIntake {
                quantity,
                total_weight,
                single_weight,
            })
        }
        (None, None) => Err(IntakeError::MissingInput),
    }
}

/// Add a resolved intake to the product counters
pub fn apply_intake(counters: StockCounters, resolved: &ResolvedIntake) -> StockCounters {
    StockCounters {
        quantity: counters.quantity + resolved.quantity,
        stock_quantity: counters.stock_quantity + resolved.quantity,
        stock_weight: counters.stock_weight + resolved.total_weight,
    }
}

/// Remove a resolved intake from the product counters.
///
/// Each counter clamps at zero so reverting a record that outlived other
/// adjustments never drives stock negative.
pub fn revert_intake(counters: StockCounters, resolved: &ResolvedIntake) -> StockCounters {
    StockCounters {
        quantity: (counters.quantity - resolved.quantity).max(Decimal::ZERO),
        stock_quantity: (counters.stock_quantity - resolved.quantity).max(Decimal::ZERO),
        stock_weight: (counters.stock_weight - resolved.total_weight).max(Decimal::ZERO),
    }
}

/// Whether a product sits at or below its reorder threshold
pub fn is_low_stock(quantity: Decimal, min_stock_level: Decimal) -> bool {
    quantity <= min_stock_level
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn quantity_input_uses_unit_weight_for_total() {
        let resolved = resolve_intake(
            IntakeInput {
                quantity: Some(dec("4")),
                total_weight: None,
            },
            Some(dec("2.5")),
        )
        .unwrap();

        assert_eq!(resolved.quantity, dec("4"));
        assert_eq!(resolved.total_weight, dec("10"));
        assert_eq!(resolved.single_weight, dec("2.5"));
    }

    #[test]
    fn quantity_input_without_unit_weight_counts_one_kg_per_unit() {
        let resolved = resolve_intake(
            IntakeInput {
                quantity: Some(dec("7")),
                total_weight: None,
            },
            None,
        )
        .unwrap();

        assert_eq!(resolved.total_weight, dec("7"));
        assert_eq!(resolved.single_weight, Decimal::ONE);
    }

    #[test]
    fn explicit_total_weight_wins_over_derived() {
        let resolved = resolve_intake(
            IntakeInput {
                quantity: Some(dec("4")),
                total_weight: Some(dec("9")),
            },
            Some(dec("2.5")),
        )
        .unwrap();

        assert_eq!(resolved.quantity, dec("4"));
        assert_eq!(resolved.total_weight, dec("9"));
    }

    #[test]
    fn fractional_quantity_is_preserved() {
        let resolved = resolve_intake(
            IntakeInput {
                quantity: Some(dec("12.5")),
                total_weight: None,
            },
            Some(dec("2")),
        )
        .unwrap();

        assert_eq!(resolved.quantity, dec("12.5"));
        assert_eq!(resolved.total_weight, dec("25"));
    }

    #[test]
    fn weight_input_floors_derived_quantity() {
        let resolved = resolve_intake(
            IntakeInput {
                quantity: None,
                total_weight: Some(dec("9")),
            },
            Some(dec("2.5")),
        )
        .unwrap();

        assert_eq!(resolved.quantity, dec("3"));
        assert_eq!(resolved.total_weight, dec("9"));
        assert_eq!(resolved.single_weight, dec("2.5"));
    }

    #[test]
    fn weight_input_of_zero_resolves_to_zero_quantity() {
        let resolved = resolve_intake(
            IntakeInput {
                quantity: None,
                total_weight: Some(Decimal::ZERO),
            },
            Some(dec("2.5")),
        )
        .unwrap();

        assert_eq!(resolved.quantity, Decimal::ZERO);
        assert_eq!(resolved.total_weight, Decimal::ZERO);
    }

    #[test]
    fn weight_input_requires_unit_weight() {
        let err = resolve_intake(
            IntakeInput {
                quantity: None,
                total_weight: Some(dec("9")),
            },
            None,
        )
        .unwrap_err();

        assert_eq!(err, IntakeError::UnitWeightMissing);
    }

    #[test]
    fn zero_unit_weight_counts_as_unconfigured() {
        let err = resolve_intake(
            IntakeInput {
                quantity: None,
                total_weight: Some(dec("9")),
            },
            Some(Decimal::ZERO),
        )
        .unwrap_err();

        assert_eq!(err, IntakeError::UnitWeightMissing);
    }

    #[test]
    fn negative_values_are_rejected() {
        let err = resolve_intake(
            IntakeInput {
                quantity: Some(dec("-1")),
                total_weight: None,
            },
            Some(dec("2")),
        )
        .unwrap_err();
        assert_eq!(err, IntakeError::NegativeQuantity);

        let err = resolve_intake(
            IntakeInput {
                quantity: None,
                total_weight: Some(dec("-5")),
            },
            Some(dec("2")),
        )
        .unwrap_err();
        assert_eq!(err, IntakeError::NegativeWeight);

        let err = resolve_intake(
            IntakeInput {
                quantity: Some(dec("1")),
                total_weight: Some(dec("-5")),
            },
            Some(dec("2")),
        )
        .unwrap_err();
        assert_eq!(err, IntakeError::NegativeWeight);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = resolve_intake(IntakeInput::default(), Some(dec("2"))).unwrap_err();
        assert_eq!(err, IntakeError::MissingInput);
    }

    #[test]
    fn error_messages_name_the_problem() {
        assert_eq!(
            IntakeError::MissingInput.to_string(),
            "Either quantity or weight must be provided"
        );
        assert!(IntakeError::NegativeQuantity.to_string().contains("negative"));
        assert!(IntakeError::NegativeWeight.to_string().contains("negative"));
    }

    #[test]
    fn apply_then_revert_restores_counters() {
        let counters = StockCounters {
            quantity: dec("10"),
            stock_quantity: dec("10"),
            stock_weight: dec("20"),
        };
        let resolved = ResolvedIntake {
            quantity: dec("3"),
            total_weight: dec("6"),
            single_weight: dec("2"),
        };

        let applied = apply_intake(counters, &resolved);
        assert_eq!(applied.quantity, dec("13"));
        assert_eq!(applied.stock_quantity, dec("13"));
        assert_eq!(applied.stock_weight, dec("26"));

        assert_eq!(revert_intake(applied, &resolved), counters);
    }

    #[test]
    fn revert_clamps_at_zero() {
        let counters = StockCounters {
            quantity: dec("1"),
            stock_quantity: dec("0.5"),
            stock_weight: dec("2"),
        };
        let resolved = ResolvedIntake {
            quantity: dec("3"),
            total_weight: dec("6"),
            single_weight: dec("2"),
        };

        let reverted = revert_intake(counters, &resolved);
        assert_eq!(reverted.quantity, Decimal::ZERO);
        assert_eq!(reverted.stock_quantity, Decimal::ZERO);
        assert_eq!(reverted.stock_weight, Decimal::ZERO);
    }

    #[test]
    fn low_stock_boundary_is_inclusive() {
        assert!(is_low_stock(dec("10"), dec("10")));
        assert!(is_low_stock(dec("9.5"), dec("10")));
        assert!(!is_low_stock(dec("10.1"), dec("10")));
    }
}
