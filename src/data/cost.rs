use thiserror::Error;

use super::model::DevelopmentOption;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("'{option}': cost percentage '{raw}' is not a number")]
    InvalidPercentage { option: String, raw: String },
    #[error("'{option}': cost percentage is zero, total cost is undefined")]
    ZeroPercentage { option: String },
    #[error("'{option}': cost percentage {value}% is outside (0, 100]")]
    PercentageOutOfRange { option: String, value: f64 },
    #[error("'{option}': habitat cost {value} must be a finite, non-negative amount")]
    InvalidCost { option: String, value: f64 },
    #[error("'{option}': estimated total cost is too large to represent")]
    TotalOverflow { option: String },
}

/// Parse a percentage such as `"15%"`, `" 7.5 % "` or `"12"`.
///
/// Returns the value in percent, guaranteed to lie in (0, 100].
pub fn parse_percentage(option: &str, raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let value: f64 = number
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidPercentage {
            option: option.to_string(),
            raw: raw.to_string(),
        })?;

    if value == 0.0 {
        return Err(ValidationError::ZeroPercentage {
            option: option.to_string(),
        });
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::PercentageOutOfRange {
            option: option.to_string(),
            value,
        });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Derived cost: habitat cost vs. everything else
// ---------------------------------------------------------------------------

/// Estimated project cost split derived from the habitat cost and its share.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub habitat_cost: f64,
    pub other_costs: f64,
    pub total_cost: f64,
    /// Habitat share of the total, in percent.
    pub share_percent: f64,
}

impl CostBreakdown {
    /// `total = habitat / (pct / 100)`, `other = total - habitat`.
    pub fn derive(option: &DevelopmentOption) -> Result<Self, ValidationError> {
        let share_percent = parse_percentage(&option.name, &option.cost_percentage)?;
        let habitat_cost = option.cost_of_habitats;
        if !habitat_cost.is_finite() || habitat_cost < 0.0 {
            return Err(ValidationError::InvalidCost {
                option: option.name.clone(),
                value: habitat_cost,
            });
        }
        let total_cost = habitat_cost / (share_percent / 100.0);
        if !total_cost.is_finite() {
            return Err(ValidationError::TotalOverflow {
                option: option.name.clone(),
            });
        }
        Ok(Self {
            habitat_cost,
            other_costs: total_cost - habitat_cost,
            total_cost,
            share_percent,
        })
    }

    /// `(label, value)` pairs in chart order.
    pub fn categories(&self) -> [(&'static str, f64); 2] {
        [
            (HABITAT_COST_LABEL, self.habitat_cost),
            (OTHER_COSTS_LABEL, self.other_costs),
        ]
    }
}

pub const HABITAT_COST_LABEL: &str = "Habitat Cost";
pub const OTHER_COSTS_LABEL: &str = "Other Development Costs (Estimated)";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::option;

    #[test]
    fn option_a_splits_into_fifty_and_four_fifty_thousand() {
        let b = CostBreakdown::derive(&option("Option A", 50_000.0, "10%")).unwrap();
        assert!((b.total_cost - 500_000.0).abs() < 1e-6);
        assert!((b.other_costs - 450_000.0).abs() < 1e-6);
        assert_eq!(b.habitat_cost, 50_000.0);
    }

    #[test]
    fn parts_sum_to_total() {
        for (cost, pct) in [(1.0, "0.5%"), (12_345.67, "33%"), (9e6, "100%"), (42.0, "7.25 %")] {
            let b = CostBreakdown::derive(&option("x", cost, pct)).unwrap();
            let tolerance = 1e-9 * b.total_cost.abs().max(1.0);
            assert!((b.habitat_cost + b.other_costs - b.total_cost).abs() <= tolerance);
        }
    }

    #[test]
    fn zero_percentage_is_rejected() {
        let err = CostBreakdown::derive(&option("Z", 100.0, "0%")).unwrap_err();
        assert_eq!(err, ValidationError::ZeroPercentage { option: "Z".into() });
    }

    #[test]
    fn unparseable_percentage_is_rejected() {
        for raw in ["", "%", "ten%", "NaN%", "inf"] {
            let err = CostBreakdown::derive(&option("Q", 100.0, raw)).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidPercentage { .. }),
                "{raw:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn out_of_range_percentage_is_rejected() {
        assert!(matches!(
            parse_percentage("o", "150%"),
            Err(ValidationError::PercentageOutOfRange { .. })
        ));
        assert!(matches!(
            parse_percentage("o", "-5%"),
            Err(ValidationError::PercentageOutOfRange { .. })
        ));
    }

    #[test]
    fn non_finite_or_negative_cost_is_rejected() {
        for cost in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0] {
            let err = CostBreakdown::derive(&option("C", cost, "10%")).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidCost { .. }),
                "{cost} gave {err:?}"
            );
        }
        let free = CostBreakdown::derive(&option("F", 0.0, "10%")).unwrap();
        assert_eq!(free.total_cost, 0.0);
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let err = CostBreakdown::derive(&option("H", 1e308, "0.5%")).unwrap_err();
        assert_eq!(err, ValidationError::TotalOverflow { option: "H".into() });
    }

    #[test]
    fn percentage_accepts_bare_numbers_and_whitespace() {
        assert_eq!(parse_percentage("o", " 15 % ").unwrap(), 15.0);
        assert_eq!(parse_percentage("o", "15").unwrap(), 15.0);
    }
}
