use super::model::DevelopmentOption;

// ---------------------------------------------------------------------------
// Display metrics for the selected option
// ---------------------------------------------------------------------------

/// Pre-formatted values shown in the metric row of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionMetrics {
    pub name: String,
    pub bng: String,
    /// Habitat units to two decimals.
    pub habitat_units: String,
    /// Habitat cost as a grouped pound amount.
    pub cost: String,
    /// Habitat share exactly as written in the table.
    pub cost_share: String,
}

impl From<&DevelopmentOption> for OptionMetrics {
    fn from(option: &DevelopmentOption) -> Self {
        OptionMetrics {
            name: option.name.clone(),
            bng: option.bng.clone(),
            habitat_units: format!("{:.2}", option.habitat_units),
            cost: format_pounds(option.cost_of_habitats),
            cost_share: option.cost_percentage.trim().to_string(),
        }
    }
}

impl OptionMetrics {
    /// The sentence under the metric row, split so the share can be emphasised.
    pub fn share_sentence(&self) -> (&'static str, &str, &'static str) {
        (
            "This option has a habitat cost that is ",
            &self.cost_share,
            " of the total development cost.",
        )
    }
}

/// `50000.0` → `£50,000`; `1234.5` → `£1,234.50`.  Non-finite amounts
/// show as `n/a`.
pub fn format_pounds(amount: f64) -> String {
    if !amount.is_finite() {
        return "n/a".to_string();
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();
    if abs.fract() == 0.0 {
        format!("{sign}£{}", group_thousands(&format!("{abs:.0}")))
    } else {
        let fixed = format!("{abs:.2}");
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        format!("{sign}£{}.{frac_part}", group_thousands(int_part))
    }
}

/// Whole pounds, as used on the bar labels (`£%{x:,.0f}`).
pub fn format_pounds_rounded(amount: f64) -> String {
    format_pounds(amount.round())
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::option;

    #[test]
    fn option_a_metrics() {
        let m = OptionMetrics::from(&option("Option A", 50_000.0, "10%"));
        assert_eq!(m.bng, "5%");
        assert_eq!(m.habitat_units, "12.34");
        assert_eq!(m.cost, "£50,000");
        assert_eq!(m.share_sentence().1, "10%");
    }

    #[test]
    fn pounds_grouping() {
        assert_eq!(format_pounds(0.0), "£0");
        assert_eq!(format_pounds(999.0), "£999");
        assert_eq!(format_pounds(1_000.0), "£1,000");
        assert_eq!(format_pounds(450_000.0), "£450,000");
        assert_eq!(format_pounds(1_234_567.0), "£1,234,567");
        assert_eq!(format_pounds(1_234.5), "£1,234.50");
        assert_eq!(format_pounds(-2_500.0), "-£2,500");
        assert_eq!(format_pounds_rounded(449_999.6), "£450,000");
    }

    #[test]
    fn non_finite_amounts_are_not_shown_as_pounds() {
        assert_eq!(format_pounds(f64::NAN), "n/a");
        assert_eq!(format_pounds(f64::INFINITY), "n/a");
        assert_eq!(format_pounds_rounded(f64::NEG_INFINITY), "n/a");
    }

    #[test]
    fn habitat_units_round_to_two_places() {
        let mut opt = option("o", 1.0, "1%");
        opt.habitat_units = 3.14159;
        assert_eq!(OptionMetrics::from(&opt).habitat_units, "3.14");
    }
}
