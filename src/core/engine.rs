use super::types::{CalculatorInput, ProjectionResult};

pub const MAX_GOV_SUPPORT: f64 = 360_000.0;
pub const TAX_RATE: f64 = 0.13;
pub const DURATION_YEARS: u32 = 15;
pub const ANNUAL_INTEREST_RATE: f64 = 0.07;
/// The state only co-finances the first ten years of the programme.
pub const SUBSIDY_YEARS: u32 = 10;

const MONTHS_PER_YEAR: f64 = 12.0;

pub fn project(input: &CalculatorInput) -> ProjectionResult {
    let rate = input.income_bracket.subsidy_rate();
    let contributions_total = contributions_total(input.monthly_deposit);
    let state_support = state_support(input.monthly_deposit, rate);
    let investment_income = investment_income(
        input.first_deposit,
        input.monthly_deposit,
        rate,
        ANNUAL_INTEREST_RATE,
    );
    let tax_refund = tax_refund(input.monthly_deposit, TAX_RATE);

    let reinvested_refund = if input.reinvest_tax_refund {
        tax_refund
    } else {
        0.0
    };
    let grand_total = round_to(
        investment_income + state_support + reinvested_refund + contributions_total,
        2,
    );

    ProjectionResult {
        contributions_total,
        state_support,
        investment_income,
        tax_refund,
        grand_total,
    }
}

pub fn contributions_total(monthly_deposit: f64) -> f64 {
    round_to(
        monthly_deposit * MONTHS_PER_YEAR * f64::from(DURATION_YEARS),
        2,
    )
}

pub fn state_support(monthly_deposit: f64, subsidy_rate: f64) -> f64 {
    let support = monthly_deposit * subsidy_rate * f64::from(SUBSIDY_YEARS) * MONTHS_PER_YEAR;
    round_to(support.min(MAX_GOV_SUPPORT), 2)
}

/// Approximates growth of the yearly contributions plus a capped lump sum.
///
/// The denominator is `rate * 2`, not the annuity `rate`. Displayed figures
/// depend on it, so it stays.
pub fn investment_income(
    first_deposit: f64,
    monthly_deposit: f64,
    subsidy_rate: f64,
    interest_rate: f64,
) -> f64 {
    let annual_payment = monthly_deposit * MONTHS_PER_YEAR;
    let adjusted_payment = first_deposit.min(monthly_deposit * subsidy_rate * MONTHS_PER_YEAR);
    let growth = (1.0 + interest_rate).powi(DURATION_YEARS as i32) - 1.0;
    round_to(
        (annual_payment + adjusted_payment) * growth / (interest_rate * 2.0),
        2,
    )
}

pub fn tax_refund(monthly_deposit: f64, tax_rate: f64) -> f64 {
    round_to(
        monthly_deposit * tax_rate * f64::from(DURATION_YEARS) * MONTHS_PER_YEAR,
        2,
    )
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IncomeBracket;
    use proptest::prelude::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        )
    }

    fn sample_input() -> CalculatorInput {
        CalculatorInput::default()
    }

    fn is_two_decimal(value: f64) -> bool {
        (value * 100.0 - (value * 100.0).round()).abs() < 1e-3
    }

    #[test]
    fn default_input_projection_matches_reference_figures() {
        let result = project(&sample_input());

        assert_approx(result.contributions_total, 1_080_000.0);
        assert_approx(result.state_support, 360_000.0);
        assert_approx(result.investment_income, 1_809_289.58);
        assert_approx(result.tax_refund, 140_400.0);
        assert_approx(result.grand_total, 3_249_289.58);
    }

    #[test]
    fn state_support_hits_cap_for_lowest_bracket() {
        assert_approx(state_support(6_000.0, 1.0), 360_000.0);
    }

    #[test]
    fn state_support_quarter_rate_for_top_bracket() {
        let rate = IncomeBracket::Over150k.subsidy_rate();
        assert_approx(state_support(1_000.0, rate), 30_000.0);
    }

    #[test]
    fn subsidy_rate_follows_bracket() {
        assert_approx(IncomeBracket::UpTo80k.subsidy_rate(), 1.0);
        assert_approx(IncomeBracket::From80kTo150k.subsidy_rate(), 0.5);
        assert_approx(IncomeBracket::Over150k.subsidy_rate(), 0.25);
    }

    #[test]
    fn investment_income_caps_first_deposit_by_subsidised_year() {
        // Half-rate bracket: only 36 000 of the first deposit is counted.
        let capped = investment_income(500_000.0, 6_000.0, 0.5, ANNUAL_INTEREST_RATE);
        let exact = investment_income(36_000.0, 6_000.0, 0.5, ANNUAL_INTEREST_RATE);
        assert_approx(capped, exact);

        let expected = round_to(
            (72_000.0 + 36_000.0) * (1.07f64.powi(15) - 1.0) / 0.14,
            2,
        );
        assert_approx(capped, expected);
    }

    #[test]
    fn investment_income_uses_smaller_first_deposit_when_below_cap() {
        let result = investment_income(0.0, 2_000.0, 1.0, ANNUAL_INTEREST_RATE);
        assert_approx(result, 301_548.26);
    }

    #[test]
    fn reinvesting_tax_refund_adds_exactly_the_refund() {
        let mut input = sample_input();
        input.monthly_deposit = 12_345.0;
        let without = project(&input);
        input.reinvest_tax_refund = true;
        let with = project(&input);

        assert_approx(with.grand_total - without.grand_total, with.tax_refund);
        assert_approx(with.tax_refund, without.tax_refund);
    }

    #[test]
    fn round_to_is_half_up_for_positive_values() {
        assert_approx(round_to(2.345, 1), 2.3);
        assert_approx(round_to(0.125, 2), 0.13);
        assert_approx(round_to(12.0, 2), 12.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(256))]

        #[test]
        fn prop_contributions_total_is_monthly_times_180(monthly in 2_000u32..=3_000_000) {
            let monthly = monthly as f64;
            prop_assert!((contributions_total(monthly) - monthly * 180.0).abs() <= EPS);
        }

        #[test]
        fn prop_tax_refund_is_thirteen_percent_of_contributions(monthly in 2_000u32..=3_000_000) {
            let monthly = monthly as f64;
            let expected = round_to(monthly * 0.13 * 180.0, 2);
            prop_assert!((tax_refund(monthly, TAX_RATE) - expected).abs() <= EPS);
        }

        #[test]
        fn prop_projection_respects_invariants(
            first_cents in 0u64..1_000_000_000,
            monthly_cents in 200_000u64..=300_000_000,
            bracket in prop::sample::select(IncomeBracket::ALL.to_vec()),
            reinvest in any::<bool>()
        ) {
            let input = CalculatorInput {
                first_deposit: first_cents as f64 / 100.0,
                monthly_deposit: monthly_cents as f64 / 100.0,
                income_bracket: bracket,
                reinvest_tax_refund: reinvest,
            };
            let result = project(&input);

            prop_assert!(result.state_support <= MAX_GOV_SUPPORT);
            prop_assert!(result.state_support >= 0.0);
            for value in [
                result.contributions_total,
                result.state_support,
                result.investment_income,
                result.tax_refund,
                result.grand_total,
            ] {
                prop_assert!(value.is_finite());
                prop_assert!(is_two_decimal(value));
            }

            let refund = if reinvest { result.tax_refund } else { 0.0 };
            let expected = result.investment_income
                + result.state_support
                + refund
                + result.contributions_total;
            prop_assert!((result.grand_total - expected).abs() <= 1e-3);
        }
    }
}
