mod clamp;
mod engine;
mod format;
mod types;

pub use clamp::{MAX_DEPOSIT, MIN_DEPOSIT, clamp_deposit, clamp_first_deposit, parse_amount};
pub use engine::{
    ANNUAL_INTEREST_RATE, DURATION_YEARS, MAX_GOV_SUPPORT, SUBSIDY_YEARS, TAX_RATE,
    contributions_total, investment_income, project, round_to, state_support, tax_refund,
};
pub use format::{format_amount, format_rub};
pub use types::{CalculatorInput, IncomeBracket, ProjectionResult};
