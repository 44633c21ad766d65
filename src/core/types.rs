use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum IncomeBracket {
    #[serde(rename = "up-to-80k", alias = "upTo80k")]
    UpTo80k,
    #[serde(rename = "80k-to-150k", alias = "from80kTo150k")]
    From80kTo150k,
    #[serde(rename = "over-150k", alias = "over150k")]
    Over150k,
}

impl IncomeBracket {
    pub const ALL: [IncomeBracket; 3] = [
        IncomeBracket::UpTo80k,
        IncomeBracket::From80kTo150k,
        IncomeBracket::Over150k,
    ];

    /// Share of the monthly deposit the state matches.
    pub fn subsidy_rate(self) -> f64 {
        match self {
            IncomeBracket::UpTo80k => 1.0,
            IncomeBracket::From80kTo150k => 0.5,
            IncomeBracket::Over150k => 0.25,
        }
    }

    /// Chip value reported in the calculator analytics string.
    pub fn chip_value(self) -> u32 {
        match self {
            IncomeBracket::UpTo80k => 80_000,
            IncomeBracket::From80kTo150k => 150_000,
            IncomeBracket::Over150k => 150_001,
        }
    }

    pub fn from_chip_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.chip_value() == value)
    }

    pub fn title(self) -> &'static str {
        match self {
            IncomeBracket::UpTo80k => "Up to 80 000 ₽",
            IncomeBracket::From80kTo150k => "80 001 ₽ – 150 000 ₽",
            IncomeBracket::Over150k => "150 001 ₽ and more",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorInput {
    pub first_deposit: f64,
    pub monthly_deposit: f64,
    pub income_bracket: IncomeBracket,
    pub reinvest_tax_refund: bool,
}

impl Default for CalculatorInput {
    fn default() -> Self {
        Self {
            first_deposit: 72_000.0,
            monthly_deposit: 6_000.0,
            income_bracket: IncomeBracket::UpTo80k,
            reinvest_tax_refund: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub contributions_total: f64,
    pub state_support: f64,
    pub investment_income: f64,
    pub tax_refund: f64,
    pub grand_total: f64,
}
