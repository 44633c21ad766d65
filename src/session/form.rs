use serde::{Deserialize, Serialize};

use super::analytics::{CalculatorClosedEvent, Notifier, SubmissionEvent};
use super::store::{KeyValueStore, StoreKey};
use crate::core::{
    CalculatorInput, IncomeBracket, MAX_DEPOSIT, MIN_DEPOSIT, ProjectionResult, clamp_deposit,
    clamp_first_deposit, format_rub, parse_amount, project,
};
use crate::errors::{AnalyticsError, FormError, SessionError, StoreError};

pub const AMOUNT_CHIPS: [u32; 4] = [2_000, 5_000, 15_000, 25_000];

const AUTO_PAYMENT_NONE: &str = "None";
const HEADLINE_PLACEHOLDER: &str = "X";
/// Tag-manager event name for opening the calculator sheet.
pub const CALC_OPEN_EVENT: &str = "calc_4597_var2";

/// What happens to the form when the submission event cannot be delivered.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitFailurePolicy {
    /// Show the confirmation anyway.
    #[default]
    Optimistic,
    /// Stay on the form with an inline error so the user can retry.
    Report,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculatorField {
    #[serde(alias = "firstDeposit", alias = "first_deposit")]
    FirstDeposit,
    #[serde(alias = "monthlyDeposit", alias = "monthly_deposit")]
    MonthlyDeposit,
}

/// Partial calculator edit; absent fields keep their value.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculatorUpdate {
    pub first_deposit: Option<f64>,
    pub monthly_deposit: Option<f64>,
    pub income: Option<IncomeBracket>,
    pub reinvest_tax_refund: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedFigures {
    pub grand_total: String,
    pub investment_income: String,
    pub state_support: String,
    /// Only shown while the refund is reinvested.
    pub tax_refund: Option<String>,
    pub contributions_total: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeOption {
    pub value: u32,
    pub bracket: IncomeBracket,
    pub title: &'static str,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user_id: u64,
    pub confirmed: bool,
    pub amount: String,
    pub error: Option<String>,
    pub loading: bool,
    pub headline: String,
    pub amount_chips: [u32; 4],
    pub min_deposit: f64,
    pub max_deposit: f64,
    pub calculator_open: bool,
    pub calculator: CalculatorInput,
    pub income_options: Vec<IncomeOption>,
    pub projection: ProjectionResult,
    pub figures: FormattedFigures,
}

#[derive(Debug)]
pub struct DepositForm<S: KeyValueStore> {
    store: S,
    user_id: u64,
    amount: String,
    error: Option<FormError>,
    loading: bool,
    calculator_open: bool,
    calculator: CalculatorInput,
    confirmed: bool,
    failure_policy: SubmitFailurePolicy,
}

impl<S: KeyValueStore> DepositForm<S> {
    pub fn start(store: S, failure_policy: SubmitFailurePolicy) -> Result<Self, StoreError> {
        let now_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        Self::start_at(store, failure_policy, now_ms)
    }

    /// Starts the session, minting `now_ms` as user id when none is stored.
    pub fn start_at(
        mut store: S,
        failure_policy: SubmitFailurePolicy,
        now_ms: u64,
    ) -> Result<Self, StoreError> {
        let user_id = match store.get::<Option<u64>>(StoreKey::UserId, None) {
            Some(id) if id != 0 => id,
            _ => {
                store.set(StoreKey::UserId, &now_ms)?;
                tracing::info!(user_id = now_ms, "assigned new user id");
                now_ms
            }
        };
        let confirmed = store.get(StoreKey::ShowThx, false);
        if confirmed {
            tracing::debug!(user_id, "resuming confirmed session");
        }

        Ok(Self {
            store,
            user_id,
            amount: String::new(),
            error: None,
            loading: false,
            calculator_open: false,
            calculator: CalculatorInput::default(),
            confirmed,
            failure_policy,
        })
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn is_calculator_open(&self) -> bool {
        self.calculator_open
    }

    pub fn calculator(&self) -> &CalculatorInput {
        &self.calculator
    }

    pub fn failure_policy(&self) -> SubmitFailurePolicy {
        self.failure_policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn set_amount(&mut self, raw: impl Into<String>) {
        self.error = None;
        self.amount = raw.into();
        self.calculator.monthly_deposit = parse_amount(&self.amount);
    }

    pub fn select_chip(&mut self, chip: u32) {
        self.set_amount(chip.to_string());
    }

    pub fn blur_amount(&mut self) {
        let value = parse_amount(&self.amount);
        let clamped = clamp_deposit(value);
        if clamped != value {
            self.amount = clamped.to_string();
            self.calculator.monthly_deposit = clamped;
        }
    }

    pub fn open_calculator(&mut self) {
        tracing::info!(user_id = self.user_id, event = CALC_OPEN_EVENT, "calculator opened");
        self.calculator_open = true;
    }

    pub fn update_calculator(&mut self, update: CalculatorUpdate) {
        if let Some(v) = update.first_deposit {
            self.calculator.first_deposit = v;
        }
        if let Some(v) = update.monthly_deposit {
            self.calculator.monthly_deposit = v;
        }
        if let Some(v) = update.income {
            self.calculator.income_bracket = v;
        }
        if let Some(v) = update.reinvest_tax_refund {
            self.calculator.reinvest_tax_refund = v;
        }
    }

    pub fn select_income(&mut self, bracket: IncomeBracket) {
        self.calculator.income_bracket = bracket;
    }

    pub fn toggle_reinvest(&mut self) {
        self.calculator.reinvest_tax_refund = !self.calculator.reinvest_tax_refund;
    }

    pub fn blur_calculator(&mut self, field: CalculatorField) {
        match field {
            CalculatorField::FirstDeposit => {
                self.calculator.first_deposit = clamp_first_deposit(self.calculator.first_deposit);
            }
            CalculatorField::MonthlyDeposit => {
                self.calculator.monthly_deposit = clamp_deposit(self.calculator.monthly_deposit);
            }
        }
    }

    /// Closes the sheet. Returns the analytics event to send, or `None` when
    /// the sheet was not open.
    pub fn close_calculator(&mut self) -> Option<CalculatorClosedEvent> {
        if !self.calculator_open {
            return None;
        }
        self.calculator_open = false;
        Some(CalculatorClosedEvent {
            id: self.user_id,
            calc: calc_summary(&self.calculator),
        })
    }

    pub fn projection(&self) -> ProjectionResult {
        project(&self.calculator)
    }

    pub fn headline(&self) -> String {
        if self.amount.is_empty() {
            return format!("{HEADLINE_PLACEHOLDER} ₽");
        }
        format_rub(self.projection().grand_total)
    }

    pub fn begin_submit(&mut self) -> Result<SubmissionEvent, FormError> {
        if self.confirmed {
            return Err(FormError::AlreadyConfirmed);
        }
        if self.loading {
            return Err(FormError::SubmitInProgress);
        }
        if self.amount.is_empty() {
            self.error = Some(FormError::EmptyAmount);
            return Err(FormError::EmptyAmount);
        }

        self.error = None;
        self.loading = true;
        Ok(SubmissionEvent {
            id: self.user_id,
            sum: parse_amount(&self.amount),
            auto: AUTO_PAYMENT_NONE.to_string(),
        })
    }

    pub fn finish_submit(&mut self, outcome: Result<(), AnalyticsError>) -> Result<(), StoreError> {
        self.loading = false;
        match outcome {
            Ok(()) => self.confirm(),
            Err(e) => {
                tracing::warn!(error = %e, policy = ?self.failure_policy, "submission event failed");
                match self.failure_policy {
                    SubmitFailurePolicy::Optimistic => self.confirm(),
                    SubmitFailurePolicy::Report => {
                        self.error = Some(FormError::DeliveryFailed);
                        Ok(())
                    }
                }
            }
        }
    }

    /// Sends the submission and waits for it before leaving the form.
    pub async fn submit<N: Notifier>(&mut self, notifier: &N) -> Result<(), SessionError> {
        let event = self.begin_submit()?;
        let outcome = notifier.send_submission(event).await;
        self.finish_submit(outcome)?;
        Ok(())
    }

    fn confirm(&mut self) -> Result<(), StoreError> {
        self.store.set(StoreKey::ShowThx, &true)?;
        self.confirmed = true;
        tracing::info!(user_id = self.user_id, "deposit submission confirmed");
        Ok(())
    }

    pub fn view(&self) -> SessionView {
        let projection = self.projection();
        let figures = FormattedFigures {
            grand_total: format_rub(projection.grand_total),
            investment_income: format_rub(projection.investment_income),
            state_support: format_rub(projection.state_support),
            tax_refund: self
                .calculator
                .reinvest_tax_refund
                .then(|| format_rub(projection.tax_refund)),
            contributions_total: format_rub(projection.contributions_total),
        };
        let income_options = IncomeBracket::ALL
            .into_iter()
            .map(|bracket| IncomeOption {
                value: bracket.chip_value(),
                bracket,
                title: bracket.title(),
                selected: bracket == self.calculator.income_bracket,
            })
            .collect();

        SessionView {
            user_id: self.user_id,
            confirmed: self.confirmed,
            amount: self.amount.clone(),
            error: self.error.as_ref().map(ToString::to_string),
            loading: self.loading,
            headline: self.headline(),
            amount_chips: AMOUNT_CHIPS,
            min_deposit: MIN_DEPOSIT,
            max_deposit: MAX_DEPOSIT,
            calculator_open: self.calculator_open,
            calculator: self.calculator,
            income_options,
            projection,
            figures,
        }
    }
}

/// `<income>,<first>,<monthly>,<T|F>` as reported on calculator close.
pub fn calc_summary(input: &CalculatorInput) -> String {
    format!(
        "{},{},{},{}",
        input.income_bracket.chip_value(),
        input.first_deposit,
        input.monthly_deposit,
        if input.reinvest_tax_refund { 'T' } else { 'F' }
    )
}
