mod analytics;
mod form;
mod store;

pub use analytics::{
    CalculatorClosedEvent, DEFAULT_CALC_ENDPOINT, DEFAULT_SUBMIT_ENDPOINT, Endpoints,
    HttpNotifier, Notifier, SubmissionEvent, calculator_body, format_event_date,
    notify_calculator_closed, submission_body,
};
pub use form::{
    AMOUNT_CHIPS, CALC_OPEN_EVENT, CalculatorField, CalculatorUpdate, DepositForm, FormattedFigures, IncomeOption,
    SessionView, SubmitFailurePolicy, calc_summary,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, SessionStore, StoreKey};

#[cfg(test)]
pub(crate) use analytics::testing;
