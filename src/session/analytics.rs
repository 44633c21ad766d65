use std::future::Future;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use reqwest::header;
use serde::{Serialize, Serializer};
use tokio::task::JoinHandle;

use crate::errors::AnalyticsError;

pub const DEFAULT_SUBMIT_ENDPOINT: &str = "https://script.google.com/macros/s/AKfycbyF4DdyV38fW4HYQel0HC1dEVKxuZBDl19krSi0kU2AoxWSG6FHhc5KnyJA0mHp1fQfIw/exec";
pub const DEFAULT_CALC_ENDPOINT: &str = "https://script.google.com/macros/s/AKfycbwUyVRIafjmzs1vd_bLz_zKCgngYJ0ZWYRanEy2e2AYtxRaRsqW_TtQgQS1cRpTxEdQdQ/exec";

const VARIANT: &str = "var2";
const CONTENT_TYPE: &str = "text/plain;charset=utf-8";

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionEvent {
    pub id: u64,
    pub sum: f64,
    pub auto: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorClosedEvent {
    pub id: u64,
    pub calc: String,
}

#[derive(Serialize)]
struct SubmissionPayload<'a> {
    date: String,
    auto: &'a str,
    #[serde(serialize_with = "serialize_js_number")]
    sum: f64,
    id: u64,
    vari: &'a str,
}

#[derive(Serialize)]
struct CalculatorPayload<'a> {
    date: String,
    id: u64,
    calc: &'a str,
    var: &'a str,
}

/// Best-effort delivery of form events.
pub trait Notifier: Clone + Send + Sync + 'static {
    fn send_submission(
        &self,
        event: SubmissionEvent,
    ) -> impl Future<Output = Result<(), AnalyticsError>> + Send;

    fn send_calculator_closed(
        &self,
        event: CalculatorClosedEvent,
    ) -> impl Future<Output = Result<(), AnalyticsError>> + Send;
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub submit: String,
    pub calculator: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            submit: DEFAULT_SUBMIT_ENDPOINT.to_string(),
            calculator: DEFAULT_CALC_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpNotifier {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    async fn post(&self, url: &str, body: String) -> Result<(), AnalyticsError> {
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalyticsError::Rejected(format!("{url} answered {status}")));
        }
        tracing::debug!(%url, %status, "analytics event delivered");
        Ok(())
    }
}

impl Notifier for HttpNotifier {
    async fn send_submission(&self, event: SubmissionEvent) -> Result<(), AnalyticsError> {
        let body = submission_body(&event, Local::now().naive_local())?;
        self.post(&self.endpoints.submit, body).await
    }

    async fn send_calculator_closed(
        &self,
        event: CalculatorClosedEvent,
    ) -> Result<(), AnalyticsError> {
        let body = calculator_body(&event, Local::now().naive_local())?;
        self.post(&self.endpoints.calculator, body).await
    }
}

/// Spawns the calculator-close event. Failures are logged and dropped.
pub fn notify_calculator_closed<N: Notifier>(
    notifier: &N,
    event: CalculatorClosedEvent,
) -> JoinHandle<()> {
    let notifier = notifier.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier.send_calculator_closed(event).await {
            tracing::warn!(error = %e, "calculator analytics event dropped");
        }
    })
}

/// `YYYY-M-D H:M:S` without zero padding.
pub fn format_event_date(now: &NaiveDateTime) -> String {
    format!(
        "{}-{}-{} {}:{}:{}",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

pub fn submission_body(
    event: &SubmissionEvent,
    now: NaiveDateTime,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SubmissionPayload {
        date: format_event_date(&now),
        auto: &event.auto,
        sum: event.sum,
        id: event.id,
        vari: VARIANT,
    })
}

pub fn calculator_body(
    event: &CalculatorClosedEvent,
    now: NaiveDateTime,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&CalculatorPayload {
        date: format_event_date(&now),
        id: event.id,
        calc: &event.calc,
        var: VARIANT,
    })
}

/// Whole values go out as integers, the way a browser stringifies numbers.
fn serialize_js_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
