use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::core::{
    CalculatorInput, DURATION_YEARS, IncomeBracket, ProjectionResult, clamp_deposit,
    clamp_first_deposit, format_rub, project,
};
use crate::errors::{FormError, SessionError};
use crate::session::{
    AMOUNT_CHIPS, CalculatorField, CalculatorUpdate, DEFAULT_CALC_ENDPOINT,
    DEFAULT_SUBMIT_ENDPOINT, DepositForm, Endpoints, HttpNotifier, Notifier, SessionStore,
    SessionView, SubmissionEvent, SubmitFailurePolicy, calc_summary, notify_calculator_closed,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliIncomeBracket {
    #[value(name = "up-to-80k")]
    UpTo80k,
    #[value(name = "80k-to-150k")]
    From80kTo150k,
    #[value(name = "over-150k")]
    Over150k,
}

impl From<CliIncomeBracket> for IncomeBracket {
    fn from(value: CliIncomeBracket) -> Self {
        match value {
            CliIncomeBracket::UpTo80k => IncomeBracket::UpTo80k,
            CliIncomeBracket::From80kTo150k => IncomeBracket::From80kTo150k,
            CliIncomeBracket::Over150k => IncomeBracket::Over150k,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliSubmitFailurePolicy {
    Optimistic,
    Report,
}

impl From<CliSubmitFailurePolicy> for SubmitFailurePolicy {
    fn from(value: CliSubmitFailurePolicy) -> Self {
        match value {
            CliSubmitFailurePolicy::Optimistic => SubmitFailurePolicy::Optimistic,
            CliSubmitFailurePolicy::Report => SubmitFailurePolicy::Report,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "deposit_form",
    about = "Deposit form with a 15-year savings projection"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the form and its JSON API.
    Serve(ServeArgs),
    /// Print a projection for the given calculator inputs.
    Project(ProjectArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(
        long,
        help = "JSON file for the user id and confirmation flag; in-memory when omitted"
    )]
    store_path: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_SUBMIT_ENDPOINT)]
    submit_endpoint: String,
    #[arg(long, default_value = DEFAULT_CALC_ENDPOINT)]
    calc_endpoint: String,
    #[arg(
        long,
        value_enum,
        default_value_t = CliSubmitFailurePolicy::Optimistic,
        help = "Whether a failed submission event still shows the confirmation"
    )]
    on_submit_failure: CliSubmitFailurePolicy,
}

#[derive(Args, Debug, Clone)]
struct ProjectArgs {
    #[arg(long, default_value_t = 72_000.0, help = "First deposit, at least 2000")]
    first_deposit: f64,
    #[arg(
        long,
        default_value_t = 6_000.0,
        help = "Monthly deposit, clamped to 2000..=3000000"
    )]
    monthly_deposit: f64,
    #[arg(long, value_enum, default_value_t = CliIncomeBracket::UpTo80k)]
    income: CliIncomeBracket,
    #[arg(long, help = "Reinvest the yearly tax refund into the programme")]
    reinvest_tax_refund: bool,
    #[arg(long, help = "Print the projection as JSON")]
    json: bool,
}

pub async fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => {
            let config = build_server_config(args)?;
            run_http_server(config).await.map_err(|e| e.to_string())
        }
        Command::Project(args) => {
            let input = build_input(&args)?;
            let result = project(&input);
            if args.json {
                let response = build_project_response(input, result);
                let json = serde_json::to_string_pretty(&response)
                    .map_err(|e| format!("Could not encode projection: {e}"))?;
                println!("{json}");
            } else {
                print!("{}", render_projection_text(&input, &result));
            }
            Ok(())
        }
    }
}

fn build_server_config(args: ServeArgs) -> Result<ServerConfig, String> {
    let config = ServerConfig {
        port: args.port,
        store_path: args.store_path,
        endpoints: Endpoints {
            submit: args.submit_endpoint,
            calculator: args.calc_endpoint,
        },
        submit_failure_policy: args.on_submit_failure.into(),
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn build_input(args: &ProjectArgs) -> Result<CalculatorInput, String> {
    if !args.first_deposit.is_finite() || args.first_deposit < 0.0 {
        return Err("--first-deposit must be >= 0".to_string());
    }
    if !args.monthly_deposit.is_finite() || args.monthly_deposit < 0.0 {
        return Err("--monthly-deposit must be >= 0".to_string());
    }

    Ok(CalculatorInput {
        first_deposit: clamp_first_deposit(args.first_deposit),
        monthly_deposit: clamp_deposit(args.monthly_deposit),
        income_bracket: args.income.into(),
        reinvest_tax_refund: args.reinvest_tax_refund,
    })
}

fn render_projection_text(input: &CalculatorInput, result: &ProjectionResult) -> String {
    let mut rows = vec![
        ("Income from investments", result.investment_income),
        ("State will add", result.state_support),
    ];
    if input.reinvest_tax_refund {
        rows.push(("Tax refunds will add", result.tax_refund));
    }
    rows.push((
        "Contributions over the term",
        result.contributions_total,
    ));

    let mut out = format!(
        "Savings after {DURATION_YEARS} years: {}\n",
        format_rub(result.grand_total)
    );
    for (label, value) in rows {
        out.push_str(&format!("  {label:<28} {}\n", format_rub(value)));
    }
    out
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    first_deposit: Option<f64>,
    monthly_deposit: Option<f64>,
    income: Option<u32>,
    reinvest_tax_refund: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    input: CalculatorInput,
    projection: ProjectionResult,
    calc: String,
    grand_total_formatted: String,
}

#[derive(Debug, Deserialize)]
struct AmountPayload {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ChipPayload {
    value: u32,
}

#[derive(Debug, Deserialize)]
struct BlurPayload {
    field: CalculatorField,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn input_from_payload(payload: ProjectPayload) -> Result<CalculatorInput, String> {
    let mut input = CalculatorInput::default();
    if let Some(v) = payload.first_deposit {
        input.first_deposit = v;
    }
    if let Some(v) = payload.monthly_deposit {
        input.monthly_deposit = v;
    }
    if let Some(v) = payload.income {
        input.income_bracket = IncomeBracket::from_chip_value(v)
            .ok_or_else(|| format!("income must be one of 80000, 150000, 150001, got {v}"))?;
    }
    if let Some(v) = payload.reinvest_tax_refund {
        input.reinvest_tax_refund = v;
    }

    if !input.first_deposit.is_finite() || input.first_deposit < 0.0 {
        return Err("firstDeposit must be >= 0".to_string());
    }
    if !input.monthly_deposit.is_finite() || input.monthly_deposit < 0.0 {
        return Err("monthlyDeposit must be >= 0".to_string());
    }
    Ok(input)
}

fn build_project_response(input: CalculatorInput, projection: ProjectionResult) -> ProjectResponse {
    ProjectResponse {
        calc: calc_summary(&input),
        grand_total_formatted: format_rub(projection.grand_total),
        input,
        projection,
    }
}

pub struct AppState<N: Notifier> {
    form: Arc<Mutex<DepositForm<SessionStore>>>,
    notifier: N,
}

impl<N: Notifier> Clone for AppState<N> {
    fn clone(&self) -> Self {
        Self {
            form: Arc::clone(&self.form),
            notifier: self.notifier.clone(),
        }
    }
}

impl<N: Notifier> AppState<N> {
    pub fn new(form: DepositForm<SessionStore>, notifier: N) -> Self {
        Self {
            form: Arc::new(Mutex::new(form)),
            notifier,
        }
    }
}

pub fn router<N: Notifier>(state: AppState<N>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/session", get(session_handler::<N>))
        .route("/api/session/amount", post(amount_handler::<N>))
        .route("/api/session/amount/blur", post(amount_blur_handler::<N>))
        .route("/api/session/chip", post(chip_handler::<N>))
        .route(
            "/api/session/calculator",
            post(calculator_update_handler::<N>),
        )
        .route(
            "/api/session/calculator/open",
            post(calculator_open_handler::<N>),
        )
        .route(
            "/api/session/calculator/blur",
            post(calculator_blur_handler::<N>),
        )
        .route(
            "/api/session/calculator/close",
            post(calculator_close_handler::<N>),
        )
        .route("/api/session/submit", post(submit_handler::<N>))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let store = SessionStore::open(config.store_path.as_deref()).map_err(std::io::Error::other)?;
    let form =
        DepositForm::start(store, config.submit_failure_policy).map_err(std::io::Error::other)?;
    let notifier = HttpNotifier::new(config.endpoints.clone());
    let app = router(AppState::new(form, notifier));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, policy = ?config.submit_failure_policy, "deposit form listening");
    tracing::info!("Local access: http://127.0.0.1:{}/", config.port);

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    let input = match input_from_payload(payload) {
        Ok(input) => input,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let projection = project(&input);
    json_response(StatusCode::OK, build_project_response(input, projection))
}

async fn session_handler<N: Notifier>(State(state): State<AppState<N>>) -> Response {
    let form = state.form.lock().await;
    json_response(StatusCode::OK, form.view())
}

async fn amount_handler<N: Notifier>(
    State(state): State<AppState<N>>,
    Json(payload): Json<AmountPayload>,
) -> Response {
    let mut form = state.form.lock().await;
    form.set_amount(payload.value);
    json_response(StatusCode::OK, form.view())
}

async fn amount_blur_handler<N: Notifier>(State(state): State<AppState<N>>) -> Response {
    let mut form = state.form.lock().await;
    form.blur_amount();
    json_response(StatusCode::OK, form.view())
}

async fn chip_handler<N: Notifier>(
    State(state): State<AppState<N>>,
    Json(payload): Json<ChipPayload>,
) -> Response {
    if !AMOUNT_CHIPS.contains(&payload.value) {
        return error_response(
            StatusCode::BAD_REQUEST,
            &format!("Unknown amount chip {}", payload.value),
        );
    }
    let mut form = state.form.lock().await;
    form.select_chip(payload.value);
    json_response(StatusCode::OK, form.view())
}

async fn calculator_update_handler<N: Notifier>(
    State(state): State<AppState<N>>,
    Json(update): Json<CalculatorUpdate>,
) -> Response {
    for (name, value) in [
        ("firstDeposit", update.first_deposit),
        ("monthlyDeposit", update.monthly_deposit),
    ] {
        if let Some(v) = value {
            if !v.is_finite() {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("{name} must be a finite number"),
                );
            }
        }
    }
    let mut form = state.form.lock().await;
    form.update_calculator(update);
    json_response(StatusCode::OK, form.view())
}

async fn calculator_open_handler<N: Notifier>(State(state): State<AppState<N>>) -> Response {
    let mut form = state.form.lock().await;
    form.open_calculator();
    json_response(StatusCode::OK, form.view())
}

async fn calculator_blur_handler<N: Notifier>(
    State(state): State<AppState<N>>,
    Json(payload): Json<BlurPayload>,
) -> Response {
    let mut form = state.form.lock().await;
    form.blur_calculator(payload.field);
    json_response(StatusCode::OK, form.view())
}

async fn calculator_close_handler<N: Notifier>(State(state): State<AppState<N>>) -> Response {
    let mut form = state.form.lock().await;
    if let Some(event) = form.close_calculator() {
        tracing::debug!(calc = %event.calc, "calculator closed");
        notify_calculator_closed(&state.notifier, event);
    }
    json_response(StatusCode::OK, form.view())
}

async fn submit_handler<N: Notifier>(State(state): State<AppState<N>>) -> Response {
    let event = {
        let mut form = state.form.lock().await;
        match form.begin_submit() {
            Ok(event) => event,
            // Inline error; the view carries the message.
            Err(FormError::EmptyAmount) => return json_response(StatusCode::OK, form.view()),
            Err(e) => return error_response(StatusCode::CONFLICT, &e.to_string()),
        }
    };

    // Detached so a dropped request cannot leave the form loading.
    let delivery = tokio::spawn(deliver_submission(state, event));
    match delivery.await {
        Ok(Ok(view)) => json_response(StatusCode::OK, view),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "could not persist confirmation");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "submission task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Submission failed")
        }
    }
}

async fn deliver_submission<N: Notifier>(
    state: AppState<N>,
    event: SubmissionEvent,
) -> Result<SessionView, SessionError> {
    let outcome = state.notifier.send_submission(event).await;
    let mut form = state.form.lock().await;
    form.finish_submit(outcome)?;
    Ok(form.view())
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
