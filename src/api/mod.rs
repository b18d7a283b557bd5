use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info};
use uuid::Uuid;

use crate::coach::{
    CHAT_HISTORY_WINDOW, ChatMessage, Coach, CoachError, LifestyleProfile, ResponseSource, Role,
};
use crate::config::ServeArgs;
use crate::core::{
    CORPORATE_BUYERS, CorporateLedger, CorporateLiability, DEFAULT_LUMP_SUM_YEARS, FUNDS,
    FootprintLedger, FundKind, FundProjection, LumpSumProjection, MIN_BLOCK_TRADE_KG, PROJECTS,
    Project, RiskProfile, SipOverrides, Treasury, ValidationError, find_project,
    format_large_number, projects_in, risk_profile,
};
use crate::dataset::{FootprintBaseline, load_footprint};
use crate::session::{CartSummary, SessionSnapshot, SessionStore};

const DEFAULT_FUND: FundKind = FundKind::SolarEnergy;
const DEFAULT_MONTHLY_AMOUNT: f64 = 5_000.0;
const DEFAULT_PROJECTION_YEARS: u32 = 5;
const DEFAULT_LUMP_SUM_AMOUNT: f64 = 25_000.0;
const DEFAULT_BLOCK_TRADE_KG: f64 = 250_000.0;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to start HTTP listener: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build generation client: {0}")]
    Coach(#[from] CoachError),
}

/// Shared, read-mostly state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub coach: Arc<Coach>,
    pub baseline: FootprintBaseline,
    pub corporates: Arc<CorporateLedger>,
    pub treasury: Treasury,
}

impl AppState {
    pub fn new(coach: Coach, baseline: FootprintBaseline) -> Self {
        Self {
            sessions: SessionStore::default(),
            coach: Arc::new(coach),
            baseline,
            corporates: Arc::new(CorporateLedger::standard()),
            treasury: Treasury::default(),
        }
    }
}

#[derive(Debug)]
enum ApiError {
    Validation(ValidationError),
    BadRequest(String),
    NotFound(String),
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        ApiError::Validation(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
            ApiError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
            ApiError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, &msg),
        }
    }
}

type ApiResult = Result<Response, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    fund: Option<FundKind>,
    monthly_amount: Option<f64>,
    years: Option<u32>,
    annual_rate_percent: Option<f64>,
    yield_per_thousand: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectsQuery {
    portfolios: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RoiPayload {
    amount: Option<f64>,
    years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct QuotePayload {
    buyer: Option<String>,
    volume_kg: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartPayload {
    fund: FundKind,
    monthly_amount: f64,
}

#[derive(Debug, Deserialize)]
struct ChatPayload {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoiResponse {
    project_id: u32,
    irr_percent: f64,
    #[serde(flatten)]
    projection: LumpSumProjection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormattedLiability {
    annual_emissions: String,
    safe_target: String,
    deficit: String,
    liability: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CorporateDetailResponse<'a> {
    #[serde(flatten)]
    row: &'a CorporateLiability,
    emission_share_percent: f64,
    formatted: FormattedLiability,
    risk_profile: RiskProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TreasuryResponse {
    #[serde(flatten)]
    treasury: Treasury,
    available_kg: f64,
    min_block_trade_kg: f64,
    buyers: &'static [&'static str],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MandateResponse {
    authorized: CartSummary,
    session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    reply: String,
    source: ResponseSource,
    warning: Option<String>,
    history_len: usize,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/funds", get(funds_handler))
        .route("/api/footprint", get(footprint_handler))
        .route("/api/projects", get(projects_handler))
        .route("/api/projects/:id", get(project_handler))
        .route(
            "/api/projects/:id/roi",
            get(roi_get_handler).post(roi_post_handler),
        )
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .route("/api/corporates", get(corporates_handler))
        .route("/api/corporates/:rank", get(corporate_handler))
        .route("/api/treasury", get(treasury_handler))
        .route("/api/treasury/quote", post(quote_handler))
        .route("/api/sessions", post(create_session_handler))
        .route("/api/sessions/:id", get(session_handler))
        .route("/api/sessions/:id/cart", post(add_to_cart_handler))
        .route("/api/sessions/:id/cart/:index", delete(remove_from_cart_handler))
        .route("/api/sessions/:id/mandates", post(mandates_handler))
        .route("/api/sessions/:id/chat", post(chat_handler))
        .route("/api/sessions/:id/report", post(report_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(args: &ServeArgs) -> Result<(), ServerError> {
    let baseline = load_footprint(args.dataset.as_deref());
    let coach = Coach::new(args.coach_config())?;
    if !coach.is_live() {
        info!("no generation API key configured, coach runs in offline mode");
    }
    let state = AppState {
        sessions: SessionStore::with_capacity(args.max_sessions),
        ..AppState::new(coach, baseline)
    };
    let app = build_app(state);

    let addr = args.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, baseline_kg = baseline.carbon_kg, source = ?baseline.source, "EcoInvest HTTP API listening");
    info!("Local access: http://127.0.0.1:{}/api/funds", args.port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn funds_handler() -> Response {
    json_response(StatusCode::OK, &FUNDS)
}

async fn footprint_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.baseline)
}

async fn projects_handler(Query(query): Query<ProjectsQuery>) -> ApiResult {
    let projects = match query.portfolios {
        None => PROJECTS.iter().collect(),
        Some(raw) => {
            let kinds = parse_portfolios(&raw)?;
            projects_in(&kinds)
        }
    };
    Ok(json_response(StatusCode::OK, projects))
}

fn parse_portfolios(raw: &str) -> Result<Vec<FundKind>, ValidationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(FundKind::from_str)
        .collect()
}

async fn project_handler(Path(id): Path<String>) -> ApiResult {
    let project = lookup_project(&id)?;
    Ok(json_response(StatusCode::OK, project))
}

async fn roi_get_handler(Path(id): Path<String>, Query(payload): Query<RoiPayload>) -> ApiResult {
    roi_handler_impl(&id, payload)
}

async fn roi_post_handler(Path(id): Path<String>, Json(payload): Json<RoiPayload>) -> ApiResult {
    roi_handler_impl(&id, payload)
}

fn roi_handler_impl(id: &str, payload: RoiPayload) -> ApiResult {
    let project = lookup_project(id)?;
    let projection = project.roi(
        payload.amount.unwrap_or(DEFAULT_LUMP_SUM_AMOUNT),
        payload.years.unwrap_or(DEFAULT_LUMP_SUM_YEARS),
    )?;
    Ok(json_response(
        StatusCode::OK,
        RoiResponse {
            project_id: project.id,
            irr_percent: project.kind.fund().irr_percent,
            projection,
        },
    ))
}

fn lookup_project(raw_id: &str) -> Result<&'static Project, ApiError> {
    raw_id
        .parse::<u32>()
        .ok()
        .and_then(find_project)
        .ok_or_else(|| ApiError::NotFound(format!("Project {raw_id} not found")))
}

async fn projection_get_handler(Query(payload): Query<ProjectionPayload>) -> ApiResult {
    projection_handler_impl(payload)
}

async fn projection_post_handler(Json(payload): Json<ProjectionPayload>) -> ApiResult {
    projection_handler_impl(payload)
}

fn projection_handler_impl(payload: ProjectionPayload) -> ApiResult {
    let projection = projection_from_payload(payload)?;
    debug!(fund = %projection.fund, months = projection.duration_months, "projected SIP");
    Ok(json_response(StatusCode::OK, projection))
}

#[cfg(test)]
fn projection_from_json(json: &str) -> Result<FundProjection, String> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    projection_from_payload(payload).map_err(|e| e.to_string())
}

/// Missing fields fall back to the default SIP; rate and yield default to
/// the chosen fund's parameters.
fn projection_from_payload(payload: ProjectionPayload) -> Result<FundProjection, ValidationError> {
    payload.fund.unwrap_or(DEFAULT_FUND).fund().project_sip(
        payload.monthly_amount.unwrap_or(DEFAULT_MONTHLY_AMOUNT),
        payload.years.unwrap_or(DEFAULT_PROJECTION_YEARS),
        SipOverrides {
            annual_rate_percent: payload.annual_rate_percent,
            yield_per_thousand: payload.yield_per_thousand,
        },
    )
}

async fn corporates_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.corporates.as_ref())
}

async fn corporate_handler(State(state): State<AppState>, Path(rank): Path<String>) -> ApiResult {
    let not_found = || ApiError::NotFound(format!("No corporate emitter at rank {rank}"));
    let rank_num = rank.parse::<u32>().map_err(|_| not_found())?;
    let row = state.corporates.find(rank_num).ok_or_else(not_found)?;
    let share = state
        .corporates
        .emission_share_percent(rank_num)
        .ok_or_else(not_found)?;

    let liability = &row.liability;
    Ok(json_response(
        StatusCode::OK,
        CorporateDetailResponse {
            row,
            emission_share_percent: share,
            formatted: FormattedLiability {
                annual_emissions: format_large_number(liability.baseline_quantity),
                safe_target: format_large_number(liability.safe_target_quantity),
                deficit: format_large_number(liability.deficit_quantity),
                liability: format_large_number(liability.liability_value),
            },
            risk_profile: risk_profile(row.emitter.company, row.emitter.sector),
        },
    ))
}

async fn treasury_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        TreasuryResponse {
            treasury: state.treasury,
            available_kg: state.treasury.available_kg(),
            min_block_trade_kg: MIN_BLOCK_TRADE_KG,
            buyers: &CORPORATE_BUYERS,
        },
    )
}

async fn quote_handler(
    State(state): State<AppState>,
    Json(payload): Json<QuotePayload>,
) -> ApiResult {
    let buyer = payload.buyer.unwrap_or_else(|| CORPORATE_BUYERS[0].to_string());
    let volume = payload.volume_kg.unwrap_or(DEFAULT_BLOCK_TRADE_KG);
    let trade = state.treasury.quote_block_trade(&buyer, volume)?;
    Ok(json_response(StatusCode::OK, trade))
}

async fn create_session_handler(State(state): State<AppState>) -> ApiResult {
    let ledger = FootprintLedger::new(state.baseline.carbon_kg)?;
    let snapshot = state.sessions.create(ledger);
    Ok(json_response(StatusCode::CREATED, snapshot))
}

fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| session_not_found(raw))
}

fn session_not_found(id: impl std::fmt::Display) -> ApiError {
    ApiError::NotFound(format!("Session {id} not found"))
}

async fn session_handler(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_session_id(&id)?;
    let snapshot = state
        .sessions
        .with_session(id, |session| session.snapshot())
        .ok_or_else(|| session_not_found(id))?;
    Ok(json_response(StatusCode::OK, snapshot))
}

async fn add_to_cart_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CartPayload>,
) -> ApiResult {
    let id = parse_session_id(&id)?;
    let snapshot = state
        .sessions
        .with_session(id, |session| {
            session
                .add_to_cart(payload.fund, payload.monthly_amount)
                .map(|()| session.snapshot())
        })
        .ok_or_else(|| session_not_found(id))??;
    Ok(json_response(StatusCode::OK, snapshot))
}

async fn remove_from_cart_handler(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
) -> ApiResult {
    let id = parse_session_id(&id)?;
    let index = index
        .parse::<usize>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid cart index: {index}")))?;
    let snapshot = state
        .sessions
        .with_session(id, |session| {
            session.remove_from_cart(index).map(|_| session.snapshot())
        })
        .ok_or_else(|| session_not_found(id))??;
    Ok(json_response(StatusCode::OK, snapshot))
}

async fn mandates_handler(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_session_id(&id)?;
    let response = state
        .sessions
        .with_session(id, |session| {
            session.authorize_mandates().map(|authorized| MandateResponse {
                authorized,
                session: session.snapshot(),
            })
        })
        .ok_or_else(|| session_not_found(id))??;
    info!(session = %id, monthly = response.authorized.total_monthly, "mandates authorized");
    Ok(json_response(StatusCode::OK, response))
}

/// The user turn is recorded before the model call; the session lock is not
/// held while the call is in flight.
async fn chat_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ChatPayload>,
) -> ApiResult {
    let id = parse_session_id(&id)?;
    let message = payload.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let user_turn = ChatMessage::new(Role::User, message);
    let mut history = state
        .sessions
        .with_session(id, |session| {
            let start = session.chat.len().saturating_sub(CHAT_HISTORY_WINDOW);
            session.chat[start..].to_vec()
        })
        .ok_or_else(|| session_not_found(id))?;
    history.push(user_turn.clone());

    // Nothing is written until the call completes, so a dropped request
    // leaves the conversation untouched.
    let outcome = state.coach.chat(&history).await;

    let history_len = state
        .sessions
        .with_session(id, |session| {
            session.chat.push(user_turn);
            session
                .chat
                .push(ChatMessage::new(Role::Assistant, outcome.reply.clone()));
            session.chat.len()
        })
        .ok_or_else(|| session_not_found(id))?;

    Ok(json_response(
        StatusCode::OK,
        ChatResponse {
            reply: outcome.reply,
            source: outcome.source,
            warning: outcome.warning,
            history_len,
        },
    ))
}

async fn report_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(profile): Json<LifestyleProfile>,
) -> ApiResult {
    let id = parse_session_id(&id)?;
    profile.validate()?;
    state
        .sessions
        .with_session(id, |_| ())
        .ok_or_else(|| session_not_found(id))?;

    let outcome = state.coach.generate_report(&profile).await;

    state
        .sessions
        .with_session(id, |session| session.report = Some(outcome.clone()))
        .ok_or_else(|| session_not_found(id))?;
    Ok(json_response(StatusCode::OK, outcome))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::{CoachConfig, GREETING, OFFLINE_REPLY, fallback_report};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn test_app() -> Router {
        let coach = Coach::new(CoachConfig::default()).expect("client");
        build_app(AppState::new(coach, FootprintBaseline::fallback()))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = serde_json::from_slice(&bytes).expect("json body");
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().expect("session id").to_string()
    }

    #[test]
    fn projection_defaults_to_solar_sip() {
        let projection = projection_from_json("{}").expect("defaults");
        assert_eq!(projection.fund, FundKind::SolarEnergy);
        assert_approx(projection.monthly_amount, 5_000.0);
        assert_approx(projection.annual_rate_percent, 9.5);
        assert_approx(projection.yield_per_thousand, 850.0);
        assert_eq!(projection.duration_months, 60);
        assert_eq!(projection.points.len(), 5);
    }

    #[test]
    fn projection_overrides_fund_parameters() {
        let projection = projection_from_json(
            r#"{"fund":"reforestation","monthlyAmount":2000,"years":2,"annualRatePercent":0}"#,
        )
        .expect("valid payload");
        assert_eq!(projection.fund, FundKind::Reforestation);
        assert_approx(projection.annual_rate_percent, 0.0);
        assert_approx(projection.yield_per_thousand, 1_500.0);
        assert_eq!(projection.duration_months, 24);
        assert_approx(projection.summary.final_value, 48_000.0);
    }

    #[test]
    fn projection_rejects_invalid_values() {
        assert!(projection_from_json(r#"{"monthlyAmount":-1}"#).is_err());
        assert!(projection_from_json(r#"{"years":0}"#).is_err());
        assert!(projection_from_json(r#"{"years":51}"#).is_err());
        assert!(projection_from_json(r#"{"years":4294967295}"#).is_err());
        assert!(projection_from_json(r#"{"annualRatePercent":250}"#).is_err());
        assert!(projection_from_json(r#"{"fund":"wind"}"#).is_err());
    }

    #[test]
    fn portfolio_filter_parses_labels() {
        assert_eq!(
            parse_portfolios("solar-energy, EV Charging").expect("valid"),
            vec![FundKind::SolarEnergy, FundKind::EvCharging]
        );
        assert!(parse_portfolios("").expect("valid").is_empty());
        assert!(parse_portfolios("solar,geothermal").is_err());
    }

    #[tokio::test]
    async fn projection_endpoint_matches_one_year_example() {
        let app = test_app();
        let (status, body) = send(
            &app,
            Method::GET,
            "/api/projection?monthlyAmount=5000&years=1",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let points = body["points"].as_array().expect("points");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0]["periodIndex"], 12);
        assert_approx(points[0]["cumulativeContribution"].as_f64().expect("f64"), 60_000.0);
        assert_approx(points[0]["cumulativeSecondaryUnits"].as_f64().expect("f64"), 42_500.0);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/projection",
            Some(json!({"monthlyAmount": -5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("message").contains("periodic_amount"));
    }

    #[tokio::test]
    async fn catalog_endpoints() {
        let app = test_app();
        let (_, funds) = send(&app, Method::GET, "/api/funds", None).await;
        assert_eq!(funds.as_array().expect("funds").len(), 4);

        let (_, all) = send(&app, Method::GET, "/api/projects", None).await;
        assert_eq!(all.as_array().expect("projects").len(), 20);
        let (_, none) = send(&app, Method::GET, "/api/projects?portfolios=", None).await;
        assert!(none.as_array().expect("projects").is_empty());
        let (_, solar) = send(&app, Method::GET, "/api/projects?portfolios=solar-energy", None).await;
        assert_eq!(solar.as_array().expect("projects").len(), 6);

        let (status, _) = send(&app, Method::GET, "/api/projects/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, roi) = send(&app, Method::GET, "/api/projects/1/roi?amount=10000", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(roi["years"], 5);
        assert_approx(
            roi["projectedValue"].as_f64().expect("f64"),
            10_000.0 * 1.045_f64.powi(5),
        );
    }

    #[tokio::test]
    async fn oversized_durations_are_rejected() {
        let app = test_app();
        let (status, body) = send(
            &app,
            Method::GET,
            "/api/projects/1/roi?years=4294967295",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("message").contains("years"));

        let (status, _) = send(&app, Method::GET, "/api/projection?years=4294967295", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::GET, "/api/projection?years=50", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"].as_array().expect("points").len(), 50);
    }

    #[tokio::test]
    async fn corporate_and_treasury_endpoints() {
        let app = test_app();
        let (_, ledger) = send(&app, Method::GET, "/api/corporates", None).await;
        assert_eq!(ledger["rows"].as_array().expect("rows").len(), 20);
        assert_approx(
            ledger["totals"]["totalEmissionsKg"].as_f64().expect("f64"),
            7_770_000_000.0,
        );

        let (status, detail) = send(&app, Method::GET, "/api/corporates/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["rank"], 1);
        assert!(detail["formatted"]["liability"].as_str().expect("text").ends_with("Million"));
        let summary = detail["riskProfile"]["summary"].as_str().expect("text");
        assert!(summary.contains(detail["company"].as_str().expect("company")));
        assert!(summary.contains(detail["sector"].as_str().expect("sector")));
        assert_eq!(detail["riskProfile"]["sections"].as_array().expect("sections").len(), 4);

        let (status, _) = send(&app, Method::GET, "/api/corporates/abc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, treasury) = send(&app, Method::GET, "/api/treasury", None).await;
        assert_approx(treasury["availableKg"].as_f64().expect("f64"), 1_300_000.0);

        let (status, trade) = send(
            &app,
            Method::POST,
            "/api/treasury/quote",
            Some(json!({"buyer": "tata motors", "volumeKg": 250000})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(trade["buyer"], "Tata Motors");
        assert_approx(trade["grossValue"].as_f64().expect("f64"), 362_500.0);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/treasury/quote",
            Some(json!({"volumeKg": 10_000})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn session_cart_and_mandate_flow() {
        let app = test_app();
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{id}/mandates"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "cart is empty");

        for (fund, amount) in [("solar-energy", 5_000), ("ev-charging", 1_000)] {
            let (status, _) = send(
                &app,
                Method::POST,
                &format!("/api/sessions/{id}/cart"),
                Some(json!({"fund": fund, "monthlyAmount": amount})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, snapshot) = send(
            &app,
            Method::DELETE,
            &format!("/api/sessions/{id}/cart/1"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["cart"].as_array().expect("cart").len(), 1);

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/sessions/{id}/cart/7"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{id}/mandates"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_approx(body["authorized"]["monthlyImpact"].as_f64().expect("f64"), 4_250.0);
        assert_approx(body["session"]["netFootprint"].as_f64().expect("f64"), 8_250.0);
        assert_eq!(body["session"]["neutralized"], false);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/api/sessions/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().expect("message").contains("not found"));

        let uri = format!("/api/sessions/{}", Uuid::new_v4());
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn abandoned_chat_leaves_session_untouched() {
        let started = Arc::new(AtomicBool::new(false));
        let flag = started.clone();
        let upstream = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let flag = flag.clone();
                async move {
                    flag.store(true, Ordering::SeqCst);
                    std::future::pending::<()>().await;
                    Json(json!({}))
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.expect("serve");
        });
        let coach = Coach::new(CoachConfig {
            api_key: Some("test-key".to_string()),
            endpoint: format!("http://{addr}/v1/chat/completions"),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(60),
        })
        .expect("client");
        let app = build_app(AppState::new(coach, FootprintBaseline::fallback()));
        let id = new_session(&app).await;
        let session_uri = format!("/api/sessions/{id}");

        let pending_chat = tokio::spawn({
            let app = app.clone();
            let uri = format!("{session_uri}/chat");
            async move { send(&app, Method::POST, &uri, Some(json!({"message": "hello"}))).await }
        });
        for _ in 0..500 {
            if started.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(started.load(Ordering::SeqCst), "completion request never arrived");

        // The store stays usable while the call is in flight.
        let (status, snapshot) = tokio::time::timeout(
            Duration::from_secs(5),
            send(&app, Method::GET, &session_uri, None),
        )
        .await
        .expect("session readable during the call");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["chat"].as_array().expect("chat").len(), 1);

        pending_chat.abort();
        assert!(pending_chat.await.expect_err("aborted").is_cancelled());

        let (_, snapshot) = send(&app, Method::GET, &session_uri, None).await;
        let chat = snapshot["chat"].as_array().expect("chat");
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0]["content"], GREETING);
    }

    #[tokio::test]
    async fn offline_chat_and_report_fall_back() {
        let app = test_app();
        let id = new_session(&app).await;

        let (status, chat) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{id}/chat"),
            Some(json!({"message": "How do I cut my footprint?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(chat["reply"], OFFLINE_REPLY);
        assert_eq!(chat["source"], "fallback");
        assert_eq!(chat["historyLen"], 3);

        let (status, report) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{id}/report"),
            Some(json!({"commute": "public-transit"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["source"], "fallback");
        assert_eq!(
            report["report"],
            serde_json::to_value(fallback_report()).expect("serialize")
        );

        let (_, snapshot) = send(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(snapshot["chat"][0]["content"], GREETING);
        assert_eq!(snapshot["chat"][2]["role"], "assistant");
        assert_eq!(snapshot["report"]["source"], "fallback");
    }

    #[tokio::test]
    async fn report_rejects_out_of_range_distance() {
        let app = test_app();
        let id = new_session(&app).await;
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{id}/report"),
            Some(json!({"weeklyDistance": 900})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }
}
