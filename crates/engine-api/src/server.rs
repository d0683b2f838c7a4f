use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    ApiError, Command, CommandResult, EngineConfig, EngineStatus, ErrorCode, Event, EventType,
    GameState, SCHEMA_VERSION_V1,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{EngineApi, PersistedCommandEntry, PersistenceError};

const DEFAULT_PAGE_SIZE: usize = 500;
const MAX_PAGE_SIZE: usize = 5000;
const DEFAULT_SQLITE_PATH: &str = "stellar_profiles.sqlite";

#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Clone)]
struct AppState {
    inner: Arc<Mutex<ServerInner>>,
}

impl AppState {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ServerInner::default())),
        }
    }
}

#[derive(Debug, Default)]
struct ServerInner {
    engine: Option<EngineApi>,
    /// Bumped whenever the active profile is replaced so a stale ticker
    /// task notices and stops.
    ticker_generation: u64,
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn profile_not_found(requested_profile_id: &str, active_profile_id: Option<&str>) -> Self {
        let details = active_profile_id.map(|active| {
            format!("requested_profile_id={requested_profile_id} active_profile_id={active}")
        });
        Self {
            status: StatusCode::NOT_FOUND,
            error: ApiError::new(
                ErrorCode::ProfileNotFound,
                "profile_id does not match a loaded profile",
                details,
            ),
        }
    }

    fn invalid_query(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidQuery, message, details),
        }
    }

    fn invalid_command(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidCommand, message, details),
        }
    }

    fn internal(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new(ErrorCode::InternalError, message, details),
        }
    }

    fn from_persistence(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotAttached => {
                Self::invalid_query("persistence store is not attached", None)
            }
            other => Self::internal("persistence operation failed", Some(other.to_string())),
        }
    }

    fn from_api_error(error: ApiError) -> Self {
        let status = match error.error_code {
            ErrorCode::ProfileNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        Self { status, error }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

pub async fn serve(addr: SocketAddr) -> Result<(), ServerError> {
    let state = AppState::new();
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/profiles", post(create_profile))
        .route("/api/v1/profiles/{profile_id}/state", get(get_state))
        .route("/api/v1/profiles/{profile_id}/status", get(get_status))
        .route(
            "/api/v1/profiles/{profile_id}/commands",
            post(submit_command).get(get_commands),
        )
        .route("/api/v1/profiles/{profile_id}/events", get(get_events))
        .route("/api/v1/profiles/{profile_id}/advance", post(advance_clock))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS,PUT,PATCH,DELETE"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateProfileRequest {
    Config(EngineConfig),
    WithOptions(CreateProfileOptions),
}

#[derive(Debug, Deserialize)]
struct CreateProfileOptions {
    config: EngineConfig,
    sqlite_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateProfileResponse {
    schema_version: String,
    profile_id: String,
    status: EngineStatus,
    resumed_from_save: bool,
    replaced_active_profile: bool,
}

async fn create_profile(
    State(state): State<AppState>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<Json<CreateProfileResponse>, HttpApiError> {
    let (config, sqlite_path) = match request {
        CreateProfileRequest::Config(config) => (config, default_sqlite_path()),
        CreateProfileRequest::WithOptions(options) => (
            options.config,
            options
                .sqlite_path
                .filter(|path| !path.trim().is_empty())
                .unwrap_or_else(default_sqlite_path),
        ),
    };

    let tick_period = Duration::from_millis(config.tick_period_ms.max(50));

    let (response, generation) = {
        let mut inner = state.inner.lock().await;
        let replaced_active_profile = inner.engine.is_some();

        let mut engine = EngineApi::from_config(config);
        let resumed_from_save = engine
            .attach_sqlite_store(sqlite_path)
            .map_err(HttpApiError::from_persistence)?;
        engine
            .flush_persistence_checked()
            .map_err(HttpApiError::from_persistence)?;

        let status = engine.status();
        inner.engine = Some(engine);
        inner.ticker_generation += 1;

        (
            CreateProfileResponse {
                schema_version: SCHEMA_VERSION_V1.to_string(),
                profile_id: status.profile_id.clone(),
                status,
                resumed_from_save,
                replaced_active_profile,
            },
            inner.ticker_generation,
        )
    };

    spawn_ticker(state.clone(), generation, tick_period);

    Ok(Json(response))
}

/// Real-time driver: wakes on the profile's tick period and advances the
/// engine by the wall-clock time that actually elapsed, so a delayed wake
/// still credits the full interval.
fn spawn_ticker(state: AppState, generation: u64, period: Duration) {
    tokio::spawn(async move {
        let mut last_wake = Instant::now();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            interval.tick().await;
            let now = Instant::now();
            let elapsed = now.duration_since(last_wake).as_secs_f64();
            last_wake = now;

            let mut inner = state.inner.lock().await;
            if inner.ticker_generation != generation {
                break;
            }
            let Some(engine) = inner.engine.as_mut() else {
                break;
            };
            engine.advance(elapsed);
        }
    });
}

fn default_sqlite_path() -> String {
    std::env::var("STELLAR_SQLITE_PATH")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string())
}

#[derive(Debug, Serialize)]
struct StateResponse {
    schema_version: String,
    profile_id: String,
    state: GameState,
}

async fn get_state(
    Path(profile_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StateResponse>, HttpApiError> {
    let response = {
        let inner = state.inner.lock().await;
        let engine = require_profile(&inner, &profile_id)?;
        StateResponse {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            profile_id: profile_id.clone(),
            state: engine.snapshot(),
        }
    };

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    schema_version: String,
    profile_id: String,
    status: EngineStatus,
    last_persistence_error: Option<String>,
}

async fn get_status(
    Path(profile_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, HttpApiError> {
    let response = {
        let inner = state.inner.lock().await;
        let engine = require_profile(&inner, &profile_id)?;
        StatusResponse {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            profile_id: profile_id.clone(),
            status: engine.status(),
            last_persistence_error: engine.last_persistence_error().map(ToString::to_string),
        }
    };

    Ok(Json(response))
}

async fn submit_command(
    Path(profile_id): Path<String>,
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Result<Json<CommandResult>, HttpApiError> {
    if command.profile_id != profile_id {
        return Err(HttpApiError::invalid_command(
            "command.profile_id must match path profile_id",
            Some(format!(
                "path_profile_id={profile_id} command_profile_id={}",
                command.profile_id
            )),
        ));
    }

    let result = {
        let mut inner = state.inner.lock().await;
        let engine = require_profile_mut(&mut inner, &profile_id)?;
        engine
            .submit_command(command)
            .map_err(HttpApiError::from_api_error)?
    };

    Ok(Json(result))
}

#[derive(Debug, Deserialize, Default)]
struct PaginationQuery {
    cursor: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct CommandJournalPage {
    schema_version: String,
    profile_id: String,
    cursor: usize,
    next_cursor: Option<usize>,
    entries: Vec<PersistedCommandEntry>,
}

async fn get_commands(
    Path(profile_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<CommandJournalPage>, HttpApiError> {
    let response = {
        let inner = state.inner.lock().await;
        let engine = require_profile(&inner, &profile_id)?;
        let entries = engine.command_log();
        let (start, end, next_cursor) = paginate(entries.len(), query.cursor, query.page_size)?;

        CommandJournalPage {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            profile_id: profile_id.clone(),
            cursor: start,
            next_cursor,
            entries: entries[start..end].to_vec(),
        }
    };

    Ok(Json(response))
}

#[derive(Debug, Deserialize, Default)]
struct EventsQuery {
    from_sequence: Option<u64>,
    #[serde(default)]
    event_types: Vec<String>,
    #[serde(rename = "event_types[]", default)]
    event_types_bracket: Vec<String>,
    cursor: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EventPage {
    schema_version: String,
    profile_id: String,
    cursor: usize,
    next_cursor: Option<usize>,
    total: usize,
    events: Vec<Event>,
}

async fn get_events(
    Path(profile_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventPage>, HttpApiError> {
    let response = {
        let inner = state.inner.lock().await;
        let engine = require_profile(&inner, &profile_id)?;

        let mut requested_types = query.event_types;
        requested_types.extend(query.event_types_bracket);
        let event_type_filter = parse_event_type_filter(&requested_types)?;
        let from_sequence = query.from_sequence.unwrap_or(0);

        let filtered = engine
            .events()
            .iter()
            .filter(|event| event.sequence >= from_sequence)
            .filter(|event| {
                event_type_filter
                    .as_ref()
                    .map(|filter| filter.contains(&event.event_type))
                    .unwrap_or(true)
            })
            .cloned()
            .collect::<Vec<_>>();

        let (start, end, next_cursor) = paginate(filtered.len(), query.cursor, query.page_size)?;

        EventPage {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            profile_id: profile_id.clone(),
            cursor: start,
            next_cursor,
            total: filtered.len(),
            events: filtered[start..end].to_vec(),
        }
    };

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct AdvanceRequest {
    seconds: f64,
}

#[derive(Debug, Serialize)]
struct AdvanceResponse {
    schema_version: String,
    profile_id: String,
    advanced_secs: f64,
    completed_missions: u64,
    energy_regenerated: f64,
    status: EngineStatus,
}

/// Manual clock control for headless and offline-catchup callers. The
/// background ticker keeps running; both paths funnel through the same
/// mutex so advances never interleave.
async fn advance_clock(
    Path(profile_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<AdvanceRequest>,
) -> Result<Json<AdvanceResponse>, HttpApiError> {
    if !request.seconds.is_finite() || request.seconds <= 0.0 {
        return Err(HttpApiError::invalid_query(
            "seconds must be finite and > 0",
            Some(format!("seconds={}", request.seconds)),
        ));
    }

    let response = {
        let mut inner = state.inner.lock().await;
        let engine = require_profile_mut(&mut inner, &profile_id)?;
        let metrics = engine.advance(request.seconds);
        AdvanceResponse {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            profile_id: profile_id.clone(),
            advanced_secs: metrics.advanced_secs,
            completed_missions: metrics.completed_missions,
            energy_regenerated: metrics.energy_regenerated,
            status: engine.status(),
        }
    };

    Ok(Json(response))
}

fn require_profile<'a>(
    inner: &'a ServerInner,
    profile_id: &str,
) -> Result<&'a EngineApi, HttpApiError> {
    let Some(engine) = inner.engine.as_ref() else {
        return Err(HttpApiError::profile_not_found(profile_id, None));
    };

    if engine.profile_id() != profile_id {
        return Err(HttpApiError::profile_not_found(
            profile_id,
            Some(engine.profile_id()),
        ));
    }

    Ok(engine)
}

fn require_profile_mut<'a>(
    inner: &'a mut ServerInner,
    profile_id: &str,
) -> Result<&'a mut EngineApi, HttpApiError> {
    let active_profile_id = inner
        .engine
        .as_ref()
        .map(|engine| engine.profile_id().to_string());
    let Some(engine) = inner.engine.as_mut() else {
        return Err(HttpApiError::profile_not_found(profile_id, None));
    };

    if engine.profile_id() != profile_id {
        return Err(HttpApiError::profile_not_found(
            profile_id,
            active_profile_id.as_deref(),
        ));
    }

    Ok(engine)
}

fn paginate(
    total: usize,
    cursor: Option<usize>,
    page_size: Option<usize>,
) -> Result<(usize, usize, Option<usize>), HttpApiError> {
    let start = cursor.unwrap_or(0);
    if start > total {
        return Err(HttpApiError::invalid_query(
            "cursor is out of bounds",
            Some(format!("cursor={start} total={total}")),
        ));
    }

    let size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .max(1)
        .min(MAX_PAGE_SIZE);
    let end = start.saturating_add(size).min(total);
    let next_cursor = if end < total { Some(end) } else { None };

    Ok((start, end, next_cursor))
}

fn parse_event_type_filter(
    requested_types: &[String],
) -> Result<Option<HashSet<EventType>>, HttpApiError> {
    if requested_types.is_empty() {
        return Ok(None);
    }

    let mut filter = HashSet::new();

    for value in requested_types {
        let normalized = value.trim().to_lowercase();
        let event_type = match normalized.as_str() {
            "mission_started" | "missionstarted" => EventType::MissionStarted,
            "mission_completed" | "missioncompleted" => EventType::MissionCompleted,
            "artifact_dropped" | "artifactdropped" => EventType::ArtifactDropped,
            "squad_upgraded" | "squadupgraded" => EventType::SquadUpgraded,
            "artifact_equipped" | "artifactequipped" => EventType::ArtifactEquipped,
            "artifact_unequipped" | "artifactunequipped" => EventType::ArtifactUnequipped,
            "zone_unlocked" | "zoneunlocked" => EventType::ZoneUnlocked,
            "prestige_performed" | "prestigeperformed" => EventType::PrestigePerformed,
            "command_rejected" | "commandrejected" => EventType::CommandRejected,
            other => {
                return Err(HttpApiError::invalid_query(
                    "unknown event_type filter",
                    Some(format!("event_type={other}")),
                ));
            }
        };
        filter.insert(event_type);
    }

    Ok(Some(filter))
}
