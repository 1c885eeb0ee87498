use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono_tz::Tz;
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Settings;
use crate::db::{
    create_pool, get_all_teams, get_game, get_games, get_games_for_team, get_team,
    init_database_with_pool,
};
use crate::models::{ApiResponse, GameView, Team, TeamSchedule};
use crate::utils::parse_timezone;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub display_tz: Tz,
}

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("Database query failed: {:#}", e);
        ApiError::Database(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub async fn serve(settings: &Settings, port: u16) -> anyhow::Result<()> {
    let pool = create_pool(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;

    let app = create_router(AppState {
        pool,
        display_tz: settings.display_tz,
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("nbascrape API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/games", get(get_games_handler))
        .route("/games/{id}", get(get_game_handler))
        .route("/teams", get(get_teams_handler))
        .route("/teams/{id}", get(get_team_handler))
        .route("/teams/{id}/games", get(get_team_games_handler))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct TzQuery {
    tz: Option<String>,
}

impl TzQuery {
    fn resolve(&self, default: Tz) -> Result<Tz, ApiError> {
        match self.tz.as_deref() {
            None | Some("") => Ok(default),
            Some(name) => parse_timezone(name).map_err(|e| ApiError::BadRequest(e.to_string())),
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid id '{}'", raw)))
}

async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("nbascrape API is running"))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("resource not found".to_string())
}

// GET /games
async fn get_games_handler(
    State(state): State<AppState>,
    Query(query): Query<TzQuery>,
) -> ApiResult<Vec<GameView>> {
    let tz = query.resolve(state.display_tz)?;
    let games = get_games(&state.pool).await?;
    Ok(Json(ApiResponse::success(
        games.into_iter().map(|g| GameView::project(g, &tz)).collect(),
    )))
}

// GET /games/{id}
async fn get_game_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TzQuery>,
) -> ApiResult<GameView> {
    let id = parse_id(&id)?;
    let tz = query.resolve(state.display_tz)?;

    match get_game(&state.pool, id).await? {
        Some(game) => Ok(Json(ApiResponse::success(GameView::project(game, &tz)))),
        None => Err(ApiError::NotFound("no matching game found".to_string())),
    }
}

// GET /teams
async fn get_teams_handler(State(state): State<AppState>) -> ApiResult<Vec<Team>> {
    Ok(Json(ApiResponse::success(get_all_teams(&state.pool).await?)))
}

// GET /teams/{id}
async fn get_team_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Team> {
    let id = parse_id(&id)?;
    match get_team(&state.pool, id).await? {
        Some(team) => Ok(Json(ApiResponse::success(team))),
        None => Err(ApiError::NotFound("no matching team found".to_string())),
    }
}

// GET /teams/{id}/games
async fn get_team_games_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TzQuery>,
) -> ApiResult<TeamSchedule> {
    let id = parse_id(&id)?;
    let tz = query.resolve(state.display_tz)?;

    let team = get_team(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("no matching team found".to_string()))?;
    let games = get_games_for_team(&state.pool, id)
        .await?
        .into_iter()
        .map(|g| GameView::project(g, &tz))
        .collect();

    Ok(Json(ApiResponse::success(TeamSchedule { team, games })))
}
