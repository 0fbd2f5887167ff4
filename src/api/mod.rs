use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::db::models::SeasonGameRecord;
use crate::error::ScoringError;
use crate::scoring::game::{PlateAppearance, RunnerMove};
use crate::scoring::outcome::{BatterFate, Outcome, Role};
use crate::scoring::season::{SeasonEdit, SeasonSummary};
use crate::scoring::Scorer;

type ApiError = (StatusCode, String);

pub struct AppState {
    pub team_name: String,
    /// One scorer at a time: every mutation goes through this lock.
    pub scorer: Mutex<Scorer>,
}

impl AppState {
    pub fn new(team_name: &str, scorer: Scorer) -> Self {
        Self {
            team_name: team_name.to_string(),
            scorer: Mutex::new(scorer),
        }
    }

    fn scorer(&self) -> Result<MutexGuard<'_, Scorer>, ApiError> {
        self.scorer.lock().map_err(|_| {
            error!("Scorer lock poisoned");
            (StatusCode::INTERNAL_SERVER_ERROR, "scorer lock poisoned".to_string())
        })
    }
}

/// Build the Axum router for the scorebook.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/roster", get(roster_handler))
        .route("/api/game", get(game_handler))
        .route("/api/game/start", post(start_handler))
        .route("/api/game/plate-appearance", post(plate_appearance_handler))
        .route("/api/game/opponent-half", post(opponent_half_handler))
        .route("/api/game/undo", post(undo_handler))
        .route("/api/game/end", post(end_handler))
        .route("/api/game/reset", post(reset_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/season", get(season_handler))
        .route(
            "/api/season/:index",
            patch(edit_season_handler).delete(delete_season_handler),
        )
        .route("/api/odds", get(odds_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Precondition failures carry their message back to the scorer; storage
/// failures are logged and reported as a 500.
fn error_response(err: ScoringError) -> ApiError {
    if err.is_precondition() {
        warn!(error = %err, "Scorer action refused");
    }
    let status = match &err {
        ScoringError::NoActiveGame | ScoringError::SeasonRecordNotFound(_) => StatusCode::NOT_FOUND,
        ScoringError::EmptyRoster
        | ScoringError::GameInProgress
        | ScoringError::WrongHalf { .. }
        | ScoringError::BatterOutOfTurn { .. }
        | ScoringError::NothingToUndo => StatusCode::CONFLICT,
        ScoringError::PlayerNotInRoster(_)
        | ScoringError::MissingRunnerFate(_)
        | ScoringError::NoRunnerOnBase(_)
        | ScoringError::BaseConflict(_)
        | ScoringError::InvalidAdvance { .. } => StatusCode::BAD_REQUEST,
        ScoringError::Storage(e) => {
            error!("Storage failure: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

#[derive(Debug, Serialize)]
struct RosterEntry {
    label: String,
    first_name: String,
    last_name: String,
    jersey_number: i64,
}

/// GET /api/roster
async fn roster_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let roster: Vec<RosterEntry> = state
        .scorer()?
        .roster()
        .into_iter()
        .map(|p| RosterEntry {
            label: p.display_label(),
            first_name: p.first_name,
            last_name: p.last_name,
            jersey_number: p.jersey_number,
        })
        .collect();
    Ok(Json(roster))
}

/// GET /api/game
async fn game_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let scoreboard = state.scorer()?.scoreboard();
    Ok(Json(serde_json::json!({
        "team": state.team_name,
        "scoreboard": scoreboard,
    })))
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    /// Defaults to today.
    date: Option<NaiveDate>,
    opponent: String,
    role: Role,
    /// Display labels in batting order. Empty bats the whole roster.
    #[serde(default)]
    lineup: Vec<String>,
}

/// POST /api/game/start
async fn start_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut scorer = state.scorer()?;
    let lineup = req
        .lineup
        .iter()
        .map(|label| scorer.player_by_label(label))
        .collect::<Result<Vec<_>, _>>()
        .map_err(error_response)?;
    let date = req.date.unwrap_or_else(|| Local::now().date_naive());
    scorer
        .start_game(date, &req.opponent, req.role, lineup)
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(scorer.scoreboard())))
}

#[derive(Debug, Deserialize)]
struct PlateAppearanceRequest {
    /// Display label of the batter.
    batter: String,
    outcome: Outcome,
    #[serde(default)]
    runners: Vec<RunnerMove>,
    batter_fate: BatterFate,
    #[serde(default)]
    runs_scored: u32,
}

/// POST /api/game/plate-appearance
async fn plate_appearance_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlateAppearanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut scorer = state.scorer()?;
    let batter = scorer.player_by_label(&req.batter).map_err(error_response)?;
    let pa = PlateAppearance {
        batter,
        outcome: req.outcome,
        runners: req.runners,
        batter_fate: req.batter_fate,
        runs_scored: req.runs_scored,
    };
    scorer.submit_plate_appearance(&pa).map_err(error_response)?;
    Ok(Json(scorer.scoreboard()))
}

#[derive(Debug, Deserialize)]
struct OpponentHalfRequest {
    runs: u32,
    #[serde(default)]
    outs: u8,
}

/// POST /api/game/opponent-half
async fn opponent_half_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpponentHalfRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut scorer = state.scorer()?;
    scorer
        .submit_opponent_half(req.runs, req.outs)
        .map_err(error_response)?;
    Ok(Json(scorer.scoreboard()))
}

/// POST /api/game/undo
async fn undo_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let mut scorer = state.scorer()?;
    scorer.undo().map_err(error_response)?;
    Ok(Json(scorer.scoreboard()))
}

/// POST /api/game/end
async fn end_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let mut scorer = state.scorer()?;
    scorer.end_game().map(Json).map_err(error_response)
}

/// POST /api/game/reset
async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.scorer()?.reset_game().map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/stats
async fn stats_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let scorer = state.scorer()?;
    let body = serde_json::json!({
        "season": scorer.player_stats(),
        "game": scorer.game_stats(),
    });
    Ok(Json(body))
}

#[derive(Debug, Serialize)]
struct SeasonEntry {
    index: usize,
    #[serde(flatten)]
    record: SeasonGameRecord,
}

#[derive(Debug, Serialize)]
struct SeasonResponse {
    team: String,
    record: String,
    summary: SeasonSummary,
    games: Vec<SeasonEntry>,
}

/// GET /api/season
async fn season_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let scorer = state.scorer()?;
    let summary = scorer.season_summary().map_err(error_response)?;
    let games = scorer
        .season_records()
        .map_err(error_response)?
        .into_iter()
        .map(|(index, record)| SeasonEntry { index, record })
        .collect();
    Ok(Json(SeasonResponse {
        team: state.team_name.clone(),
        record: summary.record_label(),
        summary,
        games,
    }))
}

/// PATCH /api/season/:index
async fn edit_season_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(edit): Json<SeasonEdit>,
) -> Result<impl IntoResponse, ApiError> {
    let mut scorer = state.scorer()?;
    scorer.edit_season_record(index, &edit).map(Json).map_err(error_response)
}

/// DELETE /api/season/:index
async fn delete_season_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, ApiError> {
    let mut scorer = state.scorer()?;
    scorer.delete_season_record(index).map(Json).map_err(error_response)
}

#[derive(Debug, Deserialize)]
struct OddsQuery {
    player: String,
}

/// GET /api/odds?player=First%20Last%20(%23N)
async fn odds_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OddsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scorer = state.scorer()?;
    scorer.odds_for(&query.player).map(Json).map_err(error_response)
}
