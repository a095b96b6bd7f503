//! REST API: tournament setup, schedule generation, results, round advancement.
//!
//! Errors come back as `{"error": "..."}` with 404 for unknown ids, 409 when a round
//! already exists, 400 otherwise.

use crate::logic::{
    advance_round, restart_tournament, round_status, start_tournament, submit_result, Bracket,
    RoundAdvance, RoundStatus, SchedulePlanner,
};
use crate::models::{
    team_id, GameMatch, MatchId, MatchStatus, Team, TeamId, Tournament, TournamentError,
    TournamentId, TournamentSettings,
};
use crate::repository::{InMemoryStore, MatchRepository, RepositoryError};
use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path},
    HttpResponse, Responder,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared application state: the store plus the schedule planner.
pub struct AppState {
    pub store: InMemoryStore,
    pub planner: SchedulePlanner,
}

impl AppState {
    pub fn new(planner: SchedulePlanner) -> Self {
        Self {
            store: InMemoryStore::new(),
            planner,
        }
    }
}

type State = Data<AppState>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// A match row plus its derived status (pending, draw, decided, bye).
#[derive(Serialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub game: GameMatch,
    pub status: MatchStatus,
}

impl From<GameMatch> for MatchView {
    fn from(game: GameMatch) -> Self {
        let status = game.status();
        Self { game, status }
    }
}

/// Tournament with its matches and round progress.
#[derive(Serialize)]
pub struct TournamentView {
    pub tournament: Tournament,
    pub matches: Vec<MatchView>,
    pub status: RoundStatus,
}

#[derive(Serialize)]
struct StartResponse {
    #[serde(flatten)]
    view: TournamentView,
    debug: Vec<String>,
}

#[derive(Serialize)]
struct AdvanceResponse {
    advance: RoundAdvance,
    #[serde(flatten)]
    view: TournamentView,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(flatten)]
    settings: TournamentSettings,
}

#[derive(Deserialize)]
struct RenameBody {
    name: String,
}

#[derive(Deserialize)]
struct AddTeamBody {
    name: String,
    /// Optional caller-assigned id (string or integer).
    #[serde(default, deserialize_with = "team_id::deserialize_option")]
    id: Option<TeamId>,
}

#[derive(Deserialize)]
struct ScoreBody {
    score_a: u32,
    score_b: u32,
}

#[derive(Deserialize)]
struct BestScheduleBody {
    teams: serde_json::Value,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct TournamentTeamPath {
    id: TournamentId,
    team_id: TeamId,
}

#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: MatchId,
}

fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::Repository(RepositoryError::TournamentNotFound(_))
        | TournamentError::Repository(RepositoryError::MatchNotFound(_))
        | TournamentError::MatchNotFound(_)
        | TournamentError::TeamNotFound(_) => HttpResponse::NotFound().json(body),
        TournamentError::Repository(RepositoryError::PhaseExists(_)) => {
            HttpResponse::Conflict().json(body)
        }
        TournamentError::Repository(RepositoryError::Poisoned) => {
            HttpResponse::InternalServerError().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn view(repo: &dyn MatchRepository, id: TournamentId) -> Result<TournamentView, TournamentError> {
    let tournament = repo.tournament(id)?;
    let matches = repo.list_matches(id)?;
    let status = round_status(&matches);
    Ok(TournamentView {
        tournament,
        matches: matches.into_iter().map(MatchView::from).collect(),
        status,
    })
}

fn respond<T: Serialize>(result: Result<T, TournamentError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => error_response(&e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "team-tournament-web",
    })
}

#[get("/api/tournaments")]
async fn api_list_tournaments(state: State) -> HttpResponse {
    respond(state.store.list_tournaments().map_err(TournamentError::from))
}

/// Create a new tournament (returns it with id; client stores id for subsequent requests).
#[post("/api/tournaments")]
async fn api_create_tournament(state: State, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    let mut tournament = Tournament::new(String::new(), body.settings);
    if let Err(e) = tournament.rename(body.name) {
        return error_response(&e);
    }
    respond(
        state
            .store
            .create_tournament(tournament)
            .map_err(TournamentError::from),
    )
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(view(&state.store, path.id))
}

#[put("/api/tournaments/{id}/name")]
async fn api_rename_tournament(
    state: State,
    path: Path<TournamentPath>,
    body: Json<RenameBody>,
) -> HttpResponse {
    respond(
        state
            .store
            .modify_tournament(path.id, &mut |t| t.rename(body.name.as_str())),
    )
}

/// Change sport/format/seeding (Setup only).
#[put("/api/tournaments/{id}/settings")]
async fn api_set_settings(
    state: State,
    path: Path<TournamentPath>,
    body: Json<TournamentSettings>,
) -> HttpResponse {
    let settings = body.into_inner();
    respond(
        state
            .store
            .modify_tournament(path.id, &mut |t| t.set_settings(settings)),
    )
}

/// Add a team (tournament must be in Setup).
#[post("/api/tournaments/{id}/teams")]
async fn api_add_team(
    state: State,
    path: Path<TournamentPath>,
    body: Json<AddTeamBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let team_id = body.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    respond(state.store.modify_tournament(path.id, &mut |t| {
        t.insert_team(Team::new(team_id.clone(), body.name.clone()))
            .map(|_| ())
    }))
}

/// Remove a team by id (tournament must be in Setup).
#[delete("/api/tournaments/{id}/teams/{team_id}")]
async fn api_remove_team(state: State, path: Path<TournamentTeamPath>) -> HttpResponse {
    respond(
        state
            .store
            .modify_tournament(path.id, &mut |t| t.remove_team(&path.team_id).map(|_| ())),
    )
}

/// Generate the schedule (Setup -> Running).
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    let mut rng = rand::thread_rng();
    let result = start_tournament(&state.store, &state.planner, path.id, &mut rng).await;
    respond(result.and_then(|report| {
        Ok(StartResponse {
            view: view(&state.store, path.id)?,
            debug: report.debug,
        })
    }))
}

/// Back to Setup with the same teams.
#[post("/api/tournaments/{id}/restart")]
async fn api_restart_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(
        restart_tournament(&state.store, path.id).and_then(|_| view(&state.store, path.id)),
    )
}

#[put("/api/tournaments/{id}/matches/{match_id}/score")]
async fn api_set_score(
    state: State,
    path: Path<TournamentMatchPath>,
    body: Json<ScoreBody>,
) -> HttpResponse {
    respond(
        submit_result(&state.store, path.id, path.match_id, body.score_a, body.score_b)
            .and_then(|_| view(&state.store, path.id)),
    )
}

/// Generate the next knockout round, or crown the champion.
#[post("/api/tournaments/{id}/rounds/advance")]
async fn api_advance_round(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(advance_round(&state.store, path.id).and_then(|advance| {
        Ok(AdvanceResponse {
            advance,
            view: view(&state.store, path.id)?,
        })
    }))
}

#[get("/api/tournaments/{id}/bracket")]
async fn api_get_bracket(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(
        state
            .store
            .list_matches(path.id)
            .map(|matches| Bracket::from_matches(&matches))
            .map_err(TournamentError::from),
    )
}

/// Schedule a team list without creating a tournament: `{"teams": [{"id", "name"}]}`.
#[post("/api/best-schedule")]
async fn api_best_schedule(state: State, body: Json<BestScheduleBody>) -> HttpResponse {
    let teams: Vec<Team> = match serde_json::from_value(body.into_inner().teams) {
        Ok(teams) => teams,
        Err(_) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid teams",
                "debug": ["Invalid teams payload"],
            }))
        }
    };
    match state.planner.build_schedule(&teams).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Register every route on an actix `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(api_list_tournaments)
        .service(api_create_tournament)
        .service(api_get_tournament)
        .service(api_rename_tournament)
        .service(api_set_settings)
        .service(api_add_team)
        .service(api_remove_team)
        .service(api_start_tournament)
        .service(api_restart_tournament)
        .service(api_set_score)
        .service(api_advance_round)
        .service(api_get_bracket)
        .service(api_best_schedule);
}
