//! In-memory fake of the Woodpecker backend, served by axum on an ephemeral
//! port so the integration tests drive the real `HttpApi`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use woodpecker_client::{ClientConfig, HttpApi, TrainerRuntime};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Scholar's-mate setup: white mates with Qxf7.
pub const MATE_IN_ONE_FEN: &str =
    "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 4 4";

#[derive(Debug, Clone)]
pub struct FakePuzzle {
    pub id: i64,
    pub fen: String,
    pub initial_move: Option<String>,
    /// Line after the forced opening move: learner, reply, learner, ...
    pub solution: Vec<String>,
}

impl FakePuzzle {
    pub fn new(id: i64, fen: &str, solution: &[&str]) -> Self {
        Self {
            id,
            fen: fen.to_string(),
            initial_move: None,
            solution: solution.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_initial_move(mut self, uci: &str) -> Self {
        self.initial_move = Some(uci.to_string());
        self
    }

    fn to_json(&self, set_id: i64) -> Value {
        let mut value = json!({
            "id": self.id,
            "fen": self.fen,
            "puzzle_set_id": set_id,
            "moves_count": self.solution.len(),
        });
        if let Some(initial) = &self.initial_move {
            value["initial_move"] = json!(initial);
        }
        value
    }
}

#[derive(Debug, Default)]
struct FakeSession {
    set_id: i64,
    cursor: usize,
    ply: usize,
    score: i64,
    attempts: u32,
}

/// How `GET /api/sessions/{id}/puzzle` answers once the set is used up.
#[derive(Debug, Default, Clone, Copy)]
pub enum ExhaustedBody {
    #[default]
    NoContent,
    Null,
    EmptyObject,
}

#[derive(Debug, Default)]
pub struct FakeState {
    sets: Vec<(i64, String, Vec<FakePuzzle>)>,
    sessions: HashMap<String, FakeSession>,
    performances: Vec<Value>,
    /// `(puzzle_id, value)` for every rating received
    pub ratings: Vec<(i64, i64)>,
    /// Every move body received, in order
    pub moves: Vec<String>,
    /// The next this many move submissions answer 500
    pub fail_moves: usize,
    /// The next this many summary requests answer 500
    pub fail_summaries: usize,
    /// Send the forced opening move again at the head of a revealed solution
    pub echo_initial_move: bool,
    /// Leave `solution` out of incorrect verdicts
    pub withhold_solution: bool,
    pub exhausted_body: ExhaustedBody,
    next_session: u32,
}

pub type Shared = Arc<Mutex<FakeState>>;

impl FakeState {
    pub fn add_set(&mut self, id: i64, name: &str, puzzles: Vec<FakePuzzle>) {
        self.sets.push((id, name.to_string(), puzzles));
    }

    /// Seed an earlier attempt at `set_id` so the summary has something to compare with.
    pub fn add_performance(&mut self, id: &str, date: &str, set_name: &str, score: i64, elapsed: u64) {
        self.performances.push(json!({
            "id": id,
            "date": date,
            "puzzle_set": set_name,
            "score": score,
            "elapsed_seconds": elapsed,
        }));
    }

    fn set(&self, id: i64) -> Option<&(i64, String, Vec<FakePuzzle>)> {
        self.sets.iter().find(|(set_id, _, _)| *set_id == id)
    }

    fn current_puzzle(&self, session_id: &str) -> Option<FakePuzzle> {
        let session = self.sessions.get(session_id)?;
        let (_, _, puzzles) = self.set(session.set_id)?;
        puzzles.get(session.cursor).cloned()
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

// ---- Handlers ----

async fn list_sets(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    let sets: Vec<Value> = state
        .sets
        .iter()
        .map(|(id, name, puzzles)| json!({ "id": id, "name": name, "size": puzzles.len() }))
        .collect();
    Json(json!(sets))
}

async fn start_session(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    let Some(set_id) = body.get("puzzle_set_id").and_then(Value::as_i64) else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "puzzle_set_id is required");
    };
    let Some((_, _, puzzles)) = state.set(set_id) else {
        return detail(StatusCode::NOT_FOUND, "Puzzle set not found");
    };
    let Some(first) = puzzles.first().map(|p| p.to_json(set_id)) else {
        return detail(StatusCode::BAD_REQUEST, "Puzzle set is empty");
    };

    state.next_session += 1;
    let id = format!("s{}", state.next_session);
    state.sessions.insert(
        id.clone(),
        FakeSession {
            set_id,
            ..Default::default()
        },
    );

    Json(json!({ "id": id, "puzzle": first, "score": 0, "elapsed_seconds": 0 })).into_response()
}

async fn next_puzzle(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    let exhausted = state.exhausted_body;
    let Some(session) = state.sessions.get_mut(&id) else {
        return detail(StatusCode::NOT_FOUND, "Session not found");
    };
    session.cursor += 1;
    session.ply = 0;
    let set_id = session.set_id;

    match state.current_puzzle(&id) {
        Some(puzzle) => Json(puzzle.to_json(set_id)).into_response(),
        None => match exhausted {
            ExhaustedBody::NoContent => StatusCode::NO_CONTENT.into_response(),
            ExhaustedBody::Null => Json(Value::Null).into_response(),
            ExhaustedBody::EmptyObject => Json(json!({})).into_response(),
        },
    }
}

async fn submit_move(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    let uci = body.get("move").and_then(Value::as_str).unwrap_or_default().to_string();
    state.moves.push(uci.clone());

    if state.fail_moves > 0 {
        state.fail_moves -= 1;
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Scoring backend unavailable");
    }

    let Some(puzzle) = state.current_puzzle(&id) else {
        return detail(StatusCode::NOT_FOUND, "Session not found");
    };
    let (echo, withhold) = (state.echo_initial_move, state.withhold_solution);
    let Some(session) = state.sessions.get_mut(&id) else {
        return detail(StatusCode::NOT_FOUND, "Session not found");
    };

    if puzzle.solution.get(session.ply) != Some(&uci) {
        session.attempts += 1;
        if withhold {
            return Json(json!({ "correct": false, "score": session.score })).into_response();
        }
        let mut solution = puzzle.solution.clone();
        if echo {
            if let Some(initial) = &puzzle.initial_move {
                solution.insert(0, initial.clone());
            }
        }
        return Json(json!({ "correct": false, "score": session.score, "solution": solution }))
            .into_response();
    }

    session.ply += 1;
    let reply = puzzle.solution.get(session.ply).cloned();
    if reply.is_some() {
        session.ply += 1;
    }
    let solved = session.ply >= puzzle.solution.len();
    if solved {
        session.score += 1;
    }

    let mut verdict = json!({ "correct": true, "score": session.score, "puzzle_solved": solved });
    if let (Some(reply), false) = (reply, solved) {
        verdict["next_move"] = json!(reply);
    }
    Json(verdict).into_response()
}

async fn hint(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = state.lock().unwrap();
    let (Some(puzzle), Some(session)) = (state.current_puzzle(&id), state.sessions.get(&id)) else {
        return detail(StatusCode::NOT_FOUND, "Session not found");
    };
    match puzzle.solution.get(session.ply) {
        Some(next) => Json(json!({ "square": &next[..2] })).into_response(),
        None => detail(StatusCode::BAD_REQUEST, "No hint available"),
    }
}

async fn summary(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    if state.fail_summaries > 0 {
        state.fail_summaries -= 1;
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Summary store unavailable");
    }
    let Some(session) = state.sessions.get(&id) else {
        return detail(StatusCode::NOT_FOUND, "Session not found");
    };
    let (score, attempts, set_id) = (session.score, session.attempts, session.set_id);
    let set_name = state.set(set_id).map(|(_, name, _)| name.clone()).unwrap_or_default();

    let previous = state
        .performances
        .iter()
        .filter(|p| p["puzzle_set"] == json!(set_name))
        .max_by_key(|p| p["date"].as_str().unwrap_or_default().to_string())
        .cloned();

    let performance_id = format!("perf-{id}");
    let elapsed = 42;
    state.performances.push(json!({
        "id": performance_id,
        "date": "2026-10-17T12:00:00",
        "puzzle_set": set_name,
        "score": score,
        "elapsed_seconds": elapsed,
    }));

    Json(json!({
        "score": score,
        "elapsed_seconds": elapsed,
        "attempts": attempts,
        "previous_score": previous.as_ref().map(|p| p["score"].clone()),
        "previous_elapsed_seconds": previous.as_ref().map(|p| p["elapsed_seconds"].clone()),
        "performance_id": performance_id,
    }))
    .into_response()
}

async fn rate(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> StatusCode {
    let value = body.get("value").and_then(Value::as_i64).unwrap_or_default();
    state.lock().unwrap().ratings.push((id, value));
    StatusCode::NO_CONTENT
}

async fn performances(State(state): State<Shared>) -> Json<Value> {
    Json(json!(state.lock().unwrap().performances))
}

// ---- Server ----

pub struct FakeBackend {
    pub state: Shared,
    base_url: String,
}

impl FakeBackend {
    pub async fn spawn(state: FakeState) -> Self {
        let state: Shared = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/api/puzzle_sets", get(list_sets))
            .route("/api/sessions", post(start_session))
            .route("/api/sessions/{id}/puzzle", get(next_puzzle))
            .route("/api/sessions/{id}/move", post(submit_move))
            .route("/api/sessions/{id}/hint", get(hint))
            .route("/api/sessions/{id}/summary", get(summary))
            .route("/api/puzzles/{id}/rating", post(rate))
            .route("/api/performances", get(performances))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake backend crashed");
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(5),
            opening_move_delay: Duration::from_millis(20),
            tick_period: Duration::from_millis(50),
        }
    }

    pub fn api(&self) -> HttpApi {
        HttpApi::new(&self.config()).expect("Failed to build HttpApi")
    }

    pub fn runtime(&self) -> TrainerRuntime<HttpApi> {
        TrainerRuntime::new(self.api(), &self.config())
    }
}
