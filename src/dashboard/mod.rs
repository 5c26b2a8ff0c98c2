use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod error;

pub use error::ApiError;

use crate::scoreboard::{HistoryEntry, ScoreError, ScoreboardState, Team, TeamId};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Amounts offered as quick-add buttons
    pub add_amounts: Vec<u32>,
    /// Amounts offered as subtract buttons
    pub subtract_amounts: Vec<u32>,
}

/// Build the Axum router for the scoreboard page and its API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/config", get(config_handler))
        .route("/api/sessions", post(create_session_handler))
        .route(
            "/api/sessions/:id",
            get(state_handler).delete(delete_session_handler),
        )
        .route("/api/sessions/:id/history", get(history_handler))
        .route("/api/sessions/:id/reset", post(reset_handler))
        .route("/api/sessions/:id/teams/:team/add", post(add_handler))
        .route("/api/sessions/:id/teams/:team/subtract", post(subtract_handler))
        .route("/api/sessions/:id/teams/:team/name", put(rename_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

// ── Request / response bodies ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AmountRequest {
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct RenameRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    team: Option<String>,
}

/// One row of a history table
#[derive(Debug, Serialize)]
struct HistoryRow {
    timestamp: DateTime<Utc>,
    /// "%Y-%m-%d %H:%M:%S"
    time: String,
    team: TeamId,
    /// Current name of `team`; earlier rows follow later renames
    team_name: String,
    delta: i64,
    /// Delta with explicit sign ("+10", "-5")
    delta_label: String,
    resulting_total: u64,
}

/// Board as rendered by the page
#[derive(Debug, Serialize)]
struct BoardView {
    teams: Vec<Team>,
    leader: Option<TeamId>,
    history: Vec<HistoryRow>,
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: String,
    state: BoardView,
}

#[derive(Debug, Serialize)]
struct ConfigView {
    add_amounts: Vec<u32>,
    subtract_amounts: Vec<u32>,
    default_names: [&'static str; 2],
}

fn history_row(board: &ScoreboardState, entry: &HistoryEntry) -> HistoryRow {
    HistoryRow {
        timestamp: entry.timestamp,
        time: entry.display_timestamp(),
        team: entry.team,
        team_name: board.team(entry.team).name.clone(),
        delta: entry.delta,
        delta_label: entry.signed_delta(),
        resulting_total: entry.resulting_total,
    }
}

fn board_view(board: &ScoreboardState) -> BoardView {
    BoardView {
        teams: board.teams().to_vec(),
        leader: board.leader().map(|t| t.id),
        history: board
            .history()
            .iter()
            .map(|e| history_row(board, e))
            .collect(),
    }
}

/// Request bodies carry a signed integer so that zero and negative amounts
/// reach the domain error instead of a deserialization rejection.
fn parse_amount(amount: i64) -> Result<u32, ScoreError> {
    u32::try_from(amount)
        .ok()
        .filter(|&a| a > 0)
        .ok_or(ScoreError::InvalidAmount { amount })
}

/// Bodies that are not `{"amount": <i64>}` (fractions, strings, values past
/// `i64`) are reported as invalid amounts, like zero or negative ones.
fn amount_from_body(body: Result<Json<AmountRequest>, JsonRejection>) -> Result<u32, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::MalformedAmount(e.body_text()))?;
    Ok(parse_amount(req.amount)?)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// Serve the scoreboard page, injecting the configured button amounts.
async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let html = SCOREBOARD_HTML.replace(
        r#"<body>"#,
        &format!(
            r#"<body data-add="{}" data-sub="{}">"#,
            join_amounts(&state.add_amounts),
            join_amounts(&state.subtract_amounts)
        ),
    );
    Html(html)
}

fn join_amounts(amounts: &[u32]) -> String {
    amounts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// GET /api/config
async fn config_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ConfigView {
        add_amounts: state.add_amounts.clone(),
        subtract_amounts: state.subtract_amounts.clone(),
        default_names: [TeamId::A.default_name(), TeamId::B.default_name()],
    })
}

/// POST /api/sessions
async fn create_session_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = state.sessions.create()?;
    let board = state.sessions.with_session(&session_id, |board| board.snapshot())?;
    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            state: board_view(&board),
        }),
    ))
}

/// DELETE /api/sessions/:id
async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.sessions.remove(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET /api/sessions/:id
async fn state_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Render outside the store lock
    let board = state.sessions.with_session(&id, |board| board.snapshot())?;
    Ok(Json(board_view(&board)))
}

/// GET /api/sessions/:id/history?team=A
async fn history_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let team = query.team.as_deref().map(str::parse::<TeamId>).transpose()?;
    let board = state.sessions.with_session(&id, |board| board.snapshot())?;
    let rows: Vec<HistoryRow> = match team {
        Some(team) => board
            .history_for(team)
            .map(|e| history_row(&board, e))
            .collect(),
        None => board
            .history()
            .iter()
            .map(|e| history_row(&board, e))
            .collect(),
    };
    Ok(Json(rows))
}

/// POST /api/sessions/:id/teams/:team/add  {"amount": 10}
async fn add_handler(
    State(state): State<Arc<AppState>>,
    Path((id, team)): Path<(String, String)>,
    body: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let team: TeamId = team.parse()?;
    let amount = amount_from_body(body)?;
    let updated = state
        .sessions
        .with_session(&id, |board| board.add_points(team, amount))??;
    Ok(Json(updated))
}

/// POST /api/sessions/:id/teams/:team/subtract  {"amount": 5}
async fn subtract_handler(
    State(state): State<Arc<AppState>>,
    Path((id, team)): Path<(String, String)>,
    body: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let team: TeamId = team.parse()?;
    let amount = amount_from_body(body)?;
    let updated = state
        .sessions
        .with_session(&id, |board| board.subtract_points(team, amount))?
        .map_err(|e| {
            info!("Session {}: rejected subtraction: {}", id, e);
            e
        })?;
    Ok(Json(updated))
}

/// PUT /api/sessions/:id/teams/:team/name  {"name": "..."}
async fn rename_handler(
    State(state): State<Arc<AppState>>,
    Path((id, team)): Path<(String, String)>,
    body: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let team: TeamId = team.parse()?;
    let Json(req) = body.map_err(|e| ApiError::MalformedBody(e.body_text()))?;
    let updated = state
        .sessions
        .with_session(&id, |board| board.rename_team(team, &req.name))?;
    Ok(Json(updated))
}

/// POST /api/sessions/:id/reset
async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let board = state.sessions.with_session(&id, |board| {
        board.reset();
        board.snapshot()
    })?;
    info!("Session {}: scores reset", id);
    Ok(Json(board_view(&board)))
}

/// Embedded single-file scoreboard page (HTML + CSS + JS)
const SCOREBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Domino Pairs Scoreboard</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; }
  .two-col { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; }
  @media (max-width: 768px) { .two-col { grid-template-columns: 1fr; } main { padding: 1rem; } }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; overflow: hidden; }
  .panel.leader { border-color: var(--green); }
  .panel-header { padding: .9rem 1.2rem; border-bottom: 1px solid var(--border); font-weight: 600; display: flex; justify-content: space-between; align-items: center; gap: .5rem; }
  .name-input { background: transparent; border: 1px solid transparent; color: var(--text); font-size: 1.1rem; font-weight: 600; padding: .2rem .4rem; border-radius: 6px; width: 100%; }
  .name-input:focus { border-color: var(--accent); outline: none; }
  .total { font-size: 4rem; font-weight: 700; text-align: center; padding: 1rem 0 .5rem; }
  .buttons { display: flex; flex-wrap: wrap; gap: .5rem; justify-content: center; padding: 0 1rem 1rem; }
  .btn { background: none; border: 1px solid var(--border); color: var(--text); padding: .6rem 1rem; border-radius: 6px; cursor: pointer; font-size: 1rem; font-weight: 600; min-width: 4rem; }
  .btn.add:hover { border-color: var(--green); color: var(--green); }
  .btn.sub:hover { border-color: var(--red); color: var(--red); }
  .btn.reset { font-size: .8rem; color: var(--muted); margin-left: auto; }
  .btn.reset:hover { border-color: var(--accent); color: var(--accent); }
  table { width: 100%; border-collapse: collapse; }
  th { padding: .7rem 1rem; text-align: left; font-size: .75rem; text-transform: uppercase; color: var(--muted); border-bottom: 1px solid var(--border); }
  td { padding: .65rem 1rem; font-size: .88rem; border-bottom: 1px solid #1e2130; }
  tr:last-child td { border-bottom: none; }
  .pos { color: var(--green); }
  .neg { color: var(--red); }
  .empty { color: var(--muted); text-align: center; padding: 1.2rem; font-size: .9rem; }
  #toast { position: fixed; bottom: 1.5rem; left: 50%; transform: translateX(-50%); background: var(--red); color: #000; padding: .6rem 1.2rem; border-radius: 6px; font-weight: 600; display: none; }
</style>
</head>
<body>
<header>
  <h1>🁫 Domino Pairs</h1>
  <button class="btn reset" id="reset-btn" title="Zero both scores and clear the history">🧹 Reset scores</button>
</header>

<main>
  <div class="two-col" id="teams"></div>

  <div class="panel">
    <div class="panel-header">History</div>
    <table>
      <thead><tr><th>Time</th><th>Team</th><th>Change</th><th>Total</th></tr></thead>
      <tbody id="history-tbody"><tr><td colspan="4" class="empty">Loading…</td></tr></tbody>
    </table>
  </div>
</main>
<div id="toast"></div>

<script>
const amounts = attr => (document.body.dataset[attr] || '').split(',').filter(Boolean).map(Number);
const ADD = amounts('add');
const SUB = amounts('sub');
const esc = s => String(s).replace(/[&<>"']/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));
let sessionId = sessionStorage.getItem('scoreboard-session');

function toast(msg) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.style.display = 'block';
  clearTimeout(toast.timer);
  toast.timer = setTimeout(() => { el.style.display = 'none'; }, 3000);
}

async function newSession() {
  const r = await fetch('/api/sessions', { method: 'POST' });
  if (!r.ok) { toast('Could not start a scoreboard'); return null; }
  const body = await r.json();
  sessionId = body.session_id;
  sessionStorage.setItem('scoreboard-session', sessionId);
  return body.state;
}

async function call(method, path, payload) {
  if (!sessionId) await newSession();
  const opts = { method, headers: {} };
  if (payload !== undefined) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(payload);
  }
  let r = await fetch(`/api/sessions/${sessionId}${path}`, opts);
  if (r.status === 404) {
    await newSession();
    r = await fetch(`/api/sessions/${sessionId}${path}`, opts);
  }
  if (!r.ok) {
    const err = await r.json().catch(() => ({}));
    toast(err.details || err.error || 'Request failed');
    return false;
  }
  return true;
}

function teamPanel(team, leader) {
  return `<div class="panel ${leader === team.id ? 'leader' : ''}">
    <div class="panel-header">
      <input class="name-input" data-team="${team.id}" value="${esc(team.name)}" maxlength="40">
    </div>
    <div class="total">${team.total}</div>
    <div class="buttons">
      ${ADD.map(v => `<button class="btn add" data-team="${team.id}" data-op="add" data-amount="${v}">➕ ${v}</button>`).join('')}
      ${SUB.map(v => `<button class="btn sub" data-team="${team.id}" data-op="subtract" data-amount="${v}">➖ ${v}</button>`).join('')}
    </div>
    <table>
      <thead><tr><th>Time</th><th>Change</th><th>Total</th></tr></thead>
      <tbody id="history-${team.id}"></tbody>
    </table>
  </div>`;
}

function historyRows(rows, withTeam) {
  const cols = withTeam ? 4 : 3;
  if (!rows.length) return `<tr><td colspan="${cols}" class="empty">No changes recorded yet</td></tr>`;
  return rows.slice().reverse().map(h => `<tr>
    <td>${esc(h.time)}</td>
    ${withTeam ? `<td>${esc(h.team_name)}</td>` : ''}
    <td class="${h.delta >= 0 ? 'pos' : 'neg'}">${esc(h.delta_label)}</td>
    <td>${h.resulting_total}</td>
  </tr>`).join('');
}

function render(state) {
  document.getElementById('teams').innerHTML = state.teams.map(t => teamPanel(t, state.leader)).join('');
  for (const t of state.teams) {
    document.getElementById(`history-${t.id}`).innerHTML =
      historyRows(state.history.filter(h => h.team === t.id), false);
  }
  document.getElementById('history-tbody').innerHTML = historyRows(state.history, true);
}

async function refresh() {
  if (!sessionId) { const s = await newSession(); if (s) render(s); return; }
  const r = await fetch(`/api/sessions/${sessionId}`);
  if (r.status === 404) { const s = await newSession(); if (s) render(s); return; }
  if (r.ok) render(await r.json());
}

document.getElementById('teams').addEventListener('click', async ev => {
  const btn = ev.target.closest('button[data-op]');
  if (!btn) return;
  await call('POST', `/teams/${btn.dataset.team}/${btn.dataset.op}`, { amount: Number(btn.dataset.amount) });
  await refresh();
});

document.getElementById('teams').addEventListener('change', async ev => {
  const input = ev.target.closest('input[data-team]');
  if (!input) return;
  await call('PUT', `/teams/${input.dataset.team}/name`, { name: input.value });
  await refresh();
});

document.getElementById('reset-btn').addEventListener('click', async () => {
  await call('POST', '/reset');
  await refresh();
});

refresh();
</script>
</body>
</html>"#;
