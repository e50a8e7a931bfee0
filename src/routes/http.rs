//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, http::StatusCode, Json, response::{IntoResponse, Response}};
use tracing::{info, error, instrument};

use crate::content::ContentError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

fn error_out(status: StatusCode, message: impl Into<String>) -> Response {
  (status, Json(ErrorOut { error: message.into() })).into_response()
}

fn game_error(e: GameError) -> Response {
  let status = match e {
    GameError::Rejected(_) | GameError::InvalidPlayer => StatusCode::BAD_REQUEST,
    GameError::NoPuzzle => StatusCode::NOT_FOUND,
    GameError::RoundOver | GameError::NotFinished => StatusCode::CONFLICT,
  };
  error_out(status, e.to_string())
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

/// Today's game screen. A missing `playerId` issues a new one (see `playerId` in the view).
#[instrument(level = "info", skip(state))]
pub async fn http_get_puzzle(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PlayerQuery>,
) -> Response {
  let player = match resolve_player(q.player_id.as_deref()) {
    Ok(p) => p,
    Err(e) => return game_error(e),
  };
  match game_view(&state, &player).await {
    Ok(view) => {
      info!(target: "round", %player, date = %view.date_key, phase = ?view.phase, "HTTP puzzle served");
      Json(view).into_response()
    }
    Err(e) => game_error(e),
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_guess(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GuessIn>,
) -> Response {
  let player = match resolve_player(Some(&body.player_id)) {
    Ok(p) => p,
    Err(e) => return game_error(e),
  };
  match guess_out(&state, &player, &body.guess).await {
    Ok(out) => {
      info!(target: "round", %player, accepted = out.accepted, "HTTP guess evaluated");
      Json(out).into_response()
    }
    Err(e) => game_error(e),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_stats(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PlayerQuery>,
) -> Response {
  match resolve_player(q.player_id.as_deref()) {
    Ok(player) => Json(stats_for(&state, &player).await).into_response(),
    Err(e) => game_error(e),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_share(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PlayerQuery>,
) -> Response {
  let player = match resolve_player(q.player_id.as_deref()) {
    Ok(p) => p,
    Err(e) => return game_error(e),
  };
  match share_for(&state, &player).await {
    Ok(text) => Json(ShareOut { text }).into_response(),
    Err(e) => game_error(e),
  }
}

/// Full entry for today, answer included. Meant for server-side rendering.
#[instrument(level = "info", skip(state))]
pub async fn http_get_today_poem(State(state): State<Arc<AppState>>) -> Response {
  let today = state.today();
  match state.content.puzzle_for(today).await {
    Some((poem, _)) => Json(TodayPoemOut { poem }).into_response(),
    None => error_out(StatusCode::NOT_FOUND, "Poem not found"),
  }
}

// ---- admin ----

#[instrument(level = "info", skip(state))]
pub async fn http_get_poems(State(state): State<Arc<AppState>>) -> Response {
  let data = state.content.all().await;
  if data.is_empty() {
    return (StatusCode::NOT_FOUND, Json(MessageOut { message: "No data found".into() })).into_response();
  }
  Json(PoemsOut { data }).into_response()
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_poems(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PoemsIn>,
) -> Response {
  let Some(data) = body.data else {
    return (StatusCode::BAD_REQUEST, Json(MessageOut { message: "No data".into() })).into_response();
  };
  match state.content.overwrite(data).await {
    Ok(n) => {
      info!(target: "content", puzzles = n, "Admin overwrite saved");
      Json(MessageOut { message: "Data saved successfully!".into() }).into_response()
    }
    Err(e @ ContentError::Invalid { .. }) => {
      (StatusCode::BAD_REQUEST, Json(MessageOut { message: e.to_string() })).into_response()
    }
    Err(ContentError::ReadOnly) => {
      (StatusCode::CONFLICT, Json(MessageOut { message: "Content source is read-only".into() })).into_response()
    }
    Err(e) => {
      error!(target: "content", error = %e, "Admin overwrite failed");
      (StatusCode::INTERNAL_SERVER_ERROR, Json(MessageOut { message: "Failed to save data".into() })).into_response()
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_revalidate(State(state): State<Arc<AppState>>) -> Response {
  match state.content.refresh().await {
    Ok(n) => Json(RevalidateOut { success: true, message: format!("Revalidated successfully ({n} puzzles)") }).into_response(),
    Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(RevalidateOut { success: false, message: e.to_string() })).into_response(),
  }
}
