//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.
//!
//! Messages on one socket are handled in order, so a client cannot have two
//! guesses in flight on the same connection.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "couple_it", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "couple_it", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "couple_it", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "couple_it", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "couple_it", "WebSocket disconnected");
}

fn error_msg(e: GameError) -> ServerWsMessage {
  ServerWsMessage::Error { message: e.to_string() }
}

#[instrument(level = "info", skip(state))]
pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::GetPuzzle { player_id } => {
      let player = match resolve_player(player_id.as_deref()) {
        Ok(p) => p,
        Err(e) => return error_msg(e),
      };
      match game_view(state, &player).await {
        Ok(view) => ServerWsMessage::Puzzle { view },
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::SubmitGuess { player_id, guess } => {
      let player = match resolve_player(Some(&player_id)) {
        Ok(p) => p,
        Err(e) => return error_msg(e),
      };
      match guess_out(state, &player, &guess).await {
        Ok(result) => {
          info!(target: "round", %player, accepted = result.accepted, "WS guess evaluated");
          ServerWsMessage::GuessResult { result }
        }
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::GetStats { player_id } => match resolve_player(Some(&player_id)) {
      Ok(player) => ServerWsMessage::Stats { stats: stats_for(state, &player).await },
      Err(e) => error_msg(e),
    },

    ClientWsMessage::GetShare { player_id } => {
      let player = match resolve_player(Some(&player_id)) {
        Ok(p) => p,
        Err(e) => return error_msg(e),
      };
      match share_for(state, &player).await {
        Ok(text) => ServerWsMessage::Share { text },
        Err(e) => error_msg(e),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::logic::tests::test_state;

  fn parse(json: &str) -> ClientWsMessage {
    serde_json::from_str(json).unwrap()
  }

  #[tokio::test]
  async fn ping_pongs() {
    let state = test_state(4, false);
    let reply = handle_client_ws(parse(r#"{"type":"ping"}"#), &state).await;
    assert!(matches!(reply, ServerWsMessage::Pong));
  }

  #[tokio::test]
  async fn submit_guess_over_ws() {
    let state = test_state(4, false);
    let reply = handle_client_ws(parse(r#"{"type":"submit_guess","playerId":"ws1","guess":"hi"}"#), &state).await;
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["type"], "guess_result");
    assert_eq!(json["result"]["accepted"], false);
    assert_eq!(json["result"]["reason"], "not_a_word");
    assert_eq!(json["result"]["message"], "Invalid Word");

    let reply = handle_client_ws(parse(r#"{"type":"submit_guess","playerId":"ws1","guess":"Light"}"#), &state).await;
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["result"]["record"]["status"], "correct");
    assert_eq!(json["result"]["view"]["phase"], "won");
  }

  #[tokio::test]
  async fn share_before_end_is_an_error() {
    let state = test_state(4, false);
    let reply = handle_client_ws(parse(r#"{"type":"get_share","playerId":"ws2"}"#), &state).await;
    assert!(matches!(reply, ServerWsMessage::Error { .. }));
  }

  #[tokio::test]
  async fn get_puzzle_without_player_issues_one() {
    let state = test_state(4, false);
    let reply = handle_client_ws(parse(r#"{"type":"get_puzzle"}"#), &state).await;
    match reply {
      ServerWsMessage::Puzzle { view } => assert_eq!(view.player_id.len(), 36),
      other => panic!("unexpected reply: {other:?}"),
    }
  }
}
