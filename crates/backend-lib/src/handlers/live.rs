// ============================
// huddle-backend-lib/src/handlers/live.rs
// ============================
//! Live event dispatch for one connection.
//!
//! The channel is best-effort: events missing required fields and events
//! aimed at targets that no longer exist are dropped without a reply, and
//! clients are expected to tolerate the resulting silence.
use huddle_common::{epoch_ms, AiQuestion, ChatBroadcast, ClientEvent, ConnectionId, ServerEvent};
use ::metrics::counter;
use tracing::{debug, info};
use uuid::Uuid;

use crate::metrics::{CHAT_MESSAGES, SIGNALS_FORWARDED};
use crate::room::{Departure, Participant};
use crate::AppState;

/// Handle one inbound client event.
pub async fn handle_client_event(state: &AppState, conn: ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::RoomJoin { room_id, name } => {
            if room_id.is_empty() {
                debug!(%conn, "join without room id");
                return;
            }
            if !state.registry.bind_to_room(conn, &room_id) {
                debug!(%conn, room = %room_id, "join ignored: connection bound elsewhere");
                return;
            }
            let Some(sender) = state.registry.sender_of(conn) else {
                return;
            };
            state.rooms.join(
                &room_id,
                Participant {
                    id: conn,
                    name,
                    sender,
                },
            );
        }

        ClientEvent::RoomLeave {} => {
            if let Some(room_id) = state.registry.unbind(conn) {
                state
                    .rooms
                    .remove_participant(&room_id, conn, Departure::Left);
            }
        }

        ClientEvent::ChatMessage {
            room_id,
            user,
            message,
        } => {
            if room_id.is_empty() || message.is_empty() {
                return;
            }
            // The id is the broadcast-time clock; see the protocol notes on
            // same-millisecond collisions.
            let broadcast = ServerEvent::Chat(ChatBroadcast {
                id: epoch_ms(),
                user,
                content: message,
            });
            if state
                .rooms
                .with_room(&room_id, |room| room.broadcast(&broadcast))
                .is_some()
            {
                counter!(CHAT_MESSAGES).increment(1);
            }
        }

        ClientEvent::ChatTyping {
            room_id,
            user,
            typing,
        } => {
            if room_id.is_empty() {
                return;
            }
            let event = ServerEvent::Typing { user, typing };
            state
                .rooms
                .with_room(&room_id, |room| room.broadcast_except(conn, &event));
        }

        ClientEvent::WebrtcOffer {
            room_id,
            to,
            description,
        } => {
            forward_signal(
                state,
                conn,
                &room_id,
                to,
                ServerEvent::WebrtcOffer {
                    from: conn,
                    description,
                },
            );
        }

        ClientEvent::WebrtcAnswer {
            room_id,
            to,
            description,
        } => {
            forward_signal(
                state,
                conn,
                &room_id,
                to,
                ServerEvent::WebrtcAnswer {
                    from: conn,
                    description,
                },
            );
        }

        ClientEvent::WebrtcIceCandidate {
            room_id,
            to,
            candidate,
        } => {
            forward_signal(
                state,
                conn,
                &room_id,
                to,
                ServerEvent::WebrtcIceCandidate {
                    from: conn,
                    candidate,
                },
            );
        }

        ClientEvent::TranscriptAppend { room_id, segment } => {
            if room_id.is_empty() {
                return;
            }
            let segment = segment.into_segment();
            state.rooms.with_room(&room_id, |room| {
                let update = room.append_segment(segment);
                room.broadcast(&update);
            });
        }

        ClientEvent::TranscriptGet { room_id } => {
            if room_id.is_empty() {
                return;
            }
            let Some(segments) = state
                .rooms
                .with_room(&room_id, |room| room.transcript().to_vec())
            else {
                return;
            };
            if let Some(tx) = state.registry.sender_of(conn) {
                let _ = tx.send(ServerEvent::TranscriptHistory { segments });
            }
        }

        ClientEvent::AiQuestion {
            room_id,
            user_id,
            question,
        } => {
            if room_id.is_empty() || question.is_empty() {
                return;
            }
            info!(%conn, room = %room_id, user = %user_id, "question asked");
            let Some(context) = state
                .rooms
                .with_room(&room_id, |room| room.transcript_context())
            else {
                return;
            };
            // Suspend point: other events interleave while the collaborator
            // works, so the room must be looked up afresh afterwards.
            let answer = state.answerer.answer(&question, &context).await;
            let record = AiQuestion {
                id: Uuid::new_v4().to_string(),
                question,
                answer,
                timestamp: epoch_ms(),
            };
            let delivered = state.rooms.with_room(&room_id, |room| {
                room.append_question(record.clone());
                room.send_to(conn, ServerEvent::AiAnswer(record.clone()));
                room.broadcast(&ServerEvent::AiQuestionAdded(record.clone()));
            });
            if delivered.is_none() {
                debug!(room = %room_id, "room gone before the answer arrived");
            }
        }

        ClientEvent::AiQuestionsGet { room_id } => {
            if room_id.is_empty() {
                return;
            }
            let Some(questions) = state
                .rooms
                .with_room(&room_id, |room| room.ai_questions().to_vec())
            else {
                return;
            };
            if let Some(tx) = state.registry.sender_of(conn) {
                let _ = tx.send(ServerEvent::AiHistory { questions });
            }
        }
    }
}

/// Point-to-point signaling forward. Content-agnostic: the payload is
/// already packed into `event` untouched. A missing target drops the
/// message; nothing is buffered or retried.
fn forward_signal(
    state: &AppState,
    from: ConnectionId,
    room_id: &str,
    to: ConnectionId,
    event: ServerEvent,
) {
    if room_id.is_empty() {
        return;
    }
    match state.registry.sender_of(to) {
        Some(tx) => {
            let _ = tx.send(event);
            counter!(SIGNALS_FORWARDED).increment(1);
        }
        None => debug!(%from, %to, "signal target gone"),
    }
}
