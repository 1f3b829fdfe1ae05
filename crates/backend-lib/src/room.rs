// ============================
// huddle-backend-lib/src/room.rs
// ============================
//! Room store and the presence/membership protocol around it.
//!
//! A room exists exactly as long as it has participants. All state is
//! in-memory; when the last participant goes, the transcript and question
//! logs go with the room.
use std::collections::HashMap;

use huddle_common::{
    AiQuestion, ConnectionId, ParticipantInfo, ServerEvent, TranscriptSegment,
};
use ::metrics::{counter, gauge};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::metrics::{ROOMS_ACTIVE, ROOM_CREATED, ROOM_DELETED};

/// One connected client's membership record within a room.
pub struct Participant {
    pub id: ConnectionId,
    pub name: Option<String>,
    /// Outbound channel of the owning connection
    pub sender: UnboundedSender<ServerEvent>,
}

impl Participant {
    fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            id: self.id,
            name: self.name.clone(),
        }
    }

    fn send(&self, event: ServerEvent) {
        // A closed channel means the connection is gone; delivery to a
        // vanished connection is a silent no-op.
        if self.sender.send(event).is_err() {
            debug!(participant = %self.id, "dropping event for closed connection");
        }
    }
}

/// A named, ephemeral meeting session.
pub struct Room {
    pub id: String,
    participants: HashMap<ConnectionId, Participant>,
    transcript: Vec<TranscriptSegment>,
    ai_questions: Vec<AiQuestion>,
}

impl Room {
    fn new(id: String) -> Self {
        Self {
            id,
            participants: HashMap::new(),
            transcript: Vec::new(),
            ai_questions: Vec::new(),
        }
    }

    /// Deliver an event to every participant, sender included.
    pub fn broadcast(&self, event: &ServerEvent) {
        for participant in self.participants.values() {
            participant.send(event.clone());
        }
    }

    /// Deliver an event to every participant except `skip`.
    pub fn broadcast_except(&self, skip: ConnectionId, event: &ServerEvent) {
        for participant in self.participants.values() {
            if participant.id != skip {
                participant.send(event.clone());
            }
        }
    }

    /// Deliver an event to one participant, if still present.
    pub fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(participant) = self.participants.get(&conn) {
            participant.send(event);
        }
    }

    pub fn participant_infos(&self) -> Vec<ParticipantInfo> {
        self.participants.values().map(Participant::info).collect()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Append a segment and build the broadcast carrying it plus the full
    /// updated log.
    pub fn append_segment(&mut self, segment: TranscriptSegment) -> ServerEvent {
        self.transcript.push(segment.clone());
        ServerEvent::TranscriptUpdate {
            segment,
            transcript: self.transcript.clone(),
        }
    }

    pub fn append_question(&mut self, question: AiQuestion) {
        self.ai_questions.push(question);
    }

    pub fn transcript(&self) -> &[TranscriptSegment] {
        &self.transcript
    }

    pub fn ai_questions(&self) -> &[AiQuestion] {
        &self.ai_questions
    }

    /// Transcript rendered as context lines for the answer collaborator.
    pub fn transcript_context(&self) -> String {
        self.transcript
            .iter()
            .map(|s| format!("{}: {}", s.speaker, s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Why a participant is being removed; picks the room notice text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    Left,
    Disconnected,
}

impl Departure {
    fn notice(self) -> &'static str {
        match self {
            Departure::Left => "A participant left",
            Departure::Disconnected => "A participant disconnected",
        }
    }
}

/// Read-only view of a room for the HTTP inspection surface.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: String,
    pub participants: Vec<ParticipantInfo>,
    pub transcript_len: usize,
    pub ai_question_len: usize,
}

/// Manager for all active rooms.
///
/// Every operation runs to completion under one lock, so membership
/// changes, history appends and the broadcasts that follow them are atomic
/// with respect to each other. The lock is never held across an await;
/// outbound delivery is an unbounded-channel write and cannot block.
pub struct RoomManager {
    rooms: Mutex<HashMap<String, Room>>,
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Join side effects, in order: participant upsert, "joined" notice to
    /// the others, participant list to everyone, history replay to the
    /// joiner. The room is created lazily on first join; rejoining
    /// overwrites the membership record, refreshing the display name.
    pub fn join(&self, room_id: &str, participant: Participant) {
        let mut rooms = self.rooms.lock();
        let created = !rooms.contains_key(room_id);
        let conn = participant.id;
        {
            let room = rooms
                .entry(room_id.to_string())
                .or_insert_with(|| Room::new(room_id.to_string()));
            let display = participant
                .name
                .clone()
                .unwrap_or_else(|| "Someone".to_string());
            room.participants.insert(conn, participant);
            room.broadcast_except(conn, &ServerEvent::SystemInfo(format!("{display} joined")));
            room.broadcast(&ServerEvent::Participants(room.participant_infos()));
            room.send_to(
                conn,
                ServerEvent::TranscriptHistory {
                    segments: room.transcript.clone(),
                },
            );
            room.send_to(
                conn,
                ServerEvent::AiHistory {
                    questions: room.ai_questions.clone(),
                },
            );
        }
        if created {
            counter!(ROOM_CREATED).increment(1);
        }
        gauge!(ROOMS_ACTIVE).set(rooms.len() as f64);
        info!(room = room_id, participant = %conn, "participant joined");
    }

    /// Removal side effects, in order: remove the record, notice + refreshed
    /// list to the remaining participants, room deletion once empty. The
    /// deletion discards transcript and question history.
    pub fn remove_participant(&self, room_id: &str, conn: ConnectionId, departure: Departure) {
        let mut rooms = self.rooms.lock();
        let Some(room) = rooms.get_mut(room_id) else {
            return;
        };
        if room.participants.remove(&conn).is_none() {
            return;
        }
        room.broadcast(&ServerEvent::SystemInfo(departure.notice().to_string()));
        room.broadcast(&ServerEvent::Participants(room.participant_infos()));
        if room.participants.is_empty() {
            rooms.remove(room_id);
            counter!(ROOM_DELETED).increment(1);
        }
        gauge!(ROOMS_ACTIVE).set(rooms.len() as f64);
        info!(room = room_id, participant = %conn, ?departure, "participant removed");
    }

    /// Run `f` against the room, if it exists. Everything `f` does happens
    /// under the store lock, so callers get the same atomicity as join and
    /// removal.
    pub fn with_room<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> Option<R> {
        let mut rooms = self.rooms.lock();
        rooms.get_mut(room_id).map(f)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.lock().contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn snapshot(&self, room_id: &str) -> Option<RoomSnapshot> {
        let rooms = self.rooms.lock();
        rooms.get(room_id).map(|room| RoomSnapshot {
            id: room.id.clone(),
            participants: room.participant_infos(),
            transcript_len: room.transcript.len(),
            ai_question_len: room.ai_questions.len(),
        })
    }
}
