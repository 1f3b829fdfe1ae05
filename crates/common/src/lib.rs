// ================
// common/src/lib.rs
// ================
//! Wire protocol shared between the huddle signaling server and its
//! clients. Every frame is a JSON envelope `{"event": "...", "data": ...}`;
//! the enums below define both directions of the channel.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-assigned identifier for one live client connection.
///
/// Ephemeral: a reconnect produces a fresh id, there is no session
/// resumption.
pub type ConnectionId = Uuid;

/// Current time as epoch milliseconds, the timestamp unit used on the wire.
pub fn epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Events sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Join a room, creating it on first use.
    /// `name` is the display name shown to other participants.
    #[serde(rename = "room:join")]
    #[serde(rename_all = "camelCase")]
    RoomJoin {
        room_id: String,
        #[serde(default)]
        name: Option<String>,
    },
    /// Leave the currently joined room.
    #[serde(rename = "room:leave")]
    RoomLeave {},
    /// Broadcast a chat message to the whole room, sender included.
    #[serde(rename = "chat:message")]
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        room_id: String,
        user: String,
        message: String,
    },
    /// Transient typing indicator, relayed to everyone but the sender.
    #[serde(rename = "chat:typing")]
    #[serde(rename_all = "camelCase")]
    ChatTyping {
        room_id: String,
        user: String,
        typing: bool,
    },
    /// WebRTC offer for one specific peer. The payload is opaque to the
    /// server and forwarded verbatim.
    #[serde(rename = "webrtc:offer")]
    #[serde(rename_all = "camelCase")]
    WebrtcOffer {
        room_id: String,
        to: ConnectionId,
        description: serde_json::Value,
    },
    /// WebRTC answer for one specific peer.
    #[serde(rename = "webrtc:answer")]
    #[serde(rename_all = "camelCase")]
    WebrtcAnswer {
        room_id: String,
        to: ConnectionId,
        description: serde_json::Value,
    },
    /// ICE candidate for one specific peer.
    #[serde(rename = "webrtc:ice-candidate")]
    #[serde(rename_all = "camelCase")]
    WebrtcIceCandidate {
        room_id: String,
        to: ConnectionId,
        candidate: serde_json::Value,
    },
    /// Append a transcript segment to the room history.
    #[serde(rename = "transcript:append")]
    #[serde(rename_all = "camelCase")]
    TranscriptAppend {
        room_id: String,
        segment: SegmentDraft,
    },
    /// Request the room's transcript history.
    #[serde(rename = "transcript:get")]
    #[serde(rename_all = "camelCase")]
    TranscriptGet { room_id: String },
    /// Ask a question about the meeting; the answer comes from an external
    /// collaborator and is broadcast together with the question.
    #[serde(rename = "ai:question")]
    #[serde(rename_all = "camelCase")]
    AiQuestion {
        room_id: String,
        user_id: String,
        question: String,
    },
    /// Request the room's question/answer history.
    #[serde(rename = "ai:questions-get")]
    #[serde(rename_all = "camelCase")]
    AiQuestionsGet { room_id: String },
}

/// Events sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// First frame on every connection: the id peers will use to address
    /// signaling messages to this client.
    #[serde(rename = "connection:welcome")]
    Welcome { id: ConnectionId },
    /// Full participant list of the room, sent after every membership change.
    #[serde(rename = "participants:update")]
    Participants(Vec<ParticipantInfo>),
    /// Human-readable room notice ("Alice joined", ...).
    #[serde(rename = "system:info")]
    SystemInfo(String),
    /// Chat broadcast, delivered to every participant including the sender.
    #[serde(rename = "chat:message")]
    Chat(ChatBroadcast),
    /// Typing indicator from another participant.
    #[serde(rename = "chat:typing")]
    Typing { user: String, typing: bool },
    /// Forwarded WebRTC offer, tagged with the sending connection.
    #[serde(rename = "webrtc:offer")]
    WebrtcOffer {
        from: ConnectionId,
        description: serde_json::Value,
    },
    /// Forwarded WebRTC answer.
    #[serde(rename = "webrtc:answer")]
    WebrtcAnswer {
        from: ConnectionId,
        description: serde_json::Value,
    },
    /// Forwarded ICE candidate.
    #[serde(rename = "webrtc:ice-candidate")]
    WebrtcIceCandidate {
        from: ConnectionId,
        candidate: serde_json::Value,
    },
    /// A segment was appended; carries the segment and the full log.
    #[serde(rename = "transcript:update")]
    TranscriptUpdate {
        segment: TranscriptSegment,
        transcript: Vec<TranscriptSegment>,
    },
    /// Transcript history replay (on join or explicit request).
    #[serde(rename = "transcript:history")]
    TranscriptHistory { segments: Vec<TranscriptSegment> },
    /// Direct reply to the connection that asked a question.
    #[serde(rename = "ai:answer")]
    AiAnswer(AiQuestion),
    /// Question/answer pair broadcast to the whole room.
    #[serde(rename = "ai:question-added")]
    AiQuestionAdded(AiQuestion),
    /// Question/answer history replay (on join or explicit request).
    #[serde(rename = "ai:history")]
    AiHistory { questions: Vec<AiQuestion> },
}

/// One entry of a `participants:update` broadcast.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParticipantInfo {
    pub id: ConnectionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A chat message as broadcast to the room. Transient: never stored.
/// The id is the server's epoch-millisecond clock at broadcast time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatBroadcast {
    pub id: i64,
    pub user: String,
    pub content: String,
}

/// One attributed, timestamped span of recognized speech text.
/// Append-only once recorded; replayed verbatim to late joiners.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub id: String,
    pub speaker: String,
    pub text: String,
    pub timestamp: i64,
    pub confidence: f64,
}

/// Incoming shape of a transcript segment. Capture pipelines do not always
/// provide an id or timestamp, so those are filled in server-side.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SegmentDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl SegmentDraft {
    /// Promote the draft to a stored segment, generating the missing fields.
    pub fn into_segment(self) -> TranscriptSegment {
        TranscriptSegment {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            speaker: self.speaker,
            text: self.text,
            timestamp: self.timestamp.unwrap_or_else(epoch_ms),
            confidence: self.confidence.unwrap_or(1.0),
        }
    }
}

/// A question/answer pair recorded in the room, replayed to late joiners.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AiQuestion {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub timestamp: i64,
}
