// ==============
// huddle-backend-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTIONS: &str = "ws.connections";
pub const WS_ACTIVE: &str = "ws.active";
pub const ROOM_CREATED: &str = "room.created";
pub const ROOM_DELETED: &str = "room.deleted";
pub const ROOMS_ACTIVE: &str = "rooms.active";
pub const CHAT_MESSAGES: &str = "chat.messages";
pub const SIGNALS_FORWARDED: &str = "signal.forwarded";
