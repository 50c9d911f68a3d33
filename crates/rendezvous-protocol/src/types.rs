//! Core protocol types for the signaling wire format.
//!
//! Every message is a JSON object with a `type` field plus type-specific
//! fields. Both directions are modelled as tagged unions so the relay can
//! match on them exhaustively; anything that doesn't parse into a variant
//! is a protocol error, never a half-read object.
//!
//! Negotiation payloads (`sdp`, `candidate`) are kept as opaque
//! [`serde_json::Value`]s. The relay forwards them untouched, so any
//! negotiation scheme can ride on the same routing rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize;

/// Room used when a `hello` doesn't name one.
pub const DEFAULT_ROOM: &str = "default";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The externally supplied key of a room.
///
/// A "newtype wrapper" around `String`: a room code can't be passed
/// where a peer id is expected, even though both are strings on the wire.
/// `#[serde(transparent)]` keeps the JSON form a bare string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Creates a room code from anything string-like.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A relay-assigned peer identity, unique within one room.
///
/// The host is always `"host"`; joiners get `"peer-<n>"` where `n` is
/// the room's join sequence number at the time they joined.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    /// The fixed peer id of whoever currently holds the host slot.
    pub const HOST: &'static str = "host";

    /// Returns the host's peer id.
    pub fn host() -> Self {
        Self(Self::HOST.to_owned())
    }

    /// Derives a joiner's peer id from its join sequence number.
    pub fn for_join_seq(seq: u64) -> Self {
        Self(format!("peer-{seq}"))
    }

    /// Returns `true` if this is the host's peer id.
    pub fn is_host(&self) -> bool {
        self.0 == Self::HOST
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Which side of the negotiation a connection is on.
///
/// Parsing is lenient: `"host"` is the host, every other value (including
/// a missing `role`) means joiner. On the wire a joiner is `"join"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Host,
    #[default]
    Joiner,
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        if role == "host" { Self::Host } else { Self::Joiner }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Joiner => f.write_str("join"),
        }
    }
}

// ---------------------------------------------------------------------------
// Room metadata
// ---------------------------------------------------------------------------

/// Informational room metadata, set by the host.
///
/// `capacity` is advertised to clients and lobby listings only; the relay
/// never refuses a joiner because of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMeta {
    /// Display name shown in lobby listings.
    pub name: String,
    /// Advertised player capacity.
    pub capacity: u32,
    /// Opaque host-defined room options, echoed on host transfer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl RoomMeta {
    /// Default advertised capacity.
    pub const DEFAULT_CAPACITY: u32 = 10;

    /// Metadata for a fresh room: named after its code, default capacity.
    pub fn for_code(code: &RoomCode) -> Self {
        Self {
            name: code.to_string(),
            capacity: Self::DEFAULT_CAPACITY,
            options: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Client → relay
// ---------------------------------------------------------------------------

/// A raw capacity value as clients send it: a number or a numeric
/// string. Anything else lands in `Other` and normalizes to the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapacityValue {
    Number(f64),
    Text(String),
    Other(Value),
}

/// The identification message every connection starts with.
///
/// Accessors return the values the room layer works with: blanks treated
/// as absent, free-text fields normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    #[serde(default, deserialize_with = "lenient::text")]
    pub room: Option<String>,
    #[serde(default, deserialize_with = "lenient::role")]
    pub role: Role,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub player_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_only")]
    pub lobby_name: Option<String>,
    pub capacity: Option<CapacityValue>,
    pub options: Option<Value>,
}

impl Hello {
    /// The addressed room, falling back to [`DEFAULT_ROOM`].
    pub fn room_code(&self) -> RoomCode {
        RoomCode::new(non_empty(&self.room).unwrap_or(DEFAULT_ROOM))
    }

    /// The display name, if a non-empty one was given.
    pub fn display_name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    /// The external player id, if a non-empty one was given.
    pub fn external_player_id(&self) -> Option<&str> {
        non_empty(&self.player_id)
    }

    /// The normalized lobby name; `None` keeps the room's current name.
    pub fn normalized_lobby_name(&self) -> Option<String> {
        normalize::lobby_name(self.lobby_name.as_deref())
    }

    /// The normalized capacity; `None` keeps the room's current capacity.
    pub fn normalized_capacity(&self) -> Option<u32> {
        self.capacity.as_ref().map(normalize::capacity)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Field parsers for `hello`, which browsers fill from loosely typed
/// form state. A wrongly typed field degrades to a default instead of
/// rejecting the whole message.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::Role;

    /// Strings as sent, non-zero numbers and `true` as their text.
    /// `null`, `false`, `0`, arrays and objects count as absent.
    pub(super) fn text<'de, D>(de: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(de)? {
            Value::String(s) => Some(s),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            Value::Bool(true) => Some("true".to_owned()),
            _ => None,
        })
    }

    /// Strings only; any other type counts as absent.
    pub(super) fn string_only<'de, D>(de: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(de)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// Only the string `"host"` is the host.
    pub(super) fn role<'de, D>(de: D) -> Result<Role, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(de)? {
            Value::String(s) => Role::from(s),
            _ => Role::Joiner,
        })
    }
}

/// Messages clients send to the relay.
///
/// `#[serde(tag = "type")]` produces the internally tagged form
/// `{ "type": "offer", "target": "peer-1", "sdp": ... }` that browser
/// clients expect. Variant names go on the wire in kebab-case, fields in
/// camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Identify: join a room as host or joiner.
    Hello(Hello),

    /// Application-level keep-alive, answered with `pong`.
    Ping,

    /// Host → one joiner.
    Offer {
        target: PeerId,
        #[serde(default)]
        sdp: Value,
    },

    /// Joiner → host.
    Answer {
        #[serde(default)]
        sdp: Value,
    },

    /// Either direction. `target` is only meaningful when the host sends.
    Ice {
        #[serde(default)]
        target: Option<PeerId>,
        #[serde(default)]
        candidate: Value,
    },

    /// A joiner announcing it is leaving the room.
    PeerLeft,
}

impl ClientMessage {
    /// Every `type` tag this enum understands.
    pub const TYPES: [&'static str; 6] =
        ["hello", "ping", "offer", "answer", "ice", "peer-left"];

    /// The wire `type` tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hello(_) => "hello",
            Self::Ping => "ping",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Ice { .. } => "ice",
            Self::PeerLeft => "peer-left",
        }
    }
}

// ---------------------------------------------------------------------------
// Relay → client
// ---------------------------------------------------------------------------

/// Messages the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Reply to a successful `hello`: the assigned peer id and room meta.
    Welcome { id: PeerId, meta: RoomMeta },

    /// Something the sender did was rejected. The connection stays open.
    Error { message: String },

    /// Reply to `ping`. `now` is milliseconds since the Unix epoch.
    Pong { now: u64 },

    /// Tells the host a joiner is waiting to negotiate.
    JoinRequest {
        peer_id: PeerId,
        name: String,
        player_id: String,
    },

    /// A relayed host offer; `peer_id` is always `"host"`.
    Offer {
        peer_id: PeerId,
        name: String,
        player_id: String,
        sdp: Value,
    },

    /// A relayed joiner answer.
    Answer { peer_id: PeerId, sdp: Value },

    /// A relayed candidate hint.
    Ice { peer_id: PeerId, candidate: Value },

    /// Tells the host a joiner left.
    PeerLeft { peer_id: PeerId },

    /// The host slot changed hands. `become_host` is only set (and
    /// `meta` only sent) on the copy delivered to the promoted peer.
    HostTransfer {
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        become_host: bool,
        player_id: String,
        name: String,
        lobby_name: String,
        options: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<RoomMeta>,
    },
}

impl ServerMessage {
    /// Shorthand for an [`Error`](Self::Error) reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lobby listing
// ---------------------------------------------------------------------------

/// One participant as shown in a lobby listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// External player id (falls back to the relay peer id).
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A summary of a room returned by lobby queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub code: RoomCode,
    pub name: String,
    pub capacity: u32,
    /// Host first, then joiners in join order.
    pub players: Vec<PlayerSummary>,
}
