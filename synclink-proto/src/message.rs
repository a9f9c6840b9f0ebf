//! Protocol message types exchanged between the driver and the agent.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Environment variable through which the driver tells the agent its port.
pub const PORT_ENV: &str = "SYNCLINK_PORT";

/// Every message that can cross the link.
///
/// The set is closed: each variant owns exactly one wire tag (see
/// [`MessageKind::tag`]) and both ends are built against the same table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A build sync began.
    SyncStarted(SyncStarted),
    /// A build sync finished.
    SyncCompleted(SyncCompleted),
    /// Arguments for the next sync.
    SyncParameters(SyncParameters),
    /// Where the build tool installation lives.
    ConnectionParameters(ConnectionParameters),
    /// Driver asks the agent to sync or to exit.
    SyncRequest(SyncRequest),
    /// Agent reports the outcome of a [`SyncRequest`].
    SyncRequestCompleted(SyncRequestCompleted),
}

impl Message {
    /// The variant of this message, without its payload.
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::SyncStarted(_) => MessageKind::SyncStarted,
            Self::SyncCompleted(_) => MessageKind::SyncCompleted,
            Self::SyncParameters(_) => MessageKind::SyncParameters,
            Self::ConnectionParameters(_) => MessageKind::ConnectionParameters,
            Self::SyncRequest(_) => MessageKind::SyncRequest,
            Self::SyncRequestCompleted(_) => MessageKind::SyncRequestCompleted,
        }
    }
}

/// Payload-free name of a [`Message`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// [`SyncStarted`].
    SyncStarted,
    /// [`SyncCompleted`].
    SyncCompleted,
    /// [`SyncParameters`].
    SyncParameters,
    /// [`ConnectionParameters`].
    ConnectionParameters,
    /// [`SyncRequest`].
    SyncRequest,
    /// [`SyncRequestCompleted`].
    SyncRequestCompleted,
}

impl MessageKind {
    /// All variants in tag order.
    pub const ALL: [Self; 6] = [
        Self::SyncStarted,
        Self::SyncCompleted,
        Self::SyncParameters,
        Self::ConnectionParameters,
        Self::SyncRequest,
        Self::SyncRequestCompleted,
    ];

    /// Wire tag for this variant.
    pub const fn tag(self) -> u8 {
        match self {
            Self::SyncStarted => 1,
            Self::SyncCompleted => 2,
            Self::SyncParameters => 3,
            Self::ConnectionParameters => 4,
            Self::SyncRequest => 5,
            Self::SyncRequestCompleted => 6,
        }
    }

    /// Looks up the variant for a wire tag.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::SyncStarted),
            2 => Some(Self::SyncCompleted),
            3 => Some(Self::SyncParameters),
            4 => Some(Self::ConnectionParameters),
            5 => Some(Self::SyncRequest),
            6 => Some(Self::SyncRequestCompleted),
            _ => None,
        }
    }

    /// Variant name as used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SyncStarted => "SyncStarted",
            Self::SyncCompleted => "SyncCompleted",
            Self::SyncParameters => "SyncParameters",
            Self::ConnectionParameters => "ConnectionParameters",
            Self::SyncRequest => "SyncRequest",
            Self::SyncRequestCompleted => "SyncRequestCompleted",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A concrete message type that can be pulled out of a [`Message`].
///
/// Used to receive a specific variant, e.g. `session.receive::<SyncStarted>(..)`.
pub trait Variant: Into<Message> + Sized {
    /// The variant this type corresponds to.
    const KIND: MessageKind;

    /// Unwraps `msg` if it is this variant, or hands it back unchanged.
    fn from_message(msg: Message) -> Result<Self, Message>;
}

/// Implements `From<$name> for Message` and [`Variant`] for a payload type.
macro_rules! variant {
    ($name:ident) => {
        impl From<$name> for Message {
            fn from(msg: $name) -> Self {
                Self::$name(msg)
            }
        }

        impl Variant for $name {
            const KIND: MessageKind = MessageKind::$name;

            fn from_message(msg: Message) -> Result<Self, Message> {
                match msg {
                    Message::$name(m) => Ok(m),
                    other => Err(other),
                }
            }
        }
    };
}

variant!(SyncStarted);
variant!(SyncCompleted);
variant!(SyncParameters);
variant!(ConnectionParameters);
variant!(SyncRequest);
variant!(SyncRequestCompleted);

/// A build sync began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStarted {
    /// Sync identifier.
    pub id: i32,
}

/// A build sync finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCompleted {
    /// Sync identifier, matching the [`SyncStarted`].
    pub id: i32,
    /// Wall-clock duration of the sync.
    pub duration_millis: i64,
}

/// Arguments the agent should use for the next sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncParameters {
    /// Build tool arguments, in order.
    pub gradle_args: Vec<String>,
    /// JVM arguments, in order.
    pub jvm_args: Vec<String>,
}

/// Location of the build tool installation the agent should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    /// Installation directory.
    pub installation_path: String,
}

impl ConnectionParameters {
    /// Creates parameters pointing at `path`.
    ///
    /// Non-UTF-8 path components are replaced, since the wire carries strings.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            installation_path: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    /// Installation directory as a path.
    pub fn installation(&self) -> &Path {
        Path::new(&self.installation_path)
    }
}

/// Driver → agent: perform a sync, or shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequest {
    /// Request identifier, echoed in the [`SyncRequestCompleted`].
    pub id: i32,
    /// What the agent should do.
    pub kind: SyncRequestType,
}

/// Agent → driver: a [`SyncRequest`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequestCompleted {
    /// Identifier of the request being answered.
    pub id: i32,
    /// Time the agent spent handling the request.
    pub duration_millis: i64,
    /// Outcome of the sync.
    pub result: SyncResult,
}

/// What a [`SyncRequest`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncRequestType {
    /// Run a sync.
    Sync,
    /// Stop serving requests.
    Exit,
}

/// Outcome reported in a [`SyncRequestCompleted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum SyncResult {
    /// The sync ran and succeeded.
    Succeeded,
    /// The sync ran and failed.
    Failed,
    /// No sync was run.
    Skipped,
}

/// An enum carried on the wire by its symbolic name.
pub trait Symbol: Sized + Copy + 'static {
    /// Enum name used in diagnostics.
    const KIND: &'static str;
    /// Every value, for name lookup.
    const VALUES: &'static [Self];

    /// Wire name of this value.
    fn as_str(self) -> &'static str;

    /// Parses a wire name.
    fn from_name(name: &str) -> Option<Self> {
        Self::VALUES.iter().copied().find(|v| v.as_str() == name)
    }
}

impl Symbol for SyncRequestType {
    const KIND: &'static str = "request type";
    const VALUES: &'static [Self] = &[Self::Sync, Self::Exit];

    fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "SYNC",
            Self::Exit => "EXIT",
        }
    }
}

impl Symbol for SyncResult {
    const KIND: &'static str = "sync result";
    const VALUES: &'static [Self] = &[Self::Succeeded, Self::Failed, Self::Skipped];

    fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for SyncRequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
