//! Conversation exchange model
//!
//! Transcript messages, the structured reply contract and cancellable
//! fragment streams.

pub mod message;
pub mod reply;
pub mod stream;

pub use message::{ChatMessage, Role, TRANSPORT_APOLOGY};
pub use reply::{
    format_confidence, parse_reply, AgentResult, AgentStatus, Artifact, ArtifactKind, ModelReply,
    PlanStep, ResponseMetadata, NO_RESPONSE_TEXT,
};
pub use stream::{FragmentStream, StreamOutcome, StreamStatus};
