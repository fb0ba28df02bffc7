//! Expert-panel debate orchestration for mineral prospecting analysis.
//!
//! This library coordinates several independent question-answering agents
//! (a panel of prospecting experts plus a distinguished moderator) through
//! successive rounds of automated critique until the moderator emits a
//! single structured conclusion:
//!
//! - `debate`: the round-based state machine driving broadcast fan-out,
//!   host evaluation, follow-up interrogation, and termination
//! - `extract`: lenient recovery of a machine-readable command from the
//!   moderator's free-text reply
//! - `transcript`: the append-only debate history replayed into every prompt
//! - `registry`: the agent roster and its conversation-session handles
//! - `transport`: the HTTP contract with the external completion service
//! - `report`: the structured conclusion, with geospatial fields for the
//!   map layer
//! - `events`: broadcast hand-off to presentation collaborators

pub mod config;
pub mod debate;
pub mod events;
pub mod extract;
pub mod registry;
pub mod report;
pub mod transcript;
pub mod transport;

pub use config::PanelConfig;
pub use debate::{
    DebateConfig, DebateError, DebateOutcome, DebatePhase, DebateSession, InterventionOutcome,
    PanelOrchestrator,
};
pub use events::{EventBus, PanelEvent, SharedEventBus};
pub use extract::{extract_command, FinishContent, HostCommand};
pub use registry::{AgentProfile, AgentRegistry, BootstrapResult};
pub use report::{AnomalyPoint, DrillSite, ReportPayload};
pub use transcript::{Transcript, TranscriptEntry};
pub use transport::{
    AgentTransport, Completion, CompletionRequest, HttpTransport, TransportError,
};
