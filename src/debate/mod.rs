//! Round-based debate coordination: state machine, prompts, orchestrator.

pub mod orchestrator;
pub mod prompts;
pub mod state;

pub use orchestrator::{
    DebateConfig, DebateError, DebateOutcome, InterventionOutcome, PanelOrchestrator,
};
pub use state::{DebatePhase, DebateSession, PhaseTransition, TransitionError};
