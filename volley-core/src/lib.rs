//! Scenario data model and capture resolution for volley
//!
//! The types in this crate form the wire contract of the tool: the scenario
//! document an operator (or a remote orchestrator) submits, the concrete
//! requests the engine expands it into, and the response records it emits as
//! NDJSON. The capture module resolves dot-path expressions against decoded
//! response bodies.

pub mod capture;
pub mod record;
pub mod scenario;

// Re-export main types
pub use capture::{resolve_path, CaptureError};
pub use record::{RequestInfo, ResponseInfo, Variables};
pub use scenario::{
    AuthScheme, BotInfo, CaptureSource, RequestScenario, RequestTemplate, ResponseCapture,
    ScenarioOptions,
};
