//! Scenario execution engine for volley
//!
//! The engine expands each request template into a stream of concrete
//! requests, chains captured values from one template into the next, shapes
//! the emission rate (count, deadline, rate cap, jitter), dispatches requests
//! through a pooled executor, and — in distributed mode — fans a scenario out
//! to bot nodes and multiplexes their NDJSON streams back into one ordered
//! run.

pub mod distributed;
pub mod error;
pub mod executor;
pub mod generator;
pub mod limit;
pub mod local;
pub mod orchestrator;
pub mod pool;
pub mod render;
pub mod response;

// Re-export main types
pub use error::EngineError;
pub use executor::RequestExecutor;
pub use generator::{generator_for, ScenarioGenerator};
pub use orchestrator::{execute_scenario, execute_scenario_with};
pub use pool::ExecutorPool;
pub use render::TemplateRenderer;
