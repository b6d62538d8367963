//! Generator selection

use crate::distributed::DistributedGenerator;
use crate::error::EngineError;
use crate::local::LocalGenerator;
use async_trait::async_trait;
use volley_core::{RequestScenario, ResponseInfo};
use volley_http::Transport;

/// A source of response batches for one scenario run.
#[async_trait]
pub trait ScenarioGenerator: Send {
    /// Produce the next batch, or `None` once the scenario is exhausted.
    async fn next_batch(&mut self) -> Result<Option<Vec<ResponseInfo>>, EngineError>;
}

/// Pick the generator for a scenario: local execution when the bot list is
/// empty, fan-out to bots otherwise.
pub fn generator_for(
    scenario: &RequestScenario,
    transport: Transport,
) -> Box<dyn ScenarioGenerator> {
    if scenario.bots.is_empty() {
        Box::new(LocalGenerator::new(scenario, transport))
    } else {
        Box::new(DistributedGenerator::new(scenario, transport))
    }
}
