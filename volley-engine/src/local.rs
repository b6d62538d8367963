//! Local scenario execution

use crate::error::EngineError;
use crate::executor::RequestExecutor;
use crate::generator::ScenarioGenerator;
use crate::limit::{LimitChecker, LimitDecision};
use crate::pool::ExecutorPool;
use crate::render::TemplateRenderer;
use async_trait::async_trait;
use tracing::debug;
use volley_core::{RequestScenario, RequestTemplate, ResponseInfo, Variables};
use volley_http::Transport;

/// Per-template execution state
struct TemplateState {
    renderer: TemplateRenderer,
    checker: LimitChecker,
    concurrency: usize,
    next_idx: u64,
    previous: Option<Vec<ResponseInfo>>,
}

/// Drives a scenario's templates in declared order on the local executor
/// pool.
///
/// Templates run strictly sequentially; only the requests of one batch run
/// in parallel. Within a template, each concurrency lane re-renders against
/// the captures of its own previous response. When a template finishes, the
/// final batch's captures fold into the scenario bindings and seed the
/// templates after it.
pub struct LocalGenerator {
    templates: Vec<RequestTemplate>,
    current: usize,
    worker_idx: usize,
    variables: Variables,
    pool: ExecutorPool,
    state: Option<TemplateState>,
}

impl LocalGenerator {
    pub fn new(scenario: &RequestScenario, transport: Transport) -> Self {
        Self {
            templates: scenario.requests.clone(),
            current: 0,
            worker_idx: scenario.worker_idx,
            variables: scenario.init.clone(),
            pool: ExecutorPool::new(RequestExecutor::new(transport)),
            state: None,
        }
    }

    fn enter_template(&self, template: &RequestTemplate) -> Result<TemplateState, EngineError> {
        let merged = template.clone().with_defaults();

        // Disjoint per-worker index ranges; unbounded templates all start at 0
        let base_idx = if merged.count > 0 {
            self.worker_idx as u64 * merged.count * merged.concurrency as u64
        } else {
            0
        };

        debug!(
            template = self.current,
            concurrency = merged.concurrency,
            count = merged.count,
            base_idx,
            "starting template"
        );

        Ok(TemplateState {
            renderer: TemplateRenderer::new(&merged)?,
            checker: LimitChecker::new(&merged),
            concurrency: merged.concurrency,
            next_idx: base_idx,
            previous: None,
        })
    }
}

#[async_trait]
impl ScenarioGenerator for LocalGenerator {
    async fn next_batch(&mut self) -> Result<Option<Vec<ResponseInfo>>, EngineError> {
        if self.current >= self.templates.len() {
            return Ok(None);
        }

        let mut state = match self.state.take() {
            Some(state) => state,
            None => self.enter_template(&self.templates[self.current])?,
        };

        self.pool.set_capacity(state.concurrency);

        // Each lane renders against the scenario bindings overlaid with the
        // captures of its own previous response
        let mut batch = Vec::with_capacity(state.concurrency);
        for lane in 0..state.concurrency {
            let mut variables = self.variables.clone();
            if let Some(previous) = &state.previous {
                if let Some(response) = previous.get(lane) {
                    variables.extend(response.variables.clone());
                }
            }

            let request = state.renderer.render(state.next_idx, &mut variables)?;
            state.next_idx += 1;
            batch.push(request);
        }

        let responses = self.pool.execute_batch(batch).await?;
        let decision = state.checker.check().await;

        match decision {
            LimitDecision::Continue => {
                state.previous = Some(responses.clone());
                self.state = Some(state);
            }
            LimitDecision::Stop => {
                // Template finished: fold the final captures into the
                // scenario bindings, in lane order, for the templates after
                for response in &responses {
                    self.variables.extend(response.variables.clone());
                }
                self.current += 1;
            }
        }

        Ok(Some(responses))
    }
}
