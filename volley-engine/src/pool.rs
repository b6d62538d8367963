//! Bounded pool of request workers

use crate::error::EngineError;
use crate::executor::RequestExecutor;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use volley_core::{RequestInfo, ResponseInfo};

/// Depth of the job and result queues; submission backpressure kicks in past
/// this many in-flight requests.
const QUEUE_DEPTH: usize = 1024;

type Job = (usize, RequestInfo);
type JobResult = (usize, Result<ResponseInfo, EngineError>);

/// A bounded pool of long-lived workers consuming a shared request queue.
///
/// Capacity only ever grows; workers are recycled across templates. Batch
/// ordering is preserved by tagging each job with its submission slot and
/// reassembling on receive.
pub struct ExecutorPool {
    executor: RequestExecutor,
    job_tx: mpsc::Sender<Job>,
    job_rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    result_tx: mpsc::Sender<JobResult>,
    result_rx: mpsc::Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
}

impl ExecutorPool {
    pub fn new(executor: RequestExecutor) -> Self {
        let (job_tx, job_rx) = mpsc::channel(QUEUE_DEPTH);
        let (result_tx, result_rx) = mpsc::channel(QUEUE_DEPTH);

        Self {
            executor,
            job_tx,
            job_rx: Arc::new(Mutex::new(job_rx)),
            result_tx,
            result_rx,
            workers: Vec::new(),
        }
    }

    /// Current number of workers
    pub fn capacity(&self) -> usize {
        self.workers.len()
    }

    /// Grow the pool to at least `capacity` workers; never shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        while self.workers.len() < capacity {
            let worker = self.workers.len();
            let executor = self.executor.clone();
            let job_rx = Arc::clone(&self.job_rx);
            let result_tx = self.result_tx.clone();

            debug!(worker, "spawning pool worker");
            self.workers.push(tokio::spawn(async move {
                loop {
                    // Hold the receiver lock only while claiming a job
                    let job = {
                        let mut rx = job_rx.lock().await;
                        rx.recv().await
                    };
                    let Some((slot, request)) = job else { break };

                    trace!(worker, slot, idx = request.idx, "executing request");
                    let result = executor.execute(&request).await;
                    if result_tx.send((slot, result)).await.is_err() {
                        break;
                    }
                }
            }));
        }
    }

    /// Submit a batch and wait for every request to complete.
    ///
    /// Responses come back in submission order. The first fatal error is
    /// returned once the whole batch has drained.
    pub async fn execute_batch(
        &mut self,
        requests: Vec<RequestInfo>,
    ) -> Result<Vec<ResponseInfo>, EngineError> {
        let expected = requests.len();

        // Feed jobs from a task so a deep batch cannot deadlock the queues
        let job_tx = self.job_tx.clone();
        let feeder = tokio::spawn(async move {
            for (slot, request) in requests.into_iter().enumerate() {
                if job_tx.send((slot, request)).await.is_err() {
                    break;
                }
            }
        });

        let mut slots: Vec<Option<ResponseInfo>> = vec![None; expected];
        let mut first_error = None;
        for _ in 0..expected {
            let Some((slot, result)) = self.result_rx.recv().await else {
                return Err(EngineError::Pool("result channel closed".to_string()));
            };
            match result {
                Ok(response) => slots[slot] = Some(response),
                Err(err) if first_error.is_none() => first_error = Some(err),
                Err(err) => debug!(slot, error = %err, "additional batch failure"),
            }
        }
        let _ = feeder.await;

        if let Some(err) = first_error {
            return Err(err);
        }

        let mut responses = Vec::with_capacity(expected);
        for (slot, response) in slots.into_iter().enumerate() {
            responses.push(
                response
                    .ok_or_else(|| EngineError::Pool(format!("no response for slot {}", slot)))?,
            );
        }
        Ok(responses)
    }
}

impl Drop for ExecutorPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}
