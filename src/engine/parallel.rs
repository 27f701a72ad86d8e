// src/engine/parallel.rs
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error};

/// Runs independent jobs with a fixed ceiling on how many are in flight
#[derive(Debug, Clone)]
pub struct BoundedPool {
    max_concurrent: usize,
    semaphore: Arc<Semaphore>,
}

impl BoundedPool {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            max_concurrent,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run `job` over every input and collect the outputs in input order.
    /// A job that panics is logged and contributes no output.
    pub async fn run<I, F, Fut, T>(&self, inputs: I, job: F) -> Vec<T>
    where
        I: IntoIterator,
        I::Item: Send + 'static,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                let semaphore = self.semaphore.clone();
                let future = job(input);
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok()?;
                    Some(future.await)
                })
            })
            .collect();

        debug!("Running {} jobs with max concurrency {}", handles.len(), self.max_concurrent);

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(output)) => results.push(output),
                Ok(None) => error!("Worker pool closed before job could start"),
                Err(e) => error!("Job execution failed: {}", e),
            }
        }
        results
    }
}
