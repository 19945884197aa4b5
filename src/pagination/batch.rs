//! Wave-based batch runner
//!
//! Runs an ordered list of fetch units in waves of at most `max_concurrency`
//! concurrent requests. A wave must fully complete before the next starts.
//! Results land in positional slots, so output order never depends on
//! completion order.

use super::types::{FinishSignal, Reducer};
use crate::error::{Error, Result};
use crate::http::Fetch;
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Executes fetch units wave by wave and reduces their results
pub struct BatchRunner<D> {
    max_concurrency: usize,
    reducer: Reducer<D>,
    finish: Option<FinishSignal<D>>,
}

impl<D: Send + 'static> BatchRunner<D> {
    /// Create a runner. A concurrency of 0 runs one unit per wave.
    pub fn new(max_concurrency: usize, reducer: Reducer<D>) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            reducer,
            finish: None,
        }
    }

    /// Stop after the wave in which any result satisfies `finish`
    #[must_use]
    pub fn with_finish_signal(mut self, finish: FinishSignal<D>) -> Self {
        self.finish = Some(finish);
        self
    }

    /// Units per wave
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run all waves and return the positional slots.
    ///
    /// Slots of units that never ran (early stop) stay `None`. The first
    /// failure in a wave aborts the batch; units still in flight in that
    /// wave are dropped.
    pub async fn collect<F>(&self, units: &[F], cancel: &CancellationToken) -> Result<Vec<Option<D>>>
    where
        F: Fetch<D>,
    {
        let total = units.len();
        let mut slots: Vec<Option<D>> = std::iter::repeat_with(|| None).take(total).collect();

        for (wave, group) in units.chunks(self.max_concurrency).enumerate() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let start = wave * self.max_concurrency;
            let end = start + group.len();
            info!(
                "Fetching {}..{} of {} from {}",
                start,
                end,
                total,
                group[0].describe()
            );

            let results = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                results = try_join_all(group.iter().map(|unit| unit.fetch(cancel))) => results?,
            };

            let finished = self
                .finish
                .as_ref()
                .is_some_and(|finish| results.iter().any(|data| finish(data)));

            for (slot, data) in slots[start..end].iter_mut().zip(results) {
                *slot = Some(data);
            }

            if finished {
                debug!("Finish signal after {} of {} units", end, total);
                break;
            }
        }

        Ok(slots)
    }

    /// Run all waves and reduce the slots into one result
    pub async fn run<F>(&self, units: &[F], cancel: &CancellationToken) -> Result<D>
    where
        F: Fetch<D>,
    {
        let slots = self.collect(units, cancel).await?;
        (self.reducer)(slots)
    }
}

impl<D> std::fmt::Debug for BatchRunner<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("max_concurrency", &self.max_concurrency)
            .field("finish", &self.finish.is_some())
            .finish_non_exhaustive()
    }
}
