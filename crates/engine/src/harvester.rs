//! Periodic harvest thread
//!
//! A [`Harvester`] owns one named background thread that calls
//! [`Sampler::harvest_and_send`] every interval. Shutdown wakes the thread
//! immediately, runs a last harvest so nothing recorded before shutdown is
//! lost, and joins it. Dropping the harvester does the same.

use crate::error::Result;
use crate::sampler::Sampler;
use crate::transport::{HarvestOutcome, Transport};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace};

const THREAD_NAME: &str = "slowsql-harvester";

#[derive(Default)]
struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Background harvest loop
pub struct Harvester {
    signal: Arc<Signal>,
    worker: Option<JoinHandle<()>>,
}

impl Harvester {
    /// Start harvesting `sampler` into `transport` every `interval`
    pub fn spawn(sampler: Arc<Sampler>, transport: Arc<dyn Transport>, interval: Duration) -> Result<Self> {
        let signal = Arc::new(Signal::default());
        let worker_signal = Arc::clone(&signal);

        let worker = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || Self::run(&sampler, transport.as_ref(), &worker_signal, interval))?;

        info!(?interval, "Harvester started");
        Ok(Self {
            signal,
            worker: Some(worker),
        })
    }

    /// Start harvesting with the interval from the sampler's configuration
    pub fn spawn_with_config(sampler: Arc<Sampler>, transport: Arc<dyn Transport>) -> Result<Self> {
        let interval = sampler.config().harvest_interval();
        Self::spawn(sampler, transport, interval)
    }

    fn run(sampler: &Sampler, transport: &dyn Transport, signal: &Signal, interval: Duration) {
        loop {
            let stopped = {
                let mut stopped = signal.stopped.lock();
                if !*stopped {
                    let _ = signal.wake.wait_for(&mut stopped, interval);
                }
                *stopped
            };

            let outcome = sampler.harvest_and_send(transport);
            trace!(?outcome, "Harvest cycle");

            if stopped {
                if let HarvestOutcome::Requeued(n) = outcome {
                    debug!(traces = n, "Final harvest failed, traces stay in store");
                }
                break;
            }
        }
    }

    /// Whether the background thread is still running
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop the thread after a final harvest and wait for it
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();
        if worker.join().is_err() {
            tracing::error!("Harvester thread panicked");
        }
        info!("Harvester stopped");
    }
}

impl Drop for Harvester {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("running", &self.is_running())
            .finish()
    }
}
