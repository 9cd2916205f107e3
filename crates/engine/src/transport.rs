//! Outbound delivery seam

use crate::error::TransportError;
use slowsql_wire::WireTrace;

/// Delivers a harvested batch to the collector
///
/// A failed `send` is not retried by the transport: the sampler merges the
/// batch back into its store and it goes out with the next harvest.
pub trait Transport: Send + Sync {
    /// Send one batch of wire tuples
    fn send(&self, batch: &[WireTrace]) -> Result<(), TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&[WireTrace]) -> Result<(), TransportError> + Send + Sync,
{
    fn send(&self, batch: &[WireTrace]) -> Result<(), TransportError> {
        self(batch)
    }
}

/// What a harvest cycle did with the store's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// Nothing was pending
    Empty,
    /// This many traces were delivered
    Sent(usize),
    /// Delivery failed; this many traces were merged back
    Requeued(usize),
}
