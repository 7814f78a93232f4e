//! Delivery loop between a [`TrackSource`] and the [`TrackPipeline`]

use crate::input::TrackSource;
use crate::pipeline::{CommandSink, TrackPipeline};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Counters for one consumer run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerSummary {
    /// Deliveries taken from the source
    pub received: u64,
    /// Reached the encoder
    pub delivered: u64,
    /// Malformed, discarded before any command
    pub dropped: u64,
    /// Encoder or encoding failures
    pub failed: u64,
}

/// Process deliveries one at a time until the source ends or `shutdown` is
/// cancelled. Every delivery is acknowledged, whatever its outcome.
///
/// A delivery already being processed when `shutdown` fires runs to
/// completion.
pub async fn run_consumer<T, S>(
    source: &mut T,
    pipeline: &TrackPipeline<S>,
    shutdown: CancellationToken,
) -> ConsumerSummary
where
    T: TrackSource + ?Sized,
    S: CommandSink,
{
    let mut summary = ConsumerSummary::default();
    info!(source = %source.name(), "Waiting for track events");

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Consumer shutting down");
                break;
            }
            next = source.next_delivery() => next,
        };

        let delivery = match next {
            Some(Ok(delivery)) => delivery,
            Some(Err(e)) if e.is_recoverable() => {
                warn!(source = %source.name(), error = %e, "Skipping unreadable delivery");
                summary.received += 1;
                summary.dropped += 1;
                continue;
            }
            Some(Err(e)) => {
                error!(source = %source.name(), error = %e, "Track source failed");
                break;
            }
            None => {
                info!(source = %source.name(), "Track source closed");
                break;
            }
        };

        summary.received += 1;

        match pipeline.process(&delivery.body).await {
            Ok(_) => summary.delivered += 1,
            Err(e) if e.is_dropped() => summary.dropped += 1,
            Err(_) => summary.failed += 1,
        }

        if let Err(e) = source.ack(delivery.tag).await {
            error!(tag = delivery.tag, error = %e, "Failed to acknowledge delivery");
        }
    }

    info!(
        received = summary.received,
        delivered = summary.delivered,
        dropped = summary.dropped,
        failed = summary.failed,
        "Consumer stopped"
    );
    summary
}
