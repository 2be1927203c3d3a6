//! Out-of-band rating coherency
//!
//! Ratings bypass the TTL model: whenever a review is submitted, the new
//! aggregate is pushed into every cached copy of the product immediately.

use crate::models::RatingUpdate;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Port through which review flows push fresh rating aggregates
pub trait RatingSink: Send + Sync {
    /// Patch every cached copy of the product; returns how many copies changed
    fn apply_rating_update(&self, update: &RatingUpdate) -> usize;
}

/// Drain a channel of rating updates into a sink until all senders drop
///
/// For submission flows that run on other tasks and should not hold the
/// sink directly.
pub fn spawn_rating_listener<S>(sink: Arc<S>, mut rx: mpsc::Receiver<RatingUpdate>) -> JoinHandle<usize>
where
    S: RatingSink + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut applied = 0;
        while let Some(update) = rx.recv().await {
            let copies = sink.apply_rating_update(&update);
            tracing::debug!(product_id = %update.product_id, copies, "Rating update received");
            applied += 1;
        }
        applied
    })
}
