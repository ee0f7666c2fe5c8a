//! Per-kind watch loops.
//!
//! Each loop consumes a `kube_runtime::watcher` stream and feeds the kind's
//! [`ResourceEventAdapter`]. A full listing (`Init` .. `InitDone`) becomes a
//! single `on_replace`, so objects that vanished while the watch was down are
//! evicted. Periodic relists are done by restarting the watcher, which makes
//! it list again from scratch.

use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use cluster_metrics::{ClusterObject, ResourceEventAdapter};
use futures::{Stream, StreamExt};
use kube::{Api, Resource};
use kube_runtime::watcher::{self, Event};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::pin::pin;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why [`drive`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The cancellation token fired.
    Cancelled,
    /// The relist interval elapsed since the last full listing.
    RelistDue,
    /// The stream ended on its own.
    StreamEnded,
}

/// Feeds events from `stream` into `adapter` until cancellation, the relist
/// deadline, or the end of the stream.
///
/// The relist deadline is armed when a full listing completes. Stream errors
/// are logged and followed by a backoff sleep; the backoff resets on the next
/// successful event. Cancellation is checked before every event, so once it
/// fires no further cache mutations happen.
pub async fn drive<K, S>(
    stream: S,
    adapter: &mut ResourceEventAdapter,
    relist: Duration,
    cancel: &CancellationToken,
    backoff: &mut FibonacciBackoff,
) -> DriveOutcome
where
    S: Stream<Item = Result<Event<K>, watcher::Error>>,
    ClusterObject: From<K>,
{
    let mut stream = pin!(stream);
    let mut listing: Vec<ClusterObject> = Vec::new();
    let mut deadline: Option<Instant> = None;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return DriveOutcome::Cancelled,
            _ = relist_due(deadline) => return DriveOutcome::RelistDue,
            next = stream.next() => next,
        };

        match next {
            None => return DriveOutcome::StreamEnded,
            Some(Ok(event)) => {
                backoff.reset();
                match event {
                    Event::Init => listing.clear(),
                    Event::InitApply(obj) => listing.push(ClusterObject::from(obj)),
                    Event::InitDone => {
                        let objects = std::mem::take(&mut listing);
                        adapter.on_replace(&objects);
                        deadline = Some(Instant::now() + relist);
                    }
                    Event::Apply(obj) => adapter.on_update(&ClusterObject::from(obj)),
                    Event::Delete(obj) => adapter.on_delete(&ClusterObject::from(obj)),
                }
            }
            Some(Err(e)) => {
                let delay = backoff.next_backoff();
                warn!(
                    "Watch error for {}: {} (retrying in {:?})",
                    adapter.kind(),
                    e,
                    delay
                );
                if !sleep_or_cancel(delay, cancel).await {
                    return DriveOutcome::Cancelled;
                }
            }
        }
    }
}

/// Runs the watch loop for one kind until `cancel` fires.
pub async fn watch_kind<K>(
    api: Api<K>,
    mut adapter: ResourceEventAdapter,
    relist: Duration,
    cancel: CancellationToken,
) -> Result<(), ControllerError>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
    ClusterObject: From<K>,
{
    let kind = adapter.kind();
    info!("Starting {} watcher (relist every {:?})", kind, relist);

    let mut backoff = FibonacciBackoff::default();
    loop {
        let stream = watcher::watcher(api.clone(), watcher::Config::default());
        match drive(stream, &mut adapter, relist, &cancel, &mut backoff).await {
            DriveOutcome::Cancelled => break,
            DriveOutcome::RelistDue => debug!("Relisting {}", kind),
            DriveOutcome::StreamEnded => {
                let delay = backoff.next_backoff();
                warn!("{} watch stream ended, restarting in {:?}", kind, delay);
                if !sleep_or_cancel(delay, &cancel).await {
                    break;
                }
            }
        }
    }

    info!("Stopped {} watcher", kind);
    Ok(())
}

async fn relist_due(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Returns `false` if cancelled before `delay` elapsed.
async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
