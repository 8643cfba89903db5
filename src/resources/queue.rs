//! Pending model loads.
//!
//! Loads are plain futures collected in a [`FuturesUnordered`]. The owner
//! polls the queue once per frame on its own thread; finished loads come out
//! in whatever order they completed and the rest stay queued.

use std::task::{Context, Poll};

use futures::{
    FutureExt, StreamExt,
    future::LocalBoxFuture,
    stream::FuturesUnordered,
    task::noop_waker_ref,
};

use crate::{config::AssetSpec, data_structures::model::LoadedAsset};

/// A finished load: what was asked for and what came back.
pub struct LoadOutcome {
    pub spec: AssetSpec,
    pub result: anyhow::Result<LoadedAsset>,
}

#[derive(Default)]
pub struct LoadQueue {
    pending: FuturesUnordered<LocalBoxFuture<'static, LoadOutcome>>,
}

impl LoadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a load. Nothing is polled until the next [`LoadQueue::drain_completed`].
    pub fn issue(
        &mut self,
        spec: AssetSpec,
        load: LocalBoxFuture<'static, anyhow::Result<LoadedAsset>>,
    ) {
        self.pending
            .push(load.map(move |result| LoadOutcome { spec, result }).boxed_local());
    }

    /// Collects every load that is finished by now without waiting for the others.
    pub fn drain_completed(&mut self) -> Vec<LoadOutcome> {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut completed = Vec::new();
        // Ready(None) means the queue ran empty, Pending that the rest is still in flight
        while let Poll::Ready(Some(outcome)) = self.pending.poll_next_unpin(&mut cx) {
            completed.push(outcome);
        }
        completed
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
