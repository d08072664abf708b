//! Asynchronous emote construction.
//!
//! Building an emote means fetching its texture (and maybe a model), so a
//! spawn request arrives as a set of futures. [`Loader`] resolves them off the
//! frame path and hands the finished emotes back through a channel; the frame
//! loop picks them up with [`Loader::collect`] and queues them.
//!
//! Native builds resolve the futures on a tokio runtime, WASM builds spawn
//! them on the browser's event loop. Either way the pipeline itself is only
//! touched from the frame thread.

use std::{future::Future, pin::Pin};

use anyhow::Result;
use futures::channel::mpsc;

/// A pending emote construction.
pub type LoadFuture<O> = Pin<Box<dyn Future<Output = Result<O>>>>;

/// Box a construction future.
pub fn load<O, F>(fut: F) -> LoadFuture<O>
where
    F: Future<Output = Result<O>> + 'static,
{
    Box::pin(fut)
}

pub struct Loader<O> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    sender: mpsc::UnboundedSender<Vec<O>>,
    receiver: mpsc::UnboundedReceiver<Vec<O>>,
    failed: usize,
}

impl<O: 'static> Loader<O> {
    pub fn new() -> Result<Self> {
        let (sender, receiver) = mpsc::unbounded();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            sender,
            receiver,
            failed: 0,
        })
    }

    /// Start constructing the emotes of one request.
    ///
    /// The emotes that load successfully come back together as one batch, in
    /// request order. Failures are logged and left out.
    pub fn load(&mut self, requests: Vec<LoadFuture<O>>) {
        if requests.is_empty() {
            return;
        }
        let sender = self.sender.clone();
        let fut = async move {
            let resolved = futures::future::join_all(requests).await;
            let requested = resolved.len();
            let loaded: Vec<O> = resolved
                .into_iter()
                .filter_map(|result| match result {
                    Ok(emote) => Some(emote),
                    Err(e) => {
                        log::warn!("could not load emote: {:#}", e);
                        None
                    }
                })
                .collect();
            let failed = requested - loaded.len();
            if sender.unbounded_send(loaded).is_err() {
                log::error!("emote loader was dropped before a batch arrived");
            }
            failed
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.failed += self.async_runtime.block_on(fut);
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                fut.await;
            });
        }
    }

    /// Take every batch that finished loading since the last call.
    pub fn collect(&mut self) -> Vec<Vec<O>> {
        let mut batches = Vec::new();
        while let Ok(Some(batch)) = self.receiver.try_next() {
            batches.push(batch);
        }
        batches
    }

    /// Loads that failed so far. Only tracked on native builds, where loads
    /// complete synchronously.
    pub fn failed(&self) -> usize {
        self.failed
    }
}
