//! Polling decorator over a [`VaaSource`].
//!
//! Guardian signatures take a while to aggregate after the L2 transaction
//! lands, so a raw source often answers "not yet". This wrapper re-asks on
//! a fixed delay until the caller's timeout elapses, which is how the
//! `timeout = retries × delay` bound from the service config is actually
//! spent.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::traits::{ContextResult, MessageId, VaaSource};
use crate::vaa::Vaa;

pub struct PollingVaaSource<S> {
    inner: S,
    retry_delay: Duration,
}

impl<S> PollingVaaSource<S> {
    pub fn new(inner: S, retry_delay: Duration) -> Self {
        Self { inner, retry_delay }
    }
}

#[async_trait]
impl<S: VaaSource> VaaSource for PollingVaaSource<S> {
    async fn get_vaa(
        &self,
        id: &MessageId,
        discriminator: &str,
        timeout: Duration,
    ) -> ContextResult<Option<Vaa>> {
        let deadline = Instant::now() + timeout;
        let mut attempt = 0u32;
        let mut last_error = None;

        loop {
            attempt += 1;
            match self.inner.get_vaa(id, discriminator, self.retry_delay).await {
                Ok(Some(vaa)) => return Ok(Some(vaa)),
                Ok(None) => last_error = None,
                Err(e) => last_error = Some(e),
            }

            if Instant::now() + self.retry_delay > deadline {
                break;
            }
            debug!(message_id = %id, attempt, "VAA not available yet, retrying");
            tokio::time::sleep(self.retry_delay).await;
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}
