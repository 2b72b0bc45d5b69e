//! Cancellable fragment streams for streamed replies

use crate::error::Result;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// How a streamed reply ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Completed,
    Cancelled,
    Failed(String),
}

/// Accumulated text plus how the stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub text: String,
    pub status: StreamStatus,
}

/// A sequence of text fragments that can be abandoned mid-flight
pub struct FragmentStream {
    inner: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
    cancel: CancellationToken,
}

impl FragmentStream {
    pub fn new<S>(inner: S, cancel: CancellationToken) -> Self
    where
        S: Stream<Item = Result<String>> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
            cancel,
        }
    }

    /// Concatenate fragments in arrival order
    ///
    /// `on_fragment` sees the growing text after every fragment. Once the
    /// token is cancelled no further fragment is observed.
    ///
    /// # Examples
    ///
    /// ```
    /// use arduino_mentor::exchange::{FragmentStream, StreamStatus};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # tokio_test_block(async {
    /// let fragments = futures::stream::iter(vec![Ok("Hel".to_string()), Ok("lo".to_string())]);
    /// let outcome = FragmentStream::new(fragments, CancellationToken::new())
    ///     .accumulate(|_| {})
    ///     .await;
    /// assert_eq!(outcome.text, "Hello");
    /// assert_eq!(outcome.status, StreamStatus::Completed);
    /// # });
    /// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
    /// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
    /// # }
    /// ```
    pub async fn accumulate<F>(mut self, mut on_fragment: F) -> StreamOutcome
    where
        F: FnMut(&str),
    {
        let mut text = String::new();
        loop {
            if self.cancel.is_cancelled() {
                return StreamOutcome {
                    text,
                    status: StreamStatus::Cancelled,
                };
            }

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Stream cancelled after {} chars", text.len());
                    return StreamOutcome { text, status: StreamStatus::Cancelled };
                }
                next = self.inner.next() => next,
            };

            match next {
                Some(Ok(fragment)) => {
                    text.push_str(&fragment);
                    on_fragment(&text);
                }
                Some(Err(e)) => {
                    tracing::warn!("Stream failed after {} chars: {}", text.len(), e);
                    return StreamOutcome {
                        text,
                        status: StreamStatus::Failed(e.to_string()),
                    };
                }
                None => {
                    return StreamOutcome {
                        text,
                        status: StreamStatus::Completed,
                    }
                }
            }
        }
    }
}
