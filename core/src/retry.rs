//! Transient-fault retry.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use log::warn;

use crate::{Error, Result};

/// Decides whether a failed attempt is worth another try.
pub trait RetryClassifier: Debug + Send + Sync + 'static {
    /// Returns `true` if the error is transient.
    fn is_transient(&self, err: &Error) -> bool;
}

/// The default classifier: transport failures and 5xx responses are transient.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRetryClassifier;

impl RetryClassifier for DefaultRetryClassifier {
    fn is_transient(&self, err: &Error) -> bool {
        err.is_temporary()
    }
}

/// Delay between two attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Wait the same duration before every retry.
    Fixed(Duration),
    /// Wait `initial` before the first retry and `step` more before each following one.
    Incremental {
        /// Delay before the first retry.
        initial: Duration,
        /// Extra delay added for every further retry.
        step: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay(&self, attempt: usize) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Incremental { initial, step } => {
                let n = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                initial.saturating_add(step.saturating_mul(n))
            }
        }
    }
}

/// RetryPolicy runs an attempt function up to `max_attempts` times.
///
/// - Fatal errors are returned on first occurrence and never consume a retry.
/// - Once the last attempt fails transiently, its error is returned unchanged.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff: Backoff,
    classifier: Arc<dyn RetryClassifier>,
}

impl Default for RetryPolicy {
    /// Three attempts with an incremental delay of 1s, 2s.
    fn default() -> Self {
        Self::new(3).with_backoff(Backoff::Incremental {
            initial: Duration::from_secs(1),
            step: Duration::from_secs(1),
        })
    }
}

impl RetryPolicy {
    /// Create a policy with given attempt ceiling and a fixed 1s delay.
    ///
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Fixed(Duration::from_secs(1)),
            classifier: Arc::new(DefaultRetryClassifier),
        }
    }

    /// A policy that tries exactly once.
    pub fn disabled() -> Self {
        Self::new(1)
    }

    /// Set the delay between attempts.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the transient fault classifier.
    pub fn with_classifier(mut self, classifier: impl RetryClassifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Get the attempt ceiling.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Run `f` until it succeeds, fails fatally, or the ceiling is reached.
    ///
    /// `f` receives the 1-based attempt number and is invoked once per attempt,
    /// so everything it builds (headers, signature) is fresh for every try.
    pub async fn retry<T, F, Fut>(&self, mut f: F) -> Result<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match f(attempt).await {
                Ok(v) => return Ok(v),
                Err(err) => err,
            };

            if !self.classifier.is_transient(&err) {
                debug!("attempt {attempt} failed with fatal error: {err}");
                return Err(err);
            }
            if attempt >= self.max_attempts {
                warn!("attempt {attempt} failed, retries exhausted: {err}");
                return Err(err);
            }

            let delay = self.backoff.delay(attempt);
            warn!(
                "attempt {attempt}/{} failed with transient error, retry in {delay:?}: {err}",
                self.max_attempts
            );
            tokio::time::sleep(delay).await;
        }
    }
}
