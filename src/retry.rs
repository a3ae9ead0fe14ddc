//! Retry budget accounting
//!
//! Every request carries a retry budget: the number of fetch attempts it may
//! still make. Budgets are clamped to a configured maximum before use, and each
//! attempt consumes one unit. Re-attempts are immediate; there is no delay
//! between attempts.
//!
//! # Example
//!
//! ```no_run
//! use artifact_fetcher::retry::{IsRetryable, fetch_with_retry};
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # impl std::fmt::Display for MyError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//! #         write!(f, "{:?}", self)
//! #     }
//! # }
//! #
//! # async fn example() {
//! let result = fetch_with_retry(3, || async { Ok::<_, MyError>(42) }).await;
//! assert_eq!(result.ok(), Some(42));
//! # }
//! ```

use crate::error::TransportError;
use std::future::Future;

/// Default upper bound applied to caller-supplied budgets
pub const MAX_RETRY_BUDGET: u32 = 10;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if another attempt could succeed
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for TransportError {
    fn is_retryable(&self) -> bool {
        // A malformed URI fails the same way on every attempt
        !matches!(self, TransportError::InvalidUri { .. })
    }
}

/// Clamp a requested budget to `max`.
pub fn clamp_budget(requested: u32, max: u32) -> u32 {
    requested.min(max)
}

/// All attempts failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted<E> {
    /// Number of attempts made
    pub attempts: u32,
    /// Error returned by the final attempt
    pub last_error: E,
}

/// Run `operation` until it succeeds, the budget runs out, or it fails with a
/// non-retryable error.
///
/// A budget of `n` allows at most `max(n, 1)` attempts: a request with an empty
/// budget is still attempted once.
pub async fn fetch_with_retry<F, Fut, T, E>(
    budget: u32,
    mut operation: F,
) -> Result<T, Exhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut remaining = budget;
    let mut attempts = 0;

    loop {
        attempts += 1;
        remaining = remaining.saturating_sub(1);

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::info!(attempts, "Fetch succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && remaining > 0 => {
                tracing::warn!(
                    error = %e,
                    attempt = attempts,
                    remaining,
                    "Fetch failed, trying again"
                );
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(error = %e, attempts, "Fetch failed, retry budget exhausted");
                } else {
                    tracing::error!(error = %e, attempts, "Fetch failed with non-retryable error");
                }
                return Err(Exhausted {
                    attempts,
                    last_error: e,
                });
            }
        }
    }
}
