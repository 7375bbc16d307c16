use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::debug;

/// Delays applied before each attempt of a network operation.
pub const DEFAULT_RETRY_DELAYS_SECS: [u64; 3] = [0, 2, 5];

/// Run `operation` once per entry of `retry_delays_secs`, sleeping for that
/// entry before the attempt, and return the first success or the last error.
///
/// An empty delay list means the operation is never attempted and `None`
/// is returned.
pub async fn retry_with_delays<T, E, Op, Fut>(
    operation_name: &'static str,
    retry_delays_secs: &[u64],
    mut operation: Op,
) -> Option<Result<T, E>>
where
    E: Display,
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_err = None;

    for (attempt, &delay_secs) in retry_delays_secs.iter().enumerate() {
        if delay_secs > 0 {
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        }

        match operation().await {
            Ok(value) => return Some(Ok(value)),
            Err(error) => {
                debug!(
                    "{} attempt {} failed: {}",
                    operation_name,
                    attempt + 1,
                    error
                );
                last_err = Some(error);
            }
        }
    }

    last_err.map(Err)
}
