use std::fmt::Display;
use std::time::Duration;

use backoff::{retry_notify, Error, ExponentialBackoff};

use crate::constants::defaults;

/// Retry `fn_to_try` with exponential backoff until it succeeds, fails
/// permanently, or `max_elapsed` (default: the API retry window) runs out.
pub fn backoff_retry<F, T, E>(fn_to_try: F, max_elapsed: Option<Duration>) -> Result<T, E>
where
    F: FnMut() -> Result<T, Error<E>>,
    E: Display,
{
    let notify = |err: E, dur: Duration| {
        log::warn!(
            "Temporary error after {:.1}s: {}",
            dur.as_secs_f32(),
            err
        );
    };

    let policy = ExponentialBackoff {
        max_elapsed_time: Some(max_elapsed.unwrap_or(defaults::API_RETRY_WINDOW)),
        ..ExponentialBackoff::default()
    };

    retry_notify(policy, fn_to_try, notify).map_err(|e| match e {
        Error::Permanent(err) => err,
        Error::Transient { err, .. } => err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_error_is_not_retried() {
        let mut attempts = 0;
        let res: Result<(), String> = backoff_retry(
            || {
                attempts += 1;
                Err(Error::permanent("nope".to_string()))
            },
            None,
        );
        assert_eq!(res.unwrap_err(), "nope");
        assert_eq!(attempts, 1);
    }

    #[test]
    fn transient_error_is_retried_until_success() {
        let mut attempts = 0;
        let res: Result<u32, String> = backoff_retry(
            || {
                attempts += 1;
                if attempts < 3 {
                    Err(Error::transient("later".to_string()))
                } else {
                    Ok(attempts)
                }
            },
            Some(Duration::from_secs(10)),
        );
        assert_eq!(res.unwrap(), 3);
    }
}
