mod backoff_retry;
mod load_dotenv;
mod rate_limit;
mod time;

pub use backoff_retry::backoff_retry;
pub use load_dotenv::load_dotenv;
pub use rate_limit::{RateLimitExceeded, RateLimiter};
pub use time::{now_iso, parse_device_clock};

pub fn rand_hex(bytes: usize) -> String {
    let rand: Vec<u8> = (0..bytes).map(|_| rand::random::<u8>()).collect();
    hex::encode(rand)
}
