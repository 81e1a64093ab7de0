//! Domain layer - Cache contracts, value model and errors

pub mod cache;
pub mod error;

pub use cache::{CacheValue, Clock, Envelope, KeyArg, ManualClock, Store, SystemClock, Ttl};
pub use error::CacheError;
