//! Cache domain - contracts and value model for the compliant cache

mod clock;
mod envelope;
mod key;
mod store;
mod ttl;
mod value;

pub use clock::{Clock, ManualClock, SystemClock};
pub use envelope::{Envelope, ISSUER};
pub use key::{validate_key, KeyArg, RESERVED_CHARACTERS};
pub use store::Store;
pub use ttl::{normalize_ttl, Ttl};
pub use value::CacheValue;

#[cfg(test)]
pub use store::mock::MockStore;
