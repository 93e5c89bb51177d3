//! Distributed linear algebra over a [`communicator::Communicator`]: index partitioning
//! ([`Map`]), a host/device mirrored buffer ([`DualView`]) and a distributed vector
//! ([`Vector`]).

/// Global index of an entry
pub type GlobalOrdinal = i64;

mod errors;
pub use errors::{LinalgError, LinalgResult};

mod map;
pub use map::Map;

mod dual_view;
pub use dual_view::{DualView, HostWrite, SyncState};

mod vector;
pub use vector::Vector;
