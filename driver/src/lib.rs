//! The driver routine: build a map with five entries per participant, fill a vector with 42,
//! print its norm and local entries, overwrite the local entries with their index, and let
//! the root report success.

use std::{io::Write, sync::Arc};

use communicator::{CommError, Communicator};
use linalg::{GlobalOrdinal, LinalgError, Map, Vector};
use thiserror::Error;

pub const ENTRIES_PER_PARTICIPANT: u64 = 5;
pub const FILL_VALUE: f64 = 42.0;
pub const INDEX_BASE: GlobalOrdinal = 0;
pub const PASS_SENTINEL: &str = "End Result: TEST PASSED";

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("communicator error: {0}")]
    Comm(#[from] CommError),

    #[error("linear algebra error: {0}")]
    Linalg(#[from] LinalgError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// What one participant saw during a run
#[derive(Debug, Clone, PartialEq)]
pub struct DriverReport {
    pub world_rank: usize,
    pub world_size: usize,
    pub local_length: usize,
    pub global_length: u64,
    pub norm: f64,
    /// local entries printed by the read loop
    pub observed: Vec<f64>,
    /// local entries after the write loop
    pub written: Vec<f64>,
}

/// Run the driver on one participant, writing its console output to `out`.
///
/// Every participant of `comm` must call this; the norm is a collective.
pub fn run<C: Communicator, W: Write>(comm: Arc<C>, out: &mut W) -> DriverResult<DriverReport> {
    let world_rank = comm.world_rank();
    let world_size = comm.world_size();
    log::debug!("rank {} of {} on {:?} backend", world_rank, world_size, C::KIND);

    let num_global = world_size as u64 * ENTRIES_PER_PARTICIPANT;
    let map = Arc::new(Map::new(num_global, INDEX_BASE, comm.clone())?);
    let mut x = Vector::new(map);
    log::debug!("rank {}: {}", world_rank, x.map());

    x.put_scalar(FILL_VALUE);

    // printed by every participant, not only the root
    let norm = x.norm2();
    writeln!(out, "Norm of x = {}", norm)?;

    let observed = x.read_local();
    for value in observed {
        writeln!(out, "{}", value)?;
    }
    let observed = observed.to_vec();

    let mut local = x.write_local();
    local
        .iter_mut()
        .enumerate()
        .for_each(|(k, value)| *value = k as f64);
    local.commit();
    let written = x.read_local().to_vec();
    log::trace!("rank {}: {}", world_rank, x);

    if comm.is_root() {
        writeln!(out, "{}", PASS_SENTINEL)?;
    }
    log::info!("rank {} of {} finished", world_rank, world_size);

    Ok(DriverReport {
        world_rank,
        world_size,
        local_length: x.local_length(),
        global_length: x.global_length(),
        norm,
        observed,
        written,
    })
}
