use std::fmt::Debug;

use mpi::{
    collective::SystemOperation,
    environment::Universe,
    topology::SimpleCommunicator,
    traits::{Communicator as _, CommunicatorCollectives},
};

use crate::{CommError, CommResult, Communicator, CommunicatorKind, ReduceOp};

/// One MPI process per participant.
///
/// The value owns the MPI environment: MPI is initialized by [`MPICommunicator::new`] and
/// finalized when the communicator is dropped, so it should live for the whole `main`.
pub struct MPICommunicator {
    // declared before `universe` so the world handle is released first
    world: SimpleCommunicator,
    universe: Universe,
    world_size: i32,
    world_rank: i32,
}

impl Debug for MPICommunicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MPICommunicator")
            .field("buffer_size", &self.universe.buffer_size())
            .field("world_size", &self.world_size)
            .field("world_rank", &self.world_rank)
            .finish()
    }
}

// Note: only compares the position in the group
impl PartialEq for MPICommunicator {
    fn eq(&self, other: &Self) -> bool {
        self.world_rank == other.world_rank && self.world_size == other.world_size
    }
}

impl MPICommunicator {
    /// Initialize MPI with the launcher's arguments and environment.
    ///
    /// mpi::initialize() returns None when MPI is already up in this process.
    pub fn new() -> CommResult<Self> {
        let universe = mpi::initialize().ok_or(CommError::AlreadyInitialized)?;
        let world = universe.world();
        let world_size = world.size();
        let world_rank = world.rank();
        log::debug!("MPI initialized: rank {} of {}", world_rank, world_size);

        Ok(Self {
            world,
            universe,
            world_size,
            world_rank,
        })
    }

    #[inline]
    fn system_op(op: ReduceOp) -> SystemOperation {
        match op {
            ReduceOp::Sum => SystemOperation::sum(),
            ReduceOp::Max => SystemOperation::max(),
            ReduceOp::Min => SystemOperation::min(),
        }
    }
}

impl Communicator for MPICommunicator {
    const KIND: CommunicatorKind = CommunicatorKind::Mpi;

    #[inline(always)]
    fn world_size(&self) -> usize {
        self.world_size as usize
    }

    #[inline(always)]
    fn world_rank(&self) -> usize {
        self.world_rank as usize
    }

    #[inline(always)]
    fn barrier(&self) {
        self.world.barrier();
    }

    #[inline]
    fn all_reduce_f64(&self, local: f64, op: ReduceOp) -> f64 {
        if self.is_single_process() {
            return local;
        }
        let mut global = op.identity();
        self.world.all_reduce_into(&local, &mut global, Self::system_op(op));
        global
    }

    #[inline]
    fn all_gather_u64(&self, local: u64) -> Vec<u64> {
        if self.is_single_process() {
            return vec![local];
        }
        let mut gathered = vec![0u64; self.world_size()];
        self.world.all_gather_into(&local, &mut gathered[..]);
        gathered
    }
}
