//! Participant-group context shared by every distributed object.
//!
//! A communicator is created once at process start and handed explicitly to
//! whatever needs the group (maps, reductions). Two backends exist: one MPI
//! process per participant, or one thread per participant inside a single
//! process.

mod common;

mod errors;
pub use errors::{CommError, CommResult};

mod traits;
pub use traits::{Communicator, CommunicatorKind, ReduceOp, ROOT_RANK};

mod mpi_communicator;
pub use mpi_communicator::MPICommunicator;

mod thread_communicator;
pub use thread_communicator::{spawn_world, ThreadCommunicator};
