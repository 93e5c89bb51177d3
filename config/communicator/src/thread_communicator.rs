//! In-process participant group: every participant is a thread of a dedicated rayon pool.
//!
//! Assumptions
//! 1. There is exactly one thread per participant, all running concurrently.
//! 2. Each participant only writes its own slot in the shared hub.
//! 3. IMPORTANT!!! Collectives are entered by all participants in the same order, as with MPI.
//!
//! Under [`spawn_world`] a participant that panics, or returns while the others still wait in
//! a collective, aborts the group: every blocked participant unwinds out of its collective and
//! `spawn_world` returns [`CommError::GroupAborted`], the way an MPI abort ends every rank.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
};

use crate::{CommError, CommResult, Communicator, CommunicatorKind, ReduceOp};

/// Unwind payload of a participant pulled out of a collective by an aborted group
struct GroupAborted;

#[derive(Debug, Default)]
struct RendezvousState {
    arrived: usize,
    generation: u64,
    /// first participant that panicked
    failed: Option<usize>,
    /// first participant whose body returned
    left: Option<usize>,
}

impl RendezvousState {
    #[inline]
    fn is_aborted(&self) -> bool {
        self.failed.is_some() || self.left.is_some()
    }
}

/// Reusable barrier that releases its waiters when the group is aborted
#[derive(Debug, Default)]
struct Rendezvous {
    state: Mutex<RendezvousState>,
    released: Condvar,
}

impl Rendezvous {
    fn lock(&self) -> MutexGuard<'_, RendezvousState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until `world_size` participants arrived; false when the group was aborted
    fn wait(&self, world_size: usize) -> bool {
        let mut state = self.lock();
        if state.is_aborted() {
            return false;
        }

        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == world_size {
            state.arrived = 0;
            state.generation += 1;
            self.released.notify_all();
            return true;
        }

        // a participant gone for good means this round can never fill up
        while state.generation == generation {
            if state.is_aborted() {
                return false;
            }
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        true
    }

    fn fail(&self, rank: usize) {
        self.lock().failed.get_or_insert(rank);
        self.released.notify_all();
    }

    fn leave(&self, rank: usize) {
        self.lock().left.get_or_insert(rank);
        self.released.notify_all();
    }

    fn culprit(&self) -> Option<usize> {
        let state = self.lock();
        state.failed.or(state.left)
    }
}

#[derive(Debug)]
struct Hub {
    rendezvous: Rendezvous,
    slots: Mutex<Vec<u64>>,
}

#[derive(Debug, Clone)]
pub struct ThreadCommunicator {
    world_size: usize,
    world_rank: usize,
    hub: Arc<Hub>,
}

// Note: only compares the position in the group
impl PartialEq for ThreadCommunicator {
    fn eq(&self, other: &Self) -> bool {
        self.world_rank == other.world_rank && self.world_size == other.world_size
    }
}

impl ThreadCommunicator {
    /// Handles for all participants of a new group, indexed by rank
    pub fn world(world_size: usize) -> CommResult<Vec<Self>> {
        if world_size == 0 {
            return Err(CommError::EmptyWorld);
        }

        let hub = Arc::new(Hub {
            rendezvous: Rendezvous::default(),
            slots: Mutex::new(vec![0; world_size]),
        });
        Ok((0..world_size)
            .map(|world_rank| Self {
                world_size,
                world_rank,
                hub: hub.clone(),
            })
            .collect())
    }
}

impl Communicator for ThreadCommunicator {
    const KIND: CommunicatorKind = CommunicatorKind::Threads;

    #[inline(always)]
    fn world_size(&self) -> usize {
        self.world_size
    }

    #[inline(always)]
    fn world_rank(&self) -> usize {
        self.world_rank
    }

    #[inline]
    fn barrier(&self) {
        if !self.hub.rendezvous.wait(self.world_size) {
            panic::resume_unwind(Box::new(GroupAborted));
        }
    }

    fn all_reduce_f64(&self, local: f64, op: ReduceOp) -> f64 {
        // folding in rank order keeps the result bit-identical on every participant
        self.all_gather_u64(local.to_bits())
            .into_iter()
            .map(f64::from_bits)
            .fold(op.identity(), |acc, x| op.combine(acc, x))
    }

    fn all_gather_u64(&self, local: u64) -> Vec<u64> {
        if self.is_single_process() {
            return vec![local];
        }

        self.hub
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)[self.world_rank] = local;
        self.barrier();
        let gathered = self
            .hub
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        // nobody may overwrite a slot before everyone has read it
        self.barrier();
        gathered
    }
}

/// Run `f` once per participant, each on its own thread, and collect the results by rank.
///
/// A panic in any participant ends the whole group with [`CommError::GroupAborted`].
pub fn spawn_world<R, F>(world_size: usize, f: F) -> CommResult<Vec<R>>
where
    R: Send,
    F: Fn(ThreadCommunicator) -> R + Sync,
{
    let comms = ThreadCommunicator::world(world_size)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(world_size)
        .thread_name(|rank| format!("participant-{rank}"))
        .build()?;
    log::debug!("spawned {} participant threads", world_size);

    let rendezvous = &comms[0].hub.rendezvous;
    let results = pool.broadcast(|ctx| {
        let rank = ctx.index();
        match panic::catch_unwind(AssertUnwindSafe(|| f(comms[rank].clone()))) {
            Ok(result) => {
                rendezvous.leave(rank);
                Some(result)
            }
            Err(payload) => {
                if !payload.is::<GroupAborted>() {
                    log::error!("participant {} panicked, aborting the group", rank);
                    rendezvous.fail(rank);
                }
                None
            }
        }
    });

    match results.into_iter().collect::<Option<Vec<_>>>() {
        Some(results) => Ok(results),
        None => Err(CommError::GroupAborted {
            rank: rendezvous.culprit().unwrap_or_default(),
        }),
    }
}
