use std::fmt::Debug;

pub const ROOT_RANK: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunicatorKind {
    Mpi,
    Threads,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Max,
    Min,
}

impl ReduceOp {
    #[inline]
    pub fn identity(&self) -> f64 {
        match self {
            ReduceOp::Sum => 0.0,
            ReduceOp::Max => f64::NEG_INFINITY,
            ReduceOp::Min => f64::INFINITY,
        }
    }

    #[inline]
    pub fn combine(&self, acc: f64, x: f64) -> f64 {
        match self {
            ReduceOp::Sum => acc + x,
            ReduceOp::Max => acc.max(x),
            ReduceOp::Min => acc.min(x),
        }
    }
}

/// A group of cooperating participants.
///
/// Every collective below must be entered by all participants of the group, in the same
/// order. The value returned by a collective is identical on every participant.
pub trait Communicator: Debug {
    const KIND: CommunicatorKind;

    fn world_size(&self) -> usize;

    fn world_rank(&self) -> usize;

    #[inline(always)]
    fn is_root(&self) -> bool {
        self.world_rank() == ROOT_RANK
    }

    #[inline(always)]
    fn is_single_process(&self) -> bool {
        self.world_size() == 1
    }

    /// Block until every participant has reached the barrier
    fn barrier(&self);

    /// Combine one value per participant with `op`
    fn all_reduce_f64(&self, local: f64, op: ReduceOp) -> f64;

    /// Entry `r` of the result is the value contributed by rank `r`
    fn all_gather_u64(&self, local: u64) -> Vec<u64>;

    /// Sum of the values contributed by all lower ranks
    fn exclusive_scan_sum_u64(&self, local: u64) -> u64 {
        self.all_gather_u64(local)
            .iter()
            .take(self.world_rank())
            .sum()
    }
}
