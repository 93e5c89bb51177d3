use thiserror::Error;

use crate::GlobalOrdinal;

#[derive(Debug, Error, PartialEq)]
pub enum LinalgError {
    #[error("index base {index_base} plus {num_global} elements overflows the global ordinal type")]
    GlobalIndexOverflow { index_base: GlobalOrdinal, num_global: u64 },

    #[error("global element count {supplied} disagrees with the sum of local counts {computed}")]
    GlobalCountMismatch { supplied: u64, computed: u64 },

    #[error("local index {index} out of range for local length {len}")]
    LocalIndexOutOfRange { index: usize, len: usize },

    #[error("global index {0} is not owned by this participant")]
    GlobalIndexNotOwned(GlobalOrdinal),

    #[error("vectors are distributed over incompatible maps")]
    IncompatibleMaps,

    #[error("concurrent modification: {0} side is already marked modified")]
    ConcurrentModification(&'static str),
}

pub type LinalgResult<T> = std::result::Result<T, LinalgError>;
