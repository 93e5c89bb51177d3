use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommError {
    #[error("MPI has already been initialized in this process")]
    AlreadyInitialized,

    #[error("a participant group needs at least one participant")]
    EmptyWorld,

    #[error("participant {rank} failed or left early; the group was aborted")]
    GroupAborted { rank: usize },

    #[error("failed to build the participant thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type CommResult<T> = std::result::Result<T, CommError>;
