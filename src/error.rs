use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the simulation core and its output collaborators.
///
/// Configuration problems are detected before the first Monte Carlo step.
/// `CapacityExceeded` is only ever seen by direct callers of
/// [`crate::ParticleSystem::insert_trial`]; the engine turns it into a
/// rejected insertion.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run setup (move mixture, cutoff, particle count, box, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Insertion attempted while every particle slot is occupied.
    #[error("capacity exceeded: all {capacity} particle slots are occupied")]
    CapacityExceeded { capacity: usize },

    /// Propagated I/O errors from the trajectory and statistics writers.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}
