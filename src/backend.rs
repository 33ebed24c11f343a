use thiserror::Error;

use crate::dns_parser::{Builder, Packet, Question, Type};

/// Failure reported by a [`Backend`] for a single question
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("query type {0} is not supported")]
    Unsupported(Type),
    #[error("{0}")]
    Failed(String),
}

/// Operational state of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Degraded,
    Unavailable,
}

/// Decides what to answer
///
/// `query` is called once for every question of a request, with the whole
/// request at hand, and appends records to the response being built.
pub trait Backend: Send + Sync {
    fn query(
        &self,
        request: &Packet,
        question: &Question,
        builder: &mut Builder,
    ) -> Result<(), BackendError>;

    /// Sets the recursion available bit of every response
    fn recursion_available(&self) -> bool {
        false
    }

    fn status(&self) -> Status {
        Status::Ready
    }
}
