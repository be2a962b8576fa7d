use gradcheck_core::StationId;
use gradcheck_services::ServiceError;
use thiserror::Error;

/// Errors returned to callers of the coordinator handle.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("No face captured yet")]
    NoFaceCaptured,

    #[error("Station {active} is active; this action belongs to station {expected}")]
    WrongStation {
        expected: StationId,
        active: StationId,
    },

    #[error("Coordinator is not running")]
    ChannelClosed,

    #[error(transparent)]
    Core(#[from] gradcheck_core::Error),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
