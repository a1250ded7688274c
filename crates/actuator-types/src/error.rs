use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("Configuration error in actuator '{actuator}': {message}")]
    Config { actuator: String, message: String },

    #[error("Duplicate actuator label '{0}'")]
    DuplicateActuator(String),

    #[error("Actuator '{actuator}' requests unknown type '{identifier}'")]
    UnknownActuatorType { actuator: String, identifier: String },

    #[error("Actuator type '{0}' is already registered")]
    DuplicateActuatorType(String),

    #[error("Actuator '{actuator}' lies outside the computational domain: no rank owns any part of its bounding box")]
    OutsideDomain { actuator: String },

    #[error("Degenerate geometry in actuator '{actuator}': {message}")]
    DegenerateGeometry { actuator: String, message: String },

    #[error("Polar '{polar}': {message}")]
    Polar { polar: String, message: String },

    #[error("Actuator '{actuator}' references missing polar '{polar}'")]
    MissingPolar { actuator: String, polar: String },

    #[error("Integrated loads of actuator '{actuator}' requested on rank {rank}, root is rank {root}")]
    NotRoot {
        actuator: String,
        rank: usize,
        root: usize,
    },

    #[error("Integrated loads of actuator '{0}' are not available before the first reduction")]
    LoadsNotReduced(String),

    #[error("Stale ownership for actuator '{actuator}': resolved at partition epoch {found}, mesh is at epoch {expected}")]
    StaleOwnership {
        actuator: String,
        expected: u64,
        found: u64,
    },

    #[error("Invalid mesh partition: {0}")]
    Partition(String),

    #[error("Collective operation failed: {0}")]
    Collective(String),

    #[error("Non-finite value: {0}")]
    NonFinite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ActuatorError {
    pub fn config(actuator: &str, message: impl Into<String>) -> Self {
        ActuatorError::Config {
            actuator: actuator.to_string(),
            message: message.into(),
        }
    }

    pub fn degenerate(actuator: &str, message: impl Into<String>) -> Self {
        ActuatorError::DegenerateGeometry {
            actuator: actuator.to_string(),
            message: message.into(),
        }
    }
}

pub type ActuatorResult<T> = Result<T, ActuatorError>;
