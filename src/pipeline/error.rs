//! Process-specific error types.
//!
//! These cover lifecycle misuse and declaration mistakes, which are defects
//! in the process or in whoever assembles the graph. Data faults are not
//! errors: they travel as [`DatumStatus`](crate::pipeline::DatumStatus)
//! values.

use crate::error::FlowError;
use crate::pipeline::datum::DatumStatus;
use crate::pipeline::port::{PortDirection, PortType};
use thiserror::Error;

/// Errors that can occur within the process core.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Process '{name}' was already configured")]
    AlreadyConfigured { name: String },

    #[error("Process '{name}' was initialized before being configured")]
    Unconfigured { name: String },

    #[error("Process '{name}' was initialized twice")]
    Reinitialized { name: String },

    #[error("Process '{name}' was used before being initialized")]
    Uninitialized { name: String },

    #[error("Process '{name}' was reconfigured before being initialized")]
    ReconfigureBeforeInit { name: String },

    #[error("Process '{name}' received a connection on port '{port}' after initialization")]
    ConnectAfterInit { name: String, port: String },

    #[error("Process '{name}' had the type of port '{port}' set after initialization")]
    SetTypeOnInitialized { name: String, port: String },

    #[error("Process '{name}' changed the declaration of port '{port}' after initialization")]
    DeclareAfterInit { name: String, port: String },

    #[error("Process '{name}' has no {direction} port named '{port}'")]
    NoSuchPort {
        name: String,
        direction: PortDirection,
        port: String,
    },

    #[error("Process '{name}' already declares an {direction} port named '{port}'")]
    DuplicatePort {
        name: String,
        direction: PortDirection,
        port: String,
    },

    #[error("Process '{name}' was given a null edge for {direction} port '{port}'")]
    NullEdge {
        name: String,
        direction: PortDirection,
        port: String,
    },

    #[error("Input port '{port}' on process '{name}' is already connected")]
    PortReconnect { name: String, port: String },

    #[error("Port '{port}' on process '{name}' has incompatible flags: {reason}")]
    FlagMismatch {
        name: String,
        port: String,
        reason: String,
    },

    #[error("Port '{port}' on process '{name}' is reserved and cannot be removed")]
    ReservedPort { name: String, port: String },

    #[error("Invalid port frequency: {0}")]
    InvalidFrequency(String),

    #[error("Unknown port flag: {0}")]
    UnknownFlag(String),

    #[error("Port '{port}' on process '{name}' has static type '{current}' and cannot be set to '{proposed}'")]
    StaticTypeReset {
        name: String,
        port: String,
        current: PortType,
        proposed: PortType,
    },

    #[error("The {direction} port '{port}' on process '{name}' has no edge")]
    MissingConnection {
        name: String,
        direction: PortDirection,
        port: String,
    },

    #[error("Datum on port '{port}' of process '{name}' ({status}) is not a {expected}")]
    BadDatumCast {
        name: String,
        port: String,
        status: DatumStatus,
        expected: &'static str,
    },

    #[error(transparent)]
    Config(#[from] FlowError),

    /// Failure raised by a process implementation's own hook.
    #[error(transparent)]
    Plugin(#[from] anyhow::Error),
}

impl ProcessError {
    /// Short stable label for logs and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::AlreadyConfigured { .. } => "already configured",
            ProcessError::Unconfigured { .. } => "unconfigured",
            ProcessError::Reinitialized { .. } => "reinitialized",
            ProcessError::Uninitialized { .. } => "uninitialized",
            ProcessError::ReconfigureBeforeInit { .. } => "reconfigure before init",
            ProcessError::ConnectAfterInit { .. } => "connect after init",
            ProcessError::SetTypeOnInitialized { .. } => "set type on initialized",
            ProcessError::DeclareAfterInit { .. } => "declare after init",
            ProcessError::NoSuchPort { .. } => "no such port",
            ProcessError::DuplicatePort { .. } => "duplicate port",
            ProcessError::NullEdge { .. } => "null edge",
            ProcessError::PortReconnect { .. } => "port reconnect",
            ProcessError::FlagMismatch { .. } => "flag mismatch",
            ProcessError::ReservedPort { .. } => "reserved port",
            ProcessError::InvalidFrequency(_) => "invalid frequency",
            ProcessError::UnknownFlag(_) => "unknown flag",
            ProcessError::StaticTypeReset { .. } => "static type reset",
            ProcessError::MissingConnection { .. } => "missing connection",
            ProcessError::BadDatumCast { .. } => "bad datum cast",
            ProcessError::Config(e) => match e.root() {
                FlowError::UnknownConfigKey(_) => "unknown configuration key",
                FlowError::BadValueConversion { .. } => "bad value conversion",
                FlowError::DuplicateConfigKey(_) => "duplicate configuration key",
                _ => "configuration",
            },
            ProcessError::Plugin(_) => "plugin",
        }
    }
}

pub type ProcessResult<T> = std::result::Result<T, ProcessError>;
