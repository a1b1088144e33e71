use thiserror::Error;

use crate::ids::{CommandId, DataTableId};
use crate::rom::{MasterTable, TableRevision};

/// Fatal format errors found while locating the ROM header and master tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("{what} at offset {offset:#x} (len {len}) exceeds image length {image_len}")]
    Truncated {
        what: &'static str,
        offset: usize,
        len: usize,
        image_len: usize,
    },

    #[error("bad ROM header signature {found:?} at offset {offset:#x}, expected \"ATOM\"")]
    BadSignature { offset: usize, found: [u8; 4] },

    #[error("malformed ROM header at offset {offset:#x}: {reason}")]
    MalformedRomHeader { offset: usize, reason: &'static str },

    #[error("malformed master {which} table at offset {offset:#x}: {reason}")]
    MalformedMasterTable {
        which: MasterTable,
        offset: usize,
        reason: &'static str,
    },
}

/// Inconsistent decoder registration for a versioned table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{table} registers revision {revision} more than once")]
    DuplicateRevision {
        table: DataTableId,
        revision: TableRevision,
    },

    #[error("{table} registers format {format} with a gap before content revision {content}")]
    RevisionGap {
        table: DataTableId,
        format: u8,
        content: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("firmware image has not been located")]
    NotLocated,

    #[error("data table {table} is absent")]
    TableAbsent { table: DataTableId },

    #[error("data table {table} revision {revision} is not supported")]
    UnsupportedRevision {
        table: DataTableId,
        revision: TableRevision,
    },

    #[error(
        "data table {table} revision {revision} needs {needed} bytes, only {available} present"
    )]
    Truncated {
        table: DataTableId,
        revision: TableRevision,
        needed: usize,
        available: usize,
    },

    #[error("{field} index {index} out of range (count {count})")]
    IndexOutOfRange {
        field: &'static str,
        index: usize,
        count: usize,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScratchError {
    #[error("firmware image has not been located")]
    NotLocated,

    #[error("failed to allocate {bytes} bytes of host scratch memory")]
    Allocation { bytes: usize },

    #[error("scratch reservation query failed: {0}")]
    Access(#[from] AccessError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("firmware image has not been located")]
    NotLocated,

    #[error("no scratch region is bound")]
    NoScratchRegion,

    #[error("no interpreter is attached")]
    NoInterpreter,

    #[error("command table {command} is absent")]
    UnknownCommand { command: CommandId },

    #[error("{command} declares {declared} bytes of parameter space, got {provided}")]
    ParamSpaceTooSmall {
        command: CommandId,
        declared: usize,
        provided: usize,
    },

    #[error("scratch region lives in VRAM but the framebuffer is not mapped")]
    FramebufferUnmapped,

    #[error("interpreter failed executing {command}: {message}")]
    InterpreterFailure { command: CommandId, message: String },
}

/// Errors building a command parameter block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("no parameter layout for {command} revision {revision}")]
    UnsupportedRevision {
        command: CommandId,
        revision: TableRevision,
    },

    #[error("{field} value {value} does not fit its parameter field")]
    ValueOutOfRange { field: &'static str, value: u64 },
}

/// Errors from the multi-step programming helpers (`program_pixel_clock`, `asic_init`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error(transparent)]
    Pll(#[from] atom_pll::PllError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Failure reported by an [`crate::Interpreter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InterpreterError(pub String);

impl From<&str> for InterpreterError {
    fn from(message: &str) -> Self {
        Self(message.to_owned())
    }
}
