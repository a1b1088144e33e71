//! Command-table execution session.
//!
//! [`AtomBios`] owns the per-adapter state needed to run command tables: the cached table index,
//! the scratch region and the external byte-code [`Interpreter`]. Execution is synchronous and
//! takes `&mut self`, so one session runs at most one command at a time.

use core::fmt;

use crate::bytes::read_u8;
use crate::cail::{CailCallbacks, CailContext, HardwareAccess};
use crate::config::AtomBiosConfig;
use crate::error::{
    AccessError, ExecError, InterpreterError, LocateError, ProgramError, ScratchError,
};
use crate::ids::CommandId;
use crate::params::{AsicInitParams, CommandParams};
use crate::rom::{self, TableEntry, TableIndex, TableRevision, COMMON_HEADER_LEN};
use crate::scratch::{place_scratch, ScratchRegion, VramWindow};
use crate::tables::{Field, TableAccessor};

/// Runs AtomBIOS byte code.
///
/// The interpreter is not part of this crate; callers plug one in with
/// [`AtomBios::attach_interpreter`]. It must only touch hardware through `callbacks`.
pub trait Interpreter {
    fn run(
        &mut self,
        program: &CommandProgram<'_>,
        params: &mut [u8],
        callbacks: &mut dyn CailCallbacks,
    ) -> Result<(), InterpreterError>;
}

/// A command table handed to the interpreter.
#[derive(Clone, Copy)]
pub struct CommandProgram<'a> {
    command: CommandId,
    entry: TableEntry,
    image: &'a [u8],
}

impl<'a> CommandProgram<'a> {
    pub fn command(&self) -> CommandId {
        self.command
    }

    pub fn revision(&self) -> TableRevision {
        self.entry.revision
    }

    /// Image offset of the table's common header.
    pub fn offset(&self) -> usize {
        self.entry.offset
    }

    /// The whole table, header included.
    pub fn table(&self) -> &'a [u8] {
        self.entry
            .range()
            .and_then(|range| self.image.get(range))
            .unwrap_or(&[])
    }

    /// Workspace the table needs, in bytes.
    pub fn work_space_size(&self) -> u8 {
        read_u8(self.table(), COMMON_HEADER_LEN).unwrap_or(0)
    }

    /// Parameter space the table reads, in bytes.
    pub fn parameter_space_size(&self) -> u8 {
        read_u8(self.table(), COMMON_HEADER_LEN + 1).unwrap_or(0) & 0x7F
    }

    /// Set when a BIOS utility patched the table after build.
    pub fn updated_by_utility(&self) -> bool {
        read_u8(self.table(), COMMON_HEADER_LEN + 1).unwrap_or(0) & 0x80 != 0
    }

    /// Byte code following the table attributes.
    pub fn code(&self) -> &'a [u8] {
        self.table().get(COMMON_HEADER_LEN + 2..).unwrap_or(&[])
    }

    /// The full firmware image, for tables that reference others.
    pub fn image(&self) -> &'a [u8] {
        self.image
    }
}

impl fmt::Debug for CommandProgram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandProgram")
            .field("command", &self.command)
            .field("revision", &self.entry.revision)
            .field("offset", &self.entry.offset)
            .field("code_len", &self.code().len())
            .finish()
    }
}

/// Lifecycle of an [`AtomBios`] session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiosState {
    Uninitialized,
    /// Table index built.
    Located,
    /// Scratch region bound, no interpreter yet.
    ScratchBound,
    /// Commands can run.
    Ready,
}

/// One adapter's AtomBIOS session over a caller-owned image.
pub struct AtomBios<'img, I> {
    image: &'img [u8],
    config: AtomBiosConfig,
    index: Option<TableIndex>,
    scratch: Option<ScratchRegion>,
    interpreter: Option<I>,
}

impl<'img, I: Interpreter> AtomBios<'img, I> {
    pub fn new(image: &'img [u8], config: AtomBiosConfig) -> Self {
        Self {
            image,
            config,
            index: None,
            scratch: None,
            interpreter: None,
        }
    }

    pub fn state(&self) -> BiosState {
        match (&self.index, &self.scratch, &self.interpreter) {
            (None, _, _) => BiosState::Uninitialized,
            (Some(_), None, _) => BiosState::Located,
            (Some(_), Some(_), None) => BiosState::ScratchBound,
            (Some(_), Some(_), Some(_)) => BiosState::Ready,
        }
    }

    pub fn image(&self) -> &'img [u8] {
        self.image
    }

    pub fn config(&self) -> &AtomBiosConfig {
        &self.config
    }

    /// Builds the table index on first call and returns the cached one afterwards.
    pub fn locate(&mut self) -> Result<&TableIndex, LocateError> {
        let index = match self.index.take() {
            Some(index) => index,
            None => rom::locate_with(self.image, &self.config)?,
        };
        Ok(self.index.insert(index))
    }

    pub fn table_index(&self) -> Option<&TableIndex> {
        self.index.as_ref()
    }

    pub fn accessor(&self) -> Result<TableAccessor<'_>, AccessError> {
        let index = self.index.as_ref().ok_or(AccessError::NotLocated)?;
        Ok(TableAccessor::new(self.image, index)?)
    }

    pub fn read_field(&self, field: Field) -> Result<u32, AccessError> {
        self.accessor()?.read_field(field)
    }

    /// Revision of a command table, used to pick its parameter layout.
    pub fn command_revision(&self, command: CommandId) -> Result<TableRevision, ExecError> {
        Ok(self.command_program(command)?.revision())
    }

    pub fn command_program(&self, command: CommandId) -> Result<CommandProgram<'img>, ExecError> {
        let index = self.index.as_ref().ok_or(ExecError::NotLocated)?;
        let entry = index.command_table(command);
        if !entry.present {
            return Err(ExecError::UnknownCommand { command });
        }
        Ok(CommandProgram {
            command,
            entry,
            image: self.image,
        })
    }

    /// Places the scratch region and returns what is left of `window`.
    ///
    /// A VRAM reservation from `VRAM_UsageByFirmware` is used when it sits at the end of
    /// `window`; otherwise scratch lives in host memory and `window` comes back unchanged.
    pub fn bind_scratch(&mut self, window: VramWindow) -> Result<VramWindow, ScratchError> {
        let accessor = self.accessor().map_err(|err| match err {
            AccessError::NotLocated => ScratchError::NotLocated,
            other => ScratchError::Access(other),
        })?;
        let reservation = match accessor.vram_usage() {
            Ok(usage) => Some(usage.reservation()),
            Err(AccessError::TableAbsent { .. }) => None,
            Err(err) => return Err(err.into()),
        };

        let placement = place_scratch(reservation, window, &self.config)?;
        tracing::debug!(
            vram = placement.region.is_vram(),
            bytes = placement.region.len(),
            "scratch region bound"
        );
        self.scratch = Some(placement.region);
        Ok(placement.remaining)
    }

    pub fn scratch(&self) -> Option<&ScratchRegion> {
        self.scratch.as_ref()
    }

    /// Installs the interpreter, returning the previous one.
    pub fn attach_interpreter(&mut self, interpreter: I) -> Option<I> {
        self.interpreter.replace(interpreter)
    }

    /// Runs command table `command` with `params` as its parameter space.
    ///
    /// `params` must cover the parameter space the table declares. The interpreter may write
    /// results back into it.
    pub fn execute<H: HardwareAccess + ?Sized>(
        &mut self,
        hw: &mut H,
        command: CommandId,
        params: &mut [u8],
    ) -> Result<(), ExecError> {
        let Some(index) = self.index.as_ref() else {
            return Err(ExecError::NotLocated);
        };
        let Some(scratch) = self.scratch.as_mut() else {
            return Err(ExecError::NoScratchRegion);
        };
        let Some(interpreter) = self.interpreter.as_mut() else {
            return Err(ExecError::NoInterpreter);
        };
        let entry = index.command_table(command);
        if !entry.present {
            return Err(ExecError::UnknownCommand { command });
        }
        let program = CommandProgram {
            command,
            entry,
            image: self.image,
        };
        let declared = usize::from(program.parameter_space_size());
        if params.len() < declared {
            return Err(ExecError::ParamSpaceTooSmall {
                command,
                declared,
                provided: params.len(),
            });
        }
        if scratch.is_vram() && !hw.framebuffer_mapped() {
            tracing::error!(%command, "cannot run command table: framebuffer not mapped");
            return Err(ExecError::FramebufferUnmapped);
        }

        tracing::debug!(
            %command,
            revision = %entry.revision,
            params = params.len(),
            "executing command table"
        );

        let mut ctx = CailContext::new(hw, scratch);
        interpreter
            .run(&program, params, &mut ctx)
            .map_err(|InterpreterError(message)| {
                tracing::error!(%command, %message, "command table failed");
                ExecError::InterpreterFailure { command, message }
            })
    }

    /// Encodes `params` for the command's revision, runs it, and returns the block as the
    /// interpreter left it.
    pub fn execute_params<P: CommandParams, H: HardwareAccess + ?Sized>(
        &mut self,
        hw: &mut H,
        params: &P,
    ) -> Result<Vec<u8>, ProgramError> {
        let revision = self.command_revision(P::COMMAND)?;
        let mut block = params.encode(revision)?;
        self.execute(hw, P::COMMAND, &mut block)?;
        Ok(block)
    }

    /// Posts the adapter with the firmware's default engine and memory clocks.
    pub fn asic_init<H: HardwareAccess + ?Sized>(
        &mut self,
        hw: &mut H,
    ) -> Result<(), ProgramError> {
        let params = AsicInitParams {
            engine_clock: self.read_field(Field::DefaultEngineClock)?,
            memory_clock: self.read_field(Field::DefaultMemoryClock)?,
        };
        tracing::info!(
            engine_clock = params.engine_clock,
            memory_clock = params.memory_clock,
            "running ASIC init"
        );
        self.execute_params(hw, &params)?;
        Ok(())
    }

    /// Drops the index and the scratch region and hands back the interpreter.
    pub fn teardown(&mut self) -> Option<I> {
        tracing::debug!(state = ?self.state(), "tearing down AtomBIOS session");
        self.index = None;
        self.scratch = None;
        self.interpreter.take()
    }
}

impl<I> fmt::Debug for AtomBios<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomBios")
            .field("image_len", &self.image.len())
            .field("located", &self.index.is_some())
            .field("scratch", &self.scratch.as_ref().map(ScratchRegion::len))
            .field("interpreter", &self.interpreter.is_some())
            .finish()
    }
}
