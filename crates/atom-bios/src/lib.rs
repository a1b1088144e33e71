//! AtomBIOS command-table support for Radeon-class display adapters.
//!
//! The crate locates the data and command tables inside a firmware image, decodes versioned data
//! tables by their exact revision, and runs command tables through an external byte-code
//! interpreter with a scratch-aware callback context.
//!
//! A typical session:
//!
//! ```text
//! let mut bios = AtomBios::new(&image, AtomBiosConfig::default());
//! bios.locate()?;
//! let free = bios.bind_scratch(vram_window)?;
//! bios.attach_interpreter(interpreter);
//! bios.asic_init(&mut hw)?;
//! let limits = pll_limits_from_firmware(&bios.accessor()?)?;
//! program_pixel_clock(&mut bios, &mut hw, &PixelClockRequest::for_crtc(0, 10800), &limits)?;
//! ```

#![forbid(unsafe_code)]

mod bytes;

pub mod cail;
pub mod config;
pub mod error;
pub mod exec;
pub mod ids;
pub mod params;
pub mod pixel_clock;
pub mod rom;
pub mod scratch;
pub mod tables;

pub use crate::cail::{CailCallbacks, CailContext, HardwareAccess, PciWidth};
pub use crate::config::AtomBiosConfig;
pub use crate::error::{
    AccessError, ExecError, InterpreterError, LocateError, ParamError, ProgramError,
    RegistryError, ScratchError,
};
pub use crate::exec::{AtomBios, BiosState, CommandProgram, Interpreter};
pub use crate::ids::{CommandId, DataTableId};
pub use crate::pixel_clock::{pll_limits_from_firmware, program_pixel_clock, PixelClockRequest};
pub use crate::rom::{locate, locate_with, RomHeader, TableEntry, TableIndex, TableRevision};
pub use crate::scratch::{ScratchRegion, VramWindow};
pub use crate::tables::{Field, TableAccessor};

pub use atom_pll::{PllLimits, PllSolution};
