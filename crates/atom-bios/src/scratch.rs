//! Placement of the interpreter's scratch memory.
//!
//! The firmware may ask for a block at the top of VRAM through `VRAM_UsageByFirmware`. The
//! reservation is only honoured when it sits exactly at the end of the driver's free VRAM
//! window; anything else falls back to a zero-filled host buffer.

use crate::config::AtomBiosConfig;
use crate::error::ScratchError;
use crate::tables::VramReservation;

/// Free VRAM range the driver can hand out, in framebuffer addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VramWindow {
    pub start: u64,
    pub size: u64,
}

impl VramWindow {
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }
}

/// Memory backing the interpreter's scratch accesses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScratchRegion {
    /// A block of VRAM at framebuffer address `base`.
    Vram { base: u64, size: u64 },
    /// Host memory owned by the session.
    Host(Vec<u8>),
}

impl ScratchRegion {
    pub fn len(&self) -> u64 {
        match self {
            ScratchRegion::Vram { size, .. } => *size,
            ScratchRegion::Host(buf) => buf.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_vram(&self) -> bool {
        matches!(self, ScratchRegion::Vram { .. })
    }
}

/// Outcome of [`place_scratch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchPlacement {
    pub region: ScratchRegion,
    /// The free VRAM window after the reservation was carved out of it.
    pub remaining: VramWindow,
}

/// Decides where scratch memory lives.
///
/// `reservation` is the firmware's VRAM request, `None` when the table is absent or asks for
/// nothing.
pub fn place_scratch(
    reservation: Option<VramReservation>,
    window: VramWindow,
    config: &AtomBiosConfig,
) -> Result<ScratchPlacement, ScratchError> {
    let request = reservation.filter(|r| r.start_address != 0 && r.size_kib != 0);

    let host_bytes = match request {
        None => {
            tracing::info!(
                bytes = config.default_scratch_bytes(),
                "firmware reserves no VRAM scratch, using default size"
            );
            config.default_scratch_bytes()
        }
        Some(r) => {
            let base = u64::from(r.start_address);
            let size = align_up(r.size_bytes(), config.scratch_alignment);
            tracing::info!(
                base,
                kib = r.size_kib,
                aligned = size,
                "firmware requests VRAM scratch space"
            );

            let end = base.saturating_add(size);
            if window.size == 0 {
                tracing::warn!("no free VRAM window to place firmware scratch in");
            } else if end > window.end() {
                tracing::warn!(
                    base,
                    size,
                    window_end = window.end(),
                    "firmware scratch area extends beyond available VRAM"
                );
            } else if end < window.end() {
                tracing::warn!(
                    scratch_end = end,
                    window_end = window.end(),
                    "firmware scratch area is not located at the end of VRAM"
                );
            } else if base < window.start {
                tracing::warn!(
                    base,
                    window_start = window.start,
                    "firmware scratch area extends below the free VRAM base"
                );
            } else {
                return Ok(ScratchPlacement {
                    region: ScratchRegion::Vram { base, size },
                    remaining: VramWindow {
                        start: window.start,
                        size: window.size - size,
                    },
                });
            }
            // Fall back to host memory of the requested size.
            usize::try_from(size).map_err(|_| ScratchError::Allocation {
                bytes: usize::MAX,
            })?
        }
    };

    tracing::info!(bytes = host_bytes, "allocating scratch space in host memory");
    let mut buf = Vec::new();
    buf.try_reserve_exact(host_bytes)
        .map_err(|_| ScratchError::Allocation { bytes: host_bytes })?;
    buf.resize(host_bytes, 0);
    Ok(ScratchPlacement {
        region: ScratchRegion::Host(buf),
        remaining: window,
    })
}

/// Rounds `value` up to a multiple of `alignment`, saturating at `u64::MAX`.
fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return value;
    }
    value.checked_next_multiple_of(alignment).unwrap_or(u64::MAX)
}
