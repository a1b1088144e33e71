//! Parameter blocks for the command tables the driver calls.
//!
//! A command table reads its arguments from a little-endian parameter block whose layout depends
//! on the table's revision. Each type here knows which command it belongs to and encodes itself
//! for a given revision, refusing revisions it has no layout for.

use bitflags::bitflags;

use atom_pll::PllSolution;

use crate::error::ParamError;
use crate::ids::CommandId;
use crate::rom::TableRevision;

/// A typed parameter block for one command table.
pub trait CommandParams {
    const COMMAND: CommandId;

    /// Encodes the block using the layout of `revision`.
    fn encode(&self, revision: TableRevision) -> Result<Vec<u8>, ParamError>;
}

fn unsupported(command: CommandId, revision: TableRevision) -> ParamError {
    ParamError::UnsupportedRevision { command, revision }
}

/// `ASIC_Init` arguments. Clocks are in 10 kHz units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsicInitParams {
    pub engine_clock: u32,
    pub memory_clock: u32,
}

impl CommandParams for AsicInitParams {
    const COMMAND: CommandId = CommandId::AsicInit;

    fn encode(&self, revision: TableRevision) -> Result<Vec<u8>, ParamError> {
        match revision.format {
            1 => {}
            // Format 2 packs flags into the top byte of each clock.
            2 => {
                for (field, value) in [
                    ("engine clock", self.engine_clock),
                    ("memory clock", self.memory_clock),
                ] {
                    if value > 0x00FF_FFFF {
                        return Err(ParamError::ValueOutOfRange {
                            field,
                            value: u64::from(value),
                        });
                    }
                }
            }
            _ => return Err(unsupported(Self::COMMAND, revision)),
        }
        // The trailing 8 bytes are workspace for the nested SetEngineClock call.
        let mut b = vec![0u8; 16];
        b[0..4].copy_from_slice(&self.engine_clock.to_le_bytes());
        b[4..8].copy_from_slice(&self.memory_clock.to_le_bytes());
        Ok(b)
    }
}

/// Pixel PLL selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Ppll {
    Ppll1 = 0,
    Ppll2 = 1,
}

/// Parameter space of `SetPixelClock`: the 12-byte pixel clock block plus the 8-byte reserved
/// spread-spectrum block.
pub const SET_PIXEL_CLOCK_PS_ALLOCATION_LEN: usize = 20;

/// `SetPixelClock` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelClockParams {
    /// Target pixel clock in 10 kHz units.
    pub pixel_clock: u16,
    pub ref_div: u16,
    pub fb_div: u16,
    pub post_div: u8,
    pub frac_fb_div: u8,
    pub ppll: Ppll,
    pub crtc: u8,
    /// 1 selects the reference divider given here rather than the VBIOS default.
    pub ref_div_src: u8,
    pub misc: u8,
    /// Revision 1.3 only.
    pub transmitter_id: u8,
    /// Revision 1.3 only.
    pub encoder_mode: u8,
}

impl PixelClockParams {
    /// Builds a block for `crtc` from a divider search result.
    pub fn from_solution(pixel_clock: u16, crtc: u8, ppll: Ppll, solution: &PllSolution) -> Self {
        Self {
            pixel_clock,
            ref_div: solution.ref_div,
            fb_div: solution.fb_div,
            post_div: solution.post_div,
            frac_fb_div: 0,
            ppll,
            crtc,
            ref_div_src: 1,
            misc: 0,
            transmitter_id: 0,
            encoder_mode: 0,
        }
    }
}

impl CommandParams for PixelClockParams {
    const COMMAND: CommandId = CommandId::SetPixelClock;

    fn encode(&self, revision: TableRevision) -> Result<Vec<u8>, ParamError> {
        let (byte9, byte10) = match (revision.format, revision.content) {
            (1, 1) | (1, 2) => (self.ref_div_src, self.crtc),
            (1, 3) => (self.transmitter_id, self.encoder_mode),
            _ => return Err(unsupported(Self::COMMAND, revision)),
        };

        let mut b = Vec::with_capacity(SET_PIXEL_CLOCK_PS_ALLOCATION_LEN);
        b.extend_from_slice(&self.pixel_clock.to_le_bytes());
        b.extend_from_slice(&self.ref_div.to_le_bytes());
        b.extend_from_slice(&self.fb_div.to_le_bytes());
        b.push(self.post_div);
        b.push(self.frac_fb_div);
        b.push(self.ppll as u8);
        b.push(byte9);
        b.push(byte10);
        // 1.1 pads this byte.
        b.push(if revision.content == 1 { 0 } else { self.misc });
        // Reserved spread-spectrum block the table may use as workspace.
        b.resize(SET_PIXEL_CLOCK_PS_ALLOCATION_LEN, 0);
        Ok(b)
    }
}

/// `EnableCRTC` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableCrtcParams {
    pub crtc: u8,
    pub enable: bool,
}

impl CommandParams for EnableCrtcParams {
    const COMMAND: CommandId = CommandId::EnableCrtc;

    fn encode(&self, revision: TableRevision) -> Result<Vec<u8>, ParamError> {
        if revision.format != 1 {
            return Err(unsupported(Self::COMMAND, revision));
        }
        Ok(vec![self.crtc, u8::from(self.enable), 0, 0])
    }
}

/// `BlankCRTC` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlankCrtcParams {
    pub crtc: u8,
    pub blank: bool,
    /// Colour driven while blanked: `(R/Cr, G/Y, B/Cb)`.
    pub black_color: (u16, u16, u16),
}

impl CommandParams for BlankCrtcParams {
    const COMMAND: CommandId = CommandId::BlankCrtc;

    fn encode(&self, revision: TableRevision) -> Result<Vec<u8>, ParamError> {
        if revision.format != 1 {
            return Err(unsupported(Self::COMMAND, revision));
        }
        let (r, g, b) = self.black_color;
        let mut out = vec![self.crtc, u8::from(self.blank)];
        out.extend_from_slice(&r.to_le_bytes());
        out.extend_from_slice(&g.to_le_bytes());
        out.extend_from_slice(&b.to_le_bytes());
        Ok(out)
    }
}

/// `SelectCRTC_Source` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectCrtcSourceParams {
    /// Revision 1.1: route a legacy device index to the CRTC.
    Device { crtc: u8, device: u8 },
    /// Revision 1.2: route an encoder object to the CRTC.
    Encoder {
        crtc: u8,
        encoder_id: u8,
        encoder_mode: u8,
    },
}

impl CommandParams for SelectCrtcSourceParams {
    const COMMAND: CommandId = CommandId::SelectCrtcSource;

    fn encode(&self, revision: TableRevision) -> Result<Vec<u8>, ParamError> {
        match (*self, revision.format, revision.content) {
            (SelectCrtcSourceParams::Device { crtc, device }, 1, 1) => Ok(vec![crtc, device, 0, 0]),
            (
                SelectCrtcSourceParams::Encoder {
                    crtc,
                    encoder_id,
                    encoder_mode,
                },
                1,
                2,
            ) => Ok(vec![crtc, encoder_id, encoder_mode, 0]),
            _ => Err(unsupported(Self::COMMAND, revision)),
        }
    }
}

bitflags! {
    /// `susModeMiscInfo` bits of a CRTC timing block.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct ModeMiscInfo: u16 {
        const H_CUTOFF = 0x0001;
        const HSYNC_POLARITY = 0x0002;
        const VSYNC_POLARITY = 0x0004;
        const V_CUTOFF = 0x0008;
        const H_REPLICATION_BY2 = 0x0010;
        const V_REPLICATION_BY2 = 0x0020;
        const COMPOSITE_SYNC = 0x0040;
        const INTERLACE = 0x0080;
        const DOUBLE_CLOCK = 0x0100;
        const RGB888 = 0x0200;
    }
}

/// `SetCRTC_Timing` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrtcTimingParams {
    pub h_total: u16,
    pub h_disp: u16,
    pub h_sync_start: u16,
    pub h_sync_width: u16,
    pub v_total: u16,
    pub v_disp: u16,
    pub v_sync_start: u16,
    pub v_sync_width: u16,
    pub misc: ModeMiscInfo,
    pub crtc: u8,
    pub overscan_right: u8,
    pub overscan_left: u8,
    pub overscan_bottom: u8,
    pub overscan_top: u8,
}

impl CommandParams for CrtcTimingParams {
    const COMMAND: CommandId = CommandId::SetCrtcTiming;

    fn encode(&self, revision: TableRevision) -> Result<Vec<u8>, ParamError> {
        if revision != TableRevision::new(1, 1) {
            return Err(unsupported(Self::COMMAND, revision));
        }
        let mut b = Vec::with_capacity(24);
        for v in [
            self.h_total,
            self.h_disp,
            self.h_sync_start,
            self.h_sync_width,
            self.v_total,
            self.v_disp,
            self.v_sync_start,
            self.v_sync_width,
            self.misc.bits(),
        ] {
            b.extend_from_slice(&v.to_le_bytes());
        }
        b.extend_from_slice(&[
            self.crtc,
            self.overscan_right,
            self.overscan_left,
            self.overscan_bottom,
            self.overscan_top,
            0,
        ]);
        Ok(b)
    }
}
