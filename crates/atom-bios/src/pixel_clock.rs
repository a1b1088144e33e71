//! Pixel clock programming: divider search followed by `SetPixelClock`.

use atom_pll::{PllLimits, PllSolution};

use crate::cail::HardwareAccess;
use crate::error::{AccessError, ProgramError};
use crate::exec::{AtomBios, Interpreter};
use crate::params::{PixelClockParams, Ppll};
use crate::tables::TableAccessor;

/// Lowest VCO frequency assumed when the firmware leaves its pixel PLL minimum at zero.
pub const DEFAULT_MIN_PLL_OUTPUT: u32 = 64800;

/// A pixel clock to program on one CRTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelClockRequest {
    pub crtc: u8,
    pub ppll: Ppll,
    /// 10 kHz units.
    pub pixel_clock: u16,
}

impl PixelClockRequest {
    /// Drives `crtc` from its usual PLL (CRTC 0 on PPLL1, everything else on PPLL2).
    pub fn for_crtc(crtc: u8, pixel_clock: u16) -> Self {
        Self {
            crtc,
            ppll: if crtc == 0 { Ppll::Ppll1 } else { Ppll::Ppll2 },
            pixel_clock,
        }
    }
}

/// Derives divider limits from the firmware's pixel PLL description.
///
/// The reference clock and the pixel PLL output range come from FirmwareInfo; the pixel PLL
/// input range narrows the reference divider range. Zero values keep the defaults.
pub fn pll_limits_from_firmware(accessor: &TableAccessor<'_>) -> Result<PllLimits, AccessError> {
    let info = accessor.firmware_info()?;
    let common = info.common();
    let defaults = PllLimits::default();

    let vco_min = match info.min_pixel_pll_output() {
        0 => DEFAULT_MIN_PLL_OUTPUT,
        v => v,
    };
    let vco_max = match common.max_pixel_pll_output {
        0 => defaults.vco_max,
        v => v,
    };
    let reference_freq = match common.reference_clock {
        0 => defaults.reference_freq,
        v => u32::from(v),
    };

    let limits = PllLimits {
        reference_freq,
        vco_min,
        vco_max,
        ..defaults
    }
    .with_input_range(
        u32::from(common.min_pixel_pll_input),
        u32::from(common.max_pixel_pll_input),
    );
    tracing::debug!(?limits, "pixel PLL limits from firmware");
    Ok(limits)
}

/// Solves dividers for `request` and runs `SetPixelClock` with them.
pub fn program_pixel_clock<I, H>(
    bios: &mut AtomBios<'_, I>,
    hw: &mut H,
    request: &PixelClockRequest,
    limits: &PllLimits,
) -> Result<PllSolution, ProgramError>
where
    I: Interpreter,
    H: HardwareAccess + ?Sized,
{
    let solution = atom_pll::solve(u32::from(request.pixel_clock), limits)?;
    let params =
        PixelClockParams::from_solution(request.pixel_clock, request.crtc, request.ppll, &solution);
    bios.execute_params(hw, &params)?;

    tracing::info!(
        crtc = request.crtc,
        pixel_clock = request.pixel_clock,
        ref_div = solution.ref_div,
        fb_div = solution.fb_div,
        post_div = solution.post_div,
        actual = solution.frequency,
        "pixel clock programmed"
    );
    Ok(solution)
}
