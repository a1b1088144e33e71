use crate::solver::PllError;

/// Hardware constraints for a divider search.
///
/// Every range is inclusive. Frequencies use the same unit as the target passed to
/// [`crate::solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllLimits {
    /// Crystal / reference clock feeding the PLL.
    pub reference_freq: u32,
    pub ref_div_min: u32,
    pub ref_div_max: u32,
    pub fb_div_min: u32,
    pub fb_div_max: u32,
    pub post_div_min: u32,
    pub post_div_max: u32,
    /// Lowest VCO frequency (`target * post_div`) the PLL can lock at.
    pub vco_min: u32,
    /// Highest VCO frequency the PLL can lock at.
    pub vco_max: u32,
}

impl PllLimits {
    /// Largest reference/feedback divider a parameter block can carry (16-bit fields).
    pub const MAX_DIVIDER: u32 = u16::MAX as u32;
    /// Largest post divider a parameter block can carry (8-bit field).
    pub const MAX_POST_DIVIDER: u32 = u8::MAX as u32;

    /// Narrows the reference divider range so the PLL input frequency
    /// (`reference_freq / ref_div`) stays within `min_input..=max_input`.
    ///
    /// A bound of zero leaves that side of the range untouched.
    pub fn with_input_range(mut self, min_input: u32, max_input: u32) -> Self {
        if max_input != 0 {
            // ref_div >= ceil(reference / max_input)
            let lower = self.reference_freq.div_ceil(max_input);
            self.ref_div_min = self.ref_div_min.max(lower);
        }
        if min_input != 0 {
            let upper = self.reference_freq / min_input;
            self.ref_div_max = self.ref_div_max.min(upper);
        }
        self
    }

    /// Rejects limit sets no search could run against.
    ///
    /// An empty range is not an error here: it leaves nothing to search, so [`crate::solve`]
    /// reports [`PllError::NoSolution`].
    pub fn validate(&self) -> Result<(), PllError> {
        if self.reference_freq == 0 {
            return Err(PllError::InvalidLimits("reference frequency is zero"));
        }
        if self.ref_div_min == 0 || self.post_div_min == 0 {
            return Err(PllError::InvalidLimits("divider minimum is zero"));
        }
        if self.ref_div_max > Self::MAX_DIVIDER || self.fb_div_max > Self::MAX_DIVIDER {
            return Err(PllError::InvalidLimits("divider exceeds 16 bits"));
        }
        if self.post_div_max > Self::MAX_POST_DIVIDER {
            return Err(PllError::InvalidLimits("post divider exceeds 8 bits"));
        }
        Ok(())
    }
}

impl Default for PllLimits {
    /// AVIVO-class pixel PLL limits in 10 kHz units with a 27 MHz reference.
    fn default() -> Self {
        Self {
            reference_freq: 2700,
            ref_div_min: 1,
            ref_div_max: 1024,
            fb_div_min: 4,
            fb_div_max: 1023,
            post_div_min: 2,
            post_div_max: 127,
            vco_min: 64800,
            vco_max: 110000,
        }
    }
}
