use std::cmp::Ordering;

use thiserror::Error;

use crate::limits::PllLimits;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PllError {
    #[error("invalid PLL limits: {0}")]
    InvalidLimits(&'static str),

    #[error("target frequency is zero")]
    ZeroTarget,

    #[error("no divider combination reaches {target} within the PLL limits")]
    NoSolution { target: u32 },
}

/// Best divider combination found by [`solve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PllSolution {
    pub ref_div: u16,
    pub fb_div: u16,
    pub post_div: u8,
    /// Output frequency these dividers produce.
    pub frequency: f64,
    /// `|target - frequency|`.
    pub deviation: f64,
    error_scaled: u64,
    denominator: u64,
}

impl PllSolution {
    /// Deviation as the exact fraction `numerator / denominator`.
    pub fn deviation_ratio(&self) -> (u64, u64) {
        (self.error_scaled, self.denominator)
    }

    /// `true` when the dividers reproduce the target exactly.
    pub fn is_exact(&self) -> bool {
        self.error_scaled == 0
    }

    /// VCO frequency the PLL runs at with this solution.
    pub fn vco(&self, reference_freq: u32) -> f64 {
        f64::from(reference_freq) * f64::from(self.fb_div) / f64::from(self.ref_div)
    }

    fn cmp_deviation(&self, other: &Self) -> Ordering {
        // a/b vs c/d without rounding: a*d vs c*b.
        let lhs = u128::from(self.error_scaled) * u128::from(other.denominator);
        let rhs = u128::from(other.error_scaled) * u128::from(self.denominator);
        lhs.cmp(&rhs)
    }
}

/// Searches the divider space in `limits` for the combination closest to `target`.
///
/// Post dividers are tried in ascending order, and for each post divider whose VCO frequency
/// fits the VCO band, reference dividers are tried in ascending order. A candidate only replaces
/// the current best when it is strictly closer, so ties resolve to the smallest post divider and
/// then the smallest reference divider.
pub fn solve(target: u32, limits: &PllLimits) -> Result<PllSolution, PllError> {
    limits.validate()?;
    if target == 0 {
        return Err(PllError::ZeroTarget);
    }

    let reference = u64::from(limits.reference_freq);
    let mut best: Option<PllSolution> = None;

    'post: for post_div in limits.post_div_min..=limits.post_div_max {
        let vco = u64::from(target) * u64::from(post_div);
        if vco < u64::from(limits.vco_min) {
            continue;
        }
        // VCO grows with the post divider.
        if vco > u64::from(limits.vco_max) {
            break;
        }

        for ref_div in limits.ref_div_min..=limits.ref_div_max {
            // target * post * ref == fb * reference for an exact hit.
            let scaled = vco * u64::from(ref_div);
            let fb_div = div_round_half_away(scaled, reference);
            if fb_div < u64::from(limits.fb_div_min) {
                continue;
            }
            // The feedback divider only grows with the reference divider.
            if fb_div > u64::from(limits.fb_div_max) {
                break;
            }

            let denominator = u64::from(ref_div) * u64::from(post_div);
            let achieved_scaled = reference * fb_div;
            let candidate = PllSolution {
                // validate() caps every divider to its parameter-block width.
                ref_div: ref_div as u16,
                fb_div: fb_div as u16,
                post_div: post_div as u8,
                frequency: achieved_scaled as f64 / denominator as f64,
                deviation: scaled.abs_diff(achieved_scaled) as f64 / denominator as f64,
                error_scaled: scaled.abs_diff(achieved_scaled),
                denominator,
            };

            let improves = best
                .as_ref()
                .map_or(true, |b| candidate.cmp_deviation(b) == Ordering::Less);
            if improves {
                best = Some(candidate);
            }
            if best.as_ref().is_some_and(PllSolution::is_exact) {
                break 'post;
            }
        }
    }

    match best {
        Some(solution) => {
            tracing::debug!(
                target,
                reference = limits.reference_freq,
                ref_div = solution.ref_div,
                fb_div = solution.fb_div,
                post_div = solution.post_div,
                deviation = solution.deviation,
                "pll dividers selected"
            );
            Ok(solution)
        }
        None => Err(PllError::NoSolution { target }),
    }
}

/// `numerator / denominator` rounded to nearest, halves away from zero.
fn div_round_half_away(numerator: u64, denominator: u64) -> u64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder * 2 >= denominator {
        quotient + 1
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_takes_halves_up() {
        assert_eq!(div_round_half_away(5, 2), 3);
        assert_eq!(div_round_half_away(7, 2), 4);
        assert_eq!(div_round_half_away(4, 3), 1);
        assert_eq!(div_round_half_away(5, 3), 2);
        assert_eq!(div_round_half_away(0, 3), 0);
    }

    #[test]
    fn exact_deviation_comparison_is_not_rounded() {
        let base = PllSolution {
            ref_div: 1,
            fb_div: 1,
            post_div: 1,
            frequency: 0.0,
            deviation: 0.0,
            error_scaled: 1,
            denominator: 3,
        };
        let other = PllSolution {
            error_scaled: 2,
            denominator: 6,
            ..base
        };
        assert_eq!(base.cmp_deviation(&other), Ordering::Equal);
    }

    #[test]
    fn zero_target_is_rejected() {
        assert_eq!(solve(0, &PllLimits::default()), Err(PllError::ZeroTarget));
    }
}
