//! Pixel-clock PLL divider search.
//!
//! Given a target output frequency, a fixed reference frequency and the ranges a PLL accepts for
//! its reference, feedback and post dividers (plus the band its VCO may run in), [`solve`] finds
//! the integer divider triple whose output is closest to the target:
//!
//! ```text
//! output = reference * fb_div / (ref_div * post_div)
//! ```
//!
//! All frequencies share one unit. AtomBIOS tables use 10 kHz, so a 27 MHz crystal is `2700`.
//!
//! The search is deterministic across platforms: divider arithmetic is integer only, the
//! feedback divider is rounded half away from zero, and deviations are compared as exact
//! rationals. When two candidates deviate by the same amount the one found first wins
//! (smallest post divider, then smallest reference divider).

#![forbid(unsafe_code)]

mod limits;
mod solver;

pub use crate::limits::PllLimits;
pub use crate::solver::{solve, PllError, PllSolution};
