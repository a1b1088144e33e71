use atom_pll::{solve, PllError, PllLimits};
use proptest::prelude::*;

fn narrow(reference_freq: u32) -> PllLimits {
    PllLimits {
        reference_freq,
        ref_div_min: 1,
        ref_div_max: 1,
        fb_div_min: 1,
        fb_div_max: 100,
        post_div_min: 1,
        post_div_max: 1,
        vco_min: 1,
        vco_max: 1000,
    }
}

#[test]
fn exact_target_has_zero_deviation() {
    let limits = PllLimits::default();
    let solution = solve(10800, &limits).unwrap();

    assert!(solution.is_exact());
    assert_eq!(solution.deviation, 0.0);
    assert_eq!(
        (solution.ref_div, solution.fb_div, solution.post_div),
        (1, 24, 6)
    );
    assert_eq!(
        10800 * u32::from(solution.ref_div) * u32::from(solution.post_div),
        limits.reference_freq * u32::from(solution.fb_div)
    );
    assert_eq!(solution.frequency, 10800.0);
}

#[test]
fn exact_solution_prefers_smallest_dividers() {
    // (6, 1, 24), (6, 2, 48) and (7, 1, 28) all hit 10800 exactly.
    let limits = PllLimits {
        ref_div_min: 2,
        ..PllLimits::default()
    };
    let solution = solve(10800, &limits).unwrap();
    assert_eq!(
        (solution.post_div, solution.ref_div, solution.fb_div),
        (6, 2, 48)
    );
}

#[test]
fn unreachable_vco_band_has_no_solution() {
    let limits = PllLimits {
        vco_min: 1000,
        vco_max: 50000,
        post_div_min: 6,
        ..PllLimits::default()
    };
    assert_eq!(
        solve(10800, &limits),
        Err(PllError::NoSolution { target: 10800 })
    );

    // 2 GHz cannot be reached with any post divider >= 2 under a 1.1 GHz VCO ceiling.
    assert_eq!(
        solve(200_000, &PllLimits::default()),
        Err(PllError::NoSolution { target: 200_000 })
    );
}

#[test]
fn empty_ranges_have_no_solution() {
    // A clamped input range can leave no reference divider at all.
    let no_ref_div = PllLimits::default().with_input_range(2000, 1500);
    assert!(no_ref_div.ref_div_min > no_ref_div.ref_div_max);

    let inverted_vco = PllLimits {
        vco_min: 110_000,
        vco_max: 60_000,
        ..PllLimits::default()
    };
    let inverted_post = PllLimits {
        post_div_min: 10,
        post_div_max: 4,
        ..PllLimits::default()
    };
    let inverted_fb = PllLimits {
        fb_div_min: 500,
        fb_div_max: 100,
        ..PllLimits::default()
    };

    for limits in [no_ref_div, inverted_vco, inverted_post, inverted_fb] {
        assert_eq!(
            solve(10800, &limits),
            Err(PllError::NoSolution { target: 10800 })
        );
    }
}

#[test]
fn feedback_range_violation_has_no_solution() {
    let limits = PllLimits {
        fb_div_min: 2000,
        fb_div_max: 3000,
        ..PllLimits::default()
    };
    assert!(matches!(
        solve(10800, &limits),
        Err(PllError::NoSolution { .. })
    ));
}

#[test]
fn ties_keep_the_smaller_reference_divider() {
    // ref_div 1 -> fb 1 -> 10 ; ref_div 2 -> fb 2 -> 10. Both miss 12 by 2.
    let limits = PllLimits {
        ref_div_max: 2,
        ..narrow(10)
    };
    for _ in 0..8 {
        let solution = solve(12, &limits).unwrap();
        assert_eq!((solution.post_div, solution.ref_div), (1, 1));
        assert_eq!(solution.deviation, 2.0);
    }
}

#[test]
fn ties_keep_the_smaller_post_divider() {
    // post 1 -> fb 1 -> 10 ; post 2 -> fb 2 -> 10.
    let limits = PllLimits {
        post_div_max: 2,
        ..narrow(10)
    };
    let solution = solve(12, &limits).unwrap();
    assert_eq!((solution.post_div, solution.ref_div, solution.fb_div), (1, 1, 1));
    assert_eq!(solution.frequency, 10.0);
}

#[test]
fn closer_candidate_replaces_an_earlier_one() {
    // ref_div 2: fb round(2.6) = 3 -> 15 misses 13 by 2; ref_div 3: fb 4 -> 13.33.
    let limits = PllLimits {
        ref_div_max: 3,
        ..narrow(10)
    };
    let solution = solve(13, &limits).unwrap();
    assert_eq!((solution.ref_div, solution.fb_div), (3, 4));
    assert_eq!(solution.deviation_ratio(), (1, 3));
}

#[test]
fn invalid_limits_are_reported() {
    let limits = PllLimits {
        reference_freq: 0,
        ..PllLimits::default()
    };
    assert!(matches!(
        solve(10800, &limits),
        Err(PllError::InvalidLimits(_))
    ));
}

fn round_half_away(num: u64, den: u64) -> u64 {
    (2 * num + den) / (2 * den)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn solutions_respect_limits_and_are_optimal(target in 600u32..=50_000) {
        let limits = PllLimits::default();
        let Ok(solution) = solve(target, &limits) else {
            return Ok(());
        };

        let ref_div = u64::from(solution.ref_div);
        let fb_div = u64::from(solution.fb_div);
        let post_div = u64::from(solution.post_div);
        prop_assert!((1..=1024).contains(&ref_div));
        prop_assert!((4..=1023).contains(&fb_div));
        prop_assert!((2..=127).contains(&post_div));
        let vco = u64::from(target) * post_div;
        prop_assert!((64800..=110_000).contains(&vco));
        prop_assert_eq!(fb_div, round_half_away(vco * ref_div, 2700));

        let (err, den) = solution.deviation_ratio();
        for post in 2u64..=127 {
            let vco = u64::from(target) * post;
            if !(64800..=110_000).contains(&vco) {
                continue;
            }
            for r in 1u64..=1024 {
                let scaled = vco * r;
                let fb = round_half_away(scaled, 2700);
                if !(4..=1023).contains(&fb) {
                    continue;
                }
                let e = scaled.abs_diff(fb * 2700);
                // No admissible candidate may be strictly closer: e / (r * post) >= err / den.
                let candidate = u128::from(e) * u128::from(den);
                let chosen = u128::from(err) * u128::from(r * post);
                prop_assert!(candidate >= chosen);
            }
        }

        prop_assert_eq!(solve(target, &limits), Ok(solution));
    }
}
