use super::super::domain::{SatBands, StudentProfile};
use super::{Adjustment, AdjustmentFactor};

const SELECTIVE_CAP_RATE: f64 = 0.15;
const SELECTIVE_CAP_ODDS: f64 = 18.0;
const MIN_PROBABILITY: f64 = 1.0;
const MAX_PROBABILITY: f64 = 95.0;

/// Points outside the 25th/75th percentile where the SAT multiplier saturates.
const SAT_SATURATION_SPAN: f64 = 150.0;

/// (ACT composite, SAT total) concordance, descending.
const ACT_TO_SAT: &[(u8, u16)] = &[
    (36, 1590),
    (35, 1540),
    (34, 1500),
    (33, 1460),
    (32, 1430),
    (31, 1400),
    (30, 1370),
    (29, 1340),
    (28, 1310),
    (27, 1280),
    (26, 1240),
    (25, 1210),
    (24, 1180),
    (23, 1140),
    (22, 1110),
    (21, 1080),
    (20, 1040),
    (19, 1010),
    (18, 970),
    (17, 930),
    (16, 890),
    (15, 850),
    (14, 800),
    (13, 760),
    (12, 710),
    (11, 670),
    (10, 630),
    (9, 590),
];

pub(crate) struct ProbabilityEstimate {
    pub probability: u8,
    pub adjustments: Vec<Adjustment>,
}

/// Turns a population admit rate into a personalized 1-95 percentage.
pub(crate) fn estimate(
    admit_rate: f64,
    profile: &StudentProfile,
    sat_bands: Option<SatBands>,
) -> ProbabilityEstimate {
    let admit_rate = admit_rate.clamp(0.0, 1.0);
    let mut adjustments = Vec::new();
    let mut odds = admit_rate * 100.0;

    let central = central_gpa(admit_rate);
    let gpa = profile.gpa_or_default();
    let gpa_delta = gpa - central;
    let gpa_multiplier = if gpa_delta >= 0.0 {
        1.0 + gpa_delta * 0.8
    } else {
        (1.0 + gpa_delta * 1.2).max(0.15)
    };
    odds *= gpa_multiplier;
    adjustments.push(Adjustment {
        factor: AdjustmentFactor::Gpa,
        multiplier: gpa_multiplier,
        notes: format!("GPA {gpa:.2} against admitted-class center {central:.2}"),
    });

    let rigor = profile.rigor_or_default();
    let rigor_multiplier = 1.0 + ((rigor - 50.0) / 100.0) * 0.5;
    odds *= rigor_multiplier;
    adjustments.push(Adjustment {
        factor: AdjustmentFactor::Rigor,
        multiplier: rigor_multiplier,
        notes: format!("course rigor {rigor:.0}/100"),
    });

    if let (Some(bands), Some(sat)) = (sat_bands, student_sat(profile)) {
        let sat_multiplier = sat_multiplier(sat, bands);
        odds *= sat_multiplier;
        adjustments.push(Adjustment {
            factor: AdjustmentFactor::StandardizedTest,
            multiplier: sat_multiplier,
            notes: format!("SAT {sat} against middle 50% {}-{}", bands.p25, bands.p75),
        });
    }

    if admit_rate < SELECTIVE_CAP_RATE && odds > SELECTIVE_CAP_ODDS {
        adjustments.push(Adjustment {
            factor: AdjustmentFactor::SelectivityCap,
            multiplier: SELECTIVE_CAP_ODDS / odds,
            notes: format!(
                "admit rate {:.0}% caps odds at {SELECTIVE_CAP_ODDS:.0}",
                admit_rate * 100.0
            ),
        });
        odds = SELECTIVE_CAP_ODDS;
    }

    let probability = odds.clamp(MIN_PROBABILITY, MAX_PROBABILITY).round() as u8;
    ProbabilityEstimate {
        probability,
        adjustments,
    }
}

/// GPA the admitted class centers on, by selectivity band.
pub(crate) fn central_gpa(admit_rate: f64) -> f64 {
    if admit_rate < 0.10 {
        3.95
    } else if admit_rate < 0.20 {
        3.85
    } else if admit_rate < 0.40 {
        3.60
    } else if admit_rate < 0.60 {
        3.30
    } else {
        3.00
    }
}

/// Student SAT total, falling back to an ACT concordance.
pub(crate) fn student_sat(profile: &StudentProfile) -> Option<u16> {
    if let Some(sat) = profile.sat_total.filter(|sat| (400..=1600).contains(sat)) {
        return Some(sat);
    }
    let act = profile.act_composite.filter(|act| (1..=36).contains(act))?;
    ACT_TO_SAT
        .iter()
        .find(|(composite, _)| *composite <= act)
        .map(|(_, sat)| *sat)
        .or(Some(550))
}

/// Monotone piecewise-linear multiplier: 0.3 well below the 25th percentile,
/// 0.6 at it, 1.0 at the midpoint, 1.6 at the 75th, 2.5 well above.
pub(crate) fn sat_multiplier(sat: u16, bands: SatBands) -> f64 {
    let p25 = f64::from(bands.p25);
    let p75 = f64::from(bands.p75);
    let mid = bands.midpoint();
    let anchors = [
        (p25 - SAT_SATURATION_SPAN, 0.3),
        (p25, 0.6),
        (mid, 1.0),
        (p75, 1.6),
        (p75 + SAT_SATURATION_SPAN, 2.5),
    ];

    let score = f64::from(sat);
    if score <= anchors[0].0 {
        return anchors[0].1;
    }
    for window in anchors.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if score <= x1 {
            let span = x1 - x0;
            if span <= f64::EPSILON {
                return y1;
            }
            return y0 + (score - x0) / span * (y1 - y0);
        }
    }
    anchors[anchors.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(gpa: f64) -> StudentProfile {
        StudentProfile {
            gpa_weighted: Some(gpa),
            ..StudentProfile::default()
        }
    }

    #[test]
    fn defaults_leave_the_base_rate_for_average_students() {
        let estimate = estimate(0.70, &StudentProfile::default(), None);
        assert_eq!(estimate.probability, 70);
        assert_eq!(estimate.adjustments.len(), 2);
    }

    #[test]
    fn weaker_gpa_penalty_is_floored() {
        let estimate = estimate(0.60, &profile(0.5), None);
        // 60 * 0.15 floor
        assert_eq!(estimate.probability, 9);
    }

    #[test]
    fn rigor_moves_odds_by_at_most_a_quarter() {
        let strong = StudentProfile {
            rigor_score: Some(140.0),
            ..StudentProfile::default()
        };
        let weak = StudentProfile {
            rigor_score: Some(0.0),
            ..StudentProfile::default()
        };
        assert_eq!(estimate(0.60, &strong, None).probability, 75);
        assert_eq!(estimate(0.60, &weak, None).probability, 45);
    }

    #[test]
    fn highly_selective_schools_are_capped() {
        let stellar = StudentProfile {
            gpa_weighted: Some(4.8),
            rigor_score: Some(100.0),
            sat_total: Some(1600),
            act_composite: None,
        };
        let bands = SatBands::new(1500, 1570);
        let capped = estimate(0.12, &stellar, bands);
        assert_eq!(capped.probability, 18);
        assert!(capped
            .adjustments
            .iter()
            .any(|adjustment| adjustment.factor == AdjustmentFactor::SelectivityCap));
    }

    #[test]
    fn result_is_clamped_to_the_scale() {
        let stellar = StudentProfile {
            gpa_weighted: Some(5.0),
            rigor_score: Some(100.0),
            sat_total: Some(1600),
            act_composite: None,
        };
        let bands = SatBands::new(1000, 1200);
        assert_eq!(estimate(0.90, &stellar, bands).probability, 95);
        assert_eq!(estimate(0.0, &StudentProfile::default(), None).probability, 1);
    }

    #[test]
    fn gpa_increase_never_decreases_probability() {
        for rate in [0.03, 0.12, 0.22, 0.35, 0.48, 0.55, 0.72, 0.91] {
            let mut previous = 0u8;
            for step in 0..=50 {
                let gpa = f64::from(step) * 0.1;
                let current = estimate(rate, &profile(gpa), SatBands::new(1200, 1400)).probability;
                assert!(
                    current >= previous,
                    "rate {rate} gpa {gpa}: {current} < {previous}"
                );
                previous = current;
            }
        }
    }

    #[test]
    fn sat_multiplier_hits_anchors_and_is_monotone() {
        let bands = SatBands::new(1300, 1500).expect("valid bands");
        assert!((sat_multiplier(1000, bands) - 0.3).abs() < 1e-9);
        assert!((sat_multiplier(1300, bands) - 0.6).abs() < 1e-9);
        assert!((sat_multiplier(1400, bands) - 1.0).abs() < 1e-9);
        assert!((sat_multiplier(1500, bands) - 1.6).abs() < 1e-9);
        assert!((sat_multiplier(1600, bands) - 2.2).abs() < 1e-9);
        assert!((sat_multiplier(1350, bands) - 0.8).abs() < 1e-9);
        let lower = SatBands::new(1100, 1300).expect("valid bands");
        assert!((sat_multiplier(1600, lower) - 2.5).abs() < 1e-9);

        let mut previous = 0.0;
        for sat in (900..=1600).step_by(10) {
            let current = sat_multiplier(sat, bands);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn degenerate_bands_do_not_divide_by_zero() {
        let bands = SatBands::new(1400, 1400).expect("valid bands");
        let at = sat_multiplier(1400, bands);
        assert!(at.is_finite());
        assert!(sat_multiplier(1399, bands) < at);
        assert!(sat_multiplier(1401, bands) > at);
    }

    #[test]
    fn act_converts_when_sat_missing() {
        let act_only = StudentProfile {
            act_composite: Some(33),
            ..StudentProfile::default()
        };
        assert_eq!(student_sat(&act_only), Some(1460));

        let both = StudentProfile {
            sat_total: Some(1250),
            act_composite: Some(33),
            ..StudentProfile::default()
        };
        assert_eq!(student_sat(&both), Some(1250));
        assert_eq!(student_sat(&StudentProfile::default()), None);
    }
}
