//! Post-model adjustment pipeline.
//!
//! Raw regressor outputs pass through, in order:
//!
//! 1. plausibility floors for non-positive predictions (emergency visits
//!    are never floored)
//! 2. multiplicative jitter per target
//! 3. occupancy clamp to a valid percentage
//! 4. scenario multipliers, with occupancy re-clamped
//! 5. bed capacity derivation
//!
//! The occupancy jitter range is an order of magnitude wider than the
//! others; the clamp bounds the result to a valid percentage.

use crate::domain::Scenario;
use crate::models::RawForecast;
use crate::rng::RandomSource;

/// Fixed total bed capacity used for the occupancy-to-beds translation.
pub const TOTAL_BEDS: i64 = 200;

/// Fully adjusted predictions, ready for alerting and reporting.
#[derive(Debug, Clone, Copy)]
pub struct AdjustedForecast {
    pub consultas: f64,
    pub ocupacion: f64,
    pub cirugias: f64,
    pub urgencias: f64,
    pub camas_ocupadas: i64,
    pub camas_libres: i64,
}

/// Run the full adjustment pipeline on one raw forecast.
pub fn adjust(raw: RawForecast, scenario: Scenario, rng: &mut RandomSource) -> AdjustedForecast {
    let mut consultas = floor_nonpositive(raw.consultas, 80.0, 800.0, rng);
    let mut ocupacion = floor_nonpositive(raw.ocupacion, 5.0, 25.0, rng);
    let mut cirugias = floor_nonpositive(raw.cirugias, 2.0, 20.0, rng);
    let mut urgencias = raw.urgencias;

    consultas *= rng.uniform(0.9, 1.1);
    ocupacion *= rng.uniform(8.0, 12.0);
    ocupacion = ocupacion.min(100.0);
    cirugias *= rng.uniform(0.8, 1.2);
    urgencias *= rng.uniform(0.95, 1.05);

    (consultas, ocupacion, cirugias, urgencias) =
        apply_scenario(consultas, ocupacion, cirugias, urgencias, scenario);

    let (camas_ocupadas, camas_libres) = derive_beds(ocupacion);

    AdjustedForecast {
        consultas,
        ocupacion,
        cirugias,
        urgencias,
        camas_ocupadas,
        camas_libres,
    }
}

/// Replace a non-positive prediction with a domain-plausible uniform draw.
fn floor_nonpositive(value: f64, lo: f64, hi: f64, rng: &mut RandomSource) -> f64 {
    if value <= 0.0 { rng.uniform(lo, hi) } else { value }
}

/// Scenario multipliers: counts scale by the factor, occupancy by the
/// factor plus 0.2 and is re-clamped to a valid percentage.
fn apply_scenario(
    consultas: f64,
    ocupacion: f64,
    cirugias: f64,
    urgencias: f64,
    scenario: Scenario,
) -> (f64, f64, f64, f64) {
    match scenario.factor() {
        Some(factor) => (
            consultas * factor,
            (ocupacion * (factor + 0.2)).min(100.0),
            cirugias * factor,
            urgencias * factor,
        ),
        None => (consultas, ocupacion, cirugias, urgencias),
    }
}

/// Occupied/free bed counts for the fixed capacity; they always sum to
/// `TOTAL_BEDS`.
fn derive_beds(ocupacion: f64) -> (i64, i64) {
    let ocupadas = (TOTAL_BEDS as f64 * ocupacion / 100.0).round() as i64;
    (ocupadas, TOTAL_BEDS - ocupadas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(consultas: f64, ocupacion: f64, cirugias: f64, urgencias: f64) -> RawForecast {
        RawForecast {
            consultas,
            ocupacion,
            cirugias,
            urgencias,
        }
    }

    #[test]
    fn scenario_multipliers_are_exact() {
        let (c, o, s, u) = apply_scenario(100.0, 40.0, 10.0, 50.0, Scenario::Emergencia);
        assert_eq!(c, 180.0);
        assert_eq!(s, 18.0);
        assert_eq!(u, 90.0);
        // Occupancy uses factor + 0.2: 40 * 2.0 = 80.
        assert_eq!(o, 80.0);
    }

    #[test]
    fn scenario_occupancy_is_reclamped() {
        let (_, o, _, _) = apply_scenario(100.0, 90.0, 10.0, 50.0, Scenario::Invierno);
        // 90 * 1.4 = 126 clamps to 100.
        assert_eq!(o, 100.0);
    }

    #[test]
    fn base_scenario_changes_nothing() {
        assert_eq!(
            apply_scenario(100.0, 40.0, 10.0, 50.0, Scenario::Base),
            (100.0, 40.0, 10.0, 50.0)
        );
    }

    #[test]
    fn beds_always_sum_to_capacity() {
        for occ in [0.0, 0.3, 12.5, 47.3, 50.0, 84.99, 99.99, 100.0] {
            let (ocupadas, libres) = derive_beds(occ);
            assert_eq!(ocupadas + libres, TOTAL_BEDS, "occupancy {occ}");
            assert!(ocupadas >= 0, "occupancy {occ}");
        }
    }

    #[test]
    fn floors_replace_only_nonpositive_values() {
        let mut rng = RandomSource::seeded(3);
        for _ in 0..200 {
            let v = floor_nonpositive(-5.0, 80.0, 800.0, &mut rng);
            assert!((80.0..800.0).contains(&v), "floored value out of range: {v}");
        }
        assert_eq!(floor_nonpositive(42.0, 80.0, 800.0, &mut rng), 42.0);
    }

    #[test]
    fn adjusted_occupancy_stays_a_valid_percentage() {
        // Across seeds and scenarios the final occupancy must stay in
        // [0, 100] and beds must sum to capacity, including the wide
        // occupancy jitter.
        let scenarios = [
            Scenario::Base,
            Scenario::BroteCovid,
            Scenario::Verano,
            Scenario::Emergencia,
        ];
        for seed in 0..100 {
            let mut rng = RandomSource::seeded(seed);
            for scenario in scenarios {
                let out = adjust(raw(250.0, 9.0, 12.0, 80.0), scenario, &mut rng);
                assert!(
                    (0.0..=100.0).contains(&out.ocupacion),
                    "seed {seed}: occupancy {}",
                    out.ocupacion
                );
                assert_eq!(out.camas_ocupadas + out.camas_libres, TOTAL_BEDS);
            }
        }
    }

    #[test]
    fn emergency_visits_are_never_floored() {
        // A negative urgencias prediction passes through the (shrinking)
        // jitter rather than being replaced.
        let mut rng = RandomSource::seeded(9);
        let out = adjust(raw(250.0, 9.0, 12.0, -40.0), Scenario::Base, &mut rng);
        assert!(
            out.urgencias < 0.0,
            "urgencias should keep its sign, got {}",
            out.urgencias
        );
    }
}
