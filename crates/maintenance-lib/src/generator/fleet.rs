//! Fleet sampling: the fixed pool of latent vehicle archetypes

use crate::error::{MaintenanceError, Result};
use crate::models::{
    DrivingCondition, EngineType, Make, VehicleArchetype, MAX_DAILY_DISTANCE_KM, MAX_MODEL_YEAR,
    MAX_RELIABILITY, MIN_DAILY_DISTANCE_KM, MIN_MODEL_YEAR, MIN_RELIABILITY, SERVICE_INTERVALS,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Default number of archetypes per dataset build
pub const DEFAULT_FLEET_SIZE: usize = 200;

/// Build a fleet of `size` archetypes from a fresh generator seeded with `seed`
pub fn build_fleet(size: usize, seed: u64) -> Result<Vec<VehicleArchetype>> {
    let mut rng = StdRng::seed_from_u64(seed);
    build_fleet_with(size, &mut rng)
}

/// Build a fleet drawing from a caller-owned generator
pub fn build_fleet_with<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<Vec<VehicleArchetype>> {
    if size == 0 {
        return Err(MaintenanceError::invalid("fleet size must be positive"));
    }

    let fleet: Vec<VehicleArchetype> = (0..size).map(|_| sample_archetype(rng)).collect();
    debug!(size = fleet.len(), "Fleet built");
    Ok(fleet)
}

fn sample_archetype<R: Rng + ?Sized>(rng: &mut R) -> VehicleArchetype {
    VehicleArchetype {
        make: pick(rng, &Make::ALL),
        model_year: rng.gen_range(MIN_MODEL_YEAR..=MAX_MODEL_YEAR),
        engine_type: pick(rng, &EngineType::ALL),
        daily_distance_km: rng.gen_range(MIN_DAILY_DISTANCE_KM..=MAX_DAILY_DISTANCE_KM),
        driving_condition: pick(rng, &DrivingCondition::ALL),
        service_interval_days: pick(rng, &SERVICE_INTERVALS),
        reliability_factor: rng.gen_range(MIN_RELIABILITY..=MAX_RELIABILITY),
    }
}

fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, choices: &[T]) -> T {
    choices[rng.gen_range(0..choices.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_fleet() {
        let a = build_fleet(200, 42).unwrap();
        let b = build_fleet(200, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_fleet() {
        let a = build_fleet(50, 1).unwrap();
        let b = build_fleet(50, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = build_fleet(0, 42).unwrap_err();
        assert!(matches!(err, MaintenanceError::InvalidArgument(_)));
    }

    #[test]
    fn test_archetype_domains() {
        let fleet = build_fleet(500, 11).unwrap();
        assert_eq!(fleet.len(), 500);
        for v in &fleet {
            assert!((MIN_MODEL_YEAR..=MAX_MODEL_YEAR).contains(&v.model_year));
            assert!((MIN_DAILY_DISTANCE_KM..=MAX_DAILY_DISTANCE_KM).contains(&v.daily_distance_km));
            assert!(SERVICE_INTERVALS.contains(&v.service_interval_days));
            assert!(v.reliability_factor >= MIN_RELIABILITY && v.reliability_factor <= MAX_RELIABILITY);
        }
    }

    #[test]
    fn test_every_category_appears() {
        let fleet = build_fleet(500, 5).unwrap();
        for make in Make::ALL {
            assert!(fleet.iter().any(|v| v.make == make), "{} never drawn", make);
        }
        for engine in EngineType::ALL {
            assert!(fleet.iter().any(|v| v.engine_type == engine));
        }
        for interval in SERVICE_INTERVALS {
            assert!(fleet.iter().any(|v| v.service_interval_days == interval));
        }
    }
}
