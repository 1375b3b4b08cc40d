//! Synthetic maintenance data generation

mod fleet;
mod source;
mod synthesizer;

pub use fleet::{build_fleet, build_fleet_with, DEFAULT_FLEET_SIZE};
pub use source::{NoiseFree, SampleSource, SeededSource};
pub use synthesizer::{
    accumulate_cost, oil_level, round_to, synthesize, ObservationSynthesizer,
    DEFAULT_NUM_SAMPLES, MAX_MAINTENANCE_COST, MAX_TIRE_PRESSURE, MIN_MAINTENANCE_COST,
    MIN_TIRE_PRESSURE,
};

use crate::error::{MaintenanceError, Result};
use crate::models::{ObservationRecord, DEFAULT_CURRENT_YEAR, MAX_MODEL_YEAR};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Default seed of a dataset build
pub const DEFAULT_SEED: u64 = 42;

/// Parameters of one dataset build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub fleet_size: usize,
    pub num_samples: usize,
    pub seed: u64,
    /// Reference year used to derive vehicle age
    pub current_year: i32,
    /// Replace Gaussian noise by its mean and Poisson draws by `floor(lambda)`
    pub noise_free: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            fleet_size: DEFAULT_FLEET_SIZE,
            num_samples: DEFAULT_NUM_SAMPLES,
            seed: DEFAULT_SEED,
            current_year: DEFAULT_CURRENT_YEAR,
            noise_free: false,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fleet_size == 0 {
            return Err(MaintenanceError::invalid("fleet_size must be positive"));
        }
        if self.num_samples == 0 {
            return Err(MaintenanceError::invalid("num_samples must be positive"));
        }
        if self.current_year < MAX_MODEL_YEAR {
            return Err(MaintenanceError::invalid(format!(
                "current_year {} precedes the newest model year {}",
                self.current_year, MAX_MODEL_YEAR
            )));
        }
        Ok(())
    }
}

/// Run the full generation: one seeded stream draws the fleet, then the samples
///
/// Nothing is returned unless every sample was produced.
pub fn generate(config: &GenerationConfig) -> Result<Vec<ObservationRecord>> {
    config.validate()?;
    let start = Instant::now();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let fleet = build_fleet_with(config.fleet_size, &mut rng)?;

    let synthesizer = ObservationSynthesizer::new(config.current_year);
    let source = SeededSource::from_rng(rng);
    let records = if config.noise_free {
        let mut source = NoiseFree::new(source);
        synthesizer.synthesize(&fleet, config.num_samples, &mut source)?
    } else {
        let mut source = source;
        synthesizer.synthesize(&fleet, config.num_samples, &mut source)?
    };

    info!(
        event = "dataset_generated",
        fleet_size = config.fleet_size,
        samples = records.len(),
        seed = config.seed,
        noise_free = config.noise_free,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Synthetic maintenance data generated"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EngineType, OilLevel};

    #[test]
    fn test_generate_defaults() {
        let records = generate(&GenerationConfig::default()).unwrap();
        assert_eq!(records.len(), DEFAULT_NUM_SAMPLES);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let config = GenerationConfig {
            num_samples: 300,
            ..Default::default()
        };
        assert_eq!(generate(&config).unwrap(), generate(&config).unwrap());
    }

    #[test]
    fn test_generate_rejects_bad_config() {
        let zero_samples = GenerationConfig {
            num_samples: 0,
            ..Default::default()
        };
        assert!(matches!(
            generate(&zero_samples),
            Err(MaintenanceError::InvalidArgument(_))
        ));

        let zero_fleet = GenerationConfig {
            fleet_size: 0,
            ..Default::default()
        };
        assert!(generate(&zero_fleet).is_err());

        let past_year = GenerationConfig {
            current_year: 2015,
            ..Default::default()
        };
        assert!(generate(&past_year).is_err());
    }

    #[test]
    fn test_noise_free_generation_has_no_tire_noise() {
        let config = GenerationConfig {
            num_samples: 200,
            noise_free: true,
            ..Default::default()
        };
        let records = generate(&config).unwrap();
        for r in &records {
            assert_eq!(r.tire_pressure, 33.0);
            assert_eq!(
                r.oil_level == OilLevel::NotApplicable,
                r.engine_type == EngineType::Electric
            );
        }
    }
}
