//! Observation synthesis
//!
//! Draws samples from the fleet with replacement and derives the dependent
//! inspection features and the target maintenance cost for each one.
//! Derivation is a pure function of one archetype and the sample source, so
//! the draw order below is part of the output contract.

use super::source::{SampleSource, SeededSource};
use crate::error::{MaintenanceError, Result};
use crate::models::{
    EngineType, ObservationRecord, OilLevel, VehicleArchetype, DEFAULT_CURRENT_YEAR,
};
use tracing::debug;

/// Default number of observations per dataset build
pub const DEFAULT_NUM_SAMPLES: usize = 5000;

/// Standard deviation of the mileage noise (km)
const MILEAGE_NOISE_STD: f64 = 1000.0;

/// Tire pressure distribution and clamp range (psi)
const TIRE_PRESSURE_MEAN: f64 = 33.0;
const TIRE_PRESSURE_STD: f64 = 3.0;
pub const MIN_TIRE_PRESSURE: f64 = 25.0;
pub const MAX_TIRE_PRESSURE: f64 = 40.0;

/// Mileage at which base brake wear reaches 100%
const BRAKE_WEAR_FULL_MILEAGE: f64 = 50_000.0;
const BRAKE_WEAR_NOISE_STD: f64 = 5.0;

/// Base cost distribution
const BASE_COST_MEAN: f64 = 150.0;
const BASE_COST_STD: f64 = 30.0;
const FINAL_COST_NOISE_STD: f64 = 50.0;
const FAULT_CODE_COST: f64 = 75.0;

/// Maintenance cost clamp range
pub const MIN_MAINTENANCE_COST: f64 = 50.0;
pub const MAX_MAINTENANCE_COST: f64 = 2000.0;

/// Synthesizes observation records from a fleet
#[derive(Debug, Clone)]
pub struct ObservationSynthesizer {
    current_year: i32,
}

impl Default for ObservationSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENT_YEAR)
    }
}

impl ObservationSynthesizer {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Draw `num_samples` observations, selecting archetypes with replacement
    pub fn synthesize<S: SampleSource + ?Sized>(
        &self,
        fleet: &[VehicleArchetype],
        num_samples: usize,
        source: &mut S,
    ) -> Result<Vec<ObservationRecord>> {
        if num_samples == 0 {
            return Err(MaintenanceError::invalid("num_samples must be positive"));
        }
        if fleet.is_empty() {
            return Err(MaintenanceError::invalid("fleet must not be empty"));
        }
        if let Some(archetype) = fleet.iter().find(|a| a.service_interval_days == 0) {
            return Err(MaintenanceError::invalid(format!(
                "{} {} has a zero-day service interval",
                archetype.model_year, archetype.make
            )));
        }

        let records: Vec<ObservationRecord> = (0..num_samples)
            .map(|_| {
                let archetype = &fleet[source.index(fleet.len())];
                self.observe(archetype, source)
            })
            .collect();

        debug!(
            samples = records.len(),
            fleet_size = fleet.len(),
            "Observations synthesized"
        );
        Ok(records)
    }

    /// Derive one observation from one archetype
    pub fn observe<S: SampleSource + ?Sized>(
        &self,
        archetype: &VehicleArchetype,
        source: &mut S,
    ) -> ObservationRecord {
        let vehicle_age = self.current_year - archetype.model_year;

        let base_mileage = archetype.daily_distance_km as f64 * 365.0 * vehicle_age as f64;
        let mileage = round_to(base_mileage + source.gaussian(0.0, MILEAGE_NOISE_STD), 1).abs();

        let days_since_service = source.below(archetype.service_interval_days);
        let oil_level = oil_level(
            archetype.engine_type,
            days_since_service,
            archetype.service_interval_days,
        );

        let tire_pressure = round_to(
            source
                .gaussian(TIRE_PRESSURE_MEAN, TIRE_PRESSURE_STD)
                .clamp(MIN_TIRE_PRESSURE, MAX_TIRE_PRESSURE),
            1,
        );

        let base_wear = (mileage / BRAKE_WEAR_FULL_MILEAGE) * 100.0
            * archetype.driving_condition.brake_wear_factor();
        let brake_wear_pct = round_to(
            (base_wear + source.gaussian(0.0, BRAKE_WEAR_NOISE_STD)).clamp(0.0, 100.0),
            1,
        );

        let lambda = (vehicle_age as f64 / 10.0) * (1.0 / archetype.reliability_factor);
        let fault_codes = source.poisson(lambda);

        let base_cost = source.gaussian(BASE_COST_MEAN, BASE_COST_STD);
        let cost = accumulate_cost(
            base_cost,
            oil_level,
            brake_wear_pct,
            archetype.engine_type,
            fault_codes,
            archetype.reliability_factor,
        ) + source.gaussian(0.0, FINAL_COST_NOISE_STD);
        let maintenance_cost =
            round_to(cost, 2).clamp(MIN_MAINTENANCE_COST, MAX_MAINTENANCE_COST);

        ObservationRecord {
            make: archetype.make,
            model_year: archetype.model_year,
            engine_type: archetype.engine_type,
            daily_distance_km: archetype.daily_distance_km,
            driving_condition: archetype.driving_condition,
            service_interval_days: archetype.service_interval_days,
            reliability_factor: archetype.reliability_factor,
            vehicle_age,
            mileage,
            days_since_service,
            oil_level,
            tire_pressure,
            brake_wear_pct,
            fault_codes,
            maintenance_cost,
        }
    }
}

/// Synthesize with a fresh seeded stream and the default reference year
pub fn synthesize(
    fleet: &[VehicleArchetype],
    num_samples: usize,
    seed: u64,
) -> Result<Vec<ObservationRecord>> {
    let mut source = SeededSource::new(seed);
    ObservationSynthesizer::default().synthesize(fleet, num_samples, &mut source)
}

/// Oil level from service recency; thresholds are strict
pub fn oil_level(engine_type: EngineType, days_since_service: u32, service_interval: u32) -> OilLevel {
    if engine_type == EngineType::Electric {
        return OilLevel::NotApplicable;
    }
    let days = days_since_service as f64;
    let interval = service_interval as f64;
    if days > interval * 0.75 {
        OilLevel::Low
    } else if days > interval * 0.5 {
        OilLevel::Medium
    } else {
        OilLevel::High
    }
}

/// Deterministic part of the cost formula, before the final perturbation
pub fn accumulate_cost(
    base_cost: f64,
    oil_level: OilLevel,
    brake_wear: f64,
    engine_type: EngineType,
    fault_codes: u32,
    reliability_factor: f64,
) -> f64 {
    let mut cost = base_cost;

    cost += match oil_level {
        OilLevel::Low => 80.0,
        OilLevel::Medium => 40.0,
        OilLevel::High | OilLevel::NotApplicable => 0.0,
    };

    // Only the highest crossed threshold applies
    if brake_wear > 80.0 {
        cost += 300.0;
    } else if brake_wear > 60.0 {
        cost += 150.0;
    }

    cost *= match engine_type {
        EngineType::Diesel => 1.25,
        EngineType::Electric => 0.85,
        EngineType::Gas => 1.0,
    };

    cost += fault_codes as f64 * FAULT_CODE_COST;
    cost * (2.0 - reliability_factor)
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
