// 🌳 Impact Estimator - "What if" mitigation scenarios
// Fixed empirical coefficients; nothing here is fitted to the dataset.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::category::{classify, AqiCategory, AqiValue};

// ============================================================================
// COEFFICIENTS
// ============================================================================

/// PM2.5 removed per tree, scaled by `TREE_PM25_SCALE`.
const TREE_PM25_PER_UNIT: f64 = 0.3;
const TREE_PM25_SCALE: f64 = 10_000.0;
/// Tonnes of CO2 absorbed per tree per year.
const TREE_CO2_PER_TREE: f64 = 0.022;

const CAR_PM25_PER_UNIT: f64 = 0.3;
const CAR_NO2_PER_UNIT: f64 = 0.1;
const CAR_SCALE: f64 = 1_000.0;
/// Tonnes of CO2 emitted per car per year.
const CAR_CO2_PER_CAR: f64 = 4.6;

const PM25_AQI_WEIGHT: f64 = 2.0;
const NO2_AQI_WEIGHT: f64 = 1.5;

/// Slider range the dashboards offer for tree planting. Not enforced here.
pub const TREE_COUNT_RANGE: RangeInclusive<u32> = 10_000..=100_000;

/// Slider range the dashboards offer for car removal. Not enforced here.
pub const CAR_COUNT_RANGE: RangeInclusive<u32> = 1_000..=10_000;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MitigationAction {
    PlantTrees { count: u32 },
    RemoveCars { count: u32 },
}

impl MitigationAction {
    pub fn count(&self) -> u32 {
        match self {
            MitigationAction::PlantTrees { count } | MitigationAction::RemoveCars { count } => *count,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MitigationAction::PlantTrees { .. } => "Plant trees",
            MitigationAction::RemoveCars { .. } => "Remove cars",
        }
    }

    /// The range the dashboards clamp this action's count to.
    pub fn ui_range(&self) -> RangeInclusive<u32> {
        match self {
            MitigationAction::PlantTrees { .. } => TREE_COUNT_RANGE,
            MitigationAction::RemoveCars { .. } => CAR_COUNT_RANGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    pub new_aqi: AqiValue,
    pub aqi_reduction: f64,
    pub pm25_reduction: f64,
    pub co2_reduction: f64,
    /// Only reported for car removal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no2_reduction: Option<f64>,
    pub resulting_category: AqiCategory,
}

// ============================================================================
// ESTIMATORS
// ============================================================================

pub fn estimate_tree_impact(tree_count: u32, current_aqi: AqiValue) -> ImpactResult {
    let n = f64::from(tree_count);
    let pm25_reduction = n * TREE_PM25_PER_UNIT / TREE_PM25_SCALE;
    let co2_reduction = n * TREE_CO2_PER_TREE;
    let aqi_reduction = pm25_reduction * PM25_AQI_WEIGHT;

    finish(current_aqi, aqi_reduction, pm25_reduction, co2_reduction, None)
}

pub fn estimate_car_removal_impact(car_count: u32, current_aqi: AqiValue) -> ImpactResult {
    let n = f64::from(car_count);
    let pm25_reduction = n * CAR_PM25_PER_UNIT / CAR_SCALE;
    let co2_reduction = n * CAR_CO2_PER_CAR;
    let no2_reduction = n * CAR_NO2_PER_UNIT / CAR_SCALE;
    let aqi_reduction = pm25_reduction * PM25_AQI_WEIGHT + no2_reduction * NO2_AQI_WEIGHT;

    finish(
        current_aqi,
        aqi_reduction,
        pm25_reduction,
        co2_reduction,
        Some(no2_reduction),
    )
}

pub fn estimate(action: MitigationAction, current_aqi: AqiValue) -> ImpactResult {
    match action {
        MitigationAction::PlantTrees { count } => estimate_tree_impact(count, current_aqi),
        MitigationAction::RemoveCars { count } => estimate_car_removal_impact(count, current_aqi),
    }
}

fn finish(
    current_aqi: AqiValue,
    aqi_reduction: f64,
    pm25_reduction: f64,
    co2_reduction: f64,
    no2_reduction: Option<f64>,
) -> ImpactResult {
    // Never below zero, however large the reduction.
    let new_aqi = (current_aqi - aqi_reduction).max(0.0);

    ImpactResult {
        new_aqi,
        aqi_reduction,
        pm25_reduction,
        co2_reduction,
        no2_reduction,
        resulting_category: classify(new_aqi),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_tree_scenario() {
        let result = estimate_tree_impact(10_000, 100.0);

        assert!(close(result.pm25_reduction, 0.3));
        assert!(close(result.aqi_reduction, 0.6));
        assert!(close(result.new_aqi, 99.4));
        assert!(close(result.co2_reduction, 220.0));
        assert_eq!(result.no2_reduction, None);
        assert_eq!(result.resulting_category, AqiCategory::Satisfactory);
    }

    #[test]
    fn test_car_scenario() {
        let result = estimate_car_removal_impact(1_000, 100.0);

        assert!(close(result.pm25_reduction, 0.3));
        assert!(close(result.no2_reduction.unwrap(), 0.1));
        assert!(close(result.aqi_reduction, 0.75));
        assert!(close(result.new_aqi, 99.25));
        assert!(close(result.co2_reduction, 4_600.0));
        assert_eq!(result.resulting_category, AqiCategory::Satisfactory);
    }

    #[test]
    fn test_tree_impact_never_raises_aqi() {
        for n in [0u32, 1, 500, 10_000, 55_555, 100_000, 1_000_000] {
            for aqi in [0.0, 12.5, 100.0, 350.0, 500.0] {
                let result = estimate_tree_impact(n, aqi);
                let expected = (aqi - f64::from(n) * 0.3 / 10_000.0 * 2.0).max(0.0);

                assert!(result.new_aqi <= aqi);
                assert!(close(result.new_aqi, expected), "n={} aqi={}", n, aqi);
            }
        }
    }

    #[test]
    fn test_car_impact_clamps_at_zero() {
        for n in [0u32, 1_000, 5_000, 10_000, 200_000] {
            for aqi in [0.0, 0.5, 3.0, 7.5, 150.0] {
                let result = estimate_car_removal_impact(n, aqi);
                let nf = f64::from(n);
                let threshold = nf * 0.3 / 1_000.0 * 2.0 + nf * 0.1 / 1_000.0 * 1.5;

                assert!(result.new_aqi >= 0.0);
                if aqi <= threshold {
                    assert_eq!(result.new_aqi, 0.0, "n={} aqi={}", n, aqi);
                    assert_eq!(result.resulting_category, AqiCategory::Good);
                }
            }
        }
    }

    #[test]
    fn test_category_follows_new_aqi() {
        // 100,000 trees remove 6 AQI points: 53 → 47 crosses into Good.
        let result = estimate_tree_impact(100_000, 53.0);
        assert!(close(result.new_aqi, 47.0));
        assert_eq!(result.resulting_category, AqiCategory::Good);
    }

    #[test]
    fn test_estimate_dispatches_on_action() {
        let trees = MitigationAction::PlantTrees { count: 20_000 };
        let cars = MitigationAction::RemoveCars { count: 2_000 };

        assert_eq!(estimate(trees, 80.0), estimate_tree_impact(20_000, 80.0));
        assert_eq!(estimate(cars, 80.0), estimate_car_removal_impact(2_000, 80.0));
    }

    #[test]
    fn test_counts_outside_ui_range_are_accepted() {
        let action = MitigationAction::PlantTrees { count: 5 };
        assert!(!action.ui_range().contains(&action.count()));

        let result = estimate(action, 10.0);
        assert!(result.new_aqi < 10.0);
    }

    #[test]
    fn test_action_json_shape() {
        let action: MitigationAction =
            serde_json::from_str(r#"{"type": "remove_cars", "count": 3000}"#).unwrap();
        assert_eq!(action, MitigationAction::RemoveCars { count: 3000 });
    }
}
