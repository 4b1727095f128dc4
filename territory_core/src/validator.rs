//! TerritoryValidator - single pass/fail verdict for a closed path.
//!
//! Checks run in a fixed order and stop at the first failure, so a verdict
//! carries at most one reason:
//! 1. point count
//! 2. walked length along the path
//! 3. self-intersection
//! 4. enclosed area

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ClosureConfig, ValidationThresholds};
use crate::geo_math::{path_length, polygon_area, GeoPoint};
use crate::intersection::SelfIntersectionChecker;

// =============================================================================
// VERDICT
// =============================================================================

/// Why a closed path was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFailure {
    TooFewPoints { count: usize, required: usize },
    InsufficientDistance { actual: f64, required: f64 },
    SelfIntersecting,
    InsufficientArea { actual: f64, required: f64 },
}

impl ValidationFailure {
    /// Stable snake_case name, identical to the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationFailure::TooFewPoints { .. } => "too_few_points",
            ValidationFailure::InsufficientDistance { .. } => "insufficient_distance",
            ValidationFailure::SelfIntersecting => "self_intersecting",
            ValidationFailure::InsufficientArea { .. } => "insufficient_area",
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationFailure::TooFewPoints { count, required } => {
                write!(f, "too few points: {count} recorded, {required} required")
            }
            ValidationFailure::InsufficientDistance { actual, required } => {
                write!(f, "path too short: walked {actual:.1} m, {required:.1} m required")
            }
            ValidationFailure::SelfIntersecting => write!(f, "path crosses itself"),
            ValidationFailure::InsufficientArea { actual, required } => {
                write!(f, "area too small: {actual:.1} m², {required:.1} m² required")
            }
        }
    }
}

/// Result of validating one closed path. Produced once per closure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    pub reason: Option<ValidationFailure>,
    /// Enclosed area in m² (0 when validation stopped before the area check)
    pub area_m2: f64,
}

impl ValidationVerdict {
    fn accepted(area_m2: f64) -> Self {
        Self {
            valid: true,
            reason: None,
            area_m2,
        }
    }

    fn rejected(reason: ValidationFailure, area_m2: f64) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            area_m2,
        }
    }

    /// Human-readable summary for host UIs.
    pub fn describe(&self) -> String {
        match &self.reason {
            None => format!("valid territory of {:.1} m²", self.area_m2),
            Some(reason) => reason.to_string(),
        }
    }
}

// =============================================================================
// VALIDATOR
// =============================================================================

/// Orchestrates the four claim checks.
#[derive(Debug, Clone)]
pub struct TerritoryValidator {
    thresholds: ValidationThresholds,
    intersections: SelfIntersectionChecker,
}

impl TerritoryValidator {
    pub fn new(thresholds: ValidationThresholds, closure: &ClosureConfig) -> Self {
        Self {
            thresholds,
            intersections: SelfIntersectionChecker::new(closure.skip_segments),
        }
    }

    pub fn validate(&self, points: &[GeoPoint]) -> ValidationVerdict {
        let verdict = self.run_checks(points);
        match &verdict.reason {
            None => info!(area_m2 = verdict.area_m2, points = points.len(), "territory accepted"),
            Some(reason) => warn!(%reason, points = points.len(), "territory rejected"),
        }
        verdict
    }

    fn run_checks(&self, points: &[GeoPoint]) -> ValidationVerdict {
        let t = &self.thresholds;

        if points.len() < t.min_points {
            return ValidationVerdict::rejected(
                ValidationFailure::TooFewPoints {
                    count: points.len(),
                    required: t.min_points,
                },
                0.0,
            );
        }

        let walked = path_length(points);
        if walked < t.min_distance_m {
            return ValidationVerdict::rejected(
                ValidationFailure::InsufficientDistance {
                    actual: walked,
                    required: t.min_distance_m,
                },
                0.0,
            );
        }

        if self.intersections.has_self_intersection(points) {
            return ValidationVerdict::rejected(ValidationFailure::SelfIntersecting, 0.0);
        }

        let area = polygon_area(points);
        if area < t.min_area_m2 {
            return ValidationVerdict::rejected(
                ValidationFailure::InsufficientArea {
                    actual: area,
                    required: t.min_area_m2,
                },
                area,
            );
        }

        ValidationVerdict::accepted(area)
    }
}

impl Default for TerritoryValidator {
    fn default() -> Self {
        Self::new(ValidationThresholds::default(), &ClosureConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
