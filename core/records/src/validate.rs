//! FILENAME: core/records/src/validate.rs
//! Consistency checks for the grid dataset.
//!
//! Findings are warnings only. The data is still loaded and usable; locations
//! without a region fall into the unknown bucket during roll-up.

use serde::{Deserialize, Serialize};

use crate::grid::GridDataset;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationWarning {
    /// `feature_count` disagrees with the number of published locations.
    CountMismatch { operator_id: String, declared: usize, actual: usize },
    /// Operator publishes no locations.
    EmptyOperator { operator_id: String },
    MissingFylke { operator_id: String, location: String },
    MissingKommune { operator_id: String, location: String },
    /// A capacity value is NaN or infinite.
    NonFiniteCapacity { operator_id: String, location: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub operators_checked: usize,
    pub locations_checked: usize,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl GridDataset {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (id, operator) in &self.operators {
            report.operators_checked += 1;
            let actual = operator.locations.len();

            if actual == 0 {
                report.warnings.push(ValidationWarning::EmptyOperator { operator_id: id.clone() });
            }
            if operator.location_count != actual {
                report.warnings.push(ValidationWarning::CountMismatch {
                    operator_id: id.clone(),
                    declared: operator.location_count,
                    actual,
                });
            }

            for location in &operator.locations {
                report.locations_checked += 1;
                if location.fylke.is_none() {
                    report.warnings.push(ValidationWarning::MissingFylke {
                        operator_id: id.clone(),
                        location: location.name.clone(),
                    });
                }
                if location.kommune.is_none() {
                    report.warnings.push(ValidationWarning::MissingKommune {
                        operator_id: id.clone(),
                        location: location.name.clone(),
                    });
                }
                let finite = location.available_consumption.is_finite()
                    && location.reserved_consumption.is_finite()
                    && location.available_production.is_finite();
                if !finite {
                    report.warnings.push(ValidationWarning::NonFiniteCapacity {
                        operator_id: id.clone(),
                        location: location.name.clone(),
                    });
                }
            }
        }

        if !report.is_clean() {
            log::warn!(
                "grid validation: {} warnings across {} locations",
                report.warnings.len(),
                report.locations_checked
            );
        }
        report
    }
}
