use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("band threshold `{name}` must be a finite value between 0 and 5, got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("band thresholds must not increase: excellent {excellent} >= good {good} >= average {average}")]
    NotDescending {
        excellent: f64,
        good: f64,
        average: f64,
    },
}
