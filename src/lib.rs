//! Aggregations behind the university feedback dashboard.
//!
//! Every function here is pure: it takes collections that were already
//! fetched, never fails on missing data, and reports "no data" as zero or as an
//! empty collection.

pub mod catalog;
pub mod dashboard;
pub mod distribution;
pub mod error;
pub mod models;
pub mod ranking;
pub mod rating;
pub mod trend;
pub mod validate;

pub use catalog::{Catalog, FeedbackScope};
pub use distribution::{
    category_breakdown, count_by_status, distribution_by_department, DepartmentOrder,
    EmptyDepartments,
};
pub use error::PolicyError;
pub use ranking::{
    count_in_band, department_ratings, performance_band, rank_by_average_rating, BandPolicy,
    Named, PerformanceBand,
};
pub use rating::{
    average_rating, comprehensive_score, lecturer_comprehensive_score, rating_distribution,
    MissingSubRating,
};
pub use trend::{monthly_trend, sentiment_trend, MonthWindow, Sentiment, SentimentScale};
pub use validate::{scan_ratings, Diagnostic};
