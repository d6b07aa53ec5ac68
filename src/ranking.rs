use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PolicyError;
use crate::models::{Course, Department, DepartmentRating, Feedback, Lecturer, RankedEntity, RatingField};
use crate::rating::round_tenth;

/// Anything that can be ranked needs a name to break ties on.
pub trait Named {
    fn sort_name(&self) -> String;
}

impl Named for Lecturer {
    fn sort_name(&self) -> String {
        self.full_name()
    }
}

impl Named for Course {
    fn sort_name(&self) -> String {
        self.name.clone()
    }
}

impl Named for Department {
    fn sort_name(&self) -> String {
        self.name.clone()
    }
}

/// Ranks `entities` by the average overall rating of the feedback
/// `attributable` assigns to them.
///
/// Entities with no attributable feedback are left out. `feedback_count`
/// counts every attributable item; the average covers valid ratings only and
/// is the sentinel 0 when there are none. Order is average rating descending,
/// then feedback count descending, then name ascending. `feedbacks` may hold
/// owned records or references to them.
pub fn rank_by_average_rating<E, T, F>(
    entities: &[E],
    feedbacks: &[T],
    attributable: F,
    top_n: Option<usize>,
) -> Vec<RankedEntity<E>>
where
    E: Named + Clone,
    T: Borrow<Feedback>,
    F: Fn(&E, &Feedback) -> bool,
{
    let mut ranked: Vec<(String, RankedEntity<E>)> = Vec::new();

    for entity in entities {
        let (attributed, sum, rated) = feedbacks
            .iter()
            .map(Borrow::<Feedback>::borrow)
            .filter(|feedback| attributable(entity, *feedback))
            .fold((0usize, 0i64, 0i64), |(attributed, sum, rated), feedback| {
                match feedback.rating(RatingField::Overall) {
                    Some(rating) => (attributed + 1, sum + rating as i64, rated + 1),
                    None => (attributed + 1, sum, rated),
                }
            });
        if attributed == 0 {
            continue;
        }

        ranked.push((
            entity.sort_name(),
            RankedEntity {
                entity: entity.clone(),
                avg_rating: round_tenth(sum, rated),
                feedback_count: attributed,
            },
        ));
    }

    ranked.sort_by(|(a_name, a), (b_name, b)| {
        b.avg_rating
            .partial_cmp(&a.avg_rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.feedback_count.cmp(&a.feedback_count))
            .then_with(|| a_name.cmp(b_name))
    });

    let mut values: Vec<RankedEntity<E>> = ranked.into_iter().map(|(_, entry)| entry).collect();
    if let Some(limit) = top_n {
        values.truncate(limit);
    }
    values
}

/// Mean of the ranked lecturers' averages per department, one decimal.
///
/// Lecturers at the sentinel 0 (no valid rating) are left out. Departments
/// appear in the order given; those with no remaining lecturer are skipped.
pub fn department_ratings(
    lecturers: &[RankedEntity<Lecturer>],
    departments: &[Department],
) -> Vec<DepartmentRating> {
    let mut tenths: HashMap<Uuid, (i64, usize)> = HashMap::new();
    for ranked in lecturers.iter().filter(|ranked| ranked.avg_rating > 0.0) {
        let Some(department_id) = ranked.entity.department_id else {
            continue;
        };
        let entry = tenths.entry(department_id).or_insert((0, 0));
        entry.0 += (ranked.avg_rating * 10.0).round() as i64;
        entry.1 += 1;
    }

    departments
        .iter()
        .filter_map(|department| {
            let (sum, count) = tenths.get(&department.id)?;
            Some(DepartmentRating {
                department_name: department.name.clone(),
                rating: round_tenth(*sum, *count as i64 * 10),
                lecturer_count: *count,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceBand {
    Excellent,
    Good,
    Average,
    Poor,
}

impl PerformanceBand {
    pub fn label(self) -> &'static str {
        match self {
            PerformanceBand::Excellent => "Excellent",
            PerformanceBand::Good => "Good",
            PerformanceBand::Average => "Average",
            PerformanceBand::Poor => "Poor",
        }
    }
}

impl fmt::Display for PerformanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower bounds (inclusive) of the three upper bands. Anything below
/// `average` is poor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPolicy {
    pub excellent: f64,
    pub good: f64,
    pub average: f64,
}

impl BandPolicy {
    /// 4.5 / 4.0 / 3.0.
    pub const STANDARD: BandPolicy = BandPolicy {
        excellent: 4.5,
        good: 4.0,
        average: 3.0,
    };

    /// "High performer" counting: 4.0 and up is excellent, under 3.0 is poor.
    /// The good band is empty.
    pub const HIGH_PERFORMER: BandPolicy = BandPolicy {
        excellent: 4.0,
        good: 4.0,
        average: 3.0,
    };

    pub fn new(excellent: f64, good: f64, average: f64) -> Result<Self, PolicyError> {
        for (name, value) in [("excellent", excellent), ("good", good), ("average", average)] {
            if !value.is_finite() || !(0.0..=5.0).contains(&value) {
                return Err(PolicyError::OutOfRange { name, value });
            }
        }
        if excellent < good || good < average {
            return Err(PolicyError::NotDescending {
                excellent,
                good,
                average,
            });
        }
        Ok(Self {
            excellent,
            good,
            average,
        })
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        Self::new(self.excellent, self.good, self.average).map(|_| ())
    }

    pub fn band(&self, avg_rating: f64) -> PerformanceBand {
        if avg_rating >= self.excellent {
            PerformanceBand::Excellent
        } else if avg_rating >= self.good {
            PerformanceBand::Good
        } else if avg_rating >= self.average {
            PerformanceBand::Average
        } else {
            PerformanceBand::Poor
        }
    }
}

impl Default for BandPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

pub fn performance_band(avg_rating: f64, policy: &BandPolicy) -> PerformanceBand {
    policy.band(avg_rating)
}

pub fn count_in_band<I>(ratings: I, policy: &BandPolicy, band: PerformanceBand) -> usize
where
    I: IntoIterator<Item = f64>,
{
    ratings
        .into_iter()
        .filter(|rating| policy.band(*rating) == band)
        .count()
}
