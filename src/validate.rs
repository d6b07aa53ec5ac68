//! Detection of ratings the aggregations silently ignore.
//!
//! Every aggregation drops a rating outside `1..=5` as if it were missing.
//! Callers that want to know about such records run [`scan_ratings`] with a
//! callback of their own; nothing here logs.

use std::fmt;

use uuid::Uuid;

use crate::models::{Feedback, RatingField};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub feedback_id: Uuid,
    pub field: RatingField,
    pub value: i32,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "feedback {} has {} = {} (expected 1 to 5)",
            self.feedback_id,
            self.field.column(),
            self.value
        )
    }
}

/// Reports every rating field holding a value outside `1..=5` and returns
/// how many were found.
pub fn scan_ratings<'a, I, F>(feedbacks: I, mut report: F) -> usize
where
    I: IntoIterator<Item = &'a Feedback>,
    F: FnMut(Diagnostic),
{
    let mut found = 0;
    for feedback in feedbacks {
        for field in RatingField::ALL {
            let Some(value) = feedback.raw_rating(field) else {
                continue;
            };
            if !(1..=5).contains(&value) {
                found += 1;
                report(Diagnostic {
                    feedback_id: feedback.id,
                    field,
                    value,
                });
            }
        }
    }
    found
}
