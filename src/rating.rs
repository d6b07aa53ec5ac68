use serde::{Deserialize, Serialize};

use crate::models::{Feedback, RatingBucket, RatingField};

/// Rounds `sum / count` half-up to one decimal place.
///
/// Works on the integer sum so that values such as 2.35 round the same way
/// they would on paper. An empty group yields the sentinel `0.0`.
pub fn round_tenth(sum: i64, count: i64) -> f64 {
    if count <= 0 || sum < 0 {
        return 0.0;
    }
    let tenths = (20 * sum + count) / (2 * count);
    tenths as f64 / 10.0
}

/// `part / total * 100`, rounded half-up to a whole percent.
pub fn round_percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let (part, total) = (part as u64, total as u64);
    ((200 * part + total) / (2 * total)) as u32
}

/// Forces rounded percentages to add up to exactly 100.
///
/// Any surplus or shortfall is applied to the largest entry (the first one on
/// ties). All-zero input is left untouched.
pub fn settle_percentages(values: &mut [u32]) {
    let sum: i64 = values.iter().map(|value| *value as i64).sum();
    if sum == 0 || sum == 100 {
        return;
    }

    let mut largest = 0;
    for (index, value) in values.iter().enumerate() {
        if *value > values[largest] {
            largest = index;
        }
    }

    let adjusted = values[largest] as i64 + (100 - sum);
    values[largest] = adjusted.max(0) as u32;
}

/// Mean of the valid ratings in `field`, rounded to one decimal.
///
/// Feedback without a usable rating is skipped rather than counted as zero.
/// Returns `0.0` when nothing is left, which callers must read as
/// "insufficient data".
pub fn average_rating<'a, I>(feedbacks: I, field: RatingField) -> f64
where
    I: IntoIterator<Item = &'a Feedback>,
{
    let (sum, count) = feedbacks
        .into_iter()
        .filter_map(|feedback| feedback.rating(field))
        .fold((0i64, 0i64), |(sum, count), rating| {
            (sum + rating as i64, count + 1)
        });
    round_tenth(sum, count)
}

/// Number of feedback items carrying a valid overall rating.
pub fn rated_count<'a, I>(feedbacks: I) -> usize
where
    I: IntoIterator<Item = &'a Feedback>,
{
    feedbacks
        .into_iter()
        .filter(|feedback| feedback.rating(RatingField::Overall).is_some())
        .count()
}

/// Five buckets, 1 through 5, always present.
pub fn rating_distribution<'a, I>(feedbacks: I) -> Vec<RatingBucket>
where
    I: IntoIterator<Item = &'a Feedback>,
{
    let mut counts = [0usize; 5];
    for rating in feedbacks
        .into_iter()
        .filter_map(|feedback| feedback.rating(RatingField::Overall))
    {
        counts[(rating - 1) as usize] += 1;
    }

    let total: usize = counts.iter().sum();
    let mut percentages: Vec<u32> = counts
        .iter()
        .map(|count| round_percent(*count, total))
        .collect();
    settle_percentages(&mut percentages);

    counts
        .iter()
        .zip(percentages)
        .enumerate()
        .map(|(index, (count, percentage))| RatingBucket {
            bucket: index as i32 + 1,
            count: *count,
            percentage,
        })
        .collect()
}

/// How a missing sub-rating enters the comprehensive score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSubRating {
    /// Missing fields count as 0 and the mean is always taken over five.
    /// This penalises partially completed forms.
    #[default]
    CountAsZero,
    /// Missing fields are left out of the per-feedback mean.
    Exclude,
}

/// Unrounded comprehensive score of one feedback item.
///
/// `None` when none of the five rating fields is usable.
pub fn comprehensive_score(feedback: &Feedback, policy: MissingSubRating) -> Option<f64> {
    let present: Vec<i32> = RatingField::ALL
        .iter()
        .filter_map(|field| feedback.rating(*field))
        .collect();
    if present.is_empty() {
        return None;
    }

    let sum: i32 = present.iter().sum();
    let divisor = match policy {
        MissingSubRating::CountAsZero => RatingField::ALL.len(),
        MissingSubRating::Exclude => present.len(),
    };
    Some(sum as f64 / divisor as f64)
}

/// Comprehensive score averaged over a lecturer's feedback, one decimal.
pub fn lecturer_comprehensive_score<'a, I>(feedbacks: I, policy: MissingSubRating) -> f64
where
    I: IntoIterator<Item = &'a Feedback>,
{
    match policy {
        MissingSubRating::CountAsZero => {
            // Every contributing item has divisor 5, so the whole average is
            // one integer ratio.
            let (sum, count) = feedbacks
                .into_iter()
                .filter(|feedback| comprehensive_score(feedback, policy).is_some())
                .fold((0i64, 0i64), |(sum, count), feedback| {
                    let item: i64 = RatingField::ALL
                        .iter()
                        .filter_map(|field| feedback.rating(*field))
                        .map(i64::from)
                        .sum();
                    (sum + item, count + 1)
                });
            round_tenth(sum, count * RatingField::ALL.len() as i64)
        }
        MissingSubRating::Exclude => {
            let scores: Vec<f64> = feedbacks
                .into_iter()
                .filter_map(|feedback| comprehensive_score(feedback, policy))
                .collect();
            if scores.is_empty() {
                return 0.0;
            }
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            ((mean * 10.0 + 0.5 + 1e-9).floor() / 10.0).max(0.0)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    pub(crate) fn rated(overall: Option<i32>) -> Feedback {
        Feedback {
            id: Uuid::new_v4(),
            course_offering_id: Uuid::nil(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
            overall_rating: overall,
            teaching_effectiveness: None,
            course_content: None,
            communication: None,
            availability: None,
            category_id: None,
            comments: None,
            suggestions: None,
        }
    }

    fn full(overall: i32, subs: [Option<i32>; 4]) -> Feedback {
        let mut feedback = rated(Some(overall));
        feedback.teaching_effectiveness = subs[0];
        feedback.course_content = subs[1];
        feedback.communication = subs[2];
        feedback.availability = subs[3];
        feedback
    }

    #[test]
    fn round_tenth_is_half_up() {
        assert_eq!(round_tenth(9, 3), 3.0);
        assert_eq!(round_tenth(47, 20), 2.4);
        assert_eq!(round_tenth(0, 5), 0.0);
        assert_eq!(round_tenth(17, 4), 4.3);
        assert_eq!(round_tenth(3, 0), 0.0);
    }

    #[test]
    fn average_skips_missing_ratings() {
        let feedback = vec![rated(Some(5)), rated(Some(3)), rated(None), rated(Some(1))];
        assert_eq!(average_rating(&feedback, RatingField::Overall), 3.0);
    }

    #[test]
    fn average_of_nothing_is_zero() {
        let empty: Vec<Feedback> = Vec::new();
        assert_eq!(average_rating(&empty, RatingField::Overall), 0.0);

        let unrated = vec![rated(None), rated(Some(0)), rated(Some(9))];
        assert_eq!(average_rating(&unrated, RatingField::Overall), 0.0);
    }

    #[test]
    fn average_reads_the_requested_field() {
        let feedback = vec![
            full(5, [Some(2), None, None, None]),
            full(4, [Some(3), None, None, None]),
        ];
        assert_eq!(average_rating(&feedback, RatingField::TeachingEffectiveness), 2.5);
        assert_eq!(average_rating(&feedback, RatingField::Availability), 0.0);
    }

    #[test]
    fn distribution_settles_thirds_on_the_first_largest_bucket() {
        let feedback = vec![rated(Some(5)), rated(Some(3)), rated(None), rated(Some(1))];
        let buckets = rating_distribution(&feedback);

        let shape: Vec<(i32, usize, u32)> = buckets
            .iter()
            .map(|bucket| (bucket.bucket, bucket.count, bucket.percentage))
            .collect();
        assert_eq!(
            shape,
            vec![(1, 1, 34), (2, 0, 0), (3, 1, 33), (4, 0, 0), (5, 1, 33)]
        );
    }

    #[test]
    fn distribution_always_has_five_buckets() {
        let empty: Vec<Feedback> = Vec::new();
        let buckets = rating_distribution(&empty);
        assert_eq!(buckets.len(), 5);
        assert!(buckets.iter().all(|bucket| bucket.count == 0 && bucket.percentage == 0));

        let feedback: Vec<Feedback> = [1, 2, 2, 4, 4, 4, 5]
            .iter()
            .map(|rating| rated(Some(*rating)))
            .collect();
        let buckets = rating_distribution(&feedback);
        assert_eq!(buckets.iter().map(|bucket| bucket.count).sum::<usize>(), 7);
        assert_eq!(buckets.iter().map(|bucket| bucket.percentage).sum::<u32>(), 100);
    }

    #[test]
    fn settle_trims_surplus_from_largest() {
        let mut values = vec![50, 17, 17, 17];
        settle_percentages(&mut values);
        assert_eq!(values, vec![49, 17, 17, 17]);

        let mut untouched = vec![0, 0, 0];
        settle_percentages(&mut untouched);
        assert_eq!(untouched, vec![0, 0, 0]);
    }

    #[test]
    fn comprehensive_counts_missing_sub_ratings_as_zero() {
        let complete = full(5, [Some(5), Some(5), Some(5), Some(5)]);
        let partial = full(5, [Some(5), None, None, None]);

        assert_eq!(
            comprehensive_score(&complete, MissingSubRating::CountAsZero),
            Some(5.0)
        );
        assert_eq!(
            comprehensive_score(&partial, MissingSubRating::CountAsZero),
            Some(2.0)
        );
        assert_eq!(
            comprehensive_score(&partial, MissingSubRating::Exclude),
            Some(5.0)
        );
        assert_eq!(
            comprehensive_score(&rated(None), MissingSubRating::CountAsZero),
            None
        );
    }

    #[test]
    fn lecturer_comprehensive_averages_per_feedback_scores() {
        let feedback = vec![
            full(5, [Some(4), Some(4), Some(5), Some(3)]),
            full(3, [Some(3), None, Some(2), Some(4)]),
            rated(None),
        ];
        // (21 + 12) / 10 = 3.3
        assert_eq!(
            lecturer_comprehensive_score(&feedback, MissingSubRating::CountAsZero),
            3.3
        );
        // (4.2 + 3.0) / 2 = 3.6
        assert_eq!(
            lecturer_comprehensive_score(&feedback, MissingSubRating::Exclude),
            3.6
        );

        let empty: Vec<Feedback> = Vec::new();
        assert_eq!(
            lecturer_comprehensive_score(&empty, MissingSubRating::CountAsZero),
            0.0
        );
    }
}
