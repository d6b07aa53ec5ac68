use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::models::{Feedback, MonthlyPoint, RatingField, SentimentPoint};
use crate::rating::{round_percent, round_tenth, settle_percentages};

pub const DEFAULT_MONTHS_BACK: usize = 6;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct YearMonth {
    year: i32,
    /// 0-based.
    month0: u32,
}

impl YearMonth {
    fn of(date: impl Datelike) -> Self {
        Self {
            year: date.year(),
            month0: date.month0(),
        }
    }

    fn ordinal(self) -> i64 {
        self.year as i64 * 12 + self.month0 as i64
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month0: ordinal.rem_euclid(12) as u32,
        }
    }
}

/// A contiguous run of calendar months ending with the month of `today`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    months: Vec<YearMonth>,
}

impl MonthWindow {
    pub fn ending_at(today: NaiveDate, months_back: usize) -> Self {
        let last = YearMonth::of(today).ordinal();
        let months = (0..months_back as i64)
            .rev()
            .map(|offset| YearMonth::from_ordinal(last - offset))
            .collect();
        Self { months }
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// True when the window crosses a year boundary.
    pub fn spans_years(&self) -> bool {
        match (self.months.first(), self.months.last()) {
            (Some(first), Some(last)) => first.year != last.year,
            _ => false,
        }
    }

    /// Short month names, with the year appended on every label when the
    /// window crosses a year boundary.
    pub fn labels(&self) -> Vec<String> {
        let with_year = self.spans_years();
        self.months
            .iter()
            .map(|month| {
                let name = MONTH_NAMES[month.month0 as usize];
                if with_year {
                    format!("{} {}", name, month.year)
                } else {
                    name.to_string()
                }
            })
            .collect()
    }

    /// Position of the month containing `at`, or `None` outside the window.
    pub fn slot(&self, at: DateTime<Utc>) -> Option<usize> {
        let first = self.months.first()?.ordinal();
        let offset = YearMonth::of(at).ordinal() - first;
        if offset < 0 || offset >= self.months.len() as i64 {
            return None;
        }
        Some(offset as usize)
    }
}

/// Feedback volume and average overall rating per month.
///
/// Every month of the window is present; a month without feedback reports a
/// count of 0 and the sentinel average 0.
pub fn monthly_trend<'a, I>(feedbacks: I, months_back: usize, today: NaiveDate) -> Vec<MonthlyPoint>
where
    I: IntoIterator<Item = &'a Feedback>,
{
    let window = MonthWindow::ending_at(today, months_back);
    let mut counts = vec![0usize; window.len()];
    let mut sums = vec![(0i64, 0i64); window.len()];

    for feedback in feedbacks {
        let Some(slot) = window.slot(feedback.created_at) else {
            continue;
        };
        counts[slot] += 1;
        if let Some(rating) = feedback.rating(RatingField::Overall) {
            sums[slot].0 += rating as i64;
            sums[slot].1 += 1;
        }
    }

    window
        .labels()
        .into_iter()
        .zip(counts)
        .zip(sums)
        .map(|((month_label, count), (sum, rated))| MonthlyPoint {
            month_label,
            count,
            avg_rating: round_tenth(sum, rated),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// 4 and 5 are positive, 3 neutral, 1 and 2 negative.
    pub fn of(feedback: &Feedback) -> Option<Sentiment> {
        match feedback.rating(RatingField::Overall)? {
            4..=5 => Some(Sentiment::Positive),
            3 => Some(Sentiment::Neutral),
            _ => Some(Sentiment::Negative),
        }
    }
}

/// How [`sentiment_trend`] reports each month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentScale {
    /// Raw feedback counts.
    Counts,
    /// Whole percentages of the month's rated feedback, summing to 100.
    Percentages,
}

pub fn sentiment_trend<'a, I>(
    feedbacks: I,
    months_back: usize,
    today: NaiveDate,
    scale: SentimentScale,
) -> Vec<SentimentPoint>
where
    I: IntoIterator<Item = &'a Feedback>,
{
    let window = MonthWindow::ending_at(today, months_back);
    let mut tallies = vec![[0usize; 3]; window.len()];

    for feedback in feedbacks {
        let (Some(slot), Some(sentiment)) = (window.slot(feedback.created_at), Sentiment::of(feedback))
        else {
            continue;
        };
        let column = match sentiment {
            Sentiment::Positive => 0,
            Sentiment::Neutral => 1,
            Sentiment::Negative => 2,
        };
        tallies[slot][column] += 1;
    }

    window
        .labels()
        .into_iter()
        .zip(tallies)
        .map(|(month_label, tally)| {
            let values = match scale {
                SentimentScale::Counts => tally.map(|count| count as u32),
                SentimentScale::Percentages => {
                    let total: usize = tally.iter().sum();
                    let mut values = tally.map(|count| round_percent(count, total));
                    settle_percentages(&mut values);
                    values
                }
            };
            SentimentPoint {
                month_label,
                positive: values[0],
                neutral: values[1],
                negative: values[2],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::tests::rated;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32, rating: Option<i32>) -> Feedback {
        let mut feedback = rated(rating);
        feedback.created_at = Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap();
        feedback
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    #[test]
    fn window_within_one_year_uses_bare_month_names() {
        let window = MonthWindow::ending_at(today(), 6);
        assert_eq!(window.labels(), vec!["Jan", "Feb", "Mar", "Apr", "May", "Jun"]);
        assert!(!window.spans_years());
    }

    #[test]
    fn window_across_years_labels_every_month_with_year() {
        let window = MonthWindow::ending_at(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(), 4);
        assert_eq!(
            window.labels(),
            vec!["Nov 2025", "Dec 2025", "Jan 2026", "Feb 2026"]
        );
    }

    #[test]
    fn monthly_trend_is_zero_filled_for_empty_input() {
        let empty: Vec<Feedback> = Vec::new();
        let points = monthly_trend(&empty, 6, today());
        assert_eq!(points.len(), 6);
        assert!(points
            .iter()
            .all(|point| point.count == 0 && point.avg_rating == 0.0));
    }

    #[test]
    fn monthly_trend_buckets_and_averages_inside_window() {
        let feedback = vec![
            at(2026, 6, 1, Some(5)),
            at(2026, 6, 30, Some(4)),
            at(2026, 6, 2, None),
            at(2026, 3, 9, Some(2)),
            at(2025, 12, 31, Some(5)),
            at(2026, 7, 1, Some(1)),
        ];

        let points = monthly_trend(&feedback, 6, today());
        let shape: Vec<(&str, usize, f64)> = points
            .iter()
            .map(|point| (point.month_label.as_str(), point.count, point.avg_rating))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("Jan", 0, 0.0),
                ("Feb", 0, 0.0),
                ("Mar", 1, 2.0),
                ("Apr", 0, 0.0),
                ("May", 0, 0.0),
                ("Jun", 3, 4.5),
            ]
        );
    }

    #[test]
    fn sentiment_counts_skip_unrated_feedback() {
        let feedback = vec![
            at(2026, 6, 3, Some(5)),
            at(2026, 6, 4, Some(4)),
            at(2026, 6, 5, Some(3)),
            at(2026, 6, 6, Some(1)),
            at(2026, 6, 7, None),
        ];

        let points = sentiment_trend(&feedback, 2, today(), SentimentScale::Counts);
        assert_eq!(points.len(), 2);
        assert_eq!((points[0].positive, points[0].neutral, points[0].negative), (0, 0, 0));
        assert_eq!((points[1].positive, points[1].neutral, points[1].negative), (2, 1, 1));
    }

    #[test]
    fn sentiment_percentages_always_total_one_hundred() {
        let feedback = vec![
            at(2026, 6, 3, Some(5)),
            at(2026, 6, 4, Some(3)),
            at(2026, 6, 5, Some(2)),
            at(2026, 5, 5, Some(4)),
            at(2026, 5, 6, Some(4)),
        ];

        let points = sentiment_trend(&feedback, 3, today(), SentimentScale::Percentages);
        let totals: Vec<u32> = points
            .iter()
            .map(|point| point.positive + point.neutral + point.negative)
            .collect();
        assert_eq!(totals, vec![0, 100, 100]);
        assert_eq!((points[2].positive, points[2].neutral, points[2].negative), (34, 33, 33));
        assert_eq!(points[1].positive, 100);
    }

    #[test]
    fn sentiment_percentages_trim_rounding_excess_from_largest() {
        let mut feedback = vec![at(2026, 6, 1, Some(1)), at(2026, 6, 2, Some(3))];
        for day in 3..9 {
            feedback.push(at(2026, 6, day, Some(5)));
        }

        // 75 + 12.5 + 12.5 rounds to 75 + 13 + 13.
        let points = sentiment_trend(&feedback, 1, today(), SentimentScale::Percentages);
        assert_eq!((points[0].positive, points[0].neutral, points[0].negative), (74, 13, 13));
    }

    #[test]
    fn trend_functions_are_repeatable() {
        let feedback = vec![at(2026, 5, 5, Some(4)), at(2026, 6, 1, Some(2))];
        assert_eq!(
            monthly_trend(&feedback, 6, today()),
            monthly_trend(&feedback, 6, today())
        );
        assert_eq!(
            sentiment_trend(&feedback, 6, today(), SentimentScale::Percentages),
            sentiment_trend(&feedback, 6, today(), SentimentScale::Percentages)
        );
    }
}
