use std::collections::HashMap;
use std::fmt::Write;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{Catalog, FeedbackScope};
use crate::distribution::{
    category_breakdown, count_by_status, distribution_by_department, DepartmentOrder,
    EmptyDepartments,
};
use crate::models::{
    CategoryCount, DashboardStats, DepartmentCount, DepartmentRating, Feedback, Lecturer,
    MonthlyPoint, RankedEntity, RatingBucket, RatingField, SentimentPoint, Snapshot, StatusCount,
};
use crate::rating::{average_rating, lecturer_comprehensive_score, rating_distribution, MissingSubRating};
use crate::ranking::{
    count_in_band, department_ratings, rank_by_average_rating, BandPolicy, PerformanceBand,
};
use crate::trend::{monthly_trend, sentiment_trend, SentimentScale, DEFAULT_MONTHS_BACK};

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub months_back: usize,
    pub volume_months: usize,
    pub top_n: usize,
    pub bands: BandPolicy,
    pub high_performer: BandPolicy,
    pub missing_sub_rating: MissingSubRating,
    pub scope: FeedbackScope,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            months_back: DEFAULT_MONTHS_BACK,
            volume_months: 12,
            top_n: 8,
            bands: BandPolicy::STANDARD,
            high_performer: BandPolicy::HIGH_PERFORMER,
            missing_sub_rating: MissingSubRating::default(),
            scope: FeedbackScope::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LecturerRow {
    pub id: Uuid,
    pub name: String,
    pub department_name: Option<String>,
    pub avg_rating: f64,
    pub feedback_count: usize,
    pub comprehensive_score: f64,
    /// `None` when the lecturer has no valid rating to band.
    pub band: Option<PerformanceBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub department_name: Option<String>,
    pub level: i32,
    pub avg_rating: f64,
    pub feedback_count: usize,
    pub band: Option<PerformanceBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPerformance {
    pub name: String,
    pub feedback: usize,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub student_status: Vec<StatusCount>,
    pub students_by_department: Vec<DepartmentCount>,
    pub department_performance: Vec<DepartmentPerformance>,
    pub rating_distribution: Vec<RatingBucket>,
    pub feedback_trend: Vec<MonthlyPoint>,
    pub monthly_volume: Vec<MonthlyPoint>,
    pub sentiment_trend: Vec<SentimentPoint>,
    pub categories: Vec<CategoryCount>,
    pub lecturers: Vec<LecturerRow>,
    pub courses: Vec<CourseRow>,
    pub department_ratings: Vec<DepartmentRating>,
    pub high_performers: usize,
    pub needs_attention: usize,
}

/// Headline KPI cards. Only active entities are counted.
///
/// `top_department` is left empty here; [`build_dashboard`] fills it from the
/// department performance ranking.
pub fn dashboard_stats<'a, I>(snapshot: &Snapshot, feedbacks: I, today: NaiveDate) -> DashboardStats
where
    I: IntoIterator<Item = &'a Feedback>,
{
    let feedbacks: Vec<&Feedback> = feedbacks.into_iter().collect();
    let this_month = feedbacks
        .iter()
        .filter(|feedback| {
            let created = feedback.created_at.date_naive();
            created.year() == today.year() && created.month() == today.month()
        })
        .count();

    DashboardStats {
        total_lecturers: snapshot.lecturers.iter().filter(|l| l.is_active).count(),
        total_students: snapshot.students.iter().filter(|s| s.is_active).count(),
        total_courses: snapshot.courses.iter().filter(|c| c.is_active).count(),
        active_departments: snapshot.departments.iter().filter(|d| d.is_active).count(),
        total_feedback: feedbacks.len(),
        feedback_this_month: this_month,
        avg_rating: average_rating(feedbacks.iter().copied(), RatingField::Overall),
        top_department: None,
        as_of: today,
    }
}

/// Band for a ranked average; the sentinel 0 has none.
fn band_of(policy: &BandPolicy, avg_rating: f64) -> Option<PerformanceBand> {
    (avg_rating > 0.0).then(|| policy.band(avg_rating))
}

fn department_names(snapshot: &Snapshot) -> HashMap<Uuid, &str> {
    snapshot
        .departments
        .iter()
        .map(|department| (department.id, department.name.as_str()))
        .collect()
}

fn rank_lecturers(
    snapshot: &Snapshot,
    catalog: &Catalog<'_>,
    feedbacks: &[&Feedback],
) -> Vec<RankedEntity<Lecturer>> {
    let active: Vec<Lecturer> = snapshot
        .lecturers
        .iter()
        .filter(|lecturer| lecturer.is_active)
        .cloned()
        .collect();

    rank_by_average_rating(
        &active,
        feedbacks,
        |lecturer, feedback| catalog.lecturer_id_of(feedback) == Some(lecturer.id),
        None,
    )
}

fn lecturer_row(
    ranked: &RankedEntity<Lecturer>,
    catalog: &Catalog<'_>,
    feedbacks: &[&Feedback],
    names: &HashMap<Uuid, &str>,
    options: &DashboardOptions,
) -> LecturerRow {
    let lecturer = &ranked.entity;
    let own = feedbacks
        .iter()
        .copied()
        .filter(|feedback| catalog.lecturer_id_of(feedback) == Some(lecturer.id));

    LecturerRow {
        id: lecturer.id,
        name: lecturer.full_name(),
        department_name: lecturer
            .department_id
            .and_then(|id| names.get(&id))
            .map(|name| name.to_string()),
        avg_rating: ranked.avg_rating,
        feedback_count: ranked.feedback_count,
        comprehensive_score: lecturer_comprehensive_score(own, options.missing_sub_rating),
        band: band_of(&options.bands, ranked.avg_rating),
    }
}

/// Active lecturers with rated feedback in scope, best first.
pub fn lecturer_rows(
    snapshot: &Snapshot,
    options: &DashboardOptions,
    top_n: Option<usize>,
) -> Vec<LecturerRow> {
    let catalog = Catalog::from_snapshot(snapshot);
    let feedbacks = catalog.scoped(&snapshot.feedback, &options.scope);
    let names = department_names(snapshot);

    rank_lecturers(snapshot, &catalog, &feedbacks)
        .iter()
        .take(top_n.unwrap_or(usize::MAX))
        .map(|ranked| lecturer_row(ranked, &catalog, &feedbacks, &names, options))
        .collect()
}

/// Active courses with rated feedback in scope, best first.
pub fn course_rows(
    snapshot: &Snapshot,
    options: &DashboardOptions,
    top_n: Option<usize>,
) -> Vec<CourseRow> {
    let catalog = Catalog::from_snapshot(snapshot);
    let feedbacks = catalog.scoped(&snapshot.feedback, &options.scope);
    let names = department_names(snapshot);
    let active: Vec<_> = snapshot
        .courses
        .iter()
        .filter(|course| course.is_active)
        .cloned()
        .collect();

    rank_by_average_rating(
        &active,
        &feedbacks,
        |course, feedback| catalog.course_of(feedback).map(|c| c.id) == Some(course.id),
        top_n,
    )
    .into_iter()
    .map(|ranked| CourseRow {
        id: ranked.entity.id,
        code: ranked.entity.code.clone(),
        name: ranked.entity.name.clone(),
        department_name: ranked
            .entity
            .department_id
            .and_then(|id| names.get(&id))
            .map(|name| name.to_string()),
        level: ranked.entity.level,
        avg_rating: ranked.avg_rating,
        feedback_count: ranked.feedback_count,
        band: band_of(&options.bands, ranked.avg_rating),
    })
    .collect()
}

pub fn build_dashboard(snapshot: &Snapshot, today: NaiveDate, options: &DashboardOptions) -> Dashboard {
    let catalog = Catalog::from_snapshot(snapshot);
    let feedbacks = catalog.scoped(&snapshot.feedback, &options.scope);
    let scoped = || feedbacks.iter().copied();

    let active_students: Vec<_> = snapshot
        .students
        .iter()
        .filter(|student| student.is_active)
        .cloned()
        .collect();
    let active_departments: Vec<_> = snapshot
        .departments
        .iter()
        .filter(|department| department.is_active)
        .cloned()
        .collect();

    let department_performance: Vec<DepartmentPerformance> = rank_by_average_rating(
        &active_departments,
        &feedbacks,
        |department, feedback| catalog.department_id_of(feedback) == Some(department.id),
        Some(options.top_n),
    )
    .into_iter()
    .map(|ranked| DepartmentPerformance {
        name: ranked.entity.name,
        feedback: ranked.feedback_count,
        rating: ranked.avg_rating,
    })
    .collect();

    let names = department_names(snapshot);
    let ranked_lecturers = rank_lecturers(snapshot, &catalog, &feedbacks);
    let lecturer_scores: Vec<f64> = ranked_lecturers
        .iter()
        .map(|ranked| ranked.avg_rating)
        .filter(|rating| *rating > 0.0)
        .collect();

    Dashboard {
        stats: DashboardStats {
            top_department: department_performance
                .first()
                .map(|department| department.name.clone()),
            ..dashboard_stats(snapshot, scoped(), today)
        },
        student_status: count_by_status(&active_students),
        students_by_department: distribution_by_department(
            &active_students,
            &active_departments,
            |student| student.department_id,
            DepartmentOrder::InputOrder,
            EmptyDepartments::Omit,
        ),
        department_performance,
        rating_distribution: rating_distribution(scoped()),
        feedback_trend: monthly_trend(scoped(), options.months_back, today),
        monthly_volume: monthly_trend(scoped(), options.volume_months, today),
        sentiment_trend: sentiment_trend(
            scoped(),
            options.months_back,
            today,
            SentimentScale::Percentages,
        ),
        categories: category_breakdown(scoped()),
        department_ratings: department_ratings(&ranked_lecturers, &active_departments),
        high_performers: count_in_band(
            lecturer_scores.iter().copied(),
            &options.high_performer,
            PerformanceBand::Excellent,
        ),
        needs_attention: count_in_band(
            lecturer_scores.iter().copied(),
            &options.high_performer,
            PerformanceBand::Poor,
        ),
        lecturers: ranked_lecturers
            .iter()
            .take(options.top_n)
            .map(|ranked| lecturer_row(ranked, &catalog, &feedbacks, &names, options))
            .collect(),
        courses: course_rows(snapshot, options, Some(options.top_n)),
    }
}

fn rating_label(rating: f64) -> String {
    if rating == 0.0 {
        "n/a".to_string()
    } else {
        format!("{:.1}/5", rating)
    }
}

pub fn band_label(band: Option<PerformanceBand>) -> &'static str {
    band.map_or("unrated", PerformanceBand::label)
}

pub fn render_markdown(dashboard: &Dashboard) -> String {
    let mut output = String::new();
    let stats = &dashboard.stats;

    let _ = writeln!(output, "# Feedback Analytics Dashboard");
    let _ = writeln!(output, "Generated for {}", stats.as_of);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Metrics");
    let _ = writeln!(output, "- Students: {}", stats.total_students);
    let _ = writeln!(output, "- Lecturers: {}", stats.total_lecturers);
    let _ = writeln!(output, "- Active courses: {}", stats.total_courses);
    let _ = writeln!(output, "- Active departments: {}", stats.active_departments);
    let _ = writeln!(output, "- Feedback: {}", stats.total_feedback);
    let _ = writeln!(output, "- Feedback this month: {}", stats.feedback_this_month);
    let _ = writeln!(output, "- Average rating: {}", rating_label(stats.avg_rating));
    let _ = writeln!(
        output,
        "- Top rated department: {}",
        stats.top_department.as_deref().unwrap_or("n/a")
    );
    let _ = writeln!(
        output,
        "- High performers: {} (needing attention: {})",
        dashboard.high_performers, dashboard.needs_attention
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Department Performance");
    if dashboard.department_performance.is_empty() {
        let _ = writeln!(output, "No rated feedback for any department.");
    } else {
        for department in &dashboard.department_performance {
            let _ = writeln!(
                output,
                "- {}: {} across {} feedback",
                department.name,
                rating_label(department.rating),
                department.feedback
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Rating Distribution");
    for bucket in &dashboard.rating_distribution {
        let _ = writeln!(
            output,
            "- {} star{}: {} ({}%)",
            bucket.bucket,
            if bucket.bucket == 1 { "" } else { "s" },
            bucket.count,
            bucket.percentage
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Feedback Trend");
    let _ = writeln!(output, "| Month | Feedback | Avg rating | Positive | Neutral | Negative |");
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for (point, sentiment) in dashboard.feedback_trend.iter().zip(&dashboard.sentiment_trend) {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {}% | {}% | {}% |",
            point.month_label,
            point.count,
            rating_label(point.avg_rating),
            sentiment.positive,
            sentiment.neutral,
            sentiment.negative
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Student Status");
    if dashboard.student_status.is_empty() {
        let _ = writeln!(output, "No active students.");
    } else {
        for status in &dashboard.student_status {
            let _ = writeln!(
                output,
                "- {}: {} ({}%)",
                status.status, status.count, status.percentage
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Lecturers");
    if dashboard.lecturers.is_empty() {
        let _ = writeln!(output, "No lecturers with rated feedback.");
    } else {
        for row in &dashboard.lecturers {
            let _ = writeln!(
                output,
                "- {} ({}) {} from {} feedback, comprehensive {:.1}, {}",
                row.name,
                row.department_name.as_deref().unwrap_or("no department"),
                rating_label(row.avg_rating),
                row.feedback_count,
                row.comprehensive_score,
                band_label(row.band)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Courses");
    if dashboard.courses.is_empty() {
        let _ = writeln!(output, "No courses with rated feedback.");
    } else {
        for row in &dashboard.courses {
            let _ = writeln!(
                output,
                "- {} {}: {} from {} feedback, {}",
                row.code,
                row.name,
                rating_label(row.avg_rating),
                row.feedback_count,
                band_label(row.band)
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, CourseOffering, Department};
    use crate::rating::tests::rated;

    #[test]
    fn empty_snapshot_renders_without_panicking() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let dashboard = build_dashboard(&Snapshot::default(), today, &DashboardOptions::default());

        assert_eq!(dashboard.stats.avg_rating, 0.0);
        assert_eq!(dashboard.feedback_trend.len(), 6);
        assert_eq!(dashboard.monthly_volume.len(), 12);
        assert_eq!(dashboard.rating_distribution.len(), 5);
        assert!(dashboard.lecturers.is_empty());

        let markdown = render_markdown(&dashboard);
        assert!(markdown.contains("Average rating: n/a"));
        assert!(markdown.contains("Top rated department: n/a"));
        assert!(markdown.contains("No lecturers with rated feedback."));
    }

    #[test]
    fn unrated_lecturer_is_listed_without_band_or_attention_flag() {
        let department = Department {
            id: Uuid::from_u128(1),
            name: "Physics".to_string(),
            is_active: true,
        };
        let lecturer = Lecturer {
            id: Uuid::from_u128(2),
            first_name: "Ada".to_string(),
            last_name: "Quill".to_string(),
            department_id: Some(department.id),
            is_active: true,
        };
        let course = Course {
            id: Uuid::from_u128(3),
            code: "PH101".to_string(),
            name: "Mechanics".to_string(),
            department_id: Some(department.id),
            credits: 3,
            level: 100,
            is_active: true,
        };
        let offering = CourseOffering {
            id: Uuid::from_u128(4),
            course_id: course.id,
            lecturer_id: Some(lecturer.id),
            semester_id: None,
            enrolled_count: 30,
            is_active: true,
        };
        let mut feedback = vec![rated(None), rated(None)];
        for item in &mut feedback {
            item.course_offering_id = offering.id;
        }
        let snapshot = Snapshot {
            departments: vec![department],
            lecturers: vec![lecturer],
            courses: vec![course],
            offerings: vec![offering],
            feedback,
            ..Snapshot::default()
        };

        let today = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let dashboard = build_dashboard(&snapshot, today, &DashboardOptions::default());

        assert_eq!(dashboard.lecturers.len(), 1);
        assert_eq!(dashboard.lecturers[0].avg_rating, 0.0);
        assert_eq!(dashboard.lecturers[0].feedback_count, 2);
        assert_eq!(dashboard.lecturers[0].band, None);
        assert_eq!(dashboard.courses[0].band, None);
        assert_eq!(dashboard.needs_attention, 0);
        assert!(dashboard.department_ratings.is_empty());
        assert_eq!(dashboard.stats.feedback_this_month, 2);
        assert_eq!(dashboard.stats.active_departments, 1);
        assert_eq!(dashboard.stats.top_department.as_deref(), Some("Physics"));

        let markdown = render_markdown(&dashboard);
        assert!(markdown.contains("Ada Quill (Physics) n/a from 2 feedback, comprehensive 0.0, unrated"));
    }
}
