use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    #[serde(default)]
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub enrollment_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lecturer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub department_id: Option<Uuid>,
    #[serde(default = "active")]
    pub is_active: bool,
}

impl Lecturer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub credits: i32,
    /// Numeric level, e.g. 100 through 400.
    #[serde(default)]
    pub level: i32,
    #[serde(default = "active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOffering {
    pub id: Uuid,
    pub course_id: Uuid,
    #[serde(default)]
    pub lecturer_id: Option<Uuid>,
    #[serde(default)]
    pub semester_id: Option<Uuid>,
    #[serde(default)]
    pub enrolled_count: i32,
    #[serde(default = "active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicSemester {
    pub id: Uuid,
    pub name: String,
    pub academic_year: String,
    #[serde(default)]
    pub is_current: bool,
}

/// A single student's rating submission for one course offering.
///
/// Rating columns are kept as raw integers. Values outside `1..=5` are
/// treated as absent by every aggregation; see [`crate::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub course_offering_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub overall_rating: Option<i32>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub teaching_effectiveness: Option<i32>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub course_content: Option<i32>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub communication: Option<i32>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub availability: Option<i32>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub suggestions: Option<String>,
}

/// Which rating column an aggregation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingField {
    Overall,
    TeachingEffectiveness,
    CourseContent,
    Communication,
    Availability,
}

impl RatingField {
    pub const ALL: [RatingField; 5] = [
        RatingField::Overall,
        RatingField::TeachingEffectiveness,
        RatingField::CourseContent,
        RatingField::Communication,
        RatingField::Availability,
    ];

    pub fn column(self) -> &'static str {
        match self {
            RatingField::Overall => "overall_rating",
            RatingField::TeachingEffectiveness => "teaching_effectiveness",
            RatingField::CourseContent => "course_content",
            RatingField::Communication => "communication",
            RatingField::Availability => "availability",
        }
    }
}

impl Feedback {
    pub fn raw_rating(&self, field: RatingField) -> Option<i32> {
        match field {
            RatingField::Overall => self.overall_rating,
            RatingField::TeachingEffectiveness => self.teaching_effectiveness,
            RatingField::CourseContent => self.course_content,
            RatingField::Communication => self.communication,
            RatingField::Availability => self.availability,
        }
    }

    /// The rating for `field` if it is present and inside `1..=5`.
    pub fn rating(&self, field: RatingField) -> Option<i32> {
        self.raw_rating(field).filter(|value| (1..=5).contains(value))
    }
}

fn active() -> bool {
    true
}

/// Accepts integers (and integral floats) and maps anything else to `None`,
/// so one bad cell in an exported snapshot does not reject the whole file.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Number(number)) => {
            if let Some(int) = number.as_i64() {
                i32::try_from(int).ok()
            } else {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0 && float.abs() <= i32::MAX as f64)
                    .map(|float| float as i32)
            }
        }
        Some(other) => {
            tracing::warn!(value = %other, "dropping non-numeric rating");
            None
        }
    })
}

/// Every entity collection the dashboard reads, fetched in one go.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub lecturers: Vec<Lecturer>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub offerings: Vec<CourseOffering>,
    #[serde(default)]
    pub semesters: Vec<AcademicSemester>,
    #[serde(default)]
    pub feedback: Vec<Feedback>,
}

impl Snapshot {
    pub fn current_semester(&self) -> Option<&AcademicSemester> {
        self.semesters.iter().find(|semester| semester.is_current)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub department_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBucket {
    pub bucket: i32,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    pub month_label: String,
    pub count: usize,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentPoint {
    pub month_label: String,
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntity<E> {
    pub entity: E,
    pub avg_rating: f64,
    pub feedback_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category_id: Option<Uuid>,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRating {
    pub department_name: String,
    pub rating: f64,
    pub lecturer_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_lecturers: usize,
    pub total_students: usize,
    pub total_courses: usize,
    pub active_departments: usize,
    pub total_feedback: usize,
    /// Feedback created in the calendar month of `as_of`.
    pub feedback_this_month: usize,
    pub avg_rating: f64,
    /// Best rated department, if any department has feedback.
    pub top_department: Option<String>,
    pub as_of: NaiveDate,
}
