use chrono::{Duration, Utc};
use feedback_analytics::models::{
    AcademicSemester, Course, CourseOffering, Department, Feedback, Lecturer, Snapshot, Student,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let computing = Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?;
    let engineering = Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?;
    let business = Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?;

    for (id, name) in [
        (computing, "Computer Science"),
        (engineering, "Electrical Engineering"),
        (business, "Business"),
    ] {
        sqlx::query(
            r#"
            INSERT INTO departments (id, department_name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET department_name = EXCLUDED.department_name
            "#,
        )
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let lecturers = [
        (Uuid::from_u128(0x1001), "Sarah", "Johnson", computing),
        (Uuid::from_u128(0x1002), "Michael", "Chen", engineering),
        (Uuid::from_u128(0x1003), "Emily", "Williams", business),
        (Uuid::from_u128(0x1004), "David", "Brown", computing),
    ];
    for (id, first_name, last_name, department_id) in lecturers {
        sqlx::query(
            r#"
            INSERT INTO lecturers (id, first_name, last_name, department_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(department_id)
        .execute(pool)
        .await?;
    }

    let courses = [
        (Uuid::from_u128(0x2001), "CS201", "Data Structures & Algorithms", computing, 200),
        (Uuid::from_u128(0x2002), "EE301", "Circuit Design Fundamentals", engineering, 300),
        (Uuid::from_u128(0x2003), "BUS401", "Digital Marketing Strategy", business, 400),
        (Uuid::from_u128(0x2004), "CS401", "Machine Learning Applications", computing, 400),
    ];
    for (id, code, name, department_id, level) in courses {
        sqlx::query(
            r#"
            INSERT INTO courses (id, course_code, course_name, department_id, course_level)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(name)
        .bind(department_id)
        .bind(level)
        .execute(pool)
        .await?;
    }

    let semester = Uuid::from_u128(0x3001);
    sqlx::query(
        r#"
        INSERT INTO academic_semesters (id, semester_name, academic_year, is_current)
        VALUES ($1, 'Fall', '2026/2027', TRUE)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(semester)
    .execute(pool)
    .await?;

    for index in 0..4u128 {
        sqlx::query(
            r#"
            INSERT INTO course_offerings (id, course_id, lecturer_id, semester_id, enrolled_count)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::from_u128(0x4001 + index))
        .bind(Uuid::from_u128(0x2001 + index))
        .bind(Uuid::from_u128(0x1001 + index))
        .bind(semester)
        .bind(60 + index as i32 * 10)
        .execute(pool)
        .await?;
    }

    for (index, status) in ["Active", "Active", "Active", "Suspended", "Graduated"]
        .iter()
        .enumerate()
    {
        let department_id = [computing, engineering, business][index % 3];
        sqlx::query(
            r#"
            INSERT INTO students (id, department_id, student_status, enrollment_year)
            VALUES ($1, $2, $3, 2025)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::from_u128(0x5001 + index as u128))
        .bind(department_id)
        .bind(*status)
        .execute(pool)
        .await?;
    }

    // (offering, days ago, overall, teaching, content, communication, availability)
    let ratings: [(u128, i64, i32, i32, i32, i32, i32); 10] = [
        (0x4001, 3, 5, 5, 4, 5, 4),
        (0x4001, 40, 4, 5, 4, 4, 4),
        (0x4002, 10, 3, 3, 2, 3, 2),
        (0x4002, 75, 2, 2, 3, 2, 1),
        (0x4003, 20, 4, 4, 4, 5, 4),
        (0x4003, 100, 5, 4, 5, 4, 5),
        (0x4004, 5, 5, 5, 5, 5, 5),
        (0x4004, 60, 5, 5, 4, 5, 5),
        (0x4004, 130, 4, 4, 4, 4, 3),
        (0x4002, 150, 3, 3, 3, 4, 3),
    ];
    for (index, (offering, days_ago, overall, teaching, content, communication, availability)) in
        ratings.into_iter().enumerate()
    {
        sqlx::query(
            r#"
            INSERT INTO feedback
            (id, course_offering_id, created_at, overall_rating, teaching_effectiveness,
             course_content, communication, availability)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::from_u128(0x6001 + index as u128))
        .bind(Uuid::from_u128(offering))
        .bind(Utc::now() - Duration::days(days_ago))
        .bind(overall)
        .bind(teaching)
        .bind(content)
        .bind(communication)
        .bind(availability)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_departments(pool: &PgPool) -> anyhow::Result<Vec<Department>> {
    let rows = sqlx::query(
        "SELECT id, department_name, is_active FROM departments \
         WHERE is_active = TRUE ORDER BY department_name",
    )
    .fetch_all(pool)
    .await?;

    let mut departments = Vec::new();
    for row in rows {
        departments.push(Department {
            id: row.try_get("id")?,
            name: row.try_get("department_name")?,
            is_active: row.try_get("is_active")?,
        });
    }
    Ok(departments)
}

pub async fn fetch_students(pool: &PgPool) -> anyhow::Result<Vec<Student>> {
    let rows = sqlx::query(
        "SELECT id, department_id, student_status, enrollment_year, is_active FROM students \
         WHERE is_active = TRUE ORDER BY first_name",
    )
    .fetch_all(pool)
    .await?;

    let mut students = Vec::new();
    for row in rows {
        students.push(Student {
            id: row.try_get("id")?,
            department_id: row.try_get("department_id")?,
            status: row.try_get("student_status")?,
            is_active: row.try_get("is_active")?,
            enrollment_year: row.try_get("enrollment_year")?,
        });
    }
    Ok(students)
}

pub async fn fetch_lecturers(pool: &PgPool) -> anyhow::Result<Vec<Lecturer>> {
    let rows = sqlx::query(
        "SELECT id, first_name, last_name, department_id, is_active FROM lecturers \
         WHERE is_active = TRUE ORDER BY first_name",
    )
    .fetch_all(pool)
    .await?;

    let mut lecturers = Vec::new();
    for row in rows {
        lecturers.push(Lecturer {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            department_id: row.try_get("department_id")?,
            is_active: row.try_get("is_active")?,
        });
    }
    Ok(lecturers)
}

pub async fn fetch_courses(pool: &PgPool) -> anyhow::Result<Vec<Course>> {
    let rows = sqlx::query(
        "SELECT id, course_code, course_name, department_id, credits, course_level, is_active \
         FROM courses WHERE is_active = TRUE ORDER BY course_code",
    )
    .fetch_all(pool)
    .await?;

    let mut courses = Vec::new();
    for row in rows {
        courses.push(Course {
            id: row.try_get("id")?,
            code: row.try_get("course_code")?,
            name: row.try_get("course_name")?,
            department_id: row.try_get("department_id")?,
            credits: row.try_get("credits")?,
            level: row.try_get("course_level")?,
            is_active: row.try_get("is_active")?,
        });
    }
    Ok(courses)
}

pub async fn fetch_offerings(pool: &PgPool) -> anyhow::Result<Vec<CourseOffering>> {
    let rows = sqlx::query(
        "SELECT id, course_id, lecturer_id, semester_id, enrolled_count, is_active \
         FROM course_offerings",
    )
    .fetch_all(pool)
    .await?;

    let mut offerings = Vec::new();
    for row in rows {
        offerings.push(CourseOffering {
            id: row.try_get("id")?,
            course_id: row.try_get("course_id")?,
            lecturer_id: row.try_get("lecturer_id")?,
            semester_id: row.try_get("semester_id")?,
            enrolled_count: row.try_get("enrolled_count")?,
            is_active: row.try_get("is_active")?,
        });
    }
    Ok(offerings)
}

fn semester_from_row(row: &PgRow) -> Result<AcademicSemester, sqlx::Error> {
    Ok(AcademicSemester {
        id: row.try_get("id")?,
        name: row.try_get("semester_name")?,
        academic_year: row.try_get("academic_year")?,
        is_current: row.try_get("is_current")?,
    })
}

pub async fn fetch_semesters(pool: &PgPool) -> anyhow::Result<Vec<AcademicSemester>> {
    let rows = sqlx::query(
        "SELECT id, semester_name, academic_year, is_current FROM academic_semesters \
         ORDER BY academic_year DESC, semester_name",
    )
    .fetch_all(pool)
    .await?;

    let mut semesters = Vec::new();
    for row in rows {
        semesters.push(semester_from_row(&row)?);
    }
    Ok(semesters)
}

pub async fn fetch_feedback(pool: &PgPool) -> anyhow::Result<Vec<Feedback>> {
    let rows = sqlx::query(
        "SELECT id, course_offering_id, created_at, overall_rating, teaching_effectiveness, \
         course_content, communication, availability, category_id, comments, suggestions \
         FROM feedback ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut feedback = Vec::new();
    for row in rows {
        feedback.push(Feedback {
            id: row.try_get("id")?,
            course_offering_id: row.try_get("course_offering_id")?,
            created_at: row.try_get("created_at")?,
            overall_rating: row.try_get("overall_rating")?,
            teaching_effectiveness: row.try_get("teaching_effectiveness")?,
            course_content: row.try_get("course_content")?,
            communication: row.try_get("communication")?,
            availability: row.try_get("availability")?,
            category_id: row.try_get("category_id")?,
            comments: row.try_get("comments")?,
            suggestions: row.try_get("suggestions")?,
        });
    }
    Ok(feedback)
}

/// Fetches every collection the dashboard needs.
pub async fn load_snapshot(pool: &PgPool) -> anyhow::Result<Snapshot> {
    let (departments, students, lecturers, courses, offerings, semesters, feedback) = tokio::try_join!(
        fetch_departments(pool),
        fetch_students(pool),
        fetch_lecturers(pool),
        fetch_courses(pool),
        fetch_offerings(pool),
        fetch_semesters(pool),
        fetch_feedback(pool),
    )?;

    debug!(
        departments = departments.len(),
        students = students.len(),
        lecturers = lecturers.len(),
        courses = courses.len(),
        offerings = offerings.len(),
        feedback = feedback.len(),
        "loaded snapshot"
    );

    Ok(Snapshot {
        departments,
        students,
        lecturers,
        courses,
        offerings,
        semesters,
        feedback,
    })
}
