use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Course, CourseOffering, Feedback, Snapshot};

/// Resolves the course, lecturer, department and semester a piece of feedback
/// belongs to by following its course offering.
#[derive(Debug, Clone)]
pub struct Catalog<'a> {
    offerings: HashMap<Uuid, &'a CourseOffering>,
    courses: HashMap<Uuid, &'a Course>,
}

/// Narrows feedback to one semester, department or lecturer. Unset fields do
/// not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackScope {
    pub semester_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub lecturer_id: Option<Uuid>,
}

impl FeedbackScope {
    pub fn is_unrestricted(&self) -> bool {
        self.semester_id.is_none() && self.department_id.is_none() && self.lecturer_id.is_none()
    }
}

impl<'a> Catalog<'a> {
    pub fn new(courses: &'a [Course], offerings: &'a [CourseOffering]) -> Self {
        Self {
            offerings: offerings.iter().map(|offering| (offering.id, offering)).collect(),
            courses: courses.iter().map(|course| (course.id, course)).collect(),
        }
    }

    pub fn from_snapshot(snapshot: &'a Snapshot) -> Self {
        Self::new(&snapshot.courses, &snapshot.offerings)
    }

    pub fn offering_of(&self, feedback: &Feedback) -> Option<&'a CourseOffering> {
        self.offerings.get(&feedback.course_offering_id).copied()
    }

    pub fn course_of(&self, feedback: &Feedback) -> Option<&'a Course> {
        let offering = self.offering_of(feedback)?;
        self.courses.get(&offering.course_id).copied()
    }

    pub fn lecturer_id_of(&self, feedback: &Feedback) -> Option<Uuid> {
        self.offering_of(feedback)?.lecturer_id
    }

    pub fn semester_id_of(&self, feedback: &Feedback) -> Option<Uuid> {
        self.offering_of(feedback)?.semester_id
    }

    /// Department of the course the feedback was given for.
    pub fn department_id_of(&self, feedback: &Feedback) -> Option<Uuid> {
        self.course_of(feedback)?.department_id
    }

    pub fn matches(&self, feedback: &Feedback, scope: &FeedbackScope) -> bool {
        let semester_ok = scope
            .semester_id
            .map_or(true, |id| self.semester_id_of(feedback) == Some(id));
        let department_ok = scope
            .department_id
            .map_or(true, |id| self.department_id_of(feedback) == Some(id));
        let lecturer_ok = scope
            .lecturer_id
            .map_or(true, |id| self.lecturer_id_of(feedback) == Some(id));
        semester_ok && department_ok && lecturer_ok
    }

    pub fn scoped<'f>(&self, feedbacks: &'f [Feedback], scope: &FeedbackScope) -> Vec<&'f Feedback> {
        feedbacks
            .iter()
            .filter(|feedback| self.matches(feedback, scope))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::tests::rated;

    fn course(id: u128, department: Option<u128>) -> Course {
        Course {
            id: Uuid::from_u128(id),
            code: format!("C{id}"),
            name: format!("Course {id}"),
            department_id: department.map(Uuid::from_u128),
            credits: 3,
            level: 100,
            is_active: true,
        }
    }

    fn offering(id: u128, course: u128, lecturer: Option<u128>, semester: u128) -> CourseOffering {
        CourseOffering {
            id: Uuid::from_u128(id),
            course_id: Uuid::from_u128(course),
            lecturer_id: lecturer.map(Uuid::from_u128),
            semester_id: Some(Uuid::from_u128(semester)),
            enrolled_count: 30,
            is_active: true,
        }
    }

    fn for_offering(offering: u128) -> Feedback {
        let mut feedback = rated(Some(4));
        feedback.course_offering_id = Uuid::from_u128(offering);
        feedback
    }

    #[test]
    fn follows_offering_to_course_and_department() {
        let courses = vec![course(1, Some(100)), course(2, None)];
        let offerings = vec![offering(10, 1, Some(500), 900), offering(11, 2, None, 901)];
        let catalog = Catalog::new(&courses, &offerings);

        let first = for_offering(10);
        assert_eq!(catalog.course_of(&first).map(|c| c.id), Some(Uuid::from_u128(1)));
        assert_eq!(catalog.department_id_of(&first), Some(Uuid::from_u128(100)));
        assert_eq!(catalog.lecturer_id_of(&first), Some(Uuid::from_u128(500)));

        let second = for_offering(11);
        assert_eq!(catalog.department_id_of(&second), None);
        assert_eq!(catalog.lecturer_id_of(&second), None);

        let orphan = for_offering(99);
        assert!(catalog.course_of(&orphan).is_none());
    }

    #[test]
    fn scope_filters_on_every_set_field() {
        let courses = vec![course(1, Some(100)), course(2, Some(200))];
        let offerings = vec![
            offering(10, 1, Some(500), 900),
            offering(11, 2, Some(500), 901),
            offering(12, 1, Some(501), 901),
        ];
        let catalog = Catalog::new(&courses, &offerings);
        let feedback = vec![for_offering(10), for_offering(11), for_offering(12)];

        let all = catalog.scoped(&feedback, &FeedbackScope::default());
        assert_eq!(all.len(), 3);

        let scope = FeedbackScope {
            semester_id: Some(Uuid::from_u128(901)),
            lecturer_id: Some(Uuid::from_u128(500)),
            ..FeedbackScope::default()
        };
        let narrowed = catalog.scoped(&feedback, &scope);
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].course_offering_id, Uuid::from_u128(11));

        let department = FeedbackScope {
            department_id: Some(Uuid::from_u128(100)),
            ..FeedbackScope::default()
        };
        assert_eq!(catalog.scoped(&feedback, &department).len(), 2);
    }
}
