use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{CategoryCount, Department, DepartmentCount, Feedback, StatusCount, Student};
use crate::rating::{round_percent, settle_percentages};

/// Status assumed for students whose status column is blank.
pub const DEFAULT_STUDENT_STATUS: &str = "Active";

/// How departments are ordered in [`distribution_by_department`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentOrder {
    /// The order of the `departments` slice.
    InputOrder,
    /// Ascending by department id.
    IdAscending,
    /// Largest count first; equal counts keep input order.
    CountDescending,
}

/// Whether departments with no matching items appear in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyDepartments {
    Include,
    #[default]
    Omit,
}

/// Student headcount per status, in order of first appearance, with each
/// status's share of all students passed in.
pub fn count_by_status(students: &[Student]) -> Vec<StatusCount> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<StatusCount> = Vec::new();

    for student in students {
        let status = student
            .status
            .as_deref()
            .filter(|status| !status.trim().is_empty())
            .unwrap_or(DEFAULT_STUDENT_STATUS);

        match positions.get(status) {
            Some(index) => counts[*index].count += 1,
            None => {
                positions.insert(status, counts.len());
                counts.push(StatusCount {
                    status: status.to_string(),
                    count: 1,
                    percentage: 0,
                });
            }
        }
    }

    let mut percentages: Vec<u32> = counts
        .iter()
        .map(|entry| round_percent(entry.count, students.len()))
        .collect();
    settle_percentages(&mut percentages);
    for (entry, percentage) in counts.iter_mut().zip(percentages) {
        entry.percentage = percentage;
    }

    counts
}

/// Counts `items` per department, where `department_of` names the department
/// an item belongs to.
pub fn distribution_by_department<T, F>(
    items: &[T],
    departments: &[Department],
    department_of: F,
    order: DepartmentOrder,
    empty: EmptyDepartments,
) -> Vec<DepartmentCount>
where
    F: Fn(&T) -> Option<Uuid>,
{
    let mut tally: HashMap<Uuid, usize> = HashMap::new();
    for department_id in items.iter().filter_map(&department_of) {
        *tally.entry(department_id).or_default() += 1;
    }

    let mut ordered: Vec<&Department> = departments.iter().collect();
    match order {
        DepartmentOrder::InputOrder => {}
        DepartmentOrder::IdAscending => ordered.sort_by_key(|department| department.id),
        DepartmentOrder::CountDescending => ordered.sort_by(|a, b| {
            let a_count = tally.get(&a.id).copied().unwrap_or(0);
            let b_count = tally.get(&b.id).copied().unwrap_or(0);
            b_count.cmp(&a_count)
        }),
    }

    ordered
        .into_iter()
        .map(|department| DepartmentCount {
            department_name: department.name.clone(),
            count: tally.get(&department.id).copied().unwrap_or(0),
        })
        .filter(|entry| empty == EmptyDepartments::Include || entry.count > 0)
        .collect()
}

/// Feedback volume per category, largest first, ties by category id.
///
/// Uncategorised feedback is reported under `None`. Percentages are of all
/// feedback passed in and add up to 100.
pub fn category_breakdown<'a, I>(feedbacks: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a Feedback>,
{
    let mut positions: HashMap<Option<Uuid>, usize> = HashMap::new();
    let mut counts: Vec<(Option<Uuid>, usize)> = Vec::new();
    let mut total = 0usize;

    for feedback in feedbacks {
        total += 1;
        match positions.get(&feedback.category_id) {
            Some(index) => counts[*index].1 += 1,
            None => {
                positions.insert(feedback.category_id, counts.len());
                counts.push((feedback.category_id, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut percentages: Vec<u32> = counts
        .iter()
        .map(|(_, count)| round_percent(*count, total))
        .collect();
    settle_percentages(&mut percentages);

    counts
        .into_iter()
        .zip(percentages)
        .map(|((category_id, count), percentage)| CategoryCount {
            category_id,
            count,
            percentage,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::tests::rated;

    fn department(id: u128, name: &str) -> Department {
        Department {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            is_active: true,
        }
    }

    fn student(department: Option<u128>, status: Option<&str>) -> Student {
        Student {
            id: Uuid::new_v4(),
            department_id: department.map(Uuid::from_u128),
            status: status.map(str::to_string),
            is_active: true,
            enrollment_year: Some(2024),
        }
    }

    #[test]
    fn status_defaults_to_active_and_keeps_first_seen_order() {
        let students = vec![
            student(None, Some("Suspended")),
            student(None, None),
            student(None, Some("Active")),
            student(None, Some("")),
            student(None, Some("Graduated")),
            student(None, Some("Suspended")),
        ];

        let counts = count_by_status(&students);
        let shape: Vec<(&str, usize)> = counts
            .iter()
            .map(|entry| (entry.status.as_str(), entry.count))
            .collect();
        assert_eq!(shape, vec![("Suspended", 2), ("Active", 3), ("Graduated", 1)]);

        let percentages: Vec<u32> = counts.iter().map(|entry| entry.percentage).collect();
        assert_eq!(percentages, vec![33, 50, 17]);
    }

    #[test]
    fn department_counts_omit_empty_by_default() {
        let departments = vec![department(1, "CS"), department(2, "EE"), department(3, "ME")];
        let students = vec![
            student(Some(1), None),
            student(Some(1), None),
            student(Some(2), None),
            student(None, None),
        ];

        let counts = distribution_by_department(
            &students,
            &departments,
            |student| student.department_id,
            DepartmentOrder::InputOrder,
            EmptyDepartments::default(),
        );
        let shape: Vec<(&str, usize)> = counts
            .iter()
            .map(|entry| (entry.department_name.as_str(), entry.count))
            .collect();
        assert_eq!(shape, vec![("CS", 2), ("EE", 1)]);
    }

    #[test]
    fn department_counts_can_include_empty_and_sort_by_id() {
        let departments = vec![department(3, "ME"), department(1, "CS"), department(2, "EE")];
        let students = vec![student(Some(2), None)];

        let counts = distribution_by_department(
            &students,
            &departments,
            |student| student.department_id,
            DepartmentOrder::IdAscending,
            EmptyDepartments::Include,
        );
        let shape: Vec<(&str, usize)> = counts
            .iter()
            .map(|entry| (entry.department_name.as_str(), entry.count))
            .collect();
        assert_eq!(shape, vec![("CS", 0), ("EE", 1), ("ME", 0)]);
    }

    #[test]
    fn department_counts_by_count_keep_input_order_on_ties() {
        let departments = vec![department(1, "CS"), department(2, "EE"), department(3, "ME")];
        let students = vec![
            student(Some(3), None),
            student(Some(3), None),
            student(Some(1), None),
            student(Some(2), None),
        ];

        let counts = distribution_by_department(
            &students,
            &departments,
            |student| student.department_id,
            DepartmentOrder::CountDescending,
            EmptyDepartments::Omit,
        );
        let names: Vec<&str> = counts
            .iter()
            .map(|entry| entry.department_name.as_str())
            .collect();
        assert_eq!(names, vec!["ME", "CS", "EE"]);
    }

    #[test]
    fn categories_sorted_by_volume() {
        let teaching = Some(Uuid::from_u128(10));
        let facilities = Some(Uuid::from_u128(20));
        let mut feedback = vec![rated(Some(4)), rated(Some(2)), rated(None)];
        feedback[0].category_id = facilities;
        feedback[1].category_id = teaching;
        feedback[2].category_id = teaching;

        let categories = category_breakdown(&feedback);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category_id, teaching);
        assert_eq!(categories[0].count, 2);
        assert_eq!(categories[0].percentage, 67);
        assert_eq!(categories[1].percentage, 33);

        let empty: Vec<Feedback> = Vec::new();
        assert!(category_breakdown(&empty).is_empty());
    }

    #[test]
    fn category_ties_do_not_depend_on_input_order() {
        let first = Some(Uuid::from_u128(1));
        let second = Some(Uuid::from_u128(2));
        let mut feedback = vec![rated(Some(4)), rated(Some(3)), rated(None)];
        feedback[0].category_id = second;
        feedback[1].category_id = first;

        let forward = category_breakdown(&feedback);
        feedback.reverse();
        let backward = category_breakdown(&feedback);

        assert_eq!(forward, backward);
        let ids: Vec<Option<Uuid>> = forward.iter().map(|entry| entry.category_id).collect();
        assert_eq!(ids, vec![None, first, second]);
        let percentages: Vec<u32> = forward.iter().map(|entry| entry.percentage).collect();
        assert_eq!(percentages, vec![34, 33, 33]);
    }
}
