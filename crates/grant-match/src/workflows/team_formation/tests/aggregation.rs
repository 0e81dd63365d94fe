use proptest::prelude::*;
use serde_json::json;

use super::common::*;
use crate::workflows::team_formation::domain::{FacultyId, MatchRow, Section};
use crate::workflows::team_formation::{parse_match_rows, CoverageAggregator, TeamFormationError};

#[test]
fn repeated_observations_keep_the_maximum() {
    let rows = parse_match_rows(vec![
        json!({"faculty_id": 7, "covered": {"application": {"0": 0.4, "1": 0.9}}}),
        json!({"faculty_id": 7, "covered": {"application": {"0": 0.7, "1": 0.2}}}),
        json!({"faculty_id": 7, "covered": {"application": {"0": 0.5}}}),
    ]);

    let matrix = CoverageAggregator::aggregate(&rows).expect("rows aggregate");

    assert_eq!(coverage_of(&matrix, 7, Section::Application, 0), 0.7);
    assert_eq!(coverage_of(&matrix, 7, Section::Application, 1), 0.9);
}

#[test]
fn unparseable_pairs_are_dropped_without_losing_the_row() {
    let rows = parse_match_rows(vec![json!({
        "faculty_id": 8,
        "covered": {
            "application": {"zero": 0.9, "1": "0.6", "2": "high", " 3 ": 0.3, "4": null},
            "research": {"0": 1.7, "1": -0.2}
        }
    })]);

    let matrix = CoverageAggregator::aggregate(&rows).expect("rows aggregate");

    let member = matrix.member(FacultyId(8)).expect("faculty registered");
    let application: Vec<(usize, f64)> = member
        .application
        .iter()
        .map(|(index, value)| (*index, *value))
        .collect();
    assert_eq!(application, vec![(1, 0.6), (3, 0.3)]);
    assert_eq!(coverage_of(&matrix, 8, Section::Research, 0), 1.0);
    assert_eq!(matrix.entry(FacultyId(8), Section::Research, 1), Some(0.0));
}

#[test]
fn faculty_without_usable_pairs_still_join_the_pool() {
    let rows = parse_match_rows(vec![
        json!({"faculty_id": 1, "covered": {"application": {"0": 0.5}}}),
        json!({"faculty_id": 2, "covered": "not a mapping"}),
        json!({"faculty_id": 3}),
    ]);

    let matrix = CoverageAggregator::aggregate(&rows).expect("rows aggregate");

    assert_eq!(matrix.faculty_ids(), team(&[1, 2, 3]));
    assert_eq!(matrix.entry(FacultyId(2), Section::Application, 0), None);
    assert_eq!(coverage_of(&matrix, 2, Section::Application, 0), 0.0);
}

#[test]
fn rows_without_integer_faculty_ids_are_dropped() {
    let rows = parse_match_rows(vec![
        json!({"faculty_id": "abc", "covered": {}}),
        json!({"covered": {"application": {"0": 0.9}}}),
        json!({"faculty_id": 4, "covered": {"research": {"2": 0.25}}}),
    ]);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].faculty_id, FacultyId(4));
}

#[test]
fn empty_row_list_is_not_found() {
    match CoverageAggregator::aggregate(&[]) {
        Err(TeamFormationError::NotFound(_)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

fn arbitrary_rows() -> impl Strategy<Value = Vec<MatchRow>> {
    let pair = (0usize..4, -1.5f64..2.5);
    let row = (1i64..6, prop::collection::vec(pair.clone(), 0..5), prop::collection::vec(pair, 0..5));
    prop::collection::vec(row, 1..12).prop_map(|rows| {
        let values = rows
            .into_iter()
            .map(|(faculty, application, research)| {
                let application: serde_json::Map<String, serde_json::Value> = application
                    .into_iter()
                    .map(|(index, value)| (index.to_string(), json!(value)))
                    .collect();
                let research: serde_json::Map<String, serde_json::Value> = research
                    .into_iter()
                    .map(|(index, value)| (index.to_string(), json!(value)))
                    .collect();
                json!({
                    "faculty_id": faculty,
                    "covered": {"application": application, "research": research}
                })
            })
            .collect();
        parse_match_rows(values)
    })
}

proptest! {
    #[test]
    fn merged_values_stay_in_unit_interval(rows in arbitrary_rows()) {
        let matrix = CoverageAggregator::aggregate(&rows).expect("non-empty rows aggregate");
        for (_, coverage) in matrix.iter() {
            for (_, table) in coverage.iter() {
                for value in table.values() {
                    prop_assert!((0.0..=1.0).contains(value));
                }
            }
        }
    }

    #[test]
    fn aggregating_twice_is_idempotent(rows in arbitrary_rows()) {
        let once = CoverageAggregator::aggregate(&rows).expect("rows aggregate");
        let mut doubled = rows.clone();
        doubled.extend(rows.iter().cloned());
        let twice = CoverageAggregator::aggregate(&doubled).expect("rows aggregate");
        prop_assert_eq!(once, twice);
    }
}
