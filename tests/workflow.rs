use std::io::Write;

use ab_verdict::config::VIEWING_STATUS_FIELD;
use ab_verdict::data::label::label_dataset;
use ab_verdict::data::loader::load_file;
use ab_verdict::data::model::FieldValue;
use ab_verdict::data::partition::partition;
use ab_verdict::data::summary::category_counts;
use ab_verdict::report;
use ab_verdict::stats::{self, TestKind};

fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn csv_two_groups_detects_difference() {
    let mut csv = String::from("group,minutes\n");
    for v in [1, 2, 3, 4, 5] {
        csv.push_str(&format!("control,{v}\n"));
    }
    for v in [10, 11, 9, 12, 13] {
        csv.push_str(&format!("treatment,{v}\n"));
    }
    let file = temp_file(".csv", &csv);

    let dataset = load_file(file.path()).unwrap();
    let groups = partition(&dataset, "group", "minutes").unwrap();
    assert_eq!(groups.len(), 2);

    let verdict = stats::compare_groups(&groups, false).unwrap();
    assert_eq!(verdict.test, TestKind::MannWhitneyU);
    assert!(verdict.p_value < 0.05);
    assert!(verdict.reject_null);
    assert!(report::describe(&verdict).contains("significant difference detected"));
}

#[test]
fn json_three_groups_pairwise_and_kruskal() {
    let json = r#"[
        {"arm": "A", "score": 1}, {"arm": "A", "score": 2}, {"arm": "A", "score": 3},
        {"arm": "A", "score": 4}, {"arm": "A", "score": 5},
        {"arm": "B", "score": 6}, {"arm": "B", "score": 7}, {"arm": "B", "score": 8},
        {"arm": "B", "score": 9}, {"arm": "B", "score": 10},
        {"arm": "C", "score": 11}, {"arm": "C", "score": 12}, {"arm": "C", "score": 13},
        {"arm": "C", "score": 14}, {"arm": "C", "score": 15}
    ]"#;
    let file = temp_file(".json", json);

    let dataset = load_file(file.path()).unwrap();
    let groups = partition(&dataset, "arm", "score").unwrap();

    let overall = stats::compare_groups(&groups, false).unwrap();
    assert_eq!(overall.test, TestKind::KruskalWallis);
    assert!(overall.reject_null);

    let pairs = stats::pairwise_mann_whitney(&groups).unwrap();
    let subjects: Vec<&str> = pairs.iter().filter_map(|v| v.subject.as_deref()).collect();
    assert_eq!(subjects, vec!["A vs B", "A vs C", "B vs C"]);
    assert!(pairs.iter().all(|v| v.reject_null));
}

#[test]
fn labelled_viewings_are_counted() {
    let json = r#"[
        {"group": "control", "minutes_watched": 30, "content_duration": 30},
        {"group": "control", "minutes_watched": 29, "content_duration": 30},
        {"group": "treatment", "minutes_watched": 45.5, "content_duration": 45},
        {"group": "treatment", "minutes_watched": 3, "content_duration": 45},
        {"group": "treatment", "minutes_watched": 12, "content_duration": 45}
    ]"#;
    let file = temp_file(".json", json);
    let mut dataset = load_file(file.path()).unwrap();

    let complete = label_dataset(
        &mut dataset,
        "minutes_watched",
        "content_duration",
        VIEWING_STATUS_FIELD,
    )
    .unwrap();
    assert_eq!(complete, 2);
    assert!(dataset
        .column_names
        .iter()
        .any(|c| c == VIEWING_STATUS_FIELD));

    let counts = category_counts(&dataset, VIEWING_STATUS_FIELD);
    assert_eq!(
        counts,
        vec![
            (FieldValue::from("complete viewing"), 2),
            (FieldValue::from("incomplete viewing"), 3),
        ]
    );
}

#[test]
fn battery_serializes_each_outcome() {
    let csv = "group,value\na,1\na,2\na,3\nb,4\nb,5\nb,6\n";
    let file = temp_file(".csv", csv);
    let dataset = load_file(file.path()).unwrap();
    let groups = partition(&dataset, "group", "value").unwrap();

    let battery = stats::run_battery(&groups, false);
    let json: serde_json::Value = serde_json::to_value(&battery).unwrap();
    assert!(json["comparison"]["ok"]["p_value"].is_number());
    assert!(json["homogeneity"]["ok"].is_object());
    assert!(json["pairwise"].is_null());
}

#[test]
fn missing_metric_is_reported() {
    let file = temp_file(".csv", "group,value\na,1\nb,\n");
    let dataset = load_file(file.path()).unwrap();
    let err = partition(&dataset, "group", "value").unwrap_err();
    assert!(err.to_string().contains("value"));
}

#[test]
fn unsupported_extension_is_an_error() {
    let file = temp_file(".xlsx", "");
    assert!(load_file(file.path()).is_err());
}
