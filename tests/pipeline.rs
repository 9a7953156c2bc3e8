use std::cell::RefCell;
use std::collections::HashMap;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use chrono::NaiveDate;
use cloudability_export::io::http::ReportSource;
use cloudability_export::registry::{ViewConfig, ViewRegistry};
use cloudability_export::run::{fetch_view, run_export};
use cloudability_export::{ReportError, Result};
use serde_json::{Value, json};
use tempfile::tempdir;

/// In-memory stand-in for the billing API, keyed by provider and view.
/// Views without a canned response answer with a 503.
#[derive(Default)]
struct FakeSource {
    responses: HashMap<(String, String), Value>,
    calls: RefCell<Vec<(String, String)>>,
}

impl FakeSource {
    fn respond(mut self, provider: &str, view: &str, body: Value) -> Self {
        self.responses
            .insert((provider.to_string(), view.to_string()), body);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ReportSource for FakeSource {
    fn fetch(
        &self,
        provider: &str,
        view: &str,
        _config: &ViewConfig,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Value> {
        self.calls
            .borrow_mut()
            .push((provider.to_string(), view.to_string()));
        match self.responses.get(&(provider.to_string(), view.to_string())) {
            Some(body) => Ok(body.clone()),
            None => Err(ReportError::Api {
                status: 503,
                message: "upstream unavailable".to_string(),
            }),
        }
    }
}

fn registry(value: Value) -> ViewRegistry {
    serde_json::from_value(value).expect("registry parses")
}

fn dates() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date"),
    )
}

#[test]
fn two_providers_export_one_sheet_each() {
    let registry = registry(json!({
        "AWS": {
            "aws_view1": {"dimensions": ["service"], "metrics": ["cost"]}
        },
        "Azure": {
            "azure_view1": {"dimensions": ["service"], "metrics": ["cost"]}
        }
    }));
    let source = FakeSource::default()
        .respond(
            "AWS",
            "aws_view1",
            json!({"data": [{"service": "EC2", "cost": 100}]}),
        )
        .respond(
            "Azure",
            "azure_view1",
            json!({"data": [{"service": "VirtualMachines", "cost": 150}]}),
        );

    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("report.xlsx");
    let (start, end) = dates();
    run_export(&registry, &source, start, end, &path, 100).expect("export succeeds");

    let mut workbook: Xlsx<_> = open_workbook(&path).expect("workbook opened");
    let mut names = workbook.sheet_names().to_vec();
    names.sort();
    assert_eq!(names, vec!["aws_data", "azure_data"]);

    for sheet in ["aws_data", "azure_data"] {
        let range = workbook
            .worksheet_range(sheet)
            .expect("sheet present")
            .expect("range read");
        assert_eq!(range.rows().count(), 2, "sheet {sheet}");
        assert_eq!(
            range.get_value((0, 0)),
            Some(&DataType::String("category".to_string()))
        );
        assert_eq!(
            range.get_value((1, 0)),
            Some(&DataType::String("core".to_string()))
        );
    }
}

#[test]
fn views_with_different_columns_are_unioned_per_provider() {
    let registry = registry(json!({
        "AWS": {
            "aws_view1": {"dimensions": ["service"], "metrics": ["cost"]},
            "aws_view2": {
                "dimensions": ["service", "region"],
                "metrics": ["cost"],
                "category": "detailed"
            }
        }
    }));
    let source = FakeSource::default()
        .respond(
            "AWS",
            "aws_view1",
            json!({"data": [{"service": "EC2", "cost": 100}]}),
        )
        .respond(
            "AWS",
            "aws_view2",
            json!({"data": [{"service": "S3", "region": "us-east-1", "cost": 200}]}),
        );

    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("report.xlsx");
    let (start, end) = dates();
    run_export(&registry, &source, start, end, &path, 100).expect("export succeeds");

    let mut workbook: Xlsx<_> = open_workbook(&path).expect("workbook opened");
    let range = workbook
        .worksheet_range("aws_data")
        .expect("sheet present")
        .expect("range read");

    let header: Vec<String> = range
        .rows()
        .next()
        .expect("header present")
        .iter()
        .map(|cell| cell.to_string())
        .collect();
    assert_eq!(header, vec!["category", "service", "cost", "region"]);

    // Row from the first view never had a region.
    assert!(matches!(
        range.get_value((1, 3)),
        None | Some(DataType::Empty)
    ));
    assert_eq!(
        range.get_value((2, 3)),
        Some(&DataType::String("us-east-1".to_string()))
    );
    assert_eq!(
        range.get_value((2, 0)),
        Some(&DataType::String("detailed".to_string()))
    );
}

#[test]
fn failing_view_is_contained_to_itself() {
    let registry = registry(json!({
        "AWS": {
            "aws_view1": {"dimensions": ["service"], "metrics": ["cost"]},
            "aws_view2": {"dimensions": ["service"], "metrics": ["cost"]}
        }
    }));
    // aws_view2 has no canned response, so the fake answers with a 503.
    let source = FakeSource::default().respond(
        "AWS",
        "aws_view1",
        json!({"data": [{"service": "EC2", "cost": 100}]}),
    );

    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("report.xlsx");
    let (start, end) = dates();
    run_export(&registry, &source, start, end, &path, 100).expect("export succeeds");

    let mut workbook: Xlsx<_> = open_workbook(&path).expect("workbook opened");
    let range = workbook
        .worksheet_range("aws_data")
        .expect("sheet present")
        .expect("range read");
    assert_eq!(range.rows().count(), 2);
    assert_eq!(source.call_count(), 2);
}

#[test]
fn schema_failures_are_contained_to_the_view() {
    let registry = registry(json!({
        "AWS": {
            "aws_view1": {"dimensions": ["service"], "metrics": ["cost"]},
            "aws_view2": {"dimensions": ["service"], "metrics": ["cost"]}
        }
    }));
    let source = FakeSource::default()
        .respond("AWS", "aws_view1", json!({"unexpected": []}))
        .respond(
            "AWS",
            "aws_view2",
            json!({"data": [{"service": "EC2", "cost": 100}]}),
        );

    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("report.xlsx");
    let (start, end) = dates();
    run_export(&registry, &source, start, end, &path, 100).expect("export succeeds");

    let mut workbook: Xlsx<_> = open_workbook(&path).expect("workbook opened");
    let range = workbook
        .worksheet_range("aws_data")
        .expect("sheet present")
        .expect("range read");
    assert_eq!(range.rows().count(), 2);
}

#[test]
fn run_with_no_usable_data_writes_no_file() {
    let registry = registry(json!({
        "AWS": {
            "aws_view1": {"dimensions": ["service"], "metrics": ["cost"]}
        }
    }));
    let source = FakeSource::default();

    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("report.xlsx");
    let (start, end) = dates();
    run_export(&registry, &source, start, end, &path, 100).expect("run succeeds without data");

    assert!(!path.exists());
}

#[test]
fn provider_with_only_empty_views_is_omitted() {
    let registry = registry(json!({
        "AWS": {
            "aws_view1": {"dimensions": ["service"], "metrics": ["cost"]}
        },
        "Azure": {
            "azure_view1": {"dimensions": ["service"], "metrics": ["cost"]}
        }
    }));
    let source = FakeSource::default()
        .respond("AWS", "aws_view1", json!({"data": []}))
        .respond(
            "Azure",
            "azure_view1",
            json!({"data": [{"service": "Storage", "cost": 250}]}),
        );

    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("report.xlsx");
    let (start, end) = dates();
    run_export(&registry, &source, start, end, &path, 100).expect("export succeeds");

    let mut workbook: Xlsx<_> = open_workbook(&path).expect("workbook opened");
    assert_eq!(workbook.sheet_names().to_vec(), vec!["azure_data"]);
}

#[test]
fn unknown_provider_fails_before_any_fetch() {
    let registry = registry(json!({
        "AWS": {
            "aws_view1": {"dimensions": ["service"], "metrics": ["cost"]}
        }
    }));
    let source = FakeSource::default();
    let (start, end) = dates();

    let error = fetch_view(&registry, &source, "GCP", "aws_view1", start, end).unwrap_err();

    assert!(matches!(error, ReportError::UnknownProvider(name) if name == "GCP"));
    assert_eq!(source.call_count(), 0);
}

#[test]
fn unknown_view_fails_before_any_fetch() {
    let registry = registry(json!({
        "AWS": {
            "aws_view1": {"dimensions": ["service"], "metrics": ["cost"]}
        }
    }));
    let source = FakeSource::default();
    let (start, end) = dates();

    let error = fetch_view(&registry, &source, "AWS", "missing", start, end).unwrap_err();

    assert!(matches!(error, ReportError::UnknownView { .. }));
    assert_eq!(source.call_count(), 0);
}
