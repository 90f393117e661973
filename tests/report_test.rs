//! Integration tests for the report builders.
//!
//! Each test drives a builder through the public API with synthetic span
//! documents and checks the emitted report, including its CSV and JSON
//! renderings.

use laptrace::report::{
    build_pit_stops, build_quali_classification, build_race_classification,
};
use laptrace::{
    EntrantAliases, Metadata, Page, ReportKind, TextSpan, TimingDocument, Value,
};

fn span(text: &str, x: f32, y: f32) -> TextSpan {
    TextSpan::new(text.to_string(), x, y, 8.0)
}

fn single_page(kind: ReportKind, spans: Vec<TextSpan>) -> TimingDocument {
    TimingDocument {
        kind,
        metadata: Metadata::default(),
        pages: vec![Page::from_spans(1, 842.0, 595.0, spans)],
    }
}

fn quali_doc() -> TimingDocument {
    let cols = [
        40.0, 65.0, 90.0, 160.0, 200.0, 300.0, 345.0, 365.0, 400.0, 450.0, 495.0, 515.0, 565.0,
        610.0, 630.0,
    ];
    let mut spans = vec![
        span("Qualifying Session Final Classification", 40.0, 50.0),
        span("POLE POSITION LAP", 40.0, 200.0),
    ];
    let rows: [[&str; 15]; 2] = [
        [
            "1", "16", "LECLERC", "MON", "Ferrari", "1:21.500", "5", "98.2%", "1:21.123",
            "1:20.800", "4", "1:20.456", "1:20.200", "3", "1:20.270",
        ],
        [
            "2", "55", "SAINZ", "ESP", "Ferrari", "1:21.700", "6", "97.9%", "1:21.400",
            "1:20.900", "5", "1:20.600", "1:20.400", "3", "1:20.510",
        ],
    ];
    for (r, row) in rows.iter().enumerate() {
        let y = 80.0 + r as f32 * 15.0;
        for (c, cell) in row.iter().enumerate() {
            spans.push(span(cell, cols[c], y));
        }
    }
    single_page(ReportKind::QualiClassification, spans)
}

fn race_doc() -> TimingDocument {
    let mut spans = vec![span("Race Final Classification", 40.0, 40.0)];
    for (label, x) in [
        ("NO", 60.0),
        ("DRIVER", 90.0),
        ("NAT", 160.0),
        ("ENTRANT", 200.0),
        ("LAPS", 330.0),
        ("TIME", 370.0),
        ("GAP", 430.0),
        ("INT", 470.0),
        ("KM/H", 500.0),
        ("FASTEST", 545.0),
        ("ON", 600.0),
        ("PTS", 630.0),
    ] {
        spans.push(span(label, x, 70.0));
    }
    let cols = [
        40.0, 60.0, 90.0, 160.0, 200.0, 330.0, 370.0, 430.0, 470.0, 500.0, 545.0, 600.0, 630.0,
    ];
    let rows: [[&str; 13]; 2] = [
        [
            "1", "16", "LECLERC", "MON", "Scuderia Ferrari", "57", "1:31:44.742", "", "",
            "205.421", "1:31.261", "51", "25",
        ],
        [
            "2", "55", "SAINZ", "ESP", "Scuderia Ferrari", "57", "", "+5.598", "5.598",
            "204.950", "1:31.740", "44", "18",
        ],
    ];
    for (r, row) in rows.iter().enumerate() {
        let y = 90.0 + r as f32 * 15.0;
        for (c, text) in row.iter().enumerate() {
            if !text.is_empty() {
                spans.push(span(text, cols[c], y));
            }
        }
    }
    spans.push(span("NOT CLASSIFIED - ", 40.0, 130.0));
    let dnf: [&str; 13] = [
        "", "10", "GASLY", "FRA", "Scuderia AlphaTauri", "22", "", "DNF", "", "198.000",
        "1:33.100", "18", "",
    ];
    for (c, text) in dnf.iter().enumerate() {
        if !text.is_empty() {
            spans.push(span(text, cols[c], 145.0));
        }
    }
    spans.push(span("FASTEST LAP", 40.0, 175.0));
    single_page(ReportKind::RaceClassification, spans)
}

fn lap_chart_doc() -> TimingDocument {
    single_page(
        ReportKind::RaceLapChart,
        vec![
            span("GRID 16 55 10", 40.0, 50.0),
            span("LAP 1 16 55 10", 40.0, 65.0),
            span("LAP 2 55 16 10", 40.0, 80.0),
        ],
    )
}

fn aliases() -> EntrantAliases {
    EntrantAliases::from_json_str(
        r#"{"Scuderia Ferrari": "Ferrari", "Scuderia AlphaTauri": "AlphaTauri"}"#,
    )
    .unwrap()
}

#[test]
fn test_quali_csv_output() {
    let report = build_quali_classification(&quali_doc()).unwrap();
    let csv = report.to_csv_string();
    let mut lines = csv.lines();

    assert_eq!(
        lines.next(),
        Some("pos,no,driver,entrant,q1,q1_laps,q1_time,q2,q2_laps,q2_time,q3,q3_laps,q3_time")
    );
    assert_eq!(
        lines.next(),
        Some("1,16,LECLERC,Ferrari,1:21.500,5,1:21.123,1:20.800,4,1:20.456,1:20.200,3,1:20.270")
    );
    assert_eq!(lines.clone().count(), 1);
}

#[test]
fn test_race_reconciliation_and_json_output() {
    let result = build_race_classification(&race_doc(), &lap_chart_doc(), &aliases()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&result.drivers.to_json_string().unwrap()).unwrap();
    assert_eq!(json["name"], "race_classification");

    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);

    let winner = &rows[0];
    assert_eq!(winner["no"], "16");
    assert_eq!(winner["entrant"], "Ferrari");
    assert_eq!(winner["grid"], 1);
    assert_eq!(winner["milliseconds"], 5_504_742_i64);
    assert_eq!(winner["rank"], 1);

    let second = &rows[1];
    assert_eq!(second["time"], "+5.598");
    assert_eq!(second["milliseconds"], 5_510_340_i64);
    assert_eq!(second["rank"], 2);

    let dnf = &rows[2];
    assert_eq!(dnf["no"], "10");
    assert_eq!(dnf["entrant"], "AlphaTauri");
    assert_eq!(dnf["position"], serde_json::Value::Null);
    assert_eq!(dnf["milliseconds"], serde_json::Value::Null);
    assert_eq!(dnf["positionOrder"], 3);
}

#[test]
fn test_race_constructor_totals() {
    let result = build_race_classification(&race_doc(), &lap_chart_doc(), &aliases()).unwrap();
    let constructors = &result.constructors;
    assert_eq!(constructors.row_count(), 2);
    assert_eq!(
        constructors.rows[0].get("constructor"),
        Some(&Value::text("Ferrari"))
    );
    assert_eq!(constructors.rows[0].get("points"), Some(&Value::text("43")));
    assert_eq!(
        constructors.rows[1].get("constructor"),
        Some(&Value::text("AlphaTauri"))
    );
    assert_eq!(constructors.rows[1].get("points"), Some(&Value::text("0")));
}

#[test]
fn test_unknown_entrant_fails_race_build() {
    let empty = EntrantAliases::from_json_str("{}").unwrap();
    let err = build_race_classification(&race_doc(), &lap_chart_doc(), &empty).unwrap_err();
    assert!(matches!(err, laptrace::Error::UnknownEntrant(_)));
}

#[test]
fn test_pit_stops_csv_null_duration() {
    let mut spans = Vec::new();
    for (label, x) in [
        ("NO", 40.0),
        ("DRIVER", 80.0),
        ("ENTRANT", 160.0),
        ("LAP", 300.0),
        ("TIME OF DAY", 340.0),
        ("STOP", 420.0),
        ("DURATION", 470.0),
        ("TOTAL TIME", 540.0),
    ] {
        spans.push(span(label, x, 60.0));
    }
    let rows: [[&str; 8]; 2] = [
        ["16", "LECLERC", "Ferrari", "12", "15:24:33", "1", "23.456", "23.456"],
        ["55", "SAINZ", "Ferrari", "13", "15:26:01", "1", "1:02.456", "1:02.456"],
    ];
    let cols = [40.0, 80.0, 160.0, 300.0, 340.0, 420.0, 470.0, 540.0];
    for (r, row) in rows.iter().enumerate() {
        let y = 80.0 + r as f32 * 15.0;
        for (c, text) in row.iter().enumerate() {
            spans.push(span(text, cols[c], y));
        }
    }
    let doc = single_page(ReportKind::RacePitStops, spans);

    let report = build_pit_stops(&doc).unwrap();
    assert_eq!(report.row_count(), 2);
    assert_eq!(report.rows[0].get("milliseconds"), Some(&Value::Millis(23_456)));
    assert_eq!(report.rows[1].get("milliseconds"), Some(&Value::Millis(62_456)));

    let csv = report.to_csv_string();
    assert!(csv.starts_with("no,driver,stop,lap,time,duration,milliseconds\n"));
    assert!(csv.contains("16,LECLERC,1,12,15:24:33,23.456,23456\n"));
}
