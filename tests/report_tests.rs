use logsift::cli::run::run_pipeline;
use logsift::config::types::{Config, ReportConfig};
use logsift::pattern::PatternRegistry;
use logsift::pipeline::{ingest, Dataset, IngestOptions};
use logsift::report::{self, Report};
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

fn line(ip: &str, hour: u32, url: &str, status: u16) -> String {
    format!(
        r#"{} - - [10/Oct/2023:{:02}:15:00 +0000] "GET {} HTTP/1.1" {} 100 "-" "agent""#,
        ip, hour, url, status
    )
}

fn access_log() -> Vec<String> {
    vec![
        line("1.1.1.1", 9, "/", 200),
        line("1.1.1.1", 9, "/", 200),
        line("2.2.2.2", 9, "/", 200),
        line("3.3.3.3", 10, "/login", 401),
        line("3.3.3.3", 10, "/login", 401),
        line("3.3.3.3", 10, "/login", 401),
        line("4.4.4.4", 23, "/missing", 404),
        line("1.1.1.1", 23, "/broken", 500),
    ]
}

fn dataset() -> Dataset {
    let registry = PatternRegistry::builtin().unwrap();
    let source = Cursor::new(access_log().join("\n").into_bytes());
    ingest(source, registry.get("nginx").unwrap(), &IngestOptions::default())
        .unwrap()
        .dataset
}

fn rows(report: &Report) -> Vec<Vec<&str>> {
    report
        .rows
        .iter()
        .map(|r| r.iter().map(String::as_str).collect())
        .collect()
}

#[test]
fn test_top_pages() {
    let report = report::top_pages(&dataset(), 2);

    assert_eq!(report.headers, vec!["url", "hits"]);
    assert_eq!(rows(&report), vec![vec!["/", "3"], vec!["/login", "3"]]);
}

#[test]
fn test_top_ips() {
    let report = report::top_ips(&dataset(), 10);

    assert_eq!(
        rows(&report),
        vec![
            vec!["1.1.1.1", "3"],
            vec!["3.3.3.3", "3"],
            vec!["2.2.2.2", "1"],
            vec!["4.4.4.4", "1"],
        ]
    );
}

#[test]
fn test_top_url_ip() {
    let report = report::top_url_ip(&dataset(), 2);

    assert_eq!(
        rows(&report),
        vec![vec!["/login", "3.3.3.3", "3"], vec!["/", "1.1.1.1", "2"]]
    );
}

#[test]
fn test_traffic_by_hour_and_day() {
    let data = dataset();

    let by_hour = report::traffic_by_hour(&data);
    assert_eq!(
        rows(&by_hour),
        vec![vec!["9", "3"], vec!["10", "3"], vec!["23", "2"]]
    );

    let by_day = report::traffic_by_day(&data);
    assert_eq!(rows(&by_day), vec![vec!["Tuesday", "8"]]);
}

#[test]
fn test_top_errors() {
    let report = report::top_errors(&dataset(), 50);

    assert_eq!(
        rows(&report),
        vec![
            vec!["/login", "401", "3"],
            vec!["/broken", "500", "1"],
            vec!["/missing", "404", "1"],
        ]
    );
}

#[test]
fn test_unique_visitors_and_bots() {
    let data = dataset();

    let unique = report::unique_visitors(&data, 1);
    assert_eq!(rows(&unique), vec![vec!["/", "2"]]);

    let bots = report::suspicious_bots(&data, 2);
    assert_eq!(bots.headers.len(), 4);
    assert_eq!(
        rows(&bots),
        vec![vec!["/login", "3", "1", "3.00"], vec!["/", "3", "2", "1.50"]]
    );
}

#[test]
fn test_build_all_order() {
    let names: Vec<&str> = report::build_all(&dataset(), &ReportConfig::default())
        .iter()
        .map(|r| r.name)
        .collect();

    assert_eq!(
        names,
        vec![
            "top_pages",
            "top_ips",
            "top_url_ip",
            "traffic_by_hour",
            "traffic_by_day",
            "top_errors",
            "unique_visitors",
            "suspicious_bots",
        ]
    );
}

#[test]
fn test_run_pipeline_writes_csv_files() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("access.log");
    fs::write(&input, access_log().join("\n")).unwrap();
    let output_dir = temp_dir.path().join("out/nested");

    let mut config = Config::for_input(&input);
    config.format = "nginx".to_string();
    config.output_dir = output_dir.clone();
    config.exclude = Some("login".to_string());

    let summary = run_pipeline(&config).unwrap();

    assert_eq!(summary.rows, 5);
    assert_eq!(summary.reports.len(), 8);
    let top_pages = fs::read_to_string(output_dir.join("top_pages.csv")).unwrap();
    assert_eq!(top_pages, "url,hits\n/,3\n/broken,1\n/missing,1\n");
    let errors = fs::read_to_string(output_dir.join("top_errors.csv")).unwrap();
    assert_eq!(errors, "url,status,hits\n/broken,500,1\n/missing,404,1\n");
}

#[test]
fn test_failed_ingestion_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("out");

    let mut config = Config::for_input(temp_dir.path().join("missing.log"));
    config.output_dir = output_dir.clone();

    assert!(run_pipeline(&config).is_err());
    assert!(!output_dir.exists());
}
