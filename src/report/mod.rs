//! Aggregate reports over a finished dataset.
//!
//! Reports only read the dataset; nothing here re-parses raw log text.

pub mod writer;

use crate::config::types::ReportConfig;
use crate::pipeline::normalize::Dataset;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

pub use writer::{write_all, write_report, ReportError};

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// A small named table
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub name: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Report {
    fn new(name: &'static str, headers: &[&'static str]) -> Self {
        Self {
            name,
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Counts sorted by count descending, key ascending, truncated to `limit`
fn ranked<K: Ord + Hash>(counts: HashMap<K, u64>, limit: usize) -> Vec<(K, u64)> {
    let mut entries: Vec<(K, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}

fn count_by<'a, K, F>(dataset: &'a Dataset, mut key: F) -> HashMap<K, u64>
where
    K: Eq + Hash,
    F: FnMut(&'a crate::pipeline::normalize::NormalizedRow) -> Option<K>,
{
    let mut counts = HashMap::new();
    for row in dataset {
        if let Some(k) = key(row) {
            *counts.entry(k).or_insert(0) += 1;
        }
    }
    counts
}

fn unique_ips_per_url(dataset: &Dataset) -> HashMap<&str, HashSet<&str>> {
    let mut visitors: HashMap<&str, HashSet<&str>> = HashMap::new();
    for row in dataset {
        visitors.entry(row.url.as_str()).or_default().insert(row.ip.as_str());
    }
    visitors
}

pub fn top_pages(dataset: &Dataset, limit: usize) -> Report {
    let mut report = Report::new("top_pages", &["url", "hits"]);
    for (url, hits) in ranked(count_by(dataset, |r| Some(r.url.as_str())), limit) {
        report.rows.push(vec![url.to_string(), hits.to_string()]);
    }
    report
}

pub fn top_ips(dataset: &Dataset, limit: usize) -> Report {
    let mut report = Report::new("top_ips", &["ip", "hits"]);
    for (ip, hits) in ranked(count_by(dataset, |r| Some(r.ip.as_str())), limit) {
        report.rows.push(vec![ip.to_string(), hits.to_string()]);
    }
    report
}

pub fn top_url_ip(dataset: &Dataset, limit: usize) -> Report {
    let mut report = Report::new("top_url_ip", &["url", "ip", "hits"]);
    let counts = count_by(dataset, |r| Some((r.url.as_str(), r.ip.as_str())));
    for ((url, ip), hits) in ranked(counts, limit) {
        report
            .rows
            .push(vec![url.to_string(), ip.to_string(), hits.to_string()]);
    }
    report
}

pub fn traffic_by_hour(dataset: &Dataset) -> Report {
    let mut report = Report::new("traffic_by_hour", &["hour", "hits"]);
    let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
    for hour in dataset.iter().filter_map(|r| r.hour) {
        *counts.entry(hour).or_insert(0) += 1;
    }
    for (hour, hits) in counts {
        report.rows.push(vec![hour.to_string(), hits.to_string()]);
    }
    report
}

/// Weekdays in calendar order, Monday first
pub fn traffic_by_day(dataset: &Dataset) -> Report {
    let mut report = Report::new("traffic_by_day", &["day_name", "hits"]);
    let counts = count_by(dataset, |r| r.day_name);
    for day in WEEKDAYS {
        if let Some(hits) = counts.get(day) {
            report.rows.push(vec![day.to_string(), hits.to_string()]);
        }
    }
    report
}

/// Rows with status >= 400 grouped by url and status
pub fn top_errors(dataset: &Dataset, limit: usize) -> Report {
    let mut report = Report::new("top_errors", &["url", "status", "hits"]);
    let counts = count_by(dataset, |r| match r.status {
        Some(status) if status >= 400 => Some((r.url.as_str(), status)),
        _ => None,
    });
    for ((url, status), hits) in ranked(counts, limit) {
        report
            .rows
            .push(vec![url.to_string(), status.to_string(), hits.to_string()]);
    }
    report
}

pub fn unique_visitors(dataset: &Dataset, limit: usize) -> Report {
    let mut report = Report::new("unique_visitors", &["url", "unique_ips"]);
    let counts: HashMap<&str, u64> = unique_ips_per_url(dataset)
        .into_iter()
        .map(|(url, ips)| (url, ips.len() as u64))
        .collect();
    for (url, unique) in ranked(counts, limit) {
        report.rows.push(vec![url.to_string(), unique.to_string()]);
    }
    report
}

/// Urls hit many times by few addresses: hits divided by distinct ips
pub fn suspicious_bots(dataset: &Dataset, limit: usize) -> Report {
    let mut report = Report::new(
        "suspicious_bots",
        &["url", "total_hits", "unique_ips", "frequency_ratio"],
    );
    let hits = count_by(dataset, |r| Some(r.url.as_str()));
    let visitors = unique_ips_per_url(dataset);

    let mut stats: Vec<(&str, u64, u64, f64)> = hits
        .into_iter()
        .map(|(url, total)| {
            let unique = visitors.get(url).map(|ips| ips.len() as u64).unwrap_or(1).max(1);
            (url, total, unique, total as f64 / unique as f64)
        })
        .collect();
    stats.sort_by(|a, b| b.3.total_cmp(&a.3).then_with(|| a.0.cmp(b.0)));
    stats.truncate(limit);

    for (url, total, unique, ratio) in stats {
        report.rows.push(vec![
            url.to_string(),
            total.to_string(),
            unique.to_string(),
            format!("{:.2}", ratio),
        ]);
    }
    report
}

/// Every report, in a fixed order
pub fn build_all(dataset: &Dataset, config: &ReportConfig) -> Vec<Report> {
    vec![
        top_pages(dataset, config.top_pages),
        top_ips(dataset, config.top_ips),
        top_url_ip(dataset, config.top_url_ip),
        traffic_by_hour(dataset),
        traffic_by_day(dataset),
        top_errors(dataset, config.top_errors),
        unique_visitors(dataset, config.unique_visitors),
        suspicious_bots(dataset, config.suspicious_bots),
    ]
}
