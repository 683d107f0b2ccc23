use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::query::Alpha;
use super::response::AlphaRecord;
use crate::models::{SiteCode, WeatherReport};

/// Merge METAR/TAF records into one report per site.
///
/// Reports come back in the order their site was first seen. Records with an
/// unknown type tag or a malformed location are logged and dropped.
pub fn merge_reports<'a, I>(records: I) -> Vec<WeatherReport>
where
    I: IntoIterator<Item = &'a AlphaRecord>,
{
    let mut reports: Vec<WeatherReport> = Vec::new();
    let mut index: HashMap<SiteCode, usize> = HashMap::new();

    for record in records {
        let target = match Alpha::from_tag(&record.kind) {
            Some(alpha @ (Alpha::Metar | Alpha::Taf)) => alpha,
            _ => {
                debug!(kind = %record.kind, location = %record.location, "Skipping unknown report type");
                continue;
            }
        };

        let site = match SiteCode::new(&record.location) {
            Ok(site) => site,
            Err(e) => {
                warn!(location = %record.location, "Skipping report with bad location: {e}");
                continue;
            }
        };

        let slot = *index.entry(site.clone()).or_insert_with(|| {
            reports.push(WeatherReport::new(site));
            reports.len() - 1
        });
        let report = &mut reports[slot];

        match target {
            Alpha::Metar => report.metar.push(record.text.clone()),
            _ => report.taf.push(record.text.clone()),
        }
    }

    reports
}

/// One report per requested site, in request order.
///
/// Sites upstream had nothing for get an empty report; reports for sites that
/// were not asked for are dropped.
pub fn reports_for_request(reports: Vec<WeatherReport>, sites: &[SiteCode]) -> Vec<WeatherReport> {
    let mut by_site: HashMap<SiteCode, WeatherReport> = reports
        .into_iter()
        .map(|report| (report.site.clone(), report))
        .collect();

    let mut seen = HashSet::new();
    sites
        .iter()
        .filter(|site| seen.insert(*site))
        .map(|site| {
            by_site
                .remove(site)
                .unwrap_or_else(|| WeatherReport::new(site.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn record(kind: &str, location: &str, text: &str) -> AlphaRecord {
        AlphaRecord {
            kind: kind.to_string(),
            pk: None,
            location: location.to_string(),
            start_validity: None,
            end_validity: None,
            text: text.to_string(),
            has_error: false,
            position: Value::Null,
        }
    }

    #[test]
    fn test_merge_keeps_arrival_order() {
        let records = vec![
            record("metar", "CYXE", "METAR CYXE 081300Z"),
            record("taf", "CYXE", "TAF CYXE 081140Z"),
            record("metar", "CYXE", "METAR CYXE 081400Z"),
        ];

        let reports = merge_reports(&records);
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].metar,
            vec!["METAR CYXE 081300Z".to_string(), "METAR CYXE 081400Z".to_string()]
        );
        assert_eq!(reports[0].taf, vec!["TAF CYXE 081140Z".to_string()]);
    }

    #[test]
    fn test_unknown_type_is_dropped() {
        let records = vec![
            record("metar", "CYXE", "METAR CYXE 081300Z"),
            record("metar", "CYXE", "METAR CYXE 081400Z"),
            record("taf", "CYXE", "TAF CYXE 081140Z"),
            record("notam", "CYXE", "RWY 09/27 CLSD"),
        ];

        let reports = merge_reports(&records);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].metar.len(), 2);
        assert_eq!(reports[0].taf.len(), 1);
        assert!(!reports[0].metar.iter().any(|m| m.contains("CLSD")));
    }

    #[test]
    fn test_unknown_type_for_new_site_creates_nothing() {
        let records = vec![record("sigmet", "CYYL", "SIGMET A1")];
        assert!(merge_reports(&records).is_empty());
    }

    #[test]
    fn test_sites_in_first_seen_order() {
        let records = vec![
            record("taf", "cysf", "TAF CYSF"),
            record("metar", "CYXE", "METAR CYXE"),
            record("metar", "CYSF", "METAR CYSF"),
            record("metar", "", "METAR ???"),
        ];

        let reports = merge_reports(&records);
        let order: Vec<&str> = reports.iter().map(|r| r.site.as_str()).collect();
        assert_eq!(order, vec!["CYSF", "CYXE"]);
        assert_eq!(reports[0].metar, vec!["METAR CYSF".to_string()]);
        assert_eq!(reports[0].taf, vec!["TAF CYSF".to_string()]);
    }

    #[test]
    fn test_every_requested_site_gets_a_report() {
        let records = [
            record("metar", "CYXE", "METAR CYXE 1"),
            record("metar", "CYQR", "METAR CYQR 1"),
        ];
        let sites: Vec<SiteCode> = ["CYYL", "CYXE", "CYYL"]
            .iter()
            .map(|c| SiteCode::new(c).unwrap())
            .collect();

        let reports = reports_for_request(merge_reports(&records), &sites);

        let served: Vec<&str> = reports.iter().map(|r| r.site.as_str()).collect();
        assert_eq!(served, vec!["CYYL", "CYXE"]);
        assert!(reports[0].is_empty());
        assert_eq!(reports[1].metar, vec!["METAR CYXE 1".to_string()]);
    }
}
