//! Request coordinator
//!
//! Decides which provider serves each requested site, runs the resulting
//! upstream calls concurrently, and folds their results into one
//! [`FetchOutcome`]. A failing call only affects the sites it was asked for.

use std::collections::HashSet;
use std::pin::pin;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CoordinatorConfig;
use crate::error::{AvwxError, ErrorKind};
use crate::models::{SiteCode, WeatherReport};
use crate::providers::{Capability, Provider, ProviderRegistry};

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Upper bound on upstream calls in flight at once
    pub max_concurrency: usize,
    /// Calls still running after this long are abandoned
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            timeout: (config.deadline_seconds > 0)
                .then(|| Duration::from_secs(u64::from(config.deadline_seconds))),
            cancel: CancellationToken::new(),
        }
    }
}

/// A site that could not be served, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteFailure {
    pub site: SiteCode,
    pub provider: String,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchOutcome {
    pub reports: Vec<WeatherReport>,
    pub failures: Vec<SiteFailure>,
}

impl FetchOutcome {
    fn record_failure(&mut self, call: &PlannedCall<'_>, error: &AvwxError) {
        self.failures
            .extend(call.sites.iter().map(|site| SiteFailure {
                site: site.clone(),
                provider: call.provider.name().to_string(),
                kind: error.kind(),
                message: error.to_string(),
            }));
    }
}

/// One upstream call: a batch for a batch provider, a single site otherwise
#[derive(Debug)]
struct PlannedCall<'a> {
    provider: &'a Provider,
    sites: Vec<SiteCode>,
}

impl PlannedCall<'_> {
    async fn execute(&self) -> crate::Result<Vec<WeatherReport>> {
        match self.provider.capability() {
            Capability::Batch(fetcher) => fetcher.fetch_batch(&self.sites).await,
            Capability::Single(fetcher) => match self.sites.first() {
                Some(site) => fetcher.fetch_single(site).await.map(|report| vec![report]),
                None => Ok(Vec::new()),
            },
        }
    }
}

/// Work out the calls for `sites`: batch calls in registry order, then one
/// call per single-provider site in first-seen order.
fn plan_calls<'a>(registry: &'a ProviderRegistry, sites: &[SiteCode]) -> Vec<PlannedCall<'a>> {
    let mut seen = HashSet::new();
    let mut batched: Vec<Vec<SiteCode>> = vec![Vec::new(); registry.len()];
    let mut singles = Vec::new();

    for site in sites.iter().filter(|site| seen.insert(*site)) {
        let Some(index) = registry.claimant(site) else {
            debug!(%site, "No provider supports site");
            continue;
        };
        let provider = &registry.providers()[index];
        if provider.is_batch() {
            batched[index].push(site.clone());
        } else {
            singles.push(PlannedCall {
                provider,
                sites: vec![site.clone()],
            });
        }
    }

    registry
        .providers()
        .iter()
        .zip(batched)
        .filter(|(_, sites)| !sites.is_empty())
        .map(|(provider, sites)| PlannedCall { provider, sites })
        .chain(singles)
        .collect()
}

/// Fetch reports for `sites` from the providers in `registry`.
///
/// Never fails as a whole: every site that could not be served shows up in
/// [`FetchOutcome::failures`], and reports from calls that did finish are
/// always kept, including when the deadline passes or `options.cancel` fires.
pub async fn fetch_reports(
    registry: &ProviderRegistry,
    sites: &[SiteCode],
    options: &FetchOptions,
) -> FetchOutcome {
    let plan = plan_calls(registry, sites);
    info!(
        requested = sites.len(),
        calls = plan.len(),
        "Dispatching weather report requests"
    );

    let mut results: Vec<Option<crate::Result<Vec<WeatherReport>>>> =
        (0..plan.len()).map(|_| None).collect();

    // Boxed before entering the stream so this future stays `Send`
    let pending: Vec<BoxFuture<'_, (usize, crate::Result<Vec<WeatherReport>>)>> = plan
        .iter()
        .enumerate()
        .map(|(index, call)| async move { (index, call.execute().await) }.boxed())
        .collect();

    let interruption = {
        let mut calls =
            pin!(stream::iter(pending).buffer_unordered(options.max_concurrency.max(1)));
        let drain = async {
            while let Some((index, result)) = calls.next().await {
                results[index] = Some(result);
            }
        };
        let deadline = async {
            match options.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = drain => None,
            () = options.cancel.cancelled() => {
                Some(AvwxError::cancelled("request cancelled before the provider answered"))
            }
            () = deadline => Some(AvwxError::timeout(format!(
                "provider did not answer within {:?}",
                options.timeout.unwrap_or_default()
            ))),
        }
    };

    if let Some(reason) = &interruption {
        warn!("Abandoning outstanding provider calls: {reason}");
    }

    let mut outcome = FetchOutcome::default();
    for (call, result) in plan.iter().zip(results) {
        match result {
            Some(Ok(reports)) => outcome.reports.extend(reports),
            Some(Err(e)) => {
                warn!(
                    provider = call.provider.name(),
                    sites = ?call.sites,
                    "Provider call failed: {e}"
                );
                outcome.record_failure(call, &e);
            }
            None => {
                let reason = interruption
                    .clone()
                    .unwrap_or_else(|| AvwxError::cancelled("call did not complete"));
                outcome.record_failure(call, &reason);
            }
        }
    }

    info!(
        reports = outcome.reports.len(),
        failures = outcome.failures.len(),
        "Finished weather report requests"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{BatchFetch, SingleFetch};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn site(code: &str) -> SiteCode {
        SiteCode::new(code).unwrap()
    }

    fn sites(codes: &[&str]) -> Vec<SiteCode> {
        codes.iter().map(|c| site(c)).collect()
    }

    fn report_for(site: &SiteCode, source: &str) -> WeatherReport {
        let mut report = WeatherReport::new(site.clone());
        report.metar.push(format!("METAR {site} via {source}"));
        report
    }

    #[derive(Default)]
    struct FakeBatch {
        calls: Mutex<Vec<Vec<SiteCode>>>,
        fail: bool,
    }

    #[async_trait]
    impl BatchFetch for FakeBatch {
        async fn fetch_batch(&self, sites: &[SiteCode]) -> crate::Result<Vec<WeatherReport>> {
            self.calls.lock().unwrap().push(sites.to_vec());
            if self.fail {
                return Err(AvwxError::transport("503 Service Unavailable"));
            }
            Ok(sites.iter().map(|s| report_for(s, "batch")).collect())
        }
    }

    #[derive(Default)]
    struct FakeSingle {
        calls: Mutex<Vec<SiteCode>>,
        fail_on: Option<SiteCode>,
        slow: Vec<(SiteCode, Duration)>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl SingleFetch for FakeSingle {
        async fn fetch_single(&self, site: &SiteCode) -> crate::Result<WeatherReport> {
            self.calls.lock().unwrap().push(site.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = self
                .slow
                .iter()
                .find(|(s, _)| s == site)
                .map_or(Duration::from_millis(5), |(_, d)| *d);
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on.as_ref() == Some(site) {
                return Err(AvwxError::validation(format!("no METAR found for {site}")));
            }
            Ok(report_for(site, "single"))
        }
    }

    fn registry(batch: &Arc<FakeBatch>, single: &Arc<FakeSingle>) -> ProviderRegistry {
        ProviderRegistry::new(vec![
            Provider::batch("batch", sites(&["CYXE", "CYYL", "CYSF"]), batch.clone()),
            Provider::single("single", sites(&["CYSF", "CJY4", "CZFD"]), single.clone()),
        ])
    }

    #[tokio::test]
    async fn test_batch_subset_gets_exactly_one_call() {
        let batch = Arc::new(FakeBatch::default());
        let single = Arc::new(FakeSingle::default());
        let registry = registry(&batch, &single);

        let outcome = fetch_reports(
            &registry,
            &sites(&["CYXE", "CJY4", "CYYL", "cyxe", "CYSF"]),
            &FetchOptions::default(),
        )
        .await;

        let batch_calls = batch.calls.lock().unwrap().clone();
        assert_eq!(batch_calls, vec![sites(&["CYXE", "CYYL", "CYSF"])]);
        assert_eq!(*single.calls.lock().unwrap(), sites(&["CJY4"]));
        assert_eq!(outcome.reports.len(), 4);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_site_yields_nothing() {
        let batch = Arc::new(FakeBatch::default());
        let single = Arc::new(FakeSingle::default());
        let registry = registry(&batch, &single);

        let outcome =
            fetch_reports(&registry, &sites(&["KJFK", "CYXE"]), &FetchOptions::default()).await;

        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].site, site("CYXE"));
        assert!(outcome.failures.is_empty());
        assert!(single.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_unsupported_sites_makes_no_calls() {
        let batch = Arc::new(FakeBatch::default());
        let single = Arc::new(FakeSingle::default());
        let registry = registry(&batch, &single);

        let outcome = fetch_reports(&registry, &sites(&["KJFK"]), &FetchOptions::default()).await;

        assert!(outcome.reports.is_empty());
        assert!(outcome.failures.is_empty());
        assert!(batch.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_is_isolated_to_its_sites() {
        let batch = Arc::new(FakeBatch {
            fail: true,
            ..Default::default()
        });
        let single = Arc::new(FakeSingle::default());
        let registry = registry(&batch, &single);

        let outcome = fetch_reports(
            &registry,
            &sites(&["CYXE", "CJY4", "CYYL"]),
            &FetchOptions::default(),
        )
        .await;

        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].site, site("CJY4"));

        let failed: Vec<&str> = outcome.failures.iter().map(|f| f.site.as_str()).collect();
        assert_eq!(failed, vec!["CYXE", "CYYL"]);
        assert!(outcome.failures.iter().all(|f| f.kind == ErrorKind::Transport));
        assert!(outcome.failures.iter().all(|f| f.provider == "batch"));
    }

    #[tokio::test]
    async fn test_single_failure_does_not_abort_siblings() {
        let batch = Arc::new(FakeBatch::default());
        let single = Arc::new(FakeSingle {
            fail_on: Some(site("CJY4")),
            ..Default::default()
        });
        let registry = registry(&batch, &single);

        let outcome = fetch_reports(
            &registry,
            &sites(&["CJY4", "CZFD", "CYXE"]),
            &FetchOptions::default(),
        )
        .await;

        let served: Vec<&str> = outcome.reports.iter().map(|r| r.site.as_str()).collect();
        assert_eq!(served, vec!["CYXE", "CZFD"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].site, site("CJY4"));
        assert_eq!(outcome.failures[0].kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_first_registered_provider_wins_regardless_of_kind() {
        let batch = Arc::new(FakeBatch::default());
        let single = Arc::new(FakeSingle::default());
        let registry = ProviderRegistry::new(vec![
            Provider::single("single", sites(&["CYSF"]), single.clone()),
            Provider::batch("batch", sites(&["CYXE", "CYSF"]), batch.clone()),
        ]);

        let outcome =
            fetch_reports(&registry, &sites(&["CYSF", "CYXE"]), &FetchOptions::default()).await;

        assert_eq!(*batch.calls.lock().unwrap(), vec![sites(&["CYXE"])]);
        assert_eq!(*single.calls.lock().unwrap(), sites(&["CYSF"]));
        assert_eq!(outcome.reports.len(), 2);
    }

    #[tokio::test]
    async fn test_later_batch_provider_never_sees_claimed_sites() {
        let first = Arc::new(FakeBatch::default());
        let second = Arc::new(FakeBatch::default());
        let registry = ProviderRegistry::new(vec![
            Provider::batch("first", sites(&["CYXE", "CYYL"]), first.clone()),
            Provider::batch("second", sites(&["CYYL", "CYQR"]), second.clone()),
        ]);

        fetch_reports(
            &registry,
            &sites(&["CYYL", "CYQR", "CYXE"]),
            &FetchOptions::default(),
        )
        .await;

        assert_eq!(*first.calls.lock().unwrap(), vec![sites(&["CYYL", "CYXE"])]);
        assert_eq!(*second.calls.lock().unwrap(), vec![sites(&["CYQR"])]);
    }

    #[tokio::test]
    async fn test_reports_keep_plan_order_when_calls_finish_out_of_order() {
        let batch = Arc::new(FakeBatch::default());
        let single = Arc::new(FakeSingle {
            slow: vec![(site("CJY4"), Duration::from_millis(60))],
            ..Default::default()
        });
        let registry = registry(&batch, &single);

        let outcome = fetch_reports(
            &registry,
            &sites(&["CJY4", "CZFD", "CYXE"]),
            &FetchOptions::default(),
        )
        .await;

        let served: Vec<&str> = outcome.reports.iter().map(|r| r.site.as_str()).collect();
        assert_eq!(served, vec!["CYXE", "CJY4", "CZFD"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let single = Arc::new(FakeSingle {
            slow: ["CJY4", "CZFD", "CJW4", "CJT4", "CYHB", "CYBE"]
                .iter()
                .map(|c| (site(c), Duration::from_millis(20)))
                .collect(),
            ..Default::default()
        });
        let registry = ProviderRegistry::new(vec![Provider::single(
            "single",
            sites(&["CJY4", "CZFD", "CJW4", "CJT4", "CYHB", "CYBE"]),
            single.clone(),
        )]);
        let options = FetchOptions {
            max_concurrency: 2,
            ..Default::default()
        };

        let outcome = fetch_reports(
            &registry,
            &sites(&["CJY4", "CZFD", "CJW4", "CJT4", "CYHB", "CYBE"]),
            &options,
        )
        .await;

        assert_eq!(outcome.reports.len(), 6);
        assert!(single.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert!(single.max_in_flight.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_deadline_keeps_finished_work() {
        let batch = Arc::new(FakeBatch::default());
        let single = Arc::new(FakeSingle {
            slow: vec![(site("CJY4"), Duration::from_secs(30))],
            ..Default::default()
        });
        let registry = registry(&batch, &single);
        let options = FetchOptions {
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        };

        let outcome =
            fetch_reports(&registry, &sites(&["CYXE", "CJY4", "CZFD"]), &options).await;

        let served: Vec<&str> = outcome.reports.iter().map(|r| r.site.as_str()).collect();
        assert_eq!(served, vec!["CYXE", "CZFD"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].site, site("CJY4"));
        assert_eq!(outcome.failures[0].kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_cancellation_reports_unfinished_sites() {
        let single = Arc::new(FakeSingle {
            slow: vec![
                (site("CJY4"), Duration::from_secs(30)),
                (site("CZFD"), Duration::from_secs(30)),
            ],
            ..Default::default()
        });
        let registry = ProviderRegistry::new(vec![Provider::single(
            "single",
            sites(&["CJY4", "CZFD"]),
            single.clone(),
        )]);
        let options = FetchOptions::default();
        options.cancel.cancel();

        let outcome = fetch_reports(&registry, &sites(&["CJY4", "CZFD"]), &options).await;

        assert!(outcome.reports.is_empty());
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome.failures.iter().all(|f| f.kind == ErrorKind::Cancelled));
    }

    #[tokio::test]
    async fn test_fetch_runs_on_a_spawned_task() {
        let batch = Arc::new(FakeBatch::default());
        let single = Arc::new(FakeSingle::default());
        let registry = registry(&batch, &single);

        let handle = tokio::spawn(async move {
            fetch_reports(
                &registry,
                &sites(&["CYXE", "CJY4"]),
                &FetchOptions::default(),
            )
            .await
        });

        let outcome = handle.await.unwrap();
        assert_eq!(outcome.reports.len(), 2);
    }

    #[test]
    fn test_options_from_config() {
        let config = CoordinatorConfig {
            max_concurrency: 8,
            deadline_seconds: 0,
        };
        let options = FetchOptions::from_config(&config);
        assert_eq!(options.max_concurrency, 8);
        assert!(options.timeout.is_none());
    }
}
