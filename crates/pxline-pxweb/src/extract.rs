//! Query execution: single-shot and batched extraction
//!
//! Batches run strictly in order on the calling thread with a fixed pause
//! between requests. A failed batch is recorded in its [`BatchOutcome`] and
//! skipped; it is never retried.

use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;

use crate::batch::chunk;
use crate::error::ExtractError;
use crate::model::{DatasetMetadata, PxWebQuery, QueryConfig, RawDataset};
use crate::profile::TableProfile;
use crate::query::{build_default, build_from_config, build_latest};
use crate::validate::validate;

/// Pause between consecutive batch requests when the caller does not choose
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Response format requested when the caller does not choose
pub const DEFAULT_FORMAT: &str = "json-stat2";

/// Sends serialized queries to the data endpoint.
pub trait Transport {
    /// POST `body` as JSON to `url`; `Ok` only for HTTP 200.
    fn post_json(&self, url: &str, body: String) -> Result<String, ExtractError>;

    /// Wait between batch requests.
    fn pause(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Transport over the shared reqwest client (redirects followed).
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn post_json(&self, url: &str, body: String) -> Result<String, ExtractError> {
        Ok(pxline_core::post_json(url, body)?)
    }
}

/// Result of one planned batch
#[derive(Debug)]
pub struct BatchOutcome {
    /// 0-based position in the plan
    pub index: usize,
    pub postal_codes: Vec<String>,
    pub result: Result<RawDataset, ExtractError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// All batch outcomes of one run, in plan order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
    pub dropped_postal_codes: usize,
    pub dropped_years: usize,
    pub dropped_building_types: usize,
}

impl BatchReport {
    /// Number of batches planned (and attempted)
    pub fn planned(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.planned() - self.succeeded()
    }

    /// Every planned batch came back
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    /// Failed batches with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&BatchOutcome, &ExtractError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o, e)))
    }

    /// Successful results in batch order; failures are discarded.
    pub fn into_datasets(self) -> Vec<RawDataset> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .collect()
    }
}

/// Executes PX-Web queries against one endpoint family.
pub struct Extractor<T = HttpTransport> {
    transport: T,
    profile: TableProfile,
    delay: Duration,
    progress: ProgressBar,
}

impl Extractor<HttpTransport> {
    /// HTTP extractor with the default profile and delay
    pub fn new() -> Self {
        Self::with_transport(HttpTransport)
    }
}

impl Default for Extractor<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Extractor<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            profile: TableProfile::default(),
            delay: DEFAULT_DELAY,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn profile(mut self, profile: TableProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Bar advanced once per finished batch (length set by the run)
    pub fn progress(mut self, pb: ProgressBar) -> Self {
        self.progress = pb;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whole table in one request (every value of every variable).
    ///
    /// Best-effort: large tables can exceed the server's cell limit, in
    /// which case the request is rejected. Any failure is returned.
    pub fn extract(
        &self,
        metadata: &Arc<DatasetMetadata>,
        api_url: &str,
        format: &str,
    ) -> Result<RawDataset, ExtractError> {
        log::info!("Extracting dataset (default query, all values)...");
        let query = build_default(metadata, format);
        log::debug!("Requesting {} cells", query.cell_count());
        let raw = self
            .execute_query(api_url, metadata, &query, format)
            .inspect_err(log_fatal)?;
        log::info!("Extraction complete: {} bytes of {}", raw.size(), raw.format);
        Ok(raw)
    }

    /// Execute a caller-built query once.
    pub fn extract_with_query(
        &self,
        metadata: &Arc<DatasetMetadata>,
        api_url: &str,
        query: &PxWebQuery,
        format: &str,
    ) -> Result<RawDataset, ExtractError> {
        self.execute_query(api_url, metadata, query, format)
            .inspect_err(log_fatal)
    }

    /// Latest `top_n` periods of the time variable, everything else in full.
    pub fn extract_latest(
        &self,
        metadata: &Arc<DatasetMetadata>,
        api_url: &str,
        top_n: u32,
        format: &str,
    ) -> Result<RawDataset, ExtractError> {
        let query = build_latest(metadata, top_n, format)?;
        log::info!("Extracting latest {top_n} period(s)...");
        self.execute_query(api_url, metadata, &query, format)
            .inspect_err(log_fatal)
    }

    /// Validate `config`, split postal codes into batches of `batch_size`
    /// and run one request per batch.
    ///
    /// Only an invalid batch size fails the call; per-batch failures land in
    /// the report. Compare `planned()` with `succeeded()` to spot gaps.
    pub fn extract_batched(
        &self,
        metadata: &Arc<DatasetMetadata>,
        api_url: &str,
        config: &QueryConfig,
        batch_size: usize,
        format: &str,
    ) -> Result<BatchReport, ExtractError> {
        if batch_size == 0 {
            return Err(ExtractError::InvalidBatchSize(batch_size));
        }

        let validated = validate(metadata, config, &self.profile);
        if validated.is_empty() {
            log::warn!("No postal codes or years left after validation, nothing to request");
        }
        let valid = &validated.config;
        let batches = chunk(&valid.postal_codes, batch_size)?;
        log::info!(
            "Extracting {} postal codes in {} batch(es), years: {}",
            valid.postal_codes.len(),
            batches.len(),
            valid.years.join(",")
        );

        self.progress.set_length(batches.len() as u64);
        let mut outcomes = Vec::with_capacity(batches.len());

        for (i, batch) in batches.iter().enumerate() {
            let (first, last) = (&batch[0], &batch[batch.len() - 1]);
            log::info!(
                "Batch {}/{}: {} postal codes ({first}-{last})",
                i + 1,
                batches.len(),
                batch.len()
            );
            self.progress.set_message(format!("{first}-{last}"));

            let batch_config = QueryConfig {
                postal_codes: batch.to_vec(),
                ..valid.clone()
            };
            let query = build_from_config(&batch_config, format, &self.profile);
            log::debug!("  {} cells", query.cell_count());

            let result = self.execute_query(api_url, metadata, &query, format);
            match &result {
                Ok(raw) => log::info!("  -> {} bytes", raw.size()),
                Err(e) => log::warn!("  -> Batch {} failed: {e}", i + 1),
            }
            outcomes.push(BatchOutcome {
                index: i,
                postal_codes: batch_config.postal_codes,
                result,
            });
            self.progress.inc(1);

            if i + 1 < batches.len() {
                self.transport.pause(self.delay);
            }
        }

        let report = BatchReport {
            outcomes,
            dropped_postal_codes: validated.dropped_postal_codes,
            dropped_years: validated.dropped_years,
            dropped_building_types: validated.dropped_building_types,
        };
        self.progress.finish_and_clear();
        log::info!(
            "Extraction complete: {}/{} batches succeeded",
            report.succeeded(),
            report.planned()
        );
        Ok(report)
    }

    /// Serialize `query`, POST it, and wrap the body as a [`RawDataset`].
    pub fn execute_query(
        &self,
        api_url: &str,
        metadata: &Arc<DatasetMetadata>,
        query: &PxWebQuery,
        format: &str,
    ) -> Result<RawDataset, ExtractError> {
        let body = serde_json::to_string(query)?;
        let data = self.transport.post_json(api_url, body)?;
        Ok(RawDataset {
            format: format.to_string(),
            data,
            metadata: Arc::clone(metadata),
        })
    }
}

fn log_fatal(e: &ExtractError) {
    log::error!("Failed to extract dataset: {e}");
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pxline_core::HttpError;

    use super::*;
    use crate::model::Variable;

    thread_local! {
        static LOGS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    /// Collects records per test thread
    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            LOGS.with(|l| l.borrow_mut().push((record.level(), record.args().to_string())));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    fn capture_logs() {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
        LOGS.with(|l| l.borrow_mut().clear());
    }

    fn logged_at(level: log::Level) -> Vec<String> {
        LOGS.with(|l| {
            l.borrow()
                .iter()
                .filter(|(lvl, _)| *lvl == level)
                .map(|(_, msg)| msg.clone())
                .collect()
        })
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Request(PxWebQuery),
        Pause(Duration),
    }

    /// Records every request and pause; fails the requests listed in `fail_on` (0-based).
    #[derive(Default)]
    struct FakeTransport {
        events: RefCell<Vec<Event>>,
        fail_on: Vec<usize>,
    }

    impl FakeTransport {
        fn failing(fail_on: &[usize]) -> Self {
            Self {
                fail_on: fail_on.to_vec(),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<PxWebQuery> {
            self.events
                .borrow()
                .iter()
                .filter_map(|e| match e {
                    Event::Request(q) => Some(q.clone()),
                    Event::Pause(_) => None,
                })
                .collect()
        }
    }

    impl Transport for FakeTransport {
        fn post_json(&self, _url: &str, body: String) -> Result<String, ExtractError> {
            let query: PxWebQuery = serde_json::from_str(&body).unwrap();
            let n = self.requests().len();
            self.events.borrow_mut().push(Event::Request(query));
            if self.fail_on.contains(&n) {
                return Err(HttpError::Status {
                    status: 503,
                    body: "Service Unavailable".to_string(),
                }
                .into());
            }
            Ok(format!("response {n}"))
        }

        fn pause(&self, delay: Duration) {
            self.events.borrow_mut().push(Event::Pause(delay));
        }
    }

    fn postal_codes(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{:05}", i * 10)).collect()
    }

    fn var(code: &str, values: Vec<String>) -> Variable {
        Variable {
            code: code.to_string(),
            text: code.to_string(),
            value_texts: values.clone(),
            values,
            elimination: None,
            time: None,
        }
    }

    fn metadata(postal: usize) -> Arc<DatasetMetadata> {
        Arc::new(DatasetMetadata {
            title: "Prices".to_string(),
            variables: vec![
                var("Vuosi", vec!["2023".into(), "2024".into()]),
                var("Postinumero", postal_codes(postal)),
                var("Talotyyppi", vec!["1".into(), "2".into(), "3".into(), "5".into()]),
                var("Tiedot", vec!["keskihinta_aritm_nw".into(), "lkm_julk20".into()]),
            ],
            source: None,
            updated: None,
            description: None,
        })
    }

    fn postal_batch_sizes(transport: &FakeTransport) -> Vec<usize> {
        transport
            .requests()
            .iter()
            .map(|q| q.selection("Postinumero").unwrap().values.len())
            .collect()
    }

    #[test]
    fn sixty_five_codes_three_requests_two_pauses() {
        let meta = metadata(65);
        let config = QueryConfig::new(postal_codes(65), vec!["2024".into()]);
        let extractor = Extractor::with_transport(FakeTransport::default());

        let report = extractor
            .extract_batched(&meta, "http://px.test/table.px", &config, 30, DEFAULT_FORMAT)
            .unwrap();

        assert_eq!(report.planned(), 3);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(postal_batch_sizes(extractor.transport()), [30, 30, 5]);

        let events = extractor.transport().events.borrow();
        let kinds: Vec<&str> = events
            .iter()
            .map(|e| match e {
                Event::Request(_) => "req",
                Event::Pause(_) => "pause",
            })
            .collect();
        assert_eq!(kinds, ["req", "pause", "req", "pause", "req"]);
        assert!(events.contains(&Event::Pause(DEFAULT_DELAY)));
    }

    #[test]
    fn batches_keep_postal_code_order() {
        let meta = metadata(65);
        let codes = postal_codes(65);
        let config = QueryConfig::new(codes.clone(), vec!["2024".into()]);
        let extractor = Extractor::with_transport(FakeTransport::default());
        extractor
            .extract_batched(&meta, "http://px.test", &config, 30, DEFAULT_FORMAT)
            .unwrap();

        let sent: Vec<String> = extractor
            .transport()
            .requests()
            .into_iter()
            .flat_map(|q| q.selection("Postinumero").unwrap().values.clone())
            .collect();
        assert_eq!(sent, codes);
    }

    #[test]
    fn failed_middle_batch_is_skipped() {
        let meta = metadata(65);
        let config = QueryConfig::new(postal_codes(65), vec!["2024".into()]);
        let extractor = Extractor::with_transport(FakeTransport::failing(&[1]));

        let report = extractor
            .extract_batched(&meta, "http://px.test", &config, 30, DEFAULT_FORMAT)
            .unwrap();

        assert_eq!(report.planned(), 3);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_complete());
        let (failed, err) = report.failures().next().unwrap();
        assert_eq!(failed.index, 1);
        assert_eq!(err.status(), Some(503));

        let datasets = report.into_datasets();
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].data, "response 0");
        assert_eq!(datasets[1].data, "response 2");
        // Third request still went out after the failure
        assert_eq!(extractor.transport().requests().len(), 3);
    }

    #[test]
    fn every_batch_failing_still_returns_report() {
        let meta = metadata(10);
        let config = QueryConfig::new(postal_codes(10), vec!["2024".into()]);
        let extractor = Extractor::with_transport(FakeTransport::failing(&[0, 1, 2]));
        let report = extractor
            .extract_batched(&meta, "http://px.test", &config, 4, DEFAULT_FORMAT)
            .unwrap();
        assert_eq!(report.planned(), 3);
        assert_eq!(report.succeeded(), 0);
        assert!(report.into_datasets().is_empty());
    }

    #[test]
    fn zero_batch_size_rejected_before_any_request() {
        let meta = metadata(5);
        let config = QueryConfig::new(postal_codes(5), vec!["2024".into()]);
        let extractor = Extractor::with_transport(FakeTransport::default());
        let err = extractor
            .extract_batched(&meta, "http://px.test", &config, 0, DEFAULT_FORMAT)
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidBatchSize(0)));
        assert!(extractor.transport().events.borrow().is_empty());
    }

    #[test]
    fn unknown_codes_dropped_before_batching() {
        let meta = metadata(3);
        let mut codes = postal_codes(3);
        codes.push("99999".into());
        let config = QueryConfig::new(codes, vec!["2024".into(), "1999".into()])
            .with_building_types(vec!["1".into(), "9".into(), "8".into()]);
        let extractor = Extractor::with_transport(FakeTransport::default());
        let report = extractor
            .extract_batched(&meta, "http://px.test", &config, 30, DEFAULT_FORMAT)
            .unwrap();

        assert_eq!(report.dropped_postal_codes, 1);
        assert_eq!(report.dropped_years, 1);
        assert_eq!(report.dropped_building_types, 2);
        let sent = &extractor.transport().requests()[0];
        assert_eq!(sent.selection("Postinumero").unwrap().values.len(), 3);
        assert_eq!(sent.selection("Vuosi").unwrap().values, ["2024"]);
        assert_eq!(sent.selection("Talotyyppi").unwrap().values, ["1"]);
    }

    #[test]
    fn nothing_valid_means_no_requests() {
        let meta = metadata(3);
        let config = QueryConfig::new(vec!["99999".into()], vec!["2024".into()]);
        let extractor = Extractor::with_transport(FakeTransport::default());
        let report = extractor
            .extract_batched(&meta, "http://px.test", &config, 30, DEFAULT_FORMAT)
            .unwrap();
        assert_eq!(report.planned(), 0);
        assert!(extractor.transport().events.borrow().is_empty());
    }

    #[test]
    fn custom_delay_is_used() {
        let meta = metadata(4);
        let config = QueryConfig::new(postal_codes(4), vec!["2024".into()]);
        let extractor =
            Extractor::with_transport(FakeTransport::default()).delay(Duration::from_millis(5));
        extractor
            .extract_batched(&meta, "http://px.test", &config, 2, DEFAULT_FORMAT)
            .unwrap();
        let events = extractor.transport().events.borrow();
        assert!(events.contains(&Event::Pause(Duration::from_millis(5))));
    }

    #[test]
    fn single_shot_failure_is_fatal() {
        let meta = metadata(3);
        let extractor = Extractor::with_transport(FakeTransport::failing(&[0]));
        let err = extractor
            .extract(&meta, "http://px.test", DEFAULT_FORMAT)
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn single_shot_selects_all_values() {
        let meta = metadata(3);
        let extractor = Extractor::with_transport(FakeTransport::default());
        let raw = extractor
            .extract(&meta, "http://px.test", DEFAULT_FORMAT)
            .unwrap();
        assert_eq!(raw.format, "json-stat2");
        assert!(Arc::ptr_eq(&raw.metadata, &meta));
        let sent = &extractor.transport().requests()[0];
        assert_eq!(sent, &build_default(&meta, DEFAULT_FORMAT));
    }

    #[test]
    fn latest_rejects_zero_without_request() {
        let meta = metadata(3);
        let extractor = Extractor::with_transport(FakeTransport::default());
        let err = extractor
            .extract_latest(&meta, "http://px.test", 0, DEFAULT_FORMAT)
            .unwrap_err();
        assert!(err.is_input_error());
        assert!(extractor.transport().requests().is_empty());
    }

    #[test]
    fn extract_with_query_sends_query_verbatim() {
        let meta = metadata(3);
        let query = build_from_config(
            &QueryConfig::new(vec!["00010".into()], vec!["2024".into()]),
            "csv",
            &TableProfile::default(),
        );
        let extractor = Extractor::with_transport(FakeTransport::default());
        let raw = extractor
            .extract_with_query(&meta, "http://px.test", &query, "csv")
            .unwrap();
        assert_eq!(raw.format, "csv");
        assert_eq!(extractor.transport().requests(), [query]);
    }

    #[test]
    fn single_shot_failures_logged_as_errors() {
        capture_logs();
        let meta = metadata(3);
        let extractor = Extractor::with_transport(FakeTransport::failing(&[0, 1, 2]));
        extractor
            .extract(&meta, "http://px.test", DEFAULT_FORMAT)
            .unwrap_err();
        extractor
            .extract_latest(&meta, "http://px.test", 1, DEFAULT_FORMAT)
            .unwrap_err();
        let query = build_default(&meta, DEFAULT_FORMAT);
        extractor
            .extract_with_query(&meta, "http://px.test", &query, DEFAULT_FORMAT)
            .unwrap_err();

        let errors = logged_at(log::Level::Error);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|m| m.contains("HTTP 503")));
    }

    #[test]
    fn batch_failures_logged_as_warnings() {
        capture_logs();
        let meta = metadata(4);
        let config = QueryConfig::new(postal_codes(4), vec!["2024".into()]);
        let extractor = Extractor::with_transport(FakeTransport::failing(&[1]));
        extractor
            .extract_batched(&meta, "http://px.test", &config, 2, DEFAULT_FORMAT)
            .unwrap();

        assert!(logged_at(log::Level::Error).is_empty());
        let warnings = logged_at(log::Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Batch 2 failed"));
    }
}
