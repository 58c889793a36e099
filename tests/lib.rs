//! Shared fixtures for behavioural tests.
//!
//! [`FakeTradeSource`] is an in-memory trade client with a tiny catalog,
//! generated monthly series, call counters and scripted failures.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub use std::sync::Arc;
pub use tradelens_core::{
    CacheMode, Catalog, CodeMatch, Country, FetchRequest, Flow, HsCode, PipelineConfig,
    PipelineError, PipelineInputs, RawRecord, RetryConfig, SearchRequest, Session, SourceFuture,
    TradeDataSource, TradePipeline, TradeSourceError, YearMonth,
};

const FIXTURE_CATALOG: &str = r#"{
    "products": [
        { "code": "08", "description": "EDIBLE FRUIT AND NUTS" },
        { "code": "0804", "description": "DATES, FIGS, PINEAPPLES, AVOCADOS" },
        { "code": "0805", "description": "CITRUS FRUIT, FRESH OR DRIED" },
        { "code": "080440", "description": "AVOCADOS, FRESH OR DRIED" }
    ],
    "countries": [
        { "name": "Mexico", "code": "2010", "iso2": "MX" },
        { "name": "Canada", "code": "1220", "iso2": "CA" }
    ]
}"#;

pub fn ym(value: &str) -> YearMonth {
    YearMonth::parse(value).expect("valid month")
}

pub fn code(value: &str) -> HsCode {
    HsCode::parse(value).expect("valid code")
}

pub fn inputs(flow: Flow, country: &str, hs: &str, start: &str, end: &str) -> PipelineInputs {
    PipelineInputs::new(flow, country, code(hs), ym(start), ym(end)).expect("valid inputs")
}

/// Monthly value the fake reports for `code`: the code's last two digits
/// times `100 * (year - 2019)`. Every month of a year is equal, so growth is
/// 100% across 2020→2021 and 50% across 2021→2022.
pub fn generated_value(code: &HsCode, month: YearMonth) -> f64 {
    let suffix = &code.as_str()[code.len() - 2..];
    let weight = suffix.parse::<f64>().unwrap_or(1.0);
    weight * 100.0 * f64::from(month.year() - 2019)
}

/// Scripted in-memory trade client.
pub struct FakeTradeSource {
    catalog: Catalog,
    scripted_failures: Mutex<VecDeque<TradeSourceError>>,
    overrides: HashMap<HsCode, Vec<RawRecord>>,
    requests: Mutex<Vec<FetchRequest>>,
    period_calls: AtomicUsize,
    product_calls: AtomicUsize,
    children_calls: AtomicUsize,
    country_calls: AtomicUsize,
}

impl Default for FakeTradeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTradeSource {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::from_json(FIXTURE_CATALOG).expect("fixture catalog"),
            scripted_failures: Mutex::new(VecDeque::new()),
            overrides: HashMap::new(),
            requests: Mutex::new(Vec::new()),
            period_calls: AtomicUsize::new(0),
            product_calls: AtomicUsize::new(0),
            children_calls: AtomicUsize::new(0),
            country_calls: AtomicUsize::new(0),
        }
    }

    /// The next `times` period fetches fail with `error`.
    pub fn failing(self, times: usize, error: TradeSourceError) -> Self {
        self.scripted_failures
            .lock()
            .expect("not poisoned")
            .extend(std::iter::repeat(error).take(times));
        self
    }

    /// Period fetches for exactly `[hs]` return `rows` instead of generated data.
    pub fn with_rows(mut self, hs: &str, rows: Vec<RawRecord>) -> Self {
        self.overrides.insert(code(hs), rows);
        self
    }

    pub fn period_calls(&self) -> usize {
        self.period_calls.load(Ordering::SeqCst)
    }

    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    pub fn children_calls(&self) -> usize {
        self.children_calls.load(Ordering::SeqCst)
    }

    pub fn country_calls(&self) -> usize {
        self.country_calls.load(Ordering::SeqCst)
    }

    /// Requests that reached the fake, including failed attempts.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().expect("not poisoned").clone()
    }

    fn period(&self, req: &FetchRequest) -> Result<Vec<RawRecord>, TradeSourceError> {
        self.period_calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("not poisoned")
            .push(req.clone());

        if let Some(error) = self
            .scripted_failures
            .lock()
            .expect("not poisoned")
            .pop_front()
        {
            return Err(error);
        }

        if let [single] = req.codes.as_slice() {
            if let Some(rows) = self.overrides.get(single) {
                return Ok(rows.clone());
            }
        }

        let mut rows = Vec::new();
        for hs in &req.codes {
            let description = self.catalog.product(hs).unwrap_or("UNKNOWN");
            let mut month = req.start;
            while month <= req.end {
                rows.push(
                    RawRecord::new()
                        .with("date", month.format())
                        .with(req.flow.value_field(), generated_value(hs, month))
                        .with("product_code", hs.as_str())
                        .with("product_name", description)
                        .with("country_code", req.country_code.as_str()),
                );
                month = month.add_months(1);
            }
        }
        Ok(rows)
    }

    fn country(&self, found: Option<&Country>, identifier: &str) -> SourceFuture<'_, Country> {
        self.country_calls.fetch_add(1, Ordering::SeqCst);
        let result = found
            .cloned()
            .ok_or_else(|| TradeSourceError::not_found(format!("no match for '{identifier}'")));
        Box::pin(async move { result })
    }
}

impl TradeDataSource for FakeTradeSource {
    fn exports_on_period<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a, Vec<RawRecord>> {
        let result = self.period(req);
        Box::pin(async move { result })
    }

    fn imports_on_period<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a, Vec<RawRecord>> {
        let result = self.period(req);
        Box::pin(async move { result })
    }

    fn product<'a>(&'a self, hs: &'a HsCode) -> SourceFuture<'a, String> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .catalog
            .product(hs)
            .map(str::to_owned)
            .ok_or_else(|| TradeSourceError::not_found(format!("unknown HS code {hs}")));
        Box::pin(async move { result })
    }

    fn children_codes<'a>(&'a self, hs: &'a HsCode) -> SourceFuture<'a, BTreeMap<HsCode, String>> {
        self.children_calls.fetch_add(1, Ordering::SeqCst);
        let children = self.catalog.children(hs);
        Box::pin(async move { Ok(children) })
    }

    fn country_by_name<'a>(&'a self, name: &'a str) -> SourceFuture<'a, Country> {
        self.country(self.catalog.country_by_name(name), name)
    }

    fn country_by_code<'a>(&'a self, code: &'a str) -> SourceFuture<'a, Country> {
        self.country(self.catalog.country_by_code(code), code)
    }

    fn country_by_iso2<'a>(&'a self, iso2: &'a str) -> SourceFuture<'a, Country> {
        self.country(self.catalog.country_by_iso2(iso2), iso2)
    }

    fn search_for_code<'a>(&'a self, req: &'a SearchRequest) -> SourceFuture<'a, Vec<CodeMatch>> {
        let matches = self.catalog.search(req);
        Box::pin(async move { Ok(matches) })
    }
}

/// Pipeline over `source` with the given config.
pub fn pipeline(source: &Arc<FakeTradeSource>, config: PipelineConfig) -> TradePipeline {
    let source: Arc<dyn TradeDataSource> = source.clone();
    TradePipeline::with_config(source, config)
}
