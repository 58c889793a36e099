use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::adapters::Catalog;
use crate::config::CensusConfig;
use crate::data_source::{
    CodeMatch, FetchRequest, SearchRequest, SourceFuture, TradeDataSource, TradeSourceError,
};
use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::throttling::Throttle;
use crate::{Country, Flow, HsCode, RawRecord};

/// Census variable names for one flow.
struct FlowColumns {
    value: &'static str,
    commodity: &'static str,
    description: &'static str,
}

const fn columns(flow: Flow) -> FlowColumns {
    match flow {
        Flow::Imports => FlowColumns {
            value: "GEN_VAL_MO",
            commodity: "I_COMMODITY",
            description: "I_COMMODITY_LDESC",
        },
        Flow::Exports => FlowColumns {
            value: "ALL_VAL_MO",
            commodity: "E_COMMODITY",
            description: "E_COMMODITY_LDESC",
        },
    }
}

const COUNTRY_CODE: &str = "CTY_CODE";
const COUNTRY_NAME: &str = "CTY_NAME";
const TIME: &str = "time";

/// Reference lookups (descriptions, children, countries) read the import
/// endpoint; both flows share the same classification.
const REFERENCE_FLOW: Flow = Flow::Imports;

/// Census `COMM_LVL` for a code of the given length.
fn commodity_level(len: usize) -> Option<&'static str> {
    match len {
        2 => Some("HS2"),
        4 => Some("HS4"),
        6 => Some("HS6"),
        10 => Some("HS10"),
        _ => None,
    }
}

/// U.S. Census Bureau international trade adapter.
///
/// Monthly series come from the `intltrade/{imports|exports}/hs` time-series
/// endpoints. Code descriptions and country lookups are answered from the
/// local [`Catalog`] snapshot first and from the Census reference month when
/// the snapshot has no entry. Child codes always come from Census; the
/// snapshot only stands in while the service is unavailable.
#[derive(Clone)]
pub struct CensusAdapter {
    http_client: Arc<dyn HttpClient>,
    catalog: Arc<Catalog>,
    config: CensusConfig,
    throttle: Throttle,
    directory: Arc<OnceCell<Vec<Country>>>,
}

impl CensusAdapter {
    pub fn new(config: CensusConfig, catalog: Catalog) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), config, catalog)
    }

    pub fn with_http_client(
        http_client: Arc<dyn HttpClient>,
        config: CensusConfig,
        catalog: Catalog,
    ) -> Self {
        let throttle = Throttle::per_minute(config.quota_per_minute);
        Self {
            http_client,
            catalog: Arc::new(catalog),
            config,
            throttle,
            directory: Arc::new(OnceCell::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn endpoint(&self, req: &FetchRequest) -> String {
        let names = columns(req.flow);
        let mut url = format!(
            "{}/{}/hs?get={COUNTRY_CODE},{COUNTRY_NAME},{},{},{}&{COUNTRY_CODE}={}&time={}",
            self.config.base_url,
            req.flow.as_str(),
            names.value,
            names.commodity,
            names.description,
            urlencoding::encode(&req.country_code),
            urlencoding::encode(&format!("from {} to {}", req.start, req.end)),
        );
        for code in &req.codes {
            url.push_str(&format!("&{}={}", names.commodity, code.as_str()));
        }
        url
    }

    /// Codes at `level` matching `pattern` (a code, or a prefix ending in `*`).
    fn commodity_endpoint(&self, level: &str, pattern: &str) -> String {
        let names = columns(REFERENCE_FLOW);
        format!(
            "{}/{}/hs?get={},{}&COMM_LVL={level}&{}={pattern}&time={}",
            self.config.base_url,
            REFERENCE_FLOW.as_str(),
            names.commodity,
            names.description,
            names.commodity,
            urlencoding::encode(&self.config.reference_month),
        )
    }

    fn directory_endpoint(&self) -> String {
        format!(
            "{}/{}/hs?get={COUNTRY_CODE},{COUNTRY_NAME}&time={}",
            self.config.base_url,
            REFERENCE_FLOW.as_str(),
            urlencoding::encode(&self.config.reference_month),
        )
    }

    /// Runs one throttled query and returns the decoded table.
    async fn query(&self, endpoint: String) -> Result<Table, TradeSourceError> {
        if let Err(delay) = self.throttle.acquire() {
            return Err(TradeSourceError::rate_limited(format!(
                "census request budget exhausted; retry in {:.2}s",
                delay.as_secs_f64()
            )));
        }

        tracing::debug!(url = %endpoint, "census request");
        let url = match &self.config.api_key {
            Some(key) => format!("{endpoint}&key={}", urlencoding::encode(key)),
            None => endpoint,
        };

        let request = HttpRequest::get(url)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.config.timeout_ms);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| match error.kind() {
                HttpErrorKind::Timeout => {
                    TradeSourceError::timeout(format!("census request timed out: {}", error.message()))
                }
                HttpErrorKind::Connect | HttpErrorKind::Other => TradeSourceError::unavailable(
                    format!("census transport error: {}", error.message()),
                ),
            })?;

        check_status(&response)?;
        if response.status == 204 || response.body.trim().is_empty() {
            return Ok(Table::default());
        }
        Table::parse(&response.body)
    }

    async fn fetch_period(&self, req: &FetchRequest) -> Result<Vec<RawRecord>, TradeSourceError> {
        let table = self.query(self.endpoint(req)).await?;
        parse_rows(&table, req.flow)
    }

    /// Codes at `level` that match `pattern` in the reference month.
    async fn reference_codes(
        &self,
        level: &str,
        pattern: &str,
    ) -> Result<BTreeMap<HsCode, String>, TradeSourceError> {
        let table = self.query(self.commodity_endpoint(level, pattern)).await?;
        if table.is_empty() {
            return Ok(BTreeMap::new());
        }

        let names = columns(REFERENCE_FLOW);
        let code_column = table.column(names.commodity)?;
        let description_column = table.column(names.description)?;

        let mut codes = BTreeMap::new();
        for row in table.rows()? {
            let Some(raw) = row[code_column].as_str() else {
                continue;
            };
            let code = HsCode::parse(raw).map_err(|error| {
                TradeSourceError::malformed(format!("census returned code '{raw}': {error}"))
            })?;
            let description = row[description_column].as_str().unwrap_or_default().trim();
            codes.entry(code).or_insert_with(|| description.to_owned());
        }
        Ok(codes)
    }

    async fn describe(&self, code: &HsCode) -> Result<String, TradeSourceError> {
        if let Some(description) = self.catalog.product(code) {
            return Ok(description.to_owned());
        }
        let unknown = || {
            TradeSourceError::not_found(format!("HS code {code} is not in the classification"))
        };
        let Some(level) = commodity_level(code.len()) else {
            return Err(unknown());
        };

        self.reference_codes(level, code.as_str())
            .await?
            .remove(code)
            .ok_or_else(unknown)
    }

    async fn children(&self, code: &HsCode) -> Result<BTreeMap<HsCode, String>, TradeSourceError> {
        let fetched = match commodity_level(code.len() + 2) {
            Some(level) => self.reference_codes(level, &format!("{code}*")).await,
            None => Ok(BTreeMap::new()),
        };

        match fetched {
            Ok(children) if !children.is_empty() => Ok(children
                .into_iter()
                .filter(|(child, _)| child.parent().as_ref() == Some(code))
                .collect()),
            Ok(_) if self.catalog.product(code).is_some() => Ok(self.catalog.children(code)),
            Ok(_) => Err(TradeSourceError::not_found(format!(
                "HS code {code} is not in the classification"
            ))),
            Err(error) if error.retryable() && self.catalog.product(code).is_some() => {
                tracing::warn!(
                    code = %code,
                    error = %error,
                    "census children lookup failed; using bundled catalog"
                );
                Ok(self.catalog.children(code))
            }
            Err(error) => Err(error),
        }
    }

    /// Every partner country in the reference month, loaded once per adapter.
    async fn directory(&self) -> Result<&[Country], TradeSourceError> {
        let countries = self
            .directory
            .get_or_try_init(|| self.load_directory())
            .await?;
        Ok(countries.as_slice())
    }

    async fn load_directory(&self) -> Result<Vec<Country>, TradeSourceError> {
        let table = self.query(self.directory_endpoint()).await?;
        if table.is_empty() {
            return Ok(Vec::new());
        }
        let code_column = table.column(COUNTRY_CODE)?;
        let name_column = table.column(COUNTRY_NAME)?;

        let mut by_code = BTreeMap::new();
        for row in table.rows()? {
            let (Some(code), Some(name)) = (row[code_column].as_str(), row[name_column].as_str())
            else {
                continue;
            };
            // Aggregates such as "TOTAL FOR ALL COUNTRIES" carry non-numeric codes.
            if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            by_code
                .entry(code.to_owned())
                .or_insert_with(|| name.trim().to_owned());
        }

        let countries = by_code
            .into_iter()
            .filter_map(|(code, name)| Country::new(name, code, "").ok())
            .collect::<Vec<_>>();
        tracing::debug!(countries = countries.len(), "census country directory loaded");
        Ok(countries)
    }

    async fn country_matching(
        &self,
        known: Option<&Country>,
        matches: impl Fn(&Country) -> bool,
        missing: String,
    ) -> Result<Country, TradeSourceError> {
        if let Some(country) = known {
            return Ok(country.clone());
        }
        self.directory()
            .await?
            .iter()
            .find(|country| matches(country))
            .cloned()
            .ok_or_else(|| TradeSourceError::not_found(missing))
    }
}

fn check_status(response: &HttpResponse) -> Result<(), TradeSourceError> {
    match response.status {
        200..=299 => Ok(()),
        429 => Err(TradeSourceError::rate_limited("census rate limit reached")),
        400 => Err(TradeSourceError::invalid_request(format!(
            "census rejected the query: {}",
            response.body.trim()
        ))),
        404 => Err(TradeSourceError::not_found("census endpoint not found")),
        500..=599 => Err(TradeSourceError::unavailable(format!(
            "census returned status {}",
            response.status
        ))),
        status => Err(TradeSourceError::invalid_request(format!(
            "census returned status {status}"
        ))),
    }
}

/// Header row plus data rows, as every Census endpoint returns them.
#[derive(Debug, Default)]
struct Table {
    header: Vec<Value>,
    data: Vec<Vec<Value>>,
}

impl Table {
    fn parse(body: &str) -> Result<Self, TradeSourceError> {
        let mut rows: Vec<Vec<Value>> = serde_json::from_str(body).map_err(|error| {
            TradeSourceError::malformed(format!("failed to parse census response: {error}"))
        })?;
        if rows.is_empty() {
            return Ok(Self::default());
        }
        let header = rows.remove(0);
        Ok(Self { header, data: rows })
    }

    fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    fn column(&self, name: &str) -> Result<usize, TradeSourceError> {
        self.header
            .iter()
            .position(|column| column.as_str() == Some(name))
            .ok_or_else(|| TradeSourceError::malformed(format!("census response has no '{name}' column")))
    }

    /// Data rows, rejecting any whose width differs from the header.
    fn rows(&self) -> Result<&[Vec<Value>], TradeSourceError> {
        if let Some((index, row)) = self
            .data
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.header.len())
        {
            return Err(TradeSourceError::malformed(format!(
                "census row {index} has {} cells, header has {}",
                row.len(),
                self.header.len()
            )));
        }
        Ok(&self.data)
    }
}

/// Converts a period table into records.
fn parse_rows(table: &Table, flow: Flow) -> Result<Vec<RawRecord>, TradeSourceError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }

    let names = columns(flow);
    let time = table.column(TIME)?;
    let value = table.column(names.value)?;
    let commodity = table.column(names.commodity)?;
    let description = table.column(names.description)?;
    let country_code = table.column(COUNTRY_CODE)?;
    let country_name = table.column(COUNTRY_NAME)?;

    Ok(table
        .rows()?
        .iter()
        .map(|row| {
            RawRecord::new()
                .with("date", row[time].clone())
                .with(flow.value_field(), numeric_cell(&row[value]))
                .with("product_code", row[commodity].clone())
                .with("product_name", row[description].clone())
                .with("country_code", row[country_code].clone())
                .with("country_name", row[country_name].clone())
        })
        .collect())
}

/// Census returns every cell as a string; numeric ones become numbers.
fn numeric_cell(cell: &Value) -> Value {
    cell.as_str()
        .and_then(|text| text.trim().parse::<f64>().ok())
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| cell.clone())
}

impl TradeDataSource for CensusAdapter {
    fn exports_on_period<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a, Vec<RawRecord>> {
        Box::pin(self.fetch_period(req))
    }

    fn imports_on_period<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a, Vec<RawRecord>> {
        Box::pin(self.fetch_period(req))
    }

    fn product<'a>(&'a self, code: &'a HsCode) -> SourceFuture<'a, String> {
        Box::pin(self.describe(code))
    }

    fn children_codes<'a>(&'a self, code: &'a HsCode) -> SourceFuture<'a, BTreeMap<HsCode, String>> {
        Box::pin(self.children(code))
    }

    fn country_by_name<'a>(&'a self, name: &'a str) -> SourceFuture<'a, Country> {
        let wanted = name.trim();
        Box::pin(self.country_matching(
            self.catalog.country_by_name(name),
            move |country| country.name.eq_ignore_ascii_case(wanted),
            format!("no country named '{name}'"),
        ))
    }

    fn country_by_code<'a>(&'a self, code: &'a str) -> SourceFuture<'a, Country> {
        let wanted = code.trim();
        Box::pin(self.country_matching(
            self.catalog.country_by_code(code),
            move |country| country.code == wanted,
            format!("no country with code '{code}'"),
        ))
    }

    fn country_by_iso2<'a>(&'a self, iso2: &'a str) -> SourceFuture<'a, Country> {
        // Census carries no ISO2 column, so this strategy is snapshot-only.
        let result = self
            .catalog
            .country_by_iso2(iso2)
            .cloned()
            .ok_or_else(|| TradeSourceError::not_found(format!("no country with ISO2 '{iso2}'")));
        Box::pin(async move { result })
    }

    fn search_for_code<'a>(&'a self, req: &'a SearchRequest) -> SourceFuture<'a, Vec<CodeMatch>> {
        let matches = self.catalog.search(req);
        Box::pin(async move { Ok(matches) })
    }
}
