//! World Bank v2 indicator fetcher.
//!
//! The API answers `GET {base}/country/{codes}/indicator/{code}` with a
//! two-element array: a pagination descriptor and the page's records. The
//! first page tells us how many pages exist; the rest are requested strictly
//! in order with a short pause between them.

use super::normalize::Normalizer;
use super::provider::{DataError, Transport};
use crate::domain::{IndicatorSeries, YearRange};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";

/// Pause between page requests.
pub const PAGE_DELAY: Duration = Duration::from_millis(50);

/// What to fetch for one indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorQuery {
    pub indicator_code: String,
    pub countries: Vec<String>,
    pub years: YearRange,
    pub per_page: u32,
}

/// Raw records from every page, in page order.
#[derive(Debug, Clone, Default)]
pub struct FetchedPages {
    pub records: Vec<Value>,
    pub total_pages: u32,
    /// Record count of each page as received.
    pub page_counts: Vec<usize>,
}

/// One decoded page payload.
#[derive(Debug)]
struct Page {
    total_pages: u32,
    records: Vec<Value>,
}

/// Paginating fetcher over an explicitly supplied transport.
pub struct Fetcher<'a> {
    transport: &'a dyn Transport,
    base_url: String,
    page_delay: Duration,
}

impl<'a> Fetcher<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_delay: PAGE_DELAY,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// `{base}/country/us;de/indicator/{code}`
    pub fn indicator_url(&self, indicator_code: &str, countries: &[String]) -> String {
        let country_path = countries
            .iter()
            .map(|c| c.to_lowercase())
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/country/{country_path}/indicator/{indicator_code}",
            self.base_url
        )
    }

    fn query_params(query: &IndicatorQuery, page: Option<u32>) -> Vec<(String, String)> {
        let mut params = vec![
            ("date".to_string(), query.years.as_query()),
            ("format".to_string(), "json".to_string()),
            ("per_page".to_string(), query.per_page.to_string()),
        ];
        if let Some(p) = page {
            params.push(("page".to_string(), p.to_string()));
        }
        params
    }

    /// Fetch every page for one indicator and concatenate the records.
    pub fn fetch_records(&self, query: &IndicatorQuery) -> Result<FetchedPages, DataError> {
        let code = query.indicator_code.as_str();
        let url = self.indicator_url(code, &query.countries);

        let first = self
            .transport
            .get_json(&url, &Self::query_params(query, None))
            .and_then(parse_first_page)
            .map_err(|e| e.on_page(code, 1))?;

        let total_pages = first.total_pages;
        let mut page_counts = vec![first.records.len()];
        let mut records = first.records;
        debug!(indicator = code, total_pages, "first page received");

        for page in 2..=total_pages {
            std::thread::sleep(self.page_delay);
            let payload = self
                .transport
                .get_json(&url, &Self::query_params(query, Some(page)))
                .map_err(|e| e.on_page(code, page))?;
            let page_records = parse_later_page(payload);
            if page_records.is_none() {
                warn!(indicator = code, page, "page carried no data array");
            }
            let page_records = page_records.unwrap_or_default();
            page_counts.push(page_records.len());
            records.extend(page_records);
        }

        info!(
            indicator = code,
            pages = total_pages,
            records = records.len(),
            "fetched indicator"
        );

        Ok(FetchedPages {
            records,
            total_pages,
            page_counts,
        })
    }

    /// Fetch and normalize one indicator into canonical rows.
    pub fn fetch_series(&self, query: &IndicatorQuery) -> Result<IndicatorSeries, DataError> {
        let pages = self.fetch_records(query)?;
        Normalizer::new(query.years).normalize(&query.indicator_code, &pages.records)
    }
}

/// Decode the first page, which must carry the pagination descriptor.
fn parse_first_page(payload: Value) -> Result<Page, DataError> {
    let Value::Array(mut parts) = payload else {
        return Err(DataError::Schema(
            "top-level payload is not an array".into(),
        ));
    };

    if let Some(message) = parts.first().and_then(service_message) {
        return Err(DataError::Schema(format!("service error: {message}")));
    }

    if parts.len() < 2 {
        return Err(DataError::Schema(format!(
            "expected [pagination, data], got {} element(s)",
            parts.len()
        )));
    }

    let data = std::mem::take(&mut parts[1]);
    let paging = &parts[0];
    if !paging.is_object() {
        return Err(DataError::Schema(
            "pagination descriptor is not an object".into(),
        ));
    }

    let total_pages = total_pages(paging)?;
    let records = match data {
        Value::Array(records) => records,
        Value::Null => Vec::new(),
        other => {
            return Err(DataError::Schema(format!(
                "data element is not an array (found {})",
                json_kind(&other)
            )))
        }
    };

    Ok(Page {
        total_pages,
        records,
    })
}

/// Later pages only need a data array; anything else contributes nothing.
fn parse_later_page(payload: Value) -> Option<Vec<Value>> {
    match payload {
        Value::Array(mut parts) if parts.len() >= 2 => match std::mem::take(&mut parts[1]) {
            Value::Array(records) => Some(records),
            _ => None,
        },
        _ => None,
    }
}

/// `pages` may arrive as a number or a numeric string; absent means one page.
fn total_pages(paging: &Value) -> Result<u32, DataError> {
    let pages = match paging.get("pages") {
        None | Some(Value::Null) => 1,
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| DataError::Schema(format!("invalid page count: {n}")))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| DataError::Schema(format!("invalid page count: {s:?}")))?,
        Some(other) => {
            return Err(DataError::Schema(format!(
                "invalid page count type: {}",
                json_kind(other)
            )))
        }
    };
    Ok(pages.clamp(1, u32::MAX as u64) as u32)
}

/// The service reports bad requests as `[{"message": [{"key": .., "value": ..}]}]`.
fn service_message(head: &Value) -> Option<String> {
    let messages = head.get("message")?.as_array()?;
    let text = messages
        .iter()
        .map(|m| {
            let key = m.get("key").and_then(Value::as_str).unwrap_or("error");
            let value = m.get("value").and_then(Value::as_str).unwrap_or("");
            format!("{key}: {value}")
        })
        .collect::<Vec<_>>()
        .join("; ");
    Some(text)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays canned payloads in order and records every query.
    struct ScriptedTransport {
        responses: Mutex<Vec<Result<Value, DataError>>>,
        seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<Value, DataError>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, DataError> {
            self.seen
                .lock()
                .unwrap()
                .push((url.to_string(), query.to_vec()));
            self.responses
                .lock()
                .unwrap()
                .pop()
                .expect("no scripted response left")
        }
    }

    fn record(code: &str, name: &str, date: &str, value: Value) -> Value {
        json!({
            "indicator": {"id": "NY.GDP.PCAP.CD", "value": "GDP per capita (current US$)"},
            "country": {"id": code, "value": name},
            "countryiso3code": "",
            "date": date,
            "value": value,
            "unit": "",
            "obs_status": "",
            "decimal": 1
        })
    }

    fn page(pages: u32, records: Vec<Value>) -> Value {
        json!([{"page": 1, "pages": pages, "per_page": 2, "total": 5}, records])
    }

    fn query() -> IndicatorQuery {
        IndicatorQuery {
            indicator_code: "NY.GDP.PCAP.CD".into(),
            countries: vec!["US".into(), "DE".into()],
            years: YearRange::new(2000, 2002),
            per_page: 2,
        }
    }

    fn param<'q>(params: &'q [(String, String)], key: &str) -> Option<&'q str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn url_lowercases_and_joins_countries() {
        let t = ScriptedTransport::new(vec![]);
        let f = Fetcher::new(&t).with_base_url("https://api.example.test/v2/");
        assert_eq!(
            f.indicator_url("SL.UEM.TOTL.ZS", &["US".into(), "DE".into(), "BR".into()]),
            "https://api.example.test/v2/country/us;de;br/indicator/SL.UEM.TOTL.ZS"
        );
    }

    #[test]
    fn aggregates_all_pages_in_order() {
        let t = ScriptedTransport::new(vec![
            Ok(page(
                3,
                vec![
                    record("US", "United States", "2002", json!(3.0)),
                    record("US", "United States", "2001", json!(2.0)),
                ],
            )),
            Ok(page(
                3,
                vec![
                    record("US", "United States", "2000", json!(1.0)),
                    record("DE", "Germany", "2002", json!(30.0)),
                ],
            )),
            Ok(page(3, vec![record("DE", "Germany", "2001", Value::Null)])),
        ]);
        let f = Fetcher::new(&t).with_page_delay(Duration::ZERO);

        let pages = f.fetch_records(&query()).unwrap();
        assert_eq!(pages.total_pages, 3);
        assert_eq!(pages.page_counts, vec![2, 2, 1]);
        assert_eq!(pages.records.len(), 5);
        assert_eq!(pages.records[0]["date"], "2002");
        assert_eq!(pages.records[4]["country"]["id"], "DE");

        let calls = t.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(param(&calls[0].1, "page"), None);
        assert_eq!(param(&calls[0].1, "date"), Some("2000:2002"));
        assert_eq!(param(&calls[0].1, "format"), Some("json"));
        assert_eq!(param(&calls[0].1, "per_page"), Some("2"));
        assert_eq!(param(&calls[1].1, "page"), Some("2"));
        assert_eq!(param(&calls[2].1, "page"), Some("3"));
    }

    #[test]
    fn single_page_makes_one_request() {
        let t = ScriptedTransport::new(vec![Ok(page(
            1,
            vec![record("US", "United States", "2000", json!(1.0))],
        ))]);
        let pages = Fetcher::new(&t).fetch_records(&query()).unwrap();
        assert_eq!(pages.records.len(), 1);
        assert_eq!(t.calls().len(), 1);
    }

    #[test]
    fn null_data_is_an_empty_result() {
        let t = ScriptedTransport::new(vec![Ok(json!([
            {"page": 1, "pages": 0, "per_page": 2, "total": 0},
            null
        ]))]);
        let series = Fetcher::new(&t).fetch_series(&query()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.indicator_code, "NY.GDP.PCAP.CD");
    }

    #[test]
    fn missing_data_element_is_schema_error() {
        let t = ScriptedTransport::new(vec![Ok(json!([{"page": 1, "pages": 1}]))]);
        let err = Fetcher::new(&t).fetch_records(&query()).unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("NY.GDP.PCAP.CD"));
        assert!(err.to_string().contains("page 1"));
    }

    #[test]
    fn non_array_payload_is_schema_error() {
        let t = ScriptedTransport::new(vec![Ok(json!({"error": "nope"}))]);
        let err = Fetcher::new(&t).fetch_records(&query()).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn service_message_is_surfaced() {
        let t = ScriptedTransport::new(vec![Ok(json!([{
            "message": [{"id": "120", "key": "Invalid value", "value": "The provided parameter value is not valid"}]
        }]))]);
        let err = Fetcher::new(&t).fetch_records(&query()).unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("Invalid value"));
    }

    #[test]
    fn page_count_may_be_a_string() {
        let t = ScriptedTransport::new(vec![
            Ok(json!([{"page": "1", "pages": "2"}, [record("US", "United States", "2000", json!(1.0))]])),
            Ok(json!([{"page": "2", "pages": "2"}, [record("US", "United States", "2001", json!(2.0))]])),
        ]);
        let pages = Fetcher::new(&t)
            .with_page_delay(Duration::ZERO)
            .fetch_records(&query())
            .unwrap();
        assert_eq!(pages.total_pages, 2);
        assert_eq!(pages.records.len(), 2);
    }

    #[test]
    fn later_page_without_data_contributes_nothing() {
        let t = ScriptedTransport::new(vec![
            Ok(page(2, vec![record("US", "United States", "2000", json!(1.0))])),
            Ok(json!([{"page": 2, "pages": 2}, null])),
        ]);
        let pages = Fetcher::new(&t)
            .with_page_delay(Duration::ZERO)
            .fetch_records(&query())
            .unwrap();
        assert_eq!(pages.records.len(), 1);
        assert_eq!(pages.page_counts, vec![1, 0]);
    }

    #[test]
    fn transport_failure_on_later_page_names_the_page() {
        let t = ScriptedTransport::new(vec![
            Ok(page(2, vec![record("US", "United States", "2000", json!(1.0))])),
            Err(DataError::Transport {
                url: "u".into(),
                attempts: 6,
                reason: "HTTP 503".into(),
            }),
        ]);
        let err = Fetcher::new(&t)
            .with_page_delay(Duration::ZERO)
            .fetch_records(&query())
            .unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("page 2"));
    }
}
