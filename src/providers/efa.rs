use chrono::{DateTime, Datelike, Timelike};
use chrono_tz::Tz;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum EfaError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error: {0}")]
    Api(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// EFA API client for fetching real-time departure data from a departure
/// monitor (XML_DM_REQUEST) endpoint
pub struct EfaClient {
    client: Client,
    /// Full URL of the departure monitor endpoint
    dm_url: String,
    /// Whether to ask the service for stops in walking distance as well
    proximity_search: bool,
}

impl EfaClient {
    pub fn new(base_url: &str, proximity_search: bool) -> Result<Self, EfaError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| EfaError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            dm_url: format!("{}/XML_DM_REQUEST", base_url.trim_end_matches('/')),
            proximity_search,
        })
    }

    /// Fetch departures for a stop by name, optionally qualified with a place
    ///
    /// `place` is omitted from the request entirely when `None` — the EFA
    /// service treats a present-but-empty `place_dm` differently from an
    /// absent one.
    pub async fn get_departures(
        &self,
        place: Option<&str>,
        stop_name: &str,
        at: DateTime<Tz>,
    ) -> Result<DepartureMonitorResponse, EfaError> {
        let request = DmRequest::new(place, stop_name, at, self.proximity_search);

        tracing::debug!(url = %self.dm_url, stop_name = %stop_name, "Fetching departures");

        let response = self
            .client
            .post(&self.dm_url)
            .form(&request)
            .send()
            .await
            .map_err(|e| EfaError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EfaError::Api(status.as_u16()));
        }

        // EFA returns JSON with a text/html Content-Type, so the body has to
        // be read as text and parsed by hand instead of via response.json().
        let body = response
            .text()
            .await
            .map_err(|e| EfaError::Network(e.to_string()))?;

        let data: DepartureMonitorResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(
                "Failed to parse EFA response for {}: {} - body: {}",
                stop_name,
                e,
                &body[..body.len().min(500)]
            );
            EfaError::Parse(e.to_string())
        })?;

        tracing::info!(
            stop_name = %stop_name,
            departures = data.departure_list.len(),
            "Retrieved departures"
        );

        Ok(data)
    }
}

/// Form body for a departure monitor request
///
/// Built fresh for every call so that one request can never leak fields
/// (notably `place_dm`) into the next.
#[derive(Debug, Serialize)]
pub struct DmRequest<'a> {
    language: &'static str,
    mode: &'static str,
    #[serde(rename = "outputFormat")]
    output_format: &'static str,
    type_dm: &'static str,
    #[serde(rename = "useProxFootSearch")]
    use_prox_foot_search: &'static str,
    #[serde(rename = "useRealtime")]
    use_realtime: &'static str,
    #[serde(rename = "itdDateDay")]
    itd_date_day: u32,
    #[serde(rename = "itdDateMonth")]
    itd_date_month: u32,
    #[serde(rename = "itdDateYear")]
    itd_date_year: i32,
    #[serde(rename = "itdTimeHour")]
    itd_time_hour: u32,
    #[serde(rename = "itdTimeMinute")]
    itd_time_minute: u32,
    name_dm: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    place_dm: Option<&'a str>,
}

impl<'a> DmRequest<'a> {
    fn new(
        place: Option<&'a str>,
        stop_name: &'a str,
        at: DateTime<Tz>,
        proximity_search: bool,
    ) -> Self {
        Self {
            language: "de",
            mode: "direct",
            output_format: "JSON",
            type_dm: "stop",
            use_prox_foot_search: if proximity_search { "1" } else { "0" },
            use_realtime: "1",
            itd_date_day: at.day(),
            itd_date_month: at.month(),
            itd_date_year: at.year(),
            itd_time_hour: at.hour(),
            itd_time_minute: at.minute(),
            name_dm: stop_name,
            place_dm: place,
        }
    }
}

// Response structures
//
// The classic EFA JSON output (outputFormat=JSON) encodes almost everything
// as strings without zero-padding and leaves fields out freely, so the model
// is Option-heavy and interpretation is left to the normalizer.

#[derive(Debug, Clone, Deserialize)]
pub struct DepartureMonitorResponse {
    pub dm: Option<DepartureMonitor>,
    #[serde(default, rename = "departureList")]
    pub departure_list: Vec<RawDeparture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepartureMonitor {
    pub points: Option<Points>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Points {
    pub point: Option<Point>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Point {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDeparture {
    #[serde(rename = "servingLine")]
    pub serving_line: Option<ServingLine>,
    /// Scheduled departure time
    #[serde(rename = "dateTime")]
    pub date_time: Option<EfaDateTime>,
    /// Delay-adjusted departure time, present when live tracking data exists
    #[serde(rename = "realDateTime")]
    pub real_date_time: Option<EfaDateTime>,
    #[serde(rename = "platformName")]
    pub platform_name: Option<String>,
    /// Minutes until departure, string-encoded and not zero-padded
    pub countdown: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServingLine {
    pub number: Option<String>,
    pub direction: Option<String>,
    /// Delay in minutes as reported, string-encoded
    pub delay: Option<String>,
}

/// Broken-down date-time as the EFA service reports it: every component a
/// string, none zero-padded. `weekday` is metadata, never the calendar day.
#[derive(Debug, Clone, Deserialize)]
pub struct EfaDateTime {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub weekday: Option<String>,
    pub hour: Option<String>,
    pub minute: Option<String>,
}
