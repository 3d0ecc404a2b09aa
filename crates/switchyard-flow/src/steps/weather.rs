use std::sync::Arc;

use chrono::{Days, NaiveDate};
use futures::future::BoxFuture;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info};

use switchyard_core::config::WeatherConfig;
use switchyard_core::error::{Result, SwitchyardError};
use switchyard_core::traits::{AlertProvider, Geocoder, WeatherProvider};
use switchyard_core::types::{fields, Coordinates, WorkflowState};

use crate::cache::{cache_key, ResultCache};
use crate::graph::Step;
use crate::retry::FailureClassifier;

pub const FALLBACK_MESSAGE: &str =
    "Sorry, we could not process your request. Please try again later.";
pub const NO_LOCATION: &str = "No location provided.";
pub const BOOKING_CANCELLED: &str = "Weather changed to rain. Playground booking cancelled.";
pub const NO_WEATHER_CHANGE: &str = "No weather change notification.";

const OUTDOOR: &str = "Outdoor activities: soccer, tennis, picnic.";
const INDOOR: &str = "Indoor activities: board games, reading, movies.";
const GENERIC: &str = "Check local events or try creative indoor hobbies.";

/// Separator between forecast periods in multi-period forecasts.
pub const PERIOD_SEPARATOR: &str = "\n---\n";

fn is_good_weather(forecast: &str) -> bool {
    forecast.contains("Sunny") || forecast.contains("Clear")
}

fn is_wet_weather(forecast: &str) -> bool {
    forecast.contains("Rain") || forecast.contains("Showers")
}

fn coordinates(state: &WorkflowState) -> Option<Coordinates> {
    Some(Coordinates {
        latitude: state.get_f64(fields::LATITUDE)?,
        longitude: state.get_f64(fields::LONGITUDE)?,
    })
}

fn date(state: &WorkflowState) -> Option<NaiveDate> {
    state
        .get_str(fields::DATE)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

fn state_cache_key(state: &WorkflowState) -> Option<String> {
    Some(cache_key(coordinates(state)?, date(state)?))
}

/// Pulls the location out of `... in <place>`.
pub struct ParseQueryStep {
    default_location: String,
    pattern: Regex,
}

impl ParseQueryStep {
    pub fn new(default_location: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(r"\bin ([A-Za-z ,]+)")
            .map_err(|e| SwitchyardError::Config(e.to_string()))?;
        Ok(Self {
            default_location: default_location.into(),
            pattern,
        })
    }

    pub fn location(&self, request: &str) -> String {
        self.pattern
            .captures(request)
            .and_then(|c| c.get(1))
            .map(|m| strip_date_words(m.as_str()))
            .filter(|loc| !loc.is_empty())
            .unwrap_or_else(|| self.default_location.clone())
    }
}

/// Drop trailing date words the location pattern swallows, as in
/// `"in Sacramento tomorrow"`.
fn strip_date_words(raw: &str) -> String {
    let mut words: Vec<&str> = raw.split_whitespace().collect();
    while let Some(last) = words.last() {
        let lower = last.trim_end_matches(',').to_lowercase();
        if matches!(lower.as_str(), "today" | "tomorrow") {
            words.pop();
        } else {
            break;
        }
    }
    words.join(" ").trim_end_matches(',').trim().to_string()
}

impl Step for ParseQueryStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let location = self.location(state.request());
            debug!(location = %location, "Parsed location");
            state.set_str(fields::LOCATION_NAME, location);
            Ok(())
        })
    }
}

/// Resolves `today`/`tomorrow` against the configured reference date.
pub struct ResolveDateStep {
    config: WeatherConfig,
}

impl ResolveDateStep {
    pub fn new(config: WeatherConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, request: &str) -> NaiveDate {
        let today = self.config.today();
        if request.to_lowercase().contains("tomorrow") {
            today.checked_add_days(Days::new(1)).unwrap_or(today)
        } else {
            today
        }
    }
}

impl Step for ResolveDateStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let date = self.resolve(state.request());
            state.set_str(fields::DATE, date.format("%Y-%m-%d").to_string());
            Ok(())
        })
    }
}

pub struct PreferenceStep;

impl Step for PreferenceStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let text = state.request().to_lowercase();
            let preference = if text.contains("indoor") {
                "indoor"
            } else if text.contains("outdoor") {
                "outdoor"
            } else {
                "any"
            };
            state.set_str(fields::PREFERENCE, preference);
            Ok(())
        })
    }
}

pub struct GeocodeStep {
    geocoder: Arc<dyn Geocoder>,
    default_location: String,
}

impl GeocodeStep {
    pub fn new(geocoder: Arc<dyn Geocoder>, default_location: impl Into<String>) -> Self {
        Self {
            geocoder,
            default_location: default_location.into(),
        }
    }
}

impl Step for GeocodeStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let location = state
                .get_str(fields::LOCATION_NAME)
                .unwrap_or(&self.default_location)
                .to_string();
            let coords = self.geocoder.locate(&location).await?;
            debug!(
                location = %location,
                latitude = coords.latitude,
                longitude = coords.longitude,
                "Geocoded"
            );
            state.set(fields::LATITUDE, json!(coords.latitude));
            state.set(fields::LONGITUDE, json!(coords.longitude));
            Ok(())
        })
    }
}

/// Serves the forecast from the cache when one is stored for this place and day.
pub struct CacheLookupStep {
    cache: Arc<ResultCache>,
}

impl CacheLookupStep {
    pub fn new(cache: Arc<ResultCache>) -> Self {
        Self { cache }
    }
}

impl Step for CacheLookupStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let cached = match state_cache_key(state) {
                Some(key) => {
                    let hit = self.cache.get(&key).await;
                    info!(key = %key, hit = hit.is_some(), "Forecast cache lookup");
                    hit
                }
                None => None,
            };

            match cached {
                Some(forecast) => {
                    state.set_str(fields::WEATHER, forecast);
                    state.set(fields::CACHE_HIT, json!(true));
                }
                None => state.set(fields::CACHE_HIT, json!(false)),
            }
            Ok(())
        })
    }
}

/// Asks the provider for a forecast. Missing coordinates yield failure text.
pub struct WeatherStep {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherStep {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }
}

impl Step for WeatherStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let (Some(coords), Some(day)) = (coordinates(state), date(state)) else {
                state.set_str(fields::WEATHER, NO_LOCATION);
                return Ok(());
            };
            let forecast = self.provider.forecast(coords, day).await?;
            state.set_str(fields::WEATHER, forecast);
            Ok(())
        })
    }
}

/// Stores a successful forecast for later runs.
pub struct CacheUpdateStep {
    cache: Arc<ResultCache>,
    failures: FailureClassifier,
}

impl CacheUpdateStep {
    pub fn new(cache: Arc<ResultCache>, failures: FailureClassifier) -> Self {
        Self { cache, failures }
    }
}

impl Step for CacheUpdateStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(forecast) = state.get_str(fields::WEATHER) else {
                return Ok(());
            };
            if self.failures.is_failure_text(forecast) {
                return Ok(());
            }
            if let Some(key) = state_cache_key(state) {
                self.cache.put(&key, forecast).await;
            }
            Ok(())
        })
    }
}

/// Suggests activities per forecast period.
pub struct ActivitiesStep;

impl ActivitiesStep {
    pub fn suggest(forecast: &str, preference: Option<&str>) -> String {
        let pick = |period: &str| {
            if is_good_weather(period) {
                OUTDOOR
            } else if is_wet_weather(period) {
                INDOOR
            } else {
                match preference {
                    Some("indoor") => INDOOR,
                    Some("outdoor") => OUTDOOR,
                    _ => GENERIC,
                }
            }
        };

        if !forecast.contains(PERIOD_SEPARATOR) {
            return pick(forecast).to_string();
        }
        forecast
            .split(PERIOD_SEPARATOR)
            .map(|period| format!("{}: {}", period, pick(period)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Step for ActivitiesStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let forecast = state.get_str(fields::WEATHER).unwrap_or_default();
            let suggestion = Self::suggest(forecast, state.get_str(fields::PREFERENCE));
            state.set_str(fields::ACTIVITIES, suggestion);
            Ok(())
        })
    }
}

/// Fetches active alerts for the state code of the parsed location.
pub struct AlertsStep {
    provider: Arc<dyn AlertProvider>,
    default_area: String,
}

impl AlertsStep {
    pub fn new(provider: Arc<dyn AlertProvider>, default_area: impl Into<String>) -> Self {
        Self {
            provider,
            default_area: default_area.into(),
        }
    }

    /// `"Davis, CA"` gives `"CA"`; anything without a trailing two-letter
    /// code gives the default area.
    pub fn area<'a>(&'a self, location: &'a str) -> &'a str {
        location
            .rsplit(',')
            .next()
            .map(str::trim)
            .filter(|code| code.len() == 2 && code.chars().all(|c| c.is_ascii_uppercase()))
            .unwrap_or(self.default_area.as_str())
    }
}

impl Step for AlertsStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let area = self
                .area(state.get_str(fields::LOCATION_NAME).unwrap_or_default())
                .to_string();
            let alerts = self.provider.alerts(&area).await?;
            debug!(area = %area, "Alerts fetched");
            state.set_str(fields::ALERTS, alerts);
            Ok(())
        })
    }
}

/// Advises whether the playground is worth booking.
pub struct PlaygroundAdviceStep;

impl Step for PlaygroundAdviceStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let advice = if state.get_str(fields::WEATHER).is_some_and(is_good_weather) {
                "You can book the playground!"
            } else {
                "Playground booking not recommended due to weather."
            };
            state.set_str(fields::PLAYGROUND_ADVICE, advice);
            Ok(())
        })
    }
}

pub struct PlaygroundBookingStep;

impl Step for PlaygroundBookingStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let booked = state
                .get_str(fields::WEATHER)
                .is_some_and(is_good_weather);
            let outcome = if booked {
                "Playground booked!"
            } else {
                "Playground not booked due to weather."
            };
            info!(booked, "Playground booking decided");
            state.set_str(fields::PLAYGROUND_BOOKING, outcome);
            Ok(())
        })
    }
}

/// Tells the user when wet weather cancels a booking.
pub struct NotificationStep;

impl Step for NotificationStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let wet = state.get_str(fields::WEATHER).is_some_and(is_wet_weather);
            let notice = if wet { BOOKING_CANCELLED } else { NO_WEATHER_CHANGE };
            info!(cancelled = wet, "Booking notification decided");
            state.set_str(fields::NOTIFICATION, notice);
            Ok(())
        })
    }
}

pub struct FallbackStep;

impl Step for FallbackStep {
    fn run<'a>(&'a self, state: &'a mut WorkflowState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            state.set(fields::FALLBACK, Value::String(FALLBACK_MESSAGE.to_string()));
            Ok(())
        })
    }
}
