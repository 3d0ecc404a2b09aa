//! Offline collaborators used when no real geocoding or forecast service is
//! wired in.

use chrono::{Datelike, NaiveDate};
use futures::future::BoxFuture;

use switchyard_core::error::Result;
use switchyard_core::traits::{AlertProvider, Geocoder, WeatherProvider};
use switchyard_core::types::Coordinates;

pub const SACRAMENTO: Coordinates = Coordinates {
    latitude: 38.5816,
    longitude: -121.4944,
};

pub const SAN_FRANCISCO: Coordinates = Coordinates {
    latitude: 37.7749,
    longitude: -122.4194,
};

/// Knows Sacramento; every other place resolves to San Francisco.
#[derive(Debug, Default, Clone)]
pub struct StaticGeocoder;

impl StaticGeocoder {
    pub fn resolve(location: &str) -> Coordinates {
        if location.to_lowercase().contains("sacramento") {
            SACRAMENTO
        } else {
            SAN_FRANCISCO
        }
    }
}

impl Geocoder for StaticGeocoder {
    fn locate(&self, location: &str) -> BoxFuture<'_, Result<Coordinates>> {
        let coords = Self::resolve(location);
        Box::pin(async move { Ok(coords) })
    }
}

/// Deterministic forecasts keyed on the day of the year.
#[derive(Debug, Default, Clone)]
pub struct DemoWeatherProvider;

impl DemoWeatherProvider {
    pub fn describe(coordinates: Coordinates, date: NaiveDate) -> String {
        let (sky, high) = match date.ordinal() % 3 {
            0 => ("Sunny", 91),
            1 => ("Partly Cloudy", 78),
            _ => ("Light Rain", 64),
        };
        format!(
            "{} with a high of {}°F at ({:.2}, {:.2})",
            sky, high, coordinates.latitude, coordinates.longitude
        )
    }
}

impl WeatherProvider for DemoWeatherProvider {
    fn forecast(
        &self,
        coordinates: Coordinates,
        date: NaiveDate,
    ) -> BoxFuture<'_, Result<String>> {
        let text = Self::describe(coordinates, date);
        Box::pin(async move { Ok(text) })
    }
}

pub const NO_ACTIVE_ALERTS: &str = "No active alerts for this state.";

/// One alert as `Event: X, Severity: Y, Desc: Z`; several are joined by
/// `\n---\n`.
pub fn format_alerts(alerts: &[(&str, &str, &str)]) -> String {
    alerts
        .iter()
        .map(|(event, severity, desc)| {
            format!("Event: {}, Severity: {}, Desc: {}", event, severity, desc)
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Reports two standing advisories for California and nothing elsewhere.
#[derive(Debug, Default, Clone)]
pub struct DemoAlertProvider;

impl DemoAlertProvider {
    pub fn describe(area: &str) -> String {
        if area.eq_ignore_ascii_case("CA") {
            format_alerts(&[
                ("Heat Advisory", "Moderate", "High temperatures expected inland."),
                ("Air Quality Alert", "Minor", "Smoke may reduce air quality."),
            ])
        } else {
            NO_ACTIVE_ALERTS.to_string()
        }
    }
}

impl AlertProvider for DemoAlertProvider {
    fn alerts(&self, area: &str) -> BoxFuture<'_, Result<String>> {
        let text = Self::describe(area);
        Box::pin(async move { Ok(text) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::FailureClassifier;

    #[tokio::test]
    async fn test_static_geocoder() {
        let geo = StaticGeocoder;
        assert_eq!(geo.locate("Sacramento, CA").await.unwrap(), SACRAMENTO);
        assert_eq!(geo.locate("Oakland").await.unwrap(), SAN_FRANCISCO);
    }

    #[test]
    fn test_demo_forecast_is_stable() {
        let day = NaiveDate::from_ymd_opt(2025, 8, 5).unwrap();
        let a = DemoWeatherProvider::describe(SACRAMENTO, day);
        let b = DemoWeatherProvider::describe(SACRAMENTO, day);
        assert_eq!(a, b);
        assert!(!a.contains("Unable") && !a.contains("No"));
    }

    #[tokio::test]
    async fn test_demo_alerts_by_area() {
        let provider = DemoAlertProvider;
        let ca = provider.alerts("ca").await.unwrap();
        assert_eq!(
            ca,
            "Event: Heat Advisory, Severity: Moderate, Desc: High temperatures expected inland.\n\
             ---\n\
             Event: Air Quality Alert, Severity: Minor, Desc: Smoke may reduce air quality."
        );
        assert!(!FailureClassifier::default().is_failure_text(&ca));
        assert_eq!(provider.alerts("VT").await.unwrap(), NO_ACTIVE_ALERTS);
    }
}
