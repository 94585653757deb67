//! Display-ready projection of a snapshot.
//!
//! `WeatherView` holds every value the widget shows, already rounded and
//! unit-labelled; `to_node` lays it out as a render tree.

use chrono::{DateTime, FixedOffset};
use skyglass_core::{ForecastConfig, Node};

use crate::format::{
    degree_to_cardinal, hours_minutes, is_any_precipitation, js_round, round_temp,
};
use crate::sparkline::{render_precipitation, Sparkline};
use crate::types::{DayForecast, WeatherSnapshot};

const ALERT_TIME_FORMAT: &str = "%b %d %I:%M %p";
const CLOCK_FORMAT: &str = "%-I:%M %p";

#[derive(Debug, Clone, PartialEq)]
pub struct WindView {
    pub bearing: f64,
    pub cardinal: &'static str,
    pub speed: f64,
    pub gust: Option<f64>,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SunView {
    pub sunrise: String,
    pub sunset: String,
    pub day_length: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertView {
    pub title: String,
    pub start: String,
    pub end: Option<String>,
}

/// Horizontal layout of a forecast row's temperature bar, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    pub left: f64,
    pub bar: f64,
    pub right: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub day: String,
    pub icon: String,
    pub precip_percent: Option<i64>,
    pub min: f64,
    pub max: f64,
    pub bar: BarLayout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub icon: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub indoor_temperature: Option<f64>,
    pub wind: Option<WindView>,
    pub humidity_percent: f64,
    pub dew_point: f64,
    pub sun: Option<SunView>,
    pub alert: Option<AlertView>,
    pub summary: String,
    pub precipitation: Option<Sparkline>,
    pub forecast: Vec<ForecastRow>,
}

impl WeatherView {
    /// Project `snapshot` through the display settings in `config`.
    /// Clock times are shown in `offset`.
    pub fn build(
        snapshot: &WeatherSnapshot,
        config: &ForecastConfig,
        room_temperature: Option<f64>,
        offset: FixedOffset,
    ) -> Self {
        let current = &snapshot.currently;
        let places = config.temp_decimal_places;

        let icon = if current.icon.is_empty() {
            snapshot.hourly.icon.clone()
        } else {
            current.icon.clone()
        };

        let wind = config.show_wind.then(|| WindView {
            bearing: tidy(js_round(current.wind_bearing)),
            cardinal: degree_to_cardinal(current.wind_bearing),
            speed: tidy(js_round(current.wind_speed)),
            gust: current.wind_gust.map(|g| tidy(js_round(g))),
            unit: config.units.wind_speed_unit(),
        });

        let sun = if config.show_sunrise_sunset {
            snapshot.daily.data.first().and_then(|today| sun_view(today, offset))
        } else {
            None
        };

        let alert = snapshot.first_alert().map(|a| AlertView {
            title: a.title.clone(),
            start: format_time(a.time, offset, ALERT_TIME_FORMAT).unwrap_or_default(),
            end: a.expires.and_then(|t| format_time(t, offset, ALERT_TIME_FORMAT)),
        });

        let summary = [
            snapshot.minutely.summary.as_str(),
            snapshot.hourly.summary.as_str(),
            snapshot.daily.summary.as_str(),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        let samples = &snapshot.minutely.data;
        let show_graph = config.always_show_precipitation_graph
            || (config.enable_precipitation_graph
                && is_any_precipitation(samples, config.precipitation_probability_threshold));
        let precipitation = show_graph.then(|| {
            render_precipitation(
                samples,
                config.precipitation_graph_width,
                config.precipitation_probability_threshold,
                config.precipitation_intensity_scale_top,
            )
        });

        let forecast = if config.show_forecast {
            forecast_rows(&snapshot.daily.data, config, offset)
        } else {
            Vec::new()
        };

        Self {
            icon,
            temperature: tidy(round_temp(current.temperature, places)),
            feels_like: tidy(js_round(current.apparent_temperature)),
            indoor_temperature: room_temperature
                .filter(|_| config.show_indoor_temperature)
                .map(|t| tidy(round_temp(t, places))),
            wind,
            humidity_percent: tidy(js_round(current.humidity * 100.0)),
            dew_point: tidy(js_round(current.dew_point)),
            sun,
            alert,
            summary,
            precipitation,
            forecast,
        }
    }

    /// Full widget layout.
    pub fn to_node(&self, config: &ForecastConfig) -> Node {
        let mut children = Vec::new();

        if let Some(alert) = self.alert_node("small bright weather-alert") {
            children.push(alert);
        }
        children.push(Node::text("small dimmed summary", &self.summary));

        let mut large = vec![
            Node::text(format!("big-icon wi {}", self.icon), ""),
            Node::text("bright", format!("{}°", self.temperature)),
            Node::text("small normal", "Feels Like:"),
            Node::text("mlarge normal", format!("{}°", self.feels_like)),
        ];
        if let Some(indoor) = self.indoor_temperature {
            large.push(Node::text("small normal indoor", format!("Indoor: {}°", indoor)));
        }
        children.push(Node::block("large light", large));

        if let Some(wind) = &self.wind {
            let speed = match wind.gust {
                Some(gust) => format!("{}-{}{}", wind.speed, gust, wind.unit),
                None => format!("{}{}", wind.speed, wind.unit),
            };
            children.push(Node::block(
                "small dimmed wind",
                vec![
                    Node::text(format!("wi wi-wind from-{}-deg", wind.bearing), ""),
                    Node::text("", wind.cardinal),
                    Node::text("", speed),
                ],
            ));
        }

        children.push(Node::block(
            "small dimmed humidity-dew-point",
            vec![
                Node::text("", format!("Dew Point: {}°", self.dew_point)),
                Node::text("", format!("Humidity: {}%", self.humidity_percent)),
            ],
        ));

        if let Some(sun) = &self.sun {
            children.push(Node::block(
                "small dimmed sunrise-sunset",
                vec![
                    Node::text("", format!("Day Length: {}", sun.day_length)),
                    Node::text("wi wi-sunrise", &sun.sunrise),
                    Node::text("wi wi-sunset", &sun.sunset),
                ],
            ));
        }

        if let Some(graph) = &self.precipitation {
            children.push(Node::Svg {
                class: "precipitation-graph".to_string(),
                width: graph.width,
                height: graph.height,
                markup: graph.to_svg(&config.precipitation_fill_color),
            });
        }

        if !self.forecast.is_empty() {
            let rows = self.forecast.iter().map(forecast_row_node).collect();
            children.push(Node::block("forecast", rows));
        }

        Node::block("forecast-widget", children)
    }

    /// Banner-only layout; empty when no alert is active.
    pub fn warning_node(&self) -> Node {
        let children = self
            .alert_node("mlarge bright weather-alert-banner")
            .into_iter()
            .collect();
        Node::block("forecast-widget warning-only", children)
    }

    fn alert_node(&self, class: &str) -> Option<Node> {
        let alert = self.alert.as_ref()?;
        let period = match &alert.end {
            Some(end) => format!("Start: {} | End: {}", alert.start, end),
            None => format!("Start: {}", alert.start),
        };
        Some(Node::block(
            class,
            vec![
                Node::text("fas fa-exclamation-triangle", "⚠"),
                Node::text("", &alert.title),
                Node::text("", period),
            ],
        ))
    }
}

fn forecast_row_node(row: &ForecastRow) -> Node {
    let precip = row
        .precip_percent
        .map(|p| format!("{}%", p))
        .unwrap_or_default();
    // One glyph per ten percent of bar width
    let bar = "━".repeat((js_round(row.bar.bar / 10.0) as usize).max(1));
    Node::block(
        "forecast-row",
        vec![
            Node::text("forecast-day", &row.day),
            Node::text(format!("wi weathericon {}", row.icon), ""),
            Node::text("forecast-precip-prob", precip),
            Node::text("temp min-temp", format!("{}°", row.min)),
            Node::text("bar", bar),
            Node::text("temp max-temp", format!("{}°", row.max)),
        ],
    )
}

fn forecast_rows(
    days: &[DayForecast],
    config: &ForecastConfig,
    offset: FixedOffset,
) -> Vec<ForecastRow> {
    let days = &days[..days.len().min(config.max_days_forecast)];
    if days.is_empty() {
        return Vec::new();
    }

    let min = js_round(
        days.iter()
            .map(|d| d.temperature_min)
            .fold(f64::MAX, f64::min),
    );
    let max = js_round(
        days.iter()
            .map(|d| d.temperature_max)
            .fold(f64::MIN, f64::max),
    );
    let total = max - min;
    let interval = if total > 0.0 { 100.0 / total } else { 0.0 };

    days.iter()
        .map(|day| {
            let row_min = tidy(round_temp(day.temperature_min, config.temp_decimal_places));
            let row_max = tidy(round_temp(day.temperature_max, config.temp_decimal_places));
            let precip_percent = (config.show_daily_precipitation_chance
                && day.precip_probability > 0.0)
                .then(|| js_round(day.precip_probability * 100.0) as i64);

            ForecastRow {
                day: format_time(day.time, offset, "%a").unwrap_or_default(),
                icon: day.icon.clone(),
                precip_percent,
                min: row_min,
                max: row_max,
                bar: BarLayout {
                    left: interval * (row_min - min),
                    bar: js_round(interval * (row_max - row_min)),
                    right: interval * (max - row_max),
                },
            }
        })
        .collect()
}

fn sun_view(today: &DayForecast, offset: FixedOffset) -> Option<SunView> {
    let sunrise = today.sunrise_time?;
    let sunset = today.sunset_time?;
    Some(SunView {
        sunrise: format_time(sunrise, offset, CLOCK_FORMAT)?,
        sunset: format_time(sunset, offset, CLOCK_FORMAT)?,
        day_length: hours_minutes(sunset - sunrise),
    })
}

fn format_time(epoch_secs: i64, offset: FixedOffset, fmt: &str) -> Option<String> {
    DateTime::from_timestamp(epoch_secs, 0).map(|t| t.with_timezone(&offset).format(fmt).to_string())
}

/// Fold negative zero into zero so it never prints as "-0".
fn tidy(value: f64) -> f64 {
    value + 0.0
}
