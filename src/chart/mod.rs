// Backend-independent comparison figure. Both the egui plot and the HTML
// exporter render the same `ComparisonFigure`, so the visual encoding rules
// (team colors, line styles, markers) live here and nowhere else.

pub mod export;

use std::collections::HashMap;

use egui::Color32;
use itertools::Itertools;

use crate::{
    analysis::{self, DriverLapSeries, FastestLap, PitLap},
    errors::LapDeltaError,
    openf1::{DriverRecord, LapRecord},
};

/// Neutral colors used when a team is missing from the palette.
pub const FALLBACK_PRIMARY: Color32 = Color32::WHITE;
pub const FALLBACK_SECONDARY: Color32 = Color32::LIGHT_GRAY;

/// Immutable lookup from team name to its primary/secondary display colors.
/// Built once by the caller and passed into the figure builder.
pub struct TeamPalette {
    colors: HashMap<String, (Color32, Color32)>,
}

impl TeamPalette {
    pub fn new(colors: HashMap<String, (Color32, Color32)>) -> Self {
        Self { colors }
    }

    /// The 2023 grid.
    pub fn season_2023() -> Self {
        let mut colors = HashMap::new();
        let mut team = |name: &str, primary: (u8, u8, u8), secondary: (u8, u8, u8)| {
            colors.insert(
                name.to_string(),
                (
                    Color32::from_rgb(primary.0, primary.1, primary.2),
                    Color32::from_rgb(secondary.0, secondary.1, secondary.2),
                ),
            );
        };
        team("Red Bull Racing", (30, 65, 255), (255, 30, 65));
        team("Mercedes", (0, 210, 190), (0, 125, 138));
        team("Ferrari", (220, 0, 0), (255, 164, 0));
        team("McLaren", (255, 135, 0), (0, 87, 91));
        team("Aston Martin", (0, 111, 98), (0, 192, 77));
        team("Alpine", (0, 144, 255), (255, 79, 248));
        team("Williams", (0, 90, 255), (0, 35, 102));
        team("Alfa Romeo", (144, 0, 0), (255, 221, 0));
        team("AlphaTauri", (43, 69, 98), (193, 199, 208));
        team("Haas F1 Team", (255, 255, 255), (153, 153, 153));
        Self::new(colors)
    }

    pub fn primary(&self, team_name: &str) -> Option<Color32> {
        self.colors.get(team_name).map(|(primary, _)| *primary)
    }

    pub fn secondary(&self, team_name: &str) -> Option<Color32> {
        self.colors.get(team_name).map(|(_, secondary)| *secondary)
    }

    /// Trend colors for the two drivers. Each driver gets its team's primary
    /// color; when both share a team the second driver switches to the
    /// secondary color so the lines stay distinguishable.
    pub fn assign(&self, team_a: &str, team_b: &str) -> (Color32, Color32) {
        let color_a = self.primary(team_a).unwrap_or(FALLBACK_PRIMARY);
        let color_b = if team_a == team_b {
            self.secondary(team_b).unwrap_or(FALLBACK_SECONDARY)
        } else {
            self.primary(team_b).unwrap_or(FALLBACK_PRIMARY)
        };
        (color_a, color_b)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceMarker {
    Circle,
    Square,
}

#[derive(Clone, Copy, Debug)]
pub struct DriverStyle {
    pub color: Color32,
    pub line_style: LineStyle,
    pub marker: TraceMarker,
}

/// One driver's fully prepared chart inputs: aligned series plus the
/// extracted events, computed once per comparison run.
pub struct DriverChartData {
    pub driver: DriverRecord,
    pub series: DriverLapSeries,
    pub fastest: FastestLap,
    pub pit_laps: Vec<PitLap>,
}

impl DriverChartData {
    /// Selects the driver's laps out of the whole session's records and runs
    /// the align/extract pipeline on them.
    pub fn from_session_laps(
        driver: &DriverRecord,
        session_laps: &[LapRecord],
    ) -> Result<Self, LapDeltaError> {
        let records = session_laps
            .iter()
            .filter(|l| l.driver_number == driver.driver_number)
            .cloned()
            .collect_vec();
        if records.is_empty() {
            return Err(LapDeltaError::UnknownDriver {
                driver_number: driver.driver_number,
            });
        }

        let series = analysis::align(&records)?;
        let fastest = analysis::fastest(&series)?;
        let pit_laps = analysis::pit_laps(&records, &series);
        Ok(Self {
            driver: driver.clone(),
            series,
            fastest,
            pit_laps,
        })
    }
}

/// One trend line of the figure, with its annotations already positioned.
pub struct DriverTrace {
    pub label: String,
    pub style: DriverStyle,
    /// Defined laps only; undefined edge laps are simply absent.
    pub points: Vec<[f64; 2]>,
    pub pit_markers: Vec<[f64; 2]>,
    pub fastest: FastestLap,
}

impl DriverTrace {
    /// Fastest-lap annotation text, time rounded to two decimals.
    pub fn fastest_label(&self) -> String {
        format!("{:.2}s", self.fastest.duration)
    }
}

pub struct ComparisonFigure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub traces: [DriverTrace; 2],
}

impl ComparisonFigure {
    pub fn max_lap(&self) -> u32 {
        self.traces
            .iter()
            .map(|t| t.points.last().map(|p| p[0] as u32).unwrap_or(0))
            .max()
            .unwrap_or(0)
    }
}

fn trace(data: &DriverChartData, style: DriverStyle) -> DriverTrace {
    DriverTrace {
        label: format!("{} ({})", data.driver.full_name, data.driver.team_name),
        style,
        points: data
            .series
            .defined_laps()
            .map(|(lap_number, duration)| [lap_number as f64, duration])
            .collect(),
        pit_markers: data
            .pit_laps
            .iter()
            .map(|p| [p.lap_number as f64, p.duration])
            .collect(),
        fastest: data.fastest,
    }
}

/// Combines two prepared drivers into the figure both renderers consume.
pub fn build_comparison(
    driver_a: &DriverChartData,
    driver_b: &DriverChartData,
    palette: &TeamPalette,
) -> ComparisonFigure {
    let (color_a, color_b) = palette.assign(&driver_a.driver.team_name, &driver_b.driver.team_name);

    ComparisonFigure {
        title: format!(
            "Lap Times Comparison: {} vs {}",
            driver_a.driver.full_name, driver_b.driver.full_name
        ),
        x_label: "Lap Number".to_string(),
        y_label: "Lap Duration (seconds)".to_string(),
        traces: [
            trace(
                driver_a,
                DriverStyle {
                    color: color_a,
                    line_style: LineStyle::Solid,
                    marker: TraceMarker::Circle,
                },
            ),
            trace(
                driver_b,
                DriverStyle {
                    color: color_b,
                    line_style: LineStyle::Dashed,
                    marker: TraceMarker::Square,
                },
            ),
        ],
    }
}
