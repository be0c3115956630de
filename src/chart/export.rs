// Standalone HTML artifact for a comparison figure. The chart is an inline
// SVG built as a string, so the output opens in any browser with no
// JavaScript or external assets.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use egui::Color32;
use log::info;

use crate::{
    chart::{ComparisonFigure, DriverTrace, LineStyle, TraceMarker},
    errors::LapDeltaError,
};

const CANVAS_WIDTH: f64 = 1200.;
const CANVAS_HEIGHT: f64 = 620.;
// room for the title above and the axis labels below/left
const MARGIN_LEFT: f64 = 70.;
const MARGIN_RIGHT: f64 = 30.;
const MARGIN_TOP: f64 = 60.;
const MARGIN_BOTTOM: f64 = 60.;

const BACKGROUND: &str = "#1E1E1E";
const AXIS_COLOR: &str = "#888888";
const TEXT_COLOR: &str = "#FFFFFF";

/// Renders the figure to `output` as a dark-themed HTML page.
pub fn write_html(figure: &ComparisonFigure, output: &Path) -> Result<(), LapDeltaError> {
    let chart_file =
        File::create(output).map_err(|e| LapDeltaError::ChartWriteError { source: e })?;
    let mut writer = BufWriter::new(chart_file);

    writeln!(
        writer,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>body {{ background-color: {}; margin: 0; }}</style>\n</head>\n<body>",
        escape_text(&figure.title),
        BACKGROUND
    )
    .map_err(|e| LapDeltaError::ChartWriteError { source: e })?;

    writer
        .write_all(render_svg(figure).as_bytes())
        .map_err(|e| LapDeltaError::ChartWriteError { source: e })?;

    writeln!(writer, "</body>\n</html>")
        .map_err(|e| LapDeltaError::ChartWriteError { source: e })?;
    writer
        .flush()
        .map_err(|e| LapDeltaError::ChartWriteError { source: e })?;

    info!("Wrote comparison chart to {:?}", output);
    Ok(())
}

struct ValueBounds {
    min_lap: f64,
    max_lap: f64,
    min_duration: f64,
    max_duration: f64,
}

impl ValueBounds {
    fn from_figure(figure: &ComparisonFigure) -> Self {
        let mut bounds = Self {
            min_lap: f64::INFINITY,
            max_lap: f64::NEG_INFINITY,
            min_duration: f64::INFINITY,
            max_duration: f64::NEG_INFINITY,
        };
        for trace in &figure.traces {
            for point in trace.points.iter().chain(trace.pit_markers.iter()) {
                bounds.min_lap = bounds.min_lap.min(point[0]);
                bounds.max_lap = bounds.max_lap.max(point[0]);
                bounds.min_duration = bounds.min_duration.min(point[1]);
                bounds.max_duration = bounds.max_duration.max(point[1]);
            }
        }
        // a degenerate range (single lap, identical durations) still needs a
        // non-zero span to scale against
        if bounds.max_lap - bounds.min_lap < 1. {
            bounds.max_lap = bounds.min_lap + 1.;
        }
        if bounds.max_duration - bounds.min_duration < 1e-9 {
            bounds.max_duration += 1.;
            bounds.min_duration -= 1.;
        }
        bounds
    }

    fn x(&self, lap: f64) -> f64 {
        let plot_width = CANVAS_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        MARGIN_LEFT + (lap - self.min_lap) / (self.max_lap - self.min_lap) * plot_width
    }

    fn y(&self, duration: f64) -> f64 {
        let plot_height = CANVAS_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        // SVG y grows downwards
        MARGIN_TOP
            + (self.max_duration - duration) / (self.max_duration - self.min_duration) * plot_height
    }
}

fn render_svg(figure: &ComparisonFigure) -> String {
    let bounds = ValueBounds::from_figure(figure);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" \
         viewBox=\"0 0 {} {}\">\n",
        CANVAS_WIDTH, CANVAS_HEIGHT, CANVAS_WIDTH, CANVAS_HEIGHT
    ));
    svg.push_str(&format!(
        "<rect width=\"{}\" height=\"{}\" fill=\"{}\"/>\n",
        CANVAS_WIDTH, CANVAS_HEIGHT, BACKGROUND
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"30\" fill=\"{}\" font-size=\"20\" text-anchor=\"middle\" \
         font-family=\"sans-serif\">{}</text>\n",
        CANVAS_WIDTH / 2.,
        TEXT_COLOR,
        escape_text(&figure.title)
    ));

    render_axes(figure, &bounds, &mut svg);
    for trace in &figure.traces {
        render_trace(trace, &bounds, &mut svg);
    }
    render_legend(figure, &mut svg);

    svg.push_str("</svg>\n");
    svg
}

fn render_axes(figure: &ComparisonFigure, bounds: &ValueBounds, svg: &mut String) {
    let x_axis_y = CANVAS_HEIGHT - MARGIN_BOTTOM;
    svg.push_str(&format!(
        "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\"/>\n",
        MARGIN_LEFT,
        x_axis_y,
        CANVAS_WIDTH - MARGIN_RIGHT,
        x_axis_y,
        AXIS_COLOR
    ));
    svg.push_str(&format!(
        "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\"/>\n",
        MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, x_axis_y, AXIS_COLOR
    ));

    // lap ticks, thinned to roughly ten labels
    let lap_span = (bounds.max_lap - bounds.min_lap).round() as u32;
    let lap_step = (lap_span / 10).max(1);
    let mut lap = bounds.min_lap.ceil() as u32;
    while lap as f64 <= bounds.max_lap {
        let x = bounds.x(lap as f64);
        svg.push_str(&format!(
            "<line x1=\"{x:.1}\" y1=\"{}\" x2=\"{x:.1}\" y2=\"{}\" stroke=\"{}\"/>\n",
            x_axis_y,
            x_axis_y + 5.,
            AXIS_COLOR
        ));
        svg.push_str(&format!(
            "<text x=\"{x:.1}\" y=\"{}\" fill=\"{}\" font-size=\"12\" text-anchor=\"middle\" \
             font-family=\"sans-serif\">{}</text>\n",
            x_axis_y + 20.,
            TEXT_COLOR,
            lap
        ));
        lap += lap_step;
    }

    // five evenly spaced duration ticks
    for i in 0..=4 {
        let duration =
            bounds.min_duration + (bounds.max_duration - bounds.min_duration) * i as f64 / 4.;
        let y = bounds.y(duration);
        svg.push_str(&format!(
            "<line x1=\"{}\" y1=\"{y:.1}\" x2=\"{}\" y2=\"{y:.1}\" stroke=\"{}\"/>\n",
            MARGIN_LEFT - 5.,
            MARGIN_LEFT,
            AXIS_COLOR
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{:.1}\" fill=\"{}\" font-size=\"12\" text-anchor=\"end\" \
             font-family=\"sans-serif\">{:.1}</text>\n",
            MARGIN_LEFT - 10.,
            y + 4.,
            TEXT_COLOR,
            duration
        ));
    }

    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" fill=\"{}\" font-size=\"14\" text-anchor=\"middle\" \
         font-family=\"sans-serif\">{}</text>\n",
        (MARGIN_LEFT + CANVAS_WIDTH - MARGIN_RIGHT) / 2.,
        CANVAS_HEIGHT - 15.,
        TEXT_COLOR,
        escape_text(&figure.x_label)
    ));
    svg.push_str(&format!(
        "<text x=\"20\" y=\"{}\" fill=\"{}\" font-size=\"14\" text-anchor=\"middle\" \
         font-family=\"sans-serif\" transform=\"rotate(-90 20 {})\">{}</text>\n",
        CANVAS_HEIGHT / 2.,
        TEXT_COLOR,
        CANVAS_HEIGHT / 2.,
        escape_text(&figure.y_label)
    ));
}

fn render_trace(trace: &DriverTrace, bounds: &ValueBounds, svg: &mut String) {
    let color = css_color(trace.style.color);
    let dash = match trace.style.line_style {
        LineStyle::Solid => "",
        LineStyle::Dashed => " stroke-dasharray=\"8 6\"",
    };

    let polyline = trace
        .points
        .iter()
        .map(|p| format!("{:.1},{:.1}", bounds.x(p[0]), bounds.y(p[1])))
        .collect::<Vec<_>>()
        .join(" ");
    svg.push_str(&format!(
        "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"{}/>\n",
        polyline, color, dash
    ));
    for point in &trace.points {
        marker(
            trace.style.marker,
            bounds.x(point[0]),
            bounds.y(point[1]),
            3.,
            &color,
            None,
            svg,
        );
    }

    // pit markers sit on top of the trend line, outlined so they stand out
    for point in &trace.pit_markers {
        marker(
            trace.style.marker,
            bounds.x(point[0]),
            bounds.y(point[1]),
            7.,
            &color,
            Some(TEXT_COLOR),
            svg,
        );
    }

    let fx = bounds.x(trace.fastest.lap_number as f64);
    let fy = bounds.y(trace.fastest.duration);
    svg.push_str(&format!(
        "<polygon points=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
        star_points(fx, fy, 9.),
        color,
        TEXT_COLOR
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" font-size=\"12\" text-anchor=\"middle\" \
         font-family=\"sans-serif\">{}</text>\n",
        fx,
        fy - 14.,
        TEXT_COLOR,
        trace.fastest_label()
    ));
}

fn render_legend(figure: &ComparisonFigure, svg: &mut String) {
    let mut y = MARGIN_TOP + 10.;
    for trace in &figure.traces {
        let color = css_color(trace.style.color);
        let dash = match trace.style.line_style {
            LineStyle::Solid => "",
            LineStyle::Dashed => " stroke-dasharray=\"8 6\"",
        };
        svg.push_str(&format!(
            "<line x1=\"{}\" y1=\"{y:.1}\" x2=\"{}\" y2=\"{y:.1}\" stroke=\"{}\" \
             stroke-width=\"2\"{}/>\n",
            MARGIN_LEFT + 10.,
            MARGIN_LEFT + 40.,
            color,
            dash
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{:.1}\" fill=\"{}\" font-size=\"13\" \
             font-family=\"sans-serif\">{}</text>\n",
            MARGIN_LEFT + 48.,
            y + 4.,
            TEXT_COLOR,
            escape_text(&trace.label)
        ));
        y += 20.;
    }
}

fn marker(
    shape: TraceMarker,
    x: f64,
    y: f64,
    size: f64,
    fill: &str,
    outline: Option<&str>,
    svg: &mut String,
) {
    let stroke = outline
        .map(|c| format!(" stroke=\"{}\" stroke-width=\"2\"", c))
        .unwrap_or_default();
    match shape {
        TraceMarker::Circle => svg.push_str(&format!(
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"{}\"{}/>\n",
            x, y, size, fill, stroke
        )),
        TraceMarker::Square => svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"{}/>\n",
            x - size,
            y - size,
            size * 2.,
            size * 2.,
            fill,
            stroke
        )),
    }
}

fn star_points(cx: f64, cy: f64, radius: f64) -> String {
    let inner = radius * 0.45;
    (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { radius } else { inner };
            // start pointing up
            let angle = std::f64::consts::PI * (i as f64 / 5. - 0.5);
            format!("{:.1},{:.1}", cx + r * angle.cos(), cy + r * angle.sin())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn css_color(color: Color32) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chart::{DriverStyle, FALLBACK_PRIMARY},
        analysis::FastestLap,
    };

    fn sample_figure() -> ComparisonFigure {
        let style_a = DriverStyle {
            color: Color32::from_rgb(0, 210, 190),
            line_style: LineStyle::Solid,
            marker: TraceMarker::Circle,
        };
        let style_b = DriverStyle {
            color: FALLBACK_PRIMARY,
            line_style: LineStyle::Dashed,
            marker: TraceMarker::Square,
        };
        ComparisonFigure {
            title: "Lap Times Comparison: A vs B".to_string(),
            x_label: "Lap Number".to_string(),
            y_label: "Lap Duration (seconds)".to_string(),
            traces: [
                DriverTrace {
                    label: "A (Mercedes)".to_string(),
                    style: style_a,
                    points: vec![[1., 90.], [2., 92.], [3., 94.], [4., 96.]],
                    pit_markers: vec![[4., 96.]],
                    fastest: FastestLap {
                        lap_number: 1,
                        duration: 90.,
                    },
                },
                DriverTrace {
                    label: "B (Unknown)".to_string(),
                    style: style_b,
                    points: vec![[1., 91.], [2., 92.], [3., 93.]],
                    pit_markers: vec![],
                    fastest: FastestLap {
                        lap_number: 1,
                        duration: 91.,
                    },
                },
            ],
        }
    }

    #[test]
    fn test_svg_contains_traces_and_annotations() {
        let svg = render_svg(&sample_figure());

        assert!(svg.contains("<polyline"));
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("#00D2BE"));
        assert!(svg.contains("90.00s"));
        assert!(svg.contains("91.00s"));
        assert!(svg.contains("<polygon")); // fastest-lap stars
        assert!(svg.contains("A (Mercedes)"));
    }

    #[test]
    fn test_write_html_produces_standalone_page() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("comparison.html");

        write_html(&sample_figure(), &output).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("<!DOCTYPE html>"));
        assert!(content.contains("<svg"));
        assert!(content.contains("Lap Times Comparison: A vs B"));
    }

    #[test]
    fn test_degenerate_single_point_still_renders() {
        let mut figure = sample_figure();
        figure.traces[0].points = vec![[1., 90.]];
        figure.traces[1].points = vec![[1., 90.]];
        figure.traces[0].pit_markers.clear();

        let svg = render_svg(&figure);
        assert!(svg.contains("<svg"));
        assert!(!svg.contains("NaN"));
    }
}
