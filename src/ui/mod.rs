// Interactive comparison app: pick a race, pick two drivers, get the chart.

pub mod config;

use egui::{Color32, ComboBox, Direction, Frame, Layout, Margin, RichText, Ui, Visuals};
use egui_plot::{Legend, Line, MarkerShape, PlotPoint, PlotPoints, Points, Text};
use log::warn;

use crate::{
    analysis::consistency::{self, ConsistencyReport},
    chart::{self, ComparisonFigure, DriverChartData, LineStyle, TeamPalette, TraceMarker},
    errors::LapDeltaError,
    openf1::{self, DriverRecord, LapRecord, OpenF1Client, SessionChoice},
};

use config::AppConfig;

#[derive(Clone)]
enum UiState {
    Loading,
    Display,
    Error { message: String },
}

struct SessionData {
    choice: SessionChoice,
    laps: Vec<LapRecord>,
    drivers: Vec<DriverRecord>,
}

struct ComparisonView {
    figure: ComparisonFigure,
    reports: [Option<ConsistencyReport>; 2],
}

pub struct ComparisonApp {
    client: OpenF1Client,
    app_config: AppConfig,
    palette: TeamPalette,
    ui_state: UiState,
    catalog: Vec<SessionChoice>,
    selected_session: Option<usize>,
    session_data: Option<SessionData>,
    driver_a: Option<u32>,
    driver_b: Option<u32>,
    comparison: Option<ComparisonView>,
}

impl ComparisonApp {
    pub fn new(app_config: AppConfig, cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(Visuals::dark());
        Self {
            client: OpenF1Client::new(app_config.api_base_url.clone()),
            app_config,
            palette: TeamPalette::season_2023(),
            ui_state: UiState::Loading,
            catalog: Vec::new(),
            selected_session: None,
            session_data: None,
            driver_a: None,
            driver_b: None,
            comparison: None,
        }
    }

    fn load_session(&mut self, index: usize) -> Result<(), LapDeltaError> {
        let Some(choice) = self.catalog.get(index).cloned() else {
            return Ok(());
        };
        let laps = self.client.laps(choice.session_key)?;
        let drivers = self.client.drivers()?;
        let drivers = openf1::session_drivers(&drivers, &laps, choice.meeting_key);

        self.session_data = Some(SessionData {
            choice,
            laps,
            drivers,
        });
        self.driver_a = None;
        self.driver_b = None;
        self.comparison = None;
        Ok(())
    }

    fn rebuild_comparison(&mut self) -> Result<(), LapDeltaError> {
        let Some(session) = &self.session_data else {
            return Ok(());
        };
        let (Some(number_a), Some(number_b)) = (self.driver_a, self.driver_b) else {
            return Ok(());
        };

        let find_driver = |number: u32| {
            session
                .drivers
                .iter()
                .find(|d| d.driver_number == number)
                .ok_or(LapDeltaError::UnknownDriver {
                    driver_number: number,
                })
        };
        let data_a = DriverChartData::from_session_laps(find_driver(number_a)?, &session.laps)?;
        let data_b = DriverChartData::from_session_laps(find_driver(number_b)?, &session.laps)?;

        let report_for = |number: u32| {
            let records = session
                .laps
                .iter()
                .filter(|l| l.driver_number == number)
                .cloned()
                .collect::<Vec<_>>();
            consistency::consistency(&records, self.app_config.rolling_window)
        };
        let reports = [report_for(number_a), report_for(number_b)];

        let figure = chart::build_comparison(&data_a, &data_b, &self.palette);
        self.comparison = Some(ComparisonView { figure, reports });
        Ok(())
    }

    fn show_selectors(&mut self, ui: &mut Ui) -> Result<(), LapDeltaError> {
        let mut selected_session = self.selected_session;
        let mut driver_a = self.driver_a;
        let mut driver_b = self.driver_b;
        let mut compare_clicked = false;

        ui.with_layout(Layout::left_to_right(egui::Align::Center), |ui| {
            ui.label(RichText::new("Grand Prix: ").color(Color32::WHITE));
            ComboBox::from_id_salt("session_select")
                .width(280.)
                .selected_text(
                    selected_session
                        .and_then(|i| self.catalog.get(i))
                        .map(|c| c.label.clone())
                        .unwrap_or_else(|| "Select a race".to_string()),
                )
                .show_ui(ui, |ui| {
                    for (i, choice) in self.catalog.iter().enumerate() {
                        ui.selectable_value(&mut selected_session, Some(i), &choice.label);
                    }
                });

            if let Some(session) = &self.session_data {
                ui.separator();
                driver_selector(ui, "driver_a_select", "Driver 1: ", &session.drivers, &mut driver_a);
                driver_selector(ui, "driver_b_select", "Driver 2: ", &session.drivers, &mut driver_b);

                let comparable = driver_a.is_some() && driver_b.is_some() && driver_a != driver_b;
                if ui
                    .add_enabled(comparable, egui::Button::new("Compare"))
                    .clicked()
                {
                    compare_clicked = true;
                }
            }
        });

        if selected_session != self.selected_session {
            self.selected_session = selected_session;
            if let Some(index) = selected_session {
                self.load_session(index)?;
            }
        }
        if driver_a != self.driver_a || driver_b != self.driver_b {
            self.driver_a = driver_a;
            self.driver_b = driver_b;
            // selection changed, drop the stale chart
            self.comparison = None;
        }
        if compare_clicked {
            self.rebuild_comparison()?;
        }
        Ok(())
    }

    fn show_chart(&self, figure: &ComparisonFigure, ui: &mut Ui) {
        ui.with_layout(Layout::centered_and_justified(Direction::TopDown), |ui| {
            let plot = egui_plot::Plot::new("lap_times")
                .legend(Legend::default())
                .x_axis_label(figure.x_label.clone())
                .y_axis_label(figure.y_label.clone());

            plot.show(ui, |plot_ui| {
                for trace in &figure.traces {
                    let mut line = Line::new(&trace.label, PlotPoints::new(trace.points.clone()))
                        .color(trace.style.color);
                    if trace.style.line_style == LineStyle::Dashed {
                        line = line.style(egui_plot::LineStyle::dashed_loose());
                    }
                    plot_ui.line(line);
                    plot_ui.points(
                        Points::new(&trace.label, PlotPoints::new(trace.points.clone()))
                            .shape(marker_shape(trace.style.marker))
                            .radius(2.5)
                            .color(trace.style.color),
                    );

                    if !trace.pit_markers.is_empty() {
                        // unnamed white under-layer acts as the marker outline
                        plot_ui.points(
                            Points::new("", PlotPoints::new(trace.pit_markers.clone()))
                                .shape(MarkerShape::Down)
                                .radius(7.)
                                .color(Color32::WHITE),
                        );
                        plot_ui.points(
                            Points::new(
                                format!("{} Pit Out", trace.label),
                                PlotPoints::new(trace.pit_markers.clone()),
                            )
                            .shape(MarkerShape::Down)
                            .radius(5.)
                            .color(trace.style.color),
                        );
                    }

                    let fastest_x = trace.fastest.lap_number as f64;
                    let fastest_y = trace.fastest.duration;
                    plot_ui.points(
                        Points::new(
                            format!("{} Fastest Lap", trace.label),
                            PlotPoints::new(vec![[fastest_x, fastest_y]]),
                        )
                        .shape(MarkerShape::Asterisk)
                        .radius(8.)
                        .color(trace.style.color),
                    );
                    plot_ui.text(Text::new(
                        "",
                        PlotPoint::new(fastest_x, fastest_y - 1.),
                        RichText::new(trace.fastest_label()).color(Color32::WHITE),
                    ));
                }
            });
        });
    }

    fn show_consistency(&self, view: &ComparisonView, ui: &mut Ui) {
        ui.label(
            RichText::new("Lap consistency")
                .color(Color32::WHITE)
                .strong(),
        );
        ui.separator();
        for (trace, report) in view.figure.traces.iter().zip(view.reports.iter()) {
            ui.label(RichText::new(&trace.label).color(trace.style.color).strong());
            match report {
                Some(report) => {
                    ui.label(format!(
                        "Std dev: {:.2}s over {} clean laps",
                        report.std_dev, report.lap_count
                    ));
                    if let Some((lap_number, avg)) = report.rolling_avg.last() {
                        ui.label(format!(
                            "{}-lap rolling avg at lap {}: {:.2}s",
                            self.app_config.rolling_window, lap_number, avg
                        ));
                    }
                }
                None => {
                    ui.label("Not enough clean laps");
                }
            }
            ui.separator();
        }
    }
}

impl eframe::App for ComparisonApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.app_config.save() {
            warn!("Error while saving config file: {}", e);
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let cur_ui_state = self.ui_state.clone();
        match cur_ui_state {
            UiState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.with_layout(Layout::centered_and_justified(Direction::TopDown), |ui| {
                        ui.label(
                            RichText::new("Loading race sessions...").color(Color32::WHITE),
                        );
                    });
                });
                // TODO: fetch the catalog off the UI thread so the first
                // frame doesn't block on the network
                match openf1::session_catalog(&self.client) {
                    Ok(catalog) if catalog.is_empty() => {
                        self.ui_state = UiState::Error {
                            message: "The OpenF1 API returned no race sessions".to_string(),
                        };
                    }
                    Ok(catalog) => {
                        self.catalog = catalog;
                        self.ui_state = UiState::Display;
                    }
                    Err(e) => {
                        self.ui_state = UiState::Error {
                            message: format!("Could not load race sessions: {}", e),
                        };
                    }
                }
            }
            UiState::Display => {
                let mut selector_result = Ok(());
                egui::TopBottomPanel::top("SessionSelector")
                    .frame(
                        Frame::default()
                            .fill(Color32::TRANSPARENT)
                            .inner_margin(Margin::same(5)),
                    )
                    .show(ctx, |local_ui| {
                        selector_result = self.show_selectors(local_ui);
                    });
                if let Err(e) = selector_result {
                    self.ui_state = UiState::Error {
                        message: format!("{}", e),
                    };
                    return;
                }

                if let Some(view) = self.comparison.take() {
                    egui::SidePanel::right("ConsistencyDetail")
                        .frame(
                            Frame::default()
                                .fill(Color32::TRANSPARENT)
                                .inner_margin(Margin::same(5)),
                        )
                        .resizable(true)
                        .max_width(ctx.available_rect().width() * 0.3)
                        .show(ctx, |local_ui| {
                            self.show_consistency(&view, local_ui);
                        });
                    egui::CentralPanel::default()
                        .frame(
                            Frame::default()
                                .fill(Color32::TRANSPARENT)
                                .inner_margin(Margin::same(5)),
                        )
                        .show(ctx, |local_ui| {
                            self.show_chart(&view.figure, local_ui);
                        });
                    self.comparison = Some(view);
                } else {
                    egui::CentralPanel::default().show(ctx, |ui| {
                        ui.with_layout(Layout::centered_and_justified(Direction::TopDown), |ui| {
                            ui.label(
                                RichText::new("Select a race and two drivers, then hit Compare")
                                    .color(Color32::WHITE),
                            );
                        });
                    });
                }
            }
            UiState::Error { message } => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading(RichText::new(&message).color(Color32::RED).strong());
                    if ui.button("Start over").clicked() {
                        self.catalog.clear();
                        self.selected_session = None;
                        self.session_data = None;
                        self.comparison = None;
                        self.ui_state = UiState::Loading;
                    }
                });
            }
        }
    }
}

fn driver_selector(
    ui: &mut Ui,
    id: &str,
    label: &str,
    drivers: &[DriverRecord],
    selected: &mut Option<u32>,
) {
    ui.label(RichText::new(label).color(Color32::WHITE));
    ComboBox::from_id_salt(id)
        .width(200.)
        .selected_text(
            selected
                .and_then(|n| drivers.iter().find(|d| d.driver_number == n))
                .map(|d| d.full_name.clone())
                .unwrap_or_else(|| "Select a driver".to_string()),
        )
        .show_ui(ui, |ui| {
            for driver in drivers {
                ui.selectable_value(selected, Some(driver.driver_number), &driver.full_name);
            }
        });
}

fn marker_shape(marker: TraceMarker) -> MarkerShape {
    match marker {
        TraceMarker::Circle => MarkerShape::Circle,
        TraceMarker::Square => MarkerShape::Square,
    }
}
