use std::path::PathBuf;

use clap::{Parser, Subcommand};
use egui::Vec2;
use log::info;

use lapdelta::{
    LapDeltaError, OpenF1Client, TeamPalette,
    analysis::consistency,
    chart::{self, DriverChartData, export},
    openf1,
    ui::{ComparisonApp, config::AppConfig},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive comparison app
    Ui {
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Write a standalone HTML comparison chart for one session
    Export {
        #[arg(short, long)]
        session: u64,

        #[arg(long)]
        driver_a: u32,

        #[arg(long)]
        driver_b: u32,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long)]
        api_url: Option<String>,
    },
}

fn client_config(api_url: Option<String>) -> AppConfig {
    let mut app_config = AppConfig::from_local_file().unwrap_or_default();
    if let Some(api_url) = api_url {
        app_config.api_base_url = api_url;
    }
    app_config
}

fn ui(api_url: Option<String>) -> Result<(), LapDeltaError> {
    let app_config = client_config(api_url);

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_inner_size(Vec2::new(1200., 700.));

    eframe::run_native(
        "Lapdelta",
        native_options,
        Box::new(|cc| Ok(Box::new(ComparisonApp::new(app_config, cc)))),
    )
    .expect("could not start app");
    Ok(())
}

fn export_chart(
    session_key: u64,
    driver_a: u32,
    driver_b: u32,
    output: &PathBuf,
    api_url: Option<String>,
) -> Result<(), LapDeltaError> {
    let app_config = client_config(api_url);
    let client = OpenF1Client::new(app_config.api_base_url.clone());

    let laps = client.laps(session_key)?;
    let meeting_key = laps.first().map(|l| l.meeting_key).unwrap_or_default();
    let drivers = openf1::session_drivers(&client.drivers()?, &laps, meeting_key);

    let find_driver = |number: u32| {
        drivers
            .iter()
            .find(|d| d.driver_number == number)
            .ok_or(LapDeltaError::UnknownDriver {
                driver_number: number,
            })
    };
    let data_a = DriverChartData::from_session_laps(find_driver(driver_a)?, &laps)?;
    let data_b = DriverChartData::from_session_laps(find_driver(driver_b)?, &laps)?;

    for data in [&data_a, &data_b] {
        let records = laps
            .iter()
            .filter(|l| l.driver_number == data.driver.driver_number)
            .cloned()
            .collect::<Vec<_>>();
        if let Some(report) = consistency::consistency(&records, app_config.rolling_window) {
            info!(
                "{}: std dev {:.2}s over {} clean laps",
                data.driver.full_name, report.std_dev, report.lap_count
            );
        }
    }

    let figure = chart::build_comparison(&data_a, &data_b, &TeamPalette::season_2023());
    export::write_html(&figure, output)
}

fn main() {
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");
    match &cli.command {
        Commands::Ui { api_url } => {
            ui(api_url.clone()).expect("Error while running the comparison app");
        }
        Commands::Export {
            session,
            driver_a,
            driver_b,
            output,
            api_url,
        } => {
            export_chart(*session, *driver_a, *driver_b, output, api_url.clone())
                .expect("Error while exporting the comparison chart");
        }
    };
}
