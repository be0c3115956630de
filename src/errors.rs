// Error types for lapdelta

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum LapDeltaError {
    // Errors for the OpenF1 API client
    #[snafu(display("Error calling the OpenF1 API at {url}"))]
    ApiRequest { url: String, source: reqwest::Error },
    #[snafu(display("OpenF1 API returned status {status} for {url}"))]
    ApiStatus { url: String, status: u16 },
    #[snafu(display("Could not decode the OpenF1 response from {url}"))]
    ApiDecode { url: String, source: reqwest::Error },

    // Errors while aligning and annotating lap data
    #[snafu(display("No usable lap durations for driver {driver_number}"))]
    InsufficientLapData { driver_number: u32 },
    #[snafu(display("Lap series has no defined durations"))]
    NoDefinedLaps,
    #[snafu(display("Driver {driver_number} is not part of this session"))]
    UnknownDriver { driver_number: u32 },

    // Errors for the chart exporter
    #[snafu(display("Error writing chart file"))]
    ChartWriteError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}
