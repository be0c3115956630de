// Library interface for lapdelta
// This allows integration tests to access internal modules

pub mod analysis;
pub mod chart;
pub mod errors;
pub mod openf1;
pub mod ui;

// Re-export commonly used types
pub use analysis::{DriverLapSeries, FastestLap, PitLap, align, fastest, pit_laps};
pub use chart::{ComparisonFigure, DriverChartData, TeamPalette, build_comparison};
pub use errors::LapDeltaError;
pub use openf1::{DriverRecord, LapRecord, OpenF1Client};
