// Lap consistency statistics over a driver's clean laps. Pit-out laps and
// laps without a duration are excluded so in/out laps don't skew the numbers.

use itertools::Itertools;

use crate::openf1::LapRecord;

pub const DEFAULT_ROLLING_WINDOW: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct ConsistencyReport {
    /// Number of clean laps the statistics were computed over.
    pub lap_count: usize,
    /// Sample standard deviation of the clean lap durations, in seconds.
    pub std_dev: f64,
    /// Trailing rolling average of the clean lap durations, keyed by lap
    /// number. Only emitted once the window is full.
    pub rolling_avg: Vec<(u32, f64)>,
}

/// Computes the consistency report for one driver's raw lap records, or
/// `None` when fewer than two clean laps exist (a standard deviation over a
/// single lap is meaningless).
pub fn consistency(records: &[LapRecord], window: usize) -> Option<ConsistencyReport> {
    let clean = records
        .iter()
        .filter(|r| !r.is_pit_out_lap)
        .filter_map(|r| r.lap_duration.map(|d| (r.lap_number, d)))
        .sorted_by_key(|(lap_number, _)| *lap_number)
        .collect_vec();

    if clean.len() < 2 || window == 0 {
        return None;
    }

    let mean = clean.iter().map(|(_, d)| d).sum::<f64>() / clean.len() as f64;
    let variance = clean
        .iter()
        .map(|(_, d)| (d - mean) * (d - mean))
        .sum::<f64>()
        / (clean.len() - 1) as f64;

    let rolling_avg = clean
        .windows(window.min(clean.len()))
        .filter(|w| w.len() == window)
        .map(|w| {
            let avg = w.iter().map(|(_, d)| d).sum::<f64>() / window as f64;
            (w[w.len() - 1].0, avg)
        })
        .collect_vec();

    Some(ConsistencyReport {
        lap_count: clean.len(),
        std_dev: variance.sqrt(),
        rolling_avg,
    })
}
