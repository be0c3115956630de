// Lap alignment and event extraction. Everything in here is a pure function
// over already-fetched lap records; the UI and the exporter share it.

pub mod consistency;

use itertools::Itertools;

use crate::{errors::LapDeltaError, openf1::LapRecord};

/// A single driver's lap durations on a dense lap axis.
///
/// The domain is exactly `1..=max_lap` where `max_lap` is the highest lap
/// number that carried a duration. Interior gaps are linearly interpolated
/// between the nearest known laps; laps before the first known value stay
/// `None` rather than being extrapolated.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverLapSeries {
    // index 0 holds lap 1
    durations: Vec<Option<f64>>,
}

impl DriverLapSeries {
    pub fn max_lap(&self) -> u32 {
        self.durations.len() as u32
    }

    pub fn duration(&self, lap_number: u32) -> Option<f64> {
        if lap_number == 0 {
            return None;
        }
        self.durations.get(lap_number as usize - 1).copied().flatten()
    }

    /// Every lap in the domain, defined or not, in ascending order.
    pub fn laps(&self) -> impl Iterator<Item = (u32, Option<f64>)> + '_ {
        self.durations
            .iter()
            .enumerate()
            .map(|(i, duration)| (i as u32 + 1, *duration))
    }

    /// Only the laps with a defined duration, in ascending order.
    pub fn defined_laps(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.laps()
            .filter_map(|(lap_number, duration)| duration.map(|d| (lap_number, d)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FastestLap {
    pub lap_number: u32,
    pub duration: f64,
}

/// A pit-out lap paired with its duration from the aligned series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PitLap {
    pub lap_number: u32,
    pub duration: f64,
}

/// Aligns one driver's raw lap records onto the dense `1..=max_lap` axis.
///
/// Records without a duration are dropped before alignment; if nothing is
/// left the driver has no usable data and this fails with
/// `InsufficientLapData` instead of producing an empty series. Duplicate lap
/// numbers keep the last record in sorted order.
pub fn align(records: &[LapRecord]) -> Result<DriverLapSeries, LapDeltaError> {
    let timed = records
        .iter()
        .filter(|r| r.lap_number > 0)
        .filter_map(|r| r.lap_duration.map(|d| (r.lap_number, d)))
        .sorted_by_key(|(lap_number, _)| *lap_number)
        .collect_vec();

    let Some(&(max_lap, _)) = timed.last() else {
        return Err(LapDeltaError::InsufficientLapData {
            driver_number: records.first().map(|r| r.driver_number).unwrap_or(0),
        });
    };

    let mut durations: Vec<Option<f64>> = vec![None; max_lap as usize];
    for (lap_number, duration) in &timed {
        durations[*lap_number as usize - 1] = Some(*duration);
    }

    // fill interior gaps with the linear blend of the nearest known laps
    let mut prev: Option<(usize, f64)> = None;
    for i in 0..durations.len() {
        let Some(value) = durations[i] else { continue };
        if let Some((prev_i, prev_value)) = prev {
            let gap = i - prev_i;
            if gap > 1 {
                let step = (value - prev_value) / gap as f64;
                for (offset, slot) in durations[prev_i + 1..i].iter_mut().enumerate() {
                    *slot = Some(prev_value + step * (offset + 1) as f64);
                }
            }
        }
        prev = Some((i, value));
    }

    Ok(DriverLapSeries { durations })
}

/// The minimum-duration lap of the series. Ties resolve to the lowest lap
/// number.
pub fn fastest(series: &DriverLapSeries) -> Result<FastestLap, LapDeltaError> {
    let mut best: Option<FastestLap> = None;
    for (lap_number, duration) in series.defined_laps() {
        if best.is_none_or(|b| duration < b.duration) {
            best = Some(FastestLap {
                lap_number,
                duration,
            });
        }
    }
    best.ok_or(LapDeltaError::NoDefinedLaps)
}

/// Pit-out laps from the raw records, with durations looked up in the
/// aligned series. Flagged laps that lost their duration or fall outside the
/// series domain are skipped, not reported as errors.
pub fn pit_laps(records: &[LapRecord], series: &DriverLapSeries) -> Vec<PitLap> {
    records
        .iter()
        .filter(|r| r.is_pit_out_lap && r.lap_duration.is_some())
        .sorted_by_key(|r| r.lap_number)
        .filter_map(|r| {
            series.duration(r.lap_number).map(|duration| PitLap {
                lap_number: r.lap_number,
                duration,
            })
        })
        .collect()
}
