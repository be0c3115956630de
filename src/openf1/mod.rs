// Read-only client for the OpenF1 REST API (https://openf1.org)

use std::{collections::HashMap, time::Duration};

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::errors::LapDeltaError;

pub const DEFAULT_BASE_URL: &str = "https://api.openf1.org/v1";
const REQUEST_TIMEOUT_S: u64 = 30;

/// One session entry from `/v1/sessions`. A meeting (race weekend) holds
/// several sessions; only `session_type == "Race"` is interesting here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_key: u64,
    pub meeting_key: u64,
    pub year: u32,
    pub session_type: String,
    pub circuit_short_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub meeting_key: u64,
    pub meeting_name: String,
}

/// One driver's one lap from `/v1/laps`.
///
/// `lap_duration` is null for laps the timing feed never completed (first
/// lap of a stint, red flags, retirements).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LapRecord {
    pub driver_number: u32,
    pub lap_number: u32,
    pub lap_duration: Option<f64>,
    #[serde(default)]
    pub is_pit_out_lap: bool,
    pub meeting_key: u64,
    pub session_key: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverRecord {
    pub driver_number: u32,
    pub full_name: String,
    pub team_name: String,
    pub meeting_key: u64,
}

/// A race session ready for display in a selector, labeled with the official
/// meeting name when `/v1/meetings` knows it.
#[derive(Clone, Debug)]
pub struct SessionChoice {
    pub label: String,
    pub session_key: u64,
    pub meeting_key: u64,
    pub year: u32,
}

pub struct OpenF1Client {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl Default for OpenF1Client {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl OpenF1Client {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, LapDeltaError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let response = self
            .http
            .get(&url)
            .query(query)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_S))
            .send()
            .map_err(|e| LapDeltaError::ApiRequest {
                url: url.clone(),
                source: e,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(LapDeltaError::ApiStatus {
                url,
                status: status.as_u16(),
            });
        }
        response
            .json::<Vec<T>>()
            .map_err(|e| LapDeltaError::ApiDecode { url, source: e })
    }

    /// All race sessions the API knows about, practice and qualifying
    /// filtered out.
    pub fn race_sessions(&self) -> Result<Vec<SessionRecord>, LapDeltaError> {
        let sessions: Vec<SessionRecord> = self.get_json("sessions", &[])?;
        Ok(sessions
            .into_iter()
            .filter(|s| s.session_type == "Race")
            .collect())
    }

    pub fn meetings(&self, year: u32) -> Result<Vec<MeetingRecord>, LapDeltaError> {
        self.get_json("meetings", &[("year", year.to_string())])
    }

    pub fn laps(&self, session_key: u64) -> Result<Vec<LapRecord>, LapDeltaError> {
        self.get_json("laps", &[("session_key", session_key.to_string())])
    }

    pub fn drivers(&self) -> Result<Vec<DriverRecord>, LapDeltaError> {
        self.get_json("drivers", &[])
    }
}

/// Builds the list of selectable race sessions, joining each session with its
/// meeting name (`"2023 Bahrain Grand Prix"`). Sessions whose meeting is
/// missing from `/v1/meetings` fall back to the circuit short name.
pub fn session_catalog(client: &OpenF1Client) -> Result<Vec<SessionChoice>, LapDeltaError> {
    let races = client.race_sessions()?;

    let mut meeting_names: HashMap<u64, String> = HashMap::new();
    for year in races.iter().map(|s| s.year).unique().sorted() {
        for meeting in client.meetings(year)? {
            meeting_names.insert(meeting.meeting_key, meeting.meeting_name);
        }
    }

    Ok(races
        .into_iter()
        .map(|session| {
            let name = meeting_names
                .get(&session.meeting_key)
                .cloned()
                .unwrap_or_else(|| session.circuit_short_name.clone());
            SessionChoice {
                label: format!("{} {}", session.year, name),
                session_key: session.session_key,
                meeting_key: session.meeting_key,
                year: session.year,
            }
        })
        .collect())
}

/// Restricts the full driver list to drivers that actually have laps in this
/// session and belong to its meeting, one entry per driver number.
pub fn session_drivers(
    drivers: &[DriverRecord],
    laps: &[LapRecord],
    meeting_key: u64,
) -> Vec<DriverRecord> {
    let lap_driver_numbers = laps.iter().map(|l| l.driver_number).collect::<Vec<_>>();
    drivers
        .iter()
        .filter(|d| d.meeting_key == meeting_key && lap_driver_numbers.contains(&d.driver_number))
        .unique_by(|d| d.driver_number)
        .sorted_by_key(|d| d.driver_number)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap(driver_number: u32, lap_number: u32) -> LapRecord {
        LapRecord {
            driver_number,
            lap_number,
            lap_duration: Some(90.),
            is_pit_out_lap: false,
            meeting_key: 1140,
            session_key: 9161,
        }
    }

    fn driver(driver_number: u32, meeting_key: u64) -> DriverRecord {
        DriverRecord {
            driver_number,
            full_name: format!("Driver {}", driver_number),
            team_name: "Mercedes".to_string(),
            meeting_key,
        }
    }

    #[test]
    fn test_lap_record_decodes_null_duration() {
        let payload = r#"{
            "driver_number": 44,
            "lap_number": 1,
            "lap_duration": null,
            "is_pit_out_lap": false,
            "meeting_key": 1140,
            "session_key": 9161,
            "st_speed": 298
        }"#;
        let record: LapRecord = serde_json::from_str(payload).unwrap();
        assert_eq!(record.driver_number, 44);
        assert!(record.lap_duration.is_none());
        assert!(!record.is_pit_out_lap);
    }

    #[test]
    fn test_lap_record_defaults_missing_pit_flag() {
        let payload = r#"{
            "driver_number": 1,
            "lap_number": 12,
            "lap_duration": 95.123,
            "meeting_key": 1140,
            "session_key": 9161
        }"#;
        let record: LapRecord = serde_json::from_str(payload).unwrap();
        assert!(!record.is_pit_out_lap);
        assert_eq!(record.lap_duration, Some(95.123));
    }

    #[test]
    fn test_session_drivers_scopes_to_laps_and_meeting() {
        let drivers = vec![
            driver(44, 1140),
            driver(44, 1141), // same driver, different meeting
            driver(1, 1140),
            driver(81, 1140), // no laps in this session
        ];
        let laps = vec![lap(44, 1), lap(44, 2), lap(1, 1)];

        let scoped = session_drivers(&drivers, &laps, 1140);
        assert_eq!(scoped.len(), 2);
        assert_eq!(scoped[0].driver_number, 1);
        assert_eq!(scoped[1].driver_number, 44);
        assert!(scoped.iter().all(|d| d.meeting_key == 1140));
    }

    #[test]
    fn test_session_drivers_dedups_driver_numbers() {
        let drivers = vec![driver(44, 1140), driver(44, 1140)];
        let laps = vec![lap(44, 1)];

        let scoped = session_drivers(&drivers, &laps, 1140);
        assert_eq!(scoped.len(), 1);
    }
}
