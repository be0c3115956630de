// Integration tests for the full comparison pipeline:
// 1. Decode OpenF1-shaped lap payloads
// 2. Align both drivers onto the common lap axis
// 3. Extract pit-stop and fastest-lap events
// 4. Build the comparison figure and export it

use lapdelta::{
    DriverRecord, LapRecord, TeamPalette,
    analysis::{align, fastest, pit_laps},
    chart::{DriverChartData, build_comparison, export::write_html},
};

fn lap(
    driver_number: u32,
    lap_number: u32,
    lap_duration: Option<f64>,
    is_pit_out_lap: bool,
) -> LapRecord {
    LapRecord {
        driver_number,
        lap_number,
        lap_duration,
        is_pit_out_lap,
        meeting_key: 1140,
        session_key: 9161,
    }
}

fn driver(driver_number: u32, full_name: &str, team_name: &str) -> DriverRecord {
    DriverRecord {
        driver_number,
        full_name: full_name.to_string(),
        team_name: team_name.to_string(),
        meeting_key: 1140,
    }
}

/// The two-driver scenario end to end: driver A has a missing lap that gets
/// interpolated and a pit-out lap, driver B has a shorter clean stint.
#[test]
fn test_two_driver_comparison_end_to_end() {
    let session_laps = vec![
        lap(44, 1, Some(90.0), false),
        lap(44, 2, None, false),
        lap(44, 3, Some(94.0), false),
        lap(44, 4, Some(96.0), true),
        lap(1, 1, Some(91.0), false),
        lap(1, 2, Some(92.0), false),
        lap(1, 3, Some(93.0), false),
    ];

    let laps_a = session_laps
        .iter()
        .filter(|l| l.driver_number == 44)
        .cloned()
        .collect::<Vec<_>>();
    let laps_b = session_laps
        .iter()
        .filter(|l| l.driver_number == 1)
        .cloned()
        .collect::<Vec<_>>();

    let series_a = align(&laps_a).unwrap();
    assert_eq!(series_a.max_lap(), 4);
    assert_eq!(series_a.duration(1), Some(90.0));
    assert_eq!(series_a.duration(2), Some(92.0)); // interpolated
    assert_eq!(series_a.duration(3), Some(94.0));
    assert_eq!(series_a.duration(4), Some(96.0));

    let pits_a = pit_laps(&laps_a, &series_a);
    assert_eq!(pits_a.len(), 1);
    assert_eq!(pits_a[0].lap_number, 4);
    assert_eq!(pits_a[0].duration, 96.0);

    let fastest_a = fastest(&series_a).unwrap();
    assert_eq!(fastest_a.lap_number, 1);
    assert_eq!(fastest_a.duration, 90.0);

    let series_b = align(&laps_b).unwrap();
    assert_eq!(series_b.max_lap(), 3);
    assert_eq!(series_b.duration(1), Some(91.0));
    assert_eq!(series_b.duration(2), Some(92.0));
    assert_eq!(series_b.duration(3), Some(93.0));
    assert!(pit_laps(&laps_b, &series_b).is_empty());

    let fastest_b = fastest(&series_b).unwrap();
    assert_eq!(fastest_b.lap_number, 1);
    assert_eq!(fastest_b.duration, 91.0);
}

#[test]
fn test_figure_build_and_html_export() {
    let session_laps = vec![
        lap(44, 1, Some(90.0), false),
        lap(44, 2, None, false),
        lap(44, 3, Some(94.0), false),
        lap(44, 4, Some(96.0), true),
        lap(63, 1, Some(91.0), false),
        lap(63, 2, Some(92.0), false),
        lap(63, 3, Some(93.0), false),
    ];
    // teammates, so the second driver must get the secondary team color
    let hamilton = driver(44, "Lewis HAMILTON", "Mercedes");
    let russell = driver(63, "George RUSSELL", "Mercedes");
    let palette = TeamPalette::season_2023();

    let data_a = DriverChartData::from_session_laps(&hamilton, &session_laps).unwrap();
    let data_b = DriverChartData::from_session_laps(&russell, &session_laps).unwrap();
    let figure = build_comparison(&data_a, &data_b, &palette);

    assert_eq!(figure.traces[0].style.color, palette.primary("Mercedes").unwrap());
    assert_eq!(
        figure.traces[1].style.color,
        palette.secondary("Mercedes").unwrap()
    );
    assert_ne!(figure.traces[0].style.color, figure.traces[1].style.color);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("mercedes.html");
    write_html(&figure, &output).unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("Lewis HAMILTON (Mercedes)"));
    assert!(content.contains("George RUSSELL (Mercedes)"));
    assert!(content.contains("90.00s"));
}

/// A driver whose every lap lost its duration must fail loudly instead of
/// rendering an empty line.
#[test]
fn test_driver_without_durations_fails_visibly() {
    let session_laps = vec![
        lap(44, 1, Some(90.0), false),
        lap(2, 1, None, false),
        lap(2, 2, None, false),
    ];
    let sargeant = driver(2, "Logan SARGEANT", "Williams");

    let result = DriverChartData::from_session_laps(&sargeant, &session_laps);
    assert!(matches!(
        result,
        Err(lapdelta::LapDeltaError::InsufficientLapData { driver_number: 2 })
    ));
}

#[test]
fn test_openf1_laps_payload_decodes() {
    let payload = r#"[
        {
            "meeting_key": 1140,
            "session_key": 9161,
            "driver_number": 44,
            "lap_number": 1,
            "lap_duration": null,
            "is_pit_out_lap": false,
            "date_start": "2023-03-05T15:04:28.000+00:00",
            "st_speed": 298
        },
        {
            "meeting_key": 1140,
            "session_key": 9161,
            "driver_number": 44,
            "lap_number": 2,
            "lap_duration": 97.524,
            "is_pit_out_lap": false
        }
    ]"#;

    let records: Vec<LapRecord> = serde_json::from_str(payload).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].lap_duration.is_none());
    assert_eq!(records[1].lap_duration, Some(97.524));

    // only lap 2 carries a duration, so the aligned domain is 1..=2 with
    // lap 1 left undefined
    let series = align(&records).unwrap();
    assert_eq!(series.max_lap(), 2);
    assert_eq!(series.duration(1), None);
    assert_eq!(series.duration(2), Some(97.524));
}
