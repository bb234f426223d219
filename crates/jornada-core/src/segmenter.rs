//! Telemetry segmentation.
//!
//! Turns an ordered batch of vehicle samples into alternating WORK/REST
//! segments.
//!
//! # Algorithm Summary
//!
//! 1. Classify every sample against its predecessor (speed or ignition strategy)
//! 2. Keep the current state plus the run of samples that disagree with it
//! 3. Commit REST→WORK immediately; commit WORK→REST only once the disagreeing
//!    run spans the hysteresis threshold (speed strategy), closing the WORK
//!    segment where the run began
//! 4. Close the open state at the last sample

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;
use crate::interval::Interval;

/// Minimum span of a WORK→REST run before the speed strategy commits it.
pub const REST_HYSTERESIS_MINUTES: i64 = 5;

/// Two-state ignition reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ignition {
    On,
    Off,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One geolocated telemetry reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    /// Speed in km/h as reported by the tracker.
    pub speed: f64,
    pub ignition: Ignition,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub street: String,
}

impl Sample {
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Classification of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Work,
    Rest,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Work => "work",
            Self::Rest => "rest",
        })
    }
}

/// A maximal WORK or REST interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub activity: Activity,
    #[serde(flatten)]
    pub interval: Interval,
    pub start_coordinates: Coordinates,
    pub end_coordinates: Coordinates,
    pub city: String,
    pub street: String,
}

impl Segment {
    pub const fn start(&self) -> NaiveDateTime {
        self.interval.start()
    }

    pub const fn end(&self) -> NaiveDateTime {
        self.interval.end()
    }

    pub fn duration(&self) -> Duration {
        self.interval.duration()
    }
}

/// Which signal decides WORK vs REST.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    /// Moving with the ignition on.
    #[default]
    Speed,
    /// Ignition state only.
    Ignition,
}

/// Options for [`segment`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentOptions {
    pub mode: SegmentMode,

    /// Drop REST segments lying entirely before the first WORK segment or
    /// entirely after the last one. Off by default, so the segments cover the
    /// whole sample range.
    pub drop_pre_post_rest: bool,
}

/// Result of segmenting one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Segmentation {
    pub segments: Vec<Segment>,
    pub first_work_start: Option<NaiveDateTime>,
    pub last_work_end: Option<NaiveDateTime>,
    pub first_work_coordinates: Option<Coordinates>,
    pub last_work_coordinates: Option<Coordinates>,
}

impl Segmentation {
    pub fn has_work(&self) -> bool {
        self.first_work_start.is_some()
    }
}

/// Per-sample classification strategy, chosen once per call.
trait Classifier {
    /// Classifies a sample given its predecessor (`None` for the first sample).
    fn classify(&self, sample: &Sample, previous: Option<&Sample>) -> Activity;

    /// Span a WORK→REST run must reach before it is committed.
    /// `None` commits every transition immediately.
    fn rest_hysteresis(&self) -> Option<Duration>;
}

struct SpeedClassifier;

impl Classifier for SpeedClassifier {
    #[expect(
        clippy::float_cmp,
        reason = "a stationary tracker repeats the exact same coordinates and speed"
    )]
    fn classify(&self, sample: &Sample, previous: Option<&Sample>) -> Activity {
        let Some(previous) = previous else {
            return Activity::Rest;
        };
        let moving = sample.speed != 0.0
            && sample.latitude != previous.latitude
            && sample.longitude != previous.longitude
            && sample.ignition == Ignition::On;
        if moving { Activity::Work } else { Activity::Rest }
    }

    fn rest_hysteresis(&self) -> Option<Duration> {
        Some(Duration::minutes(REST_HYSTERESIS_MINUTES))
    }
}

struct IgnitionClassifier;

impl Classifier for IgnitionClassifier {
    fn classify(&self, sample: &Sample, _previous: Option<&Sample>) -> Activity {
        match sample.ignition {
            Ignition::On => Activity::Work,
            Ignition::Off => Activity::Rest,
        }
    }

    fn rest_hysteresis(&self) -> Option<Duration> {
        None
    }
}

/// Segment a batch of samples.
///
/// Samples must be non-empty and in non-decreasing timestamp order.
pub fn segment(samples: &[Sample], options: &SegmentOptions) -> Result<Segmentation, InvalidInput> {
    validate_samples(samples)?;

    let mut segmentation = match options.mode {
        SegmentMode::Speed => scan(samples, &SpeedClassifier)?,
        SegmentMode::Ignition => scan(samples, &IgnitionClassifier)?,
    };

    if options.drop_pre_post_rest {
        drop_pre_post_rest(&mut segmentation);
    }

    tracing::debug!(
        mode = ?options.mode,
        samples = samples.len(),
        segments = segmentation.segments.len(),
        "segmented telemetry"
    );

    Ok(segmentation)
}

fn validate_samples(samples: &[Sample]) -> Result<(), InvalidInput> {
    if samples.is_empty() {
        return Err(InvalidInput::EmptySamples);
    }
    if let Some(index) = samples
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        return Err(InvalidInput::UnorderedSamples {
            index: index + 1,
            timestamp: samples[index + 1].timestamp,
        });
    }
    Ok(())
}

/// Accumulates committed segments and the running WORK extrema.
#[derive(Default)]
struct SegmentSink {
    out: Segmentation,
}

impl SegmentSink {
    fn commit(
        &mut self,
        open: &OpenSegment,
        end: NaiveDateTime,
        place: &Sample,
        work_end_coordinates: Coordinates,
    ) -> Result<(), InvalidInput> {
        let interval = Interval::new(open.start, end)?;
        tracing::trace!(activity = ?open.activity, start = %open.start, %end, "segment committed");

        if open.activity == Activity::Work {
            self.out.first_work_start.get_or_insert(open.start);
            self.out
                .first_work_coordinates
                .get_or_insert(open.start_coordinates);
            self.out.last_work_end = Some(end);
            self.out.last_work_coordinates = Some(work_end_coordinates);
        }

        self.out.segments.push(Segment {
            activity: open.activity,
            interval,
            start_coordinates: open.start_coordinates,
            end_coordinates: place.coordinates(),
            city: place.city.clone(),
            street: place.street.clone(),
        });
        Ok(())
    }
}

/// The state currently being extended.
struct OpenSegment {
    activity: Activity,
    start: NaiveDateTime,
    start_coordinates: Coordinates,
}

impl OpenSegment {
    const fn at(activity: Activity, sample: &Sample) -> Self {
        Self {
            activity,
            start: sample.timestamp,
            start_coordinates: sample.coordinates(),
        }
    }
}

fn scan<C: Classifier>(samples: &[Sample], classifier: &C) -> Result<Segmentation, InvalidInput> {
    let first = &samples[0];
    let hysteresis = classifier.rest_hysteresis();
    let mut sink = SegmentSink::default();
    let mut open = OpenSegment::at(classifier.classify(first, None), first);
    // Index of the first sample of the run disagreeing with `open`.
    let mut pending_run: Option<usize> = None;

    for (index, pair) in samples.windows(2).enumerate() {
        let (previous, sample) = (&pair[0], &pair[1]);
        let index = index + 1;
        let observed = classifier.classify(sample, Some(previous));

        if observed == open.activity {
            pending_run = None;
            continue;
        }

        match (open.activity, hysteresis) {
            (Activity::Work, Some(threshold)) => {
                let run_start = *pending_run.get_or_insert(index);
                let run_first = &samples[run_start];
                if sample.timestamp - run_first.timestamp >= threshold {
                    let before_run = &samples[run_start - 1];
                    sink.commit(&open, run_first.timestamp, before_run, before_run.coordinates())?;
                    open = OpenSegment::at(observed, run_first);
                    pending_run = None;
                }
            }
            _ => {
                sink.commit(&open, sample.timestamp, sample, previous.coordinates())?;
                open = OpenSegment::at(observed, sample);
                pending_run = None;
            }
        }
    }

    let last = &samples[samples.len() - 1];
    sink.commit(&open, last.timestamp, last, last.coordinates())?;

    Ok(sink.out)
}

fn drop_pre_post_rest(segmentation: &mut Segmentation) {
    let (Some(first_work), Some(last_work)) =
        (segmentation.first_work_start, segmentation.last_work_end)
    else {
        return;
    };
    segmentation.segments.retain(|s| {
        !(s.activity == Activity::Rest && (s.end() <= first_work || s.start() >= last_work))
    });
}

/// Splits a segment at every midnight it crosses.
///
/// Pieces of zero length are not produced.
pub fn split_by_day(segment: &Segment) -> Vec<Segment> {
    let mut pieces = Vec::new();
    let mut cursor = segment.start();
    let end = segment.end();

    while cursor.date() < end.date() {
        let Some(next_midnight) = cursor.date().succ_opt().map(|d| d.and_time(NaiveTime::MIN))
        else {
            break;
        };
        push_piece(&mut pieces, segment, cursor, next_midnight);
        cursor = next_midnight;
    }
    push_piece(&mut pieces, segment, cursor, end);

    pieces
}

fn push_piece(pieces: &mut Vec<Segment>, segment: &Segment, start: NaiveDateTime, end: NaiveDateTime) {
    if end <= start {
        return;
    }
    if let Ok(interval) = Interval::new(start, end) {
        pieces.push(Segment {
            interval,
            ..segment.clone()
        });
    }
}

/// A timestamped position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Waypoint {
    pub time: NaiveDateTime,
    pub coordinates: Coordinates,
}

/// Display summary of one day of telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryDay {
    pub date: NaiveDate,
    pub movement_start: Option<Waypoint>,
    pub movement_end: Option<Waypoint>,
    pub ignition_start: Option<Waypoint>,
    pub ignition_end: Option<Waypoint>,
    /// REST segments between the first and last movement.
    pub stops: Vec<Segment>,
    /// Where the vehicle sat when it never moved.
    pub idle_location: Option<Coordinates>,
}

/// Runs both strategies over one day and builds its display block.
pub fn summarize_telemetry_day(samples: &[Sample]) -> Result<TelemetryDay, InvalidInput> {
    let trimmed = |mode| SegmentOptions {
        mode,
        drop_pre_post_rest: true,
    };
    let by_speed = segment(samples, &trimmed(SegmentMode::Speed))?;
    let by_ignition = segment(samples, &trimmed(SegmentMode::Ignition))?;

    let waypoint = |time: Option<NaiveDateTime>, coordinates: Option<Coordinates>| {
        time.zip(coordinates)
            .map(|(time, coordinates)| Waypoint { time, coordinates })
    };

    let ignition_start = waypoint(by_ignition.first_work_start, by_ignition.first_work_coordinates);
    let ignition_end = waypoint(by_ignition.last_work_end, by_ignition.last_work_coordinates);
    let date = samples[0].timestamp.date();

    if !by_speed.has_work() {
        return Ok(TelemetryDay {
            date,
            movement_start: None,
            movement_end: None,
            ignition_start,
            ignition_end,
            stops: Vec::new(),
            idle_location: by_speed.segments.first().map(|s| s.start_coordinates),
        });
    }

    Ok(TelemetryDay {
        date,
        movement_start: waypoint(by_speed.first_work_start, by_speed.first_work_coordinates),
        movement_end: waypoint(by_speed.last_work_end, by_speed.last_work_coordinates),
        ignition_start,
        ignition_end,
        stops: by_speed
            .segments
            .into_iter()
            .filter(|s| s.activity == Activity::Rest)
            .collect(),
        idle_location: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn ts(minutes: i64) -> NaiveDateTime {
        t0() + Duration::minutes(minutes)
    }

    /// Parked sample at a fixed position.
    fn parked(minutes: i64, ignition: Ignition) -> Sample {
        Sample {
            timestamp: ts(minutes),
            speed: 0.0,
            ignition,
            latitude: -23.5,
            longitude: -46.6,
            city: "Sao Paulo".to_string(),
            street: "Rua A".to_string(),
        }
    }

    /// Moving sample whose position shifts with time.
    #[expect(clippy::cast_precision_loss, reason = "small test offsets")]
    fn moving(minutes: i64) -> Sample {
        let offset = minutes as f64 * 0.001;
        Sample {
            timestamp: ts(minutes),
            speed: 60.0,
            ignition: Ignition::On,
            latitude: -23.0 + offset,
            longitude: -46.0 + offset,
            city: "Campinas".to_string(),
            street: "Rod. Anhanguera".to_string(),
        }
    }

    fn speed() -> SegmentOptions {
        SegmentOptions::default()
    }

    fn ignition() -> SegmentOptions {
        SegmentOptions {
            mode: SegmentMode::Ignition,
            drop_pre_post_rest: false,
        }
    }

    fn kinds(segmentation: &Segmentation) -> Vec<(Activity, i64, i64)> {
        segmentation
            .segments
            .iter()
            .map(|s| {
                (
                    s.activity,
                    (s.start() - t0()).num_minutes(),
                    (s.end() - t0()).num_minutes(),
                )
            })
            .collect()
    }

    fn assert_contiguous(samples: &[Sample], segmentation: &Segmentation) {
        let segments = &segmentation.segments;
        assert_eq!(segments.first().unwrap().start(), samples[0].timestamp);
        assert_eq!(
            segments.last().unwrap().end(),
            samples[samples.len() - 1].timestamp
        );
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start(), "gap or overlap between segments");
        }
    }

    #[test]
    fn test_rest_then_movement_opens_work() {
        let mut start = moving(10);
        start.speed = 40.0;
        let samples = vec![parked(0, Ignition::Off), parked(1, Ignition::Off), start];

        let result = segment(&samples, &speed()).unwrap();

        assert_eq!(
            kinds(&result),
            vec![(Activity::Rest, 0, 10), (Activity::Work, 10, 10)]
        );
        assert_eq!(result.first_work_start, Some(ts(10)));
        assert_eq!(result.last_work_end, Some(ts(10)));
        assert_contiguous(&samples, &result);
    }

    #[test]
    fn test_fractional_speed_reads_as_movement() {
        let crawling: Sample = serde_json::from_str(
            r#"{"timestamp": "2025-03-10T08:10:00", "speed": 0.5, "ignition": "on",
                "latitude": -23.4, "longitude": -46.5}"#,
        )
        .unwrap();
        assert!((crawling.speed - 0.5).abs() < f64::EPSILON);

        let samples = vec![parked(0, Ignition::Off), crawling];
        let result = segment(&samples, &speed()).unwrap();

        assert_eq!(
            kinds(&result),
            vec![(Activity::Rest, 0, 10), (Activity::Work, 10, 10)]
        );
    }

    #[test]
    fn test_first_sample_is_rest_in_speed_mode() {
        let samples = vec![moving(0), moving(1), moving(2)];
        let result = segment(&samples, &speed()).unwrap();
        assert_eq!(
            kinds(&result),
            vec![(Activity::Rest, 0, 1), (Activity::Work, 1, 2)]
        );
    }

    #[test]
    fn test_short_stop_does_not_end_work() {
        let samples = vec![
            parked(0, Ignition::On),
            moving(1),
            moving(2),
            parked(3, Ignition::On),
            parked(6, Ignition::On),
            moving(7),
            moving(20),
        ];

        let result = segment(&samples, &speed()).unwrap();

        assert_eq!(
            kinds(&result),
            vec![(Activity::Rest, 0, 1), (Activity::Work, 1, 20)]
        );
        assert_contiguous(&samples, &result);
    }

    #[test]
    fn test_long_stop_closes_work_where_the_stop_began() {
        let samples = vec![
            parked(0, Ignition::On),
            moving(1),
            moving(10),
            parked(12, Ignition::Off),
            parked(15, Ignition::Off),
            parked(17, Ignition::Off),
            parked(30, Ignition::Off),
            moving(31),
            moving(40),
        ];

        let result = segment(&samples, &speed()).unwrap();

        assert_eq!(
            kinds(&result),
            vec![
                (Activity::Rest, 0, 1),
                (Activity::Work, 1, 12),
                (Activity::Rest, 12, 31),
                (Activity::Work, 31, 40),
            ]
        );
        // The WORK segment ends at the last moving position before the stop.
        let work = &result.segments[1];
        assert_eq!(work.end_coordinates, samples[2].coordinates());
        assert_eq!(result.first_work_start, Some(ts(1)));
        assert_eq!(result.last_work_end, Some(ts(40)));
        assert_contiguous(&samples, &result);
    }

    #[test]
    fn test_movement_resets_pending_stop() {
        // Two 4-minute stops separated by movement never reach the threshold.
        let samples = vec![
            parked(0, Ignition::On),
            moving(1),
            parked(2, Ignition::On),
            parked(6, Ignition::On),
            moving(7),
            parked(8, Ignition::On),
            parked(12, Ignition::On),
            moving(13),
        ];

        let result = segment(&samples, &speed()).unwrap();

        assert_eq!(
            kinds(&result),
            vec![(Activity::Rest, 0, 1), (Activity::Work, 1, 13)]
        );
    }

    #[test]
    fn test_ignition_mode_switches_immediately() {
        let samples = vec![
            parked(0, Ignition::On),
            parked(1, Ignition::Off),
            parked(2, Ignition::On),
            parked(30, Ignition::On),
        ];

        let result = segment(&samples, &ignition()).unwrap();

        assert_eq!(
            kinds(&result),
            vec![
                (Activity::Work, 0, 1),
                (Activity::Rest, 1, 2),
                (Activity::Work, 2, 30),
            ]
        );
        assert_eq!(result.first_work_start, Some(ts(0)));
        assert_eq!(result.last_work_end, Some(ts(30)));
    }

    #[test]
    fn test_drop_pre_post_rest() {
        let samples = vec![
            parked(0, Ignition::Off),
            parked(20, Ignition::Off),
            moving(21),
            moving(40),
            parked(41, Ignition::Off),
            parked(50, Ignition::Off),
            parked(90, Ignition::Off),
        ];
        let options = SegmentOptions {
            mode: SegmentMode::Speed,
            drop_pre_post_rest: true,
        };

        let all = segment(&samples, &speed()).unwrap();
        let trimmed = segment(&samples, &options).unwrap();

        assert_eq!(
            kinds(&all),
            vec![
                (Activity::Rest, 0, 21),
                (Activity::Work, 21, 41),
                (Activity::Rest, 41, 90),
            ]
        );
        assert_eq!(kinds(&trimmed), vec![(Activity::Work, 21, 41)]);
    }

    #[test]
    fn test_segments_cover_the_full_range() {
        // Deterministic mix of movement, short and long stops.
        let mut samples = Vec::new();
        for minute in 0..240_i64 {
            let sample = match minute % 37 {
                0..=19 => moving(minute),
                20..=22 => parked(minute, Ignition::On),
                _ => parked(minute, Ignition::Off),
            };
            samples.push(sample);
        }

        for options in [speed(), ignition()] {
            let result = segment(&samples, &options).unwrap();
            assert_contiguous(&samples, &result);
            assert!(result.segments.iter().all(|s| s.duration() >= Duration::zero()));
            assert_eq!(result, segment(&samples, &options).unwrap());
        }
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(segment(&[], &speed()), Err(InvalidInput::EmptySamples));
    }

    #[test]
    fn test_unordered_input_is_rejected() {
        let samples = vec![parked(5, Ignition::Off), parked(1, Ignition::Off)];
        assert_eq!(
            segment(&samples, &speed()),
            Err(InvalidInput::UnorderedSamples {
                index: 1,
                timestamp: ts(1)
            })
        );
    }

    #[test]
    fn test_split_by_day() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let segment = Segment {
            activity: Activity::Rest,
            interval: Interval::new(start, start + Duration::hours(28)).unwrap(),
            start_coordinates: parked(0, Ignition::Off).coordinates(),
            end_coordinates: parked(0, Ignition::Off).coordinates(),
            city: String::new(),
            street: String::new(),
        };

        let pieces = split_by_day(&segment);

        let hours: Vec<i64> = pieces.iter().map(|p| p.duration().num_hours()).collect();
        assert_eq!(hours, vec![2, 24, 2]);
        assert_eq!(pieces[1].start().time(), NaiveTime::MIN);
    }

    #[test]
    fn test_summary_without_movement() {
        let samples = vec![
            parked(0, Ignition::Off),
            parked(30, Ignition::On),
            parked(60, Ignition::Off),
        ];

        let day = summarize_telemetry_day(&samples).unwrap();

        assert!(day.movement_start.is_none());
        assert!(day.stops.is_empty());
        assert_eq!(day.idle_location, Some(samples[0].coordinates()));
        assert_eq!(day.ignition_start.map(|w| w.time), Some(ts(30)));
        assert_eq!(day.ignition_end.map(|w| w.time), Some(ts(60)));
    }

    #[test]
    fn test_summary_lists_stops_between_movement() {
        let samples = vec![
            parked(0, Ignition::Off),
            moving(1),
            moving(10),
            parked(11, Ignition::Off),
            parked(40, Ignition::Off),
            moving(41),
            moving(50),
            parked(51, Ignition::Off),
            parked(120, Ignition::Off),
        ];

        let day = summarize_telemetry_day(&samples).unwrap();

        assert_eq!(day.movement_start.map(|w| w.time), Some(ts(1)));
        assert_eq!(day.movement_end.map(|w| w.time), Some(ts(51)));
        let stops: Vec<_> = day
            .stops
            .iter()
            .map(|s| ((s.start() - t0()).num_minutes(), (s.end() - t0()).num_minutes()))
            .collect();
        assert_eq!(stops, vec![(11, 41)]);
        assert!(day.idle_location.is_none());
    }
}
