//! Recording formats for snapshot streams.
//!
//! NDJSON keeps every field and can be read back; CSV keeps a flat subset
//! for spreadsheets and plotting tools.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use model::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Ndjson,
    Csv,
}

/// Sink for decoded snapshots, one record per call.
pub trait SnapshotWriter {
    fn write(&mut self, at: OffsetDateTime, snapshot: &TelemetrySnapshot) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

pub fn writer<'a, W: Write + 'a>(format: Format, out: W) -> Box<dyn SnapshotWriter + 'a> {
    match format {
        Format::Ndjson => Box::new(NdjsonWriter::new(out)),
        Format::Csv => Box::new(CsvWriter::new(out)),
    }
}

fn rfc3339(at: OffsetDateTime) -> Result<String> {
    at.format(&Rfc3339).context("format timestamp")
}

#[derive(Serialize)]
struct RecordRef<'a> {
    received_at: String,
    #[serde(flatten)]
    snapshot: &'a TelemetrySnapshot,
}

/// One line of an NDJSON recording.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
    #[serde(flatten)]
    pub snapshot: TelemetrySnapshot,
}

pub struct NdjsonWriter<W: Write> {
    out: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SnapshotWriter for NdjsonWriter<W> {
    fn write(&mut self, at: OffsetDateTime, snapshot: &TelemetrySnapshot) -> Result<()> {
        let record = RecordRef { received_at: rfc3339(at)?, snapshot };
        serde_json::to_writer(&mut self.out, &record)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

pub fn read_ndjson<R: BufRead>(input: R) -> Result<Vec<Record>> {
    let mut records = vec![];
    for (n, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).with_context(|| format!("line {}", n + 1))?;
        records.push(record);
    }
    Ok(records)
}

#[derive(Serialize)]
struct CsvRow {
    received_at: String,
    package_id: i32,
    car_id: i32,
    current_lap: i16,
    time_on_track_ms: i32,
    car_speed_kph: f32,
    rpm: f32,
    throttle: f32,
    brake: f32,
    gear: u8,
    suggested_gear: u8,
    boost: f32,
    fuel_level: f32,
    x: f32,
    y: f32,
    z: f32,
    pitch: f32,
    yaw: f32,
    roll: f32,
    slip_fl: f32,
    slip_fr: f32,
    slip_rl: f32,
    slip_rr: f32,
}

impl CsvRow {
    fn new(received_at: String, s: &TelemetrySnapshot) -> Self {
        Self {
            received_at,
            package_id: s.package_id,
            car_id: s.car_id,
            current_lap: s.current_lap,
            time_on_track_ms: s.time_on_track_ms,
            car_speed_kph: s.car_speed,
            rpm: s.rpm,
            throttle: s.throttle,
            brake: s.brake,
            gear: s.current_gear,
            suggested_gear: s.suggested_gear,
            boost: s.boost,
            fuel_level: s.fuel_level,
            x: s.position.x,
            y: s.position.y,
            z: s.position.z,
            pitch: s.rotation.pitch,
            yaw: s.rotation.yaw,
            roll: s.rotation.roll,
            slip_fl: s.tire_slip_ratio.fl,
            slip_fr: s.tire_slip_ratio.fr,
            slip_rl: s.tire_slip_ratio.rl,
            slip_rr: s.tire_slip_ratio.rr,
        }
    }
}

pub struct CsvWriter<W: Write> {
    w: csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    /// The header row is written with the first record.
    pub fn new(out: W) -> Self {
        Self { w: csv::Writer::from_writer(out) }
    }
}

impl<W: Write> SnapshotWriter for CsvWriter<W> {
    fn write(&mut self, at: OffsetDateTime, snapshot: &TelemetrySnapshot) -> Result<()> {
        self.w.serialize(CsvRow::new(rfc3339(at)?, snapshot))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.w.flush()?;
        Ok(())
    }
}
