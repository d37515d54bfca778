//! Decoding of OpenSky-format positional state arrays.
//!
//! ```text
//! [icao24, callsign, origin_country, time_position, last_contact, longitude,
//!  latitude, baro_altitude, on_ground, velocity, true_track, vertical_rate,
//!  sensors, geo_altitude, squawk, spi, position_source, category]
//! ```
//!
//! `category` is only sent when extended data is requested, so both 17 and 18
//! element rows are accepted.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::ops::RangeInclusive;

use super::error::ValidationError;
use super::types::{Provenance, StateVector};

const ICAO24: usize = 0;
const CALLSIGN: usize = 1;
const ORIGIN_COUNTRY: usize = 2;
const TIME_POSITION: usize = 3;
const LAST_CONTACT: usize = 4;
const LONGITUDE: usize = 5;
const LATITUDE: usize = 6;
const BARO_ALTITUDE: usize = 7;
const ON_GROUND: usize = 8;
const VELOCITY: usize = 9;
const TRUE_TRACK: usize = 10;
const VERTICAL_RATE: usize = 11;
const SENSORS: usize = 12;
const GEO_ALTITUDE: usize = 13;
const SQUAWK: usize = 14;
const SPI: usize = 15;
const POSITION_SOURCE: usize = 16;
const CATEGORY: usize = 17;

const MIN_FIELDS: usize = 17;
const MAX_FIELDS: usize = 18;

const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;
const ALTITUDE_RANGE_M: RangeInclusive<f64> = -1000.0..=30000.0;
const VELOCITY_RANGE_M_S: RangeInclusive<f64> = 0.0..=1500.0;
const TRACK_RANGE_DEG: RangeInclusive<f64> = 0.0..=360.0;

/// Best-effort identifier for rejection reports.
pub fn identifier_of(row: &Value) -> String {
    row.get(ICAO24)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Decodes and validates one wire row, stamping it with its provenance.
pub fn decode_row(
    row: &Value,
    provenance: &Provenance,
    received_at: DateTime<Utc>,
) -> Result<StateVector, ValidationError> {
    let fields = row.as_array().ok_or(ValidationError::NotAnArray)?;
    if !(MIN_FIELDS..=MAX_FIELDS).contains(&fields.len()) {
        return Err(ValidationError::FieldCount(fields.len()));
    }

    let icao24 = parse_icao24(&fields[ICAO24])?;
    let last_contact =
        opt_i64(fields, LAST_CONTACT, "last_contact")?.ok_or(ValidationError::Missing("last_contact"))?;
    if last_contact < 0 {
        return Err(ValidationError::OutOfRange {
            field: "last_contact",
            value: last_contact as f64,
        });
    }

    let category = match opt_i64(fields, CATEGORY, "category")? {
        Some(c) if (0..=19).contains(&c) => Some(c as u8),
        Some(c) => return Err(ValidationError::InvalidCategory(c)),
        None => None,
    };
    let position_source = match opt_i64(fields, POSITION_SOURCE, "position_source")? {
        Some(p) if (0..=3).contains(&p) => p as u8,
        Some(p) => return Err(ValidationError::InvalidPositionSource(p)),
        None => 0,
    };

    Ok(StateVector {
        icao24,
        callsign: opt_str(fields, CALLSIGN, "callsign")?
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        origin_country: opt_str(fields, ORIGIN_COUNTRY, "origin_country")?
            .unwrap_or_default()
            .to_string(),
        time_position: opt_i64(fields, TIME_POSITION, "time_position")?,
        last_contact,
        longitude: ranged(fields, LONGITUDE, "longitude", LONGITUDE_RANGE)?,
        latitude: ranged(fields, LATITUDE, "latitude", LATITUDE_RANGE)?,
        baro_altitude: ranged(fields, BARO_ALTITUDE, "baro_altitude", ALTITUDE_RANGE_M)?,
        on_ground: opt_bool(fields, ON_GROUND, "on_ground")?,
        velocity: ranged(fields, VELOCITY, "velocity", VELOCITY_RANGE_M_S)?,
        true_track: ranged(fields, TRUE_TRACK, "true_track", TRACK_RANGE_DEG)?,
        vertical_rate: opt_f64(fields, VERTICAL_RATE, "vertical_rate")?,
        sensors: parse_sensors(fields)?,
        geo_altitude: ranged(fields, GEO_ALTITUDE, "geo_altitude", ALTITUDE_RANGE_M)?,
        squawk: opt_str(fields, SQUAWK, "squawk")?.map(|s| s.trim().to_string()),
        spi: opt_bool(fields, SPI, "spi")?,
        position_source,
        category,
        feeder_id: provenance.feeder_id.clone(),
        ingestion_timestamp: received_at,
        data_source: provenance.data_source.clone(),
        source_priority: provenance.priority,
    })
}

fn parse_icao24(value: &Value) -> Result<String, ValidationError> {
    let raw = value.as_str().ok_or(ValidationError::Missing("icao24"))?;
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.len() == 6 && normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(normalized)
    } else {
        Err(ValidationError::InvalidIcao24(raw.to_string()))
    }
}

fn parse_sensors(fields: &[Value]) -> Result<Option<Vec<i64>>, ValidationError> {
    match &fields[SENSORS] {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_i64().ok_or(ValidationError::FieldType {
                    field: "sensors",
                    expected: "array of integers",
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        _ => Err(ValidationError::FieldType {
            field: "sensors",
            expected: "array of integers",
        }),
    }
}

fn opt_f64(
    fields: &[Value],
    idx: usize,
    field: &'static str,
) -> Result<Option<f64>, ValidationError> {
    match fields.get(idx) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or(ValidationError::FieldType {
                field,
                expected: "number",
            }),
    }
}

fn ranged(
    fields: &[Value],
    idx: usize,
    field: &'static str,
    range: RangeInclusive<f64>,
) -> Result<Option<f64>, ValidationError> {
    match opt_f64(fields, idx, field)? {
        Some(value) if !range.contains(&value) => {
            Err(ValidationError::OutOfRange { field, value })
        }
        other => Ok(other),
    }
}

fn opt_i64(
    fields: &[Value],
    idx: usize,
    field: &'static str,
) -> Result<Option<i64>, ValidationError> {
    match fields.get(idx) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            // Some aggregators send integral timestamps as floats.
            .or_else(|| v.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or(ValidationError::FieldType {
                field,
                expected: "integer",
            }),
    }
}

fn opt_str<'a>(
    fields: &'a [Value],
    idx: usize,
    field: &'static str,
) -> Result<Option<&'a str>, ValidationError> {
    match fields.get(idx) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ValidationError::FieldType {
            field,
            expected: "string",
        }),
    }
}

fn opt_bool(fields: &[Value], idx: usize, field: &'static str) -> Result<bool, ValidationError> {
    match fields.get(idx) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ValidationError::FieldType {
            field,
            expected: "boolean",
        }),
    }
}
