//! Trajectory files — raw traces and map-matched traces.
//!
//! # Format
//!
//! Group header: `#,{tid},{oid},{start},{end},{length_km} km`.
//!
//! Point rows by format:
//! - raw: `time,lat,lng`
//! - matched: `time,lat,lng,eid,proj_lat,proj_lng,error,offset`, with the
//!   five candidate fields all `None` for unmatched points.
//!
//! Point times use `%Y/%m/%d %H:%M:%S`.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use mm_core::time::{TRAJ_TIME_FORMAT, format_timestamp, parse_timestamp};
use mm_core::{CandidatePoint, EdgeId, PointData, STPoint, Trajectory};

use crate::error::{OutputError, OutputResult};

/// Which row layout the file uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrajFormat {
    /// Plain observations.
    Raw,
    /// Observations with their matched candidate (or `None`).
    Matched,
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Write `trajs` to `writer` in the given format.
pub fn store_trajs<W: Write>(
    trajs: &[Trajectory],
    format: TrajFormat,
    writer: W,
) -> OutputResult<()> {
    let mut out = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);
    for traj in trajs {
        let pts = &traj.pts;
        let (Some(first), Some(last)) = (pts.first(), pts.last()) else {
            continue; // empty trajectories have no representable header
        };
        out.write_record([
            "#".to_string(),
            traj.tid.clone(),
            traj.oid.clone(),
            format_timestamp(first.time, TRAJ_TIME_FORMAT),
            format_timestamp(last.time, TRAJ_TIME_FORMAT),
            format!("{} km", traj.length_m() / 1_000.0),
        ])?;
        for pt in pts {
            let time = format_timestamp(pt.time, TRAJ_TIME_FORMAT);
            match format {
                TrajFormat::Raw => {
                    out.write_record([time, pt.lat.to_string(), pt.lng.to_string()])?;
                }
                TrajFormat::Matched => match pt.candidate() {
                    Some(c) => out.write_record([
                        time,
                        pt.lat.to_string(),
                        pt.lng.to_string(),
                        c.eid.0.to_string(),
                        c.lat.to_string(),
                        c.lng.to_string(),
                        c.error.to_string(),
                        c.offset.to_string(),
                    ])?,
                    None => out.write_record([
                        time.as_str(),
                        &pt.lat.to_string(),
                        &pt.lng.to_string(),
                        "None",
                        "None",
                        "None",
                        "None",
                        "None",
                    ])?,
                },
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Write `trajs` to a file at `path`.
pub fn store_trajs_to_path(
    trajs: &[Trajectory],
    format: TrajFormat,
    path: &Path,
) -> OutputResult<()> {
    store_trajs(trajs, format, File::create(path)?)
}

// ── Parse ─────────────────────────────────────────────────────────────────────

/// Read trajectories back from `reader`.
pub fn parse_trajs<R: Read>(reader: R, format: TrajFormat) -> OutputResult<Vec<Trajectory>> {
    let mut input = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut trajs = Vec::new();
    let mut group: Option<(String, String)> = None; // (oid, tid)
    let mut pts: Vec<STPoint> = Vec::new();

    for record in input.records() {
        let record = record?;
        if field(&record, 0)? == "#" {
            if let Some((oid, tid)) = group.take()
                && !pts.is_empty()
            {
                trajs.push(Trajectory::new(oid, tid, std::mem::take(&mut pts)));
            }
            pts.clear();
            group = Some((field(&record, 2)?.to_string(), field(&record, 1)?.to_string()));
            continue;
        }
        if group.is_none() {
            return Err(OutputError::Parse("point row before group header".into()));
        }
        let time = parse_timestamp(field(&record, 0)?, TRAJ_TIME_FORMAT)?;
        let lat = parse_f64(field(&record, 1)?)?;
        let lng = parse_f64(field(&record, 2)?)?;
        pts.push(match format {
            TrajFormat::Raw => STPoint::new(lat, lng, time),
            TrajFormat::Matched => {
                let candi_pt = if field(&record, 3)? == "None" {
                    None
                } else {
                    Some(CandidatePoint::new(
                        parse_f64(field(&record, 4)?)?,
                        parse_f64(field(&record, 5)?)?,
                        EdgeId(parse_u32(field(&record, 3)?)?),
                        parse_f64(field(&record, 6)?)?,
                        parse_f64(field(&record, 7)?)?,
                    ))
                };
                STPoint::with_data(lat, lng, time, PointData { candi_pt })
            }
        });
    }
    if let Some((oid, tid)) = group
        && !pts.is_empty()
    {
        trajs.push(Trajectory::new(oid, tid, pts));
    }
    Ok(trajs)
}

/// Read trajectories from a file at `path`.
pub fn parse_trajs_from_path(path: &Path, format: TrajFormat) -> OutputResult<Vec<Trajectory>> {
    parse_trajs(File::open(path)?, format)
}

// ── Field helpers (shared with path_file) ─────────────────────────────────────

pub(crate) fn field<'r>(record: &'r StringRecord, idx: usize) -> OutputResult<&'r str> {
    record
        .get(idx)
        .ok_or_else(|| OutputError::Parse(format!("missing field {idx} in record")))
}

pub(crate) fn parse_f64(s: &str) -> OutputResult<f64> {
    s.parse()
        .map_err(|_| OutputError::Parse(format!("invalid float: {s}")))
}

pub(crate) fn parse_u32(s: &str) -> OutputResult<u32> {
    s.parse()
        .map_err(|_| OutputError::Parse(format!("invalid integer: {s}")))
}
