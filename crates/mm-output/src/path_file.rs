//! Path files — timed edge traversals.
//!
//! # Format
//!
//! Group header: `#,{pid},{oid},{first_enter},{last_leave}`; entity rows
//! `enter,leave,eid`.  All timestamps are millisecond-precision ISO 8601
//! with a space separator (`2008-02-02 12:00:06.000`).

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path as FsPath;

use csv::{ReaderBuilder, WriterBuilder};
use mm_core::time::{PATH_TIME_FORMAT, format_timestamp, parse_timestamp};
use mm_core::{EdgeId, Path, PathEntity};

use crate::error::{OutputError, OutputResult};
use crate::traj_file::{field, parse_u32};

// ── Store ─────────────────────────────────────────────────────────────────────

/// Write `paths` to `writer`.
pub fn store_paths<W: Write>(paths: &[Path], writer: W) -> OutputResult<()> {
    let mut out = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);
    for path in paths {
        let entities = &path.entities;
        let (Some(first), Some(last)) = (entities.first(), entities.last()) else {
            continue;
        };
        out.write_record([
            "#".to_string(),
            path.pid.clone(),
            path.oid.clone(),
            format_timestamp(first.enter_time, PATH_TIME_FORMAT),
            format_timestamp(last.leave_time, PATH_TIME_FORMAT),
        ])?;
        for entity in entities {
            out.write_record([
                format_timestamp(entity.enter_time, PATH_TIME_FORMAT),
                format_timestamp(entity.leave_time, PATH_TIME_FORMAT),
                entity.eid.0.to_string(),
            ])?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Write `paths` to a file at `path`.
pub fn store_paths_to_path(paths: &[Path], path: &FsPath) -> OutputResult<()> {
    store_paths(paths, File::create(path)?)
}

// ── Parse ─────────────────────────────────────────────────────────────────────

/// Read paths back from `reader`.
pub fn parse_paths<R: Read>(reader: R) -> OutputResult<Vec<Path>> {
    let mut input = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut paths = Vec::new();
    let mut group: Option<(String, String)> = None; // (oid, pid)
    let mut entities: Vec<PathEntity> = Vec::new();

    for record in input.records() {
        let record = record?;
        if field(&record, 0)? == "#" {
            if let Some((oid, pid)) = group.take()
                && !entities.is_empty()
            {
                paths.push(Path::new(oid, pid, std::mem::take(&mut entities)));
            }
            entities.clear();
            group = Some((field(&record, 2)?.to_string(), field(&record, 1)?.to_string()));
            continue;
        }
        if group.is_none() {
            return Err(OutputError::Parse("entity row before group header".into()));
        }
        entities.push(PathEntity::new(
            parse_timestamp(field(&record, 0)?, PATH_TIME_FORMAT)?,
            parse_timestamp(field(&record, 1)?, PATH_TIME_FORMAT)?,
            EdgeId(parse_u32(field(&record, 2)?)?),
        ));
    }
    if let Some((oid, pid)) = group
        && !entities.is_empty()
    {
        paths.push(Path::new(oid, pid, entities));
    }
    Ok(paths)
}

/// Read paths from a file at `path`.
pub fn parse_paths_from_path(path: &FsPath) -> OutputResult<Vec<Path>> {
    parse_paths(File::open(path)?)
}
