//! JSON rendering.

use crate::core::dupe::DuplicateGroup;
use crate::core::search::SearchMatch;
use crate::error::ReportError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// A path as it appears in JSON output.
///
/// Valid UTF-8 paths are plain strings. Anything else keeps its raw bytes
/// next to a lossy rendering, so no file name is ever altered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EncodedPath {
    Utf8(String),
    Raw { lossy: String, bytes: Vec<u8> },
}

impl From<&Path> for EncodedPath {
    fn from(path: &Path) -> Self {
        match path.to_str() {
            Some(s) => EncodedPath::Utf8(s.to_string()),
            None => EncodedPath::Raw {
                lossy: path.to_string_lossy().into_owned(),
                bytes: raw_bytes(path),
            },
        }
    }
}

#[cfg(unix)]
fn raw_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

// UTF-16 code units, big-endian
#[cfg(windows)]
fn raw_bytes(path: &Path) -> Vec<u8> {
    use std::os::windows::ffi::OsStrExt;
    path.as_os_str()
        .encode_wide()
        .flat_map(|unit| unit.to_be_bytes())
        .collect()
}

#[cfg(not(any(unix, windows)))]
fn raw_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[derive(Serialize)]
struct SearchRow {
    path: EncodedPath,
    distance: u32,
}

#[derive(Serialize)]
struct DupeRow {
    fingerprint: String,
    paths: Vec<EncodedPath>,
}

pub(super) fn write_search<W: Write>(
    matches: &[SearchMatch],
    writer: &mut W,
) -> Result<(), ReportError> {
    let rows: Vec<SearchRow> = matches
        .iter()
        .map(|m| SearchRow {
            path: EncodedPath::from(m.record.path.as_path()),
            distance: m.distance,
        })
        .collect();

    write_pretty(&rows, writer)
}

pub(super) fn write_dupes<W: Write>(
    groups: &[DuplicateGroup],
    writer: &mut W,
) -> Result<(), ReportError> {
    let rows: Vec<DupeRow> = groups
        .iter()
        .map(|g| DupeRow {
            fingerprint: g.fingerprint.to_hex(),
            paths: g.paths.iter().map(|p| EncodedPath::from(p.as_path())).collect(),
        })
        .collect();

    write_pretty(&rows, writer)
}

fn write_pretty<T: Serialize, W: Write>(value: &T, writer: &mut W) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}
