//! Plain text rendering, one record per line.

use crate::core::dupe::DuplicateGroup;
use crate::core::search::SearchMatch;
use crate::error::ReportError;
use std::io::Write;

/// `<distance>\t<path>` per match
pub(super) fn write_search<W: Write>(
    matches: &[SearchMatch],
    writer: &mut W,
) -> Result<(), ReportError> {
    for m in matches {
        writeln!(writer, "{}\t{}", m.distance, m.record.path.display())?;
    }
    Ok(())
}

/// The fingerprint in hex, then each member indented by two spaces
pub(super) fn write_dupes<W: Write>(
    groups: &[DuplicateGroup],
    writer: &mut W,
) -> Result<(), ReportError> {
    for group in groups {
        writeln!(writer, "{}", group.fingerprint)?;
        for path in &group.paths {
            writeln!(writer, "  {}", path.display())?;
        }
    }
    Ok(())
}
