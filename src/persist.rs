use std::{borrow::Cow, fs, io::Write, path::Path};

use bincode::Options;
use log::debug;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{ds::QTable, Error, Result};

const MAGIC: [u8; 4] = *b"QTAB";
const VERSION: u16 = 1;

/// On-disk layout of a value table
///
/// Fixed-width little-endian integers followed by the row-major `f64` cells, so values
/// round-trip bit for bit.
#[derive(Serialize, Deserialize)]
struct Snapshot<'a> {
    magic: [u8; 4],
    version: u16,
    rows: u64,
    cols: u64,
    values: Cow<'a, [f64]>,
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Serialize a table's shape and contents
pub fn encode(table: &QTable) -> Result<Vec<u8>> {
    let (rows, cols) = table.shape();
    let snapshot = Snapshot {
        magic: MAGIC,
        version: VERSION,
        rows: rows as u64,
        cols: cols as u64,
        values: Cow::Borrowed(table.values()),
    };
    options()
        .serialize(&snapshot)
        .map_err(|e| Error::Encode(e.to_string()))
}

/// Deserialize a table produced by [`encode`]
///
/// **Errors** with [`Error::CorruptState`] if the bytes are truncated, carry trailing data, an
/// unknown tag or version, or a cell count that does not match the header.
pub fn decode(bytes: &[u8]) -> Result<QTable> {
    let snapshot: Snapshot = options()
        .deserialize(bytes)
        .map_err(|e| Error::CorruptState(e.to_string()))?;

    if snapshot.magic != MAGIC {
        return Err(Error::CorruptState(format!(
            "unrecognized tag {:?}",
            snapshot.magic
        )));
    }
    if snapshot.version != VERSION {
        return Err(Error::CorruptState(format!(
            "unsupported version {}",
            snapshot.version
        )));
    }

    let (rows, cols) = match (
        usize::try_from(snapshot.rows),
        usize::try_from(snapshot.cols),
    ) {
        (Ok(rows), Ok(cols)) => (rows, cols),
        _ => return Err(Error::CorruptState("dimensions overflow usize".into())),
    };
    let len = snapshot.values.len();
    QTable::from_values(rows, cols, snapshot.values.into_owned()).ok_or_else(|| {
        Error::CorruptState(format!(
            "header declares {rows}x{cols} table but {len} values follow"
        ))
    })
}

/// Write a table to `path`, replacing any existing file atomically
///
/// The bytes land in a temporary file in the same directory which is then renamed over `path`,
/// so a crash mid-write never leaves a truncated table behind.
pub fn save(table: &QTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let bytes = encode(table)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(&bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    debug!(
        "saved {}x{} table to {} ({} bytes)",
        table.rows(),
        table.cols(),
        path.display(),
        bytes.len()
    );
    Ok(())
}

/// Read a table from `path`
pub fn load(path: impl AsRef<Path>) -> Result<QTable> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let table = decode(&bytes)?;
    debug!(
        "loaded {}x{} table from {}",
        table.rows(),
        table.cols(),
        path.display()
    );
    Ok(table)
}
