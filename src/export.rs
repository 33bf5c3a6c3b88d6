//! writing export rows as delimited text
use {
    crate::{error::Result, rows::ExportRow},
    std::{
        fs::{self, File},
        io::{BufWriter, Write},
        path::{Path, PathBuf},
    },
    tracing::{debug, info},
};

/// What [`write_csv`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// there were no rows, nothing was written
    Empty,
    /// rows were written to `path`
    Written {
        /// the output file
        path: PathBuf,
        /// number of data rows (header excluded)
        rows: usize,
    },
}

/// write a header and every row to `writer`, returning the number of rows
pub fn write_rows<W: Write>(rows: &[ExportRow], writer: W, delimiter: u8) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_writer(writer);

    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(rows.len())
}

/// write rows to a file, or nothing at all if there are none
///
/// the file is written next to its destination first and renamed into place
pub fn write_csv(rows: &[ExportRow], path: impl AsRef<Path>, delimiter: u8) -> Result<WriteOutcome> {
    let path = path.as_ref();

    if rows.is_empty() {
        debug!(path = %path.display(), "no rows, skipping write");
        return Ok(WriteOutcome::Empty);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    let written = match write_file(rows, &temp, delimiter)
        .and_then(|n| fs::rename(&temp, path).map(|()| n).map_err(Into::into))
    {
        Ok(n) => n,
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&temp) {
                debug!(path = %temp.display(), error = %cleanup, "no temp file to remove");
            }
            return Err(e);
        }
    };

    info!(path = %path.display(), rows = written, "wrote export");

    Ok(WriteOutcome::Written {
        path: path.to_path_buf(),
        rows: written,
    })
}

/// write a header and every row to a new file at `path`
fn write_file(rows: &[ExportRow], path: &Path, delimiter: u8) -> Result<usize> {
    let mut buf = BufWriter::new(File::create(path)?);
    let n = write_rows(rows, &mut buf, delimiter)?;
    buf.flush()?;
    Ok(n)
}
