//! Streaming bzip2 decompression of downloaded market files.
//!
//! Input is read in fixed-size chunks and pushed through the decoder, so
//! memory use does not depend on the file size. Any corruption in the
//! stream is fatal; partially written output is not cleaned up or reused.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use tracing::debug;

use crate::Result;
use crate::error::OddsError;

/// Size of each read from the compressed source.
pub const CHUNK_SIZE: usize = 100 * 1024;

/// Suffix appended to a market file's name once decompressed.
pub const DECOMPRESSED_SUFFIX: &str = ".decompressed";

/// Decompresses everything from `reader` into `writer`.
///
/// Returns the number of decompressed bytes written.
///
/// # Errors
///
/// Returns [`OddsError::Decompress`] if the stream is corrupt or truncated
/// (or the source cannot be read), or [`OddsError::Io`] if writing fails.
pub fn decompress<R: Read, W: Write>(reader: R, mut writer: W) -> Result<u64> {
    let mut decoder = BzDecoder::new(BufReader::with_capacity(CHUNK_SIZE, reader));
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;

    loop {
        let n = decoder.read(&mut chunk).map_err(decompress_error)?;
        if n == 0 {
            break;
        }
        writer.write_all(&chunk[..n])?;
        written += n as u64;
    }

    writer.flush()?;
    Ok(written)
}

/// Path the decompressed copy of `compressed` is written to:
/// the same directory, file name plus [`DECOMPRESSED_SUFFIX`].
pub fn decompressed_path(compressed: &Path) -> PathBuf {
    let mut name = compressed
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(DECOMPRESSED_SUFFIX);
    compressed.with_file_name(name)
}

/// Decompresses the file at `compressed` next to itself.
///
/// Returns the path of the decompressed file.
pub fn decompress_file(compressed: &Path) -> Result<PathBuf> {
    let output = decompressed_path(compressed);
    decompress_file_to(compressed, &output)?;
    Ok(output)
}

/// Decompresses the file at `compressed` into `output`, truncating it first.
///
/// Returns the decompressed size in bytes.
pub fn decompress_file_to(compressed: &Path, output: &Path) -> Result<u64> {
    let source = File::open(compressed)?;
    let sink = BufWriter::new(File::create(output)?);
    let written = decompress(source, sink)?;
    debug!(
        source = %compressed.display(),
        output = %output.display(),
        bytes = written,
        "Decompressed market file"
    );
    Ok(written)
}

fn decompress_error(e: std::io::Error) -> OddsError {
    OddsError::Decompress(e.to_string())
}
