//! Content addressing: derive a stable identifier for a PDF from its bytes.
//!
//! The identity keys the per-PDF workspace directory, so two properties
//! matter: byte-identical inputs must always map to the same digest
//! (re-extraction is idempotent at the filesystem level), and distinct PDFs
//! must never share a workspace. The file is streamed through the hash in
//! fixed-size chunks, so memory stays O(chunk) no matter how large the PDF.

use crate::error::ExtractError;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Chunk size for streaming the file through the hasher.
const HASH_CHUNK_BYTES: usize = 8192;

/// Compute the hex SHA-1 digest of the file at `path`.
///
/// I/O errors propagate; there is no retry at this layer.
pub fn pdf_identity(path: &Path) -> Result<String, ExtractError> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ExtractError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let mut hasher = Sha1::new();
    let mut buf = [0u8; HASH_CHUNK_BYTES];
    loop {
        let n = file.read(&mut buf).map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
