use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the published binary at `path`.
pub fn artifact_digest(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open artifact for hashing: {}", path.display()))?;
    digest_reader(BufReader::new(file))
        .with_context(|| format!("Failed to hash artifact: {}", path.display()))
}

pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
