use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::error::SyncError;

const READ_CHUNK: usize = 64 * 1024;

/// SHA-256 of the whole file, hex-encoded.
///
/// Only used to notice that the snapshot changed between cycles.
pub async fn file_digest(path: impl AsRef<Path>) -> Result<String, SyncError> {
    let path = path.as_ref();
    let file_error = |source| SyncError::File {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::open(path).await.map_err(file_error)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = file.read(&mut buf).await.map_err(file_error)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn digest_matches_known_sha256() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        let digest = file_digest(file.path()).await.unwrap();
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn digest_is_order_sensitive() {
        let mut a = tempfile::NamedTempFile::new().unwrap();
        let mut b = tempfile::NamedTempFile::new().unwrap();
        a.write_all(b"line1\nline2\n").unwrap();
        b.write_all(b"line2\nline1\n").unwrap();

        let da = file_digest(a.path()).await.unwrap();
        let db = file_digest(b.path()).await.unwrap();
        assert_ne!(da, db);
        assert_eq!(da.len(), 64);
    }

    #[tokio::test]
    async fn missing_file_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = file_digest(dir.path().join("nope.csv")).await.unwrap_err();
        assert!(matches!(err, SyncError::File { .. }));
    }
}
