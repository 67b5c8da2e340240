//! On-disk storage for uploaded proof images
//!
//! Files land in `<uploads_dir>/proof/<session_id>-<hash prefix>-<file name>`;
//! the path relative to `uploads_dir` is what viewers receive in upload
//! events. The content hash prefix keeps different photos sent under the same
//! client file name (phones mostly send `image.jpg`) from replacing each other.

use donate_common::Result;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

const PROOF_SUBDIR: &str = "proof";
const FALLBACK_FILE_NAME: &str = "upload.bin";
/// Hex digits of the content hash kept in stored file names
const HASH_PREFIX_LEN: usize = 16;

pub struct ImageStorage {
    root: PathBuf,
}

impl ImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` and return the stored path relative to the uploads root
    ///
    /// `content_hash` is the digest the image was recorded under.
    pub async fn save(
        &self,
        session_id: Uuid,
        content_hash: &str,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<String> {
        let dir = self.root.join(PROOF_SUBDIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = stored_file_name(session_id, content_hash, original_name);
        let path = dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "Stored proof image");
        Ok(format!("{}/{}", PROOF_SUBDIR, file_name))
    }
}

fn stored_file_name(session_id: Uuid, content_hash: &str, original_name: Option<&str>) -> String {
    let prefix = content_hash.get(..HASH_PREFIX_LEN).unwrap_or(content_hash);
    format!("{}-{}-{}", session_id, prefix, sanitize_file_name(original_name))
}

/// Reduce a client-supplied name to a safe final path component
fn sanitize_file_name(original: Option<&str>) -> String {
    original
        .map(|name| name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name).trim())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}
