//! Resume vault: staged uploads on local disk.
//!
//! Uploaded resumes are staged here before the owning application row
//! exists. A staged file is referenced by an opaque, root-relative path and
//! is either adopted by a successful submission or discarded as
//! compensation when the submission fails.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{FileError, FileResult};

/// Maximum resume size in bytes (5 MB).
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// Allowed resume extensions, lowercase.
const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// Allowed resume MIME types.
const ALLOWED_MIME_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Subdirectory under the root that holds staged resumes.
const RESUMES_DIR: &str = "resumes";

/// Handle to a staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedResume {
    /// Opaque root-relative reference, stored on the application row
    pub reference: String,
    /// Original filename, kept for download
    pub original_name: String,
}

/// Local-disk file stage for resumes.
#[derive(Debug, Clone)]
pub struct ResumeVault {
    root: PathBuf,
}

impl ResumeVault {
    /// Open a vault rooted at `root`, creating the directory tree if needed.
    pub fn open(root: impl Into<PathBuf>) -> FileResult<Self> {
        let root: PathBuf = root.into();
        std::fs::create_dir_all(root.join(RESUMES_DIR))?;
        // canonicalize so later containment checks compare real prefixes
        let root = root.canonicalize()?;
        Ok(Self { root })
    }

    /// Open a vault using the `UPLOADS_DIR` environment variable.
    pub fn from_env() -> FileResult<Self> {
        let root = std::env::var("UPLOADS_DIR")
            .map_err(|_| FileError::config_error("UPLOADS_DIR is not set"))?;
        Self::open(root)
    }

    /// The canonical storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate name and content type against the document allow-list.
    ///
    /// The extension check is authoritative; the MIME check only applies
    /// when the client supplied a content type.
    pub fn validate_upload(original_name: &str, content_type: Option<&str>) -> FileResult<String> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| FileError::InvalidName(original_name.to_string()))?;

        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(FileError::unsupported_type(format!(
                "only PDF, DOC and DOCX files are allowed, got .{ext}"
            )));
        }

        if let Some(mime) = content_type {
            if !ALLOWED_MIME_TYPES.contains(&mime) {
                return Err(FileError::unsupported_type(format!(
                    "unexpected content type {mime}"
                )));
            }
        }

        Ok(ext)
    }

    /// Stage an uploaded resume and return its reference.
    pub async fn stage(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> FileResult<StagedResume> {
        let ext = Self::validate_upload(original_name, content_type)?;

        if bytes.len() > MAX_RESUME_BYTES {
            return Err(FileError::TooLarge {
                size: bytes.len(),
                max: MAX_RESUME_BYTES,
            });
        }

        let reference = format!(
            "{RESUMES_DIR}/resume-{}-{}.{ext}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4()
        );
        tokio::fs::write(self.root.join(&reference), bytes).await?;

        debug!(reference = %reference, size = bytes.len(), "Staged resume");
        Ok(StagedResume {
            reference,
            original_name: original_name.to_string(),
        })
    }

    /// Resolve a reference to an absolute path inside the vault.
    ///
    /// References carrying `..`, root or prefix components fail with
    /// `PathEscape` before any disk access, so crafted references are
    /// rejected whether or not the target exists. The canonicalized result
    /// is then checked against the root prefix to close the symlink hole.
    pub fn resolve(&self, reference: &str) -> FileResult<PathBuf> {
        let relative = Path::new(reference);
        let escapes = relative.components().any(|c| {
            !matches!(c, Component::Normal(_) | Component::CurDir)
        });
        if escapes {
            return Err(FileError::path_escape(reference.to_string()));
        }

        let path = self.root.join(relative);
        let canonical = path.canonicalize().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FileError::not_found(reference.to_string())
            } else {
                FileError::Io(e)
            }
        })?;

        if !canonical.starts_with(&self.root) {
            return Err(FileError::path_escape(reference.to_string()));
        }
        Ok(canonical)
    }

    /// Read a staged file.
    pub async fn read(&self, reference: &str) -> FileResult<Vec<u8>> {
        let path = self.resolve(reference)?;
        Ok(tokio::fs::read(path).await?)
    }

    /// Delete a staged file by reference.
    ///
    /// An already-missing file counts as success so compensation stays
    /// idempotent.
    pub async fn discard(&self, reference: &str) -> FileResult<()> {
        let path = match self.resolve(reference) {
            Ok(p) => p,
            Err(FileError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(reference = %reference, "Discarded staged resume");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FileError::Io(e)),
        }
    }
}
