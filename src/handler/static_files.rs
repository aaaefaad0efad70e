//! Static file serving module
//!
//! Resolves the request path under the asset root and streams the file.
//! A missing file is not an error: the stage reports "not handled" and the
//! pipeline moves on.

use crate::error::PipelineError;
use crate::http::{mime, response, RequestContext, ResponseWriter};
use crate::logger::Logger;
use hyper::StatusCode;
use percent_encoding::percent_decode_str;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Static asset stage bound to one asset root
#[derive(Debug, Clone)]
pub struct StaticAssets {
    root: PathBuf,
    index_file: String,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>, index_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index_file: index_file.into(),
        }
    }

    /// Serve the request from disk; `Ok(true)` when the response is complete
    pub async fn serve(
        &self,
        ctx: &RequestContext<'_>,
        res: &mut ResponseWriter,
        logger: &Logger,
    ) -> Result<bool, PipelineError> {
        let Ok(decoded) = percent_decode_str(ctx.pathname()).decode_utf8() else {
            logger.warn(&format!(
                "Request path is not valid UTF-8 once decoded: {}",
                ctx.request().raw_url()
            ));
            return Ok(false);
        };
        let Some(relative) = normalize_path(&decoded) else {
            logger.warn(&format!(
                "Path traversal attempt blocked: {}",
                ctx.request().raw_url()
            ));
            return Ok(false);
        };

        let Some(file_path) = self.resolve(&relative, logger).await? else {
            return Ok(false);
        };

        let file = match fs::File::open(&file_path).await {
            Ok(f) => f,
            Err(e) => {
                // Removed between resolve and open
                not_found_or::<()>(&file_path, e)?;
                return Ok(false);
            }
        };

        res.write_head(StatusCode::OK, mime::content_type_for_path(&file_path))?;
        res.end_stream(response::stream_body(file));
        Ok(true)
    }

    /// Map a normalized relative path to an existing regular file inside the root
    async fn resolve(
        &self,
        relative: &Path,
        logger: &Logger,
    ) -> Result<Option<PathBuf>, PipelineError> {
        let root = match fs::canonicalize(&self.root).await {
            Ok(root) => root,
            Err(e) => return not_found_or(&self.root, e),
        };

        let mut candidate = root.join(relative);
        let metadata = match fs::metadata(&candidate).await {
            Ok(m) => m,
            Err(e) => return not_found_or(&candidate, e),
        };

        if metadata.is_dir() {
            candidate.push(&self.index_file);
            match fs::metadata(&candidate).await {
                Ok(m) if m.is_file() => {}
                Ok(_) => return Ok(None),
                Err(e) => return not_found_or(&candidate, e),
            }
        } else if !metadata.is_file() {
            return Ok(None);
        }

        // Symlinks may still point outside the root
        let canonical = match fs::canonicalize(&candidate).await {
            Ok(p) => p,
            Err(e) => return not_found_or(&candidate, e),
        };
        if !canonical.starts_with(&root) {
            logger.warn(&format!(
                "Path traversal attempt blocked: {} -> {}",
                relative.display(),
                canonical.display()
            ));
            return Ok(None);
        }

        Ok(Some(canonical))
    }
}

/// Turn a decoded URL pathname into a relative path; `None` if it tries to leave the root
fn normalize_path(decoded: &str) -> Option<PathBuf> {
    if decoded.contains('\0') || decoded.contains('\\') {
        return None;
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(decoded).components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::Normal(segment) => normalized.push(segment),
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

fn is_not_found(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Not-found means "not handled"; anything else is a fault
fn not_found_or<T>(path: &Path, err: io::Error) -> Result<Option<T>, PipelineError> {
    if is_not_found(&err) {
        Ok(None)
    } else {
        Err(PipelineError::StaticAsset {
            path: path.to_path_buf(),
            source: err,
        })
    }
}
