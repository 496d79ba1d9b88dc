use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Read-only view of the public asset directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a URL path onto the base directory.
    ///
    /// Only plain segments are accepted: `..`, roots and drive prefixes make
    /// the path unmappable so it can never escape the base directory.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let decoded = urlencoding::decode(url_path).ok()?;
        let mut pb = self.base_dir.clone();
        let mut pushed = false;
        for comp in Path::new(decoded.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => {
                    pb.push(s);
                    pushed = true;
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        pushed.then_some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" | "htm" => "text/html; charset=utf-8",
            "css" => "text/css; charset=utf-8",
            "js" => "application/javascript; charset=utf-8",
            "json" => "application/json",
            "txt" => "text/plain; charset=utf-8",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "ico" => "image/x-icon",
            "woff" => "font/woff",
            "woff2" => "font/woff2",
            _ => "application/octet-stream",
        }
    }

    /// Load a file's bytes and content type. Missing files, directories and
    /// unmappable paths are all `NotFound`.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }
}
