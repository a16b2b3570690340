//! Bundle packaging
//!
//! A bundle is a gzip-compressed tarball holding `manifest.json` plus the
//! source files of a content directory. It is written into that directory
//! under a random name and removed again when the [`Bundle`] is dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::errors::ConnectError;
use crate::utils::generate_uuid;

/// Manifest file required at the root of a content directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name prefix of generated archives
pub const BUNDLE_PREFIX: &str = "bundle-";

/// File name suffix of generated archives
pub const BUNDLE_SUFFIX: &str = ".tar.gz";

/// Packaging options
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// File extensions (without the dot) collected as sources, case-sensitive
    pub source_extensions: Vec<String>,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            source_extensions: vec!["R".to_string()],
        }
    }
}

/// A packaged content directory
#[derive(Debug)]
pub struct Bundle {
    source_dir: PathBuf,
    archive_path: PathBuf,
    entries: Vec<PathBuf>,
    keep: bool,
}

impl Bundle {
    /// Package `dir` into a new archive inside `dir`
    pub fn create(dir: impl AsRef<Path>, options: &BundleOptions) -> Result<Self, ConnectError> {
        let dir = dir.as_ref();
        let manifest = dir.join(MANIFEST_FILE);
        if !manifest.is_file() {
            return Err(ConnectError::Validation(format!(
                "missing manifest: {} not found",
                manifest.display()
            )));
        }

        let sources = collect_sources(dir, options)?;
        let archive_path = dir.join(format!("{}{}{}", BUNDLE_PREFIX, generate_uuid(), BUNDLE_SUFFIX));

        let mut entries = Vec::with_capacity(sources.len() + 1);
        entries.push(PathBuf::from(MANIFEST_FILE));
        entries.extend(sources);

        if let Err(e) = write_archive(dir, &archive_path, &entries) {
            let _ = fs::remove_file(&archive_path);
            return Err(e.into());
        }

        info!(
            "Packaged {} files from {} into {}",
            entries.len(),
            dir.display(),
            archive_path.display()
        );

        Ok(Self {
            source_dir: dir.to_path_buf(),
            archive_path,
            entries,
            keep: false,
        })
    }

    /// Directory the bundle was built from
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Path of the generated archive
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Archived paths, relative to the source directory, manifest first
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Read the archive into memory
    pub async fn read(&self) -> Result<Vec<u8>, ConnectError> {
        Ok(tokio::fs::read(&self.archive_path).await?)
    }

    /// Keep the archive on disk and return its path
    pub fn persist(mut self) -> PathBuf {
        self.keep = true;
        self.archive_path.clone()
    }
}

impl Drop for Bundle {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match fs::remove_file(&self.archive_path) {
            Ok(()) => debug!("Removed bundle {}", self.archive_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove bundle {}: {}", self.archive_path.display(), e),
        }
    }
}

/// Source files under `dir`, relative to it and sorted
fn collect_sources(dir: &Path, options: &BundleOptions) -> Result<Vec<PathBuf>, ConnectError> {
    let mut sources = Vec::new();

    for entry in WalkBuilder::new(dir).standard_filters(false).build() {
        let entry = entry.map_err(|e| {
            let message = e.to_string();
            e.into_io_error().unwrap_or_else(|| io::Error::other(message))
        })?;

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| options.source_extensions.iter().any(|wanted| wanted == ext))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let relative = match path.strip_prefix(dir) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };
        if relative == Path::new(MANIFEST_FILE) || is_bundle_name(&relative) {
            continue;
        }
        sources.push(relative);
    }

    sources.sort();
    Ok(sources)
}

fn is_bundle_name(relative: &Path) -> bool {
    relative.parent() == Some(Path::new(""))
        && relative
            .to_str()
            .map(|name| name.starts_with(BUNDLE_PREFIX) && name.ends_with(BUNDLE_SUFFIX))
            .unwrap_or(false)
}

fn write_archive(dir: &Path, archive_path: &Path, entries: &[PathBuf]) -> io::Result<()> {
    let file = fs::File::create(archive_path)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for entry in entries {
        builder.append_path_with_name(dir.join(entry), entry)?;
    }

    let encoder = builder.into_inner()?;
    let file = encoder.finish()?;
    file.sync_all()?;
    Ok(())
}
