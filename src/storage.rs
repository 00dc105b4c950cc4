//! Optional on-disk copies of produced KMZ packages.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{info, warn};
use once_cell::sync::OnceCell;

const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const PROBE_PREFIX: &str = ".write_probe";

/// Shared handle to the most recently saved KMZ path.
///
/// Clones share the same slot, so a compiler and whoever uploads its output
/// can hold the same handle.
#[derive(Debug, Clone, Default)]
pub struct LatestKmzPath(Arc<Mutex<Option<PathBuf>>>);

impl LatestKmzPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent path, or an empty string when nothing was saved yet.
    pub fn get(&self) -> String {
        self.lock()
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.lock().clone()
    }

    pub fn set(&self, path: PathBuf) {
        *self.lock() = Some(path);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<PathBuf>> {
        // the slot holds a plain value, so a poisoned lock is still usable
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Directory that receives saved KMZ files.
///
/// The directory is created and normalized (world-writable, owned by the
/// running user) the first time it is used; the outcome is remembered for the
/// lifetime of this value.
#[derive(Debug)]
pub struct KmzStorage {
    dir: PathBuf,
    ready: OnceCell<bool>,
}

impl KmzStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ready: OnceCell::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Prepare the directory once; later calls return the cached outcome.
    pub fn ensure_ready(&self) -> bool {
        *self.ready.get_or_init(|| match prepare_dir(&self.dir) {
            Ok(()) => true,
            Err(e) => {
                warn!("KMZ storage directory '{}' unusable: {e}", self.dir.display());
                false
            }
        })
    }

    /// Write `bytes` to `<dir>/<local timestamp>.kmz` and return its absolute path.
    pub fn write(&self, bytes: &[u8]) -> io::Result<PathBuf> {
        if !self.ensure_ready() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("storage directory '{}' is not usable", self.dir.display()),
            ));
        }

        let file_name = format!("{}.kmz", chrono::Local::now().format(FILE_STAMP_FORMAT));
        let path = self.dir.join(file_name);
        fs::write(&path, bytes)?;

        let path = std::path::absolute(&path)?;
        info!("Saved KMZ ({} bytes) to {}", bytes.len(), path.display());
        Ok(path)
    }
}

fn prepare_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        info!("Created KMZ storage directory {}", dir.display());
    }

    // unique per call, removed on drop
    let probe = tempfile::Builder::new()
        .prefix(PROBE_PREFIX)
        .tempfile_in(dir)?;
    normalize_access(dir, &probe.as_file().metadata()?)
}

#[cfg(unix)]
fn normalize_access(dir: &Path, me: &fs::Metadata) -> io::Result<()> {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    // files we create carry our effective uid/gid
    let current = fs::metadata(dir)?;

    if current.uid() != me.uid() || current.gid() != me.gid() {
        std::os::unix::fs::chown(dir, Some(me.uid()), Some(me.gid()))?;
        info!("Reassigned ownership of {}", dir.display());
    }
    if current.mode() & 0o777 != 0o777 {
        fs::set_permissions(dir, fs::Permissions::from_mode(0o777))?;
        info!("Opened permissions of {} to 0777", dir.display());
    }
    Ok(())
}

#[cfg(not(unix))]
fn normalize_access(_dir: &Path, _probe: &fs::Metadata) -> io::Result<()> {
    Ok(())
}
