//! Datei-Backend für den Persisted State Store (Feature `std`)
//!
//! Schreibt den Datensatz in eine temporäre Nachbardatei und ersetzt das
//! Ziel per `rename`. Danach wird das Verzeichnis gesynct, damit auch der
//! Rename selbst einen Absturz übersteht. Ein Absturz mitten im Schreiben
//! hinterlässt entweder die alte oder die neue Datei, nie eine Mischung.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::traits::RecordStorage;

/// JSON-Datei auf dem Host-Dateisystem (z.B. `static/assets/data.json`)
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Verzeichnis der Datei, `.` für einen bloßen Dateinamen
    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Schreibt den Verzeichniseintrag nach dem Rename auf die Platte
    #[cfg(unix)]
    fn sync_parent_dir(&self) -> Result<(), StoreError> {
        File::open(self.parent_dir())
            .and_then(|dir| dir.sync_all())
            .map_err(|_| StoreError::IoFailure)
    }

    // Verzeichnisse lassen sich hier nicht öffnen, rename ist bereits atomar
    #[cfg(not(unix))]
    fn sync_parent_dir(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl RecordStorage for FileStorage {
    fn read_record(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(_) => return Err(StoreError::IoFailure),
        };

        if bytes.len() > buffer.len() {
            return Err(StoreError::Corrupt);
        }

        buffer[..bytes.len()].copy_from_slice(&bytes);
        Ok(Some(bytes.len()))
    }

    fn write_record(&mut self, record: &[u8]) -> Result<(), StoreError> {
        let temp_path = self.temp_path();

        // File::create truncated eine evtl. übrig gebliebene Temp-Datei
        let mut file = File::create(&temp_path).map_err(|_| StoreError::IoFailure)?;
        file.write_all(record).map_err(|_| StoreError::IoFailure)?;
        file.sync_all().map_err(|_| StoreError::IoFailure)?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|_| StoreError::IoFailure)?;
        self.sync_parent_dir()
    }
}
