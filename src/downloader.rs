use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SaveError;
use crate::form::Ticker;

/// Where a downloaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// File name the download was saved under
    pub name: String,
    /// Path on disk, when the saver writes to the filesystem
    pub path: Option<PathBuf>,
    /// Number of bytes written
    pub len: usize,
}

/// Capability to hand downloaded bytes to the user.
pub trait SaveBytes {
    fn save_bytes(&self, bytes: &[u8], suggested_name: &str) -> Result<SavedFile, SaveError>;
}

impl<T: SaveBytes + ?Sized> SaveBytes for Box<T> {
    fn save_bytes(&self, bytes: &[u8], suggested_name: &str) -> Result<SavedFile, SaveError> {
        (**self).save_bytes(bytes, suggested_name)
    }
}

/// Build a download file name: `<prefix>_[<TICKER>_]<unix-ms>.csv`.
///
/// # Examples
/// ```
/// use csvgen::downloader::file_name;
/// use csvgen::form::Ticker;
///
/// let ticker = Ticker::parse("aapl").unwrap();
/// assert_eq!(file_name("cash_flow", Some(&ticker), 1700000000000), "cash_flow_AAPL_1700000000000.csv");
/// assert_eq!(file_name("data", None, 42), "data_42.csv");
/// ```
pub fn file_name(prefix: &str, ticker: Option<&Ticker>, timestamp_ms: i64) -> String {
    match ticker {
        Some(ticker) => format!("{prefix}_{ticker}_{timestamp_ms}.csv"),
        None => format!("{prefix}_{timestamp_ms}.csv"),
    }
}

/// Writes each download into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySaver { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveBytes for DirectorySaver {
    fn save_bytes(&self, bytes: &[u8], suggested_name: &str) -> Result<SavedFile, SaveError> {
        // Only the final component is used, so a name can never escape the directory.
        let name = Path::new(suggested_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download.csv".to_string());
        let path = self.dir.join(&name);

        fs::create_dir_all(&self.dir).map_err(|source| SaveError {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, bytes).map_err(|source| SaveError {
            path: path.clone(),
            source,
        })?;

        log::info!("saved {} bytes to {}", bytes.len(), path.display());
        Ok(SavedFile {
            name,
            path: Some(path),
            len: bytes.len(),
        })
    }
}

/// Streams the bytes to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSaver;

impl SaveBytes for StdoutSaver {
    fn save_bytes(&self, bytes: &[u8], suggested_name: &str) -> Result<SavedFile, SaveError> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(bytes)
            .and_then(|_| stdout.flush())
            .map_err(|source| SaveError {
                path: PathBuf::from("<stdout>"),
                source,
            })?;

        Ok(SavedFile {
            name: suggested_name.to_string(),
            path: None,
            len: bytes.len(),
        })
    }
}

/// Keeps downloads in memory, keyed by file name.
#[derive(Debug, Default)]
pub struct MemorySaver {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> BTreeMap<String, Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SaveBytes for MemorySaver {
    fn save_bytes(&self, bytes: &[u8], suggested_name: &str) -> Result<SavedFile, SaveError> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(suggested_name.to_string(), bytes.to_vec());

        Ok(SavedFile {
            name: suggested_name.to_string(),
            path: None,
            len: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_with_and_without_ticker() {
        let ticker = Ticker::parse("msft").unwrap();
        assert_eq!(
            file_name("debt_to_equity", Some(&ticker), 1_714_000_000_123),
            "debt_to_equity_MSFT_1714000000123.csv"
        );
        assert_eq!(file_name("data", None, 5), "data_5.csv");
    }

    #[test]
    fn directory_saver_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DirectorySaver::new(dir.path().join("exports"));

        let saved = saver.save_bytes(b"name,email,age\n", "data_1.csv").unwrap();

        let path = dir.path().join("exports").join("data_1.csv");
        assert_eq!(saved.path.as_deref(), Some(path.as_path()));
        assert_eq!(saved.len, 15);
        assert_eq!(fs::read(&path).unwrap(), b"name,email,age\n");
    }

    #[test]
    fn directory_saver_keeps_only_file_component() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DirectorySaver::new(dir.path());

        let saved = saver.save_bytes(b"x", "../../escape.csv").unwrap();

        assert_eq!(saved.name, "escape.csv");
        assert!(dir.path().join("escape.csv").exists());
    }

    #[test]
    fn directory_saver_reports_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let err = DirectorySaver::new(&blocker)
            .save_bytes(b"x", "data_1.csv")
            .unwrap_err();
        assert!(err.to_string().contains("not-a-dir"));
    }

    #[test]
    fn memory_saver_records_files() {
        let saver = MemorySaver::new();
        saver.save_bytes(b"a", "one.csv").unwrap();
        saver.save_bytes(b"bb", "two.csv").unwrap();

        let files = saver.files();
        assert_eq!(files.len(), 2);
        assert_eq!(files["two.csv"], b"bb");
    }

    #[test]
    fn boxed_saver_delegates() {
        let saver: Box<dyn SaveBytes> = Box::new(MemorySaver::new());
        let saved = saver.save_bytes(b"abc", "boxed.csv").unwrap();
        assert_eq!(saved.len, 3);
    }
}
