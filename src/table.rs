use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;

use crate::error::ShopError;

/// A whole-table flat file holding `Vec<T>` as gzip-compressed bincode.
///
/// Every store in the application is one of these. Reads take a shared lock,
/// mutations take an exclusive lock and go through a load → closure → atomic
/// rewrite cycle, so concurrent requests in the same process cannot clobber
/// each other's rows. The rewrite lands via a temp file rename; a crash
/// mid-write leaves the previous table intact.
pub struct TableFile<T> {
    path: PathBuf,
    lock: RwLock<()>,
    _rows: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> TableFile<T> {
    /// Open a handle to the table at `path`. The file is created lazily on
    /// the first mutation; a missing file reads as an empty table.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        TableFile {
            path: path.into(),
            lock: RwLock::new(()),
            _rows: PhantomData,
        }
    }

    /// Load the full table. Never fails on a missing backing file.
    pub fn read(&self) -> Result<Vec<T>, ShopError> {
        let _guard = self.lock.read().unwrap();
        load_rows(&self.path)
    }

    /// Run `f` against the current rows and rewrite the table with the
    /// result. If `f` returns an error the table is left untouched.
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut Vec<T>) -> Result<R, ShopError>,
    ) -> Result<R, ShopError> {
        let _guard = self.lock.write().unwrap();
        let mut rows = load_rows(&self.path)?;
        let out = f(&mut rows)?;
        write_rows(&self.path, &rows)?;
        Ok(out)
    }
}

fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ShopError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let rows: Vec<T> = bincode::deserialize_from(&mut reader)?;
    Ok(rows)
}

fn write_rows<T: Serialize>(path: &Path, rows: &Vec<T>) -> Result<(), ShopError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut encoder = GzEncoder::new(BufWriter::new(tmp.as_file_mut()), Compression::default());
        bincode::serialize_into(&mut encoder, rows)?;
        let mut inner = encoder.finish()?;
        inner.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
