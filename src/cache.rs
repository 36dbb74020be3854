//! The cache file shared by the fetcher and the server: one GeoJSON
//! FeatureCollection, rewritten whole on every run.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::geojson::FeatureCollection;

/// Write `collection` to `path`, replacing whatever was there.
///
/// The document is written to a sibling temporary file first and renamed
/// into place, so readers never observe a half-written cache.
pub fn write_collection(path: &Path, collection: &FeatureCollection) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::file_io(parent, e))?;
    }

    let tmp = temp_path(path);
    let written = write_file(&tmp, collection)
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| Error::file_io(path, e)));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn write_file(path: &Path, collection: &FeatureCollection) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::file_io(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, collection).map_err(|e| Error::file_io(path, e.into()))?;
    writer.flush().map_err(|e| Error::file_io(path, e))
}

pub fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let contents = fs::read_to_string(path).map_err(|e| Error::file_io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| Error::MalformedCache {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
