use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use log::info;

use crate::errors::{Error, Result};

/// Is this file name a zip archive?
pub fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Extract the only entry of a zip archive next to the archive, and return
/// the path of the extracted file.  The archive must contain exactly one
/// file.
pub fn decompress_single_entry(archive_path: &Path) -> Result<PathBuf> {
    info!("Unzipping file {}", archive_path.display());
    let file = File::open(archive_path)?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| Error::archive_format(archive_path, e))?;
    if zip.len() != 1 {
        return Err(Error::archive_format(
            archive_path,
            format!("expected 1 file in zip, found {}", zip.len()),
        ));
    }

    let mut entry = zip
        .by_index(0)
        .map_err(|e| Error::archive_format(archive_path, e))?;
    if entry.is_dir() {
        return Err(Error::archive_format(
            archive_path,
            format!("entry {} is a directory", entry.name()),
        ));
    }
    let file_name = entry
        .enclosed_name()
        .and_then(|p| p.file_name().map(PathBuf::from))
        .ok_or_else(|| {
            Error::archive_format(archive_path, format!("unsafe entry name {}", entry.name()))
        })?;
    let out_path = match archive_path.parent() {
        Some(dir) => dir.join(file_name),
        None => file_name,
    };

    if out_path == archive_path {
        return Err(Error::archive_format(
            archive_path,
            format!("entry {} would overwrite the archive", entry.name()),
        ));
    }

    let mut out = File::create(&out_path)?;
    if let Err(e) = io::copy(&mut entry, &mut out) {
        drop(out);
        let _ = fs::remove_file(&out_path);
        return Err(Error::archive_format(archive_path, e));
    }
    info!("extracted file to {}", out_path.display());
    Ok(out_path)
}
