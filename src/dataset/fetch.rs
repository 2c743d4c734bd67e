//! One-time download and extraction of dataset archives.
//!
//! Files land in `<data_dir>/<dataset>/`. Nothing is downloaded when every
//! expected file is already present.

use crate::error::DatasetError;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

/// Make sure `files` (relative to the dataset directory) exist, fetching and
/// unpacking `url` if any is missing. Returns the dataset directory.
pub fn ensure_files(
    data_dir: &Path,
    dataset: &str,
    url: &str,
    files: &[PathBuf],
) -> Result<PathBuf, DatasetError> {
    let root = data_dir.join(dataset);
    if files.iter().all(|f| root.join(f).exists()) {
        tracing::debug!(dir = %root.display(), "dataset already cached");
        return Ok(root);
    }

    fs::create_dir_all(&root).map_err(|source| io_error(&root, source))?;
    let archive = download(url, &root)?;
    tracing::info!(archive = %archive.display(), "extracting");
    extract(&archive, &root)?;
    fs::remove_file(&archive).map_err(|source| io_error(&archive, source))?;

    if let Some(missing) = files.iter().find(|f| !root.join(f).exists()) {
        return Err(DatasetError::MissingFile(root.join(missing)));
    }
    Ok(root)
}

/// File name of a URL, query string dropped.
pub fn file_name(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

fn download(url: &str, dir: &Path) -> Result<PathBuf, DatasetError> {
    let target = dir.join(file_name(url));
    let partial = target.with_extension(format!(
        "{}.part",
        target
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
    ));

    tracing::info!(%url, "downloading dataset");
    let response = ureq::get(url).call().map_err(|err| DatasetError::Download {
        url: url.to_string(),
        reason: err.to_string(),
    })?;

    let result = (|| -> io::Result<u64> {
        let mut out = BufWriter::new(File::create(&partial)?);
        io::copy(&mut response.into_reader(), &mut out)
    })();

    match result {
        Ok(bytes) => {
            fs::rename(&partial, &target).map_err(|source| io_error(&target, source))?;
            tracing::info!(bytes, path = %target.display(), "download complete");
            Ok(target)
        }
        Err(err) => {
            let _ = fs::remove_file(&partial);
            Err(DatasetError::Download {
                url: url.to_string(),
                reason: err.to_string(),
            })
        }
    }
}

fn extract(archive: &Path, dir: &Path) -> Result<(), DatasetError> {
    let file = File::open(archive).map_err(|source| io_error(archive, source))?;
    tar::Archive::new(GzDecoder::new(file))
        .unpack(dir)
        .map_err(|source| io_error(archive, source))
}

fn io_error(path: &Path, source: io::Error) -> DatasetError {
    DatasetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_drops_query() {
        assert_eq!(
            file_name("https://host/frs/download.php/5899/miyawaki2008.tgz?i_agree=1"),
            "miyawaki2008.tgz"
        );
        assert_eq!(file_name("archive.tgz"), "archive.tgz");
    }

    #[test]
    fn cached_files_skip_download() {
        let dir = std::env::temp_dir().join(format!("visrecon-fetch-{}", std::process::id()));
        let root = dir.join("cached");
        fs::create_dir_all(root.join("func")).unwrap();
        fs::write(root.join("func/a.nii.gz"), b"x").unwrap();

        // An unroutable URL proves nothing is fetched.
        let got = ensure_files(
            &dir,
            "cached",
            "http://invalid.invalid/a.tgz",
            &[PathBuf::from("func/a.nii.gz")],
        )
        .unwrap();
        assert_eq!(got, root);
        fs::remove_dir_all(&dir).unwrap();
    }
}
