//! Zip archive of the downloaded pictures.

use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_NAME: &str = "news_images.zip";

/// Deflate every file under `source` into `{target_dir}/news_images.zip`,
/// stored by path relative to `source`. Returns the archive path.
#[instrument(level = "info", skip_all, fields(source = %source.display()))]
pub async fn zip_folder(source: &Path, target_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let source = source.to_path_buf();
    let output = target_dir.join(ARCHIVE_NAME);
    let path = output.clone();
    let entries = tokio::task::spawn_blocking(move || write_archive(&source, &path))
        .await?
        .map_err(|e| e.to_string())?;
    info!(path = %output.display(), entries, "Zipped pictures");
    Ok(output)
}

fn write_archive(source: &Path, output: &Path) -> Result<usize, Box<dyn Error + Send + Sync>> {
    let mut zip = ZipWriter::new(File::create(output)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut pending = vec![source.to_path_buf()];
    let mut entries = 0usize;
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let name = path
                .strip_prefix(source)?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            debug!(%name, "Adding to archive");
            zip.start_file(name, options)?;
            zip.write_all(&fs::read(&path)?)?;
            entries += 1;
        }
    }
    zip.finish()?;
    Ok(entries)
}
