//! Archive unpacking strategies

use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;

use stackql_core::{process, Error, Result};
use tracing::debug;

/// Default tool used to expand macOS installer packages
pub const DEFAULT_PACKAGE_TOOL: &str = "pkgutil";

/// Extract every entry of a zip archive into `dest`.
pub async fn unzip(archive: &Path, dest: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || extract_zip(&archive, &dest))
        .await
        .map_err(|e| Error::Unpack(format!("unzip task failed: {e}")))?
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)
        .map_err(|e| Error::Unpack(format!("{}: {e}", archive.display())))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| Error::Unpack(format!("{}: {e}", archive.display())))?;
    debug!(archive = %archive.display(), entries = zip.len(), "extracting zip archive");
    zip.extract(dest)
        .map_err(|e| Error::Unpack(format!("{}: {e}", archive.display())))
}

/// Expand a macOS installer package into `<dest>/stackql` using `tool`.
///
/// The tool is invoked as `<tool> --expand-full <archive> <dest>/stackql`;
/// a non-zero exit is reported with the tool's standard error text.
pub async fn expand_package(tool: &Path, archive: &Path, dest: &Path) -> Result<()> {
    let target = dest.join("stackql");
    let args: [&OsStr; 3] = [
        OsStr::new("--expand-full"),
        archive.as_os_str(),
        target.as_os_str(),
    ];

    debug!(tool = %tool.display(), archive = %archive.display(), "expanding package");
    match process::run(tool, args).await {
        Ok(_) => Ok(()),
        Err(Error::CommandExecution(stderr)) => Err(Error::Unpack(format!(
            "{} exited with an error: {}",
            tool.display(),
            stderr.trim()
        ))),
        Err(other) => Err(Error::Unpack(other.to_string())),
    }
}
