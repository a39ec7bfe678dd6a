//! Deterministic zip archive creation.
//!
//! Every archive nests its entries under a single root directory named
//! after the addon. Entries carry a fixed timestamp and fixed permissions and
//! are written in a stable order, so an unchanged tree always yields the same
//! bytes. The archive is assembled in a temporary file beside the
//! destination and only renamed into place once complete.

use super::archive_error::ArchiveError;
use super::exclude::ExcludeSet;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Permissions recorded for every file entry.
const FILE_MODE: u32 = 0o644;

/// Permissions recorded for every directory entry.
const DIR_MODE: u32 = 0o755;

/// What to put into an archive.
#[derive(Debug, Clone)]
pub struct ArchiveSpec {
    root_prefix: String,
    source_root: Utf8PathBuf,
    include_paths: Vec<Utf8PathBuf>,
    exclude: ExcludeSet,
}

impl ArchiveSpec {
    /// Describe an archive of `include_paths` (relative to `source_root`)
    /// nested under `root_prefix`, leaving out anything `exclude` matches.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidPath`] if the prefix is empty or
    /// contains a separator, or if an include path is absolute or climbs out
    /// of the source root.
    pub fn new(
        root_prefix: impl Into<String>,
        source_root: impl Into<Utf8PathBuf>,
        include_paths: Vec<Utf8PathBuf>,
        exclude: ExcludeSet,
    ) -> Result<Self, ArchiveError> {
        let root_prefix = root_prefix.into();
        if root_prefix.is_empty() || root_prefix.contains(['/', '\\']) || root_prefix == ".." {
            return Err(ArchiveError::InvalidPath {
                path: Utf8PathBuf::from(root_prefix),
                reason: "root prefix must be a single directory name".to_owned(),
            });
        }
        for include in &include_paths {
            validate_include(include)?;
        }
        Ok(Self {
            root_prefix,
            source_root: source_root.into(),
            include_paths,
            exclude,
        })
    }

    /// Return the directory every entry is nested under.
    #[must_use]
    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    /// Return the directory include paths are resolved against.
    #[must_use]
    pub fn source_root(&self) -> &Utf8Path {
        &self.source_root
    }

    /// Return the include paths in archive order.
    #[must_use]
    pub fn include_paths(&self) -> &[Utf8PathBuf] {
        &self.include_paths
    }

    /// Return the exclusion patterns.
    #[must_use]
    pub fn exclude(&self) -> &ExcludeSet {
        &self.exclude
    }
}

fn validate_include(include: &Utf8Path) -> Result<(), ArchiveError> {
    let escapes = include.components().any(|component| {
        matches!(
            component,
            Utf8Component::Prefix(_) | Utf8Component::RootDir | Utf8Component::ParentDir
        )
    });
    if include.as_str().is_empty() || escapes {
        return Err(ArchiveError::InvalidPath {
            path: include.to_owned(),
            reason: "include paths must be relative and stay inside the project".to_owned(),
        });
    }
    Ok(())
}

/// A finished archive on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedFile {
    path: Utf8PathBuf,
    entries: Vec<String>,
}

impl ArchivedFile {
    /// Return the archive location.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Return the entry names in the order they were written.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// Write the archive described by `spec` to `destination`.
///
/// An existing file at `destination` is replaced. Include paths that do not
/// exist are skipped with a warning.
///
/// # Errors
///
/// Returns an [`ArchiveError`] if any source cannot be read or the archive
/// cannot be written. On error `destination` does not exist.
pub fn archive(spec: &ArchiveSpec, destination: &Utf8Path) -> Result<ArchivedFile, ArchiveError> {
    let parent = match destination.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| ArchiveError::io(parent, err))?;
    remove_existing(destination)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".partial")
        .tempfile_in(parent)
        .map_err(|err| ArchiveError::io(parent, err))?;

    let entries = write_entries(spec, temp.as_file_mut())?;
    finalise_file(temp.as_file()).map_err(|err| ArchiveError::io(destination, err))?;
    temp.persist(destination)
        .map_err(|err| ArchiveError::Persist {
            path: destination.to_owned(),
            source: err.error,
        })?;

    log::info!("wrote {destination} ({} entries)", entries.len());
    Ok(ArchivedFile {
        path: destination.to_owned(),
        entries,
    })
}

/// Flush the archive to disk and give it ordinary file permissions
/// (temporary files are created owner-only).
fn finalise_file(file: &File) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(FILE_MODE))?;
    }
    file.sync_all()
}

fn remove_existing(destination: &Utf8Path) -> Result<(), ArchiveError> {
    match fs::remove_file(destination) {
        Ok(()) => {
            log::debug!("removed previous archive {destination}");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ArchiveError::io(destination, err)),
    }
}

fn write_entries(spec: &ArchiveSpec, file: &mut File) -> Result<Vec<String>, ArchiveError> {
    let mut writer = EntryWriter::new(ZipWriter::new(file), spec.root_prefix());
    writer.add_directory(Utf8Path::new(""))?;
    for include in spec.include_paths() {
        add_include(&mut writer, spec, include)?;
    }
    writer.finish()
}

fn add_include(
    writer: &mut EntryWriter<'_, &mut File>,
    spec: &ArchiveSpec,
    include: &Utf8Path,
) -> Result<(), ArchiveError> {
    if spec.exclude().is_excluded(include) {
        log::debug!("include path {include} is excluded");
        return Ok(());
    }

    let source = spec.source_root().join(include);
    match fs::metadata(&source) {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::warn!("include path {include} does not exist; skipping");
            return Ok(());
        }
        Err(err) => return Err(ArchiveError::io(source, err)),
    }

    let walker = WalkDir::new(&source)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !relative_to(spec.source_root(), entry.path())
                .is_ok_and(|relative| spec.exclude().is_excluded(&relative))
        });

    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map_or_else(|| source.clone(), lossy_utf8);
            ArchiveError::io(path, err.into())
        })?;
        let relative = relative_to(spec.source_root(), entry.path())?;
        if entry.file_type().is_dir() {
            writer.add_directory(&relative)?;
        } else {
            writer.add_file(&relative, &spec.source_root().join(&relative))?;
        }
    }
    Ok(())
}

fn relative_to(root: &Utf8Path, path: &Path) -> Result<Utf8PathBuf, ArchiveError> {
    let utf8 = Utf8Path::from_path(path).ok_or_else(|| ArchiveError::InvalidPath {
        path: lossy_utf8(path),
        reason: "path is not valid UTF-8".to_owned(),
    })?;
    utf8.strip_prefix(root)
        .map(Utf8Path::to_path_buf)
        .map_err(|_| ArchiveError::InvalidPath {
            path: utf8.to_owned(),
            reason: format!("path is outside {root}"),
        })
}

fn lossy_utf8(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from(path.to_string_lossy().into_owned())
}

/// Entry name inside the archive: `/`-separated normal components only.
fn entry_path(relative: &Utf8Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Utf8Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

struct EntryWriter<'a, W: io::Write + io::Seek> {
    zip: ZipWriter<W>,
    prefix: &'a str,
    entries: Vec<String>,
    seen: HashSet<String>,
}

impl<'a, W: io::Write + io::Seek> EntryWriter<'a, W> {
    fn new(zip: ZipWriter<W>, prefix: &'a str) -> Self {
        Self {
            zip,
            prefix,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn options(mode: u32) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(mode)
    }

    fn name_for(&self, relative: &Utf8Path) -> String {
        let path = entry_path(relative);
        if path.is_empty() {
            self.prefix.to_owned()
        } else {
            format!("{}/{path}", self.prefix)
        }
    }

    /// Record `name`, returning `false` if it was already written.
    fn claim(&mut self, name: &str) -> bool {
        self.seen.insert(name.to_owned())
    }

    fn add_directory(&mut self, relative: &Utf8Path) -> Result<(), ArchiveError> {
        let name = format!("{}/", self.name_for(relative));
        if !self.claim(&name) {
            return Ok(());
        }
        self.zip.add_directory(name.as_str(), Self::options(DIR_MODE))?;
        self.entries.push(name);
        Ok(())
    }

    fn add_file(&mut self, relative: &Utf8Path, source: &Utf8Path) -> Result<(), ArchiveError> {
        let name = self.name_for(relative);
        if !self.claim(&name) {
            return Ok(());
        }
        let mut input = File::open(source).map_err(|err| ArchiveError::io(source, err))?;
        self.zip.start_file(name.as_str(), Self::options(FILE_MODE))?;
        io::copy(&mut input, &mut self.zip).map_err(|err| ArchiveError::io(source, err))?;
        log::trace!("added {name}");
        self.entries.push(name);
        Ok(())
    }

    fn finish(self) -> Result<Vec<String>, ArchiveError> {
        self.zip.finish()?;
        Ok(self.entries)
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
