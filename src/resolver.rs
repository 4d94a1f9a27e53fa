use crate::error::{CompressionError, Result};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where the bytes of a job come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

/// What a command-line path argument turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedInput {
    /// A single file or URL named directly on the command line
    Single(Source),
    /// Matching files found under a directory, in traversal order
    Directory { root: PathBuf, files: Vec<PathBuf> },
}

impl ResolvedInput {
    pub fn into_sources(self) -> Vec<Source> {
        match self {
            ResolvedInput::Single(source) => vec![source],
            ResolvedInput::Directory { files, .. } => files.into_iter().map(Source::File).collect(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, ResolvedInput::Directory { .. })
    }
}

/// Syntactic URL check, no parsing involved.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http:") || input.starts_with("https:")
}

/// Classifies `input` and, for directories, enumerates the candidate files.
///
/// Named files are taken as-is; the extension filter only applies inside directories.
pub fn resolve_input(input: &str, recursive: bool, extensions: &[String]) -> Result<ResolvedInput> {
    if is_url(input) {
        return Ok(ResolvedInput::Single(Source::Url(input.to_string())));
    }

    let path = Path::new(input);
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CompressionError::PathNotFound(path.to_path_buf()),
        _ => CompressionError::Io(e),
    })?;

    if metadata.is_dir() {
        let files = enumerate_files(path, recursive, extensions)?;
        Ok(ResolvedInput::Directory {
            root: path.to_path_buf(),
            files,
        })
    } else {
        Ok(ResolvedInput::Single(Source::File(path.to_path_buf())))
    }
}

/// Lists the files under `root` accepted by the extension filter.
///
/// Without `recursive` only the immediate children are considered. Directory entries are never
/// returned. The first traversal error aborts the listing so callers never act on a partial set.
pub fn enumerate_files(root: &Path, recursive: bool, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let walker = if recursive {
        WalkDir::new(root).min_depth(1)
    } else {
        WalkDir::new(root).min_depth(1).max_depth(1)
    };

    let mut files = Vec::new();
    for entry in walker.sort_by_file_name() {
        let entry = entry.map_err(|source| CompressionError::Enumeration {
            root: root.to_path_buf(),
            source,
        })?;

        if entry.file_type().is_dir() {
            continue;
        }
        if matches_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Case-insensitive suffix match of the file name against each configured extension.
///
/// This is a plain string suffix test: `"jpg"` also accepts `"manjpg"`.
pub fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy().to_lowercase();
    extensions
        .iter()
        .any(|ext| !ext.is_empty() && name.ends_with(&ext.to_lowercase()))
}
