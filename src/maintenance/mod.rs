//! Album tag maintenance.
//!
//! Helpers behind the `tag-maintenance` binary. They operate on the `*.mp3`
//! files directly inside one album directory:
//!
//! - [`clean_empty_frames`] drops ID3 text frames whose text is blank
//! - [`set_album_artist_from_folder`] forces album and album artist to the folder name
//! - [`normalize_loudness`] runs `rsgain` or, failing that, `mp3gain` over the album

mod error;

pub use error::MaintenanceError;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use id3::{Content, Frame, Tag, TagLike, Version};
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Normalization tools in order of preference.
pub const LOUDNESS_TOOLS: [&str; 2] = ["rsgain", "mp3gain"];

/// Lists the MP3 files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`MaintenanceError::NotADirectory`] if `dir` is not a directory and
/// [`MaintenanceError::NoMp3Files`] if it holds no MP3 files.
pub fn list_mp3s(dir: &Path) -> Result<Vec<PathBuf>, MaintenanceError> {
    if !dir.is_dir() {
        return Err(MaintenanceError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| MaintenanceError::io(dir, e))? {
        let path = entry.map_err(|e| MaintenanceError::io(dir, e))?.path();
        let is_mp3 = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"));
        if is_mp3 && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(MaintenanceError::NoMp3Files {
            path: dir.to_path_buf(),
        });
    }
    files.sort();
    Ok(files)
}

/// Whether a frame carries text that is empty after trimming.
///
/// Pictures and binary frames never count as empty.
fn is_blank_text(frame: &Frame) -> bool {
    match frame.content() {
        Content::Text(text) => text.split('\0').all(|value| value.trim().is_empty()),
        Content::ExtendedText(extended) => extended.value.trim().is_empty(),
        Content::Comment(comment) => comment.text.trim().is_empty(),
        Content::Lyrics(lyrics) => lyrics.text.trim().is_empty(),
        _ => false,
    }
}

/// Reads a tag, treating "no tag" as `None`.
fn read_tag(path: &Path) -> Result<Option<Tag>, MaintenanceError> {
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(Some(tag)),
        Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => Ok(None),
        Err(e) => Err(MaintenanceError::tag(path, e)),
    }
}

/// Removes blank text frames from every file. Returns how many files changed.
///
/// Files without an ID3 tag are left alone. Changed files are written as ID3v2.3.
///
/// # Errors
///
/// Returns [`MaintenanceError::Tag`] if a tag cannot be read or written.
#[instrument(skip(files), fields(files = files.len()))]
pub fn clean_empty_frames(files: &[PathBuf]) -> Result<usize, MaintenanceError> {
    let mut changed = 0;
    for path in files {
        let Some(tag) = read_tag(path)? else {
            debug!(file = %path.display(), "no ID3 tag, skipping");
            continue;
        };

        let before = tag.frames().count();
        let mut cleaned = Tag::new();
        for frame in tag.frames().filter(|frame| !is_blank_text(frame)) {
            cleaned.add_frame(frame.clone());
        }
        if cleaned.frames().count() == before {
            continue;
        }

        cleaned
            .write_to_path(path, Version::Id3v23)
            .map_err(|e| MaintenanceError::tag(path, e))?;
        debug!(
            file = %path.display(),
            removed = before - cleaned.frames().count(),
            "removed blank frames"
        );
        changed += 1;
    }
    info!(changed, "cleaned blank ID3 frames");
    Ok(changed)
}

/// Sets album and album artist of every file to the album folder's name.
///
/// Returns the name that was applied.
///
/// # Errors
///
/// Returns [`MaintenanceError::NotADirectory`] if the folder has no usable
/// name, or [`MaintenanceError::Tag`] on tag failures.
#[instrument(skip(files), fields(dir = %dir.display(), files = files.len()))]
pub fn set_album_artist_from_folder(
    dir: &Path,
    files: &[PathBuf],
) -> Result<String, MaintenanceError> {
    let resolved = std::fs::canonicalize(dir).map_err(|e| MaintenanceError::io(dir, e))?;
    let name = resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MaintenanceError::NotADirectory {
            path: dir.to_path_buf(),
        })?;

    for path in files {
        let mut tag = read_tag(path)?.unwrap_or_else(Tag::new);
        tag.set_album(name.as_str());
        tag.set_album_artist(name.as_str());
        tag.write_to_path(path, Version::Id3v23)
            .map_err(|e| MaintenanceError::tag(path, e))?;
    }
    info!(album = %name, files = files.len(), "set album and album artist");
    Ok(name)
}

/// A located normalization executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoudnessTool {
    /// `rsgain easy <files>`.
    Rsgain(PathBuf),
    /// `mp3gain -a <files>`.
    Mp3gain(PathBuf),
}

impl LoudnessTool {
    /// Finds the preferred tool on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`MaintenanceError::ExternalToolMissing`] if neither is found.
    pub fn locate() -> Result<Self, MaintenanceError> {
        Self::locate_in(std::env::var_os("PATH"))
    }

    /// Finds the preferred tool in an explicit search path.
    ///
    /// # Errors
    ///
    /// Returns [`MaintenanceError::ExternalToolMissing`] if neither is found.
    pub fn locate_in(paths: Option<OsString>) -> Result<Self, MaintenanceError> {
        let cwd = std::env::current_dir().map_err(|e| MaintenanceError::io(".", e))?;
        let find = |name: &str| which::which_in(name, paths.clone(), &cwd).ok();

        if let Some(path) = find(LOUDNESS_TOOLS[0]) {
            Ok(Self::Rsgain(path))
        } else if let Some(path) = find(LOUDNESS_TOOLS[1]) {
            Ok(Self::Mp3gain(path))
        } else {
            Err(MaintenanceError::ExternalToolMissing {
                tools: LOUDNESS_TOOLS.iter().map(ToString::to_string).collect(),
            })
        }
    }

    /// Executable name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rsgain(_) => LOUDNESS_TOOLS[0],
            Self::Mp3gain(_) => LOUDNESS_TOOLS[1],
        }
    }

    /// Builds the album-mode invocation over `files`.
    #[must_use]
    pub fn command(&self, files: &[PathBuf]) -> Command {
        let (program, mode) = match self {
            Self::Rsgain(path) => (path, "easy"),
            Self::Mp3gain(path) => (path, "-a"),
        };
        let mut command = Command::new(program);
        command.arg(mode).args(files);
        command
    }
}

/// Runs album loudness normalization over `files`.
///
/// # Errors
///
/// Returns [`MaintenanceError::ExternalToolMissing`] when no tool is found,
/// [`MaintenanceError::ToolFailed`] on a non-zero exit.
pub async fn normalize_loudness(files: &[PathBuf]) -> Result<LoudnessTool, MaintenanceError> {
    let tool = LoudnessTool::locate()?;
    run_loudness_tool(&tool, files).await?;
    Ok(tool)
}

/// Runs an already located tool over `files`.
///
/// # Errors
///
/// Returns [`MaintenanceError::ToolFailed`] on a non-zero exit.
#[instrument(skip(files), fields(tool = tool.name(), files = files.len()))]
pub async fn run_loudness_tool(
    tool: &LoudnessTool,
    files: &[PathBuf],
) -> Result<(), MaintenanceError> {
    info!("running loudness normalization");
    let status = tool
        .command(files)
        .status()
        .await
        .map_err(|e| MaintenanceError::io(tool.name(), e))?;
    if !status.success() {
        return Err(MaintenanceError::ToolFailed {
            tool: tool.name().to_string(),
            status: status.code(),
        });
    }
    Ok(())
}
