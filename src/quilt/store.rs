//! Patch files and the series manifest

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use scopeguard::ScopeGuard;
use tempfile::NamedTempFile;

use super::{PATCHES_DIR, QuiltError, SERIES_FILE};

/// Regex matching the first line of a diff body
///
/// Anything above the first match is the patch's description header.
static DIFF_START_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:--- |diff --git |Index: |index |new file mode |deleted file mode |old mode |rename from |copy from |similarity index )",
    )
    .expect("Invalid diff start regex")
});

/// The `patches/` directory of a series root
#[derive(Debug, Clone)]
pub struct PatchStore {
    patches_dir: PathBuf,
    series_file: PathBuf,
}

impl PatchStore {
    /// Open the store under `root`, which must contain `patches/`
    pub fn open(root: &Path) -> Result<Self, QuiltError> {
        let patches_dir = root.join(PATCHES_DIR);
        if !patches_dir.is_dir() {
            return Err(QuiltError::MissingPatchesDir(root.to_path_buf()));
        }
        let series_file = patches_dir.join(SERIES_FILE);
        Ok(Self {
            patches_dir,
            series_file,
        })
    }

    pub fn patches_dir(&self) -> &Path {
        &self.patches_dir
    }

    pub fn series_path(&self) -> &Path {
        &self.series_file
    }

    /// Fail unless the series manifest exists
    pub fn require_series(&self) -> Result<(), QuiltError> {
        if self.series_file.is_file() {
            Ok(())
        } else {
            Err(QuiltError::MissingSeries(self.series_file.clone()))
        }
    }

    /// Patch names in application order; a missing manifest is an empty series
    pub fn series(&self) -> Result<Vec<String>, QuiltError> {
        Ok(self
            .series_lines()?
            .iter()
            .filter_map(|line| series_entry(line))
            .map(str::to_string)
            .collect())
    }

    /// The last `count` entries of the series (all of them for `None`),
    /// oldest first. Counts beyond the series length are clamped.
    pub fn select_tail(&self, count: Option<usize>) -> Result<Vec<String>, QuiltError> {
        let mut series = self.series()?;
        let count = count.unwrap_or(series.len()).min(series.len());
        Ok(series.split_off(series.len() - count))
    }

    /// Read a patch file, returning `(diff, description)`
    pub fn read_patch(&self, name: &str) -> Result<(String, String), QuiltError> {
        check_patch_name(name)?;
        let path = self.patches_dir.join(name);
        let content = fs::read_to_string(&path).map_err(QuiltError::io(&path))?;
        Ok(split_description(&content))
    }

    /// Write patch files and append their names to the series.
    ///
    /// Files are written through temporary files in the same directory.
    /// If any write or the manifest update fails, the files written so far
    /// are removed again.
    pub fn write_patches(&self, names: &[String], contents: &[String]) -> Result<(), QuiltError> {
        if names.len() != contents.len() {
            return Err(QuiltError::MismatchedBatch {
                names: names.len(),
                contents: contents.len(),
            });
        }
        if names.is_empty() {
            return Ok(());
        }
        for name in names {
            check_patch_name(name)?;
        }

        let mut written = scopeguard::guard(Vec::<PathBuf>::new(), |paths| {
            for path in paths {
                let _ = fs::remove_file(path);
            }
        });

        for (name, content) in names.iter().zip(contents) {
            let path = self.patches_dir.join(name);
            let dir = path.parent().unwrap_or(&self.patches_dir).to_path_buf();
            fs::create_dir_all(&dir).map_err(QuiltError::io(&dir))?;

            let mut file = NamedTempFile::new_in(&dir).map_err(QuiltError::io(&dir))?;
            file.write_all(content.as_bytes())
                .map_err(QuiltError::io(&path))?;
            file.persist(&path)
                .map_err(|e| QuiltError::io(&path)(e.error))?;
            written.push(path);
        }

        self.append_to_series(names)?;
        ScopeGuard::into_inner(written);
        Ok(())
    }

    /// Delete a patch file and its (last) series entry
    pub fn remove_patch(&self, name: &str) -> Result<(), QuiltError> {
        check_patch_name(name)?;
        let path = self.patches_dir.join(name);
        fs::remove_file(&path).map_err(QuiltError::io(&path))?;

        let mut lines = self.series_lines()?;
        if let Some(idx) = lines.iter().rposition(|line| series_entry(line) == Some(name)) {
            lines.remove(idx);
        }
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&self.series_file, content).map_err(QuiltError::io(&self.series_file))
    }

    /// Record every file under `patches/` so a failed operation can put
    /// them back
    pub fn checkpoint(&self) -> Result<StoreCheckpoint, QuiltError> {
        let mut files = BTreeMap::new();
        for path in list_files(&self.patches_dir)? {
            let content = fs::read(&path).map_err(QuiltError::io(&path))?;
            files.insert(path, content);
        }
        Ok(StoreCheckpoint { files })
    }

    /// Make `patches/` match `checkpoint` again: files created since are
    /// removed, changed or removed files are rewritten
    pub fn restore(&self, checkpoint: &StoreCheckpoint) -> Result<(), QuiltError> {
        for path in list_files(&self.patches_dir)? {
            if !checkpoint.files.contains_key(&path) {
                fs::remove_file(&path).map_err(QuiltError::io(&path))?;
            }
        }
        for (path, content) in &checkpoint.files {
            if fs::read(path).ok().as_deref() == Some(content.as_slice()) {
                continue;
            }
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).map_err(QuiltError::io(dir))?;
            }
            fs::write(path, content).map_err(QuiltError::io(path))?;
        }
        Ok(())
    }

    fn series_lines(&self) -> Result<Vec<String>, QuiltError> {
        match fs::read_to_string(&self.series_file) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(QuiltError::io(&self.series_file)(e)),
        }
    }

    fn append_to_series(&self, names: &[String]) -> Result<(), QuiltError> {
        let needs_newline = fs::read(&self.series_file)
            .map(|bytes| bytes.last().is_some_and(|b| *b != b'\n'))
            .unwrap_or(false);

        let mut entries = String::new();
        if needs_newline {
            entries.push('\n');
        }
        for name in names {
            entries.push_str(name);
            entries.push('\n');
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.series_file)
            .map_err(QuiltError::io(&self.series_file))?;
        file.write_all(entries.as_bytes())
            .map_err(QuiltError::io(&self.series_file))
    }
}

/// Fail unless `name` is a relative path that stays inside `patches/`
pub fn check_patch_name(name: &str) -> Result<(), QuiltError> {
    let path = Path::new(name);
    let inside = path.components().next().is_some()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if inside && name != SERIES_FILE {
        Ok(())
    } else {
        Err(QuiltError::InvalidName(name.to_string()))
    }
}

/// Saved contents of a `patches/` directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCheckpoint {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl StoreCheckpoint {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Regular files under `dir`, recursively
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, QuiltError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).map_err(QuiltError::io(&dir))? {
            let path = entry.map_err(QuiltError::io(&dir))?.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    Ok(files)
}

/// The patch name on a series line, skipping blanks and `#` comments
fn series_entry(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        None
    } else {
        Some(line)
    }
}

/// Split patch file content into `(diff, description)`.
///
/// The description is every line above the first diff line, with trailing
/// whitespace removed. A quilt `Index:` header skips its `====` underline.
pub fn split_description(content: &str) -> (String, String) {
    let lines: Vec<&str> = content.split('\n').collect();

    let diff_start = lines
        .iter()
        .position(|line| DIFF_START_REGEX.is_match(line))
        .map(|idx| {
            if lines[idx].starts_with("Index: ") && idx + 2 < lines.len() {
                idx + 2
            } else {
                idx
            }
        });

    let (header, body) = match diff_start {
        Some(idx) => {
            let header_end = lines[..idx]
                .iter()
                .rposition(|line| !line.starts_with("Index: ") && !line.starts_with("===="))
                .map_or(0, |last| last + 1)
                .min(idx);
            (&lines[..header_end], &lines[idx..])
        }
        None => (&lines[..], &lines[lines.len()..]),
    };

    let description = header
        .iter()
        .map(|line| line.trim_end_matches([' ', '\t']))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end_matches([' ', '\n', '\t'])
        .to_string();
    let diff = body
        .join("\n")
        .trim_start_matches([' ', '\n', '\t'])
        .to_string();

    (diff, description)
}
