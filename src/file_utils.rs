use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path mirroring the input's place under the source root
    // @params: input_file, source_root, output_root
    pub fn mirror_output_path<P1: AsRef<Path>, P2: AsRef<Path>, P3: AsRef<Path>>(
        input_file: P1,
        source_root: P2,
        output_root: P3,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let relative = input_file
            .strip_prefix(source_root.as_ref())
            .unwrap_or_else(|_| Path::new(input_file.file_name().unwrap_or_default()));
        output_root.as_ref().join(relative)
    }

    /// Find files with any of the given extensions in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy().to_lowercase();
                    if normalized.iter().any(|wanted| *wanted == ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file.
    ///
    /// The content goes to a temporary file next to the target first and is
    /// renamed into place, so readers never see a half-written file.
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Self::ensure_dir(dir)?;

        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
        temp.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to file: {:?}", path))?;
        temp.persist(path)
            .with_context(|| format!("Failed to write to file: {:?}", path))?;

        Ok(())
    }

    /// Whether `source` was modified after `target`.
    ///
    /// A missing target counts as older.
    pub fn is_newer<P1: AsRef<Path>, P2: AsRef<Path>>(source: P1, target: P2) -> Result<bool> {
        let target = target.as_ref();
        if !target.exists() {
            return Ok(true);
        }

        let source_time = fs::metadata(source.as_ref())
            .and_then(|m| m.modified())
            .with_context(|| format!("Failed to read modification time: {:?}", source.as_ref()))?;
        let target_time = fs::metadata(target)
            .and_then(|m| m.modified())
            .with_context(|| format!("Failed to read modification time: {:?}", target))?;

        Ok(source_time > target_time)
    }
}
