use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::{ScribeError, ScribeResult};

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
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> ScribeResult<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path).map_err(|e| ScribeError::file(path, e))?;
        }
        Ok(())
    }

    // @generates: Sibling artifact path, `dir/stem` + suffix
    // @params: source file, suffix including any leading dot
    pub fn artifact_path<P: AsRef<Path>>(source: P, suffix: &str) -> PathBuf {
        let source = source.as_ref();
        let stem = source.file_stem().unwrap_or_default();

        let mut file_name = stem.to_string_lossy().to_string();
        file_name.push_str(suffix);

        source.with_file_name(file_name)
    }

    /// Expand files and directories into a flat, ordered file list.
    ///
    /// Plain files are kept in argument order; each directory contributes its
    /// files recursively, sorted by path.
    pub fn collect_files<P: AsRef<Path>>(inputs: &[P]) -> ScribeResult<Vec<PathBuf>> {
        let mut result = Vec::new();

        for input in inputs {
            let input = input.as_ref();
            if input.is_dir() {
                let mut found = Vec::new();
                for entry in WalkDir::new(input).follow_links(true) {
                    let entry = entry.map_err(|e| {
                        let path = e.path().unwrap_or(input).to_path_buf();
                        let source = e.into_io_error().unwrap_or_else(|| {
                            std::io::Error::other("filesystem loop while walking directory")
                        });
                        ScribeError::file(path, source)
                    })?;
                    if entry.file_type().is_file() {
                        found.push(entry.into_path());
                    }
                }
                found.sort();
                result.extend(found);
            } else {
                result.push(input.to_path_buf());
            }
        }

        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> ScribeResult<String> {
        let path = path.as_ref();
        fs::read_to_string(path).map_err(|e| ScribeError::file(path, e))
    }

    /// Read a file as lines, each keeping its line terminator
    pub fn read_lines<P: AsRef<Path>>(path: P) -> ScribeResult<Vec<String>> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|e| ScribeError::file(path, e))?;
        let mut reader = BufReader::new(file);

        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let read = reader
                .read_line(&mut line)
                .map_err(|e| ScribeError::file(path, e))?;
            if read == 0 {
                break;
            }
            lines.push(line);
        }

        Ok(lines)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> ScribeResult<()> {
        let path = path.as_ref();
        // Ensure the parent directory exists
        if let Some(parent) = path.parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(path, content).map_err(|e| ScribeError::file(path, e))
    }
}
