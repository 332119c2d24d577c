/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;

use codescribe::errors::ScribeError;
use codescribe::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "exists.F90", "end\n")?;

    assert!(FileManager::file_exists(&test_file));
    Ok(())
}

/// Test that file_exists returns false for directories and missing paths
#[test]
fn test_file_exists_withDirectoryOrMissing_shouldReturnFalse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.F90")));
    Ok(())
}

#[test]
fn test_artifact_path_withSuffixes_shouldReplaceExtension() {
    let source = Path::new("/work/src/Hydro_computeFluxes.F90");

    assert_eq!(
        FileManager::artifact_path(source, ".cpp"),
        Path::new("/work/src/Hydro_computeFluxes.cpp")
    );
    assert_eq!(
        FileManager::artifact_path(source, "_fi.F90"),
        Path::new("/work/src/Hydro_computeFluxes_fi.F90")
    );
}

/// Line terminators are kept so filtered code keeps its layout
#[test]
fn test_read_lines_shouldKeepLineTerminators() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "lines.f", "a\nb\r\nc")?;

    let lines = FileManager::read_lines(&file)?;

    assert_eq!(lines, vec!["a\n", "b\r\n", "c"]);
    Ok(())
}

#[test]
fn test_read_to_string_withMissingFile_shouldReportPath() {
    let result = FileManager::read_to_string("no/such/file.F90");

    match result {
        Err(ScribeError::File { path, .. }) => assert_eq!(path, Path::new("no/such/file.F90")),
        other => panic!("expected a file error, got {:?}", other),
    }
}

#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = temp_dir.path().join("nested").join("out.cpp");

    FileManager::write_to_file(&target, "int main() {}\n")?;

    assert_eq!(fs::read_to_string(&target)?, "int main() {}\n");
    Ok(())
}

/// Directories expand recursively in sorted order; plain files keep argument order
#[test]
fn test_collect_files_withMixedInputs_shouldExpandDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let lone = common::create_test_file(root, "z_lone.F90", "x\n")?;
    common::create_test_file(root, "tree/b.F90", "b\n")?;
    common::create_test_file(root, "tree/a.F90", "a\n")?;
    common::create_test_file(root, "tree/sub/c.F90", "c\n")?;

    let files = FileManager::collect_files(&[lone.clone(), root.join("tree")])?;

    assert_eq!(
        files,
        vec![
            lone,
            root.join("tree/a.F90"),
            root.join("tree/b.F90"),
            root.join("tree/sub/c.F90"),
        ]
    );
    Ok(())
}
