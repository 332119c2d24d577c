/*!
 * Tests for the application controller
 */

use anyhow::Result;
use std::fs;
use std::time::Duration;

use codescribe::app_config::Config;
use codescribe::app_controller::Controller;
use codescribe::translation::{BatchOptions, UnitOutcome};
use crate::common;

#[test]
fn test_with_config_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.translate.primary_tag = String::new();

    assert!(Controller::with_config(config).is_err());
}

/// Directories contribute sources only; artifacts next to them are ignored
#[test]
fn test_collect_units_withDirectory_shouldSkipArtifacts() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "src/Grid_init.F90", "x\n")?;
    common::create_test_file(root, "src/Grid_init_fi.F90", "iface\n")?;
    common::create_test_file(root, "src/Grid_init.cpp", "impl\n")?;
    common::create_test_file(root, "src/README.md", "docs\n")?;
    common::create_test_file(root, "src/old/eos.f90", "y\n")?;
    let explicit = common::create_test_file(root, "notes.txt", "z\n")?;

    let controller = Controller::with_config(Config::default())?;
    let units = controller.collect_units(&[root.join("src"), explicit.clone()])?;

    let sources: Vec<_> = units.iter().map(|u| u.source.clone()).collect();
    assert_eq!(
        sources,
        vec![root.join("src/Grid_init.F90"), root.join("src/old/eos.f90"), explicit]
    );
    assert_eq!(units[0].primary_output, root.join("src/Grid_init.cpp"));
    assert_eq!(units[0].secondary_output, root.join("src/Grid_init_fi.F90"));
    Ok(())
}

#[test]
fn test_build_backend_withoutSelector_shouldReturnNone() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;

    assert!(controller.build_backend()?.is_none());
    Ok(())
}

#[test]
fn test_build_backend_withUnknownSelector_shouldFail() -> Result<()> {
    let mut config = Config::default();
    config.backend.model = Some("no-such-model".to_string());
    let controller = Controller::with_config(config)?;

    let err = controller.build_backend().unwrap_err();

    assert!(err.to_string().contains("no-such-model not available"));
    Ok(())
}

/// Dry run: a seed file and a directory produce prompt dumps only
#[tokio::test]
async fn test_run_translate_withoutBackend_shouldSavePrompts() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let seed = common::create_test_file(root, "seed.toml", "[[chat]]\nrole = \"user\"\ncontent = \"Translate.\"\n")?;
    let source = common::create_fortran_source(&root.join("src"), "Grid_init.F90", "grid_init")?;

    let controller = Controller::with_config(Config::default())?;
    let summary = controller
        .run_translate(&[root.join("src")], &seed, BatchOptions { force: false, save_prompts: true })
        .await?;

    assert_eq!(summary.outcomes, vec![UnitOutcome::PromptSaved]);
    let dump = fs::read_to_string(source.with_file_name("Grid_init.json"))?;
    assert!(dump.contains("Translate.\\n<source>\\nsubroutine grid_init()"));
    Ok(())
}

#[tokio::test]
async fn test_run_inspect_withoutBackend_shouldWriteConfiguredDump() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "src/a.f", "x\n")?;
    let mut config = Config::default();
    config.inspect.prompt_file = root.join("inspect.json").display().to_string();

    let controller = Controller::with_config(config)?;
    let answer = controller.run_inspect(&[root.join("src")], "What is x?", true).await?;

    assert!(answer.is_none());
    assert!(root.join("inspect.json").exists());
    Ok(())
}

/// Directory inputs only contribute source files; binaries and old dumps are ignored
#[tokio::test]
async fn test_run_inspect_withDirectory_shouldSkipNonSourceFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "src/a.f", "x\n")?;
    common::create_test_file(root, "src/a.json", "[]")?;
    fs::write(root.join("src/a.o"), [0xff_u8, 0xfe, 0x00, 0x9c])?;
    let mut config = Config::default();
    config.inspect.prompt_file = root.join("inspect.json").display().to_string();

    let controller = Controller::with_config(config)?;
    controller.run_inspect(&[root.join("src")], "What is x?", true).await?;

    let dump = fs::read_to_string(root.join("inspect.json"))?;
    assert!(dump.contains("a.f>x\\n</"));
    assert!(!dump.contains("a.json>"));
    assert!(!dump.contains("a.o>"));
    Ok(())
}

#[test]
fn test_format_duration_shouldPickLargestUnit() {
    assert_eq!(Controller::format_duration(Duration::from_millis(1500)), "1.500s");
    assert_eq!(Controller::format_duration(Duration::from_secs(125)), "2m 5s");
    assert_eq!(Controller::format_duration(Duration::from_secs(3725)), "1h 2m 5s");
}
