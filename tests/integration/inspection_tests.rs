/*!
 * Inspection queries end to end
 */

use anyhow::Result;
use std::fs;

use codescribe::translation::{InspectionRequest, Inspector};
use crate::common::{self, mock_backends::MockBackend};

const PREAMBLE: &str = "Read the files and answer the query.\n\n";

#[tokio::test]
async fn test_inspect_shouldAggregateFilesInOrderIntoOneMessage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let a = common::create_test_file(temp_dir.path(), "a.f", "subroutine a\nend\n")?;
    let b = common::create_test_file(temp_dir.path(), "b.f", "subroutine b\nend\n")?;
    let backend = MockBackend::replying("a and b");
    let inspector = Inspector::new(PREAMBLE, backend.boxed());

    inspector
        .inspect(&InspectionRequest::new(vec![a.clone(), b.clone()], "List all subroutines"))
        .await?;

    let tracker = backend.tracker();
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.call_count(), 1);
    let conversation = &tracker.conversations[0];
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation.seed().role, "user");

    let content = &conversation.seed().content;
    let a_block = format!("<{0}>subroutine a\nend\n</{0}>", a.display());
    let b_block = format!("<{0}>subroutine b\nend\n</{0}>", b.display());
    let a_at = content.find(&a_block).unwrap();
    let b_at = content.find(&b_block).unwrap();
    let q_at = content.find("<query>\nList all subroutines\n</query>").unwrap();
    assert!(content.starts_with(PREAMBLE));
    assert!(a_at < b_at && b_at < q_at);
    Ok(())
}

/// The answer is handed back exactly as the backend produced it
#[tokio::test]
async fn test_inspect_shouldReturnRawAnswer() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let a = common::create_test_file(temp_dir.path(), "a.f", "x\n")?;
    let answer = "  <csource>not extracted</csource>\n\n";
    let backend = MockBackend::replying(answer);

    let result = Inspector::new(PREAMBLE, backend.boxed())
        .inspect(&InspectionRequest::new(vec![a], "q"))
        .await?;

    assert_eq!(result.as_deref(), Some(answer));
    Ok(())
}

#[tokio::test]
async fn test_inspect_withPromptDumpAndNoBackend_shouldOnlySave() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let a = common::create_test_file(temp_dir.path(), "a.f", "x\n")?;
    let empty = common::create_test_file(temp_dir.path(), "empty.f", "")?;
    let dump = temp_dir.path().join("scribe.json");

    let result = Inspector::new(PREAMBLE, None)
        .with_prompt_dump(&dump)
        .inspect(&InspectionRequest::new(vec![a, empty.clone()], "What is x?"))
        .await?;

    assert!(result.is_none());
    let saved: Vec<serde_json::Value> = serde_json::from_str(&fs::read_to_string(&dump)?)?;
    assert_eq!(saved.len(), 1);
    let content = saved[0]["content"].as_str().unwrap();
    assert!(content.ends_with("\n<query>\nWhat is x?\n</query>\n"));
    assert!(!content.contains(&format!("<{}>", empty.display())));
    Ok(())
}

#[tokio::test]
async fn test_inspect_withMissingFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let backend = MockBackend::replying("unused");

    let result = Inspector::new(PREAMBLE, backend.boxed())
        .inspect(&InspectionRequest::new(vec![temp_dir.path().join("gone.f")], "q"))
        .await;

    assert!(result.is_err());
    assert_eq!(backend.tracker().lock().unwrap().call_count(), 0);
    Ok(())
}
