//! Refinement: rewrite one section following a free-text instruction.

use draftdeck_gateway::{TextGenerator, prompts};
use draftdeck_shared::Result;
use draftdeck_storage::Storage;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::require_text;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequest {
    pub section_id: String,
    pub prompt: String,
    /// Content the caller is looking at; defaults to the stored content.
    #[serde(default)]
    pub current_content: Option<String>,
    /// Defaults to the stored title.
    #[serde(default)]
    pub title: Option<String>,
}

/// Rewrite a section and record the change in its history.
///
/// The new content overwrites the section unconditionally. Returns the new
/// content.
#[instrument(skip_all, fields(section_id = %request.section_id))]
pub async fn refine_section<G: TextGenerator>(
    storage: &Storage,
    generator: &G,
    user_id: &str,
    request: &RefineRequest,
) -> Result<String> {
    let instruction = require_text(&request.prompt, "prompt")?;
    let section = storage.get_section(user_id, &request.section_id).await?;

    let title = request.title.as_deref().unwrap_or(&section.title);
    let previous = request
        .current_content
        .as_deref()
        .or(section.content.as_deref());

    let content = generator
        .complete(&prompts::refine_request(
            title,
            previous.unwrap_or_default(),
            instruction,
        ))
        .await?;

    let entry = storage
        .apply_refinement(user_id, &section.id, instruction, previous, &content)
        .await?;
    info!(entry_id = %entry.id, "section refined");
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeGenerator, seeded, test_storage};
    use draftdeck_shared::{DocumentKind, DraftDeckError};

    fn request(section_id: &str, prompt: &str, current: Option<&str>) -> RefineRequest {
        RefineRequest {
            section_id: section_id.to_string(),
            prompt: prompt.to_string(),
            current_content: current.map(String::from),
            title: None,
        }
    }

    #[tokio::test]
    async fn two_refines_keep_the_last_result_and_two_history_rows() {
        let storage = test_storage().await;
        let (user, created) = seeded(&storage, DocumentKind::Docx, &["Intro"]).await;
        let section_id = created.sections[0].id.clone();
        let fake = FakeGenerator::replying(["shorter text", "formal text"]);

        let first = refine_section(
            &storage,
            &fake,
            &user.id,
            &request(&section_id, "make it shorter", Some("original text")),
        )
        .await
        .unwrap();
        assert_eq!(first, "shorter text");

        let second = refine_section(
            &storage,
            &fake,
            &user.id,
            &request(&section_id, "make it formal", None),
        )
        .await
        .unwrap();
        assert_eq!(second, "formal text");

        let section = storage.get_section(&user.id, &section_id).await.unwrap();
        assert_eq!(section.content.as_deref(), Some("formal text"));
        assert!(section.is_generated);

        let history = storage.list_refinements(&user.id, &section_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].prompt, "make it shorter");
        assert_eq!(history[0].previous_content.as_deref(), Some("original text"));
        assert_eq!(history[0].new_content, "shorter text");
        assert_eq!(history[1].prompt, "make it formal");
        // Falls back to what was stored by the first refine.
        assert_eq!(history[1].previous_content.as_deref(), Some("shorter text"));
        assert_eq!(history[1].new_content, "formal text");
    }

    #[tokio::test]
    async fn prompt_uses_stored_title_and_caller_content() {
        let storage = test_storage().await;
        let (user, created) = seeded(&storage, DocumentKind::Pptx, &["Market Size"]).await;
        let fake = FakeGenerator::replying(["new"]);

        refine_section(
            &storage,
            &fake,
            &user.id,
            &request(&created.sections[0].id, "add numbers", Some("draft body")),
        )
        .await
        .unwrap();

        let requests = fake.requests.lock().unwrap();
        assert!(requests[0].user.contains("Market Size"));
        assert!(requests[0].user.contains("draft body"));
        assert!(requests[0].user.contains("add numbers"));
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let storage = test_storage().await;
        let (user, created) = seeded(&storage, DocumentKind::Docx, &["Intro"]).await;
        let fake = FakeGenerator::default();

        let err = refine_section(
            &storage,
            &fake,
            &user.id,
            &request(&created.sections[0].id, " ", None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DraftDeckError::Validation { .. }));
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_leaves_section_and_history_alone() {
        let storage = test_storage().await;
        let (user, created) = seeded(&storage, DocumentKind::Docx, &["Intro"]).await;
        let section_id = created.sections[0].id.clone();
        let fake = FakeGenerator::default();
        fake.push_err("AI credits exhausted, please add funds");

        let err = refine_section(
            &storage,
            &fake,
            &user.id,
            &request(&section_id, "rewrite", Some("text")),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("credits exhausted"));

        let section = storage.get_section(&user.id, &section_id).await.unwrap();
        assert!(section.content.is_none());
        assert!(storage.list_refinements(&user.id, &section_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_section_is_not_found() {
        let storage = test_storage().await;
        let (_, created) = seeded(&storage, DocumentKind::Docx, &["Intro"]).await;
        let (intruder, _) = storage.create_user("other@example.com").await.unwrap();
        let fake = FakeGenerator::default();

        let err = refine_section(
            &storage,
            &fake,
            &intruder.id,
            &request(&created.sections[0].id, "rewrite", None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DraftDeckError::NotFound { .. }));
        assert_eq!(fake.calls(), 0);
    }
}
