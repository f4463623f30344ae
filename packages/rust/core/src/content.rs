//! Content generation: draft every section of a project.
//!
//! The project moves to `generating`, each section is drafted in list order,
//! and all drafts are written together with the `completed` status. If any
//! step fails the status goes back to `draft` and the error is returned; no
//! section content is written in that case.

use draftdeck_gateway::{TextGenerator, prompts};
use draftdeck_shared::{DocumentKind, ProjectStatus, Result};
use draftdeck_storage::Storage;
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::require_text;

/// One section to draft.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub project_id: String,
    pub topic: String,
    pub document_type: DocumentKind,
    pub sections: Vec<SectionRef>,
}

/// Progress callback for content generation.
pub trait ProgressReporter: Send + Sync {
    /// Called before section `index` (zero-based) of `total` is drafted.
    fn section_started(&self, index: usize, total: usize, title: &str);
    /// Called once all drafts are stored.
    fn finished(&self, total: usize);
}

/// No-op progress reporter for server and test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn section_started(&self, _index: usize, _total: usize, _title: &str) {}
    fn finished(&self, _total: usize) {}
}

/// Draft content for every listed section of a project owned by `user_id`.
#[instrument(skip_all, fields(project_id = %request.project_id, sections = request.sections.len()))]
pub async fn generate_content<G: TextGenerator>(
    storage: &Storage,
    generator: &G,
    user_id: &str,
    request: &GenerateContentRequest,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let project_id = request.project_id.as_str();
    let topic = require_text(&request.topic, "topic")?;

    let project = storage.get_project(user_id, project_id).await?;
    if !project.status.can_transition_to(ProjectStatus::Generating) {
        warn!(
            status = %project.status,
            "generation requested while project is already generating"
        );
    }
    storage
        .set_project_status(user_id, project_id, ProjectStatus::Generating)
        .await?;

    match draft_and_store(storage, generator, user_id, topic, request, progress).await {
        Ok(()) => {
            progress.finished(request.sections.len());
            info!("content generated, project completed");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "content generation failed, reverting project to draft");
            if let Err(revert) = storage
                .set_project_status(user_id, project_id, ProjectStatus::Draft)
                .await
            {
                warn!(error = %revert, "failed to revert project status");
            }
            Err(e)
        }
    }
}

async fn draft_and_store<G: TextGenerator>(
    storage: &Storage,
    generator: &G,
    user_id: &str,
    topic: &str,
    request: &GenerateContentRequest,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let outline: Vec<String> = request.sections.iter().map(|s| s.title.clone()).collect();
    let total = request.sections.len();

    let mut drafts = Vec::with_capacity(total);
    for (index, section) in request.sections.iter().enumerate() {
        progress.section_started(index, total, &section.title);
        let prompt =
            prompts::content_request(topic, request.document_type, &outline, &section.title);
        let content = generator.complete(&prompt).await?;
        drafts.push((section.id.clone(), content));
    }

    storage
        .store_generated_content(user_id, &request.project_id, &drafts)
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::testing::{FakeGenerator, seeded, test_storage};
    use draftdeck_shared::{DraftDeckError, ProjectWithSections};

    fn request_for(created: &ProjectWithSections) -> GenerateContentRequest {
        GenerateContentRequest {
            project_id: created.project.id.clone(),
            topic: created.project.topic.clone(),
            document_type: created.project.document_kind,
            sections: created
                .sections
                .iter()
                .map(|s| SectionRef {
                    id: s.id.clone(),
                    title: s.title.clone(),
                })
                .collect(),
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        started: Mutex<Vec<(usize, usize, String)>>,
        finished: Mutex<Option<usize>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn section_started(&self, index: usize, total: usize, title: &str) {
            self.started
                .lock()
                .unwrap()
                .push((index, total, title.to_string()));
        }
        fn finished(&self, total: usize) {
            *self.finished.lock().unwrap() = Some(total);
        }
    }

    #[tokio::test]
    async fn fills_every_section_and_completes_project() {
        let storage = test_storage().await;
        let (user, created) = seeded(&storage, DocumentKind::Docx, &["A", "B", "C"]).await;
        let fake = FakeGenerator::replying(["alpha", "beta", "gamma"]);
        let progress = RecordingProgress::default();

        generate_content(&storage, &fake, &user.id, &request_for(&created), &progress)
            .await
            .unwrap();

        let project = storage
            .get_project_with_sections(&user.id, &created.project.id)
            .await
            .unwrap();
        assert_eq!(project.project.status, ProjectStatus::Completed);
        let contents: Vec<_> = project
            .sections
            .iter()
            .map(|s| (s.content.as_deref(), s.is_generated))
            .collect();
        assert_eq!(
            contents,
            vec![(Some("alpha"), true), (Some("beta"), true), (Some("gamma"), true)]
        );

        // Each prompt carries the whole outline plus its own title.
        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].user.contains("1. A\n2. B\n3. C"));
        assert!(requests[1].user.contains("\"B\""));

        assert_eq!(progress.started.lock().unwrap().len(), 3);
        assert_eq!(progress.started.lock().unwrap()[2], (2, 3, "C".to_string()));
        assert_eq!(*progress.finished.lock().unwrap(), Some(3));
    }

    #[tokio::test]
    async fn failure_mid_way_reverts_to_draft_and_writes_nothing() {
        let storage = test_storage().await;
        let (user, created) = seeded(&storage, DocumentKind::Pptx, &["A", "B", "C"]).await;
        let fake = FakeGenerator::replying(["alpha"]);
        fake.push_err("HTTP 503 Service Unavailable: upstream down");

        let err = generate_content(
            &storage,
            &fake,
            &user.id,
            &request_for(&created),
            &SilentProgress,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DraftDeckError::Gateway(_)));
        assert_eq!(fake.calls(), 2);

        let project = storage
            .get_project_with_sections(&user.id, &created.project.id)
            .await
            .unwrap();
        assert_eq!(project.project.status, ProjectStatus::Draft);
        assert!(project.sections.iter().all(|s| s.content.is_none()));
    }

    #[tokio::test]
    async fn regenerating_is_idempotent_and_leaves_no_history() {
        let storage = test_storage().await;
        let (user, created) = seeded(&storage, DocumentKind::Docx, &["A", "B"]).await;
        let fake = FakeGenerator::replying(["one", "two", "one", "two"]);
        let request = request_for(&created);

        generate_content(&storage, &fake, &user.id, &request, &SilentProgress)
            .await
            .unwrap();
        generate_content(&storage, &fake, &user.id, &request, &SilentProgress)
            .await
            .unwrap();

        let project = storage
            .get_project_with_sections(&user.id, &created.project.id)
            .await
            .unwrap();
        assert_eq!(project.project.status, ProjectStatus::Completed);
        assert_eq!(project.sections[0].content.as_deref(), Some("one"));
        assert_eq!(project.sections[1].content.as_deref(), Some("two"));
        for section in &project.sections {
            let history = storage.list_refinements(&user.id, &section.id).await.unwrap();
            assert!(history.is_empty());
        }
    }

    #[tokio::test]
    async fn section_from_another_project_rolls_back() {
        let storage = test_storage().await;
        let (user, created) = seeded(&storage, DocumentKind::Docx, &["A"]).await;
        let other = storage
            .create_project(&user.id, DocumentKind::Docx, "Other", &["X".to_string()])
            .await
            .unwrap();

        let mut request = request_for(&created);
        request.sections.push(SectionRef {
            id: other.sections[0].id.clone(),
            title: "X".into(),
        });
        let fake = FakeGenerator::replying(["a", "x"]);

        let err = generate_content(&storage, &fake, &user.id, &request, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftDeckError::NotFound { .. }));

        let project = storage
            .get_project_with_sections(&user.id, &created.project.id)
            .await
            .unwrap();
        assert_eq!(project.project.status, ProjectStatus::Draft);
        assert!(project.sections[0].content.is_none());
    }

    #[tokio::test]
    async fn foreign_project_is_not_found_and_not_touched() {
        let storage = test_storage().await;
        let (owner, created) = seeded(&storage, DocumentKind::Docx, &["A"]).await;
        let (intruder, _) = storage.create_user("intruder@example.com").await.unwrap();
        let fake = FakeGenerator::default();

        let err = generate_content(
            &storage,
            &fake,
            &intruder.id,
            &request_for(&created),
            &SilentProgress,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DraftDeckError::NotFound { .. }));
        assert_eq!(fake.calls(), 0);

        let project = storage.get_project(&owner.id, &created.project.id).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Draft);
    }
}
