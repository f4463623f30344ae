//! Project and section management, plus export of a stored project.

use draftdeck_export::ExportedFile;
use draftdeck_shared::{DocumentKind, Project, ProjectWithSections, Result, Section};
use draftdeck_storage::Storage;
use tracing::{info, instrument};

use crate::require_text;

/// Create a project with one section per title, positioned `0..n-1`.
#[instrument(skip(storage, user_id, topic, titles), fields(sections = titles.len()))]
pub async fn create_project(
    storage: &Storage,
    user_id: &str,
    kind: DocumentKind,
    topic: &str,
    titles: &[String],
) -> Result<ProjectWithSections> {
    let topic = require_text(topic, "topic")?;
    let titles = titles
        .iter()
        .map(|t| require_text(t, "section title").map(String::from))
        .collect::<Result<Vec<_>>>()?;
    storage.create_project(user_id, kind, topic, &titles).await
}

pub async fn list_projects(storage: &Storage, user_id: &str) -> Result<Vec<Project>> {
    storage.list_projects(user_id).await
}

pub async fn get_project(
    storage: &Storage,
    user_id: &str,
    project_id: &str,
) -> Result<ProjectWithSections> {
    storage.get_project_with_sections(user_id, project_id).await
}

/// Delete a project together with its sections, history and feedback.
pub async fn delete_project(storage: &Storage, user_id: &str, project_id: &str) -> Result<()> {
    storage.delete_project(user_id, project_id).await
}

/// Append a section after the current last position.
pub async fn add_section(
    storage: &Storage,
    user_id: &str,
    project_id: &str,
    title: &str,
) -> Result<Section> {
    let title = require_text(title, "section title")?;
    storage.add_section(user_id, project_id, title).await
}

/// Edit a section's title and/or content. `None` leaves a field as is.
pub async fn update_section(
    storage: &Storage,
    user_id: &str,
    section_id: &str,
    title: Option<&str>,
    content: Option<&str>,
) -> Result<Section> {
    let title = title.map(|t| require_text(t, "section title")).transpose()?;
    storage
        .update_section(user_id, section_id, title, content)
        .await
}

/// Sections keep their positions; gaps are not closed.
pub async fn delete_section(storage: &Storage, user_id: &str, section_id: &str) -> Result<()> {
    storage.delete_section(user_id, section_id).await
}

/// Render the project's current state in its document format.
#[instrument(skip(storage, user_id))]
pub async fn export_project(
    storage: &Storage,
    user_id: &str,
    project_id: &str,
) -> Result<ExportedFile> {
    let ProjectWithSections { project, sections } =
        storage.get_project_with_sections(user_id, project_id).await?;
    let file = draftdeck_export::export(project.document_kind, &project.topic, &sections)?;
    info!(file_name = %file.file_name, bytes = file.bytes.len(), "project exported");
    Ok(file)
}
