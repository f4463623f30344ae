//! Domain workflows for DraftDeck.
//!
//! Each module is one user action: propose an outline, draft every section,
//! refine one section, record feedback, manage and export projects. Workflows
//! take the [`Storage`](draftdeck_storage::Storage) handle and a
//! [`TextGenerator`](draftdeck_gateway::TextGenerator) explicitly and act on
//! behalf of one user id.

pub mod content;
pub mod feedback;
pub mod outline;
pub mod projects;
pub mod refine;

pub use content::{
    GenerateContentRequest, ProgressReporter, SectionRef, SilentProgress, generate_content,
};
pub use outline::generate_outline;
pub use refine::{RefineRequest, refine_section};

/// Reject empty or whitespace-only input.
pub(crate) fn require_text<'a>(value: &'a str, what: &str) -> draftdeck_shared::Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(draftdeck_shared::DraftDeckError::validation(format!(
            "{what} must not be empty"
        )));
    }
    Ok(trimmed)
}
