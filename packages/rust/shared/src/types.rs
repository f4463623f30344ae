//! Core domain types for DraftDeck projects.
//!
//! Wire format is camelCase JSON, matching what browser clients send.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DraftDeckError;

/// Generate a new time-sortable row identifier (UUID v7).
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

// ---------------------------------------------------------------------------
// DocumentKind
// ---------------------------------------------------------------------------

/// Output format a project is drafted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Word-processor document.
    Docx,
    /// Slide deck.
    Pptx,
}

impl DocumentKind {
    /// Storage and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pptx => "pptx",
        }
    }

    /// What one section is called in prompts and messages.
    pub fn unit_name(&self) -> &'static str {
        match self {
            Self::Docx => "section",
            Self::Pptx => "slide",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = DraftDeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            other => Err(DraftDeckError::validation(format!(
                "unknown document type '{other}': expected 'docx' or 'pptx'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Draft,
    Generating,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Generating => "generating",
            Self::Completed => "completed",
        }
    }

    /// Whether `self -> next` is one of the defined transitions.
    ///
    /// `generating -> draft` is the rollback after a failed generation;
    /// `completed -> generating` is a regeneration.
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Generating)
                | (Self::Completed, Self::Generating)
                | (Self::Generating, Self::Completed)
                | (Self::Generating, Self::Draft)
        )
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = DraftDeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "generating" => Ok(Self::Generating),
            "completed" => Ok(Self::Completed),
            other => Err(DraftDeckError::Storage(format!(
                "unknown project status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// An account that owns projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A document topic plus its lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    /// Owning user.
    pub user_id: String,
    #[serde(rename = "documentType")]
    pub document_kind: DocumentKind,
    pub topic: String,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ordered content unit of a project (a document section or a slide).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub project_id: String,
    /// Zero-based order position. Assigned once, never renumbered.
    pub position: i64,
    pub title: String,
    /// `None` until generation runs.
    #[serde(default)]
    pub content: Option<String>,
    pub is_generated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit record of one refinement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementEntry {
    pub id: String,
    pub section_id: String,
    /// The free-text instruction.
    pub prompt: String,
    #[serde(default)]
    pub previous_content: Option<String>,
    pub new_content: String,
    pub created_at: DateTime<Utc>,
}

/// Like/dislike and comment left on a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub section_id: String,
    #[serde(default)]
    pub liked: Option<bool>,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project together with its sections in position order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithSections {
    pub project: Project,
    pub sections: Vec<Section>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_kind_parses_and_displays() {
        assert_eq!("docx".parse::<DocumentKind>().unwrap(), DocumentKind::Docx);
        assert_eq!("pptx".parse::<DocumentKind>().unwrap(), DocumentKind::Pptx);
        assert_eq!(DocumentKind::Pptx.to_string(), "pptx");
        assert!("pdf".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn status_transitions() {
        use ProjectStatus::*;
        assert!(Draft.can_transition_to(Generating));
        assert!(Generating.can_transition_to(Completed));
        assert!(Generating.can_transition_to(Draft));
        assert!(Completed.can_transition_to(Generating));

        assert!(!Draft.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Draft));
        assert!(!Generating.can_transition_to(Generating));
    }

    #[test]
    fn project_serializes_camel_case() {
        let now = Utc::now();
        let project = Project {
            id: new_id(),
            user_id: "u1".into(),
            document_kind: DocumentKind::Docx,
            topic: "EV market analysis".into(),
            status: ProjectStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&project).expect("serialize");
        assert_eq!(json["documentType"], "docx");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["userId"], "u1");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn section_without_content_deserializes() {
        let json = r#"{
            "id": "s1",
            "projectId": "p1",
            "position": 0,
            "title": "Intro",
            "isGenerated": false,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z"
        }"#;
        let section: Section = serde_json::from_str(json).expect("deserialize");
        assert!(section.content.is_none());
        assert_eq!(section.position, 0);
    }

    #[test]
    fn ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
