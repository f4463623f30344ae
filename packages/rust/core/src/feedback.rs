//! Per-section feedback: a like/dislike and a free-text comment.
//!
//! The two are written independently; setting one never clears the other.

use draftdeck_shared::{Feedback, Result};
use draftdeck_storage::Storage;
use tracing::{info, instrument};

/// Record (or clear, with `None`) the like/dislike on a section.
#[instrument(skip(storage, user_id))]
pub async fn rate_section(
    storage: &Storage,
    user_id: &str,
    section_id: &str,
    liked: Option<bool>,
) -> Result<Feedback> {
    let feedback = storage
        .set_feedback_rating(user_id, section_id, liked)
        .await?;
    info!("feedback rating recorded");
    Ok(feedback)
}

/// Record a comment on a section. Blank comments clear it.
#[instrument(skip(storage, user_id, comment))]
pub async fn comment_on_section(
    storage: &Storage,
    user_id: &str,
    section_id: &str,
    comment: Option<&str>,
) -> Result<Feedback> {
    let comment = comment.map(str::trim).filter(|c| !c.is_empty());
    let feedback = storage
        .set_feedback_comment(user_id, section_id, comment)
        .await?;
    info!(cleared = comment.is_none(), "feedback comment recorded");
    Ok(feedback)
}
