//! Outline proposal: topic and document kind in, ordered titles out.

use draftdeck_gateway::{TextGenerator, parse_outline, prompts};
use draftdeck_shared::{DocumentKind, Result};
use tracing::{info, instrument};

use crate::require_text;

/// Ask the model for section or slide titles. Nothing is persisted.
#[instrument(skip_all, fields(kind = %kind))]
pub async fn generate_outline<G: TextGenerator>(
    generator: &G,
    topic: &str,
    kind: DocumentKind,
) -> Result<Vec<String>> {
    let topic = require_text(topic, "topic")?;
    let reply = generator
        .complete(&prompts::outline_request(topic, kind))
        .await?;
    let titles = parse_outline(&reply)?;
    info!(titles = titles.len(), "outline generated");
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGenerator;
    use draftdeck_shared::DraftDeckError;

    #[tokio::test]
    async fn returns_parsed_titles() {
        let fake = FakeGenerator::replying([r#"["Intro", "Market", "Outlook"]"#]);
        let titles = generate_outline(&fake, "EV market analysis", DocumentKind::Docx)
            .await
            .unwrap();
        assert_eq!(titles, vec!["Intro", "Market", "Outlook"]);

        let requests = fake.requests.lock().unwrap();
        assert!(requests[0].user.contains("EV market analysis"));
    }

    #[tokio::test]
    async fn empty_topic_never_reaches_the_model() {
        let fake = FakeGenerator::default();
        let err = generate_outline(&fake, "   ", DocumentKind::Pptx)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftDeckError::Validation { .. }));
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn upstream_error_surfaces() {
        let fake = FakeGenerator::default();
        fake.push_err("rate limit exceeded");
        let err = generate_outline(&fake, "EVs", DocumentKind::Docx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate limit exceeded"));
    }

    #[tokio::test]
    async fn unusable_reply_is_an_error() {
        let fake = FakeGenerator::replying(["[]"]);
        let err = generate_outline(&fake, "EVs", DocumentKind::Docx)
            .await
            .unwrap_err();
        assert!(matches!(err, DraftDeckError::Gateway(_)));
    }
}
