//! Request routing, authentication and CORS.

use std::sync::Arc;
use std::time::Instant;

use draftdeck_core::{
    GenerateContentRequest, RefineRequest, SilentProgress, feedback, projects,
};
use draftdeck_gateway::TextGenerator;
use draftdeck_shared::{DocumentKind, DraftDeckError, Result, User};
use draftdeck_storage::Storage;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::message::{ApiRequest, ApiResponse, Method};

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutlineBody {
    topic: String,
    document_type: DocumentKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectBody {
    topic: String,
    document_type: DocumentKind,
    #[serde(default)]
    sections: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AddSectionBody {
    title: String,
}

#[derive(Debug, Deserialize)]
struct UpdateSectionBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingBody {
    liked: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct CommentBody {
    comment: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatches API requests on behalf of the authenticated user.
pub struct Router<G> {
    storage: Arc<Storage>,
    generator: G,
    allowed_origin: String,
}

impl<G: TextGenerator> Router<G> {
    pub fn new(storage: Arc<Storage>, generator: G, allowed_origin: impl Into<String>) -> Self {
        Self {
            storage,
            generator,
            allowed_origin: allowed_origin.into(),
        }
    }

    /// Handle one request. Never fails: errors become `{error}` responses.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let start = Instant::now();
        let response = if request.method == Method::Options {
            ApiResponse::new(204)
        } else {
            match self.route(&request).await {
                Ok(response) => response,
                Err(e) => {
                    match &e {
                        DraftDeckError::Validation { .. }
                        | DraftDeckError::Unauthorized(_)
                        | DraftDeckError::NotFound { .. } => {
                            debug!(error = %e, "request rejected");
                        }
                        _ => error!(error = %e, method = %request.method, path = %request.path, "request failed"),
                    }
                    ApiResponse::from_error(&e)
                }
            }
        };

        info!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "request handled"
        );
        self.with_cors(response)
    }

    pub(crate) fn with_cors(&self, response: ApiResponse) -> ApiResponse {
        response
            .with_header("Access-Control-Allow-Origin", self.allowed_origin.as_str())
            .with_header("Access-Control-Allow-Headers", ALLOW_HEADERS)
            .with_header("Access-Control-Allow-Methods", ALLOW_METHODS)
    }

    async fn authenticate(&self, request: &ApiRequest) -> Result<User> {
        let token = request
            .bearer_token()
            .ok_or_else(|| DraftDeckError::Unauthorized("missing bearer token".into()))?;
        self.storage
            .user_by_token(token)
            .await?
            .ok_or_else(|| DraftDeckError::Unauthorized("unknown token".into()))
    }

    async fn route(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let path = request.path.split('?').next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if request.method == Method::Get && segments == ["health"] {
            return Ok(ApiResponse::json(200, &json!({ "status": "ok" })));
        }

        let user = self.authenticate(request).await?;
        let user_id = user.id.as_str();
        let storage = self.storage.as_ref();

        match (&request.method, segments.as_slice()) {
            // Generation
            (Method::Post, ["generate-outline"]) => {
                let body: OutlineBody = parse_body(request)?;
                let outline = draftdeck_core::generate_outline(
                    &self.generator,
                    &body.topic,
                    body.document_type,
                )
                .await?;
                Ok(ApiResponse::json(200, &json!({ "outline": outline })))
            }
            (Method::Post, ["generate-content"]) => {
                let body: GenerateContentRequest = parse_body(request)?;
                draftdeck_core::generate_content(
                    storage,
                    &self.generator,
                    user_id,
                    &body,
                    &SilentProgress,
                )
                .await?;
                Ok(ApiResponse::json(200, &json!({ "success": true })))
            }
            (Method::Post, ["refine-content"]) => {
                let body: RefineRequest = parse_body(request)?;
                let content =
                    draftdeck_core::refine_section(storage, &self.generator, user_id, &body)
                        .await?;
                Ok(ApiResponse::json(
                    200,
                    &json!({ "success": true, "content": content }),
                ))
            }

            // Projects
            (Method::Get, ["projects"]) => {
                let list = projects::list_projects(storage, user_id).await?;
                Ok(ApiResponse::json(200, &list))
            }
            (Method::Post, ["projects"]) => {
                let body: CreateProjectBody = parse_body(request)?;
                let created = projects::create_project(
                    storage,
                    user_id,
                    body.document_type,
                    &body.topic,
                    &body.sections,
                )
                .await?;
                Ok(ApiResponse::json(201, &created))
            }
            (Method::Get, ["projects", id]) => {
                let project = projects::get_project(storage, user_id, id).await?;
                Ok(ApiResponse::json(200, &project))
            }
            (Method::Delete, ["projects", id]) => {
                projects::delete_project(storage, user_id, id).await?;
                Ok(ApiResponse::new(204))
            }
            (Method::Post, ["projects", id, "sections"]) => {
                let body: AddSectionBody = parse_body(request)?;
                let section = projects::add_section(storage, user_id, id, &body.title).await?;
                Ok(ApiResponse::json(201, &section))
            }
            (Method::Get, ["projects", id, "export"]) => {
                let file = projects::export_project(storage, user_id, id).await?;
                Ok(ApiResponse::new(200)
                    .with_header("Content-Type", file.mime_type)
                    .with_header(
                        "Content-Disposition",
                        format!("attachment; filename=\"{}\"", file.file_name),
                    )
                    .with_body(file.bytes))
            }

            // Sections
            (Method::Put, ["sections", id]) => {
                let body: UpdateSectionBody = parse_body(request)?;
                let section = projects::update_section(
                    storage,
                    user_id,
                    id,
                    body.title.as_deref(),
                    body.content.as_deref(),
                )
                .await?;
                Ok(ApiResponse::json(200, &section))
            }
            (Method::Delete, ["sections", id]) => {
                projects::delete_section(storage, user_id, id).await?;
                Ok(ApiResponse::new(204))
            }
            (Method::Get, ["sections", id, "history"]) => {
                let history = storage.list_refinements(user_id, id).await?;
                Ok(ApiResponse::json(200, &history))
            }
            (Method::Get, ["sections", id, "feedback"]) => {
                let feedback = storage
                    .get_feedback(user_id, id)
                    .await?
                    .ok_or_else(|| DraftDeckError::not_found("feedback", *id))?;
                Ok(ApiResponse::json(200, &feedback))
            }
            (Method::Put, ["sections", id, "feedback"]) => {
                let body: RatingBody = parse_body(request)?;
                let feedback = feedback::rate_section(storage, user_id, id, body.liked).await?;
                Ok(ApiResponse::json(200, &feedback))
            }
            (Method::Put, ["sections", id, "comment"]) => {
                let body: CommentBody = parse_body(request)?;
                let feedback =
                    feedback::comment_on_section(storage, user_id, id, body.comment.as_deref())
                        .await?;
                Ok(ApiResponse::json(200, &feedback))
            }

            _ => {
                warn!(method = %request.method, path, "no route");
                Ok(ApiResponse::error(404, "route not found"))
            }
        }
    }
}

fn parse_body<T: DeserializeOwned>(request: &ApiRequest) -> Result<T> {
    serde_json::from_slice(&request.body)
        .map_err(|e| DraftDeckError::validation(format!("invalid request body: {e}")))
}
