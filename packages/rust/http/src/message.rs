//! Transport-independent request and response values.

use std::fmt;

use draftdeck_shared::DraftDeckError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Other(String),
}

impl Method {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
            Self::Put => f.write_str("PUT"),
            Self::Delete => f.write_str("DELETE"),
            Self::Options => f.write_str("OPTIONS"),
            Self::Other(m) => f.write_str(m),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Request target; a query string, if any, is ignored by routing.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {token}"))
    }

    pub fn with_json(mut self, body: &serde_json::Value) -> Self {
        self.body = body.to_string().into_bytes();
        self.with_header("Content-Type", "application/json")
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Token from an `Authorization: Bearer ...` header.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.header("authorization")?.trim();
        let (scheme, token) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status)
                .with_header("Content-Type", "application/json")
                .with_body(body),
            Err(e) => {
                error!(error = %e, "failed to encode response body");
                Self::error(500, "failed to encode response")
            }
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(body.into_bytes())
    }

    /// Status code and `{error}` body for a failed operation.
    pub fn from_error(err: &DraftDeckError) -> Self {
        let status = match err {
            DraftDeckError::Validation { .. } => 400,
            DraftDeckError::Unauthorized(_) => 401,
            DraftDeckError::NotFound { .. } => 404,
            _ => 500,
        };
        Self::error(status, &err.to_string())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON, `Null` when it is not JSON.
    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parsing() {
        let req = ApiRequest::new(Method::Get, "/").with_header("authorization", "bearer  abc ");
        assert_eq!(req.bearer_token(), Some("abc"));

        let req = ApiRequest::new(Method::Get, "/").with_header("Authorization", "Basic abc");
        assert_eq!(req.bearer_token(), None);

        let req = ApiRequest::new(Method::Get, "/").with_header("Authorization", "Bearer ");
        assert_eq!(req.bearer_token(), None);

        assert_eq!(ApiRequest::new(Method::Get, "/").bearer_token(), None);
    }

    #[test]
    fn error_status_mapping() {
        let cases = [
            (DraftDeckError::validation("empty topic"), 400),
            (DraftDeckError::Unauthorized("no token".into()), 401),
            (DraftDeckError::not_found("project", "p1"), 404),
            (DraftDeckError::Gateway("rate limit exceeded".into()), 500),
            (DraftDeckError::Storage("disk full".into()), 500),
        ];
        for (err, status) in cases {
            let resp = ApiResponse::from_error(&err);
            assert_eq!(resp.status, status);
            assert_eq!(resp.json_body()["error"], err.to_string());
        }
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(Method::parse("get"), Method::Get);
        assert_eq!(Method::parse("PATCH"), Method::Other("PATCH".into()));
        assert_eq!(Method::Options.to_string(), "OPTIONS");
    }
}
