//! services/portal/src/adapters/gateway.rs
//!
//! A thin HTTP client for the Campus360 API gateway. Every service adapter
//! goes through it so that authentication headers, logging and the mapping of
//! HTTP failures onto `PortError` happen in one place.

use bytes::Bytes;
use campus_core::{domain::AccessToken, PortError, PortResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Query parameters in the order they are sent.
pub type Query = Vec<(&'static str, String)>;

/// Appends `key=value` when the value is present.
pub fn push_opt<T: ToString>(query: &mut Query, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}

//=========================================================================================
// The Client
//=========================================================================================

#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Builds one pooled client shared by every adapter.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, token: Option<&AccessToken>, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match token {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        token: Option<&AccessToken>,
        path: &str,
        query: &Query,
    ) -> PortResult<T> {
        let builder = self.request(Method::GET, token, path).query(query);
        let response = self.execute(builder, Method::GET, path).await?;
        decode_json(response, path).await
    }

    pub async fn send_json<B, T>(
        &self,
        method: Method,
        token: Option<&AccessToken>,
        path: &str,
        body: &B,
    ) -> PortResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method.clone(), token, path).json(body);
        let response = self.execute(builder, method, path).await?;
        decode_json(response, path).await
    }

    /// `application/x-www-form-urlencoded` POST, used by the login endpoint.
    pub async fn post_form<T: DeserializeOwned>(&self, path: &str, form: &[(&str, &str)]) -> PortResult<T> {
        let builder = self.request(Method::POST, None, path).form(form);
        let response = self.execute(builder, Method::POST, path).await?;
        decode_json(response, path).await
    }

    /// DELETE whose response body, if any, is ignored.
    pub async fn delete(&self, token: Option<&AccessToken>, path: &str, query: &Query) -> PortResult<()> {
        let builder = self.request(Method::DELETE, token, path).query(query);
        self.execute(builder, Method::DELETE, path).await?;
        Ok(())
    }

    /// Raw body, used for QR images.
    pub async fn get_bytes(&self, token: Option<&AccessToken>, path: &str) -> PortResult<Bytes> {
        let builder = self.request(Method::GET, token, path);
        let response = self.execute(builder, Method::GET, path).await?;
        response
            .bytes()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))
    }

    async fn execute(&self, builder: RequestBuilder, method: Method, path: &str) -> PortResult<Response> {
        let response = builder.send().await.map_err(|e| {
            warn!(method = %method, path = %path, error = %e, "gateway_request_failed");
            PortError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        debug!(method = %method, path = %path, status = status.as_u16(), "gateway_response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(method = %method, path = %path, status = status.as_u16(), "gateway_error_status");
        Err(error_for_status(status, &body))
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response, path: &str) -> PortResult<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| PortError::Unavailable(e.to_string()))?;
    // Some endpoints answer 204 or an empty 200 where a JSON null is meant.
    let body: &[u8] = if body.is_empty() { b"null" } else { &body };
    serde_json::from_slice(body).map_err(|e| PortError::InvalidResponse(format!("{path}: {e}")))
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a non-success status onto the port error taxonomy.
pub fn error_for_status(status: StatusCode, body: &str) -> PortError {
    match status {
        StatusCode::UNAUTHORIZED => PortError::Unauthorized,
        StatusCode::FORBIDDEN => PortError::Forbidden,
        StatusCode::NOT_FOUND => PortError::NotFound(extract_detail(status, body)),
        s if s.is_client_error() => PortError::Rejected {
            status: s.as_u16(),
            detail: extract_detail(status, body),
        },
        s => PortError::Unavailable(format!("{} {}", s.as_u16(), extract_detail(status, body))),
    }
}

/// The backend services answer errors as `{"detail": "..."}`, or for request
/// validation failures `{"detail": [{"msg": "..."}]}`.
fn extract_detail(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(alias = "message", alias = "error")]
        detail: serde_json::Value,
    }

    let from_json = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| match parsed.detail {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Array(items) => {
                let messages: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()).map(str::to_string))
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            _ => None,
        });

    from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string())
}

//=========================================================================================
// Listing Shapes
//=========================================================================================

/// Collections arrive either as a bare array or wrapped in a page object.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Plain(Vec<T>),
    Page {
        #[serde(alias = "data", alias = "results", alias = "recursos", alias = "reservas", alias = "tickets")]
        items: Vec<T>,
    },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Plain(items) | Listing::Page { items } => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_dedicated_variants() {
        assert!(matches!(error_for_status(StatusCode::UNAUTHORIZED, ""), PortError::Unauthorized));
        assert!(matches!(error_for_status(StatusCode::FORBIDDEN, ""), PortError::Forbidden));
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, r#"{"detail":"Location not found"}"#),
            PortError::NotFound(ref d) if d == "Location not found"
        ));
    }

    #[test]
    fn client_errors_keep_the_service_detail() {
        let err = error_for_status(StatusCode::CONFLICT, r#"{"detail":"Horario ocupado"}"#);
        assert!(matches!(
            err,
            PortError::Rejected { status: 409, ref detail } if detail == "Horario ocupado"
        ));
    }

    #[test]
    fn validation_detail_lists_are_joined() {
        let body = r#"{"detail":[{"loc":["body","fecha"],"msg":"field required"},{"msg":"bad time"}]}"#;
        let err = error_for_status(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert!(matches!(
            err,
            PortError::Rejected { status: 422, ref detail } if detail == "field required; bad time"
        ));
    }

    #[test]
    fn server_errors_are_unavailable() {
        let err = error_for_status(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, PortError::Unavailable(ref m) if m.contains("502")));
    }

    #[test]
    fn plain_text_bodies_are_used_when_short() {
        let err = error_for_status(StatusCode::BAD_REQUEST, "missing usuario_id");
        assert!(matches!(err, PortError::Rejected { ref detail, .. } if detail == "missing usuario_id"));

        let err = error_for_status(StatusCode::BAD_REQUEST, "");
        assert!(matches!(err, PortError::Rejected { ref detail, .. } if detail == "Bad Request"));
    }

    #[test]
    fn listings_accept_both_shapes() {
        let plain: Listing<u32> = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(plain.into_vec(), vec![1, 2]);

        let page: Listing<u32> = serde_json::from_str(r#"{"items":[3],"total":1}"#).unwrap();
        assert_eq!(page.into_vec(), vec![3]);

        let aliased: Listing<u32> = serde_json::from_str(r#"{"recursos":[4],"page":1}"#).unwrap();
        assert_eq!(aliased.into_vec(), vec![4]);
    }

    #[test]
    fn optional_query_values_are_skipped() {
        let mut query = Query::new();
        push_opt(&mut query, "limit", Some(10));
        push_opt::<String>(&mut query, "role", None);
        assert_eq!(query, vec![("limit", "10".to_string())]);
    }
}
