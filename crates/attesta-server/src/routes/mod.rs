//! API routes for the Attesta server.

pub mod certificates;
pub mod verify;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::blob::BlobPublisher;
use crate::engine::Engine;
use crate::error::AppError;
use crate::store::{CertificateStore, InstitutionDirectory};

/// Creates the main API router with all routes mounted.
pub fn create_router<S, B>(engine: Engine<S, B>) -> Router
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    Router::new()
        .nest("/api/v1", api_v1_routes(engine))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Creates the v1 API routes.
fn api_v1_routes<S, B>(engine: Engine<S, B>) -> Router
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    Router::new()
        .nest("/certificates", certificates::router(engine.clone()))
        .merge(verify::router(engine))
}

/// The resolved identity of an authenticated caller.
///
/// The engine never parses credentials; the transport hands it a user id
/// already resolved by the identity layer. Here that layer is the
/// `X-User-Id` header set by the fronting gateway — in production this value
/// comes from the verified auth token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Uuid,
}

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .ok_or_else(|| AppError::NotAuthorized("missing X-User-Id header".to_string()))?;
        let user_id = header
            .to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or_else(|| AppError::NotAuthorized("malformed X-User-Id header".to_string()))?;
        Ok(Self { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CallerIdentity, AppError> {
        let (mut parts, _) = request.into_parts();
        CallerIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_user_id_header() {
        let user_id = Uuid::new_v4();
        let request = Request::builder()
            .header("X-User-Id", user_id.to_string())
            .body(())
            .unwrap();
        let caller = extract(request).await.unwrap();
        assert_eq!(caller.user_id, user_id);
    }

    #[tokio::test]
    async fn test_missing_header_is_not_authorized() {
        let request = Request::builder().body(()).unwrap();
        let err = extract(request).await.unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn test_malformed_header_is_not_authorized() {
        let request = Request::builder()
            .header("X-User-Id", "not-a-uuid")
            .body(())
            .unwrap();
        let err = extract(request).await.unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized(_)));
    }
}
