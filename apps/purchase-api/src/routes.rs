//! # HTTP Routes
//!
//! ```text
//! GET  /                                   banner
//! GET  /healthz                            {"status": "ok"} or 500
//! POST /api/v1/purchase                    create           → 201
//! GET  /api/v1/purchase?page&limit         list             → 200
//! GET  /api/v1/purchase/{purchase_id}      get              → 200
//! POST /api/v1/purchase/{purchase_id}      payment proof    → 201
//! ```
//!
//! Handlers only translate between the wire and [`PurchaseService`];
//! every rule lives in the service.
//!
//! [`PurchaseService`]: crate::services::PurchaseService

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use lapak_core::dto::{
    CreatePurchaseRequest, MessageResponse, PaymentProofRequest, PurchaseDetailResponse,
    PurchaseListResponse, PurchaseResponse,
};
use lapak_core::PageRequest;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/healthz", get(healthz))
        .route(
            "/api/v1/purchase",
            get(list_purchases).post(create_purchase),
        )
        .route(
            "/api/v1/purchase/{purchase_id}",
            get(get_purchase).post(upload_payment_proof),
        )
        .with_state(state)
}

async fn banner() -> Json<MessageResponse> {
    Json(MessageResponse::new("Purchase service is running"))
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        warn!("Health check failed: database unreachable");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "unavailable" })),
        )
    }
}

async fn create_purchase(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    body: Result<Json<CreatePurchaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PurchaseResponse>), ApiError> {
    let Json(request) = body.map_err(reject_body)?;
    let response = state.purchases.create_purchase(&auth, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn upload_payment_proof(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(purchase_id): Path<String>,
    body: Result<Json<PaymentProofRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(request) = body.map_err(reject_body)?;
    let message = state
        .purchases
        .upload_payment_proof(&auth, &purchase_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn get_purchase(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(purchase_id): Path<String>,
) -> Result<Json<PurchaseDetailResponse>, ApiError> {
    Ok(Json(state.purchases.get_purchase(&auth, &purchase_id).await?))
}

/// Raw paging parameters. Unparseable values fall back to the defaults
/// instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListParams {
    page: Option<String>,
    limit: Option<String>,
}

impl ListParams {
    fn page_request(&self) -> PageRequest {
        let number =
            |raw: &Option<String>| raw.as_deref().and_then(|v| v.trim().parse::<i64>().ok());
        PageRequest::clamped(number(&self.page), number(&self.limit))
    }
}

async fn list_purchases(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(params): Query<ListParams>,
) -> Result<Json<PurchaseListResponse>, ApiError> {
    Ok(Json(
        state
            .purchases
            .list_purchases(&auth, params.page_request())
            .await?,
    ))
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::auth::GatewayTrust;
    use crate::testing::harness;

    const SECRET: &str = "route-secret";

    async fn app() -> Router {
        let h = harness().await;
        router(Arc::new(AppState {
            db: h.db,
            purchases: h.service,
            trust: Arc::new(GatewayTrust::new(SECRET, "backend-infra")),
        }))
    }

    fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-secret", SECRET)
            .header("x-auth-gateway", "backend-infra");
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn create_body() -> Value {
        json!({
            "purchasedItems": [
                { "productId": "A", "qty": 2 },
                { "productId": "B", "qty": 1 }
            ],
            "senderName": "Budi Santoso",
            "senderContactType": "phone",
            "senderContactDetail": "081234567890"
        })
    }

    #[tokio::test]
    async fn test_banner_and_health() {
        let app = app().await;

        let (status, _) = send(&app, request("GET", "/", None, None)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, request("GET", "/healthz", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let app = app().await;

        let (status, created) = send(
            &app,
            request("POST", "/api/v1/purchase", Some("u-1"), Some(create_body())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["totalPrice"], 25.0);
        assert_eq!(created["paymentDetails"][0]["bankAccountName"], "BCA");
        assert_eq!(created["paymentDetails"][1]["totalPrice"], 20.0);

        let id = created["purchaseId"].as_str().unwrap();
        let (status, detail) = send(
            &app,
            request("GET", &format!("/api/v1/purchase/{id}"), Some("u-1"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["purchaseId"], id);
        assert_eq!(detail["senderInfo"]["senderContactType"], "phone");
        assert_eq!(detail["paymentDetails"], created["paymentDetails"]);
    }

    #[tokio::test]
    async fn test_upload_proof_and_forbidden() {
        let app = app().await;
        let (_, created) = send(
            &app,
            request("POST", "/api/v1/purchase", Some("u-1"), Some(create_body())),
        )
        .await;
        let uri = format!("/api/v1/purchase/{}", created["purchaseId"].as_str().unwrap());

        let (status, body) = send(
            &app,
            request("POST", &uri, Some("u-1"), Some(json!({ "fileIds": ["f-1"] }))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Payment proof uploaded successfully");

        let (status, body) = send(
            &app,
            request("POST", &uri, Some("u-2"), Some(json!({ "fileIds": ["f-2"] }))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Access denied");

        let (status, _) = send(&app, request("GET", &uri, Some("u-2"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_with_lenient_paging() {
        let app = app().await;
        for _ in 0..2 {
            send(
                &app,
                request("POST", "/api/v1/purchase", Some("u-1"), Some(create_body())),
            )
            .await;
        }

        let (status, body) = send(
            &app,
            request("GET", "/api/v1/purchase?page=abc&limit=500", Some("u-1"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 100);
        assert_eq!(body["total"], 2);
        assert_eq!(body["purchases"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app().await;

        let (status, body) = send(
            &app,
            request("GET", "/api/v1/purchase/not-a-uuid", Some("u-1"), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Purchase not found");

        let (status, _) = send(&app, request("GET", "/api/v1/purchase", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/v1/purchase",
                Some("u-1"),
                Some(json!({ "purchasedItems": [] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["details"]["purchasedItems"].is_string());

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/v1/purchase",
                Some("u-1"),
                Some(json!({
                    "purchasedItems": [{ "productId": "missing", "qty": 1 }],
                    "senderName": "Budi Santoso",
                    "senderContactType": "email",
                    "senderContactDetail": "budi@example.com"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_untrusted_request_is_rejected() {
        let app = app().await;
        let request = Request::builder()
            .uri("/api/v1/purchase")
            .header("x-secret", "wrong")
            .header("x-auth-gateway", "backend-infra")
            .header("x-user-id", "u-1")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let app = app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/purchase")
            .header("x-secret", SECRET)
            .header("x-auth-gateway", "backend-infra")
            .header("x-user-id", "u-1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{oops"))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
