//! Local API router.
//!
//! All routes are nested under `/api/`. Every request passes through the
//! request logger; CORS is open so a browser page served from any local
//! origin can call in.

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router over shared state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/schema/:diagnosis", get(endpoints::schema::describe))
        .route("/form", get(endpoints::form::current))
        .route("/form/start", post(endpoints::form::start))
        .route("/form/field", put(endpoints::form::update_field))
        .route("/form/reset", post(endpoints::form::reset))
        .route("/form/submit", post(endpoints::form::submit))
        .route("/predict/:diagnosis", post(endpoints::predict::run))
        .route(
            "/result",
            get(endpoints::result::fetch).delete(endpoints::result::clear),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(axum::middleware::from_fn(middleware::request_log::log_request))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::core_state::mock_state;
    use crate::models::prediction::sample_result;
    use crate::models::StoredResult;
    use crate::models::DiagnosisType;
    use crate::pipeline::prediction::{MockFailure, MockPredictionClient, PredictionApi};

    fn app_with(client: Arc<dyn PredictionApi>) -> (Router, Arc<CoreState>) {
        let core = Arc::new(mock_state(client));
        (api_router(core.clone()), core)
    }

    fn app() -> (Router, Arc<CoreState>, Arc<MockPredictionClient>) {
        let mock = Arc::new(MockPredictionClient::new(sample_result()));
        let (router, core) = app_with(mock.clone());
        (router, core, mock)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn diabetes_body() -> Value {
        json!({
            "Pregnancies": "2",
            "Glucose": "138",
            "BloodPressure": "78",
            "SkinThickness": "32",
            "Insulin": "120",
            "BMI": "31.2",
            "DiabetesPedigreeFunction": "0.42",
            "Age": 47
        })
    }

    #[tokio::test]
    async fn health_reports_backend_status() {
        let (router, _core, _mock) = app();
        let response = router.oneshot(empty_request(Method::GET, "/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["backend"], "online");
        assert_eq!(json["prediction_in_flight"], false);
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn health_reports_offline_backend() {
        let (router, core) = app_with(Arc::new(MockPredictionClient::failing(MockFailure::Offline)));
        let response = router.oneshot(empty_request(Method::GET, "/api/health")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["backend"], "offline");
        assert_eq!(core.api_status(), crate::models::ApiStatus::Offline);
    }

    #[tokio::test]
    async fn schema_lists_fields() {
        let (router, _core, _mock) = app();
        let response = router
            .oneshot(empty_request(Method::GET, "/api/schema/heart-disease"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["diagnosis"], "heart_disease");
        let fields = json["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 11);
        assert_eq!(fields[1]["name"], "Sex");
        assert_eq!(fields[1]["options"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_schema_is_404() {
        let (router, _core, _mock) = app();
        let response = router
            .oneshot(empty_request(Method::GET, "/api/schema/cancer"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn form_edit_flow() {
        let (router, _core, _mock) = app();

        let response = router
            .clone()
            .oneshot(json_request(Method::POST, "/api/form/start", json!({"diagnosis": "general"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["diagnosis"], "general");

        let response = router
            .clone()
            .oneshot(json_request(
                Method::PUT,
                "/api/form/field",
                json!({"name": "age", "value": "52"}),
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["values"]["age"], "52");
        assert_eq!(json["missing_required"], json!(["gender"]));

        let response = router
            .clone()
            .oneshot(json_request(
                Method::PUT,
                "/api/form/field",
                json!({"name": "Glucose", "value": "1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["field"], "Glucose");

        let response = router
            .clone()
            .oneshot(empty_request(Method::POST, "/api/form/reset"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["values"], json!({}));
        assert_eq!(json["diagnosis"], "general");
    }

    #[tokio::test]
    async fn submit_incomplete_form_is_422_without_request() {
        let (router, _core, mock) = app();
        let response = router
            .oneshot(empty_request(Method::POST, "/api/form/submit"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(json["error"]["field"], "Pregnancies");
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn submit_filled_form_returns_display() {
        let (router, core, mock) = app();
        {
            let mut form = core.lock_form().unwrap();
            for (name, value) in diabetes_body().as_object().unwrap() {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                form.on_field_change(name, &text).unwrap();
            }
        }

        let response = router
            .oneshot(empty_request(Method::POST, "/api/form/submit"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["display"]["health_score_percent"], 28);
        assert_eq!(json["display"]["is_high_risk"], true);
        assert_eq!(json["result"]["diagnosis_type"], "diabetes");
        assert_eq!(mock.calls(), 1);
        assert!(core.lock_form().unwrap().raw().is_empty());
    }

    #[tokio::test]
    async fn predict_then_fetch_then_clear() {
        let (router, _core, mock) = app();

        let response = router
            .clone()
            .oneshot(json_request(Method::POST, "/api/predict/diabetes", diabetes_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.payloads()[0].0, DiagnosisType::Diabetes);

        let response = router
            .clone()
            .oneshot(empty_request(Method::GET, "/api/result"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let names: Vec<_> = json["display"]["ranked_factors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["BMI", "Glucose", "Age"]);

        let response = router
            .clone()
            .oneshot(empty_request(Method::DELETE, "/api/result"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(empty_request(Method::GET, "/api/result"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NO_RESULT");
        assert_eq!(json["error"]["redirect"], "/");
    }

    #[tokio::test]
    async fn result_without_prediction_redirects() {
        let (router, _core, _mock) = app();
        let response = router
            .oneshot(empty_request(Method::GET, "/api/result"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stored_result_is_served() {
        let (router, core, _mock) = app();
        core.store_result(&StoredResult::new(DiagnosisType::HeartDisease, sample_result()))
            .unwrap();
        let response = router
            .oneshot(empty_request(Method::GET, "/api/result"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["display"]["diagnosis_type"], "heart_disease");
    }

    #[tokio::test]
    async fn offline_backend_is_503() {
        let (router, _core) = app_with(Arc::new(MockPredictionClient::failing(MockFailure::Offline)));
        let response = router
            .oneshot(json_request(Method::POST, "/api/predict/diabetes", diabetes_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "SYSTEM_OFFLINE");
    }

    #[tokio::test]
    async fn backend_error_is_502_with_message() {
        let (router, _core) = app_with(Arc::new(MockPredictionClient::failing(
            MockFailure::Server {
                status: 400,
                message: "Invalid request. Expected \"features\" key.".into(),
            },
        )));
        let response = router
            .oneshot(json_request(Method::POST, "/api/predict/diabetes", diabetes_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Invalid request. Expected \"features\" key.");
    }

    #[tokio::test]
    async fn concurrent_predict_is_409() {
        let mock = Arc::new(
            MockPredictionClient::new(sample_result()).with_delay(Duration::from_millis(200)),
        );
        let (router, core) = app_with(mock.clone());

        let first = tokio::spawn(
            router
                .clone()
                .oneshot(json_request(Method::POST, "/api/predict/diabetes", diabetes_body())),
        );
        while !core.predictions().is_busy() {
            tokio::task::yield_now().await;
        }

        let response = router
            .oneshot(json_request(Method::POST, "/api/predict/diabetes", diabetes_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn cors_preflight_allowed() {
        let (router, _core, _mock) = app();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/predict/diabetes")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert!(response.status().is_success());
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
