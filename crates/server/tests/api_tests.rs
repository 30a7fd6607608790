//! Integration tests for the server API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use iris_core::{
    forest::ForestParams,
    health::{components, HealthRegistry, UNHEALTHY_AFTER_FAULTS},
    observability::{ServiceMetrics, StructuredLogger},
    ClassificationResult, Classifier, ClassifierError, FeatureVector, ModelStore,
    PredictionService, Trainer, TrainerConfig,
};
use iris_server::api::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn trained_store() -> ModelStore {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flower_model.json");
    let config = TrainerConfig {
        artifact_path: path.clone(),
        forest: ForestParams {
            n_trees: 25,
            ..ForestParams::default()
        },
        ..TrainerConfig::default()
    };
    Trainer::new(config).run().unwrap();
    ModelStore::load(&path)
}

/// A loaded model whose every inference fails
struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn classify(&self, _: &FeatureVector) -> Result<ClassificationResult, ClassifierError> {
        Err(ClassifierError::EmptyModel)
    }

    fn model_version(&self) -> &str {
        "broken"
    }
}

async fn setup_test_app(store: ModelStore) -> Router {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_STORE).await;
    health_registry.register(components::PREDICTION_SERVICE).await;
    health_registry.set_model_loaded(store.is_loaded()).await;
    health_registry.set_ready(true).await;

    let metrics = ServiceMetrics::new();
    let service = Arc::new(PredictionService::new(
        Arc::new(store),
        metrics.clone(),
        StructuredLogger::new("api-test"),
    ));
    create_router(Arc::new(AppState::new(service, health_registry, metrics)))
}

fn predict_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_predict_returns_setosa() {
    let app = setup_test_app(trained_store()).await;
    let body = json!({
        "sepal_length": 5.1,
        "sepal_width": 3.5,
        "petal_length": 1.4,
        "petal_width": 0.2
    });

    let response = app
        .oneshot(predict_request(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["prediction"], "Setosa");
    assert!(json["description"].as_str().unwrap().contains("Iris Setosa"));

    let probabilities = json["probabilities"].as_object().unwrap();
    assert_eq!(probabilities.len(), 3);
    let total: f64 = probabilities.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((total - 100.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_predict_accepts_numeric_strings() {
    let app = setup_test_app(trained_store()).await;
    let body = json!({
        "sepal_length": "6.2",
        "sepal_width": "2.9",
        "petal_length": "4.3",
        "petal_width": "1.3"
    });

    let response = app
        .oneshot(predict_request(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["prediction"], "Versicolor");
}

#[tokio::test]
async fn test_predict_out_of_range_returns_400() {
    let app = setup_test_app(trained_store()).await;
    let body = json!({
        "sepal_length": 1.0,
        "sepal_width": 3.0,
        "petal_length": 1.4,
        "petal_width": 0.2
    });

    let response = app
        .oneshot(predict_request(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Sepal length must be between 4.0 and 8.0 cm"})
    );
}

#[tokio::test]
async fn test_predict_missing_field_returns_400() {
    let app = setup_test_app(trained_store()).await;
    let body = json!({"sepal_length": 5.1, "sepal_width": 3.5});

    let response = app
        .oneshot(predict_request(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Invalid input. Please enter valid numbers."
    );
}

#[tokio::test]
async fn test_predict_malformed_json_returns_400() {
    let app = setup_test_app(trained_store()).await;

    let response = app.oneshot(predict_request("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Invalid input. Please enter valid numbers."
    );
}

#[tokio::test]
async fn test_predict_without_model_returns_500() {
    let app = setup_test_app(ModelStore::empty()).await;
    let body = json!({
        "sepal_length": 5.1,
        "sepal_width": 3.5,
        "petal_length": 1.4,
        "petal_width": 0.2
    });

    let response = app
        .oneshot(predict_request(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["error"],
        "Model not loaded. Please train the model first."
    );
}

#[tokio::test]
async fn test_health_reports_model_loaded() {
    let app = setup_test_app(trained_store()).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["model_loaded"], true);
    assert!(json["components"][components::MODEL_STORE].is_object());
}

#[tokio::test]
async fn test_health_reports_missing_model() {
    let app = setup_test_app(ModelStore::empty()).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["model_loaded"], false);
}

#[tokio::test]
async fn test_readyz_returns_503_without_model() {
    let app = setup_test_app(ModelStore::empty()).await;

    let response = app
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_with_model() {
    let app = setup_test_app(trained_store()).await;

    let response = app
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let app = setup_test_app(trained_store()).await;
    let body = json!({
        "sepal_length": 7.7,
        "sepal_width": 3.0,
        "petal_length": 6.1,
        "petal_width": 2.3
    });
    let response = app
        .clone()
        .oneshot(predict_request(body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();
    assert!(body_str.contains("iris_predictions_total"));
    assert!(body_str.contains("iris_prediction_latency_seconds_bucket"));
}

#[tokio::test]
async fn test_inference_fault_degrades_prediction_service() {
    let app = setup_test_app(ModelStore::from_classifier(Arc::new(BrokenClassifier))).await;
    let body = json!({
        "sepal_length": 5.1,
        "sepal_width": 3.5,
        "petal_length": 1.4,
        "petal_width": 0.2
    });

    let response = app
        .clone()
        .oneshot(predict_request(body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["error"],
        "An error occurred during prediction"
    );

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["model_loaded"], true);
    assert_eq!(
        json["components"][components::PREDICTION_SERVICE]["status"],
        "degraded"
    );
}

#[tokio::test]
async fn test_repeated_inference_faults_fail_health_and_readiness() {
    let app = setup_test_app(ModelStore::from_classifier(Arc::new(BrokenClassifier))).await;
    let body = json!({
        "sepal_length": 6.2,
        "sepal_width": 2.9,
        "petal_length": 4.3,
        "petal_width": 1.3
    });

    for _ in 0..UNHEALTHY_AFTER_FAULTS {
        let response = app
            .clone()
            .oneshot(predict_request(body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(response).await;
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(
        json["components"][components::PREDICTION_SERVICE]["status"],
        "unhealthy"
    );

    let response = app
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        json_body(response).await["reason"],
        "Critical component unhealthy"
    );
}

#[tokio::test]
async fn test_validation_errors_leave_prediction_service_healthy() {
    let app = setup_test_app(ModelStore::from_classifier(Arc::new(BrokenClassifier))).await;
    let body = json!({
        "sepal_length": 1.0,
        "sepal_width": 3.0,
        "petal_length": 1.4,
        "petal_width": 0.2
    });

    let response = app
        .clone()
        .oneshot(predict_request(body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(
        json["components"][components::PREDICTION_SERVICE]["status"],
        "healthy"
    );
}
