//! Prediction wrapper and service integration tests.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use common::*;
use model_loader::config::{EnvConfig, PreprocessorKind};
use model_loader::engine::{IntentPredictor, MAX_TEXT_BYTES};
use model_loader::models::{
    scratch_provider, KeywordModelDeserializer, LoaderOptions, LoaderParts, MetadataValue,
    ModelCache, ModelHandle, StreamingLoader,
};
use model_loader::telemetry::LogConfig;
use model_loader::ModelService;

fn predictor_for(name: &str, model: ModelHandle) -> IntentPredictor {
    let loader = loader(
        Arc::new(MapStorage::new().with_model(None, name)),
        Arc::new(StubTransport::new().with_body(name, b"{}".to_vec())),
        scratch_provider(true, None),
        Arc::new(RecordingDeserializer::new(model)),
    );
    IntentPredictor::new(Arc::new(loader), name)
}

fn env_config(base_model_name: &str) -> EnvConfig {
    EnvConfig {
        base_model_name: base_model_name.to_string(),
        memory_only: true,
        scratch_dir: None,
        storage_manifest: "models.toml".into(),
        http_timeout: Duration::from_secs(5),
        loader: LoaderOptions::default(),
        preprocessor: PreprocessorKind::StopWords,
        log: LogConfig::default(),
    }
}

fn keyword_service(base_model_name: &str) -> ModelService {
    let parts = LoaderParts {
        cache: Arc::new(ModelCache::new()),
        storage: Arc::new(MapStorage::new().with_model(Some("base_model"), base_model_name)),
        transport: Arc::new(StubTransport::new().with_body(base_model_name, keyword_model_json())),
        scratch: scratch_provider(true, None),
        deserializer: Arc::new(KeywordModelDeserializer),
    };
    ModelService::with_parts(parts, &env_config(base_model_name))
}

#[tokio::test]
async fn test_intent_without_probabilities() {
    let predictor =
        predictor_for("greet.mlmodel", Arc::new(FixedOutputModel(json!({"intent": "greeting"}))));

    let result = predictor.predict("hello there", None).await;

    assert!(result.success);
    assert_eq!(result.intent.as_deref(), Some("greeting"));
    assert!(result.probabilities.is_empty());
    assert!(result.errors.is_empty());
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"success": true, "intent": "greeting", "probabilities": {}, "errors": []})
    );
}

#[tokio::test]
async fn test_model_without_predictor_is_unsupported() {
    let predictor = predictor_for("bare.mlmodel", Arc::new(BareModel));

    let result = predictor.predict("hello", None).await;

    assert!(!result.success);
    assert!(result.intent.is_none());
    assert_eq!(result.errors, vec!["Unsupported model type - no predict method"]);
}

#[tokio::test]
async fn test_load_failure_is_propagated() {
    let predictor = predictor_for("greet.mlmodel", Arc::new(BareModel));

    let result = predictor.predict("hello", Some("unknown.mlmodel")).await;

    assert!(!result.success);
    assert_eq!(result.errors, vec!["Could not get download URL for model unknown.mlmodel"]);
}

#[tokio::test]
async fn test_lowercase_fallback_without_preprocessor() {
    let predictor = predictor_for("echo.mlmodel", Arc::new(EchoModel));

    let result = predictor.predict("Hello WORLD", None).await;

    assert_eq!(result.intent.as_deref(), Some("hello world"));
}

#[tokio::test]
async fn test_oversized_text_is_rejected() {
    let predictor = predictor_for("echo.mlmodel", Arc::new(EchoModel));
    let text = "a".repeat(MAX_TEXT_BYTES + 1);

    let result = predictor.predict(&text, None).await;

    assert!(!result.success);
    assert!(result.errors[0].starts_with("Error making prediction:"));
}

#[tokio::test]
async fn test_output_without_intent_fails() {
    let predictor =
        predictor_for("odd.mlmodel", Arc::new(FixedOutputModel(json!({"label": "greeting"}))));

    let result = predictor.predict("hello", None).await;

    assert!(!result.success);
    assert_eq!(result.errors, vec!["Prediction output contained no intent"]);
}

#[tokio::test]
async fn test_service_predicts_with_keyword_model() {
    let service = keyword_service("model_1.0.0.mlmodel");

    let result = service.predict("Hello there, good morning!", None).await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.intent.as_deref(), Some("greeting"));
    assert_eq!(result.probabilities.len(), 2);
    let total: f64 = result.probabilities.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(result.probabilities["greeting"] > result.probabilities["farewell"]);

    let farewell = service.predict("ok bye, see you later", None).await;
    assert_eq!(farewell.intent.as_deref(), Some("farewell"));
    assert!(service.loader().cache().contains("model_1.0.0.mlmodel"));
}

#[tokio::test]
async fn test_validate_base_model_does_not_cache() {
    let service = keyword_service("model_1.0.0.mlmodel");

    let result = service.validate_base_model().await;

    assert!(result.success);
    assert!(result.model.is_none());
    assert!(matches!(result.metadata.get("file_size"), Some(MetadataValue::Number(n)) if *n > 0));
    assert!(service.loader().cache().is_empty());
}

#[tokio::test]
async fn test_service_load_defaults_to_base_model() {
    let service = keyword_service("model_1.0.0.mlmodel");
    assert_eq!(service.base_model_name(), "model_1.0.0.mlmodel");

    let result = service.load(None, false).await;

    assert!(result.success);
    assert_eq!(result.metadata["version"].as_str(), Some("2.1.0"));
    let cached = service.load(Some("model_1.0.0.mlmodel"), false).await;
    assert!(cached.from_cache);
}

#[tokio::test]
async fn test_shared_cache_across_loaders() {
    let cache = Arc::new(ModelCache::new());
    let make = |cache: Arc<ModelCache>| {
        StreamingLoader::new(
            LoaderParts {
                cache,
                storage: Arc::new(MapStorage::new().with_model(None, "intent.mlmodel")),
                transport: Arc::new(
                    StubTransport::new().with_body("intent.mlmodel", keyword_model_json()),
                ),
                scratch: scratch_provider(true, None),
                deserializer: Arc::new(KeywordModelDeserializer),
            },
            LoaderOptions::default(),
        )
    };
    let first = make(cache.clone());
    let second = make(cache.clone());

    assert!(first.load("intent.mlmodel", false).await.success);
    let result = second.load("intent.mlmodel", false).await;

    assert!(result.from_cache);
}
