use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

use notex_core::{PipelineError, SearchPipeline, SearchRequest};
use notex_dict::{detect_variants, VariantDecision};
use notex_model::{CompletionProvider, EmbeddingProvider};
use notex_storage::StorageManager;

#[derive(Deserialize)]
struct ApiSearchRequest {
    #[serde(flatten)]
    request: SearchRequest,
    #[serde(default)]
    evaluation_mode: bool,
}

#[derive(Deserialize)]
struct AddEntryRequest {
    canonical: String,
    #[serde(default)]
    variants: Vec<String>,
    category: Option<String>,
    note: Option<String>,
}

#[derive(Deserialize)]
struct UpdateEntryRequest {
    variants: Option<Vec<String>>,
    category: Option<String>,
    note: Option<String>,
}

#[derive(Deserialize)]
struct AddVariantRequest {
    variant: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

#[derive(Deserialize)]
struct SimilarQuery {
    term: String,
    threshold: Option<f32>,
    top_k: Option<usize>,
}

#[derive(Deserialize)]
struct FormatQuery {
    format: Option<String>,
}

#[derive(Deserialize)]
struct DetectRequest {
    terms: Vec<String>,
    threshold: Option<f32>,
}

#[derive(Deserialize)]
struct ApplyRequest {
    decisions: Vec<VariantDecision>,
}

#[derive(Deserialize)]
struct IngestRequest {
    source_dir: Option<String>,
}

/// Shared service instances behind the HTTP handlers.
pub struct AppState {
    pub pipeline: SearchPipeline,
    pub storage: Arc<StorageManager>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn CompletionProvider>,
    /// Default folder scanned by `/ingest` when the request names none.
    pub notes_dir: PathBuf,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(routes)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/search", web::post().to(run_search))
        .route("/dictionary", web::get().to(list_entries))
        .route("/dictionary/search", web::get().to(search_entries))
        .route("/dictionary/similar", web::get().to(similar_terms))
        .route("/dictionary/entries", web::post().to(add_entry))
        .route("/dictionary/entries/{canonical}", web::put().to(update_entry))
        .route("/dictionary/entries/{canonical}", web::delete().to(delete_entry))
        .route("/dictionary/entries/{canonical}/variants", web::post().to(add_variant))
        .route("/dictionary/export", web::get().to(export_dictionary))
        .route("/dictionary/import", web::post().to(import_dictionary))
        .route("/dictionary/detect", web::post().to(detect_dictionary_variants))
        .route("/dictionary/apply", web::post().to(apply_variant_decisions))
        .route("/ingest", web::post().to(ingest));
}

async fn run_search(
    state: web::Data<Arc<AppState>>,
    req: web::Json<ApiSearchRequest>,
) -> ActixResult<HttpResponse> {
    match state.pipeline.run(&req.request, req.evaluation_mode).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(outcome)),
        Err(PipelineError::InvalidRequest(reason)) => {
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": reason
            })))
        }
        Err(e) => {
            error!(error = %e, "search request failed");
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string()
            })))
        }
    }
}

async fn list_entries(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    let dictionary = state.storage.dictionary();
    let dictionary = dictionary.read();
    Ok(HttpResponse::Ok().json(dictionary.entries()))
}

async fn search_entries(
    state: web::Data<Arc<AppState>>,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse> {
    let dictionary = state.storage.dictionary();
    let dictionary = dictionary.read();
    Ok(HttpResponse::Ok().json(dictionary.search(&query.q)))
}

async fn similar_terms(
    state: web::Data<Arc<AppState>>,
    query: web::Query<SimilarQuery>,
) -> ActixResult<HttpResponse> {
    let threshold = query.threshold.unwrap_or(0.7);
    let top_k = query.top_k.unwrap_or(5);

    let dictionary = state.storage.dictionary();
    let dictionary = dictionary.read();
    Ok(HttpResponse::Ok().json(dictionary.find_similar_terms(&query.term, threshold, top_k)))
}

async fn add_entry(
    state: web::Data<Arc<AppState>>,
    req: web::Json<AddEntryRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    let outcome = state.storage.with_dictionary(|dict| {
        dict.add_entry(&req.canonical, req.variants, req.category, req.note)
    });

    match outcome {
        Ok(Ok(())) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": true
        }))),
        Ok(Err(e)) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        }))),
        Err(e) => {
            error!(error = %e, "dictionary save failed");
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string()
            })))
        }
    }
}

async fn update_entry(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    req: web::Json<UpdateEntryRequest>,
) -> ActixResult<HttpResponse> {
    let canonical = path.into_inner();
    let req = req.into_inner();
    let outcome = state.storage.with_dictionary(|dict| {
        dict.update_entry(&canonical, req.variants, req.category, req.note)
    });

    match outcome {
        Ok(Ok(())) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": true
        }))),
        Ok(Err(e)) => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": e.to_string()
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

async fn delete_entry(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let canonical = path.into_inner();
    let outcome = state
        .storage
        .with_dictionary(|dict| dict.delete_entry(&canonical));

    match outcome {
        Ok(Ok(removed)) => Ok(HttpResponse::Ok().json(removed)),
        Ok(Err(e)) => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": e.to_string()
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

async fn add_variant(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    req: web::Json<AddVariantRequest>,
) -> ActixResult<HttpResponse> {
    let canonical = path.into_inner();
    let outcome = state
        .storage
        .with_dictionary(|dict| dict.add_variant(&canonical, &req.variant));

    match outcome {
        Ok(Ok(added)) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": added
        }))),
        Ok(Err(e)) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

async fn export_dictionary(
    state: web::Data<Arc<AppState>>,
    query: web::Query<FormatQuery>,
) -> ActixResult<HttpResponse> {
    let dictionary = state.storage.dictionary();
    let dictionary = dictionary.read();

    match query.format.as_deref().unwrap_or("json") {
        "json" => match dictionary.to_json() {
            Ok(body) => Ok(HttpResponse::Ok().content_type("application/json").body(body)),
            Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string()
            }))),
        },
        "csv" => match dictionary.to_csv() {
            Ok(body) => Ok(HttpResponse::Ok().content_type("text/csv").body(body)),
            Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string()
            }))),
        },
        other => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Unknown export format: {}", other)
        }))),
    }
}

async fn import_dictionary(
    state: web::Data<Arc<AppState>>,
    query: web::Query<FormatQuery>,
    body: String,
) -> ActixResult<HttpResponse> {
    let format = query.format.as_deref().unwrap_or("json").to_string();
    let outcome = state.storage.with_dictionary(|dict| match format.as_str() {
        "json" => dict.import_json(&body),
        "csv" => dict.import_csv(&body),
        other => Err(notex_dict::DictError::Import(format!(
            "Unknown import format: {}",
            other
        ))),
    });

    match outcome {
        Ok(Ok(report)) => Ok(HttpResponse::Ok().json(report)),
        Ok(Err(e)) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

async fn detect_dictionary_variants(
    state: web::Data<Arc<AppState>>,
    req: web::Json<DetectRequest>,
) -> ActixResult<HttpResponse> {
    let threshold = req.threshold.unwrap_or(0.7);
    let candidates = detect_variants(
        &req.terms,
        threshold,
        state.embedder.as_ref(),
        state.llm.as_ref(),
    )
    .await;
    Ok(HttpResponse::Ok().json(candidates))
}

async fn apply_variant_decisions(
    state: web::Data<Arc<AppState>>,
    req: web::Json<ApplyRequest>,
) -> ActixResult<HttpResponse> {
    let outcome = state
        .storage
        .with_dictionary(|dict| Ok(dict.apply_variant_updates(&req.decisions)));

    match outcome {
        Ok(Ok(report)) => Ok(HttpResponse::Ok().json(report)),
        Ok(Err(e)) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

async fn ingest(
    state: web::Data<Arc<AppState>>,
    req: web::Json<IngestRequest>,
) -> ActixResult<HttpResponse> {
    let source_dir = req
        .source_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| state.notes_dir.clone());

    match state
        .storage
        .ingest(&source_dir, state.embedder.as_ref())
        .await
    {
        Ok(report) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "added": report.added,
            "skipped": report.skipped,
            "failed": report.failed,
            "new_terms": report.new_terms,
        }))),
        Err(e) => {
            error!(error = %e, "ingestion failed");
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string()
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    use notex_core::PipelineConfig;
    use notex_model::{HashEmbedding, LexicalRerank, ScriptedCompletion};

    fn test_state(dir: &std::path::Path, responses: Vec<String>) -> Arc<AppState> {
        let storage = Arc::new(StorageManager::new(dir.join("data")).unwrap());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedding::new(32));
        let llm: Arc<dyn CompletionProvider> = Arc::new(ScriptedCompletion::new(responses));

        let pipeline = SearchPipeline::new(
            storage.dictionary(),
            storage.index(),
            embedder.clone(),
            llm.clone(),
            Arc::new(LexicalRerank),
            PipelineConfig::default(),
        );

        Arc::new(AppState {
            pipeline,
            storage,
            embedder,
            llm,
            notes_dir: dir.join("notes"),
        })
    }

    #[actix_web::test]
    async fn test_add_entry_then_duplicate_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Vec::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/dictionary/entries")
            .set_json(serde_json::json!({
                "canonical": "水酸化ナトリウム",
                "variants": ["NaOH"],
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::post()
            .uri("/dictionary/entries")
            .set_json(serde_json::json!({"canonical": "水酸化ナトリウム"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_search_endpoint_runs_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(
            dir.path(),
            vec![
                r#"{"queries": ["滴定"]}"#.to_string(),
                "unused".to_string(),
            ],
        );
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/search")
            .set_json(serde_json::json!({
                "type": "initial_search",
                "purpose": "中和滴定",
                "materials": "NaOH: 5g",
                "methods": "滴定",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["search_query"], "滴定");
        // Empty index: the comparator falls back to the fixed message.
        assert!(body["retrieved_docs"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_delete_unknown_entry_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Vec::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::delete()
            .uri("/dictionary/entries/unknown")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_export_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Vec::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/dictionary/entries")
            .set_json(serde_json::json!({
                "canonical": "エタノール",
                "variants": ["EtOH", "エタノル"],
                "category": "溶媒",
            }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get()
            .uri("/dictionary/export?format=csv")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let csv = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(csv.contains("エタノール"));

        let req = test::TestRequest::post()
            .uri("/dictionary/import?format=csv")
            .set_payload(csv)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let report: serde_json::Value = test::read_body_json(resp).await;
        assert!(report["errors"].as_array().unwrap().is_empty());
    }
}
