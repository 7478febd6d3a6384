//! HTTP Server for the unpivot API.
//!
//! # API Endpoints
//!
//! | Method | Path                                 | Description                     |
//! |--------|--------------------------------------|---------------------------------|
//! | GET    | `/`                                  | Upload page                     |
//! | GET    | `/health`                            | Health check                    |
//! | POST   | `/api/upload`                        | Upload CSV / Excel and reshape  |
//! | GET    | `/api/jobs/{id}/download/{format}`   | Download `csv` or `xlsx` output |
//! | GET    | `/api/logs`                          | SSE stream for real-time logs   |

use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Html, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, log_success, LOG_BROADCASTER};
use super::types::{error_response, UploadResponse};
use crate::cache::{content_key, JobStore, ResultCache};
use crate::config::ServerConfig;
use crate::error::{ExportError, ServerError, ServerResult};
use crate::export::{output_file_name, ExportFormat};
use crate::transform::pipeline::reshape_bytes;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub cache: ResultCache,
    pub jobs: JobStore,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            cache: ResultCache::new(config.cache_entries),
            jobs: JobStore::new(config.job_entries),
            config: Arc::new(config),
        }
    }
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(e) if e.is_no_data() => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Export(ExportError::UnknownFormat(_)) => StatusCode::BAD_REQUEST,
            ServerError::JobNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/jobs/{id}/download/{format}", get(download))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    let addr = SocketAddr::new(config.host, config.port);
    let app = build_router(AppState::new(config));

    println!("🚀 Unpivot server running on http://{}", addr);
    println!("   POST /api/upload                      - Upload CSV / Excel file");
    println!("   GET  /api/jobs/{{id}}/download/{{fmt}}   - Download csv or xlsx");
    println!("   GET  /api/logs                        - SSE log stream");
    println!("   GET  /health                          - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "unpivot",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "download": "GET /api/jobs/{id}/download/{csv|xlsx}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: multipart field `file`.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    let file_name = file_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("Uploaded file has no name".into()))?;

    log_info(format!("📄 New upload: {} ({} bytes)", file_name, bytes.len()));

    let key = content_key(&bytes, &file_name);
    let (result, cached) = match state.cache.get(&key) {
        Some(hit) => {
            log_success("Identical upload seen before, reusing result");
            (hit, true)
        }
        None => {
            let name = file_name.clone();
            let result = tokio::task::spawn_blocking(move || reshape_bytes(&bytes, &name))
                .await
                .map_err(|e| ServerError::Internal(e.to_string()))??;
            let result = Arc::new(result);
            state.cache.insert(key, Arc::clone(&result));
            (result, false)
        }
    };

    let job = state.jobs.create(&file_name, result);
    Ok(Json(UploadResponse::from_job(
        &job,
        cached,
        state.config.preview_rows,
    )))
}

/// Download endpoint: serialize a finished job.
async fn download(
    State(state): State<AppState>,
    Path((id, format)): Path<(String, String)>,
) -> ServerResult<Response> {
    let format: ExportFormat = format.parse()?;
    let job = state
        .jobs
        .get(&id)
        .ok_or_else(|| ServerError::JobNotFound(id.clone()))?;

    let table = job.result.output.clone();
    let bytes = tokio::task::spawn_blocking(move || format.write(&table))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    let file_name = output_file_name(&job.file_name, format);
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', ""));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "unpivot-test-boundary";

    fn app() -> Router {
        build_router(AppState::new(ServerConfig::default()))
    }

    fn multipart_request(file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("upload request")
    }

    async fn json_body(resp: Response) -> Value {
        let body = to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .expect("response body");
        serde_json::from_slice(&body).expect("response json")
    }

    #[tokio::test]
    async fn test_health() {
        let resp = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let v = json_body(resp).await;
        assert_eq!(v["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_then_download_csv() {
        let app = app();
        let csv = b"Entity,Category 1,Per Call Price 1,Category 2,Books 2\nA,X,10,,5\n";

        let resp = app
            .clone()
            .oneshot(multipart_request("opps.csv", csv))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = json_body(resp).await;
        assert_eq!(v["metadata"]["outputRows"], 1);
        assert_eq!(v["cached"], false);
        let url = v["metadata"]["downloads"][0]["url"].as_str().unwrap().to_string();

        let resp = app
            .clone()
            .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.contains("opps-done.csv"));
        let body = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        assert_eq!(
            String::from_utf8(body.to_vec()).unwrap(),
            "Entity,Source Category Column,Category Value,Per Call Price,Monthly Flat Fee,APF,Books\n\
             A,Category 1,X,10,,,\n"
        );
    }

    #[tokio::test]
    async fn test_repeat_upload_hits_cache() {
        let app = app();
        let csv = b"Entity,Category 1\nA,X\n";

        let first = json_body(app.clone().oneshot(multipart_request("a.csv", csv)).await.unwrap()).await;
        let second = json_body(app.clone().oneshot(multipart_request("a.csv", csv)).await.unwrap()).await;
        let changed = json_body(
            app.clone()
                .oneshot(multipart_request("a.csv", b"Entity,Category 1\nA,Y\n"))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(first["cached"], false);
        assert_eq!(second["cached"], true);
        assert_ne!(first["jobId"], second["jobId"]);
        assert_eq!(changed["cached"], false);
        assert_eq!(changed["preview"][0][2], "Y");
    }

    #[tokio::test]
    async fn test_no_category_columns_is_unprocessable() {
        let resp = app()
            .oneshot(multipart_request("opps.csv", b"Entity,Notes\nA,x\n"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let v = json_body(resp).await;
        assert_eq!(v["status"], "error");
        assert!(v["error"].as_str().unwrap().contains("Category 1"));
    }

    #[tokio::test]
    async fn test_unsupported_format_is_bad_request() {
        let resp = app()
            .oneshot(multipart_request("opps.pdf", b"%PDF"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_job_and_format() {
        let app = app();

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/jobs/nope/download/csv")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/jobs/nope/download/pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
