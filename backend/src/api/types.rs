//! REST API types.
//!
//! All responses are camelCase JSON. Errors share one shape built by
//! [`error_response`].

use serde::Serialize;
use serde_json::{json, Value};

use crate::cache::Job;
use crate::export::{output_file_name, ExportFormat};
use crate::transform::pipeline::SourceInfo;
use crate::validation::SchemaReport;

/// Response sent after an upload has been reshaped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Job identifier used by the download endpoints
    pub job_id: String,

    /// Always "ready" on success
    pub status: String,

    /// Whether the result came from the content cache
    pub cached: bool,

    /// Output schema, in order
    pub columns: Vec<String>,

    /// First rows of the output, as arrays aligned with `columns`
    pub preview: Vec<Vec<Value>>,

    pub metadata: ResponseMetadata,
}

/// Metadata about the reshape
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub file_name: String,
    pub input_rows: usize,
    pub output_rows: usize,
    pub source: SourceInfo,
    pub schema: SchemaReport,
    pub downloads: Vec<DownloadLink>,
}

/// One available download
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub format: ExportFormat,
    pub file_name: String,
    pub url: String,
}

impl UploadResponse {
    /// Build the response for `job`, previewing at most `preview_rows` rows.
    pub fn from_job(job: &Job, cached: bool, preview_rows: usize) -> Self {
        let result = &job.result;
        let preview = result.output.head(preview_rows);

        let downloads = [ExportFormat::Csv, ExportFormat::Xlsx]
            .into_iter()
            .map(|format| DownloadLink {
                format,
                file_name: output_file_name(&job.file_name, format),
                url: format!("/api/jobs/{}/download/{}", job.id, format.extension()),
            })
            .collect();

        UploadResponse {
            job_id: job.id.clone(),
            status: "ready".to_string(),
            cached,
            columns: preview.columns,
            preview: preview.rows,
            metadata: ResponseMetadata {
                file_name: job.file_name.clone(),
                input_rows: result.input_rows,
                output_rows: result.output_rows,
                source: result.source.clone(),
                schema: result.report.clone(),
                downloads,
            },
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::JobStore;
    use crate::transform::pipeline::reshape_bytes;
    use std::sync::Arc;

    #[test]
    fn test_upload_response_shape() {
        let csv = "Entity,Category 1,Category 2\nA,X,Y\nB,Z,\n";
        let result = Arc::new(reshape_bytes(csv.as_bytes(), "opps.csv").unwrap());
        let job = JobStore::new(1).create("opps.csv", result);

        let response = UploadResponse::from_job(&job, false, 2);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ready");
        assert_eq!(json["preview"].as_array().unwrap().len(), 2);
        assert_eq!(json["metadata"]["outputRows"], 3);
        assert_eq!(json["metadata"]["inputRows"], 2);
        assert_eq!(json["metadata"]["source"]["format"], "csv");
        assert_eq!(json["metadata"]["downloads"][0]["fileName"], "opps-done.csv");
        assert_eq!(json["metadata"]["downloads"][1]["format"], "xlsx");
        assert_eq!(json["columns"][1], "Source Category Column");
    }

    #[test]
    fn test_error_response() {
        let err = error_response("No 'Category 1'...'Category 9' columns were found in this file");
        assert_eq!(err["status"], "error");
        assert!(err["error"].as_str().unwrap().contains("Category 1"));
    }
}
