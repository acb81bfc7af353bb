use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::application::ports::DetectorPort;
use crate::domain::{
    detection::DetectionResponse,
    errors::{DetectError, DetectResult},
    report::DetectionOutcome,
    upload::ImageUpload,
};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const PROCESS_TIME_HEADER: &str = "X-Process-Time";

/// `{base}/detect/`, tolerating a trailing slash on the base.
pub fn detect_url(base_url: &str) -> String {
    format!("{}/detect/", base_url.trim_end_matches('/'))
}

/// Adapter for the remote detection API over HTTP.
///
/// No timeout is set; requests rely on the transport defaults.
pub struct HttpDetectionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDetectionClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: detect_url(base_url),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DetectorPort for HttpDetectionClient {
    async fn detect(&self, upload: &ImageUpload) -> DetectResult<DetectionOutcome> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|e| DetectError::Unexpected(error_chain(&e)))?;
        let form = Form::new().part("file", part);

        debug!("POST {} ({})", self.endpoint, upload.file_name);
        let res = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(classify)?;

        let status = res.status();
        let process_time_header = res.headers().get(PROCESS_TIME_HEADER).cloned();
        let body = res.text().await.map_err(classify)?;

        if status != StatusCode::OK {
            return Err(DetectError::Api {
                status: status.as_u16(),
                body,
            });
        }

        // Only a 200 carries a timing worth decoding.
        let process_time = process_time_header
            .map(|v| v.to_str().map(str::to_owned))
            .transpose()
            .map_err(|e| DetectError::Unexpected(format!("invalid {PROCESS_TIME_HEADER} header: {e}")))?;

        parse_outcome(&body, process_time.as_deref())
    }
}

/// Turns a 200 body plus the optional timing header into a checked outcome.
/// Anything that does not match the schema is an unexpected failure.
pub fn parse_outcome(body: &str, process_time: Option<&str>) -> DetectResult<DetectionOutcome> {
    let raw: Value = serde_json::from_str(body)
        .map_err(|e| DetectError::Unexpected(format!("response is not valid JSON: {e}")))?;
    let response: DetectionResponse = serde_json::from_value(raw.clone())
        .map_err(|e| DetectError::Unexpected(format!("response does not match the detection schema: {e}")))?;
    response.validate().map_err(DetectError::Unexpected)?;

    // A blank header counts as no timing at all.
    let process_time_secs = process_time
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|e| DetectError::Unexpected(format!("invalid {PROCESS_TIME_HEADER} {s:?}: {e}")))
        })
        .transpose()?;

    Ok(DetectionOutcome {
        response,
        raw,
        process_time_secs,
    })
}

fn classify(e: reqwest::Error) -> DetectError {
    if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() || e.is_redirect() {
        DetectError::Transport(error_chain(&e))
    } else {
        DetectError::Unexpected(error_chain(&e))
    }
}

/// reqwest hides the OS error ("Connection refused") in the source chain.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = inner.source();
    }
    msg
}
