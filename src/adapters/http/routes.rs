use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::adapters::http::state::HttpState;
use crate::application::dto::{DetectQuery, DetectReply};
use crate::domain::{
    errors::DetectError,
    upload::{mime_for_path, ImageUpload},
};

/// `POST /api/detect`: forwards the `file` part to the detection API and
/// returns what the page should show.
pub async fn detect(
    State(st): State<HttpState>,
    Query(query): Query<DetectQuery>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let upload = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(msg) => {
            warn!("Rejected upload: {}", msg);
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response();
        }
    };

    let presentation = st.detection.run(&upload, query.annotate).await;
    let reply = DetectReply::from_presentation(&presentation).unwrap_or_else(|e| DetectReply {
        ok: false,
        message: DetectError::Unexpected(format!("encoding annotated image: {e}")).to_string(),
        elapsed_secs: None,
        results: presentation.raw_json.clone(),
        rendered: presentation.rendered,
        annotated_png_base64: None,
    });
    Json(reply).into_response()
}

async fn read_upload(multipart: &mut Multipart) -> Result<ImageUpload, String> {
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let mime_type = match field.content_type() {
            Some(ct) => ct.to_string(),
            None => mime_for_path(std::path::Path::new(&file_name))
                .map_err(|e| e.to_string())?
                .to_string(),
        };
        let bytes = field.bytes().await.map_err(|e| e.to_string())?;
        if bytes.is_empty() {
            return Err("empty file part".into());
        }
        return Ok(ImageUpload::new(file_name, mime_type, bytes.to_vec()));
    }
    Err("multipart body has no `file` part".into())
}
