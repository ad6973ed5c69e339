use spin_sdk::http::Response;
use mime_guess::from_path;

use crate::backend::kv::KvBlobStore;

fn not_found() -> Response {
    Response::builder()
        .status(404)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": "Not found"}).to_string())
        .build()
}

/// Serve an uploaded blob at the URL handed out by `KvBlobStore::download_url`.
pub fn serve_blob(blobs: &KvBlobStore, encoded_path: &str) -> anyhow::Result<Response> {
    let path = urlencoding::decode(encoded_path)?.into_owned();
    if path.is_empty() || path.split('/').any(|segment| segment == "..") {
        return Ok(not_found());
    }

    let (bytes, content_type) = match blobs.read(&path)? {
        Some(blob) => blob,
        None => {
            log::debug!("Blob {} not found", path);
            return Ok(not_found());
        }
    };

    let mime = content_type.unwrap_or_else(|| from_path(&path).first_or_octet_stream().to_string());

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", mime)
        .header("Cache-Control", "public, max-age=3600")
        .body(bytes)
        .build())
}
