pub mod auth;
pub mod backend;
pub mod blob_server;
pub mod communities;
pub mod common;
pub mod config;
pub mod context;
pub mod models;
pub mod posts;
pub mod state;
pub mod submit;
pub mod votes;

use spin_sdk::{
    http::{Request, Response, IntoResponse},
    http_component,
};

use crate::backend::kv::KvBlobStore;
use crate::config::BLOB_ROUTE_PREFIX;

// === Component entrypoint ===
// Serves uploaded images back at the URLs the KV blob store hands out.
#[cfg_attr(target_arch = "wasm32", http_component)]
fn handle(req: Request) -> anyhow::Result<impl IntoResponse> {
    let path = req.path().to_string();
    let method = req.method().to_string();

    match (method.as_str(), path.as_str()) {
        ("GET", p) if p.starts_with(BLOB_ROUTE_PREFIX) => {
            let blobs = KvBlobStore::open()?;
            blob_server::serve_blob(&blobs, p.trim_start_matches(BLOB_ROUTE_PREFIX))
        }
        _ => Ok(Response::builder().status(404).body("Not found").build()),
    }
}
