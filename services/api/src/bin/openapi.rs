//! services/api/src/bin/openapi.rs
//!
//! Dumps the gateway's OpenAPI document so the browser client can generate
//! its API bindings without a running server.
//!
//! Usage: `openapi [OUTPUT]`. Writes to `openapi.json` by default; `-` prints
//! to stdout instead.

use smartstock_api::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let doc = ApiDoc::openapi();
    let json = doc.to_pretty_json()?;

    match std::env::args().nth(1).as_deref() {
        Some("-") => println!("{}", json),
        target => {
            let path = target.unwrap_or("openapi.json");
            std::fs::write(path, json)?;
            eprintln!(
                "Wrote {} paths for {} v{} to {}",
                doc.paths.paths.len(),
                doc.info.title,
                doc.info.version,
                path
            );
        }
    }
    Ok(())
}
