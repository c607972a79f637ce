//! services/marketplace/src/bin/openapi.rs
//!
//! This binary generates the OpenAPI 3.0 specification for the marketplace
//! routes and saves it to a file named `openapi.json`.

use marketplace_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

/// Generates the OpenAPI specification and writes it to a file.
fn write_openapi_doc(
    api_doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = api_doc.to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!("OpenAPI specification generated at {}", path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "openapi.json".to_string());
    write_openapi_doc(ApiDoc::openapi(), &path)?;
    Ok(())
}
