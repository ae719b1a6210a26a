//! services/api/src/bin/openapi.rs
//!
//! Dumps the portal's OpenAPI 3.0 specification to `openapi.json`, for
//! client generators and docs pipelines that should not have to boot the
//! server just to read the schema.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const OUTPUT_PATH: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let spec = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(OUTPUT_PATH, &spec)?;
    println!("Wrote {} ({} bytes)", OUTPUT_PATH, spec.len());
    Ok(())
}
