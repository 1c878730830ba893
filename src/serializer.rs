//! Serialization module for converting OpenAPI documents to YAML or JSON format.
//!
//! Key order in the output is the insertion order of the document's maps, so the same
//! input always produces byte-identical files.

use crate::error::Result;
use crate::openapi_builder::OpenApiDocument;
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to YAML format.
///
/// # Example
///
/// ```no_run
/// use openapi_from_decorators::openapi_builder::OpenApiBuilder;
/// use openapi_from_decorators::constraints::ConstraintMap;
/// use openapi_from_decorators::schema::SchemaPool;
/// use openapi_from_decorators::serializer::serialize_yaml;
///
/// let result = OpenApiBuilder::default()
///     .build(SchemaPool::new(), &ConstraintMap::new())
///     .unwrap();
/// let yaml = serialize_yaml(&result.document).unwrap();
/// println!("{}", yaml);
/// ```
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Serializes an OpenAPI document to JSON format with pretty printing.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Writes string content to a file.
///
/// Creates the file and any missing parent directories, or overwrites an existing file.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
