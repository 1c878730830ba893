//! Endpoint metadata produced by the source-analysis collaborator.
//!
//! A [`MethodDescriptor`] describes one controller method after decorators, parameter
//! types and return types have been extracted from source. Type information is carried
//! as type text (e.g. `"UserDto[] | null"`) with `Promise<...>` and import wrappers
//! already stripped; [`crate::type_mapper::TypeMapper`] turns it into schemas.

use crate::constraints::ConstraintMap;
use crate::schema::SchemaPool;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One security requirement object: scheme name to required scopes.
///
/// Every scheme inside one object must be satisfied (AND); a list of objects is
/// satisfied when any one of them is (OR).
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Complete information about a single API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    /// The HTTP method for this endpoint
    pub method: HttpMethod,
    /// The URL path pattern (e.g., "/users/{id}" or "users/:id")
    pub path: String,
    /// Operation identifier, usually the controller method name
    pub operation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    /// Parameters extracted from the method signature, in declaration order
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Declared return type text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    /// Explicit success status code (e.g. from an `@HttpCode` decorator)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_status: Option<u16>,
    /// Decorator-declared responses keyed by status code (or `default`)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, ResponseDescriptor>,
    /// Security decorators on the method, combined with AND
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    /// Request content types; empty means the configured default
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    /// Response content types; empty means the configured default
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
}

/// HTTP methods supported by operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Get the HTTP method as an upper-case string
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }
}

/// Information about a single parameter of an endpoint method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    /// The parameter name; a body parameter without a name is the whole body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Where the parameter is read from
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Type text of the parameter
    pub type_text: String,
    /// Whether the parameter is required (non-optional)
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The location where a parameter value is extracted from in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Path parameter embedded in the URL (e.g., `/users/{id}`)
    Path,
    /// Query string parameter (e.g., `?page=1&limit=10`)
    Query,
    /// HTTP header parameter
    Header,
    /// Cookie parameter
    Cookie,
    /// Request body
    Body,
}

impl ParameterLocation {
    /// The OpenAPI `in` value; `None` for the request body
    pub fn as_openapi_str(&self) -> Option<&'static str> {
        match self {
            ParameterLocation::Path => Some("path"),
            ParameterLocation::Query => Some("query"),
            ParameterLocation::Header => Some("header"),
            ParameterLocation::Cookie => Some("cookie"),
            ParameterLocation::Body => None,
        }
    }
}

/// A decorator-declared response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Type text of the response body, if declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_text: Option<String>,
}

/// Everything the external collaborators hand to the pipeline, fully materialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorInput {
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    /// Raw schema pool
    #[serde(default)]
    pub schemas: SchemaPool,
    /// Per-class validation constraints
    #[serde(default)]
    pub constraints: ConstraintMap,
}

impl MethodDescriptor {
    /// Create a new MethodDescriptor with minimal required fields
    pub fn new(method: HttpMethod, path: &str, operation_id: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            operation_id: operation_id.to_string(),
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            parameters: Vec::new(),
            return_type: None,
            success_status: None,
            responses: IndexMap::new(),
            security: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
        }
    }
}

impl ParameterDescriptor {
    /// Create a new named ParameterDescriptor
    pub fn new(name: &str, location: ParameterLocation, type_text: &str, required: bool) -> Self {
        Self {
            name: Some(name.to_string()),
            location,
            type_text: type_text.to_string(),
            required,
            description: None,
        }
    }

    /// Create an unnamed body parameter standing for the whole request body
    pub fn body(type_text: &str) -> Self {
        Self {
            name: None,
            location: ParameterLocation::Body,
            type_text: type_text.to_string(),
            required: true,
            description: None,
        }
    }
}
