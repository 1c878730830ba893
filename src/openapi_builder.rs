use crate::alias_collapser::collapse_aliases;
use crate::config::{GeneratorConfig, Info, Server, Tag};
use crate::constraints::{merge_constraints, ConstraintMap};
use crate::descriptor::{HttpMethod, MethodDescriptor, SecurityRequirement};
use crate::error::Result;
use crate::name_normalizer::normalize_names;
use crate::operation_assembler::OperationAssembler;
use crate::reachability::{merge_reachable, unresolved_refs};
use crate::schema::{SchemaNode, SchemaPool};
use crate::security::apply_security;
use crate::version::{transform_version, OpenApiVersion};
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Paths collection (URL path -> PathItem), in insertion order
pub type Paths = IndexMap<String, PathItem>;

/// OpenAPI document builder
pub struct OpenApiBuilder {
    config: GeneratorConfig,
    assembler: OperationAssembler,
    paths: Paths,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Operation summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Operation description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation ID
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Parameters (path, query, header, cookie)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code
    pub responses: IndexMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query, header, cookie)
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameter schema
    pub schema: SchemaNode,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Request body description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the request body is required
    pub required: bool,
    /// Content types and their schemas
    pub content: IndexMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: SchemaNode,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content; absent for 204 and void responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: SchemaPool,
    #[serde(
        rename = "securitySchemes",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub security_schemes: IndexMap<String, Value>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths
    pub paths: Paths,
    /// Components (schemas, security schemes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
}

/// Finished document plus the references nothing could resolve
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub document: OpenApiDocument,
    /// Missing schema name -> number of references to it
    pub unresolved: IndexMap<String, usize>,
}

impl PathItem {
    /// Slot holding the operation for an HTTP method
    pub fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        }
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        [
            &self.get,
            &self.post,
            &self.put,
            &self.delete,
            &self.patch,
            &self.options,
            &self.head,
        ]
        .into_iter()
        .flatten()
    }

    pub fn operations_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        [
            &mut self.get,
            &mut self.post,
            &mut self.put,
            &mut self.delete,
            &mut self.patch,
            &mut self.options,
            &mut self.head,
        ]
        .into_iter()
        .flatten()
    }
}

impl Operation {
    /// Top-level schemas of parameters, request body and responses
    pub fn schemas(&self) -> Vec<&SchemaNode> {
        let mut schemas: Vec<&SchemaNode> = self.parameters.iter().map(|p| &p.schema).collect();
        if let Some(body) = &self.request_body {
            schemas.extend(body.content.values().map(|m| &m.schema));
        }
        for response in self.responses.values() {
            if let Some(content) = &response.content {
                schemas.extend(content.values().map(|m| &m.schema));
            }
        }
        schemas
    }

    pub fn schemas_mut(&mut self) -> Vec<&mut SchemaNode> {
        let mut schemas: Vec<&mut SchemaNode> =
            self.parameters.iter_mut().map(|p| &mut p.schema).collect();
        if let Some(body) = &mut self.request_body {
            schemas.extend(body.content.values_mut().map(|m| &mut m.schema));
        }
        for response in self.responses.values_mut() {
            if let Some(content) = &mut response.content {
                schemas.extend(content.values_mut().map(|m| &mut m.schema));
            }
        }
        schemas
    }
}

/// Every top-level schema appearing in the paths, in document order
pub fn path_schemas(paths: &Paths) -> Vec<&SchemaNode> {
    paths
        .values()
        .flat_map(PathItem::operations)
        .flat_map(Operation::schemas)
        .collect()
}

/// Apply `f` to every top-level schema appearing in the paths
pub fn for_each_path_schema_mut<F>(paths: &mut Paths, mut f: F)
where
    F: FnMut(&mut SchemaNode),
{
    for item in paths.values_mut() {
        for operation in item.operations_mut() {
            for schema in operation.schemas_mut() {
                f(schema);
            }
        }
    }
}

/// Rewrite structural references in both the paths and the pool
pub fn rewrite_all_refs<F>(paths: &mut Paths, pool: &mut SchemaPool, rename: &F)
where
    F: Fn(&str) -> Option<String>,
{
    for_each_path_schema_mut(paths, |schema| schema.rewrite_refs(rename));
    for schema in pool.values_mut() {
        schema.rewrite_refs(rename);
    }
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder from generator configuration
    pub fn new(config: GeneratorConfig) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            assembler: OperationAssembler::from_config(&config),
            config,
            paths: IndexMap::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.config.info = Info {
            title,
            version,
            description,
        };
        self
    }

    /// Assembled paths so far
    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Add one endpoint method to the document
    pub fn add_method(&mut self, descriptor: &MethodDescriptor) {
        let (path, operation) = self.assembler.assemble(descriptor);
        let slot = self.paths.entry(path.clone()).or_default().slot_mut(descriptor.method);
        if slot.is_some() {
            warn!(
                "Duplicate operation {} {}, keeping the last one ({})",
                descriptor.method.as_str(),
                path,
                descriptor.operation_id
            );
        }
        *slot = Some(operation);
    }

    /// Run the schema pipeline over the raw pool and assemble the final document
    pub fn build(self, pool: SchemaPool, constraints: &ConstraintMap) -> Result<GenerationResult> {
        debug!("Building final OpenAPI document");
        let target = OpenApiVersion::parse(&self.config.openapi)?;

        let merged = merge_reachable(&self.paths, &pool);
        for (name, count) in &merged.missing {
            debug!("Schema `{}` referenced {} time(s) but not in pool", name, count);
        }

        let (paths, schemas) = collapse_aliases(self.paths, merged.schemas);
        let (paths, schemas) = normalize_names(paths, schemas);
        let schemas = merge_constraints(schemas, constraints)?;
        let paths = apply_security(paths, &self.config.security);
        let (paths, schemas) = transform_version(paths, schemas, OpenApiVersion::V30, target);

        let unresolved = unresolved_refs(&paths, &schemas);
        info!(
            "Built document with {} path(s) and {} schema(s)",
            paths.len(),
            schemas.len()
        );

        let components = (!schemas.is_empty() || !self.config.security_schemes.is_empty())
            .then(|| Components {
                schemas,
                security_schemes: self.config.security_schemes.clone(),
            });

        let document = OpenApiDocument {
            openapi: self.config.openapi,
            info: self.config.info,
            servers: self.config.servers,
            paths,
            components,
            tags: self.config.tags,
            security: self.config.security,
        };

        Ok(GenerationResult {
            document,
            unresolved,
        })
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}
