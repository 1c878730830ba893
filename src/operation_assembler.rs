//! Builds one OpenAPI operation per [`MethodDescriptor`].

use crate::config::GeneratorConfig;
use crate::descriptor::{HttpMethod, MethodDescriptor, ParameterDescriptor, ParameterLocation};
use crate::openapi_builder::{MediaType, Operation, Parameter, RequestBody, Response};
use crate::schema::SchemaNode;
use crate::security::combine_requirements;
use crate::type_mapper::TypeMapper;
use http::StatusCode;
use indexmap::IndexMap;
use log::{debug, warn};

/// Operation assembler - turns endpoint descriptors into OpenAPI operations
pub struct OperationAssembler {
    request_content_types: Vec<String>,
    response_content_types: Vec<String>,
}

impl OperationAssembler {
    /// Create an assembler with the default content types used when a method declares none
    pub fn new(request_content_types: Vec<String>, response_content_types: Vec<String>) -> Self {
        Self {
            request_content_types,
            response_content_types,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(
            config.request_content_types.clone(),
            config.response_content_types.clone(),
        )
    }

    /// Assemble the operation for a descriptor, returning it with its normalized path
    pub fn assemble(&self, descriptor: &MethodDescriptor) -> (String, Operation) {
        debug!(
            "Assembling operation: {} {}",
            descriptor.method.as_str(),
            descriptor.path
        );

        let path = Self::normalize_path(&descriptor.path);
        let operation = Operation {
            tags: descriptor.tags.clone(),
            summary: descriptor.summary.clone(),
            description: descriptor.description.clone(),
            operation_id: Some(descriptor.operation_id.clone()),
            parameters: Self::assemble_parameters(&path, &descriptor.parameters),
            request_body: self.assemble_request_body(descriptor),
            responses: self.assemble_responses(descriptor),
            security: (!descriptor.security.is_empty())
                .then(|| vec![combine_requirements(&descriptor.security)]),
            deprecated: descriptor.deprecated.then_some(true),
        };

        (path, operation)
    }

    /// Success status used when no explicit status is declared
    pub fn default_success_status(descriptor: &MethodDescriptor) -> u16 {
        descriptor
            .success_status
            .unwrap_or(match descriptor.method {
                HttpMethod::Post => 201,
                _ => 200,
            })
    }

    /// Convert path format from :param or {param} to OpenAPI {param} format, with a
    /// leading slash
    pub fn normalize_path(path: &str) -> String {
        let converted: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(|part| match part.strip_prefix(':') {
                Some(name) => format!("{{{}}}", name),
                None => part.to_string(),
            })
            .collect();

        format!("/{}", converted.join("/"))
    }

    fn assemble_parameters(path: &str, descriptors: &[ParameterDescriptor]) -> Vec<Parameter> {
        let mut parameters = Vec::new();

        for descriptor in descriptors {
            let Some(location) = descriptor.location.as_openapi_str() else {
                continue;
            };
            let Some(name) = &descriptor.name else {
                warn!("Skipping unnamed {} parameter on {}", location, path);
                continue;
            };

            parameters.push(Parameter {
                name: name.clone(),
                location: location.to_string(),
                // Path parameters are always required, whatever the extracted optionality
                required: descriptor.required || descriptor.location == ParameterLocation::Path,
                description: descriptor.description.clone(),
                schema: TypeMapper::map_type_or_object(&descriptor.type_text),
            });
        }

        // Templated segments nobody declared still need a parameter entry
        for name in path_template_names(path) {
            let declared = parameters
                .iter()
                .any(|p| p.location == "path" && p.name == name);
            if !declared {
                debug!("Adding undeclared path parameter `{}` on {}", name, path);
                parameters.push(Parameter {
                    name,
                    location: "path".to_string(),
                    required: true,
                    description: None,
                    schema: SchemaNode::typed("string"),
                });
            }
        }

        parameters
    }

    /// Merge every body parameter into a single request body
    fn assemble_request_body(&self, descriptor: &MethodDescriptor) -> Option<RequestBody> {
        let body_params: Vec<&ParameterDescriptor> = descriptor
            .parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Body)
            .collect();
        if body_params.is_empty() {
            return None;
        }

        let schema = match body_params.as_slice() {
            [single] if single.name.is_none() => TypeMapper::map_type_or_object(&single.type_text),
            _ => merge_body_parameters(&body_params),
        };

        let description = match body_params.as_slice() {
            [single] => single.description.clone(),
            _ => None,
        };

        let content_types = if descriptor.consumes.is_empty() {
            &self.request_content_types
        } else {
            &descriptor.consumes
        };

        Some(RequestBody {
            description,
            required: body_params.iter().any(|p| p.required),
            content: content_types
                .iter()
                .map(|content_type| {
                    (
                        content_type.clone(),
                        MediaType {
                            schema: schema.clone(),
                        },
                    )
                })
                .collect(),
        })
    }

    fn assemble_responses(&self, descriptor: &MethodDescriptor) -> IndexMap<String, Response> {
        let content_types = if descriptor.produces.is_empty() {
            &self.response_content_types
        } else {
            &descriptor.produces
        };

        let mut responses = IndexMap::new();

        let success = Self::default_success_status(descriptor).to_string();
        let has_success_override = descriptor
            .responses
            .keys()
            .any(|status| is_success_with_body(status));
        if !has_success_override && !descriptor.responses.contains_key(&success) {
            let schema = descriptor
                .return_type
                .as_deref()
                .and_then(TypeMapper::map_type);
            responses.insert(
                success.clone(),
                build_response(&success, None, schema, content_types),
            );
        }

        for (status, declared) in &descriptor.responses {
            let schema = declared
                .type_text
                .as_deref()
                .and_then(TypeMapper::map_type);
            responses.insert(
                status.clone(),
                build_response(status, declared.description.clone(), schema, content_types),
            );
        }

        responses.sort_keys();
        responses
    }
}

impl Default for OperationAssembler {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

/// 2xx status other than 204
fn is_success_with_body(status: &str) -> bool {
    status
        .parse::<u16>()
        .is_ok_and(|code| (200..300).contains(&code) && code != 204)
}

fn build_response(
    status: &str,
    description: Option<String>,
    schema: Option<SchemaNode>,
    content_types: &[String],
) -> Response {
    let description = description.unwrap_or_else(|| default_description(status));
    let content = match schema {
        Some(schema) if status != "204" => Some(
            content_types
                .iter()
                .map(|content_type| {
                    (
                        content_type.clone(),
                        MediaType {
                            schema: schema.clone(),
                        },
                    )
                })
                .collect(),
        ),
        _ => None,
    };

    Response {
        description,
        content,
    }
}

fn default_description(status: &str) -> String {
    status
        .parse::<u16>()
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Success")
        .to_string()
}

/// Several body parameters: named ones become properties of one object, unnamed ones are
/// combined with it through `allOf`
fn merge_body_parameters(params: &[&ParameterDescriptor]) -> SchemaNode {
    let mut properties = IndexMap::new();
    let mut required = Vec::new();
    let mut whole_bodies = Vec::new();

    for param in params {
        let schema = TypeMapper::map_type_or_object(&param.type_text);
        match &param.name {
            Some(name) => {
                if param.required && !required.contains(name) {
                    required.push(name.clone());
                }
                properties.insert(name.clone(), schema);
            }
            None => whole_bodies.push(schema),
        }
    }

    let named = (!properties.is_empty()).then(|| SchemaNode {
        properties,
        required,
        ..SchemaNode::object()
    });

    match (whole_bodies.is_empty(), named) {
        (true, Some(named)) => named,
        (_, named) => SchemaNode {
            all_of: whole_bodies.into_iter().chain(named).collect(),
            ..Default::default()
        },
    }
}

fn path_template_names(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(str::to_string)
        .collect()
}
