//! OpenAPI from decorators - Deterministic OpenAPI synthesis from extracted metadata.
//!
//! A source-analysis layer upstream reads a decorator-annotated controller codebase and
//! produces endpoint descriptors plus a raw pool of named schemas. This library turns that
//! metadata into a clean OpenAPI 3.0.x or 3.1 document.
//!
//! # Architecture
//!
//! 1. [`type_mapper`] - Maps type-expression text to schema nodes
//! 2. [`operation_assembler`] - Builds one operation per endpoint descriptor
//! 3. [`reachability`] - Keeps only schemas reachable from the paths
//! 4. [`alias_collapser`] - Elides schemas that are nothing but a `$ref`
//! 5. [`name_normalizer`] - Gives anonymous placeholder schemas readable names
//! 6. [`constraints`] - Merges externally extracted validation constraints
//! 7. [`security`] - Combines operation and global security requirements
//! 8. [`version`] - Re-encodes nullability for the target OpenAPI version
//! 9. [`openapi_builder`] - Runs the stages in order and assembles the document
//! 10. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_decorators::{
//!     config::GeneratorConfig,
//!     constraints::ConstraintMap,
//!     descriptor::{HttpMethod, MethodDescriptor},
//!     openapi_builder::OpenApiBuilder,
//!     schema::SchemaPool,
//!     serializer::serialize_yaml,
//! };
//!
//! let mut builder = OpenApiBuilder::new(GeneratorConfig::default());
//! let mut method = MethodDescriptor::new(HttpMethod::Get, "users/:id", "findOne");
//! method.return_type = Some("UserDto".to_string());
//! builder.add_method(&method);
//!
//! let result = builder.build(SchemaPool::new(), &ConstraintMap::new()).unwrap();
//! for (name, count) in &result.unresolved {
//!     eprintln!("unresolved: {} ({})", name, count);
//! }
//! println!("{}", serialize_yaml(&result.document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod alias_collapser;
pub mod cli;
pub mod config;
pub mod constraints;
pub mod descriptor;
pub mod error;
pub mod name_normalizer;
pub mod openapi_builder;
pub mod operation_assembler;
pub mod reachability;
pub mod schema;
pub mod security;
pub mod serializer;
pub mod type_mapper;
pub mod version;
