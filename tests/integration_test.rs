use indexmap::IndexMap;
use openapi_from_decorators::{
    cli::{self, CliArgs, OutputFormat},
    config::GeneratorConfig,
    descriptor::GeneratorInput,
    openapi_builder::{GenerationResult, OpenApiBuilder},
    serializer::{serialize_json, serialize_yaml},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

const FIXTURE: &str = include_str!("fixtures/nest_project.json");

fn load_fixture() -> GeneratorInput {
    serde_json::from_str(FIXTURE).expect("fixture should deserialize")
}

/// Config with a global bearer requirement, as most NestJS apps declare
fn secured_config(openapi: &str) -> GeneratorConfig {
    let mut config = GeneratorConfig {
        openapi: openapi.to_string(),
        ..GeneratorConfig::default()
    };
    config.info.title = "Users API".to_string();
    config
        .security
        .push(IndexMap::from([("bearer".to_string(), Vec::new())]));
    config.security_schemes.insert(
        "bearer".to_string(),
        json!({"type": "http", "scheme": "bearer", "bearerFormat": "JWT"}),
    );
    config
}

fn generate(openapi: &str) -> GenerationResult {
    let input = load_fixture();
    let mut builder = OpenApiBuilder::new(secured_config(openapi));
    for method in &input.methods {
        builder.add_method(method);
    }
    builder
        .build(input.schemas, &input.constraints)
        .expect("build should succeed")
}

fn generate_value(openapi: &str) -> Value {
    serde_json::to_value(&generate(openapi).document).unwrap()
}

#[test]
fn test_end_to_end_paths() {
    let document = generate_value("3.0.3");

    let paths: Vec<&String> = document["paths"].as_object().unwrap().keys().collect();
    assert_eq!(
        paths,
        vec!["/users", "/users/{id}", "/users/{id}/orders", "/users/{id}/settings"]
    );

    let create = &document["paths"]["/users"]["post"];
    assert_eq!(create["operationId"], "create");
    assert_eq!(
        create["requestBody"]["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/CreateUserDto"})
    );
    assert_eq!(create["responses"]["201"]["description"], "Created");

    let remove = &document["paths"]["/users/{id}"]["delete"];
    assert_eq!(remove["responses"]["204"], json!({"description": "No Content"}));
}

#[test]
fn test_end_to_end_schema_pipeline() {
    let result = generate("3.0.3");
    let schemas = &result.document.components.as_ref().unwrap().schemas;

    // Unreachable schemas pruned, aliases collapsed, placeholders renamed
    let names: Vec<&str> = schemas.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "UserDto",
            "Profile",
            "Address",
            "CreateUserDto",
            "UserOrdersResponse",
            "Paginated<Orders>",
            "Orders",
            "UserSettings",
        ]
    );
    assert!(result.unresolved.is_empty());

    let user = serde_json::to_value(&schemas["UserDto"]).unwrap();
    assert_eq!(user["properties"]["profile"], json!({"$ref": "#/components/schemas/Profile"}));
    assert_eq!(user["properties"]["address"], json!({"$ref": "#/components/schemas/Address"}));

    let page = serde_json::to_value(&schemas["Paginated<Orders>"]).unwrap();
    assert_eq!(
        page["properties"]["items"]["items"],
        json!({"$ref": "#/components/schemas/Orders"})
    );
}

#[test]
fn test_end_to_end_constraints() {
    let document = generate_value("3.0.3");
    let create = &document["components"]["schemas"]["CreateUserDto"];

    assert_eq!(
        create,
        &json!({
            "type": "object",
            "properties": {
                "email": {"type": "string", "format": "email"},
                "password": {"type": "string", "minLength": 8},
                "age": {"type": "integer", "minimum": 0}
            },
            "required": ["email", "password"]
        })
    );
    // Constraints for a pruned class are ignored
    assert!(document["components"]["schemas"].get("AuditLogDto").is_none());
}

#[test]
fn test_end_to_end_security() {
    let document = generate_value("3.0.3");

    assert_eq!(document["security"], json!([{"bearer": []}]));
    assert_eq!(
        document["paths"]["/users"]["get"]["security"],
        json!([{"bearer": []}])
    );
    assert_eq!(
        document["paths"]["/users/{id}"]["delete"]["security"],
        json!([{"bearer": [], "oauth2": ["admin"]}])
    );
    assert_eq!(
        document["components"]["securitySchemes"]["bearer"]["bearerFormat"],
        "JWT"
    );
}

#[test]
fn test_end_to_end_parameters_and_bodies() {
    let document = generate_value("3.0.3");

    let list = &document["paths"]["/users"]["get"];
    assert_eq!(
        list["parameters"][0],
        json!({
            "name": "role",
            "in": "query",
            "required": false,
            "schema": {"type": "string", "enum": ["admin", "member"]}
        })
    );

    let orders = &document["paths"]["/users/{id}/orders"]["get"];
    let statuses: Vec<&String> = orders["responses"].as_object().unwrap().keys().collect();
    assert_eq!(statuses, vec!["200", "404"]);
    assert_eq!(orders["responses"]["404"], json!({"description": "User not found"}));

    let settings = &document["paths"]["/users/{id}/settings"]["patch"];
    assert_eq!(settings["deprecated"], true);
    assert_eq!(
        settings["requestBody"]["content"]["application/json"]["schema"],
        json!({
            "type": "object",
            "properties": {
                "settings": {
                    "type": "object",
                    "properties": {
                        "theme": {"type": "string"},
                        "notifications": {"type": "boolean"}
                    },
                    "required": ["theme"]
                },
                "reason": {"type": "string"}
            },
            "required": ["settings"]
        })
    );
    assert_eq!(
        settings["responses"]["200"]["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/UserSettings"})
    );
}

#[test]
fn test_end_to_end_openapi_31() {
    let document = generate_value("3.1.0");

    assert_eq!(document["openapi"], "3.1.0");
    assert_eq!(
        document["paths"]["/users/{id}"]["get"]["responses"]["200"]["content"]["application/json"]["schema"],
        json!({"anyOf": [
            {"allOf": [{"$ref": "#/components/schemas/UserDto"}]},
            {"type": "null"}
        ]})
    );
    assert_eq!(
        document["components"]["schemas"]["Profile"]["properties"]["bio"],
        json!({"type": ["string", "null"]})
    );
    assert!(!serde_json::to_string(&document).unwrap().contains("nullable"));
}

#[test]
fn test_output_is_deterministic() {
    let first = serialize_json(&generate("3.0.3").document).unwrap();
    let second = serialize_json(&generate("3.0.3").document).unwrap();
    assert_eq!(first, second);

    let first = serialize_yaml(&generate("3.1.0").document).unwrap();
    let second = serialize_yaml(&generate("3.1.0").document).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unresolved_references_reported() {
    let mut input = load_fixture();
    input.schemas.shift_remove("Profile");

    let mut builder = OpenApiBuilder::new(GeneratorConfig::default());
    for method in &input.methods {
        builder.add_method(method);
    }
    let result = builder.build(input.schemas, &input.constraints).unwrap();

    // The dangling alias stays, so the gap is visible
    assert_eq!(result.unresolved.get("Profile"), Some(&1));
    let schemas = result.document.components.unwrap().schemas;
    assert!(schemas.contains_key("ProfileAlias"));
}

#[test]
fn test_cli_run_with_fixture() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("openapi.config.yaml");
    std::fs::write(
        &config_path,
        "openapi: 3.0.3\ninfo:\n  title: Users API\n  version: 2.1.0\nservers:\n  - url: https://api.example.com\n",
    )
    .unwrap();
    let output_path = temp_dir.path().join("openapi.yaml");

    let args = CliArgs {
        input_path: PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("nest_project.json"),
        config_path: Some(config_path),
        output_format: OutputFormat::Yaml,
        output_path: Some(output_path.clone()),
        openapi_version: Some("3.1.0".to_string()),
        strict: true,
        verbose: false,
    };
    cli::run(cli::parse_args_from_parsed(args).unwrap()).unwrap();

    let content = std::fs::read_to_string(&output_path).unwrap();
    let document: Value = serde_yaml::from_str(&content).unwrap();
    assert_eq!(document["openapi"], "3.1.0");
    assert_eq!(document["info"]["version"], "2.1.0");
    assert_eq!(document["servers"][0]["url"], "https://api.example.com");
    assert!(document["components"]["schemas"]["Paginated<Orders>"].is_object());
}
