// Contract test for the generated OpenAPI document of the built-in provider.

use std::sync::Arc;

use cloudcv_backend::native::NativeProvider;
use cloudcv_backend::openapi;
use cloudcv_backend::registry::Registry;

fn document() -> serde_json::Value {
    let registry = Registry::build(Arc::new(NativeProvider::new())).unwrap();
    serde_json::to_value(openapi::generate(&registry)).expect("Schema should convert to Value")
}

#[test]
fn openapi_schema_is_valid_json() {
    let registry = Registry::build(Arc::new(NativeProvider::new())).unwrap();
    let schema = openapi::generate(&registry)
        .to_pretty_json()
        .expect("OpenAPI schema should serialize to JSON");
    assert!(schema.contains("\"openapi\""), "Schema should contain 'openapi' version field");
    assert!(schema.contains("CloudCV"), "Schema should contain project name");
}

#[test]
fn openapi_schema_documents_every_capability() {
    let doc = document();
    for (name, cap) in [("dominantColors", "DominantColors"), ("buildInformation", "BuildInformation")] {
        let item = &doc["paths"][format!("/{name}")];
        assert!(item["get"].is_object(), "{name} should have a describe operation");
        assert_eq!(item["post"]["operationId"], name);
        assert!(doc["components"]["schemas"][format!("{cap}Input")].is_object());
        assert!(doc["components"]["schemas"][format!("{cap}Result")].is_object());
    }
}

#[test]
fn dominant_colors_input_is_multipart_with_binary_image() {
    let doc = document();
    let input = &doc["components"]["schemas"]["DominantColorsInput"];
    assert_eq!(input["properties"]["image"]["type"], "string");
    assert_eq!(input["properties"]["image"]["format"], "binary");
    assert_eq!(input["properties"]["count"]["minimum"], 1.0);
    assert_eq!(input["properties"]["count"]["maximum"], 16.0);

    let body = &doc["paths"]["/dominantColors"]["post"]["requestBody"]["content"];
    assert!(body["multipart/form-data"].is_object());
    assert!(body["application/json"].is_object());
}

#[test]
fn openapi_schema_parses_to_valid_structure() {
    let value = document();
    assert!(value.is_object(), "Schema root should be an object");
    assert_eq!(value["info"]["title"], "CloudCV");
    assert_eq!(value["info"]["license"]["name"], "Apache 2.0");
    assert_eq!(value["servers"][0]["url"], "/");
}
