// ---------------------------------------------------------------------------
// openapi.rs — API document derived from the capability registry
// ---------------------------------------------------------------------------
//
// Pure function of the registry snapshot. Every map in utoipa's model is
// ordered, so the same registry always yields byte-identical JSON.

use serde_json::Value;
use utoipa::openapi::content::ContentBuilder;
use utoipa::openapi::info::{ContactBuilder, InfoBuilder, LicenseBuilder};
use utoipa::openapi::path::{
    HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItem, PathItemBuilder,
    PathsBuilder,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::ResponseBuilder;
use utoipa::openapi::schema::{ComponentsBuilder, ObjectBuilder, Ref, Schema, SchemaFormat, Type};
use utoipa::openapi::server::ServerBuilder;
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{OpenApi, OpenApiBuilder, RefOr, Required};

use crate::provider::{Descriptor, ParamKind, ParamSpec};
use crate::registry::Registry;

// ── Static document metadata ────────────────────────────────────────────────

pub const API_TITLE: &str = "CloudCV";
pub const API_DESCRIPTION: &str = "Image processing algorithms exposed as a REST API.";
pub const API_CONTACT_EMAIL: &str = "ekhvedchenya@gmail.com";
pub const API_LICENSE: &str = "Apache 2.0";
pub const API_LICENSE_URL: &str = "http://www.apache.org/licenses/LICENSE-2.0.html";
pub const API_BASE_PATH: &str = "/";

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn input_schema_name(capability: &str) -> String {
    format!("{}Input", capitalize(capability))
}

pub fn result_schema_name(capability: &str) -> String {
    format!("{}Result", capitalize(capability))
}

/// Build the API document for every registered capability.
pub fn generate(registry: &Registry) -> OpenApi {
    let info = InfoBuilder::new()
        .title(API_TITLE)
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(API_DESCRIPTION))
        .contact(Some(ContactBuilder::new().email(Some(API_CONTACT_EMAIL)).build()))
        .license(Some(
            LicenseBuilder::new()
                .name(API_LICENSE)
                .url(Some(API_LICENSE_URL))
                .build(),
        ))
        .build();

    let mut paths = PathsBuilder::new();
    let mut components = ComponentsBuilder::new();
    let mut tags = Vec::new();

    for descriptor in registry.list() {
        let name = descriptor.name.as_str();
        paths = paths.path(format!("/{name}"), path_item(descriptor));
        components = components
            .schema(input_schema_name(name), input_schema(descriptor))
            .schema(result_schema_name(name), result_schema(&descriptor.output_schema));

        let mut tag = TagBuilder::new().name(name);
        if let Some(summary) = &descriptor.summary {
            tag = tag.description(Some(summary.clone()));
        }
        tags.push(tag.build());
    }

    OpenApiBuilder::new()
        .info(info)
        .servers(Some(vec![ServerBuilder::new().url(API_BASE_PATH).build()]))
        .paths(paths.build())
        .components(Some(components.build()))
        .tags(Some(tags))
        .build()
}

fn path_item(descriptor: &Descriptor) -> PathItem {
    let name = descriptor.name.as_str();
    let cap = capitalize(name);

    let describe = OperationBuilder::new()
        .tag(name)
        .summary(Some("Returns information about algorithm"))
        .operation_id(Some(format!("get{cap}Info")))
        .response(
            "200",
            ResponseBuilder::new()
                .description("Algorithm descriptor")
                .content("application/json", ContentBuilder::new().build())
                .build(),
        )
        .response("404", ResponseBuilder::new().description("Unknown capability").build())
        .build();

    let input_ref = || RefOr::Ref(Ref::from_schema_name(input_schema_name(name)));
    let body = RequestBodyBuilder::new()
        .description(Some("Input arguments"))
        .content(
            "multipart/form-data",
            ContentBuilder::new().schema(Some(input_ref())).build(),
        )
        .content(
            "application/json",
            ContentBuilder::new().schema(Some(input_ref())).build(),
        )
        .required(Some(Required::True))
        .build();

    let mut invoke = OperationBuilder::new()
        .tag(name)
        .summary(Some(
            descriptor
                .summary
                .clone()
                .unwrap_or_else(|| "Invokes method".to_string()),
        ))
        .operation_id(Some(name))
        .request_body(Some(body));

    // Scalars may also travel in the query string.
    for input in descriptor.inputs.iter().filter(|p| p.kind == ParamKind::Scalar) {
        invoke = invoke.parameter(
            ParameterBuilder::new()
                .name(input.name.clone())
                .parameter_in(ParameterIn::Query)
                .required(Required::False)
                .description(input.description.clone())
                .schema(Some(param_schema(input)))
                .build(),
        );
    }

    let invoke = invoke
        .response(
            "200",
            ResponseBuilder::new()
                .description("successful operation")
                .content(
                    "application/json",
                    ContentBuilder::new()
                        .schema(Some(RefOr::Ref(Ref::from_schema_name(result_schema_name(name)))))
                        .build(),
                )
                .build(),
        )
        .response("400", ResponseBuilder::new().description("Missing or invalid input").build())
        .response("404", ResponseBuilder::new().description("Unknown capability").build())
        .response("413", ResponseBuilder::new().description("Payload too large").build())
        .response("500", ResponseBuilder::new().description("Algorithm failed").build())
        .build();

    PathItemBuilder::new()
        .operation(HttpMethod::Get, describe)
        .operation(HttpMethod::Post, invoke)
        .build()
}

fn input_schema(descriptor: &Descriptor) -> Schema {
    let mut object = ObjectBuilder::new().schema_type(Type::Object);
    for input in &descriptor.inputs {
        object = object.property(input.name.clone(), param_schema(input));
        if input.required {
            object = object.required(input.name.clone());
        }
    }
    Schema::Object(object.build())
}

fn param_schema(param: &ParamSpec) -> Schema {
    let object = match (param.kind, param.range) {
        (ParamKind::File, _) => ObjectBuilder::new()
            .schema_type(Type::String)
            .format(Some(SchemaFormat::Custom("binary".to_string())))
            .description(Some(
                param
                    .description
                    .clone()
                    .unwrap_or_else(|| "File upload or absolute http(s) URL".to_string()),
            )),
        (ParamKind::Scalar, Some(range)) => ObjectBuilder::new()
            .schema_type(Type::Number)
            .minimum(Some(range.min))
            .maximum(Some(range.max))
            .default(Some(Value::from(range.default)))
            .description(param.description.clone()),
        (ParamKind::Scalar, None) => ObjectBuilder::new()
            .schema_type(Type::String)
            .description(param.description.clone()),
        (ParamKind::Structured, _) => ObjectBuilder::new()
            .schema_type(Type::Object)
            .description(param.description.clone()),
    };
    Schema::Object(object.build())
}

/// The provider's output schema when it reads as a JSON schema, otherwise a
/// free-form object.
fn result_schema(output: &Value) -> Schema {
    if output.as_object().is_some_and(|o| !o.is_empty()) {
        if let Ok(schema) = serde_json::from_value::<Schema>(output.clone()) {
            return schema;
        }
    }
    Schema::Object(ObjectBuilder::new().schema_type(Type::Object).build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::provider::{ArgumentMap, CapabilityProvider, ProviderError};

    struct Fixed;

    #[async_trait]
    impl CapabilityProvider for Fixed {
        fn list_capabilities(&self) -> Result<Vec<String>, ProviderError> {
            Ok(vec!["houghLines".into(), "dominantColors".into()])
        }

        fn describe(&self, name: &str) -> Result<Descriptor, ProviderError> {
            Descriptor::new(
                name,
                Some("test algorithm"),
                vec![
                    ParamSpec::file("image"),
                    ParamSpec::ranged("threshold", 0.0, 10.0, 255.0),
                    ParamSpec::structured("roi", false),
                ],
                json!({ "type": "object", "properties": { "lines": { "type": "array" } } }),
            )
        }

        async fn invoke(&self, _name: &str, _args: ArgumentMap) -> Result<Value, ProviderError> {
            Ok(Value::Null)
        }
    }

    fn registry() -> Registry {
        Registry::build(Arc::new(Fixed)).unwrap()
    }

    #[test]
    fn capitalizes_first_letter_only() {
        assert_eq!(capitalize("houghLines"), "HoughLines");
        assert_eq!(capitalize(""), "");
        assert_eq!(input_schema_name("dominantColors"), "DominantColorsInput");
        assert_eq!(result_schema_name("dominantColors"), "DominantColorsResult");
    }

    #[test]
    fn generation_is_idempotent() {
        let registry = registry();
        let first = generate(&registry).to_pretty_json().unwrap();
        let second = generate(&registry).to_pretty_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn every_capability_gets_describe_and_invoke() {
        let doc = serde_json::to_value(generate(&registry())).unwrap();
        for (name, cap) in [("houghLines", "HoughLines"), ("dominantColors", "DominantColors")] {
            let item = &doc["paths"][format!("/{name}")];
            assert_eq!(item["get"]["operationId"], format!("get{cap}Info"));
            assert_eq!(item["post"]["operationId"], name);
            assert_eq!(
                item["post"]["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
                format!("#/components/schemas/{cap}Result")
            );
            assert!(doc["components"]["schemas"][format!("{cap}Input")].is_object());
        }
    }

    #[test]
    fn input_schema_reflects_descriptor() {
        let doc = serde_json::to_value(generate(&registry())).unwrap();
        let input = &doc["components"]["schemas"]["HoughLinesInput"];
        assert_eq!(input["required"], json!(["image"]));
        assert_eq!(input["properties"]["image"]["format"], "binary");
        assert_eq!(input["properties"]["threshold"]["maximum"], json!(255.0));
        assert_eq!(input["properties"]["threshold"]["default"], json!(10.0));
    }

    #[test]
    fn static_metadata_is_fixed() {
        let doc = serde_json::to_value(generate(&registry())).unwrap();
        assert_eq!(doc["info"]["title"], API_TITLE);
        assert_eq!(doc["info"]["license"]["name"], API_LICENSE);
        assert_eq!(doc["servers"][0]["url"], API_BASE_PATH);
    }
}
