// ---------------------------------------------------------------------------
// handlers/docs.rs — Human docs and the machine-readable API document
// ---------------------------------------------------------------------------

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use utoipa::openapi::OpenApi;

use crate::models::CapabilitySummary;
use crate::openapi::{self, API_DESCRIPTION, API_TITLE};
use crate::provider::{Descriptor, ParamKind};
use crate::state::AppState;

/// GET /spec.json
pub async fn spec_json(State(state): State<AppState>) -> Json<OpenApi> {
    Json(openapi::generate(&state.registry))
}

/// GET /docs
pub async fn docs_index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state, None))
}

/// GET /docs/{name}
pub async fn docs_capability(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    if state.registry.lookup(&name).is_none() {
        let body = format!(
            "<!doctype html><html><body><h1>Not found</h1><p>No algorithm named <code>{}</code>.</p>\
             <p><a href=\"/docs\">All algorithms</a></p></body></html>",
            escape_html(&name)
        );
        return (StatusCode::NOT_FOUND, Html(body)).into_response();
    }
    Html(render_page(&state, Some(&name))).into_response()
}

fn summarize(descriptor: &Descriptor) -> CapabilitySummary {
    CapabilitySummary {
        name: descriptor.name.clone(),
        summary: descriptor.summary.clone(),
        inputs: descriptor
            .inputs
            .iter()
            .map(|p| {
                let kind = match p.kind {
                    ParamKind::File => "file",
                    ParamKind::Scalar => "scalar",
                    ParamKind::Structured => "structured",
                };
                let required = if p.required { ", required" } else { "" };
                format!("{} ({kind}{required})", p.name)
            })
            .collect(),
    }
}

fn render_page(state: &AppState, selected: Option<&str>) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str("<!doctype html><html><head><meta charset=\"utf-8\">");
    html.push_str(&format!("<title>{}</title></head><body>", escape_html(API_TITLE)));
    html.push_str(&format!(
        "<h1>{}</h1><p>{}</p><p><a href=\"/spec.json\">spec.json</a></p><ul>",
        escape_html(API_TITLE),
        escape_html(API_DESCRIPTION)
    ));

    for summary in state.registry.list().map(summarize) {
        let name = escape_html(&summary.name);
        let open = if selected == Some(summary.name.as_str()) {
            " id=\"selected\" class=\"selected\""
        } else {
            ""
        };
        html.push_str(&format!(
            "<li{open}><a href=\"/docs/{name}\"><strong>{name}</strong></a> <code>POST /{name}</code>"
        ));
        if let Some(text) = &summary.summary {
            html.push_str(&format!(" {}", escape_html(text)));
        }
        if !summary.inputs.is_empty() {
            html.push_str("<ul>");
            for input in &summary.inputs {
                html.push_str(&format!("<li>{}</li>", escape_html(input)));
            }
            html.push_str("</ul>");
        }
        html.push_str("</li>");
    }

    html.push_str("</ul></body></html>");
    html
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
