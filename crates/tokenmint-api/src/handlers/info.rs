//! Usage documentation endpoints.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::AppState;

pub async fn info() -> Json<Value> {
    Json(json!({
        "usage": {
            "endpoint": "/token",
            "method": "POST",
            "authentication": "Bearer token in Authorization header (required)",
            "example": "curl -X POST 'https://your-server.com/token' -H 'Authorization: Bearer your-api-key'"
        },
        "token_usage": {
            "description": "Use the returned access token to authenticate Document AI requests",
            "example": "curl -X POST 'https://documentai.googleapis.com/v1/projects/PROJECT/locations/LOCATION/processors/PROCESSOR:process' -H 'Authorization: Bearer ACCESS_TOKEN'"
        },
        "endpoints": {
            "GET /": "Liveness payload with uptime",
            "GET /health": "Detailed status with request counters",
            "GET /readiness": "Checks that the identity provider is reachable",
            "GET /liveness": "Process liveness",
            "POST /token": "Mint an access token",
            "GET /info": "This document"
        }
    }))
}

/// Machine-readable API description. Only routed outside production.
pub async fn openapi(State(state): State<Arc<AppState>>) -> Json<Value> {
    let token_schema = json!({
        "type": "object",
        "required": ["access_token", "token_type", "expires_in", "expires_at"],
        "properties": {
            "access_token": { "type": "string" },
            "token_type": { "type": "string", "example": "Bearer" },
            "expires_in": { "type": "integer" },
            "expires_at": { "type": "string", "format": "date-time" }
        }
    });
    let error_schema = json!({
        "type": "object",
        "properties": { "detail": { "type": "string" } }
    });
    let token_responses = json!({
        "200": {
            "description": "Token issued",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Token" } } }
        },
        "400": { "description": "Assertion rejected by the provider" },
        "401": { "description": "Missing or invalid API key" },
        "500": { "description": "Signing or upstream failure" },
        "502": { "description": "Provider unavailable" },
        "503": { "description": "Provider unreachable" },
        "504": { "description": "Provider timed out" }
    });

    let mut paths = serde_json::Map::new();
    for (path, summary) in [
        ("/", "Liveness payload"),
        ("/health", "Detailed status"),
        ("/readiness", "Provider reachability"),
        ("/liveness", "Process liveness"),
        ("/info", "Usage document"),
    ] {
        paths.insert(
            path.to_string(),
            json!({ "get": { "summary": summary, "responses": { "200": { "description": "OK" } } } }),
        );
    }
    paths.insert(
        "/token".to_string(),
        json!({
            "post": {
                "summary": "Mint an access token",
                "security": [{ "apiKey": [] }],
                "responses": token_responses
            }
        }),
    );

    Json(json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Tokenmint access token server",
            "description": "Generate access tokens for Document AI",
            "version": env!("CARGO_PKG_VERSION")
        },
        "servers": [{ "url": format!("http://{}", state.config.bind_addr()) }],
        "components": {
            "securitySchemes": { "apiKey": { "type": "http", "scheme": "bearer" } },
            "schemas": { "Token": token_schema, "Error": error_schema }
        },
        "paths": paths
    }))
}
