//! OpenAPI documentation
//!
//! Provides the OpenAPI 3.0 specification and a Swagger UI page for the
//! Blastr API.

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde_json::json;

/// Create OpenAPI routes
pub fn create_openapi_routes() -> Router {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(swagger_ui))
}

/// OpenAPI JSON specification endpoint
async fn openapi_json() -> impl IntoResponse {
    Json(get_openapi_spec())
}

/// Swagger UI HTML endpoint
async fn swagger_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

/// Get the OpenAPI specification as JSON
fn get_openapi_spec() -> serde_json::Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Blastr API",
            "description": "REST API for the Blastr campaign dispatcher\n\n## Authentication\n\nAll endpoints except health checks require an API key.\n\n- **Header**: `X-API-Key: <your-api-key>`\n- **Bearer**: `Authorization: Bearer <your-api-key>`",
            "version": "1.0.0",
            "license": {
                "name": "Apache-2.0",
                "url": "https://www.apache.org/licenses/LICENSE-2.0"
            }
        },
        "servers": [
            {"url": "/api/v1", "description": "API v1"}
        ],
        "tags": [
            {"name": "health", "description": "Health check endpoints"},
            {"name": "campaigns", "description": "Campaign lifecycle"},
            {"name": "credits", "description": "Credit ledger"}
        ],
        "paths": {
            "/tenants/{tenantId}/campaigns": {
                "get": {
                    "tags": ["campaigns"],
                    "summary": "List campaigns",
                    "operationId": "listCampaigns",
                    "parameters": [
                        {"$ref": "#/components/parameters/TenantId"},
                        {"name": "status", "in": "query", "schema": {"$ref": "#/components/schemas/CampaignStatus"}},
                        {"name": "limit", "in": "query", "schema": {"type": "integer", "default": 50}},
                        {"name": "offset", "in": "query", "schema": {"type": "integer", "default": 0}}
                    ],
                    "responses": {
                        "200": {"description": "Campaign list"}
                    }
                },
                "post": {
                    "tags": ["campaigns"],
                    "summary": "Create a campaign and start dispatching it",
                    "operationId": "createCampaign",
                    "parameters": [{"$ref": "#/components/parameters/TenantId"}],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {"$ref": "#/components/schemas/CreateCampaignRequest"}
                            }
                        }
                    },
                    "responses": {
                        "201": {"description": "Campaign created and running"},
                        "400": {"description": "Validation error"},
                        "402": {"description": "Insufficient credits"},
                        "409": {"description": "Gateway instance not connected"},
                        "429": {"description": "Daily send limit exceeded"}
                    }
                }
            },
            "/tenants/{tenantId}/campaigns/{campaignId}": {
                "get": {
                    "tags": ["campaigns"],
                    "summary": "Get a campaign with its batches and sends",
                    "operationId": "getCampaign",
                    "parameters": [
                        {"$ref": "#/components/parameters/TenantId"},
                        {"$ref": "#/components/parameters/CampaignId"}
                    ],
                    "responses": {
                        "200": {"description": "Campaign detail"},
                        "404": {"description": "Campaign not found"}
                    }
                },
                "put": {
                    "tags": ["campaigns"],
                    "summary": "Edit a campaign (rejected while running)",
                    "operationId": "updateCampaign",
                    "parameters": [
                        {"$ref": "#/components/parameters/TenantId"},
                        {"$ref": "#/components/parameters/CampaignId"}
                    ],
                    "responses": {
                        "200": {"description": "Campaign updated"},
                        "409": {"description": "Campaign is running"}
                    }
                },
                "delete": {
                    "tags": ["campaigns"],
                    "summary": "Delete a campaign (rejected while running)",
                    "operationId": "deleteCampaign",
                    "parameters": [
                        {"$ref": "#/components/parameters/TenantId"},
                        {"$ref": "#/components/parameters/CampaignId"}
                    ],
                    "responses": {
                        "204": {"description": "Campaign deleted"},
                        "409": {"description": "Campaign is running"}
                    }
                }
            },
            "/tenants/{tenantId}/campaigns/{campaignId}/pause": {
                "post": {
                    "tags": ["campaigns"],
                    "summary": "Pause a running campaign at the next batch boundary",
                    "operationId": "pauseCampaign",
                    "parameters": [
                        {"$ref": "#/components/parameters/TenantId"},
                        {"$ref": "#/components/parameters/CampaignId"}
                    ],
                    "responses": {
                        "200": {"description": "Campaign paused"},
                        "409": {"description": "Campaign is not running"}
                    }
                }
            },
            "/tenants/{tenantId}/campaigns/{campaignId}/resume": {
                "post": {
                    "tags": ["campaigns"],
                    "summary": "Resume a paused campaign from its earliest pending batch",
                    "operationId": "resumeCampaign",
                    "parameters": [
                        {"$ref": "#/components/parameters/TenantId"},
                        {"$ref": "#/components/parameters/CampaignId"}
                    ],
                    "responses": {
                        "200": {"description": "Campaign resumed"},
                        "409": {"description": "Campaign is not paused"}
                    }
                }
            },
            "/tenants/{tenantId}/campaigns/{campaignId}/restart": {
                "post": {
                    "tags": ["campaigns"],
                    "summary": "Restart a completed or failed campaign from scratch",
                    "operationId": "restartCampaign",
                    "parameters": [
                        {"$ref": "#/components/parameters/TenantId"},
                        {"$ref": "#/components/parameters/CampaignId"}
                    ],
                    "responses": {
                        "200": {"description": "Campaign restarted"},
                        "402": {"description": "Insufficient credits"},
                        "409": {"description": "Campaign is not restartable"},
                        "429": {"description": "Daily send limit exceeded"}
                    }
                }
            },
            "/tenants/{tenantId}/campaigns/{campaignId}/stats": {
                "get": {
                    "tags": ["campaigns"],
                    "summary": "Get campaign statistics",
                    "operationId": "getCampaignStats",
                    "parameters": [
                        {"$ref": "#/components/parameters/TenantId"},
                        {"$ref": "#/components/parameters/CampaignId"}
                    ],
                    "responses": {
                        "200": {"description": "Campaign statistics"}
                    }
                }
            },
            "/tenants/{tenantId}/credits": {
                "get": {
                    "tags": ["credits"],
                    "summary": "Get the tenant credit balance",
                    "operationId": "getBalance",
                    "parameters": [{"$ref": "#/components/parameters/TenantId"}],
                    "responses": {
                        "200": {"description": "Current balance"}
                    }
                },
                "post": {
                    "tags": ["credits"],
                    "summary": "Top up the tenant credit balance",
                    "operationId": "topUp",
                    "parameters": [{"$ref": "#/components/parameters/TenantId"}],
                    "responses": {
                        "200": {"description": "New balance"},
                        "400": {"description": "Non-positive amount"}
                    }
                }
            }
        },
        "components": {
            "parameters": {
                "TenantId": {
                    "name": "tenantId",
                    "in": "path",
                    "required": true,
                    "schema": {"type": "string", "format": "uuid"}
                },
                "CampaignId": {
                    "name": "campaignId",
                    "in": "path",
                    "required": true,
                    "schema": {"type": "string", "format": "uuid"}
                }
            },
            "schemas": {
                "CampaignStatus": {
                    "type": "string",
                    "enum": ["pending", "running", "paused", "completed", "failed"]
                },
                "CreateCampaignRequest": {
                    "type": "object",
                    "required": ["name", "instance_id", "contact_ids"],
                    "properties": {
                        "name": {"type": "string"},
                        "message_text": {"type": "string", "nullable": true},
                        "media": {
                            "type": "object",
                            "nullable": true,
                            "required": ["url", "mime_type"],
                            "properties": {
                                "url": {"type": "string"},
                                "mime_type": {"type": "string"},
                                "caption": {"type": "string", "nullable": true},
                                "file_name": {"type": "string", "nullable": true}
                            }
                        },
                        "instance_id": {"type": "string", "format": "uuid"},
                        "contact_ids": {
                            "type": "array",
                            "items": {"type": "string", "format": "uuid"}
                        }
                    }
                }
            },
            "securitySchemes": {
                "ApiKeyAuth": {"type": "apiKey", "in": "header", "name": "X-API-Key"},
                "BearerAuth": {"type": "http", "scheme": "bearer"}
            }
        },
        "security": [
            {"ApiKeyAuth": []},
            {"BearerAuth": []}
        ]
    })
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Blastr API Docs</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            SwaggerUIBundle({
                url: '/openapi.json',
                dom_id: '#swagger-ui',
            });
        };
    </script>
</body>
</html>
"#;
