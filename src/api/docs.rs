//! API documentation served under /swagger.

use serde_json::{json, Value};

/// Minimal Swagger UI page loading the document from /swagger/doc.json.
pub const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Quality Backend API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({ url: "/swagger/doc.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;

/// OpenAPI description of the public endpoints.
pub fn openapi_document() -> Value {
    json!({
        "swagger": "2.0",
        "info": {
            "title": "Quality Backend API",
            "description": "Repository quality metadata served from a scheduled in-memory cache.",
            "version": env!("CARGO_PKG_VERSION"),
            "license": { "name": "MIT License" }
        },
        "basePath": "/",
        "schemes": ["http", "https"],
        "paths": {
            "/version": {
                "get": {
                    "summary": "Service version",
                    "produces": ["application/json"],
                    "responses": {
                        "200": { "description": "OK", "schema": { "$ref": "#/definitions/Version" } }
                    }
                }
            },
            "/quality/repositories": {
                "get": {
                    "summary": "Cached repository quality data",
                    "produces": ["application/json"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "schema": { "type": "array", "items": { "$ref": "#/definitions/Repository" } }
                        },
                        "500": { "description": "Cached data could not be encoded" }
                    }
                }
            }
        },
        "definitions": {
            "Version": {
                "type": "object",
                "properties": {
                    "version": { "type": "string" },
                    "commit": { "type": "string" }
                }
            },
            "Repository": {
                "type": "object",
                "properties": {
                    "git_organization": { "type": "string" },
                    "repository_name": { "type": "string" },
                    "git_url": { "type": "string" },
                    "description": { "type": "string" },
                    "code_coverage": { "type": "number" }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_endpoints() {
        let doc = openapi_document();
        assert!(doc["paths"]["/version"]["get"].is_object());
        assert!(doc["paths"]["/quality/repositories"]["get"].is_object());
        assert_eq!(doc["info"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_ui_page_is_complete() {
        assert!(SWAGGER_UI.contains(r##"dom_id: "#swagger-ui""##));
        assert!(SWAGGER_UI.contains("/swagger/doc.json"));
        assert!(SWAGGER_UI.trim_end().ends_with("</html>"));
    }
}
