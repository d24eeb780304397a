//! JSON schema sent with schema-constrained tailoring calls.

use serde_json::{json, Value};

use crate::llm_client::JsonSchemaFormat;
use crate::tailoring::models::{MIN_BULLETS_PER_SECTION, MIN_SECTIONS};

pub const SCHEMA_NAME: &str = "TailorResponse";

/// The `TailorResponse` schema. Strict: every key required, no extra keys.
pub fn tailor_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": {"type": "string"},
            "improved_resume": {"type": "string"},
            "cover_letter": {"type": "string"},
            "sections": {
                "type": "array",
                "minItems": MIN_SECTIONS,
                "items": {
                    "type": "object",
                    "properties": {
                        "heading": {"type": "string"},
                        "bullets": {
                            "type": "array",
                            "items": {"type": "string"},
                            "minItems": MIN_BULLETS_PER_SECTION
                        }
                    },
                    "required": ["heading", "bullets"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["summary", "improved_resume", "cover_letter", "sections"],
        "additionalProperties": false
    })
}

pub fn tailor_response_format() -> JsonSchemaFormat {
    JsonSchemaFormat {
        name: SCHEMA_NAME,
        schema: tailor_response_schema(),
        strict: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_requires_all_top_level_fields() {
        let schema = tailor_response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            vec!["summary", "improved_resume", "cover_letter", "sections"]
        );
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_schema_cardinality_limits() {
        let schema = tailor_response_schema();
        let sections = &schema["properties"]["sections"];
        assert_eq!(sections["minItems"], 3);
        assert_eq!(sections["items"]["properties"]["bullets"]["minItems"], 2);
        assert_eq!(sections["items"]["additionalProperties"], false);
    }

    #[test]
    fn test_format_is_named_and_strict() {
        let format = tailor_response_format();
        assert_eq!(format.name, "TailorResponse");
        assert!(format.strict);
    }
}
