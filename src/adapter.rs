//! Session payload adapter
//!
//! Decodes session lists exported by the host app (JSON array or NDJSON) into
//! [`SessionRecord`]s. Elements that cannot be decoded as a session object are
//! skipped and counted so one corrupt document never hides the rest.

use crate::error::InsightsError;
use crate::types::SessionRecord;
use serde::Serialize;

/// Decoded records plus the elements that were skipped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedSessions {
    pub records: Vec<SessionRecord>,
    pub skipped: Vec<SkippedElement>,
}

/// A JSON element that is not a session object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedElement {
    /// Array index or zero-based line number
    pub position: usize,
    pub error: String,
}

/// Adapter for converting session JSON into records
pub struct SessionAdapter;

impl SessionAdapter {
    /// Parse a JSON array of session objects
    pub fn parse_array(json: &str) -> Result<ParsedSessions, InsightsError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let elements = match value {
            serde_json::Value::Array(elements) => elements,
            // Some exports wrap the list: {"sessions": [...]}
            serde_json::Value::Object(mut map) => match map.remove("sessions") {
                Some(serde_json::Value::Array(elements)) => elements,
                _ => {
                    return Err(InsightsError::ParseError(
                        "Expected a JSON array of sessions or an object with a \"sessions\" array"
                            .to_string(),
                    ))
                }
            },
            _ => {
                return Err(InsightsError::ParseError(
                    "Expected a JSON array of sessions".to_string(),
                ))
            }
        };

        let mut parsed = ParsedSessions::default();
        for (position, element) in elements.into_iter().enumerate() {
            parsed.push(position, serde_json::from_value(element));
        }
        Ok(parsed)
    }

    /// Parse NDJSON (one session object per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<ParsedSessions, InsightsError> {
        let mut parsed = ParsedSessions::default();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            // A line that is not JSON at all means the file itself is broken
            let value: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                InsightsError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            parsed.push(line_num, serde_json::from_value(value));
        }
        Ok(parsed)
    }
}

impl ParsedSessions {
    fn push(&mut self, position: usize, result: Result<SessionRecord, serde_json::Error>) {
        match result {
            Ok(record) => self.records.push(record),
            Err(e) => {
                tracing::warn!(position, error = %e, "Skipping undecodable session element");
                self.skipped.push(SkippedElement {
                    position,
                    error: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawTimestamp, TimestampWrapper};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_mixed_timestamp_formats() {
        let json = r#"[
            {"id": "iso", "createdAt": "2024-06-10T09:00:00Z", "durationSeconds": 600, "title": "Morning calm"},
            {"id": "epoch", "created_at": 1718010000, "duration_seconds": "300"},
            {"id": "wrapper", "createdAt": {"_seconds": 1718010000, "_nanoseconds": 0}},
            {"id": 42, "timestamp": {"seconds": 1718010000, "nanoseconds": 5}, "duration": null}
        ]"#;

        let parsed = SessionAdapter::parse_array(json).unwrap();
        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.records.len(), 4);

        let first = &parsed.records[0];
        assert_eq!(
            first.created_at,
            Some(RawTimestamp::Iso("2024-06-10T09:00:00Z".to_string()))
        );
        assert_eq!(first.duration_seconds, Some(600.0));
        assert_eq!(first.title.as_deref(), Some("Morning calm"));

        assert_eq!(
            parsed.records[1].created_at,
            Some(RawTimestamp::EpochSeconds(1_718_010_000.0))
        );
        assert_eq!(parsed.records[1].duration_seconds, Some(300.0));

        assert_eq!(
            parsed.records[2].created_at,
            Some(RawTimestamp::Wrapper(TimestampWrapper {
                seconds: 1_718_010_000,
                nanoseconds: 0,
            }))
        );

        assert_eq!(parsed.records[3].id, "42");
        assert_eq!(parsed.records[3].duration_seconds, None);
    }

    #[test]
    fn test_odd_field_values_do_not_fail_the_list() {
        let json = r#"[
            {"id": "a", "createdAt": true, "durationSeconds": "long"},
            {"id": "b", "createdAt": null},
            {"id": "c"}
        ]"#;

        let parsed = SessionAdapter::parse_array(json).unwrap();
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(
            parsed.records[0].created_at,
            Some(RawTimestamp::Unrecognized(serde_json::Value::Bool(true)))
        );
        assert_eq!(parsed.records[0].duration_seconds, None);
        assert_eq!(parsed.records[1].created_at, None);
        assert_eq!(parsed.records[2].created_at, None);
    }

    #[test]
    fn test_non_object_elements_skipped() {
        let parsed = SessionAdapter::parse_array(r#"[{"id": "a"}, 7, "x"]"#).unwrap();
        assert_eq!(parsed.records.len(), 1);
        let positions: Vec<usize> = parsed.skipped.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn test_field_given_under_two_names_skips_only_that_element() {
        let json = r#"[
            {"id": "both", "createdAt": 1718010000, "created_at": 1718010000},
            {"id": "ok", "createdAt": 1718010000}
        ]"#;

        let parsed = SessionAdapter::parse_array(json).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id, "ok");
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].position, 0);
        assert!(parsed.skipped[0].error.contains("duplicate field"));
    }

    #[test]
    fn test_wrapped_object() {
        let parsed =
            SessionAdapter::parse_array(r#"{"sessions": [{"id": "a", "createdAt": 0}]}"#).unwrap();
        assert_eq!(parsed.records.len(), 1);

        assert!(SessionAdapter::parse_array(r#"{"items": []}"#).is_err());
        assert!(SessionAdapter::parse_array("not json").is_err());
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = "{\"id\": \"a\", \"createdAt\": \"2024-06-10T09:00:00Z\"}\n\n{\"id\": \"b\", \"createdAt\": 1718010000}\n";
        let parsed = SessionAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(parsed.records.len(), 2);

        let err = SessionAdapter::parse_ndjson("{\"id\": \"a\"}\n{broken").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
