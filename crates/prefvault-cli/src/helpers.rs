//! Parsing helpers for preference payloads and flag assignments.

use std::io::Read;

use prefvault_core::PreferenceMapping;
use serde_json::Value;

use crate::errors::CliError;

/// Read a payload argument, where "-" means stdin.
pub fn read_payload(arg: &str) -> anyhow::Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    Ok(buffer)
}

/// Parse a JSON object of event type to boolean.
///
/// A body of the form `{"preferences": {...}}` is unwrapped first, so the
/// same document accepted by an API handler can be piped in unchanged.
pub fn parse_preferences(payload: &str) -> anyhow::Result<PreferenceMapping> {
    let value: Value = serde_json::from_str(payload.trim())
        .map_err(|e| CliError::invalid_input(format!("Invalid JSON payload: {}", e)))?;

    let object = match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("preferences") => {
            match map.remove("preferences") {
                Some(Value::Object(inner)) => inner,
                _ => {
                    return Err(
                        CliError::invalid_input("\"preferences\" must be a JSON object").into(),
                    )
                }
            }
        }
        Value::Object(map) => map,
        _ => return Err(CliError::invalid_input("Preferences must be a JSON object").into()),
    };

    let mut mapping = PreferenceMapping::new();
    for (event, flag) in object {
        let Value::Bool(enabled) = &flag else {
            return Err(CliError::invalid_input(format!(
                "Preference \"{}\" must be true or false, got {}",
                event, flag
            ))
            .into());
        };
        mapping.insert(event, *enabled);
    }
    Ok(mapping)
}

/// Parse `event=bool` assignments into a partial mapping.
pub fn parse_assignments(assignments: &[String]) -> anyhow::Result<PreferenceMapping> {
    let mut mapping = PreferenceMapping::new();
    for assignment in assignments {
        let (event, flag) = parse_assignment(assignment)?;
        mapping.insert(event, flag);
    }
    Ok(mapping)
}

fn parse_assignment(value: &str) -> anyhow::Result<(String, bool)> {
    let (event, flag) = value.split_once('=').ok_or_else(|| {
        CliError::invalid_input(format!(
            "Invalid assignment: {} (expected EVENT=true|false)",
            value
        ))
    })?;
    let event = event.trim();
    if event.is_empty() {
        return Err(CliError::invalid_input(format!("Missing event name in: {}", value)).into());
    }
    let flag = match flag.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => true,
        "false" | "off" | "no" => false,
        other => {
            return Err(CliError::invalid_input(format!(
                "Invalid flag for {}: {} (use true or false)",
                event, other
            ))
            .into())
        }
    };
    Ok((event.to_string(), flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exit_code(err: &anyhow::Error) -> Option<i32> {
        err.downcast_ref::<CliError>().map(CliError::exit_code)
    }

    #[test]
    fn test_parse_plain_object() {
        let mapping = parse_preferences(r#"{"order_created": true, "newsletter": false}"#).unwrap();
        assert_eq!(mapping.get("order_created"), Some(&true));
        assert_eq!(mapping.get("newsletter"), Some(&false));
    }

    #[test]
    fn test_parse_wrapped_object() {
        let mapping = parse_preferences(r#"{"preferences": {"x": true}}"#).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("x"), Some(&true));
    }

    #[test]
    fn test_preferences_key_alongside_others_is_a_flag_name() {
        let err = parse_preferences(r#"{"preferences": {"x": true}, "y": false}"#).unwrap_err();
        assert!(err.to_string().contains("\"preferences\" must be true or false"));
    }

    #[test]
    fn test_empty_object_is_valid() {
        assert!(parse_preferences("{}").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_object_and_non_bool() {
        use crate::constants::exit_codes::INVALID_INPUT;

        for payload in ["[]", "true", "\"x\"", r#"{"x": 1}"#, r#"{"x": "true"}"#, "{"] {
            let err = parse_preferences(payload).unwrap_err();
            assert_eq!(exit_code(&err), Some(INVALID_INPUT), "payload {}", payload);
        }
    }

    #[test]
    fn test_parse_assignments() {
        let mapping = parse_assignments(&[
            "order_created=true".to_string(),
            "newsletter=off".to_string(),
            " digest = YES ".to_string(),
        ])
        .unwrap();
        assert_eq!(mapping.get("order_created"), Some(&true));
        assert_eq!(mapping.get("newsletter"), Some(&false));
        assert_eq!(mapping.get("digest"), Some(&true));
    }

    #[test]
    fn test_later_assignment_wins() {
        let mapping = parse_assignments(&["a=true".to_string(), "a=false".to_string()]).unwrap();
        assert_eq!(mapping.get("a"), Some(&false));
    }

    #[test]
    fn test_bad_assignments() {
        assert!(parse_assignment("order_created").is_err());
        assert!(parse_assignment("=true").is_err());
        assert!(parse_assignment("x=maybe").is_err());
    }
}
