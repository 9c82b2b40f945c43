use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no JSON object found in classifier response")]
    NoJsonObject,
    #[error("invalid JSON in classifier response: {0}")]
    Malformed(String),
}

/// Returns the first well-formed JSON object embedded in `text`.
///
/// Every `{` is tried as a start position; the streaming deserializer stops at
/// the end of the first complete value, so trailing prose is ignored.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    let mut last_error = None;

    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => return Ok(map),
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                last_error.get_or_insert_with(|| err.to_string());
            }
            None => {}
        }
    }

    match last_error {
        Some(message) => Err(ParseError::Malformed(message)),
        None => Err(ParseError::NoJsonObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_wrapped_in_prose() {
        let text = "Here is the result: {\"sortScore\":8,\"feedback\":\"tidy {mostly}\"} Thanks!";
        let map = extract_json_object(text).expect("object found");
        assert_eq!(map.get("sortScore"), Some(&Value::from(8)));
        assert_eq!(map.get("feedback"), Some(&Value::from("tidy {mostly}")));
    }

    #[test]
    fn skips_brace_fragments_before_the_object() {
        let text = "Scores {see below}: {\"sortScore\": 3} and {\"sortScore\": 9}";
        let map = extract_json_object(text).expect("object found");
        assert_eq!(map.get("sortScore"), Some(&Value::from(3)));
    }

    #[test]
    fn accepts_fenced_replies() {
        let text = "```json\n{\n  \"sortScore\": 7\n}\n```";
        assert!(extract_json_object(text).is_ok());
    }

    #[test]
    fn reports_missing_objects() {
        assert_eq!(
            extract_json_object("I cannot evaluate these photos."),
            Err(ParseError::NoJsonObject)
        );
    }

    #[test]
    fn reports_malformed_objects() {
        let err = extract_json_object("{\"sortScore\": 8,").expect_err("truncated json");
        assert!(matches!(err, ParseError::Malformed(_)));
    }
}
