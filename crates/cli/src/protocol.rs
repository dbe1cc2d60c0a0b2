use anyhow::{bail, Result};
use chat_core::Turn;
use serde::{Deserialize, Serialize};

/// What arrives on stdin. Both fields may be missing or `null`; an empty
/// message is rejected by the handler, not here.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<Turn>>,
}

/// What leaves on stdout (or stderr for diagnostics): exactly one key.
#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatResponse {
    Reply { response: String },
    Error { error: String },
}

impl ChatResponse {
    pub fn reply<S: Into<String>>(s: S) -> Self {
        ChatResponse::Reply { response: s.into() }
    }
    pub fn error<S: Into<String>>(s: S) -> Self {
        ChatResponse::Error { error: s.into() }
    }
}

pub fn parse_request(input: &str) -> Result<ChatRequest> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    if !value.is_object() {
        bail!("expected a JSON object");
    }
    Ok(ChatRequest::deserialize(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::Role;

    #[test]
    fn history_defaults_to_empty() {
        let r = parse_request(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(r.message.as_deref(), Some("hi"));
        assert!(r.history.is_none());
        let r = parse_request(r#"{"message":"hi","history":null}"#).unwrap();
        assert!(r.history.is_none());
    }

    #[test]
    fn history_turns_are_decoded() {
        let r = parse_request(
            r#"{"message":"m","history":[{"role":"user","content":"a"},{"role":"system","content":"b"}]}"#,
        )
        .unwrap();
        let h = r.history.unwrap();
        assert_eq!(h[0], Turn::user("a"));
        assert_eq!(h[1].role, Role::Other("system".into()));
    }

    #[test]
    fn malformed_turn_rejects_the_request() {
        assert!(parse_request(r#"{"message":"m","history":[{"role":"user"}]}"#).is_err());
        assert!(parse_request(r#"{"message":"m","history":[{"content":"x"}]}"#).is_err());
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(parse_request(r#"["hi", []]"#).is_err());
        assert!(parse_request("\"hi\"").is_err());
        assert!(parse_request("").is_err());
        assert!(parse_request(r#"{"message": 5}"#).is_err());
    }

    #[test]
    fn responses_have_a_single_key() {
        assert_eq!(
            serde_json::to_string(&ChatResponse::reply("好")).unwrap(),
            r#"{"response":"好"}"#
        );
        assert_eq!(
            serde_json::to_string(&ChatResponse::error("x")).unwrap(),
            r#"{"error":"x"}"#
        );
    }
}
