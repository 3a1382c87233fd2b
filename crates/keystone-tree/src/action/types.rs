//! Serializable action call records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::path::Path;
use crate::snapshot::Snapshot;

/// Description of one action invocation, relative to a subtree root.
///
/// JSON form: `{"targetPath": [..], "actionName": "..", "args": [..]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCall {
    pub target_path: Path,
    pub action_name: String,
    #[serde(default)]
    pub args: Vec<Snapshot>,
}

impl ActionCall {
    pub fn new(target_path: Path, action_name: impl Into<String>, args: Vec<Snapshot>) -> Self {
        Self {
            target_path,
            action_name: action_name.into(),
            args,
        }
    }
}

pub fn serialize_action_call(call: &ActionCall) -> Result<Value> {
    Ok(serde_json::to_value(call)?)
}

pub fn deserialize_action_call(value: &Value) -> Result<ActionCall> {
    Ok(ActionCall::deserialize(value)?)
}

pub fn action_call_to_string(call: &ActionCall) -> Result<String> {
    Ok(serde_json::to_string(call)?)
}

pub fn action_call_from_str(s: &str) -> Result<ActionCall> {
    Ok(serde_json::from_str(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn camel_case_wire_form() {
        let call = ActionCall::new(vec!["todos".into(), "0".into()], "setDone", vec![true.into()]);
        let value = serialize_action_call(&call).unwrap();
        assert_eq!(
            value,
            json!({"targetPath": ["todos", "0"], "actionName": "setDone", "args": [true]})
        );
        assert_eq!(deserialize_action_call(&value).unwrap(), call);
    }

    #[test]
    fn args_default_to_empty() {
        let call = action_call_from_str(r#"{"targetPath": [], "actionName": "reset"}"#).unwrap();
        assert!(call.args.is_empty());
        let err = action_call_from_str(r#"{"actionName": "reset"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn simple_args_keep_their_tag() {
        let text = r#"{"targetPath":["f"],"actionName":"set","args":[{"$simple":"Fraction","data":[1,3]}]}"#;
        let call = action_call_from_str(text).unwrap();
        assert!(matches!(
            call.args[0].kind(),
            crate::snapshot::SnapshotKind::Simple { type_name, .. } if type_name == "Fraction"
        ));
        assert_eq!(action_call_to_string(&call).unwrap(), text);
    }
}
