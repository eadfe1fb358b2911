use serde_json::{Map, Value};

use crate::error::CloudError;

/// Parse repeated `key=value` CLI arguments into an API parameter map.
///
/// Values that read as JSON scalars keep their type (`vmid=123` stays a
/// number, `full=true` a boolean); everything else is passed as a string.
pub fn parse_kv_params(args: &[String]) -> Result<Map<String, Value>, CloudError> {
    let mut params = Map::new();

    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            return Err(CloudError::InvalidValue(format!(
                "'{arg}' is not a 'key=value' parameter"
            )));
        };

        let parsed = match serde_json::from_str::<Value>(value) {
            Ok(scalar @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => scalar,
            _ => Value::String(value.to_string()),
        };
        params.insert(key.trim().to_string(), parsed);
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_keep_their_type() {
        let params =
            parse_kv_params(&["vmid=123".into(), "full=true".into(), "pool=dev".into()]).unwrap();
        assert_eq!(params.get("vmid").and_then(Value::as_u64), Some(123));
        assert_eq!(params.get("full").and_then(Value::as_bool), Some(true));
        assert_eq!(params.get("pool").and_then(Value::as_str), Some("dev"));
    }

    #[test]
    fn values_may_contain_equals_signs() {
        let params = parse_kv_params(&[
            "net0=name=eth0,bridge=vmbr0,ip=192.168.1.2/24".into(),
        ])
        .unwrap();
        assert_eq!(
            params.get("net0").and_then(Value::as_str),
            Some("name=eth0,bridge=vmbr0,ip=192.168.1.2/24")
        );
    }

    #[test]
    fn bare_words_are_rejected() {
        assert!(parse_kv_params(&["force".into()]).is_err());
    }
}
