//! JSON interchange between host values and engine text.

use serde_json::Value;

/// Serialize an argument list as a JSON array.
pub fn encode_args(args: &[Value]) -> serde_json::Result<String> {
    serde_json::to_string(args)
}

/// Parse `text` as a single JSON value, or `None` if it is not valid JSON.
pub fn decode(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn encodes_array() {
        assert_eq!(encode_args(&[json!(1), json!(2)]).unwrap(), "[1,2]");
        assert_eq!(encode_args(&[]).unwrap(), "[]");
        assert_eq!(
            encode_args(&[json!(null), json!("a\"b"), json!({"k": [true]})]).unwrap(),
            r#"[null,"a\"b",{"k":[true]}]"#
        );
    }

    #[test]
    fn decodes_every_shape() {
        assert_eq!(decode("2"), Some(json!(2)));
        assert_eq!(decode("-1.5e3"), Some(json!(-1500.0)));
        assert_eq!(decode("\"hi\""), Some(json!("hi")));
        assert_eq!(decode("false"), Some(json!(false)));
        assert_eq!(decode("null"), Some(Value::Null));
        assert_eq!(
            decode(r#" {"a": [1, {"b": null}]} "#),
            Some(json!({"a": [1, {"b": null}]}))
        );
    }

    #[test]
    fn rejects_non_json() {
        assert_eq!(decode("undefined"), None);
        assert_eq!(decode("Variable not found: x"), None);
        assert_eq!(decode(""), None);
        assert_eq!(decode("1 2"), None);
    }

    #[test]
    fn nested_values_survive_encoding() {
        let args = vec![json!({"list": [1, 2.5, "x"], "flag": true}), json!([[], {}])];
        let decoded = decode(&encode_args(&args).unwrap()).unwrap();
        assert_eq!(decoded, Value::Array(args));
    }
}
