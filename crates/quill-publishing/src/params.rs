//! Positional parameter extraction for bound methods.
//!
//! Bound closures receive `Vec<Value>` after lenient casting, so a
//! parameter can still arrive with the wrong type. These helpers turn
//! that into an `anyhow` error that surfaces as an execution fault.

use anyhow::bail;

use quill_api::value::Value;

pub(crate) fn value_at<'a>(params: &'a [Value], index: usize, name: &str) -> anyhow::Result<&'a Value> {
    match params.get(index) {
        Some(value) => Ok(value),
        None => bail!("missing parameter '{name}'"),
    }
}

pub(crate) fn string_at(params: &[Value], index: usize, name: &str) -> anyhow::Result<String> {
    let value = value_at(params, index, name)?;
    match value.as_str() {
        Some(text) => Ok(text.to_string()),
        None => bail!("parameter '{name}' is a {}, not a string", value.type_name()),
    }
}

pub(crate) fn int_at(params: &[Value], index: usize, name: &str) -> anyhow::Result<i64> {
    let value = value_at(params, index, name)?;
    match value.as_i64() {
        Some(number) => Ok(number),
        None => bail!("parameter '{name}' is a {}, not an integer", value.type_name()),
    }
}

pub(crate) fn flag_at(params: &[Value], index: usize, name: &str) -> anyhow::Result<bool> {
    let value = value_at(params, index, name)?;
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Int(number) => Ok(*number != 0),
        other => bail!("parameter '{name}' is a {}, not a boolean", other.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_at_reports_the_wrong_type() {
        let params = vec![Value::Int(3)];
        let err = string_at(&params, 0, "blogid").expect_err("not a string");
        assert_eq!(err.to_string(), "parameter 'blogid' is a int, not a string");
    }

    #[test]
    fn missing_parameters_are_named() {
        let err = int_at(&[], 2, "numberOfPosts").expect_err("missing");
        assert_eq!(err.to_string(), "missing parameter 'numberOfPosts'");
    }

    #[test]
    fn flag_at_accepts_integer_truthiness() {
        let params = vec![Value::Int(1), Value::Int(0), Value::Bool(true)];
        assert!(flag_at(&params, 0, "publish").expect("int 1"));
        assert!(!flag_at(&params, 1, "publish").expect("int 0"));
        assert!(flag_at(&params, 2, "publish").expect("bool"));
    }
}
