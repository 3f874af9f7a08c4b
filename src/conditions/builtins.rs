//! native implementations behind the standard registry

use regex::Regex;

use super::error::{ConditionError, Result};
use super::types::{RegexMatch, Value};

fn expect_arity(function: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        return Ok(());
    }
    Err(ConditionError::call_failed(
        function,
        format!(
            "takes exactly {} argument{} ({} given)",
            expected,
            if expected == 1 { "" } else { "s" },
            args.len()
        ),
    ))
}

fn receiver_str<'a>(function: &str, receiver: &'a Value) -> Result<&'a str> {
    receiver.as_str().ok_or_else(|| {
        ConditionError::call_failed(
            function,
            format!("requires a 'str' receiver, got '{}'", receiver.type_name()),
        )
    })
}

/// `str()` / `str(x)`
pub fn to_str(args: &[Value]) -> Result<Value> {
    match args {
        [] => Ok(Value::Str(String::new())),
        [value] => Ok(Value::Str(value.to_display_string())),
        _ => Err(ConditionError::call_failed(
            "str",
            format!("takes at most 1 argument ({} given)", args.len()),
        )),
    }
}

/// `len(x)` for strings (in characters) and collections
pub fn len(args: &[Value]) -> Result<Value> {
    expect_arity("len", args, 1)?;
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => items.len(),
        other => {
            return Err(ConditionError::call_failed(
                "len",
                format!("object of type '{}' has no len()", other.type_name()),
            ))
        }
    };
    Ok(Value::Int(n as i64))
}

/// `re.match(pattern, string)`: `True` when the pattern matches at the
/// start of the string, `None` otherwise
pub fn re_match(args: &[Value]) -> Result<Value> {
    expect_arity("re.match", args, 2)?;
    let (pattern, subject) = match (&args[0], &args[1]) {
        (Value::Str(p), Value::Str(s)) => (p, s),
        (p, s) => {
            return Err(ConditionError::call_failed(
                "re.match",
                format!(
                    "expected (str, str) arguments, got ({}, {})",
                    p.type_name(),
                    s.type_name()
                ),
            ))
        }
    };

    let re = Regex::new(&format!(r"\A(?:{})", pattern)).map_err(|e| {
        ConditionError::call_failed("re.match", format!("invalid pattern {:?}: {}", pattern, e))
    })?;

    tracing::trace!(pattern = %pattern, subject = %subject, "re.match");
    Ok(match re.find(subject) {
        Some(found) => Value::Match(RegexMatch {
            span: (
                subject[..found.start()].chars().count(),
                subject[..found.end()].chars().count(),
            ),
            text: found.as_str().to_string(),
        }),
        None => Value::None,
    })
}

pub fn str_lower(receiver: &Value, args: &[Value]) -> Result<Value> {
    expect_arity("str.lower", args, 0)?;
    Ok(Value::Str(receiver_str("str.lower", receiver)?.to_lowercase()))
}

pub fn str_upper(receiver: &Value, args: &[Value]) -> Result<Value> {
    expect_arity("str.upper", args, 0)?;
    Ok(Value::Str(receiver_str("str.upper", receiver)?.to_uppercase()))
}

pub fn str_startswith(receiver: &Value, args: &[Value]) -> Result<Value> {
    affix_test("str.startswith", receiver, args, |s, p| s.starts_with(p))
}

pub fn str_endswith(receiver: &Value, args: &[Value]) -> Result<Value> {
    affix_test("str.endswith", receiver, args, |s, p| s.ends_with(p))
}

/// shared body of startswith/endswith: the argument is a string or a tuple
/// of strings, any of which may match
fn affix_test(
    function: &str,
    receiver: &Value,
    args: &[Value],
    test: impl Fn(&str, &str) -> bool,
) -> Result<Value> {
    expect_arity(function, args, 1)?;
    let subject = receiver_str(function, receiver)?;

    let bad_arg = |got: &Value| {
        ConditionError::call_failed(
            function,
            format!(
                "first arg must be str or a tuple of str, not {}",
                got.type_name()
            ),
        )
    };

    match &args[0] {
        Value::Str(affix) => Ok(Value::Bool(test(subject, affix))),
        Value::Tuple(options) => {
            let mut matched = false;
            for option in options {
                let affix = option.as_str().ok_or_else(|| bad_arg(option))?;
                matched |= test(subject, affix);
            }
            Ok(Value::Bool(matched))
        }
        other => Err(bad_arg(other)),
    }
}
