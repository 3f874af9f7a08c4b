// behavioural tests for condition evaluation through the public API

use crate::common::sample_context;
use string_conditions::conditions::Function;
use string_conditions::{
    evaluate_condition, evaluate_condition_with, CapabilityRegistry, ConditionError, Context,
    Engine, ErrorKind, Value,
};

fn assert_condition(condition: &str, expected: bool) {
    let result = evaluate_condition(condition, &sample_context());
    assert_eq!(
        result,
        Ok(expected),
        "condition {:?} should be {}",
        condition,
        expected
    );
}

fn assert_true(condition: &str) {
    assert_condition(condition, true);
}

fn assert_false(condition: &str) {
    assert_condition(condition, false);
}

fn error_kind(condition: &str) -> ErrorKind {
    match evaluate_condition(condition, &sample_context()) {
        Ok(value) => panic!("condition {:?} evaluated to {}", condition, value),
        Err(e) => e.kind(),
    }
}

#[test]
fn test_sequences() {
    assert_true(r#"type in ("SomeType","ValueNotInType")"#);
    assert_true(r#"type in ["SomeType","ValueNotInType"]"#);
    assert_true(r#"type in {"SomeType","ValueNotInType"}"#);
    assert_true("'2' in mylist");
    assert_true("3 in mylist");
}

#[test]
fn test_in() {
    assert_true(r#"type in ("SomeType","ValueNotInType")"#);
    assert_false(r#"type not in ("SomeType","ValueNotInType")"#);
    assert_false(r#"type in (1, "ValueNotInType")"#);
    assert_true(r#"type not in (1,"ValueNotInType")"#);
}

#[test]
fn test_in_variable() {
    assert_true(r#""foo" in strtuple"#);
    assert_false(r#""foo" not in strtuple"#);
    assert_false(r#""Not Found" in strtuple"#);
    assert_true(r#""Not Found" not in strtuple"#);
}

#[test]
fn test_in_string() {
    assert_true("'Type' in type");
    assert_false("'type' in type");
    assert_true("'' in type");
}

#[test]
fn test_compare() {
    assert_true("year == 2023");
    assert_false("year == 2024");
    assert_true("year != 2024");
    // str int
    assert_false("year == '2023'");
    assert_true("year != '2023'");

    assert_true("year >= 2023");
    assert_false("year >= 2024");
    assert_true("year <= 2023");
    assert_false("year < 2023");
}

#[test]
fn test_ordering_across_types_is_false() {
    assert_false("year < 'a'");
    assert_false("year > 'a'");
    assert_false("None < 1");
    assert_true("'abc' < 'abd'");
    assert_true("(1, 2) < (1, 3)");
}

#[test]
fn test_simple_logical_conditions() {
    assert_true("year == 2023 or month == 99");
    assert_false("year == 9999 or month == 99");

    assert_true("year == 9999 or month == 99 or type == 'SomeType'");
    assert_false("year == 9999 or month == 99 or type == '99'");

    assert_true("year == 2023 or month == 12 or type == 'SomeType'");
    assert_false("year == 9999 and month == 99 and type == 'SomeType'");
}

#[test]
fn test_literal() {
    assert_true("True");
    assert_false("False");
    assert_false("None");
    assert_true("1");
    assert_false("''");
}

#[test]
fn test_not() {
    assert_true("not False");
    assert_false("not True");
    assert_true("not not True");
}

#[test]
fn test_complex_conditions() {
    assert_true("(year == 2023 and month == 12) or type == '99'");
    assert_false("(year == 2023 and month == 99) or type == '99'");
    assert_true("(year not in (1,2,3,'foo') and month == 10) or type == 'SomeType'");
    assert_true("(year not in (1,2,3,'foo') and month > 10) or type == '99'");
    assert_false("(year in (1,2,3,'foo') and month > 10) or type == '99'");
}

#[test]
fn test_unsupported_operator() {
    for condition in [
        "month * 2 == 24",
        "month / 2 == 6",
        "month +2 == 14",
        "month -2 == 10",
        "month % 2 == 0",
        "month ** 2 == 144",
        "month // 2 == 6",
        "month << 1 == 24",
        "-month == -12",
    ] {
        assert_eq!(
            error_kind(condition),
            ErrorKind::UnsupportedSyntax,
            "condition: {}",
            condition
        );
    }
}

#[test]
fn test_unsupported_syntax() {
    assert_eq!(error_kind("month is 12"), ErrorKind::UnsupportedSyntax);
    assert_eq!(error_kind("month is not 12"), ErrorKind::UnsupportedSyntax);
    assert_eq!(error_kind("mylist[0] == 1"), ErrorKind::UnsupportedSyntax);
    assert_eq!(error_kind("{'a': 1}"), ErrorKind::UnsupportedSyntax);
    assert_eq!(error_kind("(1 if year else 2)"), ErrorKind::UnsupportedSyntax);
    assert_eq!(error_kind("(lambda: True)"), ErrorKind::UnsupportedSyntax);
    assert_eq!(error_kind("[x for x in mylist]"), ErrorKind::UnsupportedSyntax);
}

#[test]
fn test_bad_syntax() {
    assert_eq!(error_kind(" True "), ErrorKind::BadSyntax);
    assert_eq!(error_kind("month =~ 12"), ErrorKind::BadSyntax);
    assert_eq!(error_kind("month === '12'"), ErrorKind::BadSyntax);
    assert_eq!(error_kind("month = 12"), ErrorKind::BadSyntax);
    assert_eq!(error_kind("import os"), ErrorKind::BadSyntax);
    assert_eq!(error_kind("year == 2023 )"), ErrorKind::BadSyntax);
}

#[test]
fn test_bad_syntax_message_names_condition() {
    let err = evaluate_condition("month === '12'", &sample_context()).unwrap_err();
    match err {
        ConditionError::BadSyntax { condition, message } => {
            assert_eq!(condition, "month === '12'");
            assert!(message.contains("column 9"), "message: {}", message);
        }
        other => panic!("expected BadSyntax, got {:?}", other),
    }
}

#[test]
fn test_unknown_var() {
    assert_eq!(
        evaluate_condition("foo == 12", &sample_context()),
        Err(ConditionError::UnknownVariable("foo".to_string()))
    );
}

#[test]
fn test_boolean_operands_are_all_evaluated() {
    // the first operand already decides the result, the unknown name still fails
    assert_eq!(
        error_kind("year == 2023 or undefined_var == 1"),
        ErrorKind::UnknownVariable
    );
    assert_eq!(
        error_kind("year == 1 and undefined_var == 1"),
        ErrorKind::UnknownVariable
    );
    assert_eq!(
        error_kind("year == 2023 or type.format()"),
        ErrorKind::UnsupportedSyntax
    );
}

#[test]
fn test_type_functions() {
    assert_true("type.lower() == 'sometype'");
    assert_false("type.lower() == 'SomeType'");
    assert_true("type.lower().upper() == 'SOMETYPE'");

    assert_true("msg.lower().startswith('hello')");
    assert_false("msg.lower().startswith('world')");
    assert_true("msg.endswith('World')");
    assert_true("msg.startswith(('hi', 'hello'))");
}

#[test]
fn test_unlisted_methods_are_rejected() {
    assert_eq!(error_kind("type.replace('a', 'b')"), ErrorKind::UnsupportedSyntax);
    assert_eq!(error_kind("type.__class__"), ErrorKind::UnsupportedSyntax);
    assert_eq!(error_kind("mylist.lower()"), ErrorKind::UnsupportedSyntax);
    assert_eq!(error_kind("open('x')"), ErrorKind::UnknownVariable);
}

#[test]
fn test_functions() {
    assert_true(r"re.match(r'\w+', type)");
    assert_false(r"re.match(r'\d+', type)");
    assert_true("re.match('Some', type)");
    assert_false("re.match('Type', type)");
    assert_false("re.match('Some', type) == True");
    assert_true("str(re.match('Some', type)) == \"<re.Match object; span=(0, 4), match='Some'>\"");

    assert_true("str(year) == '2023'");
    assert_false("year == '2023'");

    assert_true("len(strtuple) == 2");
    assert_true("len(type) == 8");
}

#[test]
fn test_functions_combined() {
    assert_true("str(year).lower() == '2023'");
    assert_true("len(str(year)) == 4");
}

#[test]
fn test_function_failures() {
    assert_eq!(error_kind("len(year)"), ErrorKind::CallFailed);
    assert_eq!(error_kind("re.match('(', type)"), ErrorKind::CallFailed);
    assert_eq!(error_kind("type.lower(1)"), ErrorKind::CallFailed);
    assert_eq!(error_kind("re.sub('a', 'b', type)"), ErrorKind::UnsupportedSyntax);
    assert_eq!(error_kind("re('x')"), ErrorKind::UnsupportedSyntax);
}

#[test]
fn test_multi_compares() {
    assert_true("2023 == year == 2023");
    assert_false("2023 == year != 2023");
    assert_false("2023 != year == 2023");
    assert_false("2023 == year == 2024");

    assert_true("2022 < year < 2024");
    assert_false("9999 < year < 99999");
    assert_true("10 < 100 < 1000 < 10000");
    assert_false("10 < 100 < 1000 < 1000");

    assert_true("10 < 100 < 1000 < 10000 > 10");
}

#[test]
fn test_reserved_context_keys() {
    for name in ["re", "str", "len"] {
        let context = Context::new().with(name, 1);
        let err = evaluate_condition("True", &context).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidContext, "key: {}", name);
    }
}

#[test]
fn test_malformed_context_keys() {
    let context = Context::new().with("not valid", 1);
    assert_eq!(
        evaluate_condition("True", &context).unwrap_err().kind(),
        ErrorKind::InvalidContext
    );
}

#[test]
fn test_evaluation_is_pure() {
    let context = sample_context();
    let before = context.clone();
    for _ in 0..3 {
        assert_eq!(evaluate_condition("type.lower() == 'sometype'", &context), Ok(true));
    }
    assert_eq!(context, before);
}

#[test]
fn test_injected_registry() {
    let registry = CapabilityRegistry::standard().with_function(
        "is_even",
        Function::native(|args| match args {
            [Value::Int(n)] => Ok(Value::Bool(n % 2 == 0)),
            _ => Err(ConditionError::call_failed("is_even", "expected one int")),
        }),
    );

    let context = sample_context();
    assert_eq!(
        evaluate_condition_with("is_even(month) and not is_even(year)", &context, &registry),
        Ok(true)
    );
    // the default registry is untouched
    assert_eq!(
        evaluate_condition("is_even(month)", &context).unwrap_err().kind(),
        ErrorKind::UnknownVariable
    );
}

#[test]
fn test_engine_compiled_condition_reuse() {
    let engine = Engine::default();
    let compiled = engine.compile("type.startswith('Some') and 2020 < year").unwrap();

    for (year, expected) in [(2019, false), (2021, true)] {
        let context = Context::new().with("type", "SomeType").with("year", year);
        assert_eq!(engine.evaluate_compiled(&compiled, &context), Ok(expected));
    }
}
