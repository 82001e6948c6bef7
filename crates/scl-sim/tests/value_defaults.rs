use scl_sim::context::{Direction, ExecutionContext, UnitKind, VariableDecl};
use scl_sim::error::RuntimeError;
use scl_sim::value::{default_value, DataType, TypeCatalog, Value, MAX_ARRAY_LEN};

const TYPES: &str = r#"
TYPE Mode : (Idle, Busy, Fault) END_TYPE

TYPE "UDT_Valve"
VERSION : 0.1
   STRUCT
      open : Bool;
      position : Real;
   END_STRUCT;
END_TYPE
"#;

fn empty() -> ExecutionContext {
    ExecutionContext::new("Unit", UnitKind::Program, &[], TYPES)
}

#[test]
fn scalar_defaults_are_zero() {
    let ctx = empty();
    assert_eq!(ctx.create_default_value("Bool", ""), Value::Bool(false));
    assert_eq!(ctx.create_default_value("Int", ""), Value::Int(0));
    assert_eq!(ctx.create_default_value("DInt", ""), Value::Int(0));
    assert_eq!(ctx.create_default_value("Real", ""), Value::Real(0.0));
    assert_eq!(ctx.create_default_value("String", ""), Value::String("".into()));
    assert_eq!(ctx.create_default_value("Time", ""), Value::Int(0));
    assert_eq!(ctx.create_default_value("Date", ""), Value::Ticks(0));
}

#[test]
fn initializers_are_parsed_best_effort() {
    let ctx = empty();
    assert_eq!(ctx.create_default_value("Bool", "TRUE"), Value::Bool(true));
    assert_eq!(ctx.create_default_value("Int", "16#FF"), Value::Int(255));
    assert_eq!(ctx.create_default_value("Time", "T#1s500ms"), Value::Int(1_500));
    assert_eq!(ctx.create_default_value("Real", "2.5"), Value::Real(2.5));
    assert_eq!(ctx.create_default_value("String", "'abc'"), Value::String("abc".into()));
    assert_eq!(ctx.create_default_value("Int", "not a number"), Value::Int(0));
    assert_eq!(ctx.create_default_value("Mode", "Mode#Fault"), Value::Int(2));
}

#[test]
fn arrays_have_declared_length() {
    let ctx = empty();
    for (lo, hi) in [(0, 0), (1, 10), (-2, 2)] {
        let value = ctx.create_default_value(&format!("Array[{lo}..{hi}] of Real"), "");
        let Value::Array(array) = value else {
            panic!("expected an array");
        };
        let expected = usize::try_from(hi - lo + 1).unwrap();
        assert_eq!(array.elements.len(), expected);
        assert!(array.elements.iter().all(|element| *element == Value::Real(0.0)));
        assert_eq!((array.lower, array.upper), (lo, hi));
    }
}

#[test]
fn extreme_array_bounds_fall_back_to_empty() {
    let ctx = empty();
    let cases = [
        "Array[-9223372036854775807..9223372036854775807] of Bool",
        "Array[-9223372036854775808..9223372036854775807] of Int",
        "Array[0..2000000000] of Int",
        "Array[5..1] of Real",
    ];
    for type_text in cases {
        let Value::Array(array) = ctx.create_default_value(type_text, "") else {
            panic!("expected an array for {type_text}");
        };
        assert!(array.elements.is_empty(), "{type_text}");
        assert!(matches!(
            array.get(array.upper),
            Err(RuntimeError::IndexOutOfBounds { .. })
        ));
        assert!(array.get(array.lower).is_err());
    }
}

#[test]
fn array_at_length_limit_is_allocated() {
    let ctx = empty();
    let upper = MAX_ARRAY_LEN - 1;
    let Value::Array(array) = ctx.create_default_value(&format!("Array[0..{upper}] of Bool"), "")
    else {
        panic!("expected an array");
    };
    assert_eq!(array.elements.len(), MAX_ARRAY_LEN);

    let Value::Array(array) =
        ctx.create_default_value(&format!("Array[0..{}] of Bool", upper + 1), "")
    else {
        panic!("expected an array");
    };
    assert!(array.elements.is_empty());
}

#[test]
fn struct_defaults_follow_field_types() {
    let catalog = TypeCatalog::from_source(TYPES);
    let data_type = DataType::resolve("\"UDT_Valve\"", &catalog);
    let Value::Struct(valve) = default_value(&data_type, "", &catalog) else {
        panic!("expected a struct");
    };
    assert_eq!(valve.field("open"), Some(&Value::Bool(false)));
    assert_eq!(valve.field("POSITION"), Some(&Value::Real(0.0)));
}

#[test]
fn function_block_types_become_instances() {
    let decls = [VariableDecl::new("Delay", "TON", Direction::Static)];
    let ctx = ExecutionContext::new("Unit", UnitKind::FunctionBlock, &decls, "");
    let value = ctx.read_path("Delay").unwrap();
    assert!(matches!(value, Value::Instance(_)));
    assert_eq!(ctx.read_path("Delay.Q").unwrap(), Value::Bool(false));
}
