use scl_sim::context::{Direction, ExecutionContext, UnitKind, VariableDecl};
use scl_sim::error::{RuntimeError, SimError};
use scl_sim::value::Value;

const SOURCE: &str = r#"
TYPE "UDT_Tank"
   STRUCT
      level : Real;
      alarm : Bool;
   END_STRUCT;
END_TYPE
"#;

fn context(kind: UnitKind) -> ExecutionContext {
    let decls = [
        VariableDecl::new("Start", "Bool", Direction::Input),
        VariableDecl::new("Result", "Int", Direction::Output).with_initial("3"),
        VariableDecl::new("Work", "Array[1..3] of Int", Direction::Temp),
        VariableDecl::new("Tank", "\"UDT_Tank\"", Direction::Static),
        VariableDecl::new("Limit", "Real", Direction::Constant).with_initial("9.5"),
        VariableDecl::new("Pulse", "R_TRIG", Direction::Static),
    ];
    ExecutionContext::new("Unit", kind, &decls, SOURCE)
}

#[test]
fn prepare_for_next_scan_is_idempotent_for_functions() {
    let mut ctx = context(UnitKind::Function);
    ctx.write_path("Result", Value::Int(42)).unwrap();
    ctx.write_path("Work[2]", Value::Int(7)).unwrap();

    ctx.prepare_for_next_scan();
    let first = ctx.snapshot();
    ctx.prepare_for_next_scan();
    let second = ctx.snapshot();

    assert_eq!(first, second);
    assert_eq!(first.get("Result").map(String::as_str), Some("0"));
    assert_eq!(first.get("Work[2]").map(String::as_str), Some("0"));
}

#[test]
fn paths_address_elements_fields_and_members() {
    let mut ctx = context(UnitKind::FunctionBlock);
    ctx.write_path_text("Work[3]", "12").unwrap();
    ctx.write_path_text("Tank.level", "4.25").unwrap();
    ctx.write_path_text("Pulse.CLK", "TRUE").unwrap();

    assert_eq!(ctx.read_path("work[3]").unwrap(), Value::Int(12));
    assert_eq!(ctx.read_path("Tank.Level").unwrap(), Value::Real(4.25));
    assert_eq!(ctx.read_path("Pulse.CLK").unwrap(), Value::Bool(true));
    assert_eq!(ctx.read_path("Pulse.Q").unwrap(), Value::Bool(false));
}

#[test]
fn bad_paths_are_reported() {
    let mut ctx = context(UnitKind::FunctionBlock);
    assert!(matches!(
        ctx.read_path("Missing"),
        Err(SimError::UnknownVariable(_))
    ));
    assert!(matches!(
        ctx.read_path("Work[4]"),
        Err(SimError::Runtime(RuntimeError::IndexOutOfBounds {
            index: 4,
            lower: 1,
            upper: 3
        }))
    ));
    assert!(matches!(
        ctx.read_path("Tank.volume"),
        Err(SimError::InvalidPath(_))
    ));
    assert!(ctx.write_path("Pulse.Q", Value::Bool(true)).is_err());
}

#[test]
fn snapshot_flattens_non_input_scalars() {
    let ctx = context(UnitKind::FunctionBlock);
    let keys: Vec<String> = ctx.snapshot().keys().cloned().collect();
    assert_eq!(
        keys,
        vec![
            "Result",
            "Work[1]",
            "Work[2]",
            "Work[3]",
            "Tank.level",
            "Tank.alarm",
            "Limit"
        ]
    );
}

#[test]
fn watch_rows_include_function_block_members() {
    let ctx = context(UnitKind::FunctionBlock);
    let rows = ctx.watch_rows();
    let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    assert!(names.contains(&"Start"));
    assert!(names.contains(&"Pulse.CLK"));
    assert!(names.contains(&"Pulse.Q"));
    let limit = rows.iter().find(|row| row.name == "Limit").unwrap();
    assert_eq!(limit.value, "9.50");
    assert_eq!(limit.direction, Direction::Constant);
}

#[test]
fn reset_restores_initial_values() {
    let mut ctx = context(UnitKind::FunctionBlock);
    ctx.write_path("Result", Value::Int(-1)).unwrap();
    ctx.write_path("Tank.alarm", Value::Bool(true)).unwrap();
    ctx.reset();
    assert_eq!(ctx.read_path("Result").unwrap(), Value::Int(3));
    assert_eq!(ctx.read_path("Tank.alarm").unwrap(), Value::Bool(false));
}
