use std::collections::BTreeMap;

use luafn_api::{DynamicValue, ErrorKind, FunctionError, Type, Value};
use luafn_engine::{CallFailure, Provider};

const SOURCE: &str = r#"
function add(a, b)
  return a + b
end

function mul(a, b)
  return a * b
end

function bytes()
  return {[string.char(255)] = 1, [string.char(254)] = 2}
end

function seq()
  return {1, 2, 3}
end

function point()
  return {x = 1, y = 2}
end

function sparse()
  return {[1] = "a", [3] = "c"}
end

function echo(v)
  return v
end

function count(t)
  local n = 0
  for _ in pairs(t) do n = n + 1 end
  return n
end

function first(t)
  return t[0]
end

function nothing()
end

function handle()
  return print
end

local function hidden()
  return 1
end
"#;

fn provider() -> Provider {
    let mut p = Provider::new();
    let diags = p.configure_source(SOURCE);
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    p
}

fn arg(v: Value) -> DynamicValue {
    luafn_wire::encode(&v, &Type::Dynamic).unwrap()
}

fn call(p: &Provider, name: &str, args: Vec<Value>) -> Result<Value, FunctionError> {
    let args: Vec<_> = args.into_iter().map(arg).collect();
    match p.call(name, &args) {
        Ok(out) => Ok(luafn_wire::decode(&out, &Type::Dynamic).unwrap()),
        Err(CallFailure::Function(e)) => Err(e),
        Err(other) => panic!("transport failure: {other}"),
    }
}

#[test]
fn discovered_functions_are_listed() {
    let names: Vec<_> = provider().functions().into_keys().collect();
    assert_eq!(
        names,
        vec![
            "add", "bytes", "count", "echo", "exec", "first", "handle", "mul", "nothing", "point", "seq", "sparse"
        ]
    );
}

#[test]
fn add_returns_an_integral_number_on_the_wire() {
    let p = provider();
    let out = p.call("add", &[arg(Value::Number(2.0)), arg(Value::Number(3.0))]).unwrap();

    let raw = rmpv::decode::read_value(&mut out.msgpack.as_slice()).unwrap();
    let rmpv::Value::Array(parts) = raw else { panic!("expected [type, value]") };
    assert_eq!(parts[0], rmpv::Value::Binary(br#""number""#.to_vec()));
    assert_eq!(parts[1].as_i64(), Some(5));
}

#[test]
fn whole_number_arithmetic_does_not_wrap() {
    let p = provider();
    let x = Value::Number(4294967296.0);
    assert_eq!(call(&p, "mul", vec![x.clone(), x]).unwrap(), Value::Number(1.8446744073709552e19));

    let big = Value::Number(4611686018427387904.0);
    assert_eq!(call(&p, "add", vec![big.clone(), big]).unwrap(), Value::Number(9.223372036854776e18));
}

#[test]
fn non_utf8_keys_are_a_bad_table_index() {
    let e = call(&provider(), "bytes", vec![]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::BadTableIndex);
}

#[test]
fn sequence_table_becomes_a_list() {
    let out = call(&provider(), "seq", vec![]).unwrap();
    assert_eq!(out, Value::List(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]));
}

#[test]
fn keyed_table_becomes_an_object() {
    let out = call(&provider(), "point", vec![]).unwrap();
    assert_eq!(out, Value::object([("x", Value::Number(1.0)), ("y", Value::Number(2.0))]));
}

#[test]
fn sparse_table_becomes_an_object() {
    let out = call(&provider(), "sparse", vec![]).unwrap();
    assert_eq!(out, Value::object([("1", Value::from("a")), ("3", Value::from("c"))]));
}

#[test]
fn lists_arrive_zero_based() {
    let p = provider();
    let list = Value::List(vec![Value::from("zero"), Value::from("one")]);
    assert_eq!(call(&p, "first", vec![list.clone()]).unwrap(), Value::from("zero"));
    assert_eq!(call(&p, "count", vec![list]).unwrap(), Value::Number(2.0));
}

#[test]
fn lists_round_trip_through_lua() {
    let list = Value::List(vec![Value::from("a"), Value::from("b"), Value::from("c")]);
    assert_eq!(call(&provider(), "echo", vec![list.clone()]).unwrap(), list);
}

#[test]
fn nested_structures_round_trip_through_lua() {
    let value = Value::object([
        ("name", Value::from("box")),
        ("size", Value::List(vec![Value::Number(1.5), Value::Number(2.0)])),
        ("meta", Value::object([("ok", Value::Bool(true))])),
    ]);
    assert_eq!(call(&provider(), "echo", vec![value.clone()]).unwrap(), value);
}

#[test]
fn maps_and_sets_arrive_as_tables() {
    let p = provider();
    let mut m = BTreeMap::new();
    m.insert("a".to_string(), Value::Bool(true));
    m.insert("b".to_string(), Value::Bool(false));
    assert_eq!(call(&p, "count", vec![Value::Map(m)]).unwrap(), Value::Number(2.0));

    let set = Value::Set(vec![Value::from("x"), Value::from("y"), Value::from("z")]);
    assert_eq!(call(&p, "count", vec![set]).unwrap(), Value::Number(3.0));
}

#[test]
fn null_argument_becomes_nil() {
    let e = call(&provider(), "echo", vec![Value::Null]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::MissingReturnValue);
}

#[test]
fn empty_return_is_missing_return_value() {
    let e = call(&provider(), "nothing", vec![]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::MissingReturnValue);
    assert_eq!(e.text(), "none value should not be returned");
}

#[test]
fn function_result_is_unhandled() {
    let e = call(&provider(), "handle", vec![]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UnhandledReturnType);
    assert!(e.text().contains("function"));
}

#[test]
fn unknown_argument_is_unsupported() {
    let e = call(&provider(), "echo", vec![Value::Unknown(Type::Number)]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UnsupportedType);
}

#[test]
fn local_functions_are_not_exposed() {
    let err = provider().call("hidden", &[]).unwrap_err();
    assert!(matches!(err, CallFailure::UnknownFunction(name) if name == "hidden"));
}

#[test]
fn exec_runs_inline_chunks() {
    let code = luafn_wire::encode(&Value::from("return function(t) return #t end"), &Type::String).unwrap();
    let list = arg(Value::List(vec![Value::Bool(true), Value::Bool(true)]));
    let out = provider().call("exec", &[code, list]).unwrap();
    // Zero-based lowering leaves index 0 outside the Lua border.
    assert_eq!(luafn_wire::decode(&out, &Type::Dynamic).unwrap(), Value::Number(1.0));
}

#[test]
fn exec_without_returned_function_fails() {
    let code = luafn_wire::encode(&Value::from("x = 1"), &Type::String).unwrap();
    let Err(CallFailure::Function(e)) = provider().call("exec", &[code]) else {
        panic!("expected function error")
    };
    assert_eq!(e.kind(), ErrorKind::NotAFunction);
    assert!(e.text().contains("missing or invalid"));
}

#[test]
fn json_arguments_are_accepted() {
    let a = DynamicValue::json(br#"{"value": 40, "type": "number"}"#.to_vec());
    let b = DynamicValue::json(br#"{"value": "2", "type": "number"}"#.to_vec());
    let out = provider().call("add", &[a, b]).unwrap();
    assert_eq!(luafn_wire::decode(&out, &Type::Dynamic).unwrap(), Value::Number(42.0));
}

#[test]
fn empty_argument_payload_is_a_decode_error() {
    let Err(CallFailure::Function(e)) = provider().call("echo", &[DynamicValue::default()]) else {
        panic!("expected function error")
    };
    assert_eq!(e.kind(), ErrorKind::Decode);
    assert_eq!(e.argument_index(), Some(0));
}

#[test]
fn runtime_errors_surface_engine_text() {
    let e = call(&provider(), "add", vec![Value::Bool(true), Value::Bool(false)]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Engine);
    assert!(e.text().contains("arithmetic"));
}
