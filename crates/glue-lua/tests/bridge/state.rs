//! State facade, value conversion and callback tests

use std::io::Write;

use glue_core::{create_map, Any, GlueError, GlueResult};
use glue_lua::mlua::{Lua, MetaMethod, UserData, UserDataMethods, Value};
use glue_lua::{State, StateOptions};

use super::harness::{
    eval, expect_bool, expect_f64, expect_int, expect_string, live_tracked, new_state, Tracked,
};

// ============================================================================
// Running code
// ============================================================================

#[test]
fn test_run_returns_value() {
    let state = new_state();
    assert_eq!(state.run("return 1 + 2").unwrap(), Any::Int(3));
    assert!(state.run("local x = 1").unwrap().is_empty());
}

#[test]
fn test_get_expression() {
    let state = new_state();
    expect_string(&state, "'glue' .. '-' .. 'lua'", "glue-lua");
    expect_f64(&state, "7 / 2", 3.5);
}

#[test]
fn test_syntax_error_is_runtime_error() {
    let state = new_state();
    let err = state.run("return +").unwrap_err();
    assert!(err.is_runtime(), "{:?}", err);
}

#[test]
fn test_execution_error_carries_message() {
    let state = new_state();
    let err = state.run_named("error('boom')", "broken_script").unwrap_err();
    assert!(err.is_runtime());
    let message = err.to_string();
    assert!(message.contains("boom"), "{}", message);
    assert!(message.contains("broken_script"), "{}", message);
}

#[test]
fn test_failed_assert_is_runtime_error() {
    let state = new_state();
    let err = state.run("assert(1 == 2, 'math is broken')").unwrap_err();
    assert!(err.to_string().contains("math is broken"));
}

#[test]
fn test_run_file() {
    let state = new_state();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "local base = 40").unwrap();
    writeln!(file, "return base + 2").unwrap();

    assert_eq!(state.run_file(file.path()).unwrap(), Any::Int(42));
}

#[test]
fn test_run_missing_file() {
    let state = new_state();
    let dir = tempfile::tempdir().unwrap();
    let err = state.run_file(dir.path().join("missing.lua")).unwrap_err();
    assert!(err.is_runtime());
}

#[test]
fn test_chunk_name_option() {
    let state = State::with_options(StateOptions::new().with_chunk_name("config")).unwrap();
    let err = state.run("error('bad value')").unwrap_err();
    assert!(err.to_string().contains("config"));
}

#[test]
fn test_memory_limit() {
    let options = StateOptions::new()
        .with_std_libs()
        .with_memory_limit(1024 * 1024);
    let state = State::with_options(options).unwrap();
    let err = state.run("return string.rep('x', 8 * 1024 * 1024)").unwrap_err();
    assert!(err.is_runtime());
}

#[test]
fn test_standard_libs_on_demand() {
    let state = State::new().unwrap();
    assert!(state.run("return string.upper('a')").is_err());
    state.open_standard_libs().unwrap();
    expect_string(&state, "string.upper('a')", "A");
}

// ============================================================================
// Maps
// ============================================================================

#[test]
fn test_table_as_map() {
    let state = new_state();
    let value = eval(&state, "{a = 1, b = 'two'}");
    let map = value.as_map().unwrap();

    let mut keys = map.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(map.get("a").unwrap(), Any::Int(1));
    assert_eq!(map.get("b").unwrap().as_str(), Some("two"));
    assert!(map.get("missing").unwrap().is_empty());
}

#[test]
fn test_non_string_keys_are_skipped() {
    let state = new_state();
    let value = eval(&state, "{10, 20, 30, name = 'list', [true] = 1}");
    let keys = value.as_map().unwrap().keys().unwrap();
    assert_eq!(keys, vec!["name"]);
}

#[test]
fn test_map_writes_are_visible_in_lua() {
    let state = new_state();
    let value = eval(&state, "{}");
    let map = value.as_map().unwrap();
    state.root().set("t", value.clone()).unwrap();

    map.set("answer", 42).unwrap();
    expect_int(&state, "t.answer", 42);
}

#[test]
fn test_root_namespace() {
    let state = new_state();
    state.root().set("greeting", "hello").unwrap();
    expect_string(&state, "greeting .. ' world'", "hello world");

    state.run("counter = 3").unwrap();
    assert_eq!(state.root().get("counter").unwrap(), Any::Int(3));
}

#[test]
fn test_host_map_becomes_table() {
    let state = new_state();
    let config = create_map();
    config.set("depth", 3).unwrap();
    config.set("name", "tree").unwrap();
    state.root().set("config", config).unwrap();

    expect_int(&state, "config.depth", 3);
    expect_string(&state, "type(config)", "table");
}

// ============================================================================
// Primitives
// ============================================================================

#[test]
fn test_primitive_round_trip() {
    let state = new_state();
    let values = vec![
        Any::from(true),
        Any::from(false),
        Any::from(i8::MIN),
        Any::from(i16::MAX),
        Any::from(-123_456i32),
        Any::from(i64::MAX),
        Any::from(u8::MAX),
        Any::from(u16::MAX),
        Any::from(u32::MAX),
        Any::from(1u64 << 40),
        Any::from(77usize),
        Any::from(1.25f32),
        Any::from(-0.5f64),
        Any::from("text"),
        Any::from(""),
    ];

    for value in values {
        let script = state.to_script(&value).unwrap();
        let back = state.to_host(script);
        assert_eq!(back, value, "{:?}", value);
    }
}

#[test]
fn test_typed_extraction() {
    let state = new_state();
    assert_eq!(eval(&state, "255").get::<u8>().unwrap(), 255);
    assert!(eval(&state, "256").get::<u8>().is_err());
    assert_eq!(eval(&state, "'x'").get::<String>().unwrap(), "x");
    assert!(matches!(
        eval(&state, "'x'").get::<i32>(),
        Err(GlueError::TypeMismatch { .. })
    ));
}

// ============================================================================
// Callbacks
// ============================================================================

#[test]
fn test_host_function_called_from_lua() {
    let state = new_state();
    state
        .root()
        .set("add", Any::function(|a: i64, b: i64| a + b))
        .unwrap();
    expect_int(&state, "add(2, 3)", 5);
}

#[test]
fn test_lua_function_called_from_host() {
    let state = new_state();
    let value = eval(&state, "function(a, b) return a * b end");
    let f = value.as_function().unwrap();
    assert_eq!(f.call(&[Any::from(6), Any::from(7)]).unwrap(), Any::Int(42));
}

#[test]
fn test_host_error_keeps_kind() {
    let state = new_state();
    state
        .root()
        .set(
            "fail",
            Any::function(|| -> GlueResult<i32> {
                Err(GlueError::Argument("refused".into()))
            }),
        )
        .unwrap();
    let err = state.run("return fail()").unwrap_err();
    assert_eq!(err, GlueError::Argument("refused".into()));
}

#[test]
fn test_lua_error_in_callback_is_runtime() {
    let state = new_state();
    let value = eval(&state, "function() error('inner failure') end");
    let err = value.as_function().unwrap().call(&[]).unwrap_err();
    assert!(err.is_runtime());
    assert!(err.to_string().contains("inner failure"));
}

#[test]
fn test_nested_callbacks() {
    let state = new_state();
    state
        .root()
        .set(
            "apply",
            Any::function(|f: glue_core::AnyFunction, x: i64| -> GlueResult<Any> {
                f.call(&[Any::from(x)])
            }),
        )
        .unwrap();
    expect_int(&state, "apply(function(v) return v + 1 end, 41)", 42);
}

// ============================================================================
// Objects
// ============================================================================

#[test]
fn test_object_released_by_collection() {
    let state = new_state();
    state.root().set("obj", Any::object(Tracked::new(1))).unwrap();
    assert_eq!(live_tracked(), 1);

    state.run("obj = nil").unwrap();
    state.collect_garbage().unwrap();
    assert_eq!(live_tracked(), 0);
}

#[test]
fn test_object_identity_round_trip() {
    let state = new_state();
    let obj = Any::object(Tracked::new(2));
    state.root().set("obj", obj.clone()).unwrap();
    state.root().set("alias", obj.clone()).unwrap();

    assert!(eval(&state, "obj").is_same(&obj));
    expect_bool(&state, "obj == alias", true);
    assert_eq!(eval(&state, "obj").borrow::<Tracked>().unwrap().id, 2);
}

#[test]
fn test_object_default_tostring() {
    let state = new_state();
    state.root().set("obj", Any::object(Tracked::new(3))).unwrap();
    let text = eval(&state, "tostring(obj)");
    let text = text.as_str().unwrap();
    assert!(text.starts_with("Tracked(0x"), "{}", text);
}

#[test]
fn test_value_deleter() {
    let state = new_state();
    let obj = Any::object(Tracked::new(4));
    state.root().set("obj", obj.clone()).unwrap();
    state.root().set("delete", state.value_deleter().unwrap()).unwrap();
    assert_eq!(live_tracked(), 1);

    state.run("delete(obj)").unwrap();
    assert_eq!(live_tracked(), 0);
    assert!(matches!(
        obj.borrow::<Tracked>(),
        Err(GlueError::Released(_))
    ));
}

#[test]
fn test_opaque_object_has_no_members() {
    let state = new_state();
    state.root().set("obj", Any::object(Tracked::new(5))).unwrap();
    assert!(state.run("return obj.id").is_err());
}

// ============================================================================
// Passthrough
// ============================================================================

#[test]
fn test_passthrough_values() {
    let state = new_state();
    state
        .root()
        .set("pass", Any::function(|v: Any| v))
        .unwrap();

    let cases = [
        "1",
        "1.5",
        "'text'",
        "{}",
        "{1, 2, 3}",
        "function() end",
        "nil",
        "coroutine.create(function() end)",
        "io.stdout",
    ];
    for case in cases {
        let code = format!("local x = {} return pass(x) == x", case);
        assert_eq!(state.run(&code).unwrap(), Any::Bool(true), "{}", case);
    }
}

struct Adder;

impl UserData for Adder {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Call, |_, _, (a, b): (i64, i64)| Ok(a + b));
    }
}

#[test]
fn test_callable_userdata_becomes_function() {
    let state = new_state();
    let ud = state.lua().create_userdata(Adder).unwrap();
    let value = state.to_host(Value::UserData(ud));

    let f = value.as_function().expect("callable userdata should be a function");
    assert_eq!(f.call(&[Any::from(2), Any::from(3)]).unwrap(), Any::Int(5));
}

#[test]
fn test_passthrough_table_keeps_identity() {
    let state = new_state();
    state
        .root()
        .set("pass", Any::function(|v: Any| v))
        .unwrap();
    expect_bool(&state, "(function() local t = {} return rawequal(pass(t), t) end)()", true);
}

// ============================================================================
// Sharing
// ============================================================================

#[test]
fn test_share_state() {
    let state = new_state();
    let view = state.share();
    assert!(!view.is_owner());

    view.run("shared = 7").unwrap();
    expect_int(&state, "shared", 7);
    drop(view);
    expect_int(&state, "shared + 1", 8);
}

#[test]
fn test_view_over_external_lua() {
    let lua = Lua::new();
    lua.globals().set("x", 3).unwrap();

    let view = State::from_lua(lua.clone());
    expect_int(&view, "x", 3);
    drop(view);

    let x: i64 = lua.globals().get("x").unwrap();
    assert_eq!(x, 3);
}
