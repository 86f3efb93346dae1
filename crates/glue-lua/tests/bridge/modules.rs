//! Module installation, class emulation and enum tests

use glue_core::{create_map, Any, ClassBuilder, EnumBuilder, MapValue};

use super::harness::{eval, expect_bool, expect_f64, expect_int, expect_string, new_state};

struct Shape {
    sides: i64,
}

struct Square {
    shape: Shape,
    side: f64,
}

impl AsRef<Shape> for Square {
    fn as_ref(&self) -> &Shape {
        &self.shape
    }
}

impl AsMut<Shape> for Square {
    fn as_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }
}

fn square(side: f64) -> Square {
    Square {
        shape: Shape { sides: 4 },
        side,
    }
}

fn geometry() -> MapValue {
    let shape = ClassBuilder::<Shape>::new()
        .constructor(|sides: i64| Shape { sides })
        .member(
            "sides",
            |s: &Shape| s.sides,
            |s: &mut Shape, sides: i64| s.sides = sides,
        )
        .method("describe", |s: &Shape| format!("shape with {} sides", s.sides))
        .method("kind", |_: &Shape| "shape")
        .build();

    let square_class = ClassBuilder::<Square>::new()
        .with_base::<Shape>()
        .extends(&shape)
        .constructor(square)
        .method("area", |s: &Square| s.side * s.side)
        .method("kind", |_: &Square| "square")
        .build();

    let module = create_map();
    module.set("Shape", shape).unwrap();
    module.set("Square", square_class).unwrap();
    module
        .set("makeSquare", Any::function(|side: f64| Any::object(square(side))))
        .unwrap();
    module
}

#[derive(Clone, Copy)]
enum Color {
    Red = 1,
    Green = 2,
}

fn colors() -> MapValue {
    let module = create_map();
    module
        .set(
            "Color",
            EnumBuilder::new(|c: Color| c as i64)
                .value("Red", Color::Red)
                .value("Crimson", Color::Red)
                .value("Green", Color::Green)
                .build(),
        )
        .unwrap();
    module
}

// ============================================================================
// Classes
// ============================================================================

#[test]
fn test_constructor_and_member() {
    let state = new_state();
    state.add_module(&geometry()).unwrap();
    expect_int(
        &state,
        "(function() local s = Shape.__new(3) s:setSides(5) return s:sides() end)()",
        5,
    );
}

#[test]
fn test_method_call() {
    let state = new_state();
    state.add_module(&geometry()).unwrap();
    expect_string(&state, "Shape.__new(6):describe()", "shape with 6 sides");
}

#[test]
fn test_base_method_on_derived_instance() {
    let state = new_state();
    state.add_module(&geometry()).unwrap();
    expect_string(&state, "Square.__new(2.0):describe()", "shape with 4 sides");
    expect_int(&state, "Square.__new(2.0):sides()", 4);
}

#[test]
fn test_override_shadows_base() {
    let state = new_state();
    state.add_module(&geometry()).unwrap();
    expect_string(&state, "Square.__new(1.0):kind()", "square");
    expect_string(&state, "Shape.__new(3):kind()", "shape");
}

#[test]
fn test_host_created_derived_instance() {
    let state = new_state();
    state.add_module(&geometry()).unwrap();
    expect_f64(&state, "makeSquare(3):area()", 9.0);
    expect_int(&state, "makeSquare(3):sides()", 4);
}

#[test]
fn test_instance_borrowed_as_base_on_host() {
    let state = new_state();
    state.add_module(&geometry()).unwrap();
    let value = eval(&state, "Square.__new(1.5)");
    assert_eq!(value.borrow::<Square>().unwrap().side, 1.5);
    assert_eq!(value.borrow::<Shape>().unwrap().sides, 4);
}

#[test]
fn test_default_equality_is_identity() {
    let state = new_state();
    state.add_module(&geometry()).unwrap();
    expect_bool(
        &state,
        "(function() local s = Shape.__new(3) return s == s end)()",
        true,
    );
    expect_bool(&state, "Shape.__new(3) == Shape.__new(3)", false);
}

#[test]
fn test_default_tostring_uses_class_name() {
    let state = new_state();
    state.add_module(&geometry()).unwrap();
    let text = eval(&state, "tostring(Shape.__new(3))");
    assert!(text.as_str().unwrap().starts_with("Shape(0x"));
}

#[test]
fn test_first_registered_class_wins() {
    let state = new_state();
    let first = create_map();
    first
        .set(
            "First",
            ClassBuilder::<Shape>::named("First").method("kind", |_: &Shape| "first"),
        )
        .unwrap();
    let second = create_map();
    second
        .set(
            "Second",
            ClassBuilder::<Shape>::named("Second")
                .constructor(|sides: i64| Shape { sides })
                .method("kind", |_: &Shape| "second"),
        )
        .unwrap();
    second
        .set("makeShape", Any::function(|| Any::object(Shape { sides: 5 })))
        .unwrap();

    state.add_module(&first).unwrap();
    state.add_module(&second).unwrap();
    expect_string(&state, "makeShape():kind()", "first");
    expect_string(&state, "Second.__new(3):kind()", "first");
    expect_string(&state, "Second.kind(Second.__new(3))", "second");
    let text = eval(&state, "tostring(makeShape())");
    assert!(text.as_str().unwrap().starts_with("First(0x"));
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn test_enum_aliases_compare_equal() {
    let state = new_state();
    state.add_module(&colors()).unwrap();
    expect_bool(&state, "Color.Red == Color.Crimson", true);
    expect_bool(&state, "Color.Red == Color.Green", false);
    expect_bool(&state, "Color.Green == Color.Green", true);
}

#[test]
fn test_enum_value_and_tostring() {
    let state = new_state();
    state.add_module(&colors()).unwrap();
    expect_int(&state, "Color.Green:value()", 2);
    expect_string(&state, "tostring(Color.Crimson)", "Color(1)");
}

// ============================================================================
// Installation
// ============================================================================

#[test]
fn test_shared_map_converts_once() {
    let state = new_state();
    let shared = create_map();
    shared.set("n", 1).unwrap();
    let module = create_map();
    module.set("a", shared.clone()).unwrap();
    module.set("b", shared).unwrap();

    state.add_module(&module).unwrap();
    expect_bool(&state, "rawequal(a, b)", true);
    expect_int(&state, "(function() a.n = 5 return b.n end)()", 5);
}

#[test]
fn test_cyclic_map() {
    let state = new_state();
    let node = create_map();
    node.set("name", "loop").unwrap();
    node.set("next", node.clone()).unwrap();
    let module = create_map();
    module.set("node", node.clone()).unwrap();

    state.add_module(&module).unwrap();
    expect_bool(&state, "rawequal(node.next, node)", true);
    expect_string(&state, "node.next.next.name", "loop");

    node.set("next", Any::Empty).unwrap();
}

#[test]
fn test_install_into_namespace() {
    let state = new_state();
    let namespace = eval(&state, "(function() geo = {} return geo end)()");
    state
        .add_module_to(&geometry(), namespace.as_map().unwrap())
        .unwrap();

    expect_string(&state, "geo.Shape.__new(3):kind()", "shape");
    expect_bool(&state, "Shape == nil", true);
}

#[test]
fn test_reinstall_reuses_class_tables() {
    let state = new_state();
    let module = geometry();
    let first = eval(&state, "(function() ns1 = {} return ns1 end)()");
    let second = eval(&state, "(function() ns2 = {} return ns2 end)()");

    state.add_module_to(&module, first.as_map().unwrap()).unwrap();
    state.add_module_to(&module, second.as_map().unwrap()).unwrap();
    expect_bool(&state, "rawequal(ns1.Shape, ns2.Shape)", true);
    expect_bool(&state, "rawequal(ns1.Square, ns2.Square)", true);
}

#[test]
fn test_install_into_host_map() {
    let state = new_state();
    let target = create_map();
    state.add_module_to(&geometry(), &target).unwrap();

    let mut keys = target.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["Shape", "Square", "makeSquare"]);
    assert!(target.get("Shape").unwrap().as_map().is_some());
}
