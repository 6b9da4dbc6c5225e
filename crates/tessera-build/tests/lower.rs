mod common;

use common::{package, program, PYAPP_MANIFEST, PYUTIL_MANIFEST};
use expect_test::expect;
use tessera_build::lower_package;

#[test]
fn test_main_package_gets_entry_point() {
    let mut prog = program();
    let src = package(
        &mut prog,
        r#"
path = "example.com/tick"
name = "main"

[[funcs]]
name = "main"
sig = "func()"
body = []
"#,
    );
    let pkg = lower_package(&mut prog, &src, false).unwrap();
    expect![[r#"
        ; ModuleID = 'example.com/tick'
        source_filename = "example.com/tick"
        target triple = "x86_64-unknown-linux-gnu"

        define void @"example.com/tick.main"() {
        entry:
          ret void
        }

        define i32 @main(i32 %p0, ptr %p1) {
        entry:
          call void @"example.com/tick.main"()
          ret i32 0
        }
    "#]]
    .assert_eq(&pkg.to_ir_string());
}

#[test]
fn test_library_package_has_no_entry_point() {
    let mut prog = program();
    let src = package(
        &mut prog,
        r#"
path = "example.com/calc"
name = "calc"

[[funcs]]
name = "Add"
sig = "func(int, int) int"

[[funcs]]
name = "First"
sig = "func(int, int) int"
body = [{ op = "return", values = [{ param = 0 }] }]
"#,
    );
    let pkg = lower_package(&mut prog, &src, false).unwrap();
    assert_eq!(pkg.functions().names().collect::<Vec<_>>(), ["example.com/calc.Add", "example.com/calc.First"]);
    let text = pkg.to_ir_string();
    assert!(text.contains("declare i64 @\"example.com/calc.Add\"(i64, i64)\n"), "{}", text);
    assert!(!text.contains("@main("), "{}", text);
}

#[test]
fn test_foreign_runtime_is_initialized_before_main() {
    let mut prog = program();
    let src = package(
        &mut prog,
        r#"
path = "example.com/pyapp"
name = "main"

[[vars]]
name = "os"
type = "*tessera/py.Object"
foreign_module = true

[[funcs]]
name = "main"
sig = "func()"
body = [
  { op = "import_foreign_module", dst = 0, path = "os" },
  { op = "store_foreign_module", global = "example.com/pyapp.os", value = { value = 0 } },
  { op = "foreign_call", dst = 1, callee = { value = 0 }, sig = "func() *tessera/py.Object" },
]
"#,
    );
    let pkg = lower_package(&mut prog, &src, false).unwrap();
    assert!(pkg.prog().needs_foreign_init());
    let text = pkg.to_ir_string();
    assert!(text.contains("@\"example.com/pyapp.os\" = linkonce global ptr null"), "{}", text);
    assert!(text.contains("declare void @Py_Initialize()"), "{}", text);

    let entry = &text[text.find("define i32 @main(").unwrap()..];
    let init = entry.find("call void @Py_Initialize()").unwrap();
    let user_main = entry.find("call void @\"example.com/pyapp.main\"()").unwrap();
    assert!(init < user_main, "{}", entry);
}

#[test]
fn test_plain_program_skips_foreign_init() {
    let mut prog = program();
    let src = package(
        &mut prog,
        r#"
path = "example.com/plain"
name = "main"

[[funcs]]
name = "main"
sig = "func()"
body = [{ op = "call", callee = { runtime = "PrintString" }, args = [{ str = "hi" }] }]
"#,
    );
    let pkg = lower_package(&mut prog, &src, false).unwrap();
    assert!(pkg.prog().needs_runtime());
    assert!(!pkg.prog().needs_foreign_init());
    assert!(!pkg.to_ir_string().contains("Py_Initialize"));
}

#[test]
fn test_foreign_use_in_an_import_initializes_the_runtime() {
    let mut prog = program();
    let util = package(&mut prog, PYUTIL_MANIFEST);
    let app = package(&mut prog, PYAPP_MANIFEST);

    let pkg = lower_package(&mut prog, &util, false).unwrap();
    assert!(pkg.prog().needs_foreign_init());
    assert!(!pkg.to_ir_string().contains("@main("));

    let pkg = lower_package(&mut prog, &app, true).unwrap();
    let text = pkg.to_ir_string();
    let entry = &text[text.find("define i32 @main(").unwrap()..];
    let init = entry.find("call void @Py_Initialize()").unwrap();
    let user_main = entry.find("call void @\"example.com/pyapp.main\"()").unwrap();
    assert!(init < user_main, "{}", entry);
}

#[test]
fn test_closures_and_globals() {
    let mut prog = program();
    let src = package(
        &mut prog,
        r#"
path = "example.com/apply"
name = "apply"

[[vars]]
name = "last"
type = "int"

[[funcs]]
name = "double"
sig = "func(int) int"

[[funcs]]
name = "Run"
sig = "func() int"
body = [
  { op = "make_closure", dst = 0, func = { symbol = "example.com/apply.double", sig = "func(int) int" } },
  { op = "call", dst = 1, callee = { closure = { value = 0 } }, args = [{ int = { value = 21, type = "int" } }] },
  { op = "store", global = "example.com/apply.last", type = "int", value = { value = 1 } },
  { op = "load", dst = 2, global = "example.com/other.Limit", type = "int" },
  { op = "return", values = [{ value = 2 }] },
]
"#,
    );
    let pkg = lower_package(&mut prog, &src, false).unwrap();
    assert_eq!(pkg.closure_stubs().names().collect::<Vec<_>>(), ["example.com/apply.double"]);
    let text = pkg.to_ir_string();
    assert!(text.contains("define linkonce i64 @\"__tessera_stub__.example.com/apply.double\"("), "{}", text);
    assert!(text.contains("@\"example.com/apply.last\" = global i64 0"), "{}", text);
    assert!(text.contains("@\"example.com/other.Limit\" = external global i64"), "{}", text);
}

fn lower_error(body: &str) -> String {
    let mut prog = program();
    let manifest = format!(
        "path = \"example.com/bad\"\nname = \"bad\"\n[[funcs]]\nname = \"f\"\nsig = \"func(*tessera/py.Object) int\"\nbody = {}\n",
        body
    );
    let src = package(&mut prog, &manifest);
    lower_package(&mut prog, &src, false).err().unwrap().to_string()
}

#[test]
fn test_malformed_bodies() {
    assert_eq!(
        lower_error(r#"[{ op = "return", values = [{ value = 3 }] }]"#),
        "invariant violation: value %3 is used before it is defined"
    );
    assert_eq!(
        lower_error(
            r#"[{ op = "return", values = [{ param = 0 }] }, { op = "return", values = [{ param = 0 }] }]"#
        ),
        "invariant violation: `example.com/bad.f` has instructions after its return"
    );
    assert_eq!(lower_error("[]"), "invariant violation: returning 0 values from a function with 1 results");
    assert_eq!(
        lower_error(
            r#"[{ op = "foreign_call", dst = 0, callee = { param = 0 }, sig = "func(int) int" }, { op = "return", values = [{ int = { value = 0, type = "int" } }] }]"#
        ),
        "invariant violation: foreign call passes 0 arguments to a callee of 1 parameters"
    );
}

#[test]
fn test_main_package_without_main() {
    let mut prog = program();
    let src = package(&mut prog, "path = \"example.com/nomain\"\nname = \"main\"\n");
    let err = lower_package(&mut prog, &src, false).err().unwrap();
    assert!(err.is_invariant_violation());
    assert_eq!(err.to_string(), "invariant violation: package example.com/nomain has no main function");
}
