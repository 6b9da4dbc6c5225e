mod common;

use common::{program, sig, ty};
use expect_test::expect;
use tessera_ssa::ValueKind;

#[test]
fn test_constants() {
    let mut prog = program();
    let int32 = ty(&mut prog, "int32");
    let float32 = ty(&mut prog, "float32");
    let int32 = prog.raw_type(int32).unwrap();
    let float32 = prog.raw_type(float32).unwrap();
    let any = prog.any().unwrap();
    let mut pkg = prog.new_package("main", "main");
    let f_sig = sig(&mut pkg, "func()");
    let f = pkg.new_func("main.f", f_sig).unwrap();
    let mut b = pkg.make_body(&f).unwrap();

    assert_eq!(b.const_int(&int32, -3).unwrap().value.to_string(), "-3");
    assert_eq!(b.const_bool(false).unwrap().value.to_string(), "false");
    assert_eq!(b.const_float(&float32, 0.5).unwrap().value.to_string(), "0x3FE0000000000000");
    assert_eq!(b.null(&any).value.to_string(), "zeroinitializer");

    assert!(b.const_int(&float32, 1).unwrap_err().is_invariant_violation());
    assert!(b.const_float(&int32, 1.0).unwrap_err().is_invariant_violation());
}

#[test]
fn test_string_literals_share_their_bytes() {
    let mut prog = program();
    let mut pkg = prog.new_package("main", "main");
    let f_sig = sig(&mut pkg, "func()");
    let f = pkg.new_func("main.f", f_sig).unwrap();
    let mut b = pkg.make_body(&f).unwrap();
    let a = b.string_lit("ok").unwrap();
    let again = b.string_lit("ok").unwrap();
    let other = b.cstr("no").unwrap();
    assert_eq!(a.kind(), ValueKind::String);
    assert_eq!(a.value.to_string(), "{ ptr @main.cstr.0, i64 2 }");
    assert_eq!(again.value, a.value);
    assert_eq!(other.value.to_string(), "@main.cstr.1");
    b.ret_void();
    assert_eq!(pkg.module().globals().len(), 2);
}

#[test]
fn test_tuple_return() {
    let mut prog = program();
    let mut pkg = prog.new_package("main", "main");
    let swap_sig = sig(&mut pkg, "func(int, bool) (bool, int)");
    let swap = pkg.new_func("main.swap", swap_sig).unwrap();
    {
        let mut b = pkg.make_body(&swap).unwrap();
        let x = b.param(0).unwrap();
        let flag = b.param(1).unwrap();
        b.ret_values(&[flag, x]).unwrap();
    }

    let module = pkg.module();
    expect![[r#"
        define { i1, i64 } @main.swap(i64 %p0, i1 %p1) {
        entry:
          %v0 = insertvalue { i1, i64 } undef, i1 %p1, 0
          %v1 = insertvalue { i1, i64 } %v0, i64 %p0, 1
          ret { i1, i64 } %v1
        }
    "#]]
    .assert_eq(&module.functions()[swap.id().0].to_string());
}

#[test]
fn test_constant_tuple_return_is_folded() {
    let mut prog = program();
    let int = ty(&mut prog, "int");
    let int = prog.raw_type(int).unwrap();
    let mut pkg = prog.new_package("main", "main");
    let pair_sig = sig(&mut pkg, "func() (int, bool)");
    let pair = pkg.new_func("main.pair", pair_sig).unwrap();
    {
        let mut b = pkg.make_body(&pair).unwrap();
        let one = b.const_int(&int, 1).unwrap();
        let yes = b.const_bool(true).unwrap();
        b.ret_values(&[one, yes]).unwrap();
    }
    assert!(pkg.to_ir_string().contains("  ret { i64, i1 } { i64 1, i1 true }\n"));
}

#[test]
fn test_result_count_is_checked() {
    let mut prog = program();
    let mut pkg = prog.new_package("main", "main");
    let f_sig = sig(&mut pkg, "func(int) int");
    let f = pkg.new_func("main.f", f_sig).unwrap();
    let mut b = pkg.make_body(&f).unwrap();
    let err = b.ret_values(&[]).unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(b.param(1).unwrap_err().is_invariant_violation());
}

#[test]
fn test_globals_load_and_store() {
    let mut prog = program();
    let int = ty(&mut prog, "int");
    let boolean = ty(&mut prog, "bool");
    let mut pkg = prog.new_package("main", "main");
    let count = pkg.new_var("main.count", int).unwrap();
    let flag = pkg.new_var("main.flag", boolean).unwrap();
    let bump_sig = sig(&mut pkg, "func(int)");
    let bump = pkg.new_func("main.bump", bump_sig).unwrap();
    {
        let mut b = pkg.make_body(&bump).unwrap();
        let n = b.param(0).unwrap();
        b.store(&count, &n).unwrap();
        let loaded = b.load(&count);
        assert_eq!(loaded.kind(), ValueKind::Signed);
        assert!(b.store(&flag, &loaded).unwrap_err().is_invariant_violation());
        b.ret_void();
    }

    let module = pkg.module();
    expect![[r#"
        define void @main.bump(i64 %p0) {
        entry:
          store i64 %p0, ptr @main.count
          %v0 = load i64, ptr @main.count
          ret void
        }
    "#]]
    .assert_eq(&module.functions()[bump.id().0].to_string());
}

#[test]
fn test_write_ir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.ll");
    let mut prog = program();
    let pkg = prog.new_package("main", "main");
    pkg.write_ir(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, pkg.to_ir_string());

    let err = pkg.write_ir(&dir.path().join("missing").join("main.ll")).unwrap_err();
    assert!(err.to_string().starts_with("failed to write IR file"), "{}", err);
}
