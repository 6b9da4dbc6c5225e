// Shared fixtures: a small runtime and foreign support package.
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use tessera_layout::TargetData;
use tessera_ssa::{DebugConfig, Lazy, Package, Program};
use tessera_types::{parse_signature, parse_type, BasicKind, Field, Member, PackageTypes, TyId, TypeTable};

pub const RUNTIME: &str = "tessera/runtime";
pub const FOREIGN: &str = "tessera/py";

fn field(name: &str, ty: TyId) -> Field {
    Field { name: name.to_string(), ty, embedded: false }
}

fn declare_struct(table: &mut TypeTable, pkg: &mut PackageTypes, name: &str, fields: Vec<Field>) {
    let body = table.struct_of(fields);
    let ty = table.named(&pkg.path.clone(), name, body);
    pkg.scope.insert(name, Member::TypeName(ty));
}

/// The runtime package. `omit` leaves one member out.
pub fn runtime_types(table: &mut TypeTable, omit: Option<&str>) -> PackageTypes {
    let mut pkg = PackageTypes::new(RUNTIME, "runtime");
    let ptr = table.basic(BasicKind::UnsafePointer);
    let int = table.basic(BasicKind::Int);
    declare_struct(table, &mut pkg, "String", vec![field("data", ptr), field("len", int)]);
    declare_struct(table, &mut pkg, "Interface", vec![field("tab", ptr), field("data", ptr)]);
    declare_struct(table, &mut pkg, "Slice", vec![field("data", ptr), field("len", int), field("cap", int)]);
    declare_struct(table, &mut pkg, "Map", vec![field("h", ptr)]);

    let print = parse_signature(table, "func(string)", RUNTIME).unwrap();
    pkg.scope.insert("PrintString", Member::Func(print));
    let alloc = parse_signature(table, "func(uintptr) unsafe.Pointer", RUNTIME).unwrap();
    pkg.scope.insert("Alloc", Member::Func(alloc));
    let debug = table.basic(BasicKind::Bool);
    pkg.scope.insert("Debug", Member::Var(debug));

    if let Some(name) = omit {
        let mut kept = PackageTypes::new(RUNTIME, "runtime");
        for member in pkg.scope.names().filter(|n| *n != name) {
            kept.scope.insert(member, *pkg.scope.lookup(member).unwrap());
        }
        return kept;
    }
    pkg
}

pub fn foreign_types(table: &mut TypeTable) -> PackageTypes {
    let mut pkg = PackageTypes::new(FOREIGN, "py");
    let int = table.basic(BasicKind::Int);
    let ptr = table.basic(BasicKind::UnsafePointer);
    declare_struct(table, &mut pkg, "Object", vec![field("refcnt", int), field("typ", ptr)]);
    pkg
}

pub fn target() -> TargetData {
    TargetData::parse("x86_64-unknown-linux-gnu").unwrap()
}

/// A program with both support packages available on demand.
pub fn program() -> Program {
    let mut prog = Program::new(target(), DebugConfig::all());
    prog.set_runtime(Lazy::pending(|table: &mut TypeTable| Ok(runtime_types(table, None))));
    prog.set_foreign(Lazy::pending(|table: &mut TypeTable| Ok(foreign_types(table))));
    prog
}

/// Like [`program`], counting how often the runtime supplier runs.
pub fn counting_program() -> (Program, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut prog = Program::new(target(), DebugConfig::default());
    prog.set_runtime(Lazy::pending(move |table: &mut TypeTable| {
        counter.set(counter.get() + 1);
        Ok(runtime_types(table, None))
    }));
    (prog, calls)
}

pub fn sig(pkg: &mut Package<'_>, src: &str) -> TyId {
    parse_signature(pkg.prog_mut().types_mut(), src, "main").unwrap()
}

pub fn ty(prog: &mut Program, src: &str) -> TyId {
    parse_type(prog.types_mut(), src, "main").unwrap()
}
