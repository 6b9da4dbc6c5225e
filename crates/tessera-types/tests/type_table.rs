use tessera_types::{BasicKind, Field, PackageTypes, SourcePackage, TyKind, TypeTable};

#[test]
fn test_structural_types_intern_to_same_id() {
    let mut table = TypeTable::new();
    let int = table.basic(BasicKind::Int);
    let a = table.slice(int);
    let b = table.slice(int);
    assert_eq!(a, b);

    let p1 = table.pointer(a);
    let p2 = table.pointer(b);
    assert_eq!(p1, p2);

    let s = table.basic(BasicKind::String);
    let m1 = table.map(s, int);
    let m2 = table.map(int, s);
    assert_ne!(m1, m2);
}

#[test]
fn test_named_types_are_nominal() {
    let mut table = TypeTable::new();
    let int = table.basic(BasicKind::Int);
    let fields = vec![Field { name: "n".to_string(), ty: int, embedded: false }];
    let body = table.struct_of(fields);

    let a = table.named("example.com/a", "Counter", body);
    let b = table.named("example.com/b", "Counter", body);
    assert_ne!(a, b);
    assert_eq!(table.underlying(a), body);
    assert_eq!(table.underlying(b), body);

    // Re-declaring finds the same named type.
    assert_eq!(table.declare_named("example.com/a", "Counter"), a);
    assert_eq!(table.lookup_named("example.com/a", "Counter"), Some(a));
    assert_eq!(table.lookup_named("example.com/a", "Missing"), None);
}

#[test]
fn test_self_referential_named_type() {
    let mut table = TypeTable::new();
    let node = table.declare_named("list", "Node");
    let next = table.pointer(node);
    let body = table.struct_of(vec![Field { name: "next".to_string(), ty: next, embedded: false }]);
    assert_eq!(table.set_underlying(node, body), None);

    assert_eq!(table.underlying(node), body);
    assert_eq!(table.display(node).to_string(), "list.Node");
    assert_eq!(table.display(body).to_string(), "struct{next *list.Node}");
}

#[test]
fn test_named_of_named_shares_underlying() {
    let mut table = TypeTable::new();
    let int = table.basic(BasicKind::Int);
    let celsius = table.named("temp", "Celsius", int);
    let alias = table.named("temp", "Reading", celsius);
    assert_eq!(table.underlying(alias), int);
}

#[test]
fn test_signature_queries() {
    let mut table = TypeTable::new();
    let int = table.basic(BasicKind::Int);
    let boolean = table.basic(BasicKind::Bool);
    let sig = table.signature(vec![int, int], vec![boolean]);
    let named = table.named("cmp", "Less", sig);

    let resolved = table.as_signature(named).expect("named func type has a signature");
    assert_eq!(resolved.arity(), 2);
    assert_eq!(resolved.results, vec![boolean]);
    assert!(table.as_signature(int).is_none());
    assert!(matches!(table.kind(sig), TyKind::Signature(_)));
}

#[test]
fn test_any_and_cstr() {
    let mut table = TypeTable::new();
    let any = table.any();
    assert!(table.is_any(any));
    assert!(table.is_interface(any));
    assert_eq!(table.display(any).to_string(), "interface{}");

    let cstr = table.cstr();
    assert_eq!(table.display(cstr).to_string(), "*int8");
}

#[test]
fn test_source_package_paths() {
    let pkg = SourcePackage::new(PackageTypes::new("example.com/cmd/hello", "main"), "/tmp/build/hello");
    assert!(pkg.is_main());
    assert!(!pkg.is_unsafe());
    assert_eq!(pkg.base_name(), "hello");
    assert_eq!(pkg.ir_file(), std::path::PathBuf::from("/tmp/build/hello.ll"));

    let unsafe_pkg = SourcePackage::new(PackageTypes::new("unsafe", "unsafe"), "");
    assert!(unsafe_pkg.is_unsafe());
}
