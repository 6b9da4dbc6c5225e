mod common;

use common::{hello_tree, strings, write_manifest, GREET_MANIFEST};
use std::path::Path;
use tessera_build::{parse_args, BuildError, Manifest, ManifestLoader, PackageGraph, PackageLoader, MANIFEST_FILE};
use tessera_types::{Instr, Member, TypeTable};

fn load(root: &Path, args: &[&str]) -> Result<PackageGraph, BuildError> {
    let mut loader = ManifestLoader::new(root);
    let mut table = TypeTable::new();
    loader.load(&mut table, &parse_args(&strings(args))?)
}

fn paths<'a>(pkgs: impl IntoIterator<Item = &'a tessera_types::SourcePackage>) -> Vec<&'a str> {
    pkgs.into_iter().map(|pkg| pkg.path()).collect()
}

#[test]
fn test_directory_pattern_loads_import_closure() {
    let dir = tempfile::tempdir().unwrap();
    hello_tree(dir.path());

    let graph = load(dir.path(), &["hello"]).unwrap();
    assert_eq!(graph.roots(), ["example.com/hello"]);
    assert_eq!(paths(graph.packages()), ["example.com/hello", "example.com/greet", "unsafe"]);

    let order = graph.visit(graph.roots()).unwrap();
    assert_eq!(paths(order), ["example.com/greet", "unsafe", "example.com/hello"]);

    let greet = graph.get("example.com/greet").unwrap();
    assert_eq!(greet.ir_file(), dir.path().join("greet").join("greet.ll"));
    assert!(graph.get("unsafe").unwrap().is_unsafe());
}

#[test]
fn test_import_path_and_wildcard_patterns() {
    let dir = tempfile::tempdir().unwrap();
    hello_tree(dir.path());

    let graph = load(dir.path(), &["example.com/greet"]).unwrap();
    assert_eq!(graph.roots(), ["example.com/greet"]);
    assert_eq!(graph.len(), 1);

    let graph = load(dir.path(), &["support/..."]).unwrap();
    assert_eq!(graph.roots(), ["tessera/py", "tessera/runtime"]);

    let graph = load(dir.path(), &["..."]).unwrap();
    assert_eq!(graph.roots().len(), 4);
}

#[test]
fn test_change_directory_flag() {
    let dir = tempfile::tempdir().unwrap();
    hello_tree(&dir.path().join("project"));

    let graph = load(dir.path(), &["-C", "project", "greet"]).unwrap();
    assert_eq!(graph.roots(), ["example.com/greet"]);
}

#[test]
fn test_unmatched_pattern() {
    let dir = tempfile::tempdir().unwrap();
    hello_tree(dir.path());

    let err = load(dir.path(), &["nope"]).unwrap_err();
    assert_eq!(err.to_string(), "failed to load packages: no package matches pattern `nope`");
    assert!(load(dir.path(), &["nope/..."]).is_err());
}

#[test]
fn test_missing_import() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "app", "path = \"app\"\nname = \"main\"\nimports = [\"example.com/gone\"]\n");

    let err = load(dir.path(), &["app"]).unwrap_err();
    assert_eq!(err.to_string(), "failed to load packages: cannot find package example.com/gone");
}

#[test]
fn test_duplicate_package_paths() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "a", GREET_MANIFEST);
    write_manifest(dir.path(), "b", GREET_MANIFEST);

    let err = load(dir.path(), &["a"]).unwrap_err();
    assert!(err.to_string().contains("package example.com/greet is declared in both"), "{}", err);
}

#[test]
fn test_hidden_directories_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "greet", GREET_MANIFEST);
    write_manifest(dir.path(), ".cache/greet", GREET_MANIFEST);

    let graph = load(dir.path(), &["..."]).unwrap();
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_malformed_manifests() {
    let err = Manifest::parse("path = \"x\"\nname = \"x\"\nflavor = 1\n", Path::new(MANIFEST_FILE)).unwrap_err();
    assert!(matches!(err, BuildError::Manifest { .. }));

    let manifest = Manifest::parse(
        "path = \"x\"\nname = \"x\"\n[[vars]]\nname = \"v\"\ntype = \"map[int\"\n",
        Path::new(MANIFEST_FILE),
    )
    .unwrap();
    let err = manifest.declare(&mut TypeTable::new()).unwrap_err();
    assert_eq!(err.to_string(), "invalid type in package x");
}

#[test]
fn test_manifest_declarations() {
    let manifest = Manifest::parse(
        r#"
path = "example.com/shapes"
name = "shapes"

[[types]]
name = "List"
underlying = "struct{head *Node}"

[[types]]
name = "Node"
underlying = "struct{value int; next *Node}"

[[vars]]
name = "Empty"
type = "List"

[[funcs]]
name = "Len"
sig = "func(List) int"
body = [
  { op = "load", dst = 0, global = "example.com/shapes.Empty", type = "List" },
  { op = "return", values = [{ int = { value = 0, type = "int" } }] },
]
"#,
        Path::new(MANIFEST_FILE),
    )
    .unwrap();
    let mut table = TypeTable::new();
    let pkg = manifest.to_package(Path::new("src/shapes"), &mut table).unwrap();

    assert_eq!(pkg.export_file, Path::new("src/shapes/shapes"));
    let list = table.lookup_named("example.com/shapes", "List").unwrap();
    assert_eq!(pkg.types.scope.lookup("List"), Some(&Member::TypeName(list)));
    assert_eq!(table.display(pkg.globals[0].ty).to_string(), "example.com/shapes.List");

    let body = pkg.functions[0].body.as_ref().unwrap();
    assert_eq!(body.len(), 2);
    assert!(matches!(&body[0], Instr::Load { global, .. } if global.symbol == "example.com/shapes.Empty"));
}

#[test]
fn test_support_packages_are_loaded_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    hello_tree(dir.path());
    let mut loader = ManifestLoader::new(dir.path());
    let mut table = TypeTable::new();
    loader.load(&mut table, &parse_args(&strings(&["hello"])).unwrap()).unwrap();

    let mut runtime = loader.runtime();
    assert!(!runtime.is_resolved());
    let scope = &runtime.resolve(&mut table, "runtime").unwrap().scope;
    assert!(matches!(scope.lookup("PrintString"), Some(Member::Func(_))));
    assert!(table.lookup_named("tessera/runtime", "String").is_some());

    let empty = ManifestLoader::new(dir.path().join("greet"));
    let err = empty.foreign().resolve(&mut table, "foreign").unwrap_err();
    assert_eq!(err.to_string(), "invariant violation: foreign support package is not available");
}
