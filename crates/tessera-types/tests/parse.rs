use expect_test::expect;
use tessera_types::{parse_signature, parse_type, BasicKind, TyKind, TypeTable};

fn roundtrip(src: &str) -> String {
    let mut table = TypeTable::new();
    let ty = parse_type(&mut table, src, "main").expect("type should parse");
    table.display(ty).to_string()
}

#[test]
fn test_parse_basic_and_composite_types() {
    expect!["int"].assert_eq(&roundtrip("int"));
    expect!["uint8"].assert_eq(&roundtrip("byte"));
    expect!["*[]string"].assert_eq(&roundtrip("*[]string"));
    expect!["[4]float64"].assert_eq(&roundtrip("[4]float64"));
    expect!["map[string][]int"].assert_eq(&roundtrip("map[string] []int"));
    expect!["unsafe.Pointer"].assert_eq(&roundtrip("unsafe.Pointer"));
    expect!["<-chan int"].assert_eq(&roundtrip("<-chan int"));
}

#[test]
fn test_parse_signatures() {
    expect!["func()"].assert_eq(&roundtrip("func()"));
    expect!["func(int, string) bool"].assert_eq(&roundtrip("func(int, string) bool"));
    expect!["func([]int) (int, error)"].assert_eq(&roundtrip("func([]int) (int, error)"));
    expect!["func(string, []interface{}...)"].assert_eq(&roundtrip("func(string, ...any)"));
}

#[test]
fn test_parse_struct_and_interface() {
    expect!["struct{x int; next *main.Node}"].assert_eq(&roundtrip("struct{x int; next *Node}"));
    expect!["interface{String() string}"].assert_eq(&roundtrip("interface{String() string}"));
}

#[test]
fn test_qualified_names_use_last_dot() {
    let mut table = TypeTable::new();
    let ty = parse_type(&mut table, "github.com/acme/py.Object", "main").unwrap();
    assert_eq!(table.lookup_named("github.com/acme/py", "Object"), Some(ty));
}

#[test]
fn test_parse_same_text_twice_gives_same_id() {
    let mut table = TypeTable::new();
    let a = parse_type(&mut table, "func(map[string]int) *T", "pkg").unwrap();
    let b = parse_type(&mut table, "func(map[string]int) *T", "pkg").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_parse_signature_rejects_non_function() {
    let mut table = TypeTable::new();
    assert!(parse_signature(&mut table, "[]int", "main").is_err());
    let sig = parse_signature(&mut table, "func(int8)", "main").unwrap();
    let int8 = table.basic(BasicKind::Int8);
    assert!(matches!(table.kind(sig), TyKind::Signature(s) if s.params == vec![int8]));
}

#[test]
fn test_parse_errors_point_at_offending_token() {
    let mut table = TypeTable::new();
    let err = parse_type(&mut table, "map[string", "main").unwrap_err();
    assert_eq!(err.message, "expected `]`");
    assert_eq!(err.span.offset(), 10);

    let err = parse_type(&mut table, "int int", "main").unwrap_err();
    assert_eq!(err.message, "unexpected trailing input");

    let err = parse_type(&mut table, "[]#", "main").unwrap_err();
    assert_eq!(err.message, "unexpected character `#`");
}

#[test]
fn test_arrows_and_ellipses_lex_without_spaces() {
    expect!["chan<- []int"].assert_eq(&roundtrip("chan<-[]int"));
    expect!["<-chan *main.T"].assert_eq(&roundtrip("<-chan*T"));
    expect!["func(int, []string...) bool"].assert_eq(&roundtrip("func(int,...string)bool"));
    expect!["example.com/a-b.T"].assert_eq(&roundtrip("example.com/a-b.T"));
}

#[test]
fn test_lex_errors_cover_one_character() {
    let mut table = TypeTable::new();
    let err = parse_type(&mut table, "func(int, ..string)", "main").unwrap_err();
    assert_eq!(err.message, "unexpected character `.`");
    assert_eq!((err.span.offset(), err.span.len()), (10, 1));

    let err = parse_type(&mut table, "[4]é", "main").unwrap_err();
    assert_eq!(err.message, "unexpected character `é`");
    assert_eq!((err.span.offset(), err.span.len()), (3, 2));

    let err = parse_type(&mut table, "[99999999999999999999]int", "main").unwrap_err();
    assert_eq!(err.message, "array length `99999999999999999999` out of range");
    assert_eq!((err.span.offset(), err.span.len()), (1, 20));
}
