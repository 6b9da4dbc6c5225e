use crate::config::DebugConfig;
use crate::error::{SsaError, SsaResult};
use crate::lazy::Lazy;
use crate::package::Package;
use crate::types::{Type, TypeBridge};
use tessera_ir::LlType;
use tessera_layout::{LayoutComputer, TargetData};
use tessera_types::{full_name, BasicKind, Member, PackageTypes, TyId, TypeTable};

/// Name of the foreign object type in the foreign support package.
pub const FOREIGN_OBJECT: &str = "Object";

/// Fills an `Option` slot of the program cache on first use.
macro_rules! get_or_compute {
    ($self:ident . $slot:ident, $compute:expr) => {{
        if let Some(value) = &$self.cache.$slot {
            return Ok(value.clone());
        }
        let value = $compute;
        $self.cache.$slot = Some(value.clone());
        Ok(value)
    }};
}

#[derive(Debug, Default)]
struct ProgramCache {
    void: Option<Type>,
    void_ptr: Option<Type>,
    bool: Option<Type>,
    cstr: Option<Type>,
    string: Option<Type>,
    any: Option<Type>,
    int: Option<Type>,
    uintptr: Option<Type>,
    float64: Option<Type>,
    foreign_object_ptr: Option<Type>,
    foreign_object_ptr_ptr: Option<Type>,

    rt_string: Option<LlType>,
    rt_iface: Option<LlType>,
    rt_slice: Option<LlType>,
    rt_map: Option<LlType>,

    import_module_sig: Option<TyId>,
    call_no_arg_sig: Option<TyId>,
    call_one_arg_sig: Option<TyId>,
    call_two_args_sig: Option<TyId>,
}

/// The compilation context shared by every package of one run.
///
/// A program owns the source type table, the type bridge cache, the target
/// layout and the two support packages. Packages are created from it one at a
/// time with [`Program::new_package`].
pub struct Program {
    pub(crate) types: TypeTable,
    pub(crate) layout: LayoutComputer,
    pub(crate) bridge: TypeBridge,
    runtime: Lazy<PackageTypes>,
    foreign: Lazy<PackageTypes>,
    debug: DebugConfig,
    pub(crate) needs_runtime: bool,
    pub(crate) needs_foreign_init: bool,
    cache: ProgramCache,
}

impl Program {
    pub fn new(target: TargetData, debug: DebugConfig) -> Self {
        Program {
            types: TypeTable::new(),
            layout: LayoutComputer::new(target),
            bridge: TypeBridge::default(),
            runtime: Lazy::Empty,
            foreign: Lazy::Empty,
            debug,
            needs_runtime: false,
            needs_foreign_init: false,
            cache: ProgramCache::default(),
        }
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// The loader interns package types here before lowering starts.
    pub fn types_mut(&mut self) -> &mut TypeTable {
        &mut self.types
    }

    pub fn target(&self) -> &TargetData {
        self.layout.target()
    }

    pub fn layout_mut(&mut self) -> &mut LayoutComputer {
        &mut self.layout
    }

    pub fn debug(&self) -> DebugConfig {
        self.debug
    }

    /// Size in bytes of a lowered type.
    pub fn size_of(&mut self, ty: &Type) -> SsaResult<u64> {
        Ok(self.layout.size_of(&ty.ll)?)
    }

    pub fn set_runtime(&mut self, runtime: Lazy<PackageTypes>) {
        self.runtime = runtime;
    }

    pub fn set_foreign(&mut self, foreign: Lazy<PackageTypes>) {
        self.foreign = foreign;
    }

    /// Whether the package under construction has used the runtime package.
    pub fn needs_runtime(&self) -> bool {
        self.needs_runtime
    }

    /// Whether the package under construction has performed foreign calls
    /// and so needs the foreign runtime initialized before it runs.
    pub fn needs_foreign_init(&self) -> bool {
        self.needs_foreign_init
    }

    /// Starts a new package. Both dependency flags are reset.
    pub fn new_package(&mut self, name: &str, path: &str) -> Package<'_> {
        self.needs_runtime = false;
        self.needs_foreign_init = false;
        log::info!("lowering package {}", path);
        Package::new(self, name, path)
    }

    /// The runtime support package, loading it on first use. Every call
    /// marks the current package as depending on the runtime.
    pub fn resolve_runtime(&mut self) -> SsaResult<&PackageTypes> {
        let runtime = self.runtime.resolve(&mut self.types, "runtime")?;
        self.needs_runtime = true;
        Ok(runtime)
    }

    /// The foreign support package, loading it on first use.
    pub fn resolve_foreign(&mut self) -> SsaResult<&PackageTypes> {
        self.foreign.resolve(&mut self.types, "foreign")
    }

    /// Looks up a type declared by the runtime package.
    pub fn runtime_named(&mut self, name: &str) -> SsaResult<TyId> {
        let runtime = self.resolve_runtime()?;
        lookup_type(runtime, name)
    }

    /// Looks up a function declared by the runtime package, returning its
    /// link name and signature.
    pub fn runtime_func(&mut self, name: &str) -> SsaResult<(String, TyId)> {
        let runtime = self.resolve_runtime()?;
        match runtime.scope.lookup(name) {
            Some(Member::Func(sig)) => Ok((full_name(&runtime.path, name), *sig)),
            Some(other) => Err(wrong_member(runtime, name, other, "func")),
            None => Err(missing_member(runtime, name)),
        }
    }

    pub fn foreign_named(&mut self, name: &str) -> SsaResult<TyId> {
        let foreign = self.resolve_foreign()?;
        lookup_type(foreign, name)
    }

    /// Lowering of a runtime package type.
    pub fn rt_type(&mut self, name: &str) -> SsaResult<Type> {
        let ty = self.runtime_named(name)?;
        self.raw_type(ty)
    }

    pub fn rt_string(&mut self) -> SsaResult<LlType> {
        get_or_compute!(self.rt_string, self.rt_type("String")?.ll.clone())
    }

    pub fn rt_iface(&mut self) -> SsaResult<LlType> {
        get_or_compute!(self.rt_iface, self.rt_type("Interface")?.ll.clone())
    }

    pub fn rt_slice(&mut self) -> SsaResult<LlType> {
        get_or_compute!(self.rt_slice, self.rt_type("Slice")?.ll.clone())
    }

    pub fn rt_map(&mut self) -> SsaResult<LlType> {
        get_or_compute!(self.rt_map, self.rt_type("Map")?.ll.clone())
    }

    /// The void type. Its source type is the invalid type.
    pub fn void(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.void, self.basic(BasicKind::Invalid)?)
    }

    pub fn void_ptr(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.void_ptr, self.basic(BasicKind::UnsafePointer)?)
    }

    pub fn bool(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.bool, self.basic(BasicKind::Bool)?)
    }

    /// `*int8`.
    pub fn cstr(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.cstr, {
            let cstr = self.types.cstr();
            self.raw_type(cstr)?
        })
    }

    pub fn string(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.string, self.basic(BasicKind::String)?)
    }

    pub fn any(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.any, {
            let any = self.types.any();
            self.raw_type(any)?
        })
    }

    pub fn int(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.int, self.basic(BasicKind::Int)?)
    }

    pub fn uintptr(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.uintptr, self.basic(BasicKind::Uintptr)?)
    }

    pub fn float64(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.float64, self.basic(BasicKind::Float64)?)
    }

    /// The lowering of `*elem`.
    pub fn pointer(&mut self, elem: &Type) -> SsaResult<Type> {
        let ptr = self.types.pointer(elem.raw);
        self.raw_type(ptr)
    }

    /// `*Object` of the foreign package.
    pub fn foreign_object_ptr(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.foreign_object_ptr, {
            let object = self.foreign_named(FOREIGN_OBJECT)?;
            let ptr = self.types.pointer(object);
            self.raw_type(ptr)?
        })
    }

    /// `**Object` of the foreign package.
    pub fn foreign_object_ptr_ptr(&mut self) -> SsaResult<Type> {
        get_or_compute!(self.foreign_object_ptr_ptr, {
            let elem = self.foreign_object_ptr()?;
            self.pointer(&elem)?
        })
    }

    /// `func(*int8) *Object`
    pub fn import_module_sig(&mut self) -> SsaResult<TyId> {
        get_or_compute!(self.import_module_sig, {
            let object = self.foreign_object_ptr()?.raw;
            let cstr = self.types.cstr();
            self.types.signature(vec![cstr], vec![object])
        })
    }

    /// `func(*Object) *Object`
    pub fn call_no_arg_sig(&mut self) -> SsaResult<TyId> {
        get_or_compute!(self.call_no_arg_sig, self.foreign_call_sig(0)?)
    }

    /// `func(*Object, *Object) *Object`
    pub fn call_one_arg_sig(&mut self) -> SsaResult<TyId> {
        get_or_compute!(self.call_one_arg_sig, self.foreign_call_sig(1)?)
    }

    /// `func(*Object, *Object, *Object) *Object`
    pub fn call_two_args_sig(&mut self) -> SsaResult<TyId> {
        get_or_compute!(self.call_two_args_sig, self.foreign_call_sig(2)?)
    }

    fn foreign_call_sig(&mut self, args: usize) -> SsaResult<TyId> {
        let object = self.foreign_object_ptr()?.raw;
        Ok(self.types.signature(vec![object; args + 1], vec![object]))
    }

    fn basic(&mut self, kind: BasicKind) -> SsaResult<Type> {
        let ty = self.types.basic(kind);
        self.raw_type(ty)
    }
}

fn lookup_type(pkg: &PackageTypes, name: &str) -> SsaResult<TyId> {
    match pkg.scope.lookup(name) {
        Some(Member::TypeName(ty)) => Ok(*ty),
        Some(other) => Err(wrong_member(pkg, name, other, "type")),
        None => Err(missing_member(pkg, name)),
    }
}

fn missing_member(pkg: &PackageTypes, name: &str) -> SsaError {
    SsaError::invariant(format!("`{}` is not declared in support package {}", name, pkg.path))
}

fn wrong_member(pkg: &PackageTypes, name: &str, found: &Member, expected: &str) -> SsaError {
    SsaError::invariant(format!(
        "`{}.{}` is a {}, expected a {}",
        pkg.path,
        name,
        found.kind_name(),
        expected
    ))
}
