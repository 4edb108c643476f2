//! Type registry (spec §4.3): a per-unit context that interns every type
//! handle the model builder and resolver need.
//!
//! Types form a DAG with weak back-edges: a primitive or struct type
//! lazily grows at most one pointer, one reference and one unsized-array
//! derived form, plus a map of sized-array forms keyed by length. Once
//! built, a derived form is cached on its base type's node and handed
//! back identity-equal on every later request.

use indexmap::IndexMap;

use crate::ast::{PrimitiveKeyword, QualifiedName, TypeSpec};
use crate::diagnostics::{type_codes, Diagnostics, Severity};
use klang_core::Span;

/// Identity of an interned type within a unit. Stable for the unit's
/// lifetime; never reused even if the node it names is later rewritten by
/// [`TypeRegistry::resolve_types`].
pub type TypeId = u32;

/// The primitive kinds the registry pre-populates at construction (spec
/// §3.6's `(bool, {u}char, byte, {u}short, {u}int, {u}long, float,
/// double)` list). `byte` is not its own kind: the original K compiler
/// aliases `BYTE` to `UNSIGNED_CHAR` (`klang/src/model/type.hpp`), so the
/// `byte` keyword interns to the same handle as `unsigned char`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PrimitiveKind {
    Bool,
    Char,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 11] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::UnsignedChar,
        PrimitiveKind::Short,
        PrimitiveKind::UnsignedShort,
        PrimitiveKind::Int,
        PrimitiveKind::UnsignedInt,
        PrimitiveKind::Long,
        PrimitiveKind::UnsignedLong,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// True for the kinds the usual-arithmetic-conversion rules treat as
    /// integers rather than floating-point (spec §4.5).
    pub fn is_integer(self) -> bool {
        !matches!(self, PrimitiveKind::Bool | PrimitiveKind::Float | PrimitiveKind::Double)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            PrimitiveKind::UnsignedChar
                | PrimitiveKind::UnsignedShort
                | PrimitiveKind::UnsignedInt
                | PrimitiveKind::UnsignedLong
        )
    }

    /// Integer conversion rank (spec §4.5's "narrower over wider" tie
    /// break); floats aren't ranked by this scale.
    pub fn integer_rank(self) -> u8 {
        match self {
            PrimitiveKind::Bool => 0,
            PrimitiveKind::Char | PrimitiveKind::UnsignedChar => 1,
            PrimitiveKind::Short | PrimitiveKind::UnsignedShort => 2,
            PrimitiveKind::Int | PrimitiveKind::UnsignedInt => 3,
            PrimitiveKind::Long | PrimitiveKind::UnsignedLong => 4,
            PrimitiveKind::Float | PrimitiveKind::Double => 0,
        }
    }
}

fn primitive_from_name(name: &str) -> Option<PrimitiveKind> {
    Some(match name {
        "bool" => PrimitiveKind::Bool,
        "char" => PrimitiveKind::Char,
        "byte" | "unsigned char" => PrimitiveKind::UnsignedChar,
        "short" => PrimitiveKind::Short,
        "unsigned short" => PrimitiveKind::UnsignedShort,
        "int" => PrimitiveKind::Int,
        "unsigned int" => PrimitiveKind::UnsignedInt,
        "long" => PrimitiveKind::Long,
        "unsigned long" => PrimitiveKind::UnsignedLong,
        "float" => PrimitiveKind::Float,
        "double" => PrimitiveKind::Double,
        _ => return None,
    })
}

/// A struct type: qualified name plus ordered `(field name, field type)`
/// pairs (spec §3.6).
#[derive(Clone, Debug)]
pub struct StructType {
    pub name: QualifiedName,
    pub fields: Vec<(String, TypeId)>,
}

/// A function-reference type: return type, ordered parameter types, and
/// the owning struct type for member functions (spec §4.3's "small
/// builder" and §3.7's `this`-parameter note).
#[derive(Clone, Debug)]
pub struct FunctionRefType {
    pub return_type: Option<TypeId>,
    pub parameters: Vec<TypeId>,
    pub this_owner: Option<TypeId>,
}

#[derive(Clone, Debug)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Pointer(TypeId),
    Reference(TypeId),
    UnsizedArray(TypeId),
    SizedArray(TypeId, u64),
    Struct(StructType),
    FunctionRef(FunctionRefType),
    /// Placeholder for a named type not yet registered; `resolve_types`
    /// binds it to the matching struct once the builder has registered
    /// every structure in the unit.
    Unresolved(QualifiedName, Span),
    /// A resolved placeholder, forwarding to the canonical node it names.
    /// Kept as its own id (rather than rewritten in place) so every
    /// derived-form node already built from the placeholder — e.g. a
    /// `Pointer` cached on it before the struct it names was registered —
    /// stays reachable; [`TypeRegistry::kind`] and every derived-form
    /// lookup follow this forward rather than ever observing it directly.
    Alias(TypeId),
}

struct TypeNode {
    kind: TypeKind,
    pointer: Option<TypeId>,
    reference: Option<TypeId>,
    unsized_array: Option<TypeId>,
    sized_arrays: IndexMap<u64, TypeId>,
}

impl TypeNode {
    fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            pointer: None,
            reference: None,
            unsized_array: None,
            sized_arrays: IndexMap::new(),
        }
    }
}

/// Per-unit type-interning context (spec §4.3).
pub struct TypeRegistry {
    nodes: Vec<TypeNode>,
    primitives: IndexMap<PrimitiveKind, TypeId>,
    structs_by_short_name: IndexMap<String, TypeId>,
    pending_unresolved: Vec<TypeId>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            nodes: Vec::new(),
            primitives: IndexMap::new(),
            structs_by_short_name: IndexMap::new(),
            pending_unresolved: Vec::new(),
        };
        for kind in PrimitiveKind::ALL {
            let id = registry.push(TypeKind::Primitive(kind));
            registry.primitives.insert(kind, id);
        }
        registry
    }

    fn push(&mut self, kind: TypeKind) -> TypeId {
        let id = self.nodes.len() as TypeId;
        self.nodes.push(TypeNode::new(kind));
        id
    }

    /// Follows an [`TypeKind::Alias`] chain to the canonical node a handle
    /// ultimately names; a no-op for any other kind.
    fn canonical(&self, id: TypeId) -> TypeId {
        match self.nodes[id as usize].kind {
            TypeKind::Alias(target) => self.canonical(target),
            _ => id,
        }
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.nodes[self.canonical(id) as usize].kind
    }

    pub fn is_unresolved(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Unresolved(..))
    }

    // ---- lookup entry points (spec §4.3) --------------------------------

    /// Returns the canonical handle for `tag`; primitives are all
    /// pre-populated at construction so this never allocates.
    pub fn from_primitive_tag(&self, tag: PrimitiveKind) -> TypeId {
        self.primitives[&tag]
    }

    /// Maps the literal primitive spelling set to a primitive handle;
    /// otherwise resolves (or defers) `name` as a simple identifier.
    pub fn from_string(&mut self, name: &str) -> TypeId {
        if let Some(kind) = primitive_from_name(name) {
            return self.from_primitive_tag(kind);
        }
        self.from_qualified_name(&QualifiedName::simple(name), Span::point(klang_core::SourceCoord::START))
    }

    /// General identifier lookup: a struct registered under this short
    /// name, or a fresh unresolved placeholder carrying the full
    /// qualified name (spec §4.3).
    pub fn from_qualified_name(&mut self, name: &QualifiedName, span: Span) -> TypeId {
        if name.is_simple() {
            if let Some(kind) = name.short_name().and_then(primitive_from_name) {
                return self.from_primitive_tag(kind);
            }
        }
        if let Some(short) = name.short_name() {
            if let Some(&id) = self.structs_by_short_name.get(short) {
                return id;
            }
        }
        let id = self.push(TypeKind::Unresolved(name.clone(), span));
        self.pending_unresolved.push(id);
        id
    }

    /// `unsigned` is folded into the primitive's spelling before the
    /// lookup; `byte` ignores the flag since it already names the
    /// unsigned 8-bit type (see `PrimitiveKind` doc comment).
    pub fn from_keyword(&mut self, keyword: PrimitiveKeyword, unsigned: bool) -> TypeId {
        let name = match keyword {
            PrimitiveKeyword::Bool => "bool",
            PrimitiveKeyword::Byte => "byte",
            PrimitiveKeyword::Char => if unsigned { "unsigned char" } else { "char" },
            PrimitiveKeyword::Short => if unsigned { "unsigned short" } else { "short" },
            PrimitiveKeyword::Int => if unsigned { "unsigned int" } else { "int" },
            PrimitiveKeyword::Long => if unsigned { "unsigned long" } else { "long" },
            PrimitiveKeyword::Float => "float",
            PrimitiveKeyword::Double => "double",
        };
        self.from_string(name)
    }

    /// Recurses over a parsed type specifier (spec §4.3).
    pub fn from_type_specifier(&mut self, spec: &TypeSpec) -> TypeId {
        match spec {
            TypeSpec::Primitive { keyword, unsigned, .. } => self.from_keyword(*keyword, *unsigned),
            TypeSpec::Identified(name, span) => self.from_qualified_name(name, *span),
            TypeSpec::Pointer(inner, _) => {
                let inner_id = self.from_type_specifier(inner);
                self.pointer_to(inner_id)
            }
            TypeSpec::Reference(inner, _) => {
                let inner_id = self.from_type_specifier(inner);
                self.reference_to(inner_id)
            }
            TypeSpec::Array { element, size, .. } => {
                let elem_id = self.from_type_specifier(element);
                match size {
                    Some(n) => self.sized_array_of(elem_id, *n),
                    None => self.unsized_array_of(elem_id),
                }
            }
        }
    }

    // ---- derived-form caching --------------------------------------------

    pub fn pointer_to(&mut self, inner: TypeId) -> TypeId {
        let inner = self.canonical(inner);
        if let Some(id) = self.nodes[inner as usize].pointer {
            return id;
        }
        let id = self.push(TypeKind::Pointer(inner));
        self.nodes[inner as usize].pointer = Some(id);
        id
    }

    pub fn reference_to(&mut self, inner: TypeId) -> TypeId {
        let inner = self.canonical(inner);
        if let Some(id) = self.nodes[inner as usize].reference {
            return id;
        }
        let id = self.push(TypeKind::Reference(inner));
        self.nodes[inner as usize].reference = Some(id);
        id
    }

    pub fn unsized_array_of(&mut self, element: TypeId) -> TypeId {
        let element = self.canonical(element);
        if let Some(id) = self.nodes[element as usize].unsized_array {
            return id;
        }
        let id = self.push(TypeKind::UnsizedArray(element));
        self.nodes[element as usize].unsized_array = Some(id);
        id
    }

    pub fn sized_array_of(&mut self, element: TypeId, size: u64) -> TypeId {
        let element = self.canonical(element);
        if let Some(&id) = self.nodes[element as usize].sized_arrays.get(&size) {
            return id;
        }
        let id = self.push(TypeKind::SizedArray(element, size));
        self.nodes[element as usize].sized_arrays.insert(size, id);
        id
    }

    // ---- structs and function-references --------------------------------

    /// Registers a structure's type under its short name. If a prior
    /// unresolved placeholder already claimed that name, later calls to
    /// [`TypeRegistry::resolve_types`] bind it to this struct.
    pub fn register_struct(&mut self, name: QualifiedName, fields: Vec<(String, TypeId)>) -> TypeId {
        let short = name.short_name().expect("a struct name always has a short name").to_string();
        let id = self.push(TypeKind::Struct(StructType { name, fields }));
        self.structs_by_short_name.insert(short, id);
        id
    }

    pub fn struct_by_short_name(&self, short: &str) -> Option<TypeId> {
        self.structs_by_short_name.get(short).copied()
    }

    /// Interns a function-reference type (spec §4.3's "small builder").
    pub fn function_ref(&mut self, return_type: Option<TypeId>, parameters: Vec<TypeId>, this_owner: Option<TypeId>) -> TypeId {
        self.push(TypeKind::FunctionRef(FunctionRefType { return_type, parameters, this_owner }))
    }

    /// Binds every still-pending unresolved placeholder to the struct
    /// registered under the same short name. Called once the builder has
    /// registered all structures in the unit (spec §4.3). Anything left
    /// unresolved reports `type_codes::UNKNOWN_TYPE_NAME`.
    pub fn resolve_types(&mut self, diagnostics: &mut Diagnostics) {
        let pending = std::mem::take(&mut self.pending_unresolved);
        for id in pending {
            let (name, span) = match &self.nodes[id as usize].kind {
                TypeKind::Unresolved(name, span) => (name.clone(), *span),
                _ => continue,
            };
            let canonical = name.short_name().and_then(|short| self.structs_by_short_name.get(short).copied());
            match canonical {
                Some(canonical_id) => self.alias_to(id, canonical_id),
                None => {
                    diagnostics.report(
                        Severity::Error,
                        type_codes::UNKNOWN_TYPE_NAME,
                        span,
                        format!("unknown type '{name}'"),
                    );
                    self.pending_unresolved.push(id);
                }
            }
        }
    }

    /// Turns `placeholder` into a forwarding [`TypeKind::Alias`] to
    /// `canonical`, folding any pointer/reference/array nodes already
    /// cached on the placeholder (built from a forward reference before
    /// its struct was registered) into the canonical node's cache — so a
    /// derived type requested from either id, before or after this call,
    /// is the same handle. When both sides already cached their own
    /// derived node for the same shape, the placeholder's is aliased onto
    /// the canonical's instead of being dropped, so handles already
    /// pointing at it keep resolving correctly.
    fn alias_to(&mut self, placeholder: TypeId, canonical: TypeId) {
        let stray = std::mem::replace(&mut self.nodes[placeholder as usize], TypeNode::new(TypeKind::Alias(canonical)));

        if let Some(id) = stray.pointer {
            self.adopt_derived(canonical, id, |node| &mut node.pointer);
        }
        if let Some(id) = stray.reference {
            self.adopt_derived(canonical, id, |node| &mut node.reference);
        }
        if let Some(id) = stray.unsized_array {
            self.adopt_derived(canonical, id, |node| &mut node.unsized_array);
        }
        for (len, id) in stray.sized_arrays {
            match self.nodes[canonical as usize].sized_arrays.get(&len).copied() {
                Some(kept) if kept != id => self.nodes[id as usize].kind = TypeKind::Alias(kept),
                _ => {
                    self.nodes[canonical as usize].sized_arrays.insert(len, id);
                }
            }
        }
    }

    fn adopt_derived(&mut self, canonical: TypeId, stray: TypeId, slot: impl Fn(&mut TypeNode) -> &mut Option<TypeId>) {
        match *slot(&mut self.nodes[canonical as usize]) {
            Some(kept) if kept != stray => self.nodes[stray as usize].kind = TypeKind::Alias(kept),
            _ => *slot(&mut self.nodes[canonical as usize]) = Some(stray),
        }
    }

    pub fn has_unresolved(&self) -> bool {
        !self.pending_unresolved.is_empty()
    }
}
