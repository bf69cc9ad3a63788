//! The Lyra type system
//!
//! A closed set of type variants: builtins, structs, functions, generic
//! placeholders, external (host-runtime) types, lists, and unions. Struct
//! and function types live in a [`TypeArena`] and are referenced by integer
//! handle, so the linking pass can set a function's owning unit and the
//! type-check pass can append specializations without shared-ownership
//! gymnastics. Builtins are plain enum values shared by copy.

use std::collections::BTreeMap;

use crate::frontend::unit::UnitId;

/// The builtin scalar types. One value per kind, compared by variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    Char,
    Int,
    Float,
    Double,
    Str,
    Void,
    Any,
}

impl Builtin {
    pub const ALL: [Builtin; 8] = [
        Builtin::Bool,
        Builtin::Char,
        Builtin::Int,
        Builtin::Float,
        Builtin::Double,
        Builtin::Str,
        Builtin::Void,
        Builtin::Any,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Bool => "bool",
            Builtin::Char => "char",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::Str => "string",
            Builtin::Void => "void",
            Builtin::Any => "any",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Builtin::Char | Builtin::Int | Builtin::Float | Builtin::Double
        )
    }

    /// Widening priority for binary arithmetic. `bool`, `void`, and `any`
    /// are unranked; `string` carries a rank but never participates in
    /// arithmetic widening.
    pub fn priority(self) -> Option<i32> {
        match self {
            Builtin::Char | Builtin::Int => Some(0),
            Builtin::Float => Some(1),
            Builtin::Double => Some(2),
            Builtin::Str => Some(10),
            Builtin::Bool | Builtin::Void | Builtin::Any => None,
        }
    }
}

/// Pick the wider of two builtins for a binary arithmetic result.
///
/// Not commutative: when neither side is ranked, or the ranks tie, the
/// first argument wins; when exactly one side is ranked, that side wins.
pub fn widen(a: Builtin, b: Builtin) -> Builtin {
    match (a.priority(), b.priority()) {
        (None, None) => a,
        (None, Some(_)) => b,
        (Some(_), None) => a,
        (Some(pa), Some(pb)) => {
            if pa >= pb {
                a
            } else {
                b
            }
        }
    }
}

/// Handle into [`TypeArena::structs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub usize);

/// Handle into [`TypeArena::funcs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub usize);

/// One generic specialization: placeholder name -> concrete type, as
/// discovered at a single call site.
pub type Specialization = BTreeMap<String, Type>;

/// A resolved type. Cheap to clone; struct and function payloads live in
/// the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Builtin(Builtin),
    Struct(StructId),
    Function(FuncId),
    /// A generic placeholder (`T`), resolved per call site through a
    /// specialization map before codegen.
    Generic(String),
    /// A host-runtime type referenced by its fully qualified name.
    External(String),
    List(Box<Type>),
    Union(Vec<Type>),
    /// A name that could not be resolved locally; later passes retry the
    /// lookup or diagnose it.
    Unknown(Option<String>),
}

impl Type {
    pub const UNKNOWN: Type = Type::Unknown(None);

    pub fn named_unknown(name: impl Into<String>) -> Type {
        Type::Unknown(Some(name.into()))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Builtin(Builtin::Void))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Builtin(b) if b.is_numeric())
    }

    /// Discriminator for downstream passes. Only functions carry a shared
    /// string kind; everything else is distinguished by variant.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            Type::Function(_) => Some("function"),
            _ => None,
        }
    }

    /// Human-readable name used in diagnostics.
    pub fn name(&self, types: &TypeArena) -> String {
        match self {
            Type::Builtin(b) => b.name().to_string(),
            Type::Struct(id) => types.struct_(*id).name.clone(),
            Type::Function(id) => types.func(*id).name.clone(),
            Type::Generic(key) => key.clone(),
            Type::External(fqn) => fqn.clone(),
            Type::List(elem) => format!("{}[]", elem.name(types)),
            Type::Union(members) => members
                .iter()
                .map(|t| t.name(types))
                .collect::<Vec<_>>()
                .join(" | "),
            Type::Unknown(Some(name)) => name.clone(),
            Type::Unknown(None) => "?".to_string(),
        }
    }
}

/// A struct declaration: ordered fields and generic parameter names.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    /// `unitPath$Name`, set at declaration for backends
    pub qualified_name: String,
    pub fields: Vec<(String, Type)>,
    pub generics: Vec<String>,
}

impl StructType {
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn has_generics(&self) -> bool {
        !self.generics.is_empty()
    }
}

/// A function declaration: ordered parameters, return type, generic
/// parameter names, plus the specializations observed at call sites and -
/// once linked - the unit that defines it when it was imported.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub name: String,
    pub params: Vec<(String, Type)>,
    pub return_type: Type,
    pub generics: Vec<String>,
    /// Appended per call site, in discovery order; distinct argument-type
    /// combinations produce distinct entries.
    pub specializations: Vec<Specialization>,
    /// Set by the link pass for imported functions: the defining unit.
    pub external: Option<UnitId>,
}

impl FunctionType {
    pub fn new(name: impl Into<String>, params: Vec<(String, Type)>, generics: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            return_type: Type::Builtin(Builtin::Void),
            generics,
            specializations: Vec::new(),
            external: None,
        }
    }

    pub fn has_generics(&self) -> bool {
        !self.generics.is_empty()
    }

    /// Map each generic parameter position's placeholder to the concrete
    /// argument type seen at a call site.
    pub fn build_specialization(&self, arg_types: &[Type]) -> Specialization {
        let mut specialization = Specialization::new();
        for (i, (_, param_ty)) in self.params.iter().enumerate() {
            if let Type::Generic(key) = param_ty {
                if let Some(arg_ty) = arg_types.get(i) {
                    specialization.insert(key.clone(), arg_ty.clone());
                }
            }
        }
        specialization
    }

    /// Rebuild the parameter list with generic placeholders replaced by
    /// their mapped concrete types; non-generic parameters pass through.
    pub fn params_for_specialization(&self, specialization: &Specialization) -> Vec<(String, Type)> {
        self.params
            .iter()
            .map(|(name, ty)| match ty {
                Type::Generic(key) => {
                    let concrete = specialization
                        .get(key)
                        .cloned()
                        .unwrap_or_else(|| Type::Generic(key.clone()));
                    (name.clone(), concrete)
                }
                _ => (name.clone(), ty.clone()),
            })
            .collect()
    }

    pub fn signature(&self, types: &TypeArena) -> String {
        self.params
            .iter()
            .map(|(_, t)| t.name(types))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Owns every struct and function type created during one compilation.
#[derive(Debug, Default)]
pub struct TypeArena {
    structs: Vec<StructType>,
    funcs: Vec<FunctionType>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_struct(&mut self, st: StructType) -> StructId {
        let id = StructId(self.structs.len());
        self.structs.push(st);
        id
    }

    pub fn add_func(&mut self, func: FunctionType) -> FuncId {
        let id = FuncId(self.funcs.len());
        self.funcs.push(func);
        id
    }

    pub fn struct_(&self, id: StructId) -> &StructType {
        &self.structs[id.0]
    }

    pub fn struct_mut(&mut self, id: StructId) -> &mut StructType {
        &mut self.structs[id.0]
    }

    pub fn func(&self, id: FuncId) -> &FunctionType {
        &self.funcs[id.0]
    }

    pub fn func_mut(&mut self, id: FuncId) -> &mut FunctionType {
        &mut self.funcs[id.0]
    }
}

/// Structural compatibility check used for assignments, call arguments,
/// and return statements. `any` accepts everything; generics accept any
/// concrete type (they are pinned by specialization, not here).
pub fn types_match(expected: &Type, actual: &Type) -> bool {
    match (expected, actual) {
        (Type::Builtin(Builtin::Any), _) | (_, Type::Builtin(Builtin::Any)) => true,
        (Type::Generic(_), _) => true,
        (Type::List(a), Type::List(b)) => types_match(a, b),
        (Type::Union(members), other) => members.iter().any(|m| types_match(m, other)),
        (a, b) => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_prefers_higher_priority() {
        assert_eq!(widen(Builtin::Int, Builtin::Int), Builtin::Int);
        assert_eq!(widen(Builtin::Int, Builtin::Double), Builtin::Double);
        assert_eq!(widen(Builtin::Double, Builtin::Int), Builtin::Double);
        assert_eq!(widen(Builtin::Float, Builtin::Double), Builtin::Double);
        assert_eq!(widen(Builtin::Char, Builtin::Float), Builtin::Float);
    }

    #[test]
    fn widen_tie_keeps_the_first_argument() {
        assert_eq!(widen(Builtin::Int, Builtin::Char), Builtin::Int);
        assert_eq!(widen(Builtin::Char, Builtin::Int), Builtin::Char);
    }

    #[test]
    fn widen_unranked_side_loses() {
        assert_eq!(widen(Builtin::Any, Builtin::Int), Builtin::Int);
        assert_eq!(widen(Builtin::Int, Builtin::Any), Builtin::Int);
        // Both unranked: first argument wins.
        assert_eq!(widen(Builtin::Bool, Builtin::Any), Builtin::Bool);
    }

    #[test]
    fn specialization_maps_generic_positions() {
        let func = FunctionType::new(
            "id",
            vec![("x".to_string(), Type::Generic("T".to_string()))],
            vec!["T".to_string()],
        );
        let spec = func.build_specialization(&[Type::Builtin(Builtin::Int)]);
        assert_eq!(spec.get("T"), Some(&Type::Builtin(Builtin::Int)));
    }

    #[test]
    fn specialization_substitution_leaves_concrete_params() {
        let func = FunctionType::new(
            "pair",
            vec![
                ("a".to_string(), Type::Generic("T".to_string())),
                ("b".to_string(), Type::Builtin(Builtin::Str)),
            ],
            vec!["T".to_string()],
        );
        let spec = func.build_specialization(&[
            Type::Builtin(Builtin::Int),
            Type::Builtin(Builtin::Str),
        ]);
        let params = func.params_for_specialization(&spec);
        assert_eq!(params[0].1, Type::Builtin(Builtin::Int));
        assert_eq!(params[1].1, Type::Builtin(Builtin::Str));
    }

    #[test]
    fn distinct_call_sites_record_distinct_specializations() {
        let mut arena = TypeArena::new();
        let id = arena.add_func(FunctionType::new(
            "id",
            vec![("x".to_string(), Type::Generic("T".to_string()))],
            vec!["T".to_string()],
        ));

        let first = arena.func(id).build_specialization(&[Type::Builtin(Builtin::Int)]);
        arena.func_mut(id).specializations.push(first);
        let second = arena.func(id).build_specialization(&[Type::Builtin(Builtin::Str)]);
        arena.func_mut(id).specializations.push(second);

        let func = arena.func(id);
        assert_eq!(func.specializations.len(), 2);
        assert_eq!(
            func.specializations[0].get("T"),
            Some(&Type::Builtin(Builtin::Int))
        );
        assert_eq!(
            func.specializations[1].get("T"),
            Some(&Type::Builtin(Builtin::Str))
        );
    }

    #[test]
    fn only_functions_carry_a_kind_string() {
        assert_eq!(Type::Builtin(Builtin::Int).kind(), None);
        assert_eq!(Type::Function(FuncId(0)).kind(), Some("function"));
    }
}
