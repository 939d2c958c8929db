//! Host type metadata.
//!
//! The scripting language sees host types through a [`TypeTable`]: an arena of
//! type definitions addressed by [`TypeId`]. Only the subset of reflection
//! needed by conversion and member lookup is modelled: kinds, generic shape,
//! base type, implemented interfaces, methods and properties.
//!
//! The table is built once by the host and then shared read-only between
//! compilations.

use std::collections::HashMap;

use serde::Serialize;

use crate::TypeError;

/// Handle to a type in a [`TypeTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(u32);

impl TypeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a method in a [`TypeTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodId(u32);

impl MethodId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Primitive numeric kinds understood by the conversion rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NumericKind {
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Char,
    Single,
    Double,
    Decimal,
}

impl NumericKind {
    pub const ALL: [NumericKind; 12] = [
        NumericKind::SByte,
        NumericKind::Byte,
        NumericKind::Int16,
        NumericKind::UInt16,
        NumericKind::Int32,
        NumericKind::UInt32,
        NumericKind::Int64,
        NumericKind::UInt64,
        NumericKind::Char,
        NumericKind::Single,
        NumericKind::Double,
        NumericKind::Decimal,
    ];

    /// Host type name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            NumericKind::SByte => "SByte",
            NumericKind::Byte => "Byte",
            NumericKind::Int16 => "Int16",
            NumericKind::UInt16 => "UInt16",
            NumericKind::Int32 => "Int32",
            NumericKind::UInt32 => "UInt32",
            NumericKind::Int64 => "Int64",
            NumericKind::UInt64 => "UInt64",
            NumericKind::Char => "Char",
            NumericKind::Single => "Single",
            NumericKind::Double => "Double",
            NumericKind::Decimal => "Decimal",
        }
    }

    pub const fn is_integral(self) -> bool {
        !matches!(
            self,
            NumericKind::Single | NumericKind::Double | NumericKind::Decimal
        )
    }

    const fn position(self) -> usize {
        self as usize
    }
}

/// What sort of type a [`TypeDef`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// The universal object type.
    Object,
    /// Static type of the `null` literal before it is converted.
    Null,
    Void,
    Boolean,
    String,
    Numeric(NumericKind),
    Class,
    Struct,
    Interface,
    Enum,
    GenericParameter { position: u32 },
}

/// Generic shape of a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenericShape {
    NonGeneric,
    /// Open definition such as `List<T>`.
    Definition { parameters: Vec<TypeId> },
    /// Closed or partially closed instance such as `List<Int32>`.
    Instance {
        definition: TypeId,
        arguments: Vec<TypeId>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub ty: TypeId,
    pub is_static: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub namespace: Option<String>,
    pub kind: TypeKind,
    pub generic: GenericShape,
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub is_public: bool,
    pub methods: Vec<MethodId>,
    pub properties: Vec<PropertyDef>,
}

impl TypeDef {
    fn new(namespace: Option<&str>, name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_owned(),
            namespace: namespace.map(str::to_owned),
            kind,
            generic: GenericShape::NonGeneric,
            base: None,
            interfaces: Vec::new(),
            is_public: true,
            methods: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Number of generic parameters of a definition, 0 otherwise.
    pub fn arity(&self) -> u32 {
        match &self.generic {
            GenericShape::Definition { parameters } => parameters.len() as u32,
            _ => 0,
        }
    }

    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A method as stored in the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub declaring_type: TypeId,
    pub parameters: Vec<TypeId>,
    pub return_type: TypeId,
    pub is_static: bool,
    pub is_public: bool,
    /// Marked as callable with the first parameter as receiver.
    pub is_extension: bool,
    /// A conversion method that must never be applied implicitly.
    pub explicit_only: bool,
}

/// Description of a method to add to a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSpec {
    name: String,
    parameters: Vec<TypeId>,
    return_type: TypeId,
    is_static: bool,
    is_public: bool,
    is_extension: bool,
    explicit_only: bool,
}

impl MethodSpec {
    /// A public instance method.
    pub fn new(name: impl Into<String>, parameters: Vec<TypeId>, return_type: TypeId) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type,
            is_static: false,
            is_public: true,
            is_extension: false,
            explicit_only: false,
        }
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Extension methods are always static.
    pub fn with_extension(mut self) -> Self {
        self.is_static = true;
        self.is_extension = true;
        self
    }

    pub fn with_explicit_only(mut self) -> Self {
        self.explicit_only = true;
        self
    }

    pub fn with_private(mut self) -> Self {
        self.is_public = false;
        self
    }
}

/// Ids of the types every table starts with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: TypeId,
    pub null: TypeId,
    pub void: TypeId,
    pub boolean: TypeId,
    pub string: TypeId,
    /// `Nullable<T>` definition.
    pub nullable: TypeId,
    /// `Extensible<T>` definition: a wrapper exposing one `Value` of `T`.
    pub extensible: TypeId,
    numerics: [TypeId; 12],
}

impl WellKnownTypes {
    pub fn numeric(&self, kind: NumericKind) -> TypeId {
        self.numerics[kind.position()]
    }
}

pub const SYSTEM_NAMESPACE: &str = "System";
pub const RUNTIME_NAMESPACE: &str = "Quill.Runtime";

/// Arena of host type metadata.
#[derive(Clone, Debug)]
pub struct TypeTable {
    types: Vec<TypeDef>,
    methods: Vec<MethodDef>,
    instances: HashMap<(TypeId, Vec<TypeId>), TypeId>,
    by_name: HashMap<(Option<String>, String, u32), TypeId>,
    well_known: WellKnownTypes,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// Create a table seeded with the well-known types.
    pub fn new() -> Self {
        let placeholder = TypeId(0);
        let mut table = Self {
            types: Vec::new(),
            methods: Vec::new(),
            instances: HashMap::new(),
            by_name: HashMap::new(),
            well_known: WellKnownTypes {
                object: placeholder,
                null: placeholder,
                void: placeholder,
                boolean: placeholder,
                string: placeholder,
                nullable: placeholder,
                extensible: placeholder,
                numerics: [placeholder; 12],
            },
        };

        let sys = Some(SYSTEM_NAMESPACE);
        let object = table.push(TypeDef::new(sys, "Object", TypeKind::Object));
        let null = table.push(TypeDef::new(None, "null", TypeKind::Null));
        let void = table.push(TypeDef::new(sys, "Void", TypeKind::Void));
        let boolean = table.push(TypeDef::new(sys, "Boolean", TypeKind::Boolean));
        let mut string_def = TypeDef::new(sys, "String", TypeKind::String);
        string_def.base = Some(object);
        let string = table.push(string_def);

        let mut numerics = [placeholder; 12];
        for kind in NumericKind::ALL {
            numerics[kind.position()] =
                table.push(TypeDef::new(sys, kind.name(), TypeKind::Numeric(kind)));
        }

        let nullable = table.push_definition(sys, "Nullable", TypeKind::Struct, &["T"]);
        let extensible =
            table.push_definition(Some(RUNTIME_NAMESPACE), "Extensible", TypeKind::Class, &["T"]);
        let value_type = table.generic_parameters(extensible)[0];
        let wrapper = &mut table.types[extensible.index()];
        wrapper.base = Some(object);
        wrapper.properties.push(PropertyDef {
            name: "Value".to_owned(),
            ty: value_type,
            is_static: false,
        });

        table.well_known = WellKnownTypes {
            object,
            null,
            void,
            boolean,
            string,
            nullable,
            extensible,
            numerics,
        };
        table
    }

    fn push(&mut self, def: TypeDef) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        if !matches!(def.kind, TypeKind::GenericParameter { .. })
            && !matches!(def.generic, GenericShape::Instance { .. })
        {
            self.by_name
                .insert((def.namespace.clone(), def.name.clone(), def.arity()), id);
        }
        self.types.push(def);
        id
    }

    fn push_definition(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        kind: TypeKind,
        parameter_names: &[&str],
    ) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        let parameters: Vec<TypeId> = (0..parameter_names.len())
            .map(|i| TypeId((self.types.len() + 1 + i) as u32))
            .collect();
        let mut def = TypeDef::new(namespace, name, kind);
        def.generic = GenericShape::Definition {
            parameters: parameters.clone(),
        };
        self.push(def);
        for (position, parameter_name) in parameter_names.iter().enumerate() {
            self.push(TypeDef::new(
                None,
                parameter_name,
                TypeKind::GenericParameter {
                    position: position as u32,
                },
            ));
        }
        debug_assert_eq!(self.types[id.index()].arity() as usize, parameters.len());
        id
    }

    fn check_new_name(
        &self,
        namespace: &str,
        name: &str,
        arity: u32,
    ) -> Result<(), TypeError> {
        let key = (Some(namespace.to_owned()), name.to_owned(), arity);
        if self.by_name.contains_key(&key) {
            return Err(TypeError::DuplicateType {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn check(&self, id: TypeId) -> Result<(), TypeError> {
        if id.index() < self.types.len() {
            Ok(())
        } else {
            Err(TypeError::UnknownType { id })
        }
    }

    // =========================================================================
    // Building
    // =========================================================================

    /// Define a non-generic type. Classes default to deriving from `Object`.
    pub fn define(
        &mut self,
        namespace: &str,
        name: &str,
        kind: TypeKind,
    ) -> Result<TypeId, TypeError> {
        self.check_new_name(namespace, name, 0)?;
        let mut def = TypeDef::new(Some(namespace), name, kind);
        if kind == TypeKind::Class {
            def.base = Some(self.well_known.object);
        }
        Ok(self.push(def))
    }

    /// Define an open generic type such as `List<T>`.
    pub fn define_generic(
        &mut self,
        namespace: &str,
        name: &str,
        kind: TypeKind,
        parameter_names: &[&str],
    ) -> Result<TypeId, TypeError> {
        self.check_new_name(namespace, name, parameter_names.len() as u32)?;
        let id = self.push_definition(Some(namespace), name, kind, parameter_names);
        if kind == TypeKind::Class {
            self.types[id.index()].base = Some(self.well_known.object);
        }
        Ok(id)
    }

    pub fn set_base(&mut self, ty: TypeId, base: TypeId) -> Result<(), TypeError> {
        self.check(ty)?;
        self.check(base)?;
        self.types[ty.index()].base = Some(base);
        Ok(())
    }

    pub fn add_interface(&mut self, ty: TypeId, interface: TypeId) -> Result<(), TypeError> {
        self.check(ty)?;
        self.check(interface)?;
        let interfaces = &mut self.types[ty.index()].interfaces;
        if !interfaces.contains(&interface) {
            interfaces.push(interface);
        }
        Ok(())
    }

    pub fn set_public(&mut self, ty: TypeId, is_public: bool) -> Result<(), TypeError> {
        self.check(ty)?;
        self.types[ty.index()].is_public = is_public;
        Ok(())
    }

    pub fn add_property(
        &mut self,
        ty: TypeId,
        name: &str,
        property_type: TypeId,
        is_static: bool,
    ) -> Result<(), TypeError> {
        self.check(ty)?;
        self.check(property_type)?;
        self.types[ty.index()].properties.push(PropertyDef {
            name: name.to_owned(),
            ty: property_type,
            is_static,
        });
        Ok(())
    }

    pub fn add_method(&mut self, declaring: TypeId, spec: MethodSpec) -> Result<MethodId, TypeError> {
        self.check(declaring)?;
        self.check(spec.return_type)?;
        for &parameter in &spec.parameters {
            self.check(parameter)?;
        }
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(MethodDef {
            name: spec.name,
            declaring_type: declaring,
            parameters: spec.parameters,
            return_type: spec.return_type,
            is_static: spec.is_static,
            is_public: spec.is_public,
            is_extension: spec.is_extension,
            explicit_only: spec.explicit_only,
        });
        self.types[declaring.index()].methods.push(id);
        Ok(id)
    }

    /// Instantiate a generic definition. Equal arguments yield the same id.
    ///
    /// Base type and interfaces of the definition are substituted with the
    /// arguments; members stay on the definition.
    pub fn instantiate(
        &mut self,
        definition: TypeId,
        arguments: &[TypeId],
    ) -> Result<TypeId, TypeError> {
        self.check(definition)?;
        for &argument in arguments {
            self.check(argument)?;
        }
        let def = &self.types[definition.index()];
        let GenericShape::Definition { parameters } = &def.generic else {
            return Err(TypeError::NotGenericDefinition {
                name: def.full_name(),
            });
        };
        if parameters.len() != arguments.len() {
            return Err(TypeError::ArityMismatch {
                name: def.full_name(),
                expected: parameters.len() as u32,
                actual: arguments.len(),
            });
        }
        let key = (definition, arguments.to_vec());
        if let Some(&existing) = self.instances.get(&key) {
            return Ok(existing);
        }

        let mut instance = TypeDef::new(def.namespace.as_deref(), &def.name, def.kind);
        instance.is_public = def.is_public;
        instance.generic = GenericShape::Instance {
            definition,
            arguments: arguments.to_vec(),
        };
        let base = def.base;
        let interfaces = def.interfaces.clone();
        let id = self.push(instance);
        self.instances.insert(key, id);

        let base = match base {
            Some(base) => Some(self.substitute(base, arguments)?),
            None => None,
        };
        let mut substituted = Vec::with_capacity(interfaces.len());
        for interface in interfaces {
            substituted.push(self.substitute(interface, arguments)?);
        }
        let instance = &mut self.types[id.index()];
        instance.base = base;
        instance.interfaces = substituted;
        Ok(id)
    }

    /// Replace generic parameters (by position) with `arguments`.
    fn substitute(&mut self, ty: TypeId, arguments: &[TypeId]) -> Result<TypeId, TypeError> {
        match self.types[ty.index()].kind {
            TypeKind::GenericParameter { position } => {
                Ok(arguments.get(position as usize).copied().unwrap_or(ty))
            }
            _ => match self.types[ty.index()].generic.clone() {
                GenericShape::Instance {
                    definition,
                    arguments: inner,
                } => {
                    let mut replaced = Vec::with_capacity(inner.len());
                    for argument in inner {
                        replaced.push(self.substitute(argument, arguments)?);
                    }
                    self.instantiate(definition, &replaced)
                }
                _ => Ok(ty),
            },
        }
    }

    /// `Nullable<T>` for `underlying`.
    pub fn nullable_of(&mut self, underlying: TypeId) -> Result<TypeId, TypeError> {
        self.instantiate(self.well_known.nullable, &[underlying])
    }

    /// `Extensible<T>` for `underlying`.
    pub fn extensible_of(&mut self, underlying: TypeId) -> Result<TypeId, TypeError> {
        self.instantiate(self.well_known.extensible, &[underlying])
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains(&self, ty: TypeId) -> bool {
        ty.index() < self.types.len()
    }

    pub fn contains_method(&self, method: MethodId) -> bool {
        method.index() < self.methods.len()
    }

    /// Panics if `ty` does not belong to this table.
    pub fn get(&self, ty: TypeId) -> &TypeDef {
        &self.types[ty.index()]
    }

    /// Panics if `method` does not belong to this table.
    pub fn method(&self, method: MethodId) -> &MethodDef {
        &self.methods[method.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDef)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, def)| (TypeId(i as u32), def))
    }

    /// Find a type definition by namespace, name and generic arity.
    pub fn find(&self, namespace: &str, name: &str, arity: u32) -> Option<TypeId> {
        self.by_name
            .get(&(Some(namespace.to_owned()), name.to_owned(), arity))
            .copied()
    }

    pub fn kind(&self, ty: TypeId) -> TypeKind {
        self.get(ty).kind
    }

    pub fn numeric_kind(&self, ty: TypeId) -> Option<NumericKind> {
        match self.kind(ty) {
            TypeKind::Numeric(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn base_type(&self, ty: TypeId) -> Option<TypeId> {
        self.get(ty).base
    }

    pub fn is_value_type(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Boolean | TypeKind::Numeric(_) | TypeKind::Struct | TypeKind::Enum
        )
    }

    pub fn is_interface(&self, ty: TypeId) -> bool {
        self.kind(ty) == TypeKind::Interface
    }

    pub fn is_reference_type(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Object | TypeKind::String | TypeKind::Class | TypeKind::Interface
        )
    }

    pub fn is_generic_parameter(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::GenericParameter { .. })
    }

    pub fn generic_parameters(&self, definition: TypeId) -> &[TypeId] {
        match &self.get(definition).generic {
            GenericShape::Definition { parameters } => parameters,
            _ => &[],
        }
    }

    pub fn generic_arguments(&self, ty: TypeId) -> &[TypeId] {
        match &self.get(ty).generic {
            GenericShape::Instance { arguments, .. } => arguments,
            _ => &[],
        }
    }

    /// The open generic definition of an instance, or `ty` itself.
    pub fn open_definition(&self, ty: TypeId) -> TypeId {
        match &self.get(ty).generic {
            GenericShape::Instance { definition, .. } => *definition,
            _ => ty,
        }
    }

    pub fn is_instance_of(&self, ty: TypeId, definition: TypeId) -> bool {
        matches!(
            &self.get(ty).generic,
            GenericShape::Instance { definition: d, .. } if *d == definition
        )
    }

    /// `T` when `ty` is `Nullable<T>`.
    pub fn nullable_underlying(&self, ty: TypeId) -> Option<TypeId> {
        if self.is_instance_of(ty, self.well_known.nullable) {
            self.generic_arguments(ty).first().copied()
        } else {
            None
        }
    }

    /// `T` when `ty` is `Extensible<T>`.
    pub fn extensible_underlying(&self, ty: TypeId) -> Option<TypeId> {
        if self.is_instance_of(ty, self.well_known.extensible) {
            self.generic_arguments(ty).first().copied()
        } else {
            None
        }
    }

    /// An instance that was already created with [`TypeTable::instantiate`].
    pub fn find_instance(&self, definition: TypeId, arguments: &[TypeId]) -> Option<TypeId> {
        self.instances
            .get(&(definition, arguments.to_vec()))
            .copied()
    }

    /// Read-only substitution of the generic parameters in `ty` by the
    /// arguments of `instance`. Falls back to `ty` when the substituted
    /// type was never instantiated.
    pub fn substitute_existing(&self, ty: TypeId, instance: TypeId) -> TypeId {
        let arguments = self.generic_arguments(instance);
        if arguments.is_empty() {
            return ty;
        }
        self.substitute_with(ty, arguments).unwrap_or(ty)
    }

    fn substitute_with(&self, ty: TypeId, arguments: &[TypeId]) -> Option<TypeId> {
        if let TypeKind::GenericParameter { position } = self.kind(ty) {
            return arguments.get(position as usize).copied();
        }
        match &self.get(ty).generic {
            GenericShape::Instance {
                definition,
                arguments: inner,
            } => {
                let replaced = inner
                    .iter()
                    .map(|&argument| self.substitute_with(argument, arguments))
                    .collect::<Option<Vec<_>>>()?;
                self.find_instance(*definition, &replaced)
            }
            _ => Some(ty),
        }
    }

    /// Whether the type mentions a generic parameter anywhere.
    pub fn contains_generic_parameters(&self, ty: TypeId) -> bool {
        if self.is_generic_parameter(ty) {
            return true;
        }
        match &self.get(ty).generic {
            GenericShape::Definition { .. } => true,
            GenericShape::Instance { arguments, .. } => arguments
                .iter()
                .any(|&argument| self.contains_generic_parameters(argument)),
            GenericShape::NonGeneric => false,
        }
    }

    /// Base chain of `ty`, excluding `ty` itself.
    pub fn base_chain(&self, ty: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        std::iter::successors(self.base_type(ty), move |&t| self.base_type(t))
    }

    /// Every interface implemented by `ty`, its interfaces and its base types.
    /// First-seen order, no duplicates.
    pub fn all_interfaces(&self, ty: TypeId) -> Vec<TypeId> {
        let mut result = Vec::new();
        let mut pending: Vec<TypeId> = std::iter::once(ty)
            .chain(self.base_chain(ty))
            .flat_map(|t| self.get(t).interfaces.iter().copied())
            .collect();
        pending.reverse();
        while let Some(interface) = pending.pop() {
            if result.contains(&interface) {
                continue;
            }
            result.push(interface);
            for &inherited in self.get(interface).interfaces.iter().rev() {
                pending.push(inherited);
            }
        }
        result
    }

    /// Whether a value of static type `source` can be used where `target` is
    /// expected without any conversion code (identity, reference widening,
    /// interface implementation, or any non-void type to `Object`).
    ///
    /// The `null` marker is never assignable here; conversion rules handle it.
    pub fn is_assignable_from(&self, target: TypeId, source: TypeId) -> bool {
        if target == source {
            return true;
        }
        match (self.kind(target), self.kind(source)) {
            (_, TypeKind::Void | TypeKind::Null) | (TypeKind::Void, _) => return false,
            (TypeKind::Object, _) => return true,
            _ => {}
        }
        if self.base_chain(source).any(|base| base == target) {
            return true;
        }
        self.is_interface(target) && self.all_interfaces(source).contains(&target)
    }

    /// Assignability that treats generic parameters in `target` as wildcards:
    /// `IEnumerable<T>` accepts `List<Int32>` when `List<T>` implements
    /// `IEnumerable<T>`.
    pub fn is_assignable_from_open(&self, target: TypeId, source: TypeId) -> bool {
        if self.is_generic_parameter(target) {
            return true;
        }
        if !self.contains_generic_parameters(target) {
            return self.is_assignable_from(target, source);
        }
        let open_target = self.open_definition(target);
        std::iter::once(source)
            .chain(self.base_chain(source))
            .chain(self.all_interfaces(source))
            .any(|candidate| self.open_definition(candidate) == open_target)
    }

    /// Readable name used in diagnostics: `System.Collections.Generic.List<System.Int32>`.
    pub fn display_name(&self, ty: TypeId) -> String {
        let def = self.get(ty);
        match &def.generic {
            GenericShape::NonGeneric => def.full_name(),
            GenericShape::Definition { parameters } => format!(
                "{}<{}>",
                def.full_name(),
                parameters
                    .iter()
                    .map(|&p| self.get(p).name.clone())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            GenericShape::Instance { arguments, .. } => format!(
                "{}<{}>",
                def.full_name(),
                arguments
                    .iter()
                    .map(|&a| self.display_name(a))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    pub fn method_signature(&self, method: MethodId) -> String {
        let def = self.method(method);
        format!(
            "{}.{}({})",
            self.display_name(def.declaring_type),
            def.name,
            def.parameters
                .iter()
                .map(|&p| self.display_name(p))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
