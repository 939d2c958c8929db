//! Name resolution for one compilation unit.
//!
//! Names are resolved in this order:
//! 1. Aliases declared by the script (`using Alias = Some.Namespace;`)
//! 2. Top-level namespaces of the host (`System`, `Supremacy`, ...)
//! 3. Types in the script's imports followed by the namespaces the host
//!    makes visible to every script
//!
//! A simple name found as a type in two different namespaces of step 3 is
//! an ambiguous reference.

use std::cell::RefCell;
use std::collections::HashMap;

use quill_core::diagnostic::codes;
use quill_core::{CompilationPhase, Diagnostic, Entity, MethodId, NamespaceId, Span, TypeId};
use quill_runtime::ScriptRuntime;
use tracing::debug;

use crate::flags::{ScopeFlagStack, ScopeFlags};

/// Extension methods applicable to a receiver, before overload resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionMethodGroup {
    pub methods: Vec<MethodId>,
    pub receiver: TypeId,
    pub location: Span,
}

/// Per-compilation name resolution state. Owned by one compilation; never
/// shared between threads.
pub struct NameResolver<'rt> {
    runtime: &'rt ScriptRuntime,
    aliases: HashMap<String, Entity>,
    imports: Vec<NamespaceId>,
    flags: ScopeFlagStack,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl<'rt> NameResolver<'rt> {
    pub fn new(runtime: &'rt ScriptRuntime) -> Self {
        Self::with_flags(runtime, ScopeFlags::empty())
    }

    pub fn with_flags(runtime: &'rt ScriptRuntime, flags: ScopeFlags) -> Self {
        Self {
            runtime,
            aliases: HashMap::new(),
            imports: Vec::new(),
            flags: ScopeFlagStack::new(flags),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    pub fn runtime(&self) -> &'rt ScriptRuntime {
        self.runtime
    }

    pub fn flags(&self) -> &ScopeFlagStack {
        &self.flags
    }

    /// Add `ns` to the imports unless already present.
    pub fn import_namespace(&mut self, ns: NamespaceId) -> bool {
        if self.imports.contains(&ns) {
            return false;
        }
        self.imports.push(ns);
        true
    }

    pub fn imports(&self) -> &[NamespaceId] {
        &self.imports
    }

    /// Declare a script alias. The first declaration of a name wins.
    pub fn add_alias(&mut self, alias: &str, entity: Entity) -> bool {
        if self.aliases.contains_key(alias) {
            return false;
        }
        self.aliases.insert(alias.to_owned(), entity);
        true
    }

    /// Script aliases first, then the host's alias groups.
    pub fn resolve_alias(&self, name: &str) -> Option<Entity> {
        if let Some(entity) = self.aliases.get(name) {
            return Some(entity.clone());
        }
        self.runtime
            .namespaces()
            .lookup_alias_group(name)
            .map(Entity::NamespaceGroup)
    }

    /// Resolve a simple name to a namespace or type.
    ///
    /// Reports an ambiguous reference and returns `None` when two imported
    /// namespaces provide different types of that name, unless
    /// `ignore_ambiguous` is set, in which case the first is returned.
    pub fn resolve_name(
        &self,
        name: &str,
        location: Span,
        ignore_ambiguous: bool,
        generic_arity: u32,
    ) -> Option<Entity> {
        if let Some(entity) = self.aliases.get(name) {
            return Some(entity.clone());
        }
        let namespaces = self.runtime.namespaces();
        if let Some(top_level) = namespaces.root_child(name) {
            return Some(Entity::Namespace(top_level));
        }

        let mut searched = self.imports.clone();
        for visible in namespaces.visible_namespaces() {
            if !searched.contains(&visible) {
                searched.push(visible);
            }
        }

        let tree = namespaces.tree();
        let mut types: Vec<TypeId> = Vec::new();
        let mut first_namespace = None;
        for ns in searched {
            match tree.lookup(ns, name, generic_arity) {
                Some(Entity::Type(ty)) if !types.contains(&ty) => types.push(ty),
                Some(entity @ Entity::Namespace(_)) if first_namespace.is_none() => {
                    first_namespace = Some(entity);
                }
                _ => {}
            }
        }

        match types.as_slice() {
            [] => first_namespace,
            [only] => Some(Entity::Type(*only)),
            [first, second, ..] => {
                if ignore_ambiguous {
                    return Some(Entity::Type(*first));
                }
                let type_table = self.runtime.types();
                self.report(Diagnostic::error(
                    codes::AMBIGUOUS_REFERENCE,
                    format!(
                        "'{name}' is an ambiguous reference between '{}' and '{}'.",
                        type_table.display_name(*first),
                        type_table.display_name(*second)
                    ),
                    location,
                    CompilationPhase::NameResolution,
                ));
                None
            }
        }
    }

    /// Extension methods named `name` that accept `receiver` as their first
    /// argument, from providers visible to this script.
    pub fn resolve_extension_method(
        &self,
        receiver: TypeId,
        name: &str,
        location: Span,
    ) -> Option<ExtensionMethodGroup> {
        let runtime = self.runtime;
        let types = runtime.types();
        let open = types.open_definition(receiver);

        let methods: Vec<MethodId> = runtime
            .extensions()
            .lookup(types, open)
            .into_iter()
            .filter(|&provider| self.is_type_visible(provider))
            .flat_map(|provider| runtime.members().members(types, provider).named(name).to_vec())
            .filter(|&method| {
                let def = types.method(method);
                def.is_public
                    && def.is_static
                    && def.is_extension
                    && def
                        .parameters
                        .first()
                        .is_some_and(|&first| types.is_assignable_from_open(first, receiver))
            })
            .collect();

        if methods.is_empty() {
            return None;
        }
        Some(ExtensionMethodGroup {
            methods,
            receiver,
            location,
        })
    }

    /// A type is visible when it can be named through a host-visible
    /// namespace or when its namespace is imported by the script.
    pub fn is_type_visible(&self, ty: TypeId) -> bool {
        let namespaces = self.runtime.namespaces();
        let types = self.runtime.types();
        if namespaces.is_script_visible_type(types, ty) {
            return true;
        }
        let Some(namespace) = &types.get(types.open_definition(ty)).namespace else {
            return false;
        };
        let tree = namespaces.tree();
        self.imports
            .iter()
            .any(|&ns| tree.get(ns).full_name == *namespace)
    }

    /// Record a diagnostic, unless the compilation is probing.
    pub fn report(&self, diagnostic: Diagnostic) {
        if self.flags.has_set(ScopeFlags::PROBING_MODE) {
            return;
        }
        debug!(code = diagnostic.code, message = %diagnostic.message, "diagnostic");
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.is_error())
            .count()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}
