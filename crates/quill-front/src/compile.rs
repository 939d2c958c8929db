//! One-shot compilation of a script source against a runtime.

use quill_core::diagnostic::codes;
use quill_core::{CompilationPhase, Diagnostic, Entity, Span, TypeId};
use quill_runtime::ScriptRuntime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bind::{Binder, BoundExpr};
use crate::flags::ScopeFlags;
use crate::resolver::NameResolver;
use crate::syntax::{UsingDirective, parse_script};

/// A typed script parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    /// Full type name (`Supremacy.Game.Colony`), or a simple name visible
    /// through the imports.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Settings that apply to one compilation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub parameters: Vec<ParameterSpec>,
    /// Namespaces imported in addition to the script's own `using`s.
    pub imports: Vec<String>,
    /// Start in a checked arithmetic scope.
    pub checked: bool,
    /// When set, the script's value is implicitly converted to this type.
    pub result_type: Option<String>,
}

#[derive(Debug)]
pub struct CompileOutput {
    /// `None` when the source did not parse.
    pub expr: Option<BoundExpr>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

pub fn compile(runtime: &ScriptRuntime, options: &CompileOptions, source: &str) -> CompileOutput {
    let script = match parse_script(source) {
        Ok(script) => script,
        Err(err) => {
            debug!(%err, "script failed to parse");
            return CompileOutput {
                expr: None,
                diagnostics: vec![err.to_diagnostic()],
            };
        }
    };

    let initial = if options.checked {
        ScopeFlags::CHECKED_SCOPE
    } else {
        ScopeFlags::empty()
    };
    let mut resolver = NameResolver::with_flags(runtime, initial);
    for import in &options.imports {
        match runtime.namespaces().tree().find(import) {
            Some(ns) => {
                resolver.import_namespace(ns);
            }
            None => report_missing(&resolver, import, Span::none()),
        }
    }
    for using in &script.usings {
        apply_using(&mut resolver, using);
    }

    let parameters: Vec<(String, TypeId)> = options
        .parameters
        .iter()
        .filter_map(|parameter| {
            let ty = resolve_type_name(&resolver, &parameter.type_name);
            if ty.is_none() {
                report_missing(&resolver, &parameter.type_name, Span::none());
            }
            Some((parameter.name.clone(), ty?))
        })
        .collect();
    let result_type = options.result_type.as_deref().and_then(|name| {
        let ty = resolve_type_name(&resolver, name);
        if ty.is_none() {
            report_missing(&resolver, name, Span::none());
        }
        ty
    });

    let expr = {
        let binder = parameters
            .into_iter()
            .fold(Binder::new(&resolver), |binder, (name, ty)| {
                binder.with_parameter(name, ty)
            });
        match result_type {
            Some(ty) => binder.bind_as(&script.body, ty),
            None => binder.bind(&script.body),
        }
    };

    let diagnostics = resolver.into_diagnostics();
    debug!(
        diagnostics = diagnostics.len(),
        ty = %runtime.types().display_name(expr.ty),
        "compiled script"
    );
    CompileOutput {
        expr: Some(expr),
        diagnostics,
    }
}

fn apply_using(resolver: &mut NameResolver<'_>, using: &UsingDirective) {
    let runtime = resolver.runtime();
    let path = using.dotted_path();
    let namespace = runtime.namespaces().tree().find(&path);
    match (&using.alias, namespace) {
        (None, Some(ns)) => {
            resolver.import_namespace(ns);
        }
        (Some(alias), Some(ns)) => {
            if !resolver.add_alias(&alias.name, Entity::Namespace(ns)) {
                debug!(alias = %alias.name, "duplicate alias ignored");
            }
        }
        (Some(alias), None) => match runtime.find_type(&path) {
            Some(ty) => {
                if !resolver.add_alias(&alias.name, Entity::Type(ty)) {
                    debug!(alias = %alias.name, "duplicate alias ignored");
                }
            }
            None => report_missing(resolver, &path, using.span),
        },
        (None, None) => report_missing(resolver, &path, using.span),
    }
}

/// Full names first, then simple names through the imports.
fn resolve_type_name(resolver: &NameResolver<'_>, name: &str) -> Option<TypeId> {
    resolver.runtime().find_type(name).or_else(|| {
        resolver
            .resolve_name(name, Span::none(), true, 0)
            .and_then(|entity| entity.as_type())
    })
}

fn report_missing(resolver: &NameResolver<'_>, name: &str, span: Span) {
    resolver.report(Diagnostic::error(
        codes::NAMESPACE_NOT_FOUND,
        format!("The type or namespace name '{name}' could not be found"),
        span,
        CompilationPhase::NameResolution,
    ));
}
