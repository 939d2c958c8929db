//! File-level compilation pipeline used by the CLI.
//!
//! ```text
//! options file ─► CompileOptions ◄─ CLI flags
//!                       │
//! script file ──────────┴─► quill_front::compile ─► CheckReport
//!                                                      │
//!                                      text (ariadne) ◄┴► JSON (serde)
//! ```

use std::path::{Path, PathBuf};

use derive_more::{Display, Error};
use quill_core::{Diagnostic, Span, TypeId, TypeTable};
use quill_front::{
    BoundExpr, BoundKind, CompileOptions, CompileOutput, NameResolver, ParameterSpec, compile,
};
use quill_runtime::ScriptRuntime;
use serde::Serialize;
use tracing::debug;

/// Failure to read the inputs of a compilation. Script errors are
/// diagnostics, never a `PipelineError`.
#[derive(Debug, Display, Error)]
pub enum PipelineError {
    #[display("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[display("invalid options file '{}': {source}", path.display())]
    Options {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn read_source(path: &Path) -> Result<String, PipelineError> {
    std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Load [`CompileOptions`] from a JSON file. Missing fields take their
/// defaults.
pub fn load_options(path: &Path) -> Result<CompileOptions, PipelineError> {
    let text = read_source(path)?;
    serde_json::from_str(&text).map_err(|source| PipelineError::Options {
        path: path.to_owned(),
        source,
    })
}

/// Parse a `name:Type` parameter declaration.
pub fn parse_parameter(text: &str) -> Result<ParameterSpec, String> {
    let (name, type_name) = text
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:TYPE, got '{text}'"))?;
    let (name, type_name) = (name.trim(), type_name.trim());
    if name.is_empty() || type_name.is_empty() {
        return Err(format!("expected NAME:TYPE, got '{text}'"));
    }
    Ok(ParameterSpec {
        name: name.to_owned(),
        type_name: type_name.to_owned(),
    })
}

/// A call site that dispatches through a shared descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchSite {
    pub span: Span,
    pub descriptor: String,
    /// The resolved conversion, for conversion sites.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<String>,
}

/// Outcome of checking one script.
#[derive(Debug)]
pub struct CheckReport {
    pub path: PathBuf,
    pub source: String,
    pub output: CompileOutput,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.output.has_errors()
    }

    /// Display name of the script's static type, when it bound.
    pub fn result_type(&self, types: &TypeTable) -> Option<String> {
        self.output
            .expr
            .as_ref()
            .filter(|expr| !expr.is_error())
            .map(|expr| types.display_name(expr.ty))
    }

    pub fn dispatch_sites(&self, types: &TypeTable) -> Vec<DispatchSite> {
        let mut sites = Vec::new();
        if let Some(expr) = &self.output.expr {
            collect_sites(types, expr, &mut sites);
        }
        sites
    }

    pub fn to_json(&self, types: &TypeTable, show_dispatch: bool) -> serde_json::Value {
        let summary = CheckSummary {
            file: self.path.display().to_string(),
            success: !self.has_errors(),
            result_type: self.result_type(types),
            diagnostics: &self.output.diagnostics,
            dispatch: show_dispatch.then(|| self.dispatch_sites(types)),
        };
        serde_json::json!(summary)
    }
}

#[derive(Serialize)]
struct CheckSummary<'a> {
    file: String,
    success: bool,
    #[serde(rename = "type")]
    result_type: Option<String>,
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    dispatch: Option<Vec<DispatchSite>>,
}

fn collect_sites(types: &TypeTable, expr: &BoundExpr, sites: &mut Vec<DispatchSite>) {
    match &expr.kind {
        BoundKind::Convert {
            conversion,
            descriptor,
            ..
        } => sites.push(DispatchSite {
            span: expr.span,
            descriptor: descriptor.key().display(types).to_string(),
            conversion: Some(conversion.render(types)),
        }),
        BoundKind::Unary { descriptor, .. }
        | BoundKind::Binary { descriptor, .. }
        | BoundKind::Dynamic { descriptor, .. } => sites.push(DispatchSite {
            span: expr.span,
            descriptor: descriptor.key().display(types).to_string(),
            conversion: None,
        }),
        _ => {}
    }
    for child in expr.children() {
        collect_sites(types, child, sites);
    }
}

/// Compile the script at `path`.
pub fn check_file(
    runtime: &ScriptRuntime,
    options: &CompileOptions,
    path: &Path,
) -> Result<CheckReport, PipelineError> {
    let source = read_source(path)?;
    let output = compile(runtime, options, &source);
    debug!(
        file = %path.display(),
        errors = output.diagnostics.len(),
        "checked script"
    );
    Ok(CheckReport {
        path: path.to_owned(),
        source,
        output,
    })
}

/// Signatures of the extension methods that accept `ty` as receiver, from
/// providers visible with `imports` imported.
pub fn extension_methods(runtime: &ScriptRuntime, ty: TypeId, imports: &[String]) -> Vec<String> {
    let tree = runtime.namespaces().tree();
    let mut resolver = NameResolver::new(runtime);
    for ns in imports.iter().filter_map(|import| tree.find(import)) {
        resolver.import_namespace(ns);
    }
    let types = runtime.types();
    runtime
        .extensions()
        .lookup(types, ty)
        .into_iter()
        .filter(|&provider| resolver.is_type_visible(provider))
        .flat_map(|provider| types.get(provider).methods.iter().copied())
        .filter(|&method| {
            let def = types.method(method);
            def.is_extension
                && def
                    .parameters
                    .first()
                    .is_some_and(|&receiver| types.is_assignable_from_open(receiver, ty))
        })
        .map(|method| types.method_signature(method))
        .collect()
}
