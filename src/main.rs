//! Quill CLI entry point.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command, OutputFormat};
use quill::diagnostics::print_diagnostic;
use quill::pipeline::{check_file, extension_methods, load_options};
use quill::standard_runtime;
use quill_front::CompileOptions;
use quill_runtime::ScriptRuntime;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("QUILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = match standard_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error building host: {e}");
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Command::Check {
            file,
            options,
            imports,
            params,
            result_type,
            checked,
            format,
            show_dispatch,
        } => {
            let mut compile_options = match options.as_deref().map(load_options) {
                Some(Ok(loaded)) => loaded,
                Some(Err(e)) => {
                    eprintln!("Error: {e}");
                    return ExitCode::from(2);
                }
                None => CompileOptions::default(),
            };
            compile_options.imports.extend(imports);
            compile_options.parameters.extend(params);
            compile_options.checked |= checked;
            if result_type.is_some() {
                compile_options.result_type = result_type;
            }
            check(&runtime, &compile_options, &file, format, show_dispatch)
        }
        Command::Extensions { type_name, imports } => {
            let Some(ty) = runtime.find_type(&type_name) else {
                eprintln!("Error: unknown type '{type_name}'");
                return ExitCode::from(2);
            };
            for signature in extension_methods(&runtime, ty, &imports) {
                println!("{signature}");
            }
            ExitCode::SUCCESS
        }
    }
}

fn check(
    runtime: &ScriptRuntime,
    options: &CompileOptions,
    file: &std::path::Path,
    format: OutputFormat,
    show_dispatch: bool,
) -> ExitCode {
    let report = match check_file(runtime, options, file) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    let types = runtime.types();

    match format {
        OutputFormat::Json => {
            println!("{:#}", report.to_json(types, show_dispatch));
        }
        OutputFormat::Text => {
            let path = file.display().to_string();
            for diag in &report.output.diagnostics {
                print_diagnostic(diag, &report.source, &path);
            }
            match report.result_type(types) {
                Some(ty) if !report.has_errors() => println!("ok: {ty}"),
                _ => println!(
                    "failed: {} diagnostic(s)",
                    report.output.diagnostics.len()
                ),
            }
            if show_dispatch {
                for site in report.dispatch_sites(types) {
                    match site.conversion {
                        Some(conversion) => {
                            println!("  {} {} => {conversion}", site.span, site.descriptor)
                        }
                        None => println!("  {} {}", site.span, site.descriptor),
                    }
                }
            }
        }
    }

    if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
