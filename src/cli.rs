//! Command-line interface for the Quill script checker.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quill_front::ParameterSpec;

use quill::pipeline::parse_parameter;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Quill event scripting language checker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile a script against the standard host and report diagnostics
    Check {
        /// Script file
        file: PathBuf,

        /// JSON file with compile options; flags below extend it
        #[arg(long)]
        options: Option<PathBuf>,

        /// Namespace imported before the script's own `using` directives
        #[arg(long = "import", value_name = "NAMESPACE")]
        imports: Vec<String>,

        /// Script parameter
        #[arg(long = "param", value_name = "NAME:TYPE", value_parser = parse_parameter)]
        params: Vec<ParameterSpec>,

        /// Implicitly convert the script's value to this type
        #[arg(long = "result-type", value_name = "TYPE")]
        result_type: Option<String>,

        /// Evaluate arithmetic in a checked scope
        #[arg(long)]
        checked: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// List the dispatch descriptors used by the bound script
        #[arg(long)]
        show_dispatch: bool,
    },
    /// List extension methods that apply to a host type
    Extensions {
        /// Full type name, such as `Supremacy.Game.Colony`
        type_name: String,

        /// Namespaces whose providers count as imported
        #[arg(long = "import", value_name = "NAMESPACE")]
        imports: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
