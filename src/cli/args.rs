use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the sable binary.
#[derive(Parser, Debug)]
#[command(
    name = "sable",
    version,
    about = "Semantic checking for sable declaration manifests"
)]
pub struct CliArgs {
    /// Unit manifest (JSON) describing modules, units and declarations.
    pub manifest: PathBuf,

    /// File name of the unit to check. Defaults to the first main unit.
    #[arg(short = 'u', long)]
    pub unit: Option<String>,

    /// Index of the first top-level declaration to check.
    #[arg(long, default_value_t = 0)]
    pub start: usize,

    /// Treat every unit of the checked module as one compilation.
    #[arg(long = "whole-module", alias = "wmo")]
    pub whole_module: bool,

    /// Run finality inference after checking.
    #[arg(long = "infer-final")]
    pub infer_final: bool,

    /// Print a JSON report on stdout instead of rendered diagnostics.
    #[arg(long)]
    pub json: bool,

    /// Skip the post-check verifier.
    #[arg(long = "no-verify")]
    pub no_verify: bool,

    /// Do not diagnose bridged declarations in units that lack the bridging import.
    #[arg(long = "allow-unimported-bridging")]
    pub allow_unimported_bridging: bool,

    /// Stylize diagnostics with color. Defaults to on for terminals.
    #[arg(long, value_name = "BOOL")]
    pub pretty: Option<bool>,
}
