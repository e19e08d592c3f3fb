//! One checker run: manifest in, diagnostics and statistics out.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::path::Path;
use tracing::{Level, info, span};

use sable_ast::{AstContext, DeclFlags, DeclId, DeclKind, UnitId};
use sable_checker::{
    CheckerOptions, CheckerServices, CheckerStatistics, TopLevelContext, perform_type_checking,
    perform_whole_module_checks,
};
use sable_common::Diagnostic;

use super::args::CliArgs;
use super::manifest::{Project, load_manifest};
use super::reporter::Reporter;

/// No error diagnostics.
pub const EXIT_SUCCESS: i32 = 0;
/// Checking reported at least one error.
pub const EXIT_DIAGNOSTICS: i32 = 1;

/// Result of a run, also the `--json` output format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub unit: String,
    pub stage: String,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: StatsReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finality: Option<FinalityReport>,
}

impl CheckReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub rounds: u32,
    pub bodies_checked: u32,
    pub externals_processed: u32,
    pub types_revalidated: u32,
}

impl From<CheckerStatistics> for StatsReport {
    fn from(stats: CheckerStatistics) -> Self {
        Self {
            rounds: stats.rounds,
            bodies_checked: stats.bodies_checked,
            externals_processed: stats.externals_processed,
            types_revalidated: stats.types_revalidated,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalityReport {
    pub whole_module: bool,
    pub inferred: usize,
    /// Qualified names of the declarations marked final.
    pub finalized: Vec<String>,
}

#[must_use]
pub fn checker_options(args: &CliArgs, bridging_module: Option<&str>) -> CheckerOptions {
    let mut options = CheckerOptions {
        whole_module: args.whole_module,
        verify: !args.no_verify,
        bridging_attr_requires_module: !args.allow_unimported_bridging,
        ..CheckerOptions::default()
    };
    if let Some(name) = bridging_module {
        options.bridging_module_name = name.to_string();
    }
    options
}

pub fn select_unit(project: &Project, file: Option<&str>) -> Result<UnitId> {
    match file {
        Some(file) => project
            .find_unit(file)
            .with_context(|| format!("no unit named '{file}' in the manifest")),
        None => project
            .default_unit()
            .context("manifest has no main unit; pass --unit to choose one"),
    }
}

/// Check the selected unit of `project`, then run finality inference when
/// requested.
pub fn check_project(project: &mut Project, args: &CliArgs) -> Result<CheckReport> {
    let unit = select_unit(project, args.unit.as_deref())?;
    let file = project.ast.unit(unit).file_name.clone();
    let _span = span!(Level::INFO, "check_project", unit = %file).entered();

    let options = checker_options(args, project.bridging_module.as_deref());
    let services = CheckerServices::standard();
    let mut top_level = TopLevelContext::new();
    let outcome = perform_type_checking(
        &mut project.ast,
        unit,
        &mut top_level,
        args.start,
        &services,
        options,
        None,
    );

    let finality = args.infer_final.then(|| {
        let module = project.ast.unit(unit).module;
        let inferred = perform_whole_module_checks(&mut project.ast, module, unit, args.whole_module);
        info!(inferred, whole_module = args.whole_module, "finality inference");
        FinalityReport {
            whole_module: args.whole_module,
            inferred,
            finalized: inferred_final_names(&project.ast),
        }
    });

    Ok(CheckReport {
        unit: file,
        stage: format!("{:?}", project.ast.unit(unit).stage),
        diagnostics: outcome.diagnostics,
        stats: outcome.stats.into(),
        finality,
    })
}

/// Load, check and report. Returns the process exit code.
pub fn run(args: &CliArgs, out: &mut dyn Write) -> Result<i32> {
    let manifest = load_manifest(&args.manifest)?;
    let mut project = manifest
        .build()
        .with_context(|| format!("failed to build manifest: {}", args.manifest.display()))?;
    let report = check_project(&mut project, args)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        writeln!(out, "{json}")?;
    } else {
        let color = args
            .pretty
            .unwrap_or_else(|| std::io::stdout().is_terminal());
        let root = args.manifest.parent().map(Path::to_path_buf);
        let mut reporter = Reporter::new(color, root);
        if !report.diagnostics.is_empty() {
            writeln!(out, "{}\n", reporter.render(&report.diagnostics))?;
        }
        if let Some(finality) = &report.finality {
            for name in &finality.finalized {
                writeln!(out, "final: {name}")?;
            }
        }
        writeln!(out, "{}", reporter.format_summary(&report.diagnostics, &report.unit))?;
    }

    Ok(if report.has_errors() {
        EXIT_DIAGNOSTICS
    } else {
        EXIT_SUCCESS
    })
}

/// `Outer.Inner.member`; extensions contribute their target path.
#[must_use]
pub fn qualified_name(ast: &AstContext, decl: DeclId) -> String {
    let mut parts = Vec::new();
    let mut current = Some(decl);
    while let Some(id) = current {
        let node = ast.decl(id);
        let part = match &node.kind {
            DeclKind::Extension(ext) => ext
                .refs
                .iter()
                .map(|r| ast.text(r.name))
                .collect::<Vec<_>>()
                .join("."),
            _ => ast.name_of(id).to_string(),
        };
        parts.push(part);
        current = node.parent;
    }
    parts.reverse();
    parts.join(".")
}

fn inferred_final_names(ast: &AstContext) -> Vec<String> {
    ast.decl_ids()
        .filter(|&decl| ast.decl(decl).flags.contains(DeclFlags::FINAL_INFERRED))
        .map(|decl| qualified_name(ast, decl))
        .collect()
}
