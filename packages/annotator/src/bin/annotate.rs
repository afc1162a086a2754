/**
 * annotate
 *
 * Lowers annotation decorators of TypeScript sources into static class metadata.
 */
use anyhow::{Context, Result};
use clap::Parser;
use decorator_annotator::compile::{convert_all, FileOutput};
use decorator_annotator::diagnostics::format_diagnostics;
use decorator_annotator::logging::{ConsoleLogger, Logger};
use decorator_annotator::{AnnotatorOptions, EmitMode, Program};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Debug, Parser)]
#[command(name = "annotate", version, about = "Decorator annotator")]
struct Args {
    /// Input files or glob patterns.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// JSON file with annotator options.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    emit_mode: Option<EmitMode>,

    /// Write a `.map` file next to every output.
    #[arg(long)]
    source_map: bool,

    /// Comment text marking a decorator declaration as an annotation.
    #[arg(long, value_name = "TEXT")]
    annotation_marker: Option<String>,

    #[arg(short, long, value_name = "DIR", default_value = "out")]
    out_dir: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let logger = ConsoleLogger::for_verbosity(args.verbose);

    let mut options = match &args.config {
        Some(path) => AnnotatorOptions::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AnnotatorOptions::default(),
    };
    if let Some(emit_mode) = args.emit_mode {
        options.emit_mode = emit_mode;
    }
    if let Some(marker) = &args.annotation_marker {
        options.annotation_marker = marker.clone();
    }
    options.source_map |= args.source_map;

    let mut program = Program::new();
    for path in expand_inputs(&args.inputs)? {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        program.add_file(path.to_string_lossy(), text)?;
    }

    let mut diagnostic_count = 0;
    for result in convert_all(&program, &options, &logger) {
        let output = result?;
        if !output.diagnostics.is_empty() {
            diagnostic_count += output.diagnostics.len();
            logger.warn(&format_diagnostics(&output.diagnostics, |name| {
                program.source_file_by_name(name)
            }));
        }
        write_output(&args.out_dir, &output)?;
    }

    if diagnostic_count > 0 {
        logger.error(&format!("{} diagnostic(s) reported", diagnostic_count));
        process::exit(1);
    }
    Ok(())
}

/// Expands glob patterns; arguments without matches are taken as literal paths.
fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        let mut matched = false;
        for entry in glob::glob(input).with_context(|| format!("invalid pattern {}", input))? {
            paths.push(entry?);
            matched = true;
        }
        if !matched {
            paths.push(PathBuf::from(input));
        }
    }
    Ok(paths)
}

fn write_output(out_dir: &Path, output: &FileOutput) -> Result<()> {
    let relative = Path::new(&output.file_name)
        .components()
        .filter(|component| matches!(component, std::path::Component::Normal(_)))
        .collect::<PathBuf>();
    let target = out_dir.join(relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut text = output.output.clone();
    if let Some(map) = &output.source_map {
        let map_path = PathBuf::from(format!("{}.map", target.display()));
        fs::write(&map_path, map.to_json()?)
            .with_context(|| format!("failed to write {}", map_path.display()))?;
        if let Some(map_name) = map_path.file_name() {
            text.push_str(&format!("\n//# sourceMappingURL={}", map_name.to_string_lossy()));
        }
    }
    fs::write(&target, text).with_context(|| format!("failed to write {}", target.display()))?;
    Ok(())
}
