// Batch Conversion
//
// Converts every implementation file of a program. Conversions share the program
// read-only and are independent of each other, so they run on the rayon pool.

use crate::config::AnnotatorOptions;
use crate::error::AnnotatorError;
use crate::logging::Logger;
use crate::program::Program;
use crate::sourcemaps::SourceMap;
use rayon::prelude::*;
use ts::{Diagnostic, FileId};

/// Converted text of one file.
#[derive(Debug, Clone)]
pub struct FileOutput {
    pub file_name: String,
    pub output: String,
    pub source_map: Option<SourceMap>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Converts each file in `program` except declaration files, in program order.
pub fn convert_all(
    program: &Program,
    options: &AnnotatorOptions,
    logger: &dyn Logger,
) -> Vec<Result<FileOutput, AnnotatorError>> {
    let files: Vec<FileId> = program
        .file_ids()
        .filter(|id| {
            program
                .source_file(*id)
                .is_some_and(|file| !file.is_declaration_file())
        })
        .collect();
    logger.info(&format!("converting {} files", files.len()));

    files
        .par_iter()
        .map(|&file| convert_file(program, file, options, logger))
        .collect()
}

pub fn convert_file(
    program: &Program,
    file: FileId,
    options: &AnnotatorOptions,
    logger: &dyn Logger,
) -> Result<FileOutput, AnnotatorError> {
    let source = program
        .source_file(file)
        .ok_or(AnnotatorError::UnknownFile(file))?;
    let file_name = source.file_name().to_string();
    logger.debug(&format!("converting {}", file_name));

    let result = program.convert_decorators_with_logger(file, options, logger)?;
    let source_map = match &result.position_map {
        Some(map) => Some(
            map.to_source_map(&file_name, &file_name, Some(source.text()))
                .ok_or_else(|| AnnotatorError::SourceMap(file_name.clone()))?,
        ),
        None => None,
    };

    Ok(FileOutput {
        file_name,
        output: result.output,
        source_map,
        diagnostics: result.diagnostics,
    })
}
