//! Correspondence between positions in the rewritten output and the original source.

use super::source_map::{SourceMap, SourceMapGenerator};

/// 0-based line and UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated: Position,
    pub original: Position,
}

/// Mappings in generated order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
    mappings: Vec<Mapping>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping. A later mapping at the same generated position replaces the earlier one.
    pub fn add(&mut self, mapping: Mapping) {
        match self.mappings.last_mut() {
            Some(last) if last.generated == mapping.generated => *last = mapping,
            Some(last) if last.generated > mapping.generated => {
                debug_assert!(false, "mappings must be added in generated order");
            }
            _ => self.mappings.push(mapping),
        }
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Original position of a generated position, from the closest mapping at or before it
    /// on the same line.
    pub fn original_position_for(&self, generated: Position) -> Option<Position> {
        let index = self.mappings.partition_point(|m| m.generated <= generated);
        let mapping = self.mappings[..index].last()?;
        if mapping.generated.line != generated.line {
            return None;
        }
        let offset = generated.column - mapping.generated.column;
        Some(Position::new(
            mapping.original.line,
            mapping.original.column + offset,
        ))
    }

    /// Encodes the mappings as a v3 source map for a single source file.
    pub fn to_source_map(
        &self,
        generated_file: &str,
        source_file: &str,
        source_content: Option<&str>,
    ) -> Option<SourceMap> {
        let mut generator = SourceMapGenerator::new(Some(generated_file.to_string()));
        generator.add_source(source_file, source_content.map(str::to_string));
        let mut line = 0;
        generator.add_line();
        for mapping in &self.mappings {
            while line < mapping.generated.line {
                generator.add_line();
                line += 1;
            }
            generator
                .add_mapping(
                    mapping.generated.column,
                    source_file,
                    mapping.original.line,
                    mapping.original.column,
                )
                .ok()?;
        }
        generator.to_json()
    }
}
