use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::CoreError;
use crate::record::FrozenReaction;
use crate::tree::TraceStep;

/// The collator's second sink: a buffered, append-only text stream
/// recording every trace the logging tree produced.
/// One reaction per block: one line per trace step first, then the
/// reaction's sides, then a blank separator line.
pub struct ReportGenerator {
    writer: BufWriter<File>,
}

impl ReportGenerator {
    pub fn create(path: &Path) -> Result<ReportGenerator, CoreError> {
        let file = File::create(path)?;
        Ok(ReportGenerator {
            writer: BufWriter::new(file),
        })
    }

    /// Emits one reaction's header line: `reactants -> products`.
    pub fn emit_reaction(&mut self, reaction: &FrozenReaction) -> Result<(), CoreError> {
        writeln!(
            self.writer,
            "{:?} -> {:?}",
            reaction.reactants, reaction.products
        )?;
        Ok(())
    }

    /// Emits the trail a decision-tree traversal produced for that reaction.
    pub fn emit_trace(&mut self, trace: &[TraceStep]) -> Result<(), CoreError> {
        for step in trace {
            writeln!(self.writer, "  {step}")?;
        }
        Ok(())
    }

    pub fn emit_newline(&mut self) -> Result<(), CoreError> {
        writeln!(self.writer)?;
        Ok(())
    }

    /// Flushes any buffered output. Called once the collator has drained
    /// both channels for good.
    pub fn finish(mut self) -> Result<(), CoreError> {
        self.writer.flush()?;
        Ok(())
    }
}
