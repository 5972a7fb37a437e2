//! Forward/reverse program pairs and their module wrapper.

use std::fmt::{self, Write};

use crate::migration::source::{Fragment, SourceWriter};

/// Depth of statements inside the generated `try` blocks.
pub const STATEMENT_DEPTH: usize = 3;

/// Collects the statements of one direction of a migration.
pub struct ProgramBuilder {
    writer: SourceWriter,
}

impl ProgramBuilder {
    pub fn new(unit: &str) -> Self {
        ProgramBuilder {
            writer: SourceWriter::new(unit),
        }
    }

    pub fn push(&mut self, fragment: &dyn Fragment) -> fmt::Result {
        fragment.render(&mut self.writer, STATEMENT_DEPTH)
    }

    pub fn finish(self) -> String {
        self.writer.finish()
    }
}

/// A migration unit: statements to apply it and statements to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationProgram {
    pub forward: String,
    pub reverse: String,
    unit: String,
}

impl MigrationProgram {
    pub fn new(unit: &str, forward: String, reverse: String) -> Self {
        MigrationProgram {
            forward,
            reverse,
            unit: unit.to_string(),
        }
    }

    /// The migration file: `up` and `down`, each in its own transaction that
    /// rolls back and rethrows on failure.
    pub fn to_module(&self) -> Result<String, fmt::Error> {
        let mut w = SourceWriter::new(&self.unit);
        writeln!(w.at(0), "module.exports = {{")?;
        write_direction(&mut w, "up", &self.forward)?;
        write_direction(&mut w, "down", &self.reverse)?;
        writeln!(w.at(0), "}};")?;
        Ok(w.finish())
    }
}

fn write_direction(w: &mut SourceWriter, name: &str, body: &str) -> fmt::Result {
    writeln!(w.at(1), "{}: async (queryInterface, Sequelize) => {{", name)?;
    writeln!(
        w.at(2),
        "const transaction = await queryInterface.sequelize.transaction();"
    )?;
    writeln!(w.at(2), "try {{")?;
    w.write_raw(body);
    writeln!(w.at(3), "await transaction.commit();")?;
    writeln!(w.at(2), "}} catch (err) {{")?;
    writeln!(w.at(3), "await transaction.rollback();")?;
    writeln!(w.at(3), "throw err;")?;
    writeln!(w.at(2), "}}")?;
    writeln!(w.at(1), "}},")
}
