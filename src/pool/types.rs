use crate::error::Result;
use crate::migration::CompiledTable;
use crate::model::TableEntry;

/// One table to compile. `index` is its catalog position.
pub struct CompileJob<'a> {
    pub index: usize,
    pub table: &'a TableEntry,
}

pub struct CompileOutcome {
    pub index: usize,
    pub result: Result<CompiledTable>,
}
