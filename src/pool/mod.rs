//! Parallel per-table compilation.
//!
//! Tables are independent once assembled, so a fixed set of scoped worker
//! threads pulls them from a shared queue. Results are put back in catalog
//! order before they are returned, whatever order the workers finish in.

pub mod types;
pub mod worker;

use std::thread;

use crossbeam_channel::{bounded, unbounded};

use crate::config::CompileOptions;
use crate::error::{RefluxError, Result};
use crate::migration::{CompiledTable, MigrationCompiler};
use crate::model::TableData;
use types::CompileJob;
use worker::run_worker_loop;

/// Runs a [`MigrationCompiler`] over every table of a [`TableData`].
#[derive(Debug, Clone, Copy)]
pub struct CompilePool {
    workers: usize,
}

impl CompilePool {
    pub fn new(workers: usize) -> Self {
        CompilePool {
            workers: workers.max(1),
        }
    }

    pub fn from_options(options: &CompileOptions) -> Self {
        CompilePool::new(options.worker_count())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// One result per table, in catalog order. A failed table does not stop
    /// the others.
    pub fn compile_all(
        &self,
        compiler: &MigrationCompiler<'_>,
        data: &TableData,
    ) -> Vec<Result<CompiledTable>> {
        let tables = data.tables();
        if tables.is_empty() {
            return Vec::new();
        }

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("compile_all", tables = tables.len()).entered();

        let workers = self.workers.min(tables.len());
        log::debug!("Compiling {} tables on {} workers", tables.len(), workers);

        let (job_tx, job_rx) = bounded(tables.len());
        for (index, table) in tables.iter().enumerate() {
            if job_tx.send(CompileJob { index, table }).is_err() {
                break;
            }
        }
        drop(job_tx);

        let mut slots: Vec<Option<Result<CompiledTable>>> = tables.iter().map(|_| None).collect();
        let (response_tx, response_rx) = unbounded();

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let rx = job_rx.clone();
                    let tx = response_tx.clone();
                    scope.spawn(move || run_worker_loop(rx, tx, compiler))
                })
                .collect();
            drop(response_tx);

            for outcome in response_rx.iter() {
                slots[outcome.index] = Some(outcome.result);
            }
            for handle in handles {
                if handle.join().is_err() {
                    log::error!("A compile worker panicked");
                }
            }
        });

        slots
            .into_iter()
            .zip(tables)
            .map(|(slot, table)| {
                slot.unwrap_or_else(|| {
                    Err(RefluxError::Worker(format!("no result for table {}", table.name)))
                })
            })
            .collect()
    }
}
