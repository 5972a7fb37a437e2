use crate::migration::MigrationCompiler;
use crate::pool::types::{CompileJob, CompileOutcome};
use crossbeam_channel::{Receiver, Sender};

/// The worker thread entrypoint: compile tables until the job queue closes.
pub fn run_worker_loop(
    rx: Receiver<CompileJob<'_>>,
    response_tx: Sender<CompileOutcome>,
    compiler: &MigrationCompiler<'_>,
) {
    while let Ok(job) = rx.recv() {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("compile_table", table = %job.table.name).entered();

        let result = compiler.compile(job.table);
        if let Err(err) = &result {
            log::error!("Failed to compile {}: {}", job.table.name, err);
        }
        if response_tx
            .send(CompileOutcome {
                index: job.index,
                result,
            })
            .is_err()
        {
            break;
        }
    }
}
