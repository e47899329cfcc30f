//! Echo command: a round trip through forked workers.

use std::io::Write;

use anyhow::Context;
use greendots_core::Worker;

/// Fork `jobs` workers that each write `"<message> #<i>"`, then print the
/// results in fork order.
pub fn execute(message: &str, jobs: usize) -> anyhow::Result<()> {
    let mut workers = Vec::with_capacity(jobs);
    for i in 0..jobs {
        let worker = Worker::fork(|writer| {
            let _ = write!(writer, "{} #{}", message, i);
        })
        .with_context(|| format!("Failed to fork echo worker {}", i))?;
        workers.push(worker);
    }

    for (i, worker) in workers.into_iter().enumerate() {
        let bytes = worker
            .wait()
            .with_context(|| format!("Failed to wait for echo worker {}", i))?;
        println!("{}", String::from_utf8_lossy(&bytes));
    }

    Ok(())
}
