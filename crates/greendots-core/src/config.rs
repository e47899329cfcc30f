//! Worker configuration.

/// Default chunk size for reading a worker's channel (64KB).
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Exit code of a child whose unit of work panicked.
///
/// Matches the code a panicking Rust `main` exits with.
pub const DEFAULT_PANIC_EXIT_CODE: i32 = 101;

/// Configuration for forked workers.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Chunk size used by the parent while draining the channel.
    pub read_chunk_size: usize,
    /// Exit code used by the child when the unit of work panics.
    pub panic_exit_code: i32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            panic_exit_code: DEFAULT_PANIC_EXIT_CODE,
        }
    }
}

impl WorkerConfig {
    /// Set the read chunk size. Zero is bumped to one byte.
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Set the exit code for a panicking child.
    pub fn panic_exit_code(mut self, code: i32) -> Self {
        self.panic_exit_code = code;
        self
    }
}
