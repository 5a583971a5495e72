//! QuickJS runtime and context management.

use std::time::{Duration, Instant};

use anyhow::Result;
use rquickjs::{Context, Runtime};

/// Creates a QuickJS runtime with a memory limit and a wall-clock deadline.
///
/// Once `budget` has elapsed every further interrupt check aborts evaluation
/// with an uncatchable `InternalError`.
pub fn create_runtime(memory_limit: usize, budget: Duration) -> Result<Runtime> {
    let runtime =
        Runtime::new().map_err(|e| anyhow::anyhow!("Failed to create QuickJS runtime: {e}"))?;
    runtime.set_memory_limit(memory_limit);
    let deadline = Instant::now() + budget;
    runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));
    Ok(runtime)
}

/// Creates a QuickJS context within a runtime.
pub fn create_context(runtime: &Runtime) -> Result<Context> {
    Context::full(runtime).map_err(|e| anyhow::anyhow!("Failed to create QuickJS context: {e}"))
}
