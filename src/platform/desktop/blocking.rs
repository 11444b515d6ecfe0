use std::time::Instant;

use tracing::{debug, info_span};

/// Runs `f` on a scoped worker thread and waits for it. The caller is blocked for the
/// whole call; the worker thread only keeps reqwest's blocking client off the UI
/// runtime thread, where it would panic.
pub fn run_blocking<F, T>(action: &'static str, f: F) -> T
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    let span = info_span!("blocking", action);
    let started = Instant::now();
    let result = std::thread::scope(|scope| {
        let worker = scope.spawn(|| span.in_scope(f));
        match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    });
    debug!(action, elapsed_ms = started.elapsed().as_millis() as u64, "blocking call finished");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_blocking_returns_closure_result() {
        let value = 41;
        assert_eq!(run_blocking("add", || value + 1), 42);
    }

    #[test]
    fn run_blocking_uses_a_separate_thread() {
        let caller = std::thread::current().id();
        let worker = run_blocking("thread", || std::thread::current().id());
        assert_ne!(worker, caller);
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn run_blocking_propagates_panics() {
        run_blocking::<_, ()>("panic", || panic!("boom"));
    }
}
