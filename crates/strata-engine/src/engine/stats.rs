use core::fmt;

/// What one call to `flush` did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FlushStats {
    /// Non-empty layers whose settings were resolved and whose tasks ran.
    pub layers_flushed: usize,
    /// Tasks driven through their phases, failed ones included.
    pub tasks_executed: usize,
    /// Tasks that returned an error from any phase.
    pub tasks_failed: usize,
    /// Deferred tasks run by the end-of-frame drain.
    pub deferred_executed: usize,
}

impl fmt::Display for FlushStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} layers, {} tasks ({} failed), {} deferred",
            self.layers_flushed, self.tasks_executed, self.tasks_failed, self.deferred_executed
        )
    }
}
