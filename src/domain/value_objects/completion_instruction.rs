//! Job completion instruction value object module
//!
//! The instruction a trigger hands back after a fire completes (§4.6), and
//! that `JobStore::triggered_job_complete` (§4.3) applies to reverse the
//! `EXECUTING` state.

/// What the store should do with a trigger once its job run has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionInstruction {
    /// No special action; the trigger's already-computed `nextFireTime`
    /// decides whether it goes back to `WAITING` or `COMPLETE`.
    Noop,
    DeleteTrigger,
    SetTriggerComplete,
    ReExecuteJob,
    SetTriggerError,
    SetAllJobTriggersError,
    SetAllJobTriggersComplete,
}
