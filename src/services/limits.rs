use crate::models::completion::CompletionRecord;
use crate::models::task::TaskRecord;

/// Hard ceiling on per-day completion caps.
pub const MAX_DAILY_CEILING: u32 = 100;

/// Outcome of the per-day limit check. Hitting the cap is a distinct,
/// reportable outcome rather than an error, so callers can tell the user
/// exactly which limit was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionGate {
    Allowed,
    LimitReached { cap: u32 },
}

/// The enforced daily cap after clamping and defaulting. Absent or
/// non-positive caps mean unlimited, never zero.
pub fn effective_cap(max_daily: Option<u32>) -> Option<u32> {
    match max_daily {
        Some(cap) if cap > 0 => Some(cap.min(MAX_DAILY_CEILING)),
        _ => None,
    }
}

pub fn can_complete(task: &TaskRecord, completions_today: &[CompletionRecord]) -> CompletionGate {
    match effective_cap(task.max_daily) {
        None => CompletionGate::Allowed,
        Some(cap) if (completions_today.len() as u32) < cap => CompletionGate::Allowed,
        Some(cap) => CompletionGate::LimitReached { cap },
    }
}
