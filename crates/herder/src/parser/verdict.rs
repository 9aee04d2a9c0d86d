//! Result classification: pure functions mapping parsed artifacts to a
//! single job [`Verdict`].

use super::model::{StepArtifact, SteeplechaseResult, Verdict};

/// Failed session blocks at or above this count flip a run to `testfailed`
/// even when no individual failure line was captured.
const FAILED_BLOCK_THRESHOLD: usize = 20;

/// Classify a steeplechase run.
///
/// A run whose totals never appeared is busted: the harness died before
/// reporting, so the numbers cannot be trusted either way.
pub fn steeplechase_verdict(result: &SteeplechaseResult) -> Verdict {
    let (Some(_passed), Some(failed)) = (result.total_passed, result.total_failed) else {
        return Verdict::Busted;
    };

    if result.clients.is_empty() {
        return if failed > 0 {
            Verdict::TestFailed
        } else {
            Verdict::Success
        };
    }

    let any_failures = result.clients.iter().any(|client| {
        !client.setup_failures.is_empty()
            || !client.session_failures.is_empty()
            || !client.cleanup_failures.is_empty()
            || client.failed_blocks.len() >= FAILED_BLOCK_THRESHOLD
    });
    if any_failures {
        Verdict::TestFailed
    } else {
        Verdict::Success
    }
}

/// Classify a step artifact as the worst result among its steps.
///
/// Skipped steps are neutral; an artifact with only skipped steps counts as
/// success. An empty artifact is unknown.
pub fn steps_verdict(artifact: &StepArtifact) -> Verdict {
    if artifact.steps.is_empty() {
        return Verdict::Unknown;
    }
    let mut worst = Verdict::Success;
    for step in &artifact.steps {
        if step.result != Verdict::Skipped && severity(step.result) > severity(worst) {
            worst = step.result;
        }
    }
    worst
}

/// Classify raw harness tallies plus the process return code.
pub fn job_verdict(passed: u64, failed: u64, exceptions: u64, return_code: i32) -> Verdict {
    if exceptions > 0 {
        return Verdict::Exception;
    }
    if failed > 0 {
        return Verdict::TestFailed;
    }
    if passed > 0 {
        return Verdict::Success;
    }
    if return_code != 0 {
        return Verdict::Busted;
    }
    Verdict::Unknown
}

fn severity(verdict: Verdict) -> u8 {
    match verdict {
        Verdict::Busted => 4,
        Verdict::Exception => 3,
        Verdict::TestFailed => 2,
        Verdict::Unknown => 1,
        Verdict::Success | Verdict::Skipped => 0,
    }
}

// ──────────────────────────── tests ────────────────────────────
