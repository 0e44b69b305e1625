//! Guard shared by both fault states.

use pod_common::state::StateId;

use super::{GuardContext, Verdict};

/// Latch the fault: acknowledge the emergency brake and advance the staged
/// shutdown. Never leaves on its own; only an override does.
pub(super) fn contain(state: StateId, ctx: &mut GuardContext<'_>) -> Verdict {
    if ctx.snapshot.flags.emergency_brake {
        ctx.telemetry.clear_emergency_brake();
    }
    ctx.shutdown.tick(state, ctx.now_us, &mut *ctx.hardware);
    Verdict::Stay
}
