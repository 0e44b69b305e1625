//! Guards after the run: post-run and safe-to-approach.

use tracing::warn;

use pod_common::fault::{CheckPhase, FaultCause, Subsystem};

use super::{GuardContext, Verdict};

/// Run finished, drive winding down. Pressure is no longer checked, so a
/// pressure count carried in from an earlier state does not count here.
pub(super) fn post_run(ctx: &mut GuardContext<'_>) -> Verdict {
    if ctx.emergency_brake() || ctx.network_lost() {
        return Verdict::Fault;
    }

    ctx.check(Subsystem::Battery, CheckPhase::POSTRUN);
    ctx.check(Subsystem::Rms, CheckPhase::POSTRUN);

    if ctx.debounce_tripped_among(&[Subsystem::Battery, Subsystem::Rms]) {
        Verdict::Fault
    } else {
        Verdict::Stay
    }
}

/// Crew may approach. Every pressure channel must sit inside its band.
pub(super) fn safe_to_approach(ctx: &mut GuardContext<'_>) -> Verdict {
    if let Some((channel, value)) = ctx.config.envelope.first_violation(&ctx.snapshot.pressure) {
        warn!(channel, value, "Pressure outside safe-to-approach envelope");
        ctx.causes |= FaultCause::ENVELOPE;
        return Verdict::Fault;
    }

    if ctx.network_lost() || ctx.emergency_brake() {
        return Verdict::Fault;
    }

    Verdict::Stay
}
