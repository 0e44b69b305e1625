//! Guards for the states the pod occupies before a run.

use pod_common::fault::{CheckPhase, FaultCause, Subsystem};

use super::{GuardContext, Verdict};

/// Parked. Only the emergency brake leaves idle.
pub(super) fn idle(ctx: &mut GuardContext<'_>) -> Verdict {
    if ctx.emergency_brake() {
        return Verdict::Fault;
    }
    Verdict::Stay
}

/// Tube evacuation. Hard timeout, prerun envelope on all subsystems.
pub(super) fn pumpdown(ctx: &mut GuardContext<'_>) -> Verdict {
    if ctx.emergency_brake() {
        return Verdict::Fault;
    }

    ctx.check(Subsystem::Pressure, CheckPhase::PRERUN);
    ctx.check(Subsystem::Battery, CheckPhase::PRERUN);
    ctx.check(Subsystem::Rms, CheckPhase::PRERUN);

    let timed_out = ctx.elapsed_at_least(ctx.config.timing.pumpdown_timeout_us);
    if ctx.flag_cause(timed_out, FaultCause::PUMPDOWN_TIMEOUT) {
        return Verdict::Fault;
    }

    ctx.settle()
}

/// HV precharge while servicing. Brake pressure is not debounced here.
pub(super) fn servicing_precharge(ctx: &mut GuardContext<'_>) -> Verdict {
    if ctx.snapshot.health.passes(Subsystem::Pressure, CheckPhase::BRAKING) {
        ctx.counters.reset_one(Subsystem::Pressure);
    } else {
        ctx.causes |= FaultCause::PRESSURE_IMMEDIATE;
        return Verdict::Fault;
    }

    if ctx.imd_failed() || ctx.emergency_brake() || ctx.network_lost() {
        return Verdict::Fault;
    }

    ctx.check(Subsystem::Battery, CheckPhase::PRERUN);
    ctx.check(Subsystem::Rms, CheckPhase::PRERUN);

    ctx.settle()
}
