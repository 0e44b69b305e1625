//! Guards for the run: propulsion, braking, stopped and crawl.

use pod_common::fault::{CheckPhase, Subsystem};
use pod_common::state::StateId;

use super::{GuardContext, Verdict};

/// Accelerating down the tube.
pub(super) fn propulsion(ctx: &mut GuardContext<'_>) -> Verdict {
    if ctx.emergency_brake() || ctx.network_lost() {
        return Verdict::Fault;
    }

    ctx.check(Subsystem::Pressure, CheckPhase::PRERUN);
    ctx.check(Subsystem::Battery, CheckPhase::RUN);
    ctx.check(Subsystem::Rms, CheckPhase::RUN);

    if ctx.elapsed_at_least(ctx.config.timing.propulsion_timeout_us) {
        return Verdict::Next;
    }

    let motion = &ctx.snapshot.motion;
    if motion.retro_count >= ctx.config.policy.braking_retro_threshold
        && ctx.snapshot.flags.ready_to_brake
    {
        return Verdict::To(StateId::Braking);
    }

    if ctx.snapshot.flags.should_stop {
        return Verdict::Next;
    }

    ctx.settle()
}

/// Decelerating. Pressure and RMS checks wait for the actuators to settle.
pub(super) fn braking(ctx: &mut GuardContext<'_>) -> Verdict {
    if ctx.emergency_brake() || ctx.imd_failed() || ctx.network_lost() {
        return Verdict::Fault;
    }

    let timing = ctx.config.timing;
    if ctx.elapsed_at_least(timing.braking_pressure_delay_us) {
        ctx.check(Subsystem::Pressure, CheckPhase::BRAKING);
    }
    ctx.check(Subsystem::Battery, CheckPhase::BRAKING);
    if ctx.elapsed_at_least(timing.braking_rms_delay_us) {
        ctx.check(Subsystem::Rms, CheckPhase::BRAKING);
    }

    if ctx.elapsed_at_least(timing.braking_complete_us) {
        return Verdict::To(StateId::Stopped);
    }

    ctx.settle()
}

/// At rest after braking. Fault-only.
pub(super) fn stopped(ctx: &mut GuardContext<'_>) -> Verdict {
    if ctx.emergency_brake() || ctx.network_lost() {
        return Verdict::Fault;
    }

    ctx.check(Subsystem::Pressure, CheckPhase::BRAKING);
    ctx.check(Subsystem::Battery, CheckPhase::BRAKING);
    ctx.check(Subsystem::Rms, CheckPhase::STOPPED);

    ctx.settle()
}

/// Low-speed approach to the next retro marker.
pub(super) fn crawl(ctx: &mut GuardContext<'_>) -> Verdict {
    if ctx.imd_failed() || ctx.network_lost() || ctx.emergency_brake() {
        return Verdict::Fault;
    }

    // Widened: both operands come from telemetry and may sit at the i32 limits.
    let advanced =
        i64::from(ctx.snapshot.motion.retro_count) - i64::from(ctx.crawl_retro_reference);
    if advanced >= i64::from(ctx.config.policy.crawl_retro_advance) {
        return Verdict::To(StateId::PostRun);
    }

    ctx.check(Subsystem::Pressure, CheckPhase::CRAWL);
    ctx.check(Subsystem::Battery, CheckPhase::CRAWL);
    ctx.check(Subsystem::Rms, CheckPhase::CRAWL);

    if ctx.elapsed_at_least(ctx.config.timing.crawl_timeout_us) || ctx.snapshot.flags.should_stop
    {
        return Verdict::Next;
    }

    ctx.settle()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use pod_common::consts::{
        BRAKING_COMPLETE_US, BRAKING_PRESSURE_DELAY_US, BRAKING_RMS_DELAY_US, CRAWL_TIMEOUT_US,
        PROPULSION_TIMEOUT_US,
    };
    use pod_common::fault::FaultCause;

    #[test]
    fn propulsion_waits_for_ready_to_brake() {
        let mut f = Fixture::new();
        f.snapshot.motion.retro_count = 3;
        assert_eq!(f.run(StateId::Propulsion, 1_000).0, Verdict::Stay);
        f.snapshot.flags.ready_to_brake = true;
        assert_eq!(
            f.run(StateId::Propulsion, 1_000).0,
            Verdict::To(StateId::Braking)
        );
    }

    #[test]
    fn propulsion_needs_retro_threshold() {
        let mut f = Fixture::new();
        f.snapshot.flags.ready_to_brake = true;
        f.snapshot.motion.retro_count = 2;
        assert_eq!(f.run(StateId::Propulsion, 1_000).0, Verdict::Stay);
    }

    #[test]
    fn propulsion_timeout_is_nominal() {
        let mut f = Fixture::new();
        assert_eq!(
            f.run(StateId::Propulsion, PROPULSION_TIMEOUT_US),
            (Verdict::Next, FaultCause::empty())
        );
    }

    #[test]
    fn propulsion_should_stop_takes_next_edge() {
        let mut f = Fixture::new();
        f.snapshot.flags.should_stop = true;
        assert_eq!(f.run(StateId::Propulsion, 0).0, Verdict::Next);
    }

    #[test]
    fn propulsion_uses_run_envelope_for_battery() {
        let mut f = Fixture::new();
        f.fail(Subsystem::Battery, CheckPhase::PRERUN);
        f.run(StateId::Propulsion, 0);
        assert_eq!(f.counters.get(Subsystem::Battery), 0);
        f.fail(Subsystem::Battery, CheckPhase::RUN);
        f.run(StateId::Propulsion, 0);
        assert_eq!(f.counters.get(Subsystem::Battery), 1);
    }

    #[test]
    fn braking_defers_pressure_and_rms_checks() {
        let mut f = Fixture::new();
        f.fail(Subsystem::Pressure, CheckPhase::BRAKING);
        f.fail(Subsystem::Rms, CheckPhase::BRAKING);

        for _ in 0..20 {
            assert_eq!(
                f.run(StateId::Braking, BRAKING_PRESSURE_DELAY_US - 1).0,
                Verdict::Stay
            );
        }
        assert_eq!(f.counters.get(Subsystem::Pressure), 0);
        assert_eq!(f.counters.get(Subsystem::Rms), 0);

        f.run(StateId::Braking, BRAKING_PRESSURE_DELAY_US);
        assert_eq!(f.counters.get(Subsystem::Pressure), 1);
        assert_eq!(f.counters.get(Subsystem::Rms), 0);

        f.run(StateId::Braking, BRAKING_RMS_DELAY_US);
        assert_eq!(f.counters.get(Subsystem::Pressure), 2);
        assert_eq!(f.counters.get(Subsystem::Rms), 1);
    }

    #[test]
    fn braking_checks_battery_immediately() {
        let mut f = Fixture::new();
        f.fail(Subsystem::Battery, CheckPhase::BRAKING);
        for _ in 0..9 {
            assert_eq!(f.run(StateId::Braking, 0).0, Verdict::Stay);
        }
        assert_eq!(f.run(StateId::Braking, 0), (Verdict::Fault, FaultCause::BATTERY));
    }

    #[test]
    fn braking_completes_at_threshold() {
        let mut f = Fixture::new();
        assert_eq!(f.run(StateId::Braking, BRAKING_COMPLETE_US - 1).0, Verdict::Stay);
        assert_eq!(
            f.run(StateId::Braking, BRAKING_COMPLETE_US).0,
            Verdict::To(StateId::Stopped)
        );
    }

    #[test]
    fn braking_imd_fault() {
        let mut f = Fixture::new();
        f.hardware.set_imd_ok(false);
        assert_eq!(f.run(StateId::Braking, 0), (Verdict::Fault, FaultCause::IMD));
    }

    #[test]
    fn stopped_has_no_nominal_exit() {
        let mut f = Fixture::new();
        f.snapshot.flags.should_stop = true;
        f.snapshot.motion.retro_count = 100;
        assert_eq!(f.run(StateId::Stopped, u64::MAX).0, Verdict::Stay);
    }

    #[test]
    fn stopped_uses_stopped_envelope_for_rms() {
        let mut f = Fixture::new();
        f.fail(Subsystem::Rms, CheckPhase::STOPPED);
        for _ in 0..9 {
            f.run(StateId::Stopped, 0);
        }
        assert_eq!(f.run(StateId::Stopped, 0), (Verdict::Fault, FaultCause::RMS));
    }

    #[test]
    fn crawl_exits_after_retro_advance() {
        let mut f = Fixture::new();
        f.crawl_retro_reference = 5;
        f.snapshot.motion.retro_count = 6;
        assert_eq!(f.run(StateId::Crawl, 0).0, Verdict::Stay);
        f.snapshot.motion.retro_count = 7;
        assert_eq!(f.run(StateId::Crawl, 0).0, Verdict::To(StateId::PostRun));
    }

    #[test]
    fn crawl_handles_extreme_retro_counts() {
        let mut f = Fixture::new();
        f.crawl_retro_reference = 5;
        f.snapshot.motion.retro_count = i32::MIN;
        assert_eq!(f.run(StateId::Crawl, 0).0, Verdict::Stay);

        f.crawl_retro_reference = i32::MIN;
        f.snapshot.motion.retro_count = i32::MAX;
        assert_eq!(f.run(StateId::Crawl, 0).0, Verdict::To(StateId::PostRun));
    }

    #[test]
    fn crawl_timeout_and_should_stop() {
        let mut f = Fixture::new();
        assert_eq!(f.run(StateId::Crawl, CRAWL_TIMEOUT_US - 1).0, Verdict::Stay);
        assert_eq!(f.run(StateId::Crawl, CRAWL_TIMEOUT_US).0, Verdict::Next);
        f.snapshot.flags.should_stop = true;
        assert_eq!(f.run(StateId::Crawl, 0).0, Verdict::Next);
    }

    #[test]
    fn crawl_immediate_checks_precede_progression() {
        let mut f = Fixture::new();
        f.snapshot.motion.retro_count = 10;
        f.snapshot.flags.emergency_brake = true;
        assert_eq!(
            f.run(StateId::Crawl, 0),
            (Verdict::Fault, FaultCause::EMERGENCY_BRAKE)
        );
    }
}
