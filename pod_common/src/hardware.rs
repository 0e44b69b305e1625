//! Hardware capability interface.
//!
//! The control unit never touches GPIO, the HV interlock I/O expander or the
//! motor-controller CAN link directly. It calls through [`PodHardware`], a
//! thin boolean-valued capability trait: `true` means the command was
//! accepted (or the status is healthy), `false` means it was not.
//!
//! # Timing Contracts
//!
//! Every method is called from inside the control tick and must return
//! without waiting for the actuator to settle. Settling delays between
//! commands are scheduled by the caller across ticks.

/// Network transport monitored for link health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Telemetry stream to the dashboard.
    Udp,
    /// Command channel from the dashboard.
    Tcp,
}

impl Transport {
    pub const ALL: [Transport; 2] = [Self::Udp, Self::Tcp];
}

/// Discrete I/O and motor-controller commands used by the control unit.
pub trait PodHardware: Send {
    /// Drop the motor-enable latch.
    fn clear_motor_enable(&mut self) -> bool;

    /// Command zero torque on the inverter.
    fn command_no_torque(&mut self) -> bool;

    /// Command the inverter to discharge its DC link.
    fn command_discharge(&mut self) -> bool;

    /// Disable the inverter.
    fn disable_inverter(&mut self) -> bool;

    /// Drive the MCU HV-enable output.
    fn set_hv_enable(&mut self, enabled: bool) -> bool;

    /// Insulation monitoring device status (`true` = no isolation fault).
    fn imd_ok(&self) -> bool;

    /// Whether `transport` currently has a healthy link.
    fn link_ok(&self, transport: Transport) -> bool;

    /// Both transports healthy.
    fn links_ok(&self) -> bool {
        Transport::ALL.iter().all(|t| self.link_ok(*t))
    }
}

impl<T: PodHardware + ?Sized> PodHardware for Box<T> {
    fn clear_motor_enable(&mut self) -> bool {
        (**self).clear_motor_enable()
    }

    fn command_no_torque(&mut self) -> bool {
        (**self).command_no_torque()
    }

    fn command_discharge(&mut self) -> bool {
        (**self).command_discharge()
    }

    fn disable_inverter(&mut self) -> bool {
        (**self).disable_inverter()
    }

    fn set_hv_enable(&mut self, enabled: bool) -> bool {
        (**self).set_hv_enable(enabled)
    }

    fn imd_ok(&self) -> bool {
        (**self).imd_ok()
    }

    fn link_ok(&self, transport: Transport) -> bool {
        (**self).link_ok(transport)
    }
}
