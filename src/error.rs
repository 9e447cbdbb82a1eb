//! Fault taxonomy of the acquisition pipeline.
//!
//! None of these stop the polling loop: the controller substitutes a safe
//! default, bumps the matching counter and carries on.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Device {
    Imu,
    TouchPanel,
    RecordMemory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Bus transaction failed.
    Transport(Device),
    /// Fewer than two wheel edges latched; speed reads 0.
    NoSignal,
    /// A zero denominator was short-circuited.
    DivideGuard,
    /// Raw touch reading out of the panel range; clamped.
    StaleTouch,
}

/// Running fault counters, saturating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    pub imu_errors: u32,
    pub touch_errors: u32,
    pub memory_errors: u32,
    pub no_signal: u32,
    pub divide_guards: u32,
    pub stale_touches: u32,
}

impl Diagnostics {
    pub fn record(&mut self, fault: Fault) {
        let counter = match fault {
            Fault::Transport(Device::Imu) => &mut self.imu_errors,
            Fault::Transport(Device::TouchPanel) => &mut self.touch_errors,
            Fault::Transport(Device::RecordMemory) => &mut self.memory_errors,
            Fault::NoSignal => &mut self.no_signal,
            Fault::DivideGuard => &mut self.divide_guards,
            Fault::StaleTouch => &mut self.stale_touches,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn transport_errors(&self) -> u32 {
        self.imu_errors
            .saturating_add(self.touch_errors)
            .saturating_add(self.memory_errors)
    }
}
