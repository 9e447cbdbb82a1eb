//! Interrupt dispatch table.
//!
//! Each hardware source maps to one slot; handlers are registered once during
//! start-up and the vector glue calls [`IrqTable::dispatch`] with whatever
//! value the source latched (a capture count, a tick, or 0).

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqSource {
    /// Wheel sensor edge captured; payload is the timer count.
    WheelEdge,
    /// Capture timer wrapped.
    CaptureOverflow,
    /// Touch PENIRQ falling edge; payload is the current TimeBase tick.
    TouchEdge,
    /// Touch debounce window elapsed; payload is the current TimeBase tick.
    DebounceExpired,
}

impl IrqSource {
    pub const COUNT: usize = 4;

    pub const ALL: [IrqSource; Self::COUNT] = [
        IrqSource::WheelEdge,
        IrqSource::CaptureOverflow,
        IrqSource::TouchEdge,
        IrqSource::DebounceExpired,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

pub type Handler = &'static (dyn Fn(u32) + Sync);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlreadyRegistered(pub IrqSource);

pub struct IrqTable {
    handlers: [Option<Handler>; IrqSource::COUNT],
}

impl Default for IrqTable {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqTable {
    pub const fn new() -> Self {
        Self {
            handlers: [None; IrqSource::COUNT],
        }
    }

    pub fn register(&mut self, source: IrqSource, handler: Handler) -> Result<(), AlreadyRegistered> {
        let slot = &mut self.handlers[source.index()];
        if slot.is_some() {
            return Err(AlreadyRegistered(source));
        }
        *slot = Some(handler);
        Ok(())
    }

    pub fn is_registered(&self, source: IrqSource) -> bool {
        self.handlers[source.index()].is_some()
    }

    /// Run the handler for `source`. Returns `false` when none is registered.
    pub fn dispatch(&self, source: IrqSource, payload: u32) -> bool {
        match self.handlers[source.index()] {
            Some(handler) => {
                handler(payload);
                true
            }
            None => {
                trace!("irq: unhandled source {}", source.index());
                false
            }
        }
    }
}
