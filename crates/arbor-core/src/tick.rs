/// Per-frame context handed down through a tree tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
    /// Simulation clock, in seconds. Team blackboard writes are stamped with it.
    pub time_seconds: f64,
}

impl TickContext {
    /// Context for frame `tick` of a fixed-step simulation.
    pub fn new(tick: u64, dt_seconds: f32) -> Self {
        Self {
            tick,
            dt_seconds,
            time_seconds: tick as f64 * dt_seconds as f64,
        }
    }

    pub fn next(self) -> Self {
        Self {
            tick: self.tick.wrapping_add(1),
            dt_seconds: self.dt_seconds,
            time_seconds: self.time_seconds + self.dt_seconds as f64,
        }
    }
}
