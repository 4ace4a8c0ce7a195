//! Frame loop state machine: `Idle -> Running -> Stopped`, with no way back.
//!
//! The loop owns the animation clock. Hosts schedule ticks however they
//! like (requestAnimationFrame, a test harness) and ask the loop whether to
//! go on; a stopped loop refuses every tick, including one that was already
//! queued when it stopped.

use crate::animate::FrameTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// What the scheduler should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Request another display refresh.
    Reschedule,
    /// The loop is not running; schedule nothing.
    Halt,
}

#[derive(Debug, Clone)]
pub struct FrameLoop {
    state: LoopState,
    last_ms: Option<f64>,
    elapsed: f64,
    ticks: u64,
    max_delta: f32,
}

impl FrameLoop {
    pub fn new(max_delta: f32) -> Self {
        Self {
            state: LoopState::Idle,
            last_ms: None,
            elapsed: 0.0,
            ticks: 0,
            max_delta,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// `Idle -> Running`. Returns `false` from any other state.
    pub fn start(&mut self) -> bool {
        if self.state != LoopState::Idle {
            return false;
        }
        self.state = LoopState::Running;
        true
    }

    /// Moves to `Stopped` from any state. Idempotent.
    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
    }

    /// Advances the clock to `now_ms`. Returns `None` unless running.
    ///
    /// The first tick has a zero delta. Deltas are clamped to the configured
    /// maximum and never go negative, even if the timestamp source jumps.
    pub fn advance(&mut self, now_ms: f64) -> Option<FrameTime> {
        if self.state != LoopState::Running {
            return None;
        }
        let raw = match self.last_ms {
            Some(last) if now_ms.is_finite() => ((now_ms - last) / 1000.0).max(0.0) as f32,
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_ms = Some(now_ms);
        }
        let delta = if raw > self.max_delta {
            log::debug!(
                "Frame delta {:.1}ms exceeds maximum, clamping to {:.1}ms",
                raw * 1000.0,
                self.max_delta * 1000.0
            );
            self.max_delta
        } else {
            raw
        };
        self.elapsed += delta as f64;
        self.ticks += 1;
        Some(FrameTime {
            delta,
            elapsed: self.elapsed as f32,
        })
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Seconds of animation time accumulated so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_one_way() {
        let mut frame_loop = FrameLoop::new(0.25);
        assert_eq!(frame_loop.state(), LoopState::Idle);
        assert!(frame_loop.advance(0.0).is_none());
        assert!(frame_loop.start());
        assert!(!frame_loop.start());
        assert!(frame_loop.is_running());
        frame_loop.stop();
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert!(!frame_loop.start());
        assert!(frame_loop.advance(16.0).is_none());
    }

    #[test]
    fn deltas_follow_timestamps() {
        let mut frame_loop = FrameLoop::new(0.25);
        frame_loop.start();
        assert_eq!(frame_loop.advance(1000.0).unwrap().delta, 0.0);
        let t = frame_loop.advance(1016.0).unwrap();
        assert!((t.delta - 0.016).abs() < 1e-6);
        let t = frame_loop.advance(1032.0).unwrap();
        assert!((t.elapsed - 0.032).abs() < 1e-6);
        assert_eq!(frame_loop.ticks(), 3);
    }

    #[test]
    fn long_gaps_are_clamped_and_backwards_time_is_zero() {
        let mut frame_loop = FrameLoop::new(0.25);
        frame_loop.start();
        frame_loop.advance(0.0);
        assert_eq!(frame_loop.advance(5000.0).unwrap().delta, 0.25);
        assert_eq!(frame_loop.advance(4000.0).unwrap().delta, 0.0);
        assert_eq!(frame_loop.advance(f64::NAN).unwrap().delta, 0.0);
    }
}
