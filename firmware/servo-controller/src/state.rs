use std::sync::{Mutex, PoisonError};

use log::{info, warn};
use servo_protocol::ServoPosition;

use crate::receiver::{ByteSource, EchoSink, FrameReceiver};
use crate::servo::{DutyOutput, PwmState, ServoPair};

/// Last committed PWM state, readable from any context.
///
/// Only the receive task publishes; everything else takes copies.
pub struct SharedPwmState {
    inner: Mutex<Option<PwmState>>,
}

impl SharedPwmState {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Copy of the committed state. `None` before the first commit.
    pub fn snapshot(&self) -> Option<PwmState> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: PwmState) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(state);
    }
}

impl Default for SharedPwmState {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive-path pipeline: frame buffering, decoding, clamping and the
/// single PWM commit per frame.
pub struct ServoController<'a, D> {
    receiver: FrameReceiver,
    servos: ServoPair<D>,
    shared: &'a SharedPwmState,
}

impl<'a, D: DutyOutput> ServoController<'a, D> {
    pub fn new(servos: ServoPair<D>, shared: &'a SharedPwmState) -> Self {
        Self {
            receiver: FrameReceiver::new(),
            servos,
            shared,
        }
    }

    /// Drive both servos to their start position.
    pub fn start(&mut self, initial: ServoPosition) -> Result<PwmState, D::Error> {
        let state = self.commit(initial)?;
        info!(
            "Servos at start position: upper={} lower={} (period {} ticks)",
            initial.upper(),
            initial.lower(),
            self.servos.timing().period_ticks()
        );
        Ok(state)
    }

    /// Handle one receive burst.
    ///
    /// Returns the new state when the burst held a valid frame. A bad frame
    /// is dropped and the outputs keep their previous values; only a failed
    /// hardware write is an error.
    pub fn on_receive<S, E>(&mut self, source: &mut S, echo: &mut E) -> Result<Option<PwmState>, D::Error>
    where
        S: ByteSource,
        E: EchoSink,
    {
        let command = match self.receiver.receive(source, echo) {
            Ok(command) => command,
            Err(e) => {
                warn!("Frame discarded: {}", e);
                return Ok(None);
            }
        };

        let position = command.clamped();
        let state = self.commit(position)?;
        info!(
            "Frame {}/{} -> upper={} lower={} (duty {}/{})",
            command.upper,
            command.lower,
            position.upper(),
            position.lower(),
            state.upper_duty,
            state.lower_duty
        );
        Ok(Some(state))
    }

    pub fn servos(&self) -> &ServoPair<D> {
        &self.servos
    }

    fn commit(&mut self, position: ServoPosition) -> Result<PwmState, D::Error> {
        let state = self.servos.commit(position)?;
        self.shared.publish(state);
        Ok(state)
    }
}
