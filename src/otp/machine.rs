//! The verification flow as a pure state machine.
//!
//! States follow the sequence
//! `Idle → CodeRequested → AwaitingInput → Submitting → {Verified | Failed}`,
//! with `Failed` dropping back to `AwaitingInput` on the next buffer edit
//! and `Verified` terminal. Every transition is a total function of
//! `(state, event)`; no IO, no clock, no randomness. Time enters only as
//! explicit [`OtpEvent::Tick`] events, one per elapsed second.
//!
//! Two policies are encoded here rather than in callers:
//!
//! - a submit with an incomplete buffer is rejected locally (the state does
//!   not change, so nothing is ever sent), and
//! - verification responses only land in `Submitting`; a response arriving
//!   after the flow moved on (teardown, navigation) is ignored.

use super::{CODE_LEN, RESEND_COOLDOWN_SECS};

/// Fixed-width digit buffer for the code entry slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    slots: [Option<u8>; CODE_LEN],
}

impl CodeBuffer {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fill the first empty slot. Digits above 9 are ignored, as is input
    /// once every slot is filled.
    pub fn push(&mut self, digit: u8) {
        if digit > 9 {
            return;
        }
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(digit);
        }
    }

    /// Clear the most recently filled slot.
    pub fn pop(&mut self) {
        if let Some(slot) = self.slots.iter_mut().rev().find(|slot| slot.is_some()) {
            *slot = None;
        }
    }

    pub fn clear(&mut self) {
        self.slots = [None; CODE_LEN];
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// The entered code, available only once every slot is filled.
    pub fn code(&self) -> Option<String> {
        if !self.is_complete() {
            return None;
        }
        Some(
            self.slots
                .iter()
                .flatten()
                .map(|digit| char::from(b'0' + digit))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpFlow {
    /// No verification in progress.
    Idle,
    /// A send request is in flight.
    CodeRequested,
    /// Code delivered; waiting for the customer to type it.
    AwaitingInput { buffer: CodeBuffer, resend_in: u32 },
    /// A fully-entered code is being verified.
    Submitting { code: String, resend_in: u32 },
    /// Terminal. `continuation` is present when the server authorized a
    /// follow-up credential reset; absent means "proceed to sign-in".
    Verified { continuation: Option<String> },
    /// Rejected code; the next digit press re-enters `AwaitingInput`.
    Failed { resend_in: u32, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpEvent {
    /// Customer asked for a (re)send.
    RequestCode,
    /// The verification service accepted the send.
    SendAccepted,
    /// The verification service refused the send.
    SendRejected { message: String },
    /// A digit was typed into the entry slots.
    Digit(u8),
    /// The last filled slot was erased.
    Backspace,
    /// Customer pressed submit.
    Submit,
    /// One second elapsed on the resend cooldown.
    Tick,
    /// Verification response: accepted.
    VerifyPassed { continuation: Option<String> },
    /// Verification response: rejected.
    VerifyRejected { message: String },
}

impl OtpFlow {
    pub fn new() -> Self {
        OtpFlow::Idle
    }

    /// Rebuild the waiting state from persisted session data, e.g. after a
    /// page reload or on the server side of the flow.
    pub fn awaiting(resend_in: u32) -> Self {
        OtpFlow::AwaitingInput {
            buffer: CodeBuffer::empty(),
            resend_in,
        }
    }

    /// Whether a (re)send request would be honored right now.
    pub fn resend_available(&self) -> bool {
        match self {
            OtpFlow::Idle => true,
            OtpFlow::AwaitingInput { resend_in, .. } | OtpFlow::Failed { resend_in, .. } => {
                *resend_in == 0
            }
            OtpFlow::CodeRequested | OtpFlow::Submitting { .. } | OtpFlow::Verified { .. } => false,
        }
    }

    /// Seconds left on the resend cooldown, where the state carries one.
    pub fn resend_in(&self) -> Option<u32> {
        match self {
            OtpFlow::AwaitingInput { resend_in, .. }
            | OtpFlow::Submitting { resend_in, .. }
            | OtpFlow::Failed { resend_in, .. } => Some(*resend_in),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OtpFlow::Idle => "idle",
            OtpFlow::CodeRequested => "code_requested",
            OtpFlow::AwaitingInput { .. } => "awaiting_input",
            OtpFlow::Submitting { .. } => "submitting",
            OtpFlow::Verified { .. } => "verified",
            OtpFlow::Failed { .. } => "failed",
        }
    }

    /// The transition function. Unhandled `(state, event)` pairs leave the
    /// state unchanged, which is what makes late verification responses and
    /// cooldown-gated resends safe by construction.
    pub fn apply(self, event: OtpEvent) -> Self {
        match (self, event) {
            // Requesting a code is honored from Idle, or from a waiting or
            // failed state once the cooldown has run out.
            (OtpFlow::Idle, OtpEvent::RequestCode) => OtpFlow::CodeRequested,
            (OtpFlow::AwaitingInput { resend_in: 0, .. }, OtpEvent::RequestCode) => {
                OtpFlow::CodeRequested
            }
            (OtpFlow::Failed { resend_in: 0, .. }, OtpEvent::RequestCode) => OtpFlow::CodeRequested,

            (OtpFlow::CodeRequested, OtpEvent::SendAccepted) => OtpFlow::AwaitingInput {
                buffer: CodeBuffer::empty(),
                resend_in: RESEND_COOLDOWN_SECS,
            },
            // Send failure surfaces the message out-of-band and returns to
            // Idle so the customer can retry.
            (OtpFlow::CodeRequested, OtpEvent::SendRejected { .. }) => OtpFlow::Idle,

            (OtpFlow::AwaitingInput { mut buffer, resend_in }, OtpEvent::Digit(digit)) => {
                buffer.push(digit);
                OtpFlow::AwaitingInput { buffer, resend_in }
            }
            (OtpFlow::AwaitingInput { mut buffer, resend_in }, OtpEvent::Backspace) => {
                buffer.pop();
                OtpFlow::AwaitingInput { buffer, resend_in }
            }
            // A failed attempt drops back to input on the next edit, with a
            // fresh buffer.
            (OtpFlow::Failed { resend_in, .. }, OtpEvent::Digit(digit)) => {
                let mut buffer = CodeBuffer::empty();
                buffer.push(digit);
                OtpFlow::AwaitingInput { buffer, resend_in }
            }

            // Submit only leaves AwaitingInput when every slot is filled;
            // otherwise the attempt is rejected locally.
            (OtpFlow::AwaitingInput { buffer, resend_in }, OtpEvent::Submit) => {
                match buffer.code() {
                    Some(code) => OtpFlow::Submitting { code, resend_in },
                    None => OtpFlow::AwaitingInput { buffer, resend_in },
                }
            }

            (OtpFlow::Submitting { .. }, OtpEvent::VerifyPassed { continuation }) => {
                OtpFlow::Verified { continuation }
            }
            (OtpFlow::Submitting { resend_in, .. }, OtpEvent::VerifyRejected { message }) => {
                OtpFlow::Failed { resend_in, message }
            }

            // The cooldown ticks wherever it exists, independent of
            // submission attempts.
            (OtpFlow::AwaitingInput { buffer, resend_in }, OtpEvent::Tick) => {
                OtpFlow::AwaitingInput {
                    buffer,
                    resend_in: resend_in.saturating_sub(1),
                }
            }
            (OtpFlow::Submitting { code, resend_in }, OtpEvent::Tick) => OtpFlow::Submitting {
                code,
                resend_in: resend_in.saturating_sub(1),
            },
            (OtpFlow::Failed { resend_in, message }, OtpEvent::Tick) => OtpFlow::Failed {
                resend_in: resend_in.saturating_sub(1),
                message,
            },

            // Everything else — late verify responses outside Submitting,
            // resends under cooldown, input in terminal states — is ignored.
            (state, _) => state,
        }
    }
}

impl Default for OtpFlow {
    fn default() -> Self {
        Self::new()
    }
}
