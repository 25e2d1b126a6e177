//! Session phase machine.
//!
//! ```text
//! ┌────────┐   join    ┌────────┐
//! │  Open  ├──────────►│ Bound  │◄─┐ join (re-bind)
//! └───┬────┘           └───┬────┘──┘
//!     │ close              │ close
//!     ▼                    ▼
//! ┌─────────────────────────────┐
//! │           Closed            │  terminal
//! └─────────────────────────────┘
//! ```
//!
//! The machine only decides whether a step is legal. Side effects of a step
//! (registry updates, dropping the outbound queue) belong to the caller.

use crate::error::RelayError;

/// Where a session is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Transport is up, no identity bound yet.
    Open,
    /// Bound to a user id.
    Bound,
    /// Transport gone. Terminal.
    Closed,
}

/// Inputs that move a session between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A `join` was accepted.
    Bind,
    /// The transport ended for any reason.
    Close,
}

impl Transition {
    fn action(self) -> &'static str {
        match self {
            Self::Bind => "bind",
            Self::Close => "close",
        }
    }
}

impl Phase {
    /// The phase reached by applying `transition`, or an error if the step is
    /// not allowed from here.
    pub fn next(self, transition: Transition) -> Result<Phase, RelayError> {
        match (self, transition) {
            (Self::Open | Self::Bound, Transition::Bind) => Ok(Self::Bound),
            (Self::Open | Self::Bound, Transition::Close) => Ok(Self::Closed),
            (Self::Closed, t) => Err(RelayError::InvalidTransition {
                from: self,
                action: t.action(),
            }),
        }
    }

    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_binds_and_closes() {
        assert_eq!(Phase::Open.next(Transition::Bind).unwrap(), Phase::Bound);
        assert_eq!(Phase::Open.next(Transition::Close).unwrap(), Phase::Closed);
    }

    #[test]
    fn bound_rebinds() {
        assert_eq!(Phase::Bound.next(Transition::Bind).unwrap(), Phase::Bound);
        assert_eq!(Phase::Bound.next(Transition::Close).unwrap(), Phase::Closed);
    }

    #[test]
    fn closed_is_terminal() {
        for t in [Transition::Bind, Transition::Close] {
            let err = Phase::Closed.next(t).unwrap_err();
            assert_eq!(err.error_code(), "invalid_transition");
        }
        assert!(Phase::Closed.is_closed());
    }
}
