// src/errors.rs
//
// Hard failures only. "Not ready yet" conditions (short history, low
// confidence, unresolved actual pocket) are plain `false` / `None` values
// consumed by the lifecycle gating and never show up here.

use thiserror::Error;

/// Pocket label lookups against the physical ring.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    #[error("pocket label {0} is not on the wheel")]
    NotFound(u8),
}

/// Precondition violations on the per-frame input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("malformed observation: {field} = {value}")]
    MalformedObservation { field: &'static str, value: f64 },
}

/// Failures talking to a tracker session task.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("tracker session is closed")]
    Closed,
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RingError::NotFound(38).to_string(),
            "pocket label 38 is not on the wheel"
        );

        let malformed = TrackerError::MalformedObservation {
            field: "frame_dt",
            value: -0.5,
        };
        assert_eq!(malformed.to_string(), "malformed observation: frame_dt = -0.5");

        // session errors surface the tracker's message unchanged
        let session: SessionError = malformed.into();
        assert_eq!(session.to_string(), "malformed observation: frame_dt = -0.5");
        assert_eq!(SessionError::Closed.to_string(), "tracker session is closed");
    }
}
