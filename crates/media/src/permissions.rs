use serde::{Deserialize, Serialize};

/// Record of the capture capabilities granted to the current session.
///
/// The three flags move together: a successful acquisition grants all of
/// them and ending the session clears all of them. A partial grant is never
/// recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionState {
    pub camera: bool,
    pub microphone: bool,
    pub speaker: bool,
}

impl PermissionState {
    pub fn granted() -> Self {
        Self {
            camera: true,
            microphone: true,
            speaker: true,
        }
    }

    pub fn denied() -> Self {
        Self::default()
    }

    pub fn is_granted(&self) -> bool {
        self.camera && self.microphone && self.speaker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_granted() {
        let state = PermissionState::default();
        assert!(!state.is_granted());
        assert_eq!(state, PermissionState::denied());
    }

    #[test]
    fn test_granted_sets_all_flags() {
        let state = PermissionState::granted();
        assert!(state.camera && state.microphone && state.speaker);
        assert!(state.is_granted());
    }

    #[test]
    fn test_partial_record_is_not_granted() {
        let state = PermissionState {
            camera: true,
            ..Default::default()
        };
        assert!(!state.is_granted());
    }
}
