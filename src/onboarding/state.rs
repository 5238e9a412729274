//! Onboarding status state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle of an onboarding record.
///
/// Progresses linearly: Pending → Connected → Completed. Nothing in the
/// service currently drives a record to `Completed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    /// Record created, no Facebook identity linked yet.
    #[default]
    Pending,
    /// Facebook identity attached via the OAuth callback.
    Connected,
    /// Reserved for a follow-up confirmation step.
    Completed,
}

impl OnboardingStatus {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStatus) -> bool {
        use OnboardingStatus::*;
        matches!((self, target), (Pending, Connected) | (Connected, Completed))
    }

    /// Whether a patch carrying `target` may be applied to a record in `self`.
    ///
    /// Re-applying the current status is allowed so a second OAuth callback
    /// can refresh the linked identity.
    pub fn accepts(&self, target: OnboardingStatus) -> bool {
        *self == target || self.can_transition_to(target)
    }
}

impl std::fmt::Display for OnboardingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Connected => "connected",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_only() {
        use OnboardingStatus::*;
        assert!(Pending.can_transition_to(Connected));
        assert!(Connected.can_transition_to(Completed));

        // Skip
        assert!(!Pending.can_transition_to(Completed));
        // Backward
        assert!(!Connected.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Connected));
        // Self
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn accepts_same_status_for_relinking() {
        use OnboardingStatus::*;
        assert!(Connected.accepts(Connected));
        assert!(Pending.accepts(Connected));
        assert!(!Connected.accepts(Pending));
    }

    #[test]
    fn display_matches_serde() {
        use OnboardingStatus::*;
        for status in [Pending, Connected, Completed] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(format!("\"{status}\""), json);
        }
    }
}
