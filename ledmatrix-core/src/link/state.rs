//! Connection phases
//!
//! The supervisor walks this table in a single loop instead of letting a
//! failed step call back into an earlier one, so a long outage never grows
//! the stack.

/// Where the link currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No access point association
    NeedWifi,
    /// Associated, no TCP connection
    NeedTcp,
    /// TCP open, greeting not yet accepted
    NeedGreeting,
    /// Streaming frames
    Ready,
}

/// Result of one connection step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Associated,
    Opened,
    Greeted,
    GreetingFailed,
    /// The access point dropped during a later step
    WifiLost,
    /// The server closed the connection
    LinkClosed,
}

impl Phase {
    /// Next phase after `outcome`
    ///
    /// Outcomes that do not apply to the current phase leave it unchanged.
    pub fn transition(self, outcome: Outcome) -> Self {
        match (self, outcome) {
            (_, Outcome::WifiLost) => Phase::NeedWifi,
            (Phase::NeedWifi, Outcome::Associated) => Phase::NeedTcp,
            (Phase::NeedTcp, Outcome::Opened) => Phase::NeedGreeting,
            (Phase::NeedGreeting, Outcome::Greeted) => Phase::Ready,
            (Phase::NeedGreeting, Outcome::GreetingFailed) => Phase::NeedTcp,
            (Phase::Ready, Outcome::LinkClosed) => Phase::NeedTcp,
            (phase, _) => phase,
        }
    }

    /// Whether `CLOSED` is expected noise in this phase
    ///
    /// Every phase short of [`Phase::Ready`] ends in a fresh connection.
    pub fn suppresses_closed(self) -> bool {
        self != Phase::Ready
    }

    /// Whether `WIFI DISCONNECT` is dispatched in this phase
    ///
    /// Held until the link is fully back. A drop on the way there is still
    /// noticed through the context's `wifi_dropped` flag.
    pub fn suppresses_wifi_loss(self) -> bool {
        self != Phase::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let phase = Phase::NeedWifi
            .transition(Outcome::Associated)
            .transition(Outcome::Opened)
            .transition(Outcome::Greeted);
        assert_eq!(phase, Phase::Ready);
    }

    #[test]
    fn test_wifi_loss_from_anywhere() {
        for phase in [
            Phase::NeedWifi,
            Phase::NeedTcp,
            Phase::NeedGreeting,
            Phase::Ready,
        ] {
            assert_eq!(phase.transition(Outcome::WifiLost), Phase::NeedWifi);
        }
    }

    #[test]
    fn test_greeting_failure_reopens() {
        assert_eq!(
            Phase::NeedGreeting.transition(Outcome::GreetingFailed),
            Phase::NeedTcp
        );
    }

    #[test]
    fn test_closed_while_ready() {
        assert_eq!(Phase::Ready.transition(Outcome::LinkClosed), Phase::NeedTcp);
    }

    #[test]
    fn test_unrelated_outcome_ignored() {
        assert_eq!(Phase::NeedWifi.transition(Outcome::Greeted), Phase::NeedWifi);
        assert_eq!(Phase::Ready.transition(Outcome::Opened), Phase::Ready);
    }

    #[test]
    fn test_suppression() {
        assert!(Phase::NeedWifi.suppresses_wifi_loss());
        assert!(Phase::NeedWifi.suppresses_closed());
        assert!(Phase::NeedTcp.suppresses_wifi_loss());
        assert!(Phase::NeedGreeting.suppresses_wifi_loss());
        assert!(Phase::NeedTcp.suppresses_closed());
        assert!(Phase::NeedGreeting.suppresses_closed());
        assert!(!Phase::Ready.suppresses_closed());
        assert!(!Phase::Ready.suppresses_wifi_loss());
    }
}
