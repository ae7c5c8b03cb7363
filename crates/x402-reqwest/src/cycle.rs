//! The two-attempt payment cycle.
//!
//! ```text
//! Idle --402--> OfferReceived --> Signing --> Retried --2xx/other--> Settled
//!                                                     \--402------> Rejected
//! ```
//!
//! A request is sent at most twice: once as issued ([`Attempt::First`]) and
//! once with a payment header ([`Attempt::Paid`]). A 402 on the paid attempt
//! is terminal, so a misconfigured server cannot cause a sign/retry loop.

use http::StatusCode;

/// Where a payment cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CyclePhase {
    /// No 402 seen yet.
    Idle,
    /// The server asked for payment; the offer waits for the caller.
    OfferReceived,
    /// A wallet is signing the authorization.
    Signing,
    /// The request was sent again with a payment header.
    Retried,
    /// The paid attempt was accepted.
    Settled,
    /// The paid attempt was answered with another 402.
    Rejected,
}

impl CyclePhase {
    /// Whether moving from `self` to `next` is a step of the cycle.
    ///
    /// `OfferReceived -> Retried` is allowed for callers that sign on their own
    /// and hand a finished envelope to the adapter.
    pub fn can_advance_to(self, next: CyclePhase) -> bool {
        use CyclePhase::*;
        matches!(
            (self, next),
            (Idle, OfferReceived)
                | (OfferReceived, Signing)
                | (OfferReceived, Retried)
                | (Signing, Retried)
                | (Retried, Settled)
                | (Retried, Rejected)
        )
    }

    /// Settled and Rejected end the cycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, CyclePhase::Settled | CyclePhase::Rejected)
    }
}

/// Which of the two sends a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attempt {
    /// The request as issued by the caller.
    First,
    /// The retry carrying the payment header.
    Paid,
}

/// What a response means for the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptOutcome {
    /// First attempt, no payment needed: hand the response back verbatim.
    Passthrough,
    /// First attempt answered 402: surface the offer.
    Challenge,
    /// Paid attempt accepted.
    Settled,
    /// Paid attempt answered 402.
    Rejected,
}

impl Attempt {
    /// Classifies the status of the response to this attempt.
    pub fn classify(self, status: StatusCode) -> AttemptOutcome {
        let payment_required = status == StatusCode::PAYMENT_REQUIRED;
        match (self, payment_required) {
            (Attempt::First, false) => AttemptOutcome::Passthrough,
            (Attempt::First, true) => AttemptOutcome::Challenge,
            (Attempt::Paid, false) => AttemptOutcome::Settled,
            (Attempt::Paid, true) => AttemptOutcome::Rejected,
        }
    }
}

impl AttemptOutcome {
    /// The phase a cycle ends in, for outcomes of the paid attempt.
    pub fn terminal_phase(self) -> Option<CyclePhase> {
        match self {
            AttemptOutcome::Settled => Some(CyclePhase::Settled),
            AttemptOutcome::Rejected => Some(CyclePhase::Rejected),
            AttemptOutcome::Passthrough | AttemptOutcome::Challenge => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_attempt_never_challenges() {
        for status in [
            StatusCode::OK,
            StatusCode::BAD_REQUEST,
            StatusCode::PAYMENT_REQUIRED,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            assert_ne!(Attempt::Paid.classify(status), AttemptOutcome::Challenge);
        }
    }

    #[test]
    fn test_paid_outcomes_end_the_cycle() {
        let settled = Attempt::Paid.classify(StatusCode::OK).terminal_phase();
        assert_eq!(settled, Some(CyclePhase::Settled));
        let rejected = Attempt::Paid
            .classify(StatusCode::PAYMENT_REQUIRED)
            .terminal_phase();
        assert_eq!(rejected, Some(CyclePhase::Rejected));
        assert!(settled.is_some_and(CyclePhase::is_terminal));
        assert_eq!(
            Attempt::First
                .classify(StatusCode::PAYMENT_REQUIRED)
                .terminal_phase(),
            None
        );
    }

    #[test]
    fn test_first_attempt() {
        assert_eq!(
            Attempt::First.classify(StatusCode::OK),
            AttemptOutcome::Passthrough
        );
        assert_eq!(
            Attempt::First.classify(StatusCode::INTERNAL_SERVER_ERROR),
            AttemptOutcome::Passthrough
        );
        assert_eq!(
            Attempt::First.classify(StatusCode::PAYMENT_REQUIRED),
            AttemptOutcome::Challenge
        );
    }

    #[test]
    fn test_phase_transitions() {
        use CyclePhase::*;
        assert!(Idle.can_advance_to(OfferReceived));
        assert!(OfferReceived.can_advance_to(Signing));
        assert!(Signing.can_advance_to(Retried));
        assert!(Retried.can_advance_to(Rejected));
        assert!(!Rejected.can_advance_to(Signing));
        assert!(!Settled.can_advance_to(Retried));
        assert!(!Retried.can_advance_to(Retried));
        assert!(!Idle.can_advance_to(Retried));
        assert!(Rejected.is_terminal() && Settled.is_terminal());
        assert!(!Retried.is_terminal());
    }
}
