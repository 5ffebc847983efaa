//! Response classification for the request pipeline
//!
//! Decides the pipeline's next step from a completed response. Pure
//! decision table, no I/O: the store is probed before classification and
//! its answer passed in as `has_refresh`.

/// What the pipeline does with a completed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 2xx. The response stands and is handed to the caller.
    Authorized,
    /// A 401 eligible for a single renewal: first attempt, refresh token
    /// on hand.
    Unauthenticated,
    /// Any other failure. Surfaced to the caller unchanged, never renewed.
    OtherFailure,
}

/// Classify a completed response.
///
/// `already_retried` is true on the post-renewal replay; a 401 there is a
/// terminal failure, not another renewal trigger. `has_refresh` reflects
/// the store at dispatch time: a 401 with nothing to renew with is also
/// terminal.
pub fn classify(status: u16, already_retried: bool, has_refresh: bool) -> Classification {
    match status {
        200..=299 => Classification::Authorized,
        401 if !already_retried && has_refresh => Classification::Unauthenticated,
        _ => Classification::OtherFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_200_authorized() {
        assert_eq!(classify(200, false, true), Classification::Authorized);
    }

    #[test]
    fn classify_201_authorized() {
        assert_eq!(classify(201, false, true), Classification::Authorized);
    }

    #[test]
    fn classify_204_authorized() {
        assert_eq!(classify(204, false, false), Classification::Authorized);
    }

    #[test]
    fn classify_401_first_attempt_with_refresh() {
        assert_eq!(classify(401, false, true), Classification::Unauthenticated);
    }

    #[test]
    fn classify_401_already_retried() {
        assert_eq!(classify(401, true, true), Classification::OtherFailure);
    }

    #[test]
    fn classify_401_without_refresh_token() {
        assert_eq!(classify(401, false, false), Classification::OtherFailure);
    }

    #[test]
    fn classify_400_other_failure() {
        assert_eq!(classify(400, false, true), Classification::OtherFailure);
    }

    #[test]
    fn classify_403_other_failure() {
        assert_eq!(classify(403, false, true), Classification::OtherFailure);
    }

    #[test]
    fn classify_404_other_failure() {
        assert_eq!(classify(404, false, true), Classification::OtherFailure);
    }

    #[test]
    fn classify_500_other_failure() {
        assert_eq!(classify(500, false, true), Classification::OtherFailure);
    }

    #[test]
    fn classify_302_other_failure() {
        assert_eq!(classify(302, false, true), Classification::OtherFailure);
    }
}
