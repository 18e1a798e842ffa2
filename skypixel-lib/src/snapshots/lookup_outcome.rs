use super::upstream::UpstreamError;

/// Result of one item in a batched upstream lookup.
#[derive(Debug)]
pub enum LookupOutcome<T> {
    /// The upstream returned the item.
    Found(T),

    /// The upstream reported that the item does not exist.
    Absent,

    /// The lookup failed; the caller substitutes its documented default.
    Failed(UpstreamError),
}

impl<T> LookupOutcome<T> {
    /// Classify a request result. A not-found answer is [`LookupOutcome::Absent`], not a failure.
    #[must_use]
    pub fn from_result(result: Result<T, UpstreamError>) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(e) if e.is_not_found() => Self::Absent,
            Err(e) => Self::Failed(e),
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The found value, discarding why it is missing otherwise.
    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Absent | Self::Failed(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LookupOutcome<U> {
        match self {
            Self::Found(value) => LookupOutcome::Found(f(value)),
            Self::Absent => LookupOutcome::Absent,
            Self::Failed(e) => LookupOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ok_is_found() {
        let outcome = LookupOutcome::from_result(Ok::<_, UpstreamError>(42));
        assert!(outcome.is_found());
        assert_eq!(outcome.found(), Some(42));
    }

    #[test]
    fn test_not_found_is_absent() {
        let outcome = LookupOutcome::<u32>::from_result(Err(UpstreamError::NotFound { url: "u".into() }));
        assert!(matches!(outcome, LookupOutcome::Absent));
        assert_eq!(outcome.found(), None);
    }

    #[test]
    fn test_other_errors_are_failed() {
        let outcome = LookupOutcome::<u32>::from_result(Err(UpstreamError::http(500, "boom")));
        match outcome {
            LookupOutcome::Failed(e) => assert_eq!(e.status(), Some(500)),
            _ => panic!("Expected Failed"),
        }
    }

    #[test]
    fn test_map_keeps_variant() {
        assert_eq!(LookupOutcome::Found(2).map(|v| v * 10).found(), Some(20));
        assert!(matches!(LookupOutcome::<u32>::Absent.map(|v| v + 1), LookupOutcome::Absent));
    }
}
