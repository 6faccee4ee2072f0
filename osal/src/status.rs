//! Status taxonomy shared by every OSAL operation.

/// Outcome of a fallible OSAL operation.
///
/// Exactly one variant is returned per call; the taxonomy is fixed and
/// intentionally small — see the module documentation in `spec.md` §7 for
/// the rationale. `create`-style constructors do not return `Status`
/// directly (they return `Option<Handle>`, with construction failure
/// folded into `None`), but every other operation does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The operation produced its effect.
    Success,
    /// Any back-end failure not covered by a more specific variant.
    Error,
    /// A blocking operation could not be satisfied within the requested
    /// deadline. No partial state is left behind.
    Timeout,
    /// The kernel or allocator refused the request (e.g. a full
    /// semaphore, an exhausted resource pool). No side effects occurred.
    Resource,
    /// A null handle or otherwise invalid argument was rejected without
    /// side effects.
    Parameter,
    /// Out of memory.
    NoMem,
    /// An operation not legal from interrupt context was attempted there.
    Isr,
    /// The back-end does not offer this operation.
    NotImplemented,
}

impl Status {
    /// `true` for [`Status::Success`].
    pub const fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// `true` for [`Status::Timeout`] — an expected outcome, not an error.
    pub const fn is_timeout(self) -> bool {
        matches!(self, Status::Timeout)
    }

    /// Convert to a `Result`, treating anything but `Success` as the error.
    pub const fn into_result(self) -> Result<(), Status> {
        match self {
            Status::Success => Ok(()),
            other => Err(other),
        }
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Status::Success => "success",
            Status::Error => "error",
            Status::Timeout => "timed out",
            Status::Resource => "resource exhausted",
            Status::Parameter => "invalid parameter",
            Status::NoMem => "out of memory",
            Status::Isr => "not callable from an interrupt service routine",
            Status::NotImplemented => "not implemented on this back-end",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Status {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_predicates() {
        assert!(Status::Success.is_success());
        assert!(!Status::Timeout.is_success());
        assert!(Status::Timeout.is_timeout());
        assert!(!Status::Success.is_timeout());
    }

    #[test]
    fn into_result_round_trip() {
        assert_eq!(Status::Success.into_result(), Ok(()));
        assert_eq!(Status::Error.into_result(), Err(Status::Error));
    }

    #[test]
    fn display_is_non_empty() {
        for s in [
            Status::Success,
            Status::Error,
            Status::Timeout,
            Status::Resource,
            Status::Parameter,
            Status::NoMem,
            Status::Isr,
            Status::NotImplemented,
        ] {
            assert!(!s.to_string().is_empty());
        }
    }
}
