// blocking trait metadata.


/// Whether starting an operation may block the calling thread
///
/// This is composition metadata only. It has no runtime effect, but lets a composition decide
/// whether a synchronous fast path is safe.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Blocking {
    /// Completion never happens before `start` returns
    Never,
    /// Completion always happens inline, on the thread calling `start`, before it returns
    AlwaysInline,
    /// Completion always happens before `start` returns, though maybe on another thread
    Always,
    /// No guarantee either way
    Maybe,
}

impl Blocking {
    /// Blocking behavior of running `predecessor` and then `successor` after it.
    pub fn sequence(predecessor: Blocking, successor: Blocking) -> Blocking {
        use Blocking::*;

        match (predecessor, successor) {
            (Never, Never) => Never,
            (AlwaysInline, AlwaysInline) => AlwaysInline,
            (AlwaysInline | Always, AlwaysInline | Always) => Always,
            _ => Maybe,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_table() {
        use Blocking::*;

        assert_eq!(Blocking::sequence(Never, Never), Never);
        assert_eq!(Blocking::sequence(AlwaysInline, AlwaysInline), AlwaysInline);
        assert_eq!(Blocking::sequence(AlwaysInline, Always), Always);
        assert_eq!(Blocking::sequence(Always, AlwaysInline), Always);
        assert_eq!(Blocking::sequence(Always, Always), Always);
        assert_eq!(Blocking::sequence(AlwaysInline, Maybe), Maybe);
        assert_eq!(Blocking::sequence(Never, AlwaysInline), Maybe);
        assert_eq!(Blocking::sequence(Maybe, Never), Maybe);
    }
}
