use serde::{Deserialize, Serialize};
use std::fmt;

/// Term is the logical clock of an election. It only ever moves forward for a given node.
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Term(u64);

impl Term {
    pub fn new(term: u64) -> Self {
        Term(term)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// None once the term space is used up. A peer can hand us `u64::MAX` in a heartbeat.
    pub(crate) fn next(&self) -> Option<Term> {
        self.0.checked_add(1).map(Term)
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_stops_at_the_last_term() {
        assert_eq!(Term::new(0).next(), Some(Term::new(1)));
        assert_eq!(Term::new(u64::MAX - 1).next(), Some(Term::new(u64::MAX)));
        assert_eq!(Term::new(u64::MAX).next(), None);
    }

    #[test]
    fn serializes_as_plain_number() {
        let term: Term = serde_json::from_str("18446744073709551615").unwrap();

        assert_eq!(term.as_u64(), u64::MAX);
        assert_eq!(serde_json::to_string(&Term::new(7)).unwrap(), "7");
    }
}
