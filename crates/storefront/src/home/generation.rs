//! Generation counters for superseding in-flight fetches.

/// Identifies one started fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Monotonic counter for one kind of fetch.
///
/// Starting a fetch takes a new [`Ticket`]; only the holder of the latest
/// ticket may apply its result.
#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    /// Start a new fetch, superseding every earlier ticket.
    pub const fn advance(&mut self) -> Ticket {
        self.current = self.current.wrapping_add(1);
        Ticket(self.current)
    }

    /// Supersede every outstanding ticket without starting a fetch.
    pub const fn invalidate(&mut self) {
        self.current = self.current.wrapping_add(1);
    }

    /// Whether `ticket` is the most recently issued one.
    #[must_use]
    pub const fn is_current(&self, ticket: Ticket) -> bool {
        self.current == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let mut generation = Generation::default();
        let first = generation.advance();
        assert!(generation.is_current(first));

        let second = generation.advance();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }

    #[test]
    fn test_invalidate_supersedes_everything() {
        let mut generation = Generation::default();
        let ticket = generation.advance();
        generation.invalidate();
        assert!(!generation.is_current(ticket));

        let fresh = generation.advance();
        assert!(generation.is_current(fresh));
    }
}
