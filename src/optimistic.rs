//! Client-side bookkeeping for optimistic toggles.
//!
//! A toggle shows its predicted value immediately, then settles on whatever
//! the server answers, or rolls back to the last confirmed value if the call
//! fails. Only the newest in-flight request may settle the state: a response
//! carrying an older ticket is discarded.

/// Identifies one `begin` call. Compare against the toggle to tell whether a
/// response is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleState<T> {
    Settled(T),
    Pending { original: T, predicted: T, seq: u64 },
    RolledBack(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The state settled on the server's value
    Applied,
    /// The request failed; the state went back to the last confirmed value
    RolledBack,
    /// A newer request is in flight; this response was ignored
    Stale,
}

#[derive(Debug, Clone)]
pub struct OptimisticToggle<T> {
    state: ToggleState<T>,
    next_seq: u64,
    /// Ticket of the newest server answer adopted so far
    confirmed_seq: Option<u64>,
}

impl<T: Clone> OptimisticToggle<T> {
    pub fn new(server_value: T) -> Self {
        Self {
            state: ToggleState::Settled(server_value),
            next_seq: 0,
            confirmed_seq: None,
        }
    }

    pub fn state(&self) -> &ToggleState<T> {
        &self.state
    }

    /// What the UI should display right now.
    pub fn value(&self) -> &T {
        match &self.state {
            ToggleState::Settled(v) | ToggleState::RolledBack(v) => v,
            ToggleState::Pending { predicted, .. } => predicted,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ToggleState::Pending { .. })
    }

    /// Show `predicted` until the matching `resolve`. Starting a new toggle
    /// while one is pending supersedes it; the rollback target stays the last
    /// confirmed value.
    pub fn begin(&mut self, predicted: T) -> Ticket {
        let original = match &self.state {
            ToggleState::Settled(v) | ToggleState::RolledBack(v) => v.clone(),
            ToggleState::Pending { original, .. } => original.clone(),
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.state = ToggleState::Pending {
            original,
            predicted,
            seq,
        };
        Ticket(seq)
    }

    /// Apply the server's answer to `ticket`. A superseded success still
    /// becomes the rollback target, unless a newer answer was already adopted.
    pub fn resolve<E>(&mut self, ticket: Ticket, result: Result<T, E>) -> Resolution {
        let newest_answer = self.confirmed_seq.is_none_or(|c| ticket.0 > c);
        let ToggleState::Pending { original, seq, .. } = &mut self.state else {
            return Resolution::Stale;
        };

        if *seq != ticket.0 {
            if let Ok(value) = result {
                if newest_answer {
                    *original = value;
                    self.confirmed_seq = Some(ticket.0);
                }
            }
            return Resolution::Stale;
        }

        match result {
            Ok(value) => {
                self.state = ToggleState::Settled(value);
                self.confirmed_seq = Some(ticket.0);
                Resolution::Applied
            }
            Err(_) => {
                self.state = ToggleState::RolledBack(original.clone());
                Resolution::RolledBack
            }
        }
    }
}

impl OptimisticToggle<bool> {
    /// Predict the opposite of what is displayed.
    pub fn flip(&mut self) -> Ticket {
        let predicted = !*self.value();
        self.begin(predicted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub count: i64,
}

/// Like button plus its counter, moved together.
#[derive(Debug, Clone)]
pub struct LikeCounter {
    toggle: OptimisticToggle<LikeState>,
}

impl LikeCounter {
    pub fn new(liked: bool, count: i64) -> Self {
        Self {
            toggle: OptimisticToggle::new(LikeState { liked, count }),
        }
    }

    pub fn current(&self) -> LikeState {
        *self.toggle.value()
    }

    pub fn toggle(&mut self) -> Ticket {
        let shown = self.current();
        let predicted = if shown.liked {
            LikeState {
                liked: false,
                count: (shown.count - 1).max(0),
            }
        } else {
            LikeState {
                liked: true,
                count: shown.count + 1,
            }
        };
        self.toggle.begin(predicted)
    }

    /// Feed in the server's `{liked, likes_count}` or the failure.
    pub fn resolve<E>(&mut self, ticket: Ticket, result: Result<LikeState, E>) -> Resolution {
        self.toggle.resolve(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_settles_on_server_value() {
        let mut t = OptimisticToggle::new(false);
        let ticket = t.flip();
        assert!(*t.value());
        assert!(t.is_pending());

        assert_eq!(t.resolve::<()>(ticket, Ok(true)), Resolution::Applied);
        assert_eq!(t.state(), &ToggleState::Settled(true));
    }

    #[test]
    fn failure_rolls_back() {
        let mut t = OptimisticToggle::new(false);
        let ticket = t.flip();
        assert_eq!(t.resolve(ticket, Err("offline")), Resolution::RolledBack);
        assert_eq!(t.state(), &ToggleState::RolledBack(false));
        assert!(!*t.value());
    }

    #[test]
    fn out_of_order_response_is_discarded() {
        let mut t = OptimisticToggle::new(false);
        let first = t.flip(); // shows true
        let second = t.flip(); // shows false again

        // The first response arrives late and must not overwrite the display.
        assert_eq!(t.resolve::<()>(first, Ok(true)), Resolution::Stale);
        assert!(!*t.value());
        assert!(t.is_pending());

        assert_eq!(t.resolve::<()>(second, Ok(false)), Resolution::Applied);
        assert_eq!(t.state(), &ToggleState::Settled(false));
    }

    #[test]
    fn rollback_after_superseded_success_uses_latest_server_value() {
        let mut t = OptimisticToggle::new(false);
        let first = t.flip();
        let second = t.flip();
        assert_eq!(t.resolve::<()>(first, Ok(true)), Resolution::Stale);
        assert_eq!(t.resolve(second, Err("boom")), Resolution::RolledBack);
        assert_eq!(t.state(), &ToggleState::RolledBack(true));
    }

    #[test]
    fn late_answer_does_not_replace_newer_confirmation() {
        let mut t = OptimisticToggle::new(false);
        let first = t.flip();
        let second = t.flip();
        let third = t.flip();

        assert_eq!(t.resolve::<()>(second, Ok(false)), Resolution::Stale);
        assert_eq!(t.resolve::<()>(first, Ok(true)), Resolution::Stale);
        assert_eq!(t.resolve(third, Err("timeout")), Resolution::RolledBack);
        assert_eq!(t.state(), &ToggleState::RolledBack(false));
    }

    #[test]
    fn answer_from_before_settling_is_ignored_later() {
        let mut t = OptimisticToggle::new(false);
        let first = t.flip();
        let second = t.flip();
        assert_eq!(t.resolve::<()>(second, Ok(false)), Resolution::Applied);

        let third = t.flip();
        assert_eq!(t.resolve::<()>(first, Ok(true)), Resolution::Stale);
        assert_eq!(t.resolve(third, Err("timeout")), Resolution::RolledBack);
        assert_eq!(t.state(), &ToggleState::RolledBack(false));
    }

    #[test]
    fn resolve_without_pending_is_stale() {
        let mut t = OptimisticToggle::new(1);
        let ticket = t.begin(2);
        assert_eq!(t.resolve::<()>(ticket, Ok(2)), Resolution::Applied);
        assert_eq!(t.resolve::<()>(ticket, Ok(3)), Resolution::Stale);
        assert_eq!(*t.value(), 2);
    }

    #[test]
    fn like_counter_moves_count_with_state() {
        let mut likes = LikeCounter::new(false, 3);
        let ticket = likes.toggle();
        assert_eq!(likes.current(), LikeState { liked: true, count: 4 });

        let server = LikeState { liked: true, count: 5 };
        assert_eq!(likes.resolve::<()>(ticket, Ok(server)), Resolution::Applied);
        assert_eq!(likes.current(), server);

        let ticket = likes.toggle();
        assert_eq!(likes.current(), LikeState { liked: false, count: 4 });
        assert_eq!(likes.resolve(ticket, Err("rate limited")), Resolution::RolledBack);
        assert_eq!(likes.current(), server);
    }

    #[test]
    fn unlike_never_shows_negative_count() {
        let mut likes = LikeCounter::new(true, 0);
        likes.toggle();
        assert_eq!(likes.current(), LikeState { liked: false, count: 0 });
    }
}
