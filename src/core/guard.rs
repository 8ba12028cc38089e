//! Guard predicates for controlling transitions.
//!
//! Guards are boolean functions over the actor's context and the triggering
//! event. They decide whether a transition candidate may fire and are
//! evaluated before any exit or entry action runs.

use std::fmt;
use std::sync::Arc;

type Predicate<C, E> = dyn Fn(&C, Option<&E>) -> Result<bool, String> + Send + Sync;

/// Predicate that determines if a transition candidate can fire.
///
/// The event is `None` while the actor enters its initial configuration and
/// while eventless transitions are drained after `start`.
///
/// # Example
///
/// ```rust
/// use harel::core::Guard;
///
/// struct Counter {
///     count: u32,
/// }
///
/// let under_limit = Guard::<Counter, ()>::new(|ctx, _| ctx.count < 3);
///
/// assert_eq!(under_limit.check(&Counter { count: 1 }, None), Ok(true));
/// assert_eq!(under_limit.check(&Counter { count: 3 }, None), Ok(false));
/// ```
pub struct Guard<C, E> {
    predicate: Arc<Predicate<C, E>>,
}

impl<C, E> Guard<C, E> {
    /// Create a guard from an infallible predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(move |ctx, event| Ok(predicate(ctx, event))),
        }
    }

    /// Create a guard from a predicate that can fail.
    ///
    /// A failure aborts the `send` that evaluated it and leaves the actor at
    /// the configuration it held before the call.
    pub fn try_new<F>(predicate: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> Result<bool, String> + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the guard.
    pub fn check(&self, context: &C, event: Option<&E>) -> Result<bool, String> {
        (self.predicate)(context, event)
    }
}

impl<C, E> Clone for Guard<C, E> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C, E> fmt::Debug for Guard<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Board {
        cells: [Option<char>; 3],
    }

    #[derive(Clone, Debug)]
    enum Move {
        Pick(usize),
    }

    #[test]
    fn guard_reads_context_and_event() {
        let cell_is_free = Guard::new(|board: &Board, event: Option<&Move>| match event {
            Some(Move::Pick(index)) => board.cells[*index].is_none(),
            None => false,
        });
        let board = Board {
            cells: [Some('x'), None, None],
        };

        assert_eq!(cell_is_free.check(&board, Some(&Move::Pick(1))), Ok(true));
        assert_eq!(cell_is_free.check(&board, Some(&Move::Pick(0))), Ok(false));
        assert_eq!(cell_is_free.check(&board, None), Ok(false));
    }

    #[test]
    fn fallible_guard_reports_failure() {
        let guard = Guard::<Board, Move>::try_new(|_, event| match event {
            Some(Move::Pick(index)) if *index < 3 => Ok(true),
            Some(Move::Pick(index)) => Err(format!("index {index} is off the board")),
            None => Ok(false),
        });
        let board = Board { cells: [None; 3] };

        assert_eq!(
            guard.check(&board, Some(&Move::Pick(7))),
            Err("index 7 is off the board".to_string())
        );
    }

    #[test]
    fn guard_is_deterministic() {
        let guard = Guard::<Board, Move>::new(|board, _| board.cells.iter().all(Option::is_none));
        let board = Board { cells: [None; 3] };

        assert_eq!(guard.check(&board, None), guard.check(&board, None));
    }

    #[test]
    fn cloned_guards_share_the_predicate() {
        let guard = Guard::<Board, Move>::new(|board, _| board.cells[0] == Some('x'));
        let cloned = guard.clone();
        let board = Board {
            cells: [Some('x'), None, None],
        };

        assert_eq!(guard.check(&board, None), cloned.check(&board, None));
    }
}
