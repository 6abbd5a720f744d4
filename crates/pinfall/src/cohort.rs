//! Cohorts: fixed-size groups that register, dance and play together.

use std::sync::Mutex;

use crate::ids::CohortId;
use crate::monitor;
use crate::pool::Alley;

struct CohortState {
    members: usize,
    alley: Option<Alley>,
}

/// A group of customers moving through the venue as a unit.
///
/// Shared between its members behind an `Arc`. The member count only grows
/// and never passes the target size; the alley binding is set by the
/// arbiter and cleared exactly once when the game ends.
pub struct Cohort {
    id: CohortId,
    target_size: usize,
    state: Mutex<CohortState>,
}

impl Cohort {
    pub fn new(id: CohortId, target_size: usize) -> Self {
        assert!(target_size > 0, "{id} created with target size 0");
        Self {
            id,
            target_size,
            state: Mutex::new(CohortState {
                members: 0,
                alley: None,
            }),
        }
    }

    pub fn id(&self) -> CohortId {
        self.id
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn members(&self) -> usize {
        monitor::lock("cohort", &self.state).members
    }

    pub fn is_full(&self) -> bool {
        self.members() == self.target_size
    }

    /// Count one more registered member. Returns the new member count.
    pub fn admit_member(&self) -> usize {
        let mut state = monitor::lock("cohort", &self.state);
        assert!(
            state.members < self.target_size,
            "{} already has all {} members",
            self.id,
            self.target_size
        );
        state.members += 1;
        state.members
    }

    pub fn alley(&self) -> Option<Alley> {
        monitor::lock("cohort", &self.state).alley
    }

    pub(crate) fn bind_alley(&self, alley: Alley) {
        let mut state = monitor::lock("cohort", &self.state);
        assert!(
            state.alley.is_none(),
            "{} bound to a second alley while holding one",
            self.id
        );
        state.alley = Some(alley);
    }

    /// Check-and-clear: only the first caller after a game sees the alley.
    pub(crate) fn take_alley(&self) -> Option<Alley> {
        monitor::lock("cohort", &self.state).alley.take()
    }
}

impl std::fmt::Debug for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = monitor::lock("cohort", &self.state);
        f.debug_struct("Cohort")
            .field("id", &self.id)
            .field("target_size", &self.target_size)
            .field("members", &state.members)
            .field("alley", &state.alley)
            .finish()
    }
}
