//! The shoe counter: one service slot, two kinds of customer.
//!
//! Rules enforced under the counter's monitor:
//! - one customer in service at a time, borrowing or returning
//! - a returner counts as pending from the moment it arrives until its
//!   service ends, and no borrower is served while any returner is pending
//! - once a cohort has received its first pair, no other cohort is served
//!   until that cohort is fully shod
//!
//! Service time is spent with the slot held but the monitor unlocked, so
//! returners can still register themselves as pending meanwhile.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::actor::Actor;
use crate::ids::CohortId;
use crate::monitor;
use crate::pool::{Resource, ResourcePool, ShoePair};

const MONITOR: &str = "shoe_counter";

/// A cohort that has received some but not all of its pairs.
#[derive(Debug, Clone, Copy)]
struct CohortIssue {
    cohort: CohortId,
    served: usize,
    target: usize,
}

struct CounterState {
    inventory: ResourcePool<ShoePair>,
    returners_pending: usize,
    borrowers_waiting: usize,
    in_service: bool,
    issuing: Option<CohortIssue>,
}

impl CounterState {
    fn may_borrow(&self, cohort: CohortId) -> bool {
        !self.in_service
            && self.returners_pending == 0
            && self.inventory.has_free()
            && self.issuing.is_none_or(|issue| issue.cohort == cohort)
    }

    fn record_issue(&mut self, cohort: CohortId, target: usize) {
        let issue = self.issuing.get_or_insert(CohortIssue {
            cohort,
            served: 0,
            target,
        });
        issue.served += 1;
        if issue.served == issue.target {
            self.issuing = None;
        }
    }
}

/// Counter occupancy, for logs and the venue snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShoeCounterSnapshot {
    pub available: usize,
    pub issued: usize,
    pub total: usize,
    pub returners_pending: usize,
    pub borrowers_waiting: usize,
    pub in_service: bool,
    pub issuing_cohort: Option<CohortId>,
}

pub struct ShoeCounter {
    state: Mutex<CounterState>,
    returner_turn: Condvar,
    borrower_turn: Condvar,
    service_time: Duration,
}

impl ShoeCounter {
    pub fn new(num_pairs: usize, service_time: Duration) -> Self {
        Self {
            state: Mutex::new(CounterState {
                inventory: ResourcePool::stocked(num_pairs),
                returners_pending: 0,
                borrowers_waiting: 0,
                in_service: false,
                issuing: None,
            }),
            returner_turn: Condvar::new(),
            borrower_turn: Condvar::new(),
            service_time,
        }
    }

    /// Block until the actor may be served, then hand it a pair.
    ///
    /// Panics if the actor already holds a pair or has no cohort.
    pub fn request_borrow(&self, actor: &mut Actor) {
        assert!(
            actor.shoes().is_none(),
            "{} asked for shoes while wearing a pair",
            actor.id()
        );
        let (cohort_id, target) = {
            let cohort = actor.expect_cohort(MONITOR);
            (cohort.id(), cohort.target_size())
        };

        let mut state = monitor::lock(MONITOR, &self.state);
        if !state.may_borrow(cohort_id) {
            state.borrowers_waiting += 1;
            while !state.may_borrow(cohort_id) {
                tracing::debug!(
                    actor = %actor.id(),
                    cohort = %cohort_id,
                    returners_pending = state.returners_pending,
                    available = state.inventory.available(),
                    issuing = ?state.issuing.map(|issue| issue.cohort),
                    "Waiting to borrow shoes"
                );
                state = monitor::wait(MONITOR, &self.borrower_turn, state);
            }
            state.borrowers_waiting -= 1;
        }

        state.in_service = true;
        let pair = state.inventory.take();
        state.record_issue(cohort_id, target);
        tracing::debug!(
            actor = %actor.id(),
            cohort = %cohort_id,
            pair = %pair.id(),
            available = state.inventory.available(),
            "Lending shoes"
        );
        drop(state);

        self.serve();
        actor.put_on_shoes(pair);

        let mut state = monitor::lock(MONITOR, &self.state);
        state.in_service = false;
        self.hand_over(&state);
    }

    /// Give the actor's pair back. Never refused; only waits for the slot.
    ///
    /// Panics if the actor holds no pair.
    pub fn request_return(&self, actor: &mut Actor) {
        let Some(pair) = actor.take_off_shoes() else {
            panic!("{} returned shoes it does not hold", actor.id());
        };

        let mut state = monitor::lock(MONITOR, &self.state);
        state.returners_pending += 1;
        while state.in_service {
            tracing::debug!(
                actor = %actor.id(),
                returners_pending = state.returners_pending,
                "Waiting to return shoes"
            );
            state = monitor::wait(MONITOR, &self.returner_turn, state);
        }
        state.in_service = true;
        drop(state);

        self.serve();

        let mut state = monitor::lock(MONITOR, &self.state);
        let pair_id = pair.id();
        state.inventory.put(pair);
        state.returners_pending -= 1;
        state.in_service = false;
        tracing::debug!(
            actor = %actor.id(),
            pair = %pair_id,
            available = state.inventory.available(),
            "Shoes returned"
        );
        self.hand_over(&state);
    }

    fn serve(&self) {
        if !self.service_time.is_zero() {
            std::thread::sleep(self.service_time);
        }
    }

    /// Pick who goes next once the slot frees up.
    ///
    /// A single returner is enough since returning always succeeds. Borrower
    /// eligibility depends on which cohort is being issued, so all borrowers
    /// are woken to recheck.
    fn hand_over(&self, state: &CounterState) {
        if state.returners_pending > 0 {
            self.returner_turn.notify_one();
        } else if state.inventory.has_free() {
            self.borrower_turn.notify_all();
        }
    }

    pub fn available(&self) -> usize {
        monitor::lock(MONITOR, &self.state).inventory.available()
    }

    pub fn returners_pending(&self) -> usize {
        monitor::lock(MONITOR, &self.state).returners_pending
    }

    pub fn snapshot(&self) -> ShoeCounterSnapshot {
        let state = monitor::lock(MONITOR, &self.state);
        ShoeCounterSnapshot {
            available: state.inventory.available(),
            issued: state.inventory.issued(),
            total: state.inventory.capacity(),
            returners_pending: state.returners_pending,
            borrowers_waiting: state.borrowers_waiting,
            in_service: state.in_service,
            issuing_cohort: state.issuing.map(|issue| issue.cohort),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::Cohort;
    use crate::ids::ActorId;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn member(id: usize, cohort: &Arc<Cohort>) -> Actor {
        let mut actor = Actor::new(ActorId::new(id));
        actor.join_cohort(Arc::clone(cohort));
        actor
    }

    fn cohort(id: usize, size: usize) -> Arc<Cohort> {
        Arc::new(Cohort::new(CohortId::new(id), size))
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn borrow_and_return_move_one_pair() {
        let counter = ShoeCounter::new(3, Duration::ZERO);
        let team = cohort(1, 1);
        let mut actor = member(1, &team);

        counter.request_borrow(&mut actor);
        assert!(actor.shoes().is_some());
        assert_eq!(counter.available(), 2);

        counter.request_return(&mut actor);
        assert!(actor.shoes().is_none());
        assert_eq!(counter.available(), 3);
        assert_eq!(counter.snapshot().issued, 0);
    }

    #[test]
    fn exhausted_inventory_blocks_until_a_return() {
        let counter = Arc::new(ShoeCounter::new(2, Duration::ZERO));
        let pair_team = cohort(1, 2);
        let late_team = cohort(2, 2);

        let borrowers: Vec<_> = [member(1, &pair_team), member(2, &pair_team)]
            .into_iter()
            .map(|mut actor| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    counter.request_borrow(&mut actor);
                    actor
                })
            })
            .collect();
        let mut shod: Vec<Actor> = borrowers.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counter.available(), 0);
        assert!(shod.iter().all(|actor| actor.shoes().is_some()));

        let third = {
            let counter = Arc::clone(&counter);
            let mut actor = member(3, &late_team);
            thread::spawn(move || {
                counter.request_borrow(&mut actor);
                actor
            })
        };
        wait_for(|| counter.snapshot().borrowers_waiting == 1);
        thread::sleep(Duration::from_millis(30));
        assert!(!third.is_finished());

        counter.request_return(&mut shod[0]);
        let third = third.join().unwrap();
        assert!(third.shoes().is_some());
        assert_eq!(counter.available(), 0);
    }

    #[test]
    fn waiting_returner_is_served_before_a_deciding_borrower() {
        let counter = Arc::new(ShoeCounter::new(3, Duration::from_millis(80)));
        let order = Arc::new(Mutex::new(Vec::new()));

        let solo = cohort(1, 1);
        let mut returner = member(1, &solo);
        counter.request_borrow(&mut returner);

        let spawn = |name: &'static str, mut actor: Actor, borrow: bool| {
            let counter = Arc::clone(&counter);
            let order = Arc::clone(&order);
            thread::spawn(move || {
                if borrow {
                    counter.request_borrow(&mut actor);
                } else {
                    counter.request_return(&mut actor);
                }
                order.lock().unwrap().push(name);
            })
        };

        let first = spawn("first-borrower", member(2, &cohort(2, 1)), true);
        wait_for(|| counter.snapshot().in_service);
        let ret = spawn("returner", returner, false);
        wait_for(|| counter.returners_pending() == 1);
        let late = spawn("late-borrower", member(3, &cohort(3, 1)), true);

        for handle in [first, ret, late] {
            handle.join().unwrap();
        }
        assert_eq!(
            *order.lock().unwrap(),
            vec!["first-borrower", "returner", "late-borrower"]
        );
    }

    #[test]
    fn partially_served_cohort_finishes_before_another_starts() {
        let counter = Arc::new(ShoeCounter::new(4, Duration::ZERO));
        let red = cohort(1, 2);
        let blue = cohort(2, 2);

        let mut red_first = member(1, &red);
        counter.request_borrow(&mut red_first);
        assert_eq!(counter.snapshot().issuing_cohort, Some(red.id()));

        let blue_first = {
            let counter = Arc::clone(&counter);
            let mut actor = member(10, &blue);
            thread::spawn(move || {
                counter.request_borrow(&mut actor);
                actor
            })
        };
        wait_for(|| counter.snapshot().borrowers_waiting == 1);
        thread::sleep(Duration::from_millis(30));
        assert!(!blue_first.is_finished());
        assert_eq!(counter.available(), 3);

        let mut red_second = member(2, &red);
        counter.request_borrow(&mut red_second);

        let blue_first = blue_first.join().unwrap();
        assert!(blue_first.shoes().is_some());
        assert_eq!(counter.snapshot().issuing_cohort, Some(blue.id()));
    }

    #[test]
    fn inventory_stays_balanced_under_contention() {
        let total = 4;
        let counter = Arc::new(ShoeCounter::new(total, Duration::from_micros(200)));
        let handles: Vec<_> = (0..8)
            .flat_map(|c| {
                let team = cohort(c, 2);
                vec![member(c * 2, &team), member(c * 2 + 1, &team)]
            })
            .map(|mut actor| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..3 {
                        let snapshot = counter.snapshot();
                        assert_eq!(snapshot.issued + snapshot.available, snapshot.total);
                        thread::yield_now();
                    }
                    counter.request_borrow(&mut actor);
                    let snapshot = counter.snapshot();
                    assert_eq!(snapshot.issued + snapshot.available, total);
                    counter.request_return(&mut actor);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = counter.snapshot();
        assert_eq!(snapshot.available, total);
        assert_eq!(snapshot.returners_pending, 0);
        assert_eq!(snapshot.issuing_cohort, None);
    }

    #[test]
    #[should_panic(expected = "returned shoes it does not hold")]
    fn returning_without_shoes_is_a_contract_violation() {
        let counter = ShoeCounter::new(1, Duration::ZERO);
        let mut actor = member(1, &cohort(1, 1));
        counter.request_return(&mut actor);
    }

    #[test]
    #[should_panic(expected = "while wearing a pair")]
    fn borrowing_twice_is_a_contract_violation() {
        let counter = ShoeCounter::new(2, Duration::ZERO);
        let mut actor = member(1, &cohort(1, 1));
        counter.request_borrow(&mut actor);
        counter.request_borrow(&mut actor);
    }
}
