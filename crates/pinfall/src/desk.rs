//! Registration desk: cohort formation on the way in, payment on the way out.
//!
//! Both steps are served by the shared `CashierPool`. The cashier is handed
//! back before the registrant waits for its cohort, so registers keep
//! turning over while cohorts fill up.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;

use crate::actor::Actor;
use crate::barrier::CohortBarrier;
use crate::cohort::Cohort;
use crate::ids::{ActorId, CohortId};
use crate::monitor;
use crate::pool::{CashierPool, PoolSnapshot};

/// Hands out cohort ids and tracks the one cohort still open for members.
struct CohortFormer {
    next_id: usize,
    open: Option<Arc<Cohort>>,
}

pub struct RegistrationDesk {
    cashiers: CashierPool,
    former: Mutex<CohortFormer>,
    gathering: CohortBarrier,
    /// Customers between registration and payment, with their cohort.
    customers: DashMap<ActorId, CohortId>,
    cohort_size: usize,
    register_time: Duration,
    pay_time: Duration,
}

impl RegistrationDesk {
    pub fn new(
        num_cashiers: usize,
        cohort_size: usize,
        register_time: Duration,
        pay_time: Duration,
    ) -> Self {
        Self {
            cashiers: CashierPool::new(num_cashiers),
            former: Mutex::new(CohortFormer {
                next_id: 1,
                open: None,
            }),
            gathering: CohortBarrier::new("registration"),
            customers: DashMap::new(),
            cohort_size,
            register_time,
            pay_time,
        }
    }

    /// Register the actor, place it in a cohort and wait for that cohort to
    /// fill. Returns the cohort, which is also attached to the actor.
    pub fn register(&self, actor: &mut Actor) -> Arc<Cohort> {
        let lease = self.cashiers.acquire(actor.id());
        simulate(self.register_time);

        let cohort = self.assign_cohort(actor.id());
        self.customers.insert(actor.id(), cohort.id());
        actor.join_cohort(Arc::clone(&cohort));
        lease.release();

        self.gathering.arrive_and_wait(actor);
        cohort
    }

    /// Take payment at any free cashier. The customer leaves the ledger.
    pub fn charge_fee(&self, actor: &Actor) {
        let lease = self.cashiers.acquire(actor.id());
        simulate(self.pay_time);

        if self.customers.remove(&actor.id()).is_none() {
            tracing::warn!(actor = %actor.id(), "Payment from a customer who never registered");
        }
        tracing::info!(
            actor = %actor.id(),
            cashier = ?lease.cashier_id(),
            inside = self.customers.len(),
            "Customer paid"
        );
        lease.release();
    }

    fn assign_cohort(&self, actor: ActorId) -> Arc<Cohort> {
        let mut former = monitor::lock("cohort_former", &self.former);
        let cohort = match former.open.take() {
            Some(open) if !open.is_full() => open,
            _ => {
                let id = CohortId::new(former.next_id);
                former.next_id += 1;
                tracing::debug!(cohort = %id, founder = %actor, "Cohort opened");
                Arc::new(Cohort::new(id, self.cohort_size))
            }
        };

        let members = cohort.admit_member();
        tracing::debug!(
            %actor,
            cohort = %cohort.id(),
            members,
            target = cohort.target_size(),
            "Assigned to cohort"
        );
        if !cohort.is_full() {
            former.open = Some(Arc::clone(&cohort));
        }
        cohort
    }

    pub fn customers_inside(&self) -> usize {
        self.customers.len()
    }

    pub fn cohort_of(&self, actor: ActorId) -> Option<CohortId> {
        self.customers.get(&actor).map(|entry| *entry.value())
    }

    pub fn cashier_snapshot(&self) -> PoolSnapshot {
        self.cashiers.snapshot()
    }
}

fn simulate(work: Duration) {
    if !work.is_zero() {
        std::thread::sleep(work);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::thread;
    use std::time::Instant;

    fn instant_desk(cashiers: usize, cohort_size: usize) -> RegistrationDesk {
        RegistrationDesk::new(cashiers, cohort_size, Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn cohort_of_one_registers_without_waiting() {
        let desk = instant_desk(1, 1);
        let mut actor = Actor::new(ActorId::new(1));

        let cohort = desk.register(&mut actor);
        assert_eq!(cohort.id(), CohortId::new(1));
        assert!(cohort.is_full());
        assert_eq!(desk.cohort_of(actor.id()), Some(cohort.id()));
        assert_eq!(desk.customers_inside(), 1);

        desk.charge_fee(&actor);
        assert_eq!(desk.customers_inside(), 0);
        assert_eq!(desk.cashier_snapshot().available, 1);
    }

    #[test]
    fn registrants_are_grouped_into_full_cohorts() {
        let desk = Arc::new(instant_desk(2, 3));
        let handles: Vec<_> = (0..9)
            .map(|i| {
                let desk = Arc::clone(&desk);
                thread::spawn(move || {
                    let mut actor = Actor::new(ActorId::new(i));
                    let cohort = desk.register(&mut actor);
                    assert_eq!(actor.cohort().map(|c| c.id()), Some(cohort.id()));
                    assert!(cohort.is_full());
                    cohort.id()
                })
            })
            .collect();

        let mut sizes: HashMap<CohortId, usize> = HashMap::new();
        for handle in handles {
            *sizes.entry(handle.join().unwrap()).or_default() += 1;
        }
        assert_eq!(sizes.len(), 3);
        assert!(sizes.values().all(|&n| n == 3));
        assert_eq!(desk.customers_inside(), 9);
    }

    #[test]
    fn registration_waits_for_the_rest_of_the_cohort() {
        let desk = Arc::new(instant_desk(1, 2));
        let first = {
            let desk = Arc::clone(&desk);
            thread::spawn(move || {
                let mut actor = Actor::new(ActorId::new(1));
                desk.register(&mut actor);
                actor
            })
        };

        let deadline = Instant::now() + Duration::from_secs(5);
        while desk.customers_inside() == 0 {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(30));
        assert!(!first.is_finished());
        // The waiting registrant already handed its cashier back.
        assert_eq!(desk.cashier_snapshot().available, 1);

        let mut second = Actor::new(ActorId::new(2));
        let cohort = desk.register(&mut second);
        let first = first.join().unwrap();
        assert_eq!(first.cohort().map(|c| c.id()), Some(cohort.id()));
    }

    #[test]
    fn single_cashier_admits_one_registrant_at_a_time() {
        let desk = Arc::new(RegistrationDesk::new(
            1,
            1,
            Duration::from_millis(100),
            Duration::ZERO,
        ));
        let started = Instant::now();
        let handles: Vec<_> = (0..2)
            .map(|i| {
                let desk = Arc::clone(&desk);
                thread::spawn(move || {
                    let mut actor = Actor::new(ActorId::new(i));
                    desk.register(&mut actor);
                    started.elapsed()
                })
            })
            .collect();

        let mut finished: Vec<Duration> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        finished.sort();
        assert!(finished[0] >= Duration::from_millis(100));
        assert!(finished[1] >= Duration::from_millis(200));
    }
}
