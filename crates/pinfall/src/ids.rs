//! Integer identifiers for everything that moves through the venue.
//!
//! Stations key their bookkeeping by these ids rather than by object
//! identity, so an id is all a monitor ever needs to store.

use serde::{Deserialize, Serialize};

macro_rules! venue_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            pub const fn new(raw: usize) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

venue_id!(
    /// One customer thread.
    ActorId,
    "actor"
);
venue_id!(
    /// A fixed-size group of customers that plays one game together.
    CohortId,
    "cohort"
);
venue_id!(AlleyId, "alley");
venue_id!(ShoePairId, "shoes");
venue_id!(CashierId, "cashier");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_prefix() {
        assert_eq!(ActorId::new(7).to_string(), "actor-7");
        assert_eq!(CohortId::new(1).to_string(), "cohort-1");
        assert_eq!(AlleyId::new(0).to_string(), "alley-0");
        assert_eq!(ShoePairId::new(12).to_string(), "shoes-12");
        assert_eq!(CashierId::new(2).to_string(), "cashier-2");
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        assert_eq!(serde_json::to_string(&CohortId::new(4)).unwrap(), "4");
        assert_eq!(
            serde_json::from_str::<AlleyId>("2").unwrap(),
            AlleyId::new(2)
        );
    }
}
