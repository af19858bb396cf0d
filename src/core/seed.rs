//! Purpose: Startup seeding: a fixed sample record set and reproducible demo data.
//! Exports: `seed_sample`, `seed_demo`, `demo_records`.
//! Role: Fill freshly-initialized stores through the same session path callers use.
//! Invariants: Demo generation is deterministic for a given rng seed.
//! Invariants: Generated emails are unique so seeding never trips the email constraint.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::error::Error;
use crate::core::record::{Order, Record, User};
use crate::core::session::FederatedSession;

const FIRST_NAMES: [&str; 8] = [
    "Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald", "Radia", "Ken",
];
const LAST_NAMES: [&str; 8] = [
    "Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Knuth", "Perlman", "Thompson",
];
const ITEMS: [&str; 3] = ["Phone", "TV", "Computer"];

/// One user and one order, staged and committed through a single session.
pub fn seed_sample(session: &mut FederatedSession) -> Result<(), Error> {
    session.add(User::new("John Doe", "john@example.com"))?;
    session.add(Order::new("Phone", 2))?;
    session.commit()
}

/// `count` users and `count` orders drawn from fixed pools.
pub fn seed_demo(session: &mut FederatedSession, count: usize, rng_seed: u64) -> Result<(), Error> {
    for record in demo_records(count, rng_seed) {
        session.add(record)?;
    }
    session.commit()
}

pub fn demo_records(count: usize, rng_seed: u64) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    let mut records = Vec::with_capacity(count * 2);
    for index in 0..count {
        let first = FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())];
        let last = LAST_NAMES[rng.random_range(0..LAST_NAMES.len())];
        // The index suffix keeps emails unique across repeated name draws.
        let email = format!(
            "{}.{}{}@example.com",
            first.to_lowercase(),
            last.to_lowercase(),
            index
        );
        records.push(Record::User(User::new(format!("{first} {last}"), email)));

        let item = ITEMS[rng.random_range(0..ITEMS.len())];
        let quantity = rng.random_range(1..=10);
        records.push(Record::Order(Order::new(item, quantity)));
    }
    records
}
