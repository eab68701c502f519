use rand::RngCore;
use rand::seq::SliceRandom;

/// Two doubles teams, as indices into a group's seeded member list.
pub type Pairing = ([usize; 2], [usize; 2]);

/// Balanced rotation for a four-player group: strongest seed partnered with
/// the weakest first, every partner combination covered once per cycle.
pub const BALANCED_FOUR: [Pairing; 3] = [
    ([0, 3], [1, 2]),
    ([0, 2], [1, 3]),
    ([0, 1], [2, 3]),
];

/// Fixed opening schedule per group size.
pub fn canonical_pairings(size: usize) -> Vec<Pairing> {
    match size {
        4 => vec![([0, 1], [2, 3]), ([0, 2], [1, 3]), ([0, 3], [1, 2])],
        5 => vec![
            ([0, 1], [2, 3]),
            ([0, 2], [3, 4]),
            ([0, 3], [1, 4]),
            ([0, 4], [1, 2]),
            ([1, 3], [2, 4]),
        ],
        6 => vec![
            ([0, 1], [2, 3]),
            ([0, 4], [1, 5]),
            ([2, 4], [3, 5]),
            ([0, 2], [4, 5]),
            ([1, 3], [2, 5]),
            ([0, 3], [1, 4]),
        ],
        _ => Vec::new(),
    }
}

/// Cycle `BALANCED_FOUR` until each of the four players reaches `target`
/// games, truncated to exactly `target` matches.
pub fn balanced_matches_of_four(target: i64) -> Vec<Pairing> {
    let needed = target.max(0) as usize;
    let mut matches: Vec<Pairing> = Vec::with_capacity(needed + BALANCED_FOUR.len());
    while matches.len() < needed {
        matches.extend_from_slice(&BALANCED_FOUR);
    }
    matches.truncate(needed);
    matches
}

/// Canonical schedule topped up with randomly drawn four-player pairings
/// until the average games per player reaches `target`.
pub fn filled_matches(size: usize, target: i64, rng: &mut dyn RngCore) -> Vec<Pairing> {
    debug_assert!((4..=6).contains(&size));
    let mut matches = canonical_pairings(size);

    // average games per player = matches * 4 / size
    while ((matches.len() * 4) as i64) < target * size as i64 {
        let mut order: Vec<usize> = (0..size).collect();
        order.shuffle(rng);
        matches.push(([order[0], order[1]], [order[2], order[3]]));
    }
    matches
}
