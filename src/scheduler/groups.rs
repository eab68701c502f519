/// Partition `total` attendees into groups of 6, 5 and 4.
///
/// Minimises the number of size-4 groups; ties go to the most size-6 groups,
/// then the most size-5. `None` when no combination of 4/5/6 sums to total.
pub fn split_groups(total: usize) -> Option<Vec<usize>> {
    let mut best: Option<(usize, Vec<usize>)> = None;

    for n6 in (0..=total / 6).rev() {
        let rem = total - n6 * 6;
        for n5 in (0..=rem / 5).rev() {
            let rem2 = rem - n5 * 5;
            if rem2 % 4 != 0 {
                continue;
            }
            let n4 = rem2 / 4;
            if best.as_ref().is_none_or(|(best_n4, _)| n4 < *best_n4) {
                let mut sizes = vec![6; n6];
                sizes.extend(std::iter::repeat_n(5, n5));
                sizes.extend(std::iter::repeat_n(4, n4));
                best = Some((n4, sizes));
            }
        }
    }

    best.map(|(_, sizes)| sizes)
}
