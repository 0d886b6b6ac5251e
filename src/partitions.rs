//! Enumeration of set partitions and of disjoint groupings of input vectors.
//!
//! A *partition* splits all of `0..n_items` into exactly `groups` non-empty
//! disjoint blocks. A *grouping* does the same for some subset of the items,
//! so inputs may be left out. The [`VariableBuilder`](crate::builder) feeds
//! each block of a grouping into a vector sum and hands the sums to a
//! quantity function, so the groupings enumerate every distinct candidate
//! argument list of a given arity.

/// Enumerate the partitions of `0..n_items` into exactly `groups` non-empty
/// disjoint blocks.
///
/// Blocks are ordered by their smallest element and items within a block are
/// ascending, so the output is deterministic and free of duplicates. The
/// number of partitions is the Stirling number of the second kind
/// `S(n_items, groups)`.
pub fn partitions(n_items: usize, groups: usize) -> Vec<Vec<Vec<usize>>> {
    if groups == 0 || groups > n_items {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut blocks: Vec<Vec<usize>> = Vec::new();
    extend_partition(n_items, groups, 0, &mut blocks, &mut out);
    out
}

fn extend_partition(
    n_items: usize,
    groups: usize,
    item: usize,
    blocks: &mut Vec<Vec<usize>>,
    out: &mut Vec<Vec<Vec<usize>>>,
) {
    if item == n_items {
        if blocks.len() == groups {
            out.push(blocks.clone());
        }
        return;
    }
    // the remaining items must still be able to fill all `groups` blocks
    let remaining = n_items - item;
    for i in 0..blocks.len() {
        if blocks.len() + remaining > groups {
            blocks[i].push(item);
            extend_partition(n_items, groups, item + 1, blocks, out);
            blocks[i].pop();
        }
    }
    if blocks.len() < groups {
        blocks.push(vec![item]);
        extend_partition(n_items, groups, item + 1, blocks, out);
        blocks.pop();
    }
}

/// Enumerate the groupings of `0..n_items` into exactly `groups` non-empty
/// disjoint blocks, where not every item has to be used.
///
/// This is the union of [`partitions`] over every subset of the items with at
/// least `groups` elements. With `groups == 1` it reduces to the non-empty
/// subsets of the items.
pub fn groupings(n_items: usize, groups: usize) -> Vec<Vec<Vec<usize>>> {
    if groups == 0 || groups > n_items {
        return Vec::new();
    }
    let mut out = Vec::new();
    for mask in 1u64..(1 << n_items) {
        let subset: Vec<usize> = (0..n_items).filter(|i| mask & (1 << i) != 0).collect();
        if subset.len() < groups {
            continue;
        }
        for partition in partitions(subset.len(), groups) {
            out.push(
                partition
                    .into_iter()
                    .map(|block| block.into_iter().map(|i| subset[i]).collect())
                    .collect(),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use factorial::Factorial;

    use super::*;

    // closed form for the Stirling number of the second kind
    fn stirling2(n: u64, k: u64) -> u64 {
        let mut total: i64 = 0;
        for i in 0..=k {
            let binom = (k.factorial() / (i.factorial() * (k - i).factorial())) as i64;
            let term = binom * ((k - i) as i64).pow(n as u32);
            total += if i % 2 == 0 { term } else { -term };
        }
        (total as u64) / k.factorial()
    }

    fn binomial(n: u64, k: u64) -> u64 {
        n.factorial() / (k.factorial() * (n - k).factorial())
    }

    #[test]
    fn three_into_two() {
        assert_eq!(
            partitions(3, 2),
            vec![
                vec![vec![0, 1], vec![2]],
                vec![vec![0, 2], vec![1]],
                vec![vec![0], vec![1, 2]],
            ]
        );
    }

    #[test]
    fn partition_counts_match_stirling_numbers() {
        for n in 1..=6u64 {
            for k in 1..=n {
                assert_eq!(
                    partitions(n as usize, k as usize).len() as u64,
                    stirling2(n, k),
                    "S({n}, {k})"
                );
            }
        }
    }

    #[test]
    fn blocks_are_disjoint_and_cover() {
        for partition in partitions(5, 3) {
            let mut seen = BTreeSet::new();
            for block in &partition {
                assert!(!block.is_empty());
                for &item in block {
                    assert!(seen.insert(item), "item {item} appears twice");
                }
            }
            assert_eq!(seen, (0..5).collect::<BTreeSet<_>>());
        }
    }

    #[test]
    fn partitions_are_unique_and_deterministic() {
        let first = partitions(6, 3);
        let unique: BTreeSet<_> = first.iter().cloned().collect();
        assert_eq!(unique.len(), first.len());
        assert_eq!(partitions(6, 3), first);
    }

    #[test]
    fn degenerate_arguments() {
        assert!(partitions(3, 0).is_empty());
        assert!(partitions(2, 3).is_empty());
        assert_eq!(partitions(4, 1), vec![vec![vec![0, 1, 2, 3]]]);
        assert_eq!(partitions(1, 1), vec![vec![vec![0]]]);
        assert_eq!(partitions(4, 4).len(), 1);
    }

    #[test]
    fn groupings_of_one_block_are_the_subsets() {
        let single = groupings(3, 1);
        assert_eq!(single.len(), 7);
        let subsets: BTreeSet<Vec<usize>> =
            single.into_iter().map(|mut g| g.pop().unwrap()).collect();
        assert_eq!(subsets.len(), 7);
    }

    #[test]
    fn grouping_counts() {
        // sum over subset sizes of C(n, s) * S(s, g)
        for n in 1..=5u64 {
            for g in 1..=n {
                let expected: u64 = (g..=n).map(|s| binomial(n, s) * stirling2(s, g)).sum();
                assert_eq!(groupings(n as usize, g as usize).len() as u64, expected);
            }
        }
    }

    #[test]
    fn groupings_are_unique_and_leave_items_out() {
        let all = groupings(4, 2);
        let unique: BTreeSet<_> = all.iter().cloned().collect();
        assert_eq!(unique.len(), all.len());
        assert!(all
            .iter()
            .any(|g| g.iter().map(Vec::len).sum::<usize>() < 4));
    }
}
