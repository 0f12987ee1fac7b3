//! Zhang–Shasha tree edit distance with mapping recovery.
//!
//! Unit costs: insert 1, delete 1, rename 0 or 1. Indices inside this
//! module are 1-based post-order positions; the public surface speaks in
//! arena (pre-order) ids.

use crate::tree::LabeledTree;

struct Postorder {
    /// Arena id of each post-order position (`ids[k - 1]`).
    ids: Vec<usize>,
    /// Leftmost leaf descendant of each post-order position; index 0 unused.
    lmd: Vec<usize>,
    keyroots: Vec<usize>,
}

impl Postorder {
    fn new(tree: &LabeledTree) -> Self {
        let n = tree.len();
        let mut ids = Vec::with_capacity(n);
        if n > 0 {
            // Iterative post-order from the root.
            let mut stack = vec![(0usize, false)];
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    ids.push(id);
                } else {
                    stack.push((id, true));
                    for &child in tree.nodes[id].children.iter().rev() {
                        stack.push((child, false));
                    }
                }
            }
        }

        let mut position = vec![0usize; n];
        for (k, &id) in ids.iter().enumerate() {
            position[id] = k + 1;
        }
        let mut lmd = vec![0usize; n + 1];
        for k in 1..=n {
            lmd[k] = match tree.nodes[ids[k - 1]].children.first() {
                Some(&first) => lmd[position[first]],
                None => k,
            };
        }

        let mut seen = vec![false; n + 1];
        let mut keyroots = Vec::new();
        for k in (1..=n).rev() {
            if !seen[lmd[k]] {
                seen[lmd[k]] = true;
                keyroots.push(k);
            }
        }
        keyroots.reverse();

        Self { ids, lmd, keyroots }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Distance computation between two trees.
pub(crate) struct TreeDistance<F> {
    a: Postorder,
    b: Postorder,
    td: Vec<Vec<usize>>,
    rename_cost: F,
}

impl<F: Fn(usize, usize) -> usize> TreeDistance<F> {
    /// `rename_cost` takes arena ids of a node in `a` and a node in `b`.
    pub(crate) fn new(a: &LabeledTree, b: &LabeledTree, rename_cost: F) -> Self {
        let a = Postorder::new(a);
        let b = Postorder::new(b);
        let td = vec![vec![0; b.len() + 1]; a.len() + 1];
        let mut this = Self {
            a,
            b,
            td,
            rename_cost,
        };
        for ai in 0..this.a.keyroots.len() {
            for bi in 0..this.b.keyroots.len() {
                let (i, j) = (this.a.keyroots[ai], this.b.keyroots[bi]);
                this.forest_distance(i, j);
            }
        }
        this
    }

    pub(crate) fn distance(&self) -> usize {
        self.td[self.a.len()][self.b.len()]
    }

    /// Fill the forest distance table for the subtrees rooted at `i` and
    /// `j`, recording tree distances along the way.
    fn forest_distance(&mut self, i: usize, j: usize) -> Vec<Vec<usize>> {
        let (li, lj) = (self.a.lmd[i], self.b.lmd[j]);
        let mut fd = vec![vec![0usize; j - lj + 2]; i - li + 2];
        for x in li..=i {
            fd[x - li + 1][0] = fd[x - li][0] + 1;
        }
        for y in lj..=j {
            fd[0][y - lj + 1] = fd[0][y - lj] + 1;
        }
        for x in li..=i {
            for y in lj..=j {
                let (r, c) = (x - li + 1, y - lj + 1);
                let delete = fd[r - 1][c] + 1;
                let insert = fd[r][c - 1] + 1;
                if self.a.lmd[x] == li && self.b.lmd[y] == lj {
                    let rename = fd[r - 1][c - 1]
                        + (self.rename_cost)(self.a.ids[x - 1], self.b.ids[y - 1]);
                    fd[r][c] = delete.min(insert).min(rename);
                    self.td[x][y] = fd[r][c];
                } else {
                    let (p, q) = (self.a.lmd[x] - li, self.b.lmd[y] - lj);
                    fd[r][c] = delete.min(insert).min(fd[p][q] + self.td[x][y]);
                }
            }
        }
        fd
    }

    /// An optimal mapping as `(a_id, b_id)` pairs of arena ids.
    pub(crate) fn mapping(&mut self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        if self.a.len() == 0 || self.b.len() == 0 {
            return pairs;
        }
        let mut pending = vec![(self.a.len(), self.b.len())];
        while let Some((i, j)) = pending.pop() {
            let fd = self.forest_distance(i, j);
            let (li, lj) = (self.a.lmd[i], self.b.lmd[j]);
            let (mut x, mut y) = (i, j);
            while x >= li || y >= lj {
                let (r, c) = (x + 1 - li, y + 1 - lj);
                if x >= li && fd[r][c] == fd[r - 1][c] + 1 {
                    x -= 1;
                } else if y >= lj && fd[r][c] == fd[r][c - 1] + 1 {
                    y -= 1;
                } else if self.a.lmd[x] == li && self.b.lmd[y] == lj {
                    pairs.push((self.a.ids[x - 1], self.b.ids[y - 1]));
                    x -= 1;
                    y -= 1;
                } else {
                    pending.push((x, y));
                    x = self.a.lmd[x] - 1;
                    y = self.b.lmd[y] - 1;
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::labels_match;
    use veil_envelope::Envelope;

    fn distance(a: &Envelope, b: &Envelope) -> (usize, Vec<(usize, usize)>) {
        let (ta, tb) = (LabeledTree::from_envelope(a), LabeledTree::from_envelope(b));
        let mut ted = TreeDistance::new(&ta, &tb, |x, y| {
            usize::from(!labels_match(&ta.nodes[x], &tb.nodes[y]))
        });
        let d = ted.distance();
        (d, ted.mapping())
    }

    #[test]
    fn test_identical_trees() {
        let e = Envelope::new("Alice").add_assertion("knows", "Bob");
        let (d, mapping) = distance(&e, &e);
        assert_eq!(d, 0);
        assert_eq!(mapping.len(), 4);
        assert!(mapping.iter().all(|(x, y)| x == y));
    }

    #[test]
    fn test_single_rename() {
        let a = Envelope::new("Alice").add_assertion("knows", "Bob");
        let b = Envelope::new("Alice").add_assertion("knows", "Carol");
        let (d, mapping) = distance(&a, &b);
        assert_eq!(d, 1);
        assert_eq!(mapping.len(), 4);
    }

    #[test]
    fn test_added_assertion() {
        let a = Envelope::new("Alice");
        let b = Envelope::new("Alice").add_assertion("knows", "Bob");
        let (d, mapping) = distance(&a, &b);
        assert_eq!(d, 3);
        assert_eq!(mapping, vec![(0, 0)]);
    }

    #[test]
    fn test_elided_counterpart_is_free() {
        let a = Envelope::new("Alice").add_assertion("knows", "Bob");
        let b = a.elide_removing_target(&Envelope::new("Bob"));
        let (d, mapping) = distance(&a, &b);
        assert_eq!(d, 0);
        assert_eq!(mapping.len(), 4);
    }

    #[test]
    fn test_mapping_cost_matches_distance() {
        let a = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion("age", 30u64)
            .wrap();
        let b = Envelope::new("Alicia")
            .add_assertion("knows", "Bob")
            .add_assertion("likes", "tea");
        let (ta, tb) = (LabeledTree::from_envelope(&a), LabeledTree::from_envelope(&b));
        let cost = |x: usize, y: usize| usize::from(!labels_match(&ta.nodes[x], &tb.nodes[y]));
        let mut ted = TreeDistance::new(&ta, &tb, cost);
        let d = ted.distance();
        let mapping = ted.mapping();

        let renames: usize = mapping.iter().map(|&(x, y)| cost(x, y)).sum();
        let deletes = ta.len() - mapping.len();
        let inserts = tb.len() - mapping.len();
        assert_eq!(renames + deletes + inserts, d);
    }
}
