//! Union-find over roadmap vertex indices.

/// Disjoint sets with union by rank.
///
/// `find` takes `&self` and does no path compression; union by rank keeps
/// trees logarithmically shallow.
#[derive(Debug, Clone, Default)]
pub struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a singleton set and return its element.
    pub fn make_set(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        self.rank.push(0);
        id
    }

    pub fn find(&self, mut x: usize) -> usize {
        while self.parent[x] != x {
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`. Returns `false` if they were already one.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
        true
    }

    pub fn same_set(&self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of distinct sets.
    pub fn set_count(&self) -> usize {
        (0..self.parent.len()).filter(|&x| self.parent[x] == x).count()
    }

    pub fn clear(&mut self) {
        self.parent.clear();
        self.rank.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_are_disjoint() {
        let mut sets = DisjointSets::new();
        let a = sets.make_set();
        let b = sets.make_set();
        assert!(!sets.same_set(a, b));
        assert_eq!(sets.set_count(), 2);
    }

    #[test]
    fn union_is_transitive() {
        let mut sets = DisjointSets::new();
        let ids: Vec<_> = (0..4).map(|_| sets.make_set()).collect();
        assert!(sets.union(ids[0], ids[1]));
        assert!(sets.union(ids[2], ids[1]));
        assert!(!sets.union(ids[0], ids[2]));
        assert!(sets.same_set(ids[0], ids[2]));
        assert!(!sets.same_set(ids[0], ids[3]));
        assert_eq!(sets.set_count(), 2);
    }

    #[test]
    fn clear_empties() {
        let mut sets = DisjointSets::new();
        sets.make_set();
        sets.clear();
        assert!(sets.is_empty());
    }
}
