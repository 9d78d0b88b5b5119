//! A Fibonacci heap whose nodes live in a flat arena and are addressed by
//! index rather than by pointer or `Rc`. Mirrors the structure in Cormen,
//! Leiserson & Rivest, chapter 21: `insert` and `decrease_key` run in
//! O(1) amortized time, `remove_min` in O(log n) amortized time via
//! consolidation.
//!
//! Keys are compared as fixed-point values scaled by [`KEY_SCALE`] so
//! that two keys within float noise of each other compare equal, with
//! ties broken in favor of the *larger* secondary key. This matches the
//! ordering a caller gets by comparing `g + h` rounded to five decimal
//! places, then `g` descending.

/// An index into a [`FibonacciHeap`]'s arena. Stable for the lifetime of
/// the heap: nodes are never physically removed, only unlinked from the
/// tree structure, so a handle returned by `insert` remains valid for use
/// with `decrease_key` even after the node has been popped by
/// `remove_min`.
pub type Handle = usize;

const KEY_SCALE: f64 = 100_000.0;

#[inline]
fn scaled(v: f64) -> i64 {
    (v * KEY_SCALE).round() as i64
}

struct FibNode<T> {
    data: T,
    parent: Option<Handle>,
    child: Option<Handle>,
    left: Handle,
    right: Handle,
    key: f64,
    secondary_key: f64,
    degree: usize,
    mark: bool,
    in_heap: bool,
}

impl<T> FibNode<T> {
    fn new(data: T, self_handle: Handle) -> Self {
        Self {
            data,
            parent: None,
            child: None,
            left: self_handle,
            right: self_handle,
            key: 0.0,
            secondary_key: 0.0,
            degree: 0,
            mark: false,
            in_heap: true,
        }
    }
}

fn less_than(a: &FibNode<impl Sized>, b: &FibNode<impl Sized>) -> bool {
    let ak = scaled(a.key);
    let bk = scaled(b.key);
    if ak < bk {
        return true;
    }
    if ak == bk {
        return scaled(a.secondary_key) > scaled(b.secondary_key);
    }
    false
}

pub struct FibonacciHeap<T> {
    nodes: Vec<FibNode<T>>,
    min_node: Option<Handle>,
    n_nodes: usize,
}

impl<T> Default for FibonacciHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FibonacciHeap<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            min_node: None,
            n_nodes: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_node.is_none()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n_nodes
    }

    #[inline]
    pub fn get(&self, handle: Handle) -> &T {
        &self.nodes[handle].data
    }

    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> &mut T {
        &mut self.nodes[handle].data
    }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.nodes.get(handle).is_some_and(|n| n.in_heap)
    }

    pub fn peek_min(&self) -> Option<Handle> {
        self.min_node
    }

    /// Inserts `data` with the given primary and secondary key, returning
    /// a stable handle to it. Performs no consolidation; the new node is
    /// simply spliced into the root list.
    pub fn insert(&mut self, data: T, key: f64, secondary_key: f64) -> Handle {
        let handle = self.nodes.len();
        let mut node = FibNode::new(data, handle);
        node.key = key;
        node.secondary_key = secondary_key;
        self.nodes.push(node);

        match self.min_node {
            Some(min) => {
                let min_right = self.nodes[min].right;
                self.nodes[handle].left = min;
                self.nodes[handle].right = min_right;
                self.nodes[min].right = handle;
                self.nodes[min_right].left = handle;
                if less_than(&self.nodes[handle], &self.nodes[min]) {
                    self.min_node = Some(handle);
                }
            }
            None => {
                self.min_node = Some(handle);
            }
        }
        self.n_nodes += 1;
        handle
    }

    /// Removes and returns the handle with the smallest key, consolidating
    /// the root list to keep at most one tree of each degree.
    pub fn remove_min(&mut self) -> Option<Handle> {
        let z = self.min_node?;

        let mut num_kids = self.nodes[z].degree;
        let mut x = self.nodes[z].child;

        while num_kids > 0 {
            let cur = x.expect("degree says a child exists");
            let temp_right = self.nodes[cur].right;

            let cur_left = self.nodes[cur].left;
            let cur_right = self.nodes[cur].right;
            self.nodes[cur_left].right = cur_right;
            self.nodes[cur_right].left = cur_left;

            let min = self.min_node.unwrap();
            let min_right = self.nodes[min].right;
            self.nodes[cur].left = min;
            self.nodes[cur].right = min_right;
            self.nodes[min].right = cur;
            self.nodes[min_right].left = cur;

            self.nodes[cur].parent = None;
            x = Some(temp_right);
            num_kids -= 1;
        }

        let z_left = self.nodes[z].left;
        let z_right = self.nodes[z].right;
        self.nodes[z_left].right = z_right;
        self.nodes[z_right].left = z_left;

        if z == z_right {
            self.min_node = None;
        } else {
            self.min_node = Some(z_right);
            self.consolidate();
        }

        self.n_nodes -= 1;
        self.nodes[z].in_heap = false;
        Some(z)
    }

    /// Decreases the key (and optionally the secondary key) of `handle`,
    /// cutting it from its parent if the heap ordering would otherwise be
    /// violated.
    ///
    /// # Panics
    /// Panics if `key` is greater than the node's current key.
    pub fn decrease_key(&mut self, handle: Handle, key: f64, secondary_key: Option<f64>) {
        if let Some(sk) = secondary_key {
            self.nodes[handle].secondary_key = sk;
        }

        assert!(
            scaled(key) <= scaled(self.nodes[handle].key),
            "decrease_key got a larger key value"
        );

        self.nodes[handle].key = key;
        let parent = self.nodes[handle].parent;
        if let Some(y) = parent {
            if less_than(&self.nodes[handle], &self.nodes[y]) {
                self.cut(handle, y);
                self.cascading_cut(y);
            }
        }

        let min = self.min_node.expect("decrease_key on an empty heap");
        if less_than(&self.nodes[handle], &self.nodes[min]) {
            self.min_node = Some(handle);
        }
    }

    fn cascading_cut(&mut self, y: Handle) {
        let Some(z) = self.nodes[y].parent else {
            return;
        };
        if !self.nodes[y].mark {
            self.nodes[y].mark = true;
        } else {
            self.cut(y, z);
            self.cascading_cut(z);
        }
    }

    fn cut(&mut self, x: Handle, y: Handle) {
        let x_left = self.nodes[x].left;
        let x_right = self.nodes[x].right;
        self.nodes[x_left].right = x_right;
        self.nodes[x_right].left = x_left;
        self.nodes[y].degree -= 1;

        if self.nodes[y].child == Some(x) {
            self.nodes[y].child = if x_right != x { Some(x_right) } else { None };
        }
        if self.nodes[y].degree == 0 {
            self.nodes[y].child = None;
        }

        let min = self.min_node.expect("cut assumes a non-empty heap");
        let min_right = self.nodes[min].right;
        self.nodes[x].left = min;
        self.nodes[x].right = min_right;
        self.nodes[min].right = x;
        self.nodes[min_right].left = x;

        self.nodes[x].parent = None;
        self.nodes[x].mark = false;
    }

    fn link(&mut self, y: Handle, x: Handle) {
        let y_left = self.nodes[y].left;
        let y_right = self.nodes[y].right;
        self.nodes[y_left].right = y_right;
        self.nodes[y_right].left = y_left;

        self.nodes[y].parent = Some(x);

        match self.nodes[x].child {
            None => {
                self.nodes[x].child = Some(y);
                self.nodes[y].left = y;
                self.nodes[y].right = y;
            }
            Some(child) => {
                let child_right = self.nodes[child].right;
                self.nodes[y].left = child;
                self.nodes[y].right = child_right;
                self.nodes[child].right = y;
                self.nodes[child_right].left = y;
            }
        }

        self.nodes[x].degree += 1;
        self.nodes[y].mark = false;
    }

    fn consolidate(&mut self) {
        let one_over_log_phi = 1.0 / (((1.0 + 5.0_f64.sqrt()) / 2.0).ln());
        let array_size = (((self.n_nodes as f64).ln() * one_over_log_phi).floor() as usize) + 1;
        let mut array: Vec<Option<Handle>> = vec![None; array_size];

        let mut num_roots = 0;
        let mut x = self.min_node;
        if let Some(start) = x {
            num_roots += 1;
            x = Some(self.nodes[start].right);
            while x != Some(start) {
                num_roots += 1;
                x = Some(self.nodes[x.unwrap()].right);
            }
        }

        let mut x = self.min_node;
        while num_roots > 0 {
            let cur = x.unwrap();
            let mut d = self.nodes[cur].degree;
            let next = self.nodes[cur].right;

            let mut cur = cur;
            loop {
                let Some(y) = array[d] else { break };
                let (winner, loser) = if less_than(&self.nodes[y], &self.nodes[cur]) {
                    (y, cur)
                } else {
                    (cur, y)
                };
                self.link(loser, winner);
                cur = winner;
                array[d] = None;
                d += 1;
            }
            array[d] = Some(cur);

            x = Some(next);
            num_roots -= 1;
        }

        self.min_node = None;
        for slot in array.into_iter().flatten() {
            match self.min_node {
                None => self.min_node = Some(slot),
                Some(min) => {
                    let slot_left = self.nodes[slot].left;
                    let slot_right = self.nodes[slot].right;
                    self.nodes[slot_left].right = slot_right;
                    self.nodes[slot_right].left = slot_left;

                    let min_right = self.nodes[min].right;
                    self.nodes[slot].left = min;
                    self.nodes[slot].right = min_right;
                    self.nodes[min].right = slot;
                    self.nodes[min_right].left = slot;

                    if less_than(&self.nodes[slot], &self.nodes[min]) {
                        self.min_node = Some(slot);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn remove_min_pops_in_ascending_key_order() {
        let mut heap = FibonacciHeap::new();
        heap.insert("c", 3.0, 0.0);
        heap.insert("a", 1.0, 0.0);
        heap.insert("b", 2.0, 0.0);

        let mut out = Vec::new();
        while let Some(h) = heap.remove_min() {
            out.push(*heap.get(h));
        }
        assert_eq!(out, vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_break_on_larger_secondary_key() {
        let mut heap = FibonacciHeap::new();
        heap.insert("low_g", 5.0, 1.0);
        heap.insert("high_g", 5.0, 9.0);

        let h = heap.remove_min().unwrap();
        assert_eq!(*heap.get(h), "high_g");
    }

    #[test]
    fn decrease_key_can_promote_a_node_to_the_minimum() {
        let mut heap = FibonacciHeap::new();
        heap.insert("a", 10.0, 0.0);
        let b = heap.insert("b", 20.0, 0.0);
        heap.decrease_key(b, 1.0, None);

        let h = heap.remove_min().unwrap();
        assert_eq!(*heap.get(h), "b");
    }

    #[test]
    fn many_inserts_and_removals_preserve_heap_order() {
        let mut heap = FibonacciHeap::new();
        let keys = [5.0, 3.0, 8.0, 1.0, 9.0, 2.0, 7.0, 4.0, 6.0, 0.0];
        for &k in &keys {
            heap.insert(k, k, 0.0);
        }
        let mut out = Vec::new();
        while let Some(h) = heap.remove_min() {
            out.push(*heap.get(h));
        }
        let mut expected = keys.to_vec();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(out, expected);
    }
}
