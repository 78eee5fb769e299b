//! A fixed-capacity container that keeps the `k` least elements pushed into it.
use std::cmp::Ordering;

/// Retains the `capacity` least elements under `less`, backed by a bounded
/// max-heap.
///
/// [`RankedSet::top`] is the worst retained element, which is the current
/// cull threshold of a k-nearest-neighbour search once the set is full.
///
/// # Examples
///
/// ```rust
/// use pointkd::ranked_set::RankedSet;
///
/// let mut set = RankedSet::new(3);
/// for x in [5, 1, 9, 3, 7, 2] {
///     set.push(x);
/// }
/// assert_eq!(set.top(), Some(&3));
/// assert_eq!(set.release(true), vec![1, 2, 3]);
/// assert!(set.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct RankedSet<T, L = fn(&T, &T) -> bool> {
    heap: Vec<T>,
    capacity: usize,
    less: L,
}

fn partial_less<T: PartialOrd>(a: &T, b: &T) -> bool {
    a < b
}

impl<T: PartialOrd> RankedSet<T> {
    /// Creates a set ordered by `PartialOrd`.
    pub fn new(capacity: usize) -> Self {
        Self::with_less(capacity, partial_less::<T>)
    }
}

impl<T, L: Fn(&T, &T) -> bool> RankedSet<T, L> {
    /// Creates a set ordered by the strict weak order `less`.
    pub fn with_less(capacity: usize, less: L) -> Self {
        RankedSet {
            heap: Vec::with_capacity(capacity),
            capacity,
            less,
        }
    }

    /// Maximum number of retained elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained elements.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns true if `capacity` elements are retained.
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// The worst retained element.
    pub fn top(&self) -> Option<&T> {
        self.heap.first()
    }

    /// Offers an element to the set. Returns true if it was retained, evicting
    /// the worst element if the set was full.
    pub fn push(&mut self, element: T) -> bool {
        if self.capacity == 0 {
            return false;
        }

        if self.heap.len() < self.capacity {
            self.heap.push(element);
            self.sift_up(self.heap.len() - 1);
            return true;
        }

        if (self.less)(&element, &self.heap[0]) {
            self.heap[0] = element;
            self.sift_down(0);
            true
        } else {
            false
        }
    }

    /// Drains the set, ascending under `less` if `sorted`, otherwise in heap
    /// order. The set is left empty.
    pub fn release(&mut self, sorted: bool) -> Vec<T> {
        let mut elements = std::mem::take(&mut self.heap);
        if sorted {
            let less = &self.less;
            elements.sort_by(|a, b| {
                if less(a, b) {
                    Ordering::Less
                } else if less(b, a) {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            });
        }
        elements
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !(self.less)(&self.heap[parent], &self.heap[index]) {
                break;
            }
            self.heap.swap(parent, index);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut largest = left;
            if right < len && (self.less)(&self.heap[left], &self.heap[right]) {
                largest = right;
            }
            if !(self.less)(&self.heap[index], &self.heap[largest]) {
                break;
            }
            self.heap.swap(index, largest);
            index = largest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rstest::rstest;

    #[rstest]
    #[case(1, 10)]
    #[case(5, 100)]
    #[case(32, 1000)]
    #[case(50, 20)]
    fn retains_the_k_smallest(#[case] k: usize, #[case] n: usize) {
        let mut rng = rand::rng();
        let values: Vec<f64> = (0..n).map(|_| rng.random_range(-1000f64..1000f64)).collect();

        let mut set = RankedSet::new(k);
        for &v in &values {
            set.push(v);
        }

        let mut expected = values.clone();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        expected.truncate(k);

        assert_eq!(set.len(), expected.len());
        assert_eq!(set.top(), expected.last());
        assert_eq!(set.release(true), expected);
        assert!(set.is_empty());
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let mut set = RankedSet::new(0);
        assert!(!set.push(1));
        assert!(set.is_full());
        assert_eq!(set.top(), None);
        assert!(set.release(true).is_empty());
    }

    #[test]
    fn push_reports_rejection_when_full() {
        let mut set = RankedSet::new(2);
        assert!(set.push(3));
        assert!(set.push(1));
        assert!(set.is_full());
        assert!(!set.push(5));
        assert!(!set.push(3));
        assert!(set.push(2));
        assert_eq!(set.top(), Some(&2));
    }

    #[test]
    fn custom_order_keeps_the_largest() {
        let mut set = RankedSet::with_less(3, |a: &i32, b: &i32| a > b);
        for x in [4, 8, 1, 9, 2, 7] {
            set.push(x);
        }
        assert_eq!(set.release(true), vec![9, 8, 7]);
    }

    #[test]
    fn release_unsorted_returns_same_elements() {
        let mut set = RankedSet::new(4);
        for x in [10, 3, 6, 1, 8, 2] {
            set.push(x);
        }
        let mut released = set.release(false);
        released.sort();
        assert_eq!(released, vec![1, 2, 3, 6]);
    }
}
