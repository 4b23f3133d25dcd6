use std::sync::atomic::{AtomicU64, Ordering};

/// An `f64` stored as its bit pattern in an `AtomicU64`.
///
/// Every read-modify-write operation is a compare-and-swap retry loop: each failed exchange
/// re-reads the current value and recomputes, so one thread always makes progress.
#[derive(Debug)]
pub(crate) struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub(crate) fn new(value: f64) -> AtomicF64 {
        AtomicF64 {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub(crate) fn load(&self) -> f64 { f64::from_bits(self.bits.load(Ordering::Acquire)) }

    pub(crate) fn store(&self, value: f64) { self.bits.store(value.to_bits(), Ordering::Release); }

    /// Adds `delta`, returning the previous value.
    pub(crate) fn fetch_add(&self, delta: f64) -> f64 { self.fetch_update(|current| Some(current + delta)) }

    /// Multiplies by `factor`, returning the previous value.
    pub(crate) fn fetch_mul(&self, factor: f64) -> f64 { self.fetch_update(|current| Some(current * factor)) }

    /// Lowers the stored value to `value` if `value` is smaller.
    pub(crate) fn fetch_min(&self, value: f64) -> f64 {
        self.fetch_update(|current| if value < current { Some(value) } else { None })
    }

    /// Raises the stored value to `value` if `value` is larger.
    pub(crate) fn fetch_max(&self, value: f64) -> f64 {
        self.fetch_update(|current| if value > current { Some(value) } else { None })
    }

    fn fetch_update<F>(&self, f: F) -> f64
    where
        F: Fn(f64) -> Option<f64>,
    {
        let mut current_bits = self.bits.load(Ordering::Acquire);
        loop {
            let current = f64::from_bits(current_bits);
            let next = match f(current) {
                Some(next) => next,
                None => return current,
            };

            match self
                .bits
                .compare_exchange_weak(current_bits, next.to_bits(), Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return current,
                Err(actual) => current_bits = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AtomicF64;
    use std::{sync::Arc, thread};

    #[test]
    fn test_atomic_f64_arithmetic() {
        let value = AtomicF64::new(1.0);
        assert_eq!(value.fetch_add(2.5), 1.0);
        assert_eq!(value.fetch_mul(2.0), 3.5);
        assert_eq!(value.load(), 7.0);
    }

    #[test]
    fn test_atomic_f64_min_max() {
        let min = AtomicF64::new(std::f64::INFINITY);
        min.fetch_min(4.0);
        min.fetch_min(9.0);
        min.fetch_min(-1.0);
        assert_eq!(min.load(), -1.0);

        let max = AtomicF64::new(std::f64::NEG_INFINITY);
        max.fetch_max(4.0);
        max.fetch_max(9.0);
        max.fetch_max(-1.0);
        assert_eq!(max.load(), 9.0);
    }

    #[test]
    fn test_atomic_f64_concurrent_add() {
        let value = Arc::new(AtomicF64::new(0.0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let value = Arc::clone(&value);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        value.fetch_add(1.0);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Integral values sum exactly regardless of interleaving.
        assert_eq!(value.load(), 8000.0);
    }
}
