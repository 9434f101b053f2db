//! Exponential neighbourhood schedule.
//!
//! `value(n) = target + (init - target) * exp(-lambda * n)` moves from `init`
//! towards `target` as the counter `n` grows. The wriggle stage reads one
//! value per sample so its search radius widens with every failure.

#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialSchedule {
    init: f64,
    target: f64,
    lambda: f64,
    counter: u64,
}

impl ExponentialSchedule {
    pub fn new(init: f64, target: f64, lambda: f64) -> Self {
        Self {
            init,
            target,
            lambda,
            counter: 0,
        }
    }

    /// Value at the current counter, without advancing.
    pub fn peek(&self) -> f64 {
        self.target + (self.init - self.target) * (-self.lambda * self.counter as f64).exp()
    }

    /// Advance the counter and return the new value.
    pub fn next(&mut self) -> f64 {
        self.counter += 1;
        self.peek()
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_init() {
        let s = ExponentialSchedule::new(0.0, 1.0, 1e-4);
        assert_eq!(s.peek(), 0.0);
    }

    #[test]
    fn grows_towards_target() {
        let mut s = ExponentialSchedule::new(0.0, 1.0, 0.5);
        let mut previous = s.peek();
        for _ in 0..50 {
            let v = s.next();
            assert!(v > previous && v < 1.0);
            previous = v;
        }
        assert!(1.0 - previous < 1e-9);
        assert_eq!(s.counter(), 50);
    }

    #[test]
    fn reset_rewinds() {
        let mut s = ExponentialSchedule::new(2.0, 0.0, 1.0);
        s.next();
        s.next();
        s.reset();
        assert_eq!(s.counter(), 0);
        assert_eq!(s.peek(), 2.0);
    }
}
