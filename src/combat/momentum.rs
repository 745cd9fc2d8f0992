//! Momentum resource (0 to 100), built by katana play and spent by finishers

use serde::{Deserialize, Serialize};

pub const MAX_MOMENTUM: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Momentum {
    pub current: u32,
}

impl Momentum {
    pub fn add(&mut self, amount: u32) -> u32 {
        self.current = (self.current + amount).min(MAX_MOMENTUM);
        self.current
    }

    /// Spend everything if at least `threshold` is banked
    pub fn spend_all(&mut self, threshold: u32) -> Option<u32> {
        if self.current < threshold {
            return None;
        }
        Some(std::mem::take(&mut self.current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_caps_at_max() {
        let mut m = Momentum::default();
        m.add(80);
        assert_eq!(m.add(40), MAX_MOMENTUM);
    }

    #[test]
    fn test_spend_requires_threshold() {
        let mut m = Momentum { current: 25 };
        assert_eq!(m.spend_all(30), None);
        assert_eq!(m.current, 25);
        m.add(10);
        assert_eq!(m.spend_all(30), Some(35));
        assert_eq!(m.current, 0);
    }
}
