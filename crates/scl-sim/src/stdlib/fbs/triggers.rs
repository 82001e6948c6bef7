/// Rising edge detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RTrig {
    clk: bool,
    q: bool,
    prev: bool,
}

impl RTrig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clk: false,
            q: false,
            prev: false,
        }
    }

    pub fn step(&mut self, clk: bool) -> bool {
        self.clk = clk;
        self.q = clk && !self.prev;
        self.prev = clk;
        self.q
    }

    #[must_use]
    pub fn clk(&self) -> bool {
        self.clk
    }

    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    pub(super) fn set_clk(&mut self, clk: bool) {
        self.clk = clk;
    }
}

impl Default for RTrig {
    fn default() -> Self {
        Self::new()
    }
}

/// Falling edge detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FTrig {
    clk: bool,
    q: bool,
    prev: bool,
}

impl FTrig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clk: false,
            q: false,
            prev: false,
        }
    }

    pub fn step(&mut self, clk: bool) -> bool {
        self.clk = clk;
        self.q = !clk && self.prev;
        self.prev = clk;
        self.q
    }

    #[must_use]
    pub fn clk(&self) -> bool {
        self.clk
    }

    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    pub(super) fn set_clk(&mut self, clk: bool) {
        self.clk = clk;
    }
}

impl Default for FTrig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_edge_fires_once() {
        let mut trig = RTrig::new();
        let outputs: Vec<_> = [false, false, true, true]
            .into_iter()
            .map(|clk| trig.step(clk))
            .collect();
        assert_eq!(outputs, vec![false, false, true, false]);
    }

    #[test]
    fn falling_edge_ignores_initial_low() {
        let mut trig = FTrig::new();
        let outputs: Vec<_> = [false, true, false, false]
            .into_iter()
            .map(|clk| trig.step(clk))
            .collect();
        assert_eq!(outputs, vec![false, false, true, false]);
    }
}
