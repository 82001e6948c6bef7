/// Set-dominant latch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sr {
    s1: bool,
    r: bool,
    q1: bool,
}

impl Sr {
    #[must_use]
    pub fn new() -> Self {
        Self {
            s1: false,
            r: false,
            q1: false,
        }
    }

    pub fn step(&mut self, s1: bool, r: bool) -> bool {
        self.s1 = s1;
        self.r = r;
        self.q1 = s1 || (self.q1 && !r);
        self.q1
    }

    #[must_use]
    pub fn s1(&self) -> bool {
        self.s1
    }

    #[must_use]
    pub fn r(&self) -> bool {
        self.r
    }

    #[must_use]
    pub fn q1(&self) -> bool {
        self.q1
    }

    pub(super) fn set_inputs(&mut self, s1: bool, r: bool) {
        self.s1 = s1;
        self.r = r;
    }
}

impl Default for Sr {
    fn default() -> Self {
        Self::new()
    }
}

/// Reset-dominant latch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rs {
    s: bool,
    r1: bool,
    q1: bool,
}

impl Rs {
    #[must_use]
    pub fn new() -> Self {
        Self {
            s: false,
            r1: false,
            q1: false,
        }
    }

    pub fn step(&mut self, s: bool, r1: bool) -> bool {
        self.s = s;
        self.r1 = r1;
        self.q1 = (s || self.q1) && !r1;
        self.q1
    }

    #[must_use]
    pub fn s(&self) -> bool {
        self.s
    }

    #[must_use]
    pub fn r1(&self) -> bool {
        self.r1
    }

    #[must_use]
    pub fn q1(&self) -> bool {
        self.q1
    }

    pub(super) fn set_inputs(&mut self, s: bool, r1: bool) {
        self.s = s;
        self.r1 = r1;
    }
}

impl Default for Rs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_input_wins() {
        let mut sr = Sr::new();
        assert!(sr.step(true, true));
        assert!(sr.step(false, false));
        assert!(!sr.step(false, true));

        let mut rs = Rs::new();
        assert!(!rs.step(true, true));
        assert!(rs.step(true, false));
        assert!(rs.step(false, false));
        assert!(!rs.step(false, true));
    }
}
