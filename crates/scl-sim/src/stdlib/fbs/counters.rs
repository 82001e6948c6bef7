#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterOutput {
    pub q: bool,
    pub cv: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterUpDownOutput {
    pub qu: bool,
    pub qd: bool,
    pub cv: i32,
}

/// Up counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ctu {
    pub(super) cu: bool,
    pub(super) r: bool,
    pub(super) pv: i32,
    q: bool,
    cv: i32,
    prev_cu: bool,
}

impl Ctu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cu: false,
            r: false,
            pv: 0,
            q: false,
            cv: 0,
            prev_cu: false,
        }
    }

    pub fn step(&mut self, cu: bool, r: bool, pv: i32) -> CounterOutput {
        self.cu = cu;
        self.r = r;
        self.pv = pv;
        if r {
            self.cv = 0;
        } else if cu && !self.prev_cu {
            self.cv = self.cv.saturating_add(1);
        }
        self.prev_cu = cu;
        self.q = self.cv >= pv;
        CounterOutput {
            q: self.q,
            cv: self.cv,
        }
    }

    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    #[must_use]
    pub fn cv(&self) -> i32 {
        self.cv
    }
}

impl Default for Ctu {
    fn default() -> Self {
        Self::new()
    }
}

/// Down counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ctd {
    pub(super) cd: bool,
    pub(super) ld: bool,
    pub(super) pv: i32,
    q: bool,
    cv: i32,
    prev_cd: bool,
}

impl Ctd {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cd: false,
            ld: false,
            pv: 0,
            q: false,
            cv: 0,
            prev_cd: false,
        }
    }

    pub fn step(&mut self, cd: bool, ld: bool, pv: i32) -> CounterOutput {
        self.cd = cd;
        self.ld = ld;
        self.pv = pv;
        if ld {
            self.cv = pv;
        } else if cd && !self.prev_cd {
            self.cv = self.cv.saturating_sub(1);
        }
        self.prev_cd = cd;
        self.q = self.cv <= 0;
        CounterOutput {
            q: self.q,
            cv: self.cv,
        }
    }

    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    #[must_use]
    pub fn cv(&self) -> i32 {
        self.cv
    }
}

impl Default for Ctd {
    fn default() -> Self {
        Self::new()
    }
}

/// Up/down counter. Simultaneous edges on CU and CD cancel out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ctud {
    pub(super) cu: bool,
    pub(super) cd: bool,
    pub(super) r: bool,
    pub(super) ld: bool,
    pub(super) pv: i32,
    qu: bool,
    qd: bool,
    cv: i32,
    prev_cu: bool,
    prev_cd: bool,
}

impl Ctud {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cu: false,
            cd: false,
            r: false,
            ld: false,
            pv: 0,
            qu: false,
            qd: false,
            cv: 0,
            prev_cu: false,
            prev_cd: false,
        }
    }

    pub fn step(&mut self, cu: bool, cd: bool, r: bool, ld: bool, pv: i32) -> CounterUpDownOutput {
        self.cu = cu;
        self.cd = cd;
        self.r = r;
        self.ld = ld;
        self.pv = pv;
        if r {
            self.cv = 0;
        } else if ld {
            self.cv = pv;
        } else {
            if cu && !self.prev_cu {
                self.cv = self.cv.saturating_add(1);
            }
            if cd && !self.prev_cd {
                self.cv = self.cv.saturating_sub(1);
            }
        }
        self.prev_cu = cu;
        self.prev_cd = cd;
        self.qu = self.cv >= pv;
        self.qd = self.cv <= 0;
        CounterUpDownOutput {
            qu: self.qu,
            qd: self.qd,
            cv: self.cv,
        }
    }

    #[must_use]
    pub fn qu(&self) -> bool {
        self.qu
    }

    #[must_use]
    pub fn qd(&self) -> bool {
        self.qd
    }

    #[must_use]
    pub fn cv(&self) -> i32 {
        self.cv
    }
}

impl Default for Ctud {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctu_counts_rising_edges_only() {
        let mut ctu = Ctu::new();
        ctu.step(true, false, 2);
        ctu.step(true, false, 2);
        let out = ctu.step(false, false, 2);
        assert_eq!(out, CounterOutput { q: false, cv: 1 });
        let out = ctu.step(true, false, 2);
        assert_eq!(out, CounterOutput { q: true, cv: 2 });
        let out = ctu.step(true, true, 2);
        assert_eq!(out, CounterOutput { q: false, cv: 0 });
    }

    #[test]
    fn ctd_load_then_count_down() {
        let mut ctd = Ctd::new();
        assert_eq!(ctd.step(false, true, 2).cv, 2);
        ctd.step(true, false, 2);
        ctd.step(false, false, 2);
        let out = ctd.step(true, false, 2);
        assert_eq!(out, CounterOutput { q: true, cv: 0 });
    }

    #[test]
    fn ctud_edges_cancel() {
        let mut ctud = Ctud::new();
        let out = ctud.step(true, true, false, false, 1);
        assert_eq!(out.cv, 0);
        assert!(out.qd);
        ctud.step(false, false, false, false, 1);
        let out = ctud.step(true, false, false, false, 1);
        assert_eq!(
            out,
            CounterUpDownOutput {
                qu: true,
                qd: false,
                cv: 1
            }
        );
    }
}
