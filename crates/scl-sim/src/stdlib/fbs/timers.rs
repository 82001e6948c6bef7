//! IEC timers driven by an absolute millisecond tick.
//!
//! Elapsed time is `min(now - start, PT)`; `now` is read once per scan by the
//! caller, so every timer in a scan sees the same instant.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerOutput {
    pub q: bool,
    pub et: i32,
}

fn elapsed(now: i64, start: i64, pt: i32) -> i32 {
    let delta = now.saturating_sub(start).max(0);
    let capped = delta.min(i64::from(pt));
    i32::try_from(capped).unwrap_or(pt)
}

/// On-delay timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ton {
    pub(super) input: bool,
    pub(super) pt: i32,
    q: bool,
    et: i32,
    start: i64,
    timing: bool,
}

impl Ton {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: false,
            pt: 0,
            q: false,
            et: 0,
            start: 0,
            timing: false,
        }
    }

    pub fn step(&mut self, input: bool, pt: i32, now: i64) -> TimerOutput {
        self.input = input;
        self.pt = pt;
        if input {
            if !self.timing {
                self.start = now;
                self.timing = true;
            }
            self.et = elapsed(now, self.start, pt);
            self.q = self.et >= pt;
        } else {
            self.q = false;
            self.et = 0;
            self.timing = false;
        }
        self.output()
    }

    #[must_use]
    pub fn output(&self) -> TimerOutput {
        TimerOutput {
            q: self.q,
            et: self.et,
        }
    }
}

impl Default for Ton {
    fn default() -> Self {
        Self::new()
    }
}

/// Off-delay timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tof {
    pub(super) input: bool,
    pub(super) pt: i32,
    q: bool,
    et: i32,
    start: i64,
    timing: bool,
}

impl Tof {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: false,
            pt: 0,
            q: false,
            et: 0,
            start: 0,
            timing: false,
        }
    }

    pub fn step(&mut self, input: bool, pt: i32, now: i64) -> TimerOutput {
        self.input = input;
        self.pt = pt;
        if input {
            self.q = true;
            self.et = 0;
            self.timing = false;
        } else {
            if !self.timing && self.q {
                self.start = now;
                self.timing = true;
            }
            if self.timing {
                self.et = elapsed(now, self.start, pt);
                if self.et >= pt {
                    self.q = false;
                    self.timing = false;
                }
            }
        }
        self.output()
    }

    #[must_use]
    pub fn output(&self) -> TimerOutput {
        TimerOutput {
            q: self.q,
            et: self.et,
        }
    }
}

impl Default for Tof {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulse timer. A rising edge while the pulse is running does not re-arm it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tp {
    pub(super) input: bool,
    pub(super) pt: i32,
    q: bool,
    et: i32,
    start: i64,
    timing: bool,
    prev_in: bool,
}

impl Tp {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: false,
            pt: 0,
            q: false,
            et: 0,
            start: 0,
            timing: false,
            prev_in: false,
        }
    }

    pub fn step(&mut self, input: bool, pt: i32, now: i64) -> TimerOutput {
        self.input = input;
        self.pt = pt;
        if input && !self.prev_in && !self.timing {
            self.timing = true;
            self.q = true;
            self.start = now;
            self.et = 0;
        }
        if self.timing {
            self.et = elapsed(now, self.start, pt);
            if self.et >= pt {
                self.timing = false;
                self.q = false;
            }
        }
        if !self.timing && !input {
            self.et = 0;
        }
        self.prev_in = input;
        self.output()
    }

    #[must_use]
    pub fn output(&self) -> TimerOutput {
        TimerOutput {
            q: self.q,
            et: self.et,
        }
    }
}

impl Default for Tp {
    fn default() -> Self {
        Self::new()
    }
}

/// Retentive on-delay timer: elapsed time survives IN dropping until R.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tonr {
    pub(super) input: bool,
    pub(super) r: bool,
    pub(super) pt: i32,
    q: bool,
    et: i32,
    last: i64,
    prev_in: bool,
}

impl Tonr {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: false,
            r: false,
            pt: 0,
            q: false,
            et: 0,
            last: 0,
            prev_in: false,
        }
    }

    pub fn step(&mut self, input: bool, r: bool, pt: i32, now: i64) -> TimerOutput {
        self.input = input;
        self.r = r;
        self.pt = pt;
        if r {
            self.q = false;
            self.et = 0;
            self.prev_in = input;
            return self.output();
        }
        if input {
            if !self.prev_in {
                self.last = now;
            }
            let delta = now.saturating_sub(self.last).max(0);
            let total = i64::from(self.et).saturating_add(delta).min(i64::from(pt));
            self.et = i32::try_from(total).unwrap_or(pt);
            self.last = now;
            self.q = self.et >= pt;
        }
        self.prev_in = input;
        self.output()
    }

    #[must_use]
    pub fn output(&self) -> TimerOutput {
        TimerOutput {
            q: self.q,
            et: self.et,
        }
    }
}

impl Default for Tonr {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ton_reaches_preset_and_caps_et() {
        let mut ton = Ton::new();
        assert_eq!(ton.step(true, 100, 1_000), TimerOutput { q: false, et: 0 });
        assert_eq!(ton.step(true, 100, 1_060), TimerOutput { q: false, et: 60 });
        assert_eq!(ton.step(true, 100, 1_100), TimerOutput { q: true, et: 100 });
        assert_eq!(ton.step(true, 100, 5_000), TimerOutput { q: true, et: 100 });
        assert_eq!(ton.step(false, 100, 5_010), TimerOutput { q: false, et: 0 });
    }

    #[test]
    fn tof_holds_after_falling_edge() {
        let mut tof = Tof::new();
        assert!(!tof.step(false, 50, 0).q);
        assert!(tof.step(true, 50, 10).q);
        assert_eq!(tof.step(false, 50, 20), TimerOutput { q: true, et: 0 });
        assert_eq!(tof.step(false, 50, 50), TimerOutput { q: true, et: 30 });
        assert_eq!(tof.step(false, 50, 70), TimerOutput { q: false, et: 50 });
        assert!(!tof.step(false, 50, 200).q);
    }

    #[test]
    fn tp_pulse_is_not_retriggered() {
        let mut tp = Tp::new();
        assert!(tp.step(true, 100, 0).q);
        assert!(tp.step(false, 100, 50).q);
        assert!(tp.step(true, 100, 60).q);
        let out = tp.step(true, 100, 100);
        assert_eq!(out, TimerOutput { q: false, et: 100 });
        assert_eq!(tp.step(false, 100, 120), TimerOutput { q: false, et: 0 });
    }

    #[test]
    fn tonr_accumulates_across_gaps() {
        let mut tonr = Tonr::new();
        tonr.step(true, false, 100, 0);
        assert_eq!(tonr.step(true, false, 100, 60).et, 60);
        assert_eq!(tonr.step(false, false, 100, 500).et, 60);
        tonr.step(true, false, 100, 1_000);
        let out = tonr.step(true, false, 100, 1_040);
        assert_eq!(out, TimerOutput { q: true, et: 100 });
        assert_eq!(tonr.step(true, true, 100, 1_050), TimerOutput { q: false, et: 0 });
    }
}
