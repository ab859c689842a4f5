/// Counts of the passes a training run performed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassCounters {
    pub forwards: u64,
    pub backwards: u64,
    pub adv_steps: u64,
    pub restores: u64,
    pub optimizer_steps: u64,
}

impl PassCounters {
    #[inline]
    pub fn bump_forward(&mut self) {
        self.forwards += 1;
    }

    #[inline]
    pub fn bump_backward(&mut self) {
        self.backwards += 1;
    }

    #[inline]
    pub fn bump_adv_step(&mut self) {
        self.adv_steps += 1;
    }

    #[inline]
    pub fn bump_restore(&mut self) {
        self.restores += 1;
    }

    #[inline]
    pub fn bump_optimizer_step(&mut self) {
        self.optimizer_steps += 1;
    }
}
