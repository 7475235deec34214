/*
    VidCon
    Register-programmable video controller emulator

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    devices::vidcon::synchronizer.rs

    Two-stage pulse synchronizer with rising edge detection. Carries the dispatcher's
    start level from the control domain into the render domain.

*/

#[derive(Copy, Clone, Debug, Default)]
pub struct PulseSynchronizer {
    stage1: bool,
    stage2: bool,
    last:   bool,
}

impl PulseSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock the synchronizer on a render edge with the current (asynchronous) input level.
    /// Returns true for exactly one render tick after each rising edge of the input has
    /// propagated through both stages.
    #[inline]
    pub fn clock(&mut self, input: bool) -> bool {
        self.last = self.stage2;
        self.stage2 = self.stage1;
        self.stage1 = input;
        self.stage2 && !self.last
    }

    pub fn reset(&mut self) {
        *self = PulseSynchronizer::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_appears_two_ticks_later_once() {
        let mut sync = PulseSynchronizer::new();
        // Input held high for a whole control period (25 render ticks)
        let outputs: Vec<bool> = (0..40).map(|i| sync.clock((3..28).contains(&i))).collect();
        let fired: Vec<usize> = outputs
            .iter()
            .enumerate()
            .filter_map(|(i, &o)| o.then_some(i))
            .collect();
        assert_eq!(fired, vec![4]);
    }

    #[test]
    fn back_to_back_pulses_both_detected() {
        let mut sync = PulseSynchronizer::new();
        let level = |i: usize| (0..25).contains(&i) || (50..75).contains(&i);
        let count = (0..100).filter(|&i| sync.clock(level(i))).count();
        assert_eq!(count, 2);
    }
}
