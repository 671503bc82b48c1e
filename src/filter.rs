use crate::config::AVERAGE_DEPTH;
use crate::Units;
use heapless::Deque;

/// Moving average over the most recent samples
///
/// Samples arrive in Celsius and are stored in the window's working units,
/// so the running sum always matches what is displayed.
#[derive(Debug, Clone)]
pub struct AverageWindow<const N: usize = AVERAGE_DEPTH> {
    samples: Deque<f32, N>,
    sum: f32,
    units: Units,
}

impl<const N: usize> AverageWindow<N> {
    pub fn new(units: Units) -> Self {
        Self {
            samples: Deque::new(),
            sum: 0.0,
            units,
        }
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Switches the working units; the window restarts because the running
    /// sum holds values in the previous units
    pub fn set_units(&mut self, units: Units) {
        if units != self.units {
            self.units = units;
            self.reset();
        }
    }

    /// Adds a Celsius sample, evicting the oldest once the window is full
    pub fn record(&mut self, celsius: f32) {
        let sample = self.units.from_celsius(celsius);
        if self.samples.is_full() {
            if let Some(oldest) = self.samples.pop_front() {
                self.sum -= oldest;
            }
        }
        // cannot fail, a slot was freed above
        let _ = self.samples.push_back(sample);
        self.sum += sample;
    }

    /// Mean of the window, `None` before the first sample
    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.sum / self.samples.len() as f32)
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sum(&self) -> f32 {
        self.sum
    }

    pub fn samples(&self) -> impl Iterator<Item = &f32> {
        self.samples.iter()
    }
}

impl Default for AverageWindow {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_UNITS)
    }
}
