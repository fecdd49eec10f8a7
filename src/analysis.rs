//! Wavelength analysis for triggered sweep captures.
//!
//! During a sweep the laser fires one trigger pulse every fixed wavelength
//! step and logs the wavelength at each pulse. The oscilloscope records the
//! trigger channel alongside the data channels, so every rising edge in the
//! trigger waveform marks the sample at which the laser crossed the next
//! logged wavelength. [`WavelengthAnalyzer`] recovers that mapping and
//! resamples data channels onto the wavelength axis.

use crate::core::Waveform;
use crate::error::{BenchError, BenchResult};
use tracing::warn;

/// Maps trigger-edge sample indices to logged wavelengths.
pub struct WavelengthAnalyzer {
    edges: Vec<usize>,
    wavelengths: Vec<f64>,
}

impl WavelengthAnalyzer {
    /// Build an analyzer from the laser's wavelength log and the captured
    /// trigger waveform.
    ///
    /// Rising edges are detected at the midpoint of the trigger waveform's
    /// range: a sample strictly above the threshold whose predecessor was at
    /// or below it. If the number of edges differs from the number of logged
    /// wavelengths the analyzer pairs as many as both sides provide; the
    /// caller can compare [`WavelengthAnalyzer::num_peaks`] against the log
    /// size to decide whether the capture is usable.
    pub fn new(wavelength_log: Vec<f64>, trigger: &Waveform) -> BenchResult<Self> {
        if wavelength_log.is_empty() {
            return Err(BenchError::Sweep(
                "wavelength log is empty, nothing to analyze".to_string(),
            ));
        }
        if trigger.samples.len() < 2 {
            return Err(BenchError::Sweep(format!(
                "trigger waveform too short ({} samples)",
                trigger.samples.len()
            )));
        }

        let (min, max) = trigger
            .samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
                (lo.min(s), hi.max(s))
            });
        if !(max > min) {
            return Err(BenchError::Sweep(
                "trigger waveform is flat, no edges to detect".to_string(),
            ));
        }
        let threshold = (min + max) / 2.0;

        let mut edges = Vec::with_capacity(wavelength_log.len());
        let mut last = trigger.samples[0];
        for (i, &sample) in trigger.samples.iter().enumerate().skip(1) {
            if last <= threshold && sample > threshold {
                edges.push(i);
            }
            last = sample;
        }

        if edges.len() != wavelength_log.len() {
            warn!(
                expected = wavelength_log.len(),
                measured = edges.len(),
                "trigger edge count does not match wavelength log"
            );
        }

        Ok(Self {
            edges,
            wavelengths: wavelength_log,
        })
    }

    /// Number of trigger edges detected in the capture.
    pub fn num_peaks(&self) -> usize {
        self.edges.len()
    }

    /// Number of wavelength points usable for resampling: the smaller of the
    /// edge count and the log size.
    pub fn num_points(&self) -> usize {
        self.edges.len().min(self.wavelengths.len())
    }

    /// The wavelength axis, truncated to [`WavelengthAnalyzer::num_points`].
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths[..self.num_points()]
    }

    /// Sample a data channel at each trigger edge, producing one value per
    /// wavelength point.
    ///
    /// Fails if the data waveform is shorter than the trigger record it was
    /// captured alongside.
    pub fn resample(&self, data: &Waveform) -> BenchResult<Vec<f64>> {
        let n = self.num_points();
        if let Some(&last_edge) = self.edges.get(n.saturating_sub(1)) {
            if last_edge >= data.samples.len() {
                return Err(BenchError::Sweep(format!(
                    "channel {} waveform has {} samples but trigger edges extend to {}",
                    data.channel,
                    data.samples.len(),
                    last_edge
                )));
            }
        }
        Ok(self.edges[..n].iter().map(|&i| data.samples[i]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waveform(samples: Vec<f64>) -> Waveform {
        Waveform {
            channel: 1,
            sample_rate: 1000.0,
            samples,
        }
    }

    fn pulse_train(num_samples: usize, edges: &[usize]) -> Waveform {
        let mut samples = vec![0.0; num_samples];
        for &e in edges {
            samples[e] = 2.0;
        }
        waveform(samples)
    }

    #[test]
    fn test_edge_detection() {
        let trigger = pulse_train(100, &[10, 30, 50, 70]);
        let analyzer =
            WavelengthAnalyzer::new(vec![1500.0, 1500.1, 1500.2, 1500.3], &trigger).unwrap();
        assert_eq!(analyzer.num_peaks(), 4);
        assert_eq!(analyzer.num_points(), 4);
    }

    #[test]
    fn test_resample_at_edges() {
        let trigger = pulse_train(100, &[10, 30, 50]);
        let analyzer = WavelengthAnalyzer::new(vec![1500.0, 1501.0, 1502.0], &trigger).unwrap();

        let mut data = vec![0.0; 100];
        data[10] = 0.9;
        data[30] = 0.5;
        data[50] = 0.7;
        let values = analyzer.resample(&waveform(data)).unwrap();
        assert_eq!(values, vec![0.9, 0.5, 0.7]);
        assert_eq!(analyzer.wavelengths(), &[1500.0, 1501.0, 1502.0]);
    }

    #[test]
    fn test_edge_count_mismatch_truncates() {
        // Four logged wavelengths but only two pulses captured.
        let trigger = pulse_train(100, &[10, 30]);
        let analyzer =
            WavelengthAnalyzer::new(vec![1500.0, 1501.0, 1502.0, 1503.0], &trigger).unwrap();
        assert_eq!(analyzer.num_peaks(), 2);
        assert_eq!(analyzer.num_points(), 2);
        assert_eq!(analyzer.wavelengths(), &[1500.0, 1501.0]);
    }

    #[test]
    fn test_flat_trigger_rejected() {
        let trigger = waveform(vec![1.0; 50]);
        assert!(WavelengthAnalyzer::new(vec![1500.0], &trigger).is_err());
    }

    #[test]
    fn test_empty_log_rejected() {
        let trigger = pulse_train(100, &[10]);
        assert!(WavelengthAnalyzer::new(vec![], &trigger).is_err());
    }

    #[test]
    fn test_short_data_waveform_rejected() {
        let trigger = pulse_train(100, &[10, 90]);
        let analyzer = WavelengthAnalyzer::new(vec![1500.0, 1501.0], &trigger).unwrap();
        assert!(analyzer.resample(&waveform(vec![0.0; 20])).is_err());
    }

    #[test]
    fn test_no_retrigger_while_high() {
        // A pulse held high for several samples is one edge, not many.
        let mut samples = vec![0.0; 50];
        for s in &mut samples[10..15] {
            *s = 2.0;
        }
        let analyzer = WavelengthAnalyzer::new(vec![1500.0], &waveform(samples)).unwrap();
        assert_eq!(analyzer.num_peaks(), 1);
    }
}
