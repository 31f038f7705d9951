//! Spectral feature extraction and comparison.
//!
//! A whole-signal forward FFT feeds four scalar features plus an amplitude
//! envelope. [`compare`] folds the per-feature differences into a single
//! spectral distance used as the convergence signal during sound matching.

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

/// Frequencies below this are treated as DC/rumble and ignored.
const MIN_FREQ_HZ: f32 = 20.0;

/// Envelope window length.
const ENVELOPE_WINDOW_S: f32 = 0.05;

/// Envelope is truncated to the first second (20 x 50 ms).
const ENVELOPE_MAX_WINDOWS: usize = 20;

/// Harmonics 2*f0 through 8*f0 contribute to the harmonic ratio.
const HARMONIC_RANGE: std::ops::Range<u32> = 2..9;

/// Scalar spectral features of one recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Strongest spectral peak at or above 20 Hz.
    pub fundamental_hz: f32,
    /// Magnitude-weighted mean frequency.
    pub spectral_centroid_hz: f32,
    /// Energy at harmonic bins relative to total energy above 20 Hz, 0..=1.
    pub harmonic_ratio: f32,
    /// RMS over non-overlapping 50 ms windows, first second only.
    pub envelope: Vec<f32>,
    pub duration_s: f32,
}

/// Feature-level diff between a target and a recorded signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareReport {
    /// Normalized distance; identical signals score ~0.
    pub spectral_distance: f32,
    pub fundamental_diff_hz: f32,
    pub centroid_diff_hz: f32,
    pub harmonic_ratio_diff: f32,
    pub target: AnalysisReport,
    pub recorded: AnalysisReport,
}

/// Extract spectral features from a mono signal.
pub fn analyze(samples: &[f32], sample_rate: u32) -> AnalysisReport {
    if samples.is_empty() || sample_rate == 0 {
        return AnalysisReport::default();
    }

    let n = samples.len();
    let magnitudes = spectrum(samples);
    let bin_hz = sample_rate as f32 / n as f32;

    let min_bin = ((MIN_FREQ_HZ / bin_hz) as usize).min(magnitudes.len().saturating_sub(1));

    let peak_bin = magnitudes[min_bin..]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| min_bin + i)
        .unwrap_or(min_bin);
    let fundamental_hz = peak_bin as f32 * bin_hz;

    let magnitude_sum: f32 = magnitudes.iter().sum();
    let spectral_centroid_hz = if magnitude_sum > 0.0 {
        magnitudes
            .iter()
            .enumerate()
            .map(|(i, &m)| i as f32 * bin_hz * m)
            .sum::<f32>()
            / magnitude_sum
    } else {
        0.0
    };

    let harmonic_energy: f32 = HARMONIC_RANGE
        .map(|h| {
            let hbin = (fundamental_hz * h as f32 / bin_hz) as usize;
            magnitudes.get(hbin).copied().unwrap_or(0.0)
        })
        .sum();
    let total_energy: f32 = magnitudes[min_bin..].iter().sum();
    let harmonic_ratio = if total_energy > 0.0 {
        (harmonic_energy / total_energy).clamp(0.0, 1.0)
    } else {
        0.0
    };

    AnalysisReport {
        fundamental_hz,
        spectral_centroid_hz,
        harmonic_ratio,
        envelope: envelope(samples, sample_rate),
        duration_s: n as f32 / sample_rate as f32,
    }
}

/// Compare two signals; the distance averages the normalized fundamental,
/// centroid and harmonic-ratio differences.
pub fn compare(target: &[f32], recorded: &[f32], sample_rate: u32) -> CompareReport {
    let t = analyze(target, sample_rate);
    let r = analyze(recorded, sample_rate);

    let freq_diff = (t.fundamental_hz - r.fundamental_hz).abs() / t.fundamental_hz.max(1.0);
    let centroid_diff =
        (t.spectral_centroid_hz - r.spectral_centroid_hz).abs() / t.spectral_centroid_hz.max(1.0);
    let harmonic_diff = (t.harmonic_ratio - r.harmonic_ratio).abs();

    CompareReport {
        spectral_distance: (freq_diff + centroid_diff + harmonic_diff) / 3.0,
        fundamental_diff_hz: t.fundamental_hz - r.fundamental_hz,
        centroid_diff_hz: t.spectral_centroid_hz - r.spectral_centroid_hz,
        harmonic_ratio_diff: t.harmonic_ratio - r.harmonic_ratio,
        target: t,
        recorded: r,
    }
}

/// Magnitudes of the positive-frequency bins (0..=n/2).
fn spectrum(samples: &[f32]) -> Vec<f32> {
    let n = samples.len();
    let mut buffer: Vec<Complex<f32>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    buffer[..n / 2 + 1].iter().map(|c| c.norm()).collect()
}

fn envelope(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    let window = ((sample_rate as f32 * ENVELOPE_WINDOW_S) as usize).max(1);
    samples
        .chunks(window)
        .take(ENVELOPE_MAX_WINDOWS)
        .map(|chunk| {
            let sum_sq: f32 = chunk.iter().map(|s| s * s).sum();
            (sum_sq / chunk.len() as f32).sqrt()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::generate_test_tone;

    #[test]
    fn test_sine_fundamental() {
        let tone = generate_test_tone(440.0, 1.0, 44100);
        let report = analyze(&tone, 44100);
        assert!(
            (430.0..=450.0).contains(&report.fundamental_hz),
            "got {}",
            report.fundamental_hz
        );
        assert!((report.duration_s - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_sine_centroid_near_fundamental() {
        let tone = generate_test_tone(440.0, 1.0, 44100);
        let report = analyze(&tone, 44100);
        // A pure tone concentrates nearly all energy at f0.
        assert!(
            (report.spectral_centroid_hz - 440.0).abs() < 100.0,
            "got {}",
            report.spectral_centroid_hz
        );
    }

    #[test]
    fn test_envelope_shape() {
        let tone = generate_test_tone(440.0, 2.0, 44100);
        let report = analyze(&tone, 44100);
        assert_eq!(report.envelope.len(), 20); // capped at the first second
        // Steady sine: every window RMS near 1/sqrt(2).
        for rms in &report.envelope {
            assert!((rms - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.05);
        }
    }

    #[test]
    fn test_silence() {
        let report = analyze(&vec![0.0; 44100], 44100);
        assert_eq!(report.spectral_centroid_hz, 0.0);
        assert_eq!(report.harmonic_ratio, 0.0);
        assert!(report.envelope.iter().all(|&e| e == 0.0));

        let empty = analyze(&[], 44100);
        assert_eq!(empty.duration_s, 0.0);
    }

    #[test]
    fn test_identical_signals_are_close() {
        let tone = generate_test_tone(440.0, 1.0, 44100);
        let report = compare(&tone, &tone, 44100);
        assert!(report.spectral_distance < 0.01, "got {}", report.spectral_distance);
        assert_eq!(report.fundamental_diff_hz, 0.0);
    }

    #[test]
    fn test_octave_apart_signals_are_distant() {
        let a = generate_test_tone(440.0, 1.0, 44100);
        let b = generate_test_tone(880.0, 1.0, 44100);
        let report = compare(&a, &b, 44100);
        assert!(report.spectral_distance > 0.1, "got {}", report.spectral_distance);
        assert!(report.fundamental_diff_hz < 0.0);
    }

    #[test]
    fn test_report_serializes() {
        let tone = generate_test_tone(440.0, 0.5, 44100);
        let report = analyze(&tone, 44100);
        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.envelope.len(), report.envelope.len());
    }
}
