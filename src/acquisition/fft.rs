use rustfft::{num_complex::Complex64, FftPlanner};
/// Absolute frequency of every FFT bin for a transform of `n` samples.
pub fn bin_frequencies(n: usize, sampling_rate_hz: f64) -> Vec<f64> {
    (0..n)
        .map(|k| k.min(n - k) as f64 * sampling_rate_hz / n as f64)
        .collect()
}
/// Filter `samples` in place through a real, zero-phase frequency response.
///
/// The response is evaluated at each bin's absolute frequency, so negative
/// frequencies mirror the positive ones and the output stays real.
pub fn apply_frequency_response<H>(samples: &mut [f64], sampling_rate_hz: f64, gain: f64, response: H)
where
    H: Fn(f64) -> f64,
{
    let n = samples.len();
    if n == 0 {
        return;
    }
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);
    let mut buffer: Vec<Complex64> = samples.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    forward.process(&mut buffer);
    for (bin, freq) in buffer.iter_mut().zip(bin_frequencies(n, sampling_rate_hz)) {
        *bin *= response(freq);
    }
    inverse.process(&mut buffer);
    let scale = gain / n as f64;
    for (out, bin) in samples.iter_mut().zip(&buffer) {
        *out = bin.re * scale;
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn bins_mirror_around_nyquist() {
        let freqs = bin_frequencies(8, 80.0);
        assert_eq!(freqs, vec![0.0, 10.0, 20.0, 30.0, 40.0, 30.0, 20.0, 10.0]);
    }
    #[test]
    fn unit_response_is_identity_up_to_gain() {
        let mut data: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin() + 0.5).collect();
        let original = data.clone();
        apply_frequency_response(&mut data, 1000.0, 2.0, |_| 1.0);
        for (out, inp) in data.iter().zip(&original) {
            assert!((out - 2.0 * inp).abs() < 1e-9);
        }
    }
    #[test]
    fn dc_only_response_keeps_mean() {
        let mut data: Vec<f64> = (0..128)
            .map(|i| 3.0 + (2.0 * std::f64::consts::PI * 16.0 * i as f64 / 128.0).sin())
            .collect();
        apply_frequency_response(&mut data, 128.0, 1.0, |f| if f == 0.0 { 1.0 } else { 0.0 });
        assert!(data.iter().all(|v| (v - 3.0).abs() < 1e-9));
    }
    #[test]
    fn empty_input_is_noop() {
        let mut data: Vec<f64> = Vec::new();
        apply_frequency_response(&mut data, 10.0, 1.0, |_| 0.0);
        assert!(data.is_empty());
    }
}
