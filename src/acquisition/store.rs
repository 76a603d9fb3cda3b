use std::collections::BTreeMap;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use crate::acquisition::error::{Result, SignalError};
/// Reserved name of the shared time axis.
pub const TIME_CHANNEL: &str = "Time";
/// Named, time-aligned set of equal-length sample buffers.
///
/// Every channel holds exactly `n_elements` samples. The time axis is kept
/// apart from the other channels so bulk operations never touch it.
#[derive(Debug)]
pub struct SignalStore {
    n_elements: usize,
    time: Option<Vec<f64>>,
    channels: BTreeMap<String, Vec<f64>>, // name -> samples
    rng: StdRng,
}
impl SignalStore {
    pub fn new(n_elements: usize) -> Self {
        Self::with_rng(n_elements, StdRng::from_entropy())
    }
    /// Store whose noise draws are reproducible for a given seed.
    pub fn with_seed(n_elements: usize, seed: u64) -> Self {
        Self::with_rng(n_elements, StdRng::seed_from_u64(seed))
    }
    fn with_rng(n_elements: usize, rng: StdRng) -> Self {
        Self {
            n_elements,
            time: None,
            channels: BTreeMap::new(),
            rng,
        }
    }
    pub fn n_elements(&self) -> usize {
        self.n_elements
    }
    /// Number of channels, not counting the time axis.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
    /// Number of stored signals, time axis included.
    pub fn len(&self) -> usize {
        self.channels.len() + usize::from(self.time.is_some())
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Sorted channel names, not counting the time axis.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }
    /// Iterate `(name, samples)` over every channel except the time axis.
    pub fn channels(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.channels
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_slice()))
    }
    pub fn has_signal(&self, name: &str) -> bool {
        if name == TIME_CHANNEL {
            self.time.is_some()
        } else {
            self.channels.contains_key(name)
        }
    }
    pub fn add_signal(&mut self, name: &str, data: Vec<f64>) -> Result<()> {
        if self.has_signal(name) {
            return Err(SignalError::AlreadyExists {
                name: name.to_owned(),
            });
        }
        if data.len() != self.n_elements {
            return Err(SignalError::SizeMismatch {
                expected: self.n_elements,
                actual: data.len(),
            });
        }
        if name == TIME_CHANNEL {
            if !data.windows(2).all(|pair| pair[0] <= pair[1]) {
                return Err(SignalError::invalid("time axis must be non-decreasing"));
            }
            self.time = Some(data);
        } else {
            self.channels.insert(name.to_owned(), data);
        }
        log::debug!("added signal '{}' ({} samples)", name, self.n_elements);
        Ok(())
    }
    pub fn add_time(&mut self, time: Vec<f64>) -> Result<()> {
        self.add_signal(TIME_CHANNEL, time)
    }
    pub fn create_zero_signal(&mut self, name: &str) -> Result<()> {
        self.add_signal(name, vec![0.0; self.n_elements])
    }
    pub fn get_signal(&self, name: &str) -> Result<&[f64]> {
        if name == TIME_CHANNEL {
            return self
                .time
                .as_deref()
                .ok_or_else(|| SignalError::not_found(name));
        }
        self.channels
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SignalError::not_found(name))
    }
    pub fn time(&self) -> Result<&[f64]> {
        match self.time.as_deref() {
            Some(time) if time.len() == self.n_elements => Ok(time),
            _ => Err(SignalError::MissingTimeAxis),
        }
    }
    /// Sample spacing of the time axis, from its first two samples.
    pub fn time_step(&self) -> Result<f64> {
        let time = self.time()?;
        if time.len() < 2 {
            return Err(SignalError::invalid(
                "time axis needs at least two samples to define a step",
            ));
        }
        Ok(time[1] - time[0])
    }
    pub fn add_constant(&mut self, constant: f64) {
        self.for_each_channel(|samples| samples.iter_mut().for_each(|v| *v += constant));
    }
    pub fn add_constant_to_signal(&mut self, name: &str, constant: f64) -> Result<()> {
        self.signal_mut(name)?
            .iter_mut()
            .for_each(|v| *v += constant);
        Ok(())
    }
    pub fn multiply(&mut self, factor: f64) {
        self.for_each_channel(|samples| samples.iter_mut().for_each(|v| *v *= factor));
    }
    pub fn multiply_signal(&mut self, name: &str, factor: f64) -> Result<()> {
        self.signal_mut(name)?.iter_mut().for_each(|v| *v *= factor);
        Ok(())
    }
    pub fn round(&mut self) {
        self.for_each_channel(|samples| samples.iter_mut().for_each(|v| *v = v.round()));
    }
    pub fn round_signal(&mut self, name: &str) -> Result<()> {
        self.signal_mut(name)?
            .iter_mut()
            .for_each(|v| *v = v.round());
        Ok(())
    }
    pub(crate) fn signal_mut(&mut self, name: &str) -> Result<&mut [f64]> {
        check_writable(name)?;
        self.channels
            .get_mut(name)
            .map(Vec::as_mut_slice)
            .ok_or_else(|| SignalError::not_found(name))
    }
    pub(crate) fn signal_and_rng_mut(&mut self, name: &str) -> Result<(&mut [f64], &mut StdRng)> {
        check_writable(name)?;
        let samples = self
            .channels
            .get_mut(name)
            .ok_or_else(|| SignalError::not_found(name))?;
        Ok((samples.as_mut_slice(), &mut self.rng))
    }
    /// Time axis alongside mutable access to one channel.
    pub(crate) fn time_and_signal_mut(&mut self, name: &str) -> Result<(&[f64], &mut [f64])> {
        check_writable(name)?;
        let time = match self.time.as_deref() {
            Some(time) if time.len() == self.n_elements => time,
            _ => return Err(SignalError::MissingTimeAxis),
        };
        let samples = self
            .channels
            .get_mut(name)
            .ok_or_else(|| SignalError::not_found(name))?;
        Ok((time, samples.as_mut_slice()))
    }
    /// Time axis alongside every other channel, for bulk operations that read it.
    pub(crate) fn time_and_channels_mut(
        &mut self,
    ) -> Result<(&[f64], &mut BTreeMap<String, Vec<f64>>)> {
        match self.time.as_deref() {
            Some(time) if time.len() == self.n_elements => Ok((time, &mut self.channels)),
            _ => Err(SignalError::MissingTimeAxis),
        }
    }
    fn for_each_channel<F>(&mut self, op: F)
    where
        F: Fn(&mut [f64]) + Send + Sync,
    {
        self.channels
            .par_iter_mut()
            .for_each(|(_, samples)| op(samples));
    }
    /// Run a fallible operation on every channel except the time axis, in parallel.
    pub(crate) fn try_for_each_channel<F>(&mut self, op: F) -> Result<()>
    where
        F: Fn(&str, &mut [f64]) -> Result<()> + Send + Sync,
    {
        self.channels
            .par_iter_mut()
            .try_for_each(|(name, samples)| op(name, samples))
    }
    /// Run a fallible operation on every channel and collect one value per channel.
    pub(crate) fn try_map_channels<T, F>(&mut self, op: F) -> Result<BTreeMap<String, T>>
    where
        T: Send,
        F: Fn(&str, &mut [f64]) -> Result<T> + Send + Sync,
    {
        self.channels
            .par_iter_mut()
            .map(|(name, samples)| op(name, samples).map(|value| (name.clone(), value)))
            .collect()
    }
    /// Like `try_for_each_channel`, handing each channel its own generator.
    ///
    /// Child seeds are drawn from the store generator in channel-name order, so
    /// the result only depends on the store seed.
    pub(crate) fn try_for_each_channel_seeded<F>(&mut self, op: F) -> Result<()>
    where
        F: Fn(&str, &mut [f64], &mut StdRng) -> Result<()> + Send + Sync,
    {
        let seeds: Vec<u64> = (0..self.channels.len())
            .map(|_| self.rng.next_u64())
            .collect();
        let jobs: Vec<(&String, &mut Vec<f64>, u64)> = self
            .channels
            .iter_mut()
            .zip(seeds)
            .map(|((name, samples), seed)| (name, samples, seed))
            .collect();
        jobs.into_par_iter().try_for_each(|(name, samples, seed)| {
            let mut rng = StdRng::seed_from_u64(seed);
            op(name, samples, &mut rng)
        })
    }
}
fn check_writable(name: &str) -> Result<()> {
    if name == TIME_CHANNEL {
        return Err(SignalError::invalid("the time axis is read-only"));
    }
    Ok(())
}
/// Evenly spaced time axis `t[i] = i / sampling_rate_hz`.
pub fn uniform_time_axis(n_elements: usize, sampling_rate_hz: f64) -> Result<Vec<f64>> {
    if !(sampling_rate_hz > 0.0) {
        return Err(SignalError::invalid("sampling rate must be greater than zero"));
    }
    Ok((0..n_elements)
        .map(|i| i as f64 / sampling_rate_hz)
        .collect())
}
