use std::collections::BTreeMap;
use std::ops::Range;
use crate::acquisition::error::{Result, SignalError};
use crate::acquisition::store::SignalStore;
use crate::acquisition::trigger::TriggerRange;
/// One event window of one channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment<'a> {
    pub id: usize,
    pub channel: &'a str,
    pub time: &'a [f64],
    pub samples: &'a [f64],
    pub range: TriggerRange, // source indices in the store
}
/// Concatenated event windows for every channel, sharing time stamps and segment ids.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentedSignals {
    time: Vec<f64>,
    segment_ids: Vec<usize>,
    channels: BTreeMap<String, Vec<f64>>,
    ranges: Vec<TriggerRange>,
    bounds: Vec<Range<usize>>, // segment id -> span in the output buffers
}
impl SegmentedSignals {
    /// Copy every range out of every channel, in range order.
    pub fn extract(store: &SignalStore, ranges: &[TriggerRange]) -> Result<Self> {
        let time = store.time()?;
        let n = time.len();
        let mut out = SegmentedSignals {
            ranges: ranges.to_vec(),
            ..Default::default()
        };
        for (id, range) in ranges.iter().enumerate() {
            let begin = out.time.len();
            let span = clip(range, n);
            out.time.extend_from_slice(&time[span.clone()]);
            out.segment_ids.extend(std::iter::repeat(id).take(span.len()));
            out.bounds.push(begin..out.time.len());
        }
        for (name, samples) in store.channels() {
            let mut buffer = Vec::with_capacity(out.time.len());
            for range in ranges {
                buffer.extend_from_slice(&samples[clip(range, samples.len())]);
            }
            out.channels.insert(name.to_owned(), buffer);
        }
        log::debug!(
            "extracted {} segments ({} samples per channel)",
            ranges.len(),
            out.time.len()
        );
        Ok(out)
    }
    pub fn time(&self) -> &[f64] {
        &self.time
    }
    pub fn segment_ids(&self) -> &[usize] {
        &self.segment_ids
    }
    pub fn ranges(&self) -> &[TriggerRange] {
        &self.ranges
    }
    pub fn segment_count(&self) -> usize {
        self.ranges.len()
    }
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }
    pub fn signal(&self, channel: &str) -> Result<&[f64]> {
        self.channels
            .get(channel)
            .map(Vec::as_slice)
            .ok_or_else(|| SignalError::not_found(channel))
    }
    pub fn segment(&self, channel: &str, id: usize) -> Result<Segment<'_>> {
        let (name, samples) = self
            .channels
            .get_key_value(channel)
            .ok_or_else(|| SignalError::not_found(channel))?;
        let span = self.bounds.get(id).cloned().ok_or_else(|| {
            SignalError::invalid(format!(
                "segment {id} out of range ({} segments)",
                self.ranges.len()
            ))
        })?;
        Ok(Segment {
            id,
            channel: name.as_str(),
            time: &self.time[span.clone()],
            samples: &samples[span],
            range: self.ranges[id],
        })
    }
    pub fn segments<'a>(&'a self, channel: &str) -> Result<impl Iterator<Item = Segment<'a>> + 'a> {
        let (name, samples) = self
            .channels
            .get_key_value(channel)
            .ok_or_else(|| SignalError::not_found(channel))?;
        Ok(self
            .bounds
            .iter()
            .zip(&self.ranges)
            .enumerate()
            .map(move |(id, (span, &range))| Segment {
                id,
                channel: name.as_str(),
                time: &self.time[span.clone()],
                samples: &samples[span.clone()],
                range,
            }))
    }
}
fn clip(range: &TriggerRange, len: usize) -> Range<usize> {
    let end = (range.end + 1).min(len);
    range.start.min(end)..end
}
