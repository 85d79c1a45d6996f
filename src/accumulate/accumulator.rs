use crate::{
    accumulate::buffer::PixelBuffer,
    config::GammaExponent,
    foundation::{
        core::BufferShape,
        error::{BlurError, BlurResult},
    },
};

/// Running weighted sum of the subframes of one frame.
///
/// Each subframe contributes with weight `1 / sample_count`, so a completed frame is the
/// arithmetic mean of its subframes. The accumulator owns a single pixel slot that is reused
/// from frame to frame; only one frame's data is ever held.
#[derive(Debug, Default)]
pub struct Accumulator {
    slot: PixelBuffer,
    expected: u32,
    added: u32,
    weight: f32,
}

impl Accumulator {
    pub fn new(sample_count: u32) -> BlurResult<Self> {
        let mut acc = Self::default();
        acc.begin(sample_count)?;
        Ok(acc)
    }

    /// Start a new frame of `sample_count` subframes, keeping the slot allocation.
    pub fn begin(&mut self, sample_count: u32) -> BlurResult<()> {
        if sample_count == 0 {
            return Err(BlurError::invalid_config(
                "cannot accumulate a frame of zero samples",
            ));
        }
        self.expected = sample_count;
        self.added = 0;
        self.weight = 1.0 / sample_count as f32;
        Ok(())
    }

    pub fn added(&self) -> u32 {
        self.added
    }

    pub fn expected(&self) -> u32 {
        self.expected
    }

    /// Sum of the weights contributed so far; `1.0` once the frame is complete.
    pub fn weight_sum(&self) -> f64 {
        f64::from(self.added) * f64::from(self.weight)
    }

    /// Add one subframe's pixels. The first subframe fixes the frame's shape.
    pub fn add(&mut self, shape: BufferShape, data: &[f32]) -> BlurResult<()> {
        if self.added >= self.expected {
            return Err(BlurError::invalid_config(format!(
                "frame already holds all {} samples",
                self.expected
            )));
        }
        if self.added == 0 {
            self.slot.reset(shape)?;
        } else if shape != self.slot.shape() {
            return Err(BlurError::ShapeMismatch {
                frame: None,
                subframe: self.added,
                expected: self.slot.shape(),
                found: shape,
            });
        }
        if data.len() != self.slot.data().len() {
            return Err(BlurError::Other(anyhow::anyhow!(
                "subframe holds {} samples but shape {shape} needs {}",
                data.len(),
                self.slot.data().len()
            )));
        }

        let w = self.weight;
        for (acc, &v) in self.slot.data_mut().iter_mut().zip(data) {
            *acc += v * w;
        }
        self.added += 1;
        Ok(())
    }

    pub fn add_buffer(&mut self, buffer: &PixelBuffer) -> BlurResult<()> {
        self.add(buffer.shape(), buffer.data())
    }

    /// Gamma-encode the completed mean in place and expose it.
    ///
    /// Out-of-range values are left for the output encoder.
    pub fn finish(&mut self, gamma: GammaExponent) -> BlurResult<&PixelBuffer> {
        if self.added != self.expected {
            return Err(BlurError::invalid_config(format!(
                "frame finished with {} of {} samples",
                self.added, self.expected
            )));
        }
        encode_gamma(self.slot.data_mut(), gamma);
        Ok(&self.slot)
    }
}

/// Raise every sample to `gamma`: `v = v.powf(exponent)`.
pub fn encode_gamma(data: &mut [f32], gamma: GammaExponent) {
    if gamma.is_identity() {
        return;
    }
    let e = gamma.0;
    for v in data {
        *v = v.powf(e);
    }
}

/// Average `buffers` with equal weights and gamma-encode the mean.
///
/// All buffers must share one shape.
pub fn accumulate(buffers: &[PixelBuffer], gamma: GammaExponent) -> BlurResult<PixelBuffer> {
    let count: u32 = buffers
        .len()
        .try_into()
        .map_err(|_| BlurError::invalid_config("too many buffers to accumulate"))?;
    let mut acc = Accumulator::new(count)?;
    for buffer in buffers {
        acc.add_buffer(buffer)?;
    }
    Ok(acc.finish(gamma)?.clone())
}

#[cfg(test)]
#[path = "../../tests/unit/accumulate/accumulator.rs"]
mod tests;
