use crate::foundation::{
    core::BufferShape,
    error::{BlurError, BlurResult},
};

/// Flat, row-major, linear-light `f32` pixels of a fixed shape.
///
/// Rows run bottom-up like the host's image buffers: row 0 is the bottom of the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    shape: BufferShape,
    data: Vec<f32>,
}

impl Default for PixelBuffer {
    /// Empty `0x0x0` buffer.
    fn default() -> Self {
        Self {
            shape: BufferShape::new(0, 0, 0),
            data: Vec::new(),
        }
    }
}

impl PixelBuffer {
    /// Wrap host pixels, checking the length against `shape`.
    pub fn from_vec(shape: BufferShape, data: Vec<f32>) -> BlurResult<Self> {
        let expected = shape
            .sample_len()
            .ok_or_else(|| BlurError::invalid_config(format!("buffer shape {shape} overflows")))?;
        if data.len() != expected {
            return Err(BlurError::Other(anyhow::anyhow!(
                "buffer holds {} samples but shape {shape} needs {expected}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn filled(shape: BufferShape, value: f32) -> BlurResult<Self> {
        let len = shape
            .sample_len()
            .ok_or_else(|| BlurError::invalid_config(format!("buffer shape {shape} overflows")))?;
        Ok(Self {
            shape,
            data: vec![value; len],
        })
    }

    pub fn zeros(shape: BufferShape) -> BlurResult<Self> {
        Self::filled(shape, 0.0)
    }

    pub fn shape(&self) -> BufferShape {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Channels of the pixel at `(x, y)`, `y = 0` being the bottom row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[f32]> {
        if x >= self.shape.width || y >= self.shape.height {
            return None;
        }
        let c = self.shape.channels as usize;
        let idx = (y as usize * self.shape.width as usize + x as usize) * c;
        self.data.get(idx..idx + c)
    }

    /// Reshape in place, reusing the allocation, and zero every sample.
    pub(crate) fn reset(&mut self, shape: BufferShape) -> BlurResult<()> {
        let len = shape
            .sample_len()
            .ok_or_else(|| BlurError::invalid_config(format!("buffer shape {shape} overflows")))?;
        self.shape = shape;
        self.data.clear();
        self.data.resize(len, 0.0);
        Ok(())
    }
}
