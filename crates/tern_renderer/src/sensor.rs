//! Render target contract consumed by the camera.

/// Anything that knows its pixel dimensions.
pub trait ImageSensor {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// An image sensor that is only a size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl ImageSensor for Resolution {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}
