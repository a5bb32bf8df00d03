//! Linux GPIO character-device lines.
//!
//! Requests lines from `/dev/gpiochipN` with `gpio-cdev` and exposes
//! each as an `embedded-hal` 1.0 digital pin.  Outputs are requested
//! with an initial value of 0, so the kernel drives them low from the
//! moment the request succeeds.

use std::fmt;
use std::path::Path;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use log::debug;

/// Consumer label shown by `gpioinfo` for every requested line.
pub const CONSUMER: &str = "flamefeedback";

/// Error from a character-device line operation.
#[derive(Debug)]
pub struct CdevError(gpio_cdev::errors::Error);

impl fmt::Display for CdevError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio line error: {}", self.0)
    }
}

impl std::error::Error for CdevError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<gpio_cdev::errors::Error> for CdevError {
    fn from(e: gpio_cdev::errors::Error) -> Self {
        Self(e)
    }
}

impl digital::Error for CdevError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// An opened GPIO chip.
pub struct GpioChip {
    chip: Chip,
}

impl GpioChip {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CdevError> {
        let chip = Chip::new(path.as_ref())?;
        debug!(
            "GPIO chip {} ({}), {} lines",
            chip.name(),
            chip.label(),
            chip.num_lines()
        );
        Ok(Self { chip })
    }

    /// Request `offset` as an input.
    pub fn input(&mut self, offset: u32) -> Result<CdevLine, CdevError> {
        self.request(offset, LineRequestFlags::INPUT)
    }

    /// Request `offset` as an output, initially low.
    pub fn output(&mut self, offset: u32) -> Result<CdevLine, CdevError> {
        self.request(offset, LineRequestFlags::OUTPUT)
    }

    fn request(&mut self, offset: u32, flags: LineRequestFlags) -> Result<CdevLine, CdevError> {
        let handle = self.chip.get_line(offset)?.request(flags.clone(), 0, CONSUMER)?;
        debug!("GPIO line {} requested ({:?})", offset, flags);
        Ok(CdevLine { offset, handle })
    }
}

/// One requested line.
pub struct CdevLine {
    offset: u32,
    handle: LineHandle,
}

impl fmt::Debug for CdevLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdevLine")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl ErrorType for CdevLine {
    type Error = CdevError;
}

impl InputPin for CdevLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.handle.get_value()? != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for CdevLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(self.handle.set_value(0)?)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(self.handle.set_value(1)?)
    }
}
