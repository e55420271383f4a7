//! Audio output devices.
//!
//! The player talks to sound hardware only through [`OutputDevice`]. The
//! real implementation is backed by `rodio`; tests use a scripted fake.

mod device;
#[cfg(test)]
pub(crate) mod fake;
mod rodio_output;

pub use device::OutputDevice;
pub use rodio_output::RodioOutput;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no audio output available: {0}")]
    Unavailable(String),
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("nothing loaded")]
    NothingLoaded,
}
