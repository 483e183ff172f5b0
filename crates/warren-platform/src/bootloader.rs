use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use warren_bus::Transaction;

use crate::{BuildError, BuildHook, Platform};

#[derive(Debug, Error)]
pub enum BootError {
    #[error("failed to read boot image {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("boot image `{image}` targets unknown bus `{bus}`")]
    UnknownBus { image: String, bus: String },

    #[error("boot image `{image}`: only {written} of {expected} bytes landed at 0x{address:x}")]
    ShortWrite {
        image: String,
        address: u64,
        written: usize,
        expected: usize,
    },
}

/// Bytes to place on a bus before the platform starts running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootImage {
    pub name: String,
    pub bus: String,
    pub address: u64,
    pub data: Vec<u8>,
}

impl BootImage {
    pub fn from_bytes(
        name: impl Into<String>,
        bus: impl Into<String>,
        address: u64,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            address,
            data: data.into(),
        }
    }

    pub fn from_file(
        path: impl AsRef<Path>,
        bus: impl Into<String>,
        address: u64,
    ) -> Result<Self, BootError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| BootError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(path.display().to_string(), bus, address, data))
    }
}

/// Post-build hook loading boot images through untimed debug accesses, in the order they were
/// added. Images must land entirely inside one target.
#[derive(Debug, Default)]
pub struct Bootloader {
    images: Vec<BootImage>,
}

impl Bootloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: BootImage) -> Self {
        self.images.push(image);
        self
    }

    pub fn images(&self) -> &[BootImage] {
        &self.images
    }

    pub fn load(&self, platform: &Platform) -> Result<(), BootError> {
        for image in &self.images {
            let router = platform
                .router(&image.bus)
                .ok_or_else(|| BootError::UnknownBus {
                    image: image.name.clone(),
                    bus: image.bus.clone(),
                })?;

            let mut tx = Transaction::write(image.address, &image.data);
            let written = router.borrow().debug_access(&mut tx);
            if written != image.data.len() {
                return Err(BootError::ShortWrite {
                    image: image.name.clone(),
                    address: image.address,
                    written,
                    expected: image.data.len(),
                });
            }
            info!(
                image = %image.name,
                bus = %image.bus,
                address = format_args!("0x{:x}", image.address),
                len = written,
                "boot image loaded"
            );
        }
        Ok(())
    }
}

impl BuildHook for Bootloader {
    fn after_build(&mut self, platform: &Platform) -> Result<(), BuildError> {
        Ok(self.load(platform)?)
    }
}
