//! Device selection for inference.

use candle_core::Device;
use tracing::info;

/// Returns the device both classifiers run on.
///
/// An accelerator is only considered when the crate is built with the
/// `metal` or `cuda` feature; otherwise, or when none is present, the CPU.
#[must_use]
pub fn get_device() -> Device {
    let device = accelerator().unwrap_or(Device::Cpu);
    info!("Running inference on {}", describe(&device));
    device
}

#[allow(clippy::missing_const_for_fn)]
fn accelerator() -> Option<Device> {
    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            return Some(device);
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            return Some(device);
        }
    }

    None
}

const fn describe(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "CPU",
        Device::Cuda(_) => "CUDA",
        Device::Metal(_) => "Metal",
    }
}
