// Swap capacity snapshot via sysinfo(2)
// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CapacityError {
    #[error("cannot obtain system information: {0}")]
    Kernel(#[from] nix::Error),
    #[error("Cannot calculate percentage because total is zero.")]
    ZeroTotalSwap,
}

pub type Result<T> = std::result::Result<T, CapacityError>;

/// Instantaneous swap capacity in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapCapacity {
    pub total: u64,
    pub free: u64,
}

impl SwapCapacity {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }

    /// Free swap as a percentage of total. Fails when total is zero.
    pub fn free_percent(&self) -> Result<f64> {
        if self.total == 0 {
            return Err(CapacityError::ZeroTotalSwap);
        }
        Ok(self.free as f64 * 100.0 / self.total as f64)
    }

    /// Used swap as a percentage of total. Fails when total is zero.
    pub fn used_percent(&self) -> Result<f64> {
        if self.total == 0 {
            return Err(CapacityError::ZeroTotalSwap);
        }
        Ok(self.used() as f64 * 100.0 / self.total as f64)
    }
}

/// Query the kernel for total and free swap.
/// The sysinfo counters are scaled to bytes (mem_unit) by the nix accessors.
pub fn read() -> Result<SwapCapacity> {
    let info = nix::sys::sysinfo::sysinfo()?;
    Ok(SwapCapacity {
        total: info.swap_total(),
        free: info.swap_free(),
    })
}
