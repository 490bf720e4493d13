//! Arena configuration parameters.

use lanevec_core::AllocationPolicy;

/// Configuration for a [`SystemArena`](crate::SystemArena).
///
/// Controls the byte budget and the minimum alignment each policy's
/// allocations are rounded up to. Validated at construction; all values
/// are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Upper bound on live bytes across all policies.
    ///
    /// Default: `usize::MAX` (no budget). Requests that would push live
    /// bytes past this fail with `AllocError::CapacityExceeded`.
    pub max_bytes: usize,

    /// Minimum alignment for `PinnedMem` allocations.
    ///
    /// Default: 4096 (page-locked memory is page granular).
    pub pinned_alignment: usize,

    /// Minimum alignment for `ManagedMem` allocations.
    ///
    /// Default: 4096 (managed memory migrates in pages).
    pub managed_alignment: usize,

    /// Minimum alignment for `DeviceMem` allocations.
    ///
    /// Default: 256, the base alignment device allocators guarantee.
    pub device_alignment: usize,
}

impl ArenaConfig {
    /// Default byte budget: unlimited.
    pub const DEFAULT_MAX_BYTES: usize = usize::MAX;

    /// Default pinned alignment: one 4KB page.
    pub const DEFAULT_PINNED_ALIGNMENT: usize = 4096;

    /// Default managed alignment: one 4KB page.
    pub const DEFAULT_MANAGED_ALIGNMENT: usize = 4096;

    /// Default device alignment.
    pub const DEFAULT_DEVICE_ALIGNMENT: usize = 256;

    /// Create a config with default values.
    pub const fn new() -> Self {
        Self {
            max_bytes: Self::DEFAULT_MAX_BYTES,
            pinned_alignment: Self::DEFAULT_PINNED_ALIGNMENT,
            managed_alignment: Self::DEFAULT_MANAGED_ALIGNMENT,
            device_alignment: Self::DEFAULT_DEVICE_ALIGNMENT,
        }
    }

    /// Builder-style setter for [`ArenaConfig::max_bytes`].
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Minimum alignment applied to allocations under `policy`.
    ///
    /// Host allocations use the element type's own alignment.
    pub fn min_alignment(&self, policy: AllocationPolicy) -> usize {
        match policy {
            AllocationPolicy::HostMem => 1,
            AllocationPolicy::PinnedMem => self.pinned_alignment,
            AllocationPolicy::ManagedMem => self.managed_alignment,
            AllocationPolicy::DeviceMem => self.device_alignment,
        }
    }

    /// Check that every alignment is a non-zero power of two.
    ///
    /// Returns the name of the first offending field.
    pub fn validate(&self) -> Result<(), &'static str> {
        let fields = [
            ("pinned_alignment", self.pinned_alignment),
            ("managed_alignment", self.managed_alignment),
            ("device_alignment", self.device_alignment),
        ];
        for (name, value) in fields {
            if !value.is_power_of_two() {
                return Err(name);
            }
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}
