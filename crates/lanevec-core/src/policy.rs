//! Allocation policies: which memory arena backs a buffer.

use std::fmt;

/// Selects the memory arena that backs a buffer.
///
/// The policy is recorded next to the buffer when it is allocated and must
/// be passed back unchanged when the buffer is released, because the
/// reclaiming call has to match the arena that produced the memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AllocationPolicy {
    /// Ordinary pageable process memory.
    #[default]
    HostMem,
    /// Page-locked host memory, suitable for asynchronous device transfers.
    PinnedMem,
    /// Managed (unified) memory visible from host and device.
    ManagedMem,
    /// Accelerator-resident memory.
    DeviceMem,
}

impl AllocationPolicy {
    /// Every policy, in declaration order.
    pub const ALL: [AllocationPolicy; 4] = [
        Self::HostMem,
        Self::PinnedMem,
        Self::ManagedMem,
        Self::DeviceMem,
    ];

    /// Stable index of this policy within [`AllocationPolicy::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::HostMem => 0,
            Self::PinnedMem => 1,
            Self::ManagedMem => 2,
            Self::DeviceMem => 3,
        }
    }

    /// Short lowercase name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::HostMem => "host",
            Self::PinnedMem => "pinned",
            Self::ManagedMem => "managed",
            Self::DeviceMem => "device",
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_host() {
        assert_eq!(AllocationPolicy::default(), AllocationPolicy::HostMem);
    }

    #[test]
    fn index_matches_position_in_all() {
        for (i, policy) in AllocationPolicy::ALL.iter().enumerate() {
            assert_eq!(policy.index(), i);
        }
    }

    #[test]
    fn display_uses_short_name() {
        assert_eq!(AllocationPolicy::PinnedMem.to_string(), "pinned");
    }
}
