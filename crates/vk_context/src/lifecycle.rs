//! Bring-up state tracking
//!
//! The stage types in [`crate::context`] already make out-of-order steps
//! unrepresentable. The ledger records what actually happened so that
//! teardown can be checked against creation and logged.

use crate::error::{VulkanError, VulkanResult};

/// States of the graphics context, in the only order they may occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing acquired yet
    Uninitialized,
    /// Platform window is open
    WindowOpen,
    /// Vulkan instance exists
    InstanceReady,
    /// Window is bound to a surface
    SurfaceReady,
    /// A physical device has been chosen
    DeviceSelected,
    /// Logical device and queues exist
    DeviceReady,
    /// Swap-chain exists
    SwapChainReady,
    /// Event loop is running
    Running,
    /// Every handle has been released
    TornDown,
}

impl LifecycleState {
    /// The state that must follow this one, if any
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Uninitialized => Some(Self::WindowOpen),
            Self::WindowOpen => Some(Self::InstanceReady),
            Self::InstanceReady => Some(Self::SurfaceReady),
            Self::SurfaceReady => Some(Self::DeviceSelected),
            Self::DeviceSelected => Some(Self::DeviceReady),
            Self::DeviceReady => Some(Self::SwapChainReady),
            Self::SwapChainReady => Some(Self::Running),
            Self::Running => Some(Self::TornDown),
            Self::TornDown => None,
        }
    }
}

/// Owned handles that must be released explicitly
///
/// The physical device is absent on purpose: it belongs to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// GLFW window and its library state
    Window,
    /// Vulkan instance
    Instance,
    /// Window surface
    Surface,
    /// Logical device (owns the queues)
    Device,
    /// Swap-chain and its image views
    Swapchain,
}

/// Records state transitions and live resources for one context
#[derive(Debug)]
pub struct ResourceLedger {
    state: LifecycleState,
    live: Vec<ResourceKind>,
    released: Vec<ResourceKind>,
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLedger {
    /// Create an empty ledger in the `Uninitialized` state
    pub const fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            live: Vec::new(),
            released: Vec::new(),
        }
    }

    /// Current lifecycle state
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Move to `to`, which must be the immediate successor of the current state
    pub fn advance(&mut self, to: LifecycleState) -> VulkanResult<()> {
        let expected = self.state.next();
        if expected != Some(to) {
            return Err(VulkanError::out_of_order_state(expected, to));
        }
        log::debug!("Lifecycle {:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Record that `kind` is now owned
    pub fn acquire(&mut self, kind: ResourceKind) {
        self.live.push(kind);
    }

    /// Record the release of `kind`; only the most recent live resource may go
    pub fn release(&mut self, kind: ResourceKind) -> VulkanResult<()> {
        match self.live.last() {
            Some(&last) if last == kind => {
                self.live.pop();
                self.released.push(kind);
                Ok(())
            }
            last => Err(VulkanError::out_of_order_release(last.copied(), kind)),
        }
    }

    /// Resources still held, oldest first
    pub fn live(&self) -> &[ResourceKind] {
        &self.live
    }

    /// Resources released so far, in release order
    pub fn released(&self) -> &[ResourceKind] {
        &self.released
    }

    /// The order in which the live resources have to be released
    pub fn teardown_order(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.live.iter().rev().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATION: [ResourceKind; 5] = [
        ResourceKind::Window,
        ResourceKind::Instance,
        ResourceKind::Surface,
        ResourceKind::Device,
        ResourceKind::Swapchain,
    ];

    #[test]
    fn test_states_advance_in_order() {
        let mut ledger = ResourceLedger::new();
        let mut state = LifecycleState::Uninitialized;
        while let Some(next) = state.next() {
            ledger.advance(next).unwrap();
            state = next;
        }
        assert_eq!(ledger.state(), LifecycleState::TornDown);
    }

    #[test]
    fn test_skipping_a_state_is_rejected() {
        let mut ledger = ResourceLedger::new();
        ledger.advance(LifecycleState::WindowOpen).unwrap();

        let err = ledger.advance(LifecycleState::SurfaceReady).unwrap_err();
        assert!(matches!(err, VulkanError::LifecycleViolation { .. }));
        assert_eq!(ledger.state(), LifecycleState::WindowOpen);
    }

    #[test]
    fn test_torn_down_is_terminal() {
        assert_eq!(LifecycleState::TornDown.next(), None);
    }

    #[test]
    fn test_teardown_is_reverse_of_creation() {
        let mut ledger = ResourceLedger::new();
        for kind in CREATION {
            ledger.acquire(kind);
        }

        let order: Vec<_> = ledger.teardown_order().collect();
        for kind in &order {
            ledger.release(*kind).unwrap();
        }

        let mut expected = CREATION.to_vec();
        expected.reverse();
        assert_eq!(order, expected);
        assert_eq!(ledger.released(), expected.as_slice());
        assert!(ledger.live().is_empty());
    }

    #[test]
    fn test_release_before_dependents_is_rejected() {
        let mut ledger = ResourceLedger::new();
        for kind in CREATION {
            ledger.acquire(kind);
        }

        assert!(ledger.release(ResourceKind::Device).is_err());
        assert_eq!(ledger.live().len(), CREATION.len());
        assert!(ledger.released().is_empty());
    }

    #[test]
    fn test_release_on_empty_ledger_is_rejected() {
        let mut ledger = ResourceLedger::new();
        assert!(ledger.release(ResourceKind::Window).is_err());
    }

    #[test]
    fn test_partial_bring_up_tears_down_only_what_exists() {
        let mut ledger = ResourceLedger::new();
        ledger.acquire(ResourceKind::Window);
        ledger.acquire(ResourceKind::Instance);

        let order: Vec<_> = ledger.teardown_order().collect();
        assert_eq!(order, vec![ResourceKind::Instance, ResourceKind::Window]);
    }
}
