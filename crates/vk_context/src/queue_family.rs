//! Queue family discovery

use std::collections::BTreeSet;

use ash::vk;

use crate::error::VulkanResult;

/// Graphics and present family indices as discovered so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// First family supporting graphics operations
    pub graphics: Option<u32>,
    /// First family able to present to the surface
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// Both roles have a family
    pub const fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    /// The resolved pair, if complete
    pub const fn complete(self) -> Option<QueueFamilies> {
        match (self.graphics, self.present) {
            (Some(graphics), Some(present)) => Some(QueueFamilies { graphics, present }),
            _ => None,
        }
    }
}

/// A complete family assignment; the two indices may be equal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    /// Graphics family index
    pub graphics: u32,
    /// Present family index
    pub present: u32,
}

impl QueueFamilies {
    /// Distinct family indices, one queue request each
    pub fn unique(&self) -> BTreeSet<u32> {
        [self.graphics, self.present].into_iter().collect()
    }

    /// Graphics and present run on the same family
    pub const fn is_shared(&self) -> bool {
        self.graphics == self.present
    }
}

/// Walk `families` in index order and pick the first graphics and the first
/// present family
///
/// `supports_present` is asked once per visited index. The walk stops at the
/// first index where both roles are filled.
pub fn find_queue_families<F>(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: F,
) -> VulkanResult<QueueFamilyIndices>
where
    F: FnMut(u32) -> VulkanResult<bool>,
{
    let mut indices = QueueFamilyIndices::default();

    for (index, family) in (0u32..).zip(families) {
        if indices.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics = Some(index);
        }

        if supports_present(index)? && indices.present.is_none() {
            indices.present = Some(index);
        }

        if indices.is_complete() {
            break;
        }
    }

    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_family_serves_both_roles() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)];
        let indices = find_queue_families(&families, |_| Ok(true)).unwrap();

        let resolved = indices.complete().unwrap();
        assert_eq!(resolved, QueueFamilies { graphics: 0, present: 0 });
        assert!(resolved.is_shared());
        assert_eq!(resolved.unique().len(), 1);
    }

    #[test]
    fn test_split_families() {
        let families = [family(vk::QueueFlags::GRAPHICS), family(vk::QueueFlags::TRANSFER)];
        let indices = find_queue_families(&families, |index| Ok(index == 1)).unwrap();

        let resolved = indices.complete().unwrap();
        assert_eq!(resolved, QueueFamilies { graphics: 0, present: 1 });
        assert!(!resolved.is_shared());
        assert_eq!(resolved.unique().into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_stops_once_complete() {
        // Index 2 would also qualify for both roles but must never be looked at
        let families = [
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let mut visited = Vec::new();
        let indices = find_queue_families(&families, |index| {
            visited.push(index);
            Ok(true)
        })
        .unwrap();

        assert_eq!(indices, QueueFamilyIndices { graphics: Some(1), present: Some(0) });
        assert_eq!(visited, vec![0, 1]);
    }

    #[test]
    fn test_first_match_is_kept() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let indices = find_queue_families(&families, |index| Ok(index >= 1)).unwrap();

        assert_eq!(indices.graphics, Some(1));
        assert_eq!(indices.present, Some(1));
    }

    #[test]
    fn test_no_present_support_is_incomplete() {
        let families = [family(vk::QueueFlags::GRAPHICS), family(vk::QueueFlags::COMPUTE)];
        let indices = find_queue_families(&families, |_| Ok(false)).unwrap();

        assert!(!indices.is_complete());
        assert_eq!(indices.graphics, Some(0));
        assert_eq!(indices.complete(), None);
    }

    #[test]
    fn test_empty_family_list_is_incomplete() {
        let indices = find_queue_families(&[], |_| Ok(true)).unwrap();
        assert_eq!(indices, QueueFamilyIndices::default());
    }

    #[test]
    fn test_present_query_error_propagates() {
        let families = [family(vk::QueueFlags::GRAPHICS)];
        let result = find_queue_families(&families, |_| {
            Err(crate::error::VulkanError::Api(vk::Result::ERROR_SURFACE_LOST_KHR))
        });
        assert!(result.is_err());
    }
}
