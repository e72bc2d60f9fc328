use std::{mem, ptr::NonNull, slice};

use crate::{
    family::FamilyDescriptor,
    list::{List, Node},
};

/// Overhead of a catalog page in bytes: the [`Node`] header holding the link
/// to the next page. Slots start right after it.
pub(crate) const PAGE_HEADER_SIZE: usize = mem::size_of::<Node<FamilyPage>>();

/// Smallest page that can hold the header and one descriptor.
pub(crate) const MIN_PAGE_SIZE: usize = PAGE_HEADER_SIZE + mem::size_of::<FamilyDescriptor>();

/// A catalog page. As every page is written as a [`Node<FamilyPage>`] at the
/// start of a region we got from the kernel, the page really looks like this:
///
/// ```text
/// +-----------+--------+--------+--------+-----+--------+---------+
/// | next page | slot 0 | slot 1 | slot 2 | ... | slot n | (waste) |
/// +-----------+--------+--------+--------+-----+--------+---------+
///  Node header <------------ FamilyDescriptor slots ------------>
/// ```
///
/// The slot array has no length of its own, it is derived from the page size
/// with [`slots_per_page`].
#[repr(C)]
pub(crate) struct FamilyPage {
    // Marks where the slots start, never read through.
    #[allow(dead_code)]
    families: [FamilyDescriptor; 0],
}

impl FamilyPage {
    pub(crate) const fn new() -> Self {
        Self { families: [] }
    }
}

/// Number of descriptors that fit in a page of `page_size` bytes.
#[inline]
pub(crate) const fn slots_per_page(page_size: usize) -> usize {
    page_size.saturating_sub(PAGE_HEADER_SIZE) / mem::size_of::<FamilyDescriptor>()
}

/// Slots of the page whose node starts at `node`.
///
/// **SAFETY**: `node` must point to a live catalog page of at least
/// `PAGE_HEADER_SIZE + capacity * size_of::<FamilyDescriptor>()` bytes.
#[inline]
pub(crate) unsafe fn slots<'a>(
    node: NonNull<Node<FamilyPage>>,
    capacity: usize,
) -> &'a [FamilyDescriptor] {
    unsafe { slice::from_raw_parts(first_slot(node).as_ptr(), capacity) }
}

/// Mutable version of [`slots`]. Same safety requirements, plus no other
/// reference into the page may be alive.
#[inline]
pub(crate) unsafe fn slots_mut<'a>(
    node: NonNull<Node<FamilyPage>>,
    capacity: usize,
) -> &'a mut [FamilyDescriptor] {
    unsafe { slice::from_raw_parts_mut(first_slot(node).as_ptr(), capacity) }
}

#[inline]
unsafe fn first_slot(node: NonNull<Node<FamilyPage>>) -> NonNull<FamilyDescriptor> {
    // Derived from the page pointer itself and not from `families`, a
    // reference to an empty array can't reach the rest of the page.
    unsafe { node.cast::<u8>().add(PAGE_HEADER_SIZE).cast() }
}

/// First-fit: the first free slot of the first page that has one.
pub(crate) fn find_free_slot(
    pages: &List<FamilyPage>,
    capacity: usize,
) -> Option<(NonNull<Node<FamilyPage>>, usize)> {
    pages.iter().find_map(|node| {
        let slots = unsafe { slots(node, capacity) };
        slots
            .iter()
            .position(FamilyDescriptor::is_free)
            .map(|index| (node, index))
    })
}
