use std::{
    fmt,
    io::{self, Write},
    marker::PhantomData,
    ptr::NonNull,
};

use tracing::debug;

use crate::{
    config::CatalogConfig,
    error::{CatalogError, Result},
    family::{FamilyDescriptor, bounded_name},
    kernel,
    list::{List, Node},
    page::{self, FamilyPage},
};

/// Registry of every struct family the memory manager knows about.
///
/// Descriptors are packed into pages taken straight from the kernel. Pages
/// are chained in a linked list, and a new one is only mapped when every
/// slot of the existing ones is taken:
///
/// ```text
/// +------+----------------------------+      +------+----------------------------+
/// | next | family | family | ... |    | ---> | next | family |      | ... |      |
/// +------+----------------------------+      +------+----------------------------+
/// ```
///
/// Pages are never given back to the kernel, the catalog only grows.
pub struct FamilyCatalog {
    /// Linked list of catalog pages, in the order they were mapped.
    pages: List<FamilyPage>,
    /// Size in bytes of every catalog page.
    page_size: usize,
    /// Descriptor slots per page. See [`page::slots_per_page`].
    capacity: usize,
}

// The catalog is the only owner of its pages. Nothing else points into them.
unsafe impl Send for FamilyCatalog {}

/// One catalog page, as seen while iterating.
pub struct PageView<'a> {
    index: usize,
    node: NonNull<Node<FamilyPage>>,
    capacity: usize,
    marker: PhantomData<&'a FamilyCatalog>,
}

impl<'a> PageView<'a> {
    /// Zero based position of the page in the catalog.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Occupied slots of the page, in slot order.
    pub fn families(&self) -> impl Iterator<Item = &'a FamilyDescriptor> + use<'a> {
        let slots: &'a [FamilyDescriptor] = unsafe { page::slots(self.node, self.capacity) };
        slots.iter().filter(|family| !family.is_free())
    }

    pub fn free_slots(&self) -> usize {
        self.capacity - self.families().count()
    }
}

impl FamilyCatalog {
    /// Creates an empty catalog whose pages have the native page size.
    pub fn new() -> Self {
        Self::with_config(CatalogConfig::from_system())
    }

    pub fn with_config(config: CatalogConfig) -> Self {
        let page_size = config.page_size();
        let capacity = page::slots_per_page(page_size);

        debug!(page_size, capacity, "family catalog initialized");

        Self {
            pages: List::new(),
            page_size,
            capacity,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// How many descriptors fit in one catalog page.
    pub fn capacity_per_page(&self) -> usize {
        self.capacity
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of registered families.
    pub fn len(&self) -> usize {
        self.families().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a new struct family called `name` whose instances are
    /// `size` bytes long.
    ///
    /// Names longer than [`crate::MAX_FAMILY_NAME`] bytes are truncated, and
    /// the truncated name is what has to be unique. The descriptor goes to the
    /// first free slot found walking pages and slots in order. If there is no
    /// free slot, one new page is mapped and the descriptor takes its first
    /// slot.
    ///
    /// `size` is checked against the page size before it is narrowed to the
    /// `u32` a slot stores, so anything that doesn't fit is oversized.
    ///
    /// On error the catalog is left untouched.
    pub fn register_family(&mut self, name: &str, size: usize) -> Result<()> {
        if name.is_empty() || name.contains('\0') {
            return Err(CatalogError::InvalidName(name.to_owned()));
        }

        if size == 0 {
            return Err(CatalogError::ZeroSizedFamily {
                name: name.to_owned(),
            });
        }

        let oversized = || CatalogError::OversizedFamily {
            name: name.to_owned(),
            size,
            page_size: self.page_size,
        };

        if size > self.page_size {
            return Err(oversized());
        }

        let size = u32::try_from(size).map_err(|_| oversized())?;

        let name = bounded_name(name);

        if self.lookup(name).is_some() {
            return Err(CatalogError::AlreadyRegistered {
                name: name.to_owned(),
            });
        }

        let family = FamilyDescriptor::new(name, size);

        match page::find_free_slot(&self.pages, self.capacity) {
            Some((node, index)) => {
                unsafe { page::slots_mut(node, self.capacity)[index] = family };
                debug!(name, size, index, "registered family");
                Ok(())
            }
            None => self.grow(family),
        }
    }

    /// Maps a new page, stores `family` in its first slot and appends it to
    /// the list. Nothing is linked until the page is fully written.
    fn grow(&mut self, family: FamilyDescriptor) -> Result<()> {
        let addr = kernel::acquire(1, self.page_size)?;

        unsafe {
            // The page comes zeroed, so every other slot is already free.
            page::slots_mut(addr.cast(), self.capacity)[0] = family;
            self.pages.append(FamilyPage::new(), addr);
        }

        debug!(
            name = family.name(),
            size = family.size(),
            pages = self.pages.len(),
            "registered family on a new page"
        );

        Ok(())
    }

    /// Finds the family called `name`. Not finding it is a normal outcome.
    ///
    /// `name` is truncated to [`crate::MAX_FAMILY_NAME`] bytes like it is on
    /// registration, so two long names sharing that prefix find the same
    /// family.
    pub fn lookup(&self, name: &str) -> Option<&FamilyDescriptor> {
        if self.pages.is_empty() {
            return None;
        }

        let name = bounded_name(name);
        self.families().find(|family| family.name() == name)
    }

    /// Pages in catalog order. Each call starts a fresh traversal.
    pub fn pages(&self) -> impl Iterator<Item = PageView<'_>> {
        let capacity = self.capacity;

        self.pages
            .iter()
            .enumerate()
            .map(move |(index, node)| PageView {
                index,
                node,
                capacity,
                marker: PhantomData,
            })
    }

    /// Every registered family, page by page, in slot order. This is the
    /// same order [`Self::lookup`] and [`Self::register_family`] scan in.
    pub fn families(&self) -> impl Iterator<Item = &FamilyDescriptor> {
        self.pages().flat_map(|page| page.families())
    }

    /// Calls `visitor` with the page index and descriptor of every
    /// registered family, in [`Self::families`] order.
    pub fn for_each_family<F>(&self, mut visitor: F)
    where
        F: FnMut(usize, &FamilyDescriptor),
    {
        for page in self.pages() {
            for family in page.families() {
                visitor(page.index(), family);
            }
        }
    }

    /// Writes a listing of every family grouped by page.
    pub fn write_report<W: Write>(&self, mut writer: W) -> Result<()> {
        if self.pages.is_empty() {
            writeln!(writer, "No registered families")?;
            return Ok(());
        }

        for page in self.pages() {
            writeln!(writer, "Page {} families:", page.index() + 1)?;
            for family in page.families() {
                writeln!(writer, "  {family}")?;
            }
        }

        Ok(())
    }

    /// [`Self::write_report`] to stdout.
    pub fn print_registered_families(&self) -> Result<()> {
        self.write_report(io::stdout().lock())
    }
}

impl Default for FamilyCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FamilyCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyCatalog")
            .field("page_size", &self.page_size)
            .field("capacity", &self.capacity)
            .field("pages", &self.pages.len())
            .field("families", &self.families().collect::<Vec<_>>())
            .finish()
    }
}
