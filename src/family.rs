use std::fmt;

/// Maximum length in bytes of a family name. Longer names are truncated.
pub const MAX_FAMILY_NAME: usize = 64;

/// One registered struct family: a type name and its size in bytes.
///
/// This is the exact record written into a catalog page slot, so the layout
/// is fixed. A `size` of zero marks the slot as free.
///
/// ```text
/// +--------------------------------+--------+
/// |   name (NUL padded, 64 bytes)  |  size  |
/// +--------------------------------+--------+
/// ```
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FamilyDescriptor {
    name: [u8; MAX_FAMILY_NAME],
    size: u32,
}

/// Cuts `name` down to what fits in a slot without splitting a UTF-8
/// character.
pub(crate) fn bounded_name(name: &str) -> &str {
    if name.len() <= MAX_FAMILY_NAME {
        return name;
    }

    let mut end = MAX_FAMILY_NAME;
    while !name.is_char_boundary(end) {
        end -= 1;
    }

    &name[..end]
}

impl FamilyDescriptor {
    /// Builds a descriptor, truncating `name` to [`MAX_FAMILY_NAME`] bytes.
    pub(crate) fn new(name: &str, size: u32) -> Self {
        let name = bounded_name(name);
        let mut bytes = [0; MAX_FAMILY_NAME];
        bytes[..name.len()].copy_from_slice(name.as_bytes());

        Self { name: bytes, size }
    }

    pub fn name(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(MAX_FAMILY_NAME);

        // Only ever written from a `&str` cut on a char boundary.
        std::str::from_utf8(&self.name[..len]).unwrap_or_default()
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub(crate) fn is_free(&self) -> bool {
        self.size == 0
    }
}

impl fmt::Debug for FamilyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyDescriptor")
            .field("name", &self.name())
            .field("size", &self.size)
            .finish()
    }
}

impl fmt::Display for FamilyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.name(), self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_layout_is_fixed() {
        assert_eq!(std::mem::size_of::<FamilyDescriptor>(), MAX_FAMILY_NAME + 4);
        assert_eq!(std::mem::align_of::<FamilyDescriptor>(), 4);
    }

    #[test]
    fn short_names_are_kept() {
        let family = FamilyDescriptor::new("socket_t", 128);

        assert_eq!(family.name(), "socket_t");
        assert_eq!(family.size(), 128);
        assert!(!family.is_free());
        assert_eq!(family.to_string(), "socket_t (128 bytes)");
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "x".repeat(100);
        let family = FamilyDescriptor::new(&long, 8);

        assert_eq!(family.name(), &long[..MAX_FAMILY_NAME]);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 63 ascii bytes followed by a 2 byte character that would straddle the limit.
        let name = format!("{}é", "a".repeat(63));
        let bounded = bounded_name(&name);

        assert_eq!(bounded.len(), 63);
        assert_eq!(FamilyDescriptor::new(&name, 1).name(), bounded);
    }

    #[test]
    fn zeroed_descriptor_is_free() {
        let family = FamilyDescriptor::new("", 0);

        assert!(family.is_free());
        assert_eq!(family.name(), "");
    }
}
