use std::{marker::PhantomData, ptr::NonNull};

/// Non-null pointer to `T`.
pub(crate) type Link<T> = Option<NonNull<T>>;

/// The header written at the start of every node. `repr(C)` keeps `next`
/// first so whatever follows `data` in memory starts at a fixed offset.
#[repr(C)]
pub(crate) struct Node<T> {
    /// Pointer to the next node of the list
    pub next: Link<Self>,
    /// Element of the node
    pub data: T,
}

/// Singly linked list whose nodes live in memory the caller provides.
/// Nodes are only ever appended, never removed.
pub(crate) struct List<T> {
    head: Link<Node<T>>,
    tail: Link<Node<T>>,
    len: usize,
    marker: PhantomData<T>,
}

/// Walks the nodes of a [`List`] from head to tail. Yields raw node pointers
/// because callers usually need to reach past the node into the rest of the
/// memory it was written into.
pub(crate) struct Iter<'a, T> {
    current: Link<Node<T>>,
    remaining: usize,
    marker: PhantomData<&'a T>,
}

impl<T> List<T> {
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a new node at the tail of the list.
    ///
    /// This method never allocates. It receives the `addr` the node has to
    /// be written to, which is how a node ends up at the start of a page we
    /// got from the kernel.
    ///
    /// **SAFETY**: Caller must guarantee that `addr` is valid for writes of a
    /// `Node<T>`, suitably aligned, and outlives the list.
    pub unsafe fn append(&mut self, data: T, addr: NonNull<u8>) -> NonNull<Node<T>> {
        let node = addr.cast::<Node<T>>();

        unsafe {
            node.as_ptr().write(Node { next: None, data });

            if let Some(mut tail) = self.tail {
                tail.as_mut().next = Some(node);
            } else {
                self.head = Some(node);
            }
        }

        self.tail = Some(node);
        self.len += 1;

        node
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            current: self.head,
            remaining: self.len,
            marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = NonNull<Node<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;

        unsafe {
            self.current = node.as_ref().next;
        }
        self.remaining -= 1;

        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = NonNull<Node<T>>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::MaybeUninit;

    #[test]
    fn new_list_is_empty() {
        let list: List<u8> = List::new();

        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert!(list.iter().next().is_none());
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut storage: [MaybeUninit<Node<u32>>; 3] = [const { MaybeUninit::uninit() }; 3];
        let mut list = List::new();

        for (i, slot) in storage.iter_mut().enumerate() {
            let addr = NonNull::from(slot).cast::<u8>();
            unsafe { list.append(i as u32 * 10, addr) };
        }

        let values: Vec<u32> = list.iter().map(|node| unsafe { node.as_ref().data }).collect();

        assert_eq!(list.len(), 3);
        assert_eq!(list.iter().len(), 3);
        assert_eq!(values, vec![0, 10, 20]);
    }
}
