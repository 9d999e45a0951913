// MIT License
//
// Copyright (c) 2024 Gregory Meyer
//
// Permission is hereby granted, free of charge, to any person
// obtaining a copy of this software and associated documentation files
// (the "Software"), to deal in the Software without restriction,
// including without limitation the rights to use, copy, modify, merge,
// publish, distribute, sublicense, and/or sell copies of the Software,
// and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS
// BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN
// ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use crate::{Key, Value};

/// A key/value node, owned by the node before it (or the chain head).
#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) key: Key,
    pub(crate) value: Value,
    next: Link,
}

type Link = Option<Box<Entry>>;

/// The singly linked list of entries that hash to one bucket.
///
/// New entries are pushed at the head, so a head-to-tail scan meets the most
/// recently inserted entry for a key first.
#[derive(Debug, Default)]
pub(crate) struct Chain {
    head: Link,
}

impl Chain {
    pub(crate) fn new() -> Chain {
        Chain { head: None }
    }

    pub(crate) fn push_front(&mut self, key: Key, value: Value) {
        let next = self.head.take();
        self.head = Some(Box::new(Entry { key, value, next }));
    }

    pub(crate) fn find(&self, key: Key) -> Option<&Entry> {
        self.iter().find(|entry| entry.key == key)
    }

    /// Unlinks the first entry matching `key` and hands it to the caller.
    pub(crate) fn unlink(&mut self, key: Key) -> Option<Box<Entry>> {
        let mut cursor = &mut self.head;

        while cursor.as_ref().is_some_and(|entry| entry.key != key) {
            cursor = &mut cursor.as_mut()?.next;
        }

        let mut unlinked = cursor.take()?;
        *cursor = unlinked.next.take();

        Some(unlinked)
    }

    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.iter().count()
    }

    /// Frees every entry, returning how many there were.
    pub(crate) fn clear(&mut self) -> usize {
        let mut freed = 0;
        let mut link = self.head.take();

        while let Some(mut entry) = link {
            link = entry.next.take();
            freed += 1;
        }

        freed
    }
}

impl Drop for Chain {
    // the default drop glue recurses once per node
    fn drop(&mut self) {
        self.clear();
    }
}

pub(crate) struct Iter<'a> {
    next: Option<&'a Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.next?;
        self.next = entry.next.as_deref();

        Some(entry)
    }
}
