//! String heap walking and reachability.
//!
//! The heap grows down from the top of BASIC memory. Every block is its
//! characters followed by one length byte, so walking from the top the
//! length byte is met first and the characters lie directly below it. A
//! block's address is its first character, which is where live string
//! descriptors point.

use bitvec::prelude::*;
use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::error::{DecodeError, DecodeErrorKind};
use crate::image::MemoryImage;
use crate::petscii;
use crate::value::StringDescriptor;

/// Characters of one string on the heap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapBlock {
    pub address: u16,
    pub content: Vec<u8>,
}

impl HeapBlock {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Address of the length byte, one past the last character
    pub fn end(&self) -> usize {
        self.address as usize + self.content.len()
    }

    pub fn text(&self) -> String {
        petscii::to_text(&self.content)
    }
}

/// Blocks found between the heap top and the lowest block reached
#[derive(Debug, Clone, Default)]
pub struct StringHeap {
    pub top: u16,
    pub floor: u16,
    /// Where the walk stopped
    pub bottom: u16,
    /// Highest block first
    pub blocks: Vec<HeapBlock>,
    pub problems: Vec<DecodeError>,
}

impl StringHeap {
    pub fn block_at(&self, address: u16) -> Option<&HeapBlock> {
        self.blocks.iter().find(|b| b.address == address)
    }

    /// True if `address` lies inside the region the walk was allowed to scan
    pub fn region_contains(&self, address: u16) -> bool {
        address >= self.floor && address < self.top
    }
}

/// Walk the heap from `top` (exclusive) down to `floor`
pub fn walk_string_heap(image: &MemoryImage, top: u16, floor: u16) -> StringHeap {
    let mut heap = StringHeap {
        top,
        floor,
        bottom: top,
        ..Default::default()
    };
    let floor = floor as usize;
    let mut cursor = top as usize;

    while cursor > floor {
        let length_at = cursor - 1;
        let length = match image.byte(length_at) {
            Ok(length) => length,
            Err(kind) => {
                let e = DecodeError::new(length_at, kind);
                warn!("Stopping heap walk: {}", e);
                heap.problems.push(e);
                break;
            }
        };
        if length == 0 {
            // unused byte
            cursor -= 1;
            continue;
        }
        if length_at < floor + length as usize {
            let e = DecodeError::new(length_at, DecodeErrorKind::TruncatedHeap { length });
            warn!("Stopping heap walk: {}", e);
            heap.problems.push(e);
            break;
        }

        let address = length_at - length as usize;
        let content = match image.slice(address, length as usize) {
            Ok(content) => content.to_vec(),
            Err(kind) => {
                let e = DecodeError::new(address, kind);
                warn!("Stopping heap walk: {}", e);
                heap.problems.push(e);
                break;
            }
        };
        trace!("Heap block ${:04x}, {} bytes", address, length);
        heap.blocks.push(HeapBlock {
            address: address as u16,
            content,
        });
        cursor = address;
    }

    heap.bottom = cursor as u16;
    debug!(
        "String heap ${:04x}-${:04x}: {} blocks",
        heap.bottom,
        heap.top,
        heap.blocks.len()
    );
    heap
}

/// Every string descriptor found in the variable and array tables, keyed by
/// the address it points to, in the order they were found
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    references: IndexMap<u16, Vec<String>>,
    descriptors: Vec<StringDescriptor>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, owner: impl Into<String>, descriptor: StringDescriptor) {
        self.references
            .entry(descriptor.pointer)
            .or_default()
            .push(owner.into());
        self.descriptors.push(descriptor);
    }

    pub fn contains(&self, address: u16) -> bool {
        self.references.contains_key(&address)
    }

    /// Names of the variables pointing at `address`
    pub fn owners(&self, address: u16) -> &[String] {
        self.references
            .get(&address)
            .map(|owners| owners.as_slice())
            .unwrap_or(&[])
    }

    /// Number of descriptors, counting duplicates
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Whether anything still references a heap block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Live,
    Garbage,
}

/// Classify each block of `heap`: live iff some descriptor points at it.
/// The result runs parallel to `heap.blocks`.
pub fn classify(heap: &StringHeap, descriptors: &DescriptorSet) -> Vec<BlockStatus> {
    heap.blocks
        .iter()
        .map(|block| {
            if descriptors.contains(block.address) {
                BlockStatus::Live
            } else {
                trace!("Garbage at ${:04x}", block.address);
                BlockStatus::Garbage
            }
        })
        .collect()
}

/// Bytes between the walk's bottom and the heap top that no descriptor
/// covers, i.e. what a garbage collection would give back
pub fn unreferenced_bytes(heap: &StringHeap, descriptors: &DescriptorSet) -> usize {
    let (bottom, top) = (heap.bottom as usize, heap.top as usize);
    if top <= bottom {
        return 0;
    }
    let mut used = bitvec![0; top - bottom];
    let mut mark = |start: usize, end: usize| {
        let (start, end) = (start.max(bottom), end.min(top));
        if start < end {
            used[start - bottom..end - bottom].fill(true);
        }
    };

    for descriptor in &descriptors.descriptors {
        mark(descriptor.pointer as usize, descriptor.end());
    }
    for block in &heap.blocks {
        if descriptors.contains(block.address) {
            // the length byte goes with a live string
            mark(block.end(), block.end() + 1);
        }
    }
    used.count_zeros()
}
