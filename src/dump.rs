use log::{debug, info};

use crate::arrays::{decode_array_table, ArrayEntry};
use crate::error::{DumpError, UnresolvedStringReference, Warning};
use crate::heap::{
    classify, unreferenced_bytes, walk_string_heap, BlockStatus, DescriptorSet, HeapBlock,
    StringHeap,
};
use crate::image::MemoryImage;
use crate::petscii;
use crate::pointers::BasicPointers;
use crate::value::StringDescriptor;
use crate::variables::{decode_variable_table, VariableEntry};

/// Where a string value's characters were found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedString {
    /// A block on the string heap
    Heap { address: u16, content: Vec<u8> },
    /// A literal inside the BASIC program text
    Program { address: u16, content: Vec<u8> },
    Empty,
    /// Nothing readable at the pointer. `inside_heap` tells a pointer into
    /// the middle of the scanned heap from one that misses it entirely.
    Unresolved { inside_heap: bool },
}

impl ResolvedString {
    pub fn text(&self) -> String {
        match self {
            ResolvedString::Heap { content, .. } | ResolvedString::Program { content, .. } => {
                petscii::to_text(content)
            }
            ResolvedString::Empty | ResolvedString::Unresolved { .. } => String::new(),
        }
    }

    pub fn on_heap(&self) -> bool {
        matches!(self, ResolvedString::Heap { .. })
    }
}

/// Everything recovered from one memory image
#[derive(Debug, Clone)]
pub struct VariableDump {
    pub pointers: BasicPointers,
    pub variables: Vec<VariableEntry>,
    pub arrays: Vec<ArrayEntry>,
    pub heap: StringHeap,
    pub descriptors: DescriptorSet,
    /// Parallel to `heap.blocks`
    pub status: Vec<BlockStatus>,
    pub unreferenced_bytes: usize,
    pub warnings: Vec<Warning>,
    image: MemoryImage,
}

/// Decode the variables, arrays and string heap of `image`. Only a zero
/// page that cannot be read is fatal; every other problem becomes a warning.
pub fn analyse(image: MemoryImage) -> Result<VariableDump, DumpError> {
    let pointers = BasicPointers::resolve(&image)?;
    let mut warnings = vec![];

    for (region, start, end) in [
        ("variable table", pointers.variables_start, pointers.arrays_start),
        ("array table", pointers.arrays_start, pointers.arrays_end),
        ("string heap", pointers.heap_floor(), pointers.heap_top),
    ] {
        if end < start {
            warnings.push(Warning::InconsistentPointers { region, start, end });
        }
    }

    let variables = decode_variable_table(&image, pointers.variables_start, pointers.arrays_start);
    warnings.extend(variables.skipped.into_iter().map(Warning::Variable));

    let arrays = decode_array_table(&image, pointers.arrays_start, pointers.arrays_end);
    warnings.extend(arrays.problems.into_iter().map(Warning::Array));

    let heap = walk_string_heap(&image, pointers.heap_top, pointers.heap_floor());
    warnings.extend(heap.problems.iter().cloned().map(Warning::Heap));

    let descriptors = collect_descriptors(&variables.entries, &arrays.entries);
    let status = classify(&heap, &descriptors);
    let unreferenced = unreferenced_bytes(&heap, &descriptors);

    let mut dump = VariableDump {
        pointers,
        variables: variables.entries,
        arrays: arrays.entries,
        heap,
        descriptors,
        status,
        unreferenced_bytes: unreferenced,
        warnings,
        image,
    };

    let unresolved = dump.unresolved_strings();
    dump.warnings
        .extend(unresolved.into_iter().map(Warning::UnresolvedString));

    info!(
        "{} variables, {} arrays, {} heap blocks ({} garbage), {} warnings",
        dump.variables.len(),
        dump.arrays.len(),
        dump.heap.blocks.len(),
        dump.garbage().count(),
        dump.warnings.len()
    );
    Ok(dump)
}

/// Gather every string descriptor with the name of its owner
pub fn collect_descriptors(variables: &[VariableEntry], arrays: &[ArrayEntry]) -> DescriptorSet {
    let mut set = DescriptorSet::new();
    for variable in variables {
        if let Some(descriptor) = variable.value.as_string() {
            set.insert(variable.name.to_string(), descriptor);
        }
    }
    for array in arrays {
        for (i, element) in array.elements.iter().enumerate() {
            if let Some(descriptor) = element.as_string() {
                set.insert(element_name(array, i), descriptor);
            }
        }
    }
    debug!("Collected {} string descriptors", set.len());
    set
}

/// `A$(1,2)` style name of an array element
pub fn element_name(array: &ArrayEntry, flat: usize) -> String {
    let subscripts: Vec<String> = array
        .subscripts(flat)
        .iter()
        .map(|s| s.to_string())
        .collect();
    format!("{}({})", array.name, subscripts.join(","))
}

impl VariableDump {
    /// Heap blocks that no descriptor references
    pub fn garbage(&self) -> impl Iterator<Item = &HeapBlock> {
        self.heap
            .blocks
            .iter()
            .zip(self.status.iter())
            .filter(|(_, status)| **status == BlockStatus::Garbage)
            .map(|(block, _)| block)
    }

    /// Find the characters a descriptor points at
    pub fn resolve(&self, descriptor: StringDescriptor) -> ResolvedString {
        if descriptor.length == 0 {
            return ResolvedString::Empty;
        }
        if let Some(block) = self.heap.block_at(descriptor.pointer) {
            if block.len() != descriptor.length as usize {
                debug!(
                    "Descriptor length {} differs from heap block length {} at ${:04x}",
                    descriptor.length,
                    block.len(),
                    block.address
                );
            }
            return ResolvedString::Heap {
                address: block.address,
                content: block.content.clone(),
            };
        }
        if descriptor.pointer < self.pointers.variables_start {
            if let Ok(content) = self
                .image
                .slice(descriptor.pointer as usize, descriptor.length as usize)
            {
                return ResolvedString::Program {
                    address: descriptor.pointer,
                    content: content.to_vec(),
                };
            }
        }
        ResolvedString::Unresolved {
            inside_heap: self.heap.region_contains(descriptor.pointer),
        }
    }

    fn unresolved_strings(&self) -> Vec<UnresolvedStringReference> {
        let mut unresolved = vec![];
        let mut check = |owner: String, descriptor: StringDescriptor| {
            if matches!(self.resolve(descriptor), ResolvedString::Unresolved { .. }) {
                unresolved.push(UnresolvedStringReference { owner, descriptor });
            }
        };
        for variable in &self.variables {
            if let Some(descriptor) = variable.value.as_string() {
                check(variable.name.to_string(), descriptor);
            }
        }
        for array in &self.arrays {
            for (i, element) in array.elements.iter().enumerate() {
                if let Some(descriptor) = element.as_string() {
                    check(element_name(array, i), descriptor);
                }
            }
        }
        unresolved
    }
}
