// Test utilities for building synthetic BASIC memory images
use crate::image::MemoryImage;
use crate::name::{VariableKind, VariableName};
use crate::pointers::{ARYTAB, FRETOP, MEMSIZ, STREND, TXTTAB, VARTAB};
use crate::value::{encode_float, StringDescriptor};
use crate::variables::VARIABLE_SLOT_LEN;

pub const PROGRAM_START: u16 = 0x0801;
pub const HEAP_TOP: u16 = 0xa000;

/// Lays out a program, variables, arrays and string heap the way the BASIC
/// runtime does, then writes the zero page pointers to match
#[derive(Clone)]
pub struct ImageBuilder {
    pub memory: Vec<u8>,
    program: Vec<u8>,
    variables: Vec<[u8; VARIABLE_SLOT_LEN]>,
    arrays: Vec<Vec<u8>>,
    heap_cursor: usize,
    overrides: Vec<(usize, u16)>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            memory: vec![0u8; 0x10000],
            // end-of-program marker
            program: vec![0x00, 0x00],
            variables: Vec::new(),
            arrays: Vec::new(),
            heap_cursor: HEAP_TOP as usize,
            overrides: Vec::new(),
        }
    }

    fn name(name: &str, kind: VariableKind) -> [u8; 2] {
        VariableName::encode(name, kind).unwrap_or_else(|| panic!("invalid name {}", name))
    }

    fn slot(name: [u8; 2], value: &[u8]) -> [u8; VARIABLE_SLOT_LEN] {
        let mut slot = [0u8; VARIABLE_SLOT_LEN];
        slot[..2].copy_from_slice(&name);
        slot[2..2 + value.len()].copy_from_slice(value);
        slot
    }

    fn float_bytes(value: f64) -> [u8; 5] {
        encode_float(value).unwrap_or_else(|| panic!("{} is not exactly representable", value))
    }

    /// Allocate `text` on the string heap and return its descriptor
    pub fn heap_string(&mut self, text: &str) -> StringDescriptor {
        let bytes = text.as_bytes();
        self.heap_cursor -= 1;
        self.memory[self.heap_cursor] = bytes.len() as u8;
        self.heap_cursor -= bytes.len();
        self.memory[self.heap_cursor..self.heap_cursor + bytes.len()].copy_from_slice(bytes);
        StringDescriptor {
            length: bytes.len() as u8,
            pointer: self.heap_cursor as u16,
        }
    }

    /// A heap block nothing references
    pub fn orphan(&mut self, text: &str) -> u16 {
        self.heap_string(text).pointer
    }

    /// Put `text` into the program area and return its descriptor
    pub fn program_literal(&mut self, text: &str) -> StringDescriptor {
        let pointer = PROGRAM_START as usize + self.program.len();
        self.program.extend_from_slice(text.as_bytes());
        StringDescriptor {
            length: text.len() as u8,
            pointer: pointer as u16,
        }
    }

    pub fn integer(mut self, name: &str, value: i16) -> Self {
        let slot = Self::slot(Self::name(name, VariableKind::Integer), &value.to_be_bytes());
        self.variables.push(slot);
        self
    }

    pub fn float(mut self, name: &str, value: f64) -> Self {
        let slot = Self::slot(Self::name(name, VariableKind::Float), &Self::float_bytes(value));
        self.variables.push(slot);
        self
    }

    pub fn string(mut self, name: &str, text: &str) -> Self {
        let descriptor = self.heap_string(text);
        self.string_descriptor(name, descriptor)
    }

    pub fn literal(mut self, name: &str, text: &str) -> Self {
        let descriptor = self.program_literal(text);
        self.string_descriptor(name, descriptor)
    }

    pub fn string_descriptor(mut self, name: &str, descriptor: StringDescriptor) -> Self {
        let slot = Self::slot(Self::name(name, VariableKind::String), &descriptor.to_bytes());
        self.variables.push(slot);
        self
    }

    pub fn function(mut self, name: &str, definition: u16, argument: u16) -> Self {
        let mut value = [0u8; 5];
        value[..2].copy_from_slice(&definition.to_le_bytes());
        value[2..4].copy_from_slice(&argument.to_le_bytes());
        let slot = Self::slot(Self::name(name, VariableKind::Function), &value);
        self.variables.push(slot);
        self
    }

    /// A slot copied verbatim, e.g. with a broken name
    pub fn raw_variable(mut self, slot: [u8; VARIABLE_SLOT_LEN]) -> Self {
        self.variables.push(slot);
        self
    }

    /// Array record with `counts` elements per dimension in DIM order
    pub fn array(mut self, name: &str, kind: VariableKind, counts: &[u16], elements: &[u8]) -> Self {
        let name = Self::name(name, kind);
        let len = 5 + 2 * counts.len() + elements.len();
        let mut record = vec![name[0], name[1]];
        record.extend_from_slice(&(len as u16).to_le_bytes());
        record.push(counts.len() as u8);
        for count in counts.iter().rev() {
            record.extend_from_slice(&count.to_be_bytes());
        }
        record.extend_from_slice(elements);
        self.arrays.push(record);
        self
    }

    pub fn integer_array(self, name: &str, counts: &[u16], values: &[i16]) -> Self {
        let elements: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.array(name, VariableKind::Integer, counts, &elements)
    }

    pub fn float_array(self, name: &str, counts: &[u16], values: &[f64]) -> Self {
        let elements: Vec<u8> = values.iter().flat_map(|v| Self::float_bytes(*v)).collect();
        self.array(name, VariableKind::Float, counts, &elements)
    }

    pub fn string_array(mut self, name: &str, counts: &[u16], values: &[&str]) -> Self {
        let elements: Vec<u8> = values
            .iter()
            .flat_map(|text| self.heap_string(text).to_bytes())
            .collect();
        self.array(name, VariableKind::String, counts, &elements)
    }

    /// Array record copied verbatim
    pub fn raw_array(mut self, record: Vec<u8>) -> Self {
        self.arrays.push(record);
        self
    }

    /// Force a zero page pointer after layout
    pub fn pointer(mut self, zero_page: usize, value: u16) -> Self {
        self.overrides.push((zero_page, value));
        self
    }

    /// Lay everything out and return the whole 64K as a raw image
    pub fn build_bytes(mut self) -> Vec<u8> {
        let mut at = PROGRAM_START as usize;
        self.memory[at..at + self.program.len()].copy_from_slice(&self.program);
        at += self.program.len();

        let variables_start = at;
        for slot in &self.variables {
            self.memory[at..at + VARIABLE_SLOT_LEN].copy_from_slice(slot);
            at += VARIABLE_SLOT_LEN;
        }
        let arrays_start = at;
        for record in &self.arrays {
            self.memory[at..at + record.len()].copy_from_slice(record);
            at += record.len();
        }
        let arrays_end = at;

        let mut pointers = vec![
            (TXTTAB, PROGRAM_START),
            (VARTAB, variables_start as u16),
            (ARYTAB, arrays_start as u16),
            (STREND, arrays_end as u16),
            (FRETOP, self.heap_cursor as u16),
            (MEMSIZ, HEAP_TOP),
        ];
        pointers.extend(self.overrides.iter().copied());
        for (zero_page, value) in pointers {
            self.memory[zero_page..zero_page + 2].copy_from_slice(&value.to_le_bytes());
        }
        self.memory
    }

    pub fn build(self) -> MemoryImage {
        MemoryImage::from_raw(self.build_bytes())
    }
}
