#![crate_name = "cbmvars"]

#[macro_use]
extern crate lazy_static;

pub mod arrays;
pub mod config;
pub mod dump;
pub mod error;
pub mod heap;
pub mod image;
pub mod monitor;
pub mod name;
pub mod petscii;
pub mod pointers;
pub mod report;
pub mod source;
pub mod test_utils;
pub mod value;
pub mod variables;

pub use crate::config::Config;
pub use crate::dump::{analyse, VariableDump};
pub use crate::error::{DecodeError, DumpError, Warning};
pub use crate::image::{DumpFormat, MemoryImage};


/*
Memory map of a running BASIC V2 program
        0002b   TXTTAB  start of program text
        0002d   VARTAB  simple variables, 7 bytes each
        0002f   ARYTAB  arrays
        00031   STREND  end of arrays, free memory begins
        00033   FRETOP  lowest string on the heap
        00037   MEMSIZ  top of the string heap
*/
