use std::fmt::Write;

use crate::arrays::ArrayEntry;
use crate::config::Config;
use crate::dump::{element_name, ResolvedString, VariableDump};
use crate::value::{format_float, ScalarValue};

/// Render one value. Strings are quoted and tagged with where their
/// characters live.
pub fn format_value(dump: &VariableDump, value: &ScalarValue) -> String {
    match value {
        ScalarValue::Float(v) => format_float(*v),
        ScalarValue::Integer(v) => v.to_string(),
        ScalarValue::Function(f) => format!(
            "DEF@${:04X} VAR@${:04X} ${:02X}",
            f.definition, f.argument, f.extra
        ),
        ScalarValue::String(descriptor) => {
            let resolved = dump.resolve(*descriptor);
            let text = resolved.text();
            match resolved {
                ResolvedString::Heap { address, content } => format!(
                    "\"{}\" [heap ${:04X}:${:04X}]",
                    text,
                    address,
                    address as usize + content.len()
                ),
                ResolvedString::Program { address, content } => format!(
                    "\"{}\" [program ${:04X}:${:04X}]",
                    text,
                    address,
                    address as usize + content.len()
                ),
                ResolvedString::Empty => "\"\"".to_string(),
                ResolvedString::Unresolved { inside_heap } => format!(
                    "\"\" <unresolved ${:04X}, {} bytes, {} heap>",
                    descriptor.pointer,
                    descriptor.length,
                    if inside_heap { "inside" } else { "outside" }
                ),
            }
        }
    }
}

/// DIM statement style dimensions, `A%(9,4)`
fn dim_signature(array: &ArrayEntry) -> String {
    let dims: Vec<String> = array
        .dimensions
        .iter()
        .map(|count| (*count as i32 - 1).to_string())
        .collect();
    format!("{}({})", array.name, dims.join(","))
}

/// Textual listing of a decoded dump
pub fn render(dump: &VariableDump, config: &Config) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_report(&mut out, dump, config);
    out
}

fn write_report(out: &mut String, dump: &VariableDump, config: &Config) -> std::fmt::Result {
    let p = &dump.pointers;
    writeln!(out, "Beginning of BASIC program is at ${:04x}.", p.program_start)?;
    writeln!(out, "Variables begin at ${:04x}.", p.variables_start)?;
    writeln!(out, "Array variables begin at ${:04x}.", p.arrays_start)?;
    writeln!(out, "Array variables end at ${:04x}.", p.arrays_end)?;
    writeln!(
        out,
        "Top of string heap is ${:04x}, lowest string at ${:04x}.",
        p.heap_top, p.heap_bottom
    )?;
    if config.show_regions {
        writeln!(out)?;
        write!(out, "{}", p)?;
    }

    writeln!(out)?;
    writeln!(out, "Variables:")?;
    for variable in &dump.variables {
        match variable.value {
            ScalarValue::Function(_) => writeln!(
                out,
                "{} @ ${:04X} = {}",
                variable.name,
                variable.address,
                format_value(dump, &variable.value)
            )?,
            _ => writeln!(
                out,
                "{} = {}",
                variable.name,
                format_value(dump, &variable.value)
            )?,
        }
    }

    writeln!(out)?;
    writeln!(out, "Arrays:")?;
    for array in &dump.arrays {
        writeln!(
            out,
            "{} = {} elements, {} bytes at ${:04X}",
            dim_signature(array),
            array.elements.len(),
            array.record_len,
            array.address
        )?;
        if config.show_elements {
            for (i, element) in array.elements.iter().enumerate() {
                writeln!(
                    out,
                    "  {} = {}",
                    element_name(array, i),
                    format_value(dump, element)
                )?;
            }
        }
    }

    if config.show_heap {
        writeln!(out)?;
        writeln!(out, "Heap strings:")?;
        for block in &dump.heap.blocks {
            let owners = dump.descriptors.owners(block.address);
            let owned_by = if owners.is_empty() {
                "garbage".to_string()
            } else {
                format!("<- {}", owners.join(", "))
            };
            writeln!(
                out,
                "${:04X} ({} bytes): \"{}\" {}",
                block.address,
                block.len(),
                block.text(),
                owned_by
            )?;
        }
    }

    if config.show_garbage {
        writeln!(out)?;
        writeln!(out, "Garbage strings:")?;
        for block in dump.garbage() {
            writeln!(
                out,
                "${:04X} ({} bytes): \"{}\"",
                block.address,
                block.len(),
                block.text()
            )?;
        }
        writeln!(
            out,
            "{} heap blocks, {} garbage, {} bytes reclaimable.",
            dump.heap.blocks.len(),
            dump.garbage().count(),
            dump.unreferenced_bytes
        )?;
    }

    if !dump.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings:")?;
        for warning in &dump.warnings {
            writeln!(out, "{}", warning)?;
        }
    }
    Ok(())
}
