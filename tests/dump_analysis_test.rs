// End to end decoding of synthetic BASIC memory images
use cbmvars::dump::{analyse, ResolvedString};
use cbmvars::error::{DecodeErrorKind, DumpError, Warning};
use cbmvars::image::{DumpFormat, MemoryImage};
use cbmvars::name::VariableKind;
use cbmvars::pointers::{ARYTAB, FRETOP, STREND, VARTAB};
use cbmvars::test_utils::ImageBuilder;
use cbmvars::value::{ScalarValue, StringDescriptor};

use test_log::test;

fn three_variables() -> ImageBuilder {
    ImageBuilder::new()
        .integer("I", 5)
        .float("A", 3.5)
        .string("S", "HI")
}

#[test]
fn test_three_variables_no_garbage() {
    let dump = analyse(three_variables().build()).expect("Should decode");

    assert_eq!(dump.variables.len(), 3);
    let names: Vec<String> = dump.variables.iter().map(|v| v.name.to_string()).collect();
    assert_eq!(names, vec!["I%", "A", "S$"]);

    assert_eq!(dump.variables[0].name.kind(), VariableKind::Integer);
    assert_eq!(dump.variables[0].value, ScalarValue::Integer(5));
    assert_eq!(dump.variables[1].name.kind(), VariableKind::Float);
    assert_eq!(dump.variables[1].value, ScalarValue::Float(3.5));
    assert_eq!(dump.variables[2].name.kind(), VariableKind::String);

    let descriptor = dump.variables[2].value.as_string().unwrap();
    let resolved = dump.resolve(descriptor);
    assert!(resolved.on_heap());
    assert_eq!(resolved.text(), "HI");

    assert_eq!(dump.garbage().count(), 0);
    assert!(dump.warnings.is_empty(), "warnings: {:?}", dump.warnings);
    assert_eq!(dump.unreferenced_bytes, 0);
}

#[test]
fn test_orphaned_block_is_garbage() {
    let mut builder = three_variables();
    builder.orphan("XY");
    let dump = analyse(builder.build()).expect("Should decode");

    assert_eq!(dump.variables.len(), 3);
    let garbage: Vec<_> = dump.garbage().collect();
    assert_eq!(garbage.len(), 1);
    assert_eq!(garbage[0].content, b"XY".to_vec());
    assert_eq!(garbage[0].address, 0x9ffa);
    assert_eq!(garbage[0].text(), "XY");
    assert_eq!(dump.unreferenced_bytes, 3);
}

#[test]
fn test_heap_string_text_matches_block() {
    let dump = analyse(
        ImageBuilder::new()
            .string("A", "FIRST")
            .string("B", "SECOND")
            .string_array("C", &[2], &["X", "YZ"])
            .build(),
    )
    .unwrap();

    for variable in &dump.variables {
        let descriptor = variable.value.as_string().unwrap();
        let block = dump.heap.block_at(descriptor.pointer).unwrap();
        assert_eq!(dump.resolve(descriptor).text(), block.text());
    }
    let array = &dump.arrays[0];
    let texts: Vec<String> = array
        .elements
        .iter()
        .map(|e| dump.resolve(e.as_string().unwrap()).text())
        .collect();
    assert_eq!(texts, vec!["X", "YZ"]);
    let second = array.elements[1].as_string().unwrap();
    assert_eq!(dump.descriptors.owners(second.pointer), ["C$(1)".to_string()]);
    assert_eq!(dump.garbage().count(), 0);
}

#[test]
fn test_malformed_variable_is_skipped() {
    let dump = analyse(
        ImageBuilder::new()
            .integer("I", 1)
            .raw_variable([0x5b, 0x00, 1, 2, 3, 4, 5])
            .integer("J", 2)
            .string("S", "OK")
            .build(),
    )
    .unwrap();

    let names: Vec<String> = dump.variables.iter().map(|v| v.name.to_string()).collect();
    assert_eq!(names, vec!["I%", "J%", "S$"]);
    assert_eq!(dump.warnings.len(), 1);
    match &dump.warnings[0] {
        Warning::Variable(e) => {
            assert_eq!(e.offset, dump.pointers.variables_start as usize + 7);
            assert_eq!(e.kind, DecodeErrorKind::UnrecognizedName { bytes: [0x5b, 0x00] });
        }
        other => panic!("unexpected warning {:?}", other),
    }
}

#[test]
fn test_arrays_follow_variables() {
    let dump = analyse(
        ImageBuilder::new()
            .float("X", 1.0)
            .integer_array("M", &[2, 3], &[1, 2, 3, 4, 5, 6])
            .float_array("F", &[2], &[0.5, -2.0])
            .array("E", VariableKind::Float, &[], &[])
            .build(),
    )
    .unwrap();

    assert_eq!(dump.arrays.len(), 3);
    for array in &dump.arrays {
        assert_eq!(array.elements.len(), array.declared_len());
    }
    assert_eq!(dump.arrays[0].dimensions, vec![2, 3]);
    assert_eq!(dump.arrays[1].elements, vec![ScalarValue::Float(0.5), ScalarValue::Float(-2.0)]);
    assert!(dump.arrays[2].elements.is_empty());
    assert!(dump.warnings.is_empty());
}

#[test]
fn test_program_literal_and_unresolved() {
    let mut builder = ImageBuilder::new().literal("L", "HELLO");
    let heap_pointer = builder.heap_string("GONE").pointer;
    let dump = analyse(
        builder
            .string_descriptor("D", StringDescriptor { length: 3, pointer: heap_pointer + 1 })
            .string_descriptor("E", StringDescriptor { length: 0, pointer: 0 })
            .build(),
    )
    .unwrap();

    let literal = dump.resolve(dump.variables[0].value.as_string().unwrap());
    match &literal {
        ResolvedString::Program { content, .. } => assert_eq!(content, b"HELLO"),
        other => panic!("expected program literal, got {:?}", other),
    }
    assert!(!literal.on_heap());

    let dangling = dump.variables[1].value.as_string().unwrap();
    assert_eq!(
        dump.resolve(dangling),
        ResolvedString::Unresolved { inside_heap: true }
    );
    assert_eq!(dump.resolve(dump.variables[2].value.as_string().unwrap()), ResolvedString::Empty);

    // the block D misses is not referenced by anyone
    assert_eq!(dump.garbage().count(), 1);
    let unresolved: Vec<_> = dump
        .warnings
        .iter()
        .filter_map(|w| match w {
            Warning::UnresolvedString(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].owner, "D$");
}

#[test]
fn test_pointer_outside_heap() {
    let dump = analyse(
        three_variables()
            .string_descriptor("F", StringDescriptor { length: 3, pointer: 0x5000 })
            .build(),
    )
    .unwrap();

    let free = dump.variables[3].value.as_string().unwrap();
    assert!(!dump.heap.region_contains(free.pointer));
    assert_eq!(dump.resolve(free), ResolvedString::Unresolved { inside_heap: false });
    assert!(dump
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::UnresolvedString(r) if r.owner == "F$")));
}

#[test]
fn test_function_definition() {
    let dump = analyse(ImageBuilder::new().function("F", 0x0810, 0x0830).build()).unwrap();
    match dump.variables[0].value {
        ScalarValue::Function(f) => {
            assert_eq!(f.definition, 0x0810);
            assert_eq!(f.argument, 0x0830);
        }
        other => panic!("expected function, got {:?}", other),
    }
    assert_eq!(dump.variables[0].name.to_string(), "FN F");
}

#[test]
fn test_inconsistent_pointers_give_empty_regions() {
    let dump = analyse(
        three_variables()
            .pointer(VARTAB, 0x2000)
            .pointer(ARYTAB, 0x1000)
            .pointer(STREND, 0x0900)
            .build(),
    )
    .unwrap();

    assert!(dump.variables.is_empty());
    assert!(dump.arrays.is_empty());
    assert!(dump
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::InconsistentPointers { region: "variable table", .. })));
}

#[test]
fn test_heap_floor_falls_back_without_fretop() {
    let image = three_variables().pointer(FRETOP, 0).build();
    let dump = analyse(image).unwrap();
    // walked all the way down to the end of the arrays through free memory
    assert_eq!(dump.heap.floor, dump.pointers.arrays_end);
    assert_eq!(dump.heap.blocks.len(), 1);
    assert_eq!(dump.garbage().count(), 0);
}

#[test]
fn test_prg_dump_uses_load_address() {
    let mut bytes = vec![0x00, 0x00];
    bytes.extend(three_variables().build_bytes());
    let image = MemoryImage::from_dump(bytes, DumpFormat::Auto).unwrap();
    let dump = analyse(image).unwrap();
    assert_eq!(dump.variables.len(), 3);

    // the same program loaded from $0400 misses the zero page
    let mut bytes = vec![0x00, 0x04];
    bytes.extend(&three_variables().build_bytes()[0x400..]);
    let image = MemoryImage::from_dump(bytes, DumpFormat::Prg).unwrap();
    match analyse(image) {
        Err(DumpError::TruncatedImage { address, .. }) => assert_eq!(address, 0x2b),
        other => panic!("expected truncated image, got {:?}", other.map(|d| d.variables.len())),
    }
}

#[test]
fn test_image_ending_below_heap_top() {
    let bytes = three_variables().build_bytes();
    let image = MemoryImage::from_raw(bytes[..0x9000].to_vec());
    let dump = analyse(image).unwrap();
    assert_eq!(dump.variables.len(), 3);
    assert!(dump.heap.blocks.is_empty());
    assert!(dump
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::Heap(e) if matches!(e.kind, DecodeErrorKind::OutOfRange { .. }))));
    assert!(dump
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::UnresolvedString(r) if r.owner == "S$")));
}
