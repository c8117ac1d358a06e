//! Initializer patching against hand-assembled classes

mod common;

use std::collections::BTreeSet;

use common::TestClass;

use eagerlink::classfile::defs::access_flags::{ACC_PUBLIC, ACC_STATIC};
use eagerlink::classfile::defs::{CLINIT_NAME, CODE_ATTRIBUTE, PATCHED_ATTRIBUTE};
use eagerlink::classfile::opcodes::*;
use eagerlink::classfile::{AttributeInfo, ClassFile, CodeAttribute, ExceptionTableEntry};
use eagerlink::{ClinitPatcher, Error};

fn external(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn patched(bytes: &[u8], names: &[&str]) -> Vec<u8> {
    ClinitPatcher::new(&external(names)).patch(bytes).unwrap()
}

/// Decode the `<clinit>` Code attribute of a patched class
fn clinit_code(class: &ClassFile) -> CodeAttribute {
    let pool = &class.constant_pool;
    let method = class
        .methods
        .iter()
        .find(|method| method.name(pool).unwrap() == CLINIT_NAME)
        .expect("patched class has no <clinit>");
    let attribute = method
        .attributes
        .iter()
        .find(|attribute| pool.utf8(attribute.name_index).unwrap() == CODE_ATTRIBUTE)
        .expect("<clinit> has no Code attribute");
    CodeAttribute::from_bytes(&attribute.info, pool).unwrap()
}

/// Class names loaded by the leading touch-pairs of a code array
fn touched_classes(class: &ClassFile, code: &[u8], pairs: usize) -> Vec<String> {
    (0..pairs)
        .map(|pair| {
            let at = pair * 4;
            assert_eq!(code[at], LDC_W);
            assert_eq!(code[at + 3], POP);
            let index = u16::from_be_bytes([code[at + 1], code[at + 2]]);
            class.constant_pool.class_name(index).unwrap().to_string()
        })
        .collect()
}

#[test]
fn synthesizes_empty_initializer_when_nothing_is_external() {
    let main = TestClass::new("pkg/Main");
    let bytes = patched(&main.bytes(), &[]);

    let class = ClassFile::from_bytes(&bytes).unwrap();
    assert!(class.has_attribute(PATCHED_ATTRIBUTE));

    let code = clinit_code(&class);
    assert_eq!(code.code, vec![RETURN]);
    assert_eq!(code.max_stack, 1);
    assert_eq!(code.max_locals, 0);

    let clinit = class
        .methods
        .iter()
        .find(|method| method.name(&class.constant_pool).unwrap() == CLINIT_NAME)
        .unwrap();
    assert_ne!(clinit.access_flags & ACC_STATIC, 0);
}

#[test]
fn synthesized_initializer_touches_each_external_class() {
    let main = TestClass::new("pkg/Main");
    let bytes = patched(&main.bytes(), &["pkg/Missing"]);

    let class = ClassFile::from_bytes(&bytes).unwrap();
    let code = clinit_code(&class);
    assert_eq!(code.code.len(), 5);
    assert_eq!(code.code[4], RETURN);
    assert_eq!(touched_classes(&class, &code.code, 1), vec!["pkg/Missing"]);
}

#[test]
fn touch_pairs_are_prepended_to_existing_body() {
    let mut main = TestClass::new("pkg/Main");
    let body = vec![ICONST_0, POP, RETURN];
    main.add_method(ACC_STATIC, CLINIT_NAME, "()V", CodeAttribute::new(1, 0, body.clone()));

    let bytes = patched(&main.bytes(), &["pkg/B", "pkg/A"]);
    let class = ClassFile::from_bytes(&bytes).unwrap();
    let code = clinit_code(&class);

    assert_eq!(code.code.len(), 8 + body.len());
    assert_eq!(&code.code[8..], &body[..]);
    // sorted external order: pkg/A before pkg/B
    assert_eq!(touched_classes(&class, &code.code, 2), vec!["pkg/A", "pkg/B"]);
    assert_eq!(code.max_stack, 1);
}

#[test]
fn patching_twice_is_byte_identical() {
    let mut main = TestClass::new("pkg/Main");
    main.add_method(ACC_STATIC, CLINIT_NAME, "()V", CodeAttribute::new(0, 0, vec![RETURN]));

    let once = patched(&main.bytes(), &["pkg/Missing"]);
    let twice = patched(&once, &["pkg/Missing"]);
    assert_eq!(once, twice);

    // A marked class is left alone even if the external set changed.
    let other = patched(&once, &["pkg/Other"]);
    assert_eq!(once, other);

    let class = ClassFile::from_bytes(&twice).unwrap();
    let markers = class
        .attributes
        .iter()
        .filter(|attribute| {
            class.constant_pool.utf8(attribute.name_index).unwrap() == PATCHED_ATTRIBUTE
        })
        .count();
    assert_eq!(markers, 1);
}

#[test]
fn unexpected_initializer_descriptor_is_a_shape_error() {
    let mut main = TestClass::new("pkg/Main");
    main.add_method(ACC_STATIC, CLINIT_NAME, "(I)V", CodeAttribute::new(0, 1, vec![RETURN]));

    let result = ClinitPatcher::new(&external(&["pkg/Missing"])).patch(&main.bytes());
    assert!(matches!(result, Err(Error::Shape { .. })));
}

#[test]
fn non_static_initializer_is_a_shape_error() {
    let mut main = TestClass::new("pkg/Main");
    main.add_method(ACC_PUBLIC, CLINIT_NAME, "()V", CodeAttribute::new(0, 0, vec![RETURN]));

    let result = ClinitPatcher::new(&external(&["pkg/Missing"])).patch(&main.bytes());
    assert!(matches!(result, Err(Error::Shape { .. })));
}

#[test]
fn initializer_without_code_is_a_shape_error() {
    let mut main = TestClass::new("pkg/Main");
    main.add_bare_method(ACC_STATIC, CLINIT_NAME, "()V");

    let result = ClinitPatcher::new(&external(&["pkg/Missing"])).patch(&main.bytes());
    assert!(matches!(result, Err(Error::Shape { .. })));
}

#[test]
fn exception_table_and_line_numbers_shift_with_the_body() {
    let mut main = TestClass::new("pkg/Main");
    let line_table_name = main.pool().add_utf8("LineNumberTable").unwrap();
    let mut code = CodeAttribute::new(1, 0, vec![ICONST_0, POP, RETURN]);
    code.exception_table.push(ExceptionTableEntry::new(0, 2, 2, 0));
    code.attributes
        .push(AttributeInfo::new(line_table_name, vec![0, 1, 0, 0, 0, 7]));
    main.add_method(ACC_STATIC, CLINIT_NAME, "()V", code);

    let bytes = patched(&main.bytes(), &["pkg/Missing"]);
    let class = ClassFile::from_bytes(&bytes).unwrap();
    let code = clinit_code(&class);

    assert_eq!(code.exception_table, vec![ExceptionTableEntry::new(4, 6, 6, 0)]);
    let line_table = &code.attributes[0];
    assert_eq!(line_table.info, vec![0, 1, 0, 4, 0, 7]);
}

#[test]
fn stack_map_first_frame_shifts_with_the_body() {
    let mut main = TestClass::new("pkg/Main");
    let stack_map_name = main.pool().add_utf8("StackMapTable").unwrap();
    let mut code = CodeAttribute::new(1, 0, vec![ICONST_0, POP, RETURN]);
    code.attributes
        .push(AttributeInfo::new(stack_map_name, vec![0, 1, 2]));
    main.add_method(ACC_STATIC, CLINIT_NAME, "()V", code);

    let bytes = patched(&main.bytes(), &["pkg/Missing"]);
    let class = ClassFile::from_bytes(&bytes).unwrap();
    let code = clinit_code(&class);

    assert_eq!(code.attributes[0].info, vec![0, 1, 6]);
}

#[test]
fn marker_alone_is_added_when_initializer_exists_and_nothing_is_external() {
    let mut main = TestClass::new("pkg/Main");
    let body = vec![ICONST_0, POP, RETURN];
    main.add_method(ACC_STATIC, CLINIT_NAME, "()V", CodeAttribute::new(1, 0, body.clone()));

    let bytes = patched(&main.bytes(), &[]);
    let class = ClassFile::from_bytes(&bytes).unwrap();
    assert!(class.has_attribute(PATCHED_ATTRIBUTE));
    assert_eq!(clinit_code(&class).code, body);
}
