// Copyright 2024 Ryan McKenzie
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{
    parse,
    DisplayOptions,
    Error,
    ParseOptions,
};
use bumpalo::Bump;

fn demangles_to(mangled: &str, options: DisplayOptions, expected: &str) {
    let arena = Bump::new();
    match parse(mangled, ParseOptions::default(), &arena) {
        Ok(symbol) => {
            let actual = symbol.display(options);
            assert_eq!(actual, expected, "'{mangled}' <-- mangled string");
        }
        Err(err) => panic!("'{mangled}' <-- mangled string failed to parse: {err:?}"),
    }
}

fn test(mangled: &str, expected: &str) {
    demangles_to(mangled, DisplayOptions::default(), expected);
}

fn fails_with(mangled: &str, expected: Error) {
    let arena = Bump::new();
    match parse(mangled, ParseOptions::default(), &arena) {
        Ok(symbol) => panic!("'{mangled}' <-- expected to fail, got '{}'", symbol.display(DisplayOptions::default())),
        Err(err) => assert_eq!(err, expected, "'{mangled}' <-- mangled string"),
    }
}

#[test]
fn global_function_with_primitive_parameter() {
    test("?foo@@YAXI@Z", "void __cdecl foo(unsigned int)");
}

#[test]
fn global_variable_of_primitive_type() {
    test("?x@@3HA", "int x");
}

#[test]
fn variadic_global_function() {
    test("?foo@@YAXZZ", "void __cdecl foo(...)");
}

#[test]
fn pointer_to_const_char() {
    // Exercises the pointee cv-qualifier fix: the byte between a pointer
    // tag's modifiers and its target used to be dropped on the floor, so
    // `char const *` rendered as a bare `char*`.
    test("?x@@3PBDA", "char const*x");
}

#[test]
fn reference_to_const_double() {
    test("?x@@3ABNA", "double const&x");
}

#[test]
fn plain_lvalue_reference() {
    test("?x@@3AAHA", "int&x");
}

#[test]
fn nested_pointer() {
    test("?x@@3PAPAHA", "int**x");
}

#[test]
fn pointer_to_function() {
    // Exercises the function-pointer/storage-class ambiguity fix: the `6`
    // marker here used to be swallowed by `parse_storage_class` before it
    // ever reached the function-type special case.
    test("?x@@3P6AHXA", "int __cdecl *()x");
}

#[test]
fn global_function_name_only() {
    demangles_to("?foo@@YAXI@Z", DisplayOptions::NAME_ONLY, "foo");
}

#[test]
fn global_function_type_only() {
    demangles_to("?foo@@YAXI@Z", DisplayOptions::TYPE_ONLY, "void __cdecl (unsigned int)");
}

#[test]
fn template_class_variable() {
    test("?x@@3V?$Stack@H@@A", "class Stack<int> x");
}

#[test]
fn anonymous_namespace_qualifier() {
    test("?val@?A0x1234@@3HA", "int `anonymous namespace'::val");
}

#[test]
fn constructor() {
    // Structors elide their return type with a literal `@` rather than
    // an encoded `X`; it must be consumed even when the parameter list
    // that follows is itself empty.
    test("??0Bar@@QAE@XZ", "public: __thiscall Bar::Bar()");
}

#[test]
fn destructor() {
    test("??1Bar@@QAE@XZ", "public: __thiscall Bar::~Bar()");
}

#[test]
fn constructor_with_parameter() {
    test("??0Abc@@QAE@H@Z", "public: __thiscall Abc::Abc(int)");
}

#[test]
fn const_member_operator_equals() {
    test("??8Foo@@QBE_NH@Z", "public: bool __thiscall Foo::operator==(int) const");
}

#[test]
fn vtable_symbol() {
    test("?Foo@@6B@", "const Foo::`vftable'");
}

#[test]
fn rtti_type_descriptor() {
    test("??_R0H@3HA", "int `RTTI Type Descriptor for 'int'");
}

#[test]
fn back_reference_shares_identical_parameter_type() {
    // The second parameter is a digit back-reference (`1`) to the full
    // pointer type built for the first, not to its inner compound type
    // (which would be back-reference `0`).
    test("?foo@@YAXPAUBar@@1@Z", "void __cdecl foo(struct Bar*,struct Bar*)");
}

#[test]
fn qualified_name_and_scope_accessors() {
    let arena = Bump::new();
    let symbol = parse("?val@?A0x1234@@3HA", ParseOptions::default(), &arena).unwrap();
    assert_eq!(symbol.name(), "val");
    assert_eq!(symbol.scope(), "`anonymous namespace'");
    assert_eq!(symbol.mangled(), "?val@?A0x1234@@3HA");
}

#[test]
fn function_accessors() {
    let arena = Bump::new();
    let symbol = parse("?foo@@YAXPAUBar@@1@Z", ParseOptions::default(), &arena).unwrap();
    assert_eq!(symbol.calling_convention(), Some(crate::nodes::CallingConv::Cdecl));
    assert!(!symbol.is_variadic());
    assert!(symbol.protection_level().is_none());
    assert!(symbol.member_classification().is_none());
    let params = symbol.function_parameters();
    assert_eq!(params.len(), 2);
    assert!(params[0].is_pointer());
    assert!(params[1].is_pointer());
    let rt = symbol.function_return_type().expect("foo has a return type");
    assert!(rt.is_primitive());
    assert_eq!(rt.primitive_kind(), Some(crate::nodes::PrimitiveKind::Void));
}

#[test]
fn variadic_function_accessor() {
    let arena = Bump::new();
    let symbol = parse("?foo@@YAXZZ", ParseOptions::default(), &arena).unwrap();
    assert!(symbol.is_variadic());
}

#[test]
fn member_function_accessors() {
    let arena = Bump::new();
    let symbol = parse("??8Foo@@QBE_NH@Z", ParseOptions::default(), &arena).unwrap();
    assert_eq!(symbol.protection_level(), Some(crate::nodes::ProtectionLevel::Public));
    assert_eq!(symbol.member_classification(), Some(crate::nodes::MemberFunctionKind::Instance));
}

#[test]
fn static_member_variable_accessor() {
    let arena = Bump::new();
    let symbol = parse("?x@Foo@@0HA", ParseOptions::default(), &arena).unwrap();
    assert_eq!(symbol.protection_level(), Some(crate::nodes::ProtectionLevel::Private));
    let ty = symbol.variable_type().expect("x has a variable type");
    assert!(ty.is_primitive());
    test("?x@Foo@@0HA", "private: int Foo::x");
}

#[test]
fn vtable_special_data_kind() {
    let arena = Bump::new();
    let symbol = parse("?Foo@@6B@", ParseOptions::default(), &arena).unwrap();
    assert_eq!(symbol.special_data_kind(), Some(crate::SpecialDataKindPub::Vtable));
}

#[test]
fn deep_copy_preserves_display() {
    let source_arena = Bump::new();
    let symbol = parse("?foo@@YAXPAUBar@@1@Z", ParseOptions::default(), &source_arena).unwrap();
    let before = symbol.display(DisplayOptions::default());

    let dest_arena = Bump::new();
    let copy = symbol.deep_copy(&dest_arena);
    let after = copy.display(DisplayOptions::default());

    assert_eq!(before, after);
    assert_eq!(copy.mangled(), symbol.mangled());
}

#[test]
fn no_leading_underscores_strips_calling_convention_prefix() {
    demangles_to("?foo@@YAXI@Z", DisplayOptions::NO_LEADING_UNDERSCORES, "void cdecl foo(unsigned int)");
}

#[test]
fn no_calling_convention_omits_it() {
    demangles_to("?foo@@YAXI@Z", DisplayOptions::NO_CALLING_CONVENTION, "voidfoo(unsigned int)");
}

#[test]
fn empty_symbol_is_premature_end() {
    fails_with(
        "",
        Error::PrematureEndOfSymbol {
            symbol: String::new(),
        },
    );
}

#[test]
fn symbol_must_start_with_question_mark() {
    fails_with(
        "foo",
        Error::BadSymbolStart {
            pos: 1,
            symbol: "foo".to_owned(),
        },
    );
}

#[test]
fn unterminated_function_is_rejected() {
    fails_with(
        "?foo@@YAXH@",
        Error::UnterminatedFunction {
            pos: 12,
            symbol: "?foo@@YAXH@".to_owned(),
        },
    );
}

#[test]
fn trailing_garbage_is_rejected() {
    fails_with(
        "?foo@@YAXXZQ",
        Error::NonsenseAtEndOfSymbol {
            pos: 12,
            symbol: "?foo@@YAXXZQ".to_owned(),
        },
    );
}

#[test]
fn invalid_storage_class_byte_is_rejected() {
    fails_with(
        "?x@@3HZ",
        Error::InvalidStorageClass {
            ch: 'Z',
            pos: 7,
            symbol: "?x@@3HZ".to_owned(),
        },
    );
}
