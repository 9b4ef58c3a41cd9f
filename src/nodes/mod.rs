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

// Symbol
// ├── FunctionSymbolNode
// ├── VariableSymbolNode
// └── SpecialDataSymbolNode
//
// QualifiedNameNode
// └── IdentifierNode
//     ├── Identifier / AnonymousNamespace / LexicalFrame
//     ├── Template
//     ├── Operator / Constructor / Destructor
//     ├── Special
//     ├── Rtti
//     ├── SpecialQualifier (wraps a nested Symbol)
//     └── TemplateParameter
//
// TypeNode
// ├── Primitive
// ├── Compound / Enum
// ├── Pointer / Reference / RvalueReference
// ├── Function
// └── NullPtr
//
// TemplateArgNode
// ├── Type / Literal / AddressOfSymbol / TemplateParameter / Curly

mod ast;
mod kinds;
mod printer;

pub(crate) use ast::{
    CurlyArg,
    CurlyChild,
    FunctionSymbolNode,
    FunctionTypeNode,
    IdentifierNode,
    Literal,
    QualifiedNameNode,
    RttiNode,
    SpecialDataDetail,
    SpecialDataKind,
    SpecialDataSymbolNode,
    StorageClass,
    StorageModifierSeq,
    SymbolNode,
    TemplateArgNode,
    TemplateNode,
    TemplateParameterKind,
    TypeNode,
    VariableKind,
    VariableSymbolNode,
};
pub use kinds::{
    CallingConv,
    MemberFunctionKind,
    OperatorKind,
    PrimitiveKind,
    ProtectionLevel,
    RttiKind,
    SpecialName,
    TagKind,
};
pub(crate) use kinds::{
    CurlyKind,
    FunctionKindCode,
    StorageClassFlags,
    StorageModifierKind,
};

use crate::{
    cache::NodeCache,
    Buffer,
    DisplayOptions,
    Result,
    Writer,
};
use std::{
    io::Write as _,
    mem,
};

/// Whitespace permission at a node's boundary (spec §4.2). Only `None` and
/// `Trailing` are ever constructed; trailing space itself is produced by
/// explicit `output_space_if_necessary` calls at the declarator call sites
/// rather than by this flag, so `Trailing` is carried purely as a marker of
/// caller intent for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Spacing {
    None,
    Trailing,
}

fn output_space_if_necessary<B: Buffer>(ob: &mut Writer<B>) -> Result<()> {
    if let Some(c) = ob.last() {
        if c.is_ascii_alphanumeric() || *c == b'>' {
            write!(ob, " ")?;
        }
    }
    Ok(())
}

/// Writes a textual projection of a node into `ob` and reports whether
/// anything was emitted, per spec §4.2.
pub(crate) trait WriteableNode {
    fn display_on<B: Buffer>(
        &self,
        cache: &NodeCache,
        ob: &mut Writer<B>,
        flags: DisplayOptions,
        spacing: Spacing,
    ) -> Result<bool>;
}

/// Nodes whose output wraps a child's output (a pointer wrapping its
/// target, a function type wrapping its name) implement this instead,
/// so that `int (*f)(char)`-shaped declarators can be assembled from the
/// inside out: the wrapper supplies a `pre` and `post` half, and the
/// wrapped content is injected between them by the caller.
pub(crate) trait WriteableTypeNode {
    fn display_pair<B: Buffer>(
        &self,
        cache: &NodeCache,
        ob: &mut Writer<B>,
        flags: DisplayOptions,
        spacing: Spacing,
        inner: &mut dyn FnMut(&mut Writer<B>) -> Result<bool>,
    ) -> Result<bool> {
        let mut wrote = self.display_pre(cache, ob, flags, spacing)?;
        wrote |= inner(ob)?;
        wrote |= self.display_post(cache, ob, flags)?;
        Ok(wrote)
    }

    fn display_pre<B: Buffer>(
        &self,
        cache: &NodeCache,
        ob: &mut Writer<B>,
        flags: DisplayOptions,
        spacing: Spacing,
    ) -> Result<bool>;

    fn display_post<B: Buffer>(
        &self,
        cache: &NodeCache,
        ob: &mut Writer<B>,
        flags: DisplayOptions,
    ) -> Result<bool>;
}

macro_rules! assert_trivial_drop {
    ($t:ty) => {
        const _: () = assert!(!mem::needs_drop::<$t>());
    };
}

assert_trivial_drop!(IdentifierNode<'_>);
assert_trivial_drop!(QualifiedNameNode<'_>);
assert_trivial_drop!(TypeNode<'_>);
assert_trivial_drop!(TemplateArgNode<'_>);
assert_trivial_drop!(SymbolNode<'_>);
