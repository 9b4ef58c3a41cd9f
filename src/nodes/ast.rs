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

//! The node shapes themselves (spec §3). Every node here is `Copy` and
//! holds only arena-backed slices/strs or [`NodeHandle`]s into the same
//! [`NodeCache`](crate::cache::NodeCache) — nothing here owns a drop glue,
//! which is what lets the cache hand out `&T` without ever running a
//! destructor on unwind (see `assert_trivial_drop!` in `nodes/mod.rs`).

use crate::{
    cache::NodeHandle,
    nodes::kinds::{
        CallingConv,
        CurlyKind,
        FunctionKindCode,
        OperatorKind,
        PrimitiveKind,
        ProtectionLevel,
        RttiKind,
        SpecialName,
        StorageClassFlags,
        StorageModifierKind,
        TagKind,
    },
};

/// One qualifier or a terminal name (spec §3 "Name variants").
#[derive(Clone, Copy)]
pub(crate) enum IdentifierNode<'alloc> {
    Identifier(&'alloc str),
    /// A generated name, flagged so the printer can render it specially.
    AnonymousNamespace(&'alloc str),
    /// An integer-indexed lexical frame (spec §4.3.2).
    LexicalFrame(u64),
    Template(TemplateNode<'alloc>),
    Operator(OperatorKind),
    /// A cast operator; its spelling is read off the enclosing function's
    /// return type by the printer rather than stored here (spec §3).
    Cast,
    /// Spelling comes from the enclosing qualifier (the defining type).
    Constructor,
    Destructor,
    Special(SpecialName),
    Rtti(RttiNode<'alloc>),
    /// Wraps a nested symbol used as a scope qualifier (spec §4.3.2).
    SpecialQualifier(NodeHandle<SymbolNode<'alloc>>),
    TemplateParameter(TemplateParameterKind<'alloc>),
}

/// Five RTTI sub-variants (spec §4.3.10); only `TypeDescriptor` owns a
/// type and only `BaseClassDescriptor` owns the four integer dimensions.
#[derive(Clone, Copy)]
pub(crate) enum RttiNode<'alloc> {
    TypeDescriptor(NodeHandle<TypeNode<'alloc>>),
    BaseClassDescriptor {
        mdisp: i32,
        pdisp: i32,
        vdisp: i32,
        attributes: u32,
    },
    BaseClassArray,
    ClassHierarchyDescriptor,
    CompleteObjectLocator,
}

impl RttiNode<'_> {
    #[must_use]
    pub(crate) fn kind(self) -> RttiKind {
        match self {
            RttiNode::TypeDescriptor(_) => RttiKind::TypeDescriptor,
            RttiNode::BaseClassDescriptor { .. } => RttiKind::BaseClassDescriptor,
            RttiNode::BaseClassArray => RttiKind::BaseClassArray,
            RttiNode::ClassHierarchyDescriptor => RttiKind::ClassHierarchyDescriptor,
            RttiNode::CompleteObjectLocator => RttiKind::CompleteObjectLocator,
        }
    }
}

/// An identifier plus an ordered template-argument list (spec §3).
#[derive(Clone, Copy)]
pub(crate) struct TemplateNode<'alloc> {
    /// Empty only inside certain template productions (spec §4.3.3).
    pub(crate) name: &'alloc str,
    pub(crate) args: &'alloc [NodeHandle<TemplateArgNode<'alloc>>],
}

/// Placeholder variants for uninstantiated template parameters (spec §3).
/// Used both as a `Name` variant (an identifier standing in for a
/// parameter) and as a template-argument variant.
#[derive(Clone, Copy)]
pub(crate) enum TemplateParameterKind<'alloc> {
    Indexed {
        is_non_type: bool,
        index: u32,
        /// Set when this placeholder stands in for the reference tool's
        /// documented missing-close-quote bug (spec §4.3.7's `'0'`
        /// sub-code, spec §9 open question). Only ever `true` when the
        /// symbol was parsed with `EMULATE_REFERENCE_BUGS`; the printer
        /// decides whether to reproduce the stray quote based on
        /// `NO_REFERENCE_TOOL_EMULATION`.
        degraded: bool,
    },
    /// The `'R'` sub-code: a name is read but never memoised (spec §4.3.7).
    Named {
        is_non_type: bool,
        name: &'alloc str,
        index: u32,
    },
}

/// One terminal identifier plus an ordered, innermost-first list of
/// enclosing qualifiers (spec §3).
#[derive(Clone, Copy)]
pub(crate) struct QualifiedNameNode<'alloc> {
    pub(crate) terminal: NodeHandle<IdentifierNode<'alloc>>,
    pub(crate) qualifiers: &'alloc [NodeHandle<IdentifierNode<'alloc>>],
}

/// Signed 64-bit integer or normalised-mantissa/exponent float (spec §3).
#[derive(Clone, Copy)]
pub(crate) enum Literal {
    Integer(i64),
    Float { mantissa: i64, exponent: i64 },
}

/// A nullable address-of-symbol; `None` is the null pointer constant
/// (spec §3, §4.3.7's `'1'` sub-code).
pub(crate) type AddressOfSymbol<'alloc> = Option<NodeHandle<SymbolNode<'alloc>>>;

#[derive(Clone, Copy)]
pub(crate) enum CurlyChild<'alloc> {
    Symbol(NodeHandle<SymbolNode<'alloc>>),
    Integer(i64),
}

/// A structured "curly" composite template argument (spec §4.3.7).
#[derive(Clone, Copy)]
pub(crate) struct CurlyArg<'alloc> {
    pub(crate) kind: CurlyKind,
    pub(crate) children: &'alloc [CurlyChild<'alloc>],
}

/// One template argument (spec §3: "each argument is either a type, a
/// typed literal, an address-of-symbol, a template-parameter placeholder,
/// or a structured curly value").
#[derive(Clone, Copy)]
pub(crate) enum TemplateArgNode<'alloc> {
    Type(NodeHandle<TypeNode<'alloc>>),
    Literal(Literal),
    AddressOfSymbol(AddressOfSymbol<'alloc>),
    /// The `'E'` sub-code: a whole nested symbol embedded directly as the
    /// argument, printed without the `&` that [`TemplateArgNode::AddressOfSymbol`]
    /// adds (spec §4.3.7).
    Symbol(NodeHandle<SymbolNode<'alloc>>),
    TemplateParameter(TemplateParameterKind<'alloc>),
    Curly(CurlyArg<'alloc>),
}

/// Ordered sequence of `{Ptr64, Unaligned, Restrict}` (spec §3/§4.3.6).
/// `Unaligned` prints before the indirection operator, the rest after.
pub(crate) type StorageModifierSeq<'alloc> = &'alloc [StorageModifierKind];

/// cv-qualification and pointer-kind bits, plus the payload that a
/// `Based`/`Member`/`Function` bit requires (spec §3). The nested
/// function-storage case is a bump-allocated reference rather than an
/// owned `Box` so that `StorageClass` stays trivially droppable, which
/// every node that embeds it (transitively, every interned node) needs.
#[derive(Clone, Copy)]
pub(crate) struct StorageClass<'alloc> {
    pub(crate) flags: StorageClassFlags,
    pub(crate) based_name: Option<NodeHandle<QualifiedNameNode<'alloc>>>,
    pub(crate) member_compound: Option<NodeHandle<TypeNode<'alloc>>>,
    pub(crate) function_storage: Option<&'alloc StorageClass<'alloc>>,
}

impl<'alloc> StorageClass<'alloc> {
    pub(crate) const EMPTY: Self = Self {
        flags: StorageClassFlags::empty(),
        based_name: None,
        member_compound: None,
        function_storage: None,
    };

    #[must_use]
    pub(crate) fn is_const(self) -> bool {
        self.flags.contains(StorageClassFlags::CONST)
    }

    #[must_use]
    pub(crate) fn is_volatile(self) -> bool {
        self.flags.contains(StorageClassFlags::VOLATILE)
    }
}

#[derive(Clone, Copy)]
pub(crate) struct FunctionTypeNode<'alloc> {
    pub(crate) calling_conv: CallingConv,
    /// Absent for constructors/destructors (spec §3 invariant).
    pub(crate) return_type: Option<NodeHandle<TypeNode<'alloc>>>,
    pub(crate) params: &'alloc [NodeHandle<TypeNode<'alloc>>],
    pub(crate) is_variadic: bool,
    pub(crate) saves_registers: bool,
    pub(crate) storage: Option<StorageClass<'alloc>>,
}

/// The type category dispatched on by spec §4.3.5.
#[derive(Clone, Copy)]
pub(crate) enum TypeNode<'alloc> {
    Primitive(PrimitiveKind),
    Compound {
        tag: TagKind,
        name: NodeHandle<QualifiedNameNode<'alloc>>,
    },
    Enum {
        base: PrimitiveKind,
        name: NodeHandle<QualifiedNameNode<'alloc>>,
    },
    Pointer {
        cv: StorageClassFlags,
        modifiers: StorageModifierSeq<'alloc>,
        target_storage: StorageClass<'alloc>,
        target: NodeHandle<TypeNode<'alloc>>,
    },
    Reference {
        is_volatile: bool,
        modifiers: StorageModifierSeq<'alloc>,
        target_storage: StorageClass<'alloc>,
        target: NodeHandle<TypeNode<'alloc>>,
    },
    RvalueReference {
        is_volatile: bool,
        target: NodeHandle<TypeNode<'alloc>>,
    },
    Function(FunctionTypeNode<'alloc>),
    NullPtr,
}

#[derive(Clone, Copy)]
pub(crate) enum VariableKind {
    /// Kind digits `0`-`2`: protection level derived from the digit.
    StaticMember(ProtectionLevel),
    /// Kind digit `3`.
    Global,
}

#[derive(Clone, Copy)]
pub(crate) struct VariableSymbolNode<'alloc> {
    pub(crate) name: NodeHandle<QualifiedNameNode<'alloc>>,
    pub(crate) kind: VariableKind,
    pub(crate) ty: NodeHandle<TypeNode<'alloc>>,
    pub(crate) modifiers: StorageModifierSeq<'alloc>,
    pub(crate) storage: StorageClass<'alloc>,
}

#[derive(Clone, Copy)]
pub(crate) struct FunctionSymbolNode<'alloc> {
    pub(crate) name: NodeHandle<QualifiedNameNode<'alloc>>,
    pub(crate) kind: FunctionKindCode,
    pub(crate) this_modifiers: StorageModifierSeq<'alloc>,
    /// cv-qualification of `this`; only present for non-static members.
    pub(crate) this_storage: Option<StorageClass<'alloc>>,
    /// Resolves to [`TypeNode::Function`] (spec §3 invariant).
    pub(crate) signature: NodeHandle<TypeNode<'alloc>>,
}

/// Kind digits `4`/`5`/`7` (spec §4.3.1): reserved data kinds this crate
/// diagnoses structurally without claiming to know their full semantics.
#[derive(Clone, Copy)]
pub(crate) enum SpecialDataKind {
    Guard,
    LocalStatic,
    VbTableLike,
    Reserved9,
}

#[derive(Clone, Copy)]
pub(crate) enum SpecialDataDetail<'alloc> {
    /// Kind digit `6`, with an optional `{for '<target>'}` qualifier.
    Vtable {
        for_target: Option<NodeHandle<QualifiedNameNode<'alloc>>>,
    },
    /// Kind digit `8`: hosts RTTI names (spec §4.3.10) among others; the
    /// RTTI structure itself lives on the name's terminal identifier.
    Special,
    Other(SpecialDataKind),
}

#[derive(Clone, Copy)]
pub(crate) struct SpecialDataSymbolNode<'alloc> {
    pub(crate) name: NodeHandle<QualifiedNameNode<'alloc>>,
    pub(crate) detail: SpecialDataDetail<'alloc>,
}

/// Root AST node (spec §3). Sub-symbols (nested inside template
/// arguments or local-to-function qualifiers) reuse this same shape;
/// only the outermost root's `mangled` string is meaningful, and that
/// string lives on the public [`crate::Symbol`] wrapper, not here.
#[derive(Clone, Copy)]
pub(crate) enum SymbolNode<'alloc> {
    Function(FunctionSymbolNode<'alloc>),
    Variable(VariableSymbolNode<'alloc>),
    SpecialData(SpecialDataSymbolNode<'alloc>),
    /// `AllowNameFragments` success case (spec §4.4): a qualified name
    /// with no trailing kind code.
    NameFragment(NodeHandle<QualifiedNameNode<'alloc>>),
    /// The `'?' '@'` body variant (spec §4.3.1); the source grammar
    /// documents this only as a reserved branch, so it is preserved
    /// structurally without invented semantics.
    CodeViewReserved,
    /// The `'?' '?' '?'` body variant (spec §9 open question): parsed as
    /// far as the nested symbol, with the undocumented trailing suffix
    /// preserved verbatim rather than guessed at.
    DoubleEncoded {
        inner: NodeHandle<SymbolNode<'alloc>>,
        trailing: &'alloc str,
    },
}
