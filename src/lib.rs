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

#![doc = include_str!("../README.md")]
#![warn(clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::similar_names,
    clippy::struct_field_names,
    clippy::too_many_lines
)]

mod alloc;
mod cache;
mod demangler;
mod extensions;
mod nodes;
mod token;

#[cfg(test)]
mod tests;

use crate::{
    cache::{
        NodeCache,
        NodeHandle,
    },
    demangler::Parser,
    nodes::{
        CallingConv,
        FunctionKindCode,
        MemberFunctionKind,
        PrimitiveKind,
        ProtectionLevel,
        QualifiedNameNode,
        Spacing,
        SpecialDataDetail,
        SpecialDataKind,
        SymbolNode,
        TypeNode,
        VariableKind,
        WriteableNode,
    },
};
use bumpalo::Bump;
use std::io::{
    self,
    Write,
};

/// A write target bounded so a pathological AST cannot be coaxed into an
/// unbounded allocation (spec §5 "resources ... are confined").
pub(crate) trait Buffer: Write {
    fn last(&self) -> Option<&u8>;
    fn len(&self) -> usize;
}

impl Buffer for Vec<u8> {
    fn last(&self) -> Option<&u8> {
        self.as_slice().last()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

pub(crate) struct Writer<'buffer, B: Buffer> {
    buffer: &'buffer mut B,
}

impl<'buffer, B: Buffer> Writer<'buffer, B> {
    pub(crate) fn new(buffer: &'buffer mut B) -> Self {
        Self { buffer }
    }

    pub(crate) fn last(&self) -> Option<&u8> {
        self.buffer.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }
}

impl<B: Buffer> io::Write for Writer<'_, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let final_len = buf.len().saturating_add(self.buffer.len());
        if final_len > (1 << 20) {
            Err(io::Error::new(io::ErrorKind::OutOfMemory, Error::MaliciousInput))
        } else {
            self.buffer.write(buf)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buffer.flush()
    }
}

/// The closed diagnostic catalogue of spec §6/§7. Every variant that can
/// be raised mid-parse carries the offending character (where one
/// exists), the 1-based position, and the full original mangled string,
/// per spec §6's structured-failure contract.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("symbol does not start with '?' at position {pos}: '{symbol}'")]
    BadSymbolStart { pos: usize, symbol: String },

    #[error("premature end of symbol: '{symbol}'")]
    PrematureEndOfSymbol { symbol: String },

    #[error("unterminated name at position {pos}: '{symbol}'")]
    UnterminatedName { pos: usize, symbol: String },

    #[error("unterminated qualified name at position {pos}: '{symbol}'")]
    UnterminatedQualifiedName { pos: usize, symbol: String },

    #[error("unterminated parameter list at position {pos}: '{symbol}'")]
    UnterminatedParameterList { pos: usize, symbol: String },

    #[error("unterminated template parameter list at position {pos}: '{symbol}'")]
    UnterminatedTemplateParameterList { pos: usize, symbol: String },

    #[error("unterminated function at position {pos}: '{symbol}'")]
    UnterminatedFunction { pos: usize, symbol: String },

    #[error("invalid character {ch:?} at position {pos}: '{symbol}'")]
    InvalidCharacter { ch: char, pos: usize, symbol: String },

    #[error("invalid identifier character {ch:?} at position {pos}: '{symbol}'")]
    InvalidIdentifierCharacter { ch: char, pos: usize, symbol: String },

    #[error("invalid special-name code {ch:?} at position {pos}: '{symbol}'")]
    InvalidSpecialNameCode { ch: char, pos: usize, symbol: String },

    #[error("invalid symbol-type code {ch:?} at position {pos}: '{symbol}'")]
    InvalidSymbolTypeCode { ch: char, pos: usize, symbol: String },

    #[error("invalid data encoding at position {pos}: '{symbol}'")]
    InvalidDataEncoding { pos: usize, symbol: String },

    #[error("invalid calling convention {ch:?} at position {pos}: '{symbol}'")]
    InvalidCallingConvention { ch: char, pos: usize, symbol: String },

    #[error("invalid enum base type {ch:?} at position {pos}: '{symbol}'")]
    InvalidEnumType { ch: char, pos: usize, symbol: String },

    #[error("invalid storage class {ch:?} at position {pos}: '{symbol}'")]
    InvalidStorageClass { ch: char, pos: usize, symbol: String },

    #[error("invalid based-pointer type at position {pos}: '{symbol}'")]
    InvalidBasedPointerType { pos: usize, symbol: String },

    #[error("invalid RTTI code {ch:?} at position {pos}: '{symbol}'")]
    InvalidRttiCode { ch: char, pos: usize, symbol: String },

    #[error("invalid template argument or constant at position {pos}: '{symbol}'")]
    InvalidTemplateArgument { pos: usize, symbol: String },

    #[error("invalid function storage at position {pos}: '{symbol}'")]
    InvalidFunctionStorage { pos: usize, symbol: String },

    #[error("invalid back reference at position {pos}: '{symbol}'")]
    InvalidBackReference { pos: usize, symbol: String },

    #[error("empty name at position {pos}: '{symbol}'")]
    EmptyName { pos: usize, symbol: String },

    #[error("empty parameter list at position {pos}: '{symbol}'")]
    EmptyParameterList { pos: usize, symbol: String },

    #[error("expected return type at position {pos}: '{symbol}'")]
    ExpectedReturnType { pos: usize, symbol: String },

    #[error("expected template name at position {pos}: '{symbol}'")]
    ExpectedTemplateName { pos: usize, symbol: String },

    #[error("double reference at position {pos}: '{symbol}'")]
    DoubleReference { pos: usize, symbol: String },

    #[error("unused or invalid type code {ch:?} at position {pos}: '{symbol}'")]
    InvalidTypeCode { ch: char, pos: usize, symbol: String },

    #[error("unexpected character {ch:?} at position {pos}: '{symbol}'")]
    UnexpectedCharacter { ch: char, pos: usize, symbol: String },

    #[error("nonsense trailing characters at end of symbol at position {pos}: '{symbol}'")]
    NonsenseAtEndOfSymbol { pos: usize, symbol: String },

    #[error("invalid number at position {pos}: '{symbol}'")]
    InvalidNumber { pos: usize, symbol: String },

    #[error(transparent)]
    Io(#[from] IoErrorWrapper),

    #[error("tried to save too many back references")]
    TooManyBackRefs,

    #[error("input would force unbounded allocator growth")]
    MaliciousInput,
}

/// `io::Error` does not implement `Clone`/`PartialEq`/`Eq`; this thin
/// wrapper carries only the formatted message so [`Error`] itself can
/// derive them (useful for test assertions on parse failures).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoErrorWrapper(String);

impl std::fmt::Display for IoErrorWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<io::Error> for IoErrorWrapper {
    fn from(err: io::Error) -> Self {
        Self(err.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(IoErrorWrapper::from(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

bitflags::bitflags! {
    /// Decoder-behaviour flags consumed by [`parse`] (spec §6).
    #[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
    pub struct ParseOptions: u8 {
        /// Demote the one specific "premature end" case that occurs right
        /// after a complete qualified name but before a kind code into a
        /// success, producing a bare name-fragment AST (spec §4.4/§7).
        const ALLOW_NAME_FRAGMENTS = 1 << 0;

        /// Opt in to reproducing the one documented reference-tool bug
        /// named in spec §4.3.7's `'0'` sub-code (a missing-close-quote
        /// placeholder emitted instead of a negative literal in one
        /// malformed case). Off by default per spec §9's open question:
        /// "implementations should expose a flag and default to no
        /// emulation, producing the semantically-faithful form."
        const EMULATE_REFERENCE_BUGS = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Printer flags consumed by [`Symbol::display`] (spec §6).
    #[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
    pub struct DisplayOptions: u16 {
        const NO_LEADING_UNDERSCORES = 1 << 0;
        const NO_TOOLCHAIN_EXTENSIONS = 1 << 1;
        const NO_RETURN_TYPE = 1 << 2;
        const NO_CALLING_CONVENTION = 1 << 3;
        const NO_MEMBER_STORAGE_CLASS = 1 << 4;
        const NO_MEMBER_ACCESS = 1 << 5;
        const NO_MEMBER_TYPE = 1 << 6;
        const NO_COMPOUND_TYPE_CLASS = 1 << 7;
        const NO_PTR64 = 1 << 8;
        const NAME_ONLY = 1 << 9;
        const TYPE_ONLY = 1 << 10;
        const NO_REFERENCE_TOOL_EMULATION = 1 << 11;
    }
}

/// Parses a mangled symbol, returning an arena-backed AST (spec §6).
///
/// The arena is supplied by the caller rather than owned by [`Symbol`]:
/// bumpalo's `Bump` cannot be relocated while references derived from it
/// are alive, so a `Symbol<'alloc>` borrowing from a caller-owned `Bump`
/// is the idiomatic shape here, not a self-referential struct hiding a
/// `Bump` behind unsafe pinning. Two parses over two arenas are entirely
/// independent and may run on separate threads concurrently (spec §5).
pub fn parse<'alloc>(mangled: &str, options: ParseOptions, arena: &'alloc Bump) -> Result<Symbol<'alloc>> {
    let mut parser = Parser::new(mangled, options, arena)?;
    let root = parser.parse_symbol()?;
    Ok(Symbol {
        cache: parser.into_cache(),
        root,
        mangled: mangled.to_owned(),
    })
}

/// The root AST node together with the arena that owns every descendant
/// (spec §3 "Lifecycle": destroying the root destroys all descendants —
/// here, dropping `Symbol` drops the cache's index; the caller's `Bump`
/// reclaims the underlying bytes when it in turn is dropped).
pub struct Symbol<'alloc> {
    cache: NodeCache<'alloc>,
    root: NodeHandle<SymbolNode<'alloc>>,
    mangled: String,
}

/// A type reachable from a [`Symbol`] (spec §6's "type-specific
/// accessors"), paired with the arena it was resolved from so it can
/// render or answer questions about itself without the caller juggling
/// a cache reference directly.
#[derive(Clone, Copy)]
pub struct TypeHandle<'a, 'alloc> {
    cache: &'a NodeCache<'alloc>,
    handle: NodeHandle<TypeNode<'alloc>>,
}

impl<'a, 'alloc> TypeHandle<'a, 'alloc> {
    fn node(self) -> &'a TypeNode<'alloc> {
        self.handle.resolve(self.cache)
    }

    #[must_use]
    pub fn display(self, options: DisplayOptions) -> String {
        let mut out = Vec::new();
        {
            let mut ob = Writer::new(&mut out);
            let _ = self.node().display_on(self.cache, &mut ob, options, Spacing::None);
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    #[must_use]
    pub fn is_pointer(self) -> bool {
        matches!(self.node(), TypeNode::Pointer { .. })
    }

    #[must_use]
    pub fn is_reference(self) -> bool {
        matches!(self.node(), TypeNode::Reference { .. } | TypeNode::RvalueReference { .. })
    }

    #[must_use]
    pub fn is_primitive(self) -> bool {
        matches!(self.node(), TypeNode::Primitive(_))
    }

    #[must_use]
    pub fn primitive_kind(self) -> Option<PrimitiveKind> {
        match self.node() {
            TypeNode::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_function(self) -> bool {
        matches!(self.node(), TypeNode::Function(_))
    }

    #[must_use]
    pub fn is_nullptr(self) -> bool {
        matches!(self.node(), TypeNode::NullPtr)
    }
}

/// A qualified name reachable from a [`Symbol`] (spec §6).
#[derive(Clone, Copy)]
pub struct QualifiedNameHandle<'a, 'alloc> {
    cache: &'a NodeCache<'alloc>,
    handle: NodeHandle<QualifiedNameNode<'alloc>>,
}

impl<'a, 'alloc> QualifiedNameHandle<'a, 'alloc> {
    #[must_use]
    pub fn display(self, options: DisplayOptions) -> String {
        let mut out = Vec::new();
        {
            let mut ob = Writer::new(&mut out);
            let node = self.handle.resolve(self.cache);
            let _ = node
                .terminal
                .resolve(self.cache)
                .display_on(self.cache, &mut ob, options, Spacing::None);
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    /// The enclosing qualifiers, outermost first.
    #[must_use]
    pub fn scope_segments(self) -> Vec<String> {
        let node = self.handle.resolve(self.cache);
        node.qualifiers
            .iter()
            .rev()
            .map(|&q| {
                let mut out = Vec::new();
                {
                    let mut ob = Writer::new(&mut out);
                    let _ = q
                        .resolve(self.cache)
                        .display_on(self.cache, &mut ob, DisplayOptions::NAME_ONLY, Spacing::None);
                }
                String::from_utf8_lossy(&out).into_owned()
            })
            .collect()
    }
}

/// The public projection of [`SpecialDataDetail`] (spec §6 "special-data
/// sub-kind").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialDataKindPub {
    Vtable,
    Guard,
    LocalStatic,
    VbTableLike,
    Reserved9,
    Special,
}

impl From<SpecialDataDetail<'_>> for SpecialDataKindPub {
    fn from(detail: SpecialDataDetail<'_>) -> Self {
        match detail {
            SpecialDataDetail::Vtable { .. } => SpecialDataKindPub::Vtable,
            SpecialDataDetail::Special => SpecialDataKindPub::Special,
            SpecialDataDetail::Other(SpecialDataKind::Guard) => SpecialDataKindPub::Guard,
            SpecialDataDetail::Other(SpecialDataKind::LocalStatic) => SpecialDataKindPub::LocalStatic,
            SpecialDataDetail::Other(SpecialDataKind::VbTableLike) => SpecialDataKindPub::VbTableLike,
            SpecialDataDetail::Other(SpecialDataKind::Reserved9) => SpecialDataKindPub::Reserved9,
        }
    }
}

impl<'alloc> Symbol<'alloc> {
    /// The original mangled string (spec §3: "only the outermost root
    /// stores the full raw string").
    #[must_use]
    pub fn mangled(&self) -> &str {
        &self.mangled
    }

    fn root_node(&self) -> &SymbolNode<'alloc> {
        self.root.resolve(&self.cache)
    }

    fn function_signature(&self) -> Option<&crate::nodes::FunctionTypeNode<'alloc>> {
        let SymbolNode::Function(f) = self.root_node() else {
            return None;
        };
        let TypeNode::Function(sig) = f.signature.resolve(&self.cache) else {
            unreachable!("function symbol's signature handle must resolve to a function type");
        };
        Some(sig)
    }

    /// The qualified name of the underlying entity; `None` for the two
    /// wrapper variants (`CodeViewReserved`/`DoubleEncoded`) that have no
    /// qualified name of their own.
    #[must_use]
    pub fn qualified_name(&self) -> Option<QualifiedNameHandle<'_, 'alloc>> {
        let handle = match self.root_node() {
            SymbolNode::Function(f) => f.name,
            SymbolNode::Variable(v) => v.name,
            SymbolNode::SpecialData(s) => s.name,
            SymbolNode::NameFragment(n) => *n,
            SymbolNode::CodeViewReserved | SymbolNode::DoubleEncoded { .. } => return None,
        };
        Some(QualifiedNameHandle {
            cache: &self.cache,
            handle,
        })
    }

    /// The terminal (innermost) name, rendered with no enclosing scope.
    #[must_use]
    pub fn name(&self) -> String {
        self.qualified_name().map_or_else(String::new, |qn| qn.display(DisplayOptions::NAME_ONLY))
    }

    /// The enclosing scope chain, outermost-first, joined with `::`.
    #[must_use]
    pub fn scope(&self) -> String {
        self.qualified_name().map_or_else(String::new, |qn| qn.scope_segments().join("::"))
    }

    /// `Some` return type for function symbols (`None` for constructors
    /// /destructors, per spec §3's invariant, and for non-function
    /// symbols).
    #[must_use]
    pub fn function_return_type(&self) -> Option<TypeHandle<'_, 'alloc>> {
        let sig = self.function_signature()?;
        sig.return_type.map(|handle| TypeHandle { cache: &self.cache, handle })
    }

    /// Ordered parameter types for function symbols; empty otherwise.
    #[must_use]
    pub fn function_parameters(&self) -> Vec<TypeHandle<'_, 'alloc>> {
        self.function_signature().map_or_else(Vec::new, |sig| {
            sig.params
                .iter()
                .map(|&handle| TypeHandle { cache: &self.cache, handle })
                .collect()
        })
    }

    #[must_use]
    pub fn calling_convention(&self) -> Option<CallingConv> {
        self.function_signature().map(|sig| sig.calling_conv)
    }

    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.function_signature().is_some_and(|sig| sig.is_variadic)
    }

    /// Protection level for member functions and static member
    /// variables; `None` for global entities.
    #[must_use]
    pub fn protection_level(&self) -> Option<ProtectionLevel> {
        match self.root_node() {
            SymbolNode::Function(f) => match f.kind {
                FunctionKindCode::Member { protection, .. } => Some(protection),
                FunctionKindCode::Global => None,
            },
            SymbolNode::Variable(v) => match v.kind {
                VariableKind::StaticMember(p) => Some(p),
                VariableKind::Global => None,
            },
            _ => None,
        }
    }

    /// Static/virtual/instance classification for member functions.
    #[must_use]
    pub fn member_classification(&self) -> Option<MemberFunctionKind> {
        let SymbolNode::Function(f) = self.root_node() else {
            return None;
        };
        match f.kind {
            FunctionKindCode::Member { kind, .. } => Some(kind),
            FunctionKindCode::Global => None,
        }
    }

    /// The declared type of a variable symbol.
    #[must_use]
    pub fn variable_type(&self) -> Option<TypeHandle<'_, 'alloc>> {
        match self.root_node() {
            SymbolNode::Variable(v) => Some(TypeHandle { cache: &self.cache, handle: v.ty }),
            _ => None,
        }
    }

    /// The special-data sub-kind, for symbols that are neither a
    /// function nor a variable (vtables, RTTI hosts, guards, …).
    #[must_use]
    pub fn special_data_kind(&self) -> Option<SpecialDataKindPub> {
        match self.root_node() {
            SymbolNode::SpecialData(s) => Some(SpecialDataKindPub::from(s.detail)),
            _ => None,
        }
    }

    /// Writes the textual projection described by spec §4.2/§6.
    #[must_use]
    pub fn display(&self, options: DisplayOptions) -> String {
        let mut out = Vec::new();
        {
            let mut ob = Writer::new(&mut out);
            let _ = self.root_node().display_on(&self.cache, &mut ob, options, Spacing::None);
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Produces a fully independent copy of the whole tree in a
    /// caller-supplied arena (spec §3 "deep-copy creates an orphan").
    /// Every back-reference is already resolved via deep copy at parse
    /// time (spec §5), so the source tree has no shared interior nodes
    /// to begin with — this simply relocates every reachable node into
    /// fresh storage.
    #[must_use]
    pub fn deep_copy<'new>(&self, arena: &'new Bump) -> Symbol<'new> {
        let mut new_cache = NodeCache::new(arena);
        let new_root = demangler::deep_copy_symbol(&self.cache, self.root, &mut new_cache, arena)
            .expect("deep copy of an already-valid tree cannot exceed arena bounds");
        Symbol {
            cache: new_cache,
            root: new_root,
            mangled: self.mangled.clone(),
        }
    }
}
