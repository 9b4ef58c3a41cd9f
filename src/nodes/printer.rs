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

//! `WriteableNode`/`WriteableTypeNode` implementations (spec §4.2/§6).
//!
//! The layout chosen here is not normative (spec §1): different
//! implementations may choose different whitespace conventions as long as
//! the AST itself is preserved. This module favours a plain, readable
//! rendering over exact parity with any particular reference tool.

use crate::{
    cache::NodeCache,
    nodes::{
        ast::{
            CurlyArg,
            CurlyChild,
            FunctionSymbolNode,
            IdentifierNode,
            Literal,
            QualifiedNameNode,
            RttiNode,
            SpecialDataDetail,
            SpecialDataSymbolNode,
            StorageClass,
            SymbolNode,
            TemplateArgNode,
            TemplateParameterKind,
            TypeNode,
            VariableKind,
            VariableSymbolNode,
        },
        kinds::{
            CallingConv,
            FunctionKindCode,
            MemberFunctionKind,
            StorageClassFlags,
            StorageModifierKind,
        },
        output_space_if_necessary,
        Spacing,
        WriteableNode,
        WriteableTypeNode,
    },
    Buffer,
    DisplayOptions,
    Result,
    Writer,
};
use std::io::Write as _;

impl WriteableNode for IdentifierNode<'_> {
    fn display_on<B: Buffer>(
        &self,
        cache: &NodeCache,
        ob: &mut Writer<B>,
        flags: DisplayOptions,
        _spacing: Spacing,
    ) -> Result<bool> {
        match self {
            IdentifierNode::Identifier(s) => {
                write!(ob, "{s}")?;
                Ok(true)
            }
            IdentifierNode::AnonymousNamespace(_) => {
                write!(ob, "`anonymous namespace'")?;
                Ok(true)
            }
            IdentifierNode::LexicalFrame(n) => {
                write!(ob, "`{n}'")?;
                Ok(true)
            }
            IdentifierNode::Template(t) => {
                write!(ob, "{}<", t.name)?;
                for (i, arg) in t.args.iter().enumerate() {
                    if i > 0 {
                        write!(ob, ",")?;
                    }
                    arg.resolve(cache).display_on(cache, ob, flags, Spacing::None)?;
                }
                write!(ob, ">")?;
                Ok(true)
            }
            IdentifierNode::Operator(op) => {
                write!(ob, "{}", op.spelling())?;
                Ok(true)
            }
            // The real spelling is read off the enclosing function's return
            // type; callers that have that context (FunctionSymbolNode's
            // printer) special-case this before falling back here.
            IdentifierNode::Cast => {
                write!(ob, "operator")?;
                Ok(true)
            }
            IdentifierNode::Constructor => {
                write!(ob, "{{ctor}}")?;
                Ok(true)
            }
            IdentifierNode::Destructor => {
                write!(ob, "~{{dtor}}")?;
                Ok(true)
            }
            IdentifierNode::Special(s) => {
                write!(ob, "{}", s.spelling())?;
                Ok(true)
            }
            IdentifierNode::Rtti(r) => display_rtti(cache, ob, flags, r),
            IdentifierNode::SpecialQualifier(sym) => sym.resolve(cache).display_on(cache, ob, flags, Spacing::None),
            IdentifierNode::TemplateParameter(k) => display_template_parameter(ob, flags, k),
        }
    }
}

fn display_rtti<B: Buffer>(cache: &NodeCache, ob: &mut Writer<B>, flags: DisplayOptions, r: &RttiNode) -> Result<bool> {
    match r {
        RttiNode::TypeDescriptor(t) => {
            write!(ob, "`RTTI Type Descriptor for '")?;
            t.resolve(cache).display_on(cache, ob, flags, Spacing::None)?;
            write!(ob, "'")?;
        }
        RttiNode::BaseClassDescriptor {
            mdisp,
            pdisp,
            vdisp,
            attributes,
        } => {
            write!(ob, "`RTTI Base Class Descriptor at ({mdisp},{pdisp},{vdisp},{attributes})'")?;
        }
        RttiNode::BaseClassArray => {
            write!(ob, "`RTTI Base Class Array'")?;
        }
        RttiNode::ClassHierarchyDescriptor => {
            write!(ob, "`RTTI Class Hierarchy Descriptor'")?;
        }
        RttiNode::CompleteObjectLocator => {
            write!(ob, "`RTTI Complete Object Locator'")?;
        }
    }
    Ok(true)
}

fn display_template_parameter<B: Buffer>(ob: &mut Writer<B>, flags: DisplayOptions, k: &TemplateParameterKind) -> Result<bool> {
    match k {
        TemplateParameterKind::Indexed {
            is_non_type,
            index,
            degraded,
        } => {
            let kind = if *is_non_type { "non-type-parameter" } else { "template-parameter" };
            write!(ob, "`{kind}{index}'")?;
            if *degraded && !flags.contains(DisplayOptions::NO_REFERENCE_TOOL_EMULATION) {
                // Reproduces the reference tool's documented missing-close-quote bug
                // (spec §4.3.7/§9): a stray extra closing quote past the real one.
                write!(ob, "'")?;
            }
        }
        TemplateParameterKind::Named { name, .. } => {
            write!(ob, "{name}")?;
        }
    }
    Ok(true)
}

/// Strips the leading `__` when [`DisplayOptions::NO_LEADING_UNDERSCORES`] is
/// set (spec §6); used for calling conventions and the `restrict`/`unaligned`
/// storage modifiers, which are the only spellings spec §6 ties to this flag.
fn calling_conv_spelling(flags: DisplayOptions, conv: CallingConv) -> &'static str {
    if flags.contains(DisplayOptions::NO_LEADING_UNDERSCORES) {
        match conv {
            CallingConv::Cdecl => "cdecl",
            CallingConv::Pascal => "pascal",
            CallingConv::Thiscall => "thiscall",
            CallingConv::Stdcall => "stdcall",
            CallingConv::Fastcall => "fastcall",
            CallingConv::Clrcall => "clrcall",
            CallingConv::Eabi => "eabi",
        }
    } else {
        conv.spelling()
    }
}

impl WriteableNode for QualifiedNameNode<'_> {
    fn display_on<B: Buffer>(
        &self,
        cache: &NodeCache,
        ob: &mut Writer<B>,
        flags: DisplayOptions,
        _spacing: Spacing,
    ) -> Result<bool> {
        if !flags.contains(DisplayOptions::NAME_ONLY) {
            for q in self.qualifiers.iter().rev() {
                display_identifier_short(cache, ob, flags, q.resolve(cache))?;
                write!(ob, "::")?;
            }
        }
        display_terminal(cache, ob, flags, self)
    }
}

/// A qualifier's own short name, ignoring the outer scope recursion that a
/// full `display_on` would add (qualifiers are themselves rendered without
/// *their* scope prefix being re-expanded - each identifier in the chain
/// contributes exactly one segment).
fn display_identifier_short<B: Buffer>(cache: &NodeCache, ob: &mut Writer<B>, flags: DisplayOptions, id: &IdentifierNode) -> Result<bool> {
    id.display_on(cache, ob, flags, Spacing::None)
}

fn display_terminal<B: Buffer>(cache: &NodeCache, ob: &mut Writer<B>, flags: DisplayOptions, qn: &QualifiedNameNode) -> Result<bool> {
    match qn.terminal.resolve(cache) {
        IdentifierNode::Constructor => match qn.qualifiers.first() {
            Some(first) => display_identifier_short(cache, ob, flags, first.resolve(cache)),
            None => {
                write!(ob, "{{ctor}}")?;
                Ok(true)
            }
        },
        IdentifierNode::Destructor => {
            write!(ob, "~")?;
            match qn.qualifiers.first() {
                Some(first) => display_identifier_short(cache, ob, flags, first.resolve(cache)),
                None => {
                    write!(ob, "{{dtor}}")?;
                    Ok(true)
                }
            }
        }
        other => display_identifier_short(cache, ob, flags, other),
    }
}

impl WriteableNode for TemplateArgNode<'_> {
    fn display_on<B: Buffer>(
        &self,
        cache: &NodeCache,
        ob: &mut Writer<B>,
        flags: DisplayOptions,
        spacing: Spacing,
    ) -> Result<bool> {
        match self {
            TemplateArgNode::Type(t) => t.resolve(cache).display_on(cache, ob, flags, spacing),
            TemplateArgNode::Literal(Literal::Integer(v)) => {
                write!(ob, "{v}")?;
                Ok(true)
            }
            TemplateArgNode::Literal(Literal::Float { mantissa, exponent }) => {
                write!(ob, "{mantissa}e{exponent}")?;
                Ok(true)
            }
            TemplateArgNode::AddressOfSymbol(None) => {
                write!(ob, "0")?;
                Ok(true)
            }
            TemplateArgNode::AddressOfSymbol(Some(s)) => {
                write!(ob, "&")?;
                s.resolve(cache).display_on(cache, ob, flags, Spacing::None)
            }
            TemplateArgNode::Symbol(s) => s.resolve(cache).display_on(cache, ob, flags, Spacing::None),
            TemplateArgNode::TemplateParameter(k) => display_template_parameter(ob, flags, k),
            TemplateArgNode::Curly(c) => display_curly(cache, ob, flags, c),
        }
    }
}

fn display_curly<B: Buffer>(cache: &NodeCache, ob: &mut Writer<B>, flags: DisplayOptions, c: &CurlyArg) -> Result<bool> {
    write!(ob, "{{")?;
    for (i, child) in c.children.iter().enumerate() {
        if i > 0 {
            write!(ob, ",")?;
        }
        match child {
            CurlyChild::Symbol(s) => {
                s.resolve(cache).display_on(cache, ob, flags, Spacing::None)?;
            }
            CurlyChild::Integer(v) => {
                write!(ob, "{v}")?;
            }
        }
    }
    write!(ob, "}}")?;
    Ok(true)
}

impl WriteableNode for TypeNode<'_> {
    fn display_on<B: Buffer>(
        &self,
        cache: &NodeCache,
        ob: &mut Writer<B>,
        flags: DisplayOptions,
        spacing: Spacing,
    ) -> Result<bool> {
        self.display_pair(cache, ob, flags, spacing, &mut |_| Ok(false))
    }
}

impl WriteableTypeNode for TypeNode<'_> {
    fn display_pre<B: Buffer>(
        &self,
        cache: &NodeCache,
        ob: &mut Writer<B>,
        flags: DisplayOptions,
        _spacing: Spacing,
    ) -> Result<bool> {
        match self {
            TypeNode::Primitive(p) => {
                write!(ob, "{}", p.spelling())?;
                Ok(true)
            }
            TypeNode::Compound { tag, name } => {
                if !flags.contains(DisplayOptions::NO_COMPOUND_TYPE_CLASS) {
                    write!(ob, "{} ", tag.spelling())?;
                }
                name.resolve(cache).display_on(cache, ob, flags, Spacing::None)
            }
            TypeNode::Enum { name, .. } => {
                if !flags.contains(DisplayOptions::NO_COMPOUND_TYPE_CLASS) {
                    write!(ob, "enum ")?;
                }
                name.resolve(cache).display_on(cache, ob, flags, Spacing::None)
            }
            TypeNode::NullPtr => {
                write!(ob, "std::nullptr_t")?;
                Ok(true)
            }
            TypeNode::Pointer {
                cv,
                modifiers,
                target_storage,
                target,
            } => {
                target.resolve(cache).display_pre(cache, ob, flags, Spacing::Trailing)?;
                write_pointee_cv(ob, target_storage)?;
                write!(ob, "*")?;
                write_cv_and_modifiers(ob, flags, *cv, modifiers)?;
                Ok(true)
            }
            TypeNode::Reference {
                is_volatile,
                modifiers,
                target_storage,
                target,
            } => {
                target.resolve(cache).display_pre(cache, ob, flags, Spacing::Trailing)?;
                write_pointee_cv(ob, target_storage)?;
                write!(ob, "&")?;
                if *is_volatile {
                    write!(ob, " volatile")?;
                }
                write_modifiers(ob, flags, modifiers)?;
                Ok(true)
            }
            TypeNode::RvalueReference { is_volatile, target } => {
                target.resolve(cache).display_pre(cache, ob, flags, Spacing::Trailing)?;
                write!(ob, "&&")?;
                if *is_volatile {
                    write!(ob, " volatile")?;
                }
                Ok(true)
            }
            TypeNode::Function(sig) => {
                if !flags.contains(DisplayOptions::NO_RETURN_TYPE) {
                    if let Some(rt) = sig.return_type {
                        rt.resolve(cache).display_on(cache, ob, flags, Spacing::Trailing)?;
                    }
                }
                if !flags.contains(DisplayOptions::NO_CALLING_CONVENTION) {
                    output_space_if_necessary(ob)?;
                    write!(ob, "{} ", calling_conv_spelling(flags, sig.calling_conv))?;
                }
                Ok(true)
            }
        }
    }

    fn display_post<B: Buffer>(&self, cache: &NodeCache, ob: &mut Writer<B>, flags: DisplayOptions) -> Result<bool> {
        match self {
            TypeNode::Function(sig) => {
                write!(ob, "(")?;
                for (i, p) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(ob, ",")?;
                    }
                    p.resolve(cache).display_on(cache, ob, flags, Spacing::None)?;
                }
                if sig.is_variadic {
                    if !sig.params.is_empty() {
                        write!(ob, ",")?;
                    }
                    write!(ob, "...")?;
                }
                write!(ob, ")")?;
                Ok(true)
            }
            TypeNode::Pointer { target, .. } | TypeNode::Reference { target, .. } | TypeNode::RvalueReference { target, .. } => {
                target.resolve(cache).display_post(cache, ob, flags)
            }
            _ => Ok(false),
        }
    }
}

/// The cv-qualification carried by the byte following a pointer/reference
/// tag, applying to the pointee rather than the pointer itself (`char
/// const *` vs `char *const`).
fn write_pointee_cv<B: Buffer>(ob: &mut Writer<B>, storage: &StorageClass) -> Result<()> {
    if storage.is_const() {
        write!(ob, " const")?;
    }
    if storage.is_volatile() {
        write!(ob, " volatile")?;
    }
    Ok(())
}

fn write_cv_and_modifiers<B: Buffer>(ob: &mut Writer<B>, flags: DisplayOptions, cv: StorageClassFlags, modifiers: &[StorageModifierKind]) -> Result<()> {
    if cv.contains(StorageClassFlags::CONST) {
        write!(ob, " const")?;
    }
    if cv.contains(StorageClassFlags::VOLATILE) {
        write!(ob, " volatile")?;
    }
    write_modifiers(ob, flags, modifiers)
}

fn write_modifiers<B: Buffer>(ob: &mut Writer<B>, flags: DisplayOptions, modifiers: &[StorageModifierKind]) -> Result<()> {
    let underscores = !flags.contains(DisplayOptions::NO_LEADING_UNDERSCORES);
    if !flags.contains(DisplayOptions::NO_PTR64) && modifiers.contains(&StorageModifierKind::Ptr64) {
        write!(ob, " {}", if underscores { "__ptr64" } else { "ptr64" })?;
    }
    if !flags.contains(DisplayOptions::NO_TOOLCHAIN_EXTENSIONS) {
        if modifiers.contains(&StorageModifierKind::Unaligned) {
            write!(ob, " {}", if underscores { "__unaligned" } else { "unaligned" })?;
        }
        if modifiers.contains(&StorageModifierKind::Restrict) {
            write!(ob, " {}", if underscores { "__restrict" } else { "restrict" })?;
        }
    }
    Ok(())
}

fn display_function_symbol<B: Buffer>(cache: &NodeCache, ob: &mut Writer<B>, flags: DisplayOptions, f: &FunctionSymbolNode) -> Result<bool> {
    let sig_type = f.signature.resolve(cache);
    let TypeNode::Function(sig) = sig_type else {
        unreachable!("function symbol's signature handle must resolve to a function type");
    };

    if flags.contains(DisplayOptions::TYPE_ONLY) {
        return sig_type.display_pair(cache, ob, flags, Spacing::None, &mut |_| Ok(false));
    }

    let mut wrote = false;
    if !flags.contains(DisplayOptions::NAME_ONLY) {
        if !flags.contains(DisplayOptions::NO_MEMBER_ACCESS) {
            if let FunctionKindCode::Member { protection, .. } = f.kind {
                write!(ob, "{}: ", protection.spelling())?;
                wrote = true;
            }
        }
        if !flags.contains(DisplayOptions::NO_MEMBER_TYPE) {
            if let FunctionKindCode::Member { kind, .. } = f.kind {
                match kind {
                    MemberFunctionKind::Static => {
                        write!(ob, "static ")?;
                        wrote = true;
                    }
                    MemberFunctionKind::Virtual => {
                        write!(ob, "virtual ")?;
                        wrote = true;
                    }
                    MemberFunctionKind::Instance => {}
                }
            }
        }
        if !flags.contains(DisplayOptions::NO_RETURN_TYPE) {
            if let Some(rt) = sig.return_type {
                rt.resolve(cache).display_on(cache, ob, flags, Spacing::Trailing)?;
                wrote = true;
            }
        }
        if !flags.contains(DisplayOptions::NO_CALLING_CONVENTION) {
            output_space_if_necessary(ob)?;
            write!(ob, "{} ", calling_conv_spelling(flags, sig.calling_conv))?;
            wrote = true;
        }
    }

    let qn = f.name.resolve(cache);
    if matches!(qn.terminal.resolve(cache), IdentifierNode::Cast) && !flags.contains(DisplayOptions::NAME_ONLY) {
        for q in qn.qualifiers.iter().rev() {
            display_identifier_short(cache, ob, flags, q.resolve(cache))?;
            write!(ob, "::")?;
        }
        write!(ob, "operator ")?;
        if let Some(rt) = sig.return_type {
            rt.resolve(cache).display_on(cache, ob, flags, Spacing::None)?;
        }
    } else {
        qn.display_on(cache, ob, flags, Spacing::None)?;
    }
    wrote = true;

    if !flags.contains(DisplayOptions::NAME_ONLY) {
        write!(ob, "(")?;
        for (i, p) in sig.params.iter().enumerate() {
            if i > 0 {
                write!(ob, ",")?;
            }
            p.resolve(cache).display_on(cache, ob, flags, Spacing::None)?;
        }
        if sig.is_variadic {
            if !sig.params.is_empty() {
                write!(ob, ",")?;
            }
            write!(ob, "...")?;
        }
        write!(ob, ")")?;
        if !flags.contains(DisplayOptions::NO_MEMBER_STORAGE_CLASS) {
            if let Some(storage) = f.this_storage {
                if storage.is_const() {
                    write!(ob, " const")?;
                }
                if storage.is_volatile() {
                    write!(ob, " volatile")?;
                }
            }
        }
    }
    Ok(wrote)
}

fn display_variable_symbol<B: Buffer>(cache: &NodeCache, ob: &mut Writer<B>, flags: DisplayOptions, v: &VariableSymbolNode) -> Result<bool> {
    if flags.contains(DisplayOptions::TYPE_ONLY) {
        return v.ty.resolve(cache).display_on(cache, ob, flags, Spacing::None);
    }
    if flags.contains(DisplayOptions::NAME_ONLY) {
        return v.name.resolve(cache).display_on(cache, ob, flags, Spacing::None);
    }

    let mut wrote = false;
    if !flags.contains(DisplayOptions::NO_MEMBER_ACCESS) {
        if let VariableKind::StaticMember(p) = v.kind {
            write!(ob, "{}: ", p.spelling())?;
            wrote = true;
        }
    }
    v.ty.resolve(cache).display_on(cache, ob, flags, Spacing::Trailing)?;
    wrote = true;
    output_space_if_necessary(ob)?;
    v.name.resolve(cache).display_on(cache, ob, flags, Spacing::None)?;
    Ok(wrote)
}

fn display_special_data_symbol<B: Buffer>(cache: &NodeCache, ob: &mut Writer<B>, flags: DisplayOptions, s: &SpecialDataSymbolNode) -> Result<bool> {
    match &s.detail {
        SpecialDataDetail::Vtable { for_target } => {
            write!(ob, "const ")?;
            s.name.resolve(cache).display_on(cache, ob, flags, Spacing::None)?;
            write!(ob, "::`vftable'")?;
            if let Some(t) = for_target {
                write!(ob, "{{for `")?;
                t.resolve(cache).display_on(cache, ob, flags, Spacing::None)?;
                write!(ob, "'}}")?;
            }
            Ok(true)
        }
        SpecialDataDetail::Special | SpecialDataDetail::Other(_) => s.name.resolve(cache).display_on(cache, ob, flags, Spacing::None),
    }
}

impl WriteableNode for SymbolNode<'_> {
    fn display_on<B: Buffer>(
        &self,
        cache: &NodeCache,
        ob: &mut Writer<B>,
        flags: DisplayOptions,
        spacing: Spacing,
    ) -> Result<bool> {
        match self {
            SymbolNode::Function(f) => display_function_symbol(cache, ob, flags, f),
            SymbolNode::Variable(v) => display_variable_symbol(cache, ob, flags, v),
            SymbolNode::SpecialData(s) => display_special_data_symbol(cache, ob, flags, s),
            SymbolNode::NameFragment(qn) => qn.resolve(cache).display_on(cache, ob, flags, spacing),
            SymbolNode::CodeViewReserved => {
                write!(ob, "`codeview reserved symbol'")?;
                Ok(true)
            }
            SymbolNode::DoubleEncoded { inner, trailing } => {
                inner.resolve(cache).display_on(cache, ob, flags, spacing)?;
                write!(ob, "{trailing}")?;
                Ok(true)
            }
        }
    }
}
