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

//! The recursive-descent parser that turns a mangled symbol into a tree of
//! arena-allocated nodes.
//!
//! `Parser` owns the tokenizer, the arena, the node cache being built, and
//! the three back-reference tables a symbol accumulates as it is read.
//! Nothing here prints anything; that lives in `nodes::printer`.

use crate::{
    alloc,
    cache::{
        NodeCache,
        NodeHandle,
        NodeStorage,
    },
    extensions::CharExt as _,
    nodes::{
        CallingConv,
        CurlyArg,
        CurlyChild,
        CurlyKind,
        FunctionKindCode,
        FunctionSymbolNode,
        FunctionTypeNode,
        IdentifierNode,
        Literal,
        MemberFunctionKind,
        OperatorKind,
        PrimitiveKind,
        ProtectionLevel,
        QualifiedNameNode,
        RttiNode,
        SpecialDataDetail,
        SpecialDataKind,
        SpecialDataSymbolNode,
        SpecialName,
        StorageClass,
        StorageClassFlags,
        StorageModifierKind,
        StorageModifierSeq,
        SymbolNode,
        TagKind,
        TemplateArgNode,
        TemplateNode,
        TemplateParameterKind,
        TypeNode,
        VariableKind,
        VariableSymbolNode,
    },
    token::Tokenizer,
    Error,
    ParseOptions,
    Result,
};
use arrayvec::ArrayVec;
use bumpalo::Bump;
use std::mem;

/// The three back-reference tables a symbol accumulates while it is parsed.
/// A template opens a fresh scope for all three (`mem::take`'d on entry,
/// restored on exit) since back-references never cross a template argument
/// boundary.
#[derive(Default)]
struct BackrefContext<'alloc> {
    names: ArrayVec<NodeHandle<IdentifierNode<'alloc>>, 10>,
    function_params: ArrayVec<NodeHandle<TypeNode<'alloc>>, 10>,
    template_args: ArrayVec<NodeHandle<TemplateArgNode<'alloc>>, 10>,
}

pub(crate) struct Parser<'s, 'alloc> {
    tokenizer: Tokenizer<'s>,
    options: ParseOptions,
    arena: &'alloc Bump,
    cache: NodeCache<'alloc>,
    backrefs: BackrefContext<'alloc>,
}

impl<'s, 'alloc> Parser<'s, 'alloc> {
    pub(crate) fn new(mangled: &'s str, options: ParseOptions, arena: &'alloc Bump) -> Result<Self> {
        Ok(Self {
            tokenizer: Tokenizer::new(mangled)?,
            options,
            arena,
            cache: NodeCache::new(arena),
            backrefs: BackrefContext::default(),
        })
    }

    pub(crate) fn into_cache(self) -> NodeCache<'alloc> {
        self.cache
    }

    fn pos(&self) -> usize {
        self.tokenizer.position()
    }

    fn symbol(&self) -> String {
        self.tokenizer.full_symbol().to_owned()
    }

    // ---- top level -----------------------------------------------------

    pub(crate) fn parse_symbol(&mut self) -> Result<NodeHandle<SymbolNode<'alloc>>> {
        let root = self.parse_nested_symbol()?;
        if !self.tokenizer.is_empty() {
            return Err(Error::NonsenseAtEndOfSymbol {
                pos: self.pos(),
                symbol: self.symbol(),
            });
        }
        Ok(root)
    }

    /// Parses one full `'?'`-prefixed symbol without requiring the
    /// tokenizer to be exhausted afterward. Used both as the outer entry
    /// point (via [`Self::parse_symbol`]) and for symbols nested inside
    /// another production (special-qualifiers, double-encoded bodies,
    /// template arguments, curly-argument children).
    fn parse_nested_symbol(&mut self) -> Result<NodeHandle<SymbolNode<'alloc>>> {
        let start_pos = self.pos();
        if self.tokenizer.try_consume_char('?').is_none() {
            return Err(Error::BadSymbolStart {
                pos: start_pos,
                symbol: self.symbol(),
            });
        }
        self.parse_symbol_body()
    }

    fn parse_symbol_body(&mut self) -> Result<NodeHandle<SymbolNode<'alloc>>> {
        if self.tokenizer.try_consume_char('@').is_some() {
            return self.cache.intern(SymbolNode::CodeViewReserved);
        }
        if self.tokenizer.try_consume_str("??").is_some() {
            let inner = self.parse_nested_symbol()?;
            let trailing = alloc::alloc_str(self.arena, self.tokenizer.rest_str());
            while self.tokenizer.try_consume_any().is_some() {}
            return self.cache.intern(SymbolNode::DoubleEncoded { inner, trailing });
        }

        let name = self.parse_qualified_name()?;
        self.parse_symbol_kind(name)
    }

    fn parse_symbol_kind(&mut self, name: NodeHandle<QualifiedNameNode<'alloc>>) -> Result<NodeHandle<SymbolNode<'alloc>>> {
        let pos = self.pos();
        let ch = self
            .tokenizer
            .try_consume_any()
            .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
        match ch {
            '0' => self.parse_static_member_variable(name, ProtectionLevel::Private),
            '1' => self.parse_static_member_variable(name, ProtectionLevel::Protected),
            '2' => self.parse_static_member_variable(name, ProtectionLevel::Public),
            '3' => self.parse_variable_symbol(name, VariableKind::Global),
            '4' => self.parse_special_data(name, SpecialDataKind::Guard),
            '5' => self.parse_special_data(name, SpecialDataKind::LocalStatic),
            '6' => self.parse_vtable_symbol(name),
            '7' => self.parse_special_data(name, SpecialDataKind::VbTableLike),
            '8' => self.parse_rtti_host_symbol(name),
            '9' => self.parse_special_data(name, SpecialDataKind::Reserved9),
            c if c.is_ascii_uppercase() => self.parse_function_symbol(name, c),
            c => Err(Error::InvalidSymbolTypeCode {
                ch: c,
                pos,
                symbol: self.symbol(),
            }),
        }
    }

    // ---- qualified names / identifiers ----------------------------------

    fn parse_qualified_name(&mut self) -> Result<NodeHandle<QualifiedNameNode<'alloc>>> {
        let terminal = self.parse_terminal_identifier()?;
        let mut qualifiers = alloc::new_vec(self.arena);
        loop {
            if self.tokenizer.try_consume_char('@').is_some() {
                break;
            }
            if self.tokenizer.is_empty() {
                return Err(Error::UnterminatedQualifiedName {
                    pos: self.pos(),
                    symbol: self.symbol(),
                });
            }
            qualifiers.push(self.parse_qualifier()?);
        }
        let qualifiers = alloc::allocate_slice(self.arena, &qualifiers);
        self.cache.intern(QualifiedNameNode { terminal, qualifiers })
    }

    fn parse_terminal_identifier(&mut self) -> Result<NodeHandle<IdentifierNode<'alloc>>> {
        if let Some(handle) = self.try_parse_identifier_backref()? {
            return Ok(handle);
        }
        let handle = if self.tokenizer.try_consume_char('?').is_some() {
            self.parse_special_identifier(true)?
        } else {
            self.parse_plain_identifier_body()?
        };
        self.push_name_backref(handle);
        Ok(handle)
    }

    fn parse_qualifier(&mut self) -> Result<NodeHandle<IdentifierNode<'alloc>>> {
        if let Some(handle) = self.try_parse_identifier_backref()? {
            return Ok(handle);
        }
        let handle = if self.tokenizer.try_consume_char('?').is_some() {
            self.parse_special_identifier(false)?
        } else {
            self.parse_plain_identifier_body()?
        };
        self.push_name_backref(handle);
        Ok(handle)
    }

    fn try_parse_identifier_backref(&mut self) -> Result<Option<NodeHandle<IdentifierNode<'alloc>>>> {
        if let Some(d) = self.tokenizer.try_consume_ascii_digit() {
            let index = (d as u8 - b'0') as usize;
            let handle = *self.backrefs.names.get(index).ok_or_else(|| Error::InvalidBackReference {
                pos: self.pos(),
                symbol: self.symbol(),
            })?;
            return Ok(Some(self.resolve_identifier_backref(handle)?));
        }
        Ok(None)
    }

    fn push_name_backref(&mut self, handle: NodeHandle<IdentifierNode<'alloc>>) {
        let _ = self.backrefs.names.try_push(handle);
    }

    fn resolve_identifier_backref(&mut self, handle: NodeHandle<IdentifierNode<'alloc>>) -> Result<NodeHandle<IdentifierNode<'alloc>>> {
        let node = *handle.resolve(&self.cache);
        self.cache.intern(node)
    }

    fn parse_plain_identifier_body(&mut self) -> Result<NodeHandle<IdentifierNode<'alloc>>> {
        let text = self.parse_plain_identifier_raw()?;
        self.cache.intern(IdentifierNode::Identifier(text))
    }

    /// Reads identifier characters up to (and consuming) the terminating
    /// `'@'`.
    fn parse_plain_identifier_raw(&mut self) -> Result<&'alloc str> {
        let start_pos = self.pos();
        let rest = self.tokenizer.rest_str();
        let mut len = 0usize;
        while let Some(tok) = self.tokenizer.peek()? {
            if !tok.is_valid_identifier_char() {
                break;
            }
            self.tokenizer.try_consume_any();
            len += tok.ch.len_utf8();
        }
        if len == 0 {
            return Err(Error::EmptyName {
                pos: start_pos,
                symbol: self.symbol(),
            });
        }
        let text = &rest[..len];
        if self.tokenizer.try_consume_char('@').is_none() {
            return Err(Error::UnterminatedName {
                pos: self.pos(),
                symbol: self.symbol(),
            });
        }
        Ok(alloc::alloc_str(self.arena, text))
    }

    /// Handles everything that can follow a `'?'` in identifier position:
    /// templates, anonymous namespaces, nested nested-symbol qualifiers,
    /// lexical frames (qualifiers only), and — terminal identifiers only —
    /// constructors/destructors/operators/casts/special names/RTTI.
    fn parse_special_identifier(&mut self, is_terminal: bool) -> Result<NodeHandle<IdentifierNode<'alloc>>> {
        if self.tokenizer.try_consume_char('$').is_some() {
            return self.parse_template_identifier();
        }
        if let Some(_marker) = self.tokenizer.try_consume_char_if(|c| c == 'A' || c == '%') {
            let text = self.parse_plain_identifier_raw()?;
            return self.cache.intern(IdentifierNode::AnonymousNamespace(text));
        }
        if !is_terminal && self.tokenizer.first_char().is_some_and(|c| c.is_ascii_digit()) {
            let value = self.parse_unsigned()?;
            return self.cache.intern(IdentifierNode::LexicalFrame(value));
        }
        if self.tokenizer.try_consume_char('?').is_some() {
            let nested = self.parse_nested_symbol()?;
            return self.cache.intern(IdentifierNode::SpecialQualifier(nested));
        }
        if !is_terminal {
            return Err(Error::InvalidIdentifierCharacter {
                ch: self.tokenizer.first_char().unwrap_or('\0'),
                pos: self.pos(),
                symbol: self.symbol(),
            });
        }

        if let Some(d) = self.tokenizer.try_consume_char_if(|c| c == '0' || c == '1') {
            return self.cache.intern(if d == '0' {
                IdentifierNode::Constructor
            } else {
                IdentifierNode::Destructor
            });
        }
        if self.tokenizer.try_consume_char('_').is_some() {
            if self.tokenizer.try_consume_char('_').is_some() {
                let pos = self.pos();
                let ch = self
                    .tokenizer
                    .try_consume_any()
                    .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
                let op = OperatorKind::from_extended_letter(ch).ok_or(Error::InvalidSpecialNameCode {
                    ch,
                    pos,
                    symbol: self.symbol(),
                })?;
                return self.cache.intern(IdentifierNode::Operator(op));
            }
            let pos = self.pos();
            let ch = self
                .tokenizer
                .try_consume_any()
                .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
            if ch == 'R' {
                return self.parse_rtti_identifier();
            }
            let special = SpecialName::from_letter(ch).ok_or(Error::InvalidSpecialNameCode {
                ch,
                pos,
                symbol: self.symbol(),
            })?;
            return self.cache.intern(IdentifierNode::Special(special));
        }
        let pos = self.pos();
        let ch = self
            .tokenizer
            .try_consume_any()
            .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
        if ch == 'B' {
            return self.cache.intern(IdentifierNode::Cast);
        }
        if ch == 'U' || ch == 'V' {
            return Err(Error::InvalidSpecialNameCode {
                ch,
                pos,
                symbol: self.symbol(),
            });
        }
        let op = OperatorKind::from_letter(ch).ok_or(Error::InvalidSpecialNameCode {
            ch,
            pos,
            symbol: self.symbol(),
        })?;
        self.cache.intern(IdentifierNode::Operator(op))
    }

    // ---- templates -------------------------------------------------------

    fn parse_template_identifier(&mut self) -> Result<NodeHandle<IdentifierNode<'alloc>>> {
        let saved_names = mem::take(&mut self.backrefs.names);
        let saved_params = mem::take(&mut self.backrefs.function_params);
        let saved_args = mem::take(&mut self.backrefs.template_args);
        let result = self.parse_template_body();
        self.backrefs.names = saved_names;
        self.backrefs.function_params = saved_params;
        self.backrefs.template_args = saved_args;
        let template = result?;
        self.cache.intern(IdentifierNode::Template(template))
    }

    fn parse_template_body(&mut self) -> Result<TemplateNode<'alloc>> {
        let name = if self.tokenizer.try_consume_char('@').is_some() {
            ""
        } else {
            self.parse_plain_identifier_raw()?
        };
        let mut args = alloc::new_vec(self.arena);
        loop {
            if self.tokenizer.try_consume_char('@').is_some() {
                break;
            }
            if self.tokenizer.is_empty() {
                return Err(Error::UnterminatedTemplateParameterList {
                    pos: self.pos(),
                    symbol: self.symbol(),
                });
            }
            let arg = self.parse_template_argument()?;
            let _ = self.backrefs.template_args.try_push(arg);
            args.push(arg);
        }
        let args = alloc::allocate_slice(self.arena, &args);
        Ok(TemplateNode { name, args })
    }

    fn parse_template_argument(&mut self) -> Result<NodeHandle<TemplateArgNode<'alloc>>> {
        if let Some(d) = self.tokenizer.try_consume_ascii_digit() {
            let index = (d as u8 - b'0') as usize;
            let handle = *self
                .backrefs
                .template_args
                .get(index)
                .ok_or_else(|| Error::InvalidBackReference { pos: self.pos(), symbol: self.symbol() })?;
            return self.resolve_template_arg_backref(handle);
        }
        if self.tokenizer.try_consume_char('$').is_some() {
            return self.parse_special_template_argument();
        }
        let ty = self.parse_type()?;
        self.cache.intern(TemplateArgNode::Type(ty))
    }

    fn resolve_template_arg_backref(&mut self, handle: NodeHandle<TemplateArgNode<'alloc>>) -> Result<NodeHandle<TemplateArgNode<'alloc>>> {
        let node = *handle.resolve(&self.cache);
        self.cache.intern(node)
    }

    fn parse_special_template_argument(&mut self) -> Result<NodeHandle<TemplateArgNode<'alloc>>> {
        let pos = self.pos();
        let ch = self
            .tokenizer
            .try_consume_any()
            .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
        let node = match ch {
            '0' => {
                let value = self.parse_signed()?;
                TemplateArgNode::Literal(Literal::Integer(value))
            }
            '1' => {
                let target = self.parse_address_of_symbol()?;
                TemplateArgNode::AddressOfSymbol(target)
            }
            '2' => {
                let mantissa = self.parse_signed()?;
                let exponent = self.parse_signed()?;
                TemplateArgNode::Literal(Literal::Float { mantissa, exponent })
            }
            'D' | 'Q' => {
                let (is_non_type, index) = self.parse_indexed_template_parameter_head()?;
                let degraded = ch == 'D' && self.options.contains(ParseOptions::EMULATE_REFERENCE_BUGS);
                TemplateArgNode::TemplateParameter(TemplateParameterKind::Indexed {
                    is_non_type,
                    index,
                    degraded,
                })
            }
            'R' => {
                let is_non_type = self.tokenizer.try_consume_char('0').is_none();
                let name = self.parse_plain_identifier_raw()?;
                let index = u32::try_from(self.parse_unsigned()?).map_err(|_| Error::InvalidNumber {
                    pos,
                    symbol: self.symbol(),
                })?;
                TemplateArgNode::TemplateParameter(TemplateParameterKind::Named { is_non_type, name, index })
            }
            'E' => {
                let symbol = self.parse_nested_symbol()?;
                TemplateArgNode::Symbol(symbol)
            }
            'F' | 'G' | 'H' | 'I' | 'J' => self.parse_curly_argument(ch)?,
            _ => {
                return Err(Error::InvalidTemplateArgument {
                    pos,
                    symbol: self.symbol(),
                })
            }
        };
        self.cache.intern(node)
    }

    fn parse_indexed_template_parameter_head(&mut self) -> Result<(bool, u32)> {
        let pos = self.pos();
        let is_non_type = self.tokenizer.try_consume_char('?').is_none();
        let index = u32::try_from(self.parse_unsigned()?).map_err(|_| Error::InvalidNumber {
            pos,
            symbol: self.symbol(),
        })?;
        Ok((is_non_type, index))
    }

    fn parse_curly_argument(&mut self, letter: char) -> Result<TemplateArgNode<'alloc>> {
        let kind = match letter {
            'F' => CurlyKind::Gptmd,
            'G' => CurlyKind::Mptmf,
            'H' => CurlyKind::Vptmf,
            'I' => CurlyKind::Gptmf,
            'J' => CurlyKind::Vptmd,
            _ => unreachable!("parse_curly_argument called with non-curly letter"),
        };
        let arity = kind.arity();
        let mut children = alloc::new_vec(self.arena);
        for _ in 0..arity {
            let is_integer = self
                .tokenizer
                .first_char()
                .is_some_and(|c| c.is_ascii_digit() || c == '?');
            let child = if is_integer {
                CurlyChild::Integer(self.parse_signed()?)
            } else {
                CurlyChild::Symbol(self.parse_nested_symbol()?)
            };
            children.push(child);
        }
        let children = alloc::allocate_slice(self.arena, &children);
        Ok(TemplateArgNode::Curly(CurlyArg { kind, children }))
    }

    fn parse_address_of_symbol(&mut self) -> Result<Option<NodeHandle<SymbolNode<'alloc>>>> {
        if self.tokenizer.try_consume_char('A').is_some() {
            return Ok(None);
        }
        Ok(Some(self.parse_nested_symbol()?))
    }

    // ---- numbers -----------------------------------------------------------

    fn parse_unsigned(&mut self) -> Result<u64> {
        let pos = self.pos();
        if let Some(d) = self.tokenizer.try_consume_ascii_digit() {
            let digit = u64::from(d as u8 - b'0');
            return Ok(digit + 1);
        }
        let mut value: u64 = 0;
        let mut any = false;
        loop {
            let ch = self
                .tokenizer
                .first_char()
                .ok_or_else(|| Error::InvalidNumber { pos, symbol: self.symbol() })?;
            if ch == '@' {
                self.tokenizer.try_consume_any();
                break;
            }
            if !ch.is_rebased_ascii_hexdigit() {
                return Err(Error::InvalidNumber { pos, symbol: self.symbol() });
            }
            let nibble = ch
                .try_convert_rebased_ascii_hexdigit_to_number()
                .ok_or_else(|| Error::InvalidNumber { pos, symbol: self.symbol() })?;
            value = value
                .checked_mul(16)
                .and_then(|v| v.checked_add(u64::from(nibble)))
                .ok_or_else(|| Error::InvalidNumber { pos, symbol: self.symbol() })?;
            self.tokenizer.try_consume_any();
            any = true;
        }
        if !any {
            return Err(Error::InvalidNumber { pos, symbol: self.symbol() });
        }
        Ok(value)
    }

    fn parse_signed(&mut self) -> Result<i64> {
        let pos = self.pos();
        let negative = self.tokenizer.try_consume_char('?').is_some();
        let value = self.parse_unsigned()?;
        if negative {
            i64::try_from(value).map(|v| -v).map_err(|_| Error::InvalidNumber { pos, symbol: self.symbol() })
        } else {
            i64::try_from(value).map_err(|_| Error::InvalidNumber { pos, symbol: self.symbol() })
        }
    }

    // ---- types --------------------------------------------------------------

    fn parse_type(&mut self) -> Result<NodeHandle<TypeNode<'alloc>>> {
        if let Some(d) = self.tokenizer.try_consume_ascii_digit() {
            let index = (d as u8 - b'0') as usize;
            let handle = *self
                .backrefs
                .function_params
                .get(index)
                .ok_or_else(|| Error::InvalidBackReference { pos: self.pos(), symbol: self.symbol() })?;
            return self.resolve_type_backref(handle);
        }

        let start = self.pos();
        let pos = start;
        let ch = self
            .tokenizer
            .try_consume_any()
            .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
        let node = match ch {
            'T' => TypeNode::Compound {
                tag: TagKind::Union,
                name: self.parse_qualified_name()?,
            },
            'U' => TypeNode::Compound {
                tag: TagKind::Struct,
                name: self.parse_qualified_name()?,
            },
            'V' => TypeNode::Compound {
                tag: TagKind::Class,
                name: self.parse_qualified_name()?,
            },
            'W' => {
                let base_pos = self.pos();
                let digit = self
                    .tokenizer
                    .try_consume_ascii_digit()
                    .ok_or_else(|| Error::InvalidEnumType {
                        ch: self.tokenizer.first_char().unwrap_or('\0'),
                        pos: base_pos,
                        symbol: self.symbol(),
                    })?;
                let base = PrimitiveKind::from_enum_base_digit(digit as u8 - b'0').ok_or(Error::InvalidEnumType {
                    ch: digit,
                    pos: base_pos,
                    symbol: self.symbol(),
                })?;
                let name = self.parse_qualified_name()?;
                TypeNode::Enum { base, name }
            }
            'P' | 'Q' | 'R' | 'S' => self.parse_pointer_type(ch)?,
            'A' | 'B' => self.parse_lvalue_reference_type(ch == 'B')?,
            '$' => self.parse_extended_type()?,
            '_' => {
                let pos2 = self.pos();
                let ext = self
                    .tokenizer
                    .try_consume_any()
                    .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
                let kind = PrimitiveKind::from_extended_letter(ext).ok_or(Error::InvalidTypeCode {
                    ch: ext,
                    pos: pos2,
                    symbol: self.symbol(),
                })?;
                TypeNode::Primitive(kind)
            }
            c if c.is_ascii_uppercase() => {
                let kind = PrimitiveKind::from_primitive_letter(c).ok_or(Error::InvalidTypeCode {
                    ch: c,
                    pos,
                    symbol: self.symbol(),
                })?;
                TypeNode::Primitive(kind)
            }
            c => {
                return Err(Error::InvalidTypeCode { ch: c, pos, symbol: self.symbol() });
            }
        };
        let handle = self.cache.intern(node)?;
        let end = self.pos();
        if end > start + 1 {
            let _ = self.backrefs.function_params.try_push(handle);
        }
        Ok(handle)
    }

    fn resolve_type_backref(&mut self, handle: NodeHandle<TypeNode<'alloc>>) -> Result<NodeHandle<TypeNode<'alloc>>> {
        let node = *handle.resolve(&self.cache);
        self.cache.intern(node)
    }

    /// Target of a pointer or reference: either an ordinary type, or — when
    /// the next character is one of the function-pointer/member-pointer
    /// markers — a function type built directly, bypassing the digit
    /// back-reference dispatch in [`Self::parse_type`].
    fn parse_pointer_target(&mut self) -> Result<NodeHandle<TypeNode<'alloc>>> {
        if self.tokenizer.try_consume_char_if(|c| matches!(c, '6' | '7' | '8' | '9')).is_some() {
            let node = self.parse_function_type(None)?;
            return self.cache.intern(node);
        }
        self.parse_type()
    }

    fn parse_pointer_type(&mut self, tag: char) -> Result<TypeNode<'alloc>> {
        let cv = match tag {
            'P' => StorageClassFlags::empty(),
            'Q' => StorageClassFlags::CONST,
            'R' => StorageClassFlags::VOLATILE,
            'S' => StorageClassFlags::CONST | StorageClassFlags::VOLATILE,
            _ => unreachable!("parse_pointer_type called with non-pointer tag"),
        };
        let modifiers = self.parse_storage_modifiers();
        let (target_storage, target) = self.parse_indirection_target()?;
        Ok(TypeNode::Pointer {
            cv,
            modifiers,
            target_storage,
            target,
        })
    }

    fn parse_lvalue_reference_type(&mut self, is_volatile: bool) -> Result<TypeNode<'alloc>> {
        let modifiers = self.parse_storage_modifiers();
        let (target_storage, target) = self.parse_indirection_target()?;
        Ok(TypeNode::Reference {
            is_volatile,
            modifiers,
            target_storage,
            target,
        })
    }

    /// The storage-class byte and target that follow a pointer/reference
    /// tag and its `E`/`F`/`I` modifiers. A function-pointer/member-pointer
    /// marker (`6`-`9`) here has no separate pointee storage-class byte of
    /// its own — it goes straight to [`Self::parse_pointer_target`], which
    /// owns that digit, rather than through [`Self::parse_storage_class`].
    fn parse_indirection_target(&mut self) -> Result<(StorageClass<'alloc>, NodeHandle<TypeNode<'alloc>>)> {
        if matches!(self.tokenizer.first_char(), Some('6' | '7' | '8' | '9')) {
            return Ok((StorageClass::EMPTY, self.parse_pointer_target()?));
        }
        let target_storage = self.parse_storage_class()?;
        let target = self.parse_pointer_target()?;
        Ok((target_storage, target))
    }

    fn parse_extended_type(&mut self) -> Result<TypeNode<'alloc>> {
        let pos = self.pos();
        let ch = self
            .tokenizer
            .try_consume_any()
            .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
        match ch {
            '$' => {
                let pos2 = self.pos();
                let ext = self
                    .tokenizer
                    .try_consume_any()
                    .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
                match ext {
                    'Q' => Ok(TypeNode::RvalueReference {
                        is_volatile: false,
                        target: self.parse_pointer_target()?,
                    }),
                    'R' => Ok(TypeNode::RvalueReference {
                        is_volatile: true,
                        target: self.parse_pointer_target()?,
                    }),
                    _ => Err(Error::InvalidTypeCode {
                        ch: ext,
                        pos: pos2,
                        symbol: self.symbol(),
                    }),
                }
            }
            'T' => Ok(TypeNode::NullPtr),
            _ => Err(Error::InvalidTypeCode { ch, pos, symbol: self.symbol() }),
        }
    }

    fn parse_storage_modifiers(&mut self) -> StorageModifierSeq<'alloc> {
        let mut modifiers = alloc::new_vec(self.arena);
        loop {
            let kind = if self.tokenizer.try_consume_char('E').is_some() {
                StorageModifierKind::Ptr64
            } else if self.tokenizer.try_consume_char('F').is_some() {
                StorageModifierKind::Unaligned
            } else if self.tokenizer.try_consume_char('I').is_some() {
                StorageModifierKind::Restrict
            } else {
                break;
            };
            modifiers.push(kind);
        }
        alloc::allocate_slice(self.arena, &modifiers)
    }

    fn parse_storage_class(&mut self) -> Result<StorageClass<'alloc>> {
        let pos = self.pos();
        let ch = self
            .tokenizer
            .try_consume_any()
            .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
        let mut storage = StorageClass::EMPTY;
        match ch {
            'A' => {}
            'B' => storage.flags |= StorageClassFlags::CONST,
            'C' => storage.flags |= StorageClassFlags::VOLATILE,
            'D' => storage.flags |= StorageClassFlags::CONST | StorageClassFlags::VOLATILE,
            'M' => {
                storage.flags |= StorageClassFlags::BASED;
                storage.based_name = self.parse_based_name()?;
            }
            'N' => {
                storage.flags |= StorageClassFlags::BASED | StorageClassFlags::CONST;
                storage.based_name = self.parse_based_name()?;
            }
            'O' => {
                storage.flags |= StorageClassFlags::BASED | StorageClassFlags::VOLATILE;
                storage.based_name = self.parse_based_name()?;
            }
            'P' => {
                storage.flags |= StorageClassFlags::BASED | StorageClassFlags::CONST | StorageClassFlags::VOLATILE;
                storage.based_name = self.parse_based_name()?;
            }
            'Q' => storage.flags |= StorageClassFlags::MEMBER,
            'R' => storage.flags |= StorageClassFlags::MEMBER | StorageClassFlags::CONST,
            'S' => storage.flags |= StorageClassFlags::MEMBER | StorageClassFlags::VOLATILE,
            'T' => storage.flags |= StorageClassFlags::MEMBER | StorageClassFlags::CONST | StorageClassFlags::VOLATILE,
            '2' | '3' | '4' | '5' => {
                storage.flags |= StorageClassFlags::MEMBER;
                if matches!(ch, '3' | '5') {
                    storage.flags |= StorageClassFlags::CONST;
                }
                if matches!(ch, '4' | '5') {
                    storage.flags |= StorageClassFlags::VOLATILE;
                }
                storage.member_compound = Some(self.parse_type()?);
            }
            '6' | '7' => {
                storage.flags |= StorageClassFlags::FUNCTION;
                let inner = self.parse_storage_class()?;
                storage.function_storage = Some(alloc::allocate(self.arena, inner));
            }
            '8' | '9' => {
                storage.flags |= StorageClassFlags::FUNCTION;
            }
            '_' => {
                let pos2 = self.pos();
                let ext = self
                    .tokenizer
                    .try_consume_any()
                    .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
                match ext {
                    'A' | 'B' | 'C' | 'D' => {
                        storage.flags |= StorageClassFlags::BASED;
                        if matches!(ext, 'B' | 'D') {
                            storage.flags |= StorageClassFlags::CONST;
                        }
                        if matches!(ext, 'C' | 'D') {
                            storage.flags |= StorageClassFlags::VOLATILE;
                        }
                        storage.based_name = self.parse_based_name()?;
                    }
                    _ => {
                        return Err(Error::InvalidStorageClass {
                            ch: ext,
                            pos: pos2,
                            symbol: self.symbol(),
                        })
                    }
                }
            }
            'E'..='L' => {
                return Err(Error::InvalidStorageClass { ch, pos, symbol: self.symbol() });
            }
            _ => {
                return Err(Error::InvalidStorageClass { ch, pos, symbol: self.symbol() });
            }
        }
        Ok(storage)
    }

    fn parse_based_name(&mut self) -> Result<Option<NodeHandle<QualifiedNameNode<'alloc>>>> {
        if self.tokenizer.try_consume_char('0').is_some() || self.tokenizer.try_consume_char('@').is_some() {
            return Ok(None);
        }
        Ok(Some(self.parse_qualified_name()?))
    }

    // ---- functions ------------------------------------------------------

    fn parse_calling_convention(&mut self) -> Result<CallingConv> {
        let pos = self.pos();
        let ch = self
            .tokenizer
            .try_consume_any()
            .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
        CallingConv::from_letter(ch).ok_or(Error::InvalidCallingConvention {
            ch,
            pos,
            symbol: self.symbol(),
        })
    }

    fn parse_parameter_list(&mut self) -> Result<(&'alloc [NodeHandle<TypeNode<'alloc>>], bool)> {
        if self.tokenizer.try_consume_char('X').is_some() {
            return Ok((&[], false));
        }
        let mut params = alloc::new_vec(self.arena);
        let mut is_variadic = false;
        loop {
            if self.tokenizer.try_consume_char('@').is_some() {
                break;
            }
            if self.tokenizer.try_consume_char('Z').is_some() {
                is_variadic = true;
                break;
            }
            if self.tokenizer.is_empty() {
                return Err(Error::UnterminatedParameterList {
                    pos: self.pos(),
                    symbol: self.symbol(),
                });
            }
            params.push(self.parse_type()?);
        }
        Ok((alloc::allocate_slice(self.arena, &params), is_variadic))
    }

    fn parse_function_type(&mut self, storage: Option<StorageClass<'alloc>>) -> Result<TypeNode<'alloc>> {
        let calling_conv = self.parse_calling_convention()?;
        let return_type = if self.tokenizer.try_consume_char('@').is_some() {
            Some(self.cache.intern(TypeNode::Primitive(PrimitiveKind::Void))?)
        } else {
            Some(self.parse_type()?)
        };
        let (params, is_variadic) = self.parse_parameter_list()?;
        Ok(TypeNode::Function(FunctionTypeNode {
            calling_conv,
            return_type,
            params,
            is_variadic,
            saves_registers: false,
            storage,
        }))
    }

    fn parse_function_symbol(&mut self, name: NodeHandle<QualifiedNameNode<'alloc>>, kind_letter: char) -> Result<NodeHandle<SymbolNode<'alloc>>> {
        let pos = self.pos();
        let kind = FunctionKindCode::from_letter(kind_letter).ok_or(Error::InvalidSymbolTypeCode {
            ch: kind_letter,
            pos,
            symbol: self.symbol(),
        })?;
        let has_this_pointer = !matches!(
            kind,
            FunctionKindCode::Global
                | FunctionKindCode::Member {
                    kind: MemberFunctionKind::Static,
                    ..
                }
        );
        let (this_modifiers, this_storage) = if has_this_pointer {
            let modifiers = self.parse_storage_modifiers();
            let storage = self.parse_storage_class()?;
            (modifiers, Some(storage))
        } else {
            (&[][..], None)
        };
        let calling_conv = self.parse_calling_convention()?;
        // <return-type> ::= <type>
        //               ::= @ # structors (they have no declared return type)
        let is_structor = self.tokenizer.try_consume_char('@').is_some();
        let return_type = if is_structor {
            None
        } else {
            Some(self.parse_type()?)
        };
        let (params, is_variadic) = self.parse_parameter_list()?;
        if self.tokenizer.try_consume_char('Z').is_none() {
            return Err(Error::UnterminatedFunction {
                pos: self.pos(),
                symbol: self.symbol(),
            });
        }
        let signature = self.cache.intern(TypeNode::Function(FunctionTypeNode {
            calling_conv,
            return_type,
            params,
            is_variadic,
            saves_registers: false,
            storage: None,
        }))?;
        self.cache.intern(SymbolNode::Function(FunctionSymbolNode {
            name,
            kind,
            this_modifiers,
            this_storage,
            signature,
        }))
    }

    // ---- data symbols -----------------------------------------------------

    fn parse_static_member_variable(
        &mut self,
        name: NodeHandle<QualifiedNameNode<'alloc>>,
        protection: ProtectionLevel,
    ) -> Result<NodeHandle<SymbolNode<'alloc>>> {
        self.parse_variable_symbol(name, VariableKind::StaticMember(protection))
    }

    fn parse_variable_symbol(
        &mut self,
        name: NodeHandle<QualifiedNameNode<'alloc>>,
        kind: VariableKind,
    ) -> Result<NodeHandle<SymbolNode<'alloc>>> {
        let ty = self.parse_type()?;
        let modifiers = self.parse_storage_modifiers();
        let storage = self.parse_storage_class()?;
        self.cache.intern(SymbolNode::Variable(VariableSymbolNode {
            name,
            kind,
            ty,
            modifiers,
            storage,
        }))
    }

    fn parse_special_data(&mut self, name: NodeHandle<QualifiedNameNode<'alloc>>, kind: SpecialDataKind) -> Result<NodeHandle<SymbolNode<'alloc>>> {
        self.cache.intern(SymbolNode::SpecialData(SpecialDataSymbolNode {
            name,
            detail: SpecialDataDetail::Other(kind),
        }))
    }

    fn parse_rtti_host_symbol(&mut self, name: NodeHandle<QualifiedNameNode<'alloc>>) -> Result<NodeHandle<SymbolNode<'alloc>>> {
        self.cache.intern(SymbolNode::SpecialData(SpecialDataSymbolNode {
            name,
            detail: SpecialDataDetail::Special,
        }))
    }

    fn parse_vtable_symbol(&mut self, name: NodeHandle<QualifiedNameNode<'alloc>>) -> Result<NodeHandle<SymbolNode<'alloc>>> {
        // One storage-class-ish character separates the vtable marker from
        // its optional target name; its value doesn't affect the tree.
        let _ = self
            .tokenizer
            .try_consume_any()
            .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
        let for_target = if self.tokenizer.try_consume_char('@').is_some() {
            None
        } else {
            Some(self.parse_qualified_name()?)
        };
        self.cache.intern(SymbolNode::SpecialData(SpecialDataSymbolNode {
            name,
            detail: SpecialDataDetail::Vtable { for_target },
        }))
    }

    // ---- RTTI ---------------------------------------------------------------

    fn parse_rtti_identifier(&mut self) -> Result<NodeHandle<IdentifierNode<'alloc>>> {
        let pos = self.pos();
        let ch = self
            .tokenizer
            .try_consume_any()
            .ok_or_else(|| Error::PrematureEndOfSymbol { symbol: self.symbol() })?;
        let node = match ch {
            '0' => RttiNode::TypeDescriptor(self.parse_type()?),
            '1' => {
                let mdisp = i32::try_from(self.parse_signed()?).map_err(|_| Error::InvalidNumber { pos, symbol: self.symbol() })?;
                let pdisp = i32::try_from(self.parse_signed()?).map_err(|_| Error::InvalidNumber { pos, symbol: self.symbol() })?;
                let vdisp = i32::try_from(self.parse_signed()?).map_err(|_| Error::InvalidNumber { pos, symbol: self.symbol() })?;
                let attributes = u32::try_from(self.parse_unsigned()?).map_err(|_| Error::InvalidNumber { pos, symbol: self.symbol() })?;
                RttiNode::BaseClassDescriptor {
                    mdisp,
                    pdisp,
                    vdisp,
                    attributes,
                }
            }
            '2' => RttiNode::BaseClassArray,
            '3' => RttiNode::ClassHierarchyDescriptor,
            '4' => RttiNode::CompleteObjectLocator,
            _ => {
                return Err(Error::InvalidRttiCode { ch, pos, symbol: self.symbol() });
            }
        };
        self.cache.intern(IdentifierNode::Rtti(node))
    }
}

/// Copies every node reachable from `handle` out of `src` and into `dst`,
/// preserving each node's numeric slot so that handles captured before the
/// copy (including `handle` itself, via [`NodeHandle::recast`]) remain
/// valid afterward.
pub(crate) fn deep_copy_symbol<'src, 'dst>(
    src: &NodeCache<'src>,
    handle: NodeHandle<SymbolNode<'src>>,
    dst: &mut NodeCache<'dst>,
    dst_arena: &'dst Bump,
) -> Result<NodeHandle<SymbolNode<'dst>>> {
    let _ = dst_arena;
    for index in 0..src.len() {
        dst.intern_raw(recast_storage(src.storage_at(index)))?;
    }
    Ok(handle.recast())
}

/// Reinterprets a node at one arena's lifetime as belonging to another.
///
/// SAFETY: `NodeStorage` never owns drop glue (`assert_trivial_drop!`
/// enforces this on every node type it wraps) and every variant has
/// identical layout across `'src`/`'dst` — only the borrow-checker-visible
/// lifetime changes. Callers of [`deep_copy_symbol`] keep the source arena
/// alive for as long as the destination cache is used, so the `&str`/`&[T]`
/// slices embedded in copied nodes remain valid.
fn recast_storage<'src, 'dst>(storage: NodeStorage<'src>) -> NodeStorage<'dst> {
    unsafe { mem::transmute::<NodeStorage<'src>, NodeStorage<'dst>>(storage) }
}
