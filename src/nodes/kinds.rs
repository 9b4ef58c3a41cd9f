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

//! The small, closed enumerations that the parser reads straight off a
//! single mangled-string code and the printer reads straight back off.

use bitflags::bitflags;

/// `'A'`..`'V'` member protection/linkage, plus the two global letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionLevel {
    Private,
    Protected,
    Public,
}

impl ProtectionLevel {
    #[must_use]
    pub(crate) fn spelling(self) -> &'static str {
        match self {
            ProtectionLevel::Private => "private",
            ProtectionLevel::Protected => "protected",
            ProtectionLevel::Public => "public",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberFunctionKind {
    /// Ordinary instance method.
    Instance,
    Static,
    Virtual,
}

/// What the single uppercase function kind-code letter (spec §4.3.4)
/// selects: a member function's protection/static/virtual triple, or a
/// non-member (global) function. `None` marks one of the letters spec
/// §4.3.4 calls out as explicitly invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKindCode {
    Member {
        protection: ProtectionLevel,
        kind: MemberFunctionKind,
    },
    Global,
}

impl FunctionKindCode {
    #[must_use]
    pub(crate) fn from_letter(ch: char) -> Option<Self> {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        if ch == 'Y' || ch == 'Z' {
            return Some(FunctionKindCode::Global);
        }
        let offset = ch as u8 - b'A';
        if offset > 23 {
            return None;
        }
        let group = offset / 8; // 0=private, 1=protected, 2=public
        let pair = offset % 8;
        let protection = match group {
            0 => ProtectionLevel::Private,
            1 => ProtectionLevel::Protected,
            _ => ProtectionLevel::Public,
        };
        let kind = match pair / 2 {
            0 => MemberFunctionKind::Instance,
            1 => MemberFunctionKind::Static,
            2 => MemberFunctionKind::Virtual,
            _ => return None, // thunk adjustor letters: not modelled, rejected
        };
        Some(FunctionKindCode::Member { protection, kind })
    }
}

/// One uppercase letter selects the calling convention; each letter pairs
/// with a neighbour that only differs by a save-registers bit the parser
/// reads and discards (spec §4.3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConv {
    Cdecl,
    Pascal,
    Thiscall,
    Stdcall,
    Fastcall,
    Clrcall,
    Eabi,
}

impl CallingConv {
    /// `'A'`..`'P'` map in pairs onto the eight conventions spec §4.3.4
    /// names, in that order; the low bit of each pair is the
    /// save-registers flag, read and discarded.
    #[must_use]
    pub(crate) fn from_letter(ch: char) -> Option<Self> {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let index = (ch as u8 - b'A') / 2;
        Some(match index {
            0 => CallingConv::Cdecl,
            1 => CallingConv::Pascal,
            2 => CallingConv::Thiscall,
            3 => CallingConv::Stdcall,
            4 => CallingConv::Fastcall,
            5 => return None, // interrupt: reserved, no caller-visible spelling
            6 => CallingConv::Clrcall,
            7 => CallingConv::Eabi,
            _ => return None,
        })
    }

    #[must_use]
    pub(crate) fn spelling(self) -> &'static str {
        match self {
            CallingConv::Cdecl => "__cdecl",
            CallingConv::Pascal => "__pascal",
            CallingConv::Thiscall => "__thiscall",
            CallingConv::Stdcall => "__stdcall",
            CallingConv::Fastcall => "__fastcall",
            CallingConv::Clrcall => "__clrcall",
            CallingConv::Eabi => "__eabi",
        }
    }
}

/// Primitive type table (spec §4.3.5), including the `_`-extended forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Char8,
    Char16,
    Char32,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Int8,
    UnsignedInt8,
    Int16,
    UnsignedInt16,
    Int32,
    UnsignedInt32,
    Int128,
    UnsignedInt128,
    WCharT,
    Float,
    Double,
    LongDouble,
}

impl PrimitiveKind {
    #[must_use]
    pub(crate) fn spelling(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::SignedChar => "signed char",
            PrimitiveKind::UnsignedChar => "unsigned char",
            PrimitiveKind::Char8 => "char8_t",
            PrimitiveKind::Char16 => "char16_t",
            PrimitiveKind::Char32 => "char32_t",
            PrimitiveKind::Short => "short",
            PrimitiveKind::UnsignedShort => "unsigned short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::UnsignedInt => "unsigned int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::UnsignedLong => "unsigned long",
            PrimitiveKind::LongLong => "__int64",
            PrimitiveKind::UnsignedLongLong => "unsigned __int64",
            PrimitiveKind::Int8 => "__int8",
            PrimitiveKind::UnsignedInt8 => "unsigned __int8",
            PrimitiveKind::Int16 => "__int16",
            PrimitiveKind::UnsignedInt16 => "unsigned __int16",
            PrimitiveKind::Int32 => "__int32",
            PrimitiveKind::UnsignedInt32 => "unsigned __int32",
            PrimitiveKind::Int128 => "__int128",
            PrimitiveKind::UnsignedInt128 => "unsigned __int128",
            PrimitiveKind::WCharT => "wchar_t",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::LongDouble => "long double",
        }
    }

    /// Used by the `'W'` enum production (spec §4.3.5): one digit selects
    /// the enum's underlying integer type from a seven-entry sub-table.
    #[must_use]
    pub(crate) fn from_enum_base_digit(digit: u8) -> Option<Self> {
        Some(match digit {
            0 => PrimitiveKind::Char,
            1 => PrimitiveKind::UnsignedChar,
            2 => PrimitiveKind::Short,
            3 => PrimitiveKind::UnsignedShort,
            4 => PrimitiveKind::Int,
            5 => PrimitiveKind::UnsignedInt,
            6 => PrimitiveKind::Long,
            7 => PrimitiveKind::UnsignedLong,
            _ => return None,
        })
    }

    /// The ordinary, single-letter primitive table (spec §4.3.5's final
    /// "other uppercase" dispatch arm).
    #[must_use]
    pub(crate) fn from_primitive_letter(ch: char) -> Option<Self> {
        Some(match ch {
            'C' => PrimitiveKind::SignedChar,
            'D' => PrimitiveKind::Char,
            'E' => PrimitiveKind::UnsignedChar,
            'F' => PrimitiveKind::Short,
            'G' => PrimitiveKind::UnsignedShort,
            'H' => PrimitiveKind::Int,
            'I' => PrimitiveKind::UnsignedInt,
            'J' => PrimitiveKind::Long,
            'K' => PrimitiveKind::UnsignedLong,
            'M' => PrimitiveKind::Float,
            'N' => PrimitiveKind::Double,
            'O' => PrimitiveKind::LongDouble,
            'X' => PrimitiveKind::Void,
            'W' => PrimitiveKind::WCharT,
            _ => return None,
        })
    }

    /// The `'_'`-extended primitive table (spec §4.3.5's `_` dispatch arm).
    #[must_use]
    pub(crate) fn from_extended_letter(ch: char) -> Option<Self> {
        Some(match ch {
            'D' => PrimitiveKind::Int8,
            'E' => PrimitiveKind::UnsignedInt8,
            'F' => PrimitiveKind::Int16,
            'G' => PrimitiveKind::UnsignedInt16,
            'H' => PrimitiveKind::Int32,
            'I' => PrimitiveKind::UnsignedInt32,
            'J' => PrimitiveKind::LongLong,
            'K' => PrimitiveKind::UnsignedLongLong,
            'L' => PrimitiveKind::Int128,
            'M' => PrimitiveKind::UnsignedInt128,
            'N' => PrimitiveKind::Bool,
            'S' => PrimitiveKind::Char16,
            'U' => PrimitiveKind::Char32,
            'W' => PrimitiveKind::WCharT,
            'Q' => PrimitiveKind::Char8,
            _ => return None,
        })
    }
}

/// `'T'`/`'U'`/`'V'`/`'W'` compound-type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Union,
    Struct,
    Class,
    Enum,
}

impl TagKind {
    #[must_use]
    pub(crate) fn spelling(self) -> &'static str {
        match self {
            TagKind::Union => "union",
            TagKind::Struct => "struct",
            TagKind::Class => "class",
            TagKind::Enum => "enum",
        }
    }
}

/// Operator codes reachable through the `?`-prefixed function-identifier
/// production (spec §4.3.3's "Operator" name variant); `Cast` is modelled
/// separately because it borrows its spelling from the enclosing function's
/// return type rather than owning one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    New,
    Delete,
    ArrayNew,
    ArrayDelete,
    Assign,
    RightShift,
    LeftShift,
    LogicalNot,
    Equals,
    NotEquals,
    ArraySubscript,
    Pointer,
    Dereference,
    Increment,
    Decrement,
    Minus,
    Plus,
    BitwiseAnd,
    MemberPointer,
    Divide,
    Modulus,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Comma,
    Parens,
    BitwiseNot,
    BitwiseXor,
    BitwiseOr,
    LogicalAnd,
    LogicalOr,
    TimesEqual,
    PlusEqual,
    MinusEqual,
    DivEqual,
    ModEqual,
    RshEqual,
    LshEqual,
    BitwiseAndEqual,
    BitwiseOrEqual,
    BitwiseXorEqual,
    CoAwait,
    Spaceship,
}

impl OperatorKind {
    #[must_use]
    pub(crate) fn spelling(self) -> &'static str {
        match self {
            OperatorKind::New => "operator new",
            OperatorKind::Delete => "operator delete",
            OperatorKind::ArrayNew => "operator new[]",
            OperatorKind::ArrayDelete => "operator delete[]",
            OperatorKind::Assign => "operator=",
            OperatorKind::RightShift => "operator>>",
            OperatorKind::LeftShift => "operator<<",
            OperatorKind::LogicalNot => "operator!",
            OperatorKind::Equals => "operator==",
            OperatorKind::NotEquals => "operator!=",
            OperatorKind::ArraySubscript => "operator[]",
            OperatorKind::Pointer => "operator->",
            OperatorKind::Dereference => "operator*",
            OperatorKind::Increment => "operator++",
            OperatorKind::Decrement => "operator--",
            OperatorKind::Minus => "operator-",
            OperatorKind::Plus => "operator+",
            OperatorKind::BitwiseAnd => "operator&",
            OperatorKind::MemberPointer => "operator->*",
            OperatorKind::Divide => "operator/",
            OperatorKind::Modulus => "operator%",
            OperatorKind::LessThan => "operator<",
            OperatorKind::LessThanEqual => "operator<=",
            OperatorKind::GreaterThan => "operator>",
            OperatorKind::GreaterThanEqual => "operator>=",
            OperatorKind::Comma => "operator,",
            OperatorKind::Parens => "operator()",
            OperatorKind::BitwiseNot => "operator~",
            OperatorKind::BitwiseXor => "operator^",
            OperatorKind::BitwiseOr => "operator|",
            OperatorKind::LogicalAnd => "operator&&",
            OperatorKind::LogicalOr => "operator||",
            OperatorKind::TimesEqual => "operator*=",
            OperatorKind::PlusEqual => "operator+=",
            OperatorKind::MinusEqual => "operator-=",
            OperatorKind::DivEqual => "operator/=",
            OperatorKind::ModEqual => "operator%=",
            OperatorKind::RshEqual => "operator>>=",
            OperatorKind::LshEqual => "operator<<=",
            OperatorKind::BitwiseAndEqual => "operator&=",
            OperatorKind::BitwiseOrEqual => "operator|=",
            OperatorKind::BitwiseXorEqual => "operator^=",
            OperatorKind::CoAwait => "operator co_await",
            OperatorKind::Spaceship => "operator<=>",
        }
    }

    /// The primary single-letter operator table read straight off the
    /// character following `'?'` (spec §4.3.3/§9: `'U'`/`'V'` are the two
    /// letters the source implementation leaves unimplemented — new[] and
    /// delete[] — so they are reserved here and rejected by the caller
    /// rather than mapped to [`OperatorKind::ArrayNew`]/[`ArrayDelete`].
    /// `'B'` is likewise absent: the parser checks for the conversion
    /// (cast) operator at that letter before ever consulting this table,
    /// since `Cast` borrows its spelling from the enclosing return type
    /// and so isn't a member of this enum at all (spec §3).
    #[must_use]
    pub(crate) fn from_letter(ch: char) -> Option<Self> {
        Some(match ch {
            '2' => OperatorKind::New,
            '3' => OperatorKind::Delete,
            '4' => OperatorKind::Assign,
            '5' => OperatorKind::RightShift,
            '6' => OperatorKind::LeftShift,
            '7' => OperatorKind::LogicalNot,
            '8' => OperatorKind::Equals,
            '9' => OperatorKind::NotEquals,
            'A' => OperatorKind::ArraySubscript,
            'C' => OperatorKind::Dereference,
            'D' => OperatorKind::Increment,
            'E' => OperatorKind::Decrement,
            'F' => OperatorKind::Minus,
            'G' => OperatorKind::Plus,
            'H' => OperatorKind::BitwiseAnd,
            'I' => OperatorKind::MemberPointer,
            'J' => OperatorKind::Divide,
            'K' => OperatorKind::Modulus,
            'L' => OperatorKind::LessThan,
            'M' => OperatorKind::LessThanEqual,
            'N' => OperatorKind::GreaterThan,
            'O' => OperatorKind::GreaterThanEqual,
            'P' => OperatorKind::Comma,
            'Q' => OperatorKind::Parens,
            'R' => OperatorKind::BitwiseNot,
            'S' => OperatorKind::BitwiseXor,
            'T' => OperatorKind::BitwiseOr,
            'W' => OperatorKind::LogicalAnd,
            'X' => OperatorKind::LogicalOr,
            'Y' => OperatorKind::TimesEqual,
            'Z' => OperatorKind::PlusEqual,
            _ => return None,
        })
    }

    /// `'_'`-extended operator letters for the rarer compound-assignment
    /// and C++20 operators that don't fit the primary table (spec §4.3.3
    /// names the catalogue but not a letter assignment for every member;
    /// this crate's own consistent extension, analogous to the `_`-prefix
    /// convention spec §4.3.5/§4.3.6 already use for extended tables).
    #[must_use]
    pub(crate) fn from_extended_letter(ch: char) -> Option<Self> {
        Some(match ch {
            '0' => OperatorKind::MinusEqual,
            '1' => OperatorKind::DivEqual,
            '2' => OperatorKind::ModEqual,
            '3' => OperatorKind::RshEqual,
            '4' => OperatorKind::LshEqual,
            '5' => OperatorKind::BitwiseAndEqual,
            '6' => OperatorKind::BitwiseOrEqual,
            '7' => OperatorKind::BitwiseXorEqual,
            'V' => OperatorKind::CoAwait,
            'W' => OperatorKind::Spaceship,
            _ => return None,
        })
    }
}

/// The fixed catalogue of compiler-generated "special" names (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialName {
    VftableFor,
    Vcall,
    LocalStaticGuard,
    StringLiteral,
    DynamicInitializer,
    DynamicAtexitDestructor,
    VbaseDestructor,
    VecDelDtor,
    ScalarDelDtor,
    DefaultCtorClosure,
    VecCtorIter,
    VecDtorIter,
    VecVbaseCtorIter,
    VdispMap,
    EhVecCtorIter,
    EhVecDtorIter,
    EhVecVbaseCtorIter,
    CopyCtorClosure,
    LocalVftableCtorClosure,
    UdtReturning,
    ManVectorCtorIter,
    ManVectorDtorIter,
    EhVectorCopyCtorIter,
    EhVectorVbaseCopyCtorIter,
    VectorCopyCtorIter,
    VectorVbaseCopyCtorIter,
    ManVectorVbaseCopyCtorIter,
}

impl SpecialName {
    #[must_use]
    pub(crate) fn spelling(self) -> &'static str {
        match self {
            SpecialName::VftableFor => "`vftable'",
            SpecialName::Vcall => "`vcall'",
            SpecialName::LocalStaticGuard => "`local static guard'",
            SpecialName::StringLiteral => "`string'",
            SpecialName::DynamicInitializer => "`dynamic initializer'",
            SpecialName::DynamicAtexitDestructor => "`dynamic atexit destructor'",
            SpecialName::VbaseDestructor => "`vbase destructor'",
            SpecialName::VecDelDtor => "`vector deleting destructor'",
            SpecialName::ScalarDelDtor => "`scalar deleting destructor'",
            SpecialName::DefaultCtorClosure => "`default constructor closure'",
            SpecialName::VecCtorIter => "`vector constructor iterator'",
            SpecialName::VecDtorIter => "`vector destructor iterator'",
            SpecialName::VecVbaseCtorIter => "`vector vbase constructor iterator'",
            SpecialName::VdispMap => "`virtual displacement map'",
            SpecialName::EhVecCtorIter => "`eh vector constructor iterator'",
            SpecialName::EhVecDtorIter => "`eh vector destructor iterator'",
            SpecialName::EhVecVbaseCtorIter => "`eh vector vbase constructor iterator'",
            SpecialName::CopyCtorClosure => "`copy constructor closure'",
            SpecialName::LocalVftableCtorClosure => "`local vftable constructor closure'",
            SpecialName::UdtReturning => "`udt returning'",
            SpecialName::ManVectorCtorIter => "`managed vector constructor iterator'",
            SpecialName::ManVectorDtorIter => "`managed vector destructor iterator'",
            SpecialName::EhVectorCopyCtorIter => "`eh vector copy constructor iterator'",
            SpecialName::EhVectorVbaseCopyCtorIter => "`eh vector vbase copy constructor iterator'",
            SpecialName::VectorCopyCtorIter => "`vector copy constructor iterator'",
            SpecialName::VectorVbaseCopyCtorIter => "`vector vbase copy constructor iterator'",
            SpecialName::ManVectorVbaseCopyCtorIter => "`managed vector vbase copy constructor iterator'",
        }
    }

    /// Letter following `'?' '_'` (spec §3's "fixed enumerated catalogue").
    /// `'R'` is deliberately absent from this table: it instead routes to
    /// the RTTI sub-dispatch (spec §4.3.10), which lives in its own
    /// `RttiKind` rather than sharing this enum.
    #[must_use]
    pub(crate) fn from_letter(ch: char) -> Option<Self> {
        Some(match ch {
            '0' => SpecialName::VftableFor,
            '1' => SpecialName::Vcall,
            '2' => SpecialName::LocalStaticGuard,
            '3' => SpecialName::StringLiteral,
            '4' => SpecialName::DynamicInitializer,
            '5' => SpecialName::DynamicAtexitDestructor,
            '6' => SpecialName::VbaseDestructor,
            '7' => SpecialName::VecDelDtor,
            '8' => SpecialName::ScalarDelDtor,
            '9' => SpecialName::DefaultCtorClosure,
            'A' => SpecialName::VecCtorIter,
            'B' => SpecialName::VecDtorIter,
            'C' => SpecialName::VecVbaseCtorIter,
            'D' => SpecialName::VdispMap,
            'E' => SpecialName::EhVecCtorIter,
            'F' => SpecialName::EhVecDtorIter,
            'G' => SpecialName::EhVecVbaseCtorIter,
            'H' => SpecialName::CopyCtorClosure,
            'I' => SpecialName::LocalVftableCtorClosure,
            'J' => SpecialName::UdtReturning,
            'K' => SpecialName::ManVectorCtorIter,
            'L' => SpecialName::ManVectorDtorIter,
            'M' => SpecialName::EhVectorCopyCtorIter,
            'N' => SpecialName::EhVectorVbaseCopyCtorIter,
            'O' => SpecialName::VectorCopyCtorIter,
            'P' => SpecialName::VectorVbaseCopyCtorIter,
            'Q' => SpecialName::ManVectorVbaseCopyCtorIter,
            _ => return None,
        })
    }
}

/// Storage modifiers read as a greedy sequence (spec §4.3.6). `Unaligned`
/// prints before the indirection operator, the rest after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageModifierKind {
    Ptr64,
    Unaligned,
    Restrict,
}

bitflags! {
    /// cv-qualification and pointer-kind bits (spec §3/§4.3.6).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StorageClassFlags: u8 {
        const CONST    = 1 << 0;
        const VOLATILE = 1 << 1;
        const BASED    = 1 << 2;
        const MEMBER   = 1 << 3;
        const FUNCTION = 1 << 4;
    }
}

/// `'0'`..`'4'` RTTI sub-codes following `_R` (spec §4.3.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RttiKind {
    TypeDescriptor,
    BaseClassDescriptor,
    BaseClassArray,
    ClassHierarchyDescriptor,
    CompleteObjectLocator,
}

/// Structured "curly" composite template-argument sub-codes (spec §4.3.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurlyKind {
    Gptmd,
    Mptmf,
    Vptmf,
    Gptmf,
    Vptmd,
}

impl CurlyKind {
    /// How many children (symbols and/or integers) this sub-code carries.
    #[must_use]
    pub(crate) fn arity(self) -> usize {
        match self {
            CurlyKind::Gptmd => 3,
            CurlyKind::Mptmf => 4,
            CurlyKind::Vptmf => 5,
            CurlyKind::Gptmf => 4,
            CurlyKind::Vptmd => 4,
        }
    }
}
