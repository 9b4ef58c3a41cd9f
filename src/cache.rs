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

//! The arena that owns every AST node.
//!
//! Nodes are interned once, fully built, and never mutated afterward — the
//! parser never needs a `resolve_mut`. A [`NodeHandle<T>`] is a `Copy`
//! index into the arena tagged with the node's shape at the type level, so
//! back-reference tables can hold handles by value and the final [`Symbol`]
//! can be cheaply duplicated during a deep copy.

use crate::{
    nodes::{
        IdentifierNode,
        QualifiedNameNode,
        SymbolNode,
        TemplateArgNode,
        TypeNode,
    },
    Error,
    Result,
};
use bumpalo::{
    collections::Vec as BumpVec,
    Bump,
};
use nonmax::NonMaxUsize;
use std::marker::PhantomData;

/// Arena bound: mirrors the ten-entry cap on the parser's own back-reference
/// tables, scaled up for the much larger total node count a deep symbol can
/// reach. Not spec-mandated; kept as defense-in-depth against a pathological
/// input forcing unbounded growth, matching the teacher's own practice of
/// bounding arena size.
const MAX_NODES: usize = 1 << 14;

#[derive(Clone, Copy)]
pub(crate) enum NodeStorage<'alloc> {
    Identifier(IdentifierNode<'alloc>),
    QualifiedName(QualifiedNameNode<'alloc>),
    Type(TypeNode<'alloc>),
    TemplateArg(TemplateArgNode<'alloc>),
    Symbol(SymbolNode<'alloc>),
}

macro_rules! impl_from_storage {
    ($variant:ident, $ty:ident) => {
        impl<'alloc> From<$ty<'alloc>> for NodeStorage<'alloc> {
            fn from(node: $ty<'alloc>) -> Self {
                NodeStorage::$variant(node)
            }
        }

        impl<'alloc> AsRef<$ty<'alloc>> for NodeStorage<'alloc> {
            fn as_ref(&self) -> &$ty<'alloc> {
                match self {
                    NodeStorage::$variant(node) => node,
                    _ => unreachable!("NodeHandle<{}> pointed at the wrong storage shape", stringify!($ty)),
                }
            }
        }
    };
}

impl_from_storage!(Identifier, IdentifierNode);
impl_from_storage!(QualifiedName, QualifiedNameNode);
impl_from_storage!(Type, TypeNode);
impl_from_storage!(TemplateArg, TemplateArgNode);
impl_from_storage!(Symbol, SymbolNode);

/// A `Copy` index into a [`NodeCache`], tagged with the shape of node it
/// points at. Resolving a handle is a simple vector index plus an
/// infallible downcast — the shape is guaranteed by construction, since
/// nothing ever hands out a handle of the wrong type.
pub(crate) struct NodeHandle<T> {
    id: NonMaxUsize,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for NodeHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeHandle<T> {}

impl<T> NodeHandle<T> {
    pub(crate) fn resolve<'alloc, 'cache>(
        self,
        cache: &'cache NodeCache<'alloc>,
    ) -> &'cache T
    where
        NodeStorage<'alloc>: AsRef<T>,
    {
        cache.storage[self.id.get()].as_ref()
    }

    /// Reinterprets this handle as pointing into a differently-shaped or
    /// differently-arena'd cache at the *same* numeric slot. Sound only when
    /// the caller has independently established that the target cache holds
    /// an equivalent node at that slot — used by back-reference resolution
    /// (copying within one cache) and by [`crate::demangler::deep_copy_symbol`]
    /// (a position-preserving bulk copy across two caches/arenas).
    pub(crate) fn recast<U>(self) -> NodeHandle<U> {
        NodeHandle {
            id: self.id,
            marker: PhantomData,
        }
    }
}

pub(crate) struct NodeCache<'alloc> {
    storage: BumpVec<'alloc, NodeStorage<'alloc>>,
}

impl<'alloc> NodeCache<'alloc> {
    pub(crate) fn new(allocator: &'alloc Bump) -> Self {
        Self {
            storage: BumpVec::new_in(allocator),
        }
    }

    pub(crate) fn intern<T>(&mut self, node: T) -> Result<NodeHandle<T>>
    where
        NodeStorage<'alloc>: From<T>,
    {
        if self.storage.len() >= MAX_NODES {
            return Err(Error::MaliciousInput);
        }
        self.storage.push(NodeStorage::from(node));
        let id = self.storage.len() - 1;
        Ok(NodeHandle {
            // SAFETY: `id` is a `Vec` length minus one, far below `usize::MAX`.
            id: unsafe { NonMaxUsize::new_unchecked(id) },
            marker: PhantomData,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.storage.len()
    }

    /// Appends a pre-built node without requiring the caller to name its
    /// concrete type; used by the bulk position-preserving copy in
    /// [`crate::demangler::deep_copy_symbol`], which walks a source cache's
    /// untyped storage directly rather than resolving typed handles.
    pub(crate) fn intern_raw(&mut self, node: NodeStorage<'alloc>) -> Result<()> {
        if self.storage.len() >= MAX_NODES {
            return Err(Error::MaliciousInput);
        }
        self.storage.push(node);
        Ok(())
    }

    #[must_use]
    pub(crate) fn storage_at(&self, index: usize) -> NodeStorage<'alloc> {
        self.storage[index]
    }
}
