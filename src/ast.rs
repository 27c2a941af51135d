// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The parse tree (§3 "AST node") and its arena.
//!
//! Nodes are allocated out of a single `typed_arena::Arena`, sized ahead of
//! time to roughly the pattern's length, and live only for the duration of
//! one compile — the same discipline the original's `tk->nodes` buffer
//! follows, just with the bookkeeping (and the overflow check) handled by
//! the arena crate instead of a manual index into a `malloc`'d block.

use typed_arena::Arena;

use crate::cursor::Scalar;
use crate::unicode::CharSet;

/// A node in the pattern's parse tree. Borrowed children give this the same
/// "tree of pointers" shape as the original `rgx_tree`, but with Rust's
/// lifetime discipline guaranteeing every child outlives its parent.
pub enum Ast<'a> {
    /// The epsilon node: matches trivially, consumes nothing, compiles to
    /// no instructions. Fills in for a subtree the parser left absent (an
    /// empty group body, a missing alternation branch, a bare `()`).
    Empty,
    Char(Scalar),
    Set(CharSet),
    Any,
    None,
    Bol,
    NBol,
    Eol,
    NEol,
    Bot,
    NBot,
    Eot,
    NEot,
    Wbnd,
    NWbnd,
    LookA(&'a Ast<'a>),
    NLookA(&'a Ast<'a>),
    LookB(&'a Ast<'a>),
    NLookB(&'a Ast<'a>),
    Alt(&'a Ast<'a>, &'a Ast<'a>),
    Cat(&'a Ast<'a>, &'a Ast<'a>),
    /// Capturing group: `(group index, body)`.
    Group(usize, &'a Ast<'a>),
    Quest(&'a Ast<'a>, bool),
    Plus(&'a Ast<'a>, bool),
    Star(&'a Ast<'a>, bool),
    /// `{min,max}`, greedy. `max == 0` with `min > 0` means unbounded.
    Repeat(&'a Ast<'a>, u32, u32, bool),
    BRef(usize),
    NBRef(usize),
    QRef(usize),
    NQRef(usize),
    Proc(usize),
    NProc(usize),
    /// `(guard procedure index, then-branch, else-branch)`, already split
    /// apart by the parser so the compiler never has to re-discover which
    /// side is which.
    Cond(usize, &'a Ast<'a>, &'a Ast<'a>),
}

/// Owns the arena that every `Ast` node in one compile is allocated from.
pub struct AstArena<'a> {
    arena: Arena<Ast<'a>>,
}

impl<'a> AstArena<'a> {
    /// `pattern_len` is used only to pre-size the arena's first chunk; the
    /// arena still grows past that if a pathological pattern needs more
    /// nodes (the hard ceiling is enforced later by the instruction-count
    /// pass in the compiler, per §6's `TooLong`).
    pub fn with_capacity(pattern_len: usize) -> AstArena<'a> {
        AstArena { arena: Arena::with_capacity(pattern_len * 2 + 4) }
    }

    pub fn alloc(&'a self, node: Ast<'a>) -> &'a Ast<'a> {
        self.arena.alloc(node)
    }
}
