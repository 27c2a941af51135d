// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The two interned name tables a pattern builds up while parsing: capture
//! group names (and named back-references) and procedure names (and their
//! bodies). Both are small by construction (one entry per named construct
//! in the pattern text), so lookup is a linear scan, exactly as the
//! original's `lookup_group`/`lookup_proc` do.

use crate::ast::Ast;
use crate::error::{Error, Result};

/// A reserved first character for compiler-synthesized procedure names
/// (conditional guards), so it can never collide with a user-written name:
/// user names are scanned up to whitespace or `: = $ ; }` (§4.2), none of
/// which this prefix is.
const ANON_PROC_PREFIX: char = ';';

#[derive(Clone, Debug)]
struct GroupEntry {
    name: String,
    defined: bool,
}

/// The ordered list of capture group names. Index 0 is reserved for the
/// whole match (§3 "Group table").
#[derive(Clone, Debug, Default)]
pub struct GroupTable {
    entries: Vec<GroupEntry>,
}

impl GroupTable {
    pub fn new() -> GroupTable {
        GroupTable {
            entries: vec![GroupEntry { name: String::new(), defined: true }],
        }
    }

    /// Looks up `name`, inserting it if absent. `is_def` is true when this
    /// occurrence is a capturing-group literal (as opposed to a
    /// back-reference), and marks the entry defined.
    pub fn lookup_or_insert(&mut self, name: &str, is_def: bool) -> usize {
        for (i, e) in self.entries.iter_mut().enumerate() {
            if e.name == name {
                e.defined |= is_def;
                return i;
            }
        }
        self.entries.push(GroupEntry { name: name.to_string(), defined: is_def });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Every group referenced but never literally captured is a compile
    /// error (§4.3: "After `parse_full`, the tables are swept").
    pub fn check_all_defined(&self) -> Result<()> {
        if self.entries.iter().any(|e| !e.defined) {
            Err(Error::Undefined)
        } else {
            Ok(())
        }
    }
}

struct ProcEntry<'a> {
    name: String,
    body: Option<&'a Ast<'a>>,
}

/// The ordered list of named procedures (§3 "Procedure table").
#[derive(Default)]
pub struct ProcTable<'a> {
    entries: Vec<ProcEntry<'a>>,
}

impl<'a> ProcTable<'a> {
    pub fn new() -> ProcTable<'a> {
        ProcTable { entries: Vec::new() }
    }

    /// Looks up `name`, inserting a call-only placeholder if absent.
    pub fn lookup_or_insert(&mut self, name: &str) -> usize {
        if let Some(i) = self.entries.iter().position(|e| e.name == name) {
            return i;
        }
        self.entries.push(ProcEntry { name: name.to_string(), body: None });
        self.entries.len() - 1
    }

    /// Registers `body` as the definition of `name`. Fails if `name`
    /// already has a body (§7 `Redefined`).
    pub fn define(&mut self, name: &str, body: &'a Ast<'a>) -> Result<usize> {
        if let Some(i) = self.entries.iter().position(|e| e.name == name) {
            if self.entries[i].body.is_some() {
                return Err(Error::Redefined);
            }
            self.entries[i].body = Some(body);
            return Ok(i);
        }
        self.entries.push(ProcEntry { name: name.to_string(), body: Some(body) });
        Ok(self.entries.len() - 1)
    }

    /// Allocates an anonymous procedure (a conditional's guard) with `body`,
    /// returning its index. Anonymous names can never collide with a
    /// user-referenced name, so this never conflicts with `define`.
    pub fn define_anonymous(&mut self, body: &'a Ast<'a>) -> usize {
        let name = format!("{}{}", ANON_PROC_PREFIX, self.entries.len());
        self.entries.push(ProcEntry { name, body: Some(body) });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn body(&self, idx: usize) -> &'a Ast<'a> {
        self.entries[idx].body.expect("checked by check_all_defined")
    }

    /// A procedure that is only ever called (never `(?/name:...)`-defined)
    /// is a compile error (§7 `Undefined`).
    pub fn check_all_defined(&self) -> Result<()> {
        if self.entries.iter().any(|e| e.body.is_none()) {
            Err(Error::Undefined)
        } else {
            Ok(())
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a Ast<'a>)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, e.body.expect("checked by check_all_defined")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_zero_is_predefined() {
        let t = GroupTable::new();
        assert_eq!(t.len(), 1);
        assert!(t.check_all_defined().is_ok());
    }

    #[test]
    fn reference_without_definition_is_undefined() {
        let mut t = GroupTable::new();
        t.lookup_or_insert("x", false);
        assert!(t.check_all_defined().is_err());
    }

    #[test]
    fn definition_satisfies_prior_reference() {
        let mut t = GroupTable::new();
        let i = t.lookup_or_insert("x", false);
        t.lookup_or_insert("x", true);
        assert!(t.check_all_defined().is_ok());
        assert_eq!(t.names()[i], "x");
    }

    #[test]
    fn procedure_redefined_is_an_error() {
        let arena = crate::ast::AstArena::with_capacity(1);
        let dummy = arena.alloc(Ast::Any);
        let mut t = ProcTable::new();
        t.define("p", dummy).unwrap();
        assert!(t.define("p", dummy).is_err());
    }

    #[test]
    fn procedure_called_never_defined_is_undefined() {
        let mut t = ProcTable::new();
        t.lookup_or_insert("p");
        assert!(t.check_all_defined().is_err());
    }
}
