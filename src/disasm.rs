// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Pretty-prints a compiled program for diagnostics (§4.7). Not on the hot
//! path: this walks the instruction array purely for human consumption,
//! the way a `{:?}`-derived dump would, but with each opcode's operand
//! rendered in a form that's actually readable (a set's pattern rather
//! than its raw ranges, a jump's target index rather than an opaque
//! pointer).

use std::fmt::Write as _;

use crate::inst::Inst;
use crate::program::Program;

/// Renders every instruction in `prog` as `<index>: <mnemonic> <operand>`,
/// one per line, followed by the capture group names in declaration order.
pub fn disassemble(prog: &Program) -> String {
    let mut out = String::new();
    for (pc, inst) in prog.insts().iter() {
        let _ = write!(out, "{:>6}: ", pc);
        match inst {
            Inst::Char(c) => {
                let _ = writeln!(out, "char {:?}", char::from_u32(*c as u32).unwrap_or('\u{FFFD}'));
            }
            Inst::Set(set) => {
                let _ = writeln!(out, "set {}", set.describe());
            }
            Inst::Any => {
                let _ = writeln!(out, "any");
            }
            Inst::None => {
                let _ = writeln!(out, "none");
            }
            Inst::Bot => {
                let _ = writeln!(out, "bot");
            }
            Inst::NBot => {
                let _ = writeln!(out, "nbot");
            }
            Inst::Bol => {
                let _ = writeln!(out, "bol");
            }
            Inst::NBol => {
                let _ = writeln!(out, "nbol");
            }
            Inst::Eol => {
                let _ = writeln!(out, "eol");
            }
            Inst::NEol => {
                let _ = writeln!(out, "neol");
            }
            Inst::Eot => {
                let _ = writeln!(out, "eot");
            }
            Inst::NEot => {
                let _ = writeln!(out, "neot");
            }
            Inst::Wbnd => {
                let _ = writeln!(out, "wbnd");
            }
            Inst::NWbnd => {
                let _ = writeln!(out, "nwbnd");
            }
            Inst::Look(to) => {
                let _ = writeln!(out, "look -> {}", to);
            }
            Inst::NLook(to) => {
                let _ = writeln!(out, "nlook -> {}", to);
            }
            Inst::LookR(to) => {
                let _ = writeln!(out, "lookr -> {}", to);
            }
            Inst::NLookR(to) => {
                let _ = writeln!(out, "nlookr -> {}", to);
            }
            Inst::BRef(group) => {
                let _ = writeln!(out, "bref {}", group);
            }
            Inst::NBRef(group) => {
                let _ = writeln!(out, "nbref {}", group);
            }
            Inst::QRef(group) => {
                let _ = writeln!(out, "qref {}", group);
            }
            Inst::NQRef(group) => {
                let _ = writeln!(out, "nqref {}", group);
            }
            Inst::Proc { index, reversed } => {
                let _ = writeln!(out, "proc {} ({})", index, if *reversed { "reverse" } else { "forward" });
            }
            Inst::NProc { index, reversed } => {
                let _ = writeln!(out, "nproc {} ({})", index, if *reversed { "reverse" } else { "forward" });
            }
            Inst::Cond { guard, then, els } => {
                let _ = writeln!(out, "cond {} ? {} : {}", guard, then, els);
            }
            Inst::Jump(to) => {
                let _ = writeln!(out, "jump -> {}", to);
            }
            Inst::SplitLo { prim, alt } => {
                let _ = writeln!(out, "splitlo {} | {}", prim, alt);
            }
            Inst::SplitHi { prim, alt } => {
                let _ = writeln!(out, "splithi {} | {}", prim, alt);
            }
            Inst::Save(slot) => {
                let _ = writeln!(out, "save {}", slot);
            }
            Inst::Match => {
                let _ = writeln!(out, "match");
            }
        }
    }
    for (i, name) in prog.group_names().iter().enumerate() {
        let _ = writeln!(out, "group {}: {:?}", i, name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::to_utf16;
    use crate::program::compile;

    #[test]
    fn dump_contains_match_and_group_names() {
        let prog = compile(&to_utf16("(?word:a+)")).unwrap();
        let text = disassemble(&prog);
        assert!(text.contains("match"));
        assert!(text.contains("group 1: \"word\""));
    }
}
