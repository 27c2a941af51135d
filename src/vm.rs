// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Thompson simultaneous-thread executor (§4.6, §9). Structured after
//! `defuz-regex`'s own `nfa.rs`: a "current" and "next" thread list, an
//! `add` step that follows every epsilon transition eagerly and dedups by
//! program counter, and a `step` that advances the survivors past one input
//! scalar. The two places this departs from that shape are both forced by
//! this language's extra constructs:
//!
//! * Captures are an `Rc<Vec<Option<usize>>>` cloned copy-on-write rather
//!   than a single mutable buffer threaded through with manual save/restore
//!   -- recursive procedure calls and lookaround make the "undo on
//!   backtrack" discipline `nfa.rs` uses awkward to reproduce once a thread
//!   can recurse into an entirely separate sub-run of this same executor.
//! * Back-references, quote-equal references, and procedure calls can each
//!   consume more than one scalar in a single logical step, so a thread that
//!   takes one of these can't be resolved at add-time the way a zero-width
//!   assertion is. It's stashed with a `resume` cursor position and carried
//!   forward, unresolved, until the cursor reaches that position.

use std::rc::Rc;

use log::trace;

use crate::cursor::{Cursor, Scalar, EOF};
use crate::inst::{Inst, InstIdx};
use crate::program::Program;
use crate::unicode;

/// Submatch slots: `subs[2*k]`/`subs[2*k+1]` are group `k`'s start/end
/// offsets, or `None` if that group never participated.
pub type Subs = Rc<Vec<Option<usize>>>;

/// Recursion ceiling for nested procedure calls and lookaround probes (§4.6
/// "a bounded call stack"), guarding against e.g. `(?/p:\gp;)` looping
/// forever without ever touching the input.
const MAX_PROC_DEPTH: usize = 256;

#[derive(Clone)]
struct Thread {
    pc: InstIdx,
    subs: Subs,
    /// Set only for threads paused on a multi-scalar consuming instruction
    /// (`BRef`/`QRef`/`Proc`): the cursor position at which this thread may
    /// resume past it.
    resume: Option<usize>,
}

struct ThreadList {
    dense: Vec<Thread>,
}

impl ThreadList {
    fn new() -> ThreadList {
        ThreadList { dense: Vec::new() }
    }

    fn clear(&mut self) {
        self.dense.clear();
    }

    fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
}

/// Executes one compiled [`Program`] against one piece of text. All
/// per-run mutable state -- the generation stamps used to dedup threads,
/// and the procedure-call depth guard -- lives here, off `Program` itself,
/// so one `Program` can drive any number of concurrent matches.
pub struct Matcher<'p> {
    prog: &'p Program,
    /// `gen[pc]` is the generation number at which instruction `pc` was
    /// last enqueued. Never reset mid-run, including across the nested
    /// `run` calls a lookaround or procedure call makes, so a pc touched by
    /// an outer run can't be mistakenly treated as already-seen by an inner
    /// one (or vice versa): each nested call just claims the next stretch
    /// of the same monotonic timeline.
    gen: Vec<u32>,
    generation: u32,
    depth: usize,
}

impl<'p> Matcher<'p> {
    pub fn new(prog: &'p Program) -> Matcher<'p> {
        Matcher {
            gen: vec![0; prog.insts().len()],
            generation: 0,
            depth: 0,
        }
    }

    /// Finds the leftmost match in `text`, per the unanchored `{any}*?`
    /// prefix every program starts with, and returns its submatch spans
    /// (slot 0/1 are the whole match) or `None`.
    pub fn execute(&mut self, text: &[u16]) -> Option<Vec<Option<usize>>> {
        self.generation = 0;
        for g in self.gen.iter_mut() {
            *g = 0;
        }
        let cur = Cursor::new(text);
        let subs = self.run(self.prog.start(), cur, false)?;
        Some((*subs).clone())
    }

    fn run(&mut self, entry: InstIdx, cur: Cursor, reverse: bool) -> Option<Subs> {
        trace!("enter sub-run at pc={} pos={} reverse={} depth={}", entry, cur.pos(), reverse, self.depth);
        self.depth += 1;
        let result = if self.depth > MAX_PROC_DEPTH {
            trace!("sub-run at pc={} aborted: depth limit {} exceeded", entry, MAX_PROC_DEPTH);
            None
        } else {
            self.run_inner(entry, cur, reverse)
        };
        self.depth -= 1;
        trace!("exit sub-run at pc={} matched={} depth={}", entry, result.is_some(), self.depth);
        result
    }

    fn run_inner(&mut self, entry: InstIdx, mut cur: Cursor, reverse: bool) -> Option<Subs> {
        let mut clist = ThreadList::new();
        let mut nlist = ThreadList::new();
        let init = Rc::new(vec![None; self.prog.num_slots().max(2)]);

        self.generation += 1;
        self.add_thread(&mut clist, entry, cur, init, None, reverse);

        let mut matched: Option<Subs> = None;
        loop {
            if clist.is_empty() {
                break;
            }

            let c = if reverse { cur.rpeek() } else { cur.peek() };
            let mut cur_next = cur;
            if reverse {
                cur_next.prev();
            } else {
                cur_next.next();
            }

            self.generation += 1;
            let mut i = 0;
            while i < clist.dense.len() {
                let pc = clist.dense[i].pc;
                let subs = clist.dense[i].subs.clone();
                let resume = clist.dense[i].resume;
                match self.prog.insts()[pc] {
                    Inst::Match => {
                        matched = Some(subs);
                        break;
                    }
                    Inst::Char(ch) => {
                        if c == ch {
                            self.add_thread(&mut nlist, pc + 1, cur_next, subs, None, reverse);
                        }
                    }
                    Inst::Set(ref set) => {
                        if c != EOF && set.contains(c) {
                            self.add_thread(&mut nlist, pc + 1, cur_next, subs, None, reverse);
                        }
                    }
                    Inst::Any => {
                        if c != EOF {
                            self.add_thread(&mut nlist, pc + 1, cur_next, subs, None, reverse);
                        }
                    }
                    Inst::None => {}
                    Inst::BRef(_) | Inst::QRef(_) | Inst::Proc { .. } => {
                        let target = resume.expect("pending multi-scalar thread carries a resume target");
                        if cur_next.pos() == target {
                            self.add_thread(&mut nlist, pc + 1, cur_next, subs, None, reverse);
                        } else {
                            nlist.dense.push(Thread { pc, subs, resume });
                            self.gen[pc] = self.generation;
                        }
                    }
                    Inst::Cond { then, .. } => {
                        let target = resume.expect("pending multi-scalar thread carries a resume target");
                        if cur_next.pos() == target {
                            self.add_thread(&mut nlist, then, cur_next, subs, None, reverse);
                        } else {
                            nlist.dense.push(Thread { pc, subs, resume });
                            self.gen[pc] = self.generation;
                        }
                    }
                    ref other => unreachable!(
                        "instruction {:?} should have been resolved by add_thread",
                        other
                    ),
                }
                i += 1;
            }

            if c == EOF {
                break;
            }
            cur = cur_next;
            std::mem::swap(&mut clist, &mut nlist);
            nlist.clear();
        }

        matched
    }

    /// Follows every epsilon transition reachable from `pc` and deposits
    /// the resulting consuming (or paused) threads into `list`, same as
    /// `nfa.rs`'s `add`. `cur` is the position the thread reaches `pc` at;
    /// it never moves within this function except for lookaround/procedure
    /// sub-runs, which restore it before returning.
    fn add_thread(
        &mut self,
        list: &mut ThreadList,
        pc: InstIdx,
        cur: Cursor,
        subs: Subs,
        resume: Option<usize>,
        reverse: bool,
    ) {
        if self.gen[pc] == self.generation {
            return;
        }
        self.gen[pc] = self.generation;

        match self.prog.insts()[pc] {
            Inst::Jump(to) => self.add_thread(list, to, cur, subs, resume, reverse),
            Inst::SplitLo { prim, alt } => {
                self.add_thread(list, prim, cur, subs.clone(), resume, reverse);
                self.add_thread(list, alt, cur, subs, resume, reverse);
            }
            Inst::SplitHi { prim, alt } => {
                self.add_thread(list, alt, cur, subs.clone(), resume, reverse);
                self.add_thread(list, prim, cur, subs, resume, reverse);
            }
            Inst::Save(slot) => {
                let mut subs = subs;
                Rc::make_mut(&mut subs)[slot] = Some(cur.pos());
                self.add_thread(list, pc + 1, cur, subs, resume, reverse);
            }
            Inst::Bot => self.cond_thread(at_bot(&cur), list, pc, cur, subs, resume, reverse),
            Inst::NBot => self.cond_thread(!at_bot(&cur), list, pc, cur, subs, resume, reverse),
            Inst::Eot => self.cond_thread(at_eot(&cur), list, pc, cur, subs, resume, reverse),
            Inst::NEot => self.cond_thread(!at_eot(&cur), list, pc, cur, subs, resume, reverse),
            Inst::Bol => self.cond_thread(at_bol(&cur), list, pc, cur, subs, resume, reverse),
            Inst::NBol => self.cond_thread(!at_bol(&cur), list, pc, cur, subs, resume, reverse),
            Inst::Eol => self.cond_thread(at_eol(&cur), list, pc, cur, subs, resume, reverse),
            Inst::NEol => self.cond_thread(!at_eol(&cur), list, pc, cur, subs, resume, reverse),
            Inst::Wbnd => self.cond_thread(at_wbnd(&cur), list, pc, cur, subs, resume, reverse),
            Inst::NWbnd => self.cond_thread(!at_wbnd(&cur), list, pc, cur, subs, resume, reverse),

            Inst::Look(after) => {
                let ok = self.run(pc + 1, cur, false).is_some();
                if ok {
                    self.add_thread(list, after, cur, subs, resume, reverse);
                }
            }
            Inst::NLook(after) => {
                let ok = self.run(pc + 1, cur, false).is_some();
                if !ok {
                    self.add_thread(list, after, cur, subs, resume, reverse);
                }
            }
            Inst::LookR(after) => {
                let ok = self.run(pc + 1, cur, true).is_some();
                if ok {
                    self.add_thread(list, after, cur, subs, resume, reverse);
                }
            }
            Inst::NLookR(after) => {
                let ok = self.run(pc + 1, cur, true).is_some();
                if !ok {
                    self.add_thread(list, after, cur, subs, resume, reverse);
                }
            }

            Inst::BRef(group) => self.add_ref_thread(list, pc, group, cur, subs, reverse, false),
            Inst::QRef(group) => self.add_ref_thread(list, pc, group, cur, subs, reverse, true),
            Inst::NBRef(group) => self.add_neg_ref_thread(list, pc, group, &cur, subs, resume, reverse, false),
            Inst::NQRef(group) => self.add_neg_ref_thread(list, pc, group, &cur, subs, resume, reverse, true),

            Inst::Proc { index, reversed } => {
                let entry = self.prog.proc_entry(index, reversed);
                match self.run(entry, cur, reversed) {
                    Some(inner) => {
                        let (lo, hi) = (inner[0], inner[1]);
                        match (lo, hi) {
                            (Some(lo), Some(hi)) if hi >= lo => {
                                let len = hi - lo;
                                if len == 0 {
                                    self.add_thread(list, pc + 1, cur, subs, resume, reverse);
                                } else {
                                    let target = if reversed { cur.pos().checked_sub(len) } else { cur.pos().checked_add(len) };
                                    if let Some(target) = target {
                                        list.dense.push(Thread { pc, subs, resume: Some(target) });
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                    None => {}
                }
            }
            Inst::NProc { index, reversed } => {
                let entry = self.prog.proc_entry(index, reversed);
                let matched = match self.run(entry, cur, reversed) {
                    Some(inner) => matches!((inner[0], inner[1]), (Some(lo), Some(hi)) if hi >= lo),
                    None => false,
                };
                if !matched {
                    self.add_thread(list, pc + 1, cur, subs, resume, reverse);
                }
            }

            Inst::Cond { guard, then, els } => {
                let entry = self.prog.proc_entry(guard, reverse);
                match self.run(entry, cur, reverse) {
                    Some(inner) => {
                        let (lo, hi) = (inner[0], inner[1]);
                        match (lo, hi) {
                            (Some(lo), Some(hi)) if hi >= lo => {
                                let len = hi - lo;
                                if len == 0 {
                                    self.add_thread(list, then, cur, subs, resume, reverse);
                                } else {
                                    let target = if reverse { cur.pos().checked_sub(len) } else { cur.pos().checked_add(len) };
                                    if let Some(target) = target {
                                        list.dense.push(Thread { pc, subs, resume: Some(target) });
                                    }
                                }
                            }
                            _ => {
                                self.add_thread(list, els, cur, subs, resume, reverse);
                            }
                        }
                    }
                    None => {
                        self.add_thread(list, els, cur, subs, resume, reverse);
                    }
                }
            }

            Inst::Char(_) | Inst::Set(_) | Inst::Any | Inst::None | Inst::Match => {
                list.dense.push(Thread { pc, subs, resume });
            }
        }
    }

    fn cond_thread(
        &mut self,
        ok: bool,
        list: &mut ThreadList,
        pc: InstIdx,
        cur: Cursor,
        subs: Subs,
        resume: Option<usize>,
        reverse: bool,
    ) {
        if ok {
            self.add_thread(list, pc + 1, cur, subs, resume, reverse);
        }
    }

    /// `BRef`/`QRef`: if the referenced group hasn't matched (or matched
    /// empty) this reference always fails (dropped, nothing added); if the
    /// candidate span ahead (or behind, in reverse) doesn't compare equal
    /// this fails too. Otherwise the thread is parked with a `resume`
    /// target and carried through `step` until reached.
    fn add_ref_thread(
        &mut self,
        list: &mut ThreadList,
        pc: InstIdx,
        group: usize,
        cur: Cursor,
        subs: Subs,
        reverse: bool,
        quote: bool,
    ) {
        let (lo, hi) = match (subs.get(2 * group).copied().flatten(), subs.get(2 * group + 1).copied().flatten()) {
            (Some(lo), Some(hi)) if hi >= lo => (lo, hi),
            _ => return,
        };
        let len = hi - lo;
        if len == 0 {
            return;
        }
        let original = cur.slice(lo, hi);
        let (from, to) = if reverse {
            match cur.pos().checked_sub(len) {
                Some(from) if from >= cur.start() => (from, cur.pos()),
                _ => return,
            }
        } else {
            let to = cur.pos() + len;
            if to > cur.end() {
                return;
            }
            (cur.pos(), to)
        };
        let candidate = cur.slice(from, to);
        let equal = if quote { unicode::quote_equal(candidate, original) } else { candidate == original };
        if !equal {
            return;
        }
        let target = if reverse { from } else { to };
        list.dense.push(Thread { pc, subs, resume: Some(target) });
    }

    /// `NBRef`/`NQRef`: zero-width. Succeeds (continues to `pc + 1`) iff
    /// the positive form would fail -- an unset group, or a span that
    /// doesn't compare equal.
    fn add_neg_ref_thread(
        &mut self,
        list: &mut ThreadList,
        pc: InstIdx,
        group: usize,
        cur: &Cursor,
        subs: Subs,
        resume: Option<usize>,
        reverse: bool,
        quote: bool,
    ) {
        let cur = *cur;
        let positive = match (subs.get(2 * group).copied().flatten(), subs.get(2 * group + 1).copied().flatten()) {
            (Some(lo), Some(hi)) if hi > lo => {
                let len = hi - lo;
                let original = cur.slice(lo, hi);
                let span = if reverse {
                    cur.pos().checked_sub(len).filter(|&from| from >= cur.start()).map(|from| (from, cur.pos()))
                } else {
                    let to = cur.pos() + len;
                    if to <= cur.end() { Some((cur.pos(), to)) } else { None }
                };
                match span {
                    Some((from, to)) => {
                        let candidate = cur.slice(from, to);
                        if quote { unicode::quote_equal(candidate, original) } else { candidate == original }
                    }
                    None => false,
                }
            }
            _ => false,
        };
        if !positive {
            self.add_thread(list, pc + 1, cur, subs, resume, reverse);
        }
    }
}

fn at_bot(cur: &Cursor) -> bool {
    cur.rpeek() == EOF
}

fn at_eot(cur: &Cursor) -> bool {
    cur.peek() == EOF
}

fn at_bol(cur: &Cursor) -> bool {
    let p = cur.rpeek();
    p == EOF || unicode::vspace().contains(p)
}

fn at_eol(cur: &Cursor) -> bool {
    let n = cur.peek();
    n == EOF || unicode::vspace().contains(n)
}

fn is_word_scalar(c: Scalar) -> bool {
    c != EOF && unicode::word().contains(c)
}

fn at_wbnd(cur: &Cursor) -> bool {
    is_word_scalar(cur.rpeek()) != is_word_scalar(cur.peek())
}

#[cfg(test)]
mod tests {
    use crate::cursor::to_utf16;
    use crate::program::{compile, execute};

    fn find(pattern: &str, text: &str) -> Option<(usize, usize)> {
        let prog = compile(&to_utf16(pattern)).unwrap();
        let mut spans = vec![None; prog.num_slots()];
        if execute(&prog, &to_utf16(text), &mut spans) {
            Some((spans[0].unwrap(), spans[1].unwrap()))
        } else {
            None
        }
    }

    #[test]
    fn literal_matches_leftmost() {
        assert_eq!(find("abc", "xxabcyy"), Some((2, 5)));
    }

    #[test]
    fn alternation_prefers_left_branch() {
        assert_eq!(find("a|ab", "ab"), Some((0, 1)));
    }

    #[test]
    fn greedy_star_is_maximal() {
        assert_eq!(find("a*", "aaab"), Some((0, 3)));
    }

    #[test]
    fn lazy_star_is_minimal() {
        let prog = compile(&to_utf16("a*?")).unwrap();
        let mut spans = vec![None; prog.num_slots()];
        assert!(crate::program::execute(&prog, &to_utf16("aaa"), &mut spans));
        assert_eq!((spans[0], spans[1]), (Some(0), Some(0)));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(find("xyz", "abc"), None);
    }

    #[test]
    fn word_boundary_anchors() {
        assert_eq!(find(r"\bcat\b", "a cat sat"), Some((2, 5)));
    }

    #[test]
    fn lookahead_requires_following_text() {
        assert_eq!(find("a(?=b)", "ab"), Some((0, 1)));
        assert_eq!(find("a(?=b)", "ac"), None);
    }

    #[test]
    fn lookbehind_requires_preceding_text() {
        assert_eq!(find("(?<=a)b", "ab"), Some((1, 2)));
        assert_eq!(find("(?<=a)b", "cb"), None);
    }

    #[test]
    fn literal_backreference_requires_exact_repeat() {
        let prog = compile(&to_utf16(r"(?g:a+)\kg;")).unwrap();
        let mut spans = vec![None; prog.num_slots()];
        assert!(crate::program::execute(&prog, &to_utf16("aaaa"), &mut spans));
        assert!(!crate::program::execute(&prog, &to_utf16("aaab"), &mut spans));
    }

    #[test]
    fn recursive_procedure_balances() {
        let prog = compile(&to_utf16(r"(?/p:a(\gp;)?b)\gp;")).unwrap();
        let mut spans = vec![None; prog.num_slots()];
        assert!(crate::program::execute(&prog, &to_utf16("aaabbb"), &mut spans));
        assert_eq!((spans[0], spans[1]), (Some(0), Some(6)));
    }
}
