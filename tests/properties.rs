// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Property-based checks of the engine's core invariants (§8): leftmost
//! literal matching, round-trip opcode counts, and reverse equivalence.
//! These only hold for literal patterns with no lookaround, which is all
//! that's generated here -- the engine's full language is exercised by the
//! fixed scenarios in `scenarios.rs` instead.

use proptest::prelude::*;
use rand::Rng;

use rgx::compiler::count as count_insts;
use rgx::cursor::to_utf16;
use rgx::{compile, execute};

fn alpha() -> impl Strategy<Value = String> {
    "[abc]{0,8}"
}

fn leftmost_substring(haystack: &[u16], needle: &[u16]) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return Some((0, 0));
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| (i, i + needle.len()))
}

proptest! {
    #[test]
    fn literal_pattern_finds_leftmost_substring(pattern in alpha(), text in alpha()) {
        let prog = compile(&to_utf16(&pattern)).unwrap();
        let mut spans = vec![None; prog.num_slots()];
        let found = execute(&prog, &to_utf16(&text), &mut spans);
        let expected = leftmost_substring(&to_utf16(&text), &to_utf16(&pattern));
        prop_assert_eq!(found, expected.is_some());
        if let Some((lo, hi)) = expected {
            prop_assert_eq!(spans[0], Some(lo));
            prop_assert_eq!(spans[1], Some(hi));
        }
    }

    #[test]
    fn reverse_pattern_matches_reverse_text(pattern in alpha(), text in alpha()) {
        let reversed_pattern: String = pattern.chars().rev().collect();
        let reversed_text: String = text.chars().rev().collect();

        let forward = execute(
            &compile(&to_utf16(&pattern)).unwrap(),
            &to_utf16(&text),
            &mut vec![None; 2],
        );
        let backward = execute(
            &compile(&to_utf16(&reversed_pattern)).unwrap(),
            &to_utf16(&reversed_text),
            &mut vec![None; 2],
        );
        prop_assert_eq!(forward, backward);
    }
}

#[test]
fn compiled_instruction_count_matches_static_estimate() {
    use rgx::ast::{Ast, AstArena};

    let arena = AstArena::with_capacity(16);
    let a = arena.alloc(Ast::Char('a' as i32));
    let plus = arena.alloc(Ast::Plus(a, true));
    let b = arena.alloc(Ast::Char('b' as i32));
    let cat = arena.alloc(Ast::Cat(plus, b));

    let estimate = count_insts(cat, true);

    let prog = compile(&to_utf16("a+b")).unwrap();
    // Every program carries the unanchored `{any}*?` prefix (a split, one
    // `Any`, and its backward jump: 3 instructions), the implicit
    // whole-match group's Save pair (2), and a trailing Match (1) on top
    // of the root node's own instructions.
    let overhead = 3 + 2 + 1;
    assert_eq!(prog.instruction_count() as u64, estimate + overhead);
}

#[test]
fn random_small_patterns_compile_without_panicking() {
    let mut rng = rand::thread_rng();
    let alphabet: Vec<char> = "abc.*+?".chars().collect();
    for _ in 0..200 {
        let len = rng.gen_range(0..12);
        let pattern: String = (0..len).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect();
        // A malformed random string is allowed to fail to compile; it must
        // never panic.
        let _ = compile(&to_utf16(&pattern));
    }
}
