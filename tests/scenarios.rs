// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end scenarios exercising the pattern language surface as a whole,
//! the way a user embedding this crate actually would: compile a pattern,
//! run it against text, inspect the named captures.

use assert_matches::assert_matches;
use rgx::cursor::to_utf16;
use rgx::{compile, execute, Error};

/// Compiles `pattern` and matches it against `text`, returning the named
/// group's captured substring (decoded back to UTF-8 for readability) or
/// `None` if the whole match or that group didn't participate.
fn capture(pattern: &str, text: &str, group: &str) -> Option<String> {
    let prog = compile(&to_utf16(pattern)).unwrap();
    let idx = prog.group_names().iter().position(|n| n == group)?;
    let mut spans = vec![None; prog.num_slots()];
    if !execute(&prog, &to_utf16(text), &mut spans) {
        return None;
    }
    let (s, e) = (spans[2 * idx]?, spans[2 * idx + 1]?);
    String::from_utf16(&to_utf16(text)[s..e]).ok()
}

fn matches(pattern: &str, text: &str) -> bool {
    let prog = compile(&to_utf16(pattern)).unwrap();
    let mut spans = vec![None; prog.num_slots()];
    execute(&prog, &to_utf16(text), &mut spans)
}

#[test]
fn named_group_captures_digits() {
    assert_eq!(capture("(?name:\\d+)", "abc123xyz", "name"), Some("123".to_string()));
    assert_eq!(capture("(?name:\\d+)", "abc123xyz", ""), Some("123".to_string()));
}

#[test]
fn named_backreference_requires_repeated_word() {
    assert!(matches(r"(?w:\w+)\s+\kw;", "foo foo"));
    assert!(!matches(r"(?w:\w+)\s+\kw;", "foo bar"));
}

#[test]
fn quote_backreference_requires_bracket_mate() {
    // Capture the opening delimiter, then require its mate after the body.
    assert!(!matches(r"(?o:.)hello\mo;", "(hello]"));
    assert!(matches(r"(?o:.)hello\mo;", "(hello)"));
}

#[test]
fn recursive_procedure_balances_nesting() {
    assert_eq!(capture(r"(?/p:a(\gp;)?b)\gp;", "aaabbb", ""), Some("aaabbb".to_string()));
}

#[test]
fn lookaround_checks_adjacent_text() {
    assert_eq!(capture("a(?=b)", "ab", ""), Some("a".to_string()));
    assert_eq!(capture("a(?=b)", "ac", ""), None);
    assert_eq!(capture("a(?<=[ab])", "ba", ""), Some("a".to_string()));
}

#[test]
fn conditional_branches_on_procedure_success() {
    assert_eq!(capture("(??\\ga; b | c)(?/a:x)", "xb", ""), Some("xb".to_string()));
    assert_eq!(capture("(??\\ga; b | c)(?/a:x)", "yc", ""), Some("c".to_string()));
}

#[test]
fn calling_an_undefined_procedure_is_an_error() {
    let err = compile(&to_utf16(r"\gnope;")).unwrap_err();
    assert_matches!(err, Error::Undefined);
}

#[test]
fn referencing_an_undefined_group_is_an_error() {
    let err = compile(&to_utf16(r"\knope;")).unwrap_err();
    assert_matches!(err, Error::Undefined);
}

#[test]
fn redefining_a_procedure_is_an_error() {
    let err = compile(&to_utf16("(?/p:a)(?/p:b)")).unwrap_err();
    assert_eq!(err, Error::Redefined);
}

#[test]
fn disassembly_reports_every_group_name() {
    let prog = compile(&to_utf16("(?year:[0-9]{4})-(?month:[0-9]{2})")).unwrap();
    let text = rgx::print(&prog);
    assert!(text.contains("group 1: \"year\""));
    assert!(text.contains("group 2: \"month\""));
}
