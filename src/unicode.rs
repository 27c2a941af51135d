// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Character-class primitives: an opaque scalar set, the property sets
//! referenced by `\d \w \s \v \h \o \c`, and bracket/quote-equality.
//!
//! This module plays the role of the out-of-scope external collaborators
//! named in the engine's scope note: it supplies the static tables the
//! engine consumes, rather than re-deriving them from raw Unicode data
//! files. Property ranges come from `regex-syntax`'s own Unicode tables
//! (reached by parsing a one-off `\p{Name}` pattern and reading back the
//! resulting character class) rather than a hand-rolled copy of UCD.

use std::sync::OnceLock;

use regex_syntax::hir::{Class, HirKind};

use crate::cursor::{Cursor, Scalar, EOF};
use crate::error::{Error, Result};

/// An opaque set of Unicode scalar values, represented as sorted,
/// non-adjacent, inclusive ranges — the same representation the teacher's
/// `InstRanges` uses for a single compiled instruction, generalized here
/// into a full set algebra (union/intersection/difference/complement).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharSet {
    ranges: Vec<(u32, u32)>,
}

const SCALAR_MAX: u32 = 0x10FFFF;

impl CharSet {
    pub fn empty() -> CharSet {
        CharSet { ranges: Vec::new() }
    }

    pub fn single(c: Scalar) -> CharSet {
        let mut s = CharSet::empty();
        s.add(c);
        s
    }

    pub fn from_ranges<I: IntoIterator<Item = (u32, u32)>>(it: I) -> CharSet {
        let mut s = CharSet::empty();
        for (lo, hi) in it {
            s.add_range(lo, hi);
        }
        s
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, c: Scalar) -> bool {
        if c < 0 {
            return false;
        }
        let c = c as u32;
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < c {
                    std::cmp::Ordering::Less
                } else if lo > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn add(&mut self, c: Scalar) {
        if c >= 0 {
            self.add_range(c as u32, c as u32);
        }
    }

    pub fn add_range(&mut self, lo: u32, hi: u32) {
        if lo > hi {
            return;
        }
        self.ranges.push((lo, hi));
        self.normalize();
    }

    pub fn add_all(&mut self, other: &CharSet) {
        self.ranges.extend_from_slice(&other.ranges);
        self.normalize();
    }

    /// `self |= other`.
    pub fn union(mut self, other: &CharSet) -> CharSet {
        self.add_all(other);
        self
    }

    /// `self &= other`.
    pub fn intersect(&self, other: &CharSet) -> CharSet {
        let mut out = CharSet::empty();
        for &(lo, hi) in &self.ranges {
            for &(olo, ohi) in &other.ranges {
                let lo = lo.max(olo);
                let hi = hi.min(ohi);
                if lo <= hi {
                    out.ranges.push((lo, hi));
                }
            }
        }
        out.normalize();
        out
    }

    /// `self -= other`.
    pub fn difference(&self, other: &CharSet) -> CharSet {
        self.intersect(&other.clone().complement())
    }

    /// `self ^= other` (elements in exactly one of the two sets).
    pub fn symmetric_difference(&self, other: &CharSet) -> CharSet {
        self.union(other).difference(&self.intersect(other))
    }

    /// Replaces this set with its complement within `0..=0x10FFFF`.
    pub fn complement(self) -> CharSet {
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0u32;
        for (lo, hi) in self.ranges {
            if lo > next {
                out.push((next, lo - 1));
            }
            next = hi.saturating_add(1);
        }
        if next <= SCALAR_MAX {
            out.push((next, SCALAR_MAX));
        }
        CharSet { ranges: out }
    }

    fn normalize(&mut self) {
        if self.ranges.len() < 2 {
            return;
        }
        self.ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(self.ranges.len());
        for &(lo, hi) in &self.ranges {
            if let Some(last) = merged.last_mut() {
                if lo <= last.1.saturating_add(1) {
                    last.1 = last.1.max(hi);
                    continue;
                }
            }
            merged.push((lo, hi));
        }
        self.ranges = merged;
    }

    /// A pattern-like textual rendering, used only by the disassembler.
    pub fn describe(&self) -> String {
        let mut s = String::from("[");
        for &(lo, hi) in &self.ranges {
            if lo == hi {
                s.push_str(&format!("{:#x}", lo));
            } else {
                s.push_str(&format!("{:#x}-{:#x}", lo, hi));
            }
            s.push(' ');
        }
        s.push(']');
        s
    }
}

/// Parses a one-off `pat` (e.g. `\p{Nd}` or a bracket expression built from
/// several `\p{...}` atoms) through `regex-syntax` and reads the resulting
/// Unicode class back out as a `CharSet`. This is the one place this crate
/// leans on an external Unicode data table instead of inventing one.
fn class_from_pattern(pat: &str) -> Result<CharSet> {
    let hir = regex_syntax::Parser::new()
        .parse(pat)
        .map_err(|_| Error::BadEscape)?;
    match hir.kind() {
        HirKind::Class(Class::Unicode(cls)) => {
            let mut set = CharSet::empty();
            for r in cls.ranges() {
                set.add_range(r.start() as u32, r.end() as u32);
            }
            Ok(set)
        }
        _ => Err(Error::BadEscape),
    }
}

/// Resolves a `\p{Name}` / `{Name}` Unicode property body to a `CharSet`.
pub fn property_class(name: &str) -> Result<CharSet> {
    class_from_pattern(&format!(r"\p{{{}}}", name))
}

macro_rules! lazy_charset {
    ($name:ident, $pat:expr) => {
        pub fn $name() -> &'static CharSet {
            static SET: OnceLock<CharSet> = OnceLock::new();
            SET.get_or_init(|| class_from_pattern($pat).expect("built-in class pattern is valid"))
        }
    };
}

// `\d` = `\p{Nd}`.
lazy_charset!(digit, r"\p{Nd}");
// `\w` = `[\p{Alphabetic}\p{M}\p{N}\p{Pc}\p{Join_Control}]`.
lazy_charset!(
    word,
    r"[\p{Alphabetic}\p{M}\p{N}\p{Pc}\p{Join_Control}]"
);
// `\s` = `\p{White_Space}`.
lazy_charset!(space, r"\p{White_Space}");

/// `\v` = `[\n\v\f\r\x85  ]`. Also the line-terminator set used by
/// `^`/`$`.
pub fn vspace() -> &'static CharSet {
    static SET: OnceLock<CharSet> = OnceLock::new();
    SET.get_or_init(|| {
        CharSet::from_ranges([
            (0x0A, 0x0A),
            (0x0B, 0x0D),
            (0x85, 0x85),
            (0x2028, 0x2029),
        ])
    })
}

/// `\h` = `[\t\p{Zs}]`.
pub fn hspace() -> &'static CharSet {
    static SET: OnceLock<CharSet> = OnceLock::new();
    SET.get_or_init(|| {
        class_from_pattern(r"\p{Zs}")
            .expect("built-in class pattern is valid")
            .union(&CharSet::single('\t' as Scalar))
    })
}

/// Hand-patched opener/closer pairs, since deriving them from Unicode
/// bidi-bracket data is explicitly out of scope (§1). Covers ASCII grouping
/// punctuation plus the common Unicode paired punctuation and symmetric
/// quote marks used in `\m.../\M...;` quote-matching.
const BRACKET_PAIRS: &[(u32, u32)] = &[
    ('(' as u32, ')' as u32),
    ('[' as u32, ']' as u32),
    ('{' as u32, '}' as u32),
    ('<' as u32, '>' as u32),
    (0x2018, 0x2019), // single quote marks
    (0x201C, 0x201D), // double quote marks
    (0x2039, 0x203A), // single guillemets
    (0x00AB, 0x00BB), // double guillemets
    (0x3008, 0x3009), // angle brackets
    (0x300C, 0x300D), // corner brackets
    (0x300E, 0x300F), // white corner brackets
    (0xFF08, 0xFF09), // fullwidth parens
];

/// Symmetric quote characters: equal to themselves and present in the
/// bracket table for the purposes of `\m.../\M...;` (e.g. `"` pairs with
/// another `"`).
const SYMMETRIC_QUOTES: &[u32] = &['"' as u32, '\'' as u32, '`' as u32];

/// The set of opening bracket/quote scalars (§6 `\o`/`{open-brace}`).
pub fn opener() -> &'static CharSet {
    static SET: OnceLock<CharSet> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = CharSet::from_ranges(BRACKET_PAIRS.iter().map(|&(o, _)| (o, o)));
        for &q in SYMMETRIC_QUOTES {
            s.add(q as Scalar);
        }
        s
    })
}

/// The set of closing bracket/quote scalars (§6 `\c`/`{close-brace}`).
pub fn closer() -> &'static CharSet {
    static SET: OnceLock<CharSet> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = CharSet::from_ranges(BRACKET_PAIRS.iter().map(|&(_, c)| (c, c)));
        for &q in SYMMETRIC_QUOTES {
            s.add(q as Scalar);
        }
        s
    })
}

/// Whether `close` is `open`'s bracket mate, per the hand-patched table.
/// This is the one external-collaborator function the engine consumes
/// (§1): "a function mapping an opening bracket code point to whether a
/// given closing code point is its mate".
pub fn bracket_mate(open: Scalar, close: Scalar) -> bool {
    if open < 0 || close < 0 {
        return false;
    }
    let (open, close) = (open as u32, close as u32);
    BRACKET_PAIRS.iter().any(|&(o, c)| o == open && c == close)
}

fn is_bracket_scalar(c: Scalar) -> bool {
    opener().contains(c) || closer().contains(c)
}

fn quote_scalar_equal(a: Scalar, b: Scalar) -> bool {
    if a == b {
        is_bracket_scalar(a)
    } else {
        bracket_mate(a, b) || bracket_mate(b, a)
    }
}

/// Bracket-equal ("quote") comparison of two equal-length UTF-16 spans, per
/// §6: two scalars match iff they are bracket mates, or identical and
/// themselves a bracket/quote character.
pub fn quote_equal(a: &[u16], b: &[u16]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut ca = Cursor::new(a);
    let mut cb = Cursor::new(b);
    loop {
        let (xa, xb) = (ca.next(), cb.next());
        if xa == EOF && xb == EOF {
            return true;
        }
        if xa == EOF || xb == EOF {
            return false;
        }
        if !quote_scalar_equal(xa, xb) {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::to_utf16;

    #[test]
    fn set_algebra() {
        let a = CharSet::from_ranges([(0, 10)]);
        let b = CharSet::from_ranges([(5, 15)]);
        assert!(a.clone().union(&b).contains(12));
        assert!(a.intersect(&b).contains(7));
        assert!(!a.intersect(&b).contains(3));
        assert!(a.difference(&b).contains(2));
        assert!(!a.difference(&b).contains(7));
    }

    #[test]
    fn complement_round_trip() {
        let a = CharSet::from_ranges([(5, 10)]);
        let comp = a.clone().complement();
        assert!(!comp.contains(7));
        assert!(comp.contains(0));
        assert!(comp.contains(SCALAR_MAX as Scalar));
    }

    #[test]
    fn digit_contains_ascii_digits() {
        assert!(digit().contains('5' as Scalar));
        assert!(!digit().contains('a' as Scalar));
    }

    #[test]
    fn word_covers_alpha_and_digit() {
        assert!(word().contains('a' as Scalar));
        assert!(word().contains('5' as Scalar));
        assert!(word().contains('_' as Scalar));
        assert!(!word().contains(' ' as Scalar));
    }

    #[test]
    fn bracket_mate_basic() {
        assert!(bracket_mate('(' as Scalar, ')' as Scalar));
        assert!(!bracket_mate('(' as Scalar, ']' as Scalar));
    }

    #[test]
    fn quote_equal_parens_and_square() {
        // Quote-equality is defined per scalar: an opening bracket is
        // quote-equal to its closing mate, never to an unrelated closer.
        let open = to_utf16("(");
        let close_paren = to_utf16(")");
        let close_square = to_utf16("]");
        assert!(quote_equal(&open, &close_paren));
        assert!(!quote_equal(&open, &close_square));
    }

    #[test]
    fn quote_equal_symmetric_quotes() {
        let a = to_utf16("\"");
        let b = to_utf16("\"");
        assert!(quote_equal(&a, &b));
        let c = to_utf16("'");
        assert!(!quote_equal(&a, &c));
    }

    #[test]
    fn quote_equal_rejects_ordinary_text() {
        // Non-bracket scalars are never quote-equal, even to themselves:
        // quote back-references are only meaningful over bracket/quote runs.
        let a = to_utf16("hi");
        let b = to_utf16("hi");
        assert!(!quote_equal(&a, &b));
    }

    #[test]
    fn property_class_resolves() {
        let letters = property_class("L").unwrap();
        assert!(letters.contains('a' as Scalar));
        assert!(!letters.contains('5' as Scalar));
    }
}
