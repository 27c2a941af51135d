// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Recursive-descent parser: pattern text to [`Ast`] (§4).
//!
//! A single [`Parser`] walks a [`Cursor`] one scalar at a time (`self.ch`
//! is always the not-yet-consumed lookahead scalar, primed by one
//! `advance()` before parsing starts, the same one-token lookahead
//! discipline the original's `tk->cur`/`NEXT` pair follows) and allocates
//! every node it builds out of a caller-supplied [`AstArena`]. Grammar
//! functions never return "no tree": an absent subtree (an empty group
//! body, a missing alternation branch) is represented by [`Ast::Empty`]
//! rather than by an option, since only one spot (a quantifier's operand)
//! ever needs to distinguish "found an atom" from "found nothing", and an
//! `Ast::Empty` sentinel check there reads the same as the original's
//! `if (rl)` guard.

use crate::ast::{Ast, AstArena};
use crate::cursor::{Cursor, Scalar, EOF};
use crate::error::{Error, Result};
use crate::names::{GroupTable, ProcTable};
use crate::unicode::{self, CharSet};

/// The integer ceiling on a `{n,m}` bound, matching the original's
/// `RGX_REP_MAX`: generous, but small enough that `n * m` arithmetic in
/// the compiler's unrolling pass can't silently wrap.
const REP_MAX: u32 = 65_535;

/// The parsed form of a pattern: its AST plus the name tables the parse
/// built up, ready for the compiler.
pub struct Parsed<'a> {
    pub root: &'a Ast<'a>,
    pub groups: GroupTable,
    pub procs: ProcTable<'a>,
}

/// Parses `text` (already in UTF-16) into an AST rooted in `arena`.
///
/// `max_repeat` bounds a `{n,m}` quantifier's fields (§6), threaded in
/// rather than hard-coded so `program::CompileOptions` can tune it.
pub fn parse<'a>(arena: &'a AstArena<'a>, text: &[u16], max_repeat: u32) -> Result<Parsed<'a>> {
    let mut p = Parser {
        cur: Cursor::new(text),
        ch: EOF,
        arena,
        groups: GroupTable::new(),
        procs: ProcTable::new(),
        max_repeat,
    };
    p.advance();
    let root = p.parse_alt()?;
    if p.skip_spaces() {
        return Err(Error::ExtraJunk);
    }
    p.groups.check_all_defined()?;
    p.procs.check_all_defined()?;
    Ok(Parsed { root, groups: p.groups, procs: p.procs })
}

enum BRefKind {
    Literal,
    NegLiteral,
    Quote,
    NegQuote,
}

struct Parser<'t, 'a> {
    cur: Cursor<'t>,
    ch: Scalar,
    arena: &'a AstArena<'a>,
    groups: GroupTable,
    procs: ProcTable<'a>,
    max_repeat: u32,
}

fn scalar_to_char(c: Scalar) -> char {
    char::from_u32(c as u32).unwrap_or('\u{FFFD}')
}

impl<'t, 'a> Parser<'t, 'a> {
    fn more(&self) -> bool {
        self.ch != EOF
    }

    fn advance(&mut self) -> Scalar {
        self.ch = self.cur.next();
        self.ch
    }

    fn peek(&self) -> Scalar {
        self.cur.peek()
    }

    fn alloc(&self, node: Ast<'a>) -> &'a Ast<'a> {
        self.arena.alloc(node)
    }

    /// Skips whitespace and `#`-to-end-of-line comments (§4.1), returning
    /// whether there is any input left.
    fn skip_spaces(&mut self) -> bool {
        while self.more() && (self.ch == '#' as Scalar || unicode::space().contains(self.ch)) {
            if self.ch == '#' as Scalar {
                loop {
                    self.advance();
                    if !self.more() || unicode::vspace().contains(self.ch) {
                        break;
                    }
                }
            }
            self.advance();
        }
        self.more()
    }

    /// Collects scalars up to (and consuming) `endc`.
    fn gather(&mut self, endc: char, err: Error) -> Result<String> {
        let endc = endc as Scalar;
        let mut buf = String::new();
        while self.ch != endc {
            buf.push(scalar_to_char(self.ch));
            self.advance();
            if !self.more() {
                return Err(err);
            }
        }
        self.advance();
        Ok(buf)
    }

    /// Collects a name up to whitespace or `}` (§4.2), also stopping after
    /// (and including) a `$`, `:` or `=` terminator — the same
    /// "directive/name terminator" set the original's `gather_word` uses,
    /// with no special case for any of them appearing first.
    fn gather_word(&mut self, err: Error) -> Result<String> {
        if !self.skip_spaces() {
            return Err(err);
        }
        let mut buf = String::new();
        loop {
            if !self.more() || self.ch == '}' as Scalar || unicode::space().contains(self.ch) {
                break;
            }
            buf.push(scalar_to_char(self.ch));
            let c = self.ch;
            if c == '$' as Scalar || c == ':' as Scalar || c == '=' as Scalar {
                self.advance();
                break;
            }
            self.advance();
            if !self.more() {
                return Err(err);
            }
        }
        Ok(buf)
    }

    fn maybe_int(&mut self) -> Result<u32> {
        let mut digits = String::new();
        while self.more() && scalar_to_char(self.ch).is_ascii_digit() {
            digits.push(scalar_to_char(self.ch));
            self.advance();
        }
        if digits.is_empty() {
            return Ok(0);
        }
        let val: u64 = digits.parse().map_err(|_| Error::Overflow)?;
        if val > self.max_repeat as u64 {
            return Err(Error::Overflow);
        }
        Ok(val as u32)
    }

    fn single_letter_class(&mut self, base: &'static CharSet, neg: bool) -> &'a Ast<'a> {
        self.advance();
        let set = if neg { base.clone().complement() } else { base.clone() };
        self.alloc(Ast::Set(set))
    }

    fn escape_hex(&mut self) -> Result<&'a Ast<'a>> {
        self.advance(); // past 'x'
        let mut digits = String::new();
        while self.more() && scalar_to_char(self.ch).is_ascii_hexdigit() {
            digits.push(scalar_to_char(self.ch));
            self.advance();
        }
        if digits.is_empty() || self.ch != ';' as Scalar {
            return Err(Error::BadEscape);
        }
        let val = u32::from_str_radix(&digits, 16).map_err(|_| Error::BadEscape)?;
        if val > 0x10FFFF || (0xD800..=0xDFFF).contains(&val) {
            return Err(Error::BadEscape);
        }
        self.advance(); // past ';'
        Ok(self.alloc(Ast::Char(val as Scalar)))
    }

    fn escape_backref(&mut self, kind: BRefKind) -> Result<&'a Ast<'a>> {
        self.advance();
        if !self.more() {
            return Err(Error::BadEscape);
        }
        let name = self.gather(';', Error::BadEscape)?;
        let idx = self.groups.lookup_or_insert(&name, false);
        Ok(self.alloc(match kind {
            BRefKind::Literal => Ast::BRef(idx),
            BRefKind::NegLiteral => Ast::NBRef(idx),
            BRefKind::Quote => Ast::QRef(idx),
            BRefKind::NegQuote => Ast::NQRef(idx),
        }))
    }

    fn escape_procref(&mut self, neg: bool) -> Result<&'a Ast<'a>> {
        self.advance();
        if !self.more() {
            return Err(Error::BadEscape);
        }
        let name = self.gather(';', Error::BadEscape)?;
        let idx = self.procs.lookup_or_insert(&name);
        Ok(self.alloc(if neg { Ast::NProc(idx) } else { Ast::Proc(idx) }))
    }

    fn escape_property(&mut self, neg: bool) -> Result<&'a Ast<'a>> {
        self.advance(); // past 'p'/'P'
        if !self.more() || self.ch != '{' as Scalar {
            return Err(Error::BadEscape);
        }
        self.advance(); // past '{'
        let mut name = String::new();
        loop {
            if !self.more() {
                return Err(Error::BadEscape);
            }
            if self.ch == '}' as Scalar {
                break;
            }
            name.push(scalar_to_char(self.ch));
            self.advance();
        }
        self.advance(); // past '}'
        let set = unicode::property_class(&name)?;
        Ok(self.alloc(Ast::Set(if neg { set.complement() } else { set })))
    }

    /// `\escape` (§4.2). Does not consume the leading backslash; the
    /// caller has already stepped past it.
    fn parse_escape(&mut self) -> Result<&'a Ast<'a>> {
        if !self.more() {
            return Err(Error::BadEscape);
        }
        let c = self.ch;
        Ok(match scalar_to_char(c) {
            'x' => return self.escape_hex(),
            'k' => return self.escape_backref(BRefKind::Literal),
            'K' => return self.escape_backref(BRefKind::NegLiteral),
            'm' => return self.escape_backref(BRefKind::Quote),
            'M' => return self.escape_backref(BRefKind::NegQuote),
            'g' => return self.escape_procref(false),
            'G' => return self.escape_procref(true),
            'p' => return self.escape_property(false),
            'P' => return self.escape_property(true),
            'd' => self.single_letter_class(unicode::digit(), false),
            'D' => self.single_letter_class(unicode::digit(), true),
            'w' => self.single_letter_class(unicode::word(), false),
            'W' => self.single_letter_class(unicode::word(), true),
            's' => self.single_letter_class(unicode::space(), false),
            'S' => self.single_letter_class(unicode::space(), true),
            'v' => self.single_letter_class(unicode::vspace(), false),
            'V' => self.single_letter_class(unicode::vspace(), true),
            'h' => self.single_letter_class(unicode::hspace(), false),
            'H' => self.single_letter_class(unicode::hspace(), true),
            'o' => self.single_letter_class(unicode::opener(), false),
            'O' => self.single_letter_class(unicode::opener(), true),
            'c' => self.single_letter_class(unicode::closer(), false),
            'C' => self.single_letter_class(unicode::closer(), true),
            'r' => {
                self.advance();
                self.alloc(Ast::Char('\r' as Scalar))
            }
            'n' => {
                self.advance();
                self.alloc(Ast::Char('\n' as Scalar))
            }
            't' => {
                self.advance();
                self.alloc(Ast::Char('\t' as Scalar))
            }
            'a' => {
                self.advance();
                self.alloc(Ast::Bot)
            }
            'A' => {
                self.advance();
                self.alloc(Ast::NBot)
            }
            'z' => {
                self.advance();
                self.alloc(Ast::Eot)
            }
            'Z' => {
                self.advance();
                self.alloc(Ast::NEot)
            }
            'b' => {
                self.advance();
                self.alloc(Ast::Wbnd)
            }
            'B' => {
                self.advance();
                self.alloc(Ast::NWbnd)
            }
            _ => {
                self.advance();
                self.alloc(Ast::Char(c))
            }
        })
    }

    /// `{directive}` (§4.2), called with `self.ch` already past the `{`.
    fn parse_directive(&mut self) -> Result<&'a Ast<'a>> {
        if !self.more() {
            return Err(Error::BadDirective);
        }
        let mut neg = false;
        if self.ch == '^' as Scalar {
            self.advance();
            neg = true;
        }

        let saved_cur = self.cur;
        let saved_ch = self.ch;
        let word = self.gather_word(Error::BadDirective)?;

        let node = match word.as_str() {
            "line-start" => self.alloc(if neg { Ast::NBol } else { Ast::Bol }),
            "line-end" => self.alloc(if neg { Ast::NEol } else { Ast::Eol }),
            "input-start" => self.alloc(if neg { Ast::NBot } else { Ast::Bot }),
            "input-end" => self.alloc(if neg { Ast::NEot } else { Ast::Eot }),
            "word-break" => self.alloc(if neg { Ast::NWbnd } else { Ast::Wbnd }),
            "any" => self.alloc(if neg { Ast::None } else { Ast::Any }),
            "digit" => self.alloc(Ast::Set(negate_if(unicode::digit().clone(), neg))),
            "word" => self.alloc(Ast::Set(negate_if(unicode::word().clone(), neg))),
            "space" => self.alloc(Ast::Set(negate_if(unicode::space().clone(), neg))),
            "vspace" => self.alloc(Ast::Set(negate_if(unicode::vspace().clone(), neg))),
            "hspace" => self.alloc(Ast::Set(negate_if(unicode::hspace().clone(), neg))),
            "open-brace" => self.alloc(Ast::Set(negate_if(unicode::opener().clone(), neg))),
            "close-brace" => self.alloc(Ast::Set(negate_if(unicode::closer().clone(), neg))),
            "=" | "ref" => {
                let name = self.gather_word(Error::BadDirective)?;
                let idx = self.groups.lookup_or_insert(&name, false);
                self.alloc(if neg { Ast::NBRef(idx) } else { Ast::BRef(idx) })
            }
            ":" | "ref-braced" => {
                let name = self.gather_word(Error::BadDirective)?;
                let idx = self.groups.lookup_or_insert(&name, false);
                self.alloc(if neg { Ast::NQRef(idx) } else { Ast::QRef(idx) })
            }
            "/" | "call" => {
                let name = self.gather_word(Error::BadDirective)?;
                let idx = self.procs.lookup_or_insert(&name);
                self.alloc(if neg { Ast::NProc(idx) } else { Ast::Proc(idx) })
            }
            _ => {
                // Not a recognized keyword: rewind to before the scan and
                // treat the brace body as a raw Unicode property pattern
                // (§4.2 "directive-vs-property fallback").
                self.cur = saved_cur;
                self.ch = saved_ch;
                let mut name = String::new();
                loop {
                    if !self.more() {
                        return Err(Error::BadDirective);
                    }
                    if self.ch == '}' as Scalar {
                        break;
                    }
                    name.push(scalar_to_char(self.ch));
                    self.advance();
                }
                let set = unicode::property_class(&name)?;
                self.alloc(Ast::Set(if neg { set.complement() } else { set }))
            }
        };

        if self.skip_spaces() && self.ch == '}' as Scalar {
            self.advance();
        } else {
            return Err(Error::MissingBrace);
        }
        Ok(node)
    }

    /// One element of a `[...]` bracket expression (§4.2 set algebra).
    /// Returns `None` at a structural character (`]`, `-`, `&`, `~`, `[`)
    /// or end of input, distinguishing "found nothing" from "found
    /// `Ast::Empty`" (which can't happen here: every arm that succeeds
    /// yields a `Char` or `Set`).
    fn parse_setchar(&mut self) -> Result<Option<&'a Ast<'a>>> {
        if !self.skip_spaces() {
            return Ok(None);
        }
        if self.ch == '\\' as Scalar {
            self.advance();
            return Ok(Some(self.parse_escape()?));
        }
        if self.ch == '{' as Scalar {
            self.advance();
            return Ok(Some(self.parse_directive()?));
        }
        if self.ch == 0
            || self.ch >= 0x80
            || !"[]-&~".contains(scalar_to_char(self.ch))
        {
            let c = self.ch;
            self.advance();
            return Ok(Some(self.alloc(Ast::Char(c))));
        }
        Ok(None)
    }

    /// `[...]` (§4.2): union, minus (`-`), intersect (`&`) and symmetric
    /// difference (`~`) of ranges, escapes, directives and nested sets.
    fn parse_bracket(&mut self) -> Result<&'a Ast<'a>> {
        let mut set = CharSet::empty();
        let mut neg = false;
        let mut min: Option<Scalar> = None;

        if self.skip_spaces() && self.ch == '^' as Scalar {
            self.advance();
            neg = true;
        }

        loop {
            if let Some(node) = self.parse_setchar()? {
                match node {
                    Ast::Char(c) => {
                        set.add(*c);
                        min = Some(*c);
                        continue;
                    }
                    Ast::Set(s) => {
                        set.add_all(s);
                        min = None;
                        continue;
                    }
                    _ => return Err(Error::BadSet),
                }
            }
            if !self.more() || self.ch == ']' as Scalar {
                break;
            }

            // Here self.ch is one of '&' '~' '-' '['.
            let op;
            let rhs;
            if self.ch == '[' as Scalar {
                op = '|';
                rhs = None;
            } else {
                op = scalar_to_char(self.ch);
                self.advance();
                rhs = self.parse_setchar()?;
            }
            let rhs = match rhs {
                Some(n) => n,
                None => {
                    if self.more() && self.ch == '[' as Scalar {
                        self.advance();
                        self.parse_bracket()?
                    } else {
                        return Err(Error::BadSet);
                    }
                }
            };
            match rhs {
                Ast::Char(c) => {
                    if op == '-' {
                        match min {
                            Some(lo) => set.add_range(lo as u32, *c as u32),
                            None => return Err(Error::BadSet),
                        }
                    } else {
                        return Err(Error::BadSet);
                    }
                }
                Ast::Set(s) => {
                    set = match op {
                        '-' => set.difference(s),
                        '~' => set.symmetric_difference(s),
                        '&' => set.intersect(s),
                        '|' => set.union(s),
                        _ => return Err(Error::BadSet),
                    };
                }
                _ => return Err(Error::BadSet),
            }
            min = None;
        }

        if neg {
            set = set.complement();
        }
        if self.skip_spaces() && self.ch == ']' as Scalar {
            self.advance();
        } else {
            return Err(Error::MissingBracket);
        }
        Ok(self.alloc(Ast::Set(set)))
    }

    fn close_paren(&mut self, node: &'a Ast<'a>) -> Result<&'a Ast<'a>> {
        if self.skip_spaces() && self.ch == ')' as Scalar {
            self.advance();
            Ok(node)
        } else {
            Err(Error::MissingParen)
        }
    }

    /// `(...)` (§4.3/§4.4), called with `self.ch` already past the `(`.
    /// Dispatches on what follows a leading `?`: lookaround, a procedure
    /// definition `(?/name:...)`, a conditional `(??...)`, or a plain
    /// named group.
    fn parse_paren(&mut self) -> Result<&'a Ast<'a>> {
        if !self.more() {
            return Err(Error::BadGroup);
        }

        if self.ch != '?' as Scalar {
            let body = self.parse_alt()?;
            return self.close_paren(body);
        }
        self.advance();
        if !self.more() {
            return Err(Error::BadGroup);
        }

        if self.ch == '=' as Scalar {
            self.advance();
            let body = self.parse_alt()?;
            let node = self.alloc(Ast::LookA(body));
            return self.close_paren(node);
        }
        if self.ch == '!' as Scalar {
            self.advance();
            let body = self.parse_alt()?;
            let node = self.alloc(Ast::NLookA(body));
            return self.close_paren(node);
        }
        if self.ch == '<' as Scalar {
            self.advance();
            if !self.more() {
                return Err(Error::BadGroup);
            }
            if self.ch == '=' as Scalar {
                self.advance();
                let body = self.parse_alt()?;
                let node = self.alloc(Ast::LookB(body));
                return self.close_paren(node);
            }
            if self.ch == '!' as Scalar {
                self.advance();
                let body = self.parse_alt()?;
                let node = self.alloc(Ast::NLookB(body));
                return self.close_paren(node);
            }
            return Err(Error::BadGroup);
        }
        if self.ch == '/' as Scalar {
            // (?/name:expr) defines a named procedure and parsing resumes
            // on whatever single follows the closing paren (§4.3): the
            // definition itself isn't a term in the surrounding concat.
            self.advance();
            if !self.more() {
                return Err(Error::BadGroup);
            }
            let name = self.gather(':', Error::BadName)?;
            let body = self.parse_alt()?;
            self.procs.define(&name, body)?;
            if self.skip_spaces() && self.ch == ')' as Scalar {
                self.advance();
            } else {
                return Err(Error::MissingParen);
            }
            return self.parse_single();
        }
        if self.ch == '?' as Scalar {
            // (??[!]guard then|else) (§4.4).
            self.advance();
            if !self.more() {
                return Err(Error::BadGroup);
            }
            let mut neg = false;
            if self.ch == '!' as Scalar {
                neg = true;
                self.advance();
                if !self.more() {
                    return Err(Error::BadGroup);
                }
            }
            let guard = self.parse_single()?;
            let guard_idx = self.procs.define_anonymous(guard);
            let then_branch = self.parse_concat()?;
            let else_branch = if self.more() && self.ch == '|' as Scalar {
                self.advance();
                self.parse_concat()?
            } else {
                self.alloc(Ast::None)
            };
            let (then_branch, else_branch) =
                if neg { (else_branch, then_branch) } else { (then_branch, else_branch) };
            let node = self.alloc(Ast::Cond(guard_idx, then_branch, else_branch));
            return self.close_paren(node);
        }

        // (?name:expr)
        let name = self.gather(':', Error::BadName)?;
        let body = self.parse_alt()?;
        let idx = self.groups.lookup_or_insert(&name, true);
        let node = self.alloc(Ast::Group(idx, body));
        self.close_paren(node)
    }

    /// `single` (§4.2): one atom, with no quantifier applied yet.
    fn parse_single(&mut self) -> Result<&'a Ast<'a>> {
        if self.skip_spaces() {
            if self.ch == '(' as Scalar {
                self.advance();
                return self.parse_paren();
            }
            if self.ch == '[' as Scalar {
                self.advance();
                return self.parse_bracket();
            }
            if self.ch == '.' as Scalar {
                self.advance();
                return Ok(self.alloc(Ast::Any));
            }
            if self.ch == '^' as Scalar {
                self.advance();
                return Ok(self.alloc(Ast::Bol));
            }
            if self.ch == '$' as Scalar {
                self.advance();
                return Ok(self.alloc(Ast::Eol));
            }
            if self.ch == '{' as Scalar {
                self.advance();
                return self.parse_directive();
            }
            if self.ch == '\\' as Scalar {
                self.advance();
                return self.parse_escape();
            }
            if self.ch == 0 || self.ch >= 0x80 || !"*+?|()[]{}".contains(scalar_to_char(self.ch)) {
                let c = self.ch;
                self.advance();
                return Ok(self.alloc(Ast::Char(c)));
            }
        }
        Ok(self.alloc(Ast::Empty))
    }

    /// `repeat` (§4.2): a `single` with an optional `* + ? {n,m}`,
    /// optionally suffixed `?` for a lazy quantifier.
    fn parse_repeat(&mut self) -> Result<&'a Ast<'a>> {
        let node = self.parse_single()?;
        if matches!(node, Ast::Empty) || !self.skip_spaces() {
            return Ok(node);
        }

        if self.ch == '*' as Scalar {
            self.advance();
            let greedy = !(self.more() && self.ch == '?' as Scalar);
            if !greedy {
                self.advance();
            }
            return Ok(self.alloc(Ast::Star(node, greedy)));
        }
        if self.ch == '+' as Scalar {
            self.advance();
            let greedy = !(self.more() && self.ch == '?' as Scalar);
            if !greedy {
                self.advance();
            }
            return Ok(self.alloc(Ast::Plus(node, greedy)));
        }
        if self.ch == '?' as Scalar {
            self.advance();
            let greedy = !(self.more() && self.ch == '?' as Scalar);
            if !greedy {
                self.advance();
            }
            return Ok(self.alloc(Ast::Quest(node, greedy)));
        }
        if self.ch == '{' as Scalar {
            let c = self.peek();
            let looks_like_repeat =
                c == ',' as Scalar || c == '}' as Scalar || unicode::digit().contains(c) || unicode::space().contains(c);
            if looks_like_repeat {
                self.advance();
                let min = self.maybe_int()?;
                let max = if self.skip_spaces() && self.ch == ',' as Scalar {
                    self.advance();
                    self.maybe_int()?
                } else {
                    min
                };
                if self.skip_spaces() && self.ch == '}' as Scalar {
                    self.advance();
                } else {
                    return Err(Error::MissingBrace);
                }
                if max != 0 && min > max {
                    return Err(Error::BadRepeat);
                }
                let greedy = !(self.more() && self.ch == '?' as Scalar);
                if !greedy {
                    self.advance();
                }
                return Ok(self.alloc(Ast::Repeat(node, min, max, greedy)));
            }
        }
        Ok(node)
    }

    /// `concat` (§4.2): a run of `repeat`s.
    fn parse_concat(&mut self) -> Result<&'a Ast<'a>> {
        let mut left = self.parse_repeat()?;
        if !matches!(left, Ast::Empty) {
            while self.more() {
                let right = self.parse_repeat()?;
                if matches!(right, Ast::Empty) {
                    break;
                }
                left = self.alloc(Ast::Cat(left, right));
            }
        }
        Ok(left)
    }

    /// `alt` (§4.2): `concat` separated by `|`.
    fn parse_alt(&mut self) -> Result<&'a Ast<'a>> {
        let mut left = self.parse_concat()?;
        while self.skip_spaces() && self.ch == '|' as Scalar {
            self.advance();
            let right = self.parse_concat()?;
            left = self.alloc(Ast::Alt(left, right));
        }
        Ok(left)
    }
}

fn negate_if(set: CharSet, neg: bool) -> CharSet {
    if neg {
        set.complement()
    } else {
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok<'a>(arena: &'a AstArena<'a>, pat: &str) -> Parsed<'a> {
        let buf = crate::cursor::to_utf16(pat);
        parse(arena, &buf, REP_MAX).unwrap_or_else(|e| panic!("parse({:?}) failed: {:?}", pat, e))
    }

    #[test]
    fn literal_concat() {
        let arena = AstArena::with_capacity(8);
        let p = parse_ok(&arena, "ab");
        assert!(matches!(p.root, Ast::Cat(..)));
    }

    #[test]
    fn alternation_and_star() {
        let arena = AstArena::with_capacity(8);
        let p = parse_ok(&arena, "a*|b");
        assert!(matches!(p.root, Ast::Alt(..)));
    }

    #[test]
    fn named_group_registers_capture() {
        let arena = AstArena::with_capacity(16);
        let p = parse_ok(&arena, "(?word:abc)");
        assert_eq!(p.groups.len(), 2);
        assert_eq!(p.groups.names()[1], "word");
    }

    #[test]
    fn backreference_to_defined_group_is_ok() {
        let arena = AstArena::with_capacity(16);
        let p = parse_ok(&arena, "(?x:a)\\kx;");
        assert!(p.groups.check_all_defined().is_ok());
    }

    #[test]
    fn backreference_without_definition_is_undefined() {
        let arena = AstArena::with_capacity(16);
        let buf = crate::cursor::to_utf16("\\kx;");
        let err = parse(&arena, &buf, REP_MAX).unwrap_err();
        assert_eq!(err, Error::Undefined);
    }

    #[test]
    fn procedure_roundtrip() {
        let arena = AstArena::with_capacity(32);
        let p = parse_ok(&arena, "(?/greet:hi)\\ggreet;");
        assert_eq!(p.procs.len(), 1);
    }

    #[test]
    fn conditional_desugars_to_cond_node() {
        let arena = AstArena::with_capacity(32);
        // A procedure definition's parens are replaced by whatever single
        // follows them (§4.3), so the trailing `z` ends up concatenated
        // after the conditional rather than after the definition.
        let p = parse_ok(&arena, "(??\\ga; b | c)(?/a:x)z");
        match p.root {
            Ast::Cat(l, r) => {
                assert!(matches!(l, Ast::Cond(..)));
                assert!(matches!(r, Ast::Char(_)));
            }
            other => panic!("expected Cat(Cond, Char), got {:?}", std::mem::discriminant(other)),
        }
    }

    #[test]
    fn repeat_bounds_reject_min_greater_than_max() {
        let arena = AstArena::with_capacity(8);
        let buf = crate::cursor::to_utf16("a{5,2}");
        let err = parse(&arena, &buf, REP_MAX).unwrap_err();
        assert_eq!(err, Error::BadRepeat);
    }

    #[test]
    fn unbounded_repeat_has_zero_max() {
        let arena = AstArena::with_capacity(8);
        let p = parse_ok(&arena, "a{3,}");
        assert!(matches!(p.root, Ast::Repeat(_, 3, 0, true)));
    }

    #[test]
    fn lazy_quantifier_is_not_greedy() {
        let arena = AstArena::with_capacity(8);
        let p = parse_ok(&arena, "a*?");
        assert!(matches!(p.root, Ast::Star(_, false)));
    }

    #[test]
    fn quote_backref_directive_form() {
        // The `{:name}` directive is the verbose spelling of `\mname;`
        // (bracket/quote-equal back-reference).
        let arena = AstArena::with_capacity(16);
        let p = parse_ok(&arena, "(?x:[)]){:x}");
        match p.root {
            Ast::Cat(_, r) => assert!(matches!(r, Ast::QRef(_))),
            other => panic!("expected Cat(.., QRef), got {:?}", std::mem::discriminant(other)),
        }
    }

    #[test]
    fn trailing_junk_after_root_alt_is_an_error() {
        let arena = AstArena::with_capacity(8);
        let buf = crate::cursor::to_utf16("a)");
        let err = parse(&arena, &buf, REP_MAX).unwrap_err();
        assert_eq!(err, Error::ExtraJunk);
    }
}
