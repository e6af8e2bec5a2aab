//! `?` templates.
//!
//! A template is one or more `field op ?` comparisons joined by `&&`/`||`
//! (or `AND`/`OR`), with parentheses for grouping. Backend spelling
//! (`price:>?`) is accepted too. `&&` binds tighter than `||`. Every clause
//! becomes a typed node through [`Parser::comparison`], so its field is
//! validated like a field map key.

use std::slice;
use std::sync::LazyLock;

use regex::Regex;

use quarry_core::ast::{self, Node};
use quarry_core::sanitize::{Bind, count_placeholders};
use quarry_core::{Error, Result};

use super::parser::Parser;

static CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*([A-Za-z_$][\w.]*)\s*(?:(?::\s*)?(>=|<=|!=|>|<|=)|\s(NOT\s+IN|IN|MATCHES|PREFIX))\s*\?\s*$",
    )
    .expect("clause pattern is valid")
});

static CONNECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(|\)|&&|\|\||\bAND\b|\bOR\b").expect("connective pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'t> {
    Open,
    Close,
    And,
    Or,
    Clause(&'t str),
}

fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in CONNECTIVE.find_iter(template) {
        let text = &template[last..m.start()];
        if !text.trim().is_empty() {
            tokens.push(Token::Clause(text));
        }
        tokens.push(match m.as_str() {
            "(" => Token::Open,
            ")" => Token::Close,
            "&&" => Token::And,
            "||" => Token::Or,
            s if s.eq_ignore_ascii_case("and") => Token::And,
            _ => Token::Or,
        });
        last = m.end();
    }
    let rest = &template[last..];
    if !rest.trim().is_empty() {
        tokens.push(Token::Clause(rest));
    }
    tokens
}

/// Parse `template` into one node, consuming one bind per clause.
pub(super) fn parse(parser: &Parser<'_>, template: &str, binds: &[Bind]) -> Result<Node> {
    let found = count_placeholders(template);
    if found != binds.len() {
        return Err(Error::PlaceholderMismatch {
            template: template.to_owned(),
            expected: binds.len(),
            found,
        });
    }
    let mut expr = Expr {
        parser,
        template,
        tokens: tokenize(template),
        pos: 0,
        binds: binds.iter(),
    };
    let node = expr.or_expr()?;
    if expr.pos < expr.tokens.len() {
        return Err(expr.unsupported("unbalanced parentheses"));
    }
    Ok(node)
}

struct Expr<'p, 'a> {
    parser: &'p Parser<'a>,
    template: &'p str,
    tokens: Vec<Token<'p>>,
    pos: usize,
    binds: slice::Iter<'p, Bind>,
}

impl<'p> Expr<'p, '_> {
    fn unsupported(&self, detail: &str) -> Error {
        Error::UnsupportedInput(format!("template `{}`: {detail}", self.template))
    }

    fn eat(&mut self, token: Token<'p>) -> bool {
        if self.tokens.get(self.pos) == Some(&token) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn or_expr(&mut self) -> Result<Node> {
        let mut children = vec![self.and_expr()?];
        while self.eat(Token::Or) {
            children.push(self.and_expr()?);
        }
        combine(children, ast::or)
    }

    fn and_expr(&mut self) -> Result<Node> {
        let mut children = vec![self.primary()?];
        while self.eat(Token::And) {
            children.push(self.primary()?);
        }
        combine(children, ast::and)
    }

    fn primary(&mut self) -> Result<Node> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        match token {
            Some(Token::Open) => {
                let node = self.or_expr()?;
                if !self.eat(Token::Close) {
                    return Err(self.unsupported("unbalanced parentheses"));
                }
                Ok(node)
            }
            Some(Token::Clause(text)) => self.clause(text),
            _ => Err(self.unsupported("expected a `field op ?` comparison")),
        }
    }

    fn clause(&mut self, text: &str) -> Result<Node> {
        let Some(caps) = CLAUSE.captures(text) else {
            return Err(self.unsupported(&format!(
                "`{}` is not a `field op ?` comparison",
                text.trim()
            )));
        };
        let keyword = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        let Some(bind) = self.binds.next() else {
            return Err(Error::PlaceholderMismatch {
                template: self.template.to_owned(),
                expected: self.binds.len(),
                found: count_placeholders(self.template),
            });
        };
        self.parser.comparison(&caps[1], keyword, bind)
    }
}

fn combine(mut children: Vec<Node>, join: impl FnOnce(Vec<Node>) -> Result<Node>) -> Result<Node> {
    if children.len() == 1 {
        return Ok(children.remove(0));
    }
    join(children)
}
