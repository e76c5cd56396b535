//! Query text parsing.
//!
//! Turns the textual query surface into the abstract [`Query`] the
//! matcher pipeline consumes. The grammar covers four query forms:
//!
//! - `name : signature` and bare name patterns (`Seq.map`, `*fold*`)
//! - bare signatures (`'a list -> int`, `seq<'a> -> 'a`)
//! - active patterns (`(||) : ... -> 'a -> bool`, `(|_|) : sig`)
//! - computation expressions (`{ let!; return } : async<'a>`)
//!
//! Name segments support `*`/`?` globs compiled to anchored regexes;
//! signature syntax supports variables (`'a`), statically resolved
//! variables (`^a`), wildcards (`?`, `?tag`), arrows, tuples
//! (`a * b`, `struct (a * b)`), generic application (`Map<'k, 'v>`)
//! and postfix application (`'a list`).

use regex::Regex;

use crate::models::{
    ActivePatternKind, ActivePatternQuery, ActivePatternSignature, ByNameItem,
    ComputationExpressionQuery, LowType, NameItem, NameMatchMethod, Query, QueryMethod,
    SearchError, SignaturePart, TypeVariable, VariableSource,
};

/// Parse a raw query string.
pub fn parse_query(text: &str) -> Result<Query, SearchError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(parse_error(text, "query is empty"));
    }

    let method = if trimmed.starts_with("(|") {
        parse_active_pattern(trimmed)?
    } else if trimmed.starts_with('{') {
        parse_computation_expression(trimmed)?
    } else if let Some((name, signature)) = trimmed.split_once(':') {
        let items = parse_name_part(name.trim(), trimmed)?;
        QueryMethod::ByName(items, parse_signature_part(signature.trim(), trimmed)?)
    } else if trimmed == "_" {
        QueryMethod::BySignature(SignaturePart::Wildcard)
    } else if looks_like_signature(trimmed) {
        QueryMethod::BySignature(SignaturePart::Signature(parse_signature(trimmed, trimmed)?))
    } else {
        QueryMethod::ByName(parse_name_part(trimmed, trimmed)?, SignaturePart::Wildcard)
    };

    Ok(Query {
        original_string: trimmed.to_string(),
        method,
    })
}

fn parse_error(query: &str, detail: impl Into<String>) -> SearchError {
    SearchError::ParseError {
        query: query.trim().to_string(),
        detail: detail.into(),
    }
}

/// A bare query is a signature rather than a name pattern when it
/// uses arrows, variables, holes, tuples, or grouping.
fn looks_like_signature(text: &str) -> bool {
    text.contains("->")
        || text.starts_with('\'')
        || text.starts_with('^')
        || text.starts_with('?')
        || text.starts_with('(')
        || text.starts_with("struct ")
        || text.contains(" * ")
}

fn parse_signature_part(text: &str, query: &str) -> Result<SignaturePart, SearchError> {
    if text == "_" {
        Ok(SignaturePart::Wildcard)
    } else {
        Ok(SignaturePart::Signature(parse_signature(text, query)?))
    }
}

fn parse_active_pattern(text: &str) -> Result<QueryMethod, SearchError> {
    let (name, rest) = text
        .split_once(':')
        .ok_or_else(|| parse_error(text, "active-pattern query needs `: signature`"))?;
    let kind = match name.trim() {
        "(||)" => ActivePatternKind::Full,
        "(|_|)" => ActivePatternKind::Partial,
        other => {
            return Err(parse_error(
                text,
                format!("unknown active-pattern form `{other}`"),
            ))
        }
    };

    let tokens = tokenize(rest.trim(), text)?;
    let mut parser = SignatureParser::new(tokens, text);
    let signature = if parser.eat(&Token::Ellipsis) {
        parser.expect(&Token::Arrow)?;
        let shape = parser.parse_arrow()?;
        parser.expect_end()?;
        match shape {
            LowType::Arrow(elements) if elements.len() == 2 => {
                let mut iter = elements.into_iter();
                let argument = iter.next().expect("argument");
                let result = iter.next().expect("result");
                ActivePatternSignature::AnyParameter(argument, result)
            }
            _ => {
                return Err(parse_error(
                    text,
                    "the any-parameter form takes exactly an argument and a result",
                ))
            }
        }
    } else {
        let shape = parser.parse_arrow()?;
        parser.expect_end()?;
        ActivePatternSignature::Specified(shape)
    };
    Ok(QueryMethod::ByActivePattern(ActivePatternQuery {
        kind,
        signature,
    }))
}

fn parse_computation_expression(text: &str) -> Result<QueryMethod, SearchError> {
    let close = text
        .find('}')
        .ok_or_else(|| parse_error(text, "unterminated `{` in computation-expression query"))?;
    let syntaxes: Vec<String> = text[1..close]
        .split([';', ','])
        .flat_map(|chunk| chunk.split_whitespace())
        .map(|word| word.to_string())
        .collect();
    let rest = text[close + 1..].trim();
    let body = rest
        .strip_prefix(':')
        .ok_or_else(|| parse_error(text, "computation-expression query needs `: type`"))?;
    let low_type = parse_signature(body.trim(), text)?;
    Ok(QueryMethod::ByComputationExpression(
        ComputationExpressionQuery { syntaxes, low_type },
    ))
}

/// Parse the dotted name half of a `ByName` query into innermost-first
/// items.
fn parse_name_part(text: &str, query: &str) -> Result<Vec<ByNameItem>, SearchError> {
    if text.is_empty() {
        return Err(parse_error(query, "name pattern is empty"));
    }
    let mut items = Vec::new();
    for raw_segment in text.split('.') {
        let segment = raw_segment.trim();
        if segment.is_empty() {
            return Err(parse_error(query, "empty name segment"));
        }
        items.push(parse_name_segment(segment, query)?);
    }
    items.reverse();
    Ok(items)
}

fn parse_name_segment(segment: &str, query: &str) -> Result<ByNameItem, SearchError> {
    let (body, generic_parameters) = match segment.split_once('<') {
        Some((body, generics)) => {
            let generics = generics
                .strip_suffix('>')
                .ok_or_else(|| parse_error(query, "unterminated `<` in name pattern"))?;
            let names: Vec<String> = generics
                .split(',')
                .map(|g| g.trim().trim_start_matches('\'').to_string())
                .filter(|g| !g.is_empty())
                .collect();
            (body.trim(), names)
        }
        None => (segment, Vec::new()),
    };

    // Operator queries come wrapped in parentheses: `(+)`.
    let body = body
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(body);
    if body.is_empty() {
        return Err(parse_error(query, "empty name segment"));
    }

    let match_method = if body == "*" {
        NameMatchMethod::Any
    } else if body.contains('*') || body.contains('?') {
        NameMatchMethod::Regex(glob_regex(body, query)?)
    } else {
        NameMatchMethod::StringCompare(body.to_string())
    };
    Ok(ByNameItem {
        expected: body.to_string(),
        generic_parameters,
        match_method,
    })
}

/// Compile a `*`/`?` glob into an anchored regex.
fn glob_regex(pattern: &str, query: &str) -> Result<Regex, SearchError> {
    let mut built = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => built.push_str(".*"),
            '?' => built.push('.'),
            other => built.push_str(&regex::escape(&other.to_string())),
        }
    }
    built.push('$');
    Regex::new(&built).map_err(|err| parse_error(query, format!("bad name pattern: {err}")))
}

/// Parse a complete signature and enforce the structural invariants.
pub fn parse_signature(text: &str, query: &str) -> Result<LowType, SearchError> {
    let tokens = tokenize(text, query)?;
    let mut parser = SignatureParser::new(tokens, query);
    let low_type = parser.parse_arrow()?;
    parser.expect_end()?;
    low_type.validate()?;
    Ok(low_type)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Variable(String),
    StaticVariable(String),
    Wildcard(Option<String>),
    Arrow,
    Star,
    Lt,
    Gt,
    LParen,
    RParen,
    Comma,
    Dot,
    Ellipsis,
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn tokenize(text: &str, query: &str) -> Result<Vec<Token>, SearchError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '-' => {
                chars.next();
                if chars.next() != Some('>') {
                    return Err(parse_error(query, "expected `->`"));
                }
                tokens.push(Token::Arrow);
            }
            '.' => {
                chars.next();
                if chars.peek() == Some(&'.') {
                    chars.next();
                    if chars.next() != Some('.') {
                        return Err(parse_error(query, "expected `...`"));
                    }
                    tokens.push(Token::Ellipsis);
                } else {
                    tokens.push(Token::Dot);
                }
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '<' => {
                chars.next();
                tokens.push(Token::Lt);
            }
            '>' => {
                chars.next();
                tokens.push(Token::Gt);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '\'' => {
                chars.next();
                let name = take_ident(&mut chars);
                if name.is_empty() {
                    return Err(parse_error(query, "expected a variable name after `'`"));
                }
                tokens.push(Token::Variable(name));
            }
            '^' => {
                chars.next();
                let name = take_ident(&mut chars);
                if name.is_empty() {
                    return Err(parse_error(query, "expected a variable name after `^`"));
                }
                tokens.push(Token::StaticVariable(name));
            }
            '?' => {
                chars.next();
                let tag = take_ident(&mut chars);
                tokens.push(Token::Wildcard(if tag.is_empty() { None } else { Some(tag) }));
            }
            c if is_ident_start(c) => {
                let name = take_ident(&mut chars);
                tokens.push(Token::Ident(name));
            }
            other => {
                return Err(parse_error(
                    query,
                    format!("unexpected character `{other}` in signature"),
                ))
            }
        }
    }
    Ok(tokens)
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut name = String::new();
    while let Some(&ch) = chars.peek() {
        if (name.is_empty() && is_ident_start(ch)) || (!name.is_empty() && is_ident_char(ch)) {
            name.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    name
}

struct SignatureParser<'q> {
    tokens: Vec<Token>,
    position: usize,
    query: &'q str,
}

impl<'q> SignatureParser<'q> {
    fn new(tokens: Vec<Token>, query: &'q str) -> Self {
        SignatureParser {
            tokens,
            position: 0,
            query,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), SearchError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(parse_error(
                self.query,
                format!("expected {token:?}, found {:?}", self.peek()),
            ))
        }
    }

    fn expect_end(&self) -> Result<(), SearchError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(parse_error(
                self.query,
                format!("unexpected trailing {token:?}"),
            )),
        }
    }

    fn parse_arrow(&mut self) -> Result<LowType, SearchError> {
        let mut elements = vec![self.parse_tuple()?];
        while self.eat(&Token::Arrow) {
            elements.push(self.parse_tuple()?);
        }
        Ok(if elements.len() == 1 {
            elements.pop().expect("single element")
        } else {
            LowType::Arrow(elements)
        })
    }

    fn parse_tuple(&mut self) -> Result<LowType, SearchError> {
        let mut elements = vec![self.parse_application()?];
        while self.eat(&Token::Star) {
            elements.push(self.parse_application()?);
        }
        Ok(if elements.len() == 1 {
            elements.pop().expect("single element")
        } else {
            LowType::Tuple {
                elements,
                is_struct: false,
            }
        })
    }

    /// Postfix application: `'a list`, `int seq option`.
    fn parse_application(&mut self) -> Result<LowType, SearchError> {
        let mut low_type = self.parse_atom()?;
        while let Some(Token::Ident(_)) = self.peek() {
            let name = self.parse_dotted_name()?;
            low_type = LowType::Generic(
                Box::new(partial_identity(name, 1)),
                vec![low_type],
            );
        }
        Ok(low_type)
    }

    fn parse_atom(&mut self) -> Result<LowType, SearchError> {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == "struct") {
            self.advance();
            self.expect(&Token::LParen)?;
            let inner = self.parse_arrow()?;
            self.expect(&Token::RParen)?;
            return match inner {
                LowType::Tuple { elements, .. } => Ok(LowType::Tuple {
                    elements,
                    is_struct: true,
                }),
                _ => Err(parse_error(self.query, "`struct` expects a tuple")),
            };
        }
        if matches!(self.peek(), Some(Token::Ident(_))) {
            let name = self.parse_dotted_name()?;
            if self.eat(&Token::Lt) {
                let mut args = vec![self.parse_arrow()?];
                while self.eat(&Token::Comma) {
                    args.push(self.parse_arrow()?);
                }
                self.expect(&Token::Gt)?;
                return Ok(LowType::Generic(
                    Box::new(partial_identity(name, args.len())),
                    args,
                ));
            }
            return Ok(partial_identity(name, 0));
        }
        match self.advance() {
            Some(Token::Variable(name)) => Ok(LowType::Variable(
                VariableSource::Query,
                TypeVariable::new(name),
            )),
            Some(Token::StaticVariable(name)) => Ok(LowType::Variable(
                VariableSource::Query,
                TypeVariable {
                    name,
                    is_solve_at_compile_time: true,
                },
            )),
            Some(Token::Wildcard(tag)) => Ok(LowType::Wildcard(tag)),
            Some(Token::LParen) => self.parse_group(),
            other => Err(parse_error(
                self.query,
                format!("expected a type, found {other:?}"),
            )),
        }
    }

    /// `( ... )`: grouping, or a comma-separated argument list for a
    /// postfix constructor (`('k, 'v) Map`).
    fn parse_group(&mut self) -> Result<LowType, SearchError> {
        let first = self.parse_arrow()?;
        if !self.eat(&Token::Comma) {
            self.expect(&Token::RParen)?;
            return Ok(first);
        }
        let mut args = vec![first, self.parse_arrow()?];
        while self.eat(&Token::Comma) {
            args.push(self.parse_arrow()?);
        }
        self.expect(&Token::RParen)?;
        let name = self.parse_dotted_name().map_err(|_| {
            parse_error(
                self.query,
                "a parenthesized argument list must be followed by a type constructor",
            )
        })?;
        Ok(LowType::Generic(
            Box::new(partial_identity(name, args.len())),
            args,
        ))
    }

    /// A dotted identifier, returned innermost-first.
    fn parse_dotted_name(&mut self) -> Result<Vec<String>, SearchError> {
        let mut segments = Vec::new();
        loop {
            match self.advance() {
                Some(Token::Ident(name)) => segments.push(name),
                other => {
                    return Err(parse_error(
                        self.query,
                        format!("expected an identifier, found {other:?}"),
                    ))
                }
            }
            if !self.eat(&Token::Dot) {
                break;
            }
        }
        segments.reverse();
        Ok(segments)
    }
}

fn partial_identity(segments: Vec<String>, generic_parameter_count: usize) -> LowType {
    LowType::Identity(Box::new(crate::models::Identity::Partial(
        crate::models::PartialIdentity {
            name: segments.into_iter().map(NameItem::symbol).collect(),
            generic_parameter_count,
        },
    )))
}
