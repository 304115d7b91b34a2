//! Arithmetic expression evaluator behind the `calculate` tool.
//!
//! Grammar (loosest binding first):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '//' | '%') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('**' unary)?
//! primary := number | name | name '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! `^`, `×` and `÷` are accepted as `**`, `*` and `/`. Integers stay
//! integers until an operation needs a float (`/`, a float operand, a
//! negative exponent, overflow), so `2**10` prints `1024` and `7/2`
//! prints `3.5`.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("{name}() takes {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("math domain error")]
    Domain,
}

/// A computed value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            // Debug keeps the trailing ".0" on whole floats
            Number::Float(x) => write!(f, "{:?}", x),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Pow,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::Num(n) => return write!(f, "{}", n),
            Token::Ident(name) => return write!(f, "{}", name),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::DoubleSlash => "//",
            Token::Percent => "%",
            Token::Pow => "**",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
        };
        f.write_str(s)
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent: 1e3, 2.5E-4
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_number(&text)?));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::Pow);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '×' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '÷' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => return Err(CalcError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

fn parse_number(text: &str) -> Result<Number, CalcError> {
    if !text.contains(['.', 'e', 'E'])
        && let Ok(i) = text.parse::<i64>()
    {
        return Ok(Number::Int(i));
    }
    text.parse::<f64>()
        .map(Number::Float)
        .map_err(|_| CalcError::InvalidNumber(text.to_string()))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), CalcError> {
        match self.next() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(CalcError::UnexpectedToken(t.to_string())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<Number, CalcError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value = add(value, self.term()?);
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value = sub(value, self.term()?);
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<Number, CalcError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value = mul(value, self.unary()?);
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    value = div(value, self.unary()?)?;
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    value = floor_div(value, self.unary()?)?;
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    value = modulo(value, self.unary()?)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<Number, CalcError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(neg(self.unary()?))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Number, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return pow(base, exponent);
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Number, CalcError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let mut args = vec![self.expr()?];
                    while self.peek() == Some(&Token::Comma) {
                        self.pos += 1;
                        args.push(self.expr()?);
                    }
                    self.expect(Token::RParen)?;
                    call(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(t) => Err(CalcError::UnexpectedToken(t.to_string())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

fn float(x: f64) -> Result<Number, CalcError> {
    if x.is_nan() {
        Err(CalcError::Domain)
    } else {
        Ok(Number::Float(x))
    }
}

fn add(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x
            .checked_add(y)
            .map(Number::Int)
            .unwrap_or(Number::Float(x as f64 + y as f64)),
        _ => Number::Float(a.as_f64() + b.as_f64()),
    }
}

fn sub(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x
            .checked_sub(y)
            .map(Number::Int)
            .unwrap_or(Number::Float(x as f64 - y as f64)),
        _ => Number::Float(a.as_f64() - b.as_f64()),
    }
}

fn mul(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x
            .checked_mul(y)
            .map(Number::Int)
            .unwrap_or(Number::Float(x as f64 * y as f64)),
        _ => Number::Float(a.as_f64() * b.as_f64()),
    }
}

fn div(a: Number, b: Number) -> Result<Number, CalcError> {
    if b.is_zero() {
        return Err(CalcError::DivisionByZero);
    }
    Ok(Number::Float(a.as_f64() / b.as_f64()))
}

fn floor_div(a: Number, b: Number) -> Result<Number, CalcError> {
    if b.is_zero() {
        return Err(CalcError::DivisionByZero);
    }
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => match (x.checked_div_euclid(y), x.checked_rem_euclid(y)) {
            // div_euclid rounds toward -inf only for positive divisors
            (Some(q), Some(r)) => Ok(Number::Int(if y < 0 && r != 0 { q - 1 } else { q })),
            _ => Ok(Number::Float((x as f64 / y as f64).floor())),
        },
        _ => Ok(Number::Float((a.as_f64() / b.as_f64()).floor())),
    }
}

fn modulo(a: Number, b: Number) -> Result<Number, CalcError> {
    if b.is_zero() {
        return Err(CalcError::DivisionByZero);
    }
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => {
            // Result takes the sign of the divisor
            // checked_rem only fails for i64::MIN % -1, which is 0
            let r = x.checked_rem(y).unwrap_or(0);
            Ok(Number::Int(if r != 0 && (r < 0) != (y < 0) { r + y } else { r }))
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let r = x % y;
            Ok(Number::Float(if r != 0.0 && (r < 0.0) != (y < 0.0) { r + y } else { r }))
        }
    }
}

fn neg(a: Number) -> Number {
    match a {
        Number::Int(x) => x
            .checked_neg()
            .map(Number::Int)
            .unwrap_or(Number::Float(-(x as f64))),
        Number::Float(x) => Number::Float(-x),
    }
}

fn pow(base: Number, exponent: Number) -> Result<Number, CalcError> {
    if let (Number::Int(b), Number::Int(e)) = (base, exponent)
        && e >= 0
    {
        if let Ok(e32) = u32::try_from(e)
            && let Some(v) = b.checked_pow(e32)
        {
            return Ok(Number::Int(v));
        }
        return float((b as f64).powf(e as f64));
    }
    if base.is_zero() && exponent.as_f64() < 0.0 {
        return Err(CalcError::DivisionByZero);
    }
    float(base.as_f64().powf(exponent.as_f64()))
}

fn constant(name: &str) -> Result<Number, CalcError> {
    match name {
        "pi" => Ok(Number::Float(std::f64::consts::PI)),
        "e" => Ok(Number::Float(std::f64::consts::E)),
        "tau" => Ok(Number::Float(std::f64::consts::TAU)),
        "inf" => Ok(Number::Float(f64::INFINITY)),
        _ => Err(CalcError::UnknownIdentifier(name.to_string())),
    }
}

fn to_int(x: f64) -> Result<Number, CalcError> {
    if x.is_finite() && x.abs() < i64::MAX as f64 {
        Ok(Number::Int(x as i64))
    } else {
        Err(CalcError::Domain)
    }
}

fn call(name: &str, args: &[Number]) -> Result<Number, CalcError> {
    let one = |args: &[Number]| -> Result<f64, CalcError> {
        match args {
            [x] => Ok(x.as_f64()),
            _ => Err(CalcError::Arity {
                name: name.to_string(),
                expected: "1",
                got: args.len(),
            }),
        }
    };

    match name {
        "sqrt" => {
            let x = one(args)?;
            if x < 0.0 {
                return Err(CalcError::Domain);
            }
            float(x.sqrt())
        }
        "abs" => match args {
            [Number::Int(i)] => Ok(i
                .checked_abs()
                .map(Number::Int)
                .unwrap_or(Number::Float((*i as f64).abs()))),
            _ => float(one(args)?.abs()),
        },
        "sin" => float(one(args)?.sin()),
        "cos" => float(one(args)?.cos()),
        "tan" => float(one(args)?.tan()),
        "exp" => float(one(args)?.exp()),
        "ln" => {
            let x = one(args)?;
            if x <= 0.0 {
                return Err(CalcError::Domain);
            }
            float(x.ln())
        }
        "log" => match args {
            [x] if x.as_f64() > 0.0 => float(x.as_f64().ln()),
            [x, base] if x.as_f64() > 0.0 && base.as_f64() > 0.0 && base.as_f64() != 1.0 => {
                float(x.as_f64().ln() / base.as_f64().ln())
            }
            [_] | [_, _] => Err(CalcError::Domain),
            _ => Err(CalcError::Arity {
                name: name.to_string(),
                expected: "1 or 2",
                got: args.len(),
            }),
        },
        "log10" => {
            let x = one(args)?;
            if x <= 0.0 {
                return Err(CalcError::Domain);
            }
            float(x.log10())
        }
        "floor" => match args {
            [Number::Int(i)] => Ok(Number::Int(*i)),
            _ => to_int(one(args)?.floor()),
        },
        "ceil" => match args {
            [Number::Int(i)] => Ok(Number::Int(*i)),
            _ => to_int(one(args)?.ceil()),
        },
        "round" => match args {
            [Number::Int(i)] => Ok(Number::Int(*i)),
            // Banker's rounding, like Python's round()
            _ => to_int(one(args)?.round_ties_even()),
        },
        _ => Err(CalcError::UnknownIdentifier(name.to_string())),
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<Number, CalcError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::UnexpectedEnd);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    match parser.next() {
        None => Ok(value),
        Some(t) => Err(CalcError::UnexpectedToken(t.to_string())),
    }
}
