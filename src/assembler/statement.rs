//! [Statement] struct and its utilities
//!
//! A statement is one non-empty, already-tokenized source line: a mnemonic
//! plus its arguments. Parsing helpers live here so the codegen functions in
//! [`crate::assembler::instructions`] read as a grammar table rather than a
//! pile of string munging.

use crate::assembler;
use crate::regvm;

#[derive(Debug, Clone)]
pub struct Statement {
    raw_first_token: String,
    mnemonic: String,
    arguments: Vec<String>,
    line_number: usize,
    line: String,
}

impl Statement {
    pub fn new(tokens: &[String], line_number: usize, line: &str) -> Statement {
        Statement {
            raw_first_token: tokens[0].clone(),
            mnemonic: tokens[0].to_lowercase(),
            arguments: tokens[1..].to_vec(),
            line_number,
            line: line.to_string(),
        }
    }

    /// The lowercased first token, used to dispatch on mnemonic keywords
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// The first token in its original case, the name when this line
    /// defines a label (`NAME :`) or a procedure (`proc NAME`)
    pub fn raw_first_token(&self) -> &str {
        &self.raw_first_token
    }

    pub fn n_arguments(&self) -> usize {
        self.arguments.len()
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn line(&self) -> String {
        self.line.clone()
    }

    pub fn argument(&self, index: usize) -> Result<&str, assembler::Error> {
        self.arguments
            .get(index)
            .map(|s| s.as_str())
            .ok_or_else(|| self.invalid_argument_count(&[index + 1]))
    }

    /// A label-definition line is exactly `NAME :`
    pub fn is_label_definition(&self) -> bool {
        self.arguments.len() == 1 && self.arguments[0] == ":"
    }

    pub fn assert_n_arguments(&self, n: usize) -> Result<(), assembler::Error> {
        if self.n_arguments() != n {
            return Err(self.invalid_argument_count(&[n]));
        }
        Ok(())
    }

    pub fn parse_integer(&self, index: usize) -> Result<i64, assembler::Error> {
        let lexeme = self.argument(index)?;
        lexeme.parse::<i64>().map_err(|_| self.invalid_argument(index))
    }

    pub fn is_integer(lexeme: &str) -> bool {
        let digits = lexeme.strip_prefix(['+', '-']).unwrap_or(lexeme);
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn parse_register(&self, index: usize) -> Result<u8, assembler::Error> {
        let lexeme = self.argument(index)?;
        regvm::register_named(lexeme).ok_or_else(|| self.invalid_argument(index))
    }

    pub fn parse_two_registers(&self) -> Result<(u8, u8), assembler::Error> {
        self.assert_n_arguments(2)?;
        Ok((self.parse_register(0)?, self.parse_register(1)?))
    }

    /// A proc-or-label-or-integer target, as used by `call`, `jmp` and friends
    pub fn argument_kind(&self, index: usize) -> Result<ArgumentKind, assembler::Error> {
        let lexeme = self.argument(index)?;
        if Statement::is_integer(lexeme) {
            Ok(ArgumentKind::Immediate(self.parse_integer(index)?))
        } else if let Some(reg) = regvm::register_named(lexeme) {
            Ok(ArgumentKind::Register(reg))
        } else {
            Ok(ArgumentKind::Symbol(lexeme.to_string()))
        }
    }

    pub fn invalid_argument(&self, index: usize) -> assembler::Error {
        let argument = self
            .arguments
            .get(index)
            .cloned()
            .unwrap_or_else(|| String::from("<missing>"));
        assembler::Error::InvalidArgument {
            argument,
            line_number: self.line_number,
            line: self.line(),
        }
    }

    pub fn invalid_argument_count(&self, expected: &[usize]) -> assembler::Error {
        assembler::Error::InvalidArgumentCount {
            instruction: self.mnemonic.clone(),
            n_arguments: self.n_arguments(),
            expected: expected.to_vec(),
            line_number: self.line_number,
            line: self.line(),
        }
    }
}

/// What a symbolic operand turned out to be once the lexeme was inspected
pub enum ArgumentKind {
    Immediate(i64),
    Register(u8),
    Symbol(String),
}
