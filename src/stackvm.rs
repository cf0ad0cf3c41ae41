//! The stack machine: a minimal reverse-Polish calculator
//!
//! Much simpler than the register machine: no labels, no procedures, no
//! fixups. The assembler tokenizes the whole file at once (not line by
//! line, since there is nothing here that depends on line structure) and
//! maps each token independently to an instruction; a trailing `HALT` is
//! appended unconditionally. Instructions are a fixed 4 bytes: a 2-byte
//! opcode followed by a 2-byte data field, both little-endian.

use crate::lexer;
use std::fmt;

pub const MEMORY_CELLS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Opcode {
    Nop = 0,
    Halt = 1,
    Alert = 2,
    Push = 3,
    Add = 4,
    Sub = 5,
    Mul = 6,
    Div = 7,
}

impl Opcode {
    fn from_u16(value: u16) -> Opcode {
        match value {
            1 => Opcode::Halt,
            2 => Opcode::Alert,
            3 => Opcode::Push,
            4 => Opcode::Add,
            5 => Opcode::Sub,
            6 => Opcode::Mul,
            7 => Opcode::Div,
            _ => Opcode::Nop,
        }
    }
}

/// An instruction token the assembler couldn't map to an opcode
#[derive(Debug)]
pub struct InvalidToken {
    pub token: String,
}

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid instruction \"{}\"", self.token)
    }
}

impl std::error::Error for InvalidToken {}

/// Assemble stack-VM source into bytecode
///
/// Unlike the register machine's assembler, a bad token is skipped rather
/// than aborting the whole file, the caller decides what to do with the
/// reported tokens; assembly never fails outright.
pub fn assemble(source: &str) -> (Vec<u8>, Vec<InvalidToken>) {
    let mut code = Vec::new();
    let mut invalid = Vec::new();

    for line in source.lines() {
        for token in lexer::lex_tokens(line) {
            match map_token(&token) {
                Some((opcode, data)) => {
                    code.extend_from_slice(&(opcode as u16).to_le_bytes());
                    code.extend_from_slice(&data.to_le_bytes());
                }
                None => invalid.push(InvalidToken { token }),
            }
        }
    }

    code.extend_from_slice(&(Opcode::Halt as u16).to_le_bytes());
    code.extend_from_slice(&0u16.to_le_bytes());

    (code, invalid)
}

fn map_token(token: &str) -> Option<(Opcode, u16)> {
    match token {
        "+" => Some((Opcode::Add, 0)),
        "-" => Some((Opcode::Sub, 0)),
        "*" => Some((Opcode::Mul, 0)),
        "/" => Some((Opcode::Div, 0)),
        _ => token.parse::<i16>().ok().map(|value| (Opcode::Push, value as u16)),
    }
}

/// Running state of a stack-machine program
pub struct Context {
    memory: Vec<i32>,
    stack_ptr: usize,
    program_ctr: i64,
    running: bool,
}

impl Context {
    pub fn new() -> Context {
        Context {
            memory: vec![0; MEMORY_CELLS],
            stack_ptr: MEMORY_CELLS,
            program_ctr: -1,
            running: false,
        }
    }

    /// Top-of-stack value, if anything has been pushed
    pub fn top(&self) -> Option<i32> {
        if self.stack_ptr < MEMORY_CELLS {
            Some(self.memory[self.stack_ptr])
        } else {
            None
        }
    }

    pub fn run(&mut self, program: &[u8]) {
        self.running = true;
        while self.running {
            self.program_ctr += 1;
            let pc = self.program_ctr as usize;
            if pc * 4 + 4 > program.len() {
                self.running = false;
                break;
            }
            let opcode = u16::from_le_bytes([program[pc * 4], program[pc * 4 + 1]]);
            let data = u16::from_le_bytes([program[pc * 4 + 2], program[pc * 4 + 3]]);
            self.execute(Opcode::from_u16(opcode), data as i16);
        }
    }

    fn push(&mut self, value: i32) {
        self.stack_ptr -= 1;
        self.memory[self.stack_ptr] = value;
    }

    fn execute(&mut self, opcode: Opcode, data: i16) {
        match opcode {
            Opcode::Nop => {}
            Opcode::Alert => {}
            Opcode::Halt => self.running = false,
            Opcode::Push => self.push(data as i32),
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                let top = self.memory[self.stack_ptr] as i16;
                let below = self.memory[self.stack_ptr + 1] as i16;
                let result = match opcode {
                    Opcode::Add => below.wrapping_add(top),
                    Opcode::Sub => below.wrapping_sub(top),
                    Opcode::Mul => below.wrapping_mul(top),
                    Opcode::Div if top != 0 => below.wrapping_div(top),
                    _ => 0,
                };
                self.memory[self.stack_ptr + 1] = result as i32;
                self.stack_ptr += 1;
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}
