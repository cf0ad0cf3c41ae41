//! Converts register-machine assembly into bytecode in a single pass
//!
//! Procedures and labels may be referenced before they are defined: a
//! forward reference reserves an 8-byte slot filled with the sentinel
//! [`regvm::FIXUP_SENTINEL`] and records a fixup, which is patched once the
//! target's address becomes known (at `endp` for labels, at end of file for
//! procedures). Errors never abort assembly, they accumulate in
//! [`Assembler::diagnostics`] and the whole file keeps being processed, but
//! if any diagnostic was raised the assembler returns no bytecode at all.
//!
//! The grammar is a one-token dispatch: the first token of a non-empty
//! line selects a rule in [`instructions::dispatch`]. Mnemonics are
//! case-insensitive; label and procedure names are not.

pub mod instructions;
pub mod statement;

use crate::lexer;
use crate::regvm::{self, FIXUP_SENTINEL};
use statement::Statement;
use std::collections::HashMap;
use std::{fmt, fs};

/// The address of an instruction in the bytecode
pub type OpcodeAddress = u64;

/// Maps a procedure or label name to its resolved address
pub type SymbolTable = HashMap<String, OpcodeAddress>;

/// Pending patch sites for names not yet resolved, keyed by name
type FixupTable = HashMap<String, Vec<usize>>;

/// Assemble a register-machine source file into a vector of bytes
pub fn assemble_from_file(path: &str) -> Result<Vec<u8>, Vec<Error>> {
    let source = fs::read_to_string(path)
        .map_err(|_| vec![Error::ReadError { path: path.to_string() }])?;
    assemble(&source)
}

/// Assemble register-machine source code into a vector of bytes
pub fn assemble(source: &str) -> Result<Vec<u8>, Vec<Error>> {
    let mut asm = Assembler::new();
    for (line_index, line) in source.lines().enumerate() {
        let line_number = line_index + 1;
        let tokens = lexer::lex_tokens(line);
        if tokens.is_empty() {
            continue;
        }
        let statement = Statement::new(&tokens, line_number, line);
        if let Err(error) = instructions::dispatch(&mut asm, &statement) {
            asm.diagnostics.push(error);
        }
    }
    asm.finish()
}

struct Assembler {
    code: Vec<u8>,
    procs: SymbolTable,
    labels: SymbolTable,
    proc_fixups: FixupTable,
    label_fixups: FixupTable,
    current_proc: Option<String>,
    diagnostics: Vec<Error>,
}

impl Assembler {
    fn new() -> Assembler {
        let mut asm = Assembler {
            code: Vec::new(),
            procs: HashMap::new(),
            labels: HashMap::new(),
            proc_fixups: HashMap::new(),
            label_fixups: HashMap::new(),
            current_proc: None,
            diagnostics: Vec::new(),
        };
        asm.emit_preamble();
        asm
    }

    /// `CALLI <main>; HALT`, every program starts by calling `main` and
    /// halts cleanly if it ever returns.
    fn emit_preamble(&mut self) {
        self.append_u8(regvm::Opcode::Calli as u8);
        let offset = self.code.len();
        self.append_u64(FIXUP_SENTINEL);
        self.proc_fixups
            .entry("main".to_string())
            .or_default()
            .push(offset);
        self.append_u8(regvm::Opcode::Halt as u8);
    }

    fn append_u8(&mut self, value: u8) {
        self.code.push(value);
    }

    fn append_u64(&mut self, value: u64) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    fn patch_u64(&mut self, offset: usize, value: u64) {
        self.code[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    fn begin_proc(&mut self, name: &str) {
        let addr = self.code.len() as u64;
        self.procs.entry(name.to_string()).or_insert(addr);
        self.current_proc = Some(name.to_string());
    }

    fn end_proc(&mut self) {
        let scope = self.current_proc.clone();
        let fixups: Vec<(String, Vec<usize>)> = self.label_fixups.drain().collect();
        for (name, offsets) in fixups {
            match self.labels.get(&name).copied() {
                Some(addr) => {
                    for offset in offsets {
                        self.patch_u64(offset, addr);
                    }
                }
                None => self.diagnostics.push(Error::UnresolvedSymbol {
                    name,
                    scope: scope.clone(),
                }),
            }
        }
        self.labels.clear();
        self.current_proc = None;
    }

    fn define_label(&mut self, name: &str) {
        let addr = self.code.len() as u64;
        self.labels.entry(name.to_string()).or_insert(addr);
    }

    fn emit_proc_ref(&mut self, name: &str) {
        if let Some(addr) = self.procs.get(name).copied() {
            self.append_u64(addr);
        } else {
            let offset = self.code.len();
            self.append_u64(FIXUP_SENTINEL);
            self.proc_fixups.entry(name.to_string()).or_default().push(offset);
        }
    }

    fn emit_label_ref(&mut self, name: &str) {
        if let Some(addr) = self.labels.get(name).copied() {
            self.append_u64(addr);
        } else {
            let offset = self.code.len();
            self.append_u64(FIXUP_SENTINEL);
            self.label_fixups.entry(name.to_string()).or_default().push(offset);
        }
    }

    fn finish(mut self) -> Result<Vec<u8>, Vec<Error>> {
        let fixups: Vec<(String, Vec<usize>)> = self.proc_fixups.drain().collect();
        for (name, offsets) in fixups {
            match self.procs.get(&name).copied() {
                Some(addr) => {
                    for offset in offsets {
                        self.patch_u64(offset, addr);
                    }
                }
                None => self.diagnostics.push(Error::UnresolvedSymbol { name, scope: None }),
            }
        }
        if self.diagnostics.is_empty() {
            Ok(self.code)
        } else {
            Err(self.diagnostics)
        }
    }
}

/// An error that can occur during assembly
#[derive(Debug)]
pub enum Error {
    /// An unknown mnemonic was encountered
    UnknownInstruction {
        instruction: String,
        line_number: usize,
        line: String,
    },
    /// An invalid argument was encountered
    InvalidArgument {
        argument: String,
        line_number: usize,
        line: String,
    },
    /// An invalid number of arguments was passed
    InvalidArgumentCount {
        instruction: String,
        n_arguments: usize,
        expected: Vec<usize>,
        line_number: usize,
        line: String,
    },
    /// A procedure or label was referenced but never defined. `scope` is
    /// the enclosing procedure for an unresolved label, or `None` for an
    /// unresolved procedure (resolved at end of file).
    UnresolvedSymbol { name: String, scope: Option<String> },
    /// A file could not be read
    ReadError { path: String },
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownInstruction { instruction, line_number, line } => {
                writeln!(f, "unknown instruction \"{}\" at line {}", instruction, line_number)?;
                write!(f, "{}\t{}", line_number, line)
            }
            Error::InvalidArgument { argument, line_number, line } => {
                writeln!(f, "invalid argument \"{}\" at line {}", argument, line_number)?;
                write!(f, "{}\t{}", line_number, line)
            }
            Error::InvalidArgumentCount { instruction, n_arguments, expected, line_number, line } => {
                writeln!(
                    f,
                    "invalid argument count for instruction \"{}\" at line {}: found {}, expected {:?}",
                    instruction, line_number, n_arguments, expected
                )?;
                write!(f, "{}\t{}", line_number, line)
            }
            Error::UnresolvedSymbol { name, scope: Some(scope) } => {
                write!(f, "unresolved symbol [{}] in proc [{}]", name, scope)
            }
            Error::UnresolvedSymbol { name, scope: None } => {
                write!(f, "unresolved symbol [{}]", name)
            }
            Error::ReadError { path } => write!(f, "failed to read file {}", path),
        }
    }
}
