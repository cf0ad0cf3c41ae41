//! A tiny educational virtual machine toolchain, featuring:
//! - an assembler targeting either VM variant
//! - a register machine with labels, procedures and a call stack
//! - a minimal stack machine for simple arithmetic programs

pub mod assembler;
pub mod lexer;
pub mod logging;
pub mod regvm;
pub mod stackvm;
