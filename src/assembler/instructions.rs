//! One codegen function per grammar rule
//!
//! `dispatch` is the grammar table: it reads the statement's mnemonic and
//! routes to a small function that validates arguments and appends bytes to
//! the assembler's code buffer. Everything here returns `Result<(), Error>`
//! so the driver in [`crate::assembler`] can accumulate failures instead of
//! aborting on the first one.

use super::statement::{ArgumentKind, Statement};
use super::{Assembler, Error};
use crate::regvm::Opcode;

pub fn dispatch(asm: &mut Assembler, statement: &Statement) -> Result<(), Error> {
    if statement.is_label_definition() {
        asm.define_label(statement.raw_first_token());
        return Ok(());
    }

    match statement.mnemonic() {
        "proc" => proc(asm, statement),
        "endp" => {
            statement.assert_n_arguments(0)?;
            asm.end_proc();
            Ok(())
        }
        "call" => call(asm, statement),
        "ret" => nullary(asm, statement, Opcode::Ret),
        "jmp" => jump(asm, statement, Opcode::Jmp),
        "je" => jump(asm, statement, Opcode::Je),
        "jz" => jump(asm, statement, Opcode::Jz),
        "jne" => jump(asm, statement, Opcode::Jne),
        "jnz" => jump(asm, statement, Opcode::Jnz),
        "jgt" => jump(asm, statement, Opcode::Jgt),
        "jlt" => jump(asm, statement, Opcode::Jlt),
        "jge" => jump(asm, statement, Opcode::Jge),
        "jle" => jump(asm, statement, Opcode::Jle),
        "add" => binary(asm, statement, Opcode::Add),
        "sub" => binary(asm, statement, Opcode::Sub),
        "mul" => binary(asm, statement, Opcode::Mul),
        "div" => binary(asm, statement, Opcode::Div),
        "mod" => binary(asm, statement, Opcode::Mod),
        "cmp" => binary(asm, statement, Opcode::Cmp),
        "and" => binary(asm, statement, Opcode::And),
        "or" => binary(asm, statement, Opcode::Or),
        "xor" => binary(asm, statement, Opcode::Xor),
        // shr/shl are syntactically binary like the rest, but the handler
        // reads the second operand as a raw shift count rather than
        // indirecting through the named register.
        "shr" => binary(asm, statement, Opcode::Shr),
        "shl" => binary(asm, statement, Opcode::Shl),
        "inc" => unary(asm, statement, Opcode::Inc),
        "dec" => unary(asm, statement, Opcode::Dec),
        "not" => unary(asm, statement, Opcode::Not),
        "clf" => nullary(asm, statement, Opcode::Clf),
        "mov" => mov(asm, statement),
        "push" => push(asm, statement),
        "pushf" => nullary(asm, statement, Opcode::Pushf),
        "pop" => pop(asm, statement),
        "popf" => nullary(asm, statement, Opcode::Popf),
        "nop" => nullary(asm, statement, Opcode::Nop),
        "int" => nullary(asm, statement, Opcode::Int),
        "halt" => nullary(asm, statement, Opcode::Halt),
        other => Err(Error::UnknownInstruction {
            instruction: other.to_string(),
            line_number: statement.line_number(),
            line: statement.line(),
        }),
    }
}

fn nullary(asm: &mut Assembler, statement: &Statement, opcode: Opcode) -> Result<(), Error> {
    statement.assert_n_arguments(0)?;
    asm.append_u8(opcode as u8);
    Ok(())
}

fn proc(asm: &mut Assembler, statement: &Statement) -> Result<(), Error> {
    statement.assert_n_arguments(1)?;
    let name = statement.argument(0)?.to_string();
    asm.begin_proc(&name);
    Ok(())
}

fn call(asm: &mut Assembler, statement: &Statement) -> Result<(), Error> {
    statement.assert_n_arguments(1)?;
    match statement.argument_kind(0)? {
        ArgumentKind::Immediate(target) => {
            asm.append_u8(Opcode::Calli as u8);
            asm.append_u64(target as u64);
        }
        ArgumentKind::Register(reg) => {
            asm.append_u8(Opcode::Callr as u8);
            asm.append_u64(reg as u64);
        }
        ArgumentKind::Symbol(name) => {
            asm.append_u8(Opcode::Calli as u8);
            asm.emit_proc_ref(&name);
        }
    }
    Ok(())
}

fn jump(asm: &mut Assembler, statement: &Statement, opcode: Opcode) -> Result<(), Error> {
    statement.assert_n_arguments(1)?;
    match statement.argument_kind(0)? {
        ArgumentKind::Immediate(target) => {
            asm.append_u8(opcode as u8);
            asm.append_u64(target as u64);
        }
        ArgumentKind::Symbol(name) => {
            asm.append_u8(opcode as u8);
            asm.emit_label_ref(&name);
        }
        ArgumentKind::Register(_) => return Err(statement.invalid_argument(0)),
    }
    Ok(())
}

fn binary(asm: &mut Assembler, statement: &Statement, opcode: Opcode) -> Result<(), Error> {
    let (r1, r2) = statement.parse_two_registers()?;
    asm.append_u8(opcode as u8);
    asm.append_u64(r1 as u64);
    asm.append_u64(r2 as u64);
    Ok(())
}

fn unary(asm: &mut Assembler, statement: &Statement, opcode: Opcode) -> Result<(), Error> {
    statement.assert_n_arguments(1)?;
    let reg = statement.parse_register(0)?;
    asm.append_u8(opcode as u8);
    asm.append_u64(reg as u64);
    Ok(())
}

/// `mov D,S` dispatches on the destination: a register picks MOV/MOVI, a
/// bare integer can only mean "store to this address" and picks MOVT.
fn mov(asm: &mut Assembler, statement: &Statement) -> Result<(), Error> {
    statement.assert_n_arguments(2)?;
    match statement.argument_kind(0)? {
        ArgumentKind::Register(dst) => match statement.argument_kind(1)? {
            ArgumentKind::Register(src) => {
                asm.append_u8(Opcode::Mov as u8);
                asm.append_u64(dst as u64);
                asm.append_u64(src as u64);
            }
            ArgumentKind::Immediate(imm) => {
                asm.append_u8(Opcode::Movi as u8);
                asm.append_u64(dst as u64);
                asm.append_u64(imm as u64);
            }
            ArgumentKind::Symbol(_) => return Err(statement.invalid_argument(1)),
        },
        ArgumentKind::Immediate(addr) => {
            let reg = statement.parse_register(1)?;
            asm.append_u8(Opcode::Movt as u8);
            asm.append_u64(addr as u64);
            asm.append_u64(reg as u64);
        }
        ArgumentKind::Symbol(_) => return Err(statement.invalid_argument(0)),
    }
    Ok(())
}

fn push(asm: &mut Assembler, statement: &Statement) -> Result<(), Error> {
    statement.assert_n_arguments(1)?;
    match statement.argument_kind(0)? {
        ArgumentKind::Register(reg) => {
            asm.append_u8(Opcode::Push as u8);
            asm.append_u64(reg as u64);
        }
        ArgumentKind::Immediate(imm) => {
            asm.append_u8(Opcode::Pushi as u8);
            asm.append_u64(imm as u64);
        }
        ArgumentKind::Symbol(_) => return Err(statement.invalid_argument(0)),
    }
    Ok(())
}

fn pop(asm: &mut Assembler, statement: &Statement) -> Result<(), Error> {
    statement.assert_n_arguments(1)?;
    match statement.argument_kind(0)? {
        ArgumentKind::Register(reg) => {
            asm.append_u8(Opcode::Pop as u8);
            asm.append_u64(reg as u64);
        }
        ArgumentKind::Immediate(addr) => {
            asm.append_u8(Opcode::Popto as u8);
            asm.append_u64(addr as u64);
        }
        ArgumentKind::Symbol(_) => return Err(statement.invalid_argument(0)),
    }
    Ok(())
}
