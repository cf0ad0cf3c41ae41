//! One handler per opcode
//!
//! Every handler reads its own operands out of memory (by convention they
//! start right after the opcode byte at the current IP) and is responsible
//! for moving IP past them before returning. Jump-family handlers are the
//! exception: they set IP to `target - 1` directly, compensating for the
//! dispatch loop's pre-increment.

use super::{Context, Fault};

pub fn halt(ctx: &mut Context) -> Result<(), Fault> {
    ctx.running = false;
    ctx.advance(0);
    Ok(())
}

pub fn nop(ctx: &mut Context) -> Result<(), Fault> {
    ctx.advance(0);
    Ok(())
}

pub fn int(ctx: &mut Context) -> Result<(), Fault> {
    crate::logging::registers(&ctx.regs);
    ctx.advance(0);
    Ok(())
}

pub fn clf(ctx: &mut Context) -> Result<(), Fault> {
    ctx.regs[super::REG_F as usize] = 0;
    ctx.advance(0);
    Ok(())
}

pub fn movi(ctx: &mut Context) -> Result<(), Fault> {
    let reg = Context::register_index(ctx.operand_u64(0));
    let imm = ctx.operand_u64(1);
    ctx.regs[reg] = imm;
    ctx.advance(16);
    Ok(())
}

pub fn movf(ctx: &mut Context) -> Result<(), Fault> {
    let reg = Context::register_index(ctx.operand_u64(0));
    let addr = ctx.operand_u64(1) as usize;
    let value = ctx.read_u64(addr);
    ctx.regs[reg] = value;
    ctx.advance(16);
    Ok(())
}

pub fn movt(ctx: &mut Context) -> Result<(), Fault> {
    let addr = ctx.operand_u64(0) as usize;
    let reg = Context::register_index(ctx.operand_u64(1));
    let value = ctx.regs[reg];
    ctx.write_u64(addr, value);
    ctx.advance(16);
    Ok(())
}

pub fn mov(ctx: &mut Context) -> Result<(), Fault> {
    let dst = Context::register_index(ctx.operand_u64(0));
    let src = Context::register_index(ctx.operand_u64(1));
    ctx.regs[dst] = ctx.regs[src];
    ctx.advance(16);
    Ok(())
}

pub fn push(ctx: &mut Context) -> Result<(), Fault> {
    let reg = Context::register_index(ctx.operand_u64(0));
    let value = ctx.regs[reg];
    ctx.push_value(value);
    ctx.advance(8);
    Ok(())
}

pub fn pushi(ctx: &mut Context) -> Result<(), Fault> {
    let value = ctx.operand_u64(0);
    ctx.push_value(value);
    ctx.advance(8);
    Ok(())
}

pub fn pushf(ctx: &mut Context) -> Result<(), Fault> {
    let value = ctx.regs[super::REG_F as usize];
    ctx.push_value(value);
    ctx.advance(0);
    Ok(())
}

pub fn pop(ctx: &mut Context) -> Result<(), Fault> {
    let reg = Context::register_index(ctx.operand_u64(0));
    let value = ctx.pop_value();
    ctx.regs[reg] = value;
    ctx.advance(8);
    Ok(())
}

pub fn popto(ctx: &mut Context) -> Result<(), Fault> {
    let addr = ctx.operand_u64(0) as usize;
    let value = ctx.pop_value();
    ctx.write_u64(addr, value);
    ctx.advance(8);
    Ok(())
}

pub fn popf(ctx: &mut Context) -> Result<(), Fault> {
    let value = ctx.pop_value();
    ctx.regs[super::REG_F as usize] = value;
    ctx.advance(0);
    Ok(())
}

macro_rules! binary_arith {
    ($name:ident, $op:ident) => {
        pub fn $name(ctx: &mut Context) -> Result<(), Fault> {
            let r1 = Context::register_index(ctx.operand_u64(0));
            let r2 = Context::register_index(ctx.operand_u64(1));
            let result = ctx.regs[r1].$op(ctx.regs[r2]);
            ctx.regs[r1] = result;
            ctx.set_flags(result);
            ctx.advance(16);
            Ok(())
        }
    };
}

binary_arith!(add, wrapping_add);
binary_arith!(sub, wrapping_sub);
binary_arith!(mul, wrapping_mul);
binary_arith!(and, bitand_wrap);
binary_arith!(or, bitor_wrap);
binary_arith!(xor, bitxor_wrap);

// `wrapping_*` doesn't exist for bitwise ops since they can't overflow;
// these thin wrappers just give the macro above a uniform method name.
trait BitWrap {
    fn bitand_wrap(self, rhs: u64) -> u64;
    fn bitor_wrap(self, rhs: u64) -> u64;
    fn bitxor_wrap(self, rhs: u64) -> u64;
}

impl BitWrap for u64 {
    fn bitand_wrap(self, rhs: u64) -> u64 {
        self & rhs
    }
    fn bitor_wrap(self, rhs: u64) -> u64 {
        self | rhs
    }
    fn bitxor_wrap(self, rhs: u64) -> u64 {
        self ^ rhs
    }
}

pub fn div(ctx: &mut Context) -> Result<(), Fault> {
    let r1 = Context::register_index(ctx.operand_u64(0));
    let r2 = Context::register_index(ctx.operand_u64(1));
    let divisor = ctx.regs[r2] as i64;
    if divisor == 0 {
        ctx.running = false;
        return Err(Fault::DivideByZero);
    }
    let result = ((ctx.regs[r1] as i64).wrapping_div(divisor)) as u64;
    ctx.regs[r1] = result;
    ctx.set_flags(result);
    ctx.advance(16);
    Ok(())
}

pub fn modulo(ctx: &mut Context) -> Result<(), Fault> {
    let r1 = Context::register_index(ctx.operand_u64(0));
    let r2 = Context::register_index(ctx.operand_u64(1));
    let divisor = ctx.regs[r2] as i64;
    if divisor == 0 {
        ctx.running = false;
        return Err(Fault::ModuloByZero);
    }
    let result = ((ctx.regs[r1] as i64).wrapping_rem(divisor)) as u64;
    ctx.regs[r1] = result;
    ctx.set_flags(result);
    ctx.advance(16);
    Ok(())
}

pub fn cmp(ctx: &mut Context) -> Result<(), Fault> {
    let r1 = Context::register_index(ctx.operand_u64(0));
    let r2 = Context::register_index(ctx.operand_u64(1));
    let result = ctx.regs[r1].wrapping_sub(ctx.regs[r2]);
    ctx.set_flags(result);
    ctx.advance(16);
    Ok(())
}

pub fn inc(ctx: &mut Context) -> Result<(), Fault> {
    let reg = Context::register_index(ctx.operand_u64(0));
    let result = ctx.regs[reg].wrapping_add(1);
    ctx.regs[reg] = result;
    ctx.set_flags(result);
    ctx.advance(8);
    Ok(())
}

pub fn dec(ctx: &mut Context) -> Result<(), Fault> {
    let reg = Context::register_index(ctx.operand_u64(0));
    let result = ctx.regs[reg].wrapping_sub(1);
    ctx.regs[reg] = result;
    ctx.set_flags(result);
    ctx.advance(8);
    Ok(())
}

pub fn not(ctx: &mut Context) -> Result<(), Fault> {
    let reg = Context::register_index(ctx.operand_u64(0));
    let result = !ctx.regs[reg];
    ctx.regs[reg] = result;
    ctx.set_flags(result);
    ctx.advance(8);
    Ok(())
}

// SHR/SHL read their second operand as a raw shift count, not as a register
// to indirect through, unlike every other two-operand handler above. This
// matches the historical interpreter this one is modelled on and nothing in
// this toolchain depends on it behaving otherwise.
pub fn shr(ctx: &mut Context) -> Result<(), Fault> {
    let r1 = Context::register_index(ctx.operand_u64(0));
    let shift = (ctx.operand_u64(1) % 64) as u32;
    let result = ctx.regs[r1] >> shift;
    ctx.regs[r1] = result;
    ctx.set_flags(result);
    ctx.advance(16);
    Ok(())
}

pub fn shl(ctx: &mut Context) -> Result<(), Fault> {
    let r1 = Context::register_index(ctx.operand_u64(0));
    let shift = (ctx.operand_u64(1) % 64) as u32;
    let result = ctx.regs[r1] << shift;
    ctx.regs[r1] = result;
    ctx.set_flags(result);
    ctx.advance(16);
    Ok(())
}

pub fn calli(ctx: &mut Context) -> Result<(), Fault> {
    let target = ctx.operand_u64(0);
    let return_ip = ctx.regs[super::REG_IP as usize].wrapping_add(8);
    ctx.push_value(return_ip);
    ctx.jump_to(target);
    Ok(())
}

// The operand is read into a local before anything else touches it, so
// nothing can alias over it on the way to the jump.
pub fn callr(ctx: &mut Context) -> Result<(), Fault> {
    let reg = Context::register_index(ctx.operand_u64(0));
    let target = ctx.regs[reg];
    let return_ip = ctx.regs[super::REG_IP as usize].wrapping_add(8);
    ctx.push_value(return_ip);
    ctx.jump_to(target);
    Ok(())
}

pub fn ret(ctx: &mut Context) -> Result<(), Fault> {
    let return_ip = ctx.pop_value();
    ctx.regs[super::REG_IP as usize] = return_ip;
    Ok(())
}

pub fn jmp(ctx: &mut Context) -> Result<(), Fault> {
    let target = ctx.operand_u64(0);
    ctx.jump_to(target);
    Ok(())
}

fn conditional_jump(ctx: &mut Context, taken: bool) {
    let target = ctx.operand_u64(0);
    if taken {
        ctx.jump_to(target);
    } else {
        ctx.advance(8);
    }
}

pub fn jz(ctx: &mut Context) -> Result<(), Fault> {
    let taken = ctx.flag_zero();
    conditional_jump(ctx, taken);
    Ok(())
}

pub fn jnz(ctx: &mut Context) -> Result<(), Fault> {
    let taken = !ctx.flag_zero();
    conditional_jump(ctx, taken);
    Ok(())
}

pub fn jge(ctx: &mut Context) -> Result<(), Fault> {
    let taken = ctx.flag_zero() || !ctx.flag_sign();
    conditional_jump(ctx, taken);
    Ok(())
}

pub fn jle(ctx: &mut Context) -> Result<(), Fault> {
    let taken = ctx.flag_zero() || ctx.flag_sign();
    conditional_jump(ctx, taken);
    Ok(())
}

pub fn jgt(ctx: &mut Context) -> Result<(), Fault> {
    let taken = !ctx.flag_zero() && !ctx.flag_sign();
    conditional_jump(ctx, taken);
    Ok(())
}

pub fn jlt(ctx: &mut Context) -> Result<(), Fault> {
    let taken = !ctx.flag_zero() && ctx.flag_sign();
    conditional_jump(ctx, taken);
    Ok(())
}
