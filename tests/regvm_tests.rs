use tinyvm::regvm::{self, Context, Fault, Opcode};

fn push_u64(code: &mut Vec<u8>, value: u64) {
    code.extend_from_slice(&value.to_le_bytes());
}

#[test]
fn call_and_return_preserves_stack_pointer() {
    // main: movi a,7; calli square; halt
    // square: mul a,a; ret
    let mut code = Vec::new();
    code.push(Opcode::Movi as u8);
    push_u64(&mut code, regvm::REG_A as u64);
    push_u64(&mut code, 7);
    let calli_at = code.len();
    code.push(Opcode::Calli as u8);
    push_u64(&mut code, 0); // patched below
    code.push(Opcode::Halt as u8);
    let square_addr = code.len() as u64;
    code.push(Opcode::Mul as u8);
    push_u64(&mut code, regvm::REG_A as u64);
    push_u64(&mut code, regvm::REG_A as u64);
    code.push(Opcode::Ret as u8);
    code[calli_at + 1..calli_at + 9].copy_from_slice(&square_addr.to_le_bytes());

    let mut ctx = Context::new();
    let starting_sp = ctx.regs[regvm::REG_SP as usize];
    ctx.load(&code);
    ctx.run().unwrap();

    assert_eq!(ctx.regs[regvm::REG_A as usize], 49);
    assert_eq!(ctx.regs[regvm::REG_SP as usize], starting_sp);
}

#[test]
fn callr_reads_the_register_value_not_its_address() {
    // main: movi a,(addr of target); callr a; halt
    // target: movi b,9; ret
    let mut code = Vec::new();
    let calli_patch_at = code.len();
    code.push(Opcode::Movi as u8);
    push_u64(&mut code, regvm::REG_A as u64);
    push_u64(&mut code, 0); // patched to target's address below
    code.push(Opcode::Callr as u8);
    push_u64(&mut code, regvm::REG_A as u64);
    code.push(Opcode::Halt as u8);
    let target_addr = code.len() as u64;
    code.push(Opcode::Movi as u8);
    push_u64(&mut code, regvm::REG_B as u64);
    push_u64(&mut code, 9);
    code.push(Opcode::Ret as u8);

    let imm_offset = calli_patch_at + 1 + 8;
    code[imm_offset..imm_offset + 8].copy_from_slice(&target_addr.to_le_bytes());

    let mut ctx = Context::new();
    ctx.load(&code);
    ctx.run().unwrap();
    assert_eq!(ctx.regs[regvm::REG_B as usize], 9);
}

#[test]
fn division_by_zero_is_a_fault_not_a_panic() {
    let mut code = Vec::new();
    code.push(Opcode::Movi as u8);
    push_u64(&mut code, regvm::REG_A as u64);
    push_u64(&mut code, 1);
    code.push(Opcode::Movi as u8);
    push_u64(&mut code, regvm::REG_B as u64);
    push_u64(&mut code, 0);
    code.push(Opcode::Div as u8);
    push_u64(&mut code, regvm::REG_A as u64);
    push_u64(&mut code, regvm::REG_B as u64);
    code.push(Opcode::Halt as u8);

    let mut ctx = Context::new();
    ctx.load(&code);
    assert!(matches!(ctx.run(), Err(Fault::DivideByZero)));
}

#[test]
fn je_and_jz_share_a_handler() {
    let mut code = Vec::new();
    code.push(Opcode::Movi as u8);
    push_u64(&mut code, regvm::REG_A as u64);
    push_u64(&mut code, 0);
    code.push(Opcode::Cmp as u8);
    push_u64(&mut code, regvm::REG_A as u64);
    push_u64(&mut code, regvm::REG_A as u64);
    let je_at = code.len();
    code.push(Opcode::Je as u8);
    push_u64(&mut code, 0); // patched below
    code.push(Opcode::Movi as u8);
    push_u64(&mut code, regvm::REG_B as u64);
    push_u64(&mut code, 1); // should be skipped
    code.push(Opcode::Halt as u8);
    let target = code.len() as u64;
    code.push(Opcode::Halt as u8);
    code[je_at + 1..je_at + 9].copy_from_slice(&target.to_le_bytes());

    let mut ctx = Context::new();
    ctx.load(&code);
    ctx.run().unwrap();
    assert_eq!(ctx.regs[regvm::REG_B as usize], 0);
}

#[test]
fn shr_uses_raw_operand_value_as_shift_count() {
    // shl a,2 where the *value* 2 is the register code for C, not an
    // indirected read of C's contents
    let mut code = Vec::new();
    code.push(Opcode::Movi as u8);
    push_u64(&mut code, regvm::REG_A as u64);
    push_u64(&mut code, 1);
    code.push(Opcode::Movi as u8);
    push_u64(&mut code, regvm::REG_C as u64);
    push_u64(&mut code, 5); // if shl indirected through C, shift would be 5, not 2
    code.push(Opcode::Shl as u8);
    push_u64(&mut code, regvm::REG_A as u64);
    push_u64(&mut code, regvm::REG_C as u64);
    code.push(Opcode::Halt as u8);

    let mut ctx = Context::new();
    ctx.load(&code);
    ctx.run().unwrap();
    assert_eq!(ctx.regs[regvm::REG_A as usize], 1 << regvm::REG_C as u64);
}
