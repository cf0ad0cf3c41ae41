use tinyvm::assembler;
use tinyvm::regvm::{self, Opcode};

fn addr_at(code: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(code[offset..offset + 8].try_into().unwrap())
}

#[test]
fn preamble_calls_main() {
    let source = "proc main\nhalt\nendp\n";
    let code = assembler::assemble(source).expect("should assemble");
    assert_eq!(code[0], Opcode::Calli as u8);
    let main_addr = addr_at(&code, 1);
    assert_eq!(code[9], Opcode::Halt as u8);
    assert_eq!(code[main_addr as usize], Opcode::Halt as u8);
}

#[test]
fn forward_label_reference_resolves_within_the_proc() {
    let source = "\
proc main
jmp skip
halt
skip:
halt
endp
";
    let code = assembler::assemble(source).expect("should assemble");
    // jmp is the second instruction in the program (after the preamble)
    let jmp_offset = 10;
    assert_eq!(code[jmp_offset], Opcode::Jmp as u8);
    let target = addr_at(&code, jmp_offset + 1);
    assert_eq!(code[target as usize], Opcode::Halt as u8);
    assert!(target as usize > jmp_offset);
}

#[test]
fn undefined_main_produces_no_binary() {
    let source = "proc other\nhalt\nendp\n";
    let errors = assembler::assemble(source).expect_err("should fail");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "unresolved symbol [main]"
    );
}

#[test]
fn undefined_label_reports_its_enclosing_proc() {
    let source = "proc main\njmp nowhere\nendp\n";
    let errors = assembler::assemble(source).expect_err("should fail");
    assert!(errors
        .iter()
        .any(|e| e.to_string() == "unresolved symbol [nowhere] in proc [main]"));
}

#[test]
fn duplicate_proc_definitions_keep_the_first() {
    let source = "\
proc main
call helper
halt
endp
proc helper
movi a,1
ret
endp
proc helper
movi a,2
ret
endp
";
    let code = assembler::assemble(source).expect("should assemble");
    // both "helper" procs exist in source; resolution must pick the first
    let calli_offset = 10; // right after preamble + proc header has no bytes
    assert_eq!(code[calli_offset], Opcode::Calli as u8);
    let helper_addr = addr_at(&code, calli_offset + 1) as usize;
    assert_eq!(code[helper_addr], Opcode::Movi as u8);
    let imm = addr_at(&code, helper_addr + 9);
    assert_eq!(imm, 1);
}

#[test]
fn or_is_binary_and_not_is_unary() {
    let source = "\
proc main
or a,b
not a
halt
endp
";
    let code = assembler::assemble(source).expect("should assemble");
    assert_eq!(code[10], Opcode::Or as u8);
    assert_eq!(code[10 + 1 + 16], Opcode::Not as u8);
}

#[test]
fn mov_to_address_emits_movt() {
    let source = "proc main\nmov 100,a\nhalt\nendp\n";
    let code = assembler::assemble(source).expect("should assemble");
    assert_eq!(code[10], Opcode::Movt as u8);
    let addr = addr_at(&code, 11);
    assert_eq!(addr, 100);
    let reg = addr_at(&code, 19);
    assert_eq!(reg, regvm::REG_A as u64);
}

#[test]
fn addition_program_runs_end_to_end() {
    let source = "\
proc main
movi a,2
movi b,3
add a,b
halt
endp
";
    let code = assembler::assemble(source).expect("should assemble");
    let mut ctx = regvm::Context::new();
    ctx.load(&code);
    ctx.run().unwrap();
    assert_eq!(ctx.regs[regvm::REG_A as usize], 5);
    assert_eq!(ctx.regs[regvm::REG_B as usize], 3);
}

#[test]
fn loop_decrements_to_zero() {
    let source = "\
proc main
movi c,10
loop:
dec c
jnz loop
halt
endp
";
    let code = assembler::assemble(source).expect("should assemble");
    let mut ctx = regvm::Context::new();
    ctx.load(&code);
    ctx.run().unwrap();
    assert_eq!(ctx.regs[regvm::REG_C as usize], 0);
    assert_eq!(ctx.regs[regvm::REG_F as usize] & 1, 1);
}

#[test]
fn comparison_sets_sign_flag() {
    let source = "\
proc main
movi a,3
movi b,5
cmp a,b
halt
endp
";
    let code = assembler::assemble(source).expect("should assemble");
    let mut ctx = regvm::Context::new();
    ctx.load(&code);
    ctx.run().unwrap();
    assert_eq!(ctx.regs[regvm::REG_F as usize] & 0b10, 0b10);
    assert_eq!(ctx.regs[regvm::REG_F as usize] & 0b01, 0);
}
