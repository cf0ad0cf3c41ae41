//! Pretty-printing diagnostics and runtime traces to the console

use colored::Colorize;

/// Pretty-print an error message to the console
pub fn error(error_message: String) {
    let error_title = "error:".red().bold();
    eprintln!("{} {}", error_title, error_message);
}

/// Pretty-print a warning message to the console
pub fn warning(message: String, line_number: usize) {
    let warning = "warning:".yellow().bold();
    eprintln!("{} line {}: {}", warning, line_number, message);
}

/// Dump the register file, as triggered by the `INT` instruction
pub fn registers(regs: &[u64; 6]) {
    let names = ["a", "b", "c", "ip", "sp", "f"];
    for (name, value) in names.iter().zip(regs.iter()) {
        println!("{:>2} = 0x{:016x} ({})", name, value, *value as i64);
    }
}
