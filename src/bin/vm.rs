use std::{env, fs, process};
use tinyvm::logging::error;
use tinyvm::{regvm, stackvm};

fn usage(program: &str) -> String {
    format!("Usage: {} <program-path> <s|r>", program)
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("{}", usage(&args[0]));
        process::exit(1);
    }

    let program_path = &args[1];
    let mode = args[2].as_str();
    if mode.len() != 1 || !matches!(mode, "s" | "r") {
        eprintln!("{}", usage(&args[0]));
        error(format!("invalid mode \"{}\", expected s or r", mode));
        process::exit(1);
    }

    let program = fs::read(program_path).unwrap_or_else(|e| {
        error(format!("failed to read program file: {}", e));
        process::exit(2);
    });

    match mode {
        "r" => {
            let mut ctx = regvm::Context::new();
            ctx.load(&program);
            if let Err(fault) = ctx.run() {
                error(fault.to_string());
                process::exit(3);
            }
        }
        "s" => {
            let mut ctx = stackvm::Context::new();
            ctx.run(&program);
        }
        _ => unreachable!("checked above"),
    }
}
