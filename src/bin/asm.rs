use std::{env, fs, process};
use tinyvm::logging::error;
use tinyvm::{assembler, stackvm};

struct Args {
    input_path: String,
    mode: char,
    output_path: String,
}

fn usage(program: &str) -> String {
    format!("Usage: {} <input-path> -m <s|r> [-o <output-path>]", program)
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut input_path: Option<String> = None;
    let mut mode: Option<char> = None;
    let mut output_path = String::from("out.bin");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-m" => {
                let value = args.get(i + 1).ok_or("-m requires an argument")?;
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some('s'), None) => mode = Some('s'),
                    (Some('r'), None) => mode = Some('r'),
                    _ => return Err(format!("invalid mode \"{}\", expected s or r", value)),
                }
                i += 2;
            }
            "-o" => {
                output_path = args.get(i + 1).ok_or("-o requires an argument")?.clone();
                i += 2;
            }
            other => {
                if input_path.is_some() {
                    return Err(format!("unexpected argument \"{}\"", other));
                }
                input_path = Some(other.to_string());
                i += 1;
            }
        }
    }

    let input_path = input_path.ok_or("missing input path")?;
    let mode = mode.ok_or("missing -m <s|r>")?;
    Ok(Args { input_path, mode, output_path })
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let parsed = parse_args(&args).unwrap_or_else(|message| {
        eprintln!("{}", usage(&args[0]));
        error(message);
        process::exit(1);
    });

    let bytecode = match parsed.mode {
        'r' => assembler::assemble_from_file(&parsed.input_path).unwrap_or_else(|errors| {
            for e in &errors {
                error(e.to_string());
            }
            process::exit(2);
        }),
        's' => {
            let source = fs::read_to_string(&parsed.input_path).unwrap_or_else(|e| {
                error(format!("failed to read input file: {}", e));
                process::exit(2);
            });
            let (code, invalid_tokens) = stackvm::assemble(&source);
            for token in &invalid_tokens {
                error(token.to_string());
            }
            code
        }
        _ => unreachable!("parse_args only accepts s or r"),
    };

    fs::write(&parsed.output_path, bytecode).unwrap_or_else(|e| {
        error(format!("failed to write to output file: {}", e));
        process::exit(3);
    });
}
