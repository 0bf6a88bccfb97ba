use clap::Parser;
use civic_compiler::{analysis, backend, frontend, lower, CompileError};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "civicc")]
#[command(about = "Compile CiviC programs to stack-machine assembly")]
struct Args {
    /// Source file to compile
    file: PathBuf,

    /// Print the pre- and post-lowering AST along with the assembly
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Write assembly to this file instead of standard output
    #[arg(short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let source = match fs::read_to_string(&args.file) {
        Ok(source) => source,
        Err(err) => {
            println!("Error reading '{}': {err}", args.file.display());
            process::exit(-1);
        }
    };

    let asm = match compile(&source, args.verbose) {
        Ok(asm) => asm,
        Err(err) => {
            println!("{err}");
            process::exit(-1);
        }
    };

    match &args.output {
        Some(path) => {
            if let Err(err) = fs::write(path, &asm) {
                println!("Error writing '{}': {err}", path.display());
                process::exit(-1);
            }
            if args.verbose {
                print!("{asm}");
            }
        }
        None => print!("{asm}"),
    }
}

fn compile(source: &str, verbose: bool) -> Result<String, CompileError> {
    let mut ast = frontend::parse(source)?;
    lower::normalize(&mut ast);
    if verbose {
        println!("; pre-lowering AST");
        print!("{}", ast.dump());
    }
    analysis::analyze(&mut ast)?;
    lower::desugar(&mut ast);
    if verbose {
        println!("; post-lowering AST");
        print!("{}", ast.dump());
    }
    Ok(backend::generate(&ast))
}
