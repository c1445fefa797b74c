//! Line-oriented REPL driver for the interpreter.
//!
//! The reference collaborator: feeds each input line into `parse`, triggers
//! `evaluate`, prints the result or the error message, and reports any
//! geometry pulled from the drawable accumulator. `:reset` restores the
//! fixed environment; Ctrl-D exits.

use drawxp::interpreter::Interpreter;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::process;

fn main() {
    if let Err(err) = run_repl() {
        eprintln!("repl error: {err}");
        process::exit(1);
    }
}

fn run_repl() -> rustyline::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut interp = Interpreter::new();

    println!("drawxp repl - enter an expression, :reset to reset, Ctrl-D to exit");

    loop {
        match editor.readline("drawxp> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(input);

                if input == ":reset" {
                    interp.reset();
                    println!("environment reset");
                    continue;
                }

                if !interp.parse(input) {
                    eprintln!("error: cannot parse input");
                    continue;
                }

                match interp.evaluate() {
                    Ok(result) => {
                        println!("{result}");
                        let drawables = interp.drawables();
                        if !drawables.is_empty() {
                            println!("drawables:");
                            for atom in drawables {
                                println!("  {atom}");
                            }
                        }
                    }
                    Err(err) => eprintln!("error: {err}"),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    Ok(())
}
