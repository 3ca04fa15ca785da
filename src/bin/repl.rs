use std::cell::RefCell;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};
use tinylisp::evaluator::special_form_identifiers;
use tinylisp::{Environment, Session, TokenKind, tokenize};

/// Completes symbol prefixes against the session environment's bindings
/// plus the special-form keywords.
struct LispCompleter {
    env: Rc<RefCell<Environment>>,
}

impl rustyline::completion::Completer for LispCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let tokens = tokenize(&line[..pos]);
        let candidates = match tokens.last().map(|t| t.kind.clone()) {
            Some(TokenKind::Atom(prefix)) => self
                .env
                .borrow()
                .get_identifiers()
                .union(&special_form_identifiers())
                .filter_map(|id| {
                    if id.starts_with(&prefix) {
                        Some(id[prefix.len()..].to_string())
                    } else {
                        None
                    }
                })
                .collect(),
            _ => vec![],
        };
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputHelper {
    #[rustyline(Validator)]
    validator: ParenValidator,
    #[rustyline(Completer)]
    completer: LispCompleter,
}

/// Keeps reading lines until every opened parenthesis is closed; a stray
/// closing parenthesis is rejected immediately.
struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut depth: i32 = 0;
        for (i, c) in ctx.input().chars().enumerate() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Ok(ValidationResult::Invalid(Some(format!(
                            "  - Unmatched ')' at position {}",
                            i
                        ))));
                    }
                }
                _ => {}
            }
        }

        if depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

fn main() -> rustyline::Result<()> {
    println!("tinylisp REPL v0.1.0");
    println!("Type 'exit' or press Ctrl-D to quit.");

    let session = Session::new();
    let helper = InputHelper {
        validator: ParenValidator,
        // Share the session's environment so completion sees new defines
        completer: LispCompleter {
            env: session.env(),
        },
    };

    let config = rustyline::config::Config::builder()
        .edit_mode(rustyline::EditMode::Vi)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history("tinylisp_history.txt").is_err() {
        println!("No previous history.");
    }

    loop {
        let readline = rl.readline("tinylisp> ");
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input.eq_ignore_ascii_case("exit") {
                    break;
                }

                match session.eval(trimmed_input) {
                    Ok(result) => println!("{}", result),
                    Err(e) => e.pretty_print(trimmed_input),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history("tinylisp_history.txt")
}
