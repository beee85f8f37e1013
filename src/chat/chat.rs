use std::error::Error;
use std::io::Write;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use colored::*;

use crate::extract::DimensionGenerator;
use super::display::display_dimensions;

/// What the loop should do with one line of input
#[derive(Debug, PartialEq, Eq)]
pub(super) enum ChatCommand<'a> {
    Exit,
    Help,
    Clear,
    Query(&'a str),
    Empty,
}

pub(super) fn parse_command(input: &str) -> ChatCommand<'_> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ChatCommand::Empty;
    }
    match trimmed.to_lowercase().as_str() {
        "exit" | "quit" | "bye" => ChatCommand::Exit,
        "help" => ChatCommand::Help,
        "clear" => ChatCommand::Clear,
        _ => ChatCommand::Query(trimmed),
    }
}

fn print_help() {
    println!("\n{}", "minemind chat".cyan().bold());
    println!("{}", "=".repeat(60).bright_cyan());
    println!("{}  - Exit the chat", "exit, bye, quit".green());
    println!("{}             - Show this help message", "help".green());
    println!("{}            - Clear the screen", "clear".green());
    println!("Anything else is sent to the model, e.g. {}", "\"an expert level game\"".green());
    println!();
}

// --- Main Chat Loop ---

/// Reads requests from the terminal and shows the extracted dimensions.
pub fn chat_loop(generator: &mut DimensionGenerator) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("Starting chat session");
    print_help();

    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("> ") {
            Ok(input) => {
                let _ = rl.add_history_entry(input.as_str());
                match parse_command(&input) {
                    ChatCommand::Empty => continue,
                    ChatCommand::Exit => {
                        println!("Goodbye!");
                        break;
                    }
                    ChatCommand::Help => print_help(),
                    ChatCommand::Clear => {
                        print!("\x1B[2J\x1B[1;1H");
                        std::io::stdout().flush()?;
                    }
                    ChatCommand::Query(query) => {
                        let result = generator.generate_dimensions(query);
                        display_dimensions(result.as_ref());
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => return Err(Box::new(e)),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  "), ChatCommand::Empty);
        assert_eq!(parse_command("QUIT"), ChatCommand::Exit);
        assert_eq!(parse_command("bye\n"), ChatCommand::Exit);
        assert_eq!(parse_command("help"), ChatCommand::Help);
        assert_eq!(parse_command("clear"), ChatCommand::Clear);
        assert_eq!(
            parse_command("  hey fam can you generate a 3x3 grid with 2 mines? "),
            ChatCommand::Query("hey fam can you generate a 3x3 grid with 2 mines?")
        );
    }
}
