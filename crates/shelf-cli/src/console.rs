use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Read, Write};

use owo_colors::OwoColorize;
use shelf_core::prompt::{PromptRequest, Prompter};

/// Numbered prompts on stdout, answers read line by line.
///
/// When stdin carries data (`shelf add < titles.txt`) answers come from the
/// controlling terminal instead. Without any terminal every prompt is skipped.
pub struct ConsolePrompter {
    input: Option<Box<dyn BufRead>>,
}

impl ConsolePrompter {
    pub fn new(stdin_is_data: bool) -> Self {
        let input: Option<Box<dyn BufRead>> = if !stdin_is_data && io::stdin().is_terminal() {
            Some(Box::new(BufReader::new(io::stdin())))
        } else {
            match File::open("/dev/tty") {
                Ok(tty) => Some(Box::new(BufReader::new(tty))),
                Err(e) => {
                    tracing::debug!("no terminal for prompts: {e}");
                    None
                }
            }
        };
        Self { input }
    }

    fn read_line(&mut self) -> Option<String> {
        let input = self.input.as_mut()?;
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                self.input = None;
                None
            }
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Prompter for ConsolePrompter {
    fn choose(&mut self, request: &PromptRequest) -> Option<usize> {
        if self.input.is_none() {
            return None;
        }
        println!();
        println!("{}", request.question.bold());
        for (i, option) in request.options.iter().enumerate() {
            println!("  {}. {option}", (i + 1).cyan());
        }
        println!("  {}. {}", "0".cyan(), request.skip_label.dimmed());

        loop {
            print!("Enter choice (0-{}): ", request.options.len());
            let _ = io::stdout().flush();
            let line = self.read_line()?;
            match line.parse::<usize>() {
                Ok(0) => return None,
                Ok(n) if n <= request.options.len() => return Some(n - 1),
                _ => println!("{}", "Invalid choice, try again.".red()),
            }
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        if self.input.is_none() {
            return false;
        }
        print!("{} {} ", question.yellow(), "(y/n):".dimmed());
        let _ = io::stdout().flush();
        matches!(self.read_line().as_deref(), Some("y" | "Y" | "yes"))
    }

    fn is_interactive(&self) -> bool {
        self.input.is_some()
    }
}

/// One title per line: trimmed, blank lines dropped, duplicates removed in order.
pub fn read_titles(reader: impl Read) -> io::Result<Vec<String>> {
    let mut titles: Vec<String> = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let title = line.trim();
        if title.is_empty() || titles.iter().any(|t| t == title) {
            continue;
        }
        titles.push(title.to_string());
    }
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_titles_dedupes_in_order() {
        let input = "Inception\n\n  Heat (1995)  \nInception\r\nLoot\n";
        let titles = read_titles(input.as_bytes()).unwrap();
        assert_eq!(titles, vec!["Inception", "Heat (1995)", "Loot"]);
    }

    #[test]
    fn test_prompter_without_terminal_skips() {
        let mut prompter = ConsolePrompter { input: None };
        let request = PromptRequest::new("Pick", vec!["a".into()], "Skip");
        assert_eq!(prompter.choose(&request), None);
        assert!(!prompter.confirm("Overwrite?"));
        assert!(!prompter.is_interactive());
    }

    #[test]
    fn test_prompter_retries_invalid_input() {
        let answers = "7\nabc\n2\ny\n";
        let mut prompter = ConsolePrompter {
            input: Some(Box::new(BufReader::new(answers.as_bytes()))),
        };
        let request = PromptRequest::new("Pick", vec!["a".into(), "b".into()], "Skip");
        assert_eq!(prompter.choose(&request), Some(1));
        assert!(prompter.confirm("Overwrite?"));
    }
}
