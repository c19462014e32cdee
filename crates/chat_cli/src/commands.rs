use std::path::PathBuf;

pub const HELP_TEXT: &str = "\
Commands:
  /upload <path>   upload a document for /doc questions
  /doc <question>  ask about the uploaded document
  /history         show the backend's conversation history
  /clear           clear the backend's conversation history
  /help            show this help
  /quit            exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Upload(PathBuf),
    Doc(String),
    History,
    Clear,
    Help,
    Quit,
    MissingArgument(&'static str),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Prompt(String),
    Command(SlashCommand),
}

pub fn parse_input(line: &str) -> Input {
    if line.trim().is_empty() {
        return Input::Empty;
    }
    match parse_slash_command(line) {
        Some(command) => Input::Command(command),
        None => Input::Prompt(line.trim_end_matches(['\r', '\n']).to_owned()),
    }
}

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match command {
        "/upload" if argument.is_empty() => SlashCommand::MissingArgument("/upload <path>"),
        "/upload" => SlashCommand::Upload(PathBuf::from(argument)),
        "/doc" if argument.is_empty() => SlashCommand::MissingArgument("/doc <question>"),
        "/doc" => SlashCommand::Doc(argument.to_owned()),
        "/history" => SlashCommand::History,
        "/clear" => SlashCommand::Clear,
        "/help" => SlashCommand::Help,
        "/quit" | "/exit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command.to_owned()),
    };

    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_prompt() {
        assert_eq!(
            parse_input("  what is rust?\n"),
            Input::Prompt("  what is rust?".to_owned())
        );
        assert_eq!(parse_input(" \t "), Input::Empty);
    }

    #[test]
    fn commands_take_the_rest_of_the_line_as_argument() {
        assert_eq!(
            parse_slash_command("/upload  ./docs/My Report.pdf "),
            Some(SlashCommand::Upload(PathBuf::from("./docs/My Report.pdf")))
        );
        assert_eq!(
            parse_slash_command("/doc what are the key points?"),
            Some(SlashCommand::Doc("what are the key points?".to_owned()))
        );
    }

    #[test]
    fn missing_arguments_are_reported() {
        assert_eq!(
            parse_slash_command("/upload"),
            Some(SlashCommand::MissingArgument("/upload <path>"))
        );
        assert_eq!(
            parse_slash_command("/doc   "),
            Some(SlashCommand::MissingArgument("/doc <question>"))
        );
    }

    #[test]
    fn bare_commands_and_unknowns() {
        assert_eq!(parse_slash_command("/history"), Some(SlashCommand::History));
        assert_eq!(parse_slash_command("/clear"), Some(SlashCommand::Clear));
        assert_eq!(parse_slash_command("/help me"), Some(SlashCommand::Help));
        assert_eq!(parse_slash_command("/exit"), Some(SlashCommand::Quit));
        assert_eq!(
            parse_slash_command("/nope"),
            Some(SlashCommand::Unknown("/nope".to_owned()))
        );
        assert_eq!(parse_slash_command("no slash"), None);
    }
}
