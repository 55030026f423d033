use teloxide::macros::BotCommands;
use teloxide::utils::command::ParseError;

// The deep-link payload is optional, so the whole tail (possibly empty) is
// the single argument.
fn parse_start_payload(input: String) -> Result<(String,), ParseError> {
    Ok((input.trim().to_string(),))
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum StartCommand {
    #[command(parse_with = parse_start_payload)]
    Start(String),
}
