/// Number of events requested by `/more` when no usable count is given
pub const DEFAULT_SCROLLBACK: u32 = 20;

/// Every command prefix the prompt can complete to
pub const COMPLETIONS: [&str; 6] = ["/help", "/join ", "/exit", "/members", "/more ", "/resend"];

/// A line typed at the prompt, interpreted against the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/join <index>`, carries the raw index token
    Join(String),
    Exit,
    Members,
    Resend,
    /// `/more <n>`, carries the number of events to request
    More(u32),
    Help,
    /// Free text to send to the viewed room
    Send(String),
    /// The line has no meaning in the current view
    Ignored,
}

impl Command {
    /// Parses a non-empty line. `viewing_room` guards the commands that only make sense in one view;
    /// a guarded command typed in the other view falls through to the next rule.
    pub fn parse(line: &str, viewing_room: bool) -> Self {
        if line.starts_with("/join ") && !viewing_room {
            Command::Join(second_token(line).to_string())
        } else if line == "/exit" && viewing_room {
            Command::Exit
        } else if line == "/members" && viewing_room {
            Command::Members
        } else if line == "/resend" && viewing_room {
            Command::Resend
        } else if (line.starts_with("/more ") || line == "/more") && viewing_room {
            Command::More(parse_count(second_token(line)))
        } else if line == "/help" {
            Command::Help
        } else if viewing_room {
            Command::Send(line.to_string())
        } else {
            Command::Ignored
        }
    }
}

fn second_token(line: &str) -> &str {
    line.split(' ').nth(1).unwrap_or_default()
}

/// Leading decimal digits of `token`, or [DEFAULT_SCROLLBACK] if there are none or they amount to zero
fn parse_count(token: &str) -> u32 {
    let digits: String = token.chars().take_while(char::is_ascii_digit).collect();

    match digits.parse::<u32>() {
        Ok(count) if count > 0 => count,
        _ => DEFAULT_SCROLLBACK,
    }
}

/// Commands starting with `line`, or all of them if none does
pub fn complete(line: &str) -> Vec<&'static str> {
    let hits: Vec<&'static str> = COMPLETIONS
        .iter()
        .copied()
        .filter(|completion| completion.starts_with(line))
        .collect();

    if hits.is_empty() {
        COMPLETIONS.to_vec()
    } else {
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_list_view_commands() {
        assert_eq!(Command::parse("/join 3", false), Command::Join("3".into()));
        assert_eq!(Command::parse("/help", false), Command::Help);
        assert_eq!(Command::parse("/exit", false), Command::Ignored);
        assert_eq!(Command::parse("/more 5", false), Command::Ignored);
        assert_eq!(Command::parse("hello", false), Command::Ignored);
    }

    #[test]
    fn test_room_view_commands() {
        assert_eq!(Command::parse("/exit", true), Command::Exit);
        assert_eq!(Command::parse("/members", true), Command::Members);
        assert_eq!(Command::parse("/resend", true), Command::Resend);
        assert_eq!(Command::parse("/help", true), Command::Help);
        assert_eq!(Command::parse("hello there", true), Command::Send("hello there".into()));
    }

    #[test]
    fn test_guarded_commands_fall_through_to_send() {
        assert_eq!(Command::parse("/join 1", true), Command::Send("/join 1".into()));
        assert_eq!(Command::parse("/exit ", true), Command::Send("/exit ".into()));
    }

    #[test]
    fn test_more_count() {
        assert_eq!(Command::parse("/more 5", true), Command::More(5));
        assert_eq!(Command::parse("/more 15abc", true), Command::More(15));
        assert_eq!(Command::parse("/more", true), Command::More(DEFAULT_SCROLLBACK));
        assert_eq!(Command::parse("/more ", true), Command::More(DEFAULT_SCROLLBACK));
        assert_eq!(Command::parse("/more lots", true), Command::More(DEFAULT_SCROLLBACK));
        assert_eq!(Command::parse("/more 0", true), Command::More(DEFAULT_SCROLLBACK));
    }

    #[test]
    fn test_join_keeps_raw_index_token() {
        assert_eq!(Command::parse("/join ", false), Command::Join(String::new()));
        assert_eq!(Command::parse("/join x y", false), Command::Join("x".into()));
    }

    #[test]
    fn test_completion() {
        assert_eq!(complete("/m"), vec!["/members", "/more "]);
        assert_eq!(complete("/j"), vec!["/join "]);
        assert_eq!(complete("/x"), COMPLETIONS.to_vec());
        assert_eq!(complete(""), COMPLETIONS.to_vec());
    }
}
