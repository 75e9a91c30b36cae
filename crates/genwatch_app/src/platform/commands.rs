/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit,
    Like(String),
    Follow(String),
    Scroll(i64),
    Publish(String),
    Watch(String),
    History { page: u32, limit: u32 },
    Login(String),
    Logout,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "commands: submit | like <publication> | follow <user> | scroll <px> | \
publish <job> | watch <job> | history [page] [limit] | login <user> | logout | show | quit";

pub fn parse(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Ok(Command::Show);
    };
    let arg = |name: &str| {
        args.first()
            .map(|value| value.to_string())
            .ok_or_else(|| format!("{verb} needs a {name}"))
    };
    let command = match verb {
        "submit" | "s" => Command::Submit,
        "like" => Command::Like(arg("publication id")?),
        "follow" => Command::Follow(arg("user id")?),
        "scroll" => {
            let raw = arg("pixel offset")?;
            Command::Scroll(raw.parse().map_err(|_| format!("bad offset {raw}"))?)
        }
        "publish" => Command::Publish(arg("job id")?),
        "watch" => Command::Watch(arg("job id")?),
        "history" => {
            let page = number(args.first().copied(), 1)?;
            let limit = number(args.get(1).copied(), 10)?;
            Command::History { page, limit }
        }
        "login" => Command::Login(arg("user id")?),
        "logout" => Command::Logout,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command {other}")),
    };
    Ok(command)
}

fn number(raw: Option<&str>, default: u32) -> Result<u32, String> {
    match raw {
        Some(raw) => raw.parse().map_err(|_| format!("bad number {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse("submit"), Ok(Command::Submit));
        assert_eq!(parse("like p1"), Ok(Command::Like("p1".to_string())));
        assert_eq!(parse("  scroll   -40 "), Ok(Command::Scroll(-40)));
        assert_eq!(
            parse("history 3"),
            Ok(Command::History { page: 3, limit: 10 })
        );
        assert_eq!(parse(""), Ok(Command::Show));
    }

    #[test]
    fn reports_missing_or_bad_arguments() {
        assert_eq!(parse("follow"), Err("follow needs a user id".to_string()));
        assert_eq!(parse("scroll up"), Err("bad offset up".to_string()));
        assert!(parse("dance").is_err());
    }
}
