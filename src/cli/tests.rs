use super::*;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }
}

use test_helpers::parse_args;

#[test]
fn no_subcommand_means_chat() {
    let args = parse_args(&["threadline"]);
    assert!(args.command.is_none());
    assert_eq!(args.command.unwrap_or(Commands::Chat), Commands::Chat);
}

#[test]
fn global_flags_parse_before_and_after_subcommand() {
    let cases: [&[&str]; 2] = [
        &[
            "threadline",
            "--api-url",
            "http://example.test",
            "-p",
            "anthropic",
            "threads",
        ],
        &[
            "threadline",
            "threads",
            "--api-url",
            "http://example.test",
            "--provider",
            "anthropic",
        ],
    ];

    for argv in cases {
        let args = parse_args(argv);
        assert_eq!(
            args.api_url.as_deref(),
            Some("http://example.test"),
            "argv={argv:?}"
        );
        assert_eq!(args.provider.as_deref(), Some("anthropic"), "argv={argv:?}");
        assert_eq!(args.command, Some(Commands::Threads), "argv={argv:?}");
    }
}

#[test]
fn log_flag_takes_a_file() {
    let args = parse_args(&["threadline", "-l", "/tmp/threadline.log"]);
    assert_eq!(args.log.as_deref(), Some("/tmp/threadline.log"));
}

#[test]
fn say_collects_prompt_words_and_thread() {
    let args = parse_args(&["threadline", "say", "--thread", "42", "plan", "a", "trip"]);
    assert_eq!(
        args.command,
        Some(Commands::Say {
            thread: Some("42".into()),
            prompt: vec!["plan".into(), "a".into(), "trip".into()],
        })
    );
}

#[test]
fn say_accepts_hyphenated_prompt() {
    let args = parse_args(&["threadline", "say", "what", "is", "-1", "squared"]);
    match args.command {
        Some(Commands::Say { thread, prompt }) => {
            assert!(thread.is_none());
            assert_eq!(prompt.join(" "), "what is -1 squared");
        }
        other => panic!("expected say, got {other:?}"),
    }
}

#[test]
fn set_without_key_or_value_is_allowed() {
    assert_eq!(
        parse_args(&["threadline", "set"]).command,
        Some(Commands::Set {
            key: None,
            value: Vec::new(),
        })
    );
    assert_eq!(
        parse_args(&["threadline", "set", "markdown", "off"]).command,
        Some(Commands::Set {
            key: Some("markdown".into()),
            value: vec!["off".into()],
        })
    );
}

#[test]
fn unset_requires_a_key() {
    assert!(Args::try_parse_from(["threadline", "unset"]).is_err());
    assert_eq!(
        parse_args(&["threadline", "unset", "api-url"]).command,
        Some(Commands::Unset {
            key: "api-url".into()
        })
    );
}

#[test]
fn auth_subcommands_parse() {
    assert_eq!(parse_args(&["threadline", "signup"]).command, Some(Commands::Signup));
    assert_eq!(parse_args(&["threadline", "login"]).command, Some(Commands::Login));
    assert_eq!(parse_args(&["threadline", "logout"]).command, Some(Commands::Logout));
}
