use clap::{CommandFactory, Parser};
use waymark::tooling::cli::Cli;

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["waymark", "browse"],
        vec!["waymark", "browse", "--at", "11", "--no-prefetch"],
        vec!["waymark", "show"],
        vec!["waymark", "show", "--at", "#11"],
        vec!["waymark", "show", "--path", "electronics/phones"],
        vec!["waymark", "resolve", "#11"],
        vec!["waymark", "id", "electronics/phones"],
        vec!["waymark", "id", "a/b/c", "--prefix"],
        vec!["waymark", "index"],
        vec!["waymark", "history", "list"],
        vec!["waymark", "history", "list", "--format", "json"],
        vec!["waymark", "history", "clear"],
        vec!["waymark", "init", "--force", "--path", "custom.toml"],
        vec!["waymark", "--log-level", "debug", "index"],
        vec!["waymark", "--config", "waymark.toml", "show"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_invalid_invocations() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["waymark"],
        vec!["waymark", "resolve"],
        vec!["waymark", "id"],
        vec!["waymark", "history"],
        vec!["waymark", "history", "list", "--format"],
        vec!["waymark", "teleport"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_err(), "expected parse failure for args: {args:?}");
    }
}

#[test]
fn every_subcommand_carries_help_text() {
    let command = Cli::command();
    for sub in command.get_subcommands() {
        assert!(
            sub.get_about().is_some(),
            "subcommand {} is missing help text",
            sub.get_name()
        );
    }
}

#[test]
fn help_lists_every_subcommand() {
    let mut command = Cli::command();
    let rendered = command.render_long_help().to_string();
    for name in ["browse", "show", "resolve", "id", "index", "history", "init"] {
        assert!(rendered.contains(name), "help should mention {name}");
    }
}

#[test]
fn global_log_flags_are_available_on_every_subcommand() {
    for sub in ["show", "index"] {
        let parsed = Cli::try_parse_from([
            "waymark",
            "--log-format",
            "json",
            "--log-output",
            "stderr",
            sub,
        ]);
        assert!(parsed.is_ok(), "log flags should parse before {sub}");
    }
}
