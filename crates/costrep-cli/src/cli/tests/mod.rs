//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_run_defaults() {
    match parse(&["costrep", "run"]) {
        CliCommand::Run { no_deliver, print } => {
            assert!(!no_deliver);
            assert!(!print);
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_flags() {
    match parse(&["costrep", "run", "--no-deliver", "--print"]) {
        CliCommand::Run { no_deliver, print } => {
            assert!(no_deliver);
            assert!(print);
        }
        _ => panic!("expected Run with flags"),
    }
}

#[test]
fn cli_parse_config() {
    match parse(&["costrep", "config"]) {
        CliCommand::Config => {}
        _ => panic!("expected Config"),
    }
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["costrep", "add", "x"]).is_err());
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["costrep"]).is_err());
}
