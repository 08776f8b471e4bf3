use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "notary",
    about = "Document notarization: anchor fingerprints, verify documents, audit checks",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Directory holding the ledger log, archive database and retained content
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Notarize a document
    Submit(SubmitArgs),
    /// Verify a document by its identifier
    Verify(VerifyArgs),
    /// List archived documents, newest first
    List,
    /// Show archive and verification counters
    Stats,
    /// Show the verification audit trail of one document
    History(HistoryArgs),
    /// Re-verify the ledger hash chain
    CheckLedger,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct SubmitArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub actor: String,
    /// Record this filename instead of the file's own name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub identifier: String,
    /// Compare this file against the anchored fingerprint
    #[arg(long)]
    pub file: Option<PathBuf>,
    #[arg(long, default_value = "anonymous")]
    pub actor: String,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub identifier: String,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_submit() {
        let cli = Cli::try_parse_from(["notary", "submit", "deed.pdf", "--actor", "alice"]).unwrap();
        if let Command::Submit(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("deed.pdf"));
            assert_eq!(args.actor, "alice");
            assert_eq!(args.name, None);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn submit_requires_actor() {
        assert!(Cli::try_parse_from(["notary", "submit", "deed.pdf"]).is_err());
    }

    #[test]
    fn parse_verify_lookup_only() {
        let cli = Cli::try_parse_from(["notary", "verify", "0.0.123456"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert_eq!(args.identifier, "0.0.123456");
            assert!(args.file.is_none());
            assert_eq!(args.actor, "anonymous");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verify_with_file() {
        let cli = Cli::try_parse_from([
            "notary", "verify", "0.0.123456", "--file", "copy.pdf", "--actor", "bob",
        ])
        .unwrap();
        if let Command::Verify(args) = cli.command {
            assert_eq!(args.file, Some(PathBuf::from("copy.pdf")));
            assert_eq!(args.actor, "bob");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_check_ledger() {
        let cli = Cli::try_parse_from(["notary", "check-ledger"]).unwrap();
        assert!(matches!(cli.command, Command::CheckLedger));
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["notary", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "notary", "list", "--data-dir", "/srv/notary", "--format", "json", "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/notary")));
    }
}
