use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "depot",
    about = "Depot: content-addressed large object server",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve stored objects over HTTP
    Serve(ServeArgs),
    /// Print the pointer (oid and size) of a file
    Pointer(PointerArgs),
    /// Store files and associate them with a repository
    Import(ImportArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on, overriding the config
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Content store directory, overriding the config
    #[arg(long)]
    pub root: Option<PathBuf>,
    /// Repository catalog, overriding the config
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Args)]
pub struct PointerArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Repository as OWNER/NAME
    #[arg(long)]
    pub repo: String,
    #[arg(long, default_value = "lfs")]
    pub root: PathBuf,
    #[arg(long, default_value = "catalog.json")]
    pub catalog: PathBuf,
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_defaults() {
        let cli = Cli::try_parse_from(["depot", "serve"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert!(args.config.is_none());
            assert!(args.bind.is_none());
            assert!(args.root.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "depot", "serve", "--config", "depot.toml", "--bind", "0.0.0.0:8080", "--root", "/srv/lfs",
        ])
        .unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("depot.toml")));
            assert_eq!(args.bind.unwrap().port(), 8080);
            assert_eq!(args.root, Some(PathBuf::from("/srv/lfs")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve_rejects_bad_bind() {
        assert!(Cli::try_parse_from(["depot", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn parse_pointer() {
        let cli = Cli::try_parse_from(["depot", "pointer", "big.bin"]).unwrap();
        if let Command::Pointer(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("big.bin"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_import() {
        let cli = Cli::try_parse_from([
            "depot", "import", "--repo", "user2/repo1", "a.bin", "b.bin",
        ])
        .unwrap();
        if let Command::Import(args) = cli.command {
            assert_eq!(args.repo, "user2/repo1");
            assert_eq!(args.root, PathBuf::from("lfs"));
            assert_eq!(args.catalog, PathBuf::from("catalog.json"));
            assert_eq!(args.files.len(), 2);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_import_requires_files() {
        assert!(Cli::try_parse_from(["depot", "import", "--repo", "user2/repo1"]).is_err());
    }

    #[test]
    fn parse_verbose_global() {
        let cli = Cli::try_parse_from(["depot", "pointer", "x", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
