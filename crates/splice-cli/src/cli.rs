use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use splice_merge::{KeyOrder, Side};

#[derive(Parser)]
#[command(
    name = "splice",
    about = "splice — block-based structural diff and merge",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

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
    /// List the blocks of a document
    Blocks(BlocksArgs),
    /// Show conflicting blocks between two documents
    Diff(DiffArgs),
    /// Merge two documents by choosing a side at each conflict
    Merge(MergeArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OrderArg {
    Original,
    New,
}

impl From<OrderArg> for KeyOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Original => KeyOrder::Original,
            OrderArg::New => KeyOrder::New,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

/// Overrides shared by every command that extracts blocks.
#[derive(Args, Clone, Debug, Default)]
pub struct TokenArgs {
    /// Boundary token (repeatable); replaces the configured set
    #[arg(long = "token")]
    pub tokens: Vec<String>,
}

#[derive(Args)]
pub struct BlocksArgs {
    pub file: PathBuf,
    #[command(flatten)]
    pub tokens: TokenArgs,
}

#[derive(Args, Clone, Debug)]
pub struct SourceArgs {
    pub original: PathBuf,
    pub new: PathBuf,
    /// Which document's block order drives the conflict list
    #[arg(long)]
    pub order: Option<OrderArg>,
    #[command(flatten)]
    pub tokens: TokenArgs,
    /// Do not emit intraline hint lines
    #[arg(long)]
    pub no_hints: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Sides to take at successive conflicts, e.g. `left,right,left`
    #[arg(long, value_delimiter = ',')]
    pub take: Vec<SideArg>,
    /// Side taken for every conflict left after `--take`
    #[arg(long, default_value = "right")]
    pub default: SideArg,
    /// Write the merged text here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_blocks() {
        let cli = Cli::try_parse_from(["splice", "blocks", "a.py"]).unwrap();
        if let Command::Blocks(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("a.py"));
            assert!(args.tokens.tokens.is_empty());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff_with_order() {
        let cli = Cli::try_parse_from(["splice", "diff", "a.py", "b.py", "--order", "original"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.source.original, PathBuf::from("a.py"));
            assert_eq!(args.source.new, PathBuf::from("b.py"));
            assert_eq!(args.source.order, Some(OrderArg::Original));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_tokens() {
        let cli = Cli::try_parse_from(["splice", "diff", "a", "b", "--token", "fn ", "--token", "impl "]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.source.tokens.tokens, vec!["fn ", "impl "]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_merge_take_list() {
        let cli = Cli::try_parse_from([
            "splice", "merge", "a", "b", "--take", "left,right,left", "--default", "left", "-o", "out.py",
        ])
        .unwrap();
        if let Command::Merge(args) = cli.command {
            assert_eq!(args.take, vec![SideArg::Left, SideArg::Right, SideArg::Left]);
            assert_eq!(args.default, SideArg::Left);
            assert_eq!(args.output, Some(PathBuf::from("out.py")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn merge_defaults_to_right() {
        let cli = Cli::try_parse_from(["splice", "merge", "a", "b"]).unwrap();
        if let Command::Merge(args) = cli.command {
            assert!(args.take.is_empty());
            assert_eq!(args.default, SideArg::Right);
            assert!(!args.source.no_hints);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from(["splice", "--verbose", "--format", "json", "--config", "s.toml", "config"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("s.toml")));
        assert!(matches!(cli.command, Command::Config(_)));
    }

    #[test]
    fn side_and_order_conversions() {
        assert_eq!(Side::from(SideArg::Left), Side::Left);
        assert_eq!(KeyOrder::from(OrderArg::New), KeyOrder::New);
    }
}
