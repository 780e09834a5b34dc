use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nyzo-wire", about = "Talk to a Nyzo verifier over the peer protocol")]
pub struct Opt {
    #[arg(long = "host", global = true, help = "Peer host (overrides configuration)")]
    pub host: Option<String>,
    #[arg(long = "port", global = true, help = "Peer port (overrides configuration)")]
    pub port: Option<u16>,
    #[arg(
        long = "config-dir",
        global = true,
        default_value = ".",
        help = "Directory holding config.default.toml and config.toml"
    )]
    pub config_dir: PathBuf,
    #[arg(short = 'v', long = "verbose", global = true, help = "Log at debug level")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "status", about = "Request the status lines of the peer")]
    Status,
    #[command(name = "block", about = "Request a range of blocks from the peer")]
    Block {
        #[arg(help = "First block height")]
        start: u64,
        #[arg(help = "Last block height (inclusive)")]
        end: u64,
        #[arg(
            long = "balance-list",
            help = "Also request the balance list at the start height"
        )]
        balance_list: bool,
    },
    #[command(
        name = "read-chain",
        about = "Decode a chain snapshot file and print its blocks"
    )]
    ReadChain {
        #[arg(help = "Path to the .nyzoblock file")]
        file: PathBuf,
    },
    #[command(
        name = "identity",
        about = "Print the identifier of the local key, creating it if needed"
    )]
    Identity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_with_globals() {
        let opt = Opt::try_parse_from([
            "nyzo-wire",
            "--host",
            "10.1.1.1",
            "block",
            "5",
            "9",
            "--balance-list",
            "--port",
            "9555",
        ])
        .unwrap();
        assert_eq!(opt.host.as_deref(), Some("10.1.1.1"));
        assert_eq!(opt.port, Some(9555));
        assert_eq!(opt.config_dir, PathBuf::from("."));
        match opt.command {
            Command::Block {
                start,
                end,
                balance_list,
            } => {
                assert_eq!((start, end), (5, 9));
                assert!(balance_list);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_read_chain_requires_a_file() {
        assert!(Opt::try_parse_from(["nyzo-wire", "read-chain"]).is_err());
        let opt =
            Opt::try_parse_from(["nyzo-wire", "-v", "read-chain", "chain.nyzoblock"]).unwrap();
        assert!(opt.verbose);
        assert!(matches!(opt.command, Command::ReadChain { .. }));
    }
}
