// This is the entry point for the nyzo-wire command-line client
// I load the configuration, pick the command and talk to one peer
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use nyzo_wire::{
    storage, BlockRequest, Command, Config, Connection, KeyPair, Message, MessageContent,
    MessageType, Opt,
};
use std::process;

fn main() {
    let opt = Opt::parse();

    // I log at Info unless --verbose asks for the debug output (packet dumps included)
    let level = if opt.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::builder().filter_level(level).init();

    if let Err(e) = run(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    // Files and environment first, then the command line has the last word
    let mut config = Config::load(&opt.config_dir)?;
    if let Some(host) = opt.host {
        config.host = host;
    }
    if let Some(port) = opt.port {
        config.port = port;
    }
    run_command(opt.command, &config)
}

fn run_command(command: Command, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        // Ask the peer for its status lines
        Command::Status => {
            let key_pair = KeyPair::load_or_generate(&config.key_path)?;
            let request =
                Message::new(MessageType::StatusRequest17, MessageContent::Empty, &key_pair)?;
            let mut response = request_from_peer(config, &request)?;
            match response.get_content() {
                MessageContent::StatusResponse(status) => {
                    for line in status.get_lines() {
                        println!("{line}");
                    }
                }
                other => return Err(format!("Unexpected response content: {other:?}").into()),
            }
            if !response.verify_signature() {
                warn!("Status response signature did not verify");
            }
        }
        // Ask the peer for a block range, optionally with the starting balance list
        Command::Block {
            start,
            end,
            balance_list,
        } => {
            if end < start {
                return Err(format!("End height {end} is below start height {start}").into());
            }
            let key_pair = KeyPair::load_or_generate(&config.key_path)?;
            let request = Message::new(
                MessageType::BlockRequest11,
                MessageContent::BlockRequest(BlockRequest::new(start, end, balance_list)),
                &key_pair,
            )?;
            let mut response = request_from_peer(config, &request)?;
            if !response.verify_signature() {
                warn!("Block response signature did not verify");
            }
            match response.into_content() {
                MessageContent::BlockResponse(blocks) => {
                    if let Some(list) = blocks.get_initial_balance_list() {
                        println!("{}", list.to_json()?);
                    }
                    for block in blocks.get_blocks() {
                        println!("{}", block.to_json()?);
                    }
                    info!("Received {} blocks", blocks.get_blocks().len());
                }
                other => return Err(format!("Unexpected response content: {other:?}").into()),
            }
        }
        // Decode a chain snapshot from disk and print each block
        Command::ReadChain { file } => {
            let blocks = storage::read_file(&file)?;
            for block in &blocks {
                println!("{block}");
                if !block.signature_is_valid() {
                    warn!("Block {} has an invalid verifier signature", block.get_height());
                }
            }
            info!("Read {} blocks from {}", blocks.len(), file.display());
        }
        // Show which identifier this client signs its messages with
        Command::Identity => {
            let key_pair = KeyPair::load_or_generate(&config.key_path)?;
            println!("{}", key_pair.identifier());
        }
    }
    Ok(())
}

// I open one connection per command and close it once the reply is in
fn request_from_peer(
    config: &Config,
    request: &Message,
) -> Result<Message, Box<dyn std::error::Error>> {
    let connection = Connection::from_config(config);
    let response = connection.fetch(request);
    connection.close();
    match response? {
        Some(message) => Ok(message),
        None => Err(format!(
            "No response from {} within {:?}",
            config.peer_address(),
            config.network_timeout
        )
        .into()),
    }
}
