use anyhow::Result;
use clap::Parser;
use srv_keys::config;
use srv_keys::provision::{self, Layout};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    long_version = srv_keys::LONG_VERSION,
    about = "Generate login, file access and json list key pairs, issue a srv_jwt and patch config.yaml",
    long_about = "Generate login, file access and json list key pairs, issue a srv_jwt and patch config.yaml.\n\n\
                  The server directory is taken from SRV_DIR (default: current directory), \
                  the config file from CONFIG_FILE (default: $SRV_DIR/config.yaml)."
)]
struct Args {}

fn main() -> Result<()> {
    let _args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    srv_keys::logging::init();

    let settings = config::get_settings();
    let layout = Layout::from_settings(settings);
    info!("Provisioning keys for {}", settings.srv_dir.display());

    provision::run(&layout, |line| println!("{}", line))?;

    Ok(())
}
