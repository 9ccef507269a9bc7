use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser};
use srv_keys::keys::{self, PrivateKey};
use srv_keys::models::Algorithm;
use srv_keys::{token, Error, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    long_version = srv_keys::LONG_VERSION,
    about = "generates a srv_jwt",
    long_about = None
)]
struct Args {
    /// file path to a private key
    private_key_file: PathBuf,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            ErrorKind::MissingRequiredArgument => return fail("missing positional argument"),
            ErrorKind::UnknownArgument if is_extra_positional(&e) => {
                return fail("too many arguments given")
            }
            _ => {
                e.print().ok();
                return ExitCode::FAILURE;
            }
        },
    };

    // Load environment variables
    dotenvy::dotenv().ok();

    srv_keys::logging::init();

    match run(&args) {
        Ok((alg, srv_jwt)) => {
            println!("algorithm: {}", alg);
            println!("srv_jwt: {}", srv_jwt);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&format!("{:#}", anyhow::Error::from(e))),
    }
}

fn run(args: &Args) -> Result<(Algorithm, String)> {
    let path = &args.private_key_file;
    if !path.exists() {
        return Err(Error::Argument(format!("{} does not exist", path.display())));
    }

    let key: PrivateKey = keys::decode_private_key(&keys::read_key_file(path)?)?;
    let alg = key.algorithm()?;
    debug!(%alg, path = %path.display(), "algorithm detected");

    let srv_jwt = token::issue_token(&key, alg)?;
    Ok((alg, srv_jwt))
}

// clap reports a surplus positional and an unknown flag with the same kind
fn is_extra_positional(err: &clap::Error) -> bool {
    matches!(
        err.get(ContextKind::InvalidArg),
        Some(ContextValue::String(arg)) if !arg.starts_with('-')
    )
}

fn fail(message: &str) -> ExitCode {
    eprintln!("Error: {}", message);
    eprintln!("{}", Args::command().render_help());
    ExitCode::FAILURE
}
