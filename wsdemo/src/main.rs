use clap::{Parser, Subcommand};

mod server;

/// Demo WebSocket server for the wsframe core.
///
/// Serves a small page at `/` whose button sends messages over a WebSocket, pushes a message
/// to every connected page on a fixed interval, and logs what the pages send.
///
/// Examples:
///   wsdemo serve --addr 127.0.0.1:8080 --interval 500ms
///
#[derive(Parser)]
#[command(author, version)]
struct Cli {
    /// Log handshakes and frames as well.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve(server::Cmd),
}

fn main() {
    let args = Cli::parse();

    let level = if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    if let Err(err) = simple_logger::init_with_level(level) {
        eprintln!("{:?}", err);
    }

    let res = match args.command {
        Commands::Serve(cmd) => server::run(cmd),
    };
    if let Err(err) = res {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}
