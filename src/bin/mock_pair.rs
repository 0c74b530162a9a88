//! Mock subject pair binary for integration testing
//!
//! Implements just enough of the pair contract to exercise the harness
//! without the real protocol stack: the sender relays stdin lines to every
//! connected receiver over loopback TCP, and the receiver prints one
//! `;`-delimited line per delivered message
//! (`<delivered>;<identity>;verified;<payload>`).
//!
//! The session parameters are accepted and echoed to stderr but otherwise
//! ignored.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;

#[derive(Parser)]
#[command(name = "mock_pair", about = "Stand-in sender/receiver pair")]
struct Args {
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = 8)]
    layers: usize,

    #[arg(long)]
    key_lifetime: Option<usize>,

    #[arg(long)]
    key_charges: Option<usize>,

    #[arg(long, default_value_t = 1024 * 1024)]
    max_piece_size: usize,

    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Role to run: "sender" or "receiver"
    mode: String,

    /// Listen address (sender) or sender address (receiver)
    addr: String,

    /// Identity name echoed in receiver output
    name: String,
}

fn main() {
    let args = Args::parse();
    eprintln!(
        "mock {}: addr={} name={} seed={} layers={} key_lifetime={:?} key_charges={:?} \
         max_piece_size={} config={}",
        args.mode,
        args.addr,
        args.name,
        args.seed,
        args.layers,
        args.key_lifetime,
        args.key_charges,
        args.max_piece_size,
        args.config,
    );

    match args.mode.as_str() {
        "sender" => run_sender(&args),
        "receiver" => run_receiver(&args),
        other => {
            eprintln!("mock pair: unknown mode '{other}'");
            std::process::exit(2);
        }
    }
}

fn run_sender(args: &Args) {
    let listener = TcpListener::bind(&args.addr).expect("bind listen address");
    let peers: Arc<Mutex<Vec<TcpStream>>> = Arc::new(Mutex::new(Vec::new()));

    let accept_peers = Arc::clone(&peers);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            accept_peers.lock().unwrap().push(stream);
        }
    });

    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).unwrap_or(0);
        if n == 0 {
            break; // harness closed us
        }
        // Dead receivers drop out on the first failed write.
        let mut peers = peers.lock().unwrap();
        peers.retain_mut(|peer| peer.write_all(&line).and_then(|_| peer.flush()).is_ok());
    }
}

fn run_receiver(args: &Args) {
    let stream = connect_with_retry(&args.addr);
    let mut reader = BufReader::new(stream);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut delivered = 0usize;
    let mut payload = Vec::new();
    loop {
        payload.clear();
        let n = reader.read_until(b'\n', &mut payload).unwrap_or(0);
        if n == 0 {
            break; // sender gone
        }
        delivered += 1;
        let header = format!("{};{};verified;", delivered, args.name);
        out.write_all(header.as_bytes()).expect("write stdout");
        out.write_all(&payload).expect("write stdout");
        out.flush().expect("flush stdout");
    }
}

/// The sender may still be binding its socket when we start.
fn connect_with_retry(addr: &str) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(addr) {
            return stream;
        }
        thread::sleep(Duration::from_millis(50));
    }
    eprintln!("mock receiver: could not reach sender at {addr}");
    std::process::exit(2);
}
