//! Command-line dashboard viewer.
//!
//! Decodes an Echo dashboard link (or its bare `data` payload) and prints the
//! exchange it carries.
//!
//! Usage:
//! ```
//! cargo run -p echo_core --bin echo_view -- 'http://localhost:8081/index2.html?data=H4sI...'
//! ```

use std::io::Read;

use echo_core::transport::{decode_viewer_payload, viewer::extract_data_param, ViewerState};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

struct Args {
    input: String,
    raw: bool,
    select: usize,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = parse_args()?;

    let data = extract_data_param(&args.input)
        .ok_or_else(|| anyhow::anyhow!("No data parameter in {}", args.input))?;
    let document = decode_viewer_payload(&data)?;

    if args.raw {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let mut state = ViewerState::from_document(document);
    if args.select > 0 && !state.select(args.select) {
        anyhow::bail!("No request at index {}", args.select);
    }

    for (index, label) in state.labels().iter().enumerate() {
        let marker = if matches!(&state, ViewerState::Multiple { selected, .. } if *selected == index) {
            '>'
        } else {
            ' '
        };
        println!("{marker} [{index}] {label}");
    }

    match state.current() {
        Some(exchange) => println!("{}", serde_json::to_string_pretty(exchange)?),
        None => println!("No request data"),
    }
    Ok(())
}

fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(LevelFilter::WARN)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut input = None;
    let mut raw = false;
    let mut select = 0;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--raw" => raw = true,
            "--select" => {
                if let Some(index) = args.next() {
                    select = index.parse()?;
                }
            }
            "--help" | "-h" => {
                eprintln!("Echo dashboard viewer");
                eprintln!();
                eprintln!("Usage: echo_view [OPTIONS] <VIEWER-URL | DATA | ->");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --raw            Print the decoded document as-is");
                eprintln!("  --select <N>     Show the N-th request of a multi-request link");
                eprintln!("  --help, -h       Show this help");
                std::process::exit(0);
            }
            "-" => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                input = Some(buf);
            }
            _ if input.is_none() => input = Some(arg),
            _ => eprintln!("Unknown argument: {arg}"),
        }
    }

    let input = input.ok_or_else(|| anyhow::anyhow!("Missing viewer URL or data (see --help)"))?;
    Ok(Args { input, raw, select })
}
