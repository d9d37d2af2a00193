use anyhow::Context;
use clap::Parser;
use mp4avc::parse_annexb;
use std::fs::File;
use std::io::BufReader;

#[derive(Parser, Debug)]
#[command(version, about = "Dump the NAL units of an H.264 Annex B stream as JSON")]
struct Args {
    /// Raw .h264 / .264 file path
    path: String,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let file = File::open(&args.path).with_context(|| format!("opening {}", args.path))?;
    let stream = parse_annexb(&mut BufReader::new(file)).with_context(|| format!("parsing {}", args.path))?;

    let out = if args.pretty {
        serde_json::to_string_pretty(&stream)?
    } else {
        serde_json::to_string(&stream)?
    };
    println!("{}", out);
    Ok(())
}
