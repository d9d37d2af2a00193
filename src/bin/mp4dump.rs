use anyhow::Context;
use clap::{Parser, ValueEnum};
use mp4avc::{Boxes, video_elementary_stream};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Content {
    /// The decoded box tree
    Boxes,
    /// NAL units of the first AVC video track
    Es,
}

#[derive(Parser, Debug)]
#[command(version, about = "Dump the MP4 box tree or its H.264 elementary stream as JSON")]
struct Args {
    /// MP4/ISOBMFF file path
    path: String,

    /// What to print
    #[arg(long, value_enum, default_value_t = Content::Boxes)]
    content: Content,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let file = File::open(&args.path).with_context(|| format!("opening {}", args.path))?;
    let mut reader = BufReader::new(file);

    let mut boxes = Boxes::new();
    let parsed = boxes.parse(&mut reader);
    if let Err(e) = &parsed {
        // Still show what was decoded before the failure.
        log::error!("{}: {}", args.path, e);
        if matches!(args.content, Content::Boxes) {
            print_json(&boxes, args.pretty)?;
        }
    }
    parsed.with_context(|| format!("parsing {}", args.path))?;

    match args.content {
        Content::Boxes => print_json(&boxes, args.pretty)?,
        Content::Es => {
            let es = video_elementary_stream(&boxes)
                .context("decoding the video elementary stream")?
                .context("no AVC video track")?;
            print_json(&es, args.pretty)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", s);
    Ok(())
}
