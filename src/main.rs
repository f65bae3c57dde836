use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;

use yolov4_tiny_rs::{AppState, Args, PreprocessConfig, Processor, YoloDetector, serve};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let detector = YoloDetector::new(&args.model, &args.names, args.cuda)?;
    let state = AppState::new(detector, Processor::new(PreprocessConfig::default()));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    serve(addr, state).await
}
