use clap::Parser;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ONNX model path
    #[arg(long, required = true)]
    pub model: String,

    /// newline-delimited class-names file
    #[arg(long, required = true)]
    pub names: String,

    /// address to bind the HTTP server to
    #[arg(long, default_value_t = String::from("0.0.0.0"))]
    pub host: String,

    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// run inference on the CUDA execution provider
    #[arg(long, default_value_t = false)]
    pub cuda: bool,
}
