use clap::Parser;

/// Chunk extracted document text for embedding and vector storage.
///
/// Reads plain text, runs the two-stage semantic chunking pipeline, and
/// prints the outcome (chunks plus report) as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "mosaik", about = "Two-stage semantic document chunker")]
pub struct CliArgs {
    /// Input text file ("-" or omitted reads stdin)
    #[arg(long, short = 'i')]
    pub input: Option<String>,

    /// Document id (UUID); derived from the input path when not set
    #[arg(long)]
    pub document_id: Option<uuid::Uuid>,

    /// LLM provider for boundary review: ollama, openai, or anthropic
    #[arg(long, env = "LLM_PROVIDER")]
    pub provider: Option<String>,

    /// Oracle model override
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum concurrent boundary reviews
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-call oracle timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u32>,

    /// Target chunk size in characters
    #[arg(long)]
    pub target_size: Option<usize>,

    /// Skip boundary review entirely (stage-one split only)
    #[arg(long)]
    pub no_oracle: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}
