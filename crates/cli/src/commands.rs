use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the source file and produce the batch plan
    Preflight {
        #[arg(long, help = "State document path (JSON)")]
        state: String,

        #[arg(
            long,
            help = "If specified, writes the updated state document here instead of stdout"
        )]
        output: Option<String>,

        #[arg(
            long,
            help = "Run exactly one budgeted invocation instead of looping to completion"
        )]
        single_pass: bool,

        #[arg(long, help = "Use a local directory as the bucket root instead of S3")]
        local: Option<String>,
    },
    /// Import one planned byte range from a worker input document
    Import {
        #[arg(long, help = "Worker input document path (JSON)")]
        input: String,

        #[arg(long, help = "Use a local directory as the bucket root instead of S3")]
        local: Option<String>,

        #[arg(
            long,
            help = "Directory for the JSONL sink; without it records are counted and discarded"
        )]
        sink: Option<String>,
    },
    /// Preflight then import every planned batch
    Run {
        #[arg(long, help = "Region of the source bucket")]
        bucket_region: String,

        #[arg(long, help = "Bucket holding the source file")]
        bucket: String,

        #[arg(long, help = "Key of the source file within the bucket")]
        key: String,

        #[arg(long, help = "Region of the target table")]
        table_region: String,

        #[arg(long, help = "Target table name")]
        table: String,

        #[arg(long, help = "Comma-separated list of numeric columns", default_value = "")]
        numeric_fields: String,

        #[arg(long, help = "Comma-separated list of boolean columns", default_value = "")]
        boolean_fields: String,

        #[arg(
            long,
            help = "Field delimiter: 'comma', 'tab', or a literal character",
            default_value = "comma"
        )]
        delimiter: String,

        #[arg(long, help = "Writer tasks per import worker", default_value_t = 8)]
        concurrency: usize,

        #[arg(
            long,
            help = "Preflight per-invocation budget in seconds",
            default_value_t = 300
        )]
        phase_duration_secs: u64,

        #[arg(long, help = "Import workers to run in parallel", default_value_t = 1)]
        parallel_workers: usize,

        #[arg(long, help = "Use a local directory as the bucket root instead of S3")]
        local: Option<String>,

        #[arg(
            long,
            help = "Directory for the JSONL sink; without it records are counted and discarded"
        )]
        sink: Option<String>,
    },
}
