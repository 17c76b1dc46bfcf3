use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pit_sdk::{ObjectId, ObjectKind};

#[derive(Parser)]
#[command(
    name = "pit",
    about = "pit: a content-addressed snapshot store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Author name for new commits (overrides [user] in the config)
    #[arg(long, global = true, env = "PIT_AUTHOR_NAME")]
    pub author_name: Option<String>,

    /// Author email for new commits (overrides [user] in the config)
    #[arg(long, global = true, env = "PIT_AUTHOR_EMAIL")]
    pub author_email: Option<String>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty pit repository
    Init(InitArgs),
    /// Compute a file's blob ID, optionally storing it
    HashObject(HashObjectArgs),
    /// Store files as blobs
    Add(AddArgs),
    /// Store the working tree and print its root tree ID
    WriteTree(WriteTreeArgs),
    /// Store the working tree and record it as a commit
    Commit(CommitArgs),
    /// Print a stored object
    CatFile(CatFileArgs),
    /// Walk the commit chain from a commit
    Log(LogArgs),
    /// Get or set repository configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct HashObjectArgs {
    /// Also write the blob to the object store
    #[arg(short = 'w')]
    pub write: bool,
    pub file: PathBuf,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct WriteTreeArgs {}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long, default_value = "Default commit message")]
    pub message: String,
    /// Commit to chain onto (there is no HEAD)
    #[arg(long)]
    pub parent: Option<ObjectId>,
}

#[derive(Args)]
pub struct CatFileArgs {
    /// blob, tree, or commit
    pub kind: ObjectKind,
    pub id: ObjectId,
}

#[derive(Args)]
pub struct LogArgs {
    pub head: ObjectId,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// `user.name` or `user.email`
    pub key: Option<String>,
    pub value: Option<String>,
}
