pub mod cat_file;
pub mod hash_object;
pub mod init;

use anyhow::Result;
use bitgit_repository::{LocateOptions, Repository};
use clap::Subcommand;
use tracing::debug;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Provide content or type and size information for repository objects
    CatFile(cat_file::CatFileArgs),
    /// Compute object ID and optionally store the object
    HashObject(hash_object::HashObjectArgs),
    /// Create an empty repository
    Init(init::InitArgs),
}

fn locate_options(cli: &Cli) -> LocateOptions {
    let mut options = LocateOptions::from_env();
    if let Some(git_dir) = &cli.git_dir {
        options.git_dir = Some(git_dir.clone());
    }
    options
}

/// The repository containing the current directory.
pub fn open_repo(cli: &Cli) -> Result<Repository> {
    let repo = Repository::locate(".", true, &locate_options(cli))?
        .ok_or_else(|| anyhow::anyhow!("not a git repository (or any of the parent directories): .git"))?;
    debug!(git_dir = %repo.git_dir().display(), "using repository");
    Ok(repo)
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::CatFile(args) => cat_file::run(args, &cli),
        Commands::HashObject(args) => hash_object::run(args, &cli),
        Commands::Init(args) => init::run(args, &cli),
    }
}
