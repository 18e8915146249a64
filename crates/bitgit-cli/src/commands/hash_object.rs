use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use bitgit_object::ObjectType;
use bitgit_repository::ingest::{hash_bytes, hash_file};
use clap::Args;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct HashObjectArgs {
    /// Read the object from stdin
    #[arg(long)]
    stdin: bool,

    /// Actually write the object into the object database
    #[arg(short = 'w')]
    write: bool,

    /// Object type
    #[arg(short = 't', default_value = "blob")]
    obj_type: ObjectType,

    /// Files to hash
    #[arg(value_name = "file")]
    files: Vec<String>,
}

pub fn run(args: &HashObjectArgs, cli: &Cli) -> Result<i32> {
    // A repository is only needed when storing.
    let repo = if args.write { Some(open_repo(cli)?) } else { None };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.stdin {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        let oid = hash_bytes(&data, args.obj_type, repo.as_ref())?;
        writeln!(out, "{oid}")?;
    }

    for file in &args.files {
        let oid = hash_file(file, args.obj_type, repo.as_ref())
            .with_context(|| format!("cannot hash '{file}'"))?;
        writeln!(out, "{oid}")?;
    }

    Ok(0)
}
