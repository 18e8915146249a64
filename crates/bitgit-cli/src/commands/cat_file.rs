use std::io::{self, Write};

use anyhow::{bail, Result};
use bitgit_loose::LooseError;
use bitgit_object::ObjectType;
use bitgit_repository::ingest::{pretty_object, read_object, show_object};
use bitgit_repository::{LooseRevisionResolver, RepoError, Repository, ResolveError, ResolveRevision};
use clap::Args;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct CatFileArgs {
    /// Show object type
    #[arg(short = 't', conflicts_with_all = ["size", "pretty", "exists"])]
    type_only: bool,

    /// Show object size
    #[arg(short = 's', conflicts_with_all = ["type_only", "pretty", "exists"])]
    size: bool,

    /// Pretty-print the object content
    #[arg(short = 'p', conflicts_with_all = ["type_only", "size", "exists"])]
    pretty: bool,

    /// Exit with zero status if the object exists and is valid
    #[arg(short = 'e', conflicts_with_all = ["type_only", "size", "pretty"])]
    exists: bool,

    /// Either <object> (with -t/-s/-p/-e) or <type> <object>
    #[arg(value_name = "arg", num_args = 1..=2, required = true)]
    positional: Vec<String>,
}

impl CatFileArgs {
    fn has_mode_flag(&self) -> bool {
        self.type_only || self.size || self.pretty || self.exists
    }
}

pub fn run(args: &CatFileArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let resolver = LooseRevisionResolver;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let name = match (args.has_mode_flag(), args.positional.as_slice()) {
        (true, [name]) => name.as_str(),
        (false, [type_name, name]) => {
            let expected: ObjectType = type_name
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid object type \"{type_name}\""))?;
            out.write_all(&show_object(&repo, name, expected, &resolver)?)?;
            return Ok(0);
        }
        _ => bail!("usage: bitgit cat-file (-t | -s | -p | -e | <type>) <object>"),
    };

    if args.exists {
        return exists(&repo, name, &resolver);
    }

    if args.pretty {
        let (_, object) = read_object(&repo, name, &resolver)?;
        out.write_all(&pretty_object(&object))?;
        return Ok(0);
    }

    let oid = resolver.resolve(&repo, name)?;
    let (obj_type, size) = repo.objects().read_header(&oid)?;
    if args.type_only {
        writeln!(out, "{obj_type}")?;
    } else {
        writeln!(out, "{size}")?;
    }
    Ok(0)
}

/// Exit status 1 without a message when the object is absent.
fn exists(repo: &Repository, name: &str, resolver: &dyn ResolveRevision) -> Result<i32> {
    match read_object(repo, name, resolver) {
        Ok(_) => Ok(0),
        Err(RepoError::Resolve(ResolveError::NotFound(_)))
        | Err(RepoError::Loose(LooseError::NotFound(_))) => Ok(1),
        Err(e) => Err(e.into()),
    }
}
