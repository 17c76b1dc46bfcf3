use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{DateTime, FixedOffset};
use colored::Colorize;
use pit_sdk::{Blob, Commit, Identity, LogEntry, ObjectKind, Repository, Timestamp, Tree};
use serde_json::{json, Value};

use crate::cli::*;

/// Flags shared by every subcommand.
struct Globals {
    format: OutputFormat,
    repo: PathBuf,
    author_name: Option<String>,
    author_email: Option<String>,
}

impl Globals {
    fn json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    fn open(&self) -> anyhow::Result<Repository> {
        Ok(Repository::open(&self.repo)?)
    }

    /// Open the repository, applying any identity given on the command line
    /// or through the environment. A name without an email records an empty
    /// email, as `config user.name` does.
    fn open_with_identity(&self) -> anyhow::Result<Repository> {
        let mut repo = self.open()?;
        if self.author_name.is_some() || self.author_email.is_some() {
            let configured = repo.config().user.clone();
            let name = self
                .author_name
                .clone()
                .or_else(|| configured.as_ref().map(|u| u.name.clone()));
            let email = self
                .author_email
                .clone()
                .or_else(|| configured.as_ref().map(|u| u.email.clone()))
                .unwrap_or_default();
            let Some(name) = name else {
                bail!("an author email was given without an author name");
            };
            repo.set_identity(Identity::new(name, email)?);
        }
        Ok(repo)
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let globals = Globals {
        format: cli.format,
        repo: cli.repo,
        author_name: cli.author_name,
        author_email: cli.author_email,
    };
    match cli.command {
        Command::Init(args) => cmd_init(&globals, args),
        Command::HashObject(args) => cmd_hash_object(&globals, args),
        Command::Add(args) => cmd_add(&globals, args),
        Command::WriteTree(_) => cmd_write_tree(&globals),
        Command::Commit(args) => cmd_commit(&globals, args),
        Command::CatFile(args) => cmd_cat_file(&globals, args),
        Command::Log(args) => cmd_log(&globals, args),
        Command::Config(args) => cmd_config(&globals, args),
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(g: &Globals, args: InitArgs) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(|| g.repo.clone());
    fs::create_dir_all(&path).with_context(|| format!("cannot create {}", path.display()))?;
    let (repo, existed) = Repository::init(&path)?;
    let pit_dir = repo.root().join(pit_sdk::PIT_DIR);

    if g.json() {
        return print_json(&json!({
            "path": pit_dir.display().to_string(),
            "reinitialized": existed,
        }));
    }
    if existed {
        println!("Reinitialized existing pit repository in {}", pit_dir.display().to_string().bold());
    } else {
        println!("{} Initialized empty pit repository in {}", "✓".green().bold(), pit_dir.display().to_string().bold());
    }
    Ok(())
}

fn cmd_hash_object(g: &Globals, args: HashObjectArgs) -> anyhow::Result<()> {
    let id = if args.write {
        g.open()?
            .write_blob_from_file(&args.file)
            .with_context(|| format!("cannot store {}", args.file.display()))?
    } else {
        let file = fs::File::open(&args.file)
            .with_context(|| format!("cannot read {}", args.file.display()))?;
        let len = file.metadata()?.len();
        Blob::id_from_reader(len, file)
            .with_context(|| format!("cannot hash {}", args.file.display()))?
    };

    if g.json() {
        return print_json(&json!({ "id": id, "written": args.write }));
    }
    println!("{id}");
    Ok(())
}

fn cmd_add(g: &Globals, args: AddArgs) -> anyhow::Result<()> {
    let repo = g.open()?;
    let mut added = Vec::with_capacity(args.paths.len());
    let mut failed = 0usize;
    // One unreadable file does not stop the rest from being stored.
    for path in &args.paths {
        match repo.write_blob_from_file(path) {
            Ok(id) => added.push((path.display().to_string(), id)),
            Err(e) => {
                failed += 1;
                eprintln!("{} cannot add {}: {}", "✗".red().bold(), path.display(), e);
            }
        }
    }

    if g.json() {
        let items: Vec<Value> = added
            .iter()
            .map(|(path, id)| json!({ "path": path, "id": id }))
            .collect();
        return print_json(&Value::Array(items));
    }
    for (path, id) in &added {
        println!("  {} -> {}", path, id.to_hex().yellow());
    }
    if failed > 0 {
        bail!("{failed} of {} files could not be added", args.paths.len());
    }
    Ok(())
}

fn cmd_write_tree(g: &Globals) -> anyhow::Result<()> {
    let summary = g.open()?.snapshot_worktree()?;
    if g.json() {
        return print_json(&json!({
            "tree": summary.root,
            "blobs": summary.blobs,
            "trees": summary.trees,
        }));
    }
    println!("{}", summary.root);
    Ok(())
}

fn cmd_commit(g: &Globals, args: CommitArgs) -> anyhow::Result<()> {
    let repo = g.open_with_identity()?;
    // Fail on a missing identity before writing any objects.
    repo.identity()?;
    let summary = repo.snapshot_worktree()?;
    let id = repo.commit(summary.root, &args.message, args.parent)?;

    if g.json() {
        return print_json(&json!({
            "commit": id,
            "tree": summary.root,
            "parent": args.parent,
            "message": args.message,
        }));
    }
    let subject = args.message.lines().next().unwrap_or("");
    println!("{} [{}] {}", "✓".green().bold(), id.short_hex().yellow(), subject);
    println!("  commit {}", id);
    println!("  tree   {}", summary.root);
    if let Some(parent) = args.parent {
        println!("  parent {}", parent);
    }
    Ok(())
}

fn cmd_cat_file(g: &Globals, args: CatFileArgs) -> anyhow::Result<()> {
    let repo = g.open()?;
    let body = repo.read_object(args.kind, &args.id)?;

    match args.kind {
        ObjectKind::Blob => {
            if g.json() {
                return print_json(&json!({
                    "kind": args.kind,
                    "id": args.id,
                    "size": body.len(),
                    "content": String::from_utf8_lossy(&body),
                }));
            }
            io::stdout().write_all(&body)?;
        }
        ObjectKind::Tree => {
            let tree = Tree::parse(&body)?;
            if g.json() {
                let entries: Vec<Value> = tree
                    .iter()
                    .map(|e| {
                        json!({
                            "mode": e.mode.to_string(),
                            "kind": e.mode.object_kind(),
                            "id": e.object_id,
                            "name": e.name,
                        })
                    })
                    .collect();
                return print_json(&json!({ "kind": args.kind, "id": args.id, "entries": entries }));
            }
            for e in tree.iter() {
                println!("{} {} {}\t{}", e.mode, e.mode.object_kind(), e.object_id, e.name);
            }
        }
        ObjectKind::Commit => {
            if g.json() {
                let commit = Commit::parse(&body)?;
                return print_json(&commit_json(&args.id.to_hex(), &commit));
            }
            io::stdout().write_all(&body)?;
        }
    }
    Ok(())
}

fn cmd_log(g: &Globals, args: LogArgs) -> anyhow::Result<()> {
    let repo = g.open()?;
    let entries = repo.log(args.head, args.limit)?;

    if g.json() {
        let items: Vec<Value> = entries
            .iter()
            .map(|LogEntry { id, commit }| commit_json(&id.to_hex(), commit))
            .collect();
        return print_json(&Value::Array(items));
    }
    for LogEntry { id, commit } in &entries {
        if args.oneline {
            println!("{} {}", id.short_hex().yellow(), commit.summary());
            continue;
        }
        println!("{}", format!("commit {id}").yellow().bold());
        println!("Author: {}", commit.author().identity);
        println!("Date:   {}", format_when(&commit.author().when));
        println!();
        for line in commit.message().lines() {
            println!("    {line}");
        }
        println!();
    }
    Ok(())
}

fn cmd_config(g: &Globals, args: ConfigArgs) -> anyhow::Result<()> {
    let mut repo = Repository::open(&g.repo)?;
    let user = repo.config().user.clone();

    match (args.key.as_deref(), args.value) {
        (None, _) => {
            if g.json() {
                return print_json(&json!({ "user": user }));
            }
            match user {
                Some(user) => {
                    println!("{} = {}", "user.name".bold(), user.name);
                    println!("{} = {}", "user.email".bold(), user.email);
                }
                None => println!("No configuration keys set."),
            }
        }
        (Some(key), None) => {
            let value = match key {
                "user.name" => user.map(|u| u.name),
                "user.email" => user.map(|u| u.email),
                other => bail!("unknown config key: {other}"),
            };
            match value {
                Some(value) => println!("{value}"),
                None => bail!("{key} is not set"),
            }
        }
        (Some(key), Some(value)) => {
            let identity = match (key, user) {
                ("user.name", Some(user)) => Identity::new(value.as_str(), user.email)?,
                ("user.name", None) => Identity::new(value.as_str(), "")?,
                ("user.email", Some(user)) => Identity::new(user.name, value.as_str())?,
                ("user.email", None) => bail!("set user.name before user.email"),
                (other, _) => bail!("unknown config key: {other}"),
            };
            repo.set_identity(identity);
            repo.save_config()?;
            if g.json() {
                return print_json(&json!({ "key": key, "value": value }));
            }
            println!("Set {} = {}", key.bold(), value);
        }
    }
    Ok(())
}

fn commit_json(id: &str, commit: &Commit) -> Value {
    json!({
        "commit": id,
        "tree": commit.tree(),
        "parent": commit.parent(),
        "author": commit.author().identity.to_string(),
        "date": commit.author().when.seconds,
        "timezone": commit.author().when.offset_string(),
        "committer": commit.committer().identity.to_string(),
        "message": commit.message(),
    })
}

/// Render a timestamp in its recorded offset, falling back to the raw form.
fn format_when(when: &Timestamp) -> String {
    FixedOffset::east_opt(when.offset_minutes * 60)
        .and_then(|tz| DateTime::from_timestamp(when.seconds, 0).map(|utc| utc.with_timezone(&tz)))
        .map(|dt| dt.format("%a %b %e %H:%M:%S %Y %z").to_string())
        .unwrap_or_else(|| when.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn run(repo: &TempDir, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["--author-name", "Ada", "--author-email", "ada@example.com"];
        argv.extend_from_slice(args);
        run_bare(repo, &argv)
    }

    /// Run without the default identity flags.
    fn run_bare(repo: &TempDir, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["pit", "-C", repo.path().to_str().unwrap()];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv)?)
    }

    #[test]
    fn init_then_commit_twice() {
        let dir = TempDir::new().unwrap();
        run(&dir, &["init"]).unwrap();
        fs::write(dir.path().join("hello.txt"), "hello").unwrap();
        run(&dir, &["commit", "-m", "first"]).unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let ids = repo.store().all_ids().unwrap();
        // Blob, root tree, commit.
        assert_eq!(ids.len(), 3);
        let first = ids
            .into_iter()
            .find(|id| repo.read_commit(id).is_ok())
            .unwrap();

        fs::write(dir.path().join("hello.txt"), "hello again").unwrap();
        run(&dir, &["commit", "-m", "second", "--parent", &first.to_hex()]).unwrap();
        let ids = repo.store().all_ids().unwrap();
        let second = ids
            .into_iter()
            .find(|id| *id != first && repo.read_commit(id).is_ok())
            .unwrap();
        let log = repo.log(second, None).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].id, first);
        assert_eq!(log[0].commit.author().identity.to_string(), "Ada <ada@example.com>");
    }

    #[test]
    fn commands_need_an_initialized_repository() {
        let dir = TempDir::new().unwrap();
        let err = run(&dir, &["write-tree"]).unwrap_err();
        assert!(err.to_string().contains("not a pit repository"));
    }

    #[test]
    fn hash_object_without_write_stores_nothing() {
        let dir = TempDir::new().unwrap();
        run(&dir, &["init"]).unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();

        run(&dir, &["hash-object", file.to_str().unwrap()]).unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        assert!(repo.store().all_ids().unwrap().is_empty());

        run(&dir, &["hash-object", "-w", file.to_str().unwrap()]).unwrap();
        assert_eq!(repo.store().all_ids().unwrap().len(), 1);
    }

    #[test]
    fn hash_object_streams_the_same_id_it_stores() {
        let dir = TempDir::new().unwrap();
        run(&dir, &["init"]).unwrap();
        let file = dir.path().join("big.bin");
        let content: Vec<u8> = (0..50_000u32).map(|i| (i % 13) as u8).collect();
        fs::write(&file, &content).unwrap();

        run(&dir, &["hash-object", file.to_str().unwrap()]).unwrap();
        run(&dir, &["hash-object", "-w", file.to_str().unwrap()]).unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.store().all_ids().unwrap(), vec![Blob::new(content).id()]);
    }

    #[test]
    fn name_only_override_leaves_other_commands_working() {
        let dir = TempDir::new().unwrap();
        run_bare(&dir, &["init"]).unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let file = dir.path().join("a.txt");
        let file = file.to_str().unwrap();

        run_bare(&dir, &["--author-name", "Ada", "add", file]).unwrap();
        run_bare(&dir, &["--author-name", "Ada", "hash-object", "-w", file]).unwrap();
        run_bare(&dir, &["--author-name", "Ada", "write-tree"]).unwrap();
        run_bare(&dir, &["--author-email", "ada@example.com", "write-tree"]).unwrap();

        run_bare(&dir, &["--author-name", "Ada", "commit", "-m", "named"]).unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        let commit = repo
            .store()
            .all_ids()
            .unwrap()
            .into_iter()
            .find_map(|id| repo.read_commit(&id).ok())
            .unwrap();
        assert_eq!(commit.author().identity.name, "Ada");
        assert_eq!(commit.author().identity.email, "");
    }

    #[test]
    fn commit_with_email_only_and_no_config_fails() {
        let dir = TempDir::new().unwrap();
        run_bare(&dir, &["init"]).unwrap();
        let err = run_bare(&dir, &["--author-email", "a@example.com", "commit"]).unwrap_err();
        assert!(err.to_string().contains("without an author name"));
        let repo = Repository::open(dir.path()).unwrap();
        assert!(repo.store().all_ids().unwrap().is_empty());
    }

    #[test]
    fn commit_message_defaults() {
        let dir = TempDir::new().unwrap();
        run(&dir, &["init"]).unwrap();
        run(&dir, &["commit"]).unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        let commit = repo
            .store()
            .all_ids()
            .unwrap()
            .into_iter()
            .find_map(|id| repo.read_commit(&id).ok())
            .unwrap();
        assert_eq!(commit.message(), "Default commit message");
    }

    #[test]
    fn add_keeps_going_past_a_missing_file() {
        let dir = TempDir::new().unwrap();
        run(&dir, &["init"]).unwrap();
        let good = dir.path().join("good.txt");
        fs::write(&good, "good").unwrap();
        let missing = dir.path().join("missing.txt");

        let err = run(&dir, &["add", missing.to_str().unwrap(), good.to_str().unwrap()])
            .unwrap_err();
        assert!(err.to_string().contains("1 of 2 files"));
        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.store().all_ids().unwrap(), vec![Blob::new("good").id()]);
    }

    #[test]
    fn config_sets_identity() {
        let dir = TempDir::new().unwrap();
        run(&dir, &["init"]).unwrap();
        assert!(run(&dir, &["config", "user.email", "g@example.com"]).is_err());
        run(&dir, &["config", "user.name", "Grace"]).unwrap();
        run(&dir, &["config", "user.email", "g@example.com"]).unwrap();
        assert!(run(&dir, &["config", "core.editor", "vi"]).is_err());

        let repo = Repository::open(dir.path()).unwrap();
        let user = repo.config().user.clone().unwrap();
        assert_eq!(user.to_string(), "Grace <g@example.com>");
    }

    #[test]
    fn cat_file_rejects_wrong_kind() {
        let dir = TempDir::new().unwrap();
        run(&dir, &["init"]).unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        let blob = repo.write_blob(b"hello").unwrap();
        run(&dir, &["cat-file", "blob", &blob.to_hex()]).unwrap();
        assert!(run(&dir, &["cat-file", "commit", &blob.to_hex()]).is_err());
    }

    #[test]
    fn format_when_uses_recorded_offset() {
        let when = Timestamp::new(1_234_567_890, 540);
        assert_eq!(format_when(&when), "Sat Feb 14 08:31:30 2009 +0900");
    }
}
