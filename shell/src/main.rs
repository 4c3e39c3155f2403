//! Interactive front-end for a mounted filesystem image: a REPL that reads
//! a line, splits it into a command and the rest of the line, and calls
//! straight into [`diskfs::Filesystem`]. There is no line editing or
//! history here, only blocking reads from stdin — the image itself is the
//! only state that persists between commands.

use clap::Parser;
use colored::Colorize;
use diskfs::{Filesystem, FsError, Kind};
use std::io::{self, BufRead, Write};

/// Browse and edit a single-volume filesystem image from an interactive
/// shell.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// User name stamped as the owner of every entry created this session.
    #[arg(short, long, default_value = "system")]
    user: String,

    /// Path to the disk image. Created fresh, with an empty root
    /// directory, if nothing exists there yet.
    #[arg(default_value = "disk.img")]
    image: String,
}

/// What a dispatched command can fail with, beyond a plain filesystem
/// error: the REPL's own "please leave now" signal.
enum Outcome {
    /// The user asked to leave the shell.
    Exit,
    /// A namespace operation failed.
    Fs(FsError),
}

impl From<FsError> for Outcome {
    fn from(err: FsError) -> Outcome {
        Outcome::Fs(err)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut fs = Filesystem::mount(&args.image, args.user)?;

    // A plain Ctrl-C during the blocking read below must print a farewell
    // and exit cleanly rather than fall through to the default SIGINT
    // disposition.
    ctrlc::set_handler(|| {
        println!(" Bye!");
        std::process::exit(0);
    })?;

    let stdin = io::stdin();
    loop {
        let prompt_path = fs.pwd().unwrap_or_else(|_| "?".to_string());
        print!("{}@{} $ ", fs.user().cyan(), prompt_path.green());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.splitn(2, ' ');
        let command = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        match dispatch(&mut fs, command, rest) {
            Ok(Some(output)) => println!("{}", output),
            Ok(None) => {}
            Err(Outcome::Exit) => {
                println!("bye");
                break;
            }
            Err(Outcome::Fs(err)) => println!("{}: {}", command, err.to_string().red()),
        }
    }
    Ok(())
}

fn dispatch(fs: &mut Filesystem, command: &str, rest: &str) -> Result<Option<String>, Outcome> {
    match command {
        "exit" | "quit" => Err(Outcome::Exit),
        "pwd" => Ok(Some(fs.pwd()?)),
        "ls" => Ok(Some(format_listing(fs.ls()?))),
        "cd" => {
            fs.cd(rest)?;
            Ok(None)
        }
        "mkdir" => one_arg(rest, |path| fs.mkdir(path)),
        "rmdir" => one_arg(rest, |name| fs.rmdir(name)),
        "touch" => one_arg(rest, |path| fs.touch(path)),
        "rm" => one_arg(rest, |path| fs.rm(path)),
        "cat" => {
            let path = require_one(rest)?;
            Ok(Some(fs.cat(path)?))
        }
        "mv" => {
            let (path, new_name) = require_two(rest)?;
            fs.mv(path, new_name)?;
            Ok(None)
        }
        "mvdir" => {
            let (origin, destination) = require_two(rest)?;
            fs.mvdir(origin, destination)?;
            Ok(None)
        }
        "cp" => {
            let (src, dest) = require_two(rest)?;
            fs.cp(src, dest)?;
            Ok(None)
        }
        "echo" => {
            let (path, content) = parse_echo(rest).ok_or(FsError::BadArguments)?;
            fs.echo(path, content)?;
            Ok(None)
        }
        // A blank line is handled before dispatch is ever called; anything
        // else unrecognized is silently ignored rather than reported.
        _ => Ok(None),
    }
}

fn format_listing(entries: Vec<(String, Kind)>) -> String {
    entries
        .into_iter()
        .map(|(name, kind)| match kind {
            Kind::Directory => name.blue().bold().to_string(),
            Kind::File => name,
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn require_one(rest: &str) -> Result<&str, Outcome> {
    rest.split_whitespace().next().ok_or_else(|| FsError::BadArguments.into())
}

fn require_two(rest: &str) -> Result<(&str, &str), Outcome> {
    let mut tokens = rest.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(first), Some(second)) => Ok((first, second)),
        _ => Err(FsError::BadArguments.into()),
    }
}

/// Parse `echo "content here" >> path`: the destination path is the line's
/// last whitespace-separated token; the content is whatever sits strictly
/// between the first two double quotes appearing before `>>`. Anything
/// else in that leading segment (including none at all, or more than two
/// quotes) is rejected as a malformed command, matching the original
/// shell's own strict quoting rule.
fn parse_echo(rest: &str) -> Option<(&str, &str)> {
    let before_redirect = rest.splitn(2, ">>").next()?;
    let quoted: Vec<&str> = before_redirect.split('"').collect();
    if quoted.len() != 3 {
        return None;
    }
    let path = rest.split_whitespace().last()?;
    Some((path, quoted[1]))
}

fn one_arg<F>(rest: &str, op: F) -> Result<Option<String>, Outcome>
where
    F: FnOnce(&str) -> diskfs::Result<()>,
{
    let path = require_one(rest)?;
    op(path)?;
    Ok(None)
}
