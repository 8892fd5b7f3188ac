//! Turning a raw input line into a [`CommandLine`] record.

use std::path::PathBuf;

use crate::common::{CommandLine, Error, RedirectOp};
use crate::system::interface::ProcessId;

/// Expand every `$$` in the raw line to the interpreter's own pid.
pub(crate) fn expand_pid(line: &str, pid: ProcessId) -> String {
    line.replace("$$", &pid.to_string())
}

/// Parse one input line.
///
/// Returns `Ok(None)` for blank lines and comment lines (first token starts
/// with `#`). A trailing standalone `&` marks the command for background
/// execution wherever it falls; an interior `&` is an ordinary argument.
/// `<` and `>` each consume the following token as a filename; tokens after
/// the redirection section are dropped, as the line grammar never returns
/// to argument building.
pub(crate) fn parse(line: &str) -> Result<Option<CommandLine>, Error> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        None => return Ok(None),
        Some(first) if first.starts_with('#') => return Ok(None),
        Some(_) => {}
    }

    let background = tokens.last() == Some(&"&");
    if background {
        tokens.pop();
    }

    let mut args = Vec::new();
    let mut stdin = None;
    let mut stdout = None;

    let mut tokens = tokens.into_iter();
    while let Some(token) = tokens.next() {
        match token {
            "<" => stdin = Some(redirect_target(&mut tokens, RedirectOp::Input)?),
            ">" => stdout = Some(redirect_target(&mut tokens, RedirectOp::Output)?),
            _ if stdin.is_some() || stdout.is_some() => {}
            _ => args.push(token.to_string()),
        }
    }

    if args.is_empty() {
        // a lone `&` or a bare redirection: nothing to run
        return Ok(None);
    }

    Ok(Some(CommandLine {
        args,
        stdin,
        stdout,
        background,
    }))
}

fn redirect_target<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    op: RedirectOp,
) -> Result<PathBuf, Error> {
    match tokens.next() {
        None | Some("&") => Err(Error::RedirectWithoutTarget(op)),
        Some(target) => Ok(PathBuf::from(target)),
    }
}
