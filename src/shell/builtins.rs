//! The commands the interpreter runs without forking.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::log::user_error;

pub(crate) enum Builtin {
    Exit,
    Cd,
    Status,
}

impl Builtin {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "exit" => Some(Self::Exit),
            "cd" => Some(Self::Cd),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// `cd` — without an argument (or with only a stray `&`) goes to `$HOME`;
/// a leading `~` expands to `$HOME`. Failure is reported and the loop
/// continues with the working directory unchanged.
pub(crate) fn change_directory(args: &[String]) {
    let Some(target) = resolve_cd_target(args.get(1).map(String::as_str)) else {
        user_error!("cannot change directory: HOME is not set");
        return;
    };

    if let Err(err) = env::set_current_dir(&target) {
        user_error!("cannot change directory to '{}': {err}", target.display());
    }
}

fn resolve_cd_target(argument: Option<&str>) -> Option<PathBuf> {
    let home = env::var_os("HOME");

    match argument {
        None | Some("&") => home.map(PathBuf::from),
        Some(path) => match path.strip_prefix('~') {
            Some(rest) => {
                let mut expanded: OsString = home?;
                expanded.push(rest);
                Some(PathBuf::from(expanded))
            }
            None => Some(PathBuf::from(path)),
        },
    }
}
