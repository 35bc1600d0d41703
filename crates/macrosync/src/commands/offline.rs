//! `tags` and `compare`: pure diffs that need no service connection.

use serde::Serialize;

use macrosync_core::{ChangeSet, compare, diff_tags, normalize};

use crate::cli::{CompareArgs, TagsArgs};
use crate::commands::print_json;
use crate::error::CliError;

pub fn tags(args: &TagsArgs) -> Result<(), CliError> {
    print_json(&diff_tags(&args.prechange, &args.postchange))
}

#[derive(Serialize)]
struct CompareOutput {
    changes: ChangeSet,
    requires_retag: bool,
}

pub fn compare_snapshots(args: &CompareArgs) -> Result<(), CliError> {
    let pre = normalize(Some(&args.prechange));
    let post = normalize(Some(&args.postchange));
    let changes = compare(&pre, &post);
    print_json(&CompareOutput {
        requires_retag: changes.requires_retag(),
        changes,
    })
}
