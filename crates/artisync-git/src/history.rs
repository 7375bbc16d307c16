use artisync_backend::CommitRecord;
use log::warn;

const HEADER_DELIMITER: char = '|';

/// `--pretty` format producing one `<hash>|<committer date>` header per
/// commit, followed by that commit's paths when combined with `--name-only`.
pub const HISTORY_FORMAT: &str = "--pretty=format:%H|%cs";

/// Parse `git log --name-only` output produced with [`HISTORY_FORMAT`].
///
/// A line is a commit header only when the text before the delimiter is a
/// full hex object id. Path lines that happen to contain the delimiter are
/// kept as paths and reported, since they were ambiguous under the plain
/// "contains a pipe" rule.
#[must_use]
pub fn parse_history(output: &str) -> Vec<CommitRecord> {
    let mut commits: Vec<CommitRecord> = Vec::new();

    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if let Some((revision, date)) = parse_header(line) {
            commits.push(CommitRecord {
                revision: revision.to_string(),
                date: date.to_string(),
                paths: Vec::new(),
            });
            continue;
        }

        let Some(current) = commits.last_mut() else {
            continue;
        };

        if line.contains(HEADER_DELIMITER) {
            warn!(
                "History path {line:?} in commit {} contains the header delimiter",
                current.revision
            );
        }
        current.paths.push(line.replace('\\', "/"));
    }

    commits
}

fn parse_header(line: &str) -> Option<(&str, &str)> {
    let (revision, date) = line.split_once(HEADER_DELIMITER)?;
    let is_object_id = matches!(revision.len(), 40 | 64)
        && revision.chars().all(|ch| ch.is_ascii_hexdigit());
    is_object_id.then(|| (revision, date.trim()))
}
