//! Directory child tables are kept sorted by name so a lookup is a binary
//! search rather than a linear scan — at the cost of a comparison needing
//! to fetch and decode the candidate inode each step, since the name isn't
//! stored in the table itself.

use crate::error::Result;

/// Binary-search `table` for `name`, fetching each candidate's name through
/// `fetch_name`. Returns `(true, index)` if found, `(false, index)` where
/// `index` is the sorted insertion point otherwise — mirroring the slot a
/// subsequent `insert` should use.
pub fn lookup<F>(table: &[u16], name: &str, mut fetch_name: F) -> Result<(bool, usize)>
where
    F: FnMut(u16) -> Result<String>,
{
    let mut lo = 0usize;
    let mut hi = table.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let candidate = fetch_name(table[mid])?;
        match candidate.as_str().cmp(name) {
            std::cmp::Ordering::Equal => return Ok((true, mid)),
            std::cmp::Ordering::Less => lo = mid + 1,
            std::cmp::Ordering::Greater => hi = mid,
        }
    }
    Ok((false, lo))
}
