//! `warmswap fingerprint`: show what the reload coordinator compares.

use crate::config::cfg;
use crate::log;
use crate::unit::{Fingerprint, Unit};
use crate::utils::path::resolve_path;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Print the initializer token runs and digest of a unit listing.
///
/// Relative paths are tried against cwd first, then the compiled-output
/// directory.
pub fn run_fingerprint(path: &Path) -> Result<()> {
    let path = resolve_path(path, &cfg().watch.root);
    let unit = Unit::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    let fingerprint = Fingerprint::of(&unit);

    log!(
        "reload";
        "{}: {} runs, {} tokens, digest {}",
        unit.name,
        fingerprint.runs().len(),
        fingerprint.token_count(),
        fingerprint.digest()
    );

    let mut out = std::io::stdout().lock();
    render(&fingerprint, &mut out)?;
    out.flush()?;
    Ok(())
}

fn render(fingerprint: &Fingerprint, out: &mut impl Write) -> std::io::Result<()> {
    for (i, run) in fingerprint.runs().iter().enumerate() {
        writeln!(out, "run {i}:")?;
        for token in run {
            writeln!(out, "  {token}")?;
        }
    }
    Ok(())
}
