//! Main binary entry point for `astdiff`.
//!
//! This binary simply delegates to the shared `entry_point::run_with_args()` function
//! so it behaves exactly like the `astdiff-cli` binary.

use anyhow::Result;

fn main() -> Result<()> {
    let code = astdiff::entry_point::run_with_args(std::env::args().skip(1).collect())?;
    std::process::exit(code);
}
