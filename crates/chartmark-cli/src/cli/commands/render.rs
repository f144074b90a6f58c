//! Render command handler.

use anyhow::{Context, Result};
use chartmark_core::config::Config;
use chartmark_core::html;

use super::Input;

/// Prints the HTML fragment (or the segment tree as JSON) for a reply.
pub fn run(input: &Input, json: bool, config: &Config) -> Result<()> {
    let fragment = input.fragment()?;

    if json {
        let out = serde_json::to_string_pretty(&fragment).context("serialize fragment")?;
        println!("{out}");
    } else {
        println!("{}", html::render_fragment(&fragment, config.render));
    }
    Ok(())
}
