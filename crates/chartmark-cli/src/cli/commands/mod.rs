//! CLI command handlers.

pub mod config;
pub mod hydrate;
pub mod render;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chartmark_core::markup::transform_or_raw;
use chartmark_core::turn::render_turn;
use chartmark_types::{DisplayFragment, TurnReply};

/// Reply input shared by `render` and `hydrate`.
#[derive(Debug, Clone, Default)]
pub struct Input {
    pub file: Option<PathBuf>,
    pub turn: bool,
}

impl Input {
    /// Reads the input and transforms it into a display fragment.
    pub fn fragment(&self) -> Result<DisplayFragment> {
        let raw = self.read()?;

        if self.turn {
            let reply: TurnReply =
                serde_json::from_str(&raw).context("parse turn body as JSON")?;
            return Ok(render_turn(&reply));
        }

        Ok(transform_or_raw(strip_final_newline(&raw)))
    }

    fn read(&self) -> Result<String> {
        match &self.file {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("read reply from {}", path.display())),
            None => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("read reply from stdin")?;
                Ok(buf)
            }
        }
    }
}

/// Drops the line terminator editors and shells append to a file.
fn strip_final_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}
