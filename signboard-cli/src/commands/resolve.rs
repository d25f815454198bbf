//! `signboard resolve`: marker to notice number, without the daemon.

use anyhow::Result;
use clap::Args;

use signboard_core::resolve_index;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// The sign's lines, in order (quote empty lines as "").
    #[arg(num_args = 0.., allow_hyphen_values = true)]
    pub lines: Vec<String>,
}

impl ResolveArgs {
    pub fn run(self) -> Result<()> {
        println!("{}", resolve_index(&self.lines));
        Ok(())
    }
}
