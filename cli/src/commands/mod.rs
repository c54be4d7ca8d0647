// Copyright 2025 The Copybara Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod migrate;

use tracing::instrument;

use crate::command_error::CommandError;
use crate::ui::Ui;

/// Copybara - a tool for transforming and moving code between repositories.
#[derive(clap::Parser, Clone, Debug)]
#[command(name = "copybara", version)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print more diagnostic output; repeat for debug detail
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(clap::Subcommand, Clone, Debug)]
enum Command {
    Migrate(migrate::MigrateArgs),
}

#[instrument(skip_all)]
pub fn run_command(ui: &Ui, args: &Args) -> Result<(), CommandError> {
    match &args.command {
        Command::Migrate(args) => migrate::cmd_migrate(ui, args),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn verify_app() {
        Args::command().debug_assert();
    }
}
