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

//! Terminal console for the workflow engine.

use std::io::BufRead as _;
use std::io::IsTerminal as _;
use std::io::Write as _;

use copybara_lib::console::Console;
use copybara_lib::error::MigrationResult;

/// Console writing to stderr. Prompts read stdin when it is a terminal;
/// non-interactive runs decline, so unattended migrations never hang.
#[derive(Debug, Default)]
pub struct Ui {}

impl Ui {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: &str) {
        eprintln!("{message}");
    }
}

impl Console for Ui {
    fn info(&self, message: &str) {
        eprintln!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("Warning: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("Error: {message}");
    }

    fn prompt_continue(&self, message: &str) -> MigrationResult<bool> {
        if !std::io::stdin().is_terminal() {
            eprintln!("{message}: not a terminal, assuming 'no'");
            return Ok(false);
        }
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            eprint!("{message} [y/n] ");
            std::io::stderr().flush().ok();
            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Ok(false);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => eprintln!("Please answer 'y' or 'n'"),
            }
        }
    }
}
