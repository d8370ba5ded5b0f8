use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::{domain::events::ShellInput, usecases::contracts::ShellInputSource};

pub struct StdinInputSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinInputSource {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(io::stdin()).lines(),
        }
    }
}

impl Default for StdinInputSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShellInputSource for StdinInputSource {
    async fn next_input(&mut self) -> Result<Option<ShellInput>> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|line| ShellInput::parse(&line)))
    }
}

/// Scripted input. Once the script runs out it waits `linger` before
/// reporting end of input, so pending work can finish. Safe to drop
/// mid-wait: the next call resumes the same deadline.
#[cfg(test)]
pub struct MockInputSource {
    queue: std::collections::VecDeque<(std::time::Duration, ShellInput)>,
    linger: std::time::Duration,
    deadline: Option<tokio::time::Instant>,
}

#[cfg(test)]
impl MockInputSource {
    pub fn from(
        inputs: Vec<(std::time::Duration, ShellInput)>,
        linger: std::time::Duration,
    ) -> Self {
        Self {
            queue: inputs.into(),
            linger,
            deadline: None,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ShellInputSource for MockInputSource {
    async fn next_input(&mut self) -> Result<Option<ShellInput>> {
        let delay = self
            .queue
            .front()
            .map_or(self.linger, |(delay, _)| *delay);
        let deadline = *self
            .deadline
            .get_or_insert_with(|| tokio::time::Instant::now() + delay);

        tokio::time::sleep_until(deadline).await;
        self.deadline = None;

        Ok(self.queue.pop_front().map(|(_, input)| input))
    }
}
