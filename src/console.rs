use std::io::{BufRead, Write};

use log::warn;

use crate::{LapStateError, config::AnalyzerConfig};

const BANNER_RULE: &str = "========================================";

pub fn banner(title: &str) -> String {
    format!("{BANNER_RULE}\n  F1 TELEMETRY ANALYSIS - {title}  \n{BANNER_RULE}\n")
}

/// Asks which of the two configured datasets to analyse and returns the
/// number typed by the user. Input without a leading integer counts as 0.
pub fn prompt_dataset_choice(
    config: &AnalyzerConfig,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<i64, LapStateError> {
    writeln!(
        output,
        "Do you want to export {} or {} curve analyses? (1/0)",
        config.datasets[1].driver, config.datasets[0].driver
    )
    .and_then(|_| output.flush())
    .map_err(|e| LapStateError::PromptError { source: e })?;

    let mut answer = String::new();
    let read = input
        .read_line(&mut answer)
        .map_err(|e| LapStateError::PromptError { source: e })?;
    if read == 0 {
        warn!("No dataset selected, using {}", config.datasets[0].driver);
        return Ok(0);
    }

    Ok(parse_leading_integer(&answer).unwrap_or_else(|| {
        warn!(
            "Could not read a number from {:?}, using {}",
            answer.trim(),
            config.datasets[0].driver
        );
        0
    }))
}

fn parse_leading_integer(answer: &str) -> Option<i64> {
    let trimmed = answer.trim_start();
    let end = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && matches!(c, '+' | '-')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    trimmed[..end].parse().ok()
}
