//! CLI output rendering for terminal and JSON modes.

use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;

use crate::models::{Draft, Spark};

/// Length of the id prefix shown in listings.
const SHORT_ID: usize = 8;

/// Snippet preview length in listings.
const PREVIEW_CHARS: usize = 60;

fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID).unwrap_or(id)
}

fn preview(text: &str) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS - 1).collect();
        format!("{}…", cut)
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// One line per spark.
pub fn render_spark_list(sparks: &[Spark]) -> String {
    if sparks.is_empty() {
        return "No sparks yet. Capture one with `lumina capture` or try `lumina demo`.\n"
            .to_string();
    }

    sparks
        .iter()
        .map(|spark| {
            format!(
                "{}  {:<24}  {} drafts  {}\n",
                short_id(&spark.id),
                spark.domain,
                spark.drafts.len(),
                preview(&spark.text)
            )
        })
        .collect()
}

pub fn render_drafts(drafts: &[Draft]) -> String {
    drafts
        .iter()
        .map(|draft| {
            let edited = if draft.is_edited { " (edited)" } else { "" };
            format!(
                "── {} [{}]{}\n{}\n\n",
                draft.kind.label(),
                short_id(&draft.id),
                edited,
                draft.content
            )
        })
        .collect()
}

pub fn render_spark(spark: &Spark) -> String {
    let mut out = format!(
        "{}\n{} ({})\nCaptured {}\n\n{}\n\n",
        spark.id,
        spark.page_title,
        spark.url,
        spark.captured_at.format("%Y-%m-%d %H:%M UTC"),
        spark.text
    );
    if spark.has_drafts() {
        out.push_str(&render_drafts(&spark.drafts));
    } else {
        out.push_str("No drafts yet. Run `lumina generate` to create some.\n");
    }
    out
}

pub fn print_sparks(sparks: &[Spark], json_mode: bool) -> Result<()> {
    if json_mode {
        return print_json(sparks);
    }
    print!("{}", render_spark_list(sparks));
    Ok(())
}

pub fn print_spark(spark: &Spark, json_mode: bool) -> Result<()> {
    if json_mode {
        return print_json(spark);
    }
    print!("{}", render_spark(spark));
    Ok(())
}

pub fn print_drafts(drafts: &[Draft], json_mode: bool) -> Result<()> {
    if json_mode {
        return print_json(drafts);
    }
    print!("{}", render_drafts(drafts));
    Ok(())
}

/// Short confirmation; suppressed in JSON mode.
pub fn print_notice(message: &str, json_mode: bool) {
    if !json_mode {
        eprintln!("{}", message);
    }
}
