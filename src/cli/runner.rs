//! CLI command runner.
//!
//! Dispatches a parsed command to the app controller and renders the result.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::models::{CaptureEvent, Draft, DraftKind, Spark};

use super::args::{Command, SettingsCommand};
use super::bootstrap::CliContext;
use super::output::{print_drafts, print_json, print_notice, print_spark, print_sparks};

/// Execute the command in `ctx.args`.
pub async fn run(ctx: &mut CliContext) -> Result<()> {
    let json_mode = ctx.args.json;

    match ctx.args.command.clone() {
        Command::Capture {
            text,
            url,
            title,
            generate,
        } => {
            let spark = ctx.app.capture(CaptureEvent::new(text, url, title)).await?;
            if generate {
                ctx.app.generate(&spark.id).await?;
            }
            print_spark(active(ctx, &spark.id)?, json_mode)?;
        }

        Command::List => print_sparks(&ctx.app.state().sparks, json_mode)?,

        Command::Show { id } => {
            let id = resolve_spark_id(&ctx.app.state().sparks, &id)?;
            ctx.app.select(&id)?;
            print_spark(active(ctx, &id)?, json_mode)?;
        }

        Command::Generate { id, language } => {
            let id = resolve_spark_id(&ctx.app.state().sparks, &id)?;
            let language = language.unwrap_or(ctx.app.state().settings.language);
            if !json_mode {
                eprintln!("Generating drafts...");
            }
            let drafts = ctx.app.generate_in(&id, language).await?;
            print_drafts(&drafts, json_mode)?;
        }

        Command::Edit { id, draft, content } => {
            let id = resolve_spark_id(&ctx.app.state().sparks, &id)?;
            let draft_id = resolve_draft(active(ctx, &id)?, &draft)?.id.clone();
            ctx.app.edit_draft(&id, &draft_id, &content).await?;
            print_notice("Draft updated", json_mode);
            if json_mode {
                print_spark(active(ctx, &id)?, json_mode)?;
            }
        }

        Command::Delete { id } => {
            let id = resolve_spark_id(&ctx.app.state().sparks, &id)?;
            ctx.app.delete_spark(&id).await?;
            notice(ctx);
        }

        Command::Post { id, draft } => {
            let id = resolve_spark_id(&ctx.app.state().sparks, &id)?;
            let content = resolve_draft(active(ctx, &id)?, &draft)?.content.clone();
            ctx.app.queue_post(&content).await?;
            notice(ctx);
        }

        Command::Demo => {
            let spark = ctx.app.add_demo().await?;
            notice(ctx);
            print_spark(&spark, json_mode)?;
        }

        Command::Settings { action } => run_settings(ctx, action).await?,
    }

    Ok(())
}

async fn run_settings(ctx: &mut CliContext, action: SettingsCommand) -> Result<()> {
    let json_mode = ctx.args.json;

    match action {
        SettingsCommand::Get { key: None } => print_json(&ctx.settings_manager.get().await)?,
        SettingsCommand::Get { key: Some(key) } => {
            let value = ctx.settings_manager.get_value(&key).await?;
            match value {
                Value::String(s) if !json_mode => println!("{}", s),
                other => print_json(&other)?,
            }
        }
        SettingsCommand::Set { key, value } => {
            ctx.settings_manager
                .set_value(&key, parse_setting_value(&value))
                .await?;
            ctx.app.load().await?;
            print_notice("Settings saved!", json_mode);
        }
        SettingsCommand::Reset => {
            ctx.settings_manager.reset().await?;
            ctx.app.load().await?;
            print_notice("Settings reset to defaults", json_mode);
        }
        SettingsCommand::Path => println!("{}", ctx.store_path.display()),
    }

    Ok(())
}

fn notice(ctx: &CliContext) {
    if let Some(message) = &ctx.app.state().notice {
        print_notice(message, ctx.args.json);
    }
}

fn active<'a>(ctx: &'a CliContext, id: &str) -> Result<&'a Spark> {
    match ctx.app.state().sparks.iter().find(|s| s.id == id) {
        Some(spark) => Ok(spark),
        None => bail!("Spark not found: {}", id),
    }
}

/// Values are JSON when they parse as JSON, plain text otherwise.
fn parse_setting_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Find the one spark whose id starts with `prefix`.
fn resolve_spark_id(sparks: &[Spark], prefix: &str) -> Result<String> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        bail!("Spark id is required");
    }

    if let Some(exact) = sparks.iter().find(|s| s.id == prefix) {
        return Ok(exact.id.clone());
    }

    let matches: Vec<&Spark> = sparks.iter().filter(|s| s.id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [one] => Ok(one.id.clone()),
        [] => bail!("Spark not found: {}", prefix),
        many => bail!("'{}' matches {} sparks, use a longer prefix", prefix, many.len()),
    }
}

/// Find a draft by id (or id prefix) or by kind name.
fn resolve_draft<'a>(spark: &'a Spark, reference: &str) -> Result<&'a Draft> {
    if !spark.has_drafts() {
        bail!("Spark {} has no drafts yet, run `lumina generate` first", spark.id);
    }

    if let Ok(kind) = reference.parse::<DraftKind>() {
        if let Some(draft) = spark.drafts.iter().find(|d| d.kind == kind) {
            return Ok(draft);
        }
    }

    let matches: Vec<&Draft> = spark
        .drafts
        .iter()
        .filter(|d| d.id.starts_with(reference))
        .collect();
    match matches.as_slice() {
        [one] => Ok(one),
        [] => bail!("No draft '{}' on spark {}", reference, spark.id),
        many => bail!("'{}' matches {} drafts, use a longer prefix", reference, many.len()),
    }
}
