use crate::{emit_success, OutputMode};
use anyhow::Context as _;
use chanbase::config::{self, ChanbaseConfig};
use chanbase::contract::{self, COLUMN_CHANNEL_ID, COLUMN_NAME};
use chanbase::ui::{self, Icons};
use chanbase::{ChannelProvider, ChannelUri, ContentValues, DbHelper, Selection};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Settings shared by every command
pub struct Context {
    pub output_mode: OutputMode,
    pub database: PathBuf,
    pub config_path: PathBuf,
}

impl Context {
    pub fn load(output_mode: OutputMode, database: Option<PathBuf>, config_path: PathBuf) -> anyhow::Result<Self> {
        let config = config::load_config(Some(&config_path))?;
        let base = std::env::current_dir()?;
        let database = config::resolve_database_path(database.as_deref(), config.as_ref(), &base);
        tracing::debug!("using database {}", database.display());

        Ok(Self {
            output_mode,
            database,
            config_path,
        })
    }

    fn provider(&self) -> ChannelProvider {
        let notifier = |uri: &ChannelUri| tracing::debug!(%uri, "data changed");
        ChannelProvider::new(DbHelper::new(&self.database), Arc::new(notifier))
    }
}

/// A bare row id is shorthand for the single-channel URI
fn parse_target(target: &str) -> anyhow::Result<ChannelUri> {
    let target = target.trim();
    if let Ok(id) = target.parse::<i64>() {
        return Ok(contract::channel_uri(id));
    }
    Ok(ChannelUri::parse(target)?)
}

fn parse_channel_id(raw: &str) -> anyhow::Result<i64> {
    let raw = raw.trim();
    raw.parse()
        .with_context(|| format!("channel id must be a whole number, got {:?}", raw))
}

/// Trimmed, non-empty name
fn clean_name(raw: &str) -> anyhow::Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        anyhow::bail!("Channel requires a name");
    }
    Ok(name.to_string())
}

pub fn run_init(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let base = std::env::current_dir()?;
    let database = ctx.database.strip_prefix(&base).unwrap_or(&ctx.database);
    let cfg = ChanbaseConfig {
        database: Some(database.to_string_lossy().into_owned()),
    };
    config::write_config(&ctx.config_path, &cfg, force)?;

    let mut provider = ctx.provider();
    let count = provider.count()?;

    if ctx.output_mode.is_human() {
        ui::success(&format!("Wrote {}", ctx.config_path.display()));
        ui::info("Database", &format!("{} {}", Icons::DATABASE, ctx.database.display()));
        ui::info("Channels", &count.to_string());
    } else {
        emit_success(ctx.output_mode, "init", serde_json::json!({
            "config": ctx.config_path,
            "database": ctx.database,
            "channels": count,
        }))?;
    }
    Ok(())
}

pub fn run_list(ctx: &Context, filter: Option<String>, sort: &str) -> anyhow::Result<()> {
    let mut provider = ctx.provider();
    let selection = filter.map(Selection::new).unwrap_or_default();
    let cursor = provider.query(&contract::content_uri(), None, selection, Some(sort))?;
    let channels = cursor.channels()?;

    if ctx.output_mode.is_human() {
        ui::header(&format!("Channels ({})", channels.len()));
        if channels.is_empty() {
            println!("{} {}", Icons::EMPTY, ui::dim("No channels yet. Add one with `chanbase add --name <name>`."));
        } else {
            println!("{}", ui::channel_table(&channels));
        }
    } else {
        emit_success(ctx.output_mode, "list", serde_json::to_value(&channels)?)?;
    }
    Ok(())
}

pub fn run_show(ctx: &Context, target: &str) -> anyhow::Result<()> {
    let uri = parse_target(target)?;
    let mut provider = ctx.provider();
    let cursor = provider.query(&uri, None, Selection::all(), None)?;
    let channels = cursor.channels()?;

    if channels.is_empty() {
        anyhow::bail!("no channel at {}", uri);
    }

    if ctx.output_mode.is_human() {
        for channel in &channels {
            ui::section(&channel.name);
            ui::info("URI", &channel.uri().to_string());
            ui::info("Channel", &channel.channel_id.to_string());
        }
    } else {
        emit_success(ctx.output_mode, "show", serde_json::to_value(&channels)?)?;
    }
    Ok(())
}

pub fn run_add(ctx: &Context, name: &str, channel_id: Option<&str>) -> anyhow::Result<()> {
    let mut values = ContentValues::new();
    values.put(COLUMN_NAME, clean_name(name)?);
    if let Some(raw) = channel_id.filter(|s| !s.trim().is_empty()) {
        values.put(COLUMN_CHANNEL_ID, parse_channel_id(raw)?);
    }

    let mut provider = ctx.provider();
    let Some(uri) = provider.insert(&contract::content_uri(), &values)? else {
        anyhow::bail!("Error with saving channel");
    };

    if ctx.output_mode.is_human() {
        println!("{} Channel saved: {}", Icons::NEW, uri.bold());
    } else {
        emit_success(ctx.output_mode, "add", serde_json::json!({ "uri": uri }))?;
    }
    Ok(())
}

pub fn run_edit(ctx: &Context, target: &str, name: Option<&str>, channel_id: Option<&str>) -> anyhow::Result<()> {
    let uri = parse_target(target)?;

    let mut values = ContentValues::new();
    if let Some(name) = name {
        values.put(COLUMN_NAME, clean_name(name)?);
    }
    if let Some(raw) = channel_id {
        values.put(COLUMN_CHANNEL_ID, parse_channel_id(raw)?);
    }

    let mut provider = ctx.provider();
    let rows = provider.update(&uri, &values, Selection::all())?;

    if ctx.output_mode.is_human() {
        if values.is_empty() {
            ui::warn("Nothing to update: pass --name and/or --channel-id");
        } else if rows == 0 {
            ui::warn(&format!("Error with updating channel: nothing at {}", uri));
        } else {
            println!("{} Channel updated: {} ({} row{})", Icons::MOD, uri.bold(), rows, if rows == 1 { "" } else { "s" });
        }
    } else {
        emit_success(ctx.output_mode, "edit", serde_json::json!({ "uri": uri, "rows": rows }))?;
    }
    Ok(())
}

pub fn run_delete(ctx: &Context, target: &str) -> anyhow::Result<()> {
    let uri = parse_target(target)?;
    let mut provider = ctx.provider();
    let rows = provider.delete(&uri, Selection::all())?;

    if ctx.output_mode.is_human() {
        if rows == 0 {
            ui::warn(&format!("Error with deleting channel: nothing at {}", uri));
        } else {
            println!("{} Channel deleted: {}", Icons::DEL, uri);
        }
    } else {
        emit_success(ctx.output_mode, "delete", serde_json::json!({ "uri": uri, "rows": rows }))?;
    }
    Ok(())
}

pub fn run_delete_all(ctx: &Context) -> anyhow::Result<()> {
    let mut provider = ctx.provider();
    let rows = provider.delete(&contract::content_uri(), Selection::all())?;
    tracing::info!(rows, "deleted all channels");

    if ctx.output_mode.is_human() {
        println!("{} Deleted {} channel{}", Icons::DEL, rows, if rows == 1 { "" } else { "s" });
    } else {
        emit_success(ctx.output_mode, "delete-all", serde_json::json!({ "rows": rows }))?;
    }
    Ok(())
}

pub fn run_insert_dummy(ctx: &Context) -> anyhow::Result<()> {
    let mut values = ContentValues::new();
    values.put(COLUMN_NAME, "My channel".to_string()).put(COLUMN_CHANNEL_ID, 9);

    let mut provider = ctx.provider();
    let Some(uri) = provider.insert(&contract::content_uri(), &values)? else {
        anyhow::bail!("Error with saving channel");
    };

    if ctx.output_mode.is_human() {
        println!("{} Dummy channel saved: {}", Icons::NEW, uri.bold());
    } else {
        emit_success(ctx.output_mode, "insert-dummy", serde_json::json!({ "uri": uri }))?;
    }
    Ok(())
}

pub fn run_type(ctx: &Context, target: &str) -> anyhow::Result<()> {
    let uri = parse_target(target)?;
    let provider = ctx.provider();
    let tag = provider.get_type(&uri)?;

    if ctx.output_mode.is_human() {
        println!("{}", tag);
    } else {
        emit_success(ctx.output_mode, "type", serde_json::json!({ "uri": uri, "type": tag }))?;
    }
    Ok(())
}
