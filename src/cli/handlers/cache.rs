//! Cache command handler
//!
//! Runs get/set/add/delete/has-key/clear against an open cache and writes
//! the result lines to the given output.

use std::io::Write;

use crate::cache::{CacheBackend, CompatCache, Fetched, GetOptions, SetOptions};
use crate::cli::parser::{Commands, KeyArgs, WriteArgs};
use crate::error::{AppError, AppResult};

/// Handler for the keyed cache commands
pub struct CacheCommandHandler {
    cache: CompatCache,
}

impl CacheCommandHandler {
    pub fn new(cache: CompatCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &CompatCache {
        &self.cache
    }

    /// Execute `command`, writing its output to `out`
    ///
    /// # Errors
    /// - Cache errors from the store
    /// - `Validation` when called with `check`, which never opens a cache
    pub async fn execute(&self, command: &Commands, out: &mut dyn Write) -> AppResult<()> {
        match command {
            Commands::Get {
                key,
                default,
                expire_time,
                tag,
            } => {
                self.get(key, default.as_deref(), *expire_time, *tag, out)
                    .await
            }
            Commands::Set(args) => {
                let stored = self.cache.set(&args.key.key, value_of(args), options_of(args)).await?;
                if !stored {
                    tracing::warn!(key = %args.key.key, "write skipped by store");
                }
                Ok(())
            }
            Commands::Add(args) => {
                let stored = self.cache.add(&args.key.key, value_of(args), options_of(args)).await?;
                write_line(out, if stored { "stored" } else { "exists" })
            }
            Commands::Delete(KeyArgs { key, version }) => {
                self.cache.delete(key, *version).await?;
                Ok(())
            }
            Commands::HasKey(KeyArgs { key, version }) => {
                let present = self.cache.has_key(key, *version).await?;
                write_line(out, if present { "true" } else { "false" })
            }
            Commands::Clear => {
                self.cache.clear().await?;
                Ok(())
            }
            Commands::Check => Err(AppError::validation(
                "command",
                "check does not operate on the cache",
            )),
        }
    }

    async fn get(
        &self,
        key: &KeyArgs,
        default: Option<&str>,
        expire_time: bool,
        tag: bool,
        out: &mut dyn Write,
    ) -> AppResult<()> {
        let mut options = GetOptions::default();
        if let Some(version) = key.version {
            options = options.version(version);
        }
        if expire_time {
            options = options.with_expire_time();
        }
        if tag {
            options = options.with_tag();
        }

        let default = default.map(|value| value.as_bytes().to_vec());
        let Some(fetched) = self.cache.get(&key.key, default, options).await? else {
            return Ok(());
        };

        let Fetched {
            value,
            expire_time: expiration,
            tag: stored_tag,
        } = fetched;
        let value = value
            .into_bytes()
            .map_err(|e| AppError::from(anyhow::Error::from(e)))?;
        write_line(out, &String::from_utf8_lossy(&value))?;
        if expire_time {
            let expire = expiration
                .map(|expire| expire.to_string())
                .unwrap_or_else(|| "-".to_string());
            write_line(out, &format!("expire_time: {}", expire))?;
        }
        if tag {
            write_line(out, &format!("tag: {}", stored_tag.as_deref().unwrap_or("-")))?;
        }
        Ok(())
    }
}

fn value_of(args: &WriteArgs) -> Vec<u8> {
    args.value.as_bytes().to_vec()
}

fn options_of(args: &WriteArgs) -> SetOptions {
    let mut options = SetOptions::default().timeout(args.timeout);
    if let Some(version) = args.key.version {
        options = options.version(version);
    }
    if let Some(ref tag) = args.tag {
        options = options.tag(tag.clone());
    }
    options
}

fn write_line(out: &mut dyn Write, line: &str) -> AppResult<()> {
    writeln!(out, "{}", line).map_err(|e| AppError::from(anyhow::Error::from(e)))
}
