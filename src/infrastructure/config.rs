use crate::application::event_loop::DebounceWindows;
use crate::application::mark_persister::RetryPolicy;
use crate::domain::mark::Palette;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub source: SourceSettings,
    pub marks: MarkSettings,
    pub ui: UiSettings,
    pub persist: PersistSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

/// Where the raw sample feed and mark buffer come from.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceSettings {
    File {
        samples_path: PathBuf,
        marks_path: PathBuf,
    },
    Http {
        samples_url: String,
        marks_url: String,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarkSettings {
    /// Hard cap on the encoded mark buffer, terminator included.
    pub storage_bytes: usize,
    pub palette_size: usize,
}

impl MarkSettings {
    pub fn palette(&self) -> Palette {
        Palette::with_size(self.palette_size)
    }
}

/// Debounce windows for shells that drive `event_loop::run`; the HTTP
/// server itself has no pointer or keystroke input and ignores them.
#[derive(Debug, Deserialize, Clone)]
pub struct UiSettings {
    pub pointer_debounce_ms: u64,
    pub edit_debounce_ms: u64,
}

impl UiSettings {
    pub fn windows(&self) -> DebounceWindows {
        DebounceWindows {
            pointer: Duration::from_millis(self.pointer_debounce_ms),
            edit: Duration::from_millis(self.edit_debounce_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersistSettings {
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl PersistSettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

/// Loads `config/aqm.*` (optional) and `AQM__SECTION__KEY` environment
/// overrides on top of the built-in defaults.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    build_config(config::File::with_name("config/aqm").required(false))
}

fn build_config<S>(file: S) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("source.kind", "file")?
        .set_default("source.samples_path", "data/samples.bin")?
        .set_default("source.marks_path", "data/marks.bin")?
        .set_default("marks.storage_bytes", 512)?
        .set_default("marks.palette_size", 30)?
        .set_default("ui.pointer_debounce_ms", 30)?
        .set_default("ui.edit_debounce_ms", 300)?
        .set_default("persist.attempts", 3)?
        .set_default("persist.backoff_ms", 500)?
        .add_source(file)
        .add_source(config::Environment::with_prefix("AQM").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn test_defaults() {
        let conf = build_config(File::from_str("", FileFormat::Toml)).unwrap();
        assert_eq!(conf.server.bind, "0.0.0.0:8080");
        assert_eq!(
            conf.source,
            SourceSettings::File {
                samples_path: "data/samples.bin".into(),
                marks_path: "data/marks.bin".into(),
            }
        );
        assert_eq!(conf.marks.storage_bytes, 512);
        assert_eq!(conf.marks.palette().len(), 30);
        assert_eq!(conf.ui.windows().edit, Duration::from_millis(300));
        assert_eq!(conf.persist.policy(), RetryPolicy::default());
    }

    #[test]
    fn test_http_source_and_overrides() {
        let toml = r#"
            [source]
            kind = "http"
            samples_url = "http://aqm.lan/data/all/latest-first/samples.8Bms_16Bsen5x_tuples.bin"
            marks_url = "http://aqm.lan/data/marks.bin"

            [marks]
            storage_bytes = 1024
            palette_size = 12
        "#;
        let conf = build_config(File::from_str(toml, FileFormat::Toml)).unwrap();
        assert!(matches!(conf.source, SourceSettings::Http { ref marks_url, .. } if marks_url.ends_with("marks.bin")));
        assert_eq!(conf.marks.storage_bytes, 1024);
        assert_eq!(conf.marks.palette().len(), 12);
    }
}
