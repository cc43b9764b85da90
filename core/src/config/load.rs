use std::path::{Path, PathBuf};

use super::types::AppConfig;

pub const CONFIG_ENV: &str = "STEPTASK_CONFIG";
const LOCAL_CONFIG: &str = "steptask.toml";

/// `~/.steptask`
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".steptask"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read config {} failed: {e}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)?;
    Ok(cfg)
}

/// Loads `$STEPTASK_CONFIG`, else `~/.steptask/config.toml`, else
/// `./steptask.toml`, else the defaults; then applies env overrides.
pub fn load_default() -> anyhow::Result<AppConfig> {
    load_with(
        |key| std::env::var(key).ok(),
        get_data_dir().ok(),
        Path::new(LOCAL_CONFIG),
    )
}

fn load_with(
    env: impl Fn(&str) -> Option<String>,
    data_dir: Option<PathBuf>,
    local_config: &Path,
) -> anyhow::Result<AppConfig> {
    // Priority 1: explicit path from the environment
    let explicit = env(CONFIG_ENV)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    // Priority 2: ~/.steptask/config.toml, Priority 3: ./steptask.toml
    let home_config = data_dir.map(|d| d.join("config.toml"));

    let mut cfg = if let Some(path) = explicit {
        load_from_path(&path)?
    } else if let Some(path) = home_config.filter(|p| p.exists()) {
        load_from_path(&path)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg, env);
    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut AppConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("STEPTASK_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
    if let Some(v) = env("STEPTASK_DEFAULT_SHELL") {
        if !v.trim().is_empty() {
            cfg.runner.default_shell = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn write_config(dir: &Path, name: &str, level: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(
            &path,
            format!("[logging]\nlevel = \"{level}\"\n\n[runner]\ndefault_shell = \"/bin/bash\"\ndefault_timeout_ms = 5000\n"),
        )
        .unwrap();
        path
    }

    #[test]
    fn missing_sections_take_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.runner.read_buffer_bytes, 16 * 1024);
        assert!(cfg.runner.default_timeout_ms.is_none());
    }

    #[test]
    fn loads_runner_section_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steptask.toml");
        std::fs::write(
            &path,
            r#"
[logging]
level = "debug"

[runner]
default_timeout_ms = 5000
default_shell = "/bin/bash"
"#,
        )
        .unwrap();

        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.console);
        assert_eq!(
            cfg.runner,
            RunnerConfig {
                read_buffer_bytes: 16 * 1024,
                default_timeout_ms: Some(5000),
                default_shell: Some("/bin/bash".into()),
            }
        );
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_path(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn explicit_path_wins_and_env_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write_config(dir.path(), "explicit.toml", "debug");
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        write_config(&data_dir, "config.toml", "warn");
        let local = write_config(dir.path(), "steptask.toml", "error");

        let env = env_of(&[
            (CONFIG_ENV, explicit.to_str().unwrap()),
            ("STEPTASK_DEFAULT_SHELL", "/bin/zsh"),
        ]);
        let cfg = load_with(env, Some(data_dir.clone()), &local).unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.runner.default_shell.as_deref(), Some("/bin/zsh"));
        assert_eq!(cfg.runner.default_timeout_ms, Some(5000));

        let env = env_of(&[
            (CONFIG_ENV, explicit.to_str().unwrap()),
            ("STEPTASK_LOG_LEVEL", "trace"),
        ]);
        let cfg = load_with(env, Some(data_dir), &local).unwrap();
        assert_eq!(cfg.logging.level, "trace");
        assert_eq!(cfg.runner.default_shell.as_deref(), Some("/bin/bash"));
    }

    #[test]
    fn home_config_comes_before_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        let local = write_config(dir.path(), "steptask.toml", "error");

        let cfg = load_with(env_of(&[]), Some(data_dir.clone()), &local).unwrap();
        assert_eq!(cfg.logging.level, "error");

        write_config(&data_dir, "config.toml", "warn");
        let cfg = load_with(env_of(&[]), Some(data_dir), &local).unwrap();
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn nothing_on_disk_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_with(
            env_of(&[(CONFIG_ENV, "  ")]),
            None,
            &dir.path().join("steptask.toml"),
        )
        .unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let local = write_config(dir.path(), "steptask.toml", "error");
        let err = load_with(
            env_of(&[(CONFIG_ENV, missing.to_str().unwrap())]),
            None,
            &local,
        )
        .unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(
            &mut cfg,
            env_of(&[("STEPTASK_LOG_LEVEL", " "), ("STEPTASK_DEFAULT_SHELL", "")]),
        );
        assert_eq!(cfg, AppConfig::default());
    }
}
