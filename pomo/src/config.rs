use anyhow::{Context, Result};
use directories::ProjectDirs;
use ratatui::style::Color;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub icons: Icons,
    pub update: UpdateConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    #[serde(deserialize_with = "hex_to_color")]
    pub background: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub foreground: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub selection: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub surface: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub red: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub green: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub yellow: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub blue: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub magenta: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub gray: Color,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Icons {
    pub timer: String,
    pub todos: String,
    pub notes: String,
    pub play: String,
    pub stop: String,
    pub pending: String,
    pub done: String,
    pub select: String,
    pub input_cursor: String,
    pub header_left: String,
    pub header_right: String,
}

/// Update scheduling preferences; the runtime dismissal state lives in the
/// data directory instead.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpdateConfig {
    pub auto_check: bool,
    pub check_on_launch: bool,
    /// Hours between automatic re-checks; 0 disables them.
    pub interval_hours: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            icons: Icons::default(),
            update: UpdateConfig::default(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(18, 16, 15),
            foreground: Color::Rgb(212, 205, 195),
            selection: Color::Rgb(215, 153, 90),
            surface: Color::Rgb(34, 30, 27),
            red: Color::Rgb(204, 98, 92),
            green: Color::Rgb(140, 163, 110),
            yellow: Color::Rgb(209, 174, 108),
            blue: Color::Rgb(116, 153, 181),
            magenta: Color::Rgb(169, 136, 176),
            gray: Color::Rgb(134, 128, 120),
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            timer: "◷".to_string(),
            todos: "⬢".to_string(),
            notes: "✎".to_string(),
            play: "▶".to_string(),
            stop: "■".to_string(),
            pending: "☐".to_string(),
            done: "☑".to_string(),
            select: "▸".to_string(),
            input_cursor: "▊".to_string(),
            header_left: "⟪ ".to_string(),
            header_right: " ⟫".to_string(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            auto_check: true,
            check_on_launch: true,
            interval_hours: 24,
        }
    }
}

fn hex_to_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    if !s.starts_with('#') || s.len() != 7 {
        return Err(serde::de::Error::custom("invalid hex color format"));
    }
    let r = u8::from_str_radix(&s[1..3], 16).map_err(serde::de::Error::custom)?;
    let g = u8::from_str_radix(&s[3..5], 16).map_err(serde::de::Error::custom)?;
    let b = u8::from_str_radix(&s[5..7], 16).map_err(serde::de::Error::custom)?;
    Ok(Color::Rgb(r, g, b))
}

pub fn load_config() -> Result<Config> {
    match ProjectDirs::from("com", "pabloagn", "pomo") {
        Some(proj_dirs) => {
            let path = proj_dirs.config_dir().join("pomo.toml");
            if path.exists() {
                let config_str = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file at {:?}", path))?;
                toml::from_str(&config_str)
                    .with_context(|| format!("Failed to parse config file at {:?}", path))
            } else {
                Ok(Config::default())
            }
        }
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.update.auto_check);
        assert!(config.update.check_on_launch);
        assert_eq!(config.update.interval_hours, 24);
        assert_eq!(config.icons.select, "▸");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: Config = toml::from_str(
            r##"
            [update]
            interval_hours = 6
            check_on_launch = false

            [theme]
            red = "#ff0000"
            "##,
        )
        .unwrap();
        assert_eq!(config.update.interval_hours, 6);
        assert!(!config.update.check_on_launch);
        assert!(config.update.auto_check);
        assert_eq!(config.theme.red, Color::Rgb(255, 0, 0));
        assert_eq!(config.theme.green, Theme::default().green);
    }

    #[test]
    fn invalid_hex_color_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r##"
            [theme]
            red = "red"
            "##,
        );
        assert!(result.is_err());

        let result: std::result::Result<Config, _> = toml::from_str(
            r##"
            [theme]
            red = "#ff00"
            "##,
        );
        assert!(result.is_err());
    }
}
