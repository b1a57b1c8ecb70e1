use crate::error::ConfigError;
use crate::theme;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 内置默认主题
pub const DEFAULT_THEME: &str = include_str!("../fixtures/default-theme.json");

/// 已解析的配置
///
/// 所有字段都有默认值，`{}` 即为完整的默认配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// 类名前缀（如 `tw-`）
    pub prefix: String,
    /// 变体分隔符，默认 `:`
    pub separator: String,
    pub important: Important,
    pub dark_mode: DarkMode,
    pub theme: Value,
    pub safelist: Vec<SafelistEntry>,
    pub blocklist: Vec<String>,
    pub features: Features,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            separator: ":".to_string(),
            important: Important::default(),
            dark_mode: DarkMode::default(),
            theme: default_theme(),
            safelist: Vec::new(),
            blocklist: Vec::new(),
            features: Features::default(),
        }
    }
}

/// `important` 选项：布尔值或选择器策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Important {
    Flag(bool),
    Selector(String),
}

impl Default for Important {
    fn default() -> Self {
        Important::Flag(false)
    }
}

/// 暗色模式策略
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "DarkModeRepr", into = "DarkModeRepr")]
pub enum DarkMode {
    #[default]
    Media,
    /// 类名策略，值为完整的类选择器（如 `.dark`）
    Class(String),
    /// `darkMode: false`，`dark:` 变体不产生任何规则
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DarkModeRepr {
    Flag(bool),
    Strategy(String),
    WithClass(String, String),
}

impl From<DarkModeRepr> for DarkMode {
    fn from(repr: DarkModeRepr) -> Self {
        match repr {
            DarkModeRepr::Flag(false) => DarkMode::Disabled,
            DarkModeRepr::Flag(true) => DarkMode::Media,
            DarkModeRepr::Strategy(s) if s == "class" => DarkMode::Class(".dark".to_string()),
            DarkModeRepr::Strategy(_) => DarkMode::Media,
            DarkModeRepr::WithClass(_, class) => DarkMode::Class(class),
        }
    }
}

impl From<DarkMode> for DarkModeRepr {
    fn from(mode: DarkMode) -> Self {
        match mode {
            DarkMode::Media => DarkModeRepr::Strategy("media".to_string()),
            DarkMode::Class(class) => DarkModeRepr::WithClass("class".to_string(), class),
            DarkMode::Disabled => DarkModeRepr::Flag(false),
        }
    }
}

/// safelist 条目：固定类名或正则模式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SafelistEntry {
    Class(String),
    Pattern {
        pattern: String,
        #[serde(default)]
        variants: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Features {
    /// `hover:(flex,underline)` 变体分组
    pub variant_grouping: bool,
    /// hover 只在支持 hover 的设备上生效
    pub hover_only_when_supported: bool,
}

impl Config {
    /// 从 JSON 加载；未给出主题时使用默认主题
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_json::from_str(json_str)?;
        if config.theme.is_null() {
            config.theme = default_theme();
        }
        Ok(config)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_important(mut self, important: Important) -> Self {
        self.important = important;
        self
    }

    pub fn with_dark_mode(mut self, dark_mode: DarkMode) -> Self {
        self.dark_mode = dark_mode;
        self
    }

    /// 在默认主题上覆盖一个顶层主题键
    pub fn with_theme_key(mut self, key: impl Into<String>, value: Value) -> Self {
        if let Value::Object(map) = &mut self.theme {
            map.insert(key.into(), value);
        }
        self
    }

    /// 配置内容的 hash，用于按配置缓存 Context
    pub fn hash(&self) -> blake3::Hash {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&bytes)
    }

    /// `theme(path)`
    pub fn theme(&self, path: &str) -> Option<&Value> {
        theme::lookup(&self.theme, path)
    }

    /// `theme(path)` 并转换为 CSS 字符串
    pub fn theme_value(&self, path: &str) -> Option<String> {
        self.theme(path).and_then(theme::to_css_string)
    }

    /// 编译 safelist 中的正则模式
    pub fn safelist_patterns(&self) -> Result<Vec<(Regex, Vec<String>)>, ConfigError> {
        self.safelist
            .iter()
            .filter_map(|entry| match entry {
                SafelistEntry::Pattern { pattern, variants } => Some((pattern, variants)),
                SafelistEntry::Class(_) => None,
            })
            .map(|(pattern, variants)| {
                let regex = Regex::new(pattern).map_err(|source| ConfigError::SafelistPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                Ok((regex, variants.clone()))
            })
            .collect()
    }
}

fn default_theme() -> Value {
    serde_json::from_str(DEFAULT_THEME).unwrap_or_default()
}
