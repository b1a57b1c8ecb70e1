use crate::error::Result;
use crate::generator::Caches;
use crate::plugin::{register_plugins, Plugin, Registry};
use crosswind_core::{Config, Diagnostic, Diagnostics};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// 一次构建的全部状态
///
/// 持有解析后的配置、插件注册表、各级缓存和诊断信息。同一配置的多次
/// 构建应复用同一个 `Context`（见 [`ContextCache`]），已解析的候选类不会重复计算。
pub struct Context {
    pub(crate) config: Config,
    plugin_names: Vec<String>,
    pub(crate) registry: Registry,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) caches: Caches,
    /// `theme.opacity`，颜色修饰符查表用
    pub(crate) opacity: Value,
    /// 每次生成都要加入的候选类
    pub(crate) safelist: Vec<String>,
}

impl Context {
    /// 只使用内置插件
    pub fn new(config: Config) -> Result<Self> {
        Self::with_plugins(config, Vec::new())
    }

    /// 内置插件加上 `plugins`；用户插件注册在选择器变体之后、堆叠变体之前
    pub fn with_plugins(config: Config, plugins: Vec<Arc<dyn Plugin>>) -> Result<Self> {
        let registry = register_plugins(&config, &plugins)?;
        let opacity = config.theme("opacity").cloned().unwrap_or(Value::Null);

        let mut caches = Caches::default();
        caches.not_class_cache.extend(config.blocklist.iter().cloned());

        let mut ctx = Self {
            plugin_names: plugins.iter().map(|p| p.name().to_string()).collect(),
            config,
            registry,
            diagnostics: Diagnostics::new(),
            caches,
            opacity,
            safelist: Vec::new(),
        };
        ctx.safelist = ctx.safelist_candidates()?;

        tracing::debug!(
            plugins = ctx.plugin_names.len(),
            safelist = ctx.safelist.len(),
            "created context"
        );
        Ok(ctx)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 用户插件名，按注册顺序
    pub fn plugin_names(&self) -> &[String] {
        &self.plugin_names
    }

    /// 取出目前为止的诊断信息
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }
}

/// 按配置复用 `Context`
///
/// 键为配置哈希与用户插件名的组合；配置不变时返回同一个上下文，缓存随之保留。
#[derive(Default)]
pub struct ContextCache {
    contexts: IndexMap<blake3::Hash, Context>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, config: Config, plugins: Vec<Arc<dyn Plugin>>) -> Result<&mut Context> {
        let key = context_key(&config, &plugins);
        match self.contexts.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                tracing::debug!(key = %key.to_hex(), "context cache miss");
                Ok(entry.insert(Context::with_plugins(config, plugins)?))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// 丢弃所有上下文
    pub fn clear(&mut self) {
        self.contexts.clear();
    }
}

fn context_key(config: &Config, plugins: &[Arc<dyn Plugin>]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(config.hash().as_bytes());
    for plugin in plugins {
        hasher.update(plugin.name().as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::plugin;
    use crosswind_core::SafelistEntry;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_context_seeds_blocklist() {
        let config = Config {
            blocklist: vec!["flex".to_string()],
            ..Config::default()
        };
        let ctx = Context::new(config).unwrap();
        assert!(ctx.caches.not_class_cache.contains("flex"));
    }

    #[test]
    fn test_context_resolves_safelist() {
        let config = Config {
            safelist: vec![SafelistEntry::Class("underline".to_string())],
            ..Config::default()
        };
        let ctx = Context::new(config).unwrap();
        assert_eq!(ctx.safelist, vec!["underline"]);
    }

    #[test]
    fn test_context_cache_reuses_context() {
        let mut cache = ContextCache::new();
        cache
            .get_or_create(Config::default(), Vec::new())
            .unwrap()
            .generate(["flex"])
            .unwrap();

        let ctx = cache.get_or_create(Config::default(), Vec::new()).unwrap();
        assert!(ctx.caches.class_cache.contains_key("flex"));
        assert_eq!(cache.len(), 1);

        cache.get_or_create(Config::default().with_prefix("tw-"), Vec::new()).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_context_cache_keys_on_plugins() {
        let mut cache = ContextCache::new();
        cache.get_or_create(Config::default(), Vec::new()).unwrap();
        let extra = plugin("extra", |_| Ok(()));
        let ctx = cache.get_or_create(Config::default(), vec![extra]).unwrap();
        assert_eq!(ctx.plugin_names(), ["extra"]);
        assert_eq!(cache.len(), 2);
    }
}
