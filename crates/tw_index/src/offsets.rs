//! Rule ordering.
//!
//! Every generated rule carries a [`RuleOffset`]. Comparing offsets gives the
//! final position of a rule in the stylesheet, independent of the order in
//! which candidates were discovered.

use crate::bits::Bitfield;
use crosswind_core::Layer;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// `matchVariant` 排序回调的参数
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortArgs {
    pub value: String,
    pub modifier: Option<String>,
}

pub type SortFn = Arc<dyn Fn(&SortArgs, &SortArgs) -> Ordering + Send + Sync>;

/// 变体附带的排序选项
#[derive(Clone)]
pub struct SortOption {
    /// 共享同一个 id 的变体之间才会调用 `sort`
    pub id: String,
    /// 该变体自身的位
    pub variant: Bitfield,
    pub args: SortArgs,
    pub sort: Option<SortFn>,
}

impl PartialEq for SortOption {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.variant == other.variant && self.args == other.args
    }
}

impl Eq for SortOption {}

impl Hash for SortOption {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.variant.hash(state);
        self.args.hash(state);
    }
}

impl fmt::Debug for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortOption")
            .field("id", &self.id)
            .field("variant", &self.variant)
            .field("args", &self.args)
            .field("sort", &self.sort.is_some())
            .finish()
    }
}

/// 规则的排序键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleOffset {
    pub layer: Layer,
    /// 带变体的规则原本所在的层
    pub parent_layer: Layer,
    /// 任意属性 `[prop:value]` 排在同层普通工具类之后
    pub arbitrary: u8,
    pub variants: Bitfield,
    pub parallel_index: usize,
    /// 层内注册顺序
    pub index: usize,
    pub options: Vec<SortOption>,
}

/// 偏移量分配器
#[derive(Debug, Clone, Default)]
pub struct Offsets {
    next_index: IndexMap<Layer, usize>,
    reserved_variant_bits: usize,
    /// 变体名 → 起始位
    variant_offsets: IndexMap<String, usize>,
}

impl Offsets {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为 `layer` 生成下一个偏移量
    pub fn create(&mut self, layer: Layer) -> RuleOffset {
        let slot = self.next_index.entry(layer).or_insert(0);
        let index = *slot;
        *slot += 1;
        RuleOffset {
            layer,
            parent_layer: layer,
            arbitrary: 0,
            variants: Bitfield::zero(),
            parallel_index: 0,
            index,
            options: Vec::new(),
        }
    }

    /// 任意属性共用同一个偏移量，彼此之间按候选类排序
    pub fn arbitrary_property(&self) -> RuleOffset {
        RuleOffset {
            layer: Layer::Utilities,
            parent_layer: Layer::Utilities,
            arbitrary: 1,
            variants: Bitfield::zero(),
            parallel_index: 0,
            index: 0,
            options: Vec::new(),
        }
    }

    /// 为变体保留 `fn_count` 个连续的位
    pub fn record_variant(&mut self, variant: &str, fn_count: usize) -> RuleOffset {
        let start = self.reserved_variant_bits;
        self.variant_offsets.insert(variant.to_string(), start);
        self.reserved_variant_bits += fn_count.max(1);
        RuleOffset {
            variants: Bitfield::bit(start),
            ..self.create(Layer::Variants)
        }
    }

    pub fn has_variant(&self, variant: &str) -> bool {
        self.variant_offsets.contains_key(variant)
    }

    /// 已记录变体的第 `index` 个函数对应的偏移量
    pub fn for_variant(&mut self, variant: &str, index: usize) -> Option<RuleOffset> {
        let start = *self.variant_offsets.get(variant)?;
        Some(RuleOffset {
            variants: Bitfield::bit(start + index),
            ..self.create(Layer::Variants)
        })
    }

    pub fn apply_parallel_offset(offset: &RuleOffset, parallel_index: usize) -> RuleOffset {
        RuleOffset {
            parallel_index,
            ..offset.clone()
        }
    }

    /// 把变体的位合并进规则的偏移量，并把规则移到 variants 层
    pub fn apply_variant_offset(
        rule: &RuleOffset,
        variant: &RuleOffset,
        option: Option<SortOption>,
    ) -> RuleOffset {
        let mut options = Vec::with_capacity(rule.options.len() + 1);
        if let Some(mut option) = option.filter(|o| o.sort.is_some()) {
            option.variant = variant.variants.clone();
            options.push(option);
        }
        options.extend(rule.options.iter().cloned());

        RuleOffset {
            layer: Layer::Variants,
            parent_layer: if rule.layer == Layer::Variants {
                rule.parent_layer
            } else {
                rule.layer
            },
            arbitrary: rule.arbitrary,
            variants: &rule.variants | &variant.variants,
            parallel_index: rule.parallel_index.max(variant.parallel_index),
            index: rule.index,
            options,
        }
    }

    pub fn compare(&self, a: &RuleOffset, b: &RuleOffset) -> Ordering {
        compare_offsets(a, b)
    }

    /// 任意变体按名称字母序重新分配位
    ///
    /// 返回 `(旧位, 新位)`，只包含发生变化的项。
    pub fn recalculate_variant_offsets(&self) -> Vec<(usize, usize)> {
        let mut arbitrary: Vec<(&String, usize)> = self
            .variant_offsets
            .iter()
            .filter(|(name, _)| name.starts_with('['))
            .map(|(name, bit)| (name, *bit))
            .collect();
        arbitrary.sort_by(|a, b| a.0.cmp(b.0));

        let mut bits: Vec<usize> = arbitrary.iter().map(|(_, bit)| *bit).collect();
        bits.sort_unstable();

        arbitrary
            .iter()
            .zip(bits)
            .map(|((_, old), new)| (*old, new))
            .filter(|(old, new)| old != new)
            .collect()
    }

    /// 按重排后的位更新偏移量
    pub fn remap_arbitrary_variant_offsets<T>(
        &self,
        list: Vec<(RuleOffset, T)>,
    ) -> Vec<(RuleOffset, T)> {
        let mapping = self.recalculate_variant_offsets();
        if mapping.is_empty() {
            return list;
        }
        list.into_iter()
            .map(|(mut offset, item)| {
                offset.variants = offset.variants.remap(&mapping);
                (offset, item)
            })
            .collect()
    }

    /// 排序（先重排任意变体的位）
    ///
    /// 重排基于首次记录的位，传入的偏移量必须是未重排过的原始值。
    pub fn sort<T>(&self, list: Vec<(RuleOffset, T)>) -> Vec<(RuleOffset, T)> {
        let mut list = self.remap_arbitrary_variant_offsets(list);
        list.sort_by(|(a, _), (b, _)| compare_offsets(a, b));
        list
    }
}

/// 比较两个偏移量
///
/// 依次比较：层、原始层、`matchVariant` 排序回调、变体位、并行序号、
/// 是否任意属性、层内序号。
pub fn compare_offsets(a: &RuleOffset, b: &RuleOffset) -> Ordering {
    let by_layer = a.layer.cmp(&b.layer).then(a.parent_layer.cmp(&b.parent_layer));
    if by_layer != Ordering::Equal {
        return by_layer;
    }

    for a_option in &a.options {
        for b_option in &b.options {
            if a_option.id != b_option.id {
                continue;
            }
            let (Some(sort), Some(_)) = (&a_option.sort, &b_option.sort) else {
                continue;
            };

            // 只在排序变体之后（更高位）的变体完全相同时才比较
            let max_variant = a_option.variant.clone().max(b_option.variant.clone());
            let Some(highest) = max_variant.highest_bit() else {
                continue;
            };
            if a.variants.above(highest) != b.variants.above(highest) {
                continue;
            }

            let result = sort(&a_option.args, &b_option.args);
            if result != Ordering::Equal {
                return result;
            }
        }
    }

    a.variants
        .cmp(&b.variants)
        .then(a.parallel_index.cmp(&b.parallel_index))
        .then(a.arbitrary.cmp(&b.arbitrary))
        .then(a.index.cmp(&b.index))
}
