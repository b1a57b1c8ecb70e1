use super::{Component, Pseudo, PseudoArgs, Selector};

/// Placement rules for a pseudo-element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PseudoProperties {
    /// Must be the last simple selector of its compound.
    pub terminal: bool,
    /// May be relocated past combinators to the end of the whole selector.
    pub jumpable: bool,
    /// User-action pseudo-classes may follow it.
    pub actionable: bool,
}

const TERMINAL_JUMPABLE: PseudoProperties = PseudoProperties {
    terminal: true,
    jumpable: true,
    actionable: false,
};
const TERMINAL: PseudoProperties = PseudoProperties {
    terminal: true,
    jumpable: false,
    actionable: false,
};
const TERMINAL_ACTIONABLE: PseudoProperties = PseudoProperties {
    terminal: true,
    jumpable: false,
    actionable: true,
};
const ACTIONABLE: PseudoProperties = PseudoProperties {
    terminal: false,
    jumpable: false,
    actionable: true,
};
const NONE: PseudoProperties = PseudoProperties {
    terminal: false,
    jumpable: false,
    actionable: false,
};

static ELEMENT_PROPERTIES: phf::Map<&'static str, PseudoProperties> = phf::phf_map! {
    "::after" => TERMINAL_JUMPABLE,
    "::backdrop" => TERMINAL_JUMPABLE,
    "::before" => TERMINAL_JUMPABLE,
    "::first-letter" => TERMINAL_JUMPABLE,
    "::first-line" => TERMINAL_JUMPABLE,
    "::marker" => TERMINAL_JUMPABLE,
    "::placeholder" => TERMINAL_JUMPABLE,
    "::selection" => TERMINAL_JUMPABLE,

    "::cue" => TERMINAL,
    "::cue-region" => TERMINAL,
    "::grammar-error" => TERMINAL,
    "::highlight" => TERMINAL,
    "::slotted" => TERMINAL,
    "::spelling-error" => TERMINAL,
    "::target-text" => TERMINAL,

    "::file-selector-button" => TERMINAL_ACTIONABLE,
    "::part" => TERMINAL_ACTIONABLE,
    "::-webkit-scrollbar" => TERMINAL_ACTIONABLE,
    "::-webkit-scrollbar-button" => TERMINAL_ACTIONABLE,
    "::-webkit-scrollbar-thumb" => TERMINAL_ACTIONABLE,
    "::-webkit-scrollbar-track" => TERMINAL_ACTIONABLE,
    "::-webkit-scrollbar-track-piece" => TERMINAL_ACTIONABLE,
    "::-webkit-scrollbar-corner" => TERMINAL_ACTIONABLE,
    "::-webkit-resizer" => TERMINAL_ACTIONABLE,

    "::deep" => ACTIONABLE,
    "::v-deep" => ACTIONABLE,
    "::ng-deep" => ACTIONABLE,

    // 旧式单冒号写法
    ":after" => TERMINAL_JUMPABLE,
    ":before" => TERMINAL_JUMPABLE,
    ":first-letter" => TERMINAL_JUMPABLE,
    ":first-line" => TERMINAL_JUMPABLE,

    ":where" => NONE,
    ":is" => NONE,
    ":has" => NONE,
};

/// 已知伪元素的放置规则；未知名称返回 `None`
pub fn pseudo_properties(name: &str) -> Option<PseudoProperties> {
    ELEMENT_PROPERTIES.get(name).copied()
}

/// Properties used for placement: unknown `::x` elements stay in place
/// but still accept pseudo-classes after them.
fn element_properties(pseudo: &Pseudo) -> PseudoProperties {
    pseudo_properties(&pseudo.name).unwrap_or(ACTIONABLE)
}

pub(crate) fn is_pseudo_element(pseudo: &Pseudo) -> bool {
    pseudo.name.starts_with("::")
        || matches!(
            pseudo.name.as_str(),
            ":after" | ":before" | ":first-letter" | ":first-line"
        )
}

/// 把伪元素移到复合选择器末尾
///
/// - 终结型伪元素（`::before`、`::placeholder` ...）移到末尾
/// - 紧随可交互伪元素（`::file-selector-button`、滚动条）的伪类跟着一起移动
/// - 遇到组合符时只有可跳跃的伪元素继续保留在待移动列表里，最终移到整个选择器末尾
/// - 伪类参数中的选择器各自独立处理
pub fn move_pseudo_elements(selector: &mut Selector) {
    for node in &mut selector.nodes {
        if let Component::Pseudo(Pseudo {
            args: Some(PseudoArgs::Selectors(list)),
            ..
        }) = node
        {
            for inner in &mut list.selectors {
                move_pseudo_elements(inner);
            }
        }
    }

    // (节点下标, 是否可跳跃)
    let mut buffer: Vec<(usize, bool)> = Vec::new();
    // 最近一个伪元素：(属性, 是否被移动)
    let mut last_element: Option<(PseudoProperties, bool)> = None;

    for (index, node) in selector.nodes.iter().enumerate() {
        match node {
            Component::Combinator(_) => {
                buffer.retain(|(_, jumpable)| *jumpable);
                last_element = None;
            }
            Component::Pseudo(pseudo) if is_pseudo_element(pseudo) => {
                let props = element_properties(pseudo);
                if props.terminal {
                    buffer.push((index, props.jumpable));
                }
                last_element = Some((props, props.terminal));
            }
            Component::Pseudo(_) => match last_element {
                Some((props, moved)) if props.actionable => {
                    if moved {
                        buffer.push((index, false));
                    }
                }
                _ => last_element = None,
            },
            _ => {}
        }
    }

    if buffer.is_empty() {
        return;
    }

    let moved: Vec<Component> = buffer
        .iter()
        .map(|(index, _)| selector.nodes[*index].clone())
        .collect();
    let mut index = 0;
    selector.nodes.retain(|_| {
        let keep = !buffer.iter().any(|(i, _)| *i == index);
        index += 1;
        keep
    });
    selector.nodes.extend(moved);
}
