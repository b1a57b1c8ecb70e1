/// 工具类名的 `(前缀, 修饰符)` 拆分迭代器
///
/// 从最长前缀到最短前缀依次产生，拆分点为 `-`、`/` 或 `[...]` 之前的 `-`/`/`：
///
/// ```
/// use crosswind_parse::candidate_permutations;
///
/// let perms: Vec<_> = candidate_permutations("bg-red-500").collect();
/// assert_eq!(perms, vec![("bg-red", "500"), ("bg", "red-500")]);
/// ```
pub fn candidate_permutations(candidate: &str) -> Permutations<'_> {
    Permutations {
        candidate,
        last_index: None,
        done: false,
    }
}

pub struct Permutations<'a> {
    candidate: &'a str,
    /// `None` 表示第一次迭代
    last_index: Option<usize>,
    done: bool,
}

impl<'a> Iterator for Permutations<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let candidate = self.candidate;

        while !self.done {
            let mut was_slash = false;

            let dash_idx = match self.last_index {
                None if candidate.ends_with(']') => {
                    let bracket = candidate.find('[');
                    match bracket.and_then(|b| b.checked_sub(1)) {
                        Some(before) if candidate.as_bytes()[before] == b'-' => Some(before),
                        Some(before) if candidate.as_bytes()[before] == b'/' => {
                            was_slash = true;
                            Some(before)
                        }
                        _ => None,
                    }
                }
                None if candidate.contains('/') => {
                    was_slash = true;
                    candidate.rfind('/')
                }
                None => candidate.rfind('-'),
                Some(last) => candidate[..=last].rfind('-'),
            };

            let Some(dash_idx) = dash_idx else {
                self.done = true;
                break;
            };

            match dash_idx.checked_sub(1) {
                Some(last) => self.last_index = Some(last),
                None => self.done = true,
            }

            let prefix = &candidate[..dash_idx];
            let modifier = if was_slash {
                &candidate[dash_idx..]
            } else {
                &candidate[dash_idx + 1..]
            };

            if prefix.is_empty() || modifier == "/" {
                continue;
            }

            return Some((prefix, modifier));
        }

        None
    }
}
