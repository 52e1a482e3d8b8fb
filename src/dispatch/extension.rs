//! # 扩展名匹配
//!
//! 一次投放只走一条导入流水线：先找出出现次数最多的扩展名，丢弃其余文件。
//! 次数相同时取最先出现的扩展名，保证结果确定。
//!
//! 扩展名列表以分号分隔（`.obj;.fbx`），匹配方式为区分大小写的后缀匹配。

/// 文件名的扩展名（含前导 `.`），无扩展名返回空串。
///
/// 与 `Path::extension` 规则一致：以 `.` 开头且只有一个 `.` 的名字（`.bashrc`）没有扩展名。
pub fn extension_of(name: &str) -> &str {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match file_name.rfind('.') {
        Some(0) | None => "",
        Some(index) => &file_name[index..],
    }
}

/// 出现次数最多的扩展名；次数相同取最先出现者。空列表返回 `None`。
pub fn majority_extension<S: AsRef<str>>(files: &[S]) -> Option<&str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for file in files {
        let ext = extension_of(file.as_ref());
        match counts.iter_mut().find(|(seen, _)| *seen == ext) {
            Some(entry) => entry.1 += 1,
            None => counts.push((ext, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (ext, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((ext, count));
        }
    }
    best.map(|(ext, _)| ext)
}

/// 只保留多数扩展名的文件，保持输入顺序。
pub fn filter_majority<S: AsRef<str> + Clone>(files: &[S]) -> Vec<S> {
    let Some(majority) = majority_extension(files) else {
        return Vec::new();
    };
    files
        .iter()
        .filter(|file| extension_of(file.as_ref()) == majority)
        .cloned()
        .collect()
}

/// 拆分分号分隔的扩展名列表，忽略空白与空项。
pub fn split_extensions(list: &str) -> impl Iterator<Item = &str> {
    list.split(';').map(str::trim).filter(|ext| !ext.is_empty())
}

/// 文件名是否以列表中任一扩展名结尾（区分大小写）。
pub fn matches_extensions(name: &str, list: &str) -> bool {
    split_extensions(list).any(|ext| name.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn majority_filter_keeps_most_common_extension() {
        let files = ["a.png", "b.png", "c.jpg"];
        assert_eq!(filter_majority(&files), ["a.png", "b.png"]);
    }

    #[test]
    fn majority_tie_resolves_to_first_seen() {
        assert_eq!(majority_extension(&["a.jpg", "b.png", "c.png", "d.jpg"]), Some(".jpg"));
        assert_eq!(filter_majority(&["x.obj", "y.fbx"]), ["x.obj"]);
    }

    #[test]
    fn empty_input_has_no_majority() {
        let files: [&str; 0] = [];
        assert_eq!(majority_extension(&files), None);
        assert!(filter_majority(&files).is_empty());
    }

    #[test]
    fn extension_follows_path_rules() {
        assert_eq!(extension_of("C:\\assets\\model.v2.FBX"), ".FBX");
        assert_eq!(extension_of("/tmp/archive.tar.gz"), ".gz");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of("dir.d/README"), "");
    }

    #[test]
    fn extension_list_matching_is_case_sensitive_suffix() {
        assert!(matches_extensions("tree.obj", ".fbx; .obj"));
        assert!(matches_extensions("scan.tar.gz", ".tar.gz"));
        assert!(!matches_extensions("tree.OBJ", ".obj"));
        assert!(!matches_extensions("tree.obj", ""));
        assert_eq!(split_extensions(".png;;.jpg ;").collect::<Vec<_>>(), [".png", ".jpg"]);
    }

    proptest! {
        #[test]
        fn filtered_files_share_one_extension_and_keep_order(
            names in proptest::collection::vec(("[a-c]{1,3}", prop_oneof![Just(".png"), Just(".jpg"), Just(".obj")]), 1..20)
        ) {
            let files: Vec<String> = names.iter().map(|(stem, ext)| format!("{}{}", stem, ext)).collect();
            let filtered = filter_majority(&files);
            let majority = majority_extension(&files).expect("non-empty input").to_string();

            prop_assert!(!filtered.is_empty());
            prop_assert!(filtered.iter().all(|f| extension_of(f) == majority));

            let expected: Vec<&String> = files.iter().filter(|f| extension_of(f) == majority).collect();
            prop_assert_eq!(filtered.iter().collect::<Vec<_>>(), expected);

            let majority_count = filtered.len();
            for ext in [".png", ".jpg", ".obj"] {
                prop_assert!(files.iter().filter(|f| extension_of(f) == ext).count() <= majority_count);
            }
        }
    }
}
