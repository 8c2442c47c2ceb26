//! Rendering of the generated import modules.
//!
//! Both files are ES modules exporting a `Map` so the build can resolve
//! references recorded during a sync without re-running loaders.

use std::collections::BTreeSet;

/// Resolve an asset reference found in an entry read from `file_path`.
///
/// Relative references (`./`, `../`) are joined onto the entry file's
/// directory; remote URLs yield `None`; anything else is kept verbatim.
pub fn resolve_asset(asset: &str, file_path: &str) -> Option<String> {
    if asset.starts_with("http://") || asset.starts_with("https://") || asset.starts_with("//") {
        return None;
    }
    if !(asset.starts_with("./") || asset.starts_with("../")) || file_path.is_empty() {
        return Some(asset.to_string());
    }

    let mut segments: Vec<&str> = file_path.split('/').collect();
    segments.pop();
    for part in asset.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Render the asset-imports module.
///
/// ```text
/// import asset0 from "src/cover.png";
/// export default new Map([["src/cover.png", asset0]]);
/// ```
pub fn render_asset_imports(assets: &BTreeSet<String>) -> String {
    if assets.is_empty() {
        return "export default new Map();\n".to_string();
    }
    let mut out = String::new();
    for (i, asset) in assets.iter().enumerate() {
        out.push_str(&format!("import asset{i} from {};\n", quote(asset)));
    }
    let pairs: Vec<String> = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| format!("[{}, asset{i}]", quote(asset)))
        .collect();
    out.push_str(&format!("export default new Map([{}]);\n", pairs.join(", ")));
    out
}

/// Render the module-imports module, one lazy import per entry module.
pub fn render_module_imports(modules: &BTreeSet<String>) -> String {
    let pairs: Vec<String> = modules
        .iter()
        .map(|m| format!("[{}, () => import({})]", quote(m), quote(m)))
        .collect();
    format!("export default new Map([{}]);\n", pairs.join(", "))
}

// JSON string escaping is valid JS string syntax.
fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_asset_joined_to_entry_dir() {
        assert_eq!(
            resolve_asset("./cover.png", "src/data/posts/a.md").as_deref(),
            Some("src/data/posts/cover.png")
        );
        assert_eq!(
            resolve_asset("../img/x.png", "src/data/posts/a.md").as_deref(),
            Some("src/data/img/x.png")
        );
    }

    #[test]
    fn remote_asset_skipped() {
        assert!(resolve_asset("https://example.com/a.png", "a.md").is_none());
    }

    #[test]
    fn bare_asset_kept() {
        assert_eq!(resolve_asset("~/assets/a.png", "x/a.md").as_deref(), Some("~/assets/a.png"));
    }

    #[test]
    fn empty_asset_module() {
        assert_eq!(render_asset_imports(&BTreeSet::new()), "export default new Map();\n");
    }

    #[test]
    fn asset_module_lists_imports() {
        let assets: BTreeSet<String> = ["a.png".to_string(), "b.png".to_string()].into();
        let out = render_asset_imports(&assets);
        assert!(out.contains("import asset0 from \"a.png\";"));
        assert!(out.contains("import asset1 from \"b.png\";"));
        assert!(out.ends_with("export default new Map([[\"a.png\", asset0], [\"b.png\", asset1]]);\n"));
    }

    #[test]
    fn module_imports_are_lazy() {
        let modules: BTreeSet<String> = ["posts/a.md".to_string()].into();
        assert_eq!(
            render_module_imports(&modules),
            "export default new Map([[\"posts/a.md\", () => import(\"posts/a.md\")]]);\n"
        );
    }
}
