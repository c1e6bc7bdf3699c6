// src/categories.rs
// =============================================================================
// Builds the category tree shown by GET /api/categories.
//
// Every link has a path like ["Dev", "Rust"]. Folding all paths together
// gives a tree:
//
//   root
//   └── Dev
//       ├── Go
//       └── Rust
//
// The tree is built fresh from a snapshot of the links on every request and
// thrown away afterwards, so it can never be out of date.
// =============================================================================

use crate::models::{Category, Link};

/// Name of the node every tree starts from
pub const ROOT_CATEGORY: &str = "root";

/// Folds the paths of `links` into a tree rooted at "root"
pub fn build_category_tree(links: &[Link]) -> Category {
    let mut root = Category::new(ROOT_CATEGORY, Vec::new());

    for link in links {
        let mut current = &mut root;
        let mut current_path = Vec::with_capacity(link.path.len());

        for segment in &link.path {
            current_path.push(segment.clone());
            current = current
                .categories
                .entry(segment.clone())
                .or_insert_with(|| Category::new(segment.clone(), current_path.clone()));
        }
    }

    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(path: &[&str]) -> Link {
        Link::new("https://example.com").with_path(path.iter().copied())
    }

    #[test]
    fn test_shared_prefix_shares_node() {
        let tree = build_category_tree(&[link(&["A", "B"]), link(&["A", "C"])]);

        assert_eq!(tree.name, "root");
        assert!(tree.path.is_empty());
        assert_eq!(tree.categories.len(), 1);

        let a = &tree.categories["A"];
        assert_eq!(a.path, vec!["A".to_string()]);
        assert_eq!(a.categories.len(), 2);
        assert_eq!(a.categories["B"].path, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(a.categories["C"].path, vec!["A".to_string(), "C".to_string()]);
        assert!(a.categories["B"].categories.is_empty());
    }

    #[test]
    fn test_empty_path_adds_nothing() {
        let tree = build_category_tree(&[link(&[])]);
        assert!(tree.categories.is_empty());

        let tree = build_category_tree(&[]);
        assert!(tree.categories.is_empty());
    }

    #[test]
    fn test_same_name_at_different_depths() {
        let tree = build_category_tree(&[link(&["Go"]), link(&["Dev", "Go"])]);

        assert_eq!(tree.categories.len(), 2);
        assert_eq!(tree.categories["Go"].path, vec!["Go".to_string()]);
        assert_eq!(
            tree.categories["Dev"].categories["Go"].path,
            vec!["Dev".to_string(), "Go".to_string()]
        );
    }

    #[test]
    fn test_tree_json_shape() {
        let tree = build_category_tree(&[link(&["Dev", "Rust"])]);
        let value = serde_json::to_value(&tree).unwrap();

        assert_eq!(value["name"], "root");
        assert_eq!(value["path"], serde_json::json!([]));
        assert_eq!(value["categories"]["Dev"]["name"], "Dev");
        assert_eq!(
            value["categories"]["Dev"]["categories"]["Rust"]["path"],
            serde_json::json!(["Dev", "Rust"])
        );
        // leaves carry no categories key
        assert!(value["categories"]["Dev"]["categories"]["Rust"]
            .get("categories")
            .is_none());
    }
}
