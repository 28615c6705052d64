use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// A node of the foreground window's accessibility tree.
///
/// Platform handles must be returned to the platform with `release` once the
/// caller is done with them; wrap them in a [`NodeGuard`] so that happens on
/// every exit path.
pub trait UiNode: Sized {
    /// All descendants (including `self`) whose view id equals `view_id`,
    /// in document order.
    fn find_by_view_id(&self, view_id: &str) -> Vec<Self>;

    fn text(&self) -> Option<String>;

    fn release(&mut self) {}
}

/// Scoped ownership of a node handle; releases it on drop.
pub struct NodeGuard<N: UiNode> {
    node: Option<N>,
}

impl<N: UiNode> NodeGuard<N> {
    pub fn new(node: N) -> Self {
        Self { node: Some(node) }
    }
}

impl<N: UiNode> Deref for NodeGuard<N> {
    type Target = N;

    fn deref(&self) -> &N {
        // Only `drop` takes the node out.
        match self.node.as_ref() {
            Some(node) => node,
            None => unreachable!("node guard accessed after release"),
        }
    }
}

impl<N: UiNode> Drop for NodeGuard<N> {
    fn drop(&mut self) {
        if let Some(mut node) = self.node.take() {
            node.release();
        }
    }
}

/// Plain-data copy of a UI tree, as delivered by the desktop command surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiNodeSnapshot {
    #[serde(default)]
    pub view_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<UiNodeSnapshot>,
}

impl UiNodeSnapshot {
    pub fn container(children: Vec<UiNodeSnapshot>) -> Self {
        Self {
            view_id: None,
            text: None,
            children,
        }
    }

    pub fn leaf(view_id: &str, text: &str) -> Self {
        Self {
            view_id: Some(view_id.to_string()),
            text: Some(text.to_string()),
            children: Vec::new(),
        }
    }

    fn collect_matches<'a>(&'a self, view_id: &str, out: &mut Vec<&'a UiNodeSnapshot>) {
        if self.view_id.as_deref() == Some(view_id) {
            out.push(self);
        }
        for child in &self.children {
            child.collect_matches(view_id, out);
        }
    }
}

impl UiNode for UiNodeSnapshot {
    fn find_by_view_id(&self, view_id: &str) -> Vec<Self> {
        let mut matches = Vec::new();
        self.collect_matches(view_id, &mut matches);
        matches.into_iter().cloned().collect()
    }

    fn text(&self) -> Option<String> {
        self.text.clone()
    }
}

/// One platform UI-change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiChangeNotification<N> {
    pub package: String,
    pub root: Option<N>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_matches_depth_first_in_document_order() {
        let tree = UiNodeSnapshot::container(vec![
            UiNodeSnapshot::leaf("a:id/msg", "first"),
            UiNodeSnapshot::container(vec![UiNodeSnapshot::leaf("a:id/msg", "second")]),
            UiNodeSnapshot::leaf("a:id/other", "ignored"),
            UiNodeSnapshot::leaf("a:id/msg", "third"),
        ]);

        let texts: Vec<_> = tree
            .find_by_view_id("a:id/msg")
            .into_iter()
            .filter_map(|node| node.text())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn snapshot_deserializes_with_missing_fields() {
        let tree: UiNodeSnapshot =
            serde_json::from_str(r#"{"children":[{"viewId":"x","text":"hi"}]}"#).unwrap();
        assert_eq!(tree.find_by_view_id("x").len(), 1);
        assert!(tree.text().is_none());
    }
}
