use std::sync::Arc;

use tracing::debug;

use sentinela_client::models::Camera;
use sentinela_data::AspectRatio;

use crate::{Result, context::Context};

/// One grid slot: the backend camera record plus its display preference.
#[derive(Debug, Clone)]
pub struct CameraTile {
    pub camera: Camera,
    pub aspect: AspectRatio,
}

/// Known-order-first merge: cameras named by `persisted` come out in that
/// order, cameras the backend added since are appended in backend order, and
/// persisted ids with no live camera are dropped from the result (they stay
/// in storage untouched).
pub fn merge_order(live: &[Camera], persisted: &[String]) -> Vec<Camera> {
    let mut merged: Vec<Camera> = Vec::with_capacity(live.len());
    for id in persisted {
        if merged.iter().any(|camera| &camera.id == id) {
            continue;
        }
        if let Some(camera) = live.iter().find(|camera| &camera.id == id) {
            merged.push(camera.clone());
        }
    }
    for camera in live {
        if !persisted.contains(&camera.id) {
            merged.push(camera.clone());
        }
    }
    merged
}

/// Moves `moved_id` to sit immediately before `target_id`. Returns whether
/// the order changed; unknown ids and self-drops are no-ops.
pub fn reorder_ids(order: &mut Vec<String>, moved_id: &str, target_id: &str) -> bool {
    if moved_id == target_id {
        return false;
    }
    let Some(from) = order.iter().position(|id| id == moved_id) else {
        return false;
    };
    if !order.iter().any(|id| id == target_id) {
        return false;
    }

    let moved = order.remove(from);
    let to = order
        .iter()
        .position(|id| id == target_id)
        .unwrap_or(order.len());
    order.insert(to, moved);
    true
}

/// Grid ordering and per-camera prefs, persisted synchronously on mutation.
pub struct GridLayout {
    context: Arc<Context>,
    current: Vec<String>,
}

impl GridLayout {
    pub fn new(context: Arc<Context>) -> Self {
        Self {
            context,
            current: Vec::new(),
        }
    }

    /// Merges the live camera list with the persisted order and decorates
    /// each camera with its stored prefs.
    pub async fn ordered(&mut self, live: &[Camera]) -> Result<Vec<CameraTile>> {
        let persisted = self.context.store.camera_order().await?;
        let prefs = self.context.store.camera_prefs().await?;

        let merged = merge_order(live, &persisted);
        self.current = merged.iter().map(|camera| camera.id.clone()).collect();

        Ok(merged
            .into_iter()
            .map(|camera| {
                let aspect = prefs.get(&camera.id).copied().unwrap_or_default().aspect;
                CameraTile { camera, aspect }
            })
            .collect())
    }

    pub async fn reorder(&mut self, moved_id: &str, target_id: &str) -> Result<()> {
        let mut order = self.current.clone();
        if !reorder_ids(&mut order, moved_id, target_id) {
            debug!(moved_id, target_id, "Reorder ignored");
            return Ok(());
        }
        self.context.store.set_camera_order(&order).await?;
        self.current = order;
        Ok(())
    }

    pub async fn set_aspect(&self, camera_id: &str, aspect: AspectRatio) -> Result<()> {
        self.context.store.set_camera_aspect(camera_id, aspect).await?;
        Ok(())
    }

    pub fn current_order(&self) -> &[String] {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, FakeMediaStack, FakeSignalling, camera};

    fn ids(cameras: &[Camera]) -> Vec<&str> {
        cameras.iter().map(|camera| camera.id.as_str()).collect()
    }

    #[test]
    fn persisted_ids_lead_then_new_cameras_follow() {
        let live = vec![camera("a", true), camera("b", true), camera("c", true)];
        let persisted = vec!["c".to_string(), "a".to_string()];

        let merged = merge_order(&live, &persisted);
        assert_eq!(ids(&merged), vec!["c", "a", "b"]);
    }

    #[test]
    fn stale_persisted_ids_are_dropped() {
        let live = vec![camera("a", true)];
        let persisted = vec!["gone".to_string(), "a".to_string()];

        let merged = merge_order(&live, &persisted);
        assert_eq!(ids(&merged), vec!["a"]);
    }

    #[test]
    fn empty_persisted_order_keeps_backend_order() {
        let live = vec![camera("b", true), camera("a", true)];
        let merged = merge_order(&live, &[]);
        assert_eq!(ids(&merged), vec!["b", "a"]);
    }

    #[test]
    fn reorder_moves_before_target() {
        let mut order: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

        assert!(reorder_ids(&mut order, "d", "b"));
        assert_eq!(order, ["a", "d", "b", "c"]);

        assert!(reorder_ids(&mut order, "a", "c"));
        assert_eq!(order, ["d", "b", "a", "c"]);
    }

    #[test]
    fn repeating_a_reorder_leaves_the_order_unchanged() {
        let mut order: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        reorder_ids(&mut order, "c", "a");
        let settled = order.clone();
        reorder_ids(&mut order, "c", "a");

        assert_eq!(order, settled);
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn reorder_noops_do_not_report_change() {
        let mut order: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();

        assert!(!reorder_ids(&mut order, "a", "a"));
        assert!(!reorder_ids(&mut order, "zz", "a"));
        assert!(!reorder_ids(&mut order, "a", "zz"));
        assert_eq!(order, ["a", "b"]);
    }

    #[tokio::test]
    async fn reorder_persists_through_the_store() {
        let (context, _dir) = testutil::test_context(
            testutil::empty_directory(),
            FakeSignalling::ok(),
            FakeMediaStack::new(),
        )
        .await;
        let mut layout = GridLayout::new(context.clone());

        let live = vec![camera("a", true), camera("b", true), camera("c", true)];
        layout.ordered(&live).await.unwrap();
        layout.reorder("c", "a").await.unwrap();

        assert_eq!(layout.current_order(), ["c", "a", "b"]);
        let stored = context.store.camera_order().await.unwrap();
        assert_eq!(stored, ["c", "a", "b"]);

        // A fresh merge honors the stored order.
        let tiles = layout.ordered(&live).await.unwrap();
        let order: Vec<&str> = tiles.iter().map(|t| t.camera.id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn tiles_carry_stored_aspect_prefs() {
        let (context, _dir) = testutil::test_context(
            testutil::empty_directory(),
            FakeSignalling::ok(),
            FakeMediaStack::new(),
        )
        .await;
        let mut layout = GridLayout::new(context);

        layout
            .set_aspect("a", AspectRatio::FourThree)
            .await
            .unwrap();

        let tiles = layout
            .ordered(&[camera("a", true), camera("b", true)])
            .await
            .unwrap();
        assert_eq!(tiles[0].aspect, AspectRatio::FourThree);
        assert_eq!(tiles[1].aspect, AspectRatio::default());
    }
}
