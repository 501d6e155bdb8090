use geom::{Expanse, Point, Rect};
use slotmap::SlotMap;

use crate::{
    draw, dump,
    error::{Error, Result},
    id::ViewId,
    layout::Layout,
    render::Renderer,
    style::Background,
    view::View,
};

/// Arena of views with a single root.
///
/// Parent to child is the owning relation: a view lives in the arena until it
/// is removed along with its subtree. Child to parent is a plain id lookup, so
/// the tree never contains a reference cycle.
#[derive(Debug)]
pub struct ViewTree {
    /// View storage arena.
    pub(crate) views: SlotMap<ViewId, View>,
    /// Root view ID.
    pub(crate) root: ViewId,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    /// Create a tree with a zero-sized, non-interactive root view.
    pub fn new() -> Self {
        let mut views = SlotMap::with_key();
        let root = views.insert(View {
            interactive: false,
            label: "root".into(),
            ..Default::default()
        });
        Self { views, root }
    }

    /// Return the root view id.
    pub fn root(&self) -> ViewId {
        self.root
    }

    /// Return a reference to a view by id.
    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(id)
    }

    /// Number of live views, including the root.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Look a view up, failing on stale ids.
    pub(crate) fn get(&self, id: ViewId) -> Result<&View> {
        self.views.get(id).ok_or(Error::ViewNotFound(id))
    }

    /// Look a view up mutably, failing on stale ids.
    fn get_mut(&mut self, id: ViewId) -> Result<&mut View> {
        self.views.get_mut(id).ok_or(Error::ViewNotFound(id))
    }

    /// Create a detached view.
    pub fn create_view(&mut self) -> ViewId {
        self.views.insert(View::default())
    }

    /// Create a detached view with a label and a preferred size.
    pub fn create_labeled(&mut self, label: impl Into<String>, size: Expanse) -> ViewId {
        self.views.insert(View {
            rect: size.rect(),
            preferred: size,
            label: label.into(),
            ..Default::default()
        })
    }

    /// Append `child` to `parent`'s children, detaching it from any previous
    /// parent first. Both parents are marked as needing layout.
    pub fn add_subview(&mut self, parent: ViewId, child: ViewId) -> Result<()> {
        self.get(parent)?;
        self.get(child)?;
        if child == self.root {
            return Err(Error::invariant("the root view cannot be a subview"));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(Error::invariant(
                "attaching a view beneath itself would create a cycle",
            ));
        }
        self.remove_from_parent(child)?;

        let p = self.get_mut(parent)?;
        p.children.push(child);
        p.needs_layout = true;
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `child` from its parent. The view stays in the arena. Detaching
    /// a view without a parent does nothing.
    pub fn remove_from_parent(&mut self, child: ViewId) -> Result<()> {
        let Some(parent) = self.get_mut(child)?.parent.take() else {
            return Ok(());
        };
        let p = self.get_mut(parent)?;
        p.children.retain(|c| *c != child);
        p.needs_layout = true;
        Ok(())
    }

    /// Detach a view and drop it and all of its descendants from the arena.
    pub fn remove_subtree(&mut self, id: ViewId) -> Result<()> {
        if id == self.root {
            return Err(Error::invariant("the root view cannot be removed"));
        }
        self.remove_from_parent(id)?;
        for v in self.subtree_post_order(id) {
            self.views.remove(v);
        }
        Ok(())
    }

    /// Return the children of a view, in paint order.
    pub fn children(&self, id: ViewId) -> Result<&[ViewId]> {
        Ok(&self.get(id)?.children)
    }

    /// Return the parent of a view.
    pub fn parent(&self, id: ViewId) -> Result<Option<ViewId>> {
        Ok(self.get(id)?.parent)
    }

    /// Is `ancestor` a strict ancestor of `node`?
    pub fn is_ancestor(&self, ancestor: ViewId, node: ViewId) -> bool {
        let mut cur = self.views.get(node).and_then(|v| v.parent);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.views.get(id).and_then(|v| v.parent);
        }
        false
    }

    /// Collect a subtree with children before parents.
    fn subtree_post_order(&self, root: ViewId) -> Vec<ViewId> {
        let mut out = Vec::new();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            if let Some(v) = self.views.get(id) {
                for c in v.children.iter().rev() {
                    stack.push((*c, false));
                }
            }
        }
        out
    }

    /// Move a view within its parent's coordinate space.
    pub fn set_pos(&mut self, id: ViewId, pos: Point) -> Result<()> {
        self.get_mut(id)?.rect.tl = pos;
        Ok(())
    }

    /// Request a size for a view. This becomes the view's preferred size and
    /// is applied to its frame immediately; a changed size marks the view as
    /// needing layout.
    pub fn set_size(&mut self, id: ViewId, size: Expanse) -> Result<()> {
        let v = self.get_mut(id)?;
        v.preferred = size;
        apply_size(v, size);
        Ok(())
    }

    /// Set position and size together.
    pub fn set_bounds(&mut self, id: ViewId, rect: Rect) -> Result<()> {
        self.set_pos(id, rect.tl)?;
        self.set_size(id, rect.expanse())
    }

    /// Frame of a view relative to its parent.
    pub fn rect(&self, id: ViewId) -> Result<Rect> {
        Ok(self.get(id)?.rect)
    }

    /// Origin of a view's local coordinate space, in root coordinates.
    fn world_origin(&self, id: ViewId) -> Result<Point> {
        let mut origin = Point::zero();
        let mut cur = Some(id);
        while let Some(v) = cur {
            let view = self.get(v)?;
            origin = origin + view.rect.tl;
            cur = view.parent;
        }
        Ok(origin)
    }

    /// Frame of a view in root coordinates.
    pub fn world_rect(&self, id: ViewId) -> Result<Rect> {
        let r = self.get(id)?.rect;
        Ok(r.at(self.world_origin(id)?))
    }

    /// Convert a point in a view's local space to root coordinates.
    pub fn to_world(&self, id: ViewId, p: Point) -> Result<Point> {
        Ok(p + self.world_origin(id)?)
    }

    /// Convert a point in root coordinates to a view's local space.
    pub fn to_local(&self, id: ViewId, p: Point) -> Result<Point> {
        Ok(p - self.world_origin(id)?)
    }

    /// Mark a view's children as needing layout.
    pub fn set_needs_layout(&mut self, id: ViewId) -> Result<()> {
        self.get_mut(id)?.needs_layout = true;
        Ok(())
    }

    /// Does a view need layout?
    pub fn needs_layout(&self, id: ViewId) -> Result<bool> {
        Ok(self.get(id)?.needs_layout)
    }

    /// Attach a layout to a view, replacing any existing one.
    pub fn set_layout(&mut self, id: ViewId, layout: Layout) -> Result<()> {
        let v = self.get_mut(id)?;
        v.layout = Some(layout);
        v.needs_layout = true;
        Ok(())
    }

    /// Detach and return a view's layout. Fails if none is attached.
    pub fn take_layout(&mut self, id: ViewId) -> Result<Layout> {
        let v = self.get_mut(id)?;
        let layout = v
            .layout
            .take()
            .ok_or_else(|| Error::invariant("no layout is attached to this view"))?;
        v.needs_layout = true;
        Ok(layout)
    }

    /// Copy of a view's layout, if any.
    pub fn layout_of(&self, id: ViewId) -> Result<Option<Layout>> {
        Ok(self.get(id)?.layout)
    }

    /// Edit a view's attached layout in place. Any change to the
    /// configuration marks the view as needing layout.
    pub fn with_layout_of(&mut self, id: ViewId, f: impl FnOnce(&mut Layout)) -> Result<()> {
        let v = self.get_mut(id)?;
        let layout = v
            .layout
            .as_mut()
            .ok_or_else(|| Error::invariant("no layout is attached to this view"))?;
        let before = *layout;
        f(layout);
        if *layout != before {
            v.needs_layout = true;
        }
        Ok(())
    }

    /// Hide or show a view and its subtree.
    pub fn set_hidden(&mut self, id: ViewId, hidden: bool) -> Result<()> {
        self.get_mut(id)?.hidden = hidden;
        Ok(())
    }

    /// Set a view's opacity multiplier, clamped to `0.0..=1.0`.
    pub fn set_alpha(&mut self, id: ViewId, alpha: f32) -> Result<()> {
        let alpha = if alpha.is_nan() {
            0.0
        } else {
            alpha.clamp(0.0, 1.0)
        };
        self.get_mut(id)?.alpha = alpha;
        Ok(())
    }

    /// Product of the alpha values from the root down to this view.
    pub fn combined_alpha(&self, id: ViewId) -> Result<f32> {
        let mut alpha = 1.0;
        let mut cur = Some(id);
        while let Some(v) = cur {
            let view = self.get(v)?;
            alpha *= view.alpha;
            cur = view.parent;
        }
        Ok(alpha)
    }

    /// Set or clear a view's background.
    pub fn set_background(&mut self, id: ViewId, background: Option<Background>) -> Result<()> {
        self.get_mut(id)?.background = background;
        Ok(())
    }

    /// Set a view's debug label.
    pub fn set_label(&mut self, id: ViewId, label: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.label = label.into();
        Ok(())
    }

    /// Control whether a view receives hit tests.
    pub fn set_interactive(&mut self, id: ViewId, interactive: bool) -> Result<()> {
        self.get_mut(id)?.interactive = interactive;
        Ok(())
    }

    /// Control whether children are clipped to the view's bounds.
    pub fn set_clips_children(&mut self, id: ViewId, clips: bool) -> Result<()> {
        self.get_mut(id)?.clips_children = clips;
        Ok(())
    }

    /// Control whether the subtree is composited through a frame buffer.
    pub fn set_renders_to_frame_buffer(&mut self, id: ViewId, enabled: bool) -> Result<()> {
        self.get_mut(id)?.renders_to_frame_buffer = enabled;
        Ok(())
    }

    /// Run a container's layout over its direct children and clear its dirty
    /// flag. Children whose size changes are marked as needing layout
    /// themselves; nothing below the direct children is touched.
    pub fn layout_view(&mut self, id: ViewId) -> Result<()> {
        let container = self.get(id)?;
        if let Some(layout) = container.layout {
            let bounds = container.rect.expanse();
            let children = container.children.clone();
            let preferred = children
                .iter()
                .map(|c| self.get(*c).map(|v| v.preferred))
                .collect::<Result<Vec<_>>>()?;
            let frames = layout.arrange(bounds, &preferred);
            tracing::trace!(?id, children = children.len(), "layout");
            for (child, frame) in children.iter().zip(frames) {
                let v = self.get_mut(*child)?;
                v.rect.tl = frame.tl;
                apply_size(v, frame.expanse());
            }
        }
        self.get_mut(id)?.needs_layout = false;
        Ok(())
    }

    /// The per-frame layout pass. Walks the tree top-down from the root and
    /// lays out every view that needs it. A child resized by its parent is
    /// reached later in the same walk, so one pass settles the whole tree.
    /// Returns the number of views laid out.
    pub fn update_layout(&mut self) -> Result<usize> {
        let mut count = 0;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.get(id)?.needs_layout {
                self.layout_view(id)?;
                count += 1;
            }
            stack.extend(self.get(id)?.children.iter().rev().copied());
        }
        if count > 0 {
            tracing::debug!(views = count, "layout pass");
        }
        Ok(count)
    }

    /// Paint every visible view, parents before children and siblings in
    /// order. Layout is not run; call [`ViewTree::update_layout`] first.
    pub fn render(&self, r: &mut Renderer) -> Result<()> {
        draw::render_tree(self, r)
    }

    /// One frame for a tree owner: settle layout, paint the tree, then close
    /// the frame on the renderer.
    pub fn frame(&mut self, r: &mut Renderer) -> Result<()> {
        self.update_layout()?;
        self.render(r)?;
        r.end_frame()
    }

    /// Colored debug dump of a subtree.
    pub fn dump(&self, id: ViewId) -> Result<String> {
        dump::dump(self, id)
    }

    /// Find the topmost visible, interactive view under a point in root
    /// coordinates. Later children are on top of earlier ones, and views
    /// that clip their children also restrict where those children can be hit.
    pub fn hit_test(&self, p: Point) -> Option<ViewId> {
        self.hit_recursive(self.root, Point::zero(), None, p)
    }

    /// Depth-first search for the hit view, topmost child first.
    fn hit_recursive(
        &self,
        id: ViewId,
        origin: Point,
        clip: Option<Rect>,
        p: Point,
    ) -> Option<ViewId> {
        let view = self.views.get(id)?;
        if view.hidden {
            return None;
        }
        if let Some(c) = clip
            && !c.contains(p)
        {
            return None;
        }
        let world = view.rect.translate(origin);
        // A composited subtree is only visible inside its frame buffer.
        let child_clip = if view.clips_children || view.renders_to_frame_buffer {
            Some(match clip {
                Some(c) => c.intersect(&world).unwrap_or_default(),
                None => world,
            })
        } else {
            clip
        };
        for child in view.children.iter().rev() {
            if let Some(hit) = self.hit_recursive(*child, world.tl, child_clip, p) {
                return Some(hit);
            }
        }
        (view.interactive && world.contains(p)).then_some(id)
    }
}

/// Resize a view's frame, flagging it for layout if the size changed.
fn apply_size(v: &mut View, size: Expanse) {
    if v.rect.expanse() != size {
        v.rect.w = size.w;
        v.rect.h = size.h;
        v.needs_layout = true;
    }
}

#[cfg(test)]
mod tests {
    use geom::{ExpanseI32, Insets};

    use super::*;
    use crate::{
        layout::{Alignment, Mode},
        testing::RecordingBackend,
    };

    fn tree_with_children(n: usize) -> Result<(ViewTree, ViewId, Vec<ViewId>)> {
        let mut tree = ViewTree::new();
        let parent = tree.create_view();
        tree.add_subview(tree.root(), parent)?;
        let mut children = Vec::new();
        for i in 0..n {
            let c = tree.create_labeled(format!("child {i}"), Expanse::new(120.0, 40.0));
            tree.add_subview(parent, c)?;
            children.push(c);
        }
        Ok((tree, parent, children))
    }

    #[test]
    fn add_subview_reparents() -> Result<()> {
        let (mut tree, parent, children) = tree_with_children(2)?;
        let other = tree.create_view();
        tree.add_subview(tree.root(), other)?;
        tree.update_layout()?;

        tree.add_subview(other, children[0])?;
        assert_eq!(tree.children(parent)?, &[children[1]]);
        assert_eq!(tree.children(other)?, &[children[0]]);
        assert_eq!(tree.parent(children[0])?, Some(other));
        assert!(tree.needs_layout(parent)?);
        assert!(tree.needs_layout(other)?);
        Ok(())
    }

    #[test]
    fn cycles_rejected() -> Result<()> {
        let (mut tree, parent, children) = tree_with_children(1)?;
        assert!(matches!(
            tree.add_subview(children[0], parent),
            Err(Error::InvariantViolation(_))
        ));
        assert!(matches!(
            tree.add_subview(parent, parent),
            Err(Error::InvariantViolation(_))
        ));
        let root = tree.root();
        assert!(matches!(
            tree.add_subview(parent, root),
            Err(Error::InvariantViolation(_))
        ));
        // The failed attempts left the structure alone.
        assert_eq!(tree.parent(parent)?, Some(root));
        assert_eq!(tree.children(parent)?, &children[..]);
        Ok(())
    }

    #[test]
    fn remove_subtree_drops_descendants() -> Result<()> {
        let (mut tree, parent, children) = tree_with_children(3)?;
        assert_eq!(tree.view_count(), 5);
        tree.remove_subtree(parent)?;
        assert_eq!(tree.view_count(), 1);
        assert!(tree.children(tree.root())?.is_empty());
        assert_eq!(tree.rect(children[1]), Err(Error::ViewNotFound(children[1])));
        assert!(tree.remove_subtree(tree.root()).is_err());
        Ok(())
    }

    #[test]
    fn layout_auto_invalidates() -> Result<()> {
        let (mut tree, parent, _) = tree_with_children(2)?;
        tree.set_size(parent, Expanse::new(300.0, 300.0))?;
        tree.set_layout(parent, Layout::vertical())?;
        tree.update_layout()?;
        assert!(!tree.needs_layout(parent)?);

        tree.with_layout_of(parent, |l| l.mode = l.mode.next())?;
        assert!(tree.needs_layout(parent)?);
        tree.update_layout()?;

        // An edit that changes nothing leaves the flag alone.
        tree.with_layout_of(parent, |l| l.mode = Mode::Fill)?;
        assert!(!tree.needs_layout(parent)?);

        tree.with_layout_of(parent, |l| l.alignment = Alignment::Center)?;
        assert!(tree.needs_layout(parent)?);
        Ok(())
    }

    #[test]
    fn take_layout_requires_attachment() -> Result<()> {
        let (mut tree, parent, _) = tree_with_children(0)?;
        assert!(matches!(
            tree.take_layout(parent),
            Err(Error::InvariantViolation(_))
        ));
        assert!(tree.with_layout_of(parent, |_| {}).is_err());
        tree.set_layout(parent, Layout::horizontal().padding(4.0))?;
        let layout = tree.take_layout(parent)?;
        assert_eq!(layout.padding, 4.0);
        assert_eq!(tree.layout_of(parent)?, None);

        // Transfer to another container.
        let other = tree.create_view();
        tree.set_layout(other, layout)?;
        assert_eq!(tree.layout_of(other)?, Some(layout));
        Ok(())
    }

    #[test]
    fn single_pass_settles_nested_layouts() -> Result<()> {
        let mut tree = ViewTree::new();
        let outer = tree.create_view();
        tree.add_subview(tree.root(), outer)?;
        tree.set_size(outer, Expanse::new(200.0, 100.0))?;
        tree.set_layout(
            outer,
            Layout::horizontal()
                .mode(Mode::Fill)
                .alignment(Alignment::Fill),
        )?;

        let inner = tree.create_view();
        tree.add_subview(outer, inner)?;
        tree.set_layout(
            inner,
            Layout::vertical()
                .mode(Mode::Fill)
                .alignment(Alignment::Fill)
                .margin(Insets::uniform(10.0)),
        )?;
        let leaf = tree.create_view();
        tree.add_subview(inner, leaf)?;

        tree.update_layout()?;
        assert_eq!(tree.rect(inner)?, Rect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(tree.rect(leaf)?, Rect::new(10.0, 10.0, 180.0, 80.0));
        assert_eq!(
            tree.world_rect(leaf)?,
            Rect::new(10.0, 10.0, 180.0, 80.0)
        );
        assert!(!tree.needs_layout(inner)?);

        // Nothing left to do.
        assert_eq!(tree.update_layout()?, 0);
        Ok(())
    }

    #[test]
    fn layout_does_not_settle_children() -> Result<()> {
        let (mut tree, parent, children) = tree_with_children(2)?;
        tree.update_layout()?;
        tree.set_size(parent, Expanse::new(100.0, 100.0))?;
        tree.set_layout(
            parent,
            Layout::vertical().mode(Mode::Fill).alignment(Alignment::Fill),
        )?;
        tree.layout_view(parent)?;
        assert!(!tree.needs_layout(parent)?);
        assert!(tree.needs_layout(children[0])?);
        Ok(())
    }

    #[test]
    fn fill_then_fixed_restores_preferred() -> Result<()> {
        let (mut tree, parent, children) = tree_with_children(2)?;
        tree.set_size(parent, Expanse::new(300.0, 300.0))?;
        tree.set_layout(parent, Layout::vertical().mode(Mode::Fill))?;
        tree.update_layout()?;
        assert_eq!(tree.rect(children[0])?.h, 150.0);

        tree.with_layout_of(parent, |l| l.mode = Mode::Fixed)?;
        tree.update_layout()?;
        assert_eq!(tree.rect(children[0])?.expanse(), Expanse::new(120.0, 40.0));
        Ok(())
    }

    #[test]
    fn coordinate_conversion() -> Result<()> {
        let (mut tree, parent, children) = tree_with_children(1)?;
        tree.set_pos(parent, Point::new(40.0, 140.0))?;
        tree.set_pos(children[0], Point::new(6.0, 6.0))?;
        let w = tree.to_world(children[0], Point::new(1.0, 2.0))?;
        assert_eq!(w, Point::new(47.0, 148.0));
        assert_eq!(tree.to_local(children[0], w)?, Point::new(1.0, 2.0));
        Ok(())
    }

    #[test]
    fn hit_test_topmost_first() -> Result<()> {
        let (mut tree, parent, children) = tree_with_children(2)?;
        tree.set_bounds(parent, Rect::new(10.0, 10.0, 100.0, 100.0))?;
        tree.set_pos(children[0], Point::new(0.0, 0.0))?;
        tree.set_pos(children[1], Point::new(20.0, 0.0))?;

        // Overlap region belongs to the later child.
        assert_eq!(tree.hit_test(Point::new(40.0, 20.0)), Some(children[1]));
        assert_eq!(tree.hit_test(Point::new(15.0, 20.0)), Some(children[0]));
        // Inside the parent but outside both children.
        assert_eq!(tree.hit_test(Point::new(15.0, 100.0)), Some(parent));
        // Outside everything; the root is not interactive.
        assert_eq!(tree.hit_test(Point::new(500.0, 500.0)), None);

        tree.set_hidden(children[1], true)?;
        assert_eq!(tree.hit_test(Point::new(40.0, 20.0)), Some(children[0]));
        tree.set_interactive(children[0], false)?;
        assert_eq!(tree.hit_test(Point::new(40.0, 20.0)), Some(parent));
        Ok(())
    }

    #[test]
    fn hit_test_respects_clipping() -> Result<()> {
        let (mut tree, parent, children) = tree_with_children(1)?;
        tree.set_bounds(parent, Rect::new(0.0, 0.0, 50.0, 20.0))?;
        tree.set_pos(children[0], Point::new(30.0, 0.0))?;
        // The child pokes out to x = 150.
        assert_eq!(tree.hit_test(Point::new(100.0, 10.0)), Some(children[0]));
        tree.set_clips_children(parent, true)?;
        assert_eq!(tree.hit_test(Point::new(100.0, 10.0)), None);
        assert_eq!(tree.hit_test(Point::new(40.0, 10.0)), Some(children[0]));
        Ok(())
    }

    #[test]
    fn hit_test_clips_composited_views() -> Result<()> {
        let (mut tree, parent, children) = tree_with_children(1)?;
        tree.set_bounds(parent, Rect::new(0.0, 0.0, 100.0, 50.0))?;
        tree.set_bounds(children[0], Rect::new(80.0, 0.0, 60.0, 20.0))?;
        tree.set_renders_to_frame_buffer(parent, true)?;

        let backend = RecordingBackend::new();
        let mut r = Renderer::new(Box::new(backend));
        tree.frame(&mut r)?;
        let fb = r.frame_buffers().iter().next().map(|(_, fb)| fb.size());
        assert_eq!(fb, Some(ExpanseI32::new(100, 50)));

        // The part of the child outside the buffer is never painted.
        assert_eq!(tree.hit_test(Point::new(120.0, 10.0)), None);
        assert_eq!(tree.hit_test(Point::new(90.0, 10.0)), Some(children[0]));
        Ok(())
    }

    #[test]
    fn combined_alpha_multiplies() -> Result<()> {
        let (mut tree, parent, children) = tree_with_children(1)?;
        tree.set_alpha(parent, 0.5)?;
        tree.set_alpha(children[0], 0.5)?;
        assert_eq!(tree.combined_alpha(children[0])?, 0.25);
        tree.set_alpha(parent, 7.0)?;
        assert_eq!(tree.combined_alpha(parent)?, 1.0);
        Ok(())
    }
}
