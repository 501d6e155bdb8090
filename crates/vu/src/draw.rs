//! The render pass: walk a laid-out tree and issue renderer calls.

use geom::{Expanse, ExpanseI32, Point, Rect, RectI32};

use crate::{
    error::Result,
    id::ViewId,
    render::Renderer,
    style::{BlendMode, ColorA},
    tree::ViewTree,
};

/// Run `f` with `color` pushed, popping it on every path.
fn with_color(
    r: &mut Renderer,
    color: ColorA,
    f: impl FnOnce(&mut Renderer) -> Result<()>,
) -> Result<()> {
    r.push_color(color);
    let res = f(r);
    let popped = r.pop_color();
    res.and(popped)
}

/// Run `f` with `clip` pushed, popping it on every path.
fn with_clip(
    r: &mut Renderer,
    clip: RectI32,
    f: impl FnOnce(&mut Renderer) -> Result<()>,
) -> Result<()> {
    r.push_clip(clip);
    let res = f(r);
    let popped = r.pop_clip();
    res.and(popped)
}

/// Paint every visible view of a tree, parents before children and siblings
/// in order.
pub(crate) fn render_tree(tree: &ViewTree, r: &mut Renderer) -> Result<()> {
    render_view(tree, r, tree.root, Point::zero(), 1.0)
}

/// Paint a view whose parent's origin sits at `origin` in the bound target.
fn render_view(
    tree: &ViewTree,
    r: &mut Renderer,
    id: ViewId,
    origin: Point,
    parent_alpha: f32,
) -> Result<()> {
    let view = tree.get(id)?;
    if view.hidden {
        return Ok(());
    }
    let alpha = parent_alpha * view.alpha;
    let rect = view.rect.translate(origin);
    if view.renders_to_frame_buffer {
        render_composited(tree, r, id, rect, alpha)
    } else {
        paint(tree, r, id, rect, alpha)
    }
}

/// Paint a view's background and children at `rect`.
fn paint(tree: &ViewTree, r: &mut Renderer, id: ViewId, rect: Rect, alpha: f32) -> Result<()> {
    let view = tree.get(id)?;
    if let Some(bg) = view.background {
        with_color(r, bg.color.scale_alpha(alpha), |r| {
            r.draw_solid_rect(rect)?;
            if let Some(stroke) = bg.stroke {
                r.set_color(stroke.color.scale_alpha(alpha));
                r.draw_stroked_rect_width(rect, stroke.width)?;
            }
            Ok(())
        })?;
    }
    if view.children.is_empty() {
        return Ok(());
    }
    let children = |r: &mut Renderer| -> Result<()> {
        for child in &view.children {
            render_view(tree, r, *child, rect.tl, alpha)?;
        }
        Ok(())
    };
    if view.clips_children {
        with_clip(r, RectI32::enclosing(rect), children)
    } else {
        children(r)
    }
}

/// Paint a subtree into a frame buffer with its origin at (0, 0), then
/// composite the buffer into the bound target with the view's alpha.
fn render_composited(
    tree: &ViewTree,
    r: &mut Renderer,
    id: ViewId,
    rect: Rect,
    alpha: f32,
) -> Result<()> {
    let size = ExpanseI32::ceil(rect.expanse());
    if size.is_empty() {
        return Ok(());
    }
    let fb = r.get_frame_buffer(size)?;
    if let Err(e) = r.push_frame_buffer(fb) {
        r.release_frame_buffer(fb)?;
        return Err(e);
    }
    let painted = paint(tree, r, id, rect.at(Point::zero()), 1.0);
    let popped = r.pop_frame_buffer(fb);
    painted.and(popped)?;

    let dest = Rect::from_parts(rect.tl, Expanse::from(size));
    r.push_blend_mode(BlendMode::PremultAlpha);
    let drawn = with_color(r, ColorA::WHITE.with_alpha(alpha).premultiplied(), |r| {
        r.draw_frame_buffer(fb, dest)
    });
    let popped = r.pop_blend_mode();
    drawn.and(popped)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        error::Error,
        style::Background,
        testing::{DrawKind, RecordingBackend},
    };

    const RED: ColorA = ColorA::rgb(1.0, 0.0, 0.0);
    const BLUE: ColorA = ColorA::rgb(0.0, 0.0, 1.0);

    fn panel_tree() -> Result<(ViewTree, ViewId, ViewId)> {
        let mut tree = ViewTree::new();
        let panel = tree.create_view();
        tree.add_subview(tree.root(), panel)?;
        tree.set_bounds(panel, Rect::new(10.0, 10.0, 100.0, 50.0))?;
        tree.set_background(panel, Some(Background::solid(RED)))?;
        let child = tree.create_view();
        tree.add_subview(panel, child)?;
        tree.set_bounds(child, Rect::new(5.0, 5.0, 20.0, 20.0))?;
        tree.set_background(child, Some(Background::solid(BLUE)))?;
        Ok((tree, panel, child))
    }

    fn renderer() -> (RecordingBackend, Renderer) {
        let backend = RecordingBackend::new();
        let r = Renderer::new(Box::new(backend.clone()));
        (backend, r)
    }

    #[test]
    fn paints_in_tree_order() -> Result<()> {
        let (mut tree, _, _) = panel_tree()?;
        let (backend, mut r) = renderer();
        tree.frame(&mut r)?;

        let draws = backend.recording().draws();
        let painted: Vec<(Rect, ColorA)> = draws
            .iter()
            .filter_map(|d| match d.kind {
                DrawKind::Solid(rect) => Some((rect, d.color)),
                DrawKind::Textured { .. } => None,
            })
            .collect();
        assert_eq!(
            painted,
            vec![
                (Rect::new(10.0, 10.0, 100.0, 50.0), RED),
                (Rect::new(15.0, 15.0, 20.0, 20.0), BLUE),
            ]
        );
        assert_eq!(r.color(), ColorA::WHITE);
        Ok(())
    }

    #[test]
    fn alpha_combines_down_the_tree() -> Result<()> {
        let (mut tree, panel, child) = panel_tree()?;
        tree.set_alpha(panel, 0.5)?;
        tree.set_alpha(child, 0.5)?;
        let (backend, mut r) = renderer();
        tree.frame(&mut r)?;
        let alphas: Vec<f32> = backend
            .recording()
            .draws()
            .iter()
            .map(|d| d.color.a)
            .collect();
        assert_eq!(alphas, vec![0.5, 0.25]);
        Ok(())
    }

    #[test]
    fn hidden_subtrees_are_skipped() -> Result<()> {
        let (mut tree, panel, _) = panel_tree()?;
        tree.set_hidden(panel, true)?;
        let (backend, mut r) = renderer();
        tree.frame(&mut r)?;
        assert!(backend.recording().draws().is_empty());
        Ok(())
    }

    #[test]
    fn stroke_follows_fill() -> Result<()> {
        let (mut tree, panel, child) = panel_tree()?;
        tree.remove_subtree(child)?;
        tree.set_background(panel, Some(Background::solid(RED).with_stroke(BLUE, 2.0)))?;
        let (backend, mut r) = renderer();
        tree.frame(&mut r)?;
        let draws = backend.recording().draws();
        assert_eq!(draws.len(), 5);
        assert_eq!(draws[0].color, RED);
        assert!(draws[1..].iter().all(|d| d.color == BLUE));
        Ok(())
    }

    #[test]
    fn clipping_children() -> Result<()> {
        let (mut tree, panel, _) = panel_tree()?;
        tree.set_clips_children(panel, true)?;
        let (backend, mut r) = renderer();
        tree.frame(&mut r)?;
        let draws = backend.recording().draws();
        assert_eq!(draws[0].scissor, None);
        assert_eq!(draws[1].scissor, Some(RectI32::new(10, 10, 100, 50)));
        assert_eq!(r.clip_depth(), 0);
        Ok(())
    }

    #[test]
    fn composited_subtree() -> Result<()> {
        let (mut tree, panel, _) = panel_tree()?;
        tree.set_renders_to_frame_buffer(panel, true)?;
        tree.set_alpha(panel, 0.5)?;
        let (backend, mut r) = renderer();
        tree.frame(&mut r)?;

        assert_eq!(r.num_frame_buffers_cached(), 1);
        let draws = backend.recording().draws();
        assert_eq!(draws.len(), 3);

        // The subtree is painted opaque into the buffer at its own origin.
        let target = draws[0].target;
        assert!(target.is_some());
        assert_eq!(draws[0].kind, DrawKind::Solid(Rect::new(0.0, 0.0, 100.0, 50.0)));
        assert_eq!(draws[0].color, RED);
        assert_eq!(draws[1].target, target);
        assert_eq!(draws[1].kind, DrawKind::Solid(Rect::new(5.0, 5.0, 20.0, 20.0)));

        // Then composited with premultiplied alpha.
        let composite = draws[2];
        assert_eq!(composite.target, None);
        assert_eq!(composite.blend, BlendMode::PremultAlpha);
        assert_eq!(composite.color, ColorA::new(0.5, 0.5, 0.5, 0.5));
        let DrawKind::Textured { dest, source, .. } = composite.kind else {
            panic!("expected a textured draw");
        };
        assert_eq!(dest, Rect::new(10.0, 10.0, 100.0, 50.0));
        assert_eq!(source, None);

        // A second frame reuses the buffer.
        backend.recording().clear();
        tree.frame(&mut r)?;
        assert_eq!(r.num_frame_buffers_cached(), 1);
        assert_eq!(backend.live_targets(), 1);
        Ok(())
    }

    #[test]
    fn composited_size_rounds_up() -> Result<()> {
        let (mut tree, panel, _) = panel_tree()?;
        tree.set_size(panel, Expanse::new(10.5, 4.2))?;
        tree.set_renders_to_frame_buffer(panel, true)?;
        let (_, mut r) = renderer();
        tree.render(&mut r)?;
        let sizes: Vec<ExpanseI32> = r
            .frame_buffers()
            .iter()
            .map(|(_, fb)| fb.size())
            .collect();
        assert_eq!(sizes, vec![ExpanseI32::new(11, 5)]);
        Ok(())
    }

    #[test]
    fn empty_composite_is_skipped() -> Result<()> {
        let (mut tree, panel, _) = panel_tree()?;
        tree.set_size(panel, Expanse::zero())?;
        tree.set_renders_to_frame_buffer(panel, true)?;
        let (backend, mut r) = renderer();
        tree.frame(&mut r)?;
        assert_eq!(r.num_frame_buffers_cached(), 0);
        assert!(backend.recording().draws().is_empty());
        Ok(())
    }

    #[test]
    fn failures_leave_stacks_balanced() -> Result<()> {
        let (mut tree, panel, child) = panel_tree()?;
        tree.set_clips_children(panel, true)?;
        tree.set_renders_to_frame_buffer(child, true)?;
        let backend = RecordingBackend::with_target_budget(0);
        let mut r = Renderer::new(Box::new(backend));
        assert!(matches!(tree.render(&mut r), Err(Error::ResourceExhausted(_))));
        assert_eq!(r.clip_depth(), 0);
        assert_eq!(r.color_depth(), 0);
        r.end_frame()?;
        Ok(())
    }
}
