use geom::{Expanse, Rect};

use crate::{id::ViewId, layout::Layout, style::Background};

/// View data stored in the arena.
///
/// A view's `rect` is expressed in its parent's coordinate space. Fields are
/// mutated through [`ViewTree`](crate::ViewTree) so that structural and
/// geometry changes keep the layout dirty flags honest.
#[derive(Debug, Clone)]
pub struct View {
    /// Parent in the arena tree. A lookup key, never an owning reference.
    pub(crate) parent: Option<ViewId>,
    /// Children in paint and layout order.
    pub(crate) children: Vec<ViewId>,

    /// Frame relative to the parent origin.
    pub(crate) rect: Rect,
    /// Size explicitly requested with `set_size`. Layout modes that keep a
    /// child's size read this, so a stretched child can shrink back.
    pub(crate) preferred: Expanse,

    /// Attached layout, applied to this view's direct children.
    pub(crate) layout: Option<Layout>,
    /// Fill drawn behind children.
    pub(crate) background: Option<Background>,
    /// Set when this view's children need to be laid out again.
    pub(crate) needs_layout: bool,

    /// Hidden views and their subtrees are neither drawn nor hit.
    pub(crate) hidden: bool,
    /// Opacity multiplier applied to this view and its subtree.
    pub(crate) alpha: f32,
    /// Whether the view receives hit tests.
    pub(crate) interactive: bool,
    /// Whether children are scissored to this view's bounds.
    pub(crate) clips_children: bool,
    /// Whether the subtree is drawn through an offscreen frame buffer.
    pub(crate) renders_to_frame_buffer: bool,
    /// Debug label.
    pub(crate) label: String,
}

impl Default for View {
    fn default() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            rect: Rect::zero(),
            preferred: Expanse::zero(),
            layout: None,
            background: None,
            needs_layout: true,
            hidden: false,
            alpha: 1.0,
            interactive: true,
            clips_children: false,
            renders_to_frame_buffer: false,
            label: String::new(),
        }
    }
}

impl View {
    /// Return the view's parent, if any.
    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    /// Return the view's children.
    pub fn children(&self) -> &[ViewId] {
        &self.children
    }

    /// Frame relative to the parent origin.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Size last requested with `set_size`.
    pub fn preferred_size(&self) -> Expanse {
        self.preferred
    }

    /// The attached layout, if any.
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// The background fill, if any.
    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Return true if children must be laid out again.
    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    /// Return true if the view is hidden.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    /// Local opacity multiplier.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Return true if the view receives hit tests.
    pub fn interactive(&self) -> bool {
        self.interactive
    }

    /// Return true if children are clipped to this view.
    pub fn clips_children(&self) -> bool {
        self.clips_children
    }

    /// Return true if the subtree is composited through a frame buffer.
    pub fn renders_to_frame_buffer(&self) -> bool {
        self.renders_to_frame_buffer
    }

    /// The debug label.
    pub fn label(&self) -> &str {
        &self.label
    }
}
