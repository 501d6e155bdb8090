use std::io::Write;

use termcolor::{Buffer, Color, ColorSpec, WriteColor};

use crate::{
    error::{Error, Result},
    id::ViewId,
    tree::ViewTree,
};

/// Traverses a subtree and returns a string showing each view's label, frame
/// and flags, with ANSI colors. This is a debug function.
pub fn dump(tree: &ViewTree, root: ViewId) -> Result<String> {
    let mut buffer = Buffer::ansi();
    dump_view(&mut buffer, tree, root, 0)?;
    Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
}

/// Like [`dump`], without colors.
pub fn dump_plain(tree: &ViewTree, root: ViewId) -> Result<String> {
    let mut buffer = Buffer::no_color();
    dump_view(&mut buffer, tree, root, 0)?;
    Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
}

/// Map a write failure into our error type.
fn io(e: std::io::Error) -> Error {
    Error::Internal(e.to_string())
}

/// Write `text` in the given color.
fn write_colored(buffer: &mut Buffer, spec: &ColorSpec, text: &str) -> Result<()> {
    buffer.set_color(spec).map_err(io)?;
    write!(buffer, "{text}").map_err(io)?;
    buffer.reset().map_err(io)
}

/// Helper to write an indented, colored label followed by a value.
fn write_field(buffer: &mut Buffer, indent: &str, label: &str, value: &str) -> Result<()> {
    write!(buffer, "{indent}  ").map_err(io)?;
    write_colored(buffer, ColorSpec::new().set_fg(Some(Color::Green)), label)?;
    writeln!(buffer, " {value}").map_err(io)
}

/// Walk a view subtree and emit formatted debug output.
fn dump_view(buffer: &mut Buffer, tree: &ViewTree, id: ViewId, level: usize) -> Result<()> {
    let view = tree.get(id)?;
    let indent = "    ".repeat(level);

    write!(buffer, "{indent}").map_err(io)?;
    let name = if view.label.is_empty() {
        format!("{id:?}")
    } else {
        view.label.clone()
    };
    write_colored(
        buffer,
        ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true),
        &name,
    )?;

    let mut indicators = Vec::new();
    if view.hidden {
        indicators.push(("hidden", Color::Yellow));
    }
    if view.needs_layout {
        indicators.push(("needs layout", Color::Red));
    }
    if view.clips_children {
        indicators.push(("clips", Color::Blue));
    }
    if view.renders_to_frame_buffer {
        indicators.push(("composited", Color::Magenta));
    }
    for (i, (indicator, color)) in indicators.iter().enumerate() {
        write!(buffer, "{}", if i == 0 { " " } else { ", " }).map_err(io)?;
        write_colored(buffer, ColorSpec::new().set_fg(Some(*color)), indicator)?;
    }
    writeln!(buffer).map_err(io)?;

    let r = view.rect;
    write_field(
        buffer,
        &indent,
        "rect:",
        &format!("x: {}, y: {}, w: {}, h: {}", r.tl.x, r.tl.y, r.w, r.h),
    )?;
    if let Some(l) = &view.layout {
        write_field(
            buffer,
            &indent,
            "layout:",
            &format!(
                "{:?} {:?} {:?}, padding {}",
                l.direction, l.mode, l.alignment, l.padding
            ),
        )?;
    }
    if view.alpha < 1.0 {
        write_field(buffer, &indent, "alpha:", &view.alpha.to_string())?;
    }

    for child in &view.children {
        dump_view(buffer, tree, *child, level + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use geom::{Expanse, Rect};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout::{Alignment, Layout};

    #[test]
    fn plain_dump() -> Result<()> {
        let mut tree = ViewTree::new();
        let panel = tree.create_labeled("panel", Expanse::new(200.0, 60.0));
        tree.add_subview(tree.root(), panel)?;
        tree.set_layout(
            panel,
            Layout::horizontal().padding(6.0).alignment(Alignment::Center),
        )?;
        tree.set_clips_children(panel, true)?;
        let a = tree.create_labeled("a", Expanse::new(50.0, 20.0));
        let b = tree.create_labeled("b", Expanse::new(50.0, 20.0));
        tree.add_subview(panel, a)?;
        tree.add_subview(panel, b)?;
        tree.set_hidden(b, true)?;
        tree.set_alpha(a, 0.5)?;
        tree.update_layout()?;

        let expected = "\
panel clips
  rect: x: 0, y: 0, w: 200, h: 60
  layout: Horizontal Fixed Center, padding 6
    a
      rect: x: 0, y: 20, w: 50, h: 20
      alpha: 0.5
    b hidden
      rect: x: 56, y: 20, w: 50, h: 20
";
        assert_eq!(dump_plain(&tree, panel)?, expected);
        Ok(())
    }

    #[test]
    fn colored_dump_marks_dirty_views() -> Result<()> {
        let mut tree = ViewTree::new();
        let v = tree.create_labeled("dirty", Expanse::new(1.0, 1.0));
        tree.set_bounds(v, Rect::new(1.0, 2.0, 3.0, 4.0))?;
        let out = tree.dump(v)?;
        assert!(out.contains("needs layout"));
        assert!(out.contains('\u{1b}'));
        assert!(tree.dump(tree.root())?.contains("root"));
        Ok(())
    }
}
