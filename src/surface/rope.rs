use ropey::Rope;
use tracing::trace;

use super::viewport::Viewport;
use super::{ChangeListener, ChangeNotice, DocumentSurface, Position, Range};
use crate::config::WidgetOptions;

/// Map a position through a splice of `[from, to)` replaced by `inserted`
/// characters.
///
/// Positions inside the removed span collapse to its start; a position
/// sitting exactly at a pure insertion point lands at the end of the
/// inserted text.
const fn map_position(pos: usize, from: usize, to: usize, inserted: usize) -> usize {
    if pos < from {
        pos
    } else if pos < to {
        from
    } else {
        pos - (to - from) + inserted
    }
}

/// A headless text-editing surface backed by a rope.
///
/// Positions are character offsets, clamped to the current document bounds
/// on every call. All content mutations funnel through a single splice
/// primitive, so each one produces exactly one change notification carrying
/// a full snapshot.
pub struct RopeSurface {
    rope: Rope,
    cursor: Position,
    anchor: Option<Position>,
    viewport: Viewport,
    listeners: Vec<ChangeListener>,
}

impl RopeSurface {
    /// Create an empty surface.
    pub fn new(options: &WidgetOptions) -> Self {
        Self::from_text("", options)
    }

    /// Create a surface seeded with `text`.
    pub fn from_text(text: &str, options: &WidgetOptions) -> Self {
        let rope = Rope::from_str(text);
        let total_lines = rope.len_lines();
        Self {
            rope,
            cursor: 0,
            anchor: None,
            viewport: Viewport::new(
                options.viewport_width(),
                options.viewport_height(),
                total_lines,
            ),
            listeners: Vec::new(),
        }
    }

    /// The surface viewport.
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Set a selection span, as direct user interaction would.
    ///
    /// Selection changes are not content mutations and raise no change
    /// notification.
    pub fn select(&mut self, anchor: Position, head: Position) {
        self.anchor = Some(self.clamp(anchor));
        self.cursor = self.clamp(head);
    }

    fn clamp(&self, at: Position) -> Position {
        at.min(self.rope.len_chars())
    }

    /// Replace `[from, to)` with `text` and notify listeners.
    fn splice(&mut self, from: Position, to: Position, text: &str) {
        let from = self.clamp(from);
        let to = self.clamp(to).max(from);
        self.rope.remove(from..to);
        self.rope.insert(from, text);

        let inserted = text.chars().count();
        self.cursor = map_position(self.cursor, from, to, inserted);
        self.anchor = self
            .anchor
            .map(|anchor| map_position(anchor, from, to, inserted));
        self.viewport.set_total_lines(self.rope.len_lines());

        trace!(from, to, inserted, "spliced");
        self.notify_listeners();
    }

    fn notify_listeners(&mut self) {
        let notice = ChangeNotice {
            position: self.cursor,
            text: self.rope.to_string(),
        };
        for listener in &mut self.listeners {
            listener(&notice);
        }
    }

    /// Length of a line in characters, without its trailing newline.
    fn line_len_chars(&self, line_idx: usize) -> usize {
        let line = self.rope.line(line_idx);
        let mut len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len -= 1;
        }
        if len > 0 && line.char(len - 1) == '\r' {
            len -= 1;
        }
        len
    }
}

impl DocumentSurface for RopeSurface {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn set_text(&mut self, text: &str) {
        self.splice(0, self.rope.len_chars(), text);
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, at: Position) {
        self.cursor = self.clamp(at);
        self.anchor = None;
    }

    fn selection(&self) -> Range {
        self.anchor.map_or_else(
            || Range::caret(self.cursor),
            |anchor| Range::new(anchor, self.cursor),
        )
    }

    fn slice(&self, range: Range) -> String {
        let from = self.clamp(range.from);
        let to = self.clamp(range.to).max(from);
        self.rope.slice(from..to).to_string()
    }

    fn insert(&mut self, at: Position, text: &str) {
        self.splice(at, at, text);
    }

    fn delete(&mut self, at: Position, count: usize) {
        self.splice(at, at.saturating_add(count), "");
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_start(&self, line: usize) -> Option<Position> {
        if line == 0 || line > self.rope.len_lines() {
            return None;
        }
        Some(self.rope.line_to_char(line - 1))
    }

    fn position_at(&self, x: u16, y: u16) -> Position {
        let last_line = self.rope.len_lines().saturating_sub(1);
        let line_idx = (self.viewport.offset() + y as usize).min(last_line);
        let col = (x as usize).min(self.line_len_chars(line_idx));
        self.rope.line_to_char(line_idx) + col
    }

    fn scroll_to(&mut self, at: Position) {
        let line = self.rope.char_to_line(self.clamp(at));
        self.viewport.scroll_line_into_view(line);
    }

    fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }
}

impl std::fmt::Debug for RopeSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RopeSurface")
            .field(
                "rope",
                &format_args!("Rope({} chars)", self.rope.len_chars()),
            )
            .field("cursor", &self.cursor)
            .field("anchor", &self.anchor)
            .field("viewport", &self.viewport)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn surface(text: &str) -> RopeSurface {
        RopeSurface::from_text(text, &WidgetOptions::default())
    }

    /// Attach a counter that records every change notice.
    fn record_changes(surface: &mut RopeSurface) -> Rc<RefCell<Vec<ChangeNotice>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        surface.on_change(Box::new(move |notice| {
            sink.borrow_mut().push(notice.clone());
        }));
        log
    }

    // --- Construction and basic queries ---

    #[test]
    fn test_empty_surface() {
        let s = surface("");
        assert_eq!(s.len_chars(), 0);
        assert_eq!(s.line_count(), 1);
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn test_text_roundtrip() {
        let content = "line one\nline two\nline three";
        let s = surface(content);
        assert_eq!(s.text(), content);
    }

    #[test]
    fn test_len_chars_counts_characters_not_bytes() {
        let s = surface("café");
        assert_eq!(s.len_chars(), 4);
    }

    // --- Insertion ---

    #[test]
    fn test_insert_at_start() {
        let mut s = surface("ello");
        s.insert(0, "h");
        assert_eq!(s.text(), "hello");
    }

    #[test]
    fn test_insert_in_middle() {
        let mut s = surface("hllo");
        s.insert(1, "e");
        assert_eq!(s.text(), "hello");
    }

    #[test]
    fn test_insert_at_end_of_document() {
        let mut s = surface("hello");
        s.insert(5, "!");
        assert_eq!(s.text(), "hello!");
    }

    #[test]
    fn test_insert_clamps_past_end() {
        let mut s = surface("ab");
        s.insert(99, "c");
        assert_eq!(s.text(), "abc");
    }

    #[test]
    fn test_insert_multiline() {
        let mut s = surface("ab");
        s.insert(1, "x\ny");
        assert_eq!(s.text(), "ax\nyb");
        assert_eq!(s.line_count(), 2);
    }

    #[test]
    fn test_empty_insert_leaves_content_but_notifies() {
        let mut s = surface("hello");
        let log = record_changes(&mut s);
        s.insert(2, "");
        assert_eq!(s.text(), "hello");
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].text, "hello");
    }

    // --- Deletion ---

    #[test]
    fn test_delete_range() {
        let mut s = surface("hello");
        s.delete(1, 3);
        assert_eq!(s.text(), "ho");
    }

    #[test]
    fn test_delete_clamps_to_end() {
        let mut s = surface("hello");
        s.delete(3, 99);
        assert_eq!(s.text(), "hel");
    }

    #[test]
    fn test_delete_past_end_removes_nothing() {
        let mut s = surface("hello");
        let log = record_changes(&mut s);
        s.delete(9, 4);
        assert_eq!(s.text(), "hello");
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_delete_joins_lines() {
        let mut s = surface("ab\ncd");
        s.delete(2, 1);
        assert_eq!(s.text(), "abcd");
        assert_eq!(s.line_count(), 1);
    }

    // --- Cursor mapping through splices ---

    #[test]
    fn test_insert_before_cursor_shifts_it() {
        let mut s = surface("hello");
        s.set_cursor(3);
        s.insert(0, "xy");
        assert_eq!(s.cursor(), 5);
    }

    #[test]
    fn test_insert_at_cursor_moves_to_end_of_inserted_text() {
        let mut s = surface("hello");
        s.set_cursor(2);
        s.insert(2, "AB");
        assert_eq!(s.cursor(), 4);
    }

    #[test]
    fn test_insert_after_cursor_leaves_it() {
        let mut s = surface("hello");
        s.set_cursor(1);
        s.insert(4, "zz");
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn test_delete_span_containing_cursor_collapses_to_start() {
        let mut s = surface("hello");
        s.set_cursor(3);
        s.delete(1, 3);
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn test_delete_before_cursor_shifts_it_left() {
        let mut s = surface("hello");
        s.set_cursor(4);
        s.delete(0, 2);
        assert_eq!(s.cursor(), 2);
    }

    // --- Cursor and selection state ---

    #[test]
    fn test_set_cursor_clamps() {
        let mut s = surface("hi");
        s.set_cursor(50);
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn test_default_selection_is_caret_at_cursor() {
        let mut s = surface("hello");
        s.set_cursor(2);
        assert_eq!(s.selection(), Range::caret(2));
    }

    #[test]
    fn test_select_sets_range() {
        let mut s = surface("hello");
        s.select(1, 4);
        assert_eq!(s.selection(), Range::new(1, 4));
    }

    #[test]
    fn test_select_reversed_normalizes_on_read() {
        let mut s = surface("hello");
        s.select(4, 1);
        let r = s.selection();
        assert_eq!((r.from, r.to), (1, 4));
    }

    #[test]
    fn test_set_cursor_collapses_selection() {
        let mut s = surface("hello");
        s.select(0, 4);
        s.set_cursor(2);
        assert!(s.selection().is_caret());
    }

    #[test]
    fn test_selection_maps_through_insert() {
        let mut s = surface("hello");
        s.select(1, 4);
        s.insert(0, "xx");
        assert_eq!(s.selection(), Range::new(3, 6));
    }

    // --- Slicing ---

    #[test]
    fn test_slice_returns_covered_text() {
        let s = surface("hello world");
        assert_eq!(s.slice(Range::new(6, 11)), "world");
    }

    #[test]
    fn test_slice_of_caret_is_empty() {
        let s = surface("hello");
        assert_eq!(s.slice(Range::caret(3)), "");
    }

    #[test]
    fn test_slice_clamps_out_of_range() {
        let s = surface("hello");
        assert_eq!(s.slice(Range::new(3, 99)), "lo");
    }

    // --- Whole-document replacement ---

    #[test]
    fn test_set_text_replaces_everything() {
        let mut s = surface("old content");
        s.set_text("new");
        assert_eq!(s.text(), "new");
    }

    #[test]
    fn test_set_text_is_a_single_mutation() {
        let mut s = surface("old");
        let log = record_changes(&mut s);
        s.set_text("brand new text");
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].text, "brand new text");
    }

    // --- Line resolution ---

    #[test]
    fn test_line_start_is_one_indexed() {
        let s = surface("ac\nxy");
        assert_eq!(s.line_start(1), Some(0));
        assert_eq!(s.line_start(2), Some(3));
    }

    #[test]
    fn test_line_start_zero_is_none() {
        let s = surface("hello");
        assert_eq!(s.line_start(0), None);
    }

    #[test]
    fn test_line_start_past_last_line_is_none() {
        let s = surface("ac\nxy");
        assert_eq!(s.line_start(3), None);
    }

    // --- Coordinate resolution ---

    #[test]
    fn test_position_at_origin() {
        let s = surface("hello\nworld");
        assert_eq!(s.position_at(0, 0), 0);
    }

    #[test]
    fn test_position_at_second_line() {
        let s = surface("hello\nworld");
        assert_eq!(s.position_at(2, 1), 8);
    }

    #[test]
    fn test_position_at_clamps_column_to_line_length() {
        let s = surface("hi\nlonger line");
        assert_eq!(s.position_at(70, 0), 2);
    }

    #[test]
    fn test_position_at_clamps_row_to_last_line() {
        let s = surface("hello\nworld");
        assert_eq!(s.position_at(0, 20), 6);
    }

    #[test]
    fn test_position_at_respects_viewport_offset() {
        let mut lines = String::new();
        for i in 0..100 {
            lines.push_str(&format!("line {i}\n"));
        }
        let mut s = surface(&lines);
        s.scroll_to(s.line_start(60).unwrap());
        let offset = s.viewport().offset();
        assert_eq!(s.position_at(0, 0), s.line_start(offset + 1).unwrap());
    }

    // --- Scrolling ---

    #[test]
    fn test_scroll_to_far_position_moves_viewport() {
        let mut lines = String::new();
        for i in 0..100 {
            lines.push_str(&format!("line {i}\n"));
        }
        let mut s = surface(&lines);
        let target = s.line_start(80).unwrap();
        s.scroll_to(target);
        assert!(s.viewport().visible_lines().contains(&79));
    }

    // --- Change listeners ---

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let mut s = surface("");
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let sink = Rc::clone(&order);
            s.on_change(Box::new(move |_| sink.borrow_mut().push(tag)));
        }
        s.insert(0, "x");
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_notice_carries_full_snapshot_and_cursor() {
        let mut s = surface("abc");
        s.set_cursor(3);
        let log = record_changes(&mut s);
        s.insert(3, "!");
        let notices = log.borrow();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].text, "abc!");
        assert_eq!(notices[0].position, 4);
    }

    #[test]
    fn test_one_notification_per_mutation() {
        let mut s = surface("");
        let log = record_changes(&mut s);
        s.insert(0, "a");
        s.insert(1, "b");
        s.delete(0, 1);
        assert_eq!(log.borrow().len(), 3);
    }

    // --- Properties ---

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn insert_grows_document_by_inserted_length(
                doc in "[a-z \\n]{0,40}",
                text in "[a-z \\n]{0,10}",
                at_seed in any::<usize>(),
            ) {
                let mut s = surface(&doc);
                let len = s.len_chars();
                let at = at_seed % (len + 1);
                s.insert(at, &text);

                let inserted = text.chars().count();
                prop_assert_eq!(s.len_chars(), len + inserted);

                let chars: Vec<char> = doc.chars().collect();
                let mut expected: String = chars[..at].iter().collect();
                expected.push_str(&text);
                expected.extend(&chars[at..]);
                prop_assert_eq!(s.text(), expected);
            }

            #[test]
            fn delete_removes_clamped_count(
                doc in "[a-z \\n]{0,40}",
                at_seed in any::<usize>(),
                count in 0..64usize,
            ) {
                let mut s = surface(&doc);
                let len = s.len_chars();
                let at = at_seed % (len + 1);
                s.delete(at, count);

                let removed = count.min(len - at);
                prop_assert_eq!(s.len_chars(), len - removed);
            }

            #[test]
            fn empty_insert_is_content_identity(
                doc in "[a-z \\n]{0,40}",
                at_seed in any::<usize>(),
            ) {
                let mut s = surface(&doc);
                let at = at_seed % (s.len_chars() + 1);
                s.insert(at, "");
                prop_assert_eq!(s.text(), doc);
            }

            #[test]
            fn cursor_stays_in_bounds_through_splices(
                doc in "[a-z \\n]{0,40}",
                cursor_seed in any::<usize>(),
                at_seed in any::<usize>(),
                count in 0..16usize,
            ) {
                let mut s = surface(&doc);
                let len = s.len_chars();
                s.set_cursor(cursor_seed % (len + 1));
                s.delete(at_seed % (len + 1), count);
                prop_assert!(s.cursor() <= s.len_chars());
            }
        }
    }
}
