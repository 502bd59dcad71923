//! Terminal input translation.
//!
//! Maps crossterm events onto the engine's pointer vocabulary. Only the left
//! button drives a resize; Esc and focus loss cancel, since the terminal can
//! no longer guarantee a matching release.

use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Press(Point),
    Move(Point),
    Release(Point),
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Pointer(PointerAction),
    /// The table's container changed width.
    ContainerResized(u32),
}

/// Control the propagation of an event past the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

pub fn translate(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Mouse(mouse) => {
            let point = Point::new(i32::from(mouse.column), i32::from(mouse.row));
            let action = match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => PointerAction::Press(point),
                MouseEventKind::Drag(MouseButton::Left) => PointerAction::Move(point),
                MouseEventKind::Up(MouseButton::Left) => PointerAction::Release(point),
                _ => return None,
            };
            Some(InputEvent::Pointer(action))
        }
        Event::Key(key) if key.code == KeyCode::Esc && key.kind != KeyEventKind::Release => {
            Some(InputEvent::Pointer(PointerAction::Cancel))
        }
        Event::FocusLost => Some(InputEvent::Pointer(PointerAction::Cancel)),
        Event::Resize(width, _) => Some(InputEvent::ContainerResized(u32::from(*width))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn left_button_maps_to_drag_lifecycle() {
        assert_eq!(
            translate(&mouse(MouseEventKind::Down(MouseButton::Left), 12, 3)),
            Some(InputEvent::Pointer(PointerAction::Press(Point::new(12, 3))))
        );
        assert_eq!(
            translate(&mouse(MouseEventKind::Drag(MouseButton::Left), 15, 3)),
            Some(InputEvent::Pointer(PointerAction::Move(Point::new(15, 3))))
        );
        assert_eq!(
            translate(&mouse(MouseEventKind::Up(MouseButton::Left), 15, 4)),
            Some(InputEvent::Pointer(PointerAction::Release(Point::new(15, 4))))
        );
        assert_eq!(
            translate(&mouse(MouseEventKind::Down(MouseButton::Right), 1, 1)),
            None
        );
    }

    #[test]
    fn escape_and_focus_loss_cancel() {
        let esc = Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(
            translate(&esc),
            Some(InputEvent::Pointer(PointerAction::Cancel))
        );
        assert_eq!(
            translate(&Event::FocusLost),
            Some(InputEvent::Pointer(PointerAction::Cancel))
        );
        assert_eq!(
            translate(&Event::Resize(120, 40)),
            Some(InputEvent::ContainerResized(120))
        );
        assert_eq!(translate(&Event::FocusGained), None);
    }
}
